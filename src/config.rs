use crate::model::ConfigError;
use clap::Parser;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_ENDPOINT: &str = "https://pixabay.com/api/";

/// Command line surface. Every flag can also come from the environment (or `.env`).
#[derive(Debug, Parser)]
#[command(name = "grocery-imager")]
#[command(about = "Attach a stock photo URL to every product in a grocery catalog CSV")]
#[command(version)]
pub struct Cli {
    /// Input catalog (CSV with a header row, needs a `Title` column)
    #[arg(short, long, env = "GROCERY_INPUT", default_value = "groceries.csv")]
    pub input: PathBuf,

    /// Output file, one JSON object per line
    #[arg(short, long, env = "GROCERY_OUTPUT", default_value = "groceries_with_images.jsonl")]
    pub output: PathBuf,

    /// Image search API key
    #[arg(long, env = "PIXABAY_API_KEY", hide_env_values = true)]
    pub api_key: String,

    /// Optional JSON file with tuning values, brands and categories
    #[arg(short, long, env = "GROCERY_CONFIG")]
    pub config: Option<PathBuf>,

    /// Stop after this many records
    #[arg(short, long)]
    pub limit: Option<usize>,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct CategoryConfig {
    pub label: String,
    pub keywords: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub endpoint: String,
    pub per_page: u32,
    pub max_attempts: u32,
    pub timeout_secs: u64,
    pub backoff_ms: u64,
    pub pause_ms: u64,
    pub max_query_len: usize,
    pub strict_units: bool,
    pub overflow_key: String,
    pub brands: Vec<String>,
    pub categories: Vec<CategoryConfig>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            per_page: 3,
            max_attempts: 3,
            timeout_secs: 10,
            backoff_ms: 1000,
            pause_ms: 700,
            max_query_len: 80,
            strict_units: false,
            overflow_key: "_extra".to_string(),
            brands: DEFAULT_BRANDS.iter().map(|b| b.to_string()).collect(),
            categories: DEFAULT_CATEGORIES
                .iter()
                .map(|(label, keywords)| CategoryConfig {
                    label: label.to_string(),
                    keywords: keywords.iter().map(|k| k.to_string()).collect(),
                })
                .collect(),
        }
    }
}

impl AppConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn backoff(&self) -> Duration {
        Duration::from_millis(self.backoff_ms)
    }

    pub fn pause(&self) -> Duration {
        Duration::from_millis(self.pause_ms)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if !(3..=200).contains(&self.per_page) {
            return Err(ConfigError::Invalid(format!(
                "per_page must be within 3..=200, got {}",
                self.per_page
            )));
        }
        if self.max_query_len == 0 {
            return Err(ConfigError::Invalid("max_query_len must be positive".into()));
        }
        if self.categories.iter().any(|c| c.label.trim().is_empty()) {
            return Err(ConfigError::Invalid("category label must not be empty".into()));
        }
        Ok(())
    }
}

/// Loads the JSON config if a path is given, otherwise the built-in defaults.
pub fn load_config(path: Option<&Path>) -> Result<AppConfig, ConfigError> {
    let config = match path {
        Some(path) => {
            let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
                path: path.to_path_buf(),
                source,
            })?;
            serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            })?
        }
        None => AppConfig::default(),
    };
    config.validate()?;
    Ok(config)
}

// Multi-word brands go before their prefixes ("kirkland signature" before "kirkland").
const DEFAULT_BRANDS: &[&str] = &[
    "david",
    "ferrara",
    "st michel",
    "la grande galette",
    "mary macleod",
    "the cake bake shop",
    "classic cake",
    "kirkland signature",
    "kirkland",
    "ghirardelli",
    "lindt",
    "ferrero",
    "hershey",
    "nature valley",
    "quaker",
    "kellogg",
    "nabisco",
    "pepperidge farm",
    "starbucks",
    "folgers",
    "lavazza",
    "san pellegrino",
    "tillamook",
    "tyson",
];

const DEFAULT_CATEGORIES: &[(&str, &[&str])] = &[
    (
        "cake",
        &[
            "cake", "cheesecake", "brownie", "galette", "torte", "fudge", "pie", "truffle",
            "tiramisu", "entremet", "panettone",
        ],
    ),
    (
        "cookie",
        &["cookie", "cookies", "shortbread", "biscuit", "biscotti", "madeleine", "cannoli"],
    ),
    ("bread", &["bread", "bagel", "croissant", "muffin", "baguette", "tortilla"]),
    ("chocolate", &["chocolate", "cocoa", "praline"]),
    ("candy", &["candy", "gummy", "gummies", "lollipop", "licorice", "mints"]),
    ("snack", &["chips", "crackers", "popcorn", "pretzel", "jerky", "granola"]),
    ("nuts", &["almond", "cashew", "pistachio", "walnut", "pecan", "peanut"]),
    ("cheese", &["cheese", "brie", "cheddar", "parmesan", "mozzarella"]),
    ("seafood", &["salmon", "shrimp", "tuna", "crab", "lobster", "cod", "scallop"]),
    ("chicken", &["chicken", "turkey", "poultry"]),
    ("meat", &["beef", "steak", "pork", "bacon", "sausage", "ham", "lamb"]),
    ("coffee", &["coffee", "espresso", "k-cup", "latte"]),
    ("tea", &["tea", "matcha", "chai"]),
    ("juice", &["juice", "lemonade"]),
    ("water", &["water", "sparkling"]),
    ("fruit", &["apple", "berry", "berries", "grape", "mango", "banana", "orange"]),
    ("vegetables", &["salad", "spinach", "broccoli", "carrot", "potato", "tomato"]),
    ("flowers", &["rose", "bouquet", "orchid", "tulip", "floral"]),
    ("cleaning", &["detergent", "cleaner", "bleach", "dish soap", "laundry"]),
];
