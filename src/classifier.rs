use crate::config::CategoryConfig;

pub const DEFAULT_CATEGORY: &str = "food";

/// Keyword table mapping a product title to a coarse search term.
pub struct Classifier {
    categories: Vec<CategoryConfig>,
}

impl Classifier {
    pub fn new(categories: &[CategoryConfig]) -> Self {
        let categories = categories
            .iter()
            .map(|c| CategoryConfig {
                label: c.label.clone(),
                keywords: c
                    .keywords
                    .iter()
                    .map(|k| k.to_lowercase())
                    .filter(|k| !k.is_empty())
                    .collect(),
            })
            .collect();
        Self { categories }
    }

    /// First category (in table order) with a keyword contained in the title.
    pub fn classify(&self, title: &str) -> &str {
        let title = title.to_lowercase();

        for category in &self.categories {
            for keyword in &category.keywords {
                if title.contains(keyword.as_str()) {
                    return &category.label;
                }
            }
        }

        DEFAULT_CATEGORY
    }
}
