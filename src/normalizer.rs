use crate::model::ConfigError;
use regex::Regex;

// Straight apostrophe, curly apostrophe, or the curly one read back as cp1252.
const POSSESSIVE: &str = r"(?:â€™|[’'])s\b";

// A character class built from the letters of every unit word. It also eats
// ordinary words after a number until it meets a letter outside the class.
const LOOSE_UNITS: &str = r"\d+(\.\d+)?\s*[abcefghiklnopqrstuvxyz |?]+";

const STRICT_UNITS: &str = concat!(
    r"\d+(\.\d+)?\s*(?:fl oz|lbs?|oz|qt|count|pack|pieces?|servings?|bottles?|bags?|",
    r"slices?|cans?|box(?:es)?|gallon|tin|tray|case|each|l|g)\b",
);

/// Turns a raw product title into a short search phrase.
///
/// Brand names, possessives, quantities with units, pack descriptors,
/// parenthetical notes, digits, commas and periods are stripped in that
/// order; whitespace is then collapsed and the result cut to `max_len`
/// characters.
pub struct Normalizer {
    re_possessive: Regex,
    re_brands: Vec<Regex>,
    re_units: Regex,
    re_pack_count: Regex,
    re_parenthetical: Regex,
    re_digits: Regex,
    re_punct: Regex,
    re_spaces: Regex,
    max_len: usize,
}

impl Normalizer {
    pub fn new(
        brands: &[String],
        max_len: usize,
        strict_units: bool,
    ) -> Result<Self, ConfigError> {
        let re_brands = brands
            .iter()
            .map(|b| brand_pattern(&b.to_lowercase()))
            .filter(|p| !p.is_empty())
            .map(|p| Regex::new(&format!(r"\b{}\b", p)))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            re_possessive: Regex::new(POSSESSIVE)?,
            re_brands,
            re_units: Regex::new(if strict_units { STRICT_UNITS } else { LOOSE_UNITS })?,
            re_pack_count: Regex::new(r"\d+\s*-\s*\w+")?,
            re_parenthetical: Regex::new(r"\(.*?\)")?,
            re_digits: Regex::new(r"\d+")?,
            re_punct: Regex::new(r"[,.]")?,
            re_spaces: Regex::new(r"\s+")?,
            max_len,
        })
    }

    pub fn normalize(&self, title: &str) -> String {
        let mut name = title.to_lowercase();
        name = self.re_possessive.replace_all(&name, "").into_owned();
        for re in &self.re_brands {
            name = re.replace_all(&name, "").into_owned();
        }
        name = self.re_units.replace_all(&name, "").into_owned();
        name = self.re_pack_count.replace_all(&name, "").into_owned();
        name = self.re_parenthetical.replace_all(&name, "").into_owned();
        name = self.re_digits.replace_all(&name, "").into_owned();
        name = self.re_punct.replace_all(&name, "").into_owned();
        let collapsed = self.re_spaces.replace_all(&name, " ");

        collapsed.trim().chars().take(self.max_len).collect()
    }
}

// Brand words may be separated by any run of whitespace in a title.
fn brand_pattern(brand: &str) -> String {
    brand
        .split_whitespace()
        .map(regex::escape)
        .collect::<Vec<_>>()
        .join(r"\s+")
}
