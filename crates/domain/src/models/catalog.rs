//! Item catalog models and price normalization.
//!
//! Public rules-content feeds price items in mixed coinage. Everything is
//! normalized to gold pieces before it reaches a client.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Maximum number of items returned by a single search.
pub const MAX_CATALOG_RESULTS: usize = 50;

/// Maximum length of a normalized item description, in characters.
pub const MAX_DESCRIPTION_CHARS: usize = 500;

lazy_static::lazy_static! {
    static ref PRICE_REGEX: regex::Regex =
        regex::Regex::new(r"(?i)(\d+(?:\.\d+)?)\s*(cp|sp|gp|pp)").unwrap();
}

/// Feed an item came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CatalogSource {
    Dnd5e,
    Pf2e,
    Pf1e,
}

impl CatalogSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            CatalogSource::Dnd5e => "dnd5e",
            CatalogSource::Pf2e => "pf2e",
            CatalogSource::Pf1e => "pf1e",
        }
    }
}

impl FromStr for CatalogSource {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "dnd5e" => Ok(CatalogSource::Dnd5e),
            "pf2e" => Ok(CatalogSource::Pf2e),
            "pf1e" => Ok(CatalogSource::Pf1e),
            _ => Err(format!("Invalid catalog source: {}", s)),
        }
    }
}

impl fmt::Display for CatalogSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Normalized item returned by catalog searches.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct CatalogItem {
    pub name: String,
    pub value_gp: f64,
    pub description: String,
    pub source: CatalogSource,
}

/// Converts an amount in the given coin to gold pieces.
///
/// Unknown coin names are treated as gold.
pub fn coin_to_gp(amount: f64, coin: &str) -> f64 {
    match coin.trim().to_lowercase().as_str() {
        "cp" => amount / 100.0,
        "sp" => amount / 10.0,
        "ep" => amount / 2.0,
        "pp" => amount * 10.0,
        _ => amount,
    }
}

/// Estimated market value of a 5e magic item by rarity.
pub fn rarity_price_gp(rarity: &str) -> f64 {
    match rarity.trim().to_lowercase().as_str() {
        "common" => 100.0,
        "uncommon" => 500.0,
        "rare" => 5_000.0,
        "very rare" => 50_000.0,
        "legendary" => 500_000.0,
        _ => 0.0,
    }
}

/// Parses a free-form price such as `"1,000 gp"` or `"5 sp"`.
///
/// `"varies"`, `"—"` and anything without an amount and coin yield 0.
pub fn parse_price_string(price: &str) -> f64 {
    let cleaned = price.replace(',', "");
    PRICE_REGEX
        .captures(&cleaned)
        .and_then(|caps| {
            let amount: f64 = caps.get(1)?.as_str().parse().ok()?;
            Some(coin_to_gp(amount, caps.get(2)?.as_str()))
        })
        .unwrap_or(0.0)
}

/// Cuts a description down to `MAX_DESCRIPTION_CHARS` characters.
pub fn truncate_description(text: &str) -> String {
    text.chars().take(MAX_DESCRIPTION_CHARS).collect()
}

/// Case-insensitive substring match used by every catalog.
pub fn name_matches(name: &str, query: &str) -> bool {
    name.to_lowercase().contains(&query.trim().to_lowercase())
}
