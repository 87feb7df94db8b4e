//! Item lookup against public rules-content feeds.
//!
//! Supports the D&D 5e SRD API, the Pf2eTools Core Rulebook item list and
//! PSRD-Data for Pathfinder 1e. Results are normalized to gold pieces.

use std::time::Duration;

use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

use domain::models::catalog::{
    coin_to_gp, name_matches, parse_price_string, rarity_price_gp, truncate_description,
    MAX_CATALOG_RESULTS,
};
use domain::models::{CatalogItem, CatalogSource};

use crate::config::CatalogConfig;

/// Detail lookups per 5e list; each costs one extra request.
const DND5E_DETAIL_LIMIT: usize = 10;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Item catalog is disabled")]
    Disabled,

    #[error("Request timeout after {0}ms")]
    Timeout(u64),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Catalog returned status {0}")]
    Status(u16),

    #[error("Unexpected catalog format: {0}")]
    InvalidResponse(String),
}

// ============================================================================
// Feed shapes
// ============================================================================

#[derive(Debug, Deserialize)]
struct Dnd5eIndex {
    #[serde(default)]
    results: Vec<Dnd5eIndexEntry>,
}

#[derive(Debug, Deserialize)]
struct Dnd5eIndexEntry {
    name: String,
    url: String,
}

#[derive(Debug, Deserialize)]
struct Dnd5eCost {
    quantity: f64,
    unit: String,
}

#[derive(Debug, Deserialize)]
struct Dnd5eNamed {
    name: String,
}

#[derive(Debug, Deserialize)]
struct Dnd5eDetail {
    name: String,
    #[serde(default)]
    cost: Option<Dnd5eCost>,
    #[serde(default)]
    rarity: Option<Dnd5eNamed>,
    #[serde(default)]
    desc: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct Pf2ePrice {
    #[serde(default)]
    amount: f64,
    #[serde(default)]
    coin: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Pf2eItem {
    name: String,
    #[serde(default)]
    price: Option<Pf2ePrice>,
    #[serde(default)]
    entries: Vec<Value>,
}

#[derive(Debug, Deserialize)]
struct Pf2eFile {
    #[serde(default)]
    item: Vec<Pf2eItem>,
}

// ============================================================================
// Normalization
// ============================================================================

fn dnd5e_item(detail: Dnd5eDetail) -> CatalogItem {
    let value_gp = match (&detail.cost, &detail.rarity) {
        (Some(cost), _) => coin_to_gp(cost.quantity, &cost.unit),
        (None, Some(rarity)) => rarity_price_gp(&rarity.name),
        (None, None) => 0.0,
    };
    CatalogItem {
        name: detail.name,
        value_gp,
        description: truncate_description(&detail.desc.join(" ")),
        source: CatalogSource::Dnd5e,
    }
}

/// Filters and normalizes a Pf2eTools item file.
fn pf2e_items(file: Pf2eFile, query: &str) -> Vec<CatalogItem> {
    file.item
        .into_iter()
        .filter(|item| name_matches(&item.name, query))
        .take(MAX_CATALOG_RESULTS)
        .map(|item| {
            let value_gp = item
                .price
                .map(|p| coin_to_gp(p.amount, p.coin.as_deref().unwrap_or("gp")))
                .unwrap_or(0.0);
            // Only plain-text entries; nested tables and lists are dropped.
            let description = item
                .entries
                .iter()
                .filter_map(Value::as_str)
                .collect::<Vec<_>>()
                .join(" ");
            CatalogItem {
                name: item.name,
                value_gp,
                description: truncate_description(&description),
                source: CatalogSource::Pf2e,
            }
        })
        .collect()
}

/// Collects candidate entries from a PSRD-Data payload.
///
/// Reads a top-level array, an `items` array, or an object whose values are
/// either arrays of items (flattened) or single item objects.
fn pf1e_entries(data: Value) -> Result<Vec<Value>, CatalogError> {
    match data {
        Value::Array(items) => Ok(items),
        Value::Object(mut map) => {
            if let Some(Value::Array(items)) = map.remove("items") {
                return Ok(items);
            }
            let mut entries = Vec::new();
            for (_, value) in map {
                match value {
                    Value::Array(items) => entries.extend(items),
                    Value::Object(_) => entries.push(value),
                    _ => {}
                }
            }
            Ok(entries)
        }
        _ => Err(CatalogError::InvalidResponse(
            "expected an array or object of items".to_string(),
        )),
    }
}

/// Filters and normalizes PSRD-Data items. A missing price counts as 0 gp.
fn pf1e_items(data: Value, query: &str) -> Result<Vec<CatalogItem>, CatalogError> {
    let mut items: Vec<CatalogItem> = pf1e_entries(data)?
        .iter()
        .filter_map(|entry| {
            let name = entry.get("name")?.as_str()?;
            name_matches(name, query).then(|| CatalogItem {
                name: name.to_string(),
                value_gp: entry
                    .get("price")
                    .and_then(Value::as_str)
                    .map(parse_price_string)
                    .unwrap_or(0.0),
                description: truncate_description(
                    entry
                        .get("body")
                        .or_else(|| entry.get("description"))
                        .and_then(Value::as_str)
                        .unwrap_or_default(),
                ),
                source: CatalogSource::Pf1e,
            })
        })
        .collect();
    items.sort_by(|a, b| a.name.cmp(&b.name));
    items.truncate(MAX_CATALOG_RESULTS);
    Ok(items)
}

// ============================================================================
// Client
// ============================================================================

/// HTTP client for the item feeds.
#[derive(Clone)]
pub struct ItemCatalog {
    client: Client,
    config: CatalogConfig,
}

impl ItemCatalog {
    pub fn new(config: CatalogConfig) -> Result<Self, CatalogError> {
        let client = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()?;
        Ok(Self { client, config })
    }

    /// Searches one feed by case-insensitive name substring, at most 50 results.
    pub async fn search(
        &self,
        source: CatalogSource,
        query: &str,
    ) -> Result<Vec<CatalogItem>, CatalogError> {
        if !self.config.enabled {
            return Err(CatalogError::Disabled);
        }

        let items = match source {
            CatalogSource::Dnd5e => self.search_dnd5e(query).await?,
            CatalogSource::Pf2e => {
                let file: Pf2eFile = self.get_json(&self.config.pf2e_items_url).await?;
                pf2e_items(file, query)
            }
            CatalogSource::Pf1e => {
                let data: Value = self.get_json(&self.config.pf1e_items_url).await?;
                pf1e_items(data, query)?
            }
        };

        debug!(source = %source, query, results = items.len(), "Catalog search");
        Ok(items)
    }

    async fn search_dnd5e(&self, query: &str) -> Result<Vec<CatalogItem>, CatalogError> {
        let base = self.config.dnd5e_api_url.trim_end_matches('/');
        let mut items = Vec::new();

        for list in ["equipment", "magic-items"] {
            let index: Dnd5eIndex = self.get_json(&format!("{base}/api/{list}")).await?;
            let matches = index
                .results
                .into_iter()
                .filter(|entry| name_matches(&entry.name, query))
                .take(DND5E_DETAIL_LIMIT);

            for entry in matches {
                match self
                    .get_json::<Dnd5eDetail>(&format!("{base}{}", entry.url))
                    .await
                {
                    Ok(detail) => items.push(dnd5e_item(detail)),
                    Err(e) => warn!(item = %entry.name, error = %e, "Skipping 5e item detail"),
                }
            }
        }

        items.truncate(MAX_CATALOG_RESULTS);
        Ok(items)
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, url: &str) -> Result<T, CatalogError> {
        let response = self.client.get(url).send().await.map_err(|e| {
            if e.is_timeout() {
                CatalogError::Timeout(self.config.timeout_ms)
            } else {
                CatalogError::Http(e)
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(CatalogError::Status(status.as_u16()));
        }

        response
            .json::<T>()
            .await
            .map_err(|e| CatalogError::InvalidResponse(e.to_string()))
    }
}
