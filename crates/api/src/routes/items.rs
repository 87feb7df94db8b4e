//! Item catalog search.

use axum::{
    extract::{Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::warn;

use domain::models::{CatalogItem, CatalogSource};

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::UserAuth;

/// Shortest query worth sending to a feed.
const MIN_QUERY_CHARS: usize = 2;

#[derive(Debug, Deserialize)]
pub struct ItemSearchQuery {
    pub source: String,
    #[serde(default)]
    pub q: String,
}

#[derive(Debug, Serialize)]
pub struct ItemSearchResponse {
    pub items: Vec<CatalogItem>,
    /// Set when the feed could not be reached; `items` is then empty.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Search a rules-content feed for items by name.
///
/// GET /api/v1/items/search?source=dnd5e&q=sword
///
/// Feed failures degrade to an empty result with an `error` note rather
/// than failing the request.
pub async fn search_items(
    State(state): State<AppState>,
    _user_auth: UserAuth,
    Query(query): Query<ItemSearchQuery>,
) -> Result<Json<ItemSearchResponse>, ApiError> {
    let source: CatalogSource = query.source.parse().map_err(ApiError::Validation)?;
    let term = query.q.trim();
    if term.chars().count() < MIN_QUERY_CHARS {
        return Ok(Json(ItemSearchResponse {
            items: Vec::new(),
            error: None,
        }));
    }

    match state.catalog.search(source, term).await {
        Ok(items) => Ok(Json(ItemSearchResponse { items, error: None })),
        Err(e) => {
            warn!(source = %source, error = %e, "Item catalog search failed");
            Ok(Json(ItemSearchResponse {
                items: Vec::new(),
                error: Some(e.to_string()),
            }))
        }
    }
}
