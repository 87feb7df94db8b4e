//! Session extractor for handlers.

use axum::{async_trait, extract::FromRequestParts, http::request::Parts};

use crate::app::AppState;
use crate::error::ApiError;
use crate::middleware::user_auth::authenticate;

pub use crate::middleware::user_auth::UserAuth;

#[async_trait]
impl FromRequestParts<AppState> for UserAuth {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        // Set by require_user_auth on protected routers.
        if let Some(auth) = parts.extensions.get::<UserAuth>() {
            return Ok(auth.clone());
        }

        let auth = authenticate(state, &parts.headers).await?;
        parts.extensions.insert(auth.clone());
        Ok(auth)
    }
}
