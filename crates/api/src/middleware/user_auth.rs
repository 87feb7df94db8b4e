//! Session authentication middleware.
//!
//! Sessions are issued by the identity provider; this service only verifies
//! the bearer token and mirrors the user's email into the profile table.

use axum::{
    body::Body,
    extract::State,
    http::{HeaderMap, Request},
    middleware::Next,
    response::{IntoResponse, Response},
};
use axum_extra::headers::{authorization::Bearer, Authorization, HeaderMapExt};
use uuid::Uuid;

use domain::models::UserProfile;
use shared::jwt::{extract_user_id, JwtConfig, JwtError};
use shared::validation::normalize_email;

use crate::app::AppState;
use crate::error::ApiError;

/// Authenticated user information extracted from the session token.
#[derive(Debug, Clone)]
pub struct UserAuth {
    pub user_id: Uuid,
    /// Normalized email from the token claims.
    pub email: String,
    pub display_name: Option<String>,
}

impl UserAuth {
    /// Validates a session token and returns the user it belongs to.
    pub fn validate(jwt: &JwtConfig, token: &str) -> Result<Self, JwtError> {
        let claims = jwt.validate_session_token(token)?;
        let user_id = extract_user_id(&claims)?;
        Ok(UserAuth {
            user_id,
            email: normalize_email(&claims.email),
            display_name: claims.name,
        })
    }

    pub fn profile(&self) -> UserProfile {
        UserProfile {
            user_id: self.user_id,
            email: self.email.clone(),
            display_name: self.display_name.clone(),
        }
    }
}

/// Verifies the bearer token in `headers` and refreshes the profile mirror.
pub async fn authenticate(state: &AppState, headers: &HeaderMap) -> Result<UserAuth, ApiError> {
    let Authorization(bearer) = headers
        .typed_get::<Authorization<Bearer>>()
        .ok_or_else(|| ApiError::Unauthorized("Missing or invalid Authorization header".into()))?;

    let auth = UserAuth::validate(&state.jwt, bearer.token()).map_err(|e| {
        tracing::debug!(error = %e, "Session token rejected");
        ApiError::Unauthorized("Invalid or expired token".into())
    })?;

    state.campaigns.sync_profile(&auth.profile()).await?;
    Ok(auth)
}

/// Middleware that requires an authenticated session.
///
/// The verified user is stored in request extensions for the rate limiter
/// and the `UserAuth` extractor.
pub async fn require_user_auth(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    match authenticate(&state, req.headers()).await {
        Ok(auth) => {
            req.extensions_mut().insert(auth);
            next.run(req).await
        }
        Err(err) => err.into_response(),
    }
}
