use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use domain::CampaignError;
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Campaign(#[from] CampaignError),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Rate limited")]
    RateLimited,

    #[error("Internal error: {0}")]
    Internal(String),
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<Vec<ValidationDetail>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ValidationDetail {
    pub field: String,
    pub message: String,
}

/// HTTP status for each campaign failure.
fn campaign_status(err: &CampaignError) -> StatusCode {
    match err {
        CampaignError::NotFound(_) => StatusCode::NOT_FOUND,
        CampaignError::Expired => StatusCode::GONE,
        CampaignError::AlreadyResolved(_)
        | CampaignError::AlreadyMember
        | CampaignError::DuplicateInvite => StatusCode::CONFLICT,
        CampaignError::Unauthorized(_) => StatusCode::FORBIDDEN,
        CampaignError::TransientIo(_) => StatusCode::SERVICE_UNAVAILABLE,
        CampaignError::Validation(_) => StatusCode::BAD_REQUEST,
        CampaignError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code, message) = match &self {
            ApiError::Campaign(err) => {
                let status = campaign_status(err);
                let message = match err {
                    CampaignError::Store(detail) => {
                        tracing::error!(detail = %detail, "Store failure");
                        "An internal error occurred".to_string()
                    }
                    CampaignError::TransientIo(detail) => {
                        tracing::warn!(detail = %detail, "Transient store or delivery failure");
                        "Service temporarily unavailable, please retry".to_string()
                    }
                    other => other.to_string(),
                };
                (status, err.code(), message)
            }
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, "unauthorized", msg.clone()),
            ApiError::Validation(msg) => (StatusCode::BAD_REQUEST, "validation_error", msg.clone()),
            ApiError::RateLimited => (
                StatusCode::TOO_MANY_REQUESTS,
                "rate_limited",
                "Too many requests. Please try again later.".into(),
            ),
            ApiError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "An internal error occurred".into(),
                )
            }
        };

        let body = ErrorBody {
            error: error_code.into(),
            message,
            details: None,
        };

        (status, Json(body)).into_response()
    }
}

impl From<validator::ValidationErrors> for ApiError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let details: Vec<ValidationDetail> = errors
            .field_errors()
            .iter()
            .flat_map(|(field, errors)| {
                errors.iter().map(move |e| ValidationDetail {
                    field: field.to_string(),
                    message: e.message.clone().map(|m| m.to_string()).unwrap_or_default(),
                })
            })
            .collect();

        let message = if details.len() == 1 {
            details[0].message.clone()
        } else {
            format!("{} validation errors", details.len())
        };

        ApiError::Validation(message)
    }
}
