//! Domain services for Loot Tracker.
//!
//! Services contain business logic that operates on domain models.

pub mod campaign;
pub mod clock;
pub mod invite;
pub mod notification;

use std::future::Future;
use std::time::Duration;

use uuid::Uuid;

use crate::error::CampaignError;
use crate::models::{Membership, PermissionPolicy};
use crate::store::CampaignStore;

pub use campaign::CampaignService;
pub use clock::{Clock, FixedClock, SystemClock};
pub use invite::InviteService;
pub use notification::{InviteEmail, InviteNotifier, MockInviteNotifier, NotificationResult};

/// Settings shared by the campaign and invite services.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Base URL of the web app; invite links are `<app_origin>?invite=<token>`.
    pub app_origin: String,
    pub store_timeout: Duration,
    pub notify_timeout: Duration,
    pub policy: PermissionPolicy,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            app_origin: "http://localhost:5173".to_string(),
            store_timeout: Duration::from_secs(5),
            notify_timeout: Duration::from_secs(10),
            policy: PermissionPolicy::default(),
        }
    }
}

/// Runs a store call under `limit`, turning an elapsed timer into `TransientIo`.
pub(crate) async fn bounded<T, F>(limit: Duration, operation: &str, fut: F) -> Result<T, CampaignError>
where
    F: Future<Output = Result<T, CampaignError>>,
{
    match tokio::time::timeout(limit, fut).await {
        Ok(result) => result,
        Err(_) => {
            tracing::warn!(operation, timeout_ms = limit.as_millis() as u64, "Store call timed out");
            Err(CampaignError::TransientIo(format!(
                "{} timed out after {}ms",
                operation,
                limit.as_millis()
            )))
        }
    }
}

/// Loads the caller's membership. Non-members see the campaign as missing.
pub(crate) async fn require_membership(
    store: &dyn CampaignStore,
    limit: Duration,
    campaign_id: Uuid,
    user_id: Uuid,
) -> Result<Membership, CampaignError> {
    bounded(limit, "get_membership", store.get_membership(campaign_id, user_id))
        .await?
        .ok_or_else(|| CampaignError::not_found("Campaign"))
}
