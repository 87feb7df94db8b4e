//! Invite notification seam.
//!
//! The api crate implements [`InviteNotifier`] on top of its email service.
//! Sending is best-effort: failures are reported back, never raised.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::models::InviteRole;

/// Content of an invite email.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct InviteEmail {
    pub recipient: String,
    pub inviter_name: String,
    pub campaign_name: String,
    pub role: InviteRole,
    pub link: String,
    pub expires_at: DateTime<Utc>,
}

/// Result of a notification send attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotificationResult {
    /// Notification was sent successfully.
    Sent,
    /// Notification sending failed (but was non-blocking).
    Failed(String),
    /// Email delivery is switched off for this deployment.
    Skipped,
}

/// Delivers invite emails.
#[async_trait::async_trait]
pub trait InviteNotifier: Send + Sync {
    async fn send_invite(&self, email: &InviteEmail) -> NotificationResult;
}

/// Mock notifier for development and testing.
///
/// Records every email it is asked to send.
#[derive(Debug, Clone, Default)]
pub struct MockInviteNotifier {
    /// Whether to simulate failures for testing.
    pub simulate_failure: bool,
    /// Whether to behave like a deployment with email switched off.
    pub disabled: bool,
    /// Artificial latency before responding.
    pub delay: Option<Duration>,
    sent: Arc<Mutex<Vec<InviteEmail>>>,
}

impl MockInviteNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a mock notifier that simulates failures.
    pub fn failing() -> Self {
        Self {
            simulate_failure: true,
            ..Self::default()
        }
    }

    pub fn disabled() -> Self {
        Self {
            disabled: true,
            ..Self::default()
        }
    }

    pub fn slow(delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Self::default()
        }
    }

    /// Emails recorded so far.
    pub fn sent(&self) -> Vec<InviteEmail> {
        self.sent.lock().map(|s| s.clone()).unwrap_or_default()
    }
}

#[async_trait::async_trait]
impl InviteNotifier for MockInviteNotifier {
    async fn send_invite(&self, email: &InviteEmail) -> NotificationResult {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        if self.disabled {
            return NotificationResult::Skipped;
        }

        if self.simulate_failure {
            tracing::warn!(
                recipient = %email.recipient,
                "Mock invite notifier simulating failure"
            );
            return NotificationResult::Failed("Simulated failure".to_string());
        }

        tracing::info!(
            recipient = %email.recipient,
            campaign = %email.campaign_name,
            role = %email.role,
            "Mock: Would send campaign invite email"
        );
        if let Ok(mut sent) = self.sent.lock() {
            sent.push(email.clone());
        }

        NotificationResult::Sent
    }
}
