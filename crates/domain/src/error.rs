//! Domain error taxonomy for campaign and invite operations.

use thiserror::Error;

/// Errors produced by campaign, membership and invite operations.
///
/// Business-rule violations are terminal and shown to the user as-is.
/// `TransientIo` means the store or the mail dispatcher could not be reached
/// in time; the underlying record stays valid and the caller may retry.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CampaignError {
    #[error("{0}")]
    NotFound(String),

    #[error("This invite has expired")]
    Expired,

    #[error("This invite has already been {0}")]
    AlreadyResolved(String),

    #[error("You are already a member of this campaign")]
    AlreadyMember,

    #[error("A pending invite already exists for this email")]
    DuplicateInvite,

    #[error("{0}")]
    Unauthorized(String),

    #[error("Service temporarily unavailable: {0}")]
    TransientIo(String),

    #[error("{0}")]
    Validation(String),

    #[error("Store error: {0}")]
    Store(String),
}

impl CampaignError {
    pub fn not_found(what: &str) -> Self {
        Self::NotFound(format!("{} not found", what))
    }

    pub fn unauthorized(reason: impl Into<String>) -> Self {
        Self::Unauthorized(reason.into())
    }

    pub fn validation(reason: impl Into<String>) -> Self {
        Self::Validation(reason.into())
    }

    /// Machine-readable code reported to clients.
    pub fn code(&self) -> &'static str {
        match self {
            CampaignError::NotFound(_) => "not_found",
            CampaignError::Expired => "invite_expired",
            CampaignError::AlreadyResolved(_) => "invite_already_resolved",
            CampaignError::AlreadyMember => "already_member",
            CampaignError::DuplicateInvite => "duplicate_invite",
            CampaignError::Unauthorized(_) => "forbidden",
            CampaignError::TransientIo(_) => "transient_io",
            CampaignError::Validation(_) => "validation_error",
            CampaignError::Store(_) => "internal_error",
        }
    }

    /// Returns true if retrying the same call may succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, CampaignError::TransientIo(_))
    }
}
