//! Mapping from sqlx errors to the domain error taxonomy.

use domain::CampaignError;

/// Unique index guarding one pending invite per (campaign, email).
pub const PENDING_INVITE_CONSTRAINT: &str = "campaign_invites_one_pending";

/// Primary key guarding one membership per (campaign, user).
pub const MEMBERSHIP_CONSTRAINT: &str = "campaign_members_pkey";

const UNIQUE_VIOLATION: &str = "23505";

/// Converts a sqlx error into a `CampaignError`.
///
/// Known unique-constraint violations become their business errors,
/// connectivity problems become `TransientIo`, the rest become `Store`.
pub fn map_sqlx_error(err: sqlx::Error) -> CampaignError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.code().as_deref() == Some(UNIQUE_VIOLATION) {
            match db_err.constraint() {
                Some(PENDING_INVITE_CONSTRAINT) => return CampaignError::DuplicateInvite,
                Some(MEMBERSHIP_CONSTRAINT) => return CampaignError::AlreadyMember,
                _ => {}
            }
        }
    }

    match err {
        sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
            tracing::warn!(error = %err, "Database unreachable");
            CampaignError::TransientIo("database unavailable".to_string())
        }
        _ => {
            tracing::error!(error = %err, "Database error");
            CampaignError::Store("database error".to_string())
        }
    }
}
