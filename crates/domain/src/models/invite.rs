//! Invite domain models for email-based campaign invitations.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;
use validator::Validate;

use super::campaign::{CampaignRole, GameSystem};
use crate::error::CampaignError;

/// Invites expire this many days after creation.
pub const INVITE_TTL_DAYS: i64 = 7;

/// Role granted on acceptance. Owner can never be granted through an invite.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InviteRole {
    Contributor,
    Viewer,
}

impl InviteRole {
    /// Converts invite-time vocabulary into a membership role.
    ///
    /// `player` and `dm` are the words the invite form uses; both map to
    /// contributor. `owner` and anything unknown are rejected.
    pub fn parse(raw: &str) -> Result<Self, CampaignError> {
        match raw.trim().to_lowercase().as_str() {
            "player" | "dm" | "contributor" => Ok(InviteRole::Contributor),
            "viewer" => Ok(InviteRole::Viewer),
            other => Err(CampaignError::validation(format!(
                "Invalid invite role: {}",
                other
            ))),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            InviteRole::Contributor => "contributor",
            InviteRole::Viewer => "viewer",
        }
    }

    /// Wording used in invite emails.
    pub fn display_label(&self) -> &'static str {
        match self {
            InviteRole::Contributor => "Contributor",
            InviteRole::Viewer => "Viewer",
        }
    }
}

impl From<InviteRole> for CampaignRole {
    fn from(role: InviteRole) -> Self {
        match role {
            InviteRole::Contributor => CampaignRole::Contributor,
            InviteRole::Viewer => CampaignRole::Viewer,
        }
    }
}

impl fmt::Display for InviteRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Stored invite status. Expiry is derived, never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InviteStatus {
    Pending,
    Accepted,
    Declined,
}

impl InviteStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            InviteStatus::Pending => "pending",
            InviteStatus::Accepted => "accepted",
            InviteStatus::Declined => "declined",
        }
    }
}

impl FromStr for InviteStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pending" => Ok(InviteStatus::Pending),
            "accepted" => Ok(InviteStatus::Accepted),
            "declined" => Ok(InviteStatus::Declined),
            _ => Err(format!("Invalid invite status: {}", s)),
        }
    }
}

impl fmt::Display for InviteStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A campaign invitation addressed to one email address.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Invite {
    pub id: Uuid,
    pub token: String,
    pub campaign_id: Uuid,
    pub inviter_id: Uuid,
    pub invitee_email: String,
    pub role: InviteRole,
    pub status: InviteStatus,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub resolved_at: Option<DateTime<Utc>>,
}

impl Invite {
    /// Builds a fresh pending invite. `invitee_email` must already be normalized.
    pub fn new(
        campaign_id: Uuid,
        inviter_id: Uuid,
        invitee_email: String,
        role: InviteRole,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            token: shared::crypto::generate_invite_token(),
            campaign_id,
            inviter_id,
            invitee_email,
            role,
            status: InviteStatus::Pending,
            created_at: now,
            expires_at: now + Duration::days(INVITE_TTL_DAYS),
            resolved_at: None,
        }
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    pub fn is_pending(&self) -> bool {
        self.status == InviteStatus::Pending
    }

    /// Checks that `requester_email` may act on this invite right now.
    ///
    /// Order matters: a mismatched identity is reported as not found so a
    /// leaked token reveals nothing, then expiry, then terminal status.
    pub fn check_redeemable(
        &self,
        requester_email: &str,
        now: DateTime<Utc>,
    ) -> Result<(), CampaignError> {
        if !shared::validation::emails_match(&self.invitee_email, requester_email) {
            return Err(CampaignError::NotFound(
                "Invite not found or not addressed to you".to_string(),
            ));
        }
        if self.is_expired(now) {
            return Err(CampaignError::Expired);
        }
        if !self.is_pending() {
            return Err(CampaignError::AlreadyResolved(self.status.to_string()));
        }
        Ok(())
    }

    /// Moves a pending invite into a terminal status.
    pub fn resolve(&mut self, status: InviteStatus, now: DateTime<Utc>) {
        self.status = status;
        self.resolved_at = Some(now);
    }

    /// Accept link sent to the invitee.
    pub fn link(&self, app_origin: &str) -> String {
        format!("{}?invite={}", app_origin.trim_end_matches('/'), self.token)
    }
}

/// Result of `lookup_invite_by_token`: the invite plus the campaign fields
/// needed to render it to someone who is not yet a member.
#[derive(Debug, Clone)]
pub struct InviteLookup {
    pub invite: Invite,
    pub campaign_name: String,
    pub game_system: GameSystem,
    pub inviter_email: Option<String>,
}

/// What an invitee sees before accepting.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct InvitePreview {
    pub campaign_id: Uuid,
    pub campaign_name: String,
    pub game_system: GameSystem,
    pub role: InviteRole,
    pub inviter_email: Option<String>,
    pub expires_at: DateTime<Utc>,
}

impl From<InviteLookup> for InvitePreview {
    fn from(lookup: InviteLookup) -> Self {
        Self {
            campaign_id: lookup.invite.campaign_id,
            campaign_name: lookup.campaign_name,
            game_system: lookup.game_system,
            role: lookup.invite.role,
            inviter_email: lookup.inviter_email,
            expires_at: lookup.invite.expires_at,
        }
    }
}

/// Outcome of the best-effort invite email.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum InviteDelivery {
    Sent,
    Unsent { reason: String },
    Disabled,
}

/// Returned to the inviter after creating an invite.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct CreatedInvite {
    pub invite: Invite,
    pub link: String,
    pub delivery: InviteDelivery,
}

/// Request payload for creating an invite.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "snake_case")]
pub struct CreateInviteRequest {
    #[validate(length(min = 1, max = 254, message = "Email must be 1 to 254 characters"))]
    pub email: String,

    /// `contributor`, `viewer`, or the invite-form words `player` / `dm`.
    #[serde(default = "default_invite_role")]
    pub role: String,
}

fn default_invite_role() -> String {
    "player".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pending_invite(now: DateTime<Utc>) -> Invite {
        Invite::new(
            Uuid::new_v4(),
            Uuid::new_v4(),
            "bob@example.com".to_string(),
            InviteRole::Contributor,
            now,
        )
    }

    #[test]
    fn test_invite_role_conversion() {
        assert_eq!(InviteRole::parse("player").unwrap(), InviteRole::Contributor);
        assert_eq!(InviteRole::parse("dm").unwrap(), InviteRole::Contributor);
        assert_eq!(InviteRole::parse("DM").unwrap(), InviteRole::Contributor);
        assert_eq!(
            InviteRole::parse("contributor").unwrap(),
            InviteRole::Contributor
        );
        assert_eq!(InviteRole::parse("viewer").unwrap(), InviteRole::Viewer);
        assert!(matches!(
            InviteRole::parse("owner"),
            Err(CampaignError::Validation(_))
        ));
        assert!(matches!(
            InviteRole::parse("admin"),
            Err(CampaignError::Validation(_))
        ));
        assert!(matches!(
            InviteRole::parse(""),
            Err(CampaignError::Validation(_))
        ));
    }

    #[test]
    fn test_invite_role_never_maps_to_owner() {
        for role in [InviteRole::Contributor, InviteRole::Viewer] {
            assert_ne!(CampaignRole::from(role), CampaignRole::Owner);
        }
    }

    #[test]
    fn test_new_invite_expires_after_seven_days() {
        let now = Utc::now();
        let invite = pending_invite(now);
        assert_eq!(invite.expires_at - invite.created_at, Duration::days(7));
        assert_eq!(invite.status, InviteStatus::Pending);
        assert!(invite.resolved_at.is_none());
    }

    #[test]
    fn test_expiry_boundary() {
        let now = Utc::now();
        let invite = pending_invite(now);
        assert!(!invite.is_expired(invite.expires_at - Duration::seconds(1)));
        assert!(invite.is_expired(invite.expires_at));
        assert!(invite.is_expired(invite.expires_at + Duration::days(1)));
    }

    #[test]
    fn test_check_redeemable_is_case_insensitive() {
        let now = Utc::now();
        let invite = pending_invite(now);
        assert!(invite.check_redeemable("Bob@Example.com", now).is_ok());
    }

    #[test]
    fn test_check_redeemable_wrong_email_is_not_found() {
        let now = Utc::now();
        let invite = pending_invite(now);
        assert!(matches!(
            invite.check_redeemable("carol@example.com", now),
            Err(CampaignError::NotFound(_))
        ));
    }

    #[test]
    fn test_check_redeemable_wrong_email_wins_over_expiry() {
        let now = Utc::now();
        let invite = pending_invite(now);
        let later = now + Duration::days(8);
        assert!(matches!(
            invite.check_redeemable("carol@example.com", later),
            Err(CampaignError::NotFound(_))
        ));
        assert!(matches!(
            invite.check_redeemable("bob@example.com", later),
            Err(CampaignError::Expired)
        ));
    }

    #[test]
    fn test_check_redeemable_expired_wins_over_resolved() {
        let now = Utc::now();
        let mut invite = pending_invite(now);
        invite.resolve(InviteStatus::Accepted, now);
        assert!(matches!(
            invite.check_redeemable("bob@example.com", now),
            Err(CampaignError::AlreadyResolved(ref s)) if s == "accepted"
        ));
        assert!(matches!(
            invite.check_redeemable("bob@example.com", now + Duration::days(7)),
            Err(CampaignError::Expired)
        ));
    }

    #[test]
    fn test_link() {
        let invite = pending_invite(Utc::now());
        assert_eq!(
            invite.link("https://loot.example.com/"),
            format!("https://loot.example.com?invite={}", invite.token)
        );
    }

    #[test]
    fn test_status_from_str() {
        assert_eq!("ACCEPTED".parse::<InviteStatus>().unwrap(), InviteStatus::Accepted);
        assert!("expired".parse::<InviteStatus>().is_err());
    }

    #[test]
    fn test_delivery_serialization() {
        let json = serde_json::to_value(InviteDelivery::Unsent {
            reason: "timeout".into(),
        })
        .unwrap();
        assert_eq!(json["status"], "unsent");
        assert_eq!(json["reason"], "timeout");
    }

    #[test]
    fn test_create_request_email_length_message() {
        for email in [String::new(), format!("{}@example.com", "a".repeat(250))] {
            let request = CreateInviteRequest {
                email,
                role: default_invite_role(),
            };
            let errors = request.validate().unwrap_err();
            let field_errors = errors.field_errors();
            assert_eq!(
                field_errors["email"][0].message.as_deref(),
                Some("Email must be 1 to 254 characters")
            );
        }
    }
}
