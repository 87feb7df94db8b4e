//! Campaign membership and user profile models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::campaign::CampaignRole;

/// A user's membership in a campaign. At most one per (campaign, user).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Membership {
    pub campaign_id: Uuid,
    pub user_id: Uuid,
    pub role: CampaignRole,
    pub invited_by: Option<Uuid>,
    pub joined_at: DateTime<Utc>,
}

/// Mirror of the identity provider's user, kept so emails can be looked up by id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct UserProfile {
    pub user_id: Uuid,
    pub email: String,
    pub display_name: Option<String>,
}

/// Member row shown in the member management view.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct MemberView {
    pub user_id: Uuid,
    pub email: String,
    pub role: CampaignRole,
    pub joined_at: DateTime<Utc>,
    pub is_you: bool,
}

/// Request payload for changing a member's role.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ChangeMemberRoleRequest {
    pub role: CampaignRole,
}

/// Label used when a member's email cannot be looked up.
pub fn fallback_member_label(user_id: Uuid) -> String {
    let id = user_id.to_string();
    format!("User {}...", &id[..8])
}

/// Orders members owner first, then contributors, then viewers, oldest first within a role.
pub fn sort_members(members: &mut [MemberView]) {
    members.sort_by(|a, b| {
        b.role
            .rank()
            .cmp(&a.role.rank())
            .then(a.joined_at.cmp(&b.joined_at))
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn member(role: CampaignRole, joined_at: DateTime<Utc>) -> MemberView {
        MemberView {
            user_id: Uuid::new_v4(),
            email: "x@example.com".to_string(),
            role,
            joined_at,
            is_you: false,
        }
    }

    #[test]
    fn test_fallback_member_label() {
        let id = Uuid::parse_str("1234abcd-0000-0000-0000-000000000000").unwrap();
        assert_eq!(fallback_member_label(id), "User 1234abcd...");
    }

    #[test]
    fn test_sort_members() {
        let t0 = Utc::now();
        let mut members = vec![
            member(CampaignRole::Viewer, t0),
            member(CampaignRole::Contributor, t0 + Duration::hours(2)),
            member(CampaignRole::Owner, t0 + Duration::hours(5)),
            member(CampaignRole::Contributor, t0 + Duration::hours(1)),
        ];
        sort_members(&mut members);

        let roles: Vec<_> = members.iter().map(|m| m.role).collect();
        assert_eq!(
            roles,
            vec![
                CampaignRole::Owner,
                CampaignRole::Contributor,
                CampaignRole::Contributor,
                CampaignRole::Viewer
            ]
        );
        assert!(members[1].joined_at < members[2].joined_at);
    }

    #[test]
    fn test_change_role_request_parses_role() {
        let req: ChangeMemberRoleRequest =
            serde_json::from_str(r#"{"role":"viewer"}"#).unwrap();
        assert_eq!(req.role, CampaignRole::Viewer);
        assert!(serde_json::from_str::<ChangeMemberRoleRequest>(r#"{"role":"admin"}"#).is_err());
    }
}
