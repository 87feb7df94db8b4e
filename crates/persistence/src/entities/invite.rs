//! Invite entity (database row mapping).

use chrono::{DateTime, Utc};
use domain::models::{GameSystem, Invite, InviteLookup, InviteRole, InviteStatus};
use domain::CampaignError;
use sqlx::FromRow;
use uuid::Uuid;

use super::campaign::CampaignRoleDb;

/// Database enum for invite_status that maps to PostgreSQL enum type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "invite_status", rename_all = "lowercase")]
pub enum InviteStatusDb {
    Pending,
    Accepted,
    Declined,
}

impl From<InviteStatusDb> for InviteStatus {
    fn from(db_status: InviteStatusDb) -> Self {
        match db_status {
            InviteStatusDb::Pending => InviteStatus::Pending,
            InviteStatusDb::Accepted => InviteStatus::Accepted,
            InviteStatusDb::Declined => InviteStatus::Declined,
        }
    }
}

impl From<InviteStatus> for InviteStatusDb {
    fn from(status: InviteStatus) -> Self {
        match status {
            InviteStatus::Pending => InviteStatusDb::Pending,
            InviteStatus::Accepted => InviteStatusDb::Accepted,
            InviteStatus::Declined => InviteStatusDb::Declined,
        }
    }
}

impl From<InviteRole> for CampaignRoleDb {
    fn from(role: InviteRole) -> Self {
        match role {
            InviteRole::Contributor => CampaignRoleDb::Contributor,
            InviteRole::Viewer => CampaignRoleDb::Viewer,
        }
    }
}

fn invite_role(db_role: CampaignRoleDb) -> Result<InviteRole, CampaignError> {
    match db_role {
        CampaignRoleDb::Contributor => Ok(InviteRole::Contributor),
        CampaignRoleDb::Viewer => Ok(InviteRole::Viewer),
        CampaignRoleDb::Owner => Err(CampaignError::Store(
            "invite row carries the owner role".to_string(),
        )),
    }
}

/// Database row mapping for the campaign_invites table.
#[derive(Debug, Clone, FromRow)]
pub struct InviteEntity {
    pub id: Uuid,
    pub token: String,
    pub campaign_id: Uuid,
    pub inviter_id: Uuid,
    pub invitee_email: String,
    pub role: CampaignRoleDb,
    pub status: InviteStatusDb,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub resolved_at: Option<DateTime<Utc>>,
}

impl TryFrom<InviteEntity> for Invite {
    type Error = CampaignError;

    fn try_from(entity: InviteEntity) -> Result<Self, Self::Error> {
        Ok(Self {
            id: entity.id,
            token: entity.token,
            campaign_id: entity.campaign_id,
            inviter_id: entity.inviter_id,
            invitee_email: entity.invitee_email,
            role: invite_role(entity.role)?,
            status: entity.status.into(),
            created_at: entity.created_at,
            expires_at: entity.expires_at,
            resolved_at: entity.resolved_at,
        })
    }
}

/// Invite joined with the campaign fields shown to a prospective member.
#[derive(Debug, Clone, FromRow)]
pub struct InviteWithCampaignEntity {
    #[sqlx(flatten)]
    pub invite: InviteEntity,
    pub campaign_name: String,
    pub game_system: String,
    pub inviter_email: Option<String>,
}

impl TryFrom<InviteWithCampaignEntity> for InviteLookup {
    type Error = CampaignError;

    fn try_from(entity: InviteWithCampaignEntity) -> Result<Self, Self::Error> {
        Ok(Self {
            invite: entity.invite.try_into()?,
            campaign_name: entity.campaign_name,
            game_system: GameSystem::from_tag(&entity.game_system),
            inviter_email: entity.inviter_email,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entity(role: CampaignRoleDb) -> InviteEntity {
        let now = Utc::now();
        InviteEntity {
            id: Uuid::new_v4(),
            token: "tok".to_string(),
            campaign_id: Uuid::new_v4(),
            inviter_id: Uuid::new_v4(),
            invitee_email: "bob@example.com".to_string(),
            role,
            status: InviteStatusDb::Pending,
            created_at: now,
            expires_at: now,
            resolved_at: None,
        }
    }

    #[test]
    fn test_invite_entity_conversion() {
        let invite = Invite::try_from(entity(CampaignRoleDb::Viewer)).unwrap();
        assert_eq!(invite.role, InviteRole::Viewer);
        assert_eq!(invite.status, InviteStatus::Pending);
    }

    #[test]
    fn test_owner_role_on_invite_row_is_store_error() {
        assert!(matches!(
            Invite::try_from(entity(CampaignRoleDb::Owner)),
            Err(CampaignError::Store(_))
        ));
    }

    #[test]
    fn test_lookup_conversion() {
        let lookup = InviteLookup::try_from(InviteWithCampaignEntity {
            invite: entity(CampaignRoleDb::Contributor),
            campaign_name: "Kingmaker".to_string(),
            game_system: "pathfinder-1e".to_string(),
            inviter_email: None,
        })
        .unwrap();
        assert_eq!(lookup.campaign_name, "Kingmaker");
        assert_eq!(lookup.game_system, GameSystem::Pathfinder1e);
    }
}
