//! Campaign, membership and party fund entities (database row mappings).

use chrono::{DateTime, Utc};
use domain::models::{
    Campaign, CampaignRole, CampaignSummary, GameSystem, Membership, PartyFund,
};
use sqlx::FromRow;
use uuid::Uuid;

/// Database enum for campaign_role that maps to PostgreSQL enum type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "campaign_role", rename_all = "lowercase")]
pub enum CampaignRoleDb {
    Owner,
    Contributor,
    Viewer,
}

impl From<CampaignRoleDb> for CampaignRole {
    fn from(db_role: CampaignRoleDb) -> Self {
        match db_role {
            CampaignRoleDb::Owner => CampaignRole::Owner,
            CampaignRoleDb::Contributor => CampaignRole::Contributor,
            CampaignRoleDb::Viewer => CampaignRole::Viewer,
        }
    }
}

impl From<CampaignRole> for CampaignRoleDb {
    fn from(role: CampaignRole) -> Self {
        match role {
            CampaignRole::Owner => CampaignRoleDb::Owner,
            CampaignRole::Contributor => CampaignRoleDb::Contributor,
            CampaignRole::Viewer => CampaignRoleDb::Viewer,
        }
    }
}

/// Database row mapping for the campaigns table.
#[derive(Debug, Clone, FromRow)]
pub struct CampaignEntity {
    pub id: Uuid,
    pub name: String,
    pub owner_id: Uuid,
    pub game_system: String,
    pub party_fund_gets_share: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<CampaignEntity> for Campaign {
    fn from(entity: CampaignEntity) -> Self {
        Self {
            id: entity.id,
            name: entity.name,
            owner_id: entity.owner_id,
            game_system: GameSystem::from_tag(&entity.game_system),
            party_fund_gets_share: entity.party_fund_gets_share,
            created_at: entity.created_at,
            updated_at: entity.updated_at,
        }
    }
}

/// Campaign joined with the requesting user's membership.
#[derive(Debug, Clone, FromRow)]
pub struct CampaignSummaryEntity {
    pub id: Uuid,
    pub name: String,
    pub game_system: String,
    pub owner_id: Uuid,
    pub role: CampaignRoleDb,
    pub created_at: DateTime<Utc>,
}

impl From<CampaignSummaryEntity> for CampaignSummary {
    fn from(entity: CampaignSummaryEntity) -> Self {
        Self {
            id: entity.id,
            name: entity.name,
            game_system: GameSystem::from_tag(&entity.game_system),
            owner_id: entity.owner_id,
            your_role: entity.role.into(),
            created_at: entity.created_at,
        }
    }
}

/// Database row mapping for the campaign_members table.
#[derive(Debug, Clone, FromRow)]
pub struct MembershipEntity {
    pub campaign_id: Uuid,
    pub user_id: Uuid,
    pub role: CampaignRoleDb,
    pub invited_by: Option<Uuid>,
    pub joined_at: DateTime<Utc>,
}

impl From<MembershipEntity> for Membership {
    fn from(entity: MembershipEntity) -> Self {
        Self {
            campaign_id: entity.campaign_id,
            user_id: entity.user_id,
            role: entity.role.into(),
            invited_by: entity.invited_by,
            joined_at: entity.joined_at,
        }
    }
}

/// Database row mapping for the party_funds table.
#[derive(Debug, Clone, FromRow)]
pub struct PartyFundEntity {
    pub campaign_id: Uuid,
    pub balance_gp: f64,
}

impl From<PartyFundEntity> for PartyFund {
    fn from(entity: PartyFundEntity) -> Self {
        Self {
            campaign_id: entity.campaign_id,
            balance_gp: entity.balance_gp,
        }
    }
}
