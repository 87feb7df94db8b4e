//! Campaign domain models and the campaign role/permission model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;
use validator::Validate;

/// Game system a campaign is played in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum GameSystem {
    #[serde(rename = "dnd-5e")]
    #[default]
    Dnd5e,
    #[serde(rename = "pathfinder-1e")]
    Pathfinder1e,
    #[serde(rename = "pathfinder-2e")]
    Pathfinder2e,
    #[serde(rename = "other")]
    Other,
}

impl GameSystem {
    pub fn as_str(&self) -> &'static str {
        match self {
            GameSystem::Dnd5e => "dnd-5e",
            GameSystem::Pathfinder1e => "pathfinder-1e",
            GameSystem::Pathfinder2e => "pathfinder-2e",
            GameSystem::Other => "other",
        }
    }

    /// Maps a stored tag to a system. Unknown tags map to `Other`.
    pub fn from_tag(tag: &str) -> Self {
        match tag.trim().to_lowercase().as_str() {
            "dnd-5e" | "dnd5e" => GameSystem::Dnd5e,
            "pathfinder-1e" | "pf1e" => GameSystem::Pathfinder1e,
            "pathfinder-2e" | "pf2e" => GameSystem::Pathfinder2e,
            _ => GameSystem::Other,
        }
    }
}

impl fmt::Display for GameSystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Role within a campaign, ordered owner > contributor > viewer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CampaignRole {
    Owner,
    Contributor,
    Viewer,
}

/// Something a member may attempt within a campaign.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    ViewCampaign,
    EditContent,
    SendInvites,
    ChangeMemberRole,
    RemoveMember,
    RenameCampaign,
    DeleteCampaign,
    LeaveCampaign,
}

/// Deployment-wide switches that adjust the permission table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PermissionPolicy {
    pub contributors_can_rename: bool,
}

impl Default for PermissionPolicy {
    fn default() -> Self {
        Self {
            contributors_can_rename: true,
        }
    }
}

impl CampaignRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            CampaignRole::Owner => "owner",
            CampaignRole::Contributor => "contributor",
            CampaignRole::Viewer => "viewer",
        }
    }

    /// Higher rank means more authority.
    pub fn rank(&self) -> u8 {
        match self {
            CampaignRole::Owner => 3,
            CampaignRole::Contributor => 2,
            CampaignRole::Viewer => 1,
        }
    }

    /// The single permission check for every campaign operation.
    pub fn permits(&self, capability: Capability, policy: &PermissionPolicy) -> bool {
        use CampaignRole::*;
        use Capability::*;

        match capability {
            ViewCampaign => true,
            EditContent | SendInvites => matches!(self, Owner | Contributor),
            ChangeMemberRole | RemoveMember | DeleteCampaign => matches!(self, Owner),
            RenameCampaign => match self {
                Owner => true,
                Contributor => policy.contributors_can_rename,
                Viewer => false,
            },
            LeaveCampaign => !matches!(self, Owner),
        }
    }

    /// Roles that member management may assign. Owner is never assignable.
    pub fn is_assignable(&self) -> bool {
        !matches!(self, CampaignRole::Owner)
    }
}

impl FromStr for CampaignRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "owner" => Ok(CampaignRole::Owner),
            "contributor" => Ok(CampaignRole::Contributor),
            "viewer" => Ok(CampaignRole::Viewer),
            _ => Err(format!("Invalid campaign role: {}", s)),
        }
    }
}

impl fmt::Display for CampaignRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A tabletop campaign shared by its members.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Campaign {
    pub id: Uuid,
    pub name: String,
    pub owner_id: Uuid,
    pub game_system: GameSystem,
    pub party_fund_gets_share: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// The campaign's shared treasury, created together with the campaign.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct PartyFund {
    pub campaign_id: Uuid,
    pub balance_gp: f64,
}

/// Campaign row as listed for one user.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct CampaignSummary {
    pub id: Uuid,
    pub name: String,
    pub game_system: GameSystem,
    pub owner_id: Uuid,
    pub your_role: CampaignRole,
    pub created_at: DateTime<Utc>,
}

/// Campaign detail for a member.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct CampaignDetail {
    #[serde(flatten)]
    pub campaign: Campaign,
    pub your_role: CampaignRole,
    pub party_fund: Option<PartyFund>,
}

/// Request payload for creating a campaign.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "snake_case")]
pub struct CreateCampaignRequest {
    /// Left empty, a name like `Campaign #3` is suggested.
    #[validate(length(max = 100, message = "Name must be at most 100 characters"))]
    pub name: Option<String>,

    #[serde(default)]
    pub game_system: Option<String>,

    #[serde(default)]
    pub party_fund_gets_share: bool,
}

/// Request payload for renaming a campaign.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "snake_case")]
pub struct RenameCampaignRequest {
    #[validate(length(
        min = 1,
        max = 100,
        message = "Name must be between 1 and 100 characters"
    ))]
    pub name: String,
}

/// Request payload for deleting a campaign. The name must be typed exactly.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct DeleteCampaignRequest {
    pub confirm_name: String,
}

/// Name suggested for a user's next campaign.
pub fn suggested_campaign_name(owned_campaigns: i64) -> String {
    format!("Campaign #{}", owned_campaigns + 1)
}
