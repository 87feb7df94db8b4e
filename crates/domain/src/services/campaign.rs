//! Campaign CRUD and member management.

use std::sync::Arc;
use uuid::Uuid;

use super::clock::Clock;
use super::{bounded, require_membership, ServiceConfig};
use crate::error::CampaignError;
use crate::models::campaign::suggested_campaign_name;
use crate::models::membership::{fallback_member_label, sort_members};
use crate::models::{
    Campaign, CampaignDetail, CampaignRole, CampaignSummary, Capability, GameSystem, MemberView,
    Membership, UserProfile,
};
use crate::store::CampaignStore;
use shared::validation::validate_campaign_name;

/// Applies the role model to campaign and membership operations.
pub struct CampaignService {
    store: Arc<dyn CampaignStore>,
    clock: Arc<dyn Clock>,
    config: ServiceConfig,
}

impl CampaignService {
    pub fn new(store: Arc<dyn CampaignStore>, clock: Arc<dyn Clock>, config: ServiceConfig) -> Self {
        Self {
            store,
            clock,
            config,
        }
    }

    async fn authorize(
        &self,
        campaign_id: Uuid,
        user_id: Uuid,
        capability: Capability,
        denied: &str,
    ) -> Result<Membership, CampaignError> {
        let membership =
            require_membership(self.store.as_ref(), self.config.store_timeout, campaign_id, user_id)
                .await?;
        if membership.role.permits(capability, &self.config.policy) {
            Ok(membership)
        } else {
            tracing::debug!(
                campaign_id = %campaign_id,
                user_id = %user_id,
                role = %membership.role,
                capability = ?capability,
                "Permission denied"
            );
            Err(CampaignError::unauthorized(denied))
        }
    }

    async fn load_campaign(&self, campaign_id: Uuid) -> Result<Campaign, CampaignError> {
        bounded(
            self.config.store_timeout,
            "find_campaign",
            self.store.find_campaign(campaign_id),
        )
        .await?
        .ok_or_else(|| CampaignError::not_found("Campaign"))
    }

    /// Records the signed-in user's email so invites can be matched to them.
    pub async fn sync_profile(&self, profile: &UserProfile) -> Result<(), CampaignError> {
        bounded(
            self.config.store_timeout,
            "upsert_user_profile",
            self.store.upsert_user_profile(profile),
        )
        .await
    }

    /// Creates a campaign owned by `owner_id`, with its owner membership and party fund.
    ///
    /// A blank name becomes `Campaign #N`, N being one more than the number
    /// of campaigns the user already owns.
    pub async fn create_campaign(
        &self,
        owner_id: Uuid,
        name: Option<&str>,
        game_system: GameSystem,
        party_fund_gets_share: bool,
    ) -> Result<Campaign, CampaignError> {
        let timeout = self.config.store_timeout;
        let name = match name.map(str::trim).filter(|n| !n.is_empty()) {
            Some(name) => name.to_string(),
            None => {
                let owned = bounded(
                    timeout,
                    "count_owned_campaigns",
                    self.store.count_owned_campaigns(owner_id),
                )
                .await?;
                suggested_campaign_name(owned)
            }
        };
        validate_campaign_name(&name)
            .map_err(|_| CampaignError::validation("Campaign name must be 1 to 100 characters"))?;

        let now = self.clock.now();
        let campaign = Campaign {
            id: Uuid::new_v4(),
            name,
            owner_id,
            game_system,
            party_fund_gets_share,
            created_at: now,
            updated_at: now,
        };
        bounded(
            timeout,
            "create_campaign_with_treasury",
            self.store.create_campaign_with_treasury(&campaign),
        )
        .await?;

        tracing::info!(
            campaign_id = %campaign.id,
            owner_id = %owner_id,
            game_system = %campaign.game_system,
            "Campaign created"
        );
        Ok(campaign)
    }

    pub async fn list_campaigns(&self, user_id: Uuid) -> Result<Vec<CampaignSummary>, CampaignError> {
        bounded(
            self.config.store_timeout,
            "list_campaigns_for_user",
            self.store.list_campaigns_for_user(user_id),
        )
        .await
    }

    pub async fn get_campaign(
        &self,
        campaign_id: Uuid,
        user_id: Uuid,
    ) -> Result<CampaignDetail, CampaignError> {
        let membership = self
            .authorize(
                campaign_id,
                user_id,
                Capability::ViewCampaign,
                "You cannot view this campaign",
            )
            .await?;
        let campaign = self.load_campaign(campaign_id).await?;
        let party_fund = bounded(
            self.config.store_timeout,
            "find_party_fund",
            self.store.find_party_fund(campaign_id),
        )
        .await?;

        Ok(CampaignDetail {
            campaign,
            your_role: membership.role,
            party_fund,
        })
    }

    pub async fn rename_campaign(
        &self,
        campaign_id: Uuid,
        actor_id: Uuid,
        name: &str,
    ) -> Result<Campaign, CampaignError> {
        self.authorize(
            campaign_id,
            actor_id,
            Capability::RenameCampaign,
            "You cannot rename this campaign",
        )
        .await?;

        let name = name.trim();
        validate_campaign_name(name)
            .map_err(|_| CampaignError::validation("Campaign name must be 1 to 100 characters"))?;

        let campaign = bounded(
            self.config.store_timeout,
            "rename_campaign",
            self.store.rename_campaign(campaign_id, name, self.clock.now()),
        )
        .await?;
        tracing::info!(campaign_id = %campaign_id, actor_id = %actor_id, "Campaign renamed");
        Ok(campaign)
    }

    /// Deletes a campaign. `confirm_name` must match the current name exactly.
    pub async fn delete_campaign(
        &self,
        campaign_id: Uuid,
        actor_id: Uuid,
        confirm_name: &str,
    ) -> Result<(), CampaignError> {
        self.authorize(
            campaign_id,
            actor_id,
            Capability::DeleteCampaign,
            "Only the owner can delete a campaign",
        )
        .await?;

        let campaign = self.load_campaign(campaign_id).await?;
        if confirm_name != campaign.name {
            return Err(CampaignError::validation(
                "Campaign name does not match. Type the exact name to confirm deletion",
            ));
        }

        bounded(
            self.config.store_timeout,
            "delete_campaign",
            self.store.delete_campaign(campaign_id),
        )
        .await?;
        tracing::info!(campaign_id = %campaign_id, actor_id = %actor_id, "Campaign deleted");
        Ok(())
    }

    /// Members with their emails, owner first.
    pub async fn list_members(
        &self,
        campaign_id: Uuid,
        actor_id: Uuid,
    ) -> Result<Vec<MemberView>, CampaignError> {
        self.authorize(
            campaign_id,
            actor_id,
            Capability::ViewCampaign,
            "You cannot view this campaign",
        )
        .await?;

        let timeout = self.config.store_timeout;
        let memberships =
            bounded(timeout, "list_members", self.store.list_members(campaign_id)).await?;

        let mut members = Vec::with_capacity(memberships.len());
        for m in memberships {
            let email = match bounded(
                timeout,
                "lookup_email_by_user_id",
                self.store.lookup_email_by_user_id(m.user_id),
            )
            .await
            {
                Ok(Some(email)) => email,
                Ok(None) => fallback_member_label(m.user_id),
                Err(e) => {
                    tracing::warn!(user_id = %m.user_id, error = %e, "Member email lookup failed");
                    fallback_member_label(m.user_id)
                }
            };
            members.push(MemberView {
                user_id: m.user_id,
                email,
                role: m.role,
                joined_at: m.joined_at,
                is_you: m.user_id == actor_id,
            });
        }

        sort_members(&mut members);
        Ok(members)
    }

    /// Switches a member between contributor and viewer.
    pub async fn change_member_role(
        &self,
        campaign_id: Uuid,
        actor_id: Uuid,
        target_id: Uuid,
        new_role: CampaignRole,
    ) -> Result<Membership, CampaignError> {
        self.authorize(
            campaign_id,
            actor_id,
            Capability::ChangeMemberRole,
            "Only the owner can change member roles",
        )
        .await?;

        if !new_role.is_assignable() {
            return Err(CampaignError::unauthorized(
                "The owner role cannot be assigned",
            ));
        }

        let timeout = self.config.store_timeout;
        let target = bounded(
            timeout,
            "get_membership",
            self.store.get_membership(campaign_id, target_id),
        )
        .await?
        .ok_or_else(|| CampaignError::not_found("Member"))?;
        if target.role == CampaignRole::Owner {
            return Err(CampaignError::unauthorized(
                "The owner's role cannot be changed",
            ));
        }

        let updated = bounded(
            timeout,
            "update_member_role",
            self.store.update_member_role(campaign_id, target_id, new_role),
        )
        .await?;
        tracing::info!(
            campaign_id = %campaign_id,
            actor_id = %actor_id,
            target_id = %target_id,
            from = %target.role,
            to = %new_role,
            "Member role changed"
        );
        Ok(updated)
    }

    pub async fn remove_member(
        &self,
        campaign_id: Uuid,
        actor_id: Uuid,
        target_id: Uuid,
    ) -> Result<(), CampaignError> {
        self.authorize(
            campaign_id,
            actor_id,
            Capability::RemoveMember,
            "Only the owner can remove members",
        )
        .await?;

        if target_id == actor_id {
            return Err(CampaignError::unauthorized("You cannot remove yourself"));
        }

        let timeout = self.config.store_timeout;
        let target = bounded(
            timeout,
            "get_membership",
            self.store.get_membership(campaign_id, target_id),
        )
        .await?
        .ok_or_else(|| CampaignError::not_found("Member"))?;
        if target.role == CampaignRole::Owner {
            return Err(CampaignError::unauthorized("The owner cannot be removed"));
        }

        bounded(
            timeout,
            "remove_member",
            self.store.remove_member(campaign_id, target_id),
        )
        .await?;
        tracing::info!(
            campaign_id = %campaign_id,
            actor_id = %actor_id,
            target_id = %target_id,
            "Member removed"
        );
        Ok(())
    }

    /// Removes the caller's own membership. Owners must delete instead.
    pub async fn leave_campaign(&self, campaign_id: Uuid, user_id: Uuid) -> Result<(), CampaignError> {
        self.authorize(
            campaign_id,
            user_id,
            Capability::LeaveCampaign,
            "The owner cannot leave a campaign; delete it instead",
        )
        .await?;

        bounded(
            self.config.store_timeout,
            "remove_member",
            self.store.remove_member(campaign_id, user_id),
        )
        .await?;
        tracing::info!(campaign_id = %campaign_id, user_id = %user_id, "Member left campaign");
        Ok(())
    }
}
