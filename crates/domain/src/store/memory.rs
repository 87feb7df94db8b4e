//! In-memory [`CampaignStore`] for tests and local development.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use uuid::Uuid;

use super::{CampaignStore, StoreResult};
use crate::error::CampaignError;
use crate::models::{
    Campaign, CampaignRole, CampaignSummary, Invite, InviteLookup, InviteStatus, Membership,
    PartyFund, UserProfile,
};

#[derive(Default)]
struct State {
    users: HashMap<Uuid, UserProfile>,
    campaigns: HashMap<Uuid, Campaign>,
    party_funds: HashMap<Uuid, PartyFund>,
    memberships: HashMap<(Uuid, Uuid), Membership>,
    // keyed by token
    invites: HashMap<String, Invite>,
}

impl State {
    fn campaign(&self, campaign_id: Uuid) -> StoreResult<&Campaign> {
        self.campaigns
            .get(&campaign_id)
            .ok_or_else(|| CampaignError::not_found("Campaign"))
    }

    fn pending_invite_exists(&self, campaign_id: Uuid, email: &str) -> bool {
        self.invites.values().any(|i| {
            i.campaign_id == campaign_id && i.invitee_email == email && i.is_pending()
        })
    }
}

/// Keeps every table behind one mutex so multi-row operations are atomic.
#[derive(Clone, Default)]
pub struct InMemoryCampaignStore {
    state: Arc<Mutex<State>>,
}

impl InMemoryCampaignStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> StoreResult<MutexGuard<'_, State>> {
        self.state
            .lock()
            .map_err(|_| CampaignError::Store("in-memory store lock poisoned".to_string()))
    }

    /// Overwrites a stored invite. Lets tests age invites without a clock.
    pub fn put_invite(&self, invite: Invite) -> StoreResult<()> {
        self.lock()?.invites.insert(invite.token.clone(), invite);
        Ok(())
    }

    /// Number of invites ever stored for a campaign, in any status.
    pub fn invite_count(&self, campaign_id: Uuid) -> StoreResult<usize> {
        Ok(self
            .lock()?
            .invites
            .values()
            .filter(|i| i.campaign_id == campaign_id)
            .count())
    }
}

#[async_trait]
impl CampaignStore for InMemoryCampaignStore {
    async fn ping(&self) -> StoreResult<()> {
        self.lock().map(|_| ())
    }

    async fn upsert_user_profile(&self, profile: &UserProfile) -> StoreResult<()> {
        self.lock()?.users.insert(profile.user_id, profile.clone());
        Ok(())
    }

    async fn lookup_email_by_user_id(&self, user_id: Uuid) -> StoreResult<Option<String>> {
        Ok(self.lock()?.users.get(&user_id).map(|u| u.email.clone()))
    }

    async fn create_campaign_with_treasury(&self, campaign: &Campaign) -> StoreResult<()> {
        let mut state = self.lock()?;
        state.campaigns.insert(campaign.id, campaign.clone());
        state.party_funds.insert(
            campaign.id,
            PartyFund {
                campaign_id: campaign.id,
                balance_gp: 0.0,
            },
        );
        state.memberships.insert(
            (campaign.id, campaign.owner_id),
            Membership {
                campaign_id: campaign.id,
                user_id: campaign.owner_id,
                role: CampaignRole::Owner,
                invited_by: None,
                joined_at: campaign.created_at,
            },
        );
        Ok(())
    }

    async fn count_owned_campaigns(&self, owner_id: Uuid) -> StoreResult<i64> {
        let state = self.lock()?;
        Ok(state
            .campaigns
            .values()
            .filter(|c| c.owner_id == owner_id)
            .count() as i64)
    }

    async fn list_campaigns_for_user(&self, user_id: Uuid) -> StoreResult<Vec<CampaignSummary>> {
        let state = self.lock()?;
        let mut campaigns: Vec<CampaignSummary> = state
            .memberships
            .values()
            .filter(|m| m.user_id == user_id)
            .filter_map(|m| {
                state.campaigns.get(&m.campaign_id).map(|c| CampaignSummary {
                    id: c.id,
                    name: c.name.clone(),
                    game_system: c.game_system,
                    owner_id: c.owner_id,
                    your_role: m.role,
                    created_at: c.created_at,
                })
            })
            .collect();
        campaigns.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(campaigns)
    }

    async fn find_campaign(&self, campaign_id: Uuid) -> StoreResult<Option<Campaign>> {
        Ok(self.lock()?.campaigns.get(&campaign_id).cloned())
    }

    async fn find_party_fund(&self, campaign_id: Uuid) -> StoreResult<Option<PartyFund>> {
        Ok(self.lock()?.party_funds.get(&campaign_id).cloned())
    }

    async fn rename_campaign(
        &self,
        campaign_id: Uuid,
        name: &str,
        now: DateTime<Utc>,
    ) -> StoreResult<Campaign> {
        let mut state = self.lock()?;
        let campaign = state
            .campaigns
            .get_mut(&campaign_id)
            .ok_or_else(|| CampaignError::not_found("Campaign"))?;
        campaign.name = name.to_string();
        campaign.updated_at = now;
        Ok(campaign.clone())
    }

    async fn delete_campaign(&self, campaign_id: Uuid) -> StoreResult<()> {
        let mut state = self.lock()?;
        if state.campaigns.remove(&campaign_id).is_none() {
            return Err(CampaignError::not_found("Campaign"));
        }
        state.party_funds.remove(&campaign_id);
        state.memberships.retain(|(c, _), _| *c != campaign_id);
        state.invites.retain(|_, i| i.campaign_id != campaign_id);
        Ok(())
    }

    async fn get_membership(
        &self,
        campaign_id: Uuid,
        user_id: Uuid,
    ) -> StoreResult<Option<Membership>> {
        Ok(self
            .lock()?
            .memberships
            .get(&(campaign_id, user_id))
            .cloned())
    }

    async fn list_members(&self, campaign_id: Uuid) -> StoreResult<Vec<Membership>> {
        let state = self.lock()?;
        let mut members: Vec<Membership> = state
            .memberships
            .values()
            .filter(|m| m.campaign_id == campaign_id)
            .cloned()
            .collect();
        members.sort_by(|a, b| a.joined_at.cmp(&b.joined_at));
        Ok(members)
    }

    async fn update_member_role(
        &self,
        campaign_id: Uuid,
        user_id: Uuid,
        role: CampaignRole,
    ) -> StoreResult<Membership> {
        let mut state = self.lock()?;
        let membership = state
            .memberships
            .get_mut(&(campaign_id, user_id))
            .ok_or_else(|| CampaignError::not_found("Member"))?;
        membership.role = role;
        Ok(membership.clone())
    }

    async fn remove_member(&self, campaign_id: Uuid, user_id: Uuid) -> StoreResult<()> {
        self.lock()?
            .memberships
            .remove(&(campaign_id, user_id))
            .map(|_| ())
            .ok_or_else(|| CampaignError::not_found("Member"))
    }

    async fn insert_invite(&self, invite: &Invite) -> StoreResult<()> {
        let mut state = self.lock()?;
        state.campaign(invite.campaign_id)?;
        let now = invite.created_at;
        state.invites.retain(|_, i| {
            !(i.campaign_id == invite.campaign_id
                && i.invitee_email == invite.invitee_email
                && i.is_pending()
                && i.is_expired(now))
        });
        if state.pending_invite_exists(invite.campaign_id, &invite.invitee_email) {
            return Err(CampaignError::DuplicateInvite);
        }
        state.invites.insert(invite.token.clone(), invite.clone());
        Ok(())
    }

    async fn list_pending_invites(
        &self,
        campaign_id: Uuid,
        now: DateTime<Utc>,
    ) -> StoreResult<Vec<Invite>> {
        let state = self.lock()?;
        let mut invites: Vec<Invite> = state
            .invites
            .values()
            .filter(|i| i.campaign_id == campaign_id && i.is_pending() && !i.is_expired(now))
            .cloned()
            .collect();
        invites.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(invites)
    }

    async fn lookup_invite_by_token(&self, token: &str) -> StoreResult<Option<InviteLookup>> {
        let state = self.lock()?;
        let Some(invite) = state.invites.get(token) else {
            return Ok(None);
        };
        let Some(campaign) = state.campaigns.get(&invite.campaign_id) else {
            return Ok(None);
        };
        Ok(Some(InviteLookup {
            invite: invite.clone(),
            campaign_name: campaign.name.clone(),
            game_system: campaign.game_system,
            inviter_email: state.users.get(&invite.inviter_id).map(|u| u.email.clone()),
        }))
    }

    async fn accept_invite(
        &self,
        token: &str,
        requester_id: Uuid,
        requester_email: &str,
        now: DateTime<Utc>,
    ) -> StoreResult<Membership> {
        let mut state = self.lock()?;
        let invite = state
            .invites
            .get(token)
            .ok_or_else(|| CampaignError::not_found("Invite"))?;
        invite.check_redeemable(requester_email, now)?;

        let key = (invite.campaign_id, requester_id);
        if state.memberships.contains_key(&key) {
            return Err(CampaignError::AlreadyMember);
        }

        let membership = Membership {
            campaign_id: invite.campaign_id,
            user_id: requester_id,
            role: invite.role.into(),
            invited_by: Some(invite.inviter_id),
            joined_at: now,
        };
        state.memberships.insert(key, membership.clone());
        if let Some(invite) = state.invites.get_mut(token) {
            invite.resolve(InviteStatus::Accepted, now);
        }
        Ok(membership)
    }

    async fn decline_invite(
        &self,
        token: &str,
        requester_email: &str,
        now: DateTime<Utc>,
    ) -> StoreResult<Invite> {
        let mut state = self.lock()?;
        let invite = state
            .invites
            .get_mut(token)
            .ok_or_else(|| CampaignError::not_found("Invite"))?;
        invite.check_redeemable(requester_email, now)?;
        invite.resolve(InviteStatus::Declined, now);
        Ok(invite.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{GameSystem, InviteRole};

    fn campaign(owner_id: Uuid) -> Campaign {
        let now = Utc::now();
        Campaign {
            id: Uuid::new_v4(),
            name: "Rime of the Frostmaiden".to_string(),
            owner_id,
            game_system: GameSystem::Dnd5e,
            party_fund_gets_share: false,
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn test_create_campaign_with_treasury() {
        let store = InMemoryCampaignStore::new();
        let owner = Uuid::new_v4();
        let c = campaign(owner);
        store.create_campaign_with_treasury(&c).await.unwrap();

        let membership = store.get_membership(c.id, owner).await.unwrap().unwrap();
        assert_eq!(membership.role, CampaignRole::Owner);
        let fund = store.find_party_fund(c.id).await.unwrap().unwrap();
        assert_eq!(fund.balance_gp, 0.0);
        assert_eq!(store.count_owned_campaigns(owner).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_duplicate_pending_invite_rejected() {
        let store = InMemoryCampaignStore::new();
        let owner = Uuid::new_v4();
        let c = campaign(owner);
        store.create_campaign_with_treasury(&c).await.unwrap();

        let now = Utc::now();
        let first = Invite::new(c.id, owner, "bob@example.com".into(), InviteRole::Viewer, now);
        let second = Invite::new(c.id, owner, "bob@example.com".into(), InviteRole::Viewer, now);
        store.insert_invite(&first).await.unwrap();
        assert_eq!(
            store.insert_invite(&second).await,
            Err(CampaignError::DuplicateInvite)
        );

        store
            .decline_invite(&first.token, "bob@example.com", now)
            .await
            .unwrap();
        store.insert_invite(&second).await.unwrap();
    }

    #[tokio::test]
    async fn test_delete_campaign_cascades() {
        let store = InMemoryCampaignStore::new();
        let owner = Uuid::new_v4();
        let c = campaign(owner);
        store.create_campaign_with_treasury(&c).await.unwrap();
        let invite = Invite::new(c.id, owner, "bob@example.com".into(), InviteRole::Viewer, Utc::now());
        store.insert_invite(&invite).await.unwrap();

        store.delete_campaign(c.id).await.unwrap();

        assert!(store.find_campaign(c.id).await.unwrap().is_none());
        assert!(store.find_party_fund(c.id).await.unwrap().is_none());
        assert!(store.get_membership(c.id, owner).await.unwrap().is_none());
        assert!(store.lookup_invite_by_token(&invite.token).await.unwrap().is_none());
        assert_eq!(
            store.delete_campaign(c.id).await,
            Err(CampaignError::not_found("Campaign"))
        );
    }

    #[tokio::test]
    async fn test_accept_existing_member_is_already_member() {
        let store = InMemoryCampaignStore::new();
        let owner = Uuid::new_v4();
        let c = campaign(owner);
        store.create_campaign_with_treasury(&c).await.unwrap();
        let invite = Invite::new(c.id, owner, "owner@example.com".into(), InviteRole::Viewer, Utc::now());
        store.insert_invite(&invite).await.unwrap();

        let result = store
            .accept_invite(&invite.token, owner, "owner@example.com", Utc::now())
            .await;
        assert_eq!(result, Err(CampaignError::AlreadyMember));

        // invite stays pending when the membership insert fails
        let lookup = store.lookup_invite_by_token(&invite.token).await.unwrap().unwrap();
        assert!(lookup.invite.is_pending());
    }
}
