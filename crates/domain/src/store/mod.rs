//! Persistence seam for campaigns, memberships and invites.
//!
//! Services depend only on [`CampaignStore`]. The PostgreSQL implementation
//! lives in the persistence crate; [`memory::InMemoryCampaignStore`] backs
//! tests and local development.

pub mod memory;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::CampaignError;
use crate::models::{
    Campaign, CampaignRole, CampaignSummary, Invite, InviteLookup, Membership, PartyFund,
    UserProfile,
};

pub use memory::InMemoryCampaignStore;

pub type StoreResult<T> = Result<T, CampaignError>;

/// Storage operations the campaign services need.
///
/// Implementations must make `create_campaign_with_treasury`,
/// `accept_invite` and `decline_invite` atomic, and must enforce the
/// (campaign, user) membership uniqueness and the single pending invite per
/// (campaign, email) themselves.
#[async_trait]
pub trait CampaignStore: Send + Sync {
    /// Cheap connectivity check used by the health endpoint.
    async fn ping(&self) -> StoreResult<()>;

    async fn upsert_user_profile(&self, profile: &UserProfile) -> StoreResult<()>;

    async fn lookup_email_by_user_id(&self, user_id: Uuid) -> StoreResult<Option<String>>;

    /// Inserts the campaign, its owner membership and its party fund together.
    async fn create_campaign_with_treasury(&self, campaign: &Campaign) -> StoreResult<()>;

    async fn count_owned_campaigns(&self, owner_id: Uuid) -> StoreResult<i64>;

    /// Campaigns the user belongs to, newest first, each with the user's role.
    async fn list_campaigns_for_user(&self, user_id: Uuid) -> StoreResult<Vec<CampaignSummary>>;

    async fn find_campaign(&self, campaign_id: Uuid) -> StoreResult<Option<Campaign>>;

    async fn find_party_fund(&self, campaign_id: Uuid) -> StoreResult<Option<PartyFund>>;

    async fn rename_campaign(
        &self,
        campaign_id: Uuid,
        name: &str,
        now: DateTime<Utc>,
    ) -> StoreResult<Campaign>;

    /// Deletes the campaign with its memberships, invites and party fund.
    async fn delete_campaign(&self, campaign_id: Uuid) -> StoreResult<()>;

    async fn get_membership(
        &self,
        campaign_id: Uuid,
        user_id: Uuid,
    ) -> StoreResult<Option<Membership>>;

    async fn list_members(&self, campaign_id: Uuid) -> StoreResult<Vec<Membership>>;

    async fn update_member_role(
        &self,
        campaign_id: Uuid,
        user_id: Uuid,
        role: CampaignRole,
    ) -> StoreResult<Membership>;

    async fn remove_member(&self, campaign_id: Uuid, user_id: Uuid) -> StoreResult<()>;

    /// Fails with `DuplicateInvite` if an unexpired pending invite exists for
    /// the same campaign and email. Expired pending invites for that pair are
    /// purged first, judged at `invite.created_at`.
    async fn insert_invite(&self, invite: &Invite) -> StoreResult<()>;

    /// Pending invites that have not expired at `now`, newest first.
    async fn list_pending_invites(
        &self,
        campaign_id: Uuid,
        now: DateTime<Utc>,
    ) -> StoreResult<Vec<Invite>>;

    /// Fetches an invite with the campaign display fields, without requiring membership.
    async fn lookup_invite_by_token(&self, token: &str) -> StoreResult<Option<InviteLookup>>;

    /// Atomically validates the invite for `requester_email`, creates the
    /// membership and marks the invite accepted.
    async fn accept_invite(
        &self,
        token: &str,
        requester_id: Uuid,
        requester_email: &str,
        now: DateTime<Utc>,
    ) -> StoreResult<Membership>;

    /// Atomically validates the invite for `requester_email` and marks it declined.
    async fn decline_invite(
        &self,
        token: &str,
        requester_email: &str,
        now: DateTime<Utc>,
    ) -> StoreResult<Invite>;
}
