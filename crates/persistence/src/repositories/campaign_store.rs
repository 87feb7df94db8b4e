//! PostgreSQL implementation of the campaign store.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use domain::models::{
    Campaign, CampaignRole, CampaignSummary, Invite, InviteLookup, Membership, PartyFund,
    UserProfile,
};
use domain::store::{CampaignStore, StoreResult};
use domain::CampaignError;

use crate::entities::{
    CampaignEntity, CampaignRoleDb, CampaignSummaryEntity, InviteEntity, InviteStatusDb,
    InviteWithCampaignEntity, MembershipEntity, PartyFundEntity,
};
use crate::error::map_sqlx_error;
use crate::metrics::QueryTimer;

const INVITE_COLUMNS: &str = "id, token, campaign_id, inviter_id, invitee_email, role, status, created_at, expires_at, resolved_at";

/// Campaign store backed by PostgreSQL.
#[derive(Clone)]
pub struct PgCampaignStore {
    pool: PgPool,
}

impl PgCampaignStore {
    /// Creates a new PgCampaignStore with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CampaignStore for PgCampaignStore {
    async fn ping(&self) -> StoreResult<()> {
        let timer = QueryTimer::new("ping");
        let result = sqlx::query("SELECT 1").execute(&self.pool).await;
        timer.record();
        result.map(|_| ()).map_err(map_sqlx_error)
    }

    async fn upsert_user_profile(&self, profile: &UserProfile) -> StoreResult<()> {
        let timer = QueryTimer::new("upsert_user_profile");
        let result = sqlx::query(
            r#"
            INSERT INTO user_profiles (user_id, email, display_name)
            VALUES ($1, $2, $3)
            ON CONFLICT (user_id) DO UPDATE
            SET email = EXCLUDED.email,
                display_name = COALESCE(EXCLUDED.display_name, user_profiles.display_name),
                updated_at = NOW()
            WHERE user_profiles.email IS DISTINCT FROM EXCLUDED.email
               OR EXCLUDED.display_name IS NOT NULL
            "#,
        )
        .bind(profile.user_id)
        .bind(&profile.email)
        .bind(&profile.display_name)
        .execute(&self.pool)
        .await;
        timer.record();
        result.map(|_| ()).map_err(map_sqlx_error)
    }

    async fn lookup_email_by_user_id(&self, user_id: Uuid) -> StoreResult<Option<String>> {
        let timer = QueryTimer::new("lookup_email_by_user_id");
        let result = sqlx::query_scalar::<_, String>(
            "SELECT email FROM user_profiles WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result.map_err(map_sqlx_error)
    }

    async fn create_campaign_with_treasury(&self, campaign: &Campaign) -> StoreResult<()> {
        let timer = QueryTimer::new("create_campaign_with_treasury");
        let mut tx = self.pool.begin().await.map_err(map_sqlx_error)?;

        sqlx::query(
            r#"
            INSERT INTO campaigns (id, name, owner_id, game_system, party_fund_gets_share, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(campaign.id)
        .bind(&campaign.name)
        .bind(campaign.owner_id)
        .bind(campaign.game_system.as_str())
        .bind(campaign.party_fund_gets_share)
        .bind(campaign.created_at)
        .bind(campaign.updated_at)
        .execute(&mut *tx)
        .await
        .map_err(map_sqlx_error)?;

        sqlx::query(
            r#"
            INSERT INTO campaign_members (campaign_id, user_id, role, joined_at)
            VALUES ($1, $2, 'owner', $3)
            "#,
        )
        .bind(campaign.id)
        .bind(campaign.owner_id)
        .bind(campaign.created_at)
        .execute(&mut *tx)
        .await
        .map_err(map_sqlx_error)?;

        sqlx::query("INSERT INTO party_funds (campaign_id, balance_gp) VALUES ($1, 0)")
            .bind(campaign.id)
            .execute(&mut *tx)
            .await
            .map_err(map_sqlx_error)?;

        tx.commit().await.map_err(map_sqlx_error)?;
        timer.record();
        Ok(())
    }

    async fn count_owned_campaigns(&self, owner_id: Uuid) -> StoreResult<i64> {
        let timer = QueryTimer::new("count_owned_campaigns");
        let result =
            sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM campaigns WHERE owner_id = $1")
                .bind(owner_id)
                .fetch_one(&self.pool)
                .await;
        timer.record();
        result.map_err(map_sqlx_error)
    }

    async fn list_campaigns_for_user(&self, user_id: Uuid) -> StoreResult<Vec<CampaignSummary>> {
        let timer = QueryTimer::new("list_campaigns_for_user");
        let result = sqlx::query_as::<_, CampaignSummaryEntity>(
            r#"
            SELECT c.id, c.name, c.game_system, c.owner_id, m.role, c.created_at
            FROM campaigns c
            JOIN campaign_members m ON m.campaign_id = c.id
            WHERE m.user_id = $1
            ORDER BY c.created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await;
        timer.record();
        Ok(result
            .map_err(map_sqlx_error)?
            .into_iter()
            .map(Into::into)
            .collect())
    }

    async fn find_campaign(&self, campaign_id: Uuid) -> StoreResult<Option<Campaign>> {
        let timer = QueryTimer::new("find_campaign");
        let result = sqlx::query_as::<_, CampaignEntity>(
            r#"
            SELECT id, name, owner_id, game_system, party_fund_gets_share, created_at, updated_at
            FROM campaigns
            WHERE id = $1
            "#,
        )
        .bind(campaign_id)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        Ok(result.map_err(map_sqlx_error)?.map(Into::into))
    }

    async fn find_party_fund(&self, campaign_id: Uuid) -> StoreResult<Option<PartyFund>> {
        let timer = QueryTimer::new("find_party_fund");
        let result = sqlx::query_as::<_, PartyFundEntity>(
            "SELECT campaign_id, balance_gp FROM party_funds WHERE campaign_id = $1",
        )
        .bind(campaign_id)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        Ok(result.map_err(map_sqlx_error)?.map(Into::into))
    }

    async fn rename_campaign(
        &self,
        campaign_id: Uuid,
        name: &str,
        now: DateTime<Utc>,
    ) -> StoreResult<Campaign> {
        let timer = QueryTimer::new("rename_campaign");
        let result = sqlx::query_as::<_, CampaignEntity>(
            r#"
            UPDATE campaigns
            SET name = $2, updated_at = $3
            WHERE id = $1
            RETURNING id, name, owner_id, game_system, party_fund_gets_share, created_at, updated_at
            "#,
        )
        .bind(campaign_id)
        .bind(name)
        .bind(now)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
            .map_err(map_sqlx_error)?
            .map(Into::into)
            .ok_or_else(|| CampaignError::not_found("Campaign"))
    }

    async fn delete_campaign(&self, campaign_id: Uuid) -> StoreResult<()> {
        // memberships, invites and the party fund cascade
        let timer = QueryTimer::new("delete_campaign");
        let result = sqlx::query("DELETE FROM campaigns WHERE id = $1")
            .bind(campaign_id)
            .execute(&self.pool)
            .await;
        timer.record();
        if result.map_err(map_sqlx_error)?.rows_affected() == 0 {
            return Err(CampaignError::not_found("Campaign"));
        }
        Ok(())
    }

    async fn get_membership(
        &self,
        campaign_id: Uuid,
        user_id: Uuid,
    ) -> StoreResult<Option<Membership>> {
        let timer = QueryTimer::new("get_membership");
        let result = sqlx::query_as::<_, MembershipEntity>(
            r#"
            SELECT campaign_id, user_id, role, invited_by, joined_at
            FROM campaign_members
            WHERE campaign_id = $1 AND user_id = $2
            "#,
        )
        .bind(campaign_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        Ok(result.map_err(map_sqlx_error)?.map(Into::into))
    }

    async fn list_members(&self, campaign_id: Uuid) -> StoreResult<Vec<Membership>> {
        let timer = QueryTimer::new("list_members");
        let result = sqlx::query_as::<_, MembershipEntity>(
            r#"
            SELECT campaign_id, user_id, role, invited_by, joined_at
            FROM campaign_members
            WHERE campaign_id = $1
            ORDER BY joined_at ASC
            "#,
        )
        .bind(campaign_id)
        .fetch_all(&self.pool)
        .await;
        timer.record();
        Ok(result
            .map_err(map_sqlx_error)?
            .into_iter()
            .map(Into::into)
            .collect())
    }

    async fn update_member_role(
        &self,
        campaign_id: Uuid,
        user_id: Uuid,
        role: CampaignRole,
    ) -> StoreResult<Membership> {
        let timer = QueryTimer::new("update_member_role");
        let result = sqlx::query_as::<_, MembershipEntity>(
            r#"
            UPDATE campaign_members
            SET role = $3
            WHERE campaign_id = $1 AND user_id = $2
            RETURNING campaign_id, user_id, role, invited_by, joined_at
            "#,
        )
        .bind(campaign_id)
        .bind(user_id)
        .bind(CampaignRoleDb::from(role))
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
            .map_err(map_sqlx_error)?
            .map(Into::into)
            .ok_or_else(|| CampaignError::not_found("Member"))
    }

    async fn remove_member(&self, campaign_id: Uuid, user_id: Uuid) -> StoreResult<()> {
        let timer = QueryTimer::new("remove_member");
        let result =
            sqlx::query("DELETE FROM campaign_members WHERE campaign_id = $1 AND user_id = $2")
                .bind(campaign_id)
                .bind(user_id)
                .execute(&self.pool)
                .await;
        timer.record();
        if result.map_err(map_sqlx_error)?.rows_affected() == 0 {
            return Err(CampaignError::not_found("Member"));
        }
        Ok(())
    }

    async fn insert_invite(&self, invite: &Invite) -> StoreResult<()> {
        let timer = QueryTimer::new("insert_invite");
        let mut tx = self.pool.begin().await.map_err(map_sqlx_error)?;

        // An expired pending invite would otherwise hold the unique slot forever.
        sqlx::query(
            r#"
            DELETE FROM campaign_invites
            WHERE campaign_id = $1 AND invitee_email = $2
              AND status = 'pending' AND expires_at <= $3
            "#,
        )
        .bind(invite.campaign_id)
        .bind(&invite.invitee_email)
        .bind(invite.created_at)
        .execute(&mut *tx)
        .await
        .map_err(map_sqlx_error)?;

        sqlx::query(
            r#"
            INSERT INTO campaign_invites
                (id, token, campaign_id, inviter_id, invitee_email, role, status, created_at, expires_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(invite.id)
        .bind(&invite.token)
        .bind(invite.campaign_id)
        .bind(invite.inviter_id)
        .bind(&invite.invitee_email)
        .bind(CampaignRoleDb::from(invite.role))
        .bind(InviteStatusDb::from(invite.status))
        .bind(invite.created_at)
        .bind(invite.expires_at)
        .execute(&mut *tx)
        .await
        .map_err(map_sqlx_error)?;

        tx.commit().await.map_err(map_sqlx_error)?;
        timer.record();
        Ok(())
    }

    async fn list_pending_invites(
        &self,
        campaign_id: Uuid,
        now: DateTime<Utc>,
    ) -> StoreResult<Vec<Invite>> {
        let timer = QueryTimer::new("list_pending_invites");
        let result = sqlx::query_as::<_, InviteEntity>(&format!(
            r#"
            SELECT {INVITE_COLUMNS}
            FROM campaign_invites
            WHERE campaign_id = $1 AND status = 'pending' AND expires_at > $2
            ORDER BY created_at DESC
            "#
        ))
        .bind(campaign_id)
        .bind(now)
        .fetch_all(&self.pool)
        .await;
        timer.record();
        result
            .map_err(map_sqlx_error)?
            .into_iter()
            .map(Invite::try_from)
            .collect()
    }

    async fn lookup_invite_by_token(&self, token: &str) -> StoreResult<Option<InviteLookup>> {
        let timer = QueryTimer::new("lookup_invite_by_token");
        let result = sqlx::query_as::<_, InviteWithCampaignEntity>(
            r#"
            SELECT
                i.id, i.token, i.campaign_id, i.inviter_id, i.invitee_email, i.role,
                i.status, i.created_at, i.expires_at, i.resolved_at,
                c.name AS campaign_name, c.game_system,
                p.email AS inviter_email
            FROM campaign_invites i
            JOIN campaigns c ON c.id = i.campaign_id
            LEFT JOIN user_profiles p ON p.user_id = i.inviter_id
            WHERE i.token = $1
            "#,
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
            .map_err(map_sqlx_error)?
            .map(InviteLookup::try_from)
            .transpose()
    }

    async fn accept_invite(
        &self,
        token: &str,
        requester_id: Uuid,
        requester_email: &str,
        now: DateTime<Utc>,
    ) -> StoreResult<Membership> {
        let timer = QueryTimer::new("accept_invite");
        let mut tx = self.pool.begin().await.map_err(map_sqlx_error)?;

        // Row lock serializes concurrent accepts of the same token.
        let invite: Invite = sqlx::query_as::<_, InviteEntity>(&format!(
            "SELECT {INVITE_COLUMNS} FROM campaign_invites WHERE token = $1 FOR UPDATE"
        ))
        .bind(token)
        .fetch_optional(&mut *tx)
        .await
        .map_err(map_sqlx_error)?
        .ok_or_else(|| CampaignError::not_found("Invite"))?
        .try_into()?;
        invite.check_redeemable(requester_email, now)?;

        let membership = sqlx::query_as::<_, MembershipEntity>(
            r#"
            INSERT INTO campaign_members (campaign_id, user_id, role, invited_by, joined_at)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING campaign_id, user_id, role, invited_by, joined_at
            "#,
        )
        .bind(invite.campaign_id)
        .bind(requester_id)
        .bind(CampaignRoleDb::from(invite.role))
        .bind(invite.inviter_id)
        .bind(now)
        .fetch_one(&mut *tx)
        .await
        .map_err(map_sqlx_error)?;

        sqlx::query(
            "UPDATE campaign_invites SET status = 'accepted', resolved_at = $2 WHERE id = $1",
        )
        .bind(invite.id)
        .bind(now)
        .execute(&mut *tx)
        .await
        .map_err(map_sqlx_error)?;

        tx.commit().await.map_err(map_sqlx_error)?;
        timer.record();
        Ok(membership.into())
    }

    async fn decline_invite(
        &self,
        token: &str,
        requester_email: &str,
        now: DateTime<Utc>,
    ) -> StoreResult<Invite> {
        let timer = QueryTimer::new("decline_invite");
        let mut tx = self.pool.begin().await.map_err(map_sqlx_error)?;

        let invite: Invite = sqlx::query_as::<_, InviteEntity>(&format!(
            "SELECT {INVITE_COLUMNS} FROM campaign_invites WHERE token = $1 FOR UPDATE"
        ))
        .bind(token)
        .fetch_optional(&mut *tx)
        .await
        .map_err(map_sqlx_error)?
        .ok_or_else(|| CampaignError::not_found("Invite"))?
        .try_into()?;
        invite.check_redeemable(requester_email, now)?;

        let declined: Invite = sqlx::query_as::<_, InviteEntity>(&format!(
            r#"
            UPDATE campaign_invites
            SET status = 'declined', resolved_at = $2
            WHERE id = $1
            RETURNING {INVITE_COLUMNS}
            "#
        ))
        .bind(invite.id)
        .bind(now)
        .fetch_one(&mut *tx)
        .await
        .map_err(map_sqlx_error)?
        .try_into()?;

        tx.commit().await.map_err(map_sqlx_error)?;
        timer.record();
        Ok(declined)
    }
}
