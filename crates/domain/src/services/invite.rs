//! Invite lifecycle: create, resolve, accept, decline.

use std::sync::Arc;
use uuid::Uuid;

use super::clock::Clock;
use super::notification::{InviteEmail, InviteNotifier, NotificationResult};
use super::{bounded, require_membership, ServiceConfig};
use crate::error::CampaignError;
use crate::models::membership::fallback_member_label;
use crate::models::{
    Capability, CreatedInvite, Invite, InviteDelivery, InvitePreview, InviteRole, Membership,
};
use crate::store::CampaignStore;
use shared::crypto::token_fingerprint;
use shared::validation::{normalize_email, validate_email_address};

/// Owns every invite state transition.
pub struct InviteService {
    store: Arc<dyn CampaignStore>,
    notifier: Arc<dyn InviteNotifier>,
    clock: Arc<dyn Clock>,
    config: ServiceConfig,
}

impl InviteService {
    pub fn new(
        store: Arc<dyn CampaignStore>,
        notifier: Arc<dyn InviteNotifier>,
        clock: Arc<dyn Clock>,
        config: ServiceConfig,
    ) -> Self {
        Self {
            store,
            notifier,
            clock,
            config,
        }
    }

    /// Creates a pending invite and emails the accept link.
    ///
    /// The invite is stored before the email goes out; a failed or slow
    /// email only changes `delivery`.
    pub async fn create(
        &self,
        campaign_id: Uuid,
        inviter_id: Uuid,
        invitee_email: &str,
        role: InviteRole,
    ) -> Result<CreatedInvite, CampaignError> {
        let email = normalize_email(invitee_email);
        validate_email_address(&email)
            .map_err(|_| CampaignError::validation("Enter a valid email address"))?;

        let timeout = self.config.store_timeout;
        let membership = require_membership(self.store.as_ref(), timeout, campaign_id, inviter_id).await?;
        if !membership
            .role
            .permits(Capability::SendInvites, &self.config.policy)
        {
            return Err(CampaignError::unauthorized(
                "Only owners and contributors can send invites",
            ));
        }

        let campaign = bounded(timeout, "find_campaign", self.store.find_campaign(campaign_id))
            .await?
            .ok_or_else(|| CampaignError::not_found("Campaign"))?;

        let invite = Invite::new(campaign_id, inviter_id, email, role, self.clock.now());
        bounded(timeout, "insert_invite", self.store.insert_invite(&invite)).await?;

        let link = invite.link(&self.config.app_origin);
        tracing::info!(
            campaign_id = %campaign_id,
            invite_id = %invite.id,
            inviter_id = %inviter_id,
            role = %invite.role,
            token = %token_fingerprint(&invite.token),
            "Invite created"
        );

        let inviter_name = bounded(
            timeout,
            "lookup_email_by_user_id",
            self.store.lookup_email_by_user_id(inviter_id),
        )
        .await
        .ok()
        .flatten()
        .unwrap_or_else(|| fallback_member_label(inviter_id));

        let email = InviteEmail {
            recipient: invite.invitee_email.clone(),
            inviter_name,
            campaign_name: campaign.name,
            role: invite.role,
            link: link.clone(),
            expires_at: invite.expires_at,
        };
        let delivery = self.notify(&email).await;
        if let InviteDelivery::Unsent { reason } = &delivery {
            tracing::warn!(
                invite_id = %invite.id,
                reason = %reason,
                "Invite created but email failed to send"
            );
        }

        Ok(CreatedInvite {
            invite,
            link,
            delivery,
        })
    }

    async fn notify(&self, email: &InviteEmail) -> InviteDelivery {
        match tokio::time::timeout(self.config.notify_timeout, self.notifier.send_invite(email))
            .await
        {
            Ok(NotificationResult::Sent) => InviteDelivery::Sent,
            Ok(NotificationResult::Skipped) => InviteDelivery::Disabled,
            Ok(NotificationResult::Failed(reason)) => InviteDelivery::Unsent { reason },
            Err(_) => InviteDelivery::Unsent {
                reason: format!(
                    "email dispatch timed out after {}ms",
                    self.config.notify_timeout.as_millis()
                ),
            },
        }
    }

    /// Returns what the invitee needs to decide, without requiring membership.
    pub async fn resolve(
        &self,
        token: &str,
        requester_email: &str,
    ) -> Result<InvitePreview, CampaignError> {
        let lookup = bounded(
            self.config.store_timeout,
            "lookup_invite_by_token",
            self.store.lookup_invite_by_token(token),
        )
        .await?
        .ok_or_else(|| CampaignError::not_found("Invite"))?;

        lookup
            .invite
            .check_redeemable(requester_email, self.clock.now())?;
        Ok(lookup.into())
    }

    /// Accepts an invite on behalf of `requester_id`, creating the membership.
    pub async fn accept(
        &self,
        token: &str,
        requester_id: Uuid,
    ) -> Result<Membership, CampaignError> {
        let email = self.requester_email(requester_id).await?;
        let membership = bounded(
            self.config.store_timeout,
            "accept_invite",
            self.store
                .accept_invite(token, requester_id, &email, self.clock.now()),
        )
        .await?;

        tracing::info!(
            campaign_id = %membership.campaign_id,
            user_id = %requester_id,
            role = %membership.role,
            token = %token_fingerprint(token),
            "Invite accepted"
        );
        Ok(membership)
    }

    /// Declines an invite on behalf of `requester_id`.
    pub async fn decline(&self, token: &str, requester_id: Uuid) -> Result<Invite, CampaignError> {
        let email = self.requester_email(requester_id).await?;
        let invite = bounded(
            self.config.store_timeout,
            "decline_invite",
            self.store.decline_invite(token, &email, self.clock.now()),
        )
        .await?;

        tracing::info!(
            campaign_id = %invite.campaign_id,
            user_id = %requester_id,
            token = %token_fingerprint(token),
            "Invite declined"
        );
        Ok(invite)
    }

    /// Pending, unexpired invites of a campaign, for members who may invite.
    pub async fn list_pending(
        &self,
        campaign_id: Uuid,
        actor_id: Uuid,
    ) -> Result<Vec<Invite>, CampaignError> {
        let timeout = self.config.store_timeout;
        let membership = require_membership(self.store.as_ref(), timeout, campaign_id, actor_id).await?;
        if !membership
            .role
            .permits(Capability::SendInvites, &self.config.policy)
        {
            return Err(CampaignError::unauthorized(
                "Only owners and contributors can view pending invites",
            ));
        }

        bounded(
            timeout,
            "list_pending_invites",
            self.store.list_pending_invites(campaign_id, self.clock.now()),
        )
        .await
    }

    async fn requester_email(&self, requester_id: Uuid) -> Result<String, CampaignError> {
        bounded(
            self.config.store_timeout,
            "lookup_email_by_user_id",
            self.store.lookup_email_by_user_id(requester_id),
        )
        .await?
        .ok_or_else(|| CampaignError::not_found("User"))
    }
}
