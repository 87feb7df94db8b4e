//! Invite routes: create, list, resolve, accept and decline.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use domain::models::invite::CreateInviteRequest;
use domain::models::{CreatedInvite, Invite, InvitePreview, InviteRole, Membership};
use domain::CampaignError;

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::UserAuth;
use crate::middleware::metrics::{record_invite_created, record_invite_resolved};

#[derive(Debug, Serialize)]
pub struct PendingInvitesResponse {
    pub invites: Vec<Invite>,
}

/// Records the outcome of an accept or decline before handing the result back.
fn observe<T>(result: Result<T, CampaignError>, success: &'static str) -> Result<T, ApiError> {
    match result {
        Ok(value) => {
            record_invite_resolved(success);
            Ok(value)
        }
        Err(e) => {
            record_invite_resolved(e.code());
            Err(e.into())
        }
    }
}

/// Invite someone to a campaign by email.
///
/// POST /api/v1/campaigns/:campaign_id/invites
///
/// Owners and contributors only. The invite exists even when the email
/// could not be delivered; `delivery` says what happened and `link` can be
/// shared by hand.
pub async fn create_invite(
    State(state): State<AppState>,
    user_auth: UserAuth,
    Path(campaign_id): Path<Uuid>,
    Json(request): Json<CreateInviteRequest>,
) -> Result<(StatusCode, Json<CreatedInvite>), ApiError> {
    request.validate()?;
    let role = InviteRole::parse(&request.role)?;

    let created = state
        .invites
        .create(campaign_id, user_auth.user_id, &request.email, role)
        .await?;

    record_invite_created(&created.delivery);
    info!(
        campaign_id = %campaign_id,
        invite_id = %created.invite.id,
        user_id = %user_auth.user_id,
        "Invite created via API"
    );

    Ok((StatusCode::CREATED, Json(created)))
}

/// Pending, unexpired invites for a campaign.
///
/// GET /api/v1/campaigns/:campaign_id/invites
pub async fn list_pending_invites(
    State(state): State<AppState>,
    user_auth: UserAuth,
    Path(campaign_id): Path<Uuid>,
) -> Result<Json<PendingInvitesResponse>, ApiError> {
    let invites = state
        .invites
        .list_pending(campaign_id, user_auth.user_id)
        .await?;
    Ok(Json(PendingInvitesResponse { invites }))
}

/// Preview an invite before accepting it.
///
/// GET /api/v1/invites/:token
///
/// Only the invited email may look at the invite; anyone else gets 404.
pub async fn resolve_invite(
    State(state): State<AppState>,
    user_auth: UserAuth,
    Path(token): Path<String>,
) -> Result<Json<InvitePreview>, ApiError> {
    let preview = state.invites.resolve(&token, &user_auth.email).await?;
    Ok(Json(preview))
}

/// Accept an invite and join the campaign.
///
/// POST /api/v1/invites/:token/accept
pub async fn accept_invite(
    State(state): State<AppState>,
    user_auth: UserAuth,
    Path(token): Path<String>,
) -> Result<Json<Membership>, ApiError> {
    let membership = observe(
        state.invites.accept(&token, user_auth.user_id).await,
        "accepted",
    )?;
    Ok(Json(membership))
}

/// Decline an invite.
///
/// POST /api/v1/invites/:token/decline
pub async fn decline_invite(
    State(state): State<AppState>,
    user_auth: UserAuth,
    Path(token): Path<String>,
) -> Result<Json<Invite>, ApiError> {
    let invite = observe(
        state.invites.decline(&token, user_auth.user_id).await,
        "declined",
    )?;
    Ok(Json(invite))
}
