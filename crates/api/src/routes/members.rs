//! Campaign membership routes.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;
use uuid::Uuid;

use domain::models::membership::ChangeMemberRoleRequest;
use domain::models::{MemberView, Membership};

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::UserAuth;

#[derive(Debug, Serialize)]
pub struct ListMembersResponse {
    pub members: Vec<MemberView>,
}

/// GET /api/v1/campaigns/:campaign_id/members
pub async fn list_members(
    State(state): State<AppState>,
    user_auth: UserAuth,
    Path(campaign_id): Path<Uuid>,
) -> Result<Json<ListMembersResponse>, ApiError> {
    let members = state
        .campaigns
        .list_members(campaign_id, user_auth.user_id)
        .await?;
    Ok(Json(ListMembersResponse { members }))
}

/// Change a member's role. Owner only; the owner role cannot be assigned.
///
/// PATCH /api/v1/campaigns/:campaign_id/members/:user_id
pub async fn change_member_role(
    State(state): State<AppState>,
    user_auth: UserAuth,
    Path((campaign_id, target_id)): Path<(Uuid, Uuid)>,
    Json(request): Json<ChangeMemberRoleRequest>,
) -> Result<Json<Membership>, ApiError> {
    let membership = state
        .campaigns
        .change_member_role(campaign_id, user_auth.user_id, target_id, request.role)
        .await?;
    Ok(Json(membership))
}

/// Remove a member from the campaign.
///
/// DELETE /api/v1/campaigns/:campaign_id/members/:user_id
pub async fn remove_member(
    State(state): State<AppState>,
    user_auth: UserAuth,
    Path((campaign_id, target_id)): Path<(Uuid, Uuid)>,
) -> Result<StatusCode, ApiError> {
    state
        .campaigns
        .remove_member(campaign_id, user_auth.user_id, target_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Leave a campaign. Owners cannot leave.
///
/// POST /api/v1/campaigns/:campaign_id/leave
pub async fn leave_campaign(
    State(state): State<AppState>,
    user_auth: UserAuth,
    Path(campaign_id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    state
        .campaigns
        .leave_campaign(campaign_id, user_auth.user_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
