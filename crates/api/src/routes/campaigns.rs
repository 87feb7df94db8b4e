//! Campaign routes.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;
use uuid::Uuid;
use validator::Validate;

use domain::models::campaign::{
    CreateCampaignRequest, DeleteCampaignRequest, RenameCampaignRequest,
};
use domain::models::{Campaign, CampaignDetail, CampaignSummary, GameSystem};

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::UserAuth;
use crate::middleware::metrics::record_campaign_created;

#[derive(Debug, Serialize)]
pub struct ListCampaignsResponse {
    pub campaigns: Vec<CampaignSummary>,
}

/// Create a campaign owned by the caller.
///
/// POST /api/v1/campaigns
///
/// A missing or blank name gets a generated `Campaign #N` name.
pub async fn create_campaign(
    State(state): State<AppState>,
    user_auth: UserAuth,
    Json(request): Json<CreateCampaignRequest>,
) -> Result<(StatusCode, Json<Campaign>), ApiError> {
    request.validate()?;

    let game_system = request
        .game_system
        .as_deref()
        .map(GameSystem::from_tag)
        .unwrap_or_default();

    let campaign = state
        .campaigns
        .create_campaign(
            user_auth.user_id,
            request.name.as_deref(),
            game_system,
            request.party_fund_gets_share,
        )
        .await?;

    record_campaign_created();
    Ok((StatusCode::CREATED, Json(campaign)))
}

/// Campaigns the caller belongs to, newest first.
///
/// GET /api/v1/campaigns
pub async fn list_campaigns(
    State(state): State<AppState>,
    user_auth: UserAuth,
) -> Result<Json<ListCampaignsResponse>, ApiError> {
    let campaigns = state.campaigns.list_campaigns(user_auth.user_id).await?;
    Ok(Json(ListCampaignsResponse { campaigns }))
}

/// GET /api/v1/campaigns/:campaign_id
pub async fn get_campaign(
    State(state): State<AppState>,
    user_auth: UserAuth,
    Path(campaign_id): Path<Uuid>,
) -> Result<Json<CampaignDetail>, ApiError> {
    let detail = state
        .campaigns
        .get_campaign(campaign_id, user_auth.user_id)
        .await?;
    Ok(Json(detail))
}

/// Rename a campaign.
///
/// PATCH /api/v1/campaigns/:campaign_id
pub async fn rename_campaign(
    State(state): State<AppState>,
    user_auth: UserAuth,
    Path(campaign_id): Path<Uuid>,
    Json(request): Json<RenameCampaignRequest>,
) -> Result<Json<Campaign>, ApiError> {
    request.validate()?;
    let campaign = state
        .campaigns
        .rename_campaign(campaign_id, user_auth.user_id, &request.name)
        .await?;
    Ok(Json(campaign))
}

/// Delete a campaign and everything in it.
///
/// DELETE /api/v1/campaigns/:campaign_id
///
/// Owner only; the body must repeat the campaign name.
pub async fn delete_campaign(
    State(state): State<AppState>,
    user_auth: UserAuth,
    Path(campaign_id): Path<Uuid>,
    Json(request): Json<DeleteCampaignRequest>,
) -> Result<StatusCode, ApiError> {
    state
        .campaigns
        .delete_campaign(campaign_id, user_auth.user_id, &request.confirm_name)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
