use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, patch, post},
    Router,
};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use domain::services::{CampaignService, Clock, InviteNotifier, InviteService};
use domain::CampaignStore;
use shared::jwt::{JwtConfig, JwtError};

use crate::config::Config;
use crate::middleware::{
    metrics_handler, metrics_middleware, rate_limit_middleware, require_user_auth, trace_id,
    RateLimiterState,
};
use crate::routes::{campaigns, health, invites, items, members};
use crate::services::item_catalog::{CatalogError, ItemCatalog};

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn CampaignStore>,
    pub invites: Arc<InviteService>,
    pub campaigns: Arc<CampaignService>,
    pub catalog: Arc<ItemCatalog>,
    pub jwt: Arc<JwtConfig>,
    pub config: Arc<Config>,
    pub rate_limiter: Option<Arc<RateLimiterState>>,
}

/// Failures while wiring the application together.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("JWT configuration error: {0}")]
    Jwt(#[from] JwtError),

    #[error("Item catalog error: {0}")]
    Catalog(#[from] CatalogError),
}

impl AppState {
    pub fn new(
        config: Config,
        store: Arc<dyn CampaignStore>,
        notifier: Arc<dyn InviteNotifier>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, StartupError> {
        let jwt = Arc::new(config.jwt.verifier()?);
        let catalog = Arc::new(ItemCatalog::new(config.catalog.clone())?);
        let service_config = config.service_config();

        // Rate limiting is disabled when rate_limit_per_minute is 0
        let rate_limiter = if config.security.rate_limit_per_minute > 0 {
            Some(Arc::new(RateLimiterState::new(
                config.security.rate_limit_per_minute,
            )))
        } else {
            None
        };

        let invites = Arc::new(InviteService::new(
            store.clone(),
            notifier,
            clock.clone(),
            service_config.clone(),
        ));
        let campaigns = Arc::new(CampaignService::new(store.clone(), clock, service_config));

        Ok(Self {
            store,
            invites,
            campaigns,
            catalog,
            jwt,
            config: Arc::new(config),
            rate_limiter,
        })
    }
}

pub fn create_app(state: AppState) -> Router {
    let config = state.config.clone();

    // Build CORS layer based on configuration
    let cors = if config.security.cors_origins.is_empty() {
        // Default: allow any origin (for development)
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        use tower_http::cors::AllowOrigin;
        let origins: Vec<_> = config
            .security
            .cors_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        CorsLayer::new()
            .allow_origin(AllowOrigin::list(origins))
            .allow_methods(Any)
            .allow_headers(Any)
    };

    // Invite mutations are rate limited per user. Auth runs first (outermost
    // route layer), then rate limiting, which needs the user from auth.
    let rate_limited = || middleware::from_fn_with_state(state.clone(), rate_limit_middleware);

    let protected_routes = Router::new()
        // Campaign routes (v1)
        .route(
            "/api/v1/campaigns",
            get(campaigns::list_campaigns).post(campaigns::create_campaign),
        )
        .route(
            "/api/v1/campaigns/:campaign_id",
            get(campaigns::get_campaign)
                .patch(campaigns::rename_campaign)
                .delete(campaigns::delete_campaign),
        )
        // Membership routes (v1)
        .route(
            "/api/v1/campaigns/:campaign_id/members",
            get(members::list_members),
        )
        .route(
            "/api/v1/campaigns/:campaign_id/members/:user_id",
            patch(members::change_member_role).delete(members::remove_member),
        )
        .route(
            "/api/v1/campaigns/:campaign_id/leave",
            post(members::leave_campaign),
        )
        // Invite routes (v1)
        .route(
            "/api/v1/campaigns/:campaign_id/invites",
            get(invites::list_pending_invites)
                .merge(post(invites::create_invite).route_layer(rate_limited())),
        )
        .route("/api/v1/invites/:token", get(invites::resolve_invite))
        .route(
            "/api/v1/invites/:token/accept",
            post(invites::accept_invite).route_layer(rate_limited()),
        )
        .route(
            "/api/v1/invites/:token/decline",
            post(invites::decline_invite).route_layer(rate_limited()),
        )
        // Item catalog (v1)
        .route("/api/v1/items/search", get(items::search_items))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            require_user_auth,
        ));

    // Public routes (no authentication required)
    let public_routes = Router::new()
        .route("/api/health", get(health::health_check))
        .route("/api/health/ready", get(health::ready))
        .route("/api/health/live", get(health::live))
        .route("/metrics", get(metrics_handler));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        // Global middleware (order matters: bottom layers run first)
        .layer(DefaultBodyLimit::max(config.server.max_body_size))
        .layer(CompressionLayer::new())
        .layer(TimeoutLayer::new(Duration::from_secs(
            config.server.request_timeout_secs,
        )))
        .layer(middleware::from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(trace_id))
        .layer(cors)
        .with_state(state)
}
