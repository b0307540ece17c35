use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use std::time::Duration;
use tower_http::{
    compression::CompressionLayer,
    cors::{AllowOrigin, Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use domain::services::{
    ActivityService, AmbulanceRequestLifecycle, AvailabilityLedger, ChangeFeed,
    HelpRequestLifecycle, StoreHealth, Stores,
};
use shared::jwt::{JwtError, JwtVerifier};

use crate::config::Config;
use crate::middleware::{
    metrics_handler, metrics_middleware, rate_limit_middleware, security_headers_middleware,
    trace_id, RateLimiterState,
};
use crate::routes::{
    activity, ambulance_requests, availability, events, health, help_requests,
};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub ledger: AvailabilityLedger,
    pub help_requests: HelpRequestLifecycle,
    pub ambulance_requests: AmbulanceRequestLifecycle,
    pub activity: ActivityService,
    pub change_feed: ChangeFeed,
    pub health: Arc<dyn StoreHealth>,
    /// `postgres` or `memory`, reported by the health check.
    pub store_backend: &'static str,
    pub verifier: Arc<JwtVerifier>,
    pub rate_limiter: Option<Arc<RateLimiterState>>,
}

impl AppState {
    /// Wires the domain services over `stores`.
    pub fn new(
        config: Config,
        stores: Stores,
        change_feed: ChangeFeed,
        store_backend: &'static str,
    ) -> Result<Self, JwtError> {
        let mut verifier = JwtVerifier::from_parts(
            &config.auth.algorithm,
            config.auth.key_material(),
            config.auth.leeway_secs,
        )?;
        if let Some(audience) = config.auth.audience.as_deref().filter(|a| !a.is_empty()) {
            verifier = verifier.with_audience(audience);
        }

        let ledger =
            AvailabilityLedger::with_fleet_size(stores.availability, config.ledger.default_fleet_size);
        let rate_limiter = RateLimiterState::new(config.security.submission_rate_limit_per_minute)
            .map(Arc::new);

        Ok(Self {
            help_requests: HelpRequestLifecycle::new(stores.help_requests.clone(), ledger.clone()),
            ambulance_requests: AmbulanceRequestLifecycle::new(
                stores.ambulance_requests.clone(),
                ledger.clone(),
            ),
            activity: ActivityService::new(stores.help_requests, stores.ambulance_requests),
            ledger,
            change_feed,
            health: stores.health,
            store_backend,
            verifier: Arc::new(verifier),
            rate_limiter,
            config: Arc::new(config),
        })
    }
}

pub fn create_app(state: AppState) -> Router {
    let config = state.config.clone();

    let cors = if config.security.cors_origins.is_empty() {
        // Default: allow any origin (for development)
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
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

    // Patient submissions, rate limited per caller.
    let submission_routes = Router::new()
        .route(
            "/api/v1/hospitals/:hospital_id/help-requests",
            post(help_requests::submit_help_request),
        )
        .route(
            "/api/v1/hospitals/:hospital_id/ambulance-requests",
            post(ambulance_requests::submit_ambulance_request),
        )
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            rate_limit_middleware,
        ));

    // Patient reads (guests allowed)
    let patient_routes = Router::new()
        .route(
            "/api/v1/hospitals/:hospital_id/ambulance-availability",
            get(availability::get_availability),
        )
        .route(
            "/api/v1/hospitals/:hospital_id/events",
            get(events::hospital_events),
        );

    // Admin routes; the hospital comes from the token
    let admin_routes = Router::new()
        .route(
            "/api/v1/admin/ambulance-availability",
            get(availability::get_admin_availability),
        )
        .route(
            "/api/v1/admin/help-requests",
            get(help_requests::list_help_requests),
        )
        .route(
            "/api/v1/admin/help-requests/:id/accept",
            post(help_requests::accept_help_request),
        )
        .route(
            "/api/v1/admin/help-requests/:id/reject",
            post(help_requests::reject_help_request),
        )
        .route(
            "/api/v1/admin/help-requests/:id/resolve",
            post(help_requests::resolve_help_request),
        )
        .route(
            "/api/v1/admin/ambulance-requests",
            get(ambulance_requests::list_ambulance_requests),
        )
        .route(
            "/api/v1/admin/ambulance-requests/:id/dispatch",
            post(ambulance_requests::dispatch_ambulance_request),
        )
        .route(
            "/api/v1/admin/ambulance-requests/:id/complete",
            post(ambulance_requests::complete_ambulance_request),
        )
        .route(
            "/api/v1/admin/ambulance-requests/:id/reject",
            post(ambulance_requests::reject_ambulance_request),
        )
        .route("/api/v1/admin/activity", get(activity::get_activity))
        .route("/api/v1/admin/events", get(events::admin_events));

    // Public routes (no authentication required)
    let public_routes = Router::new()
        .route("/api/health", get(health::health_check))
        .route("/api/health/ready", get(health::ready))
        .route("/api/health/live", get(health::live))
        .route("/metrics", get(metrics_handler));

    Router::new()
        .merge(public_routes)
        .merge(patient_routes)
        .merge(submission_routes)
        .merge(admin_routes)
        // Global middleware (order matters: bottom layers run first)
        .layer(middleware::from_fn_with_state(
            state.clone(),
            security_headers_middleware,
        ))
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
