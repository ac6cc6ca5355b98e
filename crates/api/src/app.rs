use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::get,
    Router,
};
use domain::services::NotificationEmitter;
use shared::jwt::{JwtError, JwtVerifier};
use sqlx::PgPool;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{
    compression::CompressionLayer,
    cors::{AllowOrigin, Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::Config;
use crate::middleware::{metrics_handler, metrics_middleware, trace_id};
use crate::realtime::{ConnectionRegistry, RealtimeNotificationEmitter};
use crate::routes::{self, health, ws};
use crate::services::Services;

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub config: Arc<Config>,
    pub services: Services,
    pub connections: ConnectionRegistry,
    pub jwt: Arc<JwtVerifier>,
}

impl AppState {
    /// Production state: PostgreSQL repositories, RS256 verification and
    /// notifications pushed over the realtime registry.
    pub fn new(config: Config, pool: PgPool) -> Result<Self, JwtError> {
        let jwt = JwtVerifier::from_rsa_pem(&config.jwt.public_key, config.jwt.leeway_secs)?;
        let connections = ConnectionRegistry::new(config.realtime.channel_capacity);
        let notifier: Arc<dyn NotificationEmitter> =
            Arc::new(RealtimeNotificationEmitter::new(connections.clone()));

        Ok(Self {
            services: Services::postgres(pool.clone(), notifier),
            pool,
            config: Arc::new(config),
            connections,
            jwt: Arc::new(jwt),
        })
    }
}

fn cors_layer(config: &Config) -> CorsLayer {
    if config.security.cors_origins.is_empty() {
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
    }
}

pub fn create_app(state: AppState) -> Router {
    let config = state.config.clone();

    let api_routes = Router::new()
        .nest("/api/v1", routes::api_router())
        .layer(DefaultBodyLimit::max(config.server.max_body_size))
        .layer(CompressionLayer::new());

    let public_routes = Router::new()
        .route("/api/health", get(health::health_check))
        .route("/api/health/ready", get(health::ready))
        .route("/api/health/live", get(health::live))
        .route("/metrics", get(metrics_handler));

    // The upgrade response must not pass through compression.
    let realtime_routes = Router::new().route("/ws", get(ws::connect));

    Router::new()
        .merge(public_routes)
        .merge(api_routes)
        .merge(realtime_routes)
        .layer(TimeoutLayer::new(Duration::from_secs(
            config.server.request_timeout_secs,
        )))
        .layer(middleware::from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(trace_id))
        .layer(cors_layer(&config))
        .with_state(state)
}
