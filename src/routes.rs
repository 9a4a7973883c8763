use axum::{
    http::{header, HeaderValue, Method},
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::auth::rate_limit::rate_limit_auth;
use crate::config::Config;
use crate::error::AppError;
use crate::handlers;
use crate::AppState;

pub fn router(state: AppState) -> Router {
    let auth_routes = Router::new()
        .route("/api/login", post(handlers::auth::login))
        .route("/api/signup", post(handlers::auth::signup))
        .layer(middleware::from_fn_with_state(state.clone(), rate_limit_auth));

    let api_routes = Router::new()
        .route("/api/users", get(handlers::auth::list_users))
        // AI gateway
        .route("/api/ai/analyze", post(handlers::ai::analyze))
        .route("/api/ai/chat", post(handlers::ai::chat))
        .route("/api/ai/report", post(handlers::ai::report))
        // Entries
        .route(
            "/api/entries",
            get(handlers::entries::list_entries).post(handlers::entries::create_entry),
        )
        // Groups
        .route("/api/groups/:group_id", get(handlers::groups::get_group))
        .route(
            "/api/groups/:group_id/announcement",
            post(handlers::groups::update_announcement),
        )
        .route("/api/groups/:group_id/vibes", post(handlers::groups::send_vibe))
        .route("/api/groups/:group_id/pulse", get(handlers::groups::group_pulse));

    let cors = cors_layer(&state.config);

    Router::new()
        .route("/health", get(handlers::health::health_check))
        .route("/readyz", get(handlers::health::readyz))
        .merge(auth_routes)
        .merge(api_routes)
        .fallback(route_not_found)
        .layer(cors)
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn route_not_found() -> AppError {
    AppError::NotFound("Route not found".into())
}

fn cors_layer(config: &Config) -> CorsLayer {
    let origins: Vec<HeaderValue> = std::iter::once(&config.frontend_url)
        .chain(config.cors_extra_origins.iter())
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT])
}
