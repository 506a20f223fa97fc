use axum::{
    Json, Router,
    http::{HeaderValue, StatusCode},
    middleware,
    routing::{get, patch, post, put},
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tower_sessions::{Expiry, MemoryStore, SessionManagerLayer};

use crate::config::Config;
use crate::state::SharedState;

pub mod auth;
mod bookings;
mod catalog;
mod cinemas;
mod error;
mod movies;
mod observability;
mod slots;
mod types;
mod validation;

pub use error::ApiError;
pub use types::*;

use metrics_exporter_prometheus::PrometheusHandle;
use tokio::sync::RwLock;

#[derive(Clone)]
pub struct AppState {
    pub shared: Arc<SharedState>,

    pub start_time: std::time::Instant,

    pub prometheus_handle: Option<PrometheusHandle>,
}

impl AppState {
    #[must_use]
    pub fn config(&self) -> &Arc<RwLock<Config>> {
        &self.shared.config
    }

    #[must_use]
    pub fn store(&self) -> &crate::db::Store {
        &self.shared.store
    }

    #[must_use]
    pub fn catalog(&self) -> &crate::services::CatalogService {
        &self.shared.catalog
    }

    #[must_use]
    pub fn slots(&self) -> &crate::services::SlotService {
        &self.shared.slots
    }

    #[must_use]
    pub fn bookings(&self) -> &crate::services::BookingService {
        &self.shared.bookings
    }
}

pub async fn create_app_state_from_config(
    config: Config,
    prometheus_handle: Option<PrometheusHandle>,
) -> anyhow::Result<Arc<AppState>> {
    let shared = Arc::new(SharedState::new(config).await?);

    Ok(Arc::new(AppState {
        shared,
        start_time: std::time::Instant::now(),
        prometheus_handle,
    }))
}

pub async fn router(state: Arc<AppState>) -> Router {
    let (cors_origins, secure_cookies, session_minutes) = {
        let config = state.config().read().await;
        (
            config.server.cors_allowed_origins.clone(),
            config.server.secure_cookies,
            config.server.session_inactivity_minutes,
        )
    };

    let session_store = MemoryStore::default();
    let session_layer = SessionManagerLayer::new(session_store)
        .with_secure(secure_cookies)
        .with_same_site(tower_sessions::cookie::SameSite::Lax)
        .with_expiry(Expiry::OnInactivity(time::Duration::minutes(
            session_minutes,
        )));

    let api_router = Router::new()
        // Catalog browsing (public)
        .route("/languages", get(catalog::list_languages))
        .route("/genres", get(catalog::list_genres))
        .route("/cities", get(catalog::list_cities))
        .route("/cinemas", get(cinemas::list_cinemas))
        .route("/cinemas/{id}", get(cinemas::get_cinema))
        .route("/movies", get(movies::list_movies))
        .route("/movies/{id}", get(movies::get_movie))
        .route("/slots/{id}", get(slots::get_slot))
        // Credentials & profile
        .route("/auth/signup", post(auth::signup))
        .route("/auth/login", post(auth::login))
        .route("/auth/logout", post(auth::logout))
        .route("/auth/api-key/regenerate", post(auth::regenerate_api_key))
        .route("/profile", get(auth::get_profile))
        .route("/profile", patch(auth::update_profile))
        // Booking lifecycle (authenticated)
        .route("/bookings", post(bookings::create_booking))
        .route("/bookings", get(bookings::list_bookings))
        .route("/bookings/{id}", patch(bookings::cancel_booking))
        // Staff-gated catalog writes
        .route("/cities", post(catalog::create_city))
        .route("/genres", post(catalog::create_genre))
        .route("/languages", post(catalog::create_language))
        .route("/cinemas", post(cinemas::create_cinema))
        .route("/cinemas/{id}", put(cinemas::update_cinema))
        .route("/movies", post(movies::create_movie))
        .route("/slots", post(slots::create_slot))
        .route("/slots/{id}", put(slots::update_slot))
        .route("/metrics", get(observability::get_metrics))
        .layer(session_layer);

    let cors_layer = if cors_origins.contains(&"*".to_string()) {
        CorsLayer::new().allow_origin(Any)
    } else {
        let origins: Vec<HeaderValue> =
            cors_origins.iter().filter_map(|s| s.parse().ok()).collect();
        CorsLayer::new().allow_origin(origins)
    };

    Router::new()
        .route("/", get(|| async { "Cinebook API v1.0" }))
        .route("/health", get(health))
        .nest("/api", api_router)
        .fallback(not_found)
        .with_state(state)
        .layer(cors_layer.allow_methods(Any).allow_headers(Any))
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(observability::track_requests))
        .layer(middleware::from_fn(
            observability::security_headers_middleware,
        ))
}

async fn health(
    axum::extract::State(state): axum::extract::State<Arc<AppState>>,
) -> Result<&'static str, ApiError> {
    state
        .store()
        .ping()
        .await
        .map_err(|e| ApiError::internal(format!("Database unreachable: {e}")))?;
    Ok("OK")
}

/// Standardized body for every unmatched route.
async fn not_found() -> (StatusCode, Json<serde_json::Value>) {
    (
        StatusCode::NOT_FOUND,
        Json(serde_json::json!({
            "message": "The requested resource was not found"
        })),
    )
}
