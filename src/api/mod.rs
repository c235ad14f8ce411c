use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::{HeaderValue, Method, header},
    middleware,
    routing::{get, post},
};
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::state::SharedState;

mod error;
mod files;
mod observability;
pub mod session;
mod system;
mod types;
mod users;
mod validation;

pub use error::ApiError;
pub use session::{AuthUser, SessionBackend, SessionIdentity};
pub use types::*;

use tokio::sync::RwLock;

use crate::services::{FileService, UserService};
use metrics_exporter_prometheus::PrometheusHandle;

#[derive(Clone)]
pub struct AppState {
    pub shared: Arc<SharedState>,

    pub sessions: SessionBackend,

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
    pub fn user_service(&self) -> &Arc<dyn UserService> {
        &self.shared.user_service
    }

    #[must_use]
    pub fn file_service(&self) -> &Arc<dyn FileService> {
        &self.shared.file_service
    }
}

pub async fn create_app_state(
    shared: Arc<SharedState>,
    prometheus_handle: Option<PrometheusHandle>,
) -> anyhow::Result<Arc<AppState>> {
    let session_kind = shared.config.read().await.server.session_store;
    let sessions = SessionBackend::from_config(session_kind, &shared.store).await?;

    Ok(Arc::new(AppState {
        shared,
        sessions,
        start_time: std::time::Instant::now(),
        prometheus_handle,
    }))
}

pub async fn create_app_state_from_config(
    config: Config,
    prometheus_handle: Option<PrometheusHandle>,
) -> anyhow::Result<Arc<AppState>> {
    let shared = Arc::new(SharedState::new(config).await?);
    create_app_state(shared, prometheus_handle).await
}

pub async fn router(state: Arc<AppState>) -> Router {
    let server = state.config().read().await.server.clone();

    let api_router = Router::new()
        .route("/users/register", post(users::register))
        .route("/users/login", post(users::login))
        .route("/users/logout", post(users::logout))
        .route("/users/profile", get(users::profile))
        .route(
            "/files/upload",
            post(files::upload).layer(DefaultBodyLimit::max(server.max_upload_bytes())),
        )
        .route("/files/download/{file_id}", get(files::download))
        .route("/files/{file_id}/metadata", get(files::metadata))
        .route("/files/user", get(files::list_user_files))
        .route("/system/health/live", get(system::health_live))
        .route("/system/health/ready", get(system::health_ready))
        .route("/metrics", get(observability::get_metrics));

    let api_router = match &state.sessions {
        SessionBackend::Memory(store) => {
            api_router.layer(session::with_session_layer(store.clone(), &server))
        }
        SessionBackend::Database(store) => {
            api_router.layer(session::with_session_layer(store.clone(), &server))
        }
    }
    .layer(middleware::from_fn(observability::track_requests))
    .with_state(state.clone());

    Router::new()
        .nest("/api", api_router)
        .layer(cors_layer(&server.cors_allowed_origins))
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(
            observability::security_headers_middleware,
        ))
}

/// Credentialed CORS cannot use wildcards, so "*" mirrors the request origin.
fn cors_layer(origins: &[String]) -> CorsLayer {
    let allow_origin = if origins.iter().any(|o| o == "*") {
        AllowOrigin::mirror_request()
    } else {
        let origins: Vec<HeaderValue> = origins
            .iter()
            .filter_map(|s| match s.parse() {
                Ok(value) => Some(value),
                Err(_) => {
                    tracing::warn!(origin = %s, "Ignoring invalid CORS origin");
                    None
                }
            })
            .collect();
        AllowOrigin::list(origins)
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_credentials(true)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT, header::AUTHORIZATION])
}
