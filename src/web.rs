//! Axum-based HTTP server for the greenhouse dashboard
//!
//! Serves the static front end, the session endpoints and the protected
//! measurement API. Every JSON answer carries a `success` flag so the
//! dashboard scripts can branch on it.

mod readings;
mod session;

pub use readings::{HistoryParams, history, info, temp};
pub use session::{AuthUser, LoginBody, RegisterBody, inscription, login, logout};

use crate::acquisition::Acquirer;
use crate::auth::{InMemoryRevocationList, TokenRevocation, TokenService, UserStore};
use crate::config::Config;
use crate::error::SerreError;
use crate::history::HistoryStore;
use crate::modbus::RegisterTransport;
use axum::{
    Json, Router,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use std::net::{IpAddr, SocketAddr};
use std::path::Path;
use std::sync::Arc;
use tower_http::services::{ServeDir, ServeFile};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

/// Shared state handed to every handler
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub acquirer: Acquirer,
    pub users: Arc<UserStore>,
    pub tokens: Arc<TokenService>,
    pub revocation: Arc<dyn TokenRevocation>,
    pub history: Arc<HistoryStore>,
}

impl AppState {
    /// Open the user table and history named in `config`
    pub async fn new(
        config: Config,
        transport: Arc<dyn RegisterTransport>,
    ) -> crate::error::Result<Self> {
        let acquirer = Acquirer::with_channels(transport, (&config.registers).into());
        let users = UserStore::open(&config.auth.users_file).await?;
        let history = HistoryStore::open(&config.history).await?;
        Ok(Self {
            tokens: Arc::new(TokenService::from_config(&config.auth)),
            config: Arc::new(config),
            acquirer,
            users: Arc::new(users),
            revocation: Arc::new(InMemoryRevocationList::new()),
            history: Arc::new(history),
        })
    }
}

/// Error answer rendered as `{success: false, <key>: <text>}`
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    key: &'static str,
    text: String,
}

impl ApiError {
    fn message(status: StatusCode, text: impl Into<String>) -> Self {
        Self {
            status,
            key: "message",
            text: text.into(),
        }
    }

    pub fn bad_request(text: impl Into<String>) -> Self {
        Self::message(StatusCode::BAD_REQUEST, text)
    }

    pub fn unauthorized(text: impl Into<String>) -> Self {
        Self::message(StatusCode::UNAUTHORIZED, text)
    }

    pub fn conflict(text: impl Into<String>) -> Self {
        Self::message(StatusCode::CONFLICT, text)
    }

    pub fn server_error() -> Self {
        Self::message(StatusCode::INTERNAL_SERVER_ERROR, "Erreur serveur")
    }

    /// Failed acquisition; the cause goes to the `error` field
    pub fn acquisition(err: impl std::fmt::Display) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            key: "error",
            text: err.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let mut body = serde_json::json!({ "success": false });
        body[self.key] = serde_json::Value::String(self.text);
        (self.status, Json(body)).into_response()
    }
}

#[cfg_attr(feature = "openapi", utoipa::path(get, path = "/api/health", responses(
    (status = 200, description = "Service is healthy")
)))]
pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "version": env!("APP_VERSION"),
    }))
}

#[cfg(feature = "openapi")]
#[utoipa::path(get, path = "/api/config/schema", responses((status = 200)))]
async fn get_config_schema() -> impl IntoResponse {
    let schema = schemars::schema_for!(crate::config::Config);
    Json(serde_json::to_value(&schema).unwrap_or(serde_json::json!({"error":"schema"})))
}

#[cfg(feature = "openapi")]
#[derive(utoipa::OpenApi)]
#[openapi(
    paths(
        health, get_config_schema,
        session::login, session::inscription, session::logout,
        readings::info, readings::temp, readings::history,
    ),
    components(schemas(LoginBody, RegisterBody)),
    tags((name = "serre", description = "Greenhouse monitoring API"))
)]
pub struct ApiDoc;

pub fn build_router(state: AppState) -> Router {
    let static_dir = Path::new(&state.config.web.static_dir).to_path_buf();
    let index = static_dir.join(&state.config.web.index_file);

    let router = Router::new()
        .route_service("/", ServeFile::new(index))
        .route("/api/health", get(health))
        .route("/api/login", post(login))
        .route("/api/inscription", post(inscription))
        .route("/api/logout", post(logout))
        .route("/api/info", get(info))
        .route("/api/temp", get(temp))
        .route("/api/history", get(history));

    #[cfg(feature = "openapi")]
    let router = {
        use utoipa::OpenApi;
        router
            .route("/api/config/schema", get(get_config_schema))
            .merge(utoipa_swagger_ui::SwaggerUi::new("/docs").url("/openapi.json", ApiDoc::openapi()))
    };

    router
        .fallback_service(ServeDir::new(static_dir))
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

pub async fn serve(state: AppState) -> anyhow::Result<()> {
    let host = state.config.web.host.clone();
    let port = state.config.web.port;
    let router = build_router(state);

    let logger = crate::logging::get_logger("web");
    logger.info(&format!(
        "Starting web server; requested host={}, port={}",
        host, port
    ));

    let addr = match host.parse::<IpAddr>() {
        Ok(ip) => SocketAddr::new(ip, port),
        Err(_) => {
            logger.warn(&format!("Invalid host '{}'; falling back to 127.0.0.1", host));
            SocketAddr::from(([127, 0, 0, 1], port))
        }
    };

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| SerreError::web(format!("Cannot bind {}: {}", addr, e)))?;
    let local_addr = listener.local_addr()?;
    logger.info(&format!(
        "Web server listening at http://{}:{} (API /api)",
        local_addr.ip(),
        local_addr.port()
    ));

    axum::serve(listener, router).await?;
    Ok(())
}
