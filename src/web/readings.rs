use super::{ApiError, AppState, AuthUser};
use crate::logging::{LogContext, get_logger, get_logger_with_context};
use crate::snapshot::Snapshot;
use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::{Json, response::IntoResponse};
use chrono::{Duration, Utc};
use serde::Deserialize;

/// Run one acquisition cycle against the configured module
async fn acquire(state: &AppState, user: &str) -> Result<Snapshot, ApiError> {
    let device = &state.config.device;
    state
        .acquirer
        .acquire(&device.host, device.port)
        .await
        .map_err(|e| {
            let logger = get_logger_with_context(
                LogContext::new("web")
                    .with_user(user)
                    .with_device(&device.host, device.port),
            );
            logger.error(&format!("Acquisition failed: {}", e));
            ApiError::acquisition(e)
        })
}

#[cfg_attr(feature = "openapi", utoipa::path(get, path = "/api/info", responses(
    (status = 200, description = "Current readings of all channels"),
    (status = 401, description = "Missing, invalid or revoked token"),
    (status = 500, description = "Device unreachable or bad answer")
)))]
pub async fn info(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
) -> Result<impl IntoResponse, ApiError> {
    let snapshot = acquire(&state, &claims.login).await?;

    if let Err(e) = state.history.record(&snapshot).await {
        get_logger("history").warn(&format!("Cannot record measurement: {}", e));
    }

    let mut body = serde_json::to_value(&snapshot).map_err(|_| ApiError::server_error())?;
    body["success"] = serde_json::Value::Bool(true);
    Ok(Json(body))
}

#[cfg_attr(feature = "openapi", utoipa::path(get, path = "/api/temp", responses(
    (status = 200, description = "Current temperature, two decimals"),
    (status = 401, description = "Missing, invalid or revoked token"),
    (status = 500, description = "Device unreachable or bad answer")
)))]
pub async fn temp(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
) -> Result<impl IntoResponse, ApiError> {
    let snapshot = acquire(&state, &claims.login).await?;
    let temperature = snapshot
        .temperature()
        .ok_or_else(|| ApiError::acquisition("temperature not read"))?;
    Ok(Json(serde_json::json!({
        "success": true,
        "temperature": format!("{:.2}", temperature),
    })))
}

#[derive(Debug, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema, utoipa::IntoParams))]
pub struct HistoryParams {
    /// Window length in hours
    pub hours: Option<u32>,
}

#[cfg_attr(feature = "openapi", utoipa::path(get, path = "/api/history", params(HistoryParams), responses(
    (status = 200, description = "Measurements of the requested window, oldest first"),
    (status = 400, description = "Invalid window"),
    (status = 401, description = "Missing, invalid or revoked token")
)))]
pub async fn history(
    State(state): State<AppState>,
    _user: AuthUser,
    params: Result<Query<HistoryParams>, QueryRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let invalid = || ApiError::bad_request("Paramètre hours invalide");
    let Query(params) = params.map_err(|_| invalid())?;

    let limits = &state.config.history;
    let hours = match params.hours {
        Some(0) => return Err(invalid()),
        Some(h) => h.min(limits.max_hours),
        None => limits.default_hours,
    };

    let since = Utc::now() - Duration::hours(i64::from(hours));
    let data = state.history.since(since).await;
    Ok(Json(serde_json::json!({
        "success": true,
        "hours": hours,
        "data": data,
    })))
}
