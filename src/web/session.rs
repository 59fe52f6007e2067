use super::{ApiError, AppState};
use crate::auth::{Claims, NewUser};
use crate::error::SerreError;
use crate::logging::{LogContext, get_logger, get_logger_with_context};
use axum::extract::rejection::JsonRejection;
use axum::extract::{FromRequestParts, State};
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use axum::{Json, response::IntoResponse};
use serde::Deserialize;

/// Caller identified by a valid, non-revoked bearer token
#[derive(Debug, Clone)]
pub struct AuthUser(pub Claims);

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, ApiError> {
        let token = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .filter(|t| !t.is_empty())
            .ok_or_else(|| ApiError::unauthorized("Token manquant"))?;

        let claims = state
            .tokens
            .validate(token)
            .map_err(|_| ApiError::unauthorized("Token invalide ou expiré"))?;
        if state.revocation.is_revoked(&claims.jti) {
            return Err(ApiError::unauthorized("Token révoqué"));
        }
        Ok(AuthUser(claims))
    }
}

#[derive(Debug, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct LoginBody {
    pub login: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct RegisterBody {
    pub prenom: Option<String>,
    pub nom: Option<String>,
    pub email: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
}

fn required(field: Option<String>) -> Option<String> {
    field.filter(|v| !v.trim().is_empty())
}

#[cfg_attr(feature = "openapi", utoipa::path(post, path = "/api/login", request_body = LoginBody, responses(
    (status = 200, description = "Token issued"),
    (status = 400, description = "Missing login or password"),
    (status = 401, description = "Unknown user or wrong password")
)))]
pub async fn login(
    State(state): State<AppState>,
    body: Result<Json<LoginBody>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let missing = || ApiError::bad_request("Login et mot de passe requis");
    let Json(body) = body.map_err(|_| missing())?;
    let (Some(login), Some(password)) = (required(body.login), required(body.password)) else {
        return Err(missing());
    };

    let logger = get_logger_with_context(LogContext::new("web").with_user(&login));

    let Some(user) = state.users.find_by_login(&login).await else {
        logger.warn("Login attempt for unknown user");
        return Err(ApiError::unauthorized("Nom d'utilisateur inexistant"));
    };
    if !crate::auth::verify_password(&password, &user.password_hash).await {
        logger.warn("Login attempt with wrong password");
        return Err(ApiError::unauthorized(
            "Nom d'utilisateur ou mot de passe incorrect",
        ));
    }

    let token = state.tokens.issue(&user).map_err(|e| {
        logger.error(&format!("Cannot issue token: {}", e));
        ApiError::server_error()
    })?;
    logger.info("User logged in");
    Ok(Json(serde_json::json!({
        "success": true,
        "message": "Connexion réussie",
        "token": token,
    })))
}

#[cfg_attr(feature = "openapi", utoipa::path(post, path = "/api/inscription", request_body = RegisterBody, responses(
    (status = 200, description = "Account created and token issued"),
    (status = 400, description = "Missing field"),
    (status = 409, description = "Login or mail already used")
)))]
pub async fn inscription(
    State(state): State<AppState>,
    body: Result<Json<RegisterBody>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let missing = || ApiError::bad_request("Tous les champs sont requis");
    let Json(body) = body.map_err(|_| missing())?;
    let (Some(prenom), Some(nom), Some(mail), Some(login), Some(password)) = (
        required(body.prenom),
        required(body.nom),
        required(body.email),
        required(body.username),
        required(body.password),
    ) else {
        return Err(missing());
    };

    let duplicate = || ApiError::conflict("Nom d'utilisateur ou email déjà utilisé");
    if state.users.exists(&login, &mail).await {
        return Err(duplicate());
    }

    let logger = get_logger("web");
    let user = state
        .users
        .insert(NewUser {
            nom,
            prenom,
            mail,
            login,
            password,
        })
        .await
        .map_err(|e| match e {
            // Lost a race against a concurrent registration
            SerreError::Validation { .. } => duplicate(),
            other => {
                logger.error(&format!("Registration failed: {}", other));
                ApiError::server_error()
            }
        })?;

    let token = state.tokens.issue(&user).map_err(|e| {
        logger.error(&format!("Cannot issue token: {}", e));
        ApiError::server_error()
    })?;
    Ok(Json(serde_json::json!({
        "success": true,
        "message": "Inscription réussie",
        "token": token,
    })))
}

#[cfg_attr(feature = "openapi", utoipa::path(post, path = "/api/logout", responses(
    (status = 200, description = "Token revoked"),
    (status = 401, description = "Missing, invalid or revoked token")
)))]
pub async fn logout(State(state): State<AppState>, AuthUser(claims): AuthUser) -> impl IntoResponse {
    state.revocation.revoke(&claims.jti, claims.exp);
    get_logger("web").debug(&format!("Revoked token of '{}'", claims.login));
    Json(serde_json::json!({
        "success": true,
        "message": "Déconnexion réussie",
    }))
}
