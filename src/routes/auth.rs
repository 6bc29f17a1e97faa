use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::app::AppState;
use crate::db::users;
use crate::errors::{AppError, AppResult};
use crate::jwt::AuthUser;
use crate::models::user::{AuthResponse, LoginRequest, RegisterRequest, User};
use crate::utils::{hash_password, normalize_email, utc_now, verify_password};

#[derive(Debug, Serialize, ToSchema)]
pub struct MessageResponse {
    message: String,
}

#[utoipa::path(
    post,
    path = "/auth/register",
    tag = "Auth",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "User registered", body = AuthResponse),
        (status = 409, description = "Email already in use")
    )
)]
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> AppResult<(StatusCode, Json<AuthResponse>)> {
    let email = normalize_email(&payload.email)?;
    if payload.name.trim().is_empty() {
        return Err(AppError::bad_request("name is required"));
    }
    users::ensure_email_available(&state.pool, &email).await?;

    let password_hash = hash_password(&payload.password)?;
    let user_id = Uuid::new_v4();
    users::insert_user(&state.pool, user_id, payload.name.trim(), &email, &password_hash, utc_now()).await?;

    let user: User = users::fetch_by_id(&state.pool, user_id).await?.into();
    let response = open_session(&state, user).await?;

    Ok((StatusCode::CREATED, Json(response)))
}

#[utoipa::path(
    post,
    path = "/auth/login",
    tag = "Auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = AuthResponse),
        (status = 401, description = "Invalid credentials")
    )
)]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> AppResult<Json<AuthResponse>> {
    let email = payload.email.trim().to_lowercase();
    let db_user = users::find_by_email(&state.pool, &email)
        .await?
        .ok_or_else(|| AppError::unauthorized("invalid credentials"))?;

    if !verify_password(&payload.password, &db_user.password_hash)? {
        return Err(AppError::unauthorized("invalid credentials"));
    }

    Ok(Json(open_session(&state, db_user.into()).await?))
}

#[utoipa::path(
    get,
    path = "/auth/me",
    tag = "Auth",
    responses((status = 200, description = "Current user", body = User))
)]
pub async fn me(State(state): State<AppState>, auth: AuthUser) -> AppResult<Json<User>> {
    let user: User = users::fetch_by_id(&state.pool, auth.user_id).await?.into();
    Ok(Json(user))
}

#[utoipa::path(
    post,
    path = "/auth/logout",
    tag = "Auth",
    responses((status = 200, description = "Logout acknowledged"))
)]
pub async fn logout(State(state): State<AppState>, auth: AuthUser) -> AppResult<Json<MessageResponse>> {
    let closed = state.sessions.close(auth.session_id, auth.expires_at);
    tracing::info!(user_id = %auth.user_id, session_id = %auth.session_id, closed, "logout");

    Ok(Json(MessageResponse {
        message: "Logged out".to_string(),
    }))
}

/// Starts a role session for `user` and signs a token bound to it.
async fn open_session(state: &AppState, user: User) -> AppResult<AuthResponse> {
    let session_id = Uuid::new_v4();
    let issued = state.jwt.issue(user.id, session_id)?;
    let session = state.sessions.open(session_id, user.id, issued.expires_at).await;

    Ok(AuthResponse {
        token: issued.token,
        role: session.current_descriptor(),
        user,
    })
}
