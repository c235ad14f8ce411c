use axum::{Json, extract::State};
use std::sync::Arc;
use tower_sessions::Session;

use super::session::{self, AuthUser, SessionIdentity};
use super::{
    ApiError, AppState, AuthResponse, LoginRequest, MessageResponse, ProfileResponse,
    RegisterRequest,
};
use crate::db::User;

/// POST /users/register
/// Create an account and log it in
pub async fn register(
    State(state): State<Arc<AppState>>,
    session: Session,
    Json(payload): Json<RegisterRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    let user = state
        .user_service()
        .register(&payload.username, &payload.email, &payload.password)
        .await?;

    start_session(&session, &user).await?;

    Ok(Json(AuthResponse {
        message: "User registered successfully".to_string(),
        user_id: user.user_id,
        username: user.username,
    }))
}

/// POST /users/login
pub async fn login(
    State(state): State<Arc<AppState>>,
    session: Session,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    if payload.username.trim().is_empty() {
        return Err(ApiError::validation("Username is required"));
    }
    if payload.password.is_empty() {
        return Err(ApiError::validation("Password is required"));
    }

    let user = state
        .user_service()
        .authenticate(payload.username.trim(), &payload.password)
        .await?;

    start_session(&session, &user).await?;

    Ok(Json(AuthResponse {
        message: "Login successful".to_string(),
        user_id: user.user_id,
        username: user.username,
    }))
}

/// POST /users/logout
/// Succeeds whether or not a session exists
pub async fn logout(session: Session) -> Result<Json<MessageResponse>, ApiError> {
    if let Some(identity) = session::current(&session).await? {
        tracing::info!(user_id = %identity.user_id, "User logged out");
    }

    session::invalidate(&session).await?;

    Ok(Json(MessageResponse::new("Logout successful")))
}

/// GET /users/profile
pub async fn profile(
    State(state): State<Arc<AppState>>,
    AuthUser(identity): AuthUser,
) -> Result<Json<ProfileResponse>, ApiError> {
    let user = state
        .user_service()
        .find_by_id(&identity.user_id)
        .await?
        .ok_or_else(|| ApiError::not_found("User"))?;

    let file_count = state
        .file_service()
        .count_for_owner(&user.user_id)
        .await?;

    Ok(Json(ProfileResponse::new(user, file_count)))
}

async fn start_session(session: &Session, user: &User) -> Result<(), ApiError> {
    session::establish(
        session,
        &SessionIdentity {
            user_id: user.user_id.clone(),
            username: user.username.clone(),
        },
    )
    .await?;

    tracing::Span::current().record("user_id", user.user_id.as_str());
    Ok(())
}
