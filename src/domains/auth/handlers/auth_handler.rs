use axum::{extract::State, http::StatusCode, Json};
use serde_json::json;

use crate::domains::auth::models::{
    AuthResponse, ChangePasswordRequest, LoginRequest, LogoutAllResponse, LogoutRequest,
    RefreshTokenRequest, RefreshTokenResponse, RegisterRequest, UserResponse,
};
use crate::domains::auth::services::AuthSession;
use crate::shared::errors::AuthError;
use crate::shared::middleware::auth::AuthenticatedUser;
use crate::shared::services::AppState;

type ApiError = (StatusCode, Json<serde_json::Value>);

fn auth_response(session: AuthSession, message: &str) -> AuthResponse {
    AuthResponse {
        expires_in: session.access_token.expires_in,
        access_token: session.access_token.token,
        refresh_token: session.refresh_token.token,
        session_persisted: session.session_persisted,
        user: session.user.into(),
        message: message.to_string(),
    }
}

#[utoipa::path(
    post,
    path = "/api/auth/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "User registered successfully", body = AuthResponse),
        (status = 400, description = "Validation failed"),
        (status = 409, description = "Email already exists"),
        (status = 500, description = "Internal server error")
    ),
    tag = "Auth"
)]
pub async fn register(
    State(app_state): State<AppState>,
    Json(request): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<AuthResponse>), ApiError> {
    let session = app_state
        .auth_state
        .auth_service
        .register(request)
        .await
        .map_err(|e: AuthError| -> ApiError { e.into() })?;

    Ok((
        StatusCode::CREATED,
        Json(auth_response(session, "User registered successfully")),
    ))
}

// 로그인 핸들러
#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = AuthResponse),
        (status = 401, description = "Invalid email or password"),
        (status = 500, description = "Internal server error")
    ),
    tag = "Auth"
)]
pub async fn login(
    State(app_state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    let session = app_state
        .auth_state
        .auth_service
        .login(request)
        .await
        .map_err(|e: AuthError| -> ApiError { e.into() })?;

    Ok(Json(auth_response(session, "Login successful")))
}

/// 토큰 갱신 핸들러
/// Refresh token handler
#[utoipa::path(
    post,
    path = "/api/auth/refresh",
    request_body = RefreshTokenRequest,
    responses(
        (status = 200, description = "Token refreshed successfully", body = RefreshTokenResponse),
        (status = 401, description = "Invalid or expired refresh token"),
        (status = 500, description = "Internal server error")
    ),
    tag = "Auth"
)]
pub async fn refresh(
    State(app_state): State<AppState>,
    Json(request): Json<RefreshTokenRequest>,
) -> Result<Json<RefreshTokenResponse>, ApiError> {
    let refreshed = app_state
        .auth_state
        .auth_service
        .refresh(&request.refresh_token)
        .await
        .map_err(|e: AuthError| -> ApiError { e.into() })?;

    Ok(Json(RefreshTokenResponse {
        expires_in: refreshed.access_token.expires_in,
        access_token: refreshed.access_token.token,
        refresh_token: refreshed.refresh_token.map(|issued| issued.token),
        message: "Token refreshed successfully".to_string(),
    }))
}

/// 로그아웃 핸들러
/// Logout handler
#[utoipa::path(
    post,
    path = "/api/auth/logout",
    request_body = LogoutRequest,
    responses(
        (status = 200, description = "Logout successful"),
        (status = 400, description = "Invalid refresh token"),
        (status = 500, description = "Internal server error")
    ),
    tag = "Auth"
)]
pub async fn logout(
    State(app_state): State<AppState>,
    Json(request): Json<LogoutRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    app_state
        .auth_state
        .auth_service
        .logout(&request.refresh_token)
        .await
        .map_err(|e: AuthError| -> ApiError { e.into() })?;

    Ok(Json(json!({
        "message": "Logout successful"
    })))
}

/// 모든 기기에서 로그아웃
/// Logout from all devices
#[utoipa::path(
    post,
    path = "/api/auth/logout-all",
    responses(
        (status = 200, description = "All sessions revoked", body = LogoutAllResponse),
        (status = 401, description = "Unauthorized"),
        (status = 500, description = "Internal server error")
    ),
    security(
        ("BearerAuth" = [])
    ),
    tag = "Auth"
)]
pub async fn logout_all(
    State(app_state): State<AppState>,
    authenticated_user: AuthenticatedUser,
) -> Result<Json<LogoutAllResponse>, ApiError> {
    let revoked_sessions = app_state
        .auth_state
        .auth_service
        .logout_all(authenticated_user.user_id)
        .await
        .map_err(|e: AuthError| -> ApiError { e.into() })?;

    Ok(Json(LogoutAllResponse {
        revoked_sessions,
        message: "Logged out from all devices".to_string(),
    }))
}

/// 비밀번호 변경 (모든 세션 무효화)
/// Change password and revoke every session
#[utoipa::path(
    post,
    path = "/api/auth/change-password",
    request_body = ChangePasswordRequest,
    responses(
        (status = 200, description = "Password changed, all sessions revoked", body = LogoutAllResponse),
        (status = 400, description = "New password too short"),
        (status = 401, description = "Unauthorized or wrong old password"),
        (status = 500, description = "Internal server error")
    ),
    security(
        ("BearerAuth" = [])
    ),
    tag = "Auth"
)]
pub async fn change_password(
    State(app_state): State<AppState>,
    authenticated_user: AuthenticatedUser,
    Json(request): Json<ChangePasswordRequest>,
) -> Result<Json<LogoutAllResponse>, ApiError> {
    let revoked_sessions = app_state
        .auth_state
        .auth_service
        .change_password(
            authenticated_user.user_id,
            &request.old_password,
            &request.new_password,
        )
        .await
        .map_err(|e: AuthError| -> ApiError { e.into() })?;

    Ok(Json(LogoutAllResponse {
        revoked_sessions,
        message: "Password changed successfully".to_string(),
    }))
}

#[utoipa::path(
    get,
    path = "/api/auth/me",
    responses(
        (status = 200, description = "User info retrieved successfully", body = UserResponse),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "User not found"),
        (status = 500, description = "Internal server error")
    ),
    security(
        ("BearerAuth" = [])
    ),
    tag = "Auth"
)]
pub async fn get_me(
    State(app_state): State<AppState>,
    authenticated_user: AuthenticatedUser,
) -> Result<Json<UserResponse>, ApiError> {
    let user = app_state
        .auth_state
        .auth_service
        .current_user(authenticated_user.user_id)
        .await
        .map_err(|e: AuthError| -> ApiError { e.into() })?;

    Ok(Json(user.into()))
}
