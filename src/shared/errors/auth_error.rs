use axum::{http::StatusCode, Json};
use serde_json::json;
use thiserror::Error;

use crate::shared::errors::TokenError;

/// 401 응답에 쓰는 공통 메시지 (세부 원인은 노출하지 않음)
pub const UNAUTHORIZED_MESSAGE: &str = "Invalid or expired token";

/// 인증 관련 에러
/// Authentication-related errors
#[derive(Error, Debug)]
pub enum AuthError {
    /// 이메일이 이미 존재함
    /// Email already exists
    #[error("Email already exists: {email}")]
    EmailAlreadyExists { email: String },

    /// 잘못된 이메일 또는 비밀번호 (사용자 없음과 구분하지 않음)
    /// Invalid email or password
    #[error("Invalid email or password")]
    InvalidCredentials,

    /// 세부 원인을 숨긴 인증 실패 (Login/Refresh 경계에서 사용)
    /// Generic unauthorized outcome
    #[error("Unauthorized")]
    Unauthorized,

    /// 형식이 잘못된 토큰
    #[error("Malformed token")]
    MalformedToken,

    /// 서명 불일치
    #[error("Bad token signature")]
    BadSignature,

    /// 만료된 토큰
    #[error("Token expired")]
    ExpiredToken,

    /// 무효화된 세션 (로그아웃 등)
    #[error("Session revoked")]
    RevokedSession,

    /// 저장소에 없는 refresh token
    #[error("Session not found")]
    SessionNotFound,

    /// 토큰이 제공되지 않음
    /// Token not provided
    #[error("Token not provided")]
    MissingToken,

    /// 권한 부족
    #[error("Forbidden")]
    Forbidden,

    /// 잘못된 요청
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// 사용자를 찾을 수 없음
    /// User not found
    #[error("User not found")]
    UserNotFound,

    /// 비밀번호 해싱 실패
    /// Failed to hash password
    #[error("Failed to hash password: {0}")]
    PasswordHashingFailed(String),

    /// 저장소 장애
    /// Store unavailable (never treated as "valid")
    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),

    /// 내부 서버 에러
    /// Internal server error
    #[error("Internal server error: {0}")]
    Internal(String),
}

impl AuthError {
    /// 토큰/자격증명/세션 관련 에러인지 (401 계열)
    /// Token, credential or session failure
    pub fn is_unauthorized(&self) -> bool {
        matches!(
            self,
            AuthError::InvalidCredentials
                | AuthError::Unauthorized
                | AuthError::MalformedToken
                | AuthError::BadSignature
                | AuthError::ExpiredToken
                | AuthError::RevokedSession
                | AuthError::SessionNotFound
                | AuthError::MissingToken
        )
    }

    /// 인프라 에러인지 (500 계열)
    pub fn is_internal(&self) -> bool {
        matches!(
            self,
            AuthError::PasswordHashingFailed(_) | AuthError::StoreUnavailable(_) | AuthError::Internal(_)
        )
    }
}

impl From<TokenError> for AuthError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::Expired => AuthError::ExpiredToken,
            TokenError::BadSignature => AuthError::BadSignature,
            TokenError::Malformed(_) | TokenError::WrongKind => AuthError::MalformedToken,
            TokenError::Encoding(msg) => AuthError::Internal(msg),
        }
    }
}

/// AuthError를 HTTP 응답으로 변환
impl From<AuthError> for (StatusCode, Json<serde_json::Value>) {
    fn from(err: AuthError) -> Self {
        let (status, message) = match &err {
            AuthError::EmailAlreadyExists { .. } => (StatusCode::CONFLICT, err.to_string()),
            AuthError::InvalidCredentials => (StatusCode::UNAUTHORIZED, err.to_string()),
            AuthError::MissingToken => (StatusCode::UNAUTHORIZED, err.to_string()),
            AuthError::Unauthorized
            | AuthError::MalformedToken
            | AuthError::BadSignature
            | AuthError::ExpiredToken
            | AuthError::RevokedSession
            | AuthError::SessionNotFound => {
                (StatusCode::UNAUTHORIZED, UNAUTHORIZED_MESSAGE.to_string())
            }
            AuthError::Forbidden => (StatusCode::FORBIDDEN, err.to_string()),
            AuthError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AuthError::UserNotFound => (StatusCode::NOT_FOUND, err.to_string()),
            AuthError::PasswordHashingFailed(_)
            | AuthError::StoreUnavailable(_)
            | AuthError::Internal(_) => {
                tracing::error!(error = %err, "request failed with internal error");
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error".to_string())
            }
        };

        (status, Json(json!({ "error": message })))
    }
}
