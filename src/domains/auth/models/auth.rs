use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domains::auth::models::user::UserResponse;
use crate::shared::errors::AuthError;

pub const MIN_PASSWORD_LEN: usize = 6;
pub const MIN_NAME_LEN: usize = 2;
pub const MAX_NAME_LEN: usize = 100;

// 회원가입 요청 모델
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[schema(as = RegisterRequest)]
pub struct RegisterRequest {
    /// Display name
    /// 이름
    #[schema(example = "Alice")]
    pub name: String,

    /// Email address
    /// 이메일 주소
    #[schema(example = "a@x.com")]
    pub email: String,

    /// Password (will be hashed)
    /// 비밀번호 (해싱됨)
    #[schema(example = "secret1")]
    pub password: String,
}

impl RegisterRequest {
    /// 입력값 검증 (이름 길이, 이메일 형식, 비밀번호 길이)
    /// Validate name length, email shape and password length
    pub fn validate(&self) -> Result<(), AuthError> {
        let name_len = self.name.trim().chars().count();
        if !(MIN_NAME_LEN..=MAX_NAME_LEN).contains(&name_len) {
            return Err(AuthError::BadRequest(format!(
                "name must be between {} and {} characters",
                MIN_NAME_LEN, MAX_NAME_LEN
            )));
        }
        if !is_plausible_email(&self.email) {
            return Err(AuthError::BadRequest("invalid email address".to_string()));
        }
        validate_password(&self.password)
    }
}

// 로그인 요청 모델
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[schema(as = LoginRequest)]
pub struct LoginRequest {
    /// Email address
    /// 이메일 주소
    #[schema(example = "a@x.com")]
    pub email: String,

    /// Password
    /// 비밀번호
    #[schema(example = "secret1")]
    pub password: String,
}

// 로그인/회원가입 응답 모델
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[schema(as = AuthResponse)]
pub struct AuthResponse {
    /// User information (without password)
    /// 사용자 정보 (비밀번호 제외)
    pub user: UserResponse,

    /// JWT Access Token (짧은 수명)
    /// JWT Access Token (short lifetime)
    #[schema(example = "eyJhbGciOiJIUzI1NiIsInR5cCI6IkpXVCJ9...")]
    pub access_token: String,

    /// Refresh Token (긴 수명, DB에 저장)
    /// Refresh Token (long lifetime, stored in database)
    #[schema(example = "eyJhbGciOiJIUzI1NiIsInR5cCI6IkpXVCJ9...")]
    pub refresh_token: String,

    /// Access token lifetime in seconds
    /// Access Token 남은 수명 (초)
    #[schema(example = 86400)]
    pub expires_in: i64,

    /// false when the refresh token could not be stored (it will not refresh)
    pub session_persisted: bool,

    /// Success message
    /// 성공 메시지
    pub message: String,
}

// 토큰 갱신 요청 모델
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[schema(as = RefreshTokenRequest)]
pub struct RefreshTokenRequest {
    /// Refresh Token
    /// 리프레시 토큰
    pub refresh_token: String,
}

// 토큰 갱신 응답 모델
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[schema(as = RefreshTokenResponse)]
pub struct RefreshTokenResponse {
    /// 새 Access Token
    /// New Access Token
    pub access_token: String,

    #[schema(example = 86400)]
    pub expires_in: i64,

    /// 새 Refresh Token (rotation 활성화 시에만)
    /// New Refresh Token (only when rotation is enabled)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,

    pub message: String,
}

// 로그아웃 요청 모델
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[schema(as = LogoutRequest)]
pub struct LogoutRequest {
    /// Refresh Token
    /// 리프레시 토큰
    pub refresh_token: String,
}

// 전체 로그아웃 응답 모델
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[schema(as = LogoutAllResponse)]
pub struct LogoutAllResponse {
    /// 무효화된 세션 수
    /// Number of sessions revoked
    pub revoked_sessions: u64,

    pub message: String,
}

// 비밀번호 변경 요청 모델
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[schema(as = ChangePasswordRequest)]
pub struct ChangePasswordRequest {
    pub old_password: String,

    #[schema(example = "secret2")]
    pub new_password: String,
}

/// 이메일 정규화 (공백 제거 + 소문자)
/// Normalize email for storage and lookup
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

pub fn validate_password(password: &str) -> Result<(), AuthError> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AuthError::BadRequest(format!(
            "password must be at least {} characters",
            MIN_PASSWORD_LEN
        )));
    }
    Ok(())
}

fn is_plausible_email(email: &str) -> bool {
    let email = email.trim();
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') {
        return false;
    }
    match domain.rsplit_once('.') {
        Some((host, tld)) => !host.is_empty() && tld.len() >= 2,
        None => false,
    }
}
