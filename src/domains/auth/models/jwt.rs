use chrono::{DateTime, Duration, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::domains::auth::models::user::{Role, User};

/// 토큰 종류 (access / refresh)
/// Token kind, embedded as the `typ` claim so one kind can't stand in for the other
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Access,
    Refresh,
}

/// JWT Claims (토큰에 포함될 데이터)
/// JWT Claims (data to be included in token)
///
/// Access token: `sub`, `email`, `role` are all present.
/// Refresh token: `sub` and optionally `email`; `role` is never trusted from it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// 사용자 ID
    /// Subject (user id)
    pub sub: Uuid,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,

    pub typ: TokenKind,

    /// 토큰 고유 ID (같은 초에 발급된 토큰도 구분)
    /// Unique token id
    pub jti: Uuid,

    /// 발급 시간 (Unix timestamp)
    /// Issued at (Unix timestamp)
    pub iat: i64,

    /// 만료 시간 (Unix timestamp)
    /// Expiration time (Unix timestamp)
    pub exp: i64,
}

impl Claims {
    /// Access Token용 Claims 생성
    /// Build access-token claims from identity
    pub fn access(identity: &IdentityClaims, ttl: Duration) -> Self {
        let now = Utc::now().timestamp();
        Self {
            sub: identity.subject,
            email: Some(identity.email.clone()),
            role: Some(identity.role),
            typ: TokenKind::Access,
            jti: Uuid::new_v4(),
            iat: now,
            exp: now + ttl.num_seconds(),
        }
    }

    /// Refresh Token용 Claims 생성 (role 제외)
    /// Build refresh-token claims (reduced set, no role)
    pub fn refresh(subject: Uuid, email: Option<String>, ttl: Duration) -> Self {
        let now = Utc::now().timestamp();
        Self {
            sub: subject,
            email,
            role: None,
            typ: TokenKind::Refresh,
            jti: Uuid::new_v4(),
            iat: now,
            exp: now + ttl.num_seconds(),
        }
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        Utc.timestamp_opt(self.exp, 0)
            .single()
            .unwrap_or_else(Utc::now)
    }
}

/// 인증된 사용자 식별 정보 (subject, email, role)
/// Identity claims carried by every access token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[schema(as = IdentityClaims)]
pub struct IdentityClaims {
    pub subject: Uuid,

    #[schema(example = "a@x.com")]
    pub email: String,

    pub role: Role,
}

impl From<&User> for IdentityClaims {
    fn from(user: &User) -> Self {
        Self {
            subject: user.id,
            email: user.email.clone(),
            role: user.role,
        }
    }
}

/// 발급된 토큰 (문자열 + 만료 정보)
/// Issued token with its expiry
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
    /// 남은 수명 (초)
    pub expires_in: i64,
}
