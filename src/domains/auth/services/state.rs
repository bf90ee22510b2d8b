// Auth domain state
// 인증 도메인 상태
use std::sync::Arc;

use crate::domains::auth::services::{AuthService, JwtService, PasswordService, SessionPolicy};
use crate::shared::config::{PasswordHashConfig, TokenConfig};
use crate::shared::database::{
    Database, RefreshTokenRepository, SessionStore, UserRepository, UserStore,
};
use crate::shared::errors::AuthError;

/// Auth domain state
/// 인증 도메인에서 필요한 서비스들을 포함하는 상태
#[derive(Clone)]
pub struct AuthState {
    pub auth_service: AuthService,
}

impl AuthState {
    /// Create AuthState backed by PostgreSQL
    /// AuthState 생성 (PostgreSQL 저장소)
    pub fn new(
        db: &Database,
        token: &TokenConfig,
        password_hash: PasswordHashConfig,
    ) -> Result<Self, AuthError> {
        Self::with_stores(
            Arc::new(UserRepository::new(db.pool().clone())),
            Arc::new(RefreshTokenRepository::new(db.pool().clone())),
            token,
            password_hash,
        )
    }

    /// 임의의 저장소 구현으로 생성 (테스트/인메모리 실행)
    /// Create AuthState over arbitrary store implementations
    pub fn with_stores(
        users: Arc<dyn UserStore>,
        sessions: Arc<dyn SessionStore>,
        token: &TokenConfig,
        password_hash: PasswordHashConfig,
    ) -> Result<Self, AuthError> {
        let jwt_service = JwtService::from_config(token)?;
        let password_service = PasswordService::new(password_hash)?;
        let policy = SessionPolicy {
            rotate_refresh_tokens: token.rotate_refresh_tokens,
        };

        Ok(Self {
            auth_service: AuthService::new(users, sessions, jwt_service, password_service, policy),
        })
    }
}
