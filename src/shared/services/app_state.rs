use std::sync::Arc;

use crate::domains::auth::services::{AuthState, SessionCleanupScheduler};
use crate::shared::config::{AppConfig, PasswordHashConfig, TokenConfig};
use crate::shared::database::{Database, SessionStore, UserStore};
use crate::shared::errors::AuthError;

/// Application state (combines all domain states)
/// 애플리케이션 상태 (모든 도메인 상태를 조합)
#[derive(Clone)]
pub struct AppState {
    pub auth_state: AuthState,
}

impl AppState {
    /// Create AppState with database
    /// PostgreSQL 저장소로 도메인 State 초기화
    pub fn new(db: &Database, config: &AppConfig) -> Result<Self, AuthError> {
        Ok(Self {
            auth_state: AuthState::new(db, &config.token, config.password_hash)?,
        })
    }

    /// 저장소 구현을 직접 주입 (테스트/인메모리 실행)
    /// Create AppState over injected stores
    pub fn with_stores(
        users: Arc<dyn UserStore>,
        sessions: Arc<dyn SessionStore>,
        token: &TokenConfig,
        password_hash: PasswordHashConfig,
    ) -> Result<Self, AuthError> {
        Ok(Self {
            auth_state: AuthState::with_stores(users, sessions, token, password_hash)?,
        })
    }

    /// 만료 세션 정리 스케줄러 생성
    /// Build the expired-session cleanup scheduler from configuration
    pub fn session_cleanup_scheduler(&self, config: &AppConfig) -> SessionCleanupScheduler {
        SessionCleanupScheduler::new(self.auth_state.auth_service.clone(), config.session_cleanup)
    }
}
