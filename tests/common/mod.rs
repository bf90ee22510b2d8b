// =====================================================
// 통합 테스트 공통 헬퍼
// =====================================================
// 목적: 인메모리 저장소 위에 AuthService / Router를 구성
//
// 사용법:
// ```rust
// mod common;
// use common::*;
//
// #[tokio::test]
// async fn test_something() {
//     let ctx = setup_test();
//     // 테스트 코드...
// }
// ```
// =====================================================
#![allow(dead_code)]

use std::sync::Arc;

use anyhow::bail;
use async_trait::async_trait;
use axum::Router;
use chrono::{DateTime, Duration, Utc};
use fitness_api::create_router;
use fitness_api::domains::auth::models::{LoginRequest, RegisterRequest};
use fitness_api::domains::auth::services::AuthService;
use fitness_api::shared::config::{PasswordHashConfig, TokenConfig};
use fitness_api::domains::auth::models::{NewRefreshToken, RefreshToken};
use fitness_api::shared::database::{InMemorySessionStore, InMemoryUserStore, SessionStore};
use fitness_api::shared::services::AppState;

// 테스트용 상수
pub const TEST_SECRET: &str = "integration-test-secret-0123456789";
pub const TEST_EMAIL: &str = "a@x.com";
pub const TEST_PASSWORD: &str = "secret1";

pub struct TestContext {
    pub app_state: AppState,
    pub users: Arc<InMemoryUserStore>,
    pub sessions: Arc<InMemorySessionStore>,
}

impl TestContext {
    pub fn auth(&self) -> &AuthService {
        &self.app_state.auth_state.auth_service
    }

    pub fn router(&self) -> Router {
        create_router().with_state(self.app_state.clone())
    }
}

/// 기본 설정 (rotation 비활성)
pub fn setup_test() -> TestContext {
    setup_with(TokenConfig::new(TEST_SECRET))
}

/// 임의의 토큰 설정으로 구성
pub fn setup_with(token: TokenConfig) -> TestContext {
    let users = Arc::new(InMemoryUserStore::new());
    let sessions = Arc::new(InMemorySessionStore::new());
    let app_state = AppState::with_stores(
        users.clone(),
        sessions.clone(),
        &token,
        PasswordHashConfig::minimal(),
    )
    .expect("Failed to initialize AppState");

    TestContext {
        app_state,
        users,
        sessions,
    }
}

/// 저장은 성공하지만 조회/무효화는 항상 실패하는 세션 저장소
pub struct LookupFailingStore {
    inner: InMemorySessionStore,
}

impl LookupFailingStore {
    pub fn new() -> Self {
        Self {
            inner: InMemorySessionStore::new(),
        }
    }
}

#[async_trait]
impl SessionStore for LookupFailingStore {
    async fn save(&self, token: NewRefreshToken) -> anyhow::Result<uuid::Uuid> {
        self.inner.save(token).await
    }
    async fn get_by_token(&self, _token_hash: &str) -> anyhow::Result<Option<RefreshToken>> {
        bail!("pg: connection reset")
    }
    async fn revoke(&self, _token_hash: &str) -> anyhow::Result<u64> {
        bail!("pg: connection reset")
    }
    async fn revoke_all_for_user(&self, _user_id: uuid::Uuid) -> anyhow::Result<u64> {
        bail!("pg: connection reset")
    }
    async fn count_active_for_user(&self, user_id: uuid::Uuid) -> anyhow::Result<i64> {
        self.inner.count_active_for_user(user_id).await
    }
    async fn purge_expired(&self, older_than: DateTime<Utc>) -> anyhow::Result<u64> {
        self.inner.purge_expired(older_than).await
    }
}

/// 조회가 실패하는 세션 저장소 위의 Router
pub fn router_with_failing_lookups() -> Router {
    let app_state = AppState::with_stores(
        Arc::new(InMemoryUserStore::new()),
        Arc::new(LookupFailingStore::new()),
        &TokenConfig::new(TEST_SECRET),
        PasswordHashConfig::minimal(),
    )
    .expect("Failed to initialize AppState");
    create_router().with_state(app_state)
}

/// refresh token 수명만 바꾼 설정
pub fn token_config_with_refresh_ttl(ttl: Duration) -> TokenConfig {
    let mut token = TokenConfig::new(TEST_SECRET);
    token.refresh_token_ttl = ttl;
    token
}

pub fn register_request(email: &str, password: &str) -> RegisterRequest {
    RegisterRequest {
        name: "Alice".to_string(),
        email: email.to_string(),
        password: password.to_string(),
    }
}

pub fn login_request(email: &str, password: &str) -> LoginRequest {
    LoginRequest {
        email: email.to_string(),
        password: password.to_string(),
    }
}
