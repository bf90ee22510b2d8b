// =====================================================
// 세션 수명주기 통합 테스트
// =====================================================
// 목적: 로그인 → 갱신 → 로그아웃 흐름과 무효화 규칙 검증
// 저장소: 인메모리 (DB 불필요)
// =====================================================

mod common;

use chrono::{Duration, Utc};
use common::*;
use fitness_api::domains::auth::models::{Role, SessionState};
use fitness_api::domains::auth::services::JwtService;
use fitness_api::shared::config::TokenConfig;
use fitness_api::shared::database::SessionStore;
use fitness_api::shared::errors::AuthError;

#[tokio::test]
async fn test_login_token_carries_stored_identity() {
    let ctx = setup_test();
    let registered = ctx
        .auth()
        .register(register_request(TEST_EMAIL, TEST_PASSWORD))
        .await
        .unwrap();

    let session = ctx
        .auth()
        .login(login_request(TEST_EMAIL, TEST_PASSWORD))
        .await
        .unwrap();

    let identity = ctx.auth().validate_access(&session.access_token.token).unwrap();
    assert_eq!(identity.subject, registered.user.id);
    assert_eq!(identity.email, TEST_EMAIL);
    assert_eq!(identity.role, Role::User);
    assert!(session.session_persisted);
}

#[tokio::test]
async fn test_login_email_is_case_insensitive() {
    let ctx = setup_test();
    ctx.auth()
        .register(register_request(TEST_EMAIL, TEST_PASSWORD))
        .await
        .unwrap();

    assert!(ctx
        .auth()
        .login(login_request("  A@X.com", TEST_PASSWORD))
        .await
        .is_ok());
}

#[tokio::test]
async fn test_invalid_credentials_share_one_shape() {
    let ctx = setup_test();
    ctx.auth()
        .register(register_request(TEST_EMAIL, TEST_PASSWORD))
        .await
        .unwrap();

    let attempts = [
        login_request(TEST_EMAIL, "wrong-password"),
        login_request(TEST_EMAIL, ""),
        login_request("nobody@x.com", TEST_PASSWORD),
        login_request("", ""),
    ];

    for attempt in attempts {
        let err = ctx.auth().login(attempt).await.unwrap_err();
        assert!(matches!(err, AuthError::InvalidCredentials));
        assert_eq!(err.to_string(), AuthError::InvalidCredentials.to_string());
    }
}

#[tokio::test]
async fn test_refresh_after_logout_is_unauthorized() {
    let ctx = setup_test();
    ctx.auth()
        .register(register_request(TEST_EMAIL, TEST_PASSWORD))
        .await
        .unwrap();
    let session = ctx
        .auth()
        .login(login_request(TEST_EMAIL, TEST_PASSWORD))
        .await
        .unwrap();
    let refresh_token = session.refresh_token.token;

    // 1. 갱신 성공
    ctx.auth().refresh(&refresh_token).await.unwrap();

    // 2. 로그아웃
    ctx.auth().logout(&refresh_token).await.unwrap();

    // 3. 서명/만료는 유효하지만 무효화되었으므로 거절
    let err = ctx.auth().refresh(&refresh_token).await.unwrap_err();
    assert!(matches!(err, AuthError::Unauthorized));

    let hash = JwtService::from_config(&TokenConfig::new(TEST_SECRET))
        .unwrap()
        .hash_refresh_token(&refresh_token);
    assert_eq!(stored_state(&ctx, &hash).await, SessionState::Revoked);
}

#[tokio::test]
async fn test_refresh_after_ttl_is_unauthorized() {
    let ctx = setup_with(token_config_with_refresh_ttl(Duration::seconds(1)));
    let session = ctx
        .auth()
        .register(register_request(TEST_EMAIL, TEST_PASSWORD))
        .await
        .unwrap();

    tokio::time::sleep(std::time::Duration::from_millis(2100)).await;

    let err = ctx
        .auth()
        .refresh(&session.refresh_token.token)
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::Unauthorized));
}

#[tokio::test]
async fn test_repeated_refresh_is_non_exclusive() {
    let ctx = setup_test();
    let session = ctx
        .auth()
        .register(register_request(TEST_EMAIL, TEST_PASSWORD))
        .await
        .unwrap();

    let first = ctx.auth().refresh(&session.refresh_token.token).await.unwrap();
    let second = ctx.auth().refresh(&session.refresh_token.token).await.unwrap();

    assert_ne!(first.access_token.token, second.access_token.token);
    assert!(ctx.auth().validate_access(&first.access_token.token).is_ok());
    assert!(ctx.auth().validate_access(&second.access_token.token).is_ok());
    assert!(first.refresh_token.is_none());
}

#[tokio::test]
async fn test_concurrent_refreshes_all_succeed() {
    let ctx = setup_test();
    let session = ctx
        .auth()
        .register(register_request(TEST_EMAIL, TEST_PASSWORD))
        .await
        .unwrap();

    let mut handles = Vec::new();
    for _ in 0..8 {
        let auth = ctx.auth().clone();
        let token = session.refresh_token.token.clone();
        handles.push(tokio::spawn(async move { auth.refresh(&token).await }));
    }

    for handle in handles {
        assert!(handle.await.unwrap().is_ok());
    }
}

#[tokio::test]
async fn test_logout_all_invalidates_every_session() {
    let ctx = setup_test();
    let first = ctx
        .auth()
        .register(register_request(TEST_EMAIL, TEST_PASSWORD))
        .await
        .unwrap();
    let second = ctx
        .auth()
        .login(login_request(TEST_EMAIL, TEST_PASSWORD))
        .await
        .unwrap();
    let third = ctx
        .auth()
        .login(login_request(TEST_EMAIL, TEST_PASSWORD))
        .await
        .unwrap();

    let revoked = ctx.auth().logout_all(first.user.id).await.unwrap();
    assert_eq!(revoked, 3);

    for token in [first.refresh_token, second.refresh_token, third.refresh_token] {
        assert!(matches!(
            ctx.auth().refresh(&token.token).await,
            Err(AuthError::Unauthorized)
        ));
    }
    assert_eq!(ctx.auth().active_session_count(first.user.id).await.unwrap(), 0);
}

#[tokio::test]
async fn test_sessions_are_independent() {
    let ctx = setup_test();
    ctx.auth()
        .register(register_request(TEST_EMAIL, TEST_PASSWORD))
        .await
        .unwrap();
    let session1 = ctx
        .auth()
        .login(login_request(TEST_EMAIL, TEST_PASSWORD))
        .await
        .unwrap();
    let session2 = ctx
        .auth()
        .login(login_request(TEST_EMAIL, TEST_PASSWORD))
        .await
        .unwrap();

    ctx.auth().logout(&session1.refresh_token.token).await.unwrap();

    assert!(ctx.auth().refresh(&session1.refresh_token.token).await.is_err());
    assert!(ctx.auth().refresh(&session2.refresh_token.token).await.is_ok());
}

#[tokio::test]
async fn test_logout_all_does_not_touch_other_users() {
    let ctx = setup_test();
    let alice = ctx
        .auth()
        .register(register_request(TEST_EMAIL, TEST_PASSWORD))
        .await
        .unwrap();
    let bob = ctx
        .auth()
        .register(register_request("b@x.com", TEST_PASSWORD))
        .await
        .unwrap();

    ctx.auth().logout_all(alice.user.id).await.unwrap();
    assert!(ctx.auth().refresh(&bob.refresh_token.token).await.is_ok());
}

#[tokio::test]
async fn test_token_from_other_secret_is_rejected() {
    let ctx = setup_test();
    ctx.auth()
        .register(register_request(TEST_EMAIL, TEST_PASSWORD))
        .await
        .unwrap();

    let forged = JwtService::new(
        "some-other-secret-0123456789",
        Duration::hours(1),
        Duration::days(7),
    )
    .unwrap()
    .issue_refresh_token(uuid::Uuid::new_v4(), Some(TEST_EMAIL))
    .unwrap();

    assert!(matches!(
        ctx.auth().refresh(&forged.token).await,
        Err(AuthError::Unauthorized)
    ));
    assert!(matches!(
        ctx.auth().logout(&forged.token).await,
        Err(AuthError::BadRequest(_))
    ));
}

#[tokio::test]
async fn test_revoked_rows_are_kept_for_audit() {
    let ctx = setup_test();
    let session = ctx
        .auth()
        .register(register_request(TEST_EMAIL, TEST_PASSWORD))
        .await
        .unwrap();

    ctx.auth().logout(&session.refresh_token.token).await.unwrap();
    assert_eq!(ctx.sessions.len(), 1);
}

/// 저장된 행의 현재 상태
async fn stored_state(ctx: &TestContext, token_hash: &str) -> SessionState {
    ctx.sessions
        .get_by_token(token_hash)
        .await
        .unwrap()
        .expect("row exists")
        .state_at(Utc::now())
}
