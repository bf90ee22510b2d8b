use tokio::task::JoinHandle;
use tokio::time::{interval, Duration};
use tracing::{info, warn};

use crate::domains::auth::services::AuthService;
use crate::shared::config::SessionCleanupConfig;

/// 만료 세션 정리 스케줄러
/// Expired Session Cleanup Scheduler
///
/// 역할:
/// - 주기적으로 보존 기간이 지난 만료 refresh token 행을 삭제
/// - 무효화된(revoked) 행은 만료 전까지 감사 기록으로 남는다
///
/// 처리 흐름:
/// 1. 스케줄러 시작 시 백그라운드 태스크 실행
/// 2. `interval_secs`마다 `purge_expired_sessions` 호출
#[derive(Clone)]
pub struct SessionCleanupScheduler {
    auth_service: AuthService,
    config: SessionCleanupConfig,
}

impl SessionCleanupScheduler {
    pub fn new(auth_service: AuthService, config: SessionCleanupConfig) -> Self {
        Self {
            auth_service,
            config,
        }
    }

    /// 스케줄러 시작 (interval이 0이면 시작하지 않음)
    /// Start scheduler; returns None when cleanup is disabled
    pub fn start(&self) -> Option<JoinHandle<()>> {
        if self.config.interval_secs == 0 {
            info!("session cleanup disabled");
            return None;
        }

        let scheduler = self.clone();
        Some(tokio::spawn(async move {
            let mut ticker = interval(Duration::from_secs(scheduler.config.interval_secs));
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

            loop {
                ticker.tick().await;
                scheduler.run_once().await;
            }
        }))
    }

    /// 정리 1회 실행, 삭제된 행 수 반환 (실패 시 0)
    /// Run one purge pass
    pub async fn run_once(&self) -> u64 {
        match self
            .auth_service
            .purge_expired_sessions(self.config.retention)
            .await
        {
            Ok(purged) => {
                if purged > 0 {
                    info!(purged, "expired sessions purged");
                }
                purged
            }
            Err(e) => {
                warn!(error = %e, "session cleanup failed");
                0
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domains::auth::models::RegisterRequest;
    use crate::domains::auth::services::{JwtService, PasswordService, SessionPolicy};
    use crate::shared::config::PasswordHashConfig;
    use crate::shared::database::{InMemorySessionStore, InMemoryUserStore};
    use std::sync::Arc;

    fn auth_service(refresh_ttl: chrono::Duration) -> AuthService {
        AuthService::new(
            Arc::new(InMemoryUserStore::new()),
            Arc::new(InMemorySessionStore::new()),
            JwtService::new("scheduler-test-secret-1", chrono::Duration::hours(1), refresh_ttl)
                .unwrap(),
            PasswordService::new(PasswordHashConfig::minimal()).unwrap(),
            SessionPolicy::default(),
        )
    }

    #[tokio::test]
    async fn test_disabled_when_interval_is_zero() {
        let scheduler = SessionCleanupScheduler::new(
            auth_service(chrono::Duration::days(7)),
            SessionCleanupConfig {
                interval_secs: 0,
                retention: chrono::Duration::days(30),
            },
        );
        assert!(scheduler.start().is_none());
    }

    #[tokio::test]
    async fn test_run_once_purges_past_retention() {
        let auth = auth_service(chrono::Duration::seconds(-5));
        auth.register(RegisterRequest {
            name: "Alice".to_string(),
            email: "a@x.com".to_string(),
            password: "secret1".to_string(),
        })
        .await
        .unwrap();

        let scheduler = SessionCleanupScheduler::new(
            auth,
            SessionCleanupConfig {
                interval_secs: 60,
                retention: chrono::Duration::zero(),
            },
        );
        assert_eq!(scheduler.run_once().await, 1);
        assert_eq!(scheduler.run_once().await, 0);
    }
}
