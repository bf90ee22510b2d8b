use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::domains::auth::models::refresh_token::{NewRefreshToken, RefreshToken};

/// 세션 저장소 인터페이스 (Refresh Token의 유일한 소유자)
/// Session store: source of truth for whether a refresh token is still usable
///
/// A `revoke` must be visible to every later `get_by_token` on the same store.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Refresh Token 저장 (id, created_at 없으면 할당)
    async fn save(&self, token: NewRefreshToken) -> Result<Uuid>;

    /// token hash로 정확히 일치하는 행 조회
    async fn get_by_token(&self, token_hash: &str) -> Result<Option<RefreshToken>>;

    /// 무효화 (revoked + revoked_at 동시 설정), 이미 무효화된 경우 0
    async fn revoke(&self, token_hash: &str) -> Result<u64>;

    /// 사용자의 모든 활성 세션 무효화
    async fn revoke_all_for_user(&self, user_id: Uuid) -> Result<u64>;

    /// 사용자의 유효한 세션 수
    async fn count_active_for_user(&self, user_id: Uuid) -> Result<i64>;

    /// `older_than` 이전에 만료된 행 삭제 (운영 정리 작업 전용)
    async fn purge_expired(&self, older_than: DateTime<Utc>) -> Result<u64>;
}

/// Refresh Token Repository
/// Refresh Token 데이터베이스 작업 처리 (PostgreSQL)
pub struct RefreshTokenRepository {
    pool: PgPool,
}

impl RefreshTokenRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn map_row(row: &PgRow) -> RefreshToken {
        RefreshToken {
            id: row.get("id"),
            user_id: row.get("user_id"),
            token_hash: row.get("token_hash"),
            expires_at: row.get("expires_at"),
            revoked: row.get("revoked"),
            created_at: row.get("created_at"),
            revoked_at: row.get("revoked_at"),
        }
    }
}

#[async_trait]
impl SessionStore for RefreshTokenRepository {
    /// Refresh Token 생성 (저장)
    /// Create and store refresh token
    async fn save(&self, data: NewRefreshToken) -> Result<Uuid> {
        let id: Uuid = sqlx::query_scalar(
            r#"
            INSERT INTO refresh_tokens (id, user_id, token_hash, expires_at, revoked, created_at)
            VALUES ($1, $2, $3, $4, FALSE, $5)
            RETURNING id
            "#,
        )
        .bind(data.id.unwrap_or_else(Uuid::new_v4))
        .bind(data.user_id)
        .bind(&data.token_hash)
        .bind(data.expires_at)
        .bind(data.created_at.unwrap_or_else(Utc::now))
        .fetch_one(&self.pool)
        .await
        .context("Failed to create refresh token")?;

        Ok(id)
    }

    /// Refresh Token 조회 (token_hash로)
    /// Find refresh token by token hash
    async fn get_by_token(&self, token_hash: &str) -> Result<Option<RefreshToken>> {
        let row = sqlx::query(
            r#"
            SELECT id, user_id, token_hash, expires_at, revoked, created_at, revoked_at
            FROM refresh_tokens
            WHERE token_hash = $1
            "#,
        )
        .bind(token_hash)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to find refresh token")?;

        Ok(row.as_ref().map(Self::map_row))
    }

    /// Refresh Token 무효화 (revoked = true)
    /// Revoke refresh token; already-revoked rows keep their first revoked_at
    async fn revoke(&self, token_hash: &str) -> Result<u64> {
        let result = sqlx::query(
            r#"
            UPDATE refresh_tokens
            SET revoked = TRUE, revoked_at = NOW()
            WHERE token_hash = $1 AND revoked = FALSE
            "#,
        )
        .bind(token_hash)
        .execute(&self.pool)
        .await
        .context("Failed to revoke refresh token")?;

        Ok(result.rows_affected())
    }

    /// 사용자의 모든 Refresh Token 무효화
    /// Revoke all refresh tokens for a user
    async fn revoke_all_for_user(&self, user_id: Uuid) -> Result<u64> {
        let result = sqlx::query(
            r#"
            UPDATE refresh_tokens
            SET revoked = TRUE, revoked_at = NOW()
            WHERE user_id = $1 AND revoked = FALSE
            "#,
        )
        .bind(user_id)
        .execute(&self.pool)
        .await
        .context("Failed to revoke all refresh tokens for user")?;

        Ok(result.rows_affected())
    }

    /// 특정 사용자의 유효한 Refresh Token 개수 조회
    /// Count valid refresh tokens for a user
    async fn count_active_for_user(&self, user_id: Uuid) -> Result<i64> {
        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*)
            FROM refresh_tokens
            WHERE user_id = $1 AND revoked = FALSE AND expires_at > NOW()
            "#,
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await
        .context("Failed to count valid refresh tokens")?;

        Ok(count)
    }

    /// 만료된 토큰 삭제 (정리 작업)
    /// Delete tokens that expired before `older_than` (cleanup)
    async fn purge_expired(&self, older_than: DateTime<Utc>) -> Result<u64> {
        let result = sqlx::query(
            r#"
            DELETE FROM refresh_tokens
            WHERE expires_at < $1
            "#,
        )
        .bind(older_than)
        .execute(&self.pool)
        .await
        .context("Failed to delete expired refresh tokens")?;

        Ok(result.rows_affected())
    }
}
