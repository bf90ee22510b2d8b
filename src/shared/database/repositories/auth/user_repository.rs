use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use thiserror::Error;
use uuid::Uuid;

use crate::domains::auth::models::user::{NewUser, Role, User};

/// 이메일 중복 (unique 제약 위반)
/// Raised by `create_user` when the email is already registered
#[derive(Error, Debug)]
#[error("email already registered: {0}")]
pub struct EmailTaken(pub String);

/// 사용자 저장소 인터페이스
/// Identity store consumed by the session manager
#[async_trait]
pub trait UserStore: Send + Sync {
    /// 사용자 생성 (이메일 중복 시 `EmailTaken`)
    async fn create_user(&self, user: NewUser) -> Result<User>;

    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>>;

    async fn get_user_by_id(&self, id: Uuid) -> Result<Option<User>>;

    /// 비밀번호 해시 교체, 사용자가 없으면 false
    async fn update_password(&self, id: Uuid, password_hash: &str) -> Result<bool>;
}

/// PostgreSQL 사용자 저장소
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn map_row(row: &PgRow) -> Result<User> {
        let role: String = row.get("role");
        Ok(User {
            id: row.get("id"),
            name: row.get("name"),
            email: row.get("email"),
            password_hash: row.get("password_hash"),
            role: role
                .parse::<Role>()
                .map_err(anyhow::Error::msg)
                .context("Stored user has an unknown role")?,
            created_at: row.get("created_at"),
            updated_at: row.get("updated_at"),
        })
    }
}

#[async_trait]
impl UserStore for UserRepository {
    async fn create_user(&self, user: NewUser) -> Result<User> {
        let now = Utc::now();
        let result = sqlx::query(
            r#"
            INSERT INTO users (id, name, email, password_hash, role, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $6)
            RETURNING id, name, email, password_hash, role, created_at, updated_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.role.as_str())
        .bind(now)
        .fetch_one(&self.pool)
        .await;

        match result {
            Ok(row) => Self::map_row(&row),
            // 23505 = unique_violation
            Err(sqlx::Error::Database(db_err)) if db_err.code().as_deref() == Some("23505") => {
                Err(EmailTaken(user.email).into())
            }
            Err(e) => Err(e).context("Failed to create user"),
        }
    }

    // 이메일로 사용자 조회 (로그인용)
    // Get user by email (for login)
    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
        let row = sqlx::query(
            r#"
            SELECT id, name, email, password_hash, role, created_at, updated_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to fetch user by email")?;

        row.as_ref().map(Self::map_row).transpose()
    }

    // ID로 사용자 조회
    // Get user by ID
    async fn get_user_by_id(&self, id: Uuid) -> Result<Option<User>> {
        let row = sqlx::query(
            r#"
            SELECT id, name, email, password_hash, role, created_at, updated_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to fetch user by id")?;

        row.as_ref().map(Self::map_row).transpose()
    }

    async fn update_password(&self, id: Uuid, password_hash: &str) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET password_hash = $2, updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(password_hash)
        .execute(&self.pool)
        .await
        .context("Failed to update password")?;

        Ok(result.rows_affected() > 0)
    }
}
