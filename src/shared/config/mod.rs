//! 애플리케이션 설정
//! Application configuration, loaded from environment variables at startup.
//!
//! `JWT_SECRET` and `DATABASE_URL` are required; everything else has a default.

use chrono::Duration;
use std::env;
use std::ops::RangeInclusive;
use std::str::FromStr;
use thiserror::Error;

/// 토큰 수명 상한 (10년)
pub const MAX_TOKEN_TTL_SECS: i64 = 10 * 365 * 24 * 3600;
/// 만료 세션 보존 기간 상한 (일)
pub const MAX_RETENTION_DAYS: i64 = 3650;

/// 설정 에러
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(String),

    #[error("Invalid {key}: {reason}")]
    Invalid { key: String, reason: String },
}

/// 로그 출력 형식
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pretty" | "text" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            other => Err(format!("unknown log format: {}", other)),
        }
    }
}

/// Argon2 비용 파라미터
/// Argon2 cost parameters for password hashing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PasswordHashConfig {
    pub memory_kib: u32,
    pub iterations: u32,
    pub parallelism: u32,
}

impl Default for PasswordHashConfig {
    /// argon2 crate defaults (OWASP minimum: 19 MiB, t=2, p=1)
    fn default() -> Self {
        Self {
            memory_kib: 19 * 1024,
            iterations: 2,
            parallelism: 1,
        }
    }
}

impl PasswordHashConfig {
    /// 테스트/로컬 개발용 최소 비용
    /// Cheapest parameters argon2 accepts; for tests and local runs only
    pub fn minimal() -> Self {
        Self {
            memory_kib: 8,
            iterations: 1,
            parallelism: 1,
        }
    }
}

/// 토큰 발급 설정
/// Token lifetimes and signing secret
#[derive(Clone)]
pub struct TokenConfig {
    pub jwt_secret: String,
    pub access_token_ttl: Duration,
    pub refresh_token_ttl: Duration,
    /// refresh 시 refresh token 교체 여부 (기본 비활성)
    pub rotate_refresh_tokens: bool,
}

impl std::fmt::Debug for TokenConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenConfig")
            .field("jwt_secret", &"<redacted>")
            .field("access_token_ttl", &self.access_token_ttl)
            .field("refresh_token_ttl", &self.refresh_token_ttl)
            .field("rotate_refresh_tokens", &self.rotate_refresh_tokens)
            .finish()
    }
}

impl TokenConfig {
    pub fn new(jwt_secret: impl Into<String>) -> Self {
        Self {
            jwt_secret: jwt_secret.into(),
            access_token_ttl: Duration::hours(24),
            refresh_token_ttl: Duration::days(7),
            rotate_refresh_tokens: false,
        }
    }
}

/// 만료 세션 정리 설정
/// Expired-session purge; disabled when `interval_secs` is 0
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionCleanupConfig {
    pub interval_secs: u64,
    /// 만료 후 행을 남겨두는 기간
    pub retention: Duration,
}

/// 전체 애플리케이션 설정
/// Application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub cors_origin: String,
    pub log_format: LogFormat,
    pub token: TokenConfig,
    pub password_hash: PasswordHashConfig,
    pub session_cleanup: SessionCleanupConfig,
}

impl AppConfig {
    /// 환경 변수에서 설정 로드 (.env 파일 지원)
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// 임의의 key 조회 함수로 설정 로드
    /// Load configuration through an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let host = lookup("HOST").unwrap_or_else(|| "0.0.0.0".to_string());
        let port = parse_var(&lookup, "PORT", 3002u16)?;
        let database_url = require(&lookup, "DATABASE_URL")?;
        let cors_origin =
            lookup("CORS_ORIGIN").unwrap_or_else(|| "http://localhost:3003".to_string());
        let log_format = parse_var(&lookup, "LOG_FORMAT", LogFormat::Pretty)?;

        let jwt_secret = require(&lookup, "JWT_SECRET")?;
        if jwt_secret.len() < 16 {
            return Err(ConfigError::Invalid {
                key: "JWT_SECRET".to_string(),
                reason: "must be at least 16 bytes".to_string(),
            });
        }
        let access_token_ttl = parse_duration(
            &lookup,
            "ACCESS_TOKEN_TTL_SECS",
            24 * 3600,
            1..=MAX_TOKEN_TTL_SECS,
            Duration::try_seconds,
        )?;
        let refresh_token_ttl = parse_duration(
            &lookup,
            "REFRESH_TOKEN_TTL_SECS",
            7 * 24 * 3600,
            1..=MAX_TOKEN_TTL_SECS,
            Duration::try_seconds,
        )?;
        let token = TokenConfig {
            jwt_secret,
            access_token_ttl,
            refresh_token_ttl,
            rotate_refresh_tokens: parse_var(&lookup, "ROTATE_REFRESH_TOKENS", false)?,
        };

        let defaults = PasswordHashConfig::default();
        let password_hash = PasswordHashConfig {
            memory_kib: parse_var(&lookup, "PASSWORD_HASH_MEMORY_KIB", defaults.memory_kib)?,
            iterations: parse_var(&lookup, "PASSWORD_HASH_ITERATIONS", defaults.iterations)?,
            parallelism: parse_var(&lookup, "PASSWORD_HASH_PARALLELISM", defaults.parallelism)?,
        };

        let session_cleanup = SessionCleanupConfig {
            interval_secs: parse_var(&lookup, "SESSION_CLEANUP_INTERVAL_SECS", 0u64)?,
            retention: parse_duration(
                &lookup,
                "SESSION_RETENTION_DAYS",
                30,
                0..=MAX_RETENTION_DAYS,
                Duration::try_days,
            )?,
        };

        Ok(Self {
            host,
            port,
            database_url,
            cors_origin,
            log_format,
            token,
            password_hash,
            session_cleanup,
        })
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn require<F>(lookup: &F, key: &str) -> Result<String, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .filter(|value| !value.trim().is_empty())
        .ok_or_else(|| ConfigError::Missing(key.to_string()))
}

/// 환경 변수 파싱 (없으면 기본값)
/// Parse a variable with a default value
fn parse_var<F, T>(lookup: &F, key: &str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        Some(value) => value.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
            key: key.to_string(),
            reason: e.to_string(),
        }),
        None => Ok(default),
    }
}

/// 범위가 정해진 정수 변수를 `Duration`으로 변환
/// Parse a bounded integer variable into a `Duration`
fn parse_duration<F>(
    lookup: &F,
    key: &str,
    default: i64,
    bounds: RangeInclusive<i64>,
    to_duration: fn(i64) -> Option<Duration>,
) -> Result<Duration, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let value = parse_var(lookup, key, default)?;
    if !bounds.contains(&value) {
        return Err(ConfigError::Invalid {
            key: key.to_string(),
            reason: format!("must be between {} and {}", bounds.start(), bounds.end()),
        });
    }
    to_duration(value).ok_or_else(|| ConfigError::Invalid {
        key: key.to_string(),
        reason: "out of range".to_string(),
    })
}
