// src/domains/auth/services/jwt_service.rs
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::domains::auth::models::jwt::{Claims, IdentityClaims, IssuedToken, TokenKind};
use crate::shared::config::TokenConfig;
use crate::shared::errors::TokenError;

/// JWT 서비스 (Token Codec)
/// JWT Service for token generation and verification
///
/// 서명 키는 시작 시 설정에서 주입된다.
/// The signing secret is injected from configuration at startup.
#[derive(Clone)]
pub struct JwtService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    access_token_ttl: Duration,
    refresh_token_ttl: Duration,
}

impl JwtService {
    /// JWT Service 생성
    /// Create JWT Service
    pub fn new(
        secret: &str,
        access_token_ttl: Duration,
        refresh_token_ttl: Duration,
    ) -> Result<Self, TokenError> {
        if secret.is_empty() {
            return Err(TokenError::Encoding("signing secret must not be empty".to_string()));
        }

        Ok(Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            access_token_ttl,
            refresh_token_ttl,
        })
    }

    pub fn from_config(config: &TokenConfig) -> Result<Self, TokenError> {
        Self::new(
            &config.jwt_secret,
            config.access_token_ttl,
            config.refresh_token_ttl,
        )
    }

    pub fn access_token_ttl(&self) -> Duration {
        self.access_token_ttl
    }

    /// Access Token 발급 (짧은 수명)
    /// Issue Access Token (short lifetime)
    pub fn issue_access_token(&self, identity: &IdentityClaims) -> Result<IssuedToken, TokenError> {
        self.sign(Claims::access(identity, self.access_token_ttl))
    }

    /// Refresh Token 발급 (긴 수명, role 미포함)
    /// Issue Refresh Token (long lifetime, no role claim)
    pub fn issue_refresh_token(
        &self,
        subject: Uuid,
        email: Option<&str>,
    ) -> Result<IssuedToken, TokenError> {
        self.sign(Claims::refresh(
            subject,
            email.map(str::to_owned),
            self.refresh_token_ttl,
        ))
    }

    /// Access Token 검증
    /// Verify Access Token (signature, expiry, kind, required claims)
    pub fn validate_access(&self, token: &str) -> Result<IdentityClaims, TokenError> {
        let claims = self.decode_kind(token, TokenKind::Access, true)?;

        match (claims.email, claims.role) {
            (Some(email), Some(role)) => Ok(IdentityClaims {
                subject: claims.sub,
                email,
                role,
            }),
            _ => Err(TokenError::Malformed("access token is missing identity claims".to_string())),
        }
    }

    /// Refresh Token 검증 (서명 + 만료)
    /// Verify Refresh Token (signature and expiry)
    pub fn validate_refresh(&self, token: &str) -> Result<Claims, TokenError> {
        self.decode_kind(token, TokenKind::Refresh, true)
    }

    /// Refresh Token 서명만 검증 (만료 무시, 로그아웃용)
    /// Verify signature only; used by logout so expired sessions can still be closed
    pub fn decode_refresh_ignoring_expiry(&self, token: &str) -> Result<Claims, TokenError> {
        self.decode_kind(token, TokenKind::Refresh, false)
    }

    /// Refresh Token 해싱 (DB 저장용)
    /// Hash Refresh Token (for database storage)
    pub fn hash_refresh_token(&self, token: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(token.as_bytes());
        format!("{:x}", hasher.finalize())
    }

    fn sign(&self, claims: Claims) -> Result<IssuedToken, TokenError> {
        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| TokenError::Encoding(e.to_string()))?;

        let expires_at = claims.expires_at();
        Ok(IssuedToken {
            token,
            expires_at,
            expires_in: (expires_at - Utc::now()).num_seconds().max(0),
        })
    }

    fn decode_kind(
        &self,
        token: &str,
        expected: TokenKind,
        check_expiry: bool,
    ) -> Result<Claims, TokenError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.validate_exp = check_expiry;

        let claims = decode::<Claims>(token, &self.decoding_key, &validation)?.claims;

        // jsonwebtoken은 exp == now를 통과시킨다; 유효 구간은 now < exp
        if check_expiry && claims.exp <= Utc::now().timestamp() {
            return Err(TokenError::Expired);
        }

        if claims.typ != expected {
            return Err(TokenError::WrongKind);
        }
        Ok(claims)
    }
}
