use argon2::password_hash::{rand_core::OsRng, SaltString};
use argon2::{Algorithm, Argon2, Params, PasswordHash, PasswordHasher, PasswordVerifier, Version};
use std::sync::Arc;

use crate::shared::config::PasswordHashConfig;
use crate::shared::errors::AuthError;

/// 비밀번호 해싱/검증 서비스 (Credential Verifier)
/// Password hashing and verification (Argon2id, salted, tunable cost)
///
/// 해싱은 CPU를 오래 쓰므로 blocking 스레드에서 실행한다.
#[derive(Clone)]
pub struct PasswordService {
    argon2: Argon2<'static>,
    /// 존재하지 않는 사용자 로그인 시 비교용 더미 해시
    dummy_hash: Arc<str>,
}

impl PasswordService {
    pub fn new(config: PasswordHashConfig) -> Result<Self, AuthError> {
        let params = Params::new(config.memory_kib, config.iterations, config.parallelism, None)
            .map_err(|e| AuthError::PasswordHashingFailed(format!("Invalid argon2 params: {}", e)))?;
        let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);

        let dummy_hash = hash_with(&argon2, "unknown-user-placeholder")?;

        Ok(Self {
            argon2,
            dummy_hash: Arc::from(dummy_hash),
        })
    }

    /// 비밀번호 해싱 (PHC 문자열 반환)
    /// Hash a password, returning a PHC string
    pub async fn hash(&self, plaintext: &str) -> Result<String, AuthError> {
        let argon2 = self.argon2.clone();
        let plaintext = plaintext.to_owned();

        tokio::task::spawn_blocking(move || hash_with(&argon2, &plaintext))
            .await
            .map_err(|e| AuthError::Internal(format!("Password hashing task failed: {}", e)))?
    }

    /// 비밀번호 검증 (상수 시간 비교, 잘못된 해시는 false)
    /// Verify a password; an unparsable digest counts as a mismatch
    pub async fn verify(&self, plaintext: &str, digest: &str) -> bool {
        let argon2 = self.argon2.clone();
        let plaintext = plaintext.to_owned();
        let digest = digest.to_owned();

        tokio::task::spawn_blocking(move || verify_with(&argon2, &plaintext, &digest))
            .await
            .unwrap_or(false)
    }

    /// 사용자가 없을 때도 같은 비용을 치르도록 더미 해시와 비교
    /// Burn the same hashing cost as a real check when the account doesn't exist
    pub async fn verify_against_dummy(&self, plaintext: &str) {
        let dummy = self.dummy_hash.clone();
        let _ = self.verify(plaintext, &dummy).await;
    }
}

fn hash_with(argon2: &Argon2<'_>, plaintext: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    argon2
        .hash_password(plaintext.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AuthError::PasswordHashingFailed(format!("Failed to hash password: {}", e)))
}

fn verify_with(argon2: &Argon2<'_>, plaintext: &str, digest: &str) -> bool {
    match PasswordHash::new(digest) {
        Ok(parsed) => argon2.verify_password(plaintext.as_bytes(), &parsed).is_ok(),
        Err(_) => false,
    }
}
