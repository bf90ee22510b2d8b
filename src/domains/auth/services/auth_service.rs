use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::domains::auth::models::{
    normalize_email, validate_password, IdentityClaims, IssuedToken, LoginRequest,
    NewRefreshToken, NewUser, RegisterRequest, Role, SessionState, User,
};
use crate::domains::auth::services::{JwtService, PasswordService};
use crate::shared::database::{EmailTaken, SessionStore, UserStore};
use crate::shared::errors::AuthError;

/// 세션 정책
/// Session policy knobs
#[derive(Debug, Clone, Copy, Default)]
pub struct SessionPolicy {
    /// refresh 시 refresh token을 새로 발급하고 이전 것을 무효화
    /// Rotate the refresh token on every refresh (off by default)
    pub rotate_refresh_tokens: bool,
}

/// 로그인/회원가입 결과
/// Outcome of a successful login or registration
#[derive(Debug, Clone)]
pub struct AuthSession {
    pub user: User,
    pub identity: IdentityClaims,
    pub access_token: IssuedToken,
    pub refresh_token: IssuedToken,
    /// refresh token 저장 실패 시 false (degraded mode)
    pub session_persisted: bool,
}

/// 토큰 갱신 결과
#[derive(Debug, Clone)]
pub struct RefreshedAccess {
    pub access_token: IssuedToken,
    /// rotation 활성화 시에만 Some
    pub refresh_token: Option<IssuedToken>,
}

// 인증 서비스 (Session Manager)
// 역할: 로그인/회원가입, 토큰 갱신, 로그아웃, 세션 무효화를 조율
// AuthService: stateless coordinator over the credential verifier, token codec and stores.
// Every failure is fail-closed: store or decode errors never grant a session.
#[derive(Clone)]
pub struct AuthService {
    users: Arc<dyn UserStore>,
    sessions: Arc<dyn SessionStore>,
    jwt_service: JwtService,
    password_service: PasswordService,
    policy: SessionPolicy,
}

impl AuthService {
    pub fn new(
        users: Arc<dyn UserStore>,
        sessions: Arc<dyn SessionStore>,
        jwt_service: JwtService,
        password_service: PasswordService,
        policy: SessionPolicy,
    ) -> Self {
        Self {
            users,
            sessions,
            jwt_service,
            password_service,
            policy,
        }
    }

    // 회원가입
    // Register a new user and open the first session
    pub async fn register(&self, request: RegisterRequest) -> Result<AuthSession, AuthError> {
        request.validate()?;
        let email = normalize_email(&request.email);

        // 1. 이메일 중복 확인
        let existing = self
            .users
            .get_user_by_email(&email)
            .await
            .map_err(|e| store_error("Failed to check email existence", e))?;
        if existing.is_some() {
            return Err(AuthError::EmailAlreadyExists { email });
        }

        // 2. 비밀번호 해싱
        let password_hash = self.password_service.hash(&request.password).await?;

        // 3. 사용자 생성 (동시 가입 경쟁은 unique 제약이 잡는다)
        let user = match self
            .users
            .create_user(NewUser {
                name: request.name.trim().to_string(),
                email: email.clone(),
                password_hash,
                role: Role::User,
            })
            .await
        {
            Ok(user) => user,
            Err(e) if e.downcast_ref::<EmailTaken>().is_some() => {
                return Err(AuthError::EmailAlreadyExists { email });
            }
            Err(e) => return Err(store_error("Failed to create user", e)),
        };

        info!(user_id = %user.id, "user registered");

        // 4. 토큰 발급 + 세션 저장
        self.open_session(user).await
    }

    // 로그인
    // Unknown email and wrong password produce the same error at the same cost
    pub async fn login(&self, request: LoginRequest) -> Result<AuthSession, AuthError> {
        let email = normalize_email(&request.email);

        let user = self
            .users
            .get_user_by_email(&email)
            .await
            .map_err(|e| store_error("Failed to fetch user", e))?;

        let Some(user) = user else {
            self.password_service.verify_against_dummy(&request.password).await;
            debug!("login rejected: unknown account");
            return Err(AuthError::InvalidCredentials);
        };

        if !self
            .password_service
            .verify(&request.password, &user.password_hash)
            .await
        {
            debug!(user_id = %user.id, "login rejected: password mismatch");
            return Err(AuthError::InvalidCredentials);
        }

        info!(user_id = %user.id, "user logged in");
        self.open_session(user).await
    }

    /// Refresh Token 검증 및 새 Access Token 발급
    /// Verify refresh token and issue new access token
    ///
    /// 실패 원인은 로그에만 남기고 호출자에게는 `Unauthorized`만 반환한다.
    /// Infrastructure failures still surface as internal errors.
    pub async fn refresh(&self, refresh_token: &str) -> Result<RefreshedAccess, AuthError> {
        self.refresh_inner(refresh_token).await.map_err(|e| {
            log_rejection("refresh", &e);
            if e.is_unauthorized() || matches!(e, AuthError::UserNotFound) {
                AuthError::Unauthorized
            } else {
                e
            }
        })
    }

    async fn refresh_inner(&self, refresh_token: &str) -> Result<RefreshedAccess, AuthError> {
        // 1. 서명 + 만료 검증
        let claims = self.jwt_service.validate_refresh(refresh_token)?;

        // 2. 저장소 조회
        let token_hash = self.jwt_service.hash_refresh_token(refresh_token);
        let stored = self
            .sessions
            .get_by_token(&token_hash)
            .await
            .map_err(|e| store_error("Failed to find refresh token", e))?
            .ok_or(AuthError::SessionNotFound)?;

        if stored.user_id != claims.sub {
            return Err(AuthError::MalformedToken);
        }

        // 3. 무효화/만료 재확인
        match stored.state_at(Utc::now()) {
            SessionState::Active => {}
            SessionState::Revoked => return Err(AuthError::RevokedSession),
            SessionState::Expired => return Err(AuthError::ExpiredToken),
        }

        // 4. role은 refresh token이 아니라 사용자 저장소에서 다시 읽는다
        let user = self
            .users
            .get_user_by_id(stored.user_id)
            .await
            .map_err(|e| store_error("Failed to fetch user", e))?
            .ok_or(AuthError::UserNotFound)?;

        // 5. 새 Access Token 발급
        let access_token = self
            .jwt_service
            .issue_access_token(&IdentityClaims::from(&user))?;

        // 6. (선택) Refresh Token rotation
        let refresh_token = if self.policy.rotate_refresh_tokens {
            Some(self.rotate(&user, &token_hash).await?)
        } else {
            None
        };

        debug!(user_id = %user.id, rotated = refresh_token.is_some(), "access token refreshed");
        Ok(RefreshedAccess {
            access_token,
            refresh_token,
        })
    }

    /// 기존 토큰을 먼저 무효화한 뒤 새 토큰 저장 (저장 실패 시 재로그인 필요)
    async fn rotate(&self, user: &User, old_hash: &str) -> Result<IssuedToken, AuthError> {
        let revoked = self
            .sessions
            .revoke(old_hash)
            .await
            .map_err(|e| store_error("Failed to revoke old refresh token", e))?;
        if revoked == 0 {
            // 동시에 다른 요청이 이미 교체함
            return Err(AuthError::RevokedSession);
        }

        let issued = self
            .jwt_service
            .issue_refresh_token(user.id, Some(&user.email))?;
        self.sessions
            .save(NewRefreshToken::new(
                user.id,
                self.jwt_service.hash_refresh_token(&issued.token),
                issued.expires_at,
            ))
            .await
            .map_err(|e| store_error("Failed to store rotated refresh token", e))?;

        Ok(issued)
    }

    /// 로그아웃 - Refresh Token 무효화
    /// Logout - Revoke refresh token (expired tokens may still log out)
    pub async fn logout(&self, refresh_token: &str) -> Result<(), AuthError> {
        let claims = self
            .jwt_service
            .decode_refresh_ignoring_expiry(refresh_token)
            .map_err(|e| {
                let e = AuthError::from(e);
                log_rejection("logout", &e);
                AuthError::BadRequest("Invalid refresh token".to_string())
            })?;

        let token_hash = self.jwt_service.hash_refresh_token(refresh_token);
        let revoked = self
            .sessions
            .revoke(&token_hash)
            .await
            .map_err(|e| store_error("Failed to revoke refresh token", e))?;

        info!(user_id = %claims.sub, revoked, "user logged out");
        Ok(())
    }

    /// 사용자의 모든 Refresh Token 무효화 (모든 기기에서 로그아웃)
    /// Revoke all refresh tokens for user (logout from all devices)
    pub async fn logout_all(&self, user_id: Uuid) -> Result<u64, AuthError> {
        let revoked = self
            .sessions
            .revoke_all_for_user(user_id)
            .await
            .map_err(|e| store_error("Failed to revoke all refresh tokens", e))?;

        info!(user_id = %user_id, revoked, "all sessions revoked");
        Ok(revoked)
    }

    /// 비밀번호 변경 후 모든 세션 무효화
    /// Change password, then revoke every session of the user
    pub async fn change_password(
        &self,
        user_id: Uuid,
        old_password: &str,
        new_password: &str,
    ) -> Result<u64, AuthError> {
        validate_password(new_password)?;

        let user = self.current_user(user_id).await?;
        if !self
            .password_service
            .verify(old_password, &user.password_hash)
            .await
        {
            return Err(AuthError::InvalidCredentials);
        }

        let password_hash = self.password_service.hash(new_password).await?;
        let updated = self
            .users
            .update_password(user_id, &password_hash)
            .await
            .map_err(|e| store_error("Failed to update password", e))?;
        if !updated {
            return Err(AuthError::UserNotFound);
        }

        info!(user_id = %user_id, "password changed");
        self.logout_all(user_id).await
    }

    /// Access Token 검증 (미들웨어용)
    /// Validate an access token for downstream authorization
    pub fn validate_access(&self, access_token: &str) -> Result<IdentityClaims, AuthError> {
        self.jwt_service.validate_access(access_token).map_err(|e| {
            log_rejection("access", &AuthError::from(e));
            AuthError::Unauthorized
        })
    }

    pub async fn current_user(&self, user_id: Uuid) -> Result<User, AuthError> {
        self.users
            .get_user_by_id(user_id)
            .await
            .map_err(|e| store_error("Failed to fetch user", e))?
            .ok_or(AuthError::UserNotFound)
    }

    pub async fn active_session_count(&self, user_id: Uuid) -> Result<i64, AuthError> {
        self.sessions
            .count_active_for_user(user_id)
            .await
            .map_err(|e| store_error("Failed to count sessions", e))
    }

    /// `retention`보다 오래전에 만료된 세션 행 삭제 (운영 정리 작업)
    /// Purge rows that expired more than `retention` ago
    pub async fn purge_expired_sessions(&self, retention: Duration) -> Result<u64, AuthError> {
        let cutoff: DateTime<Utc> = Utc::now() - retention;
        self.sessions
            .purge_expired(cutoff)
            .await
            .map_err(|e| store_error("Failed to purge expired sessions", e))
    }

    async fn open_session(&self, user: User) -> Result<AuthSession, AuthError> {
        let identity = IdentityClaims::from(&user);
        let access_token = self.jwt_service.issue_access_token(&identity)?;
        let refresh_token = self
            .jwt_service
            .issue_refresh_token(user.id, Some(&user.email))?;

        let session_persisted = match self
            .sessions
            .save(NewRefreshToken::new(
                user.id,
                self.jwt_service.hash_refresh_token(&refresh_token.token),
                refresh_token.expires_at,
            ))
            .await
        {
            Ok(_) => true,
            Err(e) => {
                // degraded mode: 로그인은 성공, 이 refresh token은 갱신에 쓸 수 없다
                warn!(user_id = %user.id, error = %e, "refresh token not persisted; session cannot be refreshed");
                false
            }
        };

        Ok(AuthSession {
            user,
            identity,
            access_token,
            refresh_token,
            session_persisted,
        })
    }
}

fn store_error(context: &str, err: anyhow::Error) -> AuthError {
    AuthError::StoreUnavailable(format!("{}: {:#}", context, err))
}

/// 거절 사유 로깅 (서명 위조는 보안 이벤트로 warn)
fn log_rejection(operation: &str, err: &AuthError) {
    match err {
        AuthError::BadSignature | AuthError::MalformedToken => {
            warn!(operation, reason = %err, "security: token rejected");
        }
        AuthError::RevokedSession | AuthError::SessionNotFound => {
            info!(operation, reason = %err, "session rejected");
        }
        e if e.is_internal() => {}
        _ => debug!(operation, reason = %err, "token rejected"),
    }
}
