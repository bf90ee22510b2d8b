use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts, StatusCode},
    Json,
};
use uuid::Uuid;

use crate::domains::auth::models::{IdentityClaims, Role};
use crate::shared::errors::AuthError;
use crate::shared::services::AppState;

/// 인증된 사용자 정보 (Access Token에서 추출)
/// Authenticated user information (extracted from the access token)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedUser {
    pub user_id: Uuid,
    pub email: String,
    pub role: Role,
}

impl AuthenticatedUser {
    /// 역할 확인 (관리자는 모든 역할을 통과)
    /// Check that the caller holds `required` (admins pass every check)
    pub fn require_role(&self, required: Role) -> Result<(), AuthError> {
        if self.role == required || self.role == Role::Admin {
            Ok(())
        } else {
            Err(AuthError::Forbidden)
        }
    }
}

impl From<IdentityClaims> for AuthenticatedUser {
    fn from(identity: IdentityClaims) -> Self {
        Self {
            user_id: identity.subject,
            email: identity.email,
            role: identity.role,
        }
    }
}

/// "Bearer <token>" 헤더에서 토큰 추출
fn bearer_token(parts: &Parts) -> Result<&str, AuthError> {
    let header = parts
        .headers
        .get(AUTHORIZATION)
        .ok_or(AuthError::MissingToken)?
        .to_str()
        .map_err(|_| AuthError::MissingToken)?;

    header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or(AuthError::MissingToken)
}

/// AuthenticatedUser를 Axum Extractor로 구현
///
/// 사용법:
/// ```ignore
/// pub async fn get_me(
///     State(app_state): State<AppState>,
///     authenticated_user: AuthenticatedUser,
/// ) -> Result<...> {
///     let user_id = authenticated_user.user_id;
///     // ...
/// }
/// ```
#[async_trait]
impl FromRequestParts<AppState> for AuthenticatedUser {
    type Rejection = (StatusCode, Json<serde_json::Value>);

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        // 1. Authorization 헤더에서 토큰 추출
        let token = bearer_token(parts)?;

        // 2. 서명 + 만료 검증 (세션 저장소는 조회하지 않는다)
        let identity = state.auth_state.auth_service.validate_access(token)?;

        Ok(identity.into())
    }
}

/// 관리자 전용 Extractor
/// Extractor that only admits `Role::Admin`
#[derive(Debug, Clone)]
pub struct RequireAdmin(pub AuthenticatedUser);

#[async_trait]
impl FromRequestParts<AppState> for RequireAdmin {
    type Rejection = (StatusCode, Json<serde_json::Value>);

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let user = AuthenticatedUser::from_request_parts(parts, state).await?;
        user.require_role(Role::Admin)?;
        Ok(Self(user))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    fn parts_with(header: Option<&str>) -> Parts {
        let mut builder = Request::builder().uri("/");
        if let Some(value) = header {
            builder = builder.header(AUTHORIZATION, value);
        }
        builder.body(()).unwrap().into_parts().0
    }

    fn user(role: Role) -> AuthenticatedUser {
        AuthenticatedUser {
            user_id: Uuid::new_v4(),
            email: "a@x.com".to_string(),
            role,
        }
    }

    #[test]
    fn test_bearer_token_extraction() {
        assert_eq!(bearer_token(&parts_with(Some("Bearer abc"))).unwrap(), "abc");
        assert!(matches!(bearer_token(&parts_with(None)), Err(AuthError::MissingToken)));
        assert!(matches!(bearer_token(&parts_with(Some("Basic abc"))), Err(AuthError::MissingToken)));
        assert!(matches!(bearer_token(&parts_with(Some("Bearer "))), Err(AuthError::MissingToken)));
    }

    #[test]
    fn test_require_role() {
        assert!(user(Role::User).require_role(Role::User).is_ok());
        assert!(matches!(user(Role::User).require_role(Role::Admin), Err(AuthError::Forbidden)));
        assert!(user(Role::Admin).require_role(Role::User).is_ok());
        assert!(user(Role::Admin).require_role(Role::Admin).is_ok());
    }
}
