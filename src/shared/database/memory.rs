// 인메모리 저장소 (테스트/로컬 실행용)
// In-process stores behind the same traits as the PostgreSQL repositories.
// A single RwLock per store gives read-after-write visibility for revocations.
use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use std::collections::HashMap;
use uuid::Uuid;

use crate::domains::auth::models::refresh_token::{NewRefreshToken, RefreshToken};
use crate::domains::auth::models::user::{NewUser, Role, User};
use crate::shared::database::repositories::{EmailTaken, SessionStore, UserStore};

/// 인메모리 사용자 저장소
#[derive(Default)]
pub struct InMemoryUserStore {
    users: RwLock<HashMap<Uuid, User>>,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 역할 변경 (관리자 승격 등)
    /// Change a user's role; returns false when the user doesn't exist
    pub fn set_role(&self, id: Uuid, role: Role) -> bool {
        match self.users.write().get_mut(&id) {
            Some(user) => {
                user.role = role;
                user.updated_at = Utc::now();
                true
            }
            None => false,
        }
    }

    pub fn remove(&self, id: Uuid) -> bool {
        self.users.write().remove(&id).is_some()
    }
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn create_user(&self, user: NewUser) -> Result<User> {
        let mut users = self.users.write();
        if users.values().any(|existing| existing.email == user.email) {
            return Err(EmailTaken(user.email).into());
        }

        let now = Utc::now();
        let created = User {
            id: Uuid::new_v4(),
            name: user.name,
            email: user.email,
            password_hash: user.password_hash,
            role: user.role,
            created_at: now,
            updated_at: now,
        };
        users.insert(created.id, created.clone());
        Ok(created)
    }

    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
        Ok(self
            .users
            .read()
            .values()
            .find(|user| user.email == email)
            .cloned())
    }

    async fn get_user_by_id(&self, id: Uuid) -> Result<Option<User>> {
        Ok(self.users.read().get(&id).cloned())
    }

    async fn update_password(&self, id: Uuid, password_hash: &str) -> Result<bool> {
        match self.users.write().get_mut(&id) {
            Some(user) => {
                user.password_hash = password_hash.to_string();
                user.updated_at = Utc::now();
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

/// 인메모리 세션 저장소 (token_hash → 행)
#[derive(Default)]
pub struct InMemorySessionStore {
    tokens: RwLock<HashMap<String, RefreshToken>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 저장된 전체 행 수 (감사 기록 포함)
    pub fn len(&self) -> usize {
        self.tokens.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.read().is_empty()
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn save(&self, token: NewRefreshToken) -> Result<Uuid> {
        let mut tokens = self.tokens.write();
        if tokens.contains_key(&token.token_hash) {
            anyhow::bail!("duplicate refresh token hash");
        }

        let id = token.id.unwrap_or_else(Uuid::new_v4);
        tokens.insert(
            token.token_hash.clone(),
            RefreshToken {
                id,
                user_id: token.user_id,
                token_hash: token.token_hash,
                expires_at: token.expires_at,
                revoked: false,
                created_at: token.created_at.unwrap_or_else(Utc::now),
                revoked_at: None,
            },
        );
        Ok(id)
    }

    async fn get_by_token(&self, token_hash: &str) -> Result<Option<RefreshToken>> {
        Ok(self.tokens.read().get(token_hash).cloned())
    }

    async fn revoke(&self, token_hash: &str) -> Result<u64> {
        let mut tokens = self.tokens.write();
        match tokens.get_mut(token_hash) {
            Some(token) if !token.revoked => {
                token.revoked = true;
                token.revoked_at = Some(Utc::now());
                Ok(1)
            }
            _ => Ok(0),
        }
    }

    async fn revoke_all_for_user(&self, user_id: Uuid) -> Result<u64> {
        let now = Utc::now();
        let mut count = 0;
        let mut tokens = self.tokens.write();
        for token in tokens
            .values_mut()
            .filter(|token| token.user_id == user_id && !token.revoked)
        {
            token.revoked = true;
            token.revoked_at = Some(now);
            count += 1;
        }
        Ok(count)
    }

    async fn count_active_for_user(&self, user_id: Uuid) -> Result<i64> {
        let now = Utc::now();
        Ok(self
            .tokens
            .read()
            .values()
            .filter(|token| token.user_id == user_id && token.is_usable_at(now))
            .count() as i64)
    }

    async fn purge_expired(&self, older_than: DateTime<Utc>) -> Result<u64> {
        let mut tokens = self.tokens.write();
        let before = tokens.len();
        tokens.retain(|_, token| token.expires_at >= older_than);
        Ok((before - tokens.len()) as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn new_token(user_id: Uuid, hash: &str, expires_in: Duration) -> NewRefreshToken {
        NewRefreshToken::new(user_id, hash.to_string(), Utc::now() + expires_in)
    }

    #[tokio::test]
    async fn test_save_assigns_id_and_created_at() {
        let store = InMemorySessionStore::new();
        let user_id = Uuid::new_v4();

        let id = store.save(new_token(user_id, "h1", Duration::days(7))).await.unwrap();
        let row = store.get_by_token("h1").await.unwrap().unwrap();

        assert_eq!(row.id, id);
        assert_eq!(row.user_id, user_id);
        assert!(!row.revoked);
        assert!(row.revoked_at.is_none());
        assert!(row.created_at <= Utc::now());
    }

    #[tokio::test]
    async fn test_save_keeps_explicit_id() {
        let store = InMemorySessionStore::new();
        let mut token = new_token(Uuid::new_v4(), "h1", Duration::days(7));
        let explicit = Uuid::new_v4();
        token.id = Some(explicit);

        assert_eq!(store.save(token).await.unwrap(), explicit);
    }

    #[tokio::test]
    async fn test_revoke_is_idempotent() {
        let store = InMemorySessionStore::new();
        store.save(new_token(Uuid::new_v4(), "h1", Duration::days(7))).await.unwrap();

        assert_eq!(store.revoke("h1").await.unwrap(), 1);
        let first = store.get_by_token("h1").await.unwrap().unwrap();
        assert!(first.revoked);
        let revoked_at = first.revoked_at.unwrap();

        // 두 번째 무효화는 no-op
        assert_eq!(store.revoke("h1").await.unwrap(), 0);
        let second = store.get_by_token("h1").await.unwrap().unwrap();
        assert_eq!(second.revoked_at, Some(revoked_at));

        assert_eq!(store.revoke("missing").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_revoke_all_only_touches_one_user() {
        let store = InMemorySessionStore::new();
        let alice = Uuid::new_v4();
        let bob = Uuid::new_v4();
        store.save(new_token(alice, "a1", Duration::days(7))).await.unwrap();
        store.save(new_token(alice, "a2", Duration::days(7))).await.unwrap();
        store.save(new_token(bob, "b1", Duration::days(7))).await.unwrap();

        assert_eq!(store.revoke_all_for_user(alice).await.unwrap(), 2);
        assert_eq!(store.count_active_for_user(alice).await.unwrap(), 0);
        assert_eq!(store.count_active_for_user(bob).await.unwrap(), 1);
        // 행은 감사 기록으로 남는다
        assert_eq!(store.len(), 3);
    }

    #[tokio::test]
    async fn test_purge_expired_removes_only_old_rows() {
        let store = InMemorySessionStore::new();
        let user = Uuid::new_v4();
        store.save(new_token(user, "old", Duration::days(-40))).await.unwrap();
        store.save(new_token(user, "recent", Duration::days(-1))).await.unwrap();
        store.save(new_token(user, "live", Duration::days(7))).await.unwrap();

        let purged = store.purge_expired(Utc::now() - Duration::days(30)).await.unwrap();
        assert_eq!(purged, 1);
        assert!(store.get_by_token("old").await.unwrap().is_none());
        assert!(store.get_by_token("recent").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_user_store_rejects_duplicate_email() {
        let users = InMemoryUserStore::new();
        let new_user = NewUser {
            name: "Alice".to_string(),
            email: "a@x.com".to_string(),
            password_hash: "hash".to_string(),
            role: Role::User,
        };

        users.create_user(new_user.clone()).await.unwrap();
        let err = users.create_user(new_user).await.unwrap_err();
        assert!(err.downcast_ref::<EmailTaken>().is_some());
    }
}
