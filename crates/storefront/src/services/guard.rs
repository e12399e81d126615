//! Request authentication and role checks.

use thiserror::Error;

use crate::db::{RepositoryError, UserStore};
use crate::models::User;
use crate::services::tokens::{TokenError, TokenService};

/// Why a request was refused.
#[derive(Debug, Error)]
pub enum GuardError {
    /// No token, a token that does not verify, or a token for a deleted user.
    #[error("unauthenticated")]
    Unauthenticated,

    /// The access token is well-formed but expired; the client should refresh.
    #[error("access token expired")]
    RequiresRefresh,

    /// Authenticated but not allowed.
    #[error("forbidden")]
    Forbidden,

    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}

/// Resolves an access token to the user it belongs to.
pub struct AccessGuard<'a> {
    tokens: &'a TokenService,
    users: &'a dyn UserStore,
}

impl<'a> AccessGuard<'a> {
    #[must_use]
    pub const fn new(tokens: &'a TokenService, users: &'a dyn UserStore) -> Self {
        Self { tokens, users }
    }

    /// Authenticate a request from its access token, if any.
    ///
    /// # Errors
    ///
    /// Returns `GuardError::RequiresRefresh` for an expired token,
    /// `GuardError::Unauthenticated` for every other failure, and
    /// `GuardError::Repository` if the user lookup fails.
    pub async fn authenticate(&self, access_token: Option<&str>) -> Result<User, GuardError> {
        let token = access_token.ok_or(GuardError::Unauthenticated)?;

        let user_id = self.tokens.verify_access_token(token).map_err(|e| match e {
            TokenError::Expired => GuardError::RequiresRefresh,
            _ => GuardError::Unauthenticated,
        })?;

        self.users
            .find_by_id(user_id)
            .await?
            .ok_or(GuardError::Unauthenticated)
    }
}

/// Allow only administrators.
///
/// # Errors
///
/// Returns `GuardError::Forbidden` unless `user` is an admin.
pub fn require_admin(user: &User) -> Result<(), GuardError> {
    if user.role.is_admin() {
        Ok(())
    } else {
        Err(GuardError::Forbidden)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use chrono::{TimeDelta, Utc};
    use mercato_core::{Email, UserId, UserRole};
    use secrecy::SecretString;

    use super::*;
    use crate::cache::MemoryCache;
    use crate::db::MemoryStore;
    use crate::models::NewUser;

    fn tokens() -> TokenService {
        TokenService::new(
            &SecretString::from("k8Jp2vQx9LmN4rT7wZ1aB5cD3eF6gH0iXy".to_owned()),
            &SecretString::from("Zq7Wm3Np8Rk1Vt5Xb9Lc2Hd6Jf4Gs0AeUo".to_owned()),
            Arc::new(MemoryCache::new()),
        )
    }

    async fn seeded(store: &MemoryStore, role: UserRole) -> User {
        UserStore::create(
            store,
            NewUser {
                name: "Ada".to_owned(),
                email: Email::parse("ada@example.com").unwrap(),
                password_hash: "hash".to_owned(),
                role,
            },
        )
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn test_missing_token_is_unauthenticated() {
        let tokens = tokens();
        let store = MemoryStore::new();
        let guard = AccessGuard::new(&tokens, &store);
        assert!(matches!(
            guard.authenticate(None).await,
            Err(GuardError::Unauthenticated)
        ));
        assert!(matches!(
            guard.authenticate(Some("garbage")).await,
            Err(GuardError::Unauthenticated)
        ));
    }

    #[tokio::test]
    async fn test_valid_token_resolves_user() {
        let tokens = tokens();
        let store = MemoryStore::new();
        let user = seeded(&store, UserRole::Customer).await;
        let pair = tokens.issue_pair(user.id).unwrap();

        let guard = AccessGuard::new(&tokens, &store);
        let resolved = guard.authenticate(Some(&pair.access_token)).await.unwrap();
        assert_eq!(resolved, user);
    }

    #[tokio::test]
    async fn test_expired_token_requires_refresh() {
        let tokens = tokens();
        let store = MemoryStore::new();
        let user = seeded(&store, UserRole::Customer).await;
        let pair = tokens
            .issue_pair_at(user.id, Utc::now() - TimeDelta::minutes(16))
            .unwrap();

        let guard = AccessGuard::new(&tokens, &store);
        assert!(matches!(
            guard.authenticate(Some(&pair.access_token)).await,
            Err(GuardError::RequiresRefresh)
        ));
    }

    #[tokio::test]
    async fn test_token_for_unknown_user_is_unauthenticated() {
        let tokens = tokens();
        let store = MemoryStore::new();
        let pair = tokens.issue_pair(UserId::new(404)).unwrap();

        let guard = AccessGuard::new(&tokens, &store);
        assert!(matches!(
            guard.authenticate(Some(&pair.access_token)).await,
            Err(GuardError::Unauthenticated)
        ));
    }

    #[tokio::test]
    async fn test_require_admin() {
        let store = MemoryStore::new();
        let customer = seeded(&store, UserRole::Customer).await;
        assert!(matches!(require_admin(&customer), Err(GuardError::Forbidden)));

        let admin = User {
            role: UserRole::Admin,
            ..customer
        };
        assert!(require_admin(&admin).is_ok());
    }
}
