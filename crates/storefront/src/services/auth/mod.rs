//! Authentication service.
//!
//! Password signup and login, logout, and access token refresh. Successful
//! signup and login issue a token pair and record the refresh token, which
//! replaces any earlier session for the same user.

mod error;

pub use error::AuthError;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use tracing::info;

use mercato_core::{Email, UserRole};

use crate::db::{RepositoryError, UserStore};
use crate::models::{NewUser, User};
use crate::services::tokens::{TokenPair, TokenService};

/// Minimum password length.
const MIN_PASSWORD_LENGTH: usize = 8;

/// Authentication service.
pub struct AuthService<'a> {
    users: &'a dyn UserStore,
    tokens: &'a TokenService,
}

impl<'a> AuthService<'a> {
    /// Create a new authentication service.
    #[must_use]
    pub const fn new(users: &'a dyn UserStore, tokens: &'a TokenService) -> Self {
        Self { users, tokens }
    }

    /// Register a new customer and start their session.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::MissingField` if any field is blank.
    /// Returns `AuthError::InvalidEmail` if the email format is invalid.
    /// Returns `AuthError::WeakPassword` if the password doesn't meet requirements.
    /// Returns `AuthError::UserAlreadyExists` if the email is already registered.
    pub async fn signup(
        &self,
        name: &str,
        email: &str,
        password: &str,
    ) -> Result<(User, TokenPair), AuthError> {
        let name = required("name", name)?;
        let email = Email::parse(required("email", email)?)?;
        required("password", password)?;
        validate_password(password)?;

        if self.users.find_credentials(&email).await?.is_some() {
            return Err(AuthError::UserAlreadyExists);
        }

        let password_hash = hash_password(password)?;

        let user = self
            .users
            .create(NewUser {
                name: name.to_owned(),
                email,
                password_hash,
                role: UserRole::Customer,
            })
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict(_) => AuthError::UserAlreadyExists,
                other => AuthError::Repository(other),
            })?;

        let pair = self.start_session(&user).await?;
        info!(user_id = %user.id, "User signed up");
        Ok((user, pair))
    }

    /// Log in with email and password.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::MissingField` if either field is blank.
    /// Returns `AuthError::InvalidCredentials` if the email/password is wrong.
    pub async fn login(&self, email: &str, password: &str) -> Result<(User, TokenPair), AuthError> {
        let email = required("email", email)?;
        required("password", password)?;

        // An unparseable email cannot belong to any account.
        let email = Email::parse(email).map_err(|_| AuthError::InvalidCredentials)?;

        let credentials = self
            .users
            .find_credentials(&email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        verify_password(password, &credentials.password_hash)?;

        let user = credentials.user;
        let pair = self.start_session(&user).await?;
        info!(user_id = %user.id, "User logged in");
        Ok((user, pair))
    }

    /// End the session belonging to `refresh_token`, if it verifies.
    ///
    /// A missing or unverifiable token is not an error; there is simply no
    /// session to revoke.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Token` if the revocation write fails.
    pub async fn logout(&self, refresh_token: Option<&str>) -> Result<(), AuthError> {
        let Some(token) = refresh_token else {
            return Ok(());
        };

        if let Ok(user_id) = self.tokens.verify_refresh_token(token) {
            self.tokens.revoke(user_id).await?;
            info!(%user_id, "User logged out");
        }
        Ok(())
    }

    /// Issue a new access token from the caller's refresh token.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::MissingRefreshToken` without a token, and
    /// `AuthError::Token` if it is invalid or revoked.
    pub async fn refresh(&self, refresh_token: Option<&str>) -> Result<String, AuthError> {
        let token = refresh_token.ok_or(AuthError::MissingRefreshToken)?;
        Ok(self.tokens.rotate_access_token(token).await?)
    }

    async fn start_session(&self, user: &User) -> Result<TokenPair, AuthError> {
        let pair = self.tokens.issue_pair(user.id)?;
        self.tokens
            .record_refresh_token(user.id, &pair.refresh_token)
            .await?;
        Ok(pair)
    }
}

// =============================================================================
// Password Helpers
// =============================================================================

fn required<'v>(field: &'static str, value: &'v str) -> Result<&'v str, AuthError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(AuthError::MissingField(field));
    }
    Ok(trimmed)
}

/// Validate password requirements.
fn validate_password(password: &str) -> Result<(), AuthError> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(AuthError::WeakPassword(format!(
            "Password must be at least {MIN_PASSWORD_LENGTH} characters long"
        )));
    }
    Ok(())
}

/// Hash a password using Argon2id.
fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AuthError::PasswordHash)
}

/// Verify a password against a hash.
fn verify_password(password: &str, hash: &str) -> Result<(), AuthError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| AuthError::InvalidCredentials)?;
    let argon2 = Argon2::default();

    argon2
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| AuthError::InvalidCredentials)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use secrecy::SecretString;

    use super::*;
    use crate::cache::MemoryCache;
    use crate::db::MemoryStore;
    use crate::services::tokens::TokenError;

    fn tokens() -> TokenService {
        TokenService::new(
            &SecretString::from("k8Jp2vQx9LmN4rT7wZ1aB5cD3eF6gH0iXy".to_owned()),
            &SecretString::from("Zq7Wm3Np8Rk1Vt5Xb9Lc2Hd6Jf4Gs0AeUo".to_owned()),
            Arc::new(MemoryCache::new()),
        )
    }

    #[test]
    fn test_hash_and_verify_password() {
        let hash = hash_password("correct horse").unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert!(verify_password("correct horse", &hash).is_ok());
        assert!(matches!(
            verify_password("wrong horse", &hash),
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[test]
    fn test_validate_password_length() {
        assert!(matches!(validate_password("short"), Err(AuthError::WeakPassword(_))));
        assert!(validate_password("longenough").is_ok());
    }

    #[tokio::test]
    async fn test_signup_then_duplicate_email_conflicts() {
        let store = MemoryStore::new();
        let tokens = tokens();
        let auth = AuthService::new(&store, &tokens);

        let (user, pair) = auth.signup("Ada", "a@x.com", "password1").await.unwrap();
        assert_eq!(user.role, UserRole::Customer);
        assert_eq!(tokens.verify_access_token(&pair.access_token).unwrap(), user.id);

        assert!(matches!(
            auth.signup("Ada Again", "A@X.com", "password2").await,
            Err(AuthError::UserAlreadyExists)
        ));
        assert_eq!(UserStore::count(&store).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_signup_requires_every_field() {
        let store = MemoryStore::new();
        let tokens = tokens();
        let auth = AuthService::new(&store, &tokens);

        assert!(matches!(
            auth.signup("", "a@x.com", "password1").await,
            Err(AuthError::MissingField("name"))
        ));
        assert!(matches!(
            auth.signup("Ada", "  ", "password1").await,
            Err(AuthError::MissingField("email"))
        ));
        assert!(matches!(
            auth.signup("Ada", "a@x.com", "").await,
            Err(AuthError::MissingField("password"))
        ));
        assert!(matches!(
            auth.signup("Ada", "a@x.com", "short").await,
            Err(AuthError::WeakPassword(_))
        ));
    }

    #[tokio::test]
    async fn test_login_checks_password() {
        let store = MemoryStore::new();
        let tokens = tokens();
        let auth = AuthService::new(&store, &tokens);
        auth.signup("Ada", "a@x.com", "password1").await.unwrap();

        let (user, _) = auth.login("A@x.com", "password1").await.unwrap();
        assert_eq!(user.email.as_str(), "a@x.com");

        assert!(matches!(
            auth.login("a@x.com", "password2").await,
            Err(AuthError::InvalidCredentials)
        ));
        assert!(matches!(
            auth.login("nobody@x.com", "password1").await,
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[tokio::test]
    async fn test_logout_revokes_refresh_token() {
        let store = MemoryStore::new();
        let tokens = tokens();
        let auth = AuthService::new(&store, &tokens);
        let (_, pair) = auth.signup("Ada", "a@x.com", "password1").await.unwrap();

        assert!(auth.refresh(Some(&pair.refresh_token)).await.is_ok());

        auth.logout(Some(&pair.refresh_token)).await.unwrap();
        assert!(matches!(
            auth.refresh(Some(&pair.refresh_token)).await,
            Err(AuthError::Token(TokenError::Revoked))
        ));

        // Nothing to revoke is still a successful logout.
        auth.logout(None).await.unwrap();
        auth.logout(Some("not-a-token")).await.unwrap();
    }

    #[tokio::test]
    async fn test_refresh_without_token() {
        let store = MemoryStore::new();
        let tokens = tokens();
        let auth = AuthService::new(&store, &tokens);
        assert!(matches!(
            auth.refresh(None).await,
            Err(AuthError::MissingRefreshToken)
        ));
    }
}
