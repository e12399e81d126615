//! Access and refresh token issuing, verification, and revocation.
//!
//! Both tokens are HS256 JWTs carrying the same fixed claim set, signed with
//! separate keys. The refresh token for a user is also written to the
//! key-value cache under `refresh_token:{id}`; a refresh token is only
//! honoured while it matches that entry, so issuing a new one or logging out
//! revokes the old one.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use rand::Rng;
use rand::distr::Alphanumeric;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use mercato_core::UserId;

use crate::cache::{CacheError, CacheKey, KeyValueCache};

/// Access tokens live for 15 minutes.
pub const ACCESS_TOKEN_TTL_SECS: i64 = 15 * 60;
/// Refresh tokens live for 7 days.
pub const REFRESH_TOKEN_TTL_SECS: i64 = 7 * 24 * 60 * 60;

const CLAIMS_VERSION: u8 = 1;
const TOKEN_ID_LEN: usize = 22;

/// Errors from token operations.
#[derive(Debug, Error)]
pub enum TokenError {
    /// Signature and structure are fine but `exp` has passed.
    #[error("token expired")]
    Expired,

    /// Bad signature, malformed token, or unexpected claim contents.
    #[error("invalid token")]
    Invalid,

    /// The refresh token verifies but is no longer the user's current one.
    #[error("refresh token revoked")]
    Revoked,

    #[error("token signing failed: {0}")]
    Signing(#[source] jsonwebtoken::errors::Error),

    #[error("session cache error: {0}")]
    Cache(#[from] CacheError),
}

/// Which key a token was signed with and what it may be used for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenKind {
    Access,
    Refresh,
}

/// Claims carried by both token kinds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub ver: u8,
    pub kind: TokenKind,
    pub user_id: UserId,
    /// Random per-token id; two tokens issued in the same second still differ.
    pub jti: String,
    pub iat: i64,
    pub exp: i64,
}

/// A freshly issued access/refresh pair.
#[derive(Debug, Clone)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

struct SigningKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl SigningKeys {
    fn new(secret: &SecretString) -> Self {
        let bytes = secret.expose_secret().as_bytes();
        Self {
            encoding: EncodingKey::from_secret(bytes),
            decoding: DecodingKey::from_secret(bytes),
        }
    }
}

/// Issues and checks session tokens.
pub struct TokenService {
    access: SigningKeys,
    refresh: SigningKeys,
    validation: Validation,
    cache: Arc<dyn KeyValueCache>,
}

impl TokenService {
    /// Create a token service signing with the given secrets and recording
    /// refresh tokens in `cache`.
    #[must_use]
    pub fn new(
        access_secret: &SecretString,
        refresh_secret: &SecretString,
        cache: Arc<dyn KeyValueCache>,
    ) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp"]);

        Self {
            access: SigningKeys::new(access_secret),
            refresh: SigningKeys::new(refresh_secret),
            validation,
            cache,
        }
    }

    /// Sign a new access/refresh pair for `user_id`, issued now.
    ///
    /// # Errors
    ///
    /// Returns `TokenError::Signing` if encoding fails.
    pub fn issue_pair(&self, user_id: UserId) -> Result<TokenPair, TokenError> {
        self.issue_pair_at(user_id, Utc::now())
    }

    /// Sign a new pair as if issued at `now`.
    ///
    /// # Errors
    ///
    /// Returns `TokenError::Signing` if encoding fails.
    pub fn issue_pair_at(&self, user_id: UserId, now: DateTime<Utc>) -> Result<TokenPair, TokenError> {
        Ok(TokenPair {
            access_token: self.sign(TokenKind::Access, user_id, now)?,
            refresh_token: self.sign(TokenKind::Refresh, user_id, now)?,
        })
    }

    /// Store `refresh_token` as the user's only valid refresh token.
    ///
    /// # Errors
    ///
    /// Returns `TokenError::Cache` if the write fails.
    pub async fn record_refresh_token(
        &self,
        user_id: UserId,
        refresh_token: &str,
    ) -> Result<(), TokenError> {
        let ttl = Duration::from_secs(REFRESH_TOKEN_TTL_SECS.unsigned_abs());
        self.cache
            .set(
                &CacheKey::RefreshToken(user_id),
                refresh_token.to_owned(),
                Some(ttl),
            )
            .await?;
        Ok(())
    }

    /// Check an access token and return its user.
    ///
    /// # Errors
    ///
    /// Returns `TokenError::Expired` past expiry and `TokenError::Invalid` for
    /// anything else that does not verify.
    pub fn verify_access_token(&self, token: &str) -> Result<UserId, TokenError> {
        self.verify(TokenKind::Access, token).map(|c| c.user_id)
    }

    /// Check a refresh token's signature and expiry, ignoring revocation.
    ///
    /// # Errors
    ///
    /// Same as [`Self::verify_access_token`].
    pub fn verify_refresh_token(&self, token: &str) -> Result<UserId, TokenError> {
        self.verify(TokenKind::Refresh, token).map(|c| c.user_id)
    }

    /// Exchange a current refresh token for a new access token.
    ///
    /// The refresh token itself is not replaced and the cache is not written.
    ///
    /// # Errors
    ///
    /// Returns `TokenError::Invalid` if the refresh token does not verify,
    /// expired ones included, and `TokenError::Revoked` if it is not the
    /// user's current one.
    pub async fn rotate_access_token(&self, refresh_token: &str) -> Result<String, TokenError> {
        let user_id = self
            .verify_refresh_token(refresh_token)
            .map_err(|_| TokenError::Invalid)?;

        let stored = self.cache.get(&CacheKey::RefreshToken(user_id)).await?;
        if stored.as_deref() != Some(refresh_token) {
            tracing::warn!(%user_id, "Refresh attempted with a revoked token");
            return Err(TokenError::Revoked);
        }

        self.sign(TokenKind::Access, user_id, Utc::now())
    }

    /// Forget the user's refresh token.
    ///
    /// # Errors
    ///
    /// Returns `TokenError::Cache` if the delete fails.
    pub async fn revoke(&self, user_id: UserId) -> Result<(), TokenError> {
        self.cache.invalidate(&CacheKey::RefreshToken(user_id)).await?;
        Ok(())
    }

    fn keys(&self, kind: TokenKind) -> &SigningKeys {
        match kind {
            TokenKind::Access => &self.access,
            TokenKind::Refresh => &self.refresh,
        }
    }

    fn sign(&self, kind: TokenKind, user_id: UserId, now: DateTime<Utc>) -> Result<String, TokenError> {
        let ttl_secs = match kind {
            TokenKind::Access => ACCESS_TOKEN_TTL_SECS,
            TokenKind::Refresh => REFRESH_TOKEN_TTL_SECS,
        };
        let iat = now.timestamp();
        let claims = Claims {
            ver: CLAIMS_VERSION,
            kind,
            user_id,
            jti: token_id(),
            iat,
            exp: iat + ttl_secs,
        };

        jsonwebtoken::encode(&Header::new(Algorithm::HS256), &claims, &self.keys(kind).encoding)
            .map_err(TokenError::Signing)
    }

    fn verify(&self, kind: TokenKind, token: &str) -> Result<Claims, TokenError> {
        let data = jsonwebtoken::decode::<Claims>(token, &self.keys(kind).decoding, &self.validation)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => TokenError::Expired,
                _ => TokenError::Invalid,
            })?;

        let claims = data.claims;
        if claims.ver != CLAIMS_VERSION || claims.kind != kind {
            return Err(TokenError::Invalid);
        }
        Ok(claims)
    }
}

fn token_id() -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(TOKEN_ID_LEN)
        .map(char::from)
        .collect()
}
