//! User management commands.

use thiserror::Error;

use mercato_core::{Email, EmailError, UserRole};
use mercato_storefront::db::{RepositoryError, Stores};

use super::{ConnectError, connect};

#[derive(Debug, Error)]
pub enum UserError {
    #[error(transparent)]
    Connect(#[from] ConnectError),

    #[error("Invalid email: {0}")]
    InvalidEmail(#[from] EmailError),

    #[error("No user with email: {0}")]
    NotFound(String),

    #[error("Database error: {0}")]
    Repository(RepositoryError),
}

/// Grant the admin role to the user with `email`.
pub async fn promote(email: &str) -> Result<(), UserError> {
    let email = Email::parse(email)?;
    let stores = Stores::postgres(connect().await?);

    let user = stores
        .users
        .set_role(&email, UserRole::Admin)
        .await
        .map_err(|e| match e {
            RepositoryError::NotFound => UserError::NotFound(email.to_string()),
            other => UserError::Repository(other),
        })?;

    tracing::info!(user_id = %user.id, email = %user.email, "User promoted to admin");
    Ok(())
}
