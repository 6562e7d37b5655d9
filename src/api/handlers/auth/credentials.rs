//! Email and password checks against stored Argon2 hashes.

use anyhow::{anyhow, Context};
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

use super::password::{hash_password, verify_password};
use crate::store::{InsertOutcome, NewUser, User, UserStore};

#[derive(Debug, Error)]
pub enum CredentialError {
    #[error("invalid email or password")]
    InvalidCredentials,
    #[error("user already exists")]
    Conflict,
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

/// Emails are stored and compared trimmed and lowercased.
#[must_use]
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

pub struct CredentialVerifier {
    users: Arc<dyn UserStore>,
    // Verified against when the email is unknown so both failure paths do the same work.
    dummy_hash: String,
}

impl CredentialVerifier {
    /// # Errors
    /// Returns an error if the placeholder hash cannot be computed.
    pub fn new(users: Arc<dyn UserStore>) -> anyhow::Result<Self> {
        let dummy_hash = hash_password(&ulid::Ulid::new().to_string())
            .map_err(|e| anyhow!("failed to compute placeholder hash: {e}"))?;
        Ok(Self { users, dummy_hash })
    }

    /// Create a user with an Argon2id hash of `password`.
    ///
    /// # Errors
    /// [`CredentialError::Conflict`] if the normalized email is taken.
    pub async fn register(
        &self,
        email: &str,
        password: &str,
        name: &str,
    ) -> Result<User, CredentialError> {
        let password = password.to_string();
        let password_hash = tokio::task::spawn_blocking(move || hash_password(&password))
            .await
            .context("password hashing task failed")?
            .map_err(|e| anyhow!("failed to hash password: {e}"))?;

        let outcome = self
            .users
            .insert(NewUser {
                email: normalize_email(email),
                name: name.trim().to_string(),
                password_hash,
            })
            .await?;

        match outcome {
            InsertOutcome::Created(user) => Ok(user),
            InsertOutcome::Conflict => Err(CredentialError::Conflict),
        }
    }

    /// Check an email and password pair.
    ///
    /// # Errors
    /// [`CredentialError::InvalidCredentials`] for an unknown email and for a
    /// wrong password alike.
    pub async fn authenticate(&self, email: &str, password: &str) -> Result<User, CredentialError> {
        let record = self.users.find_credentials(&normalize_email(email)).await?;

        let (stored_hash, user) = match record {
            Some(record) => (record.password_hash, Some(record.user)),
            None => (self.dummy_hash.clone(), None),
        };

        let password = password.to_string();
        let matched = tokio::task::spawn_blocking(move || verify_password(&password, &stored_hash))
            .await
            .context("password verification task failed")?;

        match (user, matched) {
            (Some(user), Ok(true)) => Ok(user),
            (Some(user), Err(err)) => {
                // A stored hash that does not parse is a data problem, not a login failure.
                Err(CredentialError::Internal(anyhow!(
                    "stored password hash for user {} is malformed: {err}",
                    user.id
                )))
            }
            _ => {
                debug!("credential check failed");
                Err(CredentialError::InvalidCredentials)
            }
        }
    }
}
