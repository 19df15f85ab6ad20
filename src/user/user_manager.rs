use super::{
    auth::{HashedPassword, PasswordHasher},
    AuthToken, AuthTokenValue, UserAuthCredentials, UserStore,
};
use anyhow::{bail, Result};
use std::{sync::Arc, time::SystemTime};
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Error)]
pub enum RegistrationError {
    #[error("The user handle cannot be empty.")]
    EmptyHandle,
    #[error("The password cannot be empty.")]
    EmptyPassword,
    #[error("User handle {0} already exists.")]
    HandleTaken(String),
    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

pub struct UserManager {
    user_store: Arc<dyn UserStore>,
}

impl UserManager {
    pub fn new(user_store: Arc<dyn UserStore>) -> Self {
        Self { user_store }
    }

    /// Creates a user together with its password credentials.
    pub fn register(&self, user_handle: &str, password: &str) -> Result<usize, RegistrationError> {
        let user_handle = user_handle.trim();
        if user_handle.is_empty() {
            return Err(RegistrationError::EmptyHandle);
        }
        if password.is_empty() {
            return Err(RegistrationError::EmptyPassword);
        }

        let password = HashedPassword::new(PasswordHasher::Argon2, password)?;
        match self.user_store.create_user_with_password(user_handle, &password)? {
            Some(user_id) => {
                info!("Registered user {} with id {}", user_handle, user_id);
                Ok(user_id)
            }
            None => Err(RegistrationError::HandleTaken(user_handle.to_owned())),
        }
    }

    /// Checks the password of `user_handle` and issues a new auth token when
    /// it matches. Returns Ok(None) for an unknown user or a wrong password.
    pub fn login(&self, user_handle: &str, password: &str) -> Result<Option<AuthToken>> {
        let user_handle = user_handle.trim();
        let credentials = match self.user_store.get_user_auth_credentials(user_handle)? {
            Some(UserAuthCredentials {
                username_password: Some(credentials),
                ..
            }) => credentials,
            _ => {
                debug!("No password credentials for handle {}", user_handle);
                return Ok(None);
            }
        };

        let verified = credentials.verify(password)?;
        self.user_store
            .record_password_attempt(credentials.user_id, verified)?;
        if !verified {
            debug!("Wrong password for handle {}", user_handle);
            return Ok(None);
        }

        self.generate_auth_token(credentials.user_id).map(Some)
    }

    pub fn generate_auth_token(&self, user_id: usize) -> Result<AuthToken> {
        let token = AuthToken {
            user_id,
            value: AuthTokenValue::generate(),
            created: SystemTime::now(),
            last_used: None,
        };
        self.user_store.add_user_auth_token(token.clone())?;
        Ok(token)
    }

    pub fn get_auth_token(&self, value: &AuthTokenValue) -> Result<Option<AuthToken>> {
        self.user_store.get_user_auth_token(value)
    }

    pub fn update_auth_token_last_used(&self, value: &AuthTokenValue) -> Result<()> {
        self.user_store
            .update_user_auth_token_last_used_timestamp(value)
    }

    pub fn delete_auth_token(&self, user_id: usize, token_value: &AuthTokenValue) -> Result<()> {
        let removed = self.user_store.delete_user_auth_token(token_value)?;
        match removed {
            Some(removed) => {
                if removed.user_id == user_id {
                    Ok(())
                } else {
                    let owner = removed.user_id;
                    self.user_store.add_user_auth_token(removed)?;
                    bail!(
                        "Tried to delete an auth token of user {}, but the authenticated user was {}.",
                        owner,
                        user_id
                    )
                }
            }
            None => bail!("Did not find the auth token to delete"),
        }
    }
}
