use super::auth::{AuthToken, AuthTokenValue, HashedPassword, UserAuthCredentials};
use anyhow::Result;

pub trait UserAuthCredentialsStore: Send + Sync {
    /// Returns the user's authentication credentials given the user handle.
    /// Returns Ok(None) if the user does not exist.
    /// Returns Err if there is a database error.
    fn get_user_auth_credentials(&self, user_handle: &str) -> Result<Option<UserAuthCredentials>>;

    /// Records a login attempt against the user's password credentials,
    /// bumping `last_used` too when the attempt succeeded.
    fn record_password_attempt(&self, user_id: usize, succeeded: bool) -> Result<()>;
}

pub trait UserAuthTokenStore: Send + Sync {
    /// Returns a user's authentication token given an AuthTokenValue.
    /// Returns Ok(None) if the token does not exist.
    /// Returns Err if there is a database error.
    fn get_user_auth_token(&self, token: &AuthTokenValue) -> Result<Option<AuthToken>>;

    /// Deletes an auth token given the token value.
    /// Returns Ok(None) if the token does not exist.
    fn delete_user_auth_token(&self, token: &AuthTokenValue) -> Result<Option<AuthToken>>;

    /// Updates an auth token with the latest timestamp.
    fn update_user_auth_token_last_used_timestamp(&self, token: &AuthTokenValue) -> Result<()>;

    /// Adds a new auth token.
    fn add_user_auth_token(&self, token: AuthToken) -> Result<()>;
}

pub trait UserStore: UserAuthTokenStore + UserAuthCredentialsStore + Send + Sync {
    /// Creates a user together with its password credentials, both or
    /// neither, and returns the user id.
    /// Returns Ok(None) if the handle is already taken.
    fn create_user_with_password(
        &self,
        user_handle: &str,
        password: &HashedPassword,
    ) -> Result<Option<usize>>;

    /// Returns a user's id given the user handle.
    /// Returns Ok(None) if the user does not exist.
    fn get_user_id(&self, user_handle: &str) -> Result<Option<usize>>;
}
