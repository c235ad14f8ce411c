//! `SeaORM` implementation of the `UserService` trait.

use async_trait::async_trait;
use regex::Regex;
use std::sync::LazyLock;
use tracing::{debug, info};

use crate::config::SecurityConfig;
use crate::db::{NewUser, Store, User};
use crate::services::credentials;
use crate::services::user_service::{UserError, UserService};

const USERNAME_MIN_LEN: usize = 3;
const USERNAME_MAX_LEN: usize = 50;
const PASSWORD_MIN_LEN: usize = 6;
const PASSWORD_MAX_LEN: usize = 128;
const EMAIL_MAX_LEN: usize = 254;

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern is valid")
});

pub struct SeaOrmUserService {
    store: Store,
    security: SecurityConfig,
}

impl SeaOrmUserService {
    #[must_use]
    pub const fn new(store: Store, security: SecurityConfig) -> Self {
        Self { store, security }
    }
}

fn validate_username(username: &str) -> Result<(), UserError> {
    let len = username.chars().count();
    if !(USERNAME_MIN_LEN..=USERNAME_MAX_LEN).contains(&len) {
        return Err(UserError::Validation(format!(
            "Username must be between {USERNAME_MIN_LEN} and {USERNAME_MAX_LEN} characters"
        )));
    }

    if !username
        .chars()
        .all(|c| c.is_alphanumeric() || c == '_' || c == '-' || c == '.')
    {
        return Err(UserError::Validation(
            "Username can only contain letters, numbers, underscores, hyphens, and dots"
                .to_string(),
        ));
    }

    Ok(())
}

fn validate_email(email: &str) -> Result<(), UserError> {
    if email.len() > EMAIL_MAX_LEN || !EMAIL_RE.is_match(email) {
        return Err(UserError::Validation("Email address is not valid".to_string()));
    }
    Ok(())
}

fn validate_password(password: &str) -> Result<(), UserError> {
    let len = password.chars().count();
    if !(PASSWORD_MIN_LEN..=PASSWORD_MAX_LEN).contains(&len) {
        return Err(UserError::Validation(format!(
            "Password must be between {PASSWORD_MIN_LEN} and {PASSWORD_MAX_LEN} characters"
        )));
    }
    Ok(())
}

#[async_trait]
impl UserService for SeaOrmUserService {
    async fn register(
        &self,
        username: &str,
        email: &str,
        password: &str,
    ) -> Result<User, UserError> {
        let username = username.trim();
        let email = email.trim();

        validate_username(username)?;
        validate_email(email)?;
        validate_password(password)?;

        // Fast path only; the unique constraints decide races
        if self.store.username_exists(username).await? || self.store.email_exists(email).await? {
            return Err(UserError::DuplicateIdentity);
        }

        let password_hash = credentials::hash_password_blocking(password, &self.security).await?;

        let user = self
            .store
            .create_user(NewUser {
                username: username.to_string(),
                email: email.to_string(),
                password_hash,
            })
            .await?
            .ok_or(UserError::DuplicateIdentity)?;

        info!(user_id = %user.user_id, username = %user.username, "User registered");
        Ok(user)
    }

    async fn authenticate(&self, username: &str, password: &str) -> Result<User, UserError> {
        let Some((user, password_hash)) = self
            .store
            .get_user_by_username_with_password(username.trim())
            .await?
        else {
            debug!("Login attempt for unknown username");
            return Err(UserError::InvalidCredential);
        };

        if !credentials::verify_password_blocking(password, &password_hash).await? {
            debug!(user_id = %user.user_id, "Login attempt with wrong password");
            return Err(UserError::InvalidCredential);
        }

        Ok(user)
    }

    async fn find_by_id(&self, user_id: &str) -> Result<Option<User>, UserError> {
        Ok(self.store.get_user(user_id).await?)
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, UserError> {
        Ok(self.store.get_user_by_username(username).await?)
    }
}
