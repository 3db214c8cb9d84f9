use std::sync::Arc;

use tracing::{info, warn};

use super::domain::{AccessToken, Credentials, NewUser, User, UserId};
use super::password::{hash_password, verify_password, PasswordError};
use super::repository::UserRepository;
use super::token::{TokenError, TokenIssuer};
use crate::db::{self, StoreError};
use crate::mail::normalize_address;

/// Error raised by the account service.
#[derive(Debug, thiserror::Error)]
pub enum AccountError {
    #[error("Email already registered")]
    EmailTaken,
    #[error("invalid email address: {0}")]
    InvalidEmail(String),
    #[error("password must not be empty")]
    EmptyPassword,
    #[error("Incorrect email or password")]
    InvalidCredentials,
    #[error("Inactive user")]
    Inactive,
    #[error("Not authorized to {0}")]
    NotAuthorized(&'static str),
    #[error("Not authenticated")]
    MissingToken,
    #[error("Could not validate credentials")]
    InvalidToken,
    #[error(transparent)]
    Password(#[from] PasswordError),
    #[error(transparent)]
    Token(#[from] TokenError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Service composing the user repository, password hashing, and token issuer.
pub struct AccountService {
    users: Arc<dyn UserRepository>,
    tokens: TokenIssuer,
}

impl AccountService {
    pub fn new(users: Arc<dyn UserRepository>, tokens: TokenIssuer) -> Self {
        Self { users, tokens }
    }

    pub async fn register(&self, new_user: NewUser) -> Result<User, AccountError> {
        let email = normalize_address(&new_user.email)
            .map_err(|err| AccountError::InvalidEmail(err.to_string()))?;
        if new_user.password.is_empty() {
            return Err(AccountError::EmptyPassword);
        }
        if self.users.find_by_email(&email).await?.is_some() {
            return Err(AccountError::EmailTaken);
        }

        let user = User {
            id: UserId::generate(),
            email,
            hashed_password: hash_password(&new_user.password)?,
            full_name: new_user.full_name.trim().to_string(),
            role: new_user.role,
            is_active: true,
            created_at: db::now(),
            updated_at: None,
        };

        let stored = match self.users.insert(user).await {
            Ok(user) => user,
            Err(StoreError::Conflict) => return Err(AccountError::EmailTaken),
            Err(err) => return Err(err.into()),
        };

        info!(user_id = %stored.id, role = stored.role.as_str(), "registered user");
        Ok(stored)
    }

    pub async fn login(&self, credentials: Credentials) -> Result<AccessToken, AccountError> {
        let email = credentials.email.trim().to_ascii_lowercase();
        let user = self
            .users
            .find_by_email(&email)
            .await?
            .ok_or(AccountError::InvalidCredentials)?;

        if !verify_password(&credentials.password, &user.hashed_password) {
            warn!(user_id = %user.id, "rejected login with wrong password");
            return Err(AccountError::InvalidCredentials);
        }
        if !user.is_active {
            return Err(AccountError::Inactive);
        }

        let token = self.tokens.issue(&user.id)?;
        Ok(AccessToken::bearer(token))
    }

    /// Resolve a bearer token into the active user it was issued for.
    pub async fn authenticate(&self, token: &str) -> Result<User, AccountError> {
        let user_id = self
            .tokens
            .verify(token)
            .map_err(|_| AccountError::InvalidToken)?;
        let user = self
            .users
            .find_by_id(&user_id)
            .await?
            .ok_or(AccountError::InvalidToken)?;
        if !user.is_active {
            return Err(AccountError::Inactive);
        }
        Ok(user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::accounts::domain::Role;
    use crate::testing::memory_store;

    async fn service() -> AccountService {
        let store = Arc::new(memory_store().await);
        AccountService::new(store, TokenIssuer::from_secret("unit-secret", 30))
    }

    fn tenant(email: &str) -> NewUser {
        NewUser {
            email: email.to_string(),
            password: "hunter22".to_string(),
            full_name: "Tess Tenant".to_string(),
            role: Role::Tenant,
        }
    }

    #[tokio::test]
    async fn register_persists_normalized_email() {
        let accounts = service().await;
        let user = accounts
            .register(tenant("  Tess@Example.com "))
            .await
            .expect("registration succeeds");
        assert_eq!(user.email, "tess@example.com");
        assert!(user.is_active);
        assert_ne!(user.hashed_password, "hunter22");
    }

    #[tokio::test]
    async fn register_rejects_duplicate_email() {
        let accounts = service().await;
        accounts
            .register(tenant("tess@example.com"))
            .await
            .expect("first registration succeeds");
        let err = accounts
            .register(tenant("TESS@example.com"))
            .await
            .expect_err("duplicate must fail");
        assert!(matches!(err, AccountError::EmailTaken));
    }

    #[tokio::test]
    async fn register_rejects_malformed_email() {
        let accounts = service().await;
        let err = accounts
            .register(tenant("not-an-email"))
            .await
            .expect_err("invalid address");
        assert!(matches!(err, AccountError::InvalidEmail(_)));
    }

    #[tokio::test]
    async fn login_rejects_wrong_password_and_unknown_email_alike() {
        let accounts = service().await;
        accounts
            .register(tenant("tess@example.com"))
            .await
            .expect("registration succeeds");

        let wrong_password = accounts
            .login(Credentials {
                email: "tess@example.com".to_string(),
                password: "nope".to_string(),
            })
            .await
            .expect_err("wrong password");
        let unknown = accounts
            .login(Credentials {
                email: "ghost@example.com".to_string(),
                password: "hunter22".to_string(),
            })
            .await
            .expect_err("unknown email");

        assert_eq!(wrong_password.to_string(), unknown.to_string());
        assert!(matches!(wrong_password, AccountError::InvalidCredentials));
    }

    #[tokio::test]
    async fn login_token_authenticates_the_user() {
        let accounts = service().await;
        let user = accounts
            .register(tenant("tess@example.com"))
            .await
            .expect("registration succeeds");
        let token = accounts
            .login(Credentials {
                email: "tess@example.com".to_string(),
                password: "hunter22".to_string(),
            })
            .await
            .expect("login succeeds");

        assert_eq!(token.token_type, "bearer");
        let resolved = accounts
            .authenticate(&token.access_token)
            .await
            .expect("token resolves");
        assert_eq!(resolved.id, user.id);
    }

    #[tokio::test]
    async fn authenticate_rejects_garbage_tokens() {
        let accounts = service().await;
        let err = accounts
            .authenticate("definitely.not.a-jwt")
            .await
            .expect_err("garbage token");
        assert!(matches!(err, AccountError::InvalidToken));
    }
}
