//! Account service: registration, login, and bearer tokens.
//!
//! Passwords are hashed with Argon2id; credentials are verified against the
//! stored hash and never logged. Successful logins are answered with a
//! signed HS256 bearer token carrying the user id and role, valid for the
//! configured lifetime (one day by default).

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation};
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use bramble_core::{Email, EmailError, Role, UserId};

use crate::config::ApiConfig;
use crate::db::users::UserRecord;
use crate::db::{RepositoryError, UserRepository};
use crate::models::{RegisterInput, UpdateUserInput, User};

/// Minimum password length.
const MIN_PASSWORD_LENGTH: usize = 8;

/// Errors from the account service.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// Unknown email or wrong password. Deliberately indistinguishable.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// Registration against an email that already has an account.
    #[error("email already registered")]
    EmailTaken,

    /// Password fails the strength requirements.
    #[error("weak password: {0}")]
    WeakPassword(String),

    /// Email fails structural validation.
    #[error("invalid email: {0}")]
    InvalidEmail(#[from] EmailError),

    /// Bearer token missing, malformed, expired, or badly signed.
    #[error("invalid token")]
    InvalidToken,

    /// Token signing failed.
    #[error("token creation failed")]
    TokenCreation,

    /// Password hashing failed.
    #[error("hash error: {0}")]
    Hash(String),

    /// Underlying repository failure.
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// Claims carried by a bearer token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Subject: the user's id.
    pub sub: i32,
    /// The role the token acts under.
    pub role: Role,
    /// Issued at (UTC timestamp).
    pub iat: i64,
    /// Expiration time (UTC timestamp).
    pub exp: i64,
}

impl TokenClaims {
    /// The user id the token was issued to.
    #[must_use]
    pub const fn user_id(&self) -> UserId {
        UserId::new(self.sub)
    }
}

/// Account service.
///
/// Handles user registration, login, profile updates, and bearer-token
/// issue/verification.
pub struct AuthService<'a> {
    users: UserRepository<'a>,
    config: &'a ApiConfig,
}

impl<'a> AuthService<'a> {
    /// Create a new account service.
    #[must_use]
    pub const fn new(pool: &'a PgPool, config: &'a ApiConfig) -> Self {
        Self {
            users: UserRepository::new(pool),
            config,
        }
    }

    /// Register a new account with the given role.
    ///
    /// Self-registration always passes `Role::Customer`; only admin user
    /// creation may pass `Role::Admin`.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidEmail` if the email format is invalid,
    /// `AuthError::WeakPassword` if the password doesn't meet requirements,
    /// `AuthError::EmailTaken` if the email is already registered.
    pub async fn register(&self, input: &RegisterInput, role: Role) -> Result<User, AuthError> {
        let email = Email::parse(&input.email)?;
        validate_password(&input.password)?;
        let password_hash = hash_password(&input.password)?;

        let record = UserRecord {
            name: &input.name,
            email: &email,
            phone: &input.phone,
            role,
            street: &input.street,
            apartment: &input.apartment,
            zip: &input.zip,
            city: &input.city,
            country: &input.country,
        };

        let user = self
            .users
            .create(&record, &password_hash)
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict(_) => AuthError::EmailTaken,
                other => AuthError::Repository(other),
            })?;

        Ok(user)
    }

    /// Replace a user's profile. The stored password hash is replaced only
    /// when the input carries a new plaintext password; otherwise it is
    /// preserved unchanged. The stored role is replaced only when `role` is
    /// supplied (admin callers).
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Repository(RepositoryError::NotFound)` if the
    /// user doesn't exist, plus the same validation errors as registration.
    pub async fn update_profile(
        &self,
        id: UserId,
        input: &UpdateUserInput,
        role: Role,
    ) -> Result<User, AuthError> {
        let email = Email::parse(&input.email)?;

        let password_hash = match input.password.as_deref() {
            Some(password) => {
                validate_password(password)?;
                Some(hash_password(password)?)
            }
            None => None,
        };

        let record = UserRecord {
            name: &input.name,
            email: &email,
            phone: &input.phone,
            role,
            street: &input.street,
            apartment: &input.apartment,
            zip: &input.zip,
            city: &input.city,
            country: &input.country,
        };

        let user = self
            .users
            .update(id, &record, password_hash.as_deref())
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict(_) => AuthError::EmailTaken,
                other => AuthError::Repository(other),
            })?;

        Ok(user)
    }

    /// Login with email and password, issuing a bearer token on success.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` if the email is unknown or
    /// the password is wrong.
    pub async fn login(&self, email: &str, password: &str) -> Result<(User, String), AuthError> {
        let email = Email::parse(email).map_err(|_| AuthError::InvalidCredentials)?;

        let (user, password_hash) = self
            .users
            .get_password_hash(&email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        verify_password(password, &password_hash)?;

        let token = issue_token(self.config, user.id, user.role)?;
        Ok((user, token))
    }
}

// =============================================================================
// Tokens
// =============================================================================

/// Sign a bearer token for a user.
///
/// # Errors
///
/// Returns `AuthError::TokenCreation` if signing fails.
pub fn issue_token(config: &ApiConfig, user_id: UserId, role: Role) -> Result<String, AuthError> {
    let now = chrono::Utc::now().timestamp();
    let ttl = i64::from(config.token_ttl_hours) * 3600;

    let claims = TokenClaims {
        sub: user_id.as_i32(),
        role,
        iat: now,
        exp: now + ttl,
    };

    jsonwebtoken::encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(config.token_secret.expose_secret().as_bytes()),
    )
    .map_err(|_| AuthError::TokenCreation)
}

/// Verify a bearer token and return its claims.
///
/// # Errors
///
/// Returns `AuthError::InvalidToken` if the token is malformed, expired,
/// or signed with a different secret.
pub fn verify_token(config: &ApiConfig, token: &str) -> Result<TokenClaims, AuthError> {
    let data = jsonwebtoken::decode::<TokenClaims>(
        token,
        &DecodingKey::from_secret(config.token_secret.expose_secret().as_bytes()),
        &Validation::default(),
    )
    .map_err(|_| AuthError::InvalidToken)?;

    Ok(data.claims)
}

// =============================================================================
// Passwords
// =============================================================================

/// Validate password strength.
fn validate_password(password: &str) -> Result<(), AuthError> {
    if password.len() < MIN_PASSWORD_LENGTH {
        return Err(AuthError::WeakPassword(format!(
            "password must be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }
    Ok(())
}

/// Hash a password with Argon2id and a fresh salt.
///
/// # Errors
///
/// Returns `AuthError::Hash` if hashing fails.
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AuthError::Hash(e.to_string()))?;
    Ok(hash.to_string())
}

/// Verify a password against a stored hash.
fn verify_password(password: &str, stored_hash: &str) -> Result<(), AuthError> {
    let parsed = PasswordHash::new(stored_hash).map_err(|e| AuthError::Hash(e.to_string()))?;
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .map_err(|_| AuthError::InvalidCredentials)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::net::IpAddr;
    use std::path::PathBuf;

    use secrecy::SecretString;

    use crate::config::SentryConfig;

    use super::*;

    fn test_config() -> ApiConfig {
        ApiConfig {
            database_url: SecretString::from("postgres://localhost/test"),
            host: "127.0.0.1".parse::<IpAddr>().unwrap(),
            port: 5000,
            base_url: "http://localhost:5000".to_string(),
            api_prefix: "/api/v1".to_string(),
            token_secret: SecretString::from("kP3mW8qZ5xT1vN6cJ9bF2hY7dR4gL0sA"),
            token_ttl_hours: 24,
            upload_dir: PathBuf::from("public/uploads"),
            sentry: SentryConfig::default(),
        }
    }

    #[test]
    fn test_password_hash_roundtrip() {
        let hash = hash_password("correct horse battery").unwrap();
        assert!(verify_password("correct horse battery", &hash).is_ok());
        assert!(matches!(
            verify_password("wrong password", &hash),
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[test]
    fn test_hashes_are_salted() {
        let first = hash_password("correct horse battery").unwrap();
        let second = hash_password("correct horse battery").unwrap();
        assert_ne!(first, second);
    }

    #[test]
    fn test_validate_password_too_short() {
        assert!(matches!(
            validate_password("short"),
            Err(AuthError::WeakPassword(_))
        ));
        assert!(validate_password("long enough").is_ok());
    }

    #[test]
    fn test_token_roundtrip() {
        let config = test_config();
        let token = issue_token(&config, UserId::new(42), Role::Admin).unwrap();

        let claims = verify_token(&config, &token).unwrap();
        assert_eq!(claims.user_id(), UserId::new(42));
        assert_eq!(claims.role, Role::Admin);
        assert_eq!(claims.exp - claims.iat, 24 * 3600);
    }

    #[test]
    fn test_token_rejects_wrong_secret() {
        let config = test_config();
        let token = issue_token(&config, UserId::new(1), Role::Customer).unwrap();

        let mut other = test_config();
        other.token_secret = SecretString::from("zQ9wE2rT6yU1iO5pA8sD3fG7hJ0kL4xC");
        assert!(matches!(
            verify_token(&other, &token),
            Err(AuthError::InvalidToken)
        ));
    }

    #[test]
    fn test_token_rejects_garbage() {
        let config = test_config();
        assert!(matches!(
            verify_token(&config, "not-a-token"),
            Err(AuthError::InvalidToken)
        ));
    }
}
