//! User repository for database operations.
//!
//! The password hash never rides on the [`User`] model: it is written at
//! registration, optionally replaced on update, and read back only through
//! [`UserRepository::get_password_hash`] for credential verification.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use bramble_core::{Email, Role, UserId};

use super::RepositoryError;
use crate::models::User;

/// Internal row type for user queries.
#[derive(Debug, sqlx::FromRow)]
struct UserRow {
    id: UserId,
    name: String,
    email: Email,
    phone: String,
    role: String,
    street: String,
    apartment: String,
    zip: String,
    city: String,
    country: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = RepositoryError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let role = row.role.parse::<Role>().map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid role in database: {e}"))
        })?;

        Ok(Self {
            id: row.id,
            name: row.name,
            email: row.email,
            phone: row.phone,
            role,
            street: row.street,
            apartment: row.apartment,
            zip: row.zip,
            city: row.city,
            country: row.country,
            created_at: row.created_at,
        })
    }
}

/// Field values for inserting or replacing a user record.
///
/// Constructed by the account service after validation and hashing.
#[derive(Debug)]
pub struct UserRecord<'a> {
    pub name: &'a str,
    pub email: &'a Email,
    pub phone: &'a str,
    pub role: Role,
    pub street: &'a str,
    pub apartment: &'a str,
    pub zip: &'a str,
    pub city: &'a str,
    pub country: &'a str,
}

/// Repository for user database operations.
pub struct UserRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> UserRepository<'a> {
    /// Create a new user repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List all users.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if a stored role is invalid.
    pub async fn list(&self) -> Result<Vec<User>, RepositoryError> {
        let rows = sqlx::query_as::<_, UserRow>(
            r"
            SELECT id, name, email, phone, role, street, apartment, zip, city, country, created_at
            FROM users
            ORDER BY id ASC
            ",
        )
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(User::try_from).collect()
    }

    /// Get a user by their ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the stored role is invalid.
    pub async fn get(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(
            r"
            SELECT id, name, email, phone, role, street, apartment, zip, city, country, created_at
            FROM users
            WHERE id = $1
            ",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        row.map(User::try_from).transpose()
    }

    /// Get a user by their email address.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the stored role is invalid.
    pub async fn get_by_email(&self, email: &Email) -> Result<Option<User>, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(
            r"
            SELECT id, name, email, phone, role, street, apartment, zip, city, country, created_at
            FROM users
            WHERE email = $1
            ",
        )
        .bind(email)
        .fetch_optional(self.pool)
        .await?;

        row.map(User::try_from).transpose()
    }

    /// Create a new user with a pre-hashed credential.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the email already exists.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn create(
        &self,
        record: &UserRecord<'_>,
        password_hash: &str,
    ) -> Result<User, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(
            r"
            INSERT INTO users
                (name, email, password_hash, phone, role, street, apartment, zip, city, country)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING id, name, email, phone, role, street, apartment, zip, city, country, created_at
            ",
        )
        .bind(record.name)
        .bind(record.email)
        .bind(password_hash)
        .bind(record.phone)
        .bind(record.role.as_str())
        .bind(record.street)
        .bind(record.apartment)
        .bind(record.zip)
        .bind(record.city)
        .bind(record.country)
        .fetch_one(self.pool)
        .await
        .map_err(unique_email_to_conflict)?;

        row.try_into()
    }

    /// Replace a user's fields. When `password_hash` is `None` the stored
    /// hash is preserved unchanged; when `Some` it replaces the prior hash.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the user doesn't exist.
    /// Returns `RepositoryError::Conflict` if the new email is already taken.
    pub async fn update(
        &self,
        id: UserId,
        record: &UserRecord<'_>,
        password_hash: Option<&str>,
    ) -> Result<User, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(
            r"
            UPDATE users
            SET name = $2, email = $3, phone = $4, role = $5, street = $6,
                apartment = $7, zip = $8, city = $9, country = $10,
                password_hash = COALESCE($11, password_hash)
            WHERE id = $1
            RETURNING id, name, email, phone, role, street, apartment, zip, city, country, created_at
            ",
        )
        .bind(id)
        .bind(record.name)
        .bind(record.email)
        .bind(record.phone)
        .bind(record.role.as_str())
        .bind(record.street)
        .bind(record.apartment)
        .bind(record.zip)
        .bind(record.city)
        .bind(record.country)
        .bind(password_hash)
        .fetch_optional(self.pool)
        .await
        .map_err(unique_email_to_conflict)?
        .ok_or(RepositoryError::NotFound)?;

        row.try_into()
    }

    /// Get a user's password hash by email, for credential verification.
    ///
    /// Returns `None` if no user has this email.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the stored role is invalid.
    pub async fn get_password_hash(
        &self,
        email: &Email,
    ) -> Result<Option<(User, String)>, RepositoryError> {
        #[derive(sqlx::FromRow)]
        struct CredentialRow {
            #[sqlx(flatten)]
            user: UserRow,
            password_hash: String,
        }

        let row = sqlx::query_as::<_, CredentialRow>(
            r"
            SELECT id, name, email, phone, role, street, apartment, zip, city, country,
                   created_at, password_hash
            FROM users
            WHERE email = $1
            ",
        )
        .bind(email)
        .fetch_optional(self.pool)
        .await?;

        let Some(r) = row else {
            return Ok(None);
        };

        Ok(Some((r.user.try_into()?, r.password_hash)))
    }

    /// Delete a user.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the user doesn't exist.
    pub async fn delete(&self, id: UserId) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            r"
            DELETE FROM users WHERE id = $1
            ",
        )
        .bind(id)
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }

    /// Count all registered users.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn count(&self) -> Result<i64, RepositoryError> {
        let (count,): (i64,) = sqlx::query_as(
            r"
            SELECT COUNT(*) FROM users
            ",
        )
        .fetch_one(self.pool)
        .await?;

        Ok(count)
    }
}

/// Map a unique violation on the email index to a `Conflict`.
fn unique_email_to_conflict(e: sqlx::Error) -> RepositoryError {
    if let sqlx::Error::Database(ref db_err) = e
        && db_err.is_unique_violation()
    {
        return RepositoryError::Conflict("email already exists".to_owned());
    }
    RepositoryError::Database(e)
}
