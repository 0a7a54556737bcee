//! Admin account creation.
//!
//! # Usage
//!
//! ```bash
//! bramble admin create -e admin@example.com -n "Store Admin" -p <password> --phone +1-555-0100
//! ```

use bramble_core::{Email, Role};

use bramble_api::db::UserRepository;
use bramble_api::db::users::UserRecord;
use bramble_api::services::auth::hash_password;

use super::CommandError;

/// Create a new admin user.
///
/// # Errors
///
/// Returns an error if the email is invalid, already registered, or the
/// database is unreachable.
pub async fn create_user(
    email: &str,
    name: &str,
    password: &str,
    phone: &str,
) -> Result<(), CommandError> {
    let email =
        Email::parse(email).map_err(|e| CommandError::InvalidInput(format!("email: {e}")))?;
    if password.len() < 8 {
        return Err(CommandError::InvalidInput(
            "password must be at least 8 characters".to_owned(),
        ));
    }

    let pool = super::connect().await?;
    let users = UserRepository::new(&pool);

    let password_hash = hash_password(password)?;
    let record = UserRecord {
        name,
        email: &email,
        phone,
        role: Role::Admin,
        street: "",
        apartment: "",
        zip: "",
        city: "",
        country: "",
    };

    let user = users.create(&record, &password_hash).await?;
    tracing::info!(id = %user.id, email = %user.email, "Admin user created");
    Ok(())
}
