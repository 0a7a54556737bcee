//! CLI command implementations.

pub mod admin;
pub mod migrate;
pub mod seed;

use secrecy::SecretString;
use sqlx::PgPool;
use thiserror::Error;

/// Errors shared by the CLI commands.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(&'static str),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Repository error: {0}")]
    Repository(#[from] bramble_api::db::RepositoryError),

    #[error("Auth error: {0}")]
    Auth(#[from] bramble_api::services::auth::AuthError),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Connect to the database named by `BRAMBLE_DATABASE_URL` (or the generic
/// `DATABASE_URL` fallback).
pub(crate) async fn connect() -> Result<PgPool, CommandError> {
    dotenvy::dotenv().ok();

    let database_url = std::env::var("BRAMBLE_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
        .map(SecretString::from)
        .map_err(|_| CommandError::MissingEnvVar("BRAMBLE_DATABASE_URL"))?;

    tracing::info!("Connecting to database...");
    let pool = bramble_api::db::create_pool(&database_url).await?;
    Ok(pool)
}
