use sqlx::{postgres::PgPoolOptions, PgPool};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info};

use crate::config::DatabaseConfig;
use crate::sql::SqlError;

/// Errors from the storage layer and the repositories built on it
#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("Missing configuration: {0}")]
    ConfigMissing(&'static str),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Invalid reference: {0}")]
    InvalidReference(String),

    /// Value rejected by a column type or CHECK / NOT NULL constraint
    #[error("Constraint violation: {0}")]
    Constraint(String),

    #[error("Row decode error: {0}")]
    Decode(String),

    #[error("Password hashing error: {0}")]
    Hash(String),

    #[error(transparent)]
    Sql(#[from] SqlError),

    #[error(transparent)]
    Sqlx(sqlx::Error),
}

impl From<sqlx::Error> for DatabaseError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            let code = db_err.code();
            let mapped = match code.as_deref() {
                Some("23505") => Some(DatabaseError::Conflict("Duplicate value".to_string())),
                Some("23503") => Some(DatabaseError::InvalidReference("Referenced record does not exist".to_string())),
                Some("23502") => Some(DatabaseError::Constraint("Missing required value".to_string())),
                Some("23514") => Some(DatabaseError::Constraint("Value violates a data constraint".to_string())),
                Some("22001") => Some(DatabaseError::Constraint("Value too long".to_string())),
                Some("22003") => Some(DatabaseError::Constraint("Numeric value out of range".to_string())),
                _ => None,
            };
            if let Some(mapped) = mapped {
                // Driver text names tables and constraints; keep it in the logs only
                debug!(code = ?code, "{}", db_err.message());
                return mapped;
            }
        }
        DatabaseError::Sqlx(err)
    }
}

impl From<bcrypt::BcryptError> for DatabaseError {
    fn from(err: bcrypt::BcryptError) -> Self {
        DatabaseError::Hash(err.to_string())
    }
}

/// Connection pool construction for the Jobly database
pub struct DatabaseManager;

impl DatabaseManager {
    /// Open a pool against `config.url`
    pub async fn connect(config: &DatabaseConfig) -> Result<PgPool, DatabaseError> {
        if config.url.is_empty() {
            return Err(DatabaseError::ConfigMissing("DATABASE_URL"));
        }

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(config.connection_timeout))
            .connect(&config.url)
            .await?;

        info!(max_connections = config.max_connections, "Created database pool");
        Ok(pool)
    }
}
