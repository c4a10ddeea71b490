//! Error types for the gang cost subsystem.
//!

use crate::cache::CacheError;
use crate::config::ConfigurationError;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum GangkeeperError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("Cache error: {0}")]
    CacheError(String),
    #[error("Serialization error: {0}")]
    SerializationError(String),
    #[error("Configuration error: {0}")]
    ConfigurationError(String),
    #[error("Validation error: {0}")]
    ValidationError(String),
}

impl From<sqlx::Error> for GangkeeperError {
    fn from(err: sqlx::Error) -> Self {
        GangkeeperError::DatabaseError(err.to_string())
    }
}

impl From<sqlx::migrate::MigrateError> for GangkeeperError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        GangkeeperError::DatabaseError(format!("migration failed: {err}"))
    }
}

impl From<serde_json::Error> for GangkeeperError {
    fn from(error: serde_json::Error) -> Self {
        GangkeeperError::SerializationError(format!("JSON serialization error: {error}"))
    }
}

impl From<CacheError> for GangkeeperError {
    fn from(e: CacheError) -> Self {
        GangkeeperError::CacheError(e.to_string())
    }
}

impl From<ConfigurationError> for GangkeeperError {
    fn from(e: ConfigurationError) -> Self {
        GangkeeperError::ConfigurationError(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, GangkeeperError>;
