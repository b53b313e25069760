use thiserror::Error;
use uuid::Uuid;

/// Main error type for the metrics engine
#[derive(Error, Debug)]
pub enum MaxError {
    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    // Database errors
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    // Fatal lookup errors — no computation is attempted for the turn
    #[error("User not found: {0}")]
    UserNotFound(Uuid),

    #[error("Ledger read failed: {0}")]
    LedgerRead(#[source] sqlx::Error),

    // Non-fatal: recovered locally with fallback odds/market
    #[error("Prediction resolution failed: {0}")]
    PredictionResolution(String),

    // Recovered: rolled back, surfaced as success=false to the caller
    #[error("Persistence write failed: {0}")]
    PersistenceWrite(#[source] sqlx::Error),

    // Serialization errors
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // Generic errors
    #[error("Internal error: {0}")]
    Internal(String),

    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

/// Result type alias for MaxError
pub type Result<T> = std::result::Result<T, MaxError>;
