//! Data service and configuration for the fleet dashboard

pub mod config;
pub mod schema;
pub mod sources;

use fleet_core::FleetError;
use thiserror::Error;
use tokio::task::JoinError;

// Re-exports
pub use config::DashboardConfig;
pub use sources::SqliteBoatService;

/// Errors that can occur in data operations
#[derive(Error, Debug)]
pub enum DataError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Unknown boat: {0}")]
    UnknownBoat(String),

    #[error("Unsupported field: {0}")]
    UnsupportedField(String),

    #[error("Join error: {0}")]
    Join(#[from] JoinError),

    #[error("Other error: {0}")]
    Other(String),
}

impl From<serde_json::Error> for DataError {
    fn from(error: serde_json::Error) -> Self {
        DataError::Config(error.to_string())
    }
}

impl DataError {
    /// Convert into a query failure for the synchronization layer
    pub fn into_query_error(self) -> FleetError {
        FleetError::Query(self.to_string())
    }

    /// Convert into a save failure for the synchronization layer
    pub fn into_save_error(self) -> FleetError {
        FleetError::Save(self.to_string())
    }

    /// Convert into a record lookup failure for the synchronization layer
    pub fn into_record_error(self) -> FleetError {
        FleetError::Record(self.to_string())
    }
}
