//! Error type shared by every dashboard component

use thiserror::Error;

/// Errors surfaced by the synchronization layer.
///
/// Query results are broadcast to several observers, so the error must be
/// cheap to clone and carries rendered messages rather than source errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FleetError {
    #[error("Query failed: {0}")]
    Query(String),

    #[error("Save failed: {0}")]
    Save(String),

    #[error("Position unavailable: {0}")]
    Position(String),

    #[error("Record lookup failed: {0}")]
    Record(String),

    #[error("Invalid edit for boat {boat_id}: {reason}")]
    InvalidEdit { boat_id: String, reason: String },

    #[error("A save is already in progress")]
    SaveInProgress,
}

impl FleetError {
    /// The message shown to the user in a notification body.
    pub fn user_message(&self) -> String {
        match self {
            FleetError::Query(msg)
            | FleetError::Save(msg)
            | FleetError::Position(msg)
            | FleetError::Record(msg) => msg.clone(),
            other => other.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, FleetError>;
