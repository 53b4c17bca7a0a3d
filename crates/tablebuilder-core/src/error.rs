//! Error types for the table builder

use thiserror::Error;

use crate::models::{BoundaryLevelId, GeographicLevel, SubjectId};

#[derive(Debug, Error)]
pub enum TableBuilderError {
    // Lookup errors
    #[error("Subject not found: {id}")]
    SubjectNotFound { id: SubjectId },

    #[error("Boundary level not found: {id}")]
    BoundaryLevelNotFound { id: BoundaryLevelId },

    // Cancellation
    #[error("Operation cancelled")]
    Cancelled,

    // Reference data errors
    #[error("Invalid hierarchy for {level}: {reason}")]
    InvalidHierarchy {
        level: GeographicLevel,
        reason: String,
    },

    #[error("Invalid location {code}: {reason}")]
    InvalidLocation { code: String, reason: String },

    #[error("Unknown geographic level: {key}")]
    UnknownGeographicLevel { key: String },

    #[error("Invalid time identifier: {code}")]
    InvalidTimeIdentifier { code: String },

    // Configuration errors
    #[error("Invalid configuration value for {key}: {reason}")]
    ConfigInvalid { key: String, reason: String },

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl TableBuilderError {
    /// True when the operation was aborted by a cancellation signal
    pub fn is_cancelled(&self) -> bool {
        matches!(self, TableBuilderError::Cancelled)
    }

    /// True for errors describing a referenced entity that does not exist
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            TableBuilderError::SubjectNotFound { .. } | TableBuilderError::BoundaryLevelNotFound { .. }
        )
    }
}

impl From<serde_json::Error> for TableBuilderError {
    fn from(err: serde_json::Error) -> Self {
        TableBuilderError::Serialization(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, TableBuilderError>;
