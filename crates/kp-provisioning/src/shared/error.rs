//! Store Error Types
//!
//! Every store lookup or write failure surfaces as a `StoreError`. The
//! provisioning workflow hands these back to its caller unchanged.

use mongodb::error::{ErrorKind, WriteFailure};
use thiserror::Error;

/// MongoDB server code for a unique index violation
const DUPLICATE_KEY_CODE: i32 = 11000;

#[derive(Error, Debug)]
pub enum StoreError {
    /// A conditional write lost a race against a concurrent writer.
    /// `source` holds the driver error when MongoDB reported the conflict.
    #[error("Write conflict on {entity_type}: {message}")]
    Conflict {
        entity_type: String,
        message: String,
        #[source]
        source: Option<mongodb::error::Error>,
    },

    #[error("Database error: {0}")]
    Database(#[from] mongodb::error::Error),

    #[error("Store unavailable: {message}")]
    Unavailable { message: String },
}

impl StoreError {
    /// Conflict detected outside the driver, e.g. by the in-memory stores.
    pub fn conflict(entity_type: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Conflict {
            entity_type: entity_type.into(),
            message: message.into(),
            source: None,
        }
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable { message: message.into() }
    }

    /// Classify a failed MongoDB write: unique index violations become
    /// `Conflict`, everything else stays a `Database` error.
    pub fn from_write_error(err: mongodb::error::Error, entity_type: &str) -> Self {
        if is_duplicate_key(&err) {
            Self::Conflict {
                entity_type: entity_type.to_string(),
                message: "duplicate key".to_string(),
                source: Some(err),
            }
        } else {
            Self::Database(err)
        }
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict { .. })
    }
}

fn is_duplicate_key(err: &mongodb::error::Error) -> bool {
    matches!(
        err.kind.as_ref(),
        ErrorKind::Write(WriteFailure::WriteError(write_error)) if write_error.code == DUPLICATE_KEY_CODE
    )
}

pub type Result<T> = std::result::Result<T, StoreError>;
