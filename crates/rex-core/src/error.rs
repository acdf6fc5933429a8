use std::io;

use rex_domain::{MonthError, StartDateShiftKind, YearMonth};
use thiserror::Error;
use uuid::Uuid;

/// Failures reported by a [`crate::RecurringExpenseStore`] implementation.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Record not found in store: {0}")]
    NotFound(Uuid),
    #[error("Record already exists in store: {0}")]
    Duplicate(Uuid),
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("Serialization error: {0}")]
    Serde(String),
    #[error("Store backend failure: {0}")]
    Backend(String),
}

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("Recurring expense not found: {0}")]
    RecordNotFound(Uuid),
    #[error("Unsupported deletion type: {0}")]
    UnsupportedDeletionMode(String),
    #[error("Invalid month {month} for year {year}")]
    InvalidMonth { year: i32, month: u32 },
    #[error("Invalid date: {0}")]
    InvalidDate(String),
    #[error("Month {month} is outside the window of recurring expense {id}")]
    MonthOutsideRecord { id: Uuid, month: YearMonth },
    #[error("Start date change classified as {kind}; conflicting records: {conflicts:?}")]
    StartDateConflict {
        kind: StartDateShiftKind,
        conflicts: Vec<Uuid>,
    },
    #[error("Invalid operation: {0}")]
    InvalidOperation(String),
    #[error("Validation failed: {0}")]
    Validation(String),
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<MonthError> for CoreError {
    fn from(err: MonthError) -> Self {
        match err {
            MonthError::OutOfRange { year, month } => CoreError::InvalidMonth { year, month },
            other => CoreError::InvalidDate(other.to_string()),
        }
    }
}
