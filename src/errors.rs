use chrono::NaiveDate;
use thiserror::Error;
use uuid::Uuid;

/// Failures raised at the storage, import, and configuration boundaries.
///
/// The accounting functions in [`crate::ledger`] are total and never return
/// this type; it only appears once values cross into or out of a store.
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("Invalid import payload: {0}")]
    InvalidPayload(String),
    #[error("Invalid date: {0}")]
    InvalidDate(String),
    #[error("Unknown timezone: {0}")]
    InvalidTimezone(String),
    #[error("Unknown meal type: {0}")]
    InvalidMealType(String),
    #[error("Meal not found: {0}")]
    MealNotFound(Uuid),
    #[error("{day} already holds {limit} meals")]
    DayFull { day: NaiveDate, limit: usize },
    #[error("Cycle starting {0} has already been banked")]
    CycleAlreadyBanked(NaiveDate),
    #[error("Borrow for the cycle starting {0} was already applied")]
    BorrowAlreadyApplied(NaiveDate),
    #[error("Persistence error: {0}")]
    Storage(String),
    #[error("Configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, LedgerError>;
