//! Error taxonomy for store, intake and matching failures.
//!
//! A no-match pass is not an error; it is the engine's normal empty
//! result and surfaces as `Ok(None)`.

use thiserror::Error;

use crate::order::RejectReason;

/// Failures of the persistent store
#[derive(Debug, Error)]
pub enum StoreError {
    /// Underlying database failure
    #[error("database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// An order with this ID is already resident
    #[error("order {0} already exists")]
    DuplicateOrder(u64),

    /// Mutation targeted an order that is not resident
    #[error("order {0} not found")]
    OrderNotFound(u64),

    /// A stored field could not be parsed back into its model type
    #[error("corrupt {field} in stored record: {value:?}")]
    CorruptRecord {
        field: &'static str,
        value: String,
    },
}

/// Failures of order intake
#[derive(Debug, Error)]
pub enum IntakeError {
    /// Rejected before persistence; the order never reaches the book
    #[error("order rejected: {0}")]
    Rejected(RejectReason),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Failures of a matching pass
#[derive(Debug, Error)]
pub enum MatchError {
    #[error(transparent)]
    Store(#[from] StoreError),
}
