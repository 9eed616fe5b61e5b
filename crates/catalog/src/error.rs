//! Catalog Error Types
//!
//! Structured errors using `exn` for automatic location tracking and error
//! tree construction.

use derive_more::{Display, Error};

/// A catalog error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for catalog operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// These describe what the caller should *do*, not what went wrong internally.
#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    /// The discovery query failed.
    #[display("failed to query table {_0}")]
    Query(#[error(not(source))] String),
    /// The marker could not be written.
    #[display("failed to write to table {_0}")]
    Write(#[error(not(source))] String),
    /// Network-related error (timeouts, dispatch failures)
    #[display("network error: {_0}")]
    Network(#[error(not(source))] String),
    /// A stored `place` is not valid percent-encoded UTF-8.
    #[display("undecodable place: {_0}")]
    InvalidPlace(#[error(not(source))] String),
    /// Timestamp or date could not be formatted.
    #[display("invalid timestamp")]
    Timestamp,
}
