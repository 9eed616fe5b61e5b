//! Pipeline Error Types
//!
//! Each variant names the cycle step that failed. Only [`ErrorKind::Discovery`]
//! changes the reported outcome of a cycle; everything else is logged and the
//! cycle carries on.

use derive_more::{Display, Error};

/// A pipeline error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for pipeline operations.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    /// The day's keys could not be listed.
    #[display("discovery failed")]
    Discovery,
    /// A discovered key could not be decoded or escapes the store root.
    #[display("invalid key: {_0}")]
    InvalidKey(#[error(not(source))] String),
    /// Copying or replacing an object failed.
    #[display("migration failed")]
    Migration,
    /// The copied object could not be converted; the copy stays in place.
    #[display("conversion failed")]
    Conversion,
    /// A folder could not be renumbered.
    #[display("renumbering {_0} failed")]
    Renumber(#[error(not(source))] String),
    /// The folder index could not be updated.
    #[display("index reconciliation failed")]
    Reconcile,
    /// Cache invalidation was not accepted.
    #[display("invalidation failed")]
    Invalidation,
    /// The completion marker could not be written.
    #[display("marker write failed")]
    Marker,
}
