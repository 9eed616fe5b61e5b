//! CDN Error Types

use derive_more::{Display, Error};

pub type Error = exn::Exn<ErrorKind>;
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    /// The invalidation request could not be built.
    #[display("invalid invalidation request")]
    Request,
    /// The CDN rejected the invalidation.
    #[display("invalidation of distribution {_0} failed")]
    Rejected(#[error(not(source))] String),
    /// Network-related error (timeouts, dispatch failures)
    #[display("network error: {_0}")]
    Network(#[error(not(source))] String),
}
