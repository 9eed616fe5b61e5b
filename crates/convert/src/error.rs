//! Conversion Error Types
//!
//! Structured errors using `exn` for automatic location tracking and error
//! tree construction.

use derive_more::{Display, Error};

/// A conversion error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for conversion operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// These describe what the caller should *do*, not what went wrong internally.
#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// Data is corrupt, truncated or not the format its extension claims.
    /// Don't retry with the same input.
    #[display("invalid or corrupted image data")]
    Decode,
    /// The decoded image could not be written out as JPEG.
    #[display("failed to encode JPEG")]
    Encode,
    /// The extension is neither a known image format nor a video.
    #[display("unsupported format: {_0}")]
    UnsupportedFormat(#[error(not(source))] String),
    /// HEIC input, but this build has no HEIF decoder.
    #[display("HEIC support is not enabled")]
    HeicDisabled,
}
