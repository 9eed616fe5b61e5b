//! Image normalization for staged uploads.
//!
//! Every image the pipeline publishes ends up as an 8-bit RGB JPEG with a
//! `.jpg` extension. This crate decides, from a key's extension alone, what
//! has to happen to get there ([`Format`]), and then does it
//! ([`Converter::convert`]):
//!
//! | Extension                 | Action                                      | Output key              |
//! |---------------------------|---------------------------------------------|-------------------------|
//! | video (`mp4`, `mov`, ...) | skipped, never converted                    | -                       |
//! | `tif`, `tiff`             | decode, RGB, JPEG at quality 95             | `<stem>.jpg`            |
//! | `heic`                    | decode via [`HeifReader`], JPEG at 75       | `<stem>.jpg`            |
//! | `jpg`                     | re-encode, JPEG at 75                       | `<stem>_lower_case.jpg` |
//! | `jpeg`, `png`, `bmp`      | decode, RGB, JPEG at 75                     | `<stem>.jpg`            |
//! | anything else             | [`UnsupportedFormat`](error::ErrorKind::UnsupportedFormat) | -        |
//!
//! Extensions are matched case-insensitively.

mod convert;
pub mod error;
mod format;
mod heif;

pub use crate::convert::{Conversion, Converter};
pub use crate::format::{Format, RasterFormat, VIDEO_EXTENSIONS};
#[cfg(feature = "heic")]
pub use crate::heif::LibheifReader;
pub use crate::heif::{ColorMode, HeifImage, HeifReader, UnavailableHeifReader};

/// JPEG quality used for TIFF sources.
pub const TIFF_QUALITY: u8 = 95;
/// JPEG quality used when no explicit quality is asked for.
pub const DEFAULT_QUALITY: u8 = 75;
/// Suffix marking a `.jpg` that has already been through the converter.
pub const LOWER_CASE_SUFFIX: &str = "_lower_case";
