//! HEIF decoding seam.
//!
//! HEIC files are decoded by an external library into a raw, interleaved
//! pixel buffer; the converter then rebuilds a raster from that buffer using
//! the declared [`ColorMode`] and dimensions. The decoder itself sits behind
//! [`HeifReader`] so builds without libheif still link, and so tests can
//! hand the converter a synthetic buffer.

use crate::error::{ErrorKind, Result};

/// Pixel layout of a decoded HEIF buffer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ColorMode {
    /// 8-bit greyscale
    L,
    /// 8-bit interleaved RGB
    Rgb,
    /// 8-bit interleaved RGB with alpha
    Rgba,
}
impl ColorMode {
    pub fn channels(&self) -> usize {
        match self {
            ColorMode::L => 1,
            ColorMode::Rgb => 3,
            ColorMode::Rgba => 4,
        }
    }
}

/// A decoded HEIF primary image, rows packed without padding.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HeifImage {
    pub mode: ColorMode,
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
}

/// Decodes HEIF/HEIC bytes into a raw pixel buffer.
pub trait HeifReader: Send + Sync {
    fn read(&self, data: &[u8]) -> Result<HeifImage>;
}

/// Reader used when the `heic` feature is off: every HEIC is a failure.
#[derive(Clone, Copy, Debug, Default)]
pub struct UnavailableHeifReader;
impl HeifReader for UnavailableHeifReader {
    fn read(&self, _data: &[u8]) -> Result<HeifImage> {
        exn::bail!(ErrorKind::HeicDisabled)
    }
}

#[cfg(feature = "heic")]
pub use self::libheif::LibheifReader;

#[cfg(feature = "heic")]
mod libheif {
    use super::{ColorMode, HeifImage, HeifReader};
    use crate::error::{ErrorKind, Result};
    use exn::{OptionExt, ResultExt};
    use libheif_rs::{ColorSpace, HeifContext, LibHeif, RgbChroma};

    /// [`HeifReader`] backed by the system libheif.
    #[derive(Clone, Copy, Debug, Default)]
    pub struct LibheifReader;

    impl HeifReader for LibheifReader {
        fn read(&self, data: &[u8]) -> Result<HeifImage> {
            let lib = LibHeif::new();
            let context = HeifContext::read_from_bytes(data).or_raise(|| ErrorKind::Decode)?;
            let handle = context.primary_image_handle().or_raise(|| ErrorKind::Decode)?;
            let (mode, chroma) = match handle.has_alpha_channel() {
                true => (ColorMode::Rgba, RgbChroma::Rgba),
                false => (ColorMode::Rgb, RgbChroma::Rgb),
            };
            let image = lib.decode(&handle, ColorSpace::Rgb(chroma), None).or_raise(|| ErrorKind::Decode)?;
            let planes = image.planes();
            let plane = planes.interleaved.ok_or_raise(|| ErrorKind::Decode)?;
            // Rows may be padded out to `stride`; repack them tightly.
            let row = plane.width as usize * mode.channels();
            let mut packed = Vec::with_capacity(row * plane.height as usize);
            for y in 0..plane.height as usize {
                let start = y * plane.stride;
                let pixels = plane.data.get(start..start + row).ok_or_raise(|| ErrorKind::Decode)?;
                packed.extend_from_slice(pixels);
            }
            Ok(HeifImage {
                mode,
                width: plane.width,
                height: plane.height,
                data: packed,
            })
        }
    }
}
