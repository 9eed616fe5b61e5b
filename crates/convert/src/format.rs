use crate::{DEFAULT_QUALITY, LOWER_CASE_SUFFIX, TIFF_QUALITY};
use std::path::{Path, PathBuf};

/// Extensions treated as video. Videos are never converted.
pub const VIDEO_EXTENSIONS: [&str; 6] = ["mp4", "mov", "avi", "mkv", "webm", "wmv"];

/// Raster formats that only need an RGB re-encode and a rename.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RasterFormat {
    /// `.jpeg`
    Jpeg,
    /// `.png`
    Png,
    /// `.bmp`
    Bmp,
}

/// Processing branch for an object, decided by its extension.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Format {
    /// One of [`VIDEO_EXTENSIONS`].
    Video,
    /// `.tif` / `.tiff`
    Tiff,
    /// `.heic`
    Heic,
    /// `.jpg`: already a JPEG with the canonical extension.
    LowerJpeg,
    Raster(RasterFormat),
    /// Anything else, carrying the lowercased extension (empty if none).
    Unsupported(String),
}

impl Format {
    /// Detect the processing branch from a key's extension.
    #[must_use]
    pub fn from_path(path: impl AsRef<Path>) -> Self {
        let ext = path
            .as_ref()
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_lowercase())
            .unwrap_or_default();
        match ext.as_str() {
            video if VIDEO_EXTENSIONS.contains(&video) => Format::Video,
            "tif" | "tiff" => Format::Tiff,
            "heic" => Format::Heic,
            "jpg" => Format::LowerJpeg,
            "jpeg" => Format::Raster(RasterFormat::Jpeg),
            "png" => Format::Raster(RasterFormat::Png),
            "bmp" => Format::Raster(RasterFormat::Bmp),
            _ => Format::Unsupported(ext),
        }
    }

    #[must_use]
    pub fn is_video(&self) -> bool {
        matches!(self, Format::Video)
    }

    /// JPEG quality the output is encoded with.
    #[must_use]
    pub fn quality(&self) -> u8 {
        match self {
            Format::Tiff => TIFF_QUALITY,
            _ => DEFAULT_QUALITY,
        }
    }

    /// Key the converted object is stored under, in the same folder as the
    /// source. `None` for formats that are never converted.
    #[must_use]
    pub fn target(&self, path: impl AsRef<Path>) -> Option<PathBuf> {
        let path = path.as_ref();
        let stem = path.file_stem()?.to_string_lossy();
        let file_name = match self {
            Format::Video | Format::Unsupported(_) => return None,
            // FIXME: this always yields a new key, so a `.jpg` that is
            //        discovered again gets another suffix. Kept as-is because
            //        published keys depend on it.
            Format::LowerJpeg => format!("{stem}{LOWER_CASE_SUFFIX}.jpg"),
            Format::Tiff | Format::Heic | Format::Raster(_) => format!("{stem}.jpg"),
        };
        Some(path.with_file_name(file_name))
    }
}
