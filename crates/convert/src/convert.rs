use crate::error::{ErrorKind, Result};
use crate::format::Format;
use crate::heif::{ColorMode, HeifImage, HeifReader, UnavailableHeifReader};
use exn::{OptionExt, ResultExt};
use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, ExtendedColorType, ImageBuffer};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Outcome of running one object through the [`Converter`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Conversion {
    /// Normalized JPEG bytes, to be stored under `key`.
    Converted { key: PathBuf, data: Vec<u8> },
    /// Video: intentionally left alone.
    Skipped,
}

/// Normalizes images to RGB JPEG.
///
/// Cheap to clone; the HEIF reader is shared.
///
/// # Examples
///
/// ```
/// use photoferry_convert::{Conversion, Converter};
/// use std::path::Path;
///
/// let converter = Converter::default();
/// let outcome = converter.convert(Path::new("trip/clip.mp4"), b"not decoded").unwrap();
/// assert_eq!(outcome, Conversion::Skipped);
/// ```
#[derive(Clone)]
pub struct Converter {
    heif: Arc<dyn HeifReader>,
}

impl Default for Converter {
    #[cfg(feature = "heic")]
    fn default() -> Self {
        Self::with_heif_reader(crate::heif::LibheifReader)
    }

    #[cfg(not(feature = "heic"))]
    fn default() -> Self {
        Self::with_heif_reader(UnavailableHeifReader)
    }
}

impl Converter {
    pub fn with_heif_reader(reader: impl HeifReader + 'static) -> Self {
        Self { heif: Arc::new(reader) }
    }

    /// A converter that refuses HEIC input regardless of enabled features.
    pub fn without_heif() -> Self {
        Self::with_heif_reader(UnavailableHeifReader)
    }

    /// Convert the object stored under `key`.
    ///
    /// The branch is chosen from `key`'s extension (see [`Format`]); `data`
    /// is sniffed for its real format when decoding, so a mislabelled PNG
    /// saved as `.bmp` still converts.
    ///
    /// # Errors
    /// - [`UnsupportedFormat`](ErrorKind::UnsupportedFormat) for extensions
    ///   that are neither images nor videos.
    /// - [`Decode`](ErrorKind::Decode) / [`HeicDisabled`](ErrorKind::HeicDisabled)
    ///   when the bytes can't be read.
    /// - [`Encode`](ErrorKind::Encode) when the JPEG can't be written.
    pub fn convert(&self, key: &Path, data: &[u8]) -> Result<Conversion> {
        let format = Format::from_path(key);
        let image = match &format {
            Format::Video => return Ok(Conversion::Skipped),
            Format::Unsupported(ext) => exn::bail!(ErrorKind::UnsupportedFormat(ext.clone())),
            Format::Heic => from_heif(self.heif.read(data)?)?,
            Format::Tiff | Format::LowerJpeg | Format::Raster(_) => {
                image::load_from_memory(data).or_raise(|| ErrorKind::Decode)?
            },
        };
        let target = format.target(key).ok_or_raise(|| ErrorKind::UnsupportedFormat(key.display().to_string()))?;
        let data = encode_jpeg(&image, format.quality())?;
        Ok(Conversion::Converted { key: target, data })
    }
}

/// Rebuild a raster from a decoded HEIF buffer.
fn from_heif(heif: HeifImage) -> Result<DynamicImage> {
    let HeifImage { mode, width, height, data } = heif;
    let expected = (width as usize) * (height as usize) * mode.channels();
    if data.len() != expected {
        exn::bail!(ErrorKind::Decode);
    }
    let image = match mode {
        ColorMode::L => ImageBuffer::from_raw(width, height, data).map(DynamicImage::ImageLuma8),
        ColorMode::Rgb => ImageBuffer::from_raw(width, height, data).map(DynamicImage::ImageRgb8),
        ColorMode::Rgba => ImageBuffer::from_raw(width, height, data).map(DynamicImage::ImageRgba8),
    };
    image.ok_or_raise(|| ErrorKind::Decode)
}

/// Encode as baseline JPEG, forcing 8-bit RGB whatever the source mode.
fn encode_jpeg(image: &DynamicImage, quality: u8) -> Result<Vec<u8>> {
    let rgb = image.to_rgb8();
    let mut out = Vec::new();
    JpegEncoder::new_with_quality(&mut out, quality)
        .encode(rgb.as_raw(), rgb.width(), rgb.height(), ExtendedColorType::Rgb8)
        .or_raise(|| ErrorKind::Encode)?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ColorType, GrayImage, ImageFormat, Rgb, RgbImage, Rgba, RgbaImage};
    use rstest::rstest;
    use std::io::Cursor;

    struct FakeHeifReader(HeifImage);
    impl HeifReader for FakeHeifReader {
        fn read(&self, _data: &[u8]) -> Result<HeifImage> {
            Ok(self.0.clone())
        }
    }

    fn encoded(image: DynamicImage, format: ImageFormat) -> Vec<u8> {
        let mut out = Cursor::new(Vec::new());
        image.write_to(&mut out, format).unwrap();
        out.into_inner()
    }

    fn rgb() -> DynamicImage {
        DynamicImage::ImageRgb8(RgbImage::from_pixel(4, 3, Rgb([200, 40, 10])))
    }

    fn converted(outcome: Conversion) -> (PathBuf, DynamicImage) {
        match outcome {
            Conversion::Converted { key, data } => {
                let decoded = image::load_from_memory_with_format(&data, ImageFormat::Jpeg).unwrap();
                (key, decoded)
            },
            Conversion::Skipped => panic!("expected a conversion"),
        }
    }

    #[rstest]
    #[case("trip/scan.tiff", ImageFormat::Tiff, "trip/scan.jpg")]
    #[case("trip/scan.TIF", ImageFormat::Tiff, "trip/scan.jpg")]
    #[case("trip/1.jpg", ImageFormat::Jpeg, "trip/1_lower_case.jpg")]
    #[case("trip/1.jpeg", ImageFormat::Jpeg, "trip/1.jpg")]
    #[case("trip/1.png", ImageFormat::Png, "trip/1.jpg")]
    #[case("trip/1.bmp", ImageFormat::Bmp, "trip/1.jpg")]
    fn test_converts_to_rgb_jpeg(#[case] key: &str, #[case] format: ImageFormat, #[case] expected: &str) {
        let outcome = Converter::without_heif().convert(Path::new(key), &encoded(rgb(), format)).unwrap();
        let (key, image) = converted(outcome);
        assert_eq!(key, Path::new(expected));
        assert_eq!(image.color(), ColorType::Rgb8);
        assert_eq!((image.width(), image.height()), (4, 3));
    }

    #[test]
    fn test_rgba_png_forced_to_rgb() {
        let rgba = DynamicImage::ImageRgba8(RgbaImage::from_pixel(2, 2, Rgba([0, 0, 255, 128])));
        let outcome = Converter::without_heif().convert(Path::new("a/2.png"), &encoded(rgba, ImageFormat::Png)).unwrap();
        let (key, image) = converted(outcome);
        assert_eq!(key, Path::new("a/2.jpg"));
        assert_eq!(image.color(), ColorType::Rgb8);
    }

    #[test]
    fn test_greyscale_forced_to_rgb() {
        let grey = DynamicImage::ImageLuma8(GrayImage::from_pixel(3, 3, image::Luma([90])));
        let outcome = Converter::without_heif().convert(Path::new("a/2.png"), &encoded(grey, ImageFormat::Png)).unwrap();
        assert_eq!(converted(outcome).1.color(), ColorType::Rgb8);
    }

    #[rstest]
    #[case("trip/clip.mp4")]
    #[case("trip/clip.MOV")]
    #[case("trip/clip.webm")]
    fn test_video_skipped(#[case] key: &str) {
        assert_eq!(Converter::without_heif().convert(Path::new(key), b"\x00\x00\x00\x18ftypmp42").unwrap(), Conversion::Skipped);
    }

    #[test]
    fn test_unsupported_format() {
        let err = Converter::without_heif().convert(Path::new("trip/anim.gif"), b"GIF89a").unwrap_err();
        assert_eq!(*err, ErrorKind::UnsupportedFormat("gif".to_string()));
    }

    #[test]
    fn test_corrupt_data() {
        let err = Converter::without_heif().convert(Path::new("trip/1.png"), b"definitely not a png").unwrap_err();
        assert_eq!(*err, ErrorKind::Decode);
    }

    #[test]
    fn test_heic_rebuilt_from_raw_buffer() {
        let reader = FakeHeifReader(HeifImage {
            mode: ColorMode::Rgb,
            width: 2,
            height: 2,
            data: vec![255, 0, 0, 0, 255, 0, 0, 0, 255, 255, 255, 255],
        });
        let outcome = Converter::with_heif_reader(reader).convert(Path::new("a/1.HEIC"), b"ftypheic").unwrap();
        let (key, image) = converted(outcome);
        assert_eq!(key, Path::new("a/1.jpg"));
        assert_eq!(image.color(), ColorType::Rgb8);
        assert_eq!((image.width(), image.height()), (2, 2));
    }

    #[test]
    fn test_heic_with_alpha() {
        let reader = FakeHeifReader(HeifImage {
            mode: ColorMode::Rgba,
            width: 1,
            height: 2,
            data: vec![10, 20, 30, 255, 40, 50, 60, 0],
        });
        let outcome = Converter::with_heif_reader(reader).convert(Path::new("a/1.heic"), b"ftypheic").unwrap();
        assert_eq!(converted(outcome).1.color(), ColorType::Rgb8);
    }

    #[rstest]
    #[case(ColorMode::Rgb, 5)]
    #[case(ColorMode::Rgb, 49)]
    #[case(ColorMode::L, 48)]
    fn test_heic_buffer_size_mismatch(#[case] mode: ColorMode, #[case] len: usize) {
        let reader = FakeHeifReader(HeifImage {
            mode,
            width: 4,
            height: 4,
            data: vec![0; len],
        });
        let err = Converter::with_heif_reader(reader).convert(Path::new("a/1.heic"), b"ftypheic").unwrap_err();
        assert_eq!(*err, ErrorKind::Decode);
    }

    #[test]
    fn test_heic_without_reader() {
        let err = Converter::without_heif().convert(Path::new("a/1.heic"), b"ftypheic").unwrap_err();
        assert_eq!(*err, ErrorKind::HeicDisabled);
    }

    #[test]
    fn test_tiff_then_jpg_adds_one_suffix() {
        let converter = Converter::without_heif();
        let (first, _) = converted(converter.convert(Path::new("trip/scan.tiff"), &encoded(rgb(), ImageFormat::Tiff)).unwrap());
        assert_eq!(first, Path::new("trip/scan.jpg"));
        let Conversion::Converted { data, .. } =
            converter.convert(Path::new("trip/scan.tiff"), &encoded(rgb(), ImageFormat::Tiff)).unwrap()
        else {
            panic!("expected a conversion");
        };
        let (second, image) = converted(converter.convert(&first, &data).unwrap());
        assert_eq!(second, Path::new("trip/scan_lower_case.jpg"));
        assert_eq!(image.color(), ColorType::Rgb8);
    }
}
