// Copyright (c) 2025 Steven Rosenthal smr@dt3.org
// See LICENSE file in root directory for license terms.

use std::fs;
use std::io::Cursor;
use std::path::Path;
use std::time::Instant;

use image::{ImageFormat, RgbImage};
use log::info;

use crate::error::{Result, RgbError};

/// File formats a composite can be written as.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum OutputFormat {
    Png,
    Tiff,
}

impl OutputFormat {
    /// Determines the format from the extension of `path` (png, tiff or tif,
    /// in any case).
    pub fn from_path(path: &Path) -> Result<OutputFormat> {
        let extension = path.extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());
        match extension.as_deref() {
            Some("png") => Ok(OutputFormat::Png),
            Some("tiff") | Some("tif") => Ok(OutputFormat::Tiff),
            _ => Err(RgbError::UnsupportedFormat(path.display().to_string())),
        }
    }

    fn image_format(&self) -> ImageFormat {
        match self {
            OutputFormat::Png => ImageFormat::Png,
            OutputFormat::Tiff => ImageFormat::Tiff,
        }
    }
}

/// Encodes `image` in memory.
pub fn encode_composite(image: &RgbImage, format: OutputFormat)
                        -> Result<Vec<u8>> {
    let mut bytes = Vec::<u8>::new();
    image.write_to(&mut Cursor::new(&mut bytes), format.image_format())?;
    Ok(bytes)
}

/// Writes `image` to `path`, choosing the format from the path's extension.
/// The image is fully encoded before the file is created, so an unrecognised
/// extension or an encoding failure leaves nothing on disk.
pub fn write_composite(image: &RgbImage, path: &Path) -> Result<()> {
    let write_start = Instant::now();
    let format = OutputFormat::from_path(path)?;
    let bytes = encode_composite(image, format)?;
    fs::write(path, &bytes)?;
    info!("Wrote {:?} ({} bytes) in {:?}",
          path, bytes.len(), write_start.elapsed());
    Ok(())
}

#[cfg(test)]
mod tests {
    use image::{ImageReader, Rgb};
    use super::*;

    fn test_image() -> RgbImage {
        let mut image = RgbImage::new(5, 4);
        image.put_pixel(1, 2, Rgb([255, 128, 7]));
        image
    }

    #[test]
    fn test_format_from_path() {
        assert_eq!(OutputFormat::from_path(Path::new("rgb.png")).unwrap(),
                   OutputFormat::Png);
        assert_eq!(OutputFormat::from_path(Path::new("a/b/rgb.TIFF")).unwrap(),
                   OutputFormat::Tiff);
        assert_eq!(OutputFormat::from_path(Path::new("rgb.tif")).unwrap(),
                   OutputFormat::Tiff);
        for bad in ["rgb.unknown", "rgb", "png", "rgb.png.bak"] {
            assert!(matches!(OutputFormat::from_path(Path::new(bad)),
                             Err(RgbError::UnsupportedFormat(_))));
        }
    }

    #[test]
    fn test_write_and_read_back() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["rgb.png", "rgb.tiff"] {
            let path = dir.path().join(name);
            write_composite(&test_image(), &path).unwrap();
            let decoded = ImageReader::open(&path).unwrap().decode().unwrap()
                .into_rgb8();
            assert_eq!(decoded, test_image());
        }
    }

    #[test]
    fn test_unsupported_format_leaves_no_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rgb.unknown");
        let result = write_composite(&test_image(), &path);
        assert!(matches!(result, Err(RgbError::UnsupportedFormat(_))));
        assert!(!path.exists());
    }

    #[test]
    fn test_encode_composite_signatures() {
        let png = encode_composite(&test_image(), OutputFormat::Png).unwrap();
        assert_eq!(&png[..8], b"\x89PNG\r\n\x1a\n");
        let tiff = encode_composite(&test_image(), OutputFormat::Tiff).unwrap();
        assert!(&tiff[..4] == b"II*\0" || &tiff[..4] == b"MM\0*");
    }
}
