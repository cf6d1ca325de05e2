//! Source image loading.
//!
//! The source raster is decoded once per sweep and kept immutable for its
//! duration. Any failure to open or decode it is reported as
//! [`Error::FileAccess`], which is fatal to the whole sweep.

use std::fmt;
use std::path::{Path, PathBuf};

use image::{ColorType, DynamicImage, ImageReader};
use imgref::ImgVec;
use rgb::{RGB8, RGBA8};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::image::ImageData;

/// Color model of the source as stored on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ColorModel {
    /// Grayscale.
    Luma,
    /// Grayscale with alpha.
    LumaAlpha,
    /// RGB.
    Rgb,
    /// RGB with alpha.
    Rgba,
    /// Anything the decoder reports that is not listed above.
    Other,
}

impl From<ColorType> for ColorModel {
    fn from(color: ColorType) -> Self {
        match color {
            ColorType::L8 | ColorType::L16 => Self::Luma,
            ColorType::La8 | ColorType::La16 => Self::LumaAlpha,
            ColorType::Rgb8 | ColorType::Rgb16 | ColorType::Rgb32F => Self::Rgb,
            ColorType::Rgba8 | ColorType::Rgba16 | ColorType::Rgba32F => Self::Rgba,
            _ => Self::Other,
        }
    }
}

impl fmt::Display for ColorModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Luma => write!(f, "L"),
            Self::LumaAlpha => write!(f, "LA"),
            Self::Rgb => write!(f, "RGB"),
            Self::Rgba => write!(f, "RGBA"),
            Self::Other => write!(f, "other"),
        }
    }
}

/// Descriptive metadata of a source image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceInfo {
    /// Path the image was loaded from.
    pub path: PathBuf,
    /// Width in pixels.
    pub width: usize,
    /// Height in pixels.
    pub height: usize,
    /// Color model on disk.
    pub color_model: ColorModel,
    /// File size in bytes.
    pub byte_size: u64,
}

/// A decoded source raster plus its metadata.
#[derive(Debug, Clone)]
pub struct SourceImage {
    info: SourceInfo,
    pixels: ImageData,
}

impl SourceImage {
    /// Build a source from already-decoded pixels.
    #[must_use]
    pub fn from_pixels(
        path: impl Into<PathBuf>,
        pixels: ImageData,
        color_model: ColorModel,
        byte_size: u64,
    ) -> Self {
        let (width, height) = pixels.dimensions();
        Self {
            info: SourceInfo {
                path: path.into(),
                width,
                height,
                color_model,
                byte_size,
            },
            pixels,
        }
    }

    /// Metadata.
    #[must_use]
    pub fn info(&self) -> &SourceInfo {
        &self.info
    }

    /// Source path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.info.path
    }

    /// Dimensions as (width, height).
    #[must_use]
    pub fn dimensions(&self) -> (usize, usize) {
        (self.info.width, self.info.height)
    }

    /// Decoded pixels.
    #[must_use]
    pub fn pixels(&self) -> &ImageData {
        &self.pixels
    }
}

/// Open and decode a source image.
pub fn load_source(path: &Path) -> Result<SourceImage> {
    let file_access = |reason: String| Error::FileAccess {
        path: path.to_path_buf(),
        reason,
    };

    let byte_size = std::fs::metadata(path)
        .map_err(|e| file_access(e.to_string()))?
        .len();

    let decoded = ImageReader::open(path)
        .map_err(|e| file_access(e.to_string()))?
        .with_guessed_format()
        .map_err(|e| file_access(e.to_string()))?
        .decode()
        .map_err(|e| file_access(e.to_string()))?;

    let color_model = ColorModel::from(decoded.color());
    Ok(SourceImage::from_pixels(
        path,
        to_image_data(decoded),
        color_model,
        byte_size,
    ))
}

/// Convert a decoded `image` buffer to [`ImageData`], narrowing to 8 bits.
pub(crate) fn to_image_data(decoded: DynamicImage) -> ImageData {
    let width = decoded.width() as usize;
    let height = decoded.height() as usize;

    if decoded.color().has_alpha() {
        let pixels = decoded
            .into_rgba8()
            .pixels()
            .map(|p| RGBA8::new(p[0], p[1], p[2], p[3]))
            .collect();
        ImageData::Rgba8(ImgVec::new(pixels, width, height))
    } else if !decoded.color().has_color() {
        ImageData::Gray8(ImgVec::new(decoded.into_luma8().into_raw(), width, height))
    } else {
        let pixels = decoded
            .into_rgb8()
            .pixels()
            .map(|p| RGB8::new(p[0], p[1], p[2]))
            .collect();
        ImageData::Rgb8(ImgVec::new(pixels, width, height))
    }
}
