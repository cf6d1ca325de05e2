//! In-memory pixel buffers shared by codecs and metrics.

use imgref::ImgVec;
use rgb::{RGB8, RGBA8};

/// Decoded pixel data.
///
/// Codecs accept and return this type; the fidelity metric reduces it to a
/// luminance plane with [`ImageData::to_luma`].
#[derive(Debug, Clone, PartialEq)]
pub enum ImageData {
    /// Single-channel 8-bit image.
    Gray8(ImgVec<u8>),

    /// RGB8 image.
    Rgb8(ImgVec<RGB8>),

    /// RGBA8 image.
    Rgba8(ImgVec<RGBA8>),
}

impl ImageData {
    /// Get image width.
    #[must_use]
    pub fn width(&self) -> usize {
        match self {
            Self::Gray8(img) => img.width(),
            Self::Rgb8(img) => img.width(),
            Self::Rgba8(img) => img.width(),
        }
    }

    /// Get image height.
    #[must_use]
    pub fn height(&self) -> usize {
        match self {
            Self::Gray8(img) => img.height(),
            Self::Rgb8(img) => img.height(),
            Self::Rgba8(img) => img.height(),
        }
    }

    /// Dimensions as (width, height).
    #[must_use]
    pub fn dimensions(&self) -> (usize, usize) {
        (self.width(), self.height())
    }

    /// Whether the buffer carries an alpha channel.
    #[must_use]
    pub fn has_alpha(&self) -> bool {
        matches!(self, Self::Rgba8(_))
    }

    /// Convert to a packed RGB8 byte vector (alpha dropped, gray replicated).
    #[must_use]
    pub fn to_rgb8_vec(&self) -> Vec<u8> {
        match self {
            Self::Gray8(img) => img.pixels().flat_map(|g| [g, g, g]).collect(),
            Self::Rgb8(img) => img.pixels().flat_map(|p| [p.r, p.g, p.b]).collect(),
            Self::Rgba8(img) => img.pixels().flat_map(|p| [p.r, p.g, p.b]).collect(),
        }
    }

    /// Convert to a packed RGBA8 byte vector (opaque alpha when absent).
    #[must_use]
    pub fn to_rgba8_vec(&self) -> Vec<u8> {
        match self {
            Self::Gray8(img) => img.pixels().flat_map(|g| [g, g, g, 255]).collect(),
            Self::Rgb8(img) => img.pixels().flat_map(|p| [p.r, p.g, p.b, 255]).collect(),
            Self::Rgba8(img) => img.pixels().flat_map(|p| [p.r, p.g, p.b, p.a]).collect(),
        }
    }

    /// Single-channel luminance plane.
    ///
    /// Uses ITU-R 601-2 weights in 16-bit fixed point; alpha is ignored.
    #[must_use]
    pub fn to_luma(&self) -> ImgVec<u8> {
        let (width, height) = self.dimensions();
        let buf: Vec<u8> = match self {
            Self::Gray8(img) => img.pixels().collect(),
            Self::Rgb8(img) => img.pixels().map(|p| luma(p.r, p.g, p.b)).collect(),
            Self::Rgba8(img) => img.pixels().map(|p| luma(p.r, p.g, p.b)).collect(),
        };
        ImgVec::new(buf, width, height)
    }
}

#[inline]
fn luma(r: u8, g: u8, b: u8) -> u8 {
    let y = u32::from(r) * 19595 + u32::from(g) * 38470 + u32::from(b) * 7471 + 0x8000;
    (y >> 16) as u8
}
