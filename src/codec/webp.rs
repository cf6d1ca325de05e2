//! WebP codec backed by libwebp.

use webp::{Decoder, Encoder, WebPConfig};

use super::Codec;
use crate::error::{Error, Result};
use crate::image::ImageData;
use crate::params::ParameterSet;

use imgref::ImgVec;
use rgb::{RGB8, RGBA8};

/// Lossy WebP encoder with configurable method and quality.
pub struct WebpCodec {
    version: String,
}

impl WebpCodec {
    pub fn new() -> Self {
        Self {
            version: encoder_version(),
        }
    }
}

/// Version of the linked libwebp encoder as `major.minor.revision`.
#[allow(unsafe_code)]
fn encoder_version() -> String {
    // SAFETY: takes no arguments and only reads a compile-time constant.
    let packed = unsafe { libwebp_sys::WebPGetEncoderVersion() };
    format!(
        "{}.{}.{}",
        (packed >> 16) & 0xff,
        (packed >> 8) & 0xff,
        packed & 0xff
    )
}

impl Default for WebpCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl Codec for WebpCodec {
    fn id(&self) -> &str {
        "webp"
    }

    fn version(&self) -> &str {
        &self.version
    }

    fn extension(&self) -> &str {
        "webp"
    }

    fn encode(&self, image: &ImageData, params: &ParameterSet) -> Result<Vec<u8>> {
        let codec_error = |message: String| Error::Encode {
            params: params.id(),
            message,
        };

        let init_failed = || codec_error("failed to initialise WebPConfig".to_string());
        let mut config = WebPConfig::new().map_err(|()| init_failed())?;
        config.lossless = 0;
        config.quality = f32::from(params.quality());
        config.method = i32::from(params.method());

        let width = image.width() as u32;
        let height = image.height() as u32;

        // The encoder borrows the pixel buffer, so keep it alive here.
        let pixels = if image.has_alpha() {
            image.to_rgba8_vec()
        } else {
            image.to_rgb8_vec()
        };
        let encoder = if image.has_alpha() {
            Encoder::from_rgba(&pixels, width, height)
        } else {
            Encoder::from_rgb(&pixels, width, height)
        };

        let encoded = encoder
            .encode_advanced(&config)
            .map_err(|e| codec_error(format!("{e:?}")))?;

        Ok(encoded.to_vec())
    }

    fn decode(&self, data: &[u8]) -> Result<ImageData> {
        let decoded = Decoder::new(data).decode();
        let decoded = decoded.ok_or_else(|| Error::Decode {
            codec: "webp".to_string(),
            message: "failed to decode WebP artifact".to_string(),
        })?;

        let width = decoded.width() as usize;
        let height = decoded.height() as usize;

        Ok(if decoded.is_alpha() {
            let pixels = decoded
                .chunks_exact(4)
                .map(|p| RGBA8::new(p[0], p[1], p[2], p[3]))
                .collect();
            ImageData::Rgba8(ImgVec::new(pixels, width, height))
        } else {
            let pixels = decoded
                .chunks_exact(3)
                .map(|p| RGB8::new(p[0], p[1], p[2]))
                .collect();
            ImageData::Rgb8(ImgVec::new(pixels, width, height))
        })
    }
}
