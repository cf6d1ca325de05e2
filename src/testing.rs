//! Deterministic codecs and fixtures for unit tests.

use std::cell::{Cell, RefCell};
use std::path::{Path, PathBuf};
use std::rc::Rc;

use imgref::ImgVec;
use rgb::RGB8;

use crate::codec::Codec;
use crate::decode::{ColorModel, SourceImage};
use crate::error::{Error, Result};
use crate::eval::session::CancelToken;
use crate::image::ImageData;
use crate::params::ParameterSet;

/// Textured RGB gradient held in memory.
pub fn gradient_source(width: usize, height: usize) -> SourceImage {
    let pixels = gradient_pixels(width, height);
    SourceImage::from_pixels("memory://gradient", pixels, ColorModel::Rgb, 0)
}

fn gradient_pixels(width: usize, height: usize) -> ImageData {
    let pixels = (0..height)
        .flat_map(|y| {
            (0..width).map(move |x| {
                let texture = ((x * 7 + y * 13) % 17) as u8 * 3;
                RGB8::new(
                    ((x * 255 / width.max(1)) as u8).saturating_add(texture),
                    (y * 255 / height.max(1)) as u8,
                    ((x + y) % 256) as u8,
                )
            })
        })
        .collect();
    ImageData::Rgb8(ImgVec::new(pixels, width, height))
}

/// Write a textured gradient PNG into `dir` and return its path.
pub fn write_png_source(dir: &Path, width: u32, height: u32) -> PathBuf {
    let path = dir.join("source.png");
    let img = image::RgbImage::from_fn(width, height, |x, y| {
        image::Rgb([
            (x * 255 / width) as u8,
            (y * 255 / height) as u8,
            ((x * 7 + y * 13) % 251) as u8,
        ])
    });
    img.save(&path).unwrap();
    path
}

/// Number of entries in a directory.
pub fn dir_entries(dir: &Path) -> usize {
    std::fs::read_dir(dir).map_or(0, |entries| entries.count())
}

/// Uncompressed codec that quantises channels more coarsely as quality drops.
///
/// Quality 91..=100 is lossless.
pub struct RawCodec;

impl RawCodec {
    fn step(quality: u8) -> u8 {
        1 + (100 - quality) / 10
    }
}

impl Codec for RawCodec {
    fn id(&self) -> &str {
        "raw"
    }

    fn version(&self) -> &str {
        "test"
    }

    fn extension(&self) -> &str {
        "raw"
    }

    fn encode(&self, image: &ImageData, params: &ParameterSet) -> Result<Vec<u8>> {
        let step = Self::step(params.quality());
        let mut out = Vec::with_capacity(8 + image.width() * image.height() * 3);
        let (width, height) = (image.width() as u32, image.height() as u32);
        out.extend_from_slice(&width.to_le_bytes());
        out.extend_from_slice(&height.to_le_bytes());
        let rgb = image.to_rgb8_vec();
        out.extend(rgb.iter().map(|v| v / step * step));
        Ok(out)
    }

    fn decode(&self, data: &[u8]) -> Result<ImageData> {
        if data.len() < 8 {
            return Err(Error::Decode {
                codec: "raw".to_string(),
                message: "truncated header".to_string(),
            });
        }
        let width = u32::from_le_bytes([data[0], data[1], data[2], data[3]]) as usize;
        let height = u32::from_le_bytes([data[4], data[5], data[6], data[7]]) as usize;
        let pixels: Vec<RGB8> = data[8..]
            .chunks_exact(3)
            .map(|p| RGB8::new(p[0], p[1], p[2]))
            .collect();
        if pixels.len() != width * height {
            return Err(Error::Decode {
                codec: "raw".to_string(),
                message: "pixel count does not match header".to_string(),
            });
        }
        Ok(ImageData::Rgb8(ImgVec::new(pixels, width, height)))
    }
}

/// Raw codec that rejects the n-th encode of one parameter set.
pub struct FailingCodec {
    target: ParameterSet,
    fail_on: u32,
    calls: Cell<u32>,
}

impl FailingCodec {
    pub fn new(target: ParameterSet, fail_on: u32) -> Self {
        Self {
            target,
            fail_on,
            calls: Cell::new(0),
        }
    }
}

impl Codec for FailingCodec {
    fn id(&self) -> &str {
        "raw-failing"
    }

    fn version(&self) -> &str {
        "test"
    }

    fn extension(&self) -> &str {
        "raw"
    }

    fn encode(&self, image: &ImageData, params: &ParameterSet) -> Result<Vec<u8>> {
        if *params == self.target {
            self.calls.set(self.calls.get() + 1);
            if self.calls.get() == self.fail_on {
                return Err(Error::Encode {
                    params: params.id(),
                    message: "synthetic rejection".to_string(),
                });
            }
        }
        RawCodec.encode(image, params)
    }

    fn decode(&self, data: &[u8]) -> Result<ImageData> {
        RawCodec.decode(data)
    }
}

/// Raw codec whose decoder drops the last column.
pub struct CroppingCodec;

impl Codec for CroppingCodec {
    fn id(&self) -> &str {
        "raw-cropping"
    }

    fn version(&self) -> &str {
        "test"
    }

    fn extension(&self) -> &str {
        "raw"
    }

    fn encode(&self, image: &ImageData, params: &ParameterSet) -> Result<Vec<u8>> {
        RawCodec.encode(image, params)
    }

    fn decode(&self, data: &[u8]) -> Result<ImageData> {
        let full = RawCodec.decode(data)?;
        let (width, height) = full.dimensions();
        let ImageData::Rgb8(img) = full else {
            unreachable!("raw codec decodes to RGB");
        };
        let cropped: Vec<RGB8> = img
            .rows()
            .flat_map(|row| row[..width - 1].iter().copied())
            .collect();
        Ok(ImageData::Rgb8(ImgVec::new(cropped, width - 1, height)))
    }
}

/// Raw codec that trips a cancel token on its n-th encode call.
pub struct CancellingCodec {
    token: CancelToken,
    cancel_on: u32,
    calls: Cell<u32>,
}

impl CancellingCodec {
    pub fn new(token: CancelToken, cancel_on: u32) -> Self {
        Self {
            token,
            cancel_on,
            calls: Cell::new(0),
        }
    }
}

impl Codec for CancellingCodec {
    fn id(&self) -> &str {
        "raw-cancelling"
    }

    fn version(&self) -> &str {
        "test"
    }

    fn extension(&self) -> &str {
        "raw"
    }

    fn encode(&self, image: &ImageData, params: &ParameterSet) -> Result<Vec<u8>> {
        self.calls.set(self.calls.get() + 1);
        if self.calls.get() == self.cancel_on {
            self.token.cancel();
        }
        RawCodec.encode(image, params)
    }

    fn decode(&self, data: &[u8]) -> Result<ImageData> {
        RawCodec.decode(data)
    }
}

/// Raw codec that counts the entries of a directory at every encode call.
pub struct DirWatchingCodec {
    dir: PathBuf,
    seen: Rc<RefCell<Vec<usize>>>,
}

impl DirWatchingCodec {
    /// Codec plus the shared list of observed entry counts.
    pub fn new(dir: impl Into<PathBuf>) -> (Self, Rc<RefCell<Vec<usize>>>) {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let codec = Self {
            dir: dir.into(),
            seen: Rc::clone(&seen),
        };
        (codec, seen)
    }
}

impl Codec for DirWatchingCodec {
    fn id(&self) -> &str {
        "raw-watching"
    }

    fn version(&self) -> &str {
        "test"
    }

    fn extension(&self) -> &str {
        "raw"
    }

    fn encode(&self, image: &ImageData, params: &ParameterSet) -> Result<Vec<u8>> {
        self.seen.borrow_mut().push(dir_entries(&self.dir));
        RawCodec.encode(image, params)
    }

    fn decode(&self, data: &[u8]) -> Result<ImageData> {
        RawCodec.decode(data)
    }
}
