//! Encoder adapter.
//!
//! A [`Codec`] is the swappable backend: it turns pixels into encoded bytes
//! and back. [`encode_to_path`] wraps one encode call with timing and writes
//! the artifact to disk.
//!
//! Only the codec's `encode` call is timed. Source decoding happens once per
//! sweep and writing the artifact happens after the clock stops, so every
//! configuration is measured the same way.

#[cfg(feature = "webp")]
pub mod webp;

use std::path::{Path, PathBuf};
use std::time::Instant;

use crate::decode::SourceImage;
use crate::error::{Error, Result};
use crate::image::ImageData;
use crate::params::ParameterSet;

#[cfg(feature = "webp")]
pub use self::webp::WebpCodec;

/// Trait for codec backends that the sweep can benchmark.
pub trait Codec {
    /// Unique identifier (e.g. "webp").
    fn id(&self) -> &str;

    /// Version string of the underlying library.
    fn version(&self) -> &str;

    /// Output file extension.
    fn extension(&self) -> &str;

    /// Encode pixels with the given parameters.
    fn encode(&self, image: &ImageData, params: &ParameterSet) -> Result<Vec<u8>>;

    /// Decode bytes produced by [`Codec::encode`].
    fn decode(&self, data: &[u8]) -> Result<ImageData>;
}

/// An encoded artifact written by [`encode_to_path`].
#[derive(Debug, Clone)]
pub struct EncodedArtifact {
    /// Where the artifact was written.
    pub path: PathBuf,
    /// Encoded bytes, identical to the file contents.
    pub data: Vec<u8>,
    /// Wall-clock time of the encode call in milliseconds.
    pub elapsed_ms: f64,
}

impl EncodedArtifact {
    /// Artifact size in bytes.
    #[must_use]
    pub fn byte_size(&self) -> u64 {
        self.data.len() as u64
    }
}

/// Encode `source` with `params`, writing the result to `output`.
///
/// An existing file at `output` is overwritten. Codec failures and failures to
/// write the artifact are both reported as [`Error::Encode`].
pub fn encode_to_path(
    codec: &dyn Codec,
    source: &SourceImage,
    params: &ParameterSet,
    output: &Path,
) -> Result<EncodedArtifact> {
    params.validate()?;

    let start = Instant::now();
    let data = codec.encode(source.pixels(), params)?;
    let elapsed = start.elapsed();

    std::fs::write(output, &data).map_err(|e| Error::Encode {
        params: params.id(),
        message: format!("writing {}: {e}", output.display()),
    })?;

    Ok(EncodedArtifact {
        path: output.to_path_buf(),
        data,
        elapsed_ms: elapsed.as_secs_f64() * 1000.0,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{RawCodec, gradient_source};

    #[test]
    fn test_encode_to_path_writes_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("a.raw");
        let source = gradient_source(20, 10);
        let params = ParameterSet::new(3, 80).unwrap();

        let artifact = encode_to_path(&RawCodec, &source, &params, &out).unwrap();
        assert!(artifact.elapsed_ms >= 0.0);
        assert_eq!(std::fs::read(&out).unwrap(), artifact.data);
        assert_eq!(artifact.byte_size(), artifact.data.len() as u64);
    }

    #[test]
    fn test_encode_overwrites_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("a.raw");
        std::fs::write(&out, vec![0u8; 10_000]).unwrap();

        let source = gradient_source(4, 4);
        let params = ParameterSet::new(0, 50).unwrap();
        let artifact = encode_to_path(&RawCodec, &source, &params, &out).unwrap();
        assert_eq!(std::fs::metadata(&out).unwrap().len(), artifact.byte_size());
    }

    #[test]
    fn test_unwritable_output_is_encode_error() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("missing-dir").join("a.raw");
        let source = gradient_source(4, 4);
        let params = ParameterSet::new(0, 50).unwrap();
        let result = encode_to_path(&RawCodec, &source, &params, &out);
        assert!(matches!(result, Err(Error::Encode { .. })));
    }
}
