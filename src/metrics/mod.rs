//! Fidelity metrics for comparing a source with a decoded artifact.
//!
//! The sweep scores every artifact through a [`FidelityComparator`]. The
//! default is [`SsimComparator`], a windowed structural similarity index on
//! the luminance plane:
//!
//! | Score | Meaning |
//! |-------|---------|
//! | 1.0 | Pixel-identical luminance |
//! | > 0.99 | Differences rarely visible |
//! | > 0.95 | Visible on close inspection |
//! | lower | Clearly degraded structure |

pub mod ssim;

pub use ssim::SsimComparator;

use crate::error::{Error, Result};
use crate::image::ImageData;

/// Scores how faithfully `test` reproduces `reference`.
pub trait FidelityComparator {
    /// Metric name for logs and reports.
    fn name(&self) -> &str;

    /// Similarity in `[0, 1]`, 1 meaning identical.
    ///
    /// Implementations must reject inputs of different dimensions with
    /// [`Error::DimensionMismatch`] instead of resampling.
    fn compare(&self, reference: &ImageData, test: &ImageData) -> Result<f64>;
}

/// Fail with [`Error::DimensionMismatch`] unless both images have the same size.
pub fn ensure_same_dimensions(reference: &ImageData, test: &ImageData) -> Result<()> {
    if reference.dimensions() != test.dimensions() {
        return Err(Error::DimensionMismatch {
            expected: reference.dimensions(),
            actual: test.dimensions(),
        });
    }
    Ok(())
}
