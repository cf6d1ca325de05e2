//! # webp-sweep
//!
//! WebP encoder parameter-sweep benchmark.
//!
//! One source image is encoded under every parameter set of a plan, each
//! configuration repeated a fixed number of times. Every iteration is timed
//! and its artifact scored against the source with SSIM. The first iteration
//! of each configuration is a warm-up and never enters the averages.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use webp_sweep::{SweepConfig, SweepPlan, SweepSession};
//!
//! let config = SweepConfig::builder()
//!     .iterations(11)
//!     .log_dir("./logs")
//!     .build()?;
//!
//! let mut session = SweepSession::with_webp(config);
//! let report = session.run_sweep("photo.jpg".as_ref(), &SweepPlan::all_methods(80)?)?;
//! report.write_json("sweep.json".as_ref())?;
//! ```
//!
//! ## Modules
//!
//! - [`error`]: Error types for the library
//! - [`decode`]: Source image loading
//! - [`params`]: Parameter sets and sweep plans
//! - [`codec`]: Codec backends and timed encoding
//! - [`metrics`]: Fidelity comparators (SSIM)
//! - [`stats`]: Warm-up-excluding aggregation
//! - [`eval`]: Sweep session, artifacts, logs and reports

pub mod codec;
pub mod decode;
pub mod error;
pub mod eval;
pub mod image;
pub mod metrics;
pub mod params;
pub mod stats;

#[cfg(test)]
mod testing;

// Re-export commonly used types
pub use codec::{Codec, EncodedArtifact, encode_to_path};
#[cfg(feature = "webp")]
pub use codec::WebpCodec;
pub use decode::{ColorModel, SourceImage, SourceInfo, load_source};
pub use error::{Error, Result};
pub use eval::{
    report::{ConversionResult, SweepReport, SweepStatus},
    session::{
        CancelToken, SingleConversion, SweepConfig, SweepSession, SweepState, convert_once,
    },
};
#[cfg(feature = "webp")]
pub use eval::session::run_sweep;
pub use image::ImageData;
pub use metrics::{FidelityComparator, SsimComparator};
pub use params::{ParameterSet, SweepPlan};
pub use stats::{AggregateStat, Summary, aggregate};
