//! Sweep execution and reporting.
//!
//! - [`session::SweepSession`]: runs a plan against one source image
//! - [`session::SweepConfig`]: iteration count and directories
//! - [`artifacts`]: transient artifact naming and cleanup
//! - [`store`]: per-configuration result logs
//! - [`report`]: sweep reports (JSON and CSV)

pub mod artifacts;
pub mod report;
pub mod session;
pub mod store;

pub use report::{ConversionResult, SweepReport, SweepStatus};
pub use session::{
    CancelToken, SingleConversion, SweepConfig, SweepSession, SweepState, convert_once,
};
