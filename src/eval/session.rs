//! Sweep orchestration.
//!
//! [`SweepSession`] drives one source image through every parameter set of a
//! [`SweepPlan`], strictly sequentially: each encode-then-compare cycle runs
//! to completion before the next begins, so encode latencies never compete
//! with another run for CPU.
//!
//! Per configuration the session runs `iterations` cycles, records every
//! result (warm-up included) in the [`ResultStore`], aggregates the
//! post-warm-up results, and removes all transient artifacts. A failing
//! iteration stops only its own configuration. Cancellation is honoured
//! between configurations and between iterations.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tracing::{debug, info, warn};

use crate::codec::{Codec, encode_to_path};
use crate::decode::{SourceImage, load_source};
use crate::error::{Error, Result};
use crate::eval::artifacts::ArtifactDir;
use crate::eval::report::{ConversionResult, SweepReport, SweepStatus};
use crate::eval::store::ResultStore;
use crate::metrics::FidelityComparator;
use crate::params::{ParameterSet, SweepPlan};
use crate::stats::{AggregateStat, aggregate};

/// Iterations per configuration when none is configured.
pub const DEFAULT_ITERATIONS: u32 = 11;

/// Configuration for a sweep session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SweepConfig {
    /// Iterations per configuration, warm-up included (>= 1).
    pub iterations: u32,

    /// Directory for transient artifacts.
    pub work_dir: PathBuf,

    /// Directory for per-configuration text logs.
    pub log_dir: PathBuf,
}

impl SweepConfig {
    /// Create a new configuration builder.
    #[must_use]
    pub fn builder() -> SweepConfigBuilder {
        SweepConfigBuilder::default()
    }
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            iterations: DEFAULT_ITERATIONS,
            work_dir: std::env::temp_dir().join("webp-sweep"),
            log_dir: PathBuf::from("."),
        }
    }
}

/// Builder for [`SweepConfig`].
#[derive(Debug, Default)]
pub struct SweepConfigBuilder {
    iterations: Option<u32>,
    work_dir: Option<PathBuf>,
    log_dir: Option<PathBuf>,
}

impl SweepConfigBuilder {
    /// Set the iteration count.
    #[must_use]
    pub fn iterations(mut self, iterations: u32) -> Self {
        self.iterations = Some(iterations);
        self
    }

    /// Set the transient artifact directory.
    #[must_use]
    pub fn work_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.work_dir = Some(path.into());
        self
    }

    /// Set the log directory.
    #[must_use]
    pub fn log_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.log_dir = Some(path.into());
        self
    }

    /// Build the configuration.
    pub fn build(self) -> Result<SweepConfig> {
        let defaults = SweepConfig::default();
        let config = SweepConfig {
            iterations: self.iterations.unwrap_or(defaults.iterations),
            work_dir: self.work_dir.unwrap_or(defaults.work_dir),
            log_dir: self.log_dir.unwrap_or(defaults.log_dir),
        };

        let problem = if config.iterations == 0 {
            Some("iterations must be at least 1")
        } else if config.work_dir.as_os_str().is_empty() {
            Some("work_dir must not be empty")
        } else if config.log_dir.as_os_str().is_empty() {
            Some("log_dir must not be empty")
        } else {
            None
        };
        match problem {
            Some(reason) => Err(Error::InvalidConfig(reason.to_string())),
            None => Ok(config),
        }
    }
}

/// Cooperative cancellation flag, checked between configurations and between
/// iterations.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    /// Request cancellation.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Whether cancellation was requested.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Where the session is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SweepState {
    /// No sweep started yet.
    Idle,
    /// Running an iteration of the configuration at plan index `config`.
    Running {
        /// Plan index.
        config: usize,
        /// 1-based iteration.
        iteration: u32,
    },
    /// Aggregating the configuration at plan index `config`.
    Aggregating {
        /// Plan index.
        config: usize,
    },
    /// Every configuration was attempted.
    Completed,
    /// Stopped by cancellation.
    Aborted,
}

/// A single encode-and-compare, keeping the artifact on disk.
#[derive(Debug, Clone)]
pub struct SingleConversion {
    /// Measurements.
    pub result: ConversionResult,
    /// Where the artifact was written.
    pub artifact_path: PathBuf,
    /// Decoded artifact dimensions.
    pub artifact_dimensions: (usize, usize),
    /// Whether the decoded artifact carries alpha.
    pub artifact_has_alpha: bool,
}

/// Sweep session owning the codec backend, the comparator and the
/// configuration.
///
/// # Example
///
/// ```rust,ignore
/// use webp_sweep::{SweepConfig, SweepPlan, SweepSession};
///
/// let config = SweepConfig::builder().iterations(11).log_dir("./logs").build()?;
/// let mut session = SweepSession::with_webp(config);
/// let report = session.run_sweep("photo.jpg".as_ref(), &SweepPlan::all_methods(80)?)?;
/// for stat in &report.stats {
///     println!("{}: {:.2} ms, SSIM {:.5}", stat.id, stat.avg_elapsed_ms, stat.avg_similarity);
/// }
/// ```
pub struct SweepSession {
    config: SweepConfig,
    codec: Box<dyn Codec>,
    comparator: Box<dyn FidelityComparator>,
    cancel: CancelToken,
    state: SweepState,
}

impl SweepSession {
    /// Create a session with explicit backends.
    #[must_use]
    pub fn new(
        config: SweepConfig,
        codec: Box<dyn Codec>,
        comparator: Box<dyn FidelityComparator>,
    ) -> Self {
        Self {
            config,
            codec,
            comparator,
            cancel: CancelToken::default(),
            state: SweepState::Idle,
        }
    }

    /// Session using libwebp and the 11×11 SSIM comparator.
    #[cfg(feature = "webp")]
    #[must_use]
    pub fn with_webp(config: SweepConfig) -> Self {
        Self::new(
            config,
            Box::new(crate::codec::WebpCodec::new()),
            Box::new(crate::metrics::SsimComparator::new()),
        )
    }

    /// Replace the cancellation token.
    #[must_use]
    pub fn with_cancel_token(mut self, token: CancelToken) -> Self {
        self.cancel = token;
        self
    }

    /// Token that cancels this session's sweeps.
    #[must_use]
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn state(&self) -> SweepState {
        self.state
    }

    /// Configuration in use.
    #[must_use]
    pub fn config(&self) -> &SweepConfig {
        &self.config
    }

    /// Load `source_path` and sweep it through `plan`.
    ///
    /// Fails with [`Error::FileAccess`] before any artifact is created when
    /// the source cannot be loaded. Per-configuration failures do not fail the
    /// sweep; they surface as undefined or partial [`AggregateStat`]s.
    pub fn run_sweep(&mut self, source_path: &Path, plan: &SweepPlan) -> Result<SweepReport> {
        self.state = SweepState::Idle;
        let source = load_source(source_path)?;
        self.run_sweep_with_source(&source, plan)
    }

    /// Sweep an already-loaded source through `plan`.
    pub fn run_sweep_with_source(
        &mut self,
        source: &SourceImage,
        plan: &SweepPlan,
    ) -> Result<SweepReport> {
        self.state = SweepState::Idle;
        let extension = self.codec.extension();
        let mut artifacts = ArtifactDir::create(&self.config.work_dir, extension)?;
        let mut store = ResultStore::new(&self.config.log_dir);

        info!(
            source = %source.path().display(),
            configs = plan.len(),
            iterations = self.config.iterations,
            codec = self.codec.id(),
            "starting sweep"
        );

        let mut stats = Vec::with_capacity(plan.len());
        let mut results = Vec::new();
        let mut status = SweepStatus::Completed;

        for (index, params) in plan.iter().enumerate() {
            if self.cancel.is_cancelled() {
                status = SweepStatus::Aborted;
                break;
            }

            let (stat, cancelled) =
                self.run_configuration(index, params, source, &mut artifacts, &mut store);
            results.extend_from_slice(store.results(&params.id()));
            stats.push(stat);

            if cancelled {
                status = SweepStatus::Aborted;
                break;
            }
        }

        self.state = match status {
            SweepStatus::Completed => SweepState::Completed,
            SweepStatus::Aborted => SweepState::Aborted,
        };
        info!(state = ?self.state, "sweep finished");

        Ok(SweepReport {
            source: source.info().clone(),
            codec_id: self.codec.id().to_string(),
            codec_version: self.codec.version().to_string(),
            metric: self.comparator.name().to_string(),
            iterations: self.config.iterations,
            status,
            stats,
            results,
            leaked_artifacts: artifacts.close(),
            timestamp: chrono::Utc::now(),
        })
    }

    /// Run every iteration of one configuration. Returns the aggregate and
    /// whether cancellation stopped it.
    fn run_configuration(
        &mut self,
        index: usize,
        params: &ParameterSet,
        source: &SourceImage,
        artifacts: &mut ArtifactDir,
        store: &mut ResultStore,
    ) -> (AggregateStat, bool) {
        let id = params.id();
        let iterations = self.config.iterations;
        info!(config = %id, "starting configuration");

        if let Err(e) = store.begin(params) {
            warn!(config = %id, error = %e, "cannot write configuration log");
        }

        let mut failure = None;
        let mut cancelled = false;

        for iteration in 1..=iterations {
            if self.cancel.is_cancelled() {
                cancelled = true;
                failure = Some(format!("cancelled before iteration {iteration}"));
                break;
            }

            self.state = SweepState::Running {
                config: index,
                iteration,
            };
            let path = artifacts.path_for(params, iteration);
            let outcome = self.run_iteration(source, params, iteration, &path);
            artifacts.release(&path);

            match outcome {
                Ok(result) => {
                    debug!(
                        config = %id,
                        iteration,
                        elapsed_ms = result.elapsed_ms,
                        similarity = result.similarity,
                        bytes = result.artifact_bytes,
                        "iteration done"
                    );
                    if let Err(e) = store.record(&id, result) {
                        warn!(
                            config = %id,
                            iteration,
                            error = %e,
                            "cannot append to configuration log"
                        );
                    }
                }
                Err(e) => {
                    let reason = if e.is_configuration_failure() {
                        "configuration aborted"
                    } else {
                        "configuration aborted by unexpected error"
                    };
                    warn!(config = %id, iteration, error = %e, "{reason}");
                    failure = Some(e.to_string());
                    break;
                }
            }
        }

        self.state = SweepState::Aggregating { config: index };
        debug!(config = %id, "aggregating");
        artifacts.release_all(params, iterations);

        let stat = match store.finalize(&id, failure.clone()) {
            Ok((stat, write_error)) => {
                if let Some(e) = write_error {
                    warn!(config = %id, error = %e, "cannot append summary to log");
                }
                stat
            }
            Err(e) => {
                warn!(config = %id, error = %e, "aggregating without a log");
                aggregate(*params, store.results(&id), failure)
            }
        };

        if stat.is_defined() {
            info!(
                config = %id,
                avg_elapsed_ms = stat.avg_elapsed_ms,
                avg_similarity = stat.avg_similarity,
                samples = stat.samples,
                "configuration finished"
            );
        } else {
            info!(config = %id, "configuration finished without samples");
        }

        (stat, cancelled)
    }

    fn run_iteration(
        &self,
        source: &SourceImage,
        params: &ParameterSet,
        iteration: u32,
        path: &Path,
    ) -> Result<ConversionResult> {
        let artifact = encode_to_path(self.codec.as_ref(), source, params, path)?;
        let decoded = self.codec.decode(&artifact.data)?;
        let similarity = self.comparator.compare(source.pixels(), &decoded)?;

        Ok(ConversionResult {
            params: *params,
            iteration,
            elapsed_ms: artifact.elapsed_ms,
            artifact_bytes: artifact.byte_size(),
            similarity,
        })
    }
}

/// Sweep `source_path` through `plan` with libwebp, SSIM and default
/// directories.
#[cfg(feature = "webp")]
pub fn run_sweep(source_path: &Path, plan: &SweepPlan, iterations: u32) -> Result<SweepReport> {
    let config = SweepConfig::builder().iterations(iterations).build()?;
    SweepSession::with_webp(config).run_sweep(source_path, plan)
}

/// Encode once, score the artifact, and keep it at `output`.
pub fn convert_once(
    codec: &dyn Codec,
    comparator: &dyn FidelityComparator,
    source: &SourceImage,
    params: &ParameterSet,
    output: &Path,
) -> Result<SingleConversion> {
    let artifact = encode_to_path(codec, source, params, output)?;
    let decoded = codec.decode(&artifact.data)?;
    let similarity = comparator.compare(source.pixels(), &decoded)?;

    Ok(SingleConversion {
        result: ConversionResult {
            params: *params,
            iteration: 1,
            elapsed_ms: artifact.elapsed_ms,
            artifact_bytes: artifact.byte_size(),
            similarity,
        },
        artifact_path: artifact.path,
        artifact_dimensions: decoded.dimensions(),
        artifact_has_alpha: decoded.has_alpha(),
    })
}
