//! Result aggregation and per-configuration text logs.
//!
//! Every configuration gets one plain-text log, truncated when the
//! configuration starts, so rerunning a sweep replaces rather than appends.
//! Each iteration adds a block of the form:
//!
//! ```text
//! Iteration 2:
//! Conversion Time: 12.34 ms
//! SSIM with Original: 0.98765
//! ```

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;

use crate::error::{Error, Result};
use crate::eval::report::ConversionResult;
use crate::params::ParameterSet;
use crate::stats::{AggregateStat, aggregate};

struct ConfigLog {
    params: ParameterSet,
    path: PathBuf,
    results: Vec<ConversionResult>,
    writer: Option<BufWriter<File>>,
}

/// In-memory result log plus its on-disk mirror.
pub struct ResultStore {
    log_dir: PathBuf,
    logs: HashMap<String, ConfigLog>,
}

impl ResultStore {
    /// Store writing logs into `log_dir`.
    #[must_use]
    pub fn new(log_dir: impl Into<PathBuf>) -> Self {
        Self {
            log_dir: log_dir.into(),
            logs: HashMap::new(),
        }
    }

    /// Log file path for a configuration.
    #[must_use]
    pub fn log_path(&self, params: &ParameterSet) -> PathBuf {
        self.log_dir.join(format!("{}_data.txt", params.id()))
    }

    /// Start (or restart) a configuration, truncating its log.
    ///
    /// The in-memory log is always reset. An error means the text log could
    /// not be created; recording still works in memory.
    pub fn begin(&mut self, params: &ParameterSet) -> Result<()> {
        let path = self.log_path(params);
        let entry = self
            .logs
            .entry(params.id())
            .or_insert_with(|| ConfigLog::new(*params, path.clone()));
        entry.results.clear();
        entry.writer = None;

        std::fs::create_dir_all(&self.log_dir)
            .map_err(|e| Error::persistence(&self.log_dir, &e))?;
        let file = File::create(&path).map_err(|e| Error::persistence(&path, &e))?;
        entry.writer = Some(BufWriter::new(file));

        let header = format!(
            "Method {} Data (quality {}):\n",
            params.method(),
            params.quality()
        );
        entry.append(&header)
    }

    /// Append one iteration.
    ///
    /// The result is kept in memory even if the text log cannot be written.
    pub fn record(&mut self, id: &str, result: ConversionResult) -> Result<()> {
        let log = self
            .logs
            .get_mut(id)
            .ok_or_else(|| Error::UnknownConfiguration(id.to_string()))?;

        let block = format!(
            "Iteration {}:\nConversion Time: {:.2} ms\nSSIM with Original: {:.5}\n\n",
            result.iteration,
            result.elapsed_ms,
            result.similarity
        );
        log.results.push(result);
        log.append(&block)
    }

    /// Results recorded so far for a configuration.
    #[must_use]
    pub fn results(&self, id: &str) -> &[ConversionResult] {
        self.logs.get(id).map_or(&[], |log| log.results.as_slice())
    }

    /// Compute the aggregate and append it to the log.
    ///
    /// Returns the aggregate together with any log write failure, so the
    /// statistic survives a full disk.
    pub fn finalize(
        &mut self,
        id: &str,
        failure: Option<String>,
    ) -> Result<(AggregateStat, Option<Error>)> {
        let log = self
            .logs
            .get_mut(id)
            .ok_or_else(|| Error::UnknownConfiguration(id.to_string()))?;

        let stat = aggregate(log.params, &log.results, failure);
        let mut summary = if stat.is_defined() {
            format!(
                "Average Conversion Time (excluding first iteration): {:.2} ms\n\
                 Average SSIM with Original (excluding first iteration): {:.5}\n\
                 Samples: {}\n",
                stat.avg_elapsed_ms,
                stat.avg_similarity,
                stat.samples
            )
        } else {
            "Average Conversion Time (excluding first iteration): undefined\n\
             Average SSIM with Original (excluding first iteration): undefined\n\
             Samples: 0\n"
                .to_string()
        };
        if let Some(reason) = &stat.failure {
            summary.push_str(&format!("Stopped early: {reason}\n"));
        }

        let write_error = log.append(&summary).err();
        log.writer = None;
        Ok((stat, write_error))
    }
}

impl ConfigLog {
    fn new(params: ParameterSet, path: PathBuf) -> Self {
        Self {
            params,
            path,
            results: Vec::new(),
            writer: None,
        }
    }

    fn append(&mut self, text: &str) -> Result<()> {
        let Some(writer) = self.writer.as_mut() else {
            return Err(Error::Persistence {
                path: self.path.clone(),
                reason: "log is not open".to_string(),
            });
        };
        writer
            .write_all(text.as_bytes())
            .and_then(|()| writer.flush())
            .map_err(|e| Error::persistence(&self.path, &e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(
        params: ParameterSet,
        iteration: u32,
        elapsed_ms: f64,
        similarity: f64,
    ) -> ConversionResult {
        ConversionResult {
            params,
            iteration,
            elapsed_ms,
            artifact_bytes: 100,
            similarity,
        }
    }

    #[test]
    fn test_log_format() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = ResultStore::new(dir.path());
        let p = ParameterSet::new(4, 80).unwrap();
        store.begin(&p).unwrap();
        let warmup = result(p, 1, 25.456, 0.987_654);
        store.record(&p.id(), warmup).unwrap();
        store.record(&p.id(), result(p, 2, 10.0, 0.95)).unwrap();
        let (stat, write_error) = store.finalize(&p.id(), None).unwrap();
        assert!(write_error.is_none());
        assert_eq!(stat.samples, 1);

        let text = std::fs::read_to_string(store.log_path(&p)).unwrap();
        assert!(text.starts_with("Method 4 Data (quality 80):\n"));
        let first = "Iteration 1:\nConversion Time: 25.46 ms\nSSIM with Original: 0.98765\n\n";
        let second = "Iteration 2:\nConversion Time: 10.00 ms\nSSIM with Original: 0.95000\n\n";
        let average = "Average Conversion Time (excluding first iteration): 10.00 ms";
        assert!(text.contains(first));
        assert!(text.contains(second));
        assert!(text.contains(average));
    }

    #[test]
    fn test_rerun_overwrites_log() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = ResultStore::new(dir.path());
        let p = ParameterSet::new(0, 80).unwrap();

        for _ in 0..2 {
            store.begin(&p).unwrap();
            store.record(&p.id(), result(p, 1, 5.0, 0.9)).unwrap();
            store.record(&p.id(), result(p, 2, 5.0, 0.9)).unwrap();
            store.finalize(&p.id(), None).unwrap();
        }

        let text = std::fs::read_to_string(store.log_path(&p)).unwrap();
        assert_eq!(text.matches("Iteration 1:").count(), 1);
        assert_eq!(store.results(&p.id()).len(), 2);
    }

    #[test]
    fn test_undefined_aggregate_is_logged() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = ResultStore::new(dir.path());
        let p = ParameterSet::new(2, 80).unwrap();
        store.begin(&p).unwrap();
        store.record(&p.id(), result(p, 1, 5.0, 0.9)).unwrap();
        let failure = Some("Encode failed".to_string());
        let (stat, _) = store.finalize(&p.id(), failure).unwrap();
        assert!(!stat.is_defined());

        let text = std::fs::read_to_string(store.log_path(&p)).unwrap();
        assert!(text.contains("undefined"));
        assert!(text.contains("Stopped early: Encode failed"));
    }

    #[test]
    fn test_unknown_configuration() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = ResultStore::new(dir.path());
        let p = ParameterSet::new(1, 80).unwrap();
        assert!(matches!(
            store.record(&p.id(), result(p, 1, 1.0, 1.0)),
            Err(Error::UnknownConfiguration(_))
        ));
        assert!(store.finalize(&p.id(), None).is_err());
    }

    #[test]
    fn test_unwritable_log_keeps_results_in_memory() {
        let dir = tempfile::tempdir().unwrap();
        // A file where the log directory should be.
        let blocked = dir.path().join("logs");
        std::fs::write(&blocked, b"").unwrap();
        let mut store = ResultStore::new(&blocked);
        let p = ParameterSet::new(5, 80).unwrap();

        assert!(matches!(store.begin(&p), Err(Error::Persistence { .. })));
        assert!(store.record(&p.id(), result(p, 1, 3.0, 0.9)).is_err());
        assert!(store.record(&p.id(), result(p, 2, 4.0, 0.9)).is_err());
        let (stat, write_error) = store.finalize(&p.id(), None).unwrap();
        assert_eq!(stat.samples, 1);
        assert_eq!(stat.avg_elapsed_ms, 4.0);
        assert!(write_error.is_some());
    }
}
