//! Transient artifact naming and cleanup.
//!
//! Each (configuration, iteration) pair owns exactly one artifact file whose
//! name is derived from the parameter set id and iteration index, so every
//! file a configuration could have produced can be enumerated without
//! scanning the directory.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::params::ParameterSet;

/// Owns the working directory for transient artifacts.
#[derive(Debug)]
pub struct ArtifactDir {
    root: PathBuf,
    extension: String,
    created: bool,
    leaked: Vec<PathBuf>,
}

impl ArtifactDir {
    /// Create (if needed) the working directory.
    pub fn create(root: impl Into<PathBuf>, extension: &str) -> Result<Self> {
        let root = root.into();
        let created = !root.exists();
        std::fs::create_dir_all(&root).map_err(|e| Error::persistence(&root, &e))?;
        Ok(Self {
            root,
            extension: extension.to_string(),
            created,
            leaked: Vec::new(),
        })
    }

    /// Deterministic artifact path for one iteration.
    #[must_use]
    pub fn path_for(&self, params: &ParameterSet, iteration: u32) -> PathBuf {
        self.root.join(format!(
            "temp_{ext}_{id}_{iteration:03}.{ext}",
            ext = self.extension,
            id = params.id()
        ))
    }

    /// Remove one artifact. A missing file is not an error.
    pub fn remove(&self, path: &Path) -> Result<()> {
        match std::fs::remove_file(path) {
            Ok(()) => {
                debug!(path = %path.display(), "removed artifact");
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(Error::persistence(path, &e)),
        }
    }

    /// Remove an artifact, logging and remembering any failure instead of
    /// returning it.
    pub fn release(&mut self, path: &Path) {
        if let Err(e) = self.remove(path) {
            warn!(error = %e, "failed to remove transient artifact");
            if !self.leaked.iter().any(|p| p == path) {
                self.leaked.push(path.to_path_buf());
            }
        }
    }

    /// Remove every artifact iterations `1..=iterations` of `params` could
    /// have produced.
    pub fn release_all(&mut self, params: &ParameterSet, iterations: u32) {
        for iteration in 1..=iterations {
            let path = self.path_for(params, iteration);
            self.release(&path);
        }
    }

    /// Finish with the directory and return the artifacts that could not be
    /// removed.
    ///
    /// A directory created by [`ArtifactDir::create`] is removed when it is
    /// empty. A pre-existing directory is left in place.
    pub fn close(self) -> Vec<PathBuf> {
        if self.created {
            match std::fs::remove_dir(&self.root) {
                Ok(()) => debug!(path = %self.root.display(), "removed work directory"),
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => {
                    debug!(
                        path = %self.root.display(),
                        error = %e,
                        "keeping work directory"
                    );
                }
            }
        }
        self.leaked
    }
}
