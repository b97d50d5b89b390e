use std::path::{Path, PathBuf};

use mlexp_core::{ErrorInfo, ExpError};

/// File name of the versioned store inside a results directory.
pub const STORE_FILE: &str = "metadata.db";

/// Directory holding an experiment's store file and run outputs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultsPath {
    dir: PathBuf,
}

impl ResultsPath {
    /// `<base>/results/<experiment>`.
    pub fn for_experiment(base: impl AsRef<Path>, experiment: &str) -> Self {
        Self {
            dir: base.as_ref().join("results").join(experiment),
        }
    }

    /// Derives the experiment name from the directory containing `entry`,
    /// e.g. `experiments/qrc/run.py` belongs to experiment `qrc`.
    pub fn from_entry_point(base: impl AsRef<Path>, entry: &Path) -> Result<Self, ExpError> {
        let experiment = entry
            .parent()
            .and_then(Path::file_name)
            .and_then(|name| name.to_str())
            .ok_or_else(|| {
                ExpError::Io(
                    ErrorInfo::new(
                        "paths.no_experiment_dir",
                        "entry point has no parent directory to name the experiment",
                    )
                    .with_context("entry", entry.display().to_string()),
                )
            })?;
        Ok(Self::for_experiment(base, experiment))
    }

    /// Uses `dir` as-is.
    pub fn explicit(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// The results directory itself.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the store file, see [`STORE_FILE`].
    pub fn store_path(&self) -> PathBuf {
        self.dir.join(STORE_FILE)
    }
}
