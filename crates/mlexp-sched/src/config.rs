use std::fs;
use std::path::{Path, PathBuf};

use mlexp_core::{ErrorInfo, ExpError};
use mlexp_store::from_yaml_slice;
use serde::{Deserialize, Serialize};

fn default_parallelism() -> usize {
    1
}

fn default_log_path() -> PathBuf {
    PathBuf::from(".logs/")
}

/// How a scheduler executes its run set.
///
/// ```yaml
/// type: local
/// parallelism: 4
/// log_path: .logs/
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RunConfig {
    /// Worker pool on this machine.
    Local(LocalRunConfig),
}

/// Settings of the local worker pool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalRunConfig {
    /// Number of entry point processes in flight at once.
    #[serde(default = "default_parallelism", alias = "tasks_in_parallel")]
    pub parallelism: usize,
    /// Directory receiving one log file per run; relative paths resolve
    /// against the results directory.
    #[serde(default = "default_log_path")]
    pub log_path: PathBuf,
}

impl Default for LocalRunConfig {
    fn default() -> Self {
        Self {
            parallelism: default_parallelism(),
            log_path: default_log_path(),
        }
    }
}

impl LocalRunConfig {
    /// Local configuration running `parallelism` processes at a time.
    pub fn with_parallelism(parallelism: usize) -> Self {
        Self {
            parallelism,
            ..Self::default()
        }
    }

    /// Log directory for runs whose results live in `results_dir`.
    pub fn log_dir(&self, results_dir: &Path) -> PathBuf {
        if self.log_path.is_absolute() {
            self.log_path.clone()
        } else {
            results_dir.join(&self.log_path)
        }
    }
}

impl From<LocalRunConfig> for RunConfig {
    fn from(config: LocalRunConfig) -> Self {
        RunConfig::Local(config)
    }
}

/// Loads a run configuration from a YAML file.
pub fn load_run_config<P: AsRef<Path>>(path: P) -> Result<RunConfig, ExpError> {
    let path = path.as_ref();
    let bytes = fs::read(path).map_err(|err| {
        ExpError::Io(
            ErrorInfo::new("run_config.read", "failed to read run configuration")
                .with_context("path", path.display().to_string())
                .with_hint(err.to_string()),
        )
    })?;
    from_yaml_slice(&bytes)
}
