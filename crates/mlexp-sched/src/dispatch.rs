use std::collections::BTreeSet;
use std::fs::{self, File};
use std::path::Path;
use std::process::Stdio;

use mlexp_core::{ErrorInfo, ExpError};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::LocalRunConfig;
use crate::run::{EntryPoint, RunSpec};

fn io_error(code: &str, err: impl ToString) -> ExpError {
    ExpError::Io(ErrorInfo::new(code, err.to_string()))
}

/// Counts reported once every dispatched process has returned.
///
/// Failures are informational only: nothing is retried and a failed run is
/// never turned into an error.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatchSummary {
    /// Run units handed to a worker.
    pub dispatched: usize,
    /// Processes that exited unsuccessfully or were killed by a signal.
    pub exited_nonzero: usize,
    /// Runs whose log file or process could not be created.
    pub failed_to_spawn: usize,
}

impl DispatchSummary {
    /// Runs whose process exited successfully.
    pub fn succeeded(&self) -> usize {
        self.dispatched - self.exited_nonzero - self.failed_to_spawn
    }

    fn record(mut self, outcome: Outcome) -> Self {
        self.dispatched += 1;
        match outcome {
            Outcome::Success => {}
            Outcome::NonZero => self.exited_nonzero += 1,
            Outcome::SpawnFailed => self.failed_to_spawn += 1,
        }
        self
    }

    fn merge(self, other: Self) -> Self {
        Self {
            dispatched: self.dispatched + other.dispatched,
            exited_nonzero: self.exited_nonzero + other.exited_nonzero,
            failed_to_spawn: self.failed_to_spawn + other.failed_to_spawn,
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Outcome {
    Success,
    NonZero,
    SpawnFailed,
}

/// Runs every unit through `entry` on a pool of `config.parallelism` workers.
///
/// Each worker blocks on one process at a time; the call returns once all
/// processes have exited.
pub(crate) fn run_local(
    runs: &BTreeSet<RunSpec>,
    entry: &EntryPoint,
    results_dir: &Path,
    config: &LocalRunConfig,
) -> Result<DispatchSummary, ExpError> {
    let log_dir = config.log_dir(results_dir);
    fs::create_dir_all(&log_dir).map_err(|err| io_error("dispatch.log_dir", err))?;
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(config.parallelism.max(1))
        .build()
        .map_err(|err| io_error("dispatch.thread_pool", err))?;

    let summary = pool.install(|| {
        runs.par_iter()
            .map(|run| run_single(run, entry, results_dir, &log_dir))
            .fold(DispatchSummary::default, DispatchSummary::record)
            .reduce(DispatchSummary::default, DispatchSummary::merge)
    });
    info!(
        dispatched = summary.dispatched,
        exited_nonzero = summary.exited_nonzero,
        failed_to_spawn = summary.failed_to_spawn,
        "dispatch finished"
    );
    Ok(summary)
}

fn run_single(run: &RunSpec, entry: &EntryPoint, results_dir: &Path, log_dir: &Path) -> Outcome {
    let log_path = log_dir.join(run.log_file_name());
    let streams = File::create(&log_path).and_then(|stdout| {
        let stderr = stdout.try_clone()?;
        Ok((stdout, stderr))
    });
    let (stdout, stderr) = match streams {
        Ok(streams) => streams,
        Err(err) => {
            warn!(
                part = %run.part,
                config_id = run.config_id,
                seed = run.seed,
                path = %log_path.display(),
                error = %err,
                "failed to create run log"
            );
            return Outcome::SpawnFailed;
        }
    };

    debug!(part = %run.part, version = run.version, config_id = run.config_id, seed = run.seed, "starting run");
    let status = entry
        .command(run, results_dir)
        .stdin(Stdio::null())
        .stdout(Stdio::from(stdout))
        .stderr(Stdio::from(stderr))
        .status();
    match status {
        Ok(status) if status.success() => Outcome::Success,
        Ok(status) => {
            warn!(
                part = %run.part,
                config_id = run.config_id,
                seed = run.seed,
                status = %status,
                "run exited unsuccessfully"
            );
            Outcome::NonZero
        }
        Err(err) => {
            warn!(
                part = %run.part,
                config_id = run.config_id,
                seed = run.seed,
                error = %err,
                "failed to spawn entry point"
            );
            Outcome::SpawnFailed
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summary_folds_outcomes() {
        let summary = [Outcome::Success, Outcome::NonZero, Outcome::SpawnFailed, Outcome::Success]
            .into_iter()
            .fold(DispatchSummary::default(), DispatchSummary::record);
        assert_eq!(summary.dispatched, 4);
        assert_eq!(summary.exited_nonzero, 1);
        assert_eq!(summary.failed_to_spawn, 1);
        assert_eq!(summary.succeeded(), 2);
        let merged = summary.merge(summary);
        assert_eq!(merged.dispatched, 8);
    }
}
