use std::ffi::OsString;
use std::path::Path;
use std::process::Command;

use mlexp_core::{ConfigId, Version};
use serde::{Deserialize, Serialize};

/// One `(part, version, configuration, seed)` unit of work.
///
/// Ordering follows field order, so a set of run units enumerates the same
/// way on every call.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RunSpec {
    /// Part (sweep) name.
    pub part: String,
    /// Schema version the configuration id belongs to.
    pub version: Version,
    /// Configuration id within `version`.
    pub config_id: ConfigId,
    /// Random seed.
    pub seed: u64,
}

impl RunSpec {
    /// Builds a run unit.
    pub fn new(part: impl Into<String>, version: Version, config_id: ConfigId, seed: u64) -> Self {
        Self {
            part: part.into(),
            version,
            config_id,
            seed,
        }
    }

    /// Expands `{part}`, `{version}`, `{config_id}` and `{seed}` in `template`.
    pub fn render(&self, template: &str) -> String {
        template
            .replace("{part}", &self.part)
            .replace("{version}", &self.version.to_string())
            .replace("{config_id}", &self.config_id.to_string())
            .replace("{seed}", &self.seed.to_string())
    }

    /// File name capturing the output of this run.
    pub fn log_file_name(&self) -> String {
        self.render("{part}-v{version}-c{config_id}-s{seed}.log")
    }
}

/// External program invoked once per run unit.
///
/// The run arguments are appended after `args` as
/// `--part P --config-id C --seed S --version V --results-path DIR`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryPoint {
    /// Program to execute.
    pub program: OsString,
    /// Leading arguments, e.g. the script path for an interpreter.
    pub args: Vec<OsString>,
}

impl EntryPoint {
    /// Entry point running `program` with `args` before the run arguments.
    pub fn new<P, I, A>(program: P, args: I) -> Self
    where
        P: Into<OsString>,
        I: IntoIterator<Item = A>,
        A: Into<OsString>,
    {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }

    /// Builds the command for one run without spawning it.
    pub fn command(&self, run: &RunSpec, results_dir: &Path) -> Command {
        let mut command = Command::new(&self.program);
        command
            .args(&self.args)
            .arg("--part")
            .arg(&run.part)
            .arg("--config-id")
            .arg(run.config_id.to_string())
            .arg("--seed")
            .arg(run.seed.to_string())
            .arg("--version")
            .arg(run.version.to_string())
            .arg("--results-path")
            .arg(results_dir);
        command
    }
}
