use std::collections::BTreeMap;
use std::error::Error;
use std::path::PathBuf;

use clap::Args;
use mlexp_core::Version;
use mlexp_sched::{
    load_run_config, EntryPoint, LocalRunConfig, RunConfig, Scheduler, VersionSpec,
};
use mlexp_store::ResultsPath;
use tracing::info;

use crate::print_json;

#[derive(Args, Debug)]
pub struct RunArgs {
    /// Results directory of the experiment.
    #[arg(long)]
    pub results: PathBuf,
    /// Seeds crossed with every configuration.
    #[arg(long, num_args = 1.., required = true)]
    pub seeds: Vec<u64>,
    /// Version used for every part; defaults to each part's latest.
    #[arg(long, conflicts_with = "part_versions")]
    pub version: Option<Version>,
    /// Per-part version as `PART=VERSION`; may be repeated.
    #[arg(long = "part-version", value_parser = parse_part_version)]
    pub part_versions: Vec<(String, Version)>,
    /// YAML run configuration; overrides `--parallelism` and `--log-path`.
    #[arg(long, conflicts_with_all = ["parallelism", "log_path"])]
    pub run_config: Option<PathBuf>,
    /// Entry point processes running at once.
    #[arg(long, default_value_t = 1)]
    pub parallelism: usize,
    /// Log directory, relative to the results directory unless absolute.
    #[arg(long, default_value = ".logs/")]
    pub log_path: PathBuf,
    /// Path template, relative to the results directory, whose existence
    /// marks a run as done, e.g. `{part}/{config_id}_{seed}.json`.
    #[arg(long)]
    pub done_marker: Option<String>,
    /// Only print the runs that would be dispatched.
    #[arg(long)]
    pub dry_run: bool,
    /// Entry point program followed by its leading arguments.
    #[arg(last = true, num_args = 1.., required = true)]
    pub command: Vec<String>,
}

fn parse_part_version(raw: &str) -> Result<(String, Version), String> {
    let (part, version) = raw
        .rsplit_once('=')
        .ok_or_else(|| format!("expected PART=VERSION, got `{raw}`"))?;
    let version = version
        .parse()
        .map_err(|err| format!("invalid version in `{raw}`: {err}"))?;
    Ok((part.to_string(), version))
}

impl RunArgs {
    fn version_spec(&self) -> VersionSpec {
        if let Some(version) = self.version {
            return VersionSpec::Fixed(version);
        }
        if self.part_versions.is_empty() {
            return VersionSpec::Latest;
        }
        let versions: BTreeMap<String, Option<Version>> = self
            .part_versions
            .iter()
            .map(|(part, version)| (part.clone(), Some(*version)))
            .collect();
        VersionSpec::PerPart(versions)
    }

    fn run_config(&self) -> Result<RunConfig, Box<dyn Error>> {
        match &self.run_config {
            Some(path) => Ok(load_run_config(path)?),
            None => Ok(RunConfig::Local(LocalRunConfig {
                parallelism: self.parallelism,
                log_path: self.log_path.clone(),
            })),
        }
    }

    fn entry_point(&self) -> Result<EntryPoint, Box<dyn Error>> {
        let (program, args) = self
            .command
            .split_first()
            .ok_or("missing entry point program after `--`")?;
        Ok(EntryPoint::new(program, args))
    }
}

pub fn run(args: &RunArgs) -> Result<(), Box<dyn Error>> {
    let results = ResultsPath::explicit(&args.results);
    let config = args.run_config()?;
    let scheduler = Scheduler::new(
        results.clone(),
        args.seeds.clone(),
        args.entry_point()?,
        args.version_spec(),
    )?
    .get_all_runs()?;

    let pending = match &args.done_marker {
        Some(template) => {
            let pending = scheduler.filter(|run| results.dir().join(run.render(template)).exists());
            info!(
                total = scheduler.len(),
                pending = pending.len(),
                "skipping runs with done markers"
            );
            pending
        }
        None => scheduler,
    };

    if args.dry_run {
        return print_json(pending.runs());
    }
    let summary = pending.run(&config)?;
    print_json(&summary)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn part_versions_split_on_last_equals() {
        assert_eq!(
            parse_part_version("lr=sweep=3"),
            Ok(("lr=sweep".to_string(), 3))
        );
        assert!(parse_part_version("qrc").is_err());
        assert!(parse_part_version("qrc=latest").is_err());
    }
}
