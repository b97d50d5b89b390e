use std::collections::{BTreeMap, BTreeSet};

use mlexp_core::{ErrorInfo, ExpError, Version};
use mlexp_store::{ConfigStore, ResultsPath};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::RunConfig;
use crate::dispatch::{run_local, DispatchSummary};
use crate::run::{EntryPoint, RunSpec};

/// Which version of each part to enumerate.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VersionSpec {
    /// The latest version of every part, resolved at enumeration time.
    #[default]
    Latest,
    /// The same version for every part.
    Fixed(Version),
    /// Per-part versions; absent parts and `None` entries use the latest.
    PerPart(BTreeMap<String, Option<Version>>),
}

impl VersionSpec {
    fn requested(&self, part: &str) -> Option<Version> {
        match self {
            VersionSpec::Latest => None,
            VersionSpec::Fixed(version) => Some(*version),
            VersionSpec::PerPart(versions) => versions.get(part).copied().flatten(),
        }
    }
}

/// Enumerates and dispatches the run units of one experiment.
///
/// A scheduler starts empty; [`Scheduler::get_all_runs`] fills its run set
/// from the store and [`Scheduler::filter`] derives narrower schedulers
/// without touching the original.
#[derive(Debug, Clone)]
pub struct Scheduler {
    results: ResultsPath,
    store: ConfigStore,
    seeds: Vec<u64>,
    entry: EntryPoint,
    version: VersionSpec,
    runs: BTreeSet<RunSpec>,
}

impl Scheduler {
    /// Creates a scheduler for the experiment stored under `results`.
    ///
    /// Fails when the experiment has no store file yet.
    pub fn new(
        results: ResultsPath,
        seeds: Vec<u64>,
        entry: EntryPoint,
        version: VersionSpec,
    ) -> Result<Self, ExpError> {
        let store = ConfigStore::at(&results);
        if !store.exists() {
            return Err(ExpError::Storage(
                ErrorInfo::new("scheduler.store_missing", "experiment store does not exist")
                    .with_context("path", store.path().display().to_string())
                    .with_hint("commit a definition before scheduling runs"),
            ));
        }
        Ok(Self {
            results,
            store,
            seeds,
            entry,
            version,
            runs: BTreeSet::new(),
        })
    }

    /// Resolves the effective version of every part in the store.
    pub fn resolve_versions(&self) -> Result<BTreeMap<String, Version>, ExpError> {
        let mut resolved = BTreeMap::new();
        for part in self.store.get_parts()? {
            let version = match self.version.requested(&part) {
                Some(version) => version,
                None => self.store.latest_version(&part)?.ok_or_else(|| {
                    ExpError::UnknownVersion(
                        ErrorInfo::new("scheduler.no_versions", "part has no versions")
                            .with_context("part", part.clone()),
                    )
                })?,
            };
            resolved.insert(part, version);
        }
        Ok(resolved)
    }

    /// Adds `parts x configuration ids x seeds` to the run set.
    pub fn get_all_runs(mut self) -> Result<Self, ExpError> {
        for (part, version) in self.resolve_versions()? {
            let ids = self.store.get_configuration_ids(&part, version)?;
            debug!(part = %part, version, configurations = ids.len(), "enumerating runs");
            for id in ids {
                for &seed in &self.seeds {
                    self.runs.insert(RunSpec::new(part.clone(), version, id, seed));
                }
            }
        }
        Ok(self)
    }

    /// Returns a new scheduler holding the runs for which `already_exists`
    /// is false.
    pub fn filter<F>(&self, already_exists: F) -> Scheduler
    where
        F: Fn(&RunSpec) -> bool,
    {
        Scheduler {
            runs: self
                .runs
                .iter()
                .filter(|run| !already_exists(run))
                .cloned()
                .collect(),
            ..self.clone_without_runs()
        }
    }

    /// Dispatches every run in the set and waits for all of them.
    pub fn run(&self, config: &RunConfig) -> Result<DispatchSummary, ExpError> {
        info!(runs = self.runs.len(), "dispatching runs");
        match config {
            RunConfig::Local(local) => run_local(&self.runs, &self.entry, self.results.dir(), local),
        }
    }

    /// Current run set in enumeration order.
    pub fn runs(&self) -> &BTreeSet<RunSpec> {
        &self.runs
    }

    /// Number of runs in the set.
    pub fn len(&self) -> usize {
        self.runs.len()
    }

    /// True when no runs are scheduled.
    pub fn is_empty(&self) -> bool {
        self.runs.is_empty()
    }

    /// Seeds crossed with every configuration.
    pub fn seeds(&self) -> &[u64] {
        &self.seeds
    }

    /// Results directory passed to the entry point.
    pub fn results(&self) -> &ResultsPath {
        &self.results
    }

    fn clone_without_runs(&self) -> Scheduler {
        Scheduler {
            results: self.results.clone(),
            store: self.store.clone(),
            seeds: self.seeds.clone(),
            entry: self.entry.clone(),
            version: self.version.clone(),
            runs: BTreeSet::new(),
        }
    }
}
