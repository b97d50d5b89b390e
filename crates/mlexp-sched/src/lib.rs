#![deny(missing_docs)]
#![doc = "Local run scheduler for committed mlexp sweeps."]

/// Run-configuration variants and their YAML loading.
pub mod config;
/// Worker pool dispatch of run units to the entry point.
pub mod dispatch;
/// Run units and entry point invocation.
pub mod run;
/// Enumeration and filtering of run units.
pub mod scheduler;

pub use config::{load_run_config, LocalRunConfig, RunConfig};
pub use dispatch::DispatchSummary;
pub use run::{EntryPoint, RunSpec};
pub use scheduler::{Scheduler, VersionSpec};
