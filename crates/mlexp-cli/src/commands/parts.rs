use std::collections::BTreeMap;
use std::error::Error;
use std::path::PathBuf;

use clap::Args;
use mlexp_core::{ConfigId, Version};
use mlexp_store::{ConfigStore, ResultsPath};
use serde::Serialize;

use crate::print_json;

#[derive(Args, Debug)]
pub struct PartsArgs {
    /// Results directory of the experiment.
    #[arg(long)]
    pub results: PathBuf,
}

#[derive(Debug, Serialize)]
struct PartSummary {
    versions: Vec<Version>,
    latest: Option<Version>,
    configurations: usize,
    max_configuration_id: Option<ConfigId>,
}

pub fn run(args: &PartsArgs) -> Result<(), Box<dyn Error>> {
    let store = ConfigStore::at(&ResultsPath::explicit(&args.results));
    let mut summary = BTreeMap::new();
    for part in store.get_parts()? {
        let versions = store.versions(&part)?;
        let latest = versions.last().copied();
        let configurations = match latest {
            Some(version) => store.get_configuration_ids(&part, version)?.len(),
            None => 0,
        };
        let max_configuration_id = store.max_configuration_id(&part)?;
        summary.insert(
            part,
            PartSummary {
                versions,
                latest,
                configurations,
                max_configuration_id,
            },
        );
    }
    print_json(&summary)
}
