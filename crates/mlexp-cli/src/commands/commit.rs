use std::error::Error;
use std::path::PathBuf;

use clap::Args;
use mlexp_store::{commit_definition, load_definition, ConfigStore, ResultsPath};

use crate::print_json;

#[derive(Args, Debug)]
pub struct CommitArgs {
    /// Results directory of the experiment; holds `metadata.db`.
    #[arg(long)]
    pub results: PathBuf,
    /// YAML file listing the parts to commit.
    #[arg(long)]
    pub definition: PathBuf,
}

pub fn run(args: &CommitArgs) -> Result<(), Box<dyn Error>> {
    let definition = load_definition(&args.definition)?;
    let store = ConfigStore::at(&ResultsPath::explicit(&args.results));
    let versions = commit_definition(&store, &definition)?;
    print_json(&versions)
}
