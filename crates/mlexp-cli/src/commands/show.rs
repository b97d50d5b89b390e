use std::error::Error;
use std::path::PathBuf;

use clap::Args;
use mlexp_core::{ConfigId, Version};
use mlexp_store::{ConfigReader, ResultsPath};

use crate::print_json;

#[derive(Args, Debug)]
pub struct ShowArgs {
    /// Results directory of the experiment.
    #[arg(long)]
    pub results: PathBuf,
    /// Part whose configurations are printed.
    #[arg(long)]
    pub part: String,
    /// Version the ids belong to.
    #[arg(long)]
    pub version: Version,
    /// Configuration ids, printed in the given order.
    #[arg(long = "config-id", num_args = 1.., required = true)]
    pub config_ids: Vec<ConfigId>,
    /// Seeds crossed with every configuration.
    #[arg(long, num_args = 1..)]
    pub seeds: Vec<u64>,
}

pub fn run(args: &ShowArgs) -> Result<(), Box<dyn Error>> {
    let reader = ConfigReader::new(&ResultsPath::explicit(&args.results));
    let seeds = (!args.seeds.is_empty()).then_some(args.seeds.as_slice());
    let configs = reader.get_configs(&args.part, args.version, &args.config_ids, seeds)?;
    let rendered: Vec<serde_json::Value> = configs.iter().map(|config| config.to_json()).collect();
    print_json(&rendered)
}
