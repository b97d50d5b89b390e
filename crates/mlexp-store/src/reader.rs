use mlexp_core::{ConfigId, ExpError, Version};

use crate::configuration::Configuration;
use crate::paths::ResultsPath;
use crate::store::ConfigStore;

/// Read-only access to committed configurations, as used by entry points.
#[derive(Debug, Clone)]
pub struct ConfigReader {
    store: ConfigStore,
}

impl ConfigReader {
    /// Reader over the store of an experiment's results directory.
    pub fn new(results: &ResultsPath) -> Self {
        Self::from_store(ConfigStore::at(results))
    }

    /// Reader over an already located store.
    pub fn from_store(store: ConfigStore) -> Self {
        Self { store }
    }

    /// Underlying store.
    pub fn store(&self) -> &ConfigStore {
        &self.store
    }

    /// Reads the configuration with id `id` from `version` of `part`.
    pub fn get_config(
        &self,
        part: &str,
        version: Version,
        id: ConfigId,
    ) -> Result<Configuration, ExpError> {
        self.store.get_configuration(part, version, id)
    }

    /// Looks up each id in caller order, optionally crossed with seeds.
    ///
    /// Repeated ids are resolved once per occurrence. With `product_seeds`
    /// the output is config-major, seed-minor and every entry gains a `seed`
    /// key.
    pub fn get_configs(
        &self,
        part: &str,
        version: Version,
        ids: &[ConfigId],
        product_seeds: Option<&[u64]>,
    ) -> Result<Vec<Configuration>, ExpError> {
        let configs = self.store.read(part, |ctx| {
            ids.iter()
                .map(|&id| ctx.configuration(version, id))
                .collect::<Result<Vec<_>, _>>()
        })?;
        Ok(match product_seeds {
            Some(seeds) => configs
                .iter()
                .flat_map(|config| seeds.iter().map(move |&seed| config.with_seed(seed)))
                .collect(),
            None => configs,
        })
    }
}
