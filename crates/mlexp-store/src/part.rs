use mlexp_core::{ExpError, Value, Version};

use crate::paths::ResultsPath;
use crate::property::PropertySet;
use crate::store::ConfigStore;

/// Sweep builder bound to a part name and a store.
#[derive(Debug, Clone)]
pub struct DefinitionPart {
    name: String,
    store: ConfigStore,
    properties: PropertySet,
}

impl DefinitionPart {
    /// Empty part committing into the store of `results`.
    pub fn new(name: impl Into<String>, results: &ResultsPath) -> Self {
        Self::with_store(name, ConfigStore::at(results))
    }

    /// Empty part committing into `store`.
    pub fn with_store(name: impl Into<String>, store: ConfigStore) -> Self {
        Self {
            name: name.into(),
            store,
            properties: PropertySet::new(),
        }
    }

    /// Part name, used as the table name prefix.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Store the part commits into.
    pub fn store(&self) -> &ConfigStore {
        &self.store
    }

    /// Properties declared so far.
    pub fn properties(&self) -> &PropertySet {
        &self.properties
    }

    /// See [`PropertySet::add_property`].
    pub fn add_property(&mut self, key: impl Into<String>, value: impl Into<Value>) -> &mut Self {
        self.properties.add_property(key, value);
        self
    }

    /// See [`PropertySet::add_sweepable_property`].
    pub fn add_sweepable_property<I, V>(
        &mut self,
        key: impl Into<String>,
        values: I,
        assume_prior: Option<Value>,
    ) -> &mut Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.properties
            .add_sweepable_property(key, values, assume_prior);
        self
    }

    /// Persists the current property set; later mutations only affect the next commit.
    pub fn commit(&self) -> Result<Version, ExpError> {
        self.store.resolve_and_commit(&self.name, &self.properties)
    }
}
