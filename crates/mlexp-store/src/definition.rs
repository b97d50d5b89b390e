//! YAML sweep definitions.
//!
//! ```yaml
//! parts:
//!   - name: softmaxAC-mc
//!     properties:
//!       alpha: [0.05, 0.01]   # list: sweepable
//!       n_step: 1             # scalar: fixed
//!     assume_prior:
//!       n_step: 1
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use indexmap::IndexMap;
use mlexp_core::{ErrorInfo, ExpError, Value, Version};
use serde::{Deserialize, Serialize};

use crate::property::PropertySet;
use crate::serde::from_yaml_slice;
use crate::store::ConfigStore;

/// Collection of part definitions loaded from one file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DefinitionFile {
    /// Parts in file order.
    pub parts: Vec<PartDefinition>,
}

/// Declarative form of a single part.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PartDefinition {
    /// Part name.
    pub name: String,
    /// A list value is a sweepable domain, anything else a single fixed value.
    #[serde(default)]
    pub properties: IndexMap<String, serde_json::Value>,
    /// Assumed prior per property key; every key must also be in `properties`.
    #[serde(default)]
    pub assume_prior: IndexMap<String, serde_json::Value>,
}

impl PartDefinition {
    /// Converts the raw definition into a [`PropertySet`], checking value kinds.
    pub fn to_property_set(&self) -> Result<PropertySet, ExpError> {
        if let Some(orphan) = self
            .assume_prior
            .keys()
            .find(|key| !self.properties.contains_key(*key))
        {
            return Err(ExpError::InvalidPropertySet(
                ErrorInfo::new(
                    "definition.orphan_prior",
                    "assumed prior given for an undeclared property",
                )
                .with_context("part", self.name.clone())
                .with_context("key", orphan.clone()),
            ));
        }
        let mut set = PropertySet::new();
        for (key, raw) in &self.properties {
            let values = match raw {
                serde_json::Value::Array(items) => items
                    .iter()
                    .map(Value::try_from)
                    .collect::<Result<Vec<_>, _>>()?,
                scalar => vec![Value::try_from(scalar)?],
            };
            let prior = self
                .assume_prior
                .get(key)
                .map(Value::try_from)
                .transpose()?;
            set.add_sweepable_property(key.clone(), values, prior);
        }
        Ok(set)
    }
}

/// Reads and parses a YAML definition file.
pub fn load_definition<P: AsRef<Path>>(path: P) -> Result<DefinitionFile, ExpError> {
    let path = path.as_ref();
    let bytes = fs::read(path).map_err(|err| {
        ExpError::Io(
            ErrorInfo::new("definition.read", "failed to read definition file")
                .with_context("path", path.display().to_string())
                .with_hint(err.to_string()),
        )
    })?;
    from_yaml_slice(&bytes)
}

/// Commits every part of `definition`, returning the authoritative version per part.
pub fn commit_definition(
    store: &ConfigStore,
    definition: &DefinitionFile,
) -> Result<BTreeMap<String, Version>, ExpError> {
    let mut versions = BTreeMap::new();
    for part in &definition.parts {
        let properties = part.to_property_set()?;
        let version = store.resolve_and_commit(&part.name, &properties)?;
        versions.insert(part.name.clone(), version);
    }
    Ok(versions)
}
