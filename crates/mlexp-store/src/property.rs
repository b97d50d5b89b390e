use indexmap::{IndexMap, IndexSet};
use mlexp_core::{ErrorInfo, ExpError, Value, ID_KEY};

use crate::configuration::Configuration;

/// Named properties of a sweep, each with a finite domain of values.
///
/// Keys and values keep insertion order; that order drives configuration
/// generation. A key may also carry an assumed prior value, the value the
/// property is deemed to have had before it was introduced.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PropertySet {
    properties: IndexMap<String, IndexSet<Value>>,
    priors: IndexMap<String, Value>,
}

impl PropertySet {
    /// Creates an empty property set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `value` to the domain of `key`. Adding a present value is a no-op.
    pub fn add_property(&mut self, key: impl Into<String>, value: impl Into<Value>) -> &mut Self {
        self.properties
            .entry(key.into())
            .or_default()
            .insert(value.into());
        self
    }

    /// Unions `values` into the domain of `key`, recording `assume_prior` when given.
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
        let key = key.into();
        self.properties
            .entry(key.clone())
            .or_default()
            .extend(values.into_iter().map(Into::into));
        if let Some(prior) = assume_prior {
            self.priors.insert(key, prior);
        }
        self
    }

    /// True when no property has been added.
    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }

    /// Number of property keys.
    pub fn len(&self) -> usize {
        self.properties.len()
    }

    /// Property keys in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &str> + '_ {
        self.properties.keys().map(String::as_str)
    }

    /// Values of `key` in insertion order.
    pub fn domain(&self, key: &str) -> Option<&IndexSet<Value>> {
        self.properties.get(key)
    }

    /// Value `key` is assumed to have held before it existed, if any.
    pub fn assumed_prior(&self, key: &str) -> Option<&Value> {
        self.priors.get(key)
    }

    pub(crate) fn iter(&self) -> indexmap::map::Iter<'_, String, IndexSet<Value>> {
        self.properties.iter()
    }

    /// Checks that the set can be expanded into at least one configuration.
    pub fn validate(&self) -> Result<(), ExpError> {
        if self.properties.is_empty() {
            return Err(ExpError::InvalidPropertySet(
                ErrorInfo::new("property_set.empty", "no properties defined")
                    .with_hint("add at least one property before committing"),
            ));
        }
        if self.properties.contains_key(ID_KEY) {
            return Err(ExpError::InvalidPropertySet(
                ErrorInfo::new("property_set.reserved_key", "property key is reserved")
                    .with_context("key", ID_KEY),
            ));
        }
        if let Some((key, _)) = self.properties.iter().find(|(_, domain)| domain.is_empty()) {
            return Err(ExpError::InvalidPropertySet(
                ErrorInfo::new("property_set.empty_domain", "property has no values")
                    .with_context("key", key.clone()),
            ));
        }
        let values = self.properties.values().flatten().chain(self.priors.values());
        for value in values {
            value.ensure_finite()?;
        }
        Ok(())
    }

    /// Projects a configuration onto the keys whose value differs from the assumed prior.
    pub fn lookup_key(&self, configuration: &Configuration) -> IndexMap<String, Value> {
        configuration
            .values
            .iter()
            .filter(|(key, value)| self.priors.get(key.as_str()) != Some(*value))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect()
    }
}
