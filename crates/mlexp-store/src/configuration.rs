use indexmap::IndexMap;
use mlexp_core::{ConfigId, Value, ID_KEY, SEED_KEY};
use serde::{Deserialize, Serialize};

/// One full assignment of property values, with an id once persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Configuration {
    /// Stored id; `None` until the configuration has been resolved.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<ConfigId>,
    /// Property values keyed by property name, in property order.
    pub values: IndexMap<String, Value>,
}

impl Configuration {
    /// Builds an unpersisted configuration from key/value pairs.
    pub fn new<K, I>(values: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, Value)>,
    {
        Self {
            id: None,
            values: values.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }

    /// Sets the stored id.
    pub fn with_id(mut self, id: ConfigId) -> Self {
        self.id = Some(id);
        self
    }

    /// Value of property `key`.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    /// Returns a copy extended with a `seed` entry.
    pub fn with_seed(&self, seed: u64) -> Self {
        let mut next = self.clone();
        let value = i64::try_from(seed).map_or_else(|_| Value::Text(seed.to_string()), Value::Int);
        next.values.insert(SEED_KEY.to_string(), value);
        next
    }

    /// Renders the configuration as a flat mapping including `id` when assigned.
    pub fn to_map(&self) -> IndexMap<String, Value> {
        let mut map = self.values.clone();
        if let Some(id) = self.id {
            let value = i64::try_from(id).map_or_else(|_| Value::Text(id.to_string()), Value::Int);
            map.insert(ID_KEY.to_string(), value);
        }
        map
    }

    /// [`Configuration::to_map`] as a JSON object.
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::Value::Object(
            self.to_map()
                .into_iter()
                .map(|(key, value)| (key, value.to_json()))
                .collect(),
        )
    }
}
