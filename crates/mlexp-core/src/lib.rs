#![deny(missing_docs)]
#![doc = "Core error and value types shared by the mlexp sweep store and scheduler."]

pub mod errors;
pub mod value;

pub use errors::{ErrorInfo, ExpError};
pub use value::{Value, ValueKind};

/// Stable identifier of a configuration within a sweep.
pub type ConfigId = u64;

/// Schema version number of a sweep; versions start at 0.
pub type Version = u32;

/// Column name reserved for the configuration id.
pub const ID_KEY: &str = "id";

/// Key added to configurations when they are crossed with seeds.
pub const SEED_KEY: &str = "seed";
