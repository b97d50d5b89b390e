//! Versioned configuration store for hyperparameter sweeps.
//!
//! A sweep ("part") is declared as a [`PropertySet`]; committing it expands the
//! Cartesian product of its properties, resolves a stable id for every
//! configuration against earlier versions and writes a new immutable version
//! table only when the id set changed.

#![deny(missing_docs)]

mod configuration;
mod context;
mod definition;
mod generate;
mod part;
mod paths;
mod property;
mod reader;
mod serde;
mod sqlite;
mod store;
mod table;

pub use configuration::Configuration;
pub use definition::{commit_definition, load_definition, DefinitionFile, PartDefinition};
pub use generate::{generate, Configurations};
pub use part::DefinitionPart;
pub use paths::{ResultsPath, STORE_FILE};
pub use property::PropertySet;
pub use reader::ConfigReader;
pub use store::ConfigStore;
pub use table::{parse_table_name, table_name, Column, ColumnKind, VersionTable};

pub use crate::serde::{from_yaml_slice, to_canonical_json_bytes};
