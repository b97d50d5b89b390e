use std::collections::{BTreeMap, BTreeSet};

use mlexp_core::{ConfigId, ErrorInfo, ExpError, Value, Version};
use rusqlite::Connection;

use crate::configuration::Configuration;
use crate::sqlite;
use crate::table::{parse_table_name, VersionTable};

/// Short-lived view over the versions of one part.
///
/// Built per operation on a single connection or transaction. Table schemas
/// are loaded eagerly; id sets are cached on first use. A context must be
/// rebuilt after any write to the part.
pub(crate) struct LookupContext<'c> {
    conn: &'c Connection,
    part: String,
    tables: BTreeMap<Version, VersionTable>,
    ids: BTreeMap<Version, BTreeSet<ConfigId>>,
}

impl<'c> LookupContext<'c> {
    pub(crate) fn load(conn: &'c Connection, part: &str) -> Result<Self, ExpError> {
        let mut tables = BTreeMap::new();
        for name in sqlite::list_tables(conn)? {
            match parse_table_name(&name) {
                Some((owner, version)) if owner == part => {
                    tables.insert(version, sqlite::load_version_table(conn, part, version)?);
                }
                _ => {}
            }
        }
        Ok(Self {
            conn,
            part: part.to_string(),
            tables,
            ids: BTreeMap::new(),
        })
    }

    pub(crate) fn latest(&self) -> Option<Version> {
        self.tables.keys().next_back().copied()
    }

    pub(crate) fn versions(&self) -> Vec<Version> {
        self.tables.keys().copied().collect()
    }

    pub(crate) fn table(&self, version: Version) -> Result<&VersionTable, ExpError> {
        self.tables.get(&version).ok_or_else(|| {
            let mut info = ErrorInfo::new("store.unknown_version", "version does not exist")
                .with_context("part", self.part.clone())
                .with_context("version", version.to_string());
            info = match self.latest() {
                Some(latest) => info.with_hint(format!("latest version is {latest}")),
                None => info.with_hint("part has no versions"),
            };
            ExpError::UnknownVersion(info)
        })
    }

    pub(crate) fn ids(&mut self, version: Version) -> Result<&BTreeSet<ConfigId>, ExpError> {
        let name = self.table(version)?.table_name();
        if !self.ids.contains_key(&version) {
            let ids = sqlite::select_ids(self.conn, &name)?;
            self.ids.insert(version, ids);
        }
        self.ids.get(&version).ok_or_else(|| {
            ExpError::Storage(ErrorInfo::new("store.id_cache", "id set missing after load"))
        })
    }

    /// Largest id ever assigned to the part across all versions.
    pub(crate) fn max_id(&self) -> Result<Option<ConfigId>, ExpError> {
        let mut max = None;
        for table in self.tables.values() {
            max = max.max(sqlite::max_id(self.conn, &table.table_name())?);
        }
        Ok(max)
    }

    /// Resolves the stored id of a configuration, newest version first.
    ///
    /// A version is eligible when its columns equal either the full key set or
    /// the prior-projected lookup key set; the first eligible version holding a
    /// matching row wins.
    pub(crate) fn find_id(
        &self,
        full: &[(&str, &Value)],
        lookup: &[(&str, &Value)],
    ) -> Result<Option<ConfigId>, ExpError> {
        let full_keys: BTreeSet<&str> = full.iter().map(|(k, _)| *k).collect();
        let lookup_keys: BTreeSet<&str> = lookup.iter().map(|(k, _)| *k).collect();
        for table in self.tables.values().rev() {
            let columns = table.column_set();
            let key = if columns == lookup_keys {
                lookup
            } else if columns == full_keys {
                full
            } else {
                continue;
            };
            let found = sqlite::find_id(self.conn, table, key.iter().copied())?;
            if let Some(id) = found {
                tracing::debug!(part = %self.part, version = table.version, id, "resolved stored id");
                return Ok(Some(id));
            }
        }
        Ok(None)
    }

    pub(crate) fn configuration(
        &mut self,
        version: Version,
        id: ConfigId,
    ) -> Result<Configuration, ExpError> {
        if !self.ids(version)?.contains(&id) {
            return Err(ExpError::UnknownConfiguration(
                ErrorInfo::new("store.unknown_configuration", "configuration id not in version")
                    .with_context("part", self.part.clone())
                    .with_context("version", version.to_string())
                    .with_context("config_id", id.to_string()),
            ));
        }
        let table = self.table(version)?;
        let row = sqlite::select_row(self.conn, table, id)?.ok_or_else(|| {
            ExpError::Storage(
                ErrorInfo::new("store.row_missing", "configuration row vanished during read")
                    .with_context("part", self.part.clone())
                    .with_context("config_id", id.to_string()),
            )
        })?;
        let values = table
            .columns
            .iter()
            .map(|column| column.name.clone())
            .zip(row)
            .collect();
        Ok(Configuration {
            id: Some(id),
            values,
        })
    }
}
