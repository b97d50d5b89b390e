use std::collections::{BTreeSet, HashSet};
use std::path::{Path, PathBuf};

use mlexp_core::{ConfigId, ErrorInfo, ExpError, Value, Version};
use rusqlite::Connection;
use tracing::{debug, info, warn};

use crate::configuration::Configuration;
use crate::context::LookupContext;
use crate::generate::generate;
use crate::paths::ResultsPath;
use crate::property::PropertySet;
use crate::sqlite;
use crate::table::{parse_table_name, table_name, VersionTable};

/// Append-only versioned store of sweep configurations.
///
/// Every operation opens its own connection. Commits take the store's write
/// lock for their whole duration; a commit that cannot get the lock in time
/// fails with [`ExpError::ConcurrentWriteConflict`] and leaves no trace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigStore {
    path: PathBuf,
}

impl ConfigStore {
    /// Store backed by the SQLite file at `path`. No I/O happens until first use.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store living in the results directory of an experiment.
    pub fn at(results: &ResultsPath) -> Self {
        Self::open(results.store_path())
    }

    /// Location of the SQLite file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// True once something has been committed.
    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Highest version of `part`, or `None` when it has never been committed.
    pub fn latest_version(&self, part: &str) -> Result<Option<Version>, ExpError> {
        self.read(part, |ctx| Ok(ctx.latest()))
    }

    /// All versions of `part` in ascending order.
    pub fn versions(&self, part: &str) -> Result<Vec<Version>, ExpError> {
        self.read(part, |ctx| Ok(ctx.versions()))
    }

    /// Schema of one version of `part`.
    pub fn version_table(&self, part: &str, version: Version) -> Result<VersionTable, ExpError> {
        self.read(part, |ctx| ctx.table(version).cloned())
    }

    /// Largest configuration id ever assigned to `part`.
    pub fn max_configuration_id(&self, part: &str) -> Result<Option<ConfigId>, ExpError> {
        self.read(part, |ctx| ctx.max_id())
    }

    /// Ids of the configurations belonging to `version` of `part`.
    pub fn get_configuration_ids(
        &self,
        part: &str,
        version: Version,
    ) -> Result<BTreeSet<ConfigId>, ExpError> {
        self.read(part, |ctx| ctx.ids(version).cloned())
    }

    /// Reads one configuration, fails with [`ExpError::UnknownConfiguration`]
    /// when `id` is not part of `version`.
    pub fn get_configuration(
        &self,
        part: &str,
        version: Version,
        id: ConfigId,
    ) -> Result<Configuration, ExpError> {
        self.read(part, |ctx| ctx.configuration(version, id))
    }

    /// All part names that own at least one version table.
    pub fn get_parts(&self) -> Result<BTreeSet<String>, ExpError> {
        let conn = sqlite::open_for_read(&self.path)?;
        let tables = sqlite::list_tables(&conn)?;
        Ok(tables
            .iter()
            .filter_map(|name| parse_table_name(name))
            .map(|(part, _)| part.to_string())
            .collect())
    }

    /// Resolves ids for every configuration of `properties` and materialises a
    /// new version when the id set differs from the latest version's.
    ///
    /// Returns the version holding the authoritative configuration set. The
    /// whole commit runs in one immediate transaction: the new table and all
    /// of its rows land together or not at all. Once committed, the new
    /// version is read back on a separate connection and its id set checked.
    pub fn resolve_and_commit(
        &self,
        part: &str,
        properties: &PropertySet,
    ) -> Result<Version, ExpError> {
        let candidates: Vec<Configuration> = generate(properties)?.collect();
        let mut conn = sqlite::open_for_write(&self.path)?;
        let tx = sqlite::begin_immediate(&mut conn)?;

        let plan = plan_commit(&tx, part, properties, &candidates)?;
        let (version, written) = match plan {
            CommitPlan::Unchanged(version) => {
                debug!(part, version, "configuration set unchanged, skipping new version");
                (version, None)
            }
            CommitPlan::Create { version, ids } => {
                materialise(&tx, part, version, properties, &candidates, &ids)?;
                (version, Some(ids))
            }
        };
        tx.commit()
            .map_err(|err| sqlite::sqlite_error("store.sqlite_commit", err))?;

        if let Some(ids) = written {
            let expected: BTreeSet<ConfigId> = ids.into_iter().collect();
            let stored = self.get_configuration_ids(part, version)?;
            if stored != expected {
                return Err(conflict(part, version, "committed id set differs from the resolved one"));
            }
            info!(
                part,
                version,
                configurations = candidates.len(),
                "created configuration version"
            );
        }
        Ok(version)
    }

    pub(crate) fn read<T>(
        &self,
        part: &str,
        op: impl FnOnce(&mut LookupContext<'_>) -> Result<T, ExpError>,
    ) -> Result<T, ExpError> {
        let conn = sqlite::open_for_read(&self.path)?;
        let mut ctx = LookupContext::load(&conn, part)?;
        op(&mut ctx)
    }
}

enum CommitPlan {
    Unchanged(Version),
    Create {
        version: Version,
        ids: Vec<ConfigId>,
    },
}

fn plan_commit(
    conn: &Connection,
    part: &str,
    properties: &PropertySet,
    candidates: &[Configuration],
) -> Result<CommitPlan, ExpError> {
    let mut ctx = LookupContext::load(conn, part)?;
    let ids = resolve_ids(&ctx, part, properties, candidates)?;
    let expected: BTreeSet<ConfigId> = ids.iter().copied().collect();
    let Some(latest) = ctx.latest() else {
        return Ok(CommitPlan::Create { version: 0, ids });
    };
    if ctx.ids(latest)? == &expected {
        return Ok(CommitPlan::Unchanged(latest));
    }
    Ok(CommitPlan::Create {
        version: latest + 1,
        ids,
    })
}

fn resolve_ids(
    ctx: &LookupContext<'_>,
    part: &str,
    properties: &PropertySet,
    candidates: &[Configuration],
) -> Result<Vec<ConfigId>, ExpError> {
    let mut next_id = ctx.max_id()?.map_or(0, |max| max + 1);
    let mut claimed = HashSet::with_capacity(candidates.len());
    let mut ids = Vec::with_capacity(candidates.len());
    for candidate in candidates {
        let full: Vec<(&str, &Value)> = candidate
            .values
            .iter()
            .map(|(k, v)| (k.as_str(), v))
            .collect();
        let projected = properties.lookup_key(candidate);
        let lookup: Vec<(&str, &Value)> = projected.iter().map(|(k, v)| (k.as_str(), v)).collect();
        let id = match ctx.find_id(&full, &lookup)? {
            Some(id) if !claimed.contains(&id) => id,
            found => {
                if let Some(id) = found {
                    warn!(part, id, "stored id already claimed in this commit, assigning a fresh id");
                }
                let fresh = next_id;
                next_id += 1;
                fresh
            }
        };
        claimed.insert(id);
        ids.push(id);
    }
    Ok(ids)
}

/// Writes the table of a new version inside the commit transaction.
///
/// The table-exists check cannot fire while the transaction holds the write
/// lock; it guards against a store edited outside this crate.
fn materialise(
    conn: &Connection,
    part: &str,
    version: Version,
    properties: &PropertySet,
    candidates: &[Configuration],
    ids: &[ConfigId],
) -> Result<(), ExpError> {
    let name = table_name(part, version);
    if sqlite::list_tables(conn)?.contains(&name) {
        return Err(conflict(part, version, "version table already exists"));
    }
    let table = VersionTable::for_properties(part, version, properties);
    sqlite::create_table(conn, &table)?;
    let rows = candidates.iter().zip(ids).map(|(candidate, &id)| {
        let values = table
            .columns
            .iter()
            .filter_map(|column| candidate.get(&column.name))
            .collect::<Vec<_>>();
        (values, id)
    });
    sqlite::insert_rows(conn, &table, rows)?;
    Ok(())
}

fn conflict(part: &str, version: Version, message: &str) -> ExpError {
    ExpError::ConcurrentWriteConflict(
        ErrorInfo::new("store.concurrent_write", message)
            .with_context("part", part)
            .with_context("version", version.to_string())
            .with_hint("serialise commits to one part through a single writer"),
    )
}

#[cfg(test)]
mod tests {
    use mlexp_core::Value;

    use super::*;

    #[test]
    fn materialise_refuses_an_existing_version_table() {
        let conn = Connection::open_in_memory().expect("open");
        let mut props = PropertySet::new();
        props.add_sweepable_property("lr", [0.1, 0.2], None);
        let candidates: Vec<Configuration> = generate(&props).expect("generate").collect();
        sqlite::create_table(&conn, &VersionTable::for_properties("p", 0, &props)).expect("create");

        let err = materialise(&conn, "p", 0, &props, &candidates, &[0, 1]).expect_err("exists");
        assert!(matches!(err, ExpError::ConcurrentWriteConflict(_)));
        assert_eq!(err.code(), "store.concurrent_write");
        assert_eq!(err.info().context.get("version").map(String::as_str), Some("0"));

        materialise(&conn, "p", 1, &props, &candidates, &[0, 1]).expect("fresh version");
        let mut ctx = LookupContext::load(&conn, "p").expect("load");
        assert_eq!(ctx.ids(1).expect("ids"), &BTreeSet::from([0, 1]));
        assert_eq!(
            ctx.configuration(1, 1).expect("row").get("lr"),
            Some(&Value::Real(0.2))
        );
    }
}
