//! Thin table primitives over SQLite.
//!
//! Identifiers are always double quoted so part names and property keys may
//! contain any character.

use std::collections::BTreeSet;
use std::fs;
use std::path::Path;
use std::time::Duration;

use mlexp_core::{ConfigId, ErrorInfo, ExpError, Value, ID_KEY};
use rusqlite::types::{Value as SqlValue, ValueRef};
use rusqlite::{
    params_from_iter, Connection, ErrorCode, OptionalExtension, Transaction, TransactionBehavior,
};

use crate::table::{Column, ColumnKind, VersionTable};

/// How long a writer waits for another writer's lock before giving up.
const BUSY_TIMEOUT: Duration = Duration::from_secs(2);

pub(crate) fn sqlite_error(code: &str, err: rusqlite::Error) -> ExpError {
    ExpError::Storage(ErrorInfo::new(code, "sqlite failure").with_hint(err.to_string()))
}

/// Opens the store file for writing, creating it and its parent directory.
pub(crate) fn open_for_write(path: &Path) -> Result<Connection, ExpError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|err| {
            ExpError::Io(
                ErrorInfo::new("store.create_dir", "failed to create store directory")
                    .with_context("path", parent.display().to_string())
                    .with_hint(err.to_string()),
            )
        })?;
    }
    let open_error = |err: rusqlite::Error| {
        ExpError::Storage(
            ErrorInfo::new("store.sqlite_open", "failed to open sqlite store")
                .with_context("path", path.display().to_string())
                .with_hint(err.to_string()),
        )
    };
    let conn = Connection::open(path).map_err(open_error)?;
    conn.busy_timeout(BUSY_TIMEOUT).map_err(open_error)?;
    Ok(conn)
}

/// Opens the store file for reading; a missing file reads as an empty store.
pub(crate) fn open_for_read(path: &Path) -> Result<Connection, ExpError> {
    if path.exists() {
        open_for_write(path)
    } else {
        tracing::debug!(path = %path.display(), "store file missing, reading as empty");
        Connection::open_in_memory().map_err(|err| sqlite_error("store.sqlite_open", err))
    }
}

/// Takes the write lock up front. A lock still held by another writer after
/// [`BUSY_TIMEOUT`] is reported as [`ExpError::ConcurrentWriteConflict`].
pub(crate) fn begin_immediate(conn: &mut Connection) -> Result<Transaction<'_>, ExpError> {
    conn.transaction_with_behavior(TransactionBehavior::Immediate)
        .map_err(|err| match err {
            rusqlite::Error::SqliteFailure(ref failure, _)
                if matches!(
                    failure.code,
                    ErrorCode::DatabaseBusy | ErrorCode::DatabaseLocked
                ) =>
            {
                ExpError::ConcurrentWriteConflict(
                    ErrorInfo::new("store.writer_busy", "another writer holds the store lock")
                        .with_context("timeout_ms", BUSY_TIMEOUT.as_millis().to_string())
                        .with_hint(err.to_string()),
                )
            }
            err => sqlite_error("store.sqlite_transaction", err),
        })
}

pub(crate) fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

pub(crate) fn list_tables(conn: &Connection) -> Result<BTreeSet<String>, ExpError> {
    let mut stmt = conn
        .prepare("SELECT name FROM sqlite_master WHERE type = 'table'")
        .map_err(|err| sqlite_error("store.list_tables", err))?;
    let rows = stmt
        .query_map([], |row| row.get::<_, String>(0))
        .map_err(|err| sqlite_error("store.list_tables", err))?;
    rows.collect::<Result<BTreeSet<_>, _>>()
        .map_err(|err| sqlite_error("store.list_tables", err))
}

/// Returns the ordered `(name, declared type)` pairs of a table.
pub(crate) fn table_info(conn: &Connection, table: &str) -> Result<Vec<(String, String)>, ExpError> {
    let mut stmt = conn
        .prepare("SELECT name, type FROM pragma_table_info(?1) ORDER BY cid")
        .map_err(|err| sqlite_error("store.table_info", err))?;
    let rows = stmt
        .query_map([table], |row| Ok((row.get(0)?, row.get(1)?)))
        .map_err(|err| sqlite_error("store.table_info", err))?;
    rows.collect::<Result<Vec<_>, _>>()
        .map_err(|err| sqlite_error("store.table_info", err))
}

pub(crate) fn load_version_table(
    conn: &Connection,
    part: &str,
    version: mlexp_core::Version,
) -> Result<VersionTable, ExpError> {
    let mut table = VersionTable {
        part: part.to_string(),
        version,
        columns: Vec::new(),
    };
    table.columns = table_info(conn, &table.table_name())?
        .into_iter()
        .filter(|(name, _)| name != ID_KEY)
        .map(|(name, declared)| Column {
            name,
            kind: ColumnKind::from_declared(&declared),
        })
        .collect();
    Ok(table)
}

pub(crate) fn create_table(conn: &Connection, table: &VersionTable) -> Result<(), ExpError> {
    let mut columns: Vec<String> = table
        .columns
        .iter()
        .map(|column| {
            format!("{} {}", quote_ident(&column.name), column.kind.declared())
                .trim_end()
                .to_string()
        })
        .collect();
    columns.push(format!("{} INTEGER PRIMARY KEY", quote_ident(ID_KEY)));
    let sql = format!(
        "CREATE TABLE {} ({})",
        quote_ident(&table.table_name()),
        columns.join(", ")
    );
    conn.execute(&sql, [])
        .map_err(|err| sqlite_error("store.create_table", err))?;
    Ok(())
}

pub(crate) fn select_ids(conn: &Connection, table: &str) -> Result<BTreeSet<ConfigId>, ExpError> {
    let sql = format!("SELECT DISTINCT {} FROM {}", quote_ident(ID_KEY), quote_ident(table));
    let mut stmt = conn
        .prepare(&sql)
        .map_err(|err| sqlite_error("store.select_ids", err))?;
    let rows = stmt
        .query_map([], |row| row.get::<_, i64>(0))
        .map_err(|err| sqlite_error("store.select_ids", err))?;
    let mut ids = BTreeSet::new();
    for raw in rows {
        let raw = raw.map_err(|err| sqlite_error("store.select_ids", err))?;
        ids.insert(decode_id(raw)?);
    }
    Ok(ids)
}

pub(crate) fn max_id(conn: &Connection, table: &str) -> Result<Option<ConfigId>, ExpError> {
    let sql = format!("SELECT MAX({}) FROM {}", quote_ident(ID_KEY), quote_ident(table));
    let raw: Option<i64> = conn
        .query_row(&sql, [], |row| row.get(0))
        .map_err(|err| sqlite_error("store.max_id", err))?;
    raw.map(decode_id).transpose()
}

/// Finds the id of the row whose columns equal `key` exactly.
///
/// Equality follows [`Value`]: each clause also pins the storage class, so
/// `1`, `1.0`, `true` and `'1'` never match one another. A value whose kind
/// the column cannot hold matches nothing.
pub(crate) fn find_id<'a, I>(
    conn: &Connection,
    table: &VersionTable,
    key: I,
) -> Result<Option<ConfigId>, ExpError>
where
    I: IntoIterator<Item = (&'a str, &'a Value)>,
{
    let mut clauses = Vec::new();
    let mut params = Vec::new();
    for (column, value) in key {
        let Some(kind) = table.column(column).map(|c| c.kind) else {
            return Ok(None);
        };
        let Some(encoded) = encode(value, kind) else {
            return Ok(None);
        };
        let quoted = quote_ident(column);
        let idx = params.len() + 1;
        clauses.push(format!(
            "{quoted} = ?{idx} AND typeof({quoted}) = '{}'",
            storage_class(&encoded)
        ));
        params.push(encoded);
    }
    let mut sql = format!(
        "SELECT {} FROM {}",
        quote_ident(ID_KEY),
        quote_ident(&table.table_name())
    );
    if !clauses.is_empty() {
        sql.push_str(" WHERE ");
        sql.push_str(&clauses.join(" AND "));
    }
    sql.push_str(" LIMIT 1");
    let raw: Option<i64> = conn
        .query_row(&sql, params_from_iter(params), |row| row.get(0))
        .optional()
        .map_err(|err| sqlite_error("store.find_id", err))?;
    raw.map(decode_id).transpose()
}

/// Reads the property values of one row in column order.
pub(crate) fn select_row(
    conn: &Connection,
    table: &VersionTable,
    id: ConfigId,
) -> Result<Option<Vec<Value>>, ExpError> {
    let columns: Vec<String> = table.columns.iter().map(|c| quote_ident(&c.name)).collect();
    if columns.is_empty() {
        return Ok(Some(Vec::new()));
    }
    let sql = format!(
        "SELECT {} FROM {} WHERE {} = ?1",
        columns.join(", "),
        quote_ident(&table.table_name()),
        quote_ident(ID_KEY)
    );
    let id = encode_id(id)?;
    conn.query_row(&sql, [id], |row| {
        table
            .columns
            .iter()
            .enumerate()
            .map(|(idx, column)| {
                let raw = row.get_ref(idx)?;
                decode(column, raw).map_err(|info| {
                    rusqlite::Error::FromSqlConversionFailure(
                        idx,
                        raw.data_type(),
                        Box::new(ExpError::Storage(info)),
                    )
                })
            })
            .collect::<Result<Vec<_>, _>>()
    })
    .optional()
    .map_err(|err| sqlite_error("store.select_row", err))
}

/// Inserts rows of `(values in column order, id)` into the table.
pub(crate) fn insert_rows<'a, I>(conn: &Connection, table: &VersionTable, rows: I) -> Result<usize, ExpError>
where
    I: IntoIterator<Item = (Vec<&'a Value>, ConfigId)>,
{
    let mut columns: Vec<String> = table.columns.iter().map(|c| quote_ident(&c.name)).collect();
    columns.push(quote_ident(ID_KEY));
    let placeholders: Vec<String> = (1..=columns.len()).map(|idx| format!("?{idx}")).collect();
    let sql = format!(
        "INSERT INTO {} ({}) VALUES ({})",
        quote_ident(&table.table_name()),
        columns.join(", "),
        placeholders.join(", ")
    );
    let mut stmt = conn
        .prepare(&sql)
        .map_err(|err| sqlite_error("store.insert_prepare", err))?;
    let mut inserted = 0;
    for (values, id) in rows {
        let mut params = Vec::with_capacity(table.columns.len() + 1);
        for (column, value) in table.columns.iter().zip(values) {
            let encoded = encode(value, column.kind).ok_or_else(|| {
                ExpError::Storage(
                    ErrorInfo::new("store.encode_value", "value kind does not fit its column")
                        .with_context("column", column.name.clone())
                        .with_context("kind", format!("{:?}", value.kind())),
                )
            })?;
            params.push(encoded);
        }
        params.push(SqlValue::Integer(encode_id(id)?));
        stmt.execute(params_from_iter(params))
            .map_err(|err| sqlite_error("store.insert_row", err))?;
        inserted += 1;
    }
    Ok(inserted)
}

/// Storage form of `value` in a column of `kind`, or `None` when the column
/// can never hold that kind.
///
/// Booleans are 0/1 integers in a BOOLEAN column and a one-byte blob in an
/// untyped column, where an integer would be read back as `Int`.
fn encode(value: &Value, kind: ColumnKind) -> Option<SqlValue> {
    match (value, kind) {
        (Value::Bool(b), ColumnKind::Boolean) => Some(SqlValue::Integer(i64::from(*b))),
        (Value::Bool(b), ColumnKind::Any) => Some(SqlValue::Blob(vec![u8::from(*b)])),
        (Value::Int(i), ColumnKind::Integer | ColumnKind::Any) => Some(SqlValue::Integer(*i)),
        (Value::Real(r), ColumnKind::Real | ColumnKind::Any) => Some(SqlValue::Real(*r)),
        (Value::Text(s), ColumnKind::Text | ColumnKind::Any) => Some(SqlValue::Text(s.clone())),
        _ => None,
    }
}

/// Name SQLite's `typeof()` reports for an encoded value.
fn storage_class(value: &SqlValue) -> &'static str {
    match value {
        SqlValue::Null => "null",
        SqlValue::Integer(_) => "integer",
        SqlValue::Real(_) => "real",
        SqlValue::Text(_) => "text",
        SqlValue::Blob(_) => "blob",
    }
}

fn decode(column: &Column, raw: ValueRef<'_>) -> Result<Value, ErrorInfo> {
    match (column.kind, raw) {
        (ColumnKind::Boolean, ValueRef::Integer(i)) => Ok(Value::Bool(i != 0)),
        (ColumnKind::Any, ValueRef::Blob([flag @ (0 | 1)])) => Ok(Value::Bool(*flag == 1)),
        (ColumnKind::Real, ValueRef::Integer(i)) => Ok(Value::Real(i as f64)),
        (_, ValueRef::Integer(i)) => Ok(Value::Int(i)),
        (_, ValueRef::Real(r)) => Ok(Value::Real(r)),
        (_, ValueRef::Text(bytes)) => String::from_utf8(bytes.to_vec())
            .map(Value::Text)
            .map_err(|err| {
                ErrorInfo::new("store.decode_text", "stored text is not utf-8")
                    .with_context("column", column.name.clone())
                    .with_hint(err.to_string())
            }),
        (_, ValueRef::Null) | (_, ValueRef::Blob(_)) => Err(ErrorInfo::new(
            "store.decode_value",
            "stored value is not a scalar property value",
        )
        .with_context("column", column.name.clone())),
    }
}

fn encode_id(id: ConfigId) -> Result<i64, ExpError> {
    i64::try_from(id).map_err(|_| {
        ExpError::Storage(
            ErrorInfo::new("store.id_range", "configuration id exceeds storage range")
                .with_context("config_id", id.to_string()),
        )
    })
}

fn decode_id(raw: i64) -> Result<ConfigId, ExpError> {
    ConfigId::try_from(raw).map_err(|_| {
        ExpError::Storage(
            ErrorInfo::new("store.negative_id", "stored configuration id is negative")
                .with_context("config_id", raw.to_string()),
        )
    })
}
