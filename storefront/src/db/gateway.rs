//! Uniform execute/fetch primitive
//!
//! Runs one parameterized statement on a pooled connection and returns rows
//! as `column name → JSON value` maps, for callers that do not want a typed
//! model. `DbService::table_counts` (the `stats` command) reads through it.

use super::repository::{RepoError, RepoResult};
use serde::Serialize;
use serde_json::{Map, Value};
use sqlx::sqlite::{SqliteArguments, SqliteRow};
use sqlx::{Column, Row, Sqlite, SqlitePool, TypeInfo, ValueRef};

pub type RowMap = Map<String, Value>;

/// What the caller wants back
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fetch {
    /// Write statement: report rows affected / last insert id
    None,
    One,
    All,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "data", rename_all = "snake_case")]
pub enum Outcome {
    Affected {
        rows_affected: u64,
        last_insert_id: i64,
    },
    Row(Option<RowMap>),
    Rows(Vec<RowMap>),
}

impl Outcome {
    /// Rows as a list, whatever the fetch mode
    pub fn into_rows(self) -> Vec<RowMap> {
        match self {
            Outcome::Affected { .. } => Vec::new(),
            Outcome::Row(row) => row.into_iter().collect(),
            Outcome::Rows(rows) => rows,
        }
    }
}

/// Execute `sql` with positional `params`
///
/// Errors are logged and classified into [`RepoError`].
pub async fn execute(
    pool: &SqlitePool,
    sql: &str,
    params: &[Value],
    fetch: Fetch,
) -> RepoResult<Outcome> {
    let query = bind_all(sqlx::query(sql), params);
    let result = match fetch {
        Fetch::None => query.execute(pool).await.map(|done| Outcome::Affected {
            rows_affected: done.rows_affected(),
            last_insert_id: done.last_insert_rowid(),
        }),
        Fetch::One => match query.fetch_optional(pool).await {
            Ok(Some(row)) => row_to_map(&row).map(|m| Outcome::Row(Some(m))),
            Ok(None) => Ok(Outcome::Row(None)),
            Err(e) => Err(e),
        },
        Fetch::All => match query.fetch_all(pool).await {
            Ok(rows) => rows
                .iter()
                .map(row_to_map)
                .collect::<Result<Vec<_>, _>>()
                .map(Outcome::Rows),
            Err(e) => Err(e),
        },
    };

    result.map_err(|e| {
        tracing::error!(sql = %sql, error = %e, "Statement failed");
        RepoError::from(e)
    })
}

fn bind_all<'q>(
    mut query: sqlx::query::Query<'q, Sqlite, SqliteArguments<'q>>,
    params: &[Value],
) -> sqlx::query::Query<'q, Sqlite, SqliteArguments<'q>> {
    for param in params {
        query = match param {
            Value::Null => query.bind(None::<String>),
            Value::Bool(b) => query.bind(*b),
            Value::Number(n) => match n.as_i64() {
                Some(i) => query.bind(i),
                None => query.bind(n.as_f64()),
            },
            Value::String(s) => query.bind(s.clone()),
            // Nested values are stored as JSON text
            other => query.bind(other.to_string()),
        };
    }
    query
}

fn row_to_map(row: &SqliteRow) -> Result<RowMap, sqlx::Error> {
    let mut map = RowMap::new();
    for (index, column) in row.columns().iter().enumerate() {
        let raw = row.try_get_raw(index)?;
        let value = if raw.is_null() {
            Value::Null
        } else {
            match raw.type_info().name() {
                "INTEGER" | "INT" | "INT8" | "BIGINT" => Value::from(row.try_get::<i64, _>(index)?),
                "BOOLEAN" => Value::from(row.try_get::<bool, _>(index)?),
                "REAL" | "FLOAT" | "DOUBLE" | "NUMERIC" => {
                    Value::from(row.try_get::<f64, _>(index)?)
                }
                "BLOB" => Value::from(row.try_get::<Vec<u8>, _>(index)?),
                _ => Value::from(row.try_get::<String, _>(index)?),
            }
        };
        map.insert(column.name().to_string(), value);
    }
    Ok(map)
}
