//! Idempotent schema materialization

use crate::errors::{from_rusqlite, schema_error, Result};
use crate::schema::ddl::schema_statements;
use rusqlite::Connection;

/// Create every table and index that does not exist yet
///
/// Safe to run on every open. Runs in one transaction; any failure is
/// returned and leaves the schema as it was.
pub fn ensure_schema(conn: &Connection) -> Result<()> {
    let tx = conn.unchecked_transaction().map_err(from_rusqlite)?;

    let statements = schema_statements();
    for statement in &statements {
        tx.execute_batch(statement)
            .map_err(|e| schema_error(statement, e))?;
    }

    tx.commit().map_err(from_rusqlite)?;

    tracing::debug!(statements = statements.len(), "Schema ensured");

    Ok(())
}

/// Names of all user tables, sorted
pub fn table_names(conn: &Connection) -> Result<Vec<String>> {
    sqlite_master_names(conn, "table")
}

/// Names of all explicitly created indexes, sorted
pub fn index_names(conn: &Connection) -> Result<Vec<String>> {
    sqlite_master_names(conn, "index")
}

fn sqlite_master_names(conn: &Connection, kind: &str) -> Result<Vec<String>> {
    let mut stmt = conn
        .prepare(
            "SELECT name FROM sqlite_master
             WHERE type = ?1 AND name NOT LIKE 'sqlite_%'
             ORDER BY name",
        )
        .map_err(from_rusqlite)?;

    let names = stmt
        .query_map([kind], |row| row.get(0))
        .map_err(from_rusqlite)?
        .collect::<std::result::Result<Vec<String>, _>>()
        .map_err(from_rusqlite)?;

    Ok(names)
}
