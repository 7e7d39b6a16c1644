use std::path::Path;

use anyhow::{Context, Result};
use rusqlite::Connection;

use crate::parser::{Category, Entry};

pub fn connect(path: &Path) -> Result<Connection> {
    Connection::open(path).with_context(|| format!("Failed to open {}", path.display()))
}

/// Dash docset index layout.
pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS searchIndex (
            id   INTEGER PRIMARY KEY,
            name TEXT,
            type TEXT,
            path TEXT
        );
        CREATE UNIQUE INDEX IF NOT EXISTS anchor ON searchIndex (name, type, path);
        ",
    )?;
    Ok(())
}

/// Insert a page's entries; rows already present are left alone.
pub fn insert_entries(conn: &Connection, entries: &[Entry]) -> Result<usize> {
    let tx = conn.unchecked_transaction()?;
    let mut count = 0;
    {
        let mut stmt =
            tx.prepare("INSERT OR IGNORE INTO searchIndex (name, type, path) VALUES (?1, ?2, ?3)")?;
        for e in entries {
            count += stmt.execute(rusqlite::params![e.name, e.category.as_str(), e.href])?;
        }
    }
    tx.commit()?;
    Ok(count)
}

/// Write the resolved category of a row inserted as unknown.
///
/// The row is found by its link target and original name. With
/// `strip_namespace` the stored name loses its `Namespace::` prefix. When the
/// fixed row would duplicate an existing one the update is skipped and the
/// unknown row is left for [`purge_category`].
pub fn update_entry(conn: &Connection, entry: &Entry, strip_namespace: bool) -> Result<usize> {
    let mut stored = entry.clone();
    if strip_namespace {
        stored.strip_namespace();
    }

    let count = conn.execute(
        "UPDATE OR IGNORE searchIndex SET name = ?1, type = ?2
         WHERE path = ?3 AND name = ?4 AND type = ?5",
        rusqlite::params![
            stored.name,
            stored.category.as_str(),
            entry.href,
            entry.name,
            Category::Unknown.as_str(),
        ],
    )?;
    Ok(count)
}

pub fn purge_category(conn: &Connection, category: Category) -> Result<usize> {
    let count = conn.execute(
        "DELETE FROM searchIndex WHERE type = ?1",
        rusqlite::params![category.as_str()],
    )?;
    Ok(count)
}

// ── Stats ──

/// Row count per entry type, largest first.
pub fn count_by_type(conn: &Connection) -> Result<Vec<(String, usize)>> {
    let mut stmt = conn.prepare(
        "SELECT type, COUNT(*) FROM searchIndex GROUP BY type ORDER BY COUNT(*) DESC, type",
    )?;
    let rows = stmt
        .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

#[cfg(test)]
pub(crate) fn fetch_rows(conn: &Connection) -> Result<Vec<(String, String, String)>> {
    let mut stmt = conn.prepare("SELECT name, type, path FROM searchIndex ORDER BY path, name, type")?;
    let rows = stmt
        .query_map([], |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)))?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}
