//! SQLite persistence for the local catalog store.
//!
//! Entities are stored as serialized JSON rows keyed by (collection, id), so
//! one database holds podcasts and episodes side by side without per-entity
//! schemas. Row order follows insertion order, which is what the sync step
//! relies on to reproduce the remote list order.

use color_eyre::{eyre::eyre, Result};
use rusqlite::{params, Connection};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::source::CatalogEntity;

/// Schema for the catalog store.
const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS catalog_entries (
    collection TEXT NOT NULL,
    entity_id INTEGER NOT NULL,
    data BLOB NOT NULL,
    saved_at TEXT NOT NULL DEFAULT (datetime('now')),
    PRIMARY KEY (collection, entity_id)
);
"#;

/// Database connection wrapper for the local catalog
pub struct Database {
  conn: Mutex<Connection>,
}

impl Database {
  /// Open or create the database at the default location
  pub fn open() -> Result<Self> {
    Self::open_at(&default_data_dir()?.join("catalog.db"))
  }

  /// Open or create the database at the given path
  pub fn open_at(path: &Path) -> Result<Self> {
    // Ensure parent directory exists
    if let Some(parent) = path.parent() {
      std::fs::create_dir_all(parent)
        .map_err(|e| eyre!("Failed to create database directory: {}", e))?;
    }

    let conn = Connection::open(path)
      .map_err(|e| eyre!("Failed to open database at {}: {}", path.display(), e))?;

    let db = Self {
      conn: Mutex::new(conn),
    };
    db.run_migrations()?;

    Ok(db)
  }

  /// Open an ephemeral in-memory database
  pub fn open_in_memory() -> Result<Self> {
    let conn = Connection::open_in_memory()
      .map_err(|e| eyre!("Failed to open in-memory database: {}", e))?;

    let db = Self {
      conn: Mutex::new(conn),
    };
    db.run_migrations()?;

    Ok(db)
  }

  /// Run database migrations
  fn run_migrations(&self) -> Result<()> {
    let conn = self.lock()?;

    conn
      .execute_batch(SCHEMA)
      .map_err(|e| eyre!("Failed to run migrations: {}", e))?;

    Ok(())
  }

  fn lock(&self) -> Result<std::sync::MutexGuard<'_, Connection>> {
    self.conn.lock().map_err(|e| eyre!("Lock poisoned: {}", e))
  }

  /// Get all entries of a collection in insertion order.
  pub fn list<T: CatalogEntity>(&self) -> Result<Vec<T>> {
    let conn = self.lock()?;

    let mut stmt = conn
      .prepare("SELECT data FROM catalog_entries WHERE collection = ? ORDER BY rowid")
      .map_err(|e| eyre!("Failed to prepare entry query: {}", e))?;

    let rows: Vec<Vec<u8>> = stmt
      .query_map(params![T::collection()], |row| row.get(0))
      .map_err(|e| eyre!("Failed to query entries: {}", e))?
      .collect::<std::result::Result<_, _>>()
      .map_err(|e| eyre!("Failed to read entry row: {}", e))?;

    let mut entries = Vec::with_capacity(rows.len());
    for data in rows {
      let entry: T = serde_json::from_slice(&data)
        .map_err(|e| eyre!("Failed to deserialize entry: {}", e))?;
      entries.push(entry);
    }

    Ok(entries)
  }

  /// Insert an entry, replacing any prior record with the same id in full.
  pub fn upsert<T: CatalogEntity>(&self, entry: &T) -> Result<()> {
    let conn = self.lock()?;

    let data =
      serde_json::to_vec(entry).map_err(|e| eyre!("Failed to serialize entry: {}", e))?;

    conn
      .execute(
        "INSERT OR REPLACE INTO catalog_entries (collection, entity_id, data, saved_at)
         VALUES (?, ?, ?, datetime('now'))",
        params![T::collection(), entry.entity_id(), data],
      )
      .map_err(|e| eyre!("Failed to store entry: {}", e))?;

    Ok(())
  }

  /// Delete every entry of a collection.
  pub fn clear(&self, collection: &str) -> Result<()> {
    let conn = self.lock()?;

    conn
      .execute(
        "DELETE FROM catalog_entries WHERE collection = ?",
        params![collection],
      )
      .map_err(|e| eyre!("Failed to clear collection: {}", e))?;

    Ok(())
  }
}

/// Default data directory for the database and the log file
pub fn default_data_dir() -> Result<PathBuf> {
  let data_dir = dirs::data_dir()
    .or_else(|| dirs::home_dir().map(|p| p.join(".local/share")))
    .ok_or_else(|| eyre!("Could not determine data directory"))?;

  Ok(data_dir.join("podsync"))
}
