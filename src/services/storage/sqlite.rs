use std::path::Path;

use anyhow::{Context, Result};
use rusqlite::{params, Connection, OpenFlags, OptionalExtension};

use super::BlobStore;

/// Blob store backed by a single SQLite table.
pub struct SqliteBlobStore {
    conn: Connection,
}

impl SqliteBlobStore {
    /// Opens (or creates) the database at `path` and ensures the blob table
    /// exists.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create dir {}", parent.display()))?;
        }
        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open database at {}", path.display()))?;
        Self::from_connection(conn)
    }

    /// In-memory database, mostly for tests.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().context("Failed to open in-memory database")?;
        Self::from_connection(conn)
    }

    /// Opens an existing database without write access. The schema is not
    /// touched; a database that was never initialized reads as empty.
    pub fn open_read_only(path: &Path) -> Result<Self> {
        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .with_context(|| format!("Failed to open database read-only at {}", path.display()))?;
        Ok(Self { conn })
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        conn.execute(
            "CREATE TABLE IF NOT EXISTS blobs (
                key TEXT PRIMARY KEY NOT NULL,
                value BLOB NOT NULL,
                updated_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
            )",
            [],
        )
        .context("Failed to create blobs table")?;
        Ok(Self { conn })
    }

    fn table_exists(&self) -> Result<bool> {
        let found: Option<String> = self
            .conn
            .query_row(
                "SELECT name FROM sqlite_master WHERE type = 'table' AND name = 'blobs'",
                [],
                |row| row.get(0),
            )
            .optional()
            .context("Failed to inspect database schema")?;
        Ok(found.is_some())
    }
}

impl BlobStore for SqliteBlobStore {
    fn read_blob(&self, key: &str) -> Result<Option<Vec<u8>>> {
        if !self.table_exists()? {
            return Ok(None);
        }

        self.conn
            .query_row("SELECT value FROM blobs WHERE key = ?1", [key], |row| {
                row.get::<_, Vec<u8>>(0)
            })
            .optional()
            .with_context(|| format!("Failed to read blob {key}"))
    }

    fn write_blob(&mut self, key: &str, bytes: &[u8]) -> Result<()> {
        self.conn
            .execute(
                "INSERT INTO blobs (key, value, updated_at) VALUES (?1, ?2, CURRENT_TIMESTAMP)
                 ON CONFLICT(key) DO UPDATE SET value = excluded.value,
                                                updated_at = excluded.updated_at",
                params![key, bytes],
            )
            .with_context(|| format!("Failed to write blob {key}"))?;
        Ok(())
    }
}
