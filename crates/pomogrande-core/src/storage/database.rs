//! SQLite-backed persistence gateway.
//!
//! Provides:
//! - A key-value table holding every persisted field as JSON
//! - A change log so each connection can observe writes made by other
//!   processes (settings surfaces, the CLI)
//! - A command queue through which other processes send timer commands to
//!   the running controller

use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use serde_json::Value;
use std::cell::Cell;
use std::path::{Path, PathBuf};
use std::time::Duration;

use super::{data_dir, StorageChange, StorageKey, Store};
use crate::error::StorageError;
use crate::timer::Command;

/// Change-log rows kept behind the newest revision a connection has read.
const CHANGE_LOG_RETENTION: i64 = 10_000;

const DB_FILE: &str = "pomogrande.db";

fn open_connection(path: &Path) -> Result<Connection, StorageError> {
    let conn = Connection::open(path).map_err(|source| StorageError::OpenFailed {
        path: path.to_path_buf(),
        source,
    })?;
    conn.busy_timeout(Duration::from_secs(2))?;
    conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get::<_, String>(0))?;
    Ok(conn)
}

fn migrate(conn: &Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS kv (
            key   TEXT PRIMARY KEY,
            value TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS changes (
            revision INTEGER PRIMARY KEY AUTOINCREMENT,
            key      TEXT NOT NULL,
            value    TEXT,
            origin   TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS commands (
            id        INTEGER PRIMARY KEY AUTOINCREMENT,
            command   TEXT NOT NULL,
            issued_at TEXT NOT NULL
        );",
    )
}

/// Path of the default database file inside the data directory.
pub fn default_path() -> Result<PathBuf, StorageError> {
    Ok(data_dir()?.join(DB_FILE))
}

/// SQLite store handle. Each handle writes under its own `origin` name.
pub struct Database {
    conn: Connection,
    origin: String,
    cursor: Cell<i64>,
}

impl Database {
    /// Open the database at `<data_dir>/pomogrande.db`.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open(origin: &str) -> Result<Self, StorageError> {
        Self::open_at(&default_path()?, origin)
    }

    /// Open (or create) the database at `path`.
    pub fn open_at(path: &Path, origin: &str) -> Result<Self, StorageError> {
        let conn = open_connection(path)?;
        Self::init(conn, origin)
    }

    /// Open an in-memory database (for tests).
    pub fn open_memory(origin: &str) -> Result<Self, StorageError> {
        let conn = Connection::open_in_memory()?;
        Self::init(conn, origin)
    }

    fn init(conn: Connection, origin: &str) -> Result<Self, StorageError> {
        migrate(&conn)?;
        let head: i64 =
            conn.query_row("SELECT COALESCE(MAX(revision), 0) FROM changes", [], |row| {
                row.get(0)
            })?;
        conn.execute(
            "DELETE FROM changes WHERE revision <= ?1",
            params![head - CHANGE_LOG_RETENTION],
        )?;
        Ok(Self {
            conn,
            origin: origin.to_string(),
            cursor: Cell::new(head),
        })
    }

    /// Get a reference to the underlying SQLite connection.
    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    pub fn origin(&self) -> &str {
        &self.origin
    }

    /// Every stored field, in key order. Rows with unknown keys are skipped.
    pub fn dump(&self) -> Result<Vec<(StorageKey, Value)>, StorageError> {
        let mut stmt = self.conn.prepare("SELECT key, value FROM kv ORDER BY key")?;
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;

        let mut out = Vec::new();
        for row in rows {
            let (key, raw) = row?;
            let Ok(key) = key.parse::<StorageKey>() else {
                continue;
            };
            out.push((key, decode(key, &raw)?));
        }
        out.sort_by_key(|(key, _)| *key);
        Ok(out)
    }
}

fn decode(key: StorageKey, raw: &str) -> Result<Value, StorageError> {
    serde_json::from_str(raw).map_err(|e| StorageError::Malformed {
        key: key.to_string(),
        message: e.to_string(),
    })
}

fn encode(key: StorageKey, value: &Value) -> Result<String, StorageError> {
    serde_json::to_string(value).map_err(|e| StorageError::Malformed {
        key: key.to_string(),
        message: e.to_string(),
    })
}

impl Store for Database {
    fn get(&self, key: StorageKey) -> Result<Option<Value>, StorageError> {
        let raw: Option<String> = self
            .conn
            .query_row(
                "SELECT value FROM kv WHERE key = ?1",
                params![key.as_str()],
                |row| row.get(0),
            )
            .optional()?;
        raw.map(|raw| decode(key, &raw)).transpose()
    }

    fn set_many(&self, entries: &[(StorageKey, Value)]) -> Result<(), StorageError> {
        let tx = self.conn.unchecked_transaction()?;
        for (key, value) in entries {
            let encoded = encode(*key, value)?;
            tx.execute(
                "INSERT OR REPLACE INTO kv (key, value) VALUES (?1, ?2)",
                params![key.as_str(), encoded],
            )?;
            tx.execute(
                "INSERT INTO changes (key, value, origin) VALUES (?1, ?2, ?3)",
                params![key.as_str(), encoded, self.origin],
            )?;
        }
        tx.commit()?;
        Ok(())
    }

    fn remove(&self, key: StorageKey) -> Result<(), StorageError> {
        let tx = self.conn.unchecked_transaction()?;
        tx.execute("DELETE FROM kv WHERE key = ?1", params![key.as_str()])?;
        tx.execute(
            "INSERT INTO changes (key, value, origin) VALUES (?1, NULL, ?2)",
            params![key.as_str(), self.origin],
        )?;
        tx.commit()?;
        Ok(())
    }

    fn poll_changes(&self) -> Result<Vec<StorageChange>, StorageError> {
        let mut stmt = self.conn.prepare(
            "SELECT revision, key, value, origin FROM changes
             WHERE revision > ?1
             ORDER BY revision",
        )?;
        let rows = stmt.query_map(params![self.cursor.get()], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, Option<String>>(2)?,
                row.get::<_, String>(3)?,
            ))
        })?;

        let mut changes = Vec::new();
        for row in rows {
            let (revision, key, raw, origin) = row?;
            self.cursor.set(revision);
            if origin == self.origin {
                continue;
            }
            let Ok(key) = key.parse::<StorageKey>() else {
                tracing::debug!(key = %key, "ignoring change to unknown field");
                continue;
            };
            let value = raw.map(|raw| decode(key, &raw)).transpose()?;
            changes.push(StorageChange { key, value });
        }
        self.conn.execute(
            "DELETE FROM changes WHERE revision <= ?1",
            params![self.cursor.get() - CHANGE_LOG_RETENTION],
        )?;
        Ok(changes)
    }
}

/// Queue of timer commands sent from other processes.
pub struct CommandQueue {
    conn: Connection,
}

impl CommandQueue {
    pub fn open() -> Result<Self, StorageError> {
        Self::open_at(&default_path()?)
    }

    pub fn open_at(path: &Path) -> Result<Self, StorageError> {
        let conn = open_connection(path)?;
        migrate(&conn)?;
        Ok(Self { conn })
    }

    pub fn push(&self, command: Command) -> Result<(), StorageError> {
        self.conn.execute(
            "INSERT INTO commands (command, issued_at) VALUES (?1, ?2)",
            params![command.as_str(), Utc::now().to_rfc3339()],
        )?;
        Ok(())
    }

    /// Remove and return every queued command, oldest first.
    pub fn drain(&self) -> Result<Vec<Command>, StorageError> {
        let tx = self.conn.unchecked_transaction()?;
        let queued = {
            let mut stmt = tx.prepare("SELECT id, command FROM commands ORDER BY id")?;
            let rows = stmt.query_map([], |row| {
                Ok((row.get::<_, i64>(0)?, row.get::<_, String>(1)?))
            })?;
            rows.collect::<Result<Vec<_>, _>>()?
        };

        let mut commands = Vec::with_capacity(queued.len());
        for (id, raw) in queued {
            match raw.parse::<Command>() {
                Ok(command) => commands.push(command),
                Err(e) => tracing::warn!(id, error = %e, "dropping unreadable command"),
            }
            tx.execute("DELETE FROM commands WHERE id = ?1", params![id])?;
        }
        tx.commit()?;
        Ok(commands)
    }
}
