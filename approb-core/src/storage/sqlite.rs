//! SQLite key-value backend.
//!
//! Records live in a single table:
//!
//! ```sql
//! CREATE TABLE IF NOT EXISTS kv_entries (
//!     key        TEXT PRIMARY KEY,
//!     data       TEXT NOT NULL,
//!     updated_at TEXT NOT NULL,
//!     checksum   TEXT
//! );
//! ```
//!
//! - WAL mode keeps reads cheap while the UI writes after every mutation.
//! - The record is opaque JSON text; layout changes never touch the schema.
//! - An optional CRC-32 detects on-disk corruption (logged, not fatal; the
//!   JSON decoder is the final judge).
//! - Online backups and rotating numbered backups via SQLite's backup API.

use std::path::{Path, PathBuf};
use std::time::Instant;

use chrono::Utc;
use rusqlite::{params, Connection, OpenFlags, OptionalExtension};
use tracing::{debug, info, warn};

use super::KeyValueStore;
use crate::config::PersistenceConfig;
use crate::error::Result;

const SCHEMA: &str = "CREATE TABLE IF NOT EXISTS kv_entries (
    key        TEXT PRIMARY KEY,
    data       TEXT NOT NULL,
    updated_at TEXT NOT NULL,
    checksum   TEXT
);";

// ---------------------------------------------------------------------------
// CRC-32 checksum helper
// ---------------------------------------------------------------------------

/// CRC-32 of `data` as a lowercase hex string.
fn crc32_hex(data: &[u8]) -> String {
    format!("{:08x}", crc32_compute(data))
}

/// Basic CRC-32 (ISO 3309 / ITU-T V.42) computation.
fn crc32_compute(data: &[u8]) -> u32 {
    const POLY: u32 = 0xEDB8_8320;
    let mut crc: u32 = 0xFFFF_FFFF;
    for &byte in data {
        crc ^= u32::from(byte);
        for _ in 0..8 {
            if crc & 1 == 1 {
                crc = (crc >> 1) ^ POLY;
            } else {
                crc >>= 1;
            }
        }
    }
    !crc
}

// ---------------------------------------------------------------------------
// SqliteStore
// ---------------------------------------------------------------------------

/// Handle to an open SQLite database holding progression records.
///
/// ```no_run
/// # use approb_core::storage::{KeyValueStore, SqliteStore};
/// # use approb_core::config::PersistenceConfig;
/// let store = SqliteStore::open("progress.db", &PersistenceConfig::default())?;
/// store.save("progression_state", "{}")?;
/// let raw = store.load("progression_state")?;
/// # Ok::<(), approb_core::ApprobError>(())
/// ```
pub struct SqliteStore {
    conn: Connection,
    checksum_enabled: bool,
    backup_count: u32,
    db_path: PathBuf,
}

impl std::fmt::Debug for SqliteStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteStore")
            .field("db_path", &self.db_path)
            .field("checksum_enabled", &self.checksum_enabled)
            .field("backup_count", &self.backup_count)
            .finish_non_exhaustive()
    }
}

impl SqliteStore {
    /// Open (or create) a database at `path`, creating the schema if needed.
    ///
    /// # Errors
    ///
    /// Returns [`crate::ApprobError::Database`] on SQLite failures.
    pub fn open<P: AsRef<Path>>(path: P, config: &PersistenceConfig) -> Result<Self> {
        let db_path = path.as_ref().to_path_buf();
        let flags = OpenFlags::SQLITE_OPEN_READ_WRITE
            | OpenFlags::SQLITE_OPEN_CREATE
            | OpenFlags::SQLITE_OPEN_NO_MUTEX;

        let conn = Connection::open_with_flags(&db_path, flags)?;

        if config.wal_mode {
            conn.execute_batch("PRAGMA journal_mode = WAL;")?;
        }
        conn.execute_batch("PRAGMA synchronous = NORMAL;")?;
        conn.execute_batch("PRAGMA busy_timeout = 5000;")?;
        conn.execute_batch(SCHEMA)?;

        info!(
            path = %db_path.display(),
            wal = config.wal_mode,
            "SQLite progression store opened"
        );

        Ok(Self {
            conn,
            checksum_enabled: config.checksum_enabled,
            backup_count: config.backup_count,
            db_path,
        })
    }

    /// Open an in-memory database (useful for tests).
    ///
    /// # Errors
    ///
    /// Returns [`crate::ApprobError::Database`] on SQLite failures.
    pub fn open_in_memory(config: &PersistenceConfig) -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(SCHEMA)?;

        Ok(Self {
            conn,
            checksum_enabled: config.checksum_enabled,
            backup_count: config.backup_count,
            db_path: PathBuf::from(":memory:"),
        })
    }

    /// Delete the value under `key`. Returns `true` if a row was removed.
    ///
    /// # Errors
    ///
    /// Returns [`crate::ApprobError::Database`] on SQLite failures.
    pub fn delete(&self, key: &str) -> Result<bool> {
        let deleted = self
            .conn
            .execute("DELETE FROM kv_entries WHERE key = ?1", params![key])?;
        Ok(deleted > 0)
    }

    /// All stored keys, sorted.
    ///
    /// # Errors
    ///
    /// Returns [`crate::ApprobError::Database`] on SQLite failures.
    pub fn keys(&self) -> Result<Vec<String>> {
        let mut stmt = self.conn.prepare_cached("SELECT key FROM kv_entries ORDER BY key")?;
        let rows = stmt.query_map([], |row| row.get(0))?;
        let mut keys = Vec::new();
        for row in rows {
            keys.push(row?);
        }
        Ok(keys)
    }

    // ------------------------------------------------------------------
    // Backup
    // ------------------------------------------------------------------

    /// Copy the database to `dest_path` using SQLite's online-backup API.
    ///
    /// # Errors
    ///
    /// Returns [`crate::ApprobError::Database`] on SQLite failures.
    pub fn backup<P: AsRef<Path>>(&self, dest_path: P) -> Result<()> {
        let start = Instant::now();
        let mut dest = Connection::open(dest_path.as_ref())?;
        let backup = rusqlite::backup::Backup::new(&self.conn, &mut dest)?;
        backup.run_to_completion(256, std::time::Duration::from_millis(50), None)?;

        info!(
            dest = %dest_path.as_ref().display(),
            elapsed_ms = start.elapsed().as_millis(),
            "Progression database backup completed"
        );
        Ok(())
    }

    /// Write `<db>.bak.1`, shifting older backups up and keeping at most
    /// `backup_count` of them. No-op for in-memory databases.
    ///
    /// # Errors
    ///
    /// Returns [`crate::ApprobError::Database`] or [`crate::ApprobError::Io`].
    pub fn create_rotating_backup(&self) -> Result<()> {
        if self.db_path.as_os_str() == ":memory:" || self.backup_count == 0 {
            return Ok(());
        }

        let max = self.backup_count;
        for i in (1..max).rev() {
            let src = self.backup_path(i);
            if src.exists() {
                std::fs::rename(&src, self.backup_path(i + 1))?;
            }
        }

        let oldest = self.backup_path(max + 1);
        if oldest.exists() {
            std::fs::remove_file(&oldest)?;
        }

        self.backup(self.backup_path(1))?;
        info!(max_backups = max, "Rotating backup created");
        Ok(())
    }

    /// Path to a numbered backup file (e.g. `progress.db.bak.1`).
    fn backup_path(&self, n: u32) -> PathBuf {
        let mut p = self.db_path.clone();
        let ext = format!(
            "{}.bak.{n}",
            p.extension()
                .map_or(String::new(), |e| e.to_string_lossy().into_owned())
        );
        p.set_extension(ext);
        p
    }

    // ------------------------------------------------------------------
    // Utility
    // ------------------------------------------------------------------

    /// Path to the database file (or `:memory:`).
    #[must_use]
    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    /// Run SQLite's integrity check. `Ok(false)` means corruption.
    ///
    /// # Errors
    ///
    /// Returns [`crate::ApprobError::Database`] if the check itself fails.
    pub fn integrity_check(&self) -> Result<bool> {
        let result: String = self
            .conn
            .query_row("PRAGMA integrity_check", [], |row| row.get(0))?;
        Ok(result == "ok")
    }
}

impl KeyValueStore for SqliteStore {
    fn load(&self, key: &str) -> Result<Option<String>> {
        let start = Instant::now();
        let mut stmt = self
            .conn
            .prepare_cached("SELECT data, checksum FROM kv_entries WHERE key = ?1")?;
        let row: Option<(String, Option<String>)> = stmt
            .query_row(params![key], |row| Ok((row.get(0)?, row.get(1)?)))
            .optional()?;

        let Some((data, stored_checksum)) = row else {
            return Ok(None);
        };

        if self.checksum_enabled {
            if let Some(expected) = stored_checksum {
                let actual = crc32_hex(data.as_bytes());
                if expected != actual {
                    warn!(
                        key,
                        expected = %expected,
                        actual = %actual,
                        "Checksum mismatch, stored progression may be corrupt"
                    );
                }
            }
        }

        debug!(
            key,
            bytes = data.len(),
            elapsed_us = start.elapsed().as_micros(),
            "Loaded record"
        );
        Ok(Some(data))
    }

    fn save(&self, key: &str, value: &str) -> Result<()> {
        let start = Instant::now();
        let checksum = self.checksum_enabled.then(|| crc32_hex(value.as_bytes()));
        let now = Utc::now().to_rfc3339();

        self.conn.execute(
            "INSERT INTO kv_entries (key, data, updated_at, checksum)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(key) DO UPDATE SET
                data = excluded.data,
                updated_at = excluded.updated_at,
                checksum = excluded.checksum",
            params![key, value, now, checksum],
        )?;

        debug!(
            key,
            bytes = value.len(),
            elapsed_us = start.elapsed().as_micros(),
            "Saved record"
        );
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "sqlite"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> PersistenceConfig {
        PersistenceConfig {
            checksum_enabled: true,
            ..PersistenceConfig::default()
        }
    }

    #[test]
    fn round_trip_save_load() {
        let store = SqliteStore::open_in_memory(&test_config()).expect("open");
        store.save("progression_state", "{\"points\":10}").expect("save");
        let loaded = store.load("progression_state").expect("load");
        assert_eq!(loaded.as_deref(), Some("{\"points\":10}"));
    }

    #[test]
    fn load_missing_returns_none() {
        let store = SqliteStore::open_in_memory(&test_config()).expect("open");
        assert!(store.load("nobody").expect("load").is_none());
    }

    #[test]
    fn upsert_overwrites() {
        let store = SqliteStore::open_in_memory(&test_config()).expect("open");
        store.save("k", "first").expect("save1");
        store.save("k", "second").expect("save2");
        assert_eq!(store.load("k").expect("load").as_deref(), Some("second"));
        assert_eq!(store.keys().expect("keys"), vec!["k".to_string()]);
    }

    #[test]
    fn delete_works() {
        let store = SqliteStore::open_in_memory(&test_config()).expect("open");
        store.save("k", "v").expect("save");
        assert!(store.delete("k").expect("delete"));
        assert!(!store.delete("k").expect("delete again"));
        assert!(store.load("k").expect("load").is_none());
    }

    #[test]
    fn checksum_mismatch_still_loads() {
        let store = SqliteStore::open_in_memory(&test_config()).expect("open");
        store.save("k", "{}").expect("save");
        store
            .conn
            .execute("UPDATE kv_entries SET checksum = 'deadbeef' WHERE key = 'k'", [])
            .expect("corrupt checksum");
        assert_eq!(store.load("k").expect("load").as_deref(), Some("{}"));
    }

    #[test]
    fn integrity_check_passes() {
        let store = SqliteStore::open_in_memory(&test_config()).expect("open");
        assert!(store.integrity_check().expect("check"));
    }

    #[test]
    fn file_backup_is_readable() {
        let dir = tempfile::tempdir().expect("tempdir");
        let config = test_config();
        let store = SqliteStore::open(dir.path().join("progress.db"), &config).expect("open");
        store.save("k", "v").expect("save");

        let backup_path = dir.path().join("copy.db");
        store.backup(&backup_path).expect("backup");

        let copy = SqliteStore::open(&backup_path, &config).expect("open copy");
        assert_eq!(copy.load("k").expect("load").as_deref(), Some("v"));
    }

    #[test]
    fn rotating_backup_keeps_limit() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut config = test_config();
        config.backup_count = 2;

        let store = SqliteStore::open(dir.path().join("progress.db"), &config).expect("open");
        store.save("k", "v").expect("save");

        store.create_rotating_backup().expect("backup 1");
        store.create_rotating_backup().expect("backup 2");
        store.create_rotating_backup().expect("backup 3");

        assert!(dir.path().join("progress.db.bak.1").exists());
        assert!(dir.path().join("progress.db.bak.2").exists());
        assert!(!dir.path().join("progress.db.bak.3").exists());
    }

    #[test]
    fn crc32_basic() {
        assert_eq!(crc32_compute(b"123456789"), 0xCBF4_3926);
    }
}
