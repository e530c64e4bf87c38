//! Cache storage trait with file, SQLite and no-op implementations.

use chrono::{DateTime, SecondsFormat, Utc};
use color_eyre::{eyre::eyre, Result};
use rusqlite::{params, Connection, OptionalExtension};
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::SystemTime;

use super::key::CacheKey;
use super::traits::CacheEntry;

/// Trait for cache storage backends.
///
/// Backends only persist and return entries; freshness is decided by the
/// caller.
pub trait CacheStorage: Send + Sync {
  /// Read the entry stored under `key`, if any.
  fn read(&self, key: &CacheKey) -> Result<Option<CacheEntry>>;

  /// Store `entry`, fully replacing any previous entry under the same key.
  fn write(&self, key: &CacheKey, entry: &CacheEntry) -> Result<()>;
}

/// Storage implementation that doesn't cache anything.
/// Used when caching is disabled - all operations are no-ops.
pub struct NoopStorage;

impl CacheStorage for NoopStorage {
  fn read(&self, _key: &CacheKey) -> Result<Option<CacheEntry>> {
    Ok(None) // Always miss
  }

  fn write(&self, _key: &CacheKey, _entry: &CacheEntry) -> Result<()> {
    Ok(()) // Discard
  }
}

/// One JSON file per key inside a directory.
///
/// The file name is the digest of the key, the body is the bare payload and
/// the write time is the file's modification time.
pub struct FileStorage {
  dir: PathBuf,
}

impl FileStorage {
  /// Open file storage rooted at `dir`, creating the directory if needed.
  pub fn open(dir: &Path) -> Result<Self> {
    if !dir.exists() {
      fs::create_dir_all(dir)
        .map_err(|e| eyre!("Failed to create cache directory {}: {}", dir.display(), e))?;
      tracing::info!(dir = %dir.display(), "created cache directory");
    }

    Ok(Self {
      dir: dir.to_path_buf(),
    })
  }

  fn entry_path(&self, key: &CacheKey) -> PathBuf {
    self.dir.join(format!("{}.json", key.digest()))
  }

  fn temp_path(&self, key: &CacheKey) -> PathBuf {
    self
      .dir
      .join(format!("{}.{}.tmp", key.digest(), std::process::id()))
  }
}

impl CacheStorage for FileStorage {
  fn read(&self, key: &CacheKey) -> Result<Option<CacheEntry>> {
    let path = self.entry_path(key);
    if !path.exists() {
      return Ok(None);
    }

    let modified = fs::metadata(&path)
      .and_then(|m| m.modified())
      .map_err(|e| eyre!("Failed to stat cache file {}: {}", path.display(), e))?;
    let data = fs::read(&path)
      .map_err(|e| eyre!("Failed to read cache file {}: {}", path.display(), e))?;
    let value = serde_json::from_slice(&data)
      .map_err(|e| eyre!("Failed to parse cache file {}: {}", path.display(), e))?;

    Ok(Some(CacheEntry {
      key: key.as_str().to_string(),
      value,
      stored_at: DateTime::<Utc>::from(modified),
    }))
  }

  fn write(&self, key: &CacheKey, entry: &CacheEntry) -> Result<()> {
    let data =
      serde_json::to_vec(&entry.value).map_err(|e| eyre!("Failed to serialize payload: {}", e))?;

    // Write aside and rename so readers never see a half-written entry.
    let temp = self.temp_path(key);
    let result = write_with_mtime(&temp, &data, entry.stored_at.into())
      .and_then(|_| fs::rename(&temp, self.entry_path(key)));

    if let Err(e) = result {
      let _ = fs::remove_file(&temp);
      return Err(eyre!("Failed to write cache file for {}: {}", key, e));
    }

    Ok(())
  }
}

fn write_with_mtime(path: &Path, data: &[u8], modified: SystemTime) -> std::io::Result<()> {
  let mut file = File::create(path)?;
  file.write_all(data)?;
  file.set_modified(modified)?;
  file.sync_all()
}

/// SQLite-based cache storage implementation.
pub struct SqliteStorage {
  conn: Mutex<Connection>,
}

impl SqliteStorage {
  /// File name of the database inside the cache directory.
  pub const FILE_NAME: &'static str = "response_cache.db";

  /// Open (or create) the database inside `dir`.
  pub fn open(dir: &Path) -> Result<Self> {
    fs::create_dir_all(dir)
      .map_err(|e| eyre!("Failed to create cache directory {}: {}", dir.display(), e))?;

    let path = dir.join(Self::FILE_NAME);
    let conn = Connection::open(&path)
      .map_err(|e| eyre!("Failed to open cache database at {}: {}", path.display(), e))?;

    let storage = Self {
      conn: Mutex::new(conn),
    };
    storage.run_migrations()?;

    Ok(storage)
  }

  /// Run database migrations for cache tables.
  fn run_migrations(&self) -> Result<()> {
    let conn = self
      .conn
      .lock()
      .map_err(|e| eyre!("Lock poisoned: {}", e))?;

    conn
      .execute_batch(CACHE_SCHEMA)
      .map_err(|e| eyre!("Failed to run cache migrations: {}", e))?;

    Ok(())
  }
}

/// Schema for cache tables.
const CACHE_SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS response_cache (
    key_hash TEXT PRIMARY KEY,
    cache_key TEXT NOT NULL,
    payload BLOB NOT NULL,
    stored_at TEXT NOT NULL
);
"#;

impl CacheStorage for SqliteStorage {
  fn read(&self, key: &CacheKey) -> Result<Option<CacheEntry>> {
    let conn = self
      .conn
      .lock()
      .map_err(|e| eyre!("Lock poisoned: {}", e))?;

    let row: Option<(Vec<u8>, String)> = conn
      .query_row(
        "SELECT payload, stored_at FROM response_cache WHERE key_hash = ?",
        params![key.digest()],
        |row| Ok((row.get(0)?, row.get(1)?)),
      )
      .optional()
      .map_err(|e| eyre!("Failed to query cache entry: {}", e))?;

    match row {
      Some((data, stored_at)) => {
        let value = serde_json::from_slice(&data)
          .map_err(|e| eyre!("Failed to deserialize payload: {}", e))?;
        Ok(Some(CacheEntry {
          key: key.as_str().to_string(),
          value,
          stored_at: parse_datetime(&stored_at)?,
        }))
      }
      None => Ok(None),
    }
  }

  fn write(&self, key: &CacheKey, entry: &CacheEntry) -> Result<()> {
    let conn = self
      .conn
      .lock()
      .map_err(|e| eyre!("Lock poisoned: {}", e))?;
    let data =
      serde_json::to_vec(&entry.value).map_err(|e| eyre!("Failed to serialize payload: {}", e))?;

    conn
      .execute(
        "INSERT OR REPLACE INTO response_cache (key_hash, cache_key, payload, stored_at)
         VALUES (?, ?, ?, ?)",
        params![
          key.digest(),
          entry.key,
          data,
          entry.stored_at.to_rfc3339_opts(SecondsFormat::Micros, true)
        ],
      )
      .map_err(|e| eyre!("Failed to store cache entry: {}", e))?;

    Ok(())
  }
}

/// Parse an RFC 3339 timestamp as written by [`SqliteStorage`].
fn parse_datetime(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| eyre!("Failed to parse datetime '{}': {}", s, e))
}
