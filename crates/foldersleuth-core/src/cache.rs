//! Persistent memoisation of scan results, keyed by normalised absolute path.
//!
//! Backed by a single SQLite table. The connection is shared between the
//! control thread and the worker's background scan, so every operation goes
//! through one mutex; that also makes each upsert atomic with respect to
//! concurrent readers and writers in this process.
//!
//! Entries never expire. A row is trusted until [`FolderCache::invalidate`]
//! removes it.

use crate::error::CacheError;
use crate::model::{CacheEntry, ScanResult};
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension};
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS folders (
        path         TEXT PRIMARY KEY,
        size_bytes   INTEGER NOT NULL,
        file_count   INTEGER NOT NULL,
        last_scanned TEXT NOT NULL
    );
";

/// How long a write waits on another connection's lock before failing.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Row as read from SQLite, before range checks.
type RawRow = (i64, i64, String);

/// SQLite-backed folder size cache.
pub struct FolderCache {
    /// `None` once [`FolderCache::close`] has run.
    conn: Mutex<Option<Connection>>,
}

impl FolderCache {
    /// Open (or create) the store at `path` and make sure the table exists.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, CacheError> {
        let path = path.as_ref();
        let open_err = |source| CacheError::Open {
            path: path.to_path_buf(),
            source,
        };
        let conn = Connection::open(path).map_err(open_err)?;
        let cache = Self::init(conn).map_err(open_err)?;
        debug!("Opened folder cache at {}", path.display());
        Ok(cache)
    }

    /// Open a private in-memory store. Contents are lost on drop.
    pub fn open_in_memory() -> Result<Self, CacheError> {
        let open_err = |source| CacheError::Open {
            path: PathBuf::from(":memory:"),
            source,
        };
        let conn = Connection::open_in_memory().map_err(open_err)?;
        Self::init(conn).map_err(open_err)
    }

    fn init(conn: Connection) -> Result<Self, rusqlite::Error> {
        conn.busy_timeout(BUSY_TIMEOUT)?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Mutex::new(Some(conn)),
        })
    }

    /// Point lookup. No side effects.
    pub fn get(&self, path: &Path) -> Result<Option<CacheEntry>, CacheError> {
        let key = cache_key(path)?;
        let raw: Option<RawRow> = self.with_conn(|conn| {
            conn.query_row(
                "SELECT size_bytes, file_count, last_scanned FROM folders WHERE path = ?1",
                params![key_str(&key)?],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
            )
            .optional()
            .map_err(CacheError::from)
        })?;

        raw.map(|raw| decode_row(key, raw)).transpose()
    }

    /// Insert or overwrite the row for `result.path`, stamped with the
    /// current time.
    ///
    /// Cancelled results are partial and are not written.
    pub fn save(&self, result: &ScanResult) -> Result<(), CacheError> {
        if result.cancelled {
            debug!("Not caching cancelled scan of {}", result.path.display());
            return Ok(());
        }

        let key = cache_key(&result.path)?;
        let size_bytes = to_sql_int(&key, "size_bytes", result.size_bytes)?;
        let file_count = to_sql_int(&key, "file_count", result.file_count)?;
        let last_scanned = Utc::now().to_rfc3339();

        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO folders (path, size_bytes, file_count, last_scanned)
                 VALUES (?1, ?2, ?3, ?4)
                 ON CONFLICT(path) DO UPDATE SET
                     size_bytes = excluded.size_bytes,
                     file_count = excluded.file_count,
                     last_scanned = excluded.last_scanned",
                params![key_str(&key)?, size_bytes, file_count, last_scanned],
            )?;
            Ok(())
        })?;

        debug!("Cached {} ({} bytes)", key.display(), result.size_bytes);
        Ok(())
    }

    /// Remove the row for `path`. Returns `false` if there was none.
    pub fn invalidate(&self, path: &Path) -> Result<bool, CacheError> {
        let key = cache_key(path)?;
        let removed = self.with_conn(|conn| {
            conn.execute("DELETE FROM folders WHERE path = ?1", params![key_str(&key)?])
                .map_err(CacheError::from)
        })?;
        Ok(removed > 0)
    }

    /// Every cached row, ordered by path.
    pub fn entries(&self) -> Result<Vec<CacheEntry>, CacheError> {
        let rows: Vec<(String, RawRow)> = self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT path, size_bytes, file_count, last_scanned FROM folders ORDER BY path",
            )?;
            let rows = stmt
                .query_map([], |row| {
                    Ok((row.get(0)?, (row.get(1)?, row.get(2)?, row.get(3)?)))
                })?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(rows)
        })?;

        rows.into_iter()
            .map(|(path, raw)| decode_row(PathBuf::from(path), raw))
            .collect()
    }

    /// Release the store handle. Every later call returns [`CacheError::Closed`].
    pub fn close(&self) -> Result<(), CacheError> {
        let conn = self.conn.lock().take().ok_or(CacheError::Closed)?;
        conn.close().map_err(|(_, err)| CacheError::Store(err))
    }

    /// Run `f` on the open connection while holding the store lock.
    fn with_conn<T>(
        &self,
        f: impl FnOnce(&Connection) -> Result<T, CacheError>,
    ) -> Result<T, CacheError> {
        let guard = self.conn.lock();
        let conn = guard.as_ref().ok_or(CacheError::Closed)?;
        f(conn)
    }
}

/// Normalise `path` into the absolute form used as the primary key.
///
/// Relative paths are resolved against the working directory; `.`
/// components and trailing separators are dropped. Symlinks are not
/// resolved. Paths that are not valid UTF-8 are rejected; the key column
/// is text and must map one-to-one onto paths.
pub fn cache_key(path: &Path) -> Result<PathBuf, CacheError> {
    let absolute = std::path::absolute(path).map_err(|source| CacheError::InvalidPath {
        path: path.to_path_buf(),
        source,
    })?;
    let key: PathBuf = absolute.components().collect();
    key_str(&key)?;
    Ok(key)
}

fn key_str(key: &Path) -> Result<&str, CacheError> {
    key.to_str().ok_or_else(|| CacheError::InvalidPath {
        path: key.to_path_buf(),
        source: io::Error::new(io::ErrorKind::InvalidData, "path is not valid UTF-8"),
    })
}

fn to_sql_int(key: &Path, column: &str, value: u64) -> Result<i64, CacheError> {
    i64::try_from(value).map_err(|_| CacheError::Corrupt {
        path: key.to_path_buf(),
        detail: format!("{column} {value} does not fit the store"),
    })
}

fn decode_row(path: PathBuf, (size_bytes, file_count, last_scanned): RawRow) -> Result<CacheEntry, CacheError> {
    let corrupt = |detail: String| CacheError::Corrupt {
        path: path.clone(),
        detail,
    };
    let size_bytes =
        u64::try_from(size_bytes).map_err(|_| corrupt(format!("negative size_bytes {size_bytes}")))?;
    let file_count =
        u64::try_from(file_count).map_err(|_| corrupt(format!("negative file_count {file_count}")))?;
    let last_scanned = DateTime::parse_from_rfc3339(&last_scanned)
        .map_err(|e| corrupt(format!("bad last_scanned {last_scanned:?}: {e}")))?
        .with_timezone(&Utc);

    Ok(CacheEntry {
        path,
        size_bytes,
        file_count,
        last_scanned,
    })
}
