//! SQLite entity store: tags, snippets, and their associations.
//!
//! One connection per store, guarded by a mutex. Every operation acquires
//! the connection for its own scope; transactions commit on success and
//! roll back when dropped on an error path.

use std::path::Path;
use std::sync::{Arc, Mutex};

use rusqlite::{Connection, OpenFlags, params};

use crate::error::{Result, SnipError};

mod snippets;
mod tags;

#[derive(Clone)]
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
}

impl std::fmt::Debug for SqliteStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteStore").finish_non_exhaustive()
    }
}

impl SqliteStore {
    /// Opens (creating if needed) a writable store and applies the schema.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        let store = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        store.migrate()?;
        Ok(store)
    }

    /// Opens an existing store read-only. The schema is verified, never
    /// migrated; a missing file or missing tables is reported as
    /// [`SnipError::StoreUnavailable`].
    pub fn open_read_only(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .map_err(|err| {
            SnipError::StoreUnavailable(format!("cannot open {}: {err}", path.display()))
        })?;
        let store = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        store.verify_schema(path).map_err(|err| match err {
            SnipError::StoreUnavailable(_) => err,
            other => SnipError::StoreUnavailable(format!("{}: {other}", path.display())),
        })?;
        Ok(store)
    }

    fn with_conn<T>(&self, f: impl FnOnce(&Connection) -> Result<T>) -> Result<T> {
        let conn = self
            .conn
            .lock()
            .map_err(|_| SnipError::mutex_poisoned("sqlite"))?;
        f(&conn)
    }

    fn with_tx<T>(&self, f: impl FnOnce(&rusqlite::Transaction<'_>) -> Result<T>) -> Result<T> {
        let mut conn = self
            .conn
            .lock()
            .map_err(|_| SnipError::mutex_poisoned("sqlite"))?;
        let tx = conn.transaction()?;
        let value = f(&tx)?;
        tx.commit()?;
        drop(conn);
        Ok(value)
    }

    fn migrate(&self) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute_batch(
                r#"
                PRAGMA journal_mode = WAL;
                PRAGMA foreign_keys = ON;

                CREATE TABLE IF NOT EXISTS tags (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    name TEXT NOT NULL,
                    parent_id INTEGER REFERENCES tags(id),
                    type TEXT NOT NULL DEFAULT 'folder',
                    icon TEXT NOT NULL DEFAULT '📁',
                    color TEXT NOT NULL DEFAULT '#64B5F6',
                    description TEXT,
                    position INTEGER NOT NULL DEFAULT 0,
                    created_at TEXT NOT NULL,
                    updated_at TEXT NOT NULL
                );

                CREATE INDEX IF NOT EXISTS idx_tags_parent_id ON tags(parent_id);
                CREATE INDEX IF NOT EXISTS idx_tags_name ON tags(name);

                CREATE TABLE IF NOT EXISTS snippets (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    name TEXT NOT NULL,
                    code TEXT NOT NULL,
                    description TEXT,
                    language TEXT,
                    usage_count INTEGER NOT NULL DEFAULT 0,
                    last_used TEXT,
                    origin TEXT NOT NULL DEFAULT 'primary',
                    is_favorite INTEGER NOT NULL DEFAULT 0,
                    created_at TEXT NOT NULL,
                    updated_at TEXT NOT NULL
                );

                CREATE INDEX IF NOT EXISTS idx_snippets_name ON snippets(name);
                CREATE INDEX IF NOT EXISTS idx_snippets_language ON snippets(language);
                CREATE INDEX IF NOT EXISTS idx_snippets_usage ON snippets(usage_count);

                CREATE TABLE IF NOT EXISTS tag_snippets (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    tag_id INTEGER NOT NULL REFERENCES tags(id),
                    snippet_id INTEGER NOT NULL REFERENCES snippets(id) ON DELETE CASCADE,
                    created_at TEXT NOT NULL,
                    UNIQUE (tag_id, snippet_id)
                );

                CREATE INDEX IF NOT EXISTS idx_tag_snippets_tag_id ON tag_snippets(tag_id);
                CREATE INDEX IF NOT EXISTS idx_tag_snippets_snippet_id ON tag_snippets(snippet_id);
                "#,
            )?;
            Ok(())
        })
    }

    fn verify_schema(&self, path: &Path) -> Result<()> {
        self.with_conn(|conn| {
            for table in ["tags", "snippets", "tag_snippets"] {
                let present: i64 = conn.query_row(
                    "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?1",
                    params![table],
                    |row| row.get(0),
                )?;
                if present == 0 {
                    return Err(SnipError::StoreUnavailable(format!(
                        "{} is missing table '{table}'",
                        path.display()
                    )));
                }
            }
            Ok(())
        })
    }
}
