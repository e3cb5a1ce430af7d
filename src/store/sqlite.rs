//! SQLite-backed article store.

use super::{Article, ArticleId, StoreError, StoreResult};
use crate::logger;
use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::{params, Connection, OpenFlags, OptionalExtension, Row};
use std::fs;
use std::path::Path;
use std::time::{Duration, Instant};

const CREATE_ARTICLES_TABLE_SQL: &str = "CREATE TABLE IF NOT EXISTS articles (
    id INTEGER NOT NULL PRIMARY KEY AUTOINCREMENT,
    title TEXT,
    content TEXT
);";

const ARTICLE_SELECT_SQL: &str = "SELECT id, title, content FROM articles";

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Shared handle to the article table.
///
/// Each operation checks a connection out of the pool, so requests never
/// wait on each other here; SQLite itself serializes writers.
pub struct ArticleStore {
    pool: Pool<SqliteConnectionManager>,
}

impl ArticleStore {
    /// Opens the database file at `path`, creating the data folder, the file
    /// and the `articles` table when they do not exist yet.
    ///
    /// Meant to run once at startup, before the listener is bound.
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        let path = path.as_ref();
        let started_at = Instant::now();

        prepare_data_file(path)?;

        let manager = SqliteConnectionManager::file(path)
            .with_flags(OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_CREATE)
            .with_init(configure_connection);
        let store = Self {
            pool: Pool::new(manager)?,
        };
        store.initialize()?;

        logger::log_info(&format!(
            "[Store] Opened {} ({}ms)",
            path.display(),
            started_at.elapsed().as_millis()
        ));
        Ok(store)
    }

    /// Every in-memory connection is its own database, so the pool holds
    /// exactly one and never recycles it.
    #[cfg(test)]
    pub fn open_in_memory() -> StoreResult<Self> {
        let pool = Pool::builder()
            .max_size(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .build(SqliteConnectionManager::memory())?;
        let store = Self { pool };
        store.initialize()?;
        Ok(store)
    }

    /// Ensures the `articles` table exists. Safe to call repeatedly.
    pub fn initialize(&self) -> StoreResult<()> {
        self.connection()?.execute_batch(CREATE_ARTICLES_TABLE_SQL)?;
        Ok(())
    }

    /// All articles in insertion order.
    pub fn list(&self) -> StoreResult<Vec<Article>> {
        let conn = self.connection()?;
        let mut stmt = conn.prepare(&format!("{ARTICLE_SELECT_SQL} ORDER BY id ASC"))?;
        let articles = stmt
            .query_map([], parse_article_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(articles)
    }

    pub fn get(&self, id: ArticleId) -> StoreResult<Article> {
        let conn = self.connection()?;
        conn.query_row(
            &format!("{ARTICLE_SELECT_SQL} WHERE id = ?1"),
            params![id],
            parse_article_row,
        )
        .optional()?
        .ok_or(StoreError::NotFound(id))
    }

    /// Inserts a new article and returns the id SQLite assigned to it.
    pub fn create(&self, title: &str, content: &str) -> StoreResult<ArticleId> {
        let conn = self.connection()?;
        conn.execute(
            "INSERT INTO articles (title, content) VALUES (?1, ?2)",
            params![title, content],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// Replaces title and content. Unknown ids are a silent no-op.
    pub fn update(&self, id: ArticleId, title: &str, content: &str) -> StoreResult<()> {
        let changed = self.connection()?.execute(
            "UPDATE articles SET title = ?1, content = ?2 WHERE id = ?3",
            params![title, content, id],
        )?;
        if changed == 0 {
            logger::log_debug(&format!("[Store] update matched no row for id {id}"));
        }
        Ok(())
    }

    /// Hard delete. Unknown ids are a silent no-op.
    pub fn delete(&self, id: ArticleId) -> StoreResult<()> {
        let changed = self
            .connection()?
            .execute("DELETE FROM articles WHERE id = ?1", params![id])?;
        if changed == 0 {
            logger::log_debug(&format!("[Store] delete matched no row for id {id}"));
        }
        Ok(())
    }

    /// Checks a connection out of the pool; it returns when dropped.
    pub fn connection(&self) -> StoreResult<PooledConnection<SqliteConnectionManager>> {
        Ok(self.pool.get()?)
    }
}

fn configure_connection(conn: &mut Connection) -> rusqlite::Result<()> {
    conn.busy_timeout(BUSY_TIMEOUT)?;
    // WAL lets readers proceed while a writer holds the lock
    conn.pragma_update_and_check(None, "journal_mode", "WAL", |_| Ok(()))
}

fn parse_article_row(row: &Row<'_>) -> rusqlite::Result<Article> {
    // Columns are nullable in the schema; absent text reads back as empty.
    Ok(Article {
        id: row.get(0)?,
        title: row.get::<_, Option<String>>(1)?.unwrap_or_default(),
        content: row.get::<_, Option<String>>(2)?.unwrap_or_default(),
    })
}

/// Creates the owner-only data folder and an empty database file if missing.
fn prepare_data_file(path: &Path) -> StoreResult<()> {
    if path.exists() {
        return Ok(());
    }

    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        create_private_dir(dir).map_err(|source| StoreError::Io {
            path: dir.to_path_buf(),
            source,
        })?;
    }

    logger::log_info(&format!("[Store] Creating {}", path.display()));
    fs::File::create(path).map_err(|source| StoreError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(())
}

#[cfg(unix)]
fn create_private_dir(dir: &Path) -> std::io::Result<()> {
    use std::os::unix::fs::DirBuilderExt;
    fs::DirBuilder::new().recursive(true).mode(0o700).create(dir)
}

#[cfg(not(unix))]
fn create_private_dir(dir: &Path) -> std::io::Result<()> {
    fs::create_dir_all(dir)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table_count(store: &ArticleStore) -> i64 {
        store
            .connection()
            .unwrap()
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = 'articles'",
                [],
                |row| row.get(0),
            )
            .unwrap()
    }

    #[test]
    fn test_create_and_get_roundtrip() {
        let store = ArticleStore::open_in_memory().unwrap();
        let id = store.create("T", "C").unwrap();

        let article = store.get(id).unwrap();
        assert_eq!(article.id, id);
        assert_eq!(article.title, "T");
        assert_eq!(article.content, "C");
    }

    #[test]
    fn test_ids_increase_monotonically() {
        let store = ArticleStore::open_in_memory().unwrap();
        let first = store.create("a", "").unwrap();
        let second = store.create("b", "").unwrap();
        store.delete(second).unwrap();
        let third = store.create("c", "").unwrap();

        assert!(first < second);
        // AUTOINCREMENT never reuses a deleted id
        assert!(second < third);
    }

    #[test]
    fn test_list_empty_store() {
        let store = ArticleStore::open_in_memory().unwrap();
        assert!(store.list().unwrap().is_empty());
    }

    #[test]
    fn test_list_in_insertion_order() {
        let store = ArticleStore::open_in_memory().unwrap();
        store.create("first", "1").unwrap();
        store.create("second", "2").unwrap();

        let titles: Vec<_> = store.list().unwrap().into_iter().map(|a| a.title).collect();
        assert_eq!(titles, vec!["first", "second"]);
    }

    #[test]
    fn test_get_unknown_id_is_not_found() {
        let store = ArticleStore::open_in_memory().unwrap();
        match store.get(42) {
            Err(StoreError::NotFound(id)) => assert_eq!(id, 42),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_update_preserves_identity() {
        let store = ArticleStore::open_in_memory().unwrap();
        let id = store.create("T", "C").unwrap();
        let other = store.create("other", "untouched").unwrap();

        store.update(id, "T2", "C2").unwrap();

        let updated = store.get(id).unwrap();
        assert_eq!(updated.id, id);
        assert_eq!(updated.title, "T2");
        assert_eq!(updated.content, "C2");
        assert_eq!(store.get(other).unwrap().content, "untouched");
    }

    #[test]
    fn test_update_and_delete_unknown_id_are_noops() {
        let store = ArticleStore::open_in_memory().unwrap();
        store.create("keep", "me").unwrap();

        store.update(999, "x", "y").unwrap();
        store.delete(999).unwrap();

        assert_eq!(store.list().unwrap().len(), 1);
    }

    #[test]
    fn test_delete_removes_exactly_one_row() {
        let store = ArticleStore::open_in_memory().unwrap();
        let a = store.create("a", "").unwrap();
        let b = store.create("b", "").unwrap();
        store.create("c", "").unwrap();

        store.delete(b).unwrap();

        let remaining = store.list().unwrap();
        assert_eq!(remaining.len(), 2);
        assert!(remaining.iter().all(|article| article.id != b));
        assert!(remaining.iter().any(|article| article.id == a));
    }

    #[test]
    fn test_values_are_bound_not_interpolated() {
        let store = ArticleStore::open_in_memory().unwrap();
        let hostile = "'); DROP TABLE articles; --";
        let id = store.create(hostile, "it's fine").unwrap();

        assert_eq!(store.get(id).unwrap().title, hostile);
        assert_eq!(table_count(&store), 1);
    }

    #[test]
    fn test_null_columns_read_as_empty_strings() {
        let store = ArticleStore::open_in_memory().unwrap();
        store
            .connection()
            .unwrap()
            .execute("INSERT INTO articles (title, content) VALUES (NULL, NULL)", [])
            .unwrap();

        let article = &store.list().unwrap()[0];
        assert_eq!(article.title, "");
        assert_eq!(article.content, "");
    }

    #[test]
    fn test_open_creates_folder_and_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".blog").join("sqlite-database.db");

        let store = ArticleStore::open(&path).unwrap();

        assert!(path.is_file());
        assert_eq!(table_count(&store), 1);

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = fs::metadata(path.parent().unwrap())
                .unwrap()
                .permissions()
                .mode();
            assert_eq!(mode & 0o777, 0o700);
        }
    }

    #[test]
    fn test_open_twice_keeps_table_and_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("blog.db");

        let first = ArticleStore::open(&path).unwrap();
        let id = first.create("persisted", "row").unwrap();
        first.initialize().unwrap();
        drop(first);

        let second = ArticleStore::open(&path).unwrap();
        assert_eq!(table_count(&second), 1);
        assert_eq!(second.get(id).unwrap().title, "persisted");
        assert_eq!(second.list().unwrap().len(), 1);
    }

    #[test]
    fn test_read_does_not_wait_on_a_busy_connection() {
        let dir = tempfile::tempdir().unwrap();
        let store = std::sync::Arc::new(ArticleStore::open(dir.path().join("blog.db")).unwrap());
        let id = store.create("T", "C").unwrap();

        let (held_tx, held_rx) = std::sync::mpsc::channel();
        let busy = {
            let store = std::sync::Arc::clone(&store);
            std::thread::spawn(move || {
                let _conn = store.connection().unwrap();
                held_tx.send(()).unwrap();
                std::thread::sleep(Duration::from_millis(1500));
            })
        };
        held_rx.recv().unwrap();

        let started_at = Instant::now();
        assert_eq!(store.get(id).unwrap().title, "T");
        let waited = started_at.elapsed();
        assert!(waited < Duration::from_millis(750), "read waited {waited:?}");

        busy.join().unwrap();
    }

    #[test]
    fn test_panic_while_holding_a_connection_does_not_break_the_store() {
        let store = std::sync::Arc::new(ArticleStore::open_in_memory().unwrap());
        let id = store.create("survivor", "").unwrap();

        let crashed = {
            let store = std::sync::Arc::clone(&store);
            std::thread::spawn(move || {
                let _conn = store.connection().unwrap();
                panic!("handler crashed mid-statement");
            })
        };
        assert!(crashed.join().is_err());

        assert_eq!(store.get(id).unwrap().title, "survivor");
    }
}
