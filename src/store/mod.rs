//! Article store
//!
//! Persistence facade over the single `articles` table. Every operation is one
//! parameterized statement on a pooled SQLite connection; there is no
//! in-memory cache and no multi-statement transaction.

mod article;
mod sqlite;

pub use article::{Article, ArticleId};
pub use sqlite::ArticleStore;

use std::path::PathBuf;
use thiserror::Error;

pub type StoreResult<T> = Result<T, StoreError>;

/// Errors raised by article persistence.
#[derive(Debug, Error)]
pub enum StoreError {
    /// No row matches the requested id.
    #[error("article not found: {0}")]
    NotFound(ArticleId),

    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// The data folder or database file could not be created.
    #[error("failed to prepare {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// No connection could be checked out of the pool.
    #[error("connection pool error: {0}")]
    Pool(#[from] r2d2::Error),
}
