use std::path::Path;

use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use thiserror::Error;

/// Errors from the media library collaborator
#[derive(Error, Debug)]
pub enum LibraryError {
    /// The library database could not be opened or queried
    #[error("library database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Media library collaborator.
///
/// The player core only ever asks the library for one thing: a single
/// random track to continue playback with. Discovering or managing the
/// library's contents is out of scope.
#[async_trait]
pub trait MediaLibrary: Send + Sync {
    /// Pick one random track path, or `None` when the library is empty.
    ///
    /// # Errors
    /// Returns `LibraryError::Database` on query failure.
    async fn pick_random(&self) -> Result<Option<String>, LibraryError>;
}

/// Library backed by a beets-compatible SQLite database.
pub struct SqliteLibrary {
    pool: SqlitePool,
}

impl SqliteLibrary {
    /// Open the library database read-only.
    ///
    /// # Errors
    /// Returns `LibraryError::Database` if the file cannot be opened.
    pub async fn open(path: &Path) -> Result<Self, LibraryError> {
        let options = SqliteConnectOptions::new().filename(path).read_only(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await?;

        Ok(Self { pool })
    }
}

#[async_trait]
impl MediaLibrary for SqliteLibrary {
    async fn pick_random(&self) -> Result<Option<String>, LibraryError> {
        let row: Option<(String,)> =
            sqlx::query_as("SELECT path FROM items ORDER BY RANDOM() LIMIT 1")
                .fetch_optional(&self.pool)
                .await?;

        Ok(row.map(|(path,)| path))
    }
}

/// Library used when no database is configured; never yields a track, so
/// playback stops at the end of the playlist.
pub struct NoLibrary;

#[async_trait]
impl MediaLibrary for NoLibrary {
    async fn pick_random(&self) -> Result<Option<String>, LibraryError> {
        Ok(None)
    }
}
