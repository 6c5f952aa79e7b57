use std::sync::Arc;
use std::time::Duration;

use sqlx::SqlitePool;

use crate::store::{MovieStore, SqliteMovieStore};

/// Every store the application uses, behind one cloneable handle.
///
/// Built once at startup and passed to whatever needs storage.
#[derive(Clone)]
pub struct Models {
    pub movies: Arc<dyn MovieStore>,
}

impl Models {
    pub fn new(pool: SqlitePool, query_timeout: Duration) -> Self {
        Self::with_movies(Arc::new(SqliteMovieStore::with_timeout(
            pool,
            query_timeout,
        )))
    }

    pub fn with_movies(movies: Arc<dyn MovieStore>) -> Self {
        Self { movies }
    }

    /// Models backed by in-memory stores.
    #[cfg(any(test, feature = "test-utils"))]
    pub fn in_memory() -> Self {
        Self::with_movies(Arc::new(crate::store::memory::InMemoryMovieStore::new()))
    }
}
