use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::SqlitePool;

use crate::db::{with_timeout, DEFAULT_QUERY_TIMEOUT};
use crate::error::StoreError;
use crate::filters::Filters;
use crate::movie::Movie;
use crate::runtime::Runtime;

/// Storage contract for movies.
///
/// Callers validate before `insert` and `update`; the store only enforces
/// the version precondition. Nothing is retried internally.
#[async_trait]
pub trait MovieStore: Send + Sync {
    /// Persist a new movie. `id`, `created_at` and `version` on the input
    /// are ignored and assigned by the store.
    async fn insert(&self, movie: &Movie) -> Result<Movie, StoreError>;

    async fn get(&self, id: i64) -> Result<Movie, StoreError>;

    /// Write `movie` only if the stored row still has `movie.version`.
    /// Returns the movie with its new version, or `EditConflict`.
    async fn update(&self, movie: &Movie) -> Result<Movie, StoreError>;

    /// Remove a movie regardless of its version.
    async fn delete(&self, id: i64) -> Result<(), StoreError>;

    /// Movies whose title contains `title` (ASCII case-insensitive) and whose
    /// genres include every entry of `genres`, ordered and paged by `filters`.
    async fn list(
        &self,
        title: &str,
        genres: &[String],
        filters: &Filters,
    ) -> Result<Vec<Movie>, StoreError>;
}

#[derive(Debug, sqlx::FromRow)]
struct MovieRow {
    id: i64,
    created_at: DateTime<Utc>,
    title: String,
    year: i32,
    runtime: i32,
    genres: Json<Vec<String>>,
    version: i32,
}

impl From<MovieRow> for Movie {
    fn from(row: MovieRow) -> Self {
        Movie {
            id: row.id,
            created_at: row.created_at,
            title: row.title,
            year: row.year,
            runtime: Runtime(row.runtime),
            genres: row.genres.0,
            version: row.version,
        }
    }
}

/// SQLite-backed movie store.
#[derive(Debug, Clone)]
pub struct SqliteMovieStore {
    pool: SqlitePool,
    query_timeout: Duration,
}

impl SqliteMovieStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self::with_timeout(pool, DEFAULT_QUERY_TIMEOUT)
    }

    pub fn with_timeout(pool: SqlitePool, query_timeout: Duration) -> Self {
        Self {
            pool,
            query_timeout,
        }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

#[async_trait]
impl MovieStore for SqliteMovieStore {
    async fn insert(&self, movie: &Movie) -> Result<Movie, StoreError> {
        let created_at = Utc::now();

        let (id, version): (i64, i32) = with_timeout("insert", self.query_timeout, async {
            let row = sqlx::query_as::<_, (i64, i32)>(
                r#"
                INSERT INTO movies (created_at, title, year, runtime, genres)
                VALUES (?, ?, ?, ?, ?)
                RETURNING id, version
                "#,
            )
            .bind(created_at)
            .bind(&movie.title)
            .bind(movie.year)
            .bind(movie.runtime.0)
            .bind(Json(&movie.genres))
            .fetch_one(&self.pool)
            .await?;
            Ok::<_, StoreError>(row)
        })
        .await?;

        tracing::debug!(id, "inserted movie");

        Ok(Movie {
            id,
            created_at,
            version,
            ..movie.clone()
        })
    }

    async fn get(&self, id: i64) -> Result<Movie, StoreError> {
        if id < 1 {
            return Err(StoreError::NotFound);
        }

        let row = with_timeout("get", self.query_timeout, async {
            let row = sqlx::query_as::<_, MovieRow>(
                r#"
                SELECT id, created_at, title, year, runtime, genres, version
                FROM movies
                WHERE id = ?
                "#,
            )
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
            Ok::<_, StoreError>(row)
        })
        .await?;

        row.map(Movie::from).ok_or(StoreError::NotFound)
    }

    async fn update(&self, movie: &Movie) -> Result<Movie, StoreError> {
        let updated = with_timeout("update", self.query_timeout, async {
            let row = sqlx::query_as::<_, (i32, DateTime<Utc>)>(
                r#"
                UPDATE movies
                SET title = ?, year = ?, runtime = ?, genres = ?, version = version + 1
                WHERE id = ? AND version = ?
                RETURNING version, created_at
                "#,
            )
            .bind(&movie.title)
            .bind(movie.year)
            .bind(movie.runtime.0)
            .bind(Json(&movie.genres))
            .bind(movie.id)
            .bind(movie.version)
            .fetch_optional(&self.pool)
            .await?;
            Ok::<_, StoreError>(row)
        })
        .await?;

        match updated {
            Some((version, created_at)) => {
                tracing::debug!(id = movie.id, version, "updated movie");
                Ok(Movie {
                    version,
                    created_at,
                    ..movie.clone()
                })
            }
            None => {
                tracing::debug!(
                    id = movie.id,
                    expected_version = movie.version,
                    "update rejected: edit conflict"
                );
                Err(StoreError::EditConflict)
            }
        }
    }

    async fn delete(&self, id: i64) -> Result<(), StoreError> {
        if id < 1 {
            return Err(StoreError::NotFound);
        }

        let rows_affected = with_timeout("delete", self.query_timeout, async {
            let result = sqlx::query("DELETE FROM movies WHERE id = ?")
                .bind(id)
                .execute(&self.pool)
                .await?;
            Ok::<_, StoreError>(result.rows_affected())
        })
        .await?;

        if rows_affected == 0 {
            return Err(StoreError::NotFound);
        }

        tracing::debug!(id, "deleted movie");
        Ok(())
    }

    async fn list(
        &self,
        title: &str,
        genres: &[String],
        filters: &Filters,
    ) -> Result<Vec<Movie>, StoreError> {
        // Column and direction come from closed enums, never from input text.
        let query = format!(
            r#"
            SELECT id, created_at, title, year, runtime, genres, version
            FROM movies
            WHERE (? = '' OR instr(lower(title), lower(?)) > 0)
              AND NOT EXISTS (
                  SELECT 1 FROM json_each(?) AS wanted
                  WHERE wanted.value NOT IN (SELECT value FROM json_each(movies.genres))
              )
            ORDER BY {} {}, id ASC
            LIMIT ? OFFSET ?
            "#,
            filters.sort.column.as_str(),
            filters.sort.direction(),
        );

        let rows = with_timeout("list", self.query_timeout, async {
            let rows = sqlx::query_as::<_, MovieRow>(&query)
                .bind(title)
                .bind(title)
                .bind(Json(genres))
                .bind(filters.limit())
                .bind(filters.offset())
                .fetch_all(&self.pool)
                .await?;
            Ok::<_, StoreError>(rows)
        })
        .await?;

        Ok(rows.into_iter().map(Movie::from).collect())
    }
}

// In-memory implementation for testing
#[cfg(any(test, feature = "test-utils"))]
pub mod memory {
    use super::*;
    use std::collections::BTreeMap;
    use tokio::sync::RwLock;

    #[derive(Debug)]
    struct State {
        next_id: i64,
        movies: BTreeMap<i64, Movie>,
    }

    impl Default for State {
        fn default() -> Self {
            Self {
                next_id: 1,
                movies: BTreeMap::new(),
            }
        }
    }

    /// In-memory movie store with the same error semantics as the SQLite one.
    #[derive(Debug)]
    pub struct InMemoryMovieStore {
        state: RwLock<State>,
        latency: Option<Duration>,
        query_timeout: Duration,
    }

    impl Default for InMemoryMovieStore {
        fn default() -> Self {
            Self {
                state: RwLock::new(State::default()),
                latency: None,
                query_timeout: DEFAULT_QUERY_TIMEOUT,
            }
        }
    }

    impl InMemoryMovieStore {
        pub fn new() -> Self {
            Self::default()
        }

        /// Delay every operation by `latency`, to simulate a wedged medium.
        pub fn with_latency(mut self, latency: Duration, query_timeout: Duration) -> Self {
            self.latency = Some(latency);
            self.query_timeout = query_timeout;
            self
        }

        /// Store `movie` as-is, keeping its id and version.
        pub async fn seed(&self, movie: Movie) {
            let mut state = self.state.write().await;
            state.next_id = state.next_id.max(movie.id.saturating_add(1));
            state.movies.insert(movie.id, movie);
        }

        async fn pause(&self) {
            if let Some(latency) = self.latency {
                tokio::time::sleep(latency).await;
            }
        }
    }

    #[async_trait]
    impl MovieStore for InMemoryMovieStore {
        async fn insert(&self, movie: &Movie) -> Result<Movie, StoreError> {
            with_timeout("insert", self.query_timeout, async {
                self.pause().await;
                let mut state = self.state.write().await;
                let id = state.next_id;
                state.next_id += 1;

                let stored = Movie {
                    id,
                    created_at: Utc::now(),
                    version: 1,
                    ..movie.clone()
                };
                state.movies.insert(id, stored.clone());
                Ok(stored)
            })
            .await
        }

        async fn get(&self, id: i64) -> Result<Movie, StoreError> {
            if id < 1 {
                return Err(StoreError::NotFound);
            }

            with_timeout("get", self.query_timeout, async {
                self.pause().await;
                let state = self.state.read().await;
                state.movies.get(&id).cloned().ok_or(StoreError::NotFound)
            })
            .await
        }

        async fn update(&self, movie: &Movie) -> Result<Movie, StoreError> {
            with_timeout("update", self.query_timeout, async {
                self.pause().await;
                let mut state = self.state.write().await;
                let stored = match state.movies.get_mut(&movie.id) {
                    Some(stored) if stored.version == movie.version => stored,
                    _ => return Err(StoreError::EditConflict),
                };

                stored.title = movie.title.clone();
                stored.year = movie.year;
                stored.runtime = movie.runtime;
                stored.genres = movie.genres.clone();
                stored.version += 1;

                Ok(stored.clone())
            })
            .await
        }

        async fn delete(&self, id: i64) -> Result<(), StoreError> {
            if id < 1 {
                return Err(StoreError::NotFound);
            }

            with_timeout("delete", self.query_timeout, async {
                self.pause().await;
                let mut state = self.state.write().await;
                state
                    .movies
                    .remove(&id)
                    .map(|_| ())
                    .ok_or(StoreError::NotFound)
            })
            .await
        }

        async fn list(
            &self,
            title: &str,
            genres: &[String],
            filters: &Filters,
        ) -> Result<Vec<Movie>, StoreError> {
            with_timeout("list", self.query_timeout, async {
                self.pause().await;
                let state = self.state.read().await;
                let needle = title.to_ascii_lowercase();

                let mut movies: Vec<Movie> = state
                    .movies
                    .values()
                    .filter(|m| m.title.to_ascii_lowercase().contains(&needle))
                    .filter(|m| genres.iter().all(|g| m.genres.contains(g)))
                    .cloned()
                    .collect();
                movies.sort_by(|a, b| filters.sort.compare(a, b));

                let offset = usize::try_from(filters.offset()).unwrap_or(0);
                let limit = usize::try_from(filters.limit()).unwrap_or(0);
                Ok(movies.into_iter().skip(offset).take(limit).collect())
            })
            .await
        }
    }

}
