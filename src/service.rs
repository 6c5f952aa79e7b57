//! Validate-then-persist flows over a [`MovieStore`].
//!
//! Nothing here retries. An `EditConflict` is handed back for the caller to
//! re-fetch or report.

use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::error::{ServiceError, StoreError};
use crate::movie::Movie;
use crate::runtime::Runtime;
use crate::store::MovieStore;

/// Partial update. Absent fields keep their stored value.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MoviePatch {
    pub title: Option<String>,
    pub year: Option<i32>,
    pub runtime: Option<Runtime>,
    pub genres: Option<Vec<String>>,
    /// Version the client last saw, if it sent one.
    #[serde(default)]
    pub expected_version: Option<i32>,
}

impl MoviePatch {
    fn apply(self, movie: &mut Movie) {
        if let Some(title) = self.title {
            movie.title = title;
        }
        if let Some(year) = self.year {
            movie.year = year;
        }
        if let Some(runtime) = self.runtime {
            movie.runtime = runtime;
        }
        if let Some(genres) = self.genres {
            movie.genres = genres;
        }
    }
}

pub async fn create_movie(
    store: &dyn MovieStore,
    candidate: &Movie,
    now: DateTime<Utc>,
) -> Result<Movie, ServiceError> {
    candidate.validate(now)?;
    Ok(store.insert(candidate).await?)
}

/// Read, patch, validate and conditionally write a movie.
pub async fn update_movie(
    store: &dyn MovieStore,
    id: i64,
    patch: MoviePatch,
    now: DateTime<Utc>,
) -> Result<Movie, ServiceError> {
    let mut movie = store.get(id).await?;

    if let Some(expected) = patch.expected_version {
        if expected != movie.version {
            tracing::debug!(
                id,
                expected,
                stored = movie.version,
                "client version is stale"
            );
            return Err(StoreError::EditConflict.into());
        }
    }

    patch.apply(&mut movie);
    movie.validate(now)?;

    Ok(store.update(&movie).await?)
}

pub async fn delete_movie(store: &dyn MovieStore, id: i64) -> Result<(), ServiceError> {
    Ok(store.delete(id).await?)
}
