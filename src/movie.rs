use chrono::{DateTime, Datelike, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ValidationErrors;
use crate::runtime::Runtime;
use crate::validator::{unique, Validator};

/// Earliest year a movie can have been released.
pub const MIN_YEAR: i32 = 1888;

pub const MAX_TITLE_BYTES: usize = 500;

pub const MAX_GENRES: usize = 5;

/// A stored movie.
///
/// `id`, `created_at` and `version` are assigned by the store. `created_at`
/// never leaves the process.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Movie {
    #[serde(default)]
    pub id: i64,
    #[serde(skip)]
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub title: String,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub year: i32,
    #[serde(default, skip_serializing_if = "Runtime::is_zero")]
    pub runtime: Runtime,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub genres: Vec<String>,
    #[serde(default)]
    pub version: i32,
}

fn is_zero(n: &i32) -> bool {
    *n == 0
}

impl Movie {
    /// Build an unsaved candidate; `runtime` is in minutes.
    pub fn new(
        title: impl Into<String>,
        year: i32,
        runtime: i32,
        genres: Vec<String>,
    ) -> Self {
        Self {
            title: title.into(),
            year,
            runtime: Runtime(runtime),
            genres,
            ..Self::default()
        }
    }

    /// Run every movie rule against `now`.
    pub fn validate(&self, now: DateTime<Utc>) -> Result<(), ValidationErrors> {
        let mut v = Validator::new();
        validate_movie(&mut v, self, now);
        v.finish()
    }
}

/// Record every rule violation of `movie` in `v`.
///
/// The year ceiling is the calendar year of `now`.
pub fn validate_movie(v: &mut Validator, movie: &Movie, now: DateTime<Utc>) {
    v.check(!movie.title.is_empty(), "title", "must be provided");
    v.check(
        movie.title.len() <= MAX_TITLE_BYTES,
        "title",
        "must not be more than 500 bytes long",
    );

    v.check(movie.year != 0, "year", "must be provided");
    v.check(
        movie.year >= MIN_YEAR,
        "year",
        "must be greater than or equal to 1888",
    );
    v.check(movie.year <= now.year(), "year", "must not be in the future");

    v.check(!movie.runtime.is_zero(), "runtime", "must be provided");
    v.check(movie.runtime.0 > 0, "runtime", "must be a positive integer");

    v.check(!movie.genres.is_empty(), "genres", "must be provided");
    v.check(
        !movie.genres.is_empty(),
        "genres",
        "must contain at least 1 genre",
    );
    v.check(
        movie.genres.len() <= MAX_GENRES,
        "genres",
        "must not contain more than 5 genres",
    );
    v.check(
        unique(&movie.genres),
        "genres",
        "must not contain duplicate values",
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
    }

    fn genres(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    fn valid_movie() -> Movie {
        Movie::new("Casablanca", 1942, 102, genres(&["drama", "romance"]))
    }

    #[test]
    fn test_valid_movie() {
        assert!(valid_movie().validate(now()).is_ok());
    }

    #[test]
    fn test_boundaries_accepted() {
        let mut movie = valid_movie();
        movie.title = "a".repeat(500);
        movie.year = 1888;
        movie.runtime = Runtime(1);
        movie.genres = genres(&["a", "b", "c", "d", "e"]);
        assert!(movie.validate(now()).is_ok());

        movie.year = 2024;
        assert!(movie.validate(now()).is_ok());
    }

    #[test]
    fn test_missing_title() {
        let mut movie = valid_movie();
        movie.title = String::new();

        let errors = movie.validate(now()).unwrap_err();
        assert_eq!(errors.messages("title"), &["must be provided"]);
        assert_eq!(errors.0.len(), 1);
    }

    #[test]
    fn test_title_too_long() {
        let mut movie = valid_movie();
        movie.title = "é".repeat(251);

        let errors = movie.validate(now()).unwrap_err();
        assert_eq!(
            errors.messages("title"),
            &["must not be more than 500 bytes long"]
        );
    }

    #[test]
    fn test_year_rules() {
        let mut movie = valid_movie();
        movie.year = 0;
        let errors = movie.validate(now()).unwrap_err();
        assert_eq!(
            errors.messages("year"),
            &["must be provided", "must be greater than or equal to 1888"]
        );

        movie.year = 1887;
        assert!(movie.validate(now()).unwrap_err().contains("year"));

        movie.year = 2025;
        let errors = movie.validate(now()).unwrap_err();
        assert_eq!(errors.messages("year"), &["must not be in the future"]);
    }

    #[test]
    fn test_year_ceiling_follows_clock() {
        let mut movie = valid_movie();
        movie.year = 2030;

        assert!(movie.validate(now()).is_err());
        let later = Utc.with_ymd_and_hms(2030, 1, 1, 0, 0, 0).unwrap();
        assert!(movie.validate(later).is_ok());
    }

    #[test]
    fn test_runtime_rules() {
        let mut movie = valid_movie();
        movie.runtime = Runtime(0);
        let errors = movie.validate(now()).unwrap_err();
        assert_eq!(
            errors.messages("runtime"),
            &["must be provided", "must be a positive integer"]
        );

        movie.runtime = Runtime(-10);
        let errors = movie.validate(now()).unwrap_err();
        assert_eq!(errors.messages("runtime"), &["must be a positive integer"]);
    }

    #[test]
    fn test_genre_rules() {
        let mut movie = valid_movie();
        movie.genres = Vec::new();
        let errors = movie.validate(now()).unwrap_err();
        assert_eq!(
            errors.messages("genres"),
            &["must be provided", "must contain at least 1 genre"]
        );

        movie.genres = genres(&["a", "b", "c", "d", "e", "f"]);
        let errors = movie.validate(now()).unwrap_err();
        assert_eq!(
            errors.messages("genres"),
            &["must not contain more than 5 genres"]
        );

        movie.genres = genres(&["drama", "drama"]);
        let errors = movie.validate(now()).unwrap_err();
        assert_eq!(
            errors.messages("genres"),
            &["must not contain duplicate values"]
        );

        movie.genres = genres(&["drama", "Drama"]);
        assert!(movie.validate(now()).is_ok());
    }

    #[test]
    fn test_all_fields_reported_together() {
        let movie = Movie::default();
        let errors = movie.validate(now()).unwrap_err();

        for field in ["title", "year", "runtime", "genres"] {
            assert!(errors.contains(field), "missing finding for {field}");
        }
    }

    #[test]
    fn test_serialization_omits_zero_fields() {
        let mut movie = valid_movie();
        movie.id = 7;
        movie.version = 3;
        let json = serde_json::to_value(&movie).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "id": 7,
                "title": "Casablanca",
                "year": 1942,
                "runtime": "102 mins",
                "genres": ["drama", "romance"],
                "version": 3
            })
        );

        let bare = Movie {
            id: 1,
            title: "Untitled".to_string(),
            version: 1,
            ..Movie::default()
        };
        let json = serde_json::to_value(&bare).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "id": 1, "title": "Untitled", "version": 1 })
        );
        assert!(json.get("created_at").is_none());
    }

    #[test]
    fn test_deserialization() {
        let movie: Movie = serde_json::from_str(
            r#"{"title": "Moana", "year": 2016, "runtime": "107 mins", "genres": ["animation"]}"#,
        )
        .unwrap();
        assert_eq!(movie.title, "Moana");
        assert_eq!(movie.runtime, Runtime(107));
        assert_eq!(movie.id, 0);
        assert_eq!(movie.version, 0);

        let bad = serde_json::from_str::<Movie>(r#"{"title": "Moana", "runtime": 107}"#);
        assert!(bad.is_err());
    }
}
