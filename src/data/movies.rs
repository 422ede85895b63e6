//! Movie records.

use std::fmt;

use async_trait::async_trait;
use chrono::{DateTime, Datelike, Utc};
use serde::de::{self, Deserializer, Visitor};
use serde::{Deserialize, Serialize, Serializer};

use crate::data::{DataError, Filters, Metadata};
use crate::validator::{unique, Validator};

/// Sort keys accepted by the movie list endpoint.
pub const MOVIE_SORT_SAFELIST: &[&str] = &[
    "id", "title", "year", "runtime", "-id", "-title", "-year", "-runtime",
];

/// Running time in minutes. Travels over the wire as `"<n> mins"`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct Runtime(pub i32);

impl Serialize for Runtime {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format!("{} mins", self.0))
    }
}

impl<'de> Deserialize<'de> for Runtime {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct RuntimeVisitor;

        impl Visitor<'_> for RuntimeVisitor {
            type Value = Runtime;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a string of the form \"<minutes> mins\"")
            }

            fn visit_str<E: de::Error>(self, value: &str) -> Result<Runtime, E> {
                value
                    .strip_suffix(" mins")
                    .and_then(|n| n.parse::<i32>().ok())
                    .map(Runtime)
                    .ok_or_else(|| E::custom("invalid runtime format"))
            }
        }

        deserializer.deserialize_str(RuntimeVisitor)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Movie {
    pub id: i64,
    #[serde(skip)]
    pub created_at: DateTime<Utc>,
    pub title: String,
    #[serde(skip_serializing_if = "is_zero_year")]
    pub year: i32,
    #[serde(skip_serializing_if = "is_zero_runtime")]
    pub runtime: Runtime,
    pub genres: Vec<String>,
    /// Incremented on every update; used for optimistic locking.
    pub version: i32,
}

fn is_zero_year(year: &i32) -> bool {
    *year == 0
}

fn is_zero_runtime(runtime: &Runtime) -> bool {
    runtime.0 == 0
}

impl Movie {
    /// A movie that has not been stored yet.
    pub fn new(title: String, year: i32, runtime: Runtime, genres: Vec<String>) -> Self {
        Self {
            id: 0,
            created_at: Utc::now(),
            title,
            year,
            runtime,
            genres,
            version: 0,
        }
    }
}

pub fn validate_movie(v: &mut Validator, movie: &Movie) {
    v.check(!movie.title.is_empty(), "title", "must be provided");
    v.check(movie.title.len() <= 500, "title", "must not be more than 500 bytes long");

    v.check(movie.year != 0, "year", "must be provided");
    v.check(movie.year >= 1888, "year", "must be greater than 1888");
    v.check(movie.year <= Utc::now().year(), "year", "must not be in the future");

    v.check(movie.runtime.0 != 0, "runtime", "must be provided");
    v.check(movie.runtime.0 > 0, "runtime", "must be a positive integer");

    v.check(!movie.genres.is_empty(), "genres", "must contain at least 1 genre");
    v.check(movie.genres.len() <= 5, "genres", "must not contain more than 5 genres");
    v.check(unique(&movie.genres), "genres", "must not contain duplicate values");
}

#[async_trait]
pub trait MovieStore: Send + Sync {
    /// Store a new movie, assigning its id and initial version.
    async fn insert(&self, movie: Movie) -> Result<Movie, DataError>;

    async fn get(&self, id: i64) -> Result<Movie, DataError>;

    /// Replace a movie. `movie.version` must equal the stored version or the
    /// update fails with [`DataError::EditConflict`].
    async fn update(&self, movie: Movie) -> Result<Movie, DataError>;

    async fn delete(&self, id: i64) -> Result<(), DataError>;

    /// Movies whose title contains every word of `title` (case-insensitive)
    /// and whose genres include all of `genres`.
    async fn get_all(
        &self,
        title: &str,
        genres: &[String],
        filters: &Filters,
    ) -> Result<(Vec<Movie>, Metadata), DataError>;
}
