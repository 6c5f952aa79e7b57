pub mod config;
pub mod db;
pub mod error;
pub mod filters;
pub mod models;
pub mod movie;
pub mod runtime;
pub mod service;
pub mod store;
pub mod validator;

pub use config::Config;
pub use db::{init_pool, init_pool_with, run_migrations, with_timeout};
pub use error::{RuntimeError, ServiceError, StoreError, ValidationErrors};
pub use filters::{validate_filters, Filters, Sort, SortColumn};
pub use models::Models;
pub use movie::{validate_movie, Movie};
pub use runtime::Runtime;
pub use service::{create_movie, delete_movie, update_movie, MoviePatch};
pub use store::{MovieStore, SqliteMovieStore};
pub use validator::Validator;

#[cfg(any(test, feature = "test-utils"))]
pub use store::memory::InMemoryMovieStore;
