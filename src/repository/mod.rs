//! Domain-level facades over the storage engine.
//!
//! Each repository translates between domain objects and storage rows, runs
//! mutations on the engine's worker pool and exposes every list query as a
//! [`Subscription`] that re-delivers results after relevant commits.

mod books;
mod journal;
mod live;
mod projects;
mod tasks;
mod writing;

pub use books::BookRepository;
pub use journal::JournalRepository;
pub use live::Subscription;
pub use projects::ProjectRepository;
pub use tasks::{TaskCategoryRepository, TaskRepository};
pub use writing::WritingRepository;

use thiserror::Error;

use crate::codec::CodecError;
use crate::database::{Database, DatabaseError};

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error(transparent)]
    Database(#[from] DatabaseError),
    #[error(transparent)]
    Codec(#[from] CodecError),
    #[error("Invalid {field}: {message}")]
    InvalidValue { field: &'static str, message: String },
}

impl RepositoryError {
    pub fn is_constraint_violation(&self) -> bool {
        matches!(self, RepositoryError::Database(DatabaseError::ConstraintViolation(_)))
    }

    pub fn is_foreign_key_violation(&self) -> bool {
        matches!(self, RepositoryError::Database(err) if err.is_foreign_key_violation())
    }

    fn not_persisted(field: &'static str) -> Self {
        RepositoryError::InvalidValue {
            field,
            message: "value has no id; insert it first".to_string(),
        }
    }
}

pub type RepositoryResult<T> = Result<T, RepositoryError>;

/// Every repository, sharing one engine handle
#[derive(Debug, Clone)]
pub struct Repositories {
    pub tasks: TaskRepository,
    pub categories: TaskCategoryRepository,
    pub projects: ProjectRepository,
    pub books: BookRepository,
    pub journal: JournalRepository,
    pub writing: WritingRepository,
}

impl Repositories {
    pub fn new(db: &Database) -> Self {
        Self {
            tasks: TaskRepository::new(db.clone()),
            categories: TaskCategoryRepository::new(db.clone()),
            projects: ProjectRepository::new(db.clone()),
            books: BookRepository::new(db.clone()),
            journal: JournalRepository::new(db.clone()),
            writing: WritingRepository::new(db.clone()),
        }
    }
}

/// Decode every row, failing on the first row that does not decode
fn decode_rows<R, T>(rows: Vec<R>) -> RepositoryResult<Vec<T>>
where
    T: TryFrom<R, Error = CodecError>,
{
    rows.into_iter()
        .map(|row| T::try_from(row).map_err(RepositoryError::from))
        .collect()
}
