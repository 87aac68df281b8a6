pub mod bootstrap;
pub mod cli;
pub mod codec;
pub mod config;
pub mod database;
pub mod logging;
pub mod models;
pub mod repository;
pub mod utils;

pub use config::Config;
pub use database::{Database, DatabaseError};
pub use models::{Book, JournalEntry, Project, ProjectTodo, Task, TaskCategory, WritingEntry};
pub use repository::{Repositories, RepositoryError, Subscription};
pub use utils::Profile;
