use clap::{Parser, Subcommand};
use std::path::PathBuf;
use thiserror::Error;

use crate::bootstrap;
use crate::codec::StorageEnum;
use crate::models::{
    Book, BookStatus, EntryType, JournalEntry, Mood, Priority, Project, ProjectCategory, ProjectTodo, Task,
    WritingEntry,
};
use crate::repository::{Repositories, RepositoryError, Subscription};
use crate::utils::parse_date_time;

#[derive(Parser)]
#[command(name = "organizer")]
#[command(about = "Tasks, projects, reading list and journal - a personal organizer")]
#[command(version)]
pub struct Cli {
    /// Custom config file path
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Use development mode (uses separate dev config/database)
    #[arg(long)]
    pub dev: bool,

    /// Log at debug level unless RUST_LOG says otherwise
    #[arg(long)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Add a new task
    AddTask {
        title: String,
        /// Due date (YYYY-MM-DD)
        #[arg(long)]
        due: Option<String>,
        #[arg(long, default_value = "Personal")]
        category: String,
        #[arg(long, value_parser = parse_enum::<Priority>)]
        priority: Option<Priority>,
        #[arg(long)]
        description: Option<String>,
    },
    /// List tasks (incomplete by default)
    Tasks {
        #[arg(long, conflicts_with = "all")]
        completed: bool,
        #[arg(long)]
        all: bool,
        #[arg(long)]
        category: Option<String>,
        /// Case-sensitive text search over title and description
        #[arg(long)]
        search: Option<String>,
    },
    /// Toggle a task between done and not done
    ToggleTask { id: i64 },
    DeleteTask { id: i64 },
    /// List task categories
    Categories,
    AddProject {
        title: String,
        #[arg(long, value_parser = parse_enum::<ProjectCategory>, default_value = "personal")]
        category: ProjectCategory,
        #[arg(long, default_value = "")]
        description: String,
        /// Target date (YYYY-MM-DD)
        #[arg(long)]
        target: Option<String>,
    },
    /// List active projects
    Projects {
        #[arg(long)]
        completed: bool,
    },
    AddTodo {
        project_id: i64,
        title: String,
        #[arg(long, value_parser = parse_enum::<Priority>)]
        priority: Option<Priority>,
        /// Due date (YYYY-MM-DD)
        #[arg(long)]
        due: Option<String>,
    },
    /// List a project's todos
    Todos { project_id: i64 },
    ToggleTodo { id: i64 },
    /// Delete a project and all of its todos
    DeleteProject { id: i64 },
    AddBook {
        title: String,
        author: String,
        #[arg(long)]
        pages: Option<u32>,
        #[arg(long)]
        genre: Option<String>,
    },
    Books {
        #[arg(long, conflicts_with = "completed")]
        reading: bool,
        #[arg(long)]
        completed: bool,
    },
    /// Record reading progress for a book
    Read {
        id: i64,
        pages: u32,
        /// Mark the book as completed
        #[arg(long)]
        finished: bool,
    },
    AddJournal {
        content: String,
        #[arg(long)]
        title: Option<String>,
        /// Comma-separated tags
        #[arg(long)]
        tags: Option<String>,
        #[arg(long, value_parser = parse_enum::<Mood>)]
        mood: Option<Mood>,
    },
    /// List journal entries, newest first
    Journal {
        #[arg(long)]
        tag: Option<String>,
        #[arg(long, value_parser = parse_enum::<Mood>)]
        mood: Option<Mood>,
    },
    AddNote {
        title: String,
        #[arg(long)]
        content: Option<String>,
        /// Comma-separated tags
        #[arg(long)]
        tags: Option<String>,
    },
    Notes {
        #[arg(long)]
        search: Option<String>,
    },
    /// Insert default categories and sample records
    Seed,
    /// Print incomplete tasks every time they change, until Ctrl-C
    WatchTasks,
}

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    #[error("Failed to parse date: {0}")]
    DateParseError(String),
    #[error("{0}")]
    NotFound(String),
    #[error("Subscription ended before delivering a result")]
    SubscriptionClosed,
    #[error("Failed to wait for Ctrl-C: {0}")]
    Signal(#[from] std::io::Error),
}

/// Accept stored names case-insensitively, with `-` for `_`
fn parse_enum<E: StorageEnum>(value: &str) -> Result<E, String> {
    let name = value.trim().to_uppercase().replace('-', "_");
    E::from_name(&name).ok_or_else(|| {
        let choices: Vec<String> = E::VARIANTS.iter().map(|v| v.name().to_lowercase()).collect();
        format!("unknown {} '{}', expected one of: {}", E::KIND, value, choices.join(", "))
    })
}

fn parse_due(value: Option<String>) -> Result<Option<chrono::NaiveDateTime>, CliError> {
    value
        .map(|s| {
            parse_date_time(&s).map_err(|e| CliError::DateParseError(format!("Invalid date format '{}': {}", s, e)))
        })
        .transpose()
}

fn split_tags(tags: Option<String>) -> Vec<String> {
    tags.map(|t| {
        t.split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect()
    })
    .unwrap_or_default()
}

/// The current result of a live query
async fn snapshot<T>(mut subscription: Subscription<T>) -> Result<T, CliError> {
    match subscription.next().await {
        Some(result) => Ok(result?),
        None => Err(CliError::SubscriptionClosed),
    }
}

fn print_task(task: &Task) {
    let mark = if task.is_completed { "x" } else { " " };
    let due = task
        .due_date
        .map(|d| format!(", due {}", d.format("%Y-%m-%d")))
        .unwrap_or_default();
    println!(
        "[{}] {:>4}  {} ({}, {}{})",
        mark,
        task.id.unwrap_or_default(),
        task.title,
        task.category,
        task.priority,
        due
    );
    for subtask in &task.subtasks {
        let mark = if subtask.is_completed { "x" } else { " " };
        println!("         [{}] {}", mark, subtask.title);
    }
}

/// Handle the add-task command
pub async fn handle_add_task(
    title: String,
    due: Option<String>,
    category: String,
    priority: Option<Priority>,
    description: Option<String>,
    repos: &Repositories,
) -> Result<(), CliError> {
    let mut task = Task::new(title);
    task.due_date = parse_due(due)?;
    task.category = category;
    task.description = description;
    if let Some(priority) = priority {
        task.priority = priority;
    }

    let id = repos.tasks.insert(&task).await?;
    println!("Task created successfully (ID: {})", id);
    Ok(())
}

pub async fn handle_tasks(
    completed: bool,
    all: bool,
    category: Option<String>,
    search: Option<String>,
    repos: &Repositories,
) -> Result<(), CliError> {
    let subscription = match (category, search) {
        (Some(category), _) => repos.tasks.observe_by_category(&category),
        (None, Some(query)) => repos.tasks.observe_search(&query),
        (None, None) if all => repos.tasks.observe_all(),
        (None, None) if completed => repos.tasks.observe_completed(),
        (None, None) => repos.tasks.observe_incomplete(),
    };
    let tasks = snapshot(subscription).await?;
    if tasks.is_empty() {
        println!("No tasks");
    }
    tasks.iter().for_each(print_task);
    Ok(())
}

pub async fn handle_toggle_task(id: i64, repos: &Repositories) -> Result<(), CliError> {
    if !repos.tasks.toggle_completion(id).await? {
        return Err(CliError::NotFound(format!("No task with ID {}", id)));
    }
    if let Some(task) = repos.tasks.get(id).await? {
        print_task(&task);
    }
    Ok(())
}

pub async fn handle_delete_task(id: i64, repos: &Repositories) -> Result<(), CliError> {
    if !repos.tasks.delete(id).await? {
        return Err(CliError::NotFound(format!("No task with ID {}", id)));
    }
    println!("Task {} deleted", id);
    Ok(())
}

pub async fn handle_categories(repos: &Repositories) -> Result<(), CliError> {
    for category in snapshot(repos.categories.observe_all()).await? {
        let marker = if category.is_default { " (default)" } else { "" };
        println!("{}  {}{}", category.color, category.name, marker);
    }
    Ok(())
}

pub async fn handle_add_project(
    title: String,
    category: ProjectCategory,
    description: String,
    target: Option<String>,
    repos: &Repositories,
) -> Result<(), CliError> {
    let mut project = Project::new(title, category);
    project.description = description;
    project.target_date = parse_due(target)?;

    let id = repos.projects.insert(&project).await?;
    println!("Project created successfully (ID: {})", id);
    Ok(())
}

pub async fn handle_projects(completed: bool, repos: &Repositories) -> Result<(), CliError> {
    let subscription = if completed {
        repos.projects.observe_completed()
    } else {
        repos.projects.observe_active()
    };
    for project in snapshot(subscription).await? {
        let id = project.id.unwrap_or_default();
        let (total, done) = repos.projects.todo_counts(id).await?;
        let target = project
            .target_date
            .map(|d| format!(", target {}", d.format("%Y-%m-%d")))
            .unwrap_or_default();
        println!(
            "{:>4}  {} [{}] {}% ({}/{} todos{})",
            id, project.title, project.category, project.progress_percentage, done, total, target
        );
    }
    Ok(())
}

pub async fn handle_add_todo(
    project_id: i64,
    title: String,
    priority: Option<Priority>,
    due: Option<String>,
    repos: &Repositories,
) -> Result<(), CliError> {
    let mut todo = ProjectTodo::new(project_id, title);
    todo.due_date = parse_due(due)?;
    if let Some(priority) = priority {
        todo.priority = priority;
    }

    match repos.projects.insert_todo(&todo).await {
        Ok(id) => {
            println!("Todo created successfully (ID: {})", id);
            Ok(())
        }
        Err(e) if e.is_foreign_key_violation() => {
            Err(CliError::NotFound(format!("No project with ID {}", project_id)))
        }
        Err(e) => Err(e.into()),
    }
}

pub async fn handle_todos(project_id: i64, repos: &Repositories) -> Result<(), CliError> {
    for todo in snapshot(repos.projects.observe_todos(project_id)).await? {
        let mark = if todo.is_completed { "x" } else { " " };
        println!("[{}] {:>4}  {} ({})", mark, todo.id.unwrap_or_default(), todo.title, todo.priority);
    }
    Ok(())
}

pub async fn handle_toggle_todo(id: i64, repos: &Repositories) -> Result<(), CliError> {
    if !repos.projects.toggle_todo(id).await? {
        return Err(CliError::NotFound(format!("No todo with ID {}", id)));
    }
    println!("Todo {} toggled", id);
    Ok(())
}

pub async fn handle_delete_project(id: i64, repos: &Repositories) -> Result<(), CliError> {
    if !repos.projects.delete(id).await? {
        return Err(CliError::NotFound(format!("No project with ID {}", id)));
    }
    println!("Project {} deleted", id);
    Ok(())
}

pub async fn handle_add_book(
    title: String,
    author: String,
    pages: Option<u32>,
    genre: Option<String>,
    repos: &Repositories,
) -> Result<(), CliError> {
    let mut book = Book::new(title, author);
    book.total_pages = pages;
    book.genre = genre;

    let id = repos.books.insert(&book).await?;
    println!("Book added successfully (ID: {})", id);
    Ok(())
}

pub async fn handle_books(reading: bool, completed: bool, repos: &Repositories) -> Result<(), CliError> {
    let subscription = if reading {
        repos.books.observe_reading()
    } else if completed {
        repos.books.observe_completed()
    } else {
        repos.books.observe_all()
    };
    for book in snapshot(subscription).await? {
        let progress = book
            .progress_percent()
            .map(|p| format!(" {}%", p))
            .unwrap_or_default();
        println!(
            "{:>4}  {} by {} [{}]{}",
            book.id.unwrap_or_default(),
            book.title,
            book.author,
            book.status,
            progress
        );
    }
    Ok(())
}

/// Handle the read command. Progress on an unread book starts it.
pub async fn handle_read(id: i64, pages: u32, finished: bool, repos: &Repositories) -> Result<(), CliError> {
    let book = repos
        .books
        .get(id)
        .await?
        .ok_or_else(|| CliError::NotFound(format!("No book with ID {}", id)))?;

    repos.books.update_pages_read(id, pages).await?;
    if finished {
        repos.books.set_status(id, BookStatus::Completed).await?;
    } else if book.status == BookStatus::ToRead {
        repos.books.set_status(id, BookStatus::Reading).await?;
    }
    println!("Book {} now at page {}", id, pages);
    Ok(())
}

/// Handle the add-journal command
pub async fn handle_add_journal(
    content: String,
    title: Option<String>,
    tags: Option<String>,
    mood: Option<Mood>,
    repos: &Repositories,
) -> Result<(), CliError> {
    let mut entry = JournalEntry::new(content);
    entry.title = title;
    entry.tags = split_tags(tags);
    entry.mood = mood;

    let id = repos.journal.insert(&entry).await?;
    println!("Journal entry created successfully (ID: {})", id);
    Ok(())
}

pub async fn handle_journal(tag: Option<String>, mood: Option<Mood>, repos: &Repositories) -> Result<(), CliError> {
    let subscription = match (tag, mood) {
        (Some(tag), _) => repos.journal.observe_with_tag(&tag),
        (None, Some(mood)) => repos.journal.observe_by_mood(mood),
        (None, None) => repos.journal.observe_all(),
    };
    for entry in snapshot(subscription).await? {
        let mood = entry.mood.map(|m| format!(" [{}]", m)).unwrap_or_default();
        println!(
            "{:>4}  {}  {}{}",
            entry.id.unwrap_or_default(),
            entry.date.format("%Y-%m-%d"),
            entry.title.as_deref().unwrap_or("(untitled)"),
            mood
        );
        println!("      {}", entry.content);
    }
    Ok(())
}

/// Handle the add-note command
pub async fn handle_add_note(
    title: String,
    content: Option<String>,
    tags: Option<String>,
    repos: &Repositories,
) -> Result<(), CliError> {
    let mut note = WritingEntry::new(title, EntryType::Note);
    note.content = content.unwrap_or_default();
    note.tags = split_tags(tags);

    let id = repos.writing.insert(&note).await?;
    println!("Note created successfully (ID: {})", id);
    Ok(())
}

pub async fn handle_notes(search: Option<String>, repos: &Repositories) -> Result<(), CliError> {
    let subscription = match search {
        Some(query) => repos.writing.observe_search(&query),
        None => repos.writing.observe_all(),
    };
    for entry in snapshot(subscription).await? {
        let tags = if entry.tags.is_empty() {
            String::new()
        } else {
            format!(" #{}", entry.tags.join(" #"))
        };
        println!(
            "{:>4}  {} [{}]{}",
            entry.id.unwrap_or_default(),
            entry.title,
            entry.entry_type,
            tags
        );
    }
    Ok(())
}

pub async fn handle_seed(repos: &Repositories) -> Result<(), CliError> {
    if bootstrap::seed_sample_data(repos).await? {
        println!("Sample data added");
    } else {
        println!("Tasks already exist; only default categories were checked");
    }
    Ok(())
}

pub async fn handle_watch_tasks(repos: &Repositories) -> Result<(), CliError> {
    let mut subscription = repos.tasks.observe_incomplete();
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            signal = &mut ctrl_c => {
                signal?;
                break;
            }
            update = subscription.next() => match update {
                Some(tasks) => {
                    let tasks = tasks?;
                    println!("--- {} open task(s) ---", tasks.len());
                    tasks.iter().for_each(print_task);
                }
                None => break,
            },
        }
    }
    subscription.cancel();
    Ok(())
}
