//! First-run seeding. Everything here goes through the repositories' ordinary
//! insert operations.

use chrono::Duration;
use tracing::info;

use crate::codec;
use crate::models::{
    Book, BookStatus, ChecklistItem, EntryType, JournalEntry, Mood, Priority, Project, ProjectCategory,
    ProjectTodo, Subtask, Task, TaskCategory, WritingEntry,
};
use crate::repository::{Repositories, RepositoryResult, TaskCategoryRepository};

/// Name and color of every built-in category
pub const DEFAULT_CATEGORIES: &[(&str, &str)] = &[
    ("Personal", "#4CAF50"),
    ("Work", "#2196F3"),
    ("Academic", "#9C27B0"),
    ("Health", "#F44336"),
    ("Errands", "#FF9800"),
];

/// Insert the built-in categories unless any default already exists.
/// Returns how many were inserted.
pub async fn seed_default_categories(categories: &TaskCategoryRepository) -> RepositoryResult<usize> {
    if categories.has_defaults().await? {
        return Ok(0);
    }
    for (name, color) in DEFAULT_CATEGORIES {
        let category = TaskCategory {
            is_default: true,
            ..TaskCategory::new(name.to_string(), color.to_string())
        };
        categories.insert(&category).await?;
    }
    info!(count = DEFAULT_CATEGORIES.len(), "seeded default task categories");
    Ok(DEFAULT_CATEGORIES.len())
}

/// Seed default categories plus one example record of each kind.
/// Sample records are only added while the task list is empty.
pub async fn seed_sample_data(repos: &Repositories) -> RepositoryResult<bool> {
    seed_default_categories(&repos.categories).await?;

    if repos.tasks.count().await? > 0 {
        return Ok(false);
    }

    let now = codec::now();

    let mut task = Task::new("Plan the week".to_string());
    task.priority = Priority::High;
    task.due_date = Some(now + Duration::days(1));
    task.subtasks = vec![
        Subtask {
            title: "Review calendar".to_string(),
            is_completed: false,
        },
        Subtask {
            title: "Pick three goals".to_string(),
            is_completed: false,
        },
    ];
    repos.tasks.insert(&task).await?;

    let mut project = Project::new("Learn a new language".to_string(), ProjectCategory::Personal);
    project.description = "Reach conversational level".to_string();
    project.target_date = Some(now + Duration::days(90));
    let project_id = repos.projects.insert(&project).await?;
    let mut todo = ProjectTodo::new(project_id, "Find a course".to_string());
    todo.priority = Priority::High;
    repos.projects.insert_todo(&todo).await?;

    let mut book = Book::new("The Pragmatic Programmer".to_string(), "Hunt & Thomas".to_string());
    book.total_pages = Some(352);
    book.status = BookStatus::Reading;
    book.started_date = Some(now);
    repos.books.insert(&book).await?;

    let mut entry = JournalEntry::new("Started using the organizer today.".to_string());
    entry.title = Some("First entry".to_string());
    entry.mood = Some(Mood::Excited);
    entry.tags = vec!["start".to_string()];
    repos.journal.insert(&entry).await?;

    let mut note = WritingEntry::new("Ideas".to_string(), EntryType::Note);
    note.content = "Things worth trying".to_string();
    note.checklists = vec![ChecklistItem {
        text: "Morning pages".to_string(),
        is_completed: false,
    }];
    repos.writing.insert(&note).await?;

    info!("seeded sample data");
    Ok(true)
}
