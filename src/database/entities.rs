//! Row shapes, one per table. Fields hold exactly what SQLite stores: encoded
//! timestamps, enumeration names and serialized lists as text.
//!
//! `COLUMNS` lists the select order that `from_row` reads by index.

use rusqlite::Row;

#[derive(Debug, Clone, PartialEq)]
pub struct TaskRow {
    pub id: Option<i64>,
    pub title: String,
    pub description: Option<String>,
    pub category: String,
    pub priority: String,
    pub is_completed: bool,
    pub due_date: Option<String>,
    pub subtasks: String,
    pub created_at: String,
    pub updated_at: String,
}

impl TaskRow {
    pub const COLUMNS: &'static str =
        "id, title, description, category, priority, is_completed, due_date, subtasks, created_at, updated_at";

    pub fn from_row(row: &Row) -> Result<Self, rusqlite::Error> {
        Ok(Self {
            id: Some(row.get(0)?),
            title: row.get(1)?,
            description: row.get(2)?,
            category: row.get(3)?,
            priority: row.get(4)?,
            is_completed: row.get::<_, i64>(5)? != 0,
            due_date: row.get(6)?,
            subtasks: row.get(7)?,
            created_at: row.get(8)?,
            updated_at: row.get(9)?,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TaskCategoryRow {
    pub id: Option<i64>,
    pub name: String,
    pub color: String,
    pub is_default: bool,
}

impl TaskCategoryRow {
    pub const COLUMNS: &'static str = "id, name, color, is_default";

    pub fn from_row(row: &Row) -> Result<Self, rusqlite::Error> {
        Ok(Self {
            id: Some(row.get(0)?),
            name: row.get(1)?,
            color: row.get(2)?,
            is_default: row.get::<_, i64>(3)? != 0,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProjectRow {
    pub id: Option<i64>,
    pub title: String,
    pub description: String,
    pub category: String,
    pub progress_percentage: i64,
    pub is_completed: bool,
    pub start_date: String,
    pub target_date: Option<String>,
    pub completed_date: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl ProjectRow {
    pub const COLUMNS: &'static str = "id, title, description, category, progress_percentage, is_completed, \
         start_date, target_date, completed_date, created_at, updated_at";

    pub fn from_row(row: &Row) -> Result<Self, rusqlite::Error> {
        Ok(Self {
            id: Some(row.get(0)?),
            title: row.get(1)?,
            description: row.get(2)?,
            category: row.get(3)?,
            progress_percentage: row.get(4)?,
            is_completed: row.get::<_, i64>(5)? != 0,
            start_date: row.get(6)?,
            target_date: row.get(7)?,
            completed_date: row.get(8)?,
            created_at: row.get(9)?,
            updated_at: row.get(10)?,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProjectTodoRow {
    pub id: Option<i64>,
    pub project_id: i64,
    pub title: String,
    pub description: Option<String>,
    pub is_completed: bool,
    pub priority: String,
    pub due_date: Option<String>,
    pub created_at: String,
    pub completed_at: Option<String>,
}

impl ProjectTodoRow {
    pub const COLUMNS: &'static str =
        "id, project_id, title, description, is_completed, priority, due_date, created_at, completed_at";

    pub fn from_row(row: &Row) -> Result<Self, rusqlite::Error> {
        Ok(Self {
            id: Some(row.get(0)?),
            project_id: row.get(1)?,
            title: row.get(2)?,
            description: row.get(3)?,
            is_completed: row.get::<_, i64>(4)? != 0,
            priority: row.get(5)?,
            due_date: row.get(6)?,
            created_at: row.get(7)?,
            completed_at: row.get(8)?,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BookRow {
    pub id: Option<i64>,
    pub title: String,
    pub author: String,
    pub status: String,
    pub genre: Option<String>,
    pub total_pages: Option<i64>,
    pub pages_read: i64,
    pub rating: Option<i64>,
    pub notes: Option<String>,
    pub started_date: Option<String>,
    pub completed_date: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl BookRow {
    pub const COLUMNS: &'static str = "id, title, author, status, genre, total_pages, pages_read, rating, notes, \
         started_date, completed_date, created_at, updated_at";

    pub fn from_row(row: &Row) -> Result<Self, rusqlite::Error> {
        Ok(Self {
            id: Some(row.get(0)?),
            title: row.get(1)?,
            author: row.get(2)?,
            status: row.get(3)?,
            genre: row.get(4)?,
            total_pages: row.get(5)?,
            pages_read: row.get(6)?,
            rating: row.get(7)?,
            notes: row.get(8)?,
            started_date: row.get(9)?,
            completed_date: row.get(10)?,
            created_at: row.get(11)?,
            updated_at: row.get(12)?,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct JournalEntryRow {
    pub id: Option<i64>,
    pub title: Option<String>,
    pub content: String,
    pub mood: Option<String>,
    pub tags: String,
    pub date: String,
    pub created_at: String,
    pub updated_at: String,
}

impl JournalEntryRow {
    pub const COLUMNS: &'static str = "id, title, content, mood, tags, date, created_at, updated_at";

    pub fn from_row(row: &Row) -> Result<Self, rusqlite::Error> {
        Ok(Self {
            id: Some(row.get(0)?),
            title: row.get(1)?,
            content: row.get(2)?,
            mood: row.get(3)?,
            tags: row.get(4)?,
            date: row.get(5)?,
            created_at: row.get(6)?,
            updated_at: row.get(7)?,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct WritingEntryRow {
    pub id: Option<i64>,
    pub title: String,
    pub content: String,
    pub entry_type: String,
    pub mood: Option<String>,
    pub tags: String,
    pub attachments: String,
    pub checklists: String,
    pub created_at: String,
}

impl WritingEntryRow {
    pub const COLUMNS: &'static str =
        "id, title, content, entry_type, mood, tags, attachments, checklists, created_at";

    pub fn from_row(row: &Row) -> Result<Self, rusqlite::Error> {
        Ok(Self {
            id: Some(row.get(0)?),
            title: row.get(1)?,
            content: row.get(2)?,
            entry_type: row.get(3)?,
            mood: row.get(4)?,
            tags: row.get(5)?,
            attachments: row.get(6)?,
            checklists: row.get(7)?,
            created_at: row.get(8)?,
        })
    }
}
