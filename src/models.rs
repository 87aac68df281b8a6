use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::codec::{self, storage_enum};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Priority {
    Low,
    Medium,
    High,
    Urgent,
}

storage_enum!(Priority, "priority", {
    Low => "LOW",
    Medium => "MEDIUM",
    High => "HIGH",
    Urgent => "URGENT",
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProjectCategory {
    Academic,
    Personal,
    Career,
    Extracurricular,
    Other,
}

storage_enum!(ProjectCategory, "project category", {
    Academic => "ACADEMIC",
    Personal => "PERSONAL",
    Career => "CAREER",
    Extracurricular => "EXTRACURRICULAR",
    Other => "OTHER",
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BookStatus {
    ToRead,
    Reading,
    Completed,
    Dnf,
}

storage_enum!(BookStatus, "book status", {
    ToRead => "TO_READ",
    Reading => "READING",
    Completed => "COMPLETED",
    Dnf => "DNF",
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Mood {
    Happy,
    Excited,
    Grateful,
    Calm,
    Neutral,
    Tired,
    Anxious,
    Sad,
    Angry,
}

storage_enum!(Mood, "mood", {
    Happy => "HAPPY",
    Excited => "EXCITED",
    Grateful => "GRATEFUL",
    Calm => "CALM",
    Neutral => "NEUTRAL",
    Tired => "TIRED",
    Anxious => "ANXIOUS",
    Sad => "SAD",
    Angry => "ANGRY",
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EntryType {
    Journal,
    Note,
}

storage_enum!(EntryType, "entry type", {
    Journal => "JOURNAL",
    Note => "NOTE",
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AttachmentType {
    Image,
    Audio,
    Video,
    File,
}

storage_enum!(AttachmentType, "attachment type", {
    Image => "IMAGE",
    Audio => "AUDIO",
    Video => "VIDEO",
    File => "FILE",
});

/// A checklist line inside a task. Persisted inside the task row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subtask {
    pub title: String,
    #[serde(default)]
    pub is_completed: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: Option<i64>,
    pub title: String,
    pub description: Option<String>,
    pub category: String, // matches TaskCategory::name, not its id
    pub priority: Priority,
    pub is_completed: bool,
    pub due_date: Option<NaiveDateTime>,
    pub subtasks: Vec<Subtask>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl Task {
    pub fn new(title: String) -> Self {
        let now = codec::now();
        Self {
            id: None,
            title,
            description: None,
            category: "Personal".to_string(),
            priority: Priority::Medium,
            is_completed: false,
            due_date: None,
            subtasks: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskCategory {
    pub id: Option<i64>,
    pub name: String,
    pub color: String, // #RRGGBB
    pub is_default: bool,
}

impl TaskCategory {
    pub fn new(name: String, color: String) -> Self {
        Self {
            id: None,
            name,
            color,
            is_default: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub id: Option<i64>,
    pub title: String,
    pub description: String,
    pub category: ProjectCategory,
    pub progress_percentage: u8, // 0..=100
    pub is_completed: bool,
    pub start_date: NaiveDateTime,
    pub target_date: Option<NaiveDateTime>,
    pub completed_date: Option<NaiveDateTime>, // set iff is_completed
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl Project {
    pub fn new(title: String, category: ProjectCategory) -> Self {
        let now = codec::now();
        Self {
            id: None,
            title,
            description: String::new(),
            category,
            progress_percentage: 0,
            is_completed: false,
            start_date: now,
            target_date: None,
            completed_date: None,
            created_at: now,
            updated_at: now,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectTodo {
    pub id: Option<i64>,
    pub project_id: i64,
    pub title: String,
    pub description: Option<String>,
    pub is_completed: bool,
    pub priority: Priority,
    pub due_date: Option<NaiveDateTime>,
    pub created_at: NaiveDateTime,
    pub completed_at: Option<NaiveDateTime>, // set iff is_completed
}

impl ProjectTodo {
    pub fn new(project_id: i64, title: String) -> Self {
        Self {
            id: None,
            project_id,
            title,
            description: None,
            is_completed: false,
            priority: Priority::Medium,
            due_date: None,
            created_at: codec::now(),
            completed_at: None,
        }
    }
}

/// Reading progress for a single book.
///
/// `pages_read` is expected not to exceed `total_pages` when the latter is
/// known. Storage does not enforce this; callers are responsible for it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Book {
    pub id: Option<i64>,
    pub title: String,
    pub author: String,
    pub status: BookStatus,
    pub genre: Option<String>,
    pub total_pages: Option<u32>,
    pub pages_read: u32,
    pub rating: Option<u8>, // 1..=5
    pub notes: Option<String>,
    pub started_date: Option<NaiveDateTime>,
    pub completed_date: Option<NaiveDateTime>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl Book {
    pub fn new(title: String, author: String) -> Self {
        let now = codec::now();
        Self {
            id: None,
            title,
            author,
            status: BookStatus::ToRead,
            genre: None,
            total_pages: None,
            pages_read: 0,
            rating: None,
            notes: None,
            started_date: None,
            completed_date: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Percentage of the book read, when the page count is known
    pub fn progress_percent(&self) -> Option<u8> {
        match self.total_pages {
            Some(total) if total > 0 => {
                let pages = self.pages_read.min(total) as u64;
                Some((pages * 100 / total as u64) as u8)
            }
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JournalEntry {
    pub id: Option<i64>,
    pub title: Option<String>,
    pub content: String,
    pub mood: Option<Mood>,
    pub tags: Vec<String>,
    pub date: NaiveDateTime,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl JournalEntry {
    pub fn new(content: String) -> Self {
        let now = codec::now();
        Self {
            id: None,
            title: None,
            content,
            mood: None,
            tags: Vec::new(),
            date: now,
            created_at: now,
            updated_at: now,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    #[serde(rename = "type")]
    pub kind: AttachmentType,
    pub path: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChecklistItem {
    pub text: String,
    #[serde(default)]
    pub is_completed: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WritingEntry {
    pub id: Option<i64>,
    pub title: String,
    pub content: String,
    pub entry_type: EntryType,
    pub mood: Option<Mood>,
    pub tags: Vec<String>,
    pub attachments: Vec<Attachment>,
    pub checklists: Vec<ChecklistItem>,
    pub created_at: NaiveDateTime,
}

impl WritingEntry {
    pub fn new(title: String, entry_type: EntryType) -> Self {
        Self {
            id: None,
            title,
            content: String::new(),
            entry_type,
            mood: None,
            tags: Vec::new(),
            attachments: Vec::new(),
            checklists: Vec::new(),
            created_at: codec::now(),
        }
    }
}
