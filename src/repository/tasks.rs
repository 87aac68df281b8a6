use tracing::debug;

use super::live::{self, Subscription};
use super::{RepositoryError, RepositoryResult, decode_rows};
use crate::codec::{self, CodecError};
use crate::database::{Database, DatabaseError, Table, TaskCategoryDao, TaskCategoryRow, TaskDao, TaskRow};
use crate::models::{Task, TaskCategory};

const TASKS: &[Table] = &[Table::Tasks];
const CATEGORIES: &[Table] = &[Table::TaskCategories];

impl TryFrom<TaskRow> for Task {
    type Error = CodecError;

    fn try_from(row: TaskRow) -> Result<Self, Self::Error> {
        Ok(Task {
            id: row.id,
            title: row.title,
            description: row.description,
            category: row.category,
            priority: codec::require_enum(&row.priority)?,
            is_completed: row.is_completed,
            due_date: codec::decode_optional_timestamp("tasks.due_date", row.due_date.as_deref())?,
            subtasks: codec::decode_list("tasks.subtasks", &row.subtasks)?,
            created_at: codec::decode_timestamp("tasks.created_at", &row.created_at)?,
            updated_at: codec::decode_timestamp("tasks.updated_at", &row.updated_at)?,
        })
    }
}

fn task_row(task: &Task) -> Result<TaskRow, CodecError> {
    Ok(TaskRow {
        id: task.id,
        title: task.title.clone(),
        description: task.description.clone(),
        category: task.category.clone(),
        priority: codec::encode_enum(task.priority).to_string(),
        is_completed: task.is_completed,
        due_date: codec::encode_optional_timestamp(task.due_date.as_ref()),
        subtasks: codec::encode_list("tasks.subtasks", &task.subtasks)?,
        created_at: codec::encode_timestamp(&task.created_at),
        updated_at: codec::encode_timestamp(&task.updated_at),
    })
}

/// Tasks, ordered by due date (undated last) and then by priority
#[derive(Debug, Clone)]
pub struct TaskRepository {
    db: Database,
}

impl TaskRepository {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    fn observe<F>(&self, query: F) -> Subscription<Vec<Task>>
    where
        F: Fn(&TaskDao<'_>) -> Result<Vec<TaskRow>, DatabaseError> + Send + Sync + 'static,
    {
        live::subscribe(&self.db, TASKS, move |conn| {
            decode_rows(query(&TaskDao::new(conn))?)
        })
    }

    pub fn observe_all(&self) -> Subscription<Vec<Task>> {
        self.observe(|dao| dao.all())
    }

    pub fn observe_incomplete(&self) -> Subscription<Vec<Task>> {
        self.observe(|dao| dao.by_completion(false))
    }

    pub fn observe_completed(&self) -> Subscription<Vec<Task>> {
        self.observe(|dao| dao.by_completion(true))
    }

    pub fn observe_by_category(&self, category: &str) -> Subscription<Vec<Task>> {
        let category = category.to_string();
        self.observe(move |dao| dao.by_category(&category))
    }

    pub fn observe_search(&self, query: &str) -> Subscription<Vec<Task>> {
        let query = query.to_string();
        self.observe(move |dao| dao.search(&query))
    }

    pub async fn get(&self, id: i64) -> RepositoryResult<Option<Task>> {
        self.db
            .read(move |conn| -> RepositoryResult<Option<Task>> {
                Ok(TaskDao::new(conn).get(id)?.map(Task::try_from).transpose()?)
            })
            .await
    }

    /// Insert a task and return its new id
    pub async fn insert(&self, task: &Task) -> RepositoryResult<i64> {
        let row = task_row(task)?;
        let id = self
            .db
            .write(TASKS, move |conn| TaskDao::new(conn).insert(&row))
            .await?;
        debug!(id, "inserted task");
        Ok(id)
    }

    /// Replace a stored task. The modification time is stamped here.
    pub async fn update(&self, task: &Task) -> RepositoryResult<bool> {
        let id = task.id.ok_or_else(|| RepositoryError::not_persisted("task id"))?;
        let mut row = task_row(task)?;
        row.updated_at = codec::encode_timestamp(&codec::now());
        let updated = self
            .db
            .write(TASKS, move |conn| TaskDao::new(conn).update(id, &row))
            .await?;
        debug!(id, updated, "updated task");
        Ok(updated)
    }

    pub async fn delete(&self, id: i64) -> RepositoryResult<bool> {
        let deleted = self
            .db
            .write(TASKS, move |conn| TaskDao::new(conn).delete(id))
            .await?;
        debug!(id, deleted, "deleted task");
        Ok(deleted)
    }

    /// Flip completion and stamp the modification time in one statement.
    /// Returns `false` if no such task exists.
    pub async fn toggle_completion(&self, id: i64) -> RepositoryResult<bool> {
        let now = codec::encode_timestamp(&codec::now());
        Ok(self
            .db
            .write(TASKS, move |conn| TaskDao::new(conn).toggle_completed(id, &now))
            .await?)
    }

    pub async fn set_completed(&self, id: i64, completed: bool) -> RepositoryResult<bool> {
        let now = codec::encode_timestamp(&codec::now());
        Ok(self
            .db
            .write(TASKS, move |conn| TaskDao::new(conn).set_completed(id, completed, &now))
            .await?)
    }

    pub async fn count(&self) -> RepositoryResult<i64> {
        Ok(self.db.read(|conn| TaskDao::new(conn).count()).await?)
    }

    /// Remove every completed task, returning how many were removed
    pub async fn delete_completed(&self) -> RepositoryResult<usize> {
        let removed = self
            .db
            .write(TASKS, |conn| TaskDao::new(conn).delete_completed())
            .await?;
        debug!(removed, "cleared completed tasks");
        Ok(removed)
    }
}

impl From<TaskCategoryRow> for TaskCategory {
    fn from(row: TaskCategoryRow) -> Self {
        TaskCategory {
            id: row.id,
            name: row.name,
            color: row.color,
            is_default: row.is_default,
        }
    }
}

impl From<&TaskCategory> for TaskCategoryRow {
    fn from(category: &TaskCategory) -> Self {
        TaskCategoryRow {
            id: category.id,
            name: category.name.clone(),
            color: category.color.clone(),
            is_default: category.is_default,
        }
    }
}

/// Task categories. Tasks refer to them by name.
#[derive(Debug, Clone)]
pub struct TaskCategoryRepository {
    db: Database,
}

impl TaskCategoryRepository {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Defaults first, then alphabetical
    pub fn observe_all(&self) -> Subscription<Vec<TaskCategory>> {
        live::subscribe(&self.db, CATEGORIES, |conn| {
            let rows = TaskCategoryDao::new(conn).all()?;
            Ok(rows.into_iter().map(TaskCategory::from).collect())
        })
    }

    pub async fn get(&self, id: i64) -> RepositoryResult<Option<TaskCategory>> {
        let row = self
            .db
            .read(move |conn| TaskCategoryDao::new(conn).get(id))
            .await?;
        Ok(row.map(TaskCategory::from))
    }

    pub async fn get_by_name(&self, name: &str) -> RepositoryResult<Option<TaskCategory>> {
        let name = name.to_string();
        let row = self
            .db
            .read(move |conn| TaskCategoryDao::new(conn).get_by_name(&name))
            .await?;
        Ok(row.map(TaskCategory::from))
    }

    pub async fn has_defaults(&self) -> RepositoryResult<bool> {
        let count = self
            .db
            .read(|conn| TaskCategoryDao::new(conn).count_defaults())
            .await?;
        Ok(count > 0)
    }

    pub async fn insert(&self, category: &TaskCategory) -> RepositoryResult<i64> {
        let row = TaskCategoryRow::from(category);
        let id = self
            .db
            .write(CATEGORIES, move |conn| TaskCategoryDao::new(conn).insert(&row))
            .await?;
        debug!(id, "inserted task category");
        Ok(id)
    }

    pub async fn update(&self, category: &TaskCategory) -> RepositoryResult<bool> {
        let id = category
            .id
            .ok_or_else(|| RepositoryError::not_persisted("category id"))?;
        let row = TaskCategoryRow::from(category);
        Ok(self
            .db
            .write(CATEGORIES, move |conn| TaskCategoryDao::new(conn).update(id, &row))
            .await?)
    }

    pub async fn delete(&self, id: i64) -> RepositoryResult<bool> {
        Ok(self
            .db
            .write(CATEGORIES, move |conn| TaskCategoryDao::new(conn).delete(id))
            .await?)
    }

    /// Remove user-created categories; defaults always remain
    pub async fn delete_custom(&self) -> RepositoryResult<usize> {
        Ok(self
            .db
            .write(CATEGORIES, |conn| TaskCategoryDao::new(conn).delete_custom())
            .await?)
    }
}
