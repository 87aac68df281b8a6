use tracing::debug;

use super::live::{self, Subscription};
use super::{RepositoryError, RepositoryResult, decode_rows};
use crate::codec::{self, CodecError};
use crate::database::{
    Database, DatabaseError, ProjectDao, ProjectRow, ProjectTodoDao, ProjectTodoRow, Table,
};
use crate::models::{Project, ProjectCategory, ProjectTodo};

const PROJECTS: &[Table] = &[Table::Projects];
const TODOS: &[Table] = &[Table::ProjectTodos];
// A project delete removes its todos in the same commit
const PROJECTS_AND_TODOS: &[Table] = &[Table::Projects, Table::ProjectTodos];

impl TryFrom<ProjectRow> for Project {
    type Error = CodecError;

    fn try_from(row: ProjectRow) -> Result<Self, Self::Error> {
        Ok(Project {
            id: row.id,
            title: row.title,
            description: row.description,
            category: codec::require_enum(&row.category)?,
            progress_percentage: codec::decode_bounded(
                "projects.progress_percentage",
                row.progress_percentage,
                0..=100,
            )?,
            is_completed: row.is_completed,
            start_date: codec::decode_timestamp("projects.start_date", &row.start_date)?,
            target_date: codec::decode_optional_timestamp("projects.target_date", row.target_date.as_deref())?,
            completed_date: codec::decode_optional_timestamp(
                "projects.completed_date",
                row.completed_date.as_deref(),
            )?,
            created_at: codec::decode_timestamp("projects.created_at", &row.created_at)?,
            updated_at: codec::decode_timestamp("projects.updated_at", &row.updated_at)?,
        })
    }
}

impl From<&Project> for ProjectRow {
    fn from(project: &Project) -> Self {
        ProjectRow {
            id: project.id,
            title: project.title.clone(),
            description: project.description.clone(),
            category: codec::encode_enum(project.category).to_string(),
            progress_percentage: i64::from(project.progress_percentage),
            is_completed: project.is_completed,
            start_date: codec::encode_timestamp(&project.start_date),
            target_date: codec::encode_optional_timestamp(project.target_date.as_ref()),
            completed_date: codec::encode_optional_timestamp(project.completed_date.as_ref()),
            created_at: codec::encode_timestamp(&project.created_at),
            updated_at: codec::encode_timestamp(&project.updated_at),
        }
    }
}

impl TryFrom<ProjectTodoRow> for ProjectTodo {
    type Error = CodecError;

    fn try_from(row: ProjectTodoRow) -> Result<Self, Self::Error> {
        Ok(ProjectTodo {
            id: row.id,
            project_id: row.project_id,
            title: row.title,
            description: row.description,
            is_completed: row.is_completed,
            priority: codec::require_enum(&row.priority)?,
            due_date: codec::decode_optional_timestamp("project_todos.due_date", row.due_date.as_deref())?,
            created_at: codec::decode_timestamp("project_todos.created_at", &row.created_at)?,
            completed_at: codec::decode_optional_timestamp(
                "project_todos.completed_at",
                row.completed_at.as_deref(),
            )?,
        })
    }
}

impl From<&ProjectTodo> for ProjectTodoRow {
    fn from(todo: &ProjectTodo) -> Self {
        ProjectTodoRow {
            id: todo.id,
            project_id: todo.project_id,
            title: todo.title.clone(),
            description: todo.description.clone(),
            is_completed: todo.is_completed,
            priority: codec::encode_enum(todo.priority).to_string(),
            due_date: codec::encode_optional_timestamp(todo.due_date.as_ref()),
            created_at: codec::encode_timestamp(&todo.created_at),
            completed_at: codec::encode_optional_timestamp(todo.completed_at.as_ref()),
        }
    }
}

/// Projects and their todos
#[derive(Debug, Clone)]
pub struct ProjectRepository {
    db: Database,
}

impl ProjectRepository {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    fn observe<F>(&self, query: F) -> Subscription<Vec<Project>>
    where
        F: Fn(&ProjectDao<'_>) -> Result<Vec<ProjectRow>, DatabaseError> + Send + Sync + 'static,
    {
        live::subscribe(&self.db, PROJECTS, move |conn| {
            decode_rows(query(&ProjectDao::new(conn))?)
        })
    }

    pub fn observe_all(&self) -> Subscription<Vec<Project>> {
        self.observe(|dao| dao.all())
    }

    /// Incomplete projects by target date
    pub fn observe_active(&self) -> Subscription<Vec<Project>> {
        self.observe(|dao| dao.active())
    }

    /// Completed projects, latest completion first
    pub fn observe_completed(&self) -> Subscription<Vec<Project>> {
        self.observe(|dao| dao.completed())
    }

    pub fn observe_by_category(&self, category: ProjectCategory) -> Subscription<Vec<Project>> {
        self.observe(move |dao| dao.by_category(codec::encode_enum(category)))
    }

    pub fn observe_search(&self, query: &str) -> Subscription<Vec<Project>> {
        let query = query.to_string();
        self.observe(move |dao| dao.search(&query))
    }

    pub async fn get(&self, id: i64) -> RepositoryResult<Option<Project>> {
        self.db
            .read(move |conn| -> RepositoryResult<Option<Project>> {
                Ok(ProjectDao::new(conn).get(id)?.map(Project::try_from).transpose()?)
            })
            .await
    }

    pub async fn insert(&self, project: &Project) -> RepositoryResult<i64> {
        let row = ProjectRow::from(project);
        let id = self
            .db
            .write(PROJECTS, move |conn| ProjectDao::new(conn).insert(&row))
            .await?;
        debug!(id, "inserted project");
        Ok(id)
    }

    pub async fn update(&self, project: &Project) -> RepositoryResult<bool> {
        let id = project
            .id
            .ok_or_else(|| RepositoryError::not_persisted("project id"))?;
        let mut row = ProjectRow::from(project);
        row.updated_at = codec::encode_timestamp(&codec::now());
        Ok(self
            .db
            .write(PROJECTS, move |conn| ProjectDao::new(conn).update(id, &row))
            .await?)
    }

    /// Delete a project together with all of its todos
    pub async fn delete(&self, id: i64) -> RepositoryResult<bool> {
        let deleted = self
            .db
            .write(PROJECTS_AND_TODOS, move |conn| ProjectDao::new(conn).delete(id))
            .await?;
        debug!(id, deleted, "deleted project");
        Ok(deleted)
    }

    pub async fn update_progress(&self, id: i64, percentage: u8) -> RepositoryResult<bool> {
        if percentage > 100 {
            return Err(RepositoryError::InvalidValue {
                field: "progress percentage",
                message: format!("{percentage} is outside 0..=100"),
            });
        }
        let now = codec::encode_timestamp(&codec::now());
        Ok(self
            .db
            .write(PROJECTS, move |conn| {
                ProjectDao::new(conn).update_progress(id, i64::from(percentage), &now)
            })
            .await?)
    }

    /// Flip completion. Completing stamps `completed_date`, reopening clears it.
    /// Returns `false` if no such project exists.
    pub async fn toggle_completion(&self, id: i64) -> RepositoryResult<bool> {
        let now = codec::encode_timestamp(&codec::now());
        Ok(self
            .db
            .write(PROJECTS, move |conn| -> Result<bool, DatabaseError> {
                let dao = ProjectDao::new(conn);
                match dao.get(id)? {
                    Some(project) => dao.set_completed(id, !project.is_completed, &now),
                    None => Ok(false),
                }
            })
            .await?)
    }

    pub fn observe_todos(&self, project_id: i64) -> Subscription<Vec<ProjectTodo>> {
        live::subscribe(&self.db, TODOS, move |conn| {
            decode_rows(ProjectTodoDao::new(conn).for_project(project_id)?)
        })
    }

    pub async fn get_todo(&self, id: i64) -> RepositoryResult<Option<ProjectTodo>> {
        self.db
            .read(move |conn| -> RepositoryResult<Option<ProjectTodo>> {
                Ok(ProjectTodoDao::new(conn)
                    .get(id)?
                    .map(ProjectTodo::try_from)
                    .transpose()?)
            })
            .await
    }

    /// (total, completed) todo counts
    pub async fn todo_counts(&self, project_id: i64) -> RepositoryResult<(i64, i64)> {
        Ok(self
            .db
            .read(move |conn| ProjectTodoDao::new(conn).counts(project_id))
            .await?)
    }

    /// Insert a todo. A missing parent project is a constraint violation.
    pub async fn insert_todo(&self, todo: &ProjectTodo) -> RepositoryResult<i64> {
        let row = ProjectTodoRow::from(todo);
        let id = self
            .db
            .write(TODOS, move |conn| ProjectTodoDao::new(conn).insert(&row))
            .await?;
        debug!(id, project_id = todo.project_id, "inserted project todo");
        Ok(id)
    }

    pub async fn update_todo(&self, todo: &ProjectTodo) -> RepositoryResult<bool> {
        let id = todo.id.ok_or_else(|| RepositoryError::not_persisted("todo id"))?;
        let row = ProjectTodoRow::from(todo);
        Ok(self
            .db
            .write(TODOS, move |conn| ProjectTodoDao::new(conn).update(id, &row))
            .await?)
    }

    pub async fn delete_todo(&self, id: i64) -> RepositoryResult<bool> {
        Ok(self
            .db
            .write(TODOS, move |conn| ProjectTodoDao::new(conn).delete(id))
            .await?)
    }

    pub async fn delete_todos_for_project(&self, project_id: i64) -> RepositoryResult<usize> {
        Ok(self
            .db
            .write(TODOS, move |conn| ProjectTodoDao::new(conn).delete_for_project(project_id))
            .await?)
    }

    /// Flip a todo's completion, stamping or clearing `completed_at`
    pub async fn toggle_todo(&self, id: i64) -> RepositoryResult<bool> {
        let now = codec::encode_timestamp(&codec::now());
        Ok(self
            .db
            .write(TODOS, move |conn| ProjectTodoDao::new(conn).toggle_completed(id, &now))
            .await?)
    }
}
