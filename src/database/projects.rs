use rusqlite::{Connection, OptionalExtension, Params};

use super::DatabaseError;
use super::entities::{ProjectRow, ProjectTodoRow};

const PRIORITY_RANK: &str =
    "CASE priority WHEN 'URGENT' THEN 3 WHEN 'HIGH' THEN 2 WHEN 'MEDIUM' THEN 1 ELSE 0 END";

pub struct ProjectDao<'a> {
    conn: &'a Connection,
}

impl<'a> ProjectDao<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    fn list<P: Params>(&self, clause: &str, params: P) -> Result<Vec<ProjectRow>, DatabaseError> {
        let sql = format!("SELECT {} FROM projects {}", ProjectRow::COLUMNS, clause);
        let mut stmt = self.conn.prepare(&sql)?;
        let projects = stmt
            .query_map(params, ProjectRow::from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(projects)
    }

    /// Most recently modified first
    pub fn all(&self) -> Result<Vec<ProjectRow>, DatabaseError> {
        self.list("ORDER BY updated_at DESC, id DESC", [])
    }

    /// Incomplete projects, nearest target date first, undated last
    pub fn active(&self) -> Result<Vec<ProjectRow>, DatabaseError> {
        self.list(
            "WHERE is_completed = 0 ORDER BY target_date IS NULL, target_date ASC, id ASC",
            [],
        )
    }

    /// Completed projects, most recently completed first
    pub fn completed(&self) -> Result<Vec<ProjectRow>, DatabaseError> {
        self.list(
            "WHERE is_completed = 1 ORDER BY completed_date DESC, id DESC",
            [],
        )
    }

    pub fn by_category(&self, category: &str) -> Result<Vec<ProjectRow>, DatabaseError> {
        self.list(
            "WHERE category = ?1 ORDER BY updated_at DESC, id DESC",
            rusqlite::params![category],
        )
    }

    pub fn search(&self, query: &str) -> Result<Vec<ProjectRow>, DatabaseError> {
        self.list(
            "WHERE instr(title, ?1) > 0 OR instr(description, ?1) > 0 ORDER BY updated_at DESC, id DESC",
            rusqlite::params![query],
        )
    }

    pub fn get(&self, id: i64) -> Result<Option<ProjectRow>, DatabaseError> {
        let sql = format!("SELECT {} FROM projects WHERE id = ?1", ProjectRow::COLUMNS);
        Ok(self
            .conn
            .query_row(&sql, rusqlite::params![id], ProjectRow::from_row)
            .optional()?)
    }

    pub fn insert(&self, project: &ProjectRow) -> Result<i64, DatabaseError> {
        self.conn.execute(
            "INSERT INTO projects (title, description, category, progress_percentage, is_completed,
                                   start_date, target_date, completed_date, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            rusqlite::params![
                project.title,
                project.description,
                project.category,
                project.progress_percentage,
                project.is_completed,
                project.start_date,
                project.target_date,
                project.completed_date,
                project.created_at,
                project.updated_at
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    pub fn update(&self, id: i64, project: &ProjectRow) -> Result<bool, DatabaseError> {
        let changed = self.conn.execute(
            "UPDATE projects SET title = ?1, description = ?2, category = ?3, progress_percentage = ?4,
             is_completed = ?5, start_date = ?6, target_date = ?7, completed_date = ?8,
             created_at = ?9, updated_at = MAX(updated_at, ?10) WHERE id = ?11",
            rusqlite::params![
                project.title,
                project.description,
                project.category,
                project.progress_percentage,
                project.is_completed,
                project.start_date,
                project.target_date,
                project.completed_date,
                project.created_at,
                project.updated_at,
                id
            ],
        )?;
        Ok(changed > 0)
    }

    pub fn update_progress(&self, id: i64, percentage: i64, now: &str) -> Result<bool, DatabaseError> {
        let changed = self.conn.execute(
            "UPDATE projects SET progress_percentage = ?1, updated_at = MAX(updated_at, ?2) WHERE id = ?3",
            rusqlite::params![percentage, now, id],
        )?;
        Ok(changed > 0)
    }

    /// Set the completion flag; `completed_date` is stamped with `now` when
    /// completing and cleared otherwise.
    pub fn set_completed(&self, id: i64, completed: bool, now: &str) -> Result<bool, DatabaseError> {
        let completed_date = completed.then_some(now);
        let changed = self.conn.execute(
            "UPDATE projects SET is_completed = ?1, completed_date = ?2, updated_at = MAX(updated_at, ?3)
             WHERE id = ?4",
            rusqlite::params![completed, completed_date, now, id],
        )?;
        Ok(changed > 0)
    }

    /// Delete a project and its todos as one unit
    pub fn delete(&self, id: i64) -> Result<bool, DatabaseError> {
        ProjectTodoDao::new(self.conn).delete_for_project(id)?;
        let changed = self
            .conn
            .execute("DELETE FROM projects WHERE id = ?1", rusqlite::params![id])?;
        Ok(changed > 0)
    }
}

pub struct ProjectTodoDao<'a> {
    conn: &'a Connection,
}

impl<'a> ProjectTodoDao<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Todos of one project, most urgent first, then oldest first
    pub fn for_project(&self, project_id: i64) -> Result<Vec<ProjectTodoRow>, DatabaseError> {
        let sql = format!(
            "SELECT {} FROM project_todos WHERE project_id = ?1
             ORDER BY {} DESC, created_at ASC, id ASC",
            ProjectTodoRow::COLUMNS,
            PRIORITY_RANK
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let todos = stmt
            .query_map(rusqlite::params![project_id], ProjectTodoRow::from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(todos)
    }

    pub fn get(&self, id: i64) -> Result<Option<ProjectTodoRow>, DatabaseError> {
        let sql = format!("SELECT {} FROM project_todos WHERE id = ?1", ProjectTodoRow::COLUMNS);
        Ok(self
            .conn
            .query_row(&sql, rusqlite::params![id], ProjectTodoRow::from_row)
            .optional()?)
    }

    /// (total, completed) todo counts for a project
    pub fn counts(&self, project_id: i64) -> Result<(i64, i64), DatabaseError> {
        Ok(self.conn.query_row(
            "SELECT COUNT(*), IFNULL(SUM(is_completed), 0) FROM project_todos WHERE project_id = ?1",
            rusqlite::params![project_id],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )?)
    }

    /// Fails with a constraint violation if the project does not exist
    pub fn insert(&self, todo: &ProjectTodoRow) -> Result<i64, DatabaseError> {
        self.conn.execute(
            "INSERT INTO project_todos (project_id, title, description, is_completed, priority,
                                        due_date, created_at, completed_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            rusqlite::params![
                todo.project_id,
                todo.title,
                todo.description,
                todo.is_completed,
                todo.priority,
                todo.due_date,
                todo.created_at,
                todo.completed_at
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    pub fn update(&self, id: i64, todo: &ProjectTodoRow) -> Result<bool, DatabaseError> {
        let changed = self.conn.execute(
            "UPDATE project_todos SET project_id = ?1, title = ?2, description = ?3, is_completed = ?4,
             priority = ?5, due_date = ?6, created_at = ?7, completed_at = ?8 WHERE id = ?9",
            rusqlite::params![
                todo.project_id,
                todo.title,
                todo.description,
                todo.is_completed,
                todo.priority,
                todo.due_date,
                todo.created_at,
                todo.completed_at,
                id
            ],
        )?;
        Ok(changed > 0)
    }

    /// Flip completion, stamping or clearing `completed_at` in the same statement
    pub fn toggle_completed(&self, id: i64, now: &str) -> Result<bool, DatabaseError> {
        let changed = self.conn.execute(
            "UPDATE project_todos
             SET is_completed = 1 - is_completed,
                 completed_at = CASE WHEN is_completed = 0 THEN ?1 ELSE NULL END
             WHERE id = ?2",
            rusqlite::params![now, id],
        )?;
        Ok(changed > 0)
    }

    pub fn delete(&self, id: i64) -> Result<bool, DatabaseError> {
        let changed = self
            .conn
            .execute("DELETE FROM project_todos WHERE id = ?1", rusqlite::params![id])?;
        Ok(changed > 0)
    }

    pub fn delete_for_project(&self, project_id: i64) -> Result<usize, DatabaseError> {
        Ok(self.conn.execute(
            "DELETE FROM project_todos WHERE project_id = ?1",
            rusqlite::params![project_id],
        )?)
    }
}
