use rusqlite::{Connection, OptionalExtension, Params};

use super::DatabaseError;
use super::entities::{TaskCategoryRow, TaskRow};

/// Due date ascending with undated tasks last, then most urgent first.
/// The id keeps ties stable.
const TASK_ORDER: &str = "ORDER BY due_date IS NULL, due_date ASC, \
     CASE priority WHEN 'URGENT' THEN 3 WHEN 'HIGH' THEN 2 WHEN 'MEDIUM' THEN 1 ELSE 0 END DESC, \
     id ASC";

pub struct TaskDao<'a> {
    conn: &'a Connection,
}

impl<'a> TaskDao<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    fn list<P: Params>(&self, filter: &str, params: P) -> Result<Vec<TaskRow>, DatabaseError> {
        let sql = format!("SELECT {} FROM tasks {} {}", TaskRow::COLUMNS, filter, TASK_ORDER);
        let mut stmt = self.conn.prepare(&sql)?;
        let tasks = stmt
            .query_map(params, TaskRow::from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(tasks)
    }

    /// Get all tasks
    pub fn all(&self) -> Result<Vec<TaskRow>, DatabaseError> {
        self.list("", [])
    }

    /// Get incomplete (`false`) or completed (`true`) tasks
    pub fn by_completion(&self, completed: bool) -> Result<Vec<TaskRow>, DatabaseError> {
        self.list("WHERE is_completed = ?1", rusqlite::params![completed])
    }

    pub fn by_category(&self, category: &str) -> Result<Vec<TaskRow>, DatabaseError> {
        self.list("WHERE category = ?1", rusqlite::params![category])
    }

    /// Case-sensitive substring match over title and description
    pub fn search(&self, query: &str) -> Result<Vec<TaskRow>, DatabaseError> {
        self.list(
            "WHERE instr(title, ?1) > 0 OR instr(IFNULL(description, ''), ?1) > 0",
            rusqlite::params![query],
        )
    }

    /// Get a single task by ID
    pub fn get(&self, id: i64) -> Result<Option<TaskRow>, DatabaseError> {
        let sql = format!("SELECT {} FROM tasks WHERE id = ?1", TaskRow::COLUMNS);
        let task = self
            .conn
            .query_row(&sql, rusqlite::params![id], TaskRow::from_row)
            .optional()?;
        Ok(task)
    }

    /// Insert a task and return its ID
    pub fn insert(&self, task: &TaskRow) -> Result<i64, DatabaseError> {
        self.conn.execute(
            "INSERT INTO tasks (title, description, category, priority, is_completed, due_date, subtasks, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            rusqlite::params![
                task.title,
                task.description,
                task.category,
                task.priority,
                task.is_completed,
                task.due_date,
                task.subtasks,
                task.created_at,
                task.updated_at
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Replace every column of an existing task. `updated_at` never moves backwards.
    pub fn update(&self, id: i64, task: &TaskRow) -> Result<bool, DatabaseError> {
        let changed = self.conn.execute(
            "UPDATE tasks SET title = ?1, description = ?2, category = ?3, priority = ?4,
             is_completed = ?5, due_date = ?6, subtasks = ?7, created_at = ?8,
             updated_at = MAX(updated_at, ?9) WHERE id = ?10",
            rusqlite::params![
                task.title,
                task.description,
                task.category,
                task.priority,
                task.is_completed,
                task.due_date,
                task.subtasks,
                task.created_at,
                task.updated_at,
                id
            ],
        )?;
        Ok(changed > 0)
    }

    pub fn set_completed(&self, id: i64, completed: bool, now: &str) -> Result<bool, DatabaseError> {
        let changed = self.conn.execute(
            "UPDATE tasks SET is_completed = ?1, updated_at = MAX(updated_at, ?2) WHERE id = ?3",
            rusqlite::params![completed, now, id],
        )?;
        Ok(changed > 0)
    }

    /// Flip the completion flag in a single statement
    pub fn toggle_completed(&self, id: i64, now: &str) -> Result<bool, DatabaseError> {
        let changed = self.conn.execute(
            "UPDATE tasks SET is_completed = 1 - is_completed, updated_at = MAX(updated_at, ?1) WHERE id = ?2",
            rusqlite::params![now, id],
        )?;
        Ok(changed > 0)
    }

    /// Delete a task by ID
    pub fn delete(&self, id: i64) -> Result<bool, DatabaseError> {
        let changed = self
            .conn
            .execute("DELETE FROM tasks WHERE id = ?1", rusqlite::params![id])?;
        Ok(changed > 0)
    }

    pub fn delete_completed(&self) -> Result<usize, DatabaseError> {
        Ok(self.conn.execute("DELETE FROM tasks WHERE is_completed = 1", [])?)
    }

    pub fn count(&self) -> Result<i64, DatabaseError> {
        Ok(self.conn.query_row("SELECT COUNT(*) FROM tasks", [], |row| row.get(0))?)
    }
}

pub struct TaskCategoryDao<'a> {
    conn: &'a Connection,
}

impl<'a> TaskCategoryDao<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Defaults first, then by name
    pub fn all(&self) -> Result<Vec<TaskCategoryRow>, DatabaseError> {
        let sql = format!(
            "SELECT {} FROM task_categories ORDER BY is_default DESC, name ASC, id ASC",
            TaskCategoryRow::COLUMNS
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let categories = stmt
            .query_map([], TaskCategoryRow::from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(categories)
    }

    pub fn get(&self, id: i64) -> Result<Option<TaskCategoryRow>, DatabaseError> {
        let sql = format!("SELECT {} FROM task_categories WHERE id = ?1", TaskCategoryRow::COLUMNS);
        Ok(self
            .conn
            .query_row(&sql, rusqlite::params![id], TaskCategoryRow::from_row)
            .optional()?)
    }

    /// First category with this exact name
    pub fn get_by_name(&self, name: &str) -> Result<Option<TaskCategoryRow>, DatabaseError> {
        let sql = format!(
            "SELECT {} FROM task_categories WHERE name = ?1 ORDER BY id ASC LIMIT 1",
            TaskCategoryRow::COLUMNS
        );
        Ok(self
            .conn
            .query_row(&sql, rusqlite::params![name], TaskCategoryRow::from_row)
            .optional()?)
    }

    pub fn count_defaults(&self) -> Result<i64, DatabaseError> {
        Ok(self.conn.query_row(
            "SELECT COUNT(*) FROM task_categories WHERE is_default = 1",
            [],
            |row| row.get(0),
        )?)
    }

    pub fn insert(&self, category: &TaskCategoryRow) -> Result<i64, DatabaseError> {
        self.conn.execute(
            "INSERT INTO task_categories (name, color, is_default) VALUES (?1, ?2, ?3)",
            rusqlite::params![category.name, category.color, category.is_default],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    pub fn update(&self, id: i64, category: &TaskCategoryRow) -> Result<bool, DatabaseError> {
        let changed = self.conn.execute(
            "UPDATE task_categories SET name = ?1, color = ?2, is_default = ?3 WHERE id = ?4",
            rusqlite::params![category.name, category.color, category.is_default, id],
        )?;
        Ok(changed > 0)
    }

    pub fn delete(&self, id: i64) -> Result<bool, DatabaseError> {
        let changed = self
            .conn
            .execute("DELETE FROM task_categories WHERE id = ?1", rusqlite::params![id])?;
        Ok(changed > 0)
    }

    /// Remove every non-default category. Defaults are never touched.
    pub fn delete_custom(&self) -> Result<usize, DatabaseError> {
        Ok(self
            .conn
            .execute("DELETE FROM task_categories WHERE is_default = 0", [])?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::test_connection;

    fn task(title: &str, priority: &str, due: Option<&str>) -> TaskRow {
        TaskRow {
            id: None,
            title: title.to_string(),
            description: None,
            category: "Work".to_string(),
            priority: priority.to_string(),
            is_completed: false,
            due_date: due.map(String::from),
            subtasks: "[]".to_string(),
            created_at: "2024-01-01T00:00:00".to_string(),
            updated_at: "2024-01-01T00:00:00".to_string(),
        }
    }

    fn titles(rows: &[TaskRow]) -> Vec<&str> {
        rows.iter().map(|r| r.title.as_str()).collect()
    }

    #[test]
    fn incomplete_tasks_order_by_due_date_then_priority() {
        let conn = test_connection();
        let dao = TaskDao::new(&conn);
        // Inserted out of order on purpose
        dao.insert(&task("undated urgent", "URGENT", None)).unwrap();
        dao.insert(&task("jan2 urgent", "URGENT", Some("2024-01-02T00:00:00"))).unwrap();
        dao.insert(&task("jan1 low", "LOW", Some("2024-01-01T00:00:00"))).unwrap();
        dao.insert(&task("jan1 high", "HIGH", Some("2024-01-01T00:00:00"))).unwrap();

        let rows = dao.by_completion(false).unwrap();
        assert_eq!(
            titles(&rows),
            vec!["jan1 high", "jan1 low", "jan2 urgent", "undated urgent"]
        );
    }

    #[test]
    fn completion_filters_and_toggle() {
        let conn = test_connection();
        let dao = TaskDao::new(&conn);
        let id = dao.insert(&task("a", "LOW", None)).unwrap();
        dao.insert(&task("b", "LOW", None)).unwrap();

        assert!(dao.toggle_completed(id, "2024-02-01T00:00:00").unwrap());
        assert_eq!(titles(&dao.by_completion(true).unwrap()), vec!["a"]);
        assert_eq!(titles(&dao.by_completion(false).unwrap()), vec!["b"]);
        assert_eq!(dao.get(id).unwrap().unwrap().updated_at, "2024-02-01T00:00:00");

        // An older clock value never rewinds updated_at
        assert!(dao.set_completed(id, false, "2023-01-01T00:00:00").unwrap());
        let row = dao.get(id).unwrap().unwrap();
        assert!(!row.is_completed);
        assert_eq!(row.updated_at, "2024-02-01T00:00:00");

        assert!(!dao.toggle_completed(999, "2024-02-01T00:00:00").unwrap());
    }

    #[test]
    fn search_is_case_sensitive() {
        let conn = test_connection();
        let dao = TaskDao::new(&conn);
        let mut with_description = task("Groceries", "LOW", None);
        with_description.description = Some("buy Milk".to_string());
        dao.insert(&with_description).unwrap();
        dao.insert(&task("milk the cow", "LOW", None)).unwrap();

        assert_eq!(titles(&dao.search("Milk").unwrap()), vec!["Groceries"]);
        assert_eq!(titles(&dao.search("milk").unwrap()), vec!["milk the cow"]);
        assert!(dao.search("MILK").unwrap().is_empty());
    }

    #[test]
    fn missing_task_is_absent() {
        let conn = test_connection();
        assert!(TaskDao::new(&conn).get(42).unwrap().is_none());
    }

    #[test]
    fn updated_before_created_is_rejected() {
        let conn = test_connection();
        let mut row = task("time travel", "LOW", None);
        row.updated_at = "2023-01-01T00:00:00".to_string();
        let err = TaskDao::new(&conn).insert(&row).unwrap_err();
        assert!(matches!(err, DatabaseError::ConstraintViolation(_)));
    }

    #[test]
    fn deleting_custom_categories_keeps_defaults() {
        let conn = test_connection();
        let dao = TaskCategoryDao::new(&conn);
        let default = TaskCategoryRow {
            id: None,
            name: "Work".into(),
            color: "#2196F3".into(),
            is_default: true,
        };
        let custom = TaskCategoryRow {
            id: None,
            name: "Garden".into(),
            color: "#4CAF50".into(),
            is_default: false,
        };
        dao.insert(&custom).unwrap();
        dao.insert(&default).unwrap();

        let names: Vec<_> = dao.all().unwrap().into_iter().map(|c| c.name).collect();
        assert_eq!(names, vec!["Work", "Garden"]);

        assert_eq!(dao.delete_custom().unwrap(), 1);
        assert_eq!(dao.count_defaults().unwrap(), 1);
        assert_eq!(dao.get_by_name("Work").unwrap().unwrap().color, "#2196F3");
        assert!(dao.get_by_name("Garden").unwrap().is_none());
    }
}
