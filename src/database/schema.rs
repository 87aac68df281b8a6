//! Canonical table definitions and the additive migration chain.
//!
//! The schema version lives in `PRAGMA user_version`. Each migration runs in
//! its own transaction together with the version bump, so a failed step leaves
//! the file at the previous version. Migrations only ever add tables, columns
//! and indexes.

use rusqlite::Connection;
use tracing::{debug, info};

use super::DatabaseError;

/// Schema version this build reads and writes
pub const SCHEMA_VERSION: u32 = 3;

struct Migration {
    version: u32,
    description: &'static str,
    apply: fn(&Connection) -> Result<(), DatabaseError>,
}

const MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        description: "core tables",
        apply: create_core_tables,
    },
    Migration {
        version: 2,
        description: "writing entries",
        apply: create_writing_entries,
    },
    Migration {
        version: 3,
        description: "task subtasks column",
        apply: add_task_subtasks,
    },
];

/// Per-connection settings. Must run outside any transaction.
pub fn configure(conn: &Connection) -> Result<(), DatabaseError> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    // In-memory databases report "memory" and keep it
    let mode: String = conn.query_row("PRAGMA journal_mode = WAL", [], |row| row.get(0))?;
    debug!(journal_mode = %mode, "configured connection");
    Ok(())
}

pub fn user_version(conn: &Connection) -> Result<u32, DatabaseError> {
    let version: i64 = conn.query_row("PRAGMA user_version", [], |row| row.get(0))?;
    Ok(version as u32)
}

/// Bring the schema up to [`SCHEMA_VERSION`], returning the version found on disk
pub fn migrate(conn: &mut Connection) -> Result<u32, DatabaseError> {
    let found = user_version(conn)?;
    if found > SCHEMA_VERSION {
        return Err(DatabaseError::SchemaTooNew {
            found,
            supported: SCHEMA_VERSION,
        });
    }

    for migration in MIGRATIONS.iter().filter(|m| m.version > found) {
        let tx = conn.transaction()?;
        (migration.apply)(&tx)?;
        tx.execute_batch(&format!("PRAGMA user_version = {}", migration.version))?;
        tx.commit()?;
        info!(
            version = migration.version,
            "applied migration: {}", migration.description
        );
    }

    Ok(found)
}

fn column_exists(conn: &Connection, table: &str, column: &str) -> Result<bool, DatabaseError> {
    let mut stmt = conn.prepare("SELECT COUNT(*) FROM pragma_table_info(?1) WHERE name = ?2")?;
    let count: i64 = stmt.query_row(rusqlite::params![table, column], |row| row.get(0))?;
    Ok(count > 0)
}

fn create_core_tables(conn: &Connection) -> Result<(), DatabaseError> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS tasks (
            id              INTEGER PRIMARY KEY AUTOINCREMENT,
            title           TEXT NOT NULL,
            description     TEXT,
            category        TEXT NOT NULL,
            priority        TEXT NOT NULL,
            is_completed    INTEGER NOT NULL DEFAULT 0,
            due_date        TEXT,
            created_at      TEXT NOT NULL,
            updated_at      TEXT NOT NULL,
            CHECK (created_at <= updated_at)
        );

        CREATE TABLE IF NOT EXISTS task_categories (
            id              INTEGER PRIMARY KEY AUTOINCREMENT,
            name            TEXT NOT NULL,
            color           TEXT NOT NULL,
            is_default      INTEGER NOT NULL DEFAULT 0
        );

        CREATE TABLE IF NOT EXISTS projects (
            id                  INTEGER PRIMARY KEY AUTOINCREMENT,
            title               TEXT NOT NULL,
            description         TEXT NOT NULL DEFAULT '',
            category            TEXT NOT NULL,
            progress_percentage INTEGER NOT NULL DEFAULT 0
                                CHECK (progress_percentage BETWEEN 0 AND 100),
            is_completed        INTEGER NOT NULL DEFAULT 0,
            start_date          TEXT NOT NULL,
            target_date         TEXT,
            completed_date      TEXT,
            created_at          TEXT NOT NULL,
            updated_at          TEXT NOT NULL,
            CHECK ((is_completed = 0) = (completed_date IS NULL))
        );

        CREATE TABLE IF NOT EXISTS project_todos (
            id              INTEGER PRIMARY KEY AUTOINCREMENT,
            project_id      INTEGER NOT NULL REFERENCES projects(id) ON DELETE CASCADE,
            title           TEXT NOT NULL,
            description     TEXT,
            is_completed    INTEGER NOT NULL DEFAULT 0,
            priority        TEXT NOT NULL,
            due_date        TEXT,
            created_at      TEXT NOT NULL,
            completed_at    TEXT,
            CHECK ((is_completed = 0) = (completed_at IS NULL))
        );

        CREATE TABLE IF NOT EXISTS books (
            id              INTEGER PRIMARY KEY AUTOINCREMENT,
            title           TEXT NOT NULL,
            author          TEXT NOT NULL,
            status          TEXT NOT NULL,
            genre           TEXT,
            total_pages     INTEGER,
            pages_read      INTEGER NOT NULL DEFAULT 0 CHECK (pages_read >= 0),
            rating          INTEGER CHECK (rating IS NULL OR rating BETWEEN 1 AND 5),
            notes           TEXT,
            started_date    TEXT,
            completed_date  TEXT,
            created_at      TEXT NOT NULL,
            updated_at      TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS journal_entries (
            id              INTEGER PRIMARY KEY AUTOINCREMENT,
            title           TEXT,
            content         TEXT NOT NULL,
            mood            TEXT,
            tags            TEXT NOT NULL DEFAULT '',
            date            TEXT NOT NULL,
            created_at      TEXT NOT NULL,
            updated_at      TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_tasks_due_date ON tasks(due_date);
        CREATE INDEX IF NOT EXISTS idx_tasks_category ON tasks(category);
        CREATE INDEX IF NOT EXISTS idx_tasks_is_completed ON tasks(is_completed);
        CREATE INDEX IF NOT EXISTS idx_task_categories_name ON task_categories(name);
        CREATE INDEX IF NOT EXISTS idx_projects_target_date ON projects(target_date);
        CREATE INDEX IF NOT EXISTS idx_project_todos_project_id ON project_todos(project_id);
        CREATE INDEX IF NOT EXISTS idx_books_status ON books(status);
        CREATE INDEX IF NOT EXISTS idx_books_updated_at ON books(updated_at);
        CREATE INDEX IF NOT EXISTS idx_journal_entries_date ON journal_entries(date);",
    )?;
    Ok(())
}

fn create_writing_entries(conn: &Connection) -> Result<(), DatabaseError> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS writing_entries (
            id              INTEGER PRIMARY KEY AUTOINCREMENT,
            title           TEXT NOT NULL,
            content         TEXT NOT NULL,
            entry_type      TEXT NOT NULL,
            mood            TEXT,
            tags            TEXT NOT NULL DEFAULT '[]',
            attachments     TEXT NOT NULL DEFAULT '[]',
            checklists      TEXT NOT NULL DEFAULT '[]',
            created_at      TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_writing_entries_created_at ON writing_entries(created_at);
        CREATE INDEX IF NOT EXISTS idx_writing_entries_entry_type ON writing_entries(entry_type);",
    )?;
    Ok(())
}

fn add_task_subtasks(conn: &Connection) -> Result<(), DatabaseError> {
    if !column_exists(conn, "tasks", "subtasks")? {
        conn.execute(
            "ALTER TABLE tasks ADD COLUMN subtasks TEXT NOT NULL DEFAULT '[]'",
            [],
        )?;
    }
    Ok(())
}
