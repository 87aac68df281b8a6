use rusqlite::{Connection, OptionalExtension, Params};

use super::DatabaseError;
use super::entities::JournalEntryRow;

const JOURNAL_ORDER: &str = "ORDER BY date DESC, created_at DESC, id DESC";

pub struct JournalEntryDao<'a> {
    conn: &'a Connection,
}

impl<'a> JournalEntryDao<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    fn list<P: Params>(&self, filter: &str, params: P) -> Result<Vec<JournalEntryRow>, DatabaseError> {
        let sql = format!(
            "SELECT {} FROM journal_entries {} {}",
            JournalEntryRow::COLUMNS,
            filter,
            JOURNAL_ORDER
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let entries = stmt
            .query_map(params, JournalEntryRow::from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(entries)
    }

    /// Get all journal entries, newest first
    pub fn all(&self) -> Result<Vec<JournalEntryRow>, DatabaseError> {
        self.list("", [])
    }

    pub fn by_mood(&self, mood: &str) -> Result<Vec<JournalEntryRow>, DatabaseError> {
        self.list("WHERE mood = ?1", rusqlite::params![mood])
    }

    /// Entries whose delimited tag text contains `tag`
    pub fn with_tag(&self, tag: &str) -> Result<Vec<JournalEntryRow>, DatabaseError> {
        self.list("WHERE instr(tags, ?1) > 0", rusqlite::params![tag])
    }

    pub fn search(&self, query: &str) -> Result<Vec<JournalEntryRow>, DatabaseError> {
        self.list(
            "WHERE instr(IFNULL(title, ''), ?1) > 0 OR instr(content, ?1) > 0",
            rusqlite::params![query],
        )
    }

    /// Entries dated within `[from, to]`
    pub fn between(&self, from: &str, to: &str) -> Result<Vec<JournalEntryRow>, DatabaseError> {
        self.list("WHERE date >= ?1 AND date <= ?2", rusqlite::params![from, to])
    }

    /// Get a single journal entry by ID
    pub fn get(&self, id: i64) -> Result<Option<JournalEntryRow>, DatabaseError> {
        let sql = format!("SELECT {} FROM journal_entries WHERE id = ?1", JournalEntryRow::COLUMNS);
        Ok(self
            .conn
            .query_row(&sql, rusqlite::params![id], JournalEntryRow::from_row)
            .optional()?)
    }

    /// Insert a journal entry and return its ID
    pub fn insert(&self, entry: &JournalEntryRow) -> Result<i64, DatabaseError> {
        self.conn.execute(
            "INSERT INTO journal_entries (title, content, mood, tags, date, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            rusqlite::params![
                entry.title,
                entry.content,
                entry.mood,
                entry.tags,
                entry.date,
                entry.created_at,
                entry.updated_at
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Update an existing journal entry
    pub fn update(&self, id: i64, entry: &JournalEntryRow) -> Result<bool, DatabaseError> {
        let changed = self.conn.execute(
            "UPDATE journal_entries SET title = ?1, content = ?2, mood = ?3, tags = ?4, date = ?5,
             created_at = ?6, updated_at = MAX(updated_at, ?7) WHERE id = ?8",
            rusqlite::params![
                entry.title,
                entry.content,
                entry.mood,
                entry.tags,
                entry.date,
                entry.created_at,
                entry.updated_at,
                id
            ],
        )?;
        Ok(changed > 0)
    }

    /// Delete a journal entry by ID
    pub fn delete(&self, id: i64) -> Result<bool, DatabaseError> {
        let changed = self
            .conn
            .execute("DELETE FROM journal_entries WHERE id = ?1", rusqlite::params![id])?;
        Ok(changed > 0)
    }
}
