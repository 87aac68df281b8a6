use rusqlite::{Connection, OptionalExtension, Params};

use super::DatabaseError;
use super::entities::WritingEntryRow;

pub struct WritingEntryDao<'a> {
    conn: &'a Connection,
}

impl<'a> WritingEntryDao<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    fn list<P: Params>(&self, filter: &str, params: P) -> Result<Vec<WritingEntryRow>, DatabaseError> {
        let sql = format!(
            "SELECT {} FROM writing_entries {} ORDER BY created_at DESC, id DESC",
            WritingEntryRow::COLUMNS,
            filter
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let entries = stmt
            .query_map(params, WritingEntryRow::from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(entries)
    }

    pub fn all(&self) -> Result<Vec<WritingEntryRow>, DatabaseError> {
        self.list("", [])
    }

    pub fn by_type(&self, entry_type: &str) -> Result<Vec<WritingEntryRow>, DatabaseError> {
        self.list("WHERE entry_type = ?1", rusqlite::params![entry_type])
    }

    pub fn by_mood(&self, mood: &str) -> Result<Vec<WritingEntryRow>, DatabaseError> {
        self.list("WHERE mood = ?1", rusqlite::params![mood])
    }

    /// Substring match against the serialized tag list
    pub fn with_tag(&self, tag: &str) -> Result<Vec<WritingEntryRow>, DatabaseError> {
        self.list("WHERE instr(tags, ?1) > 0", rusqlite::params![tag])
    }

    pub fn search(&self, query: &str) -> Result<Vec<WritingEntryRow>, DatabaseError> {
        self.list(
            "WHERE instr(title, ?1) > 0 OR instr(content, ?1) > 0",
            rusqlite::params![query],
        )
    }

    pub fn get(&self, id: i64) -> Result<Option<WritingEntryRow>, DatabaseError> {
        let sql = format!("SELECT {} FROM writing_entries WHERE id = ?1", WritingEntryRow::COLUMNS);
        Ok(self
            .conn
            .query_row(&sql, rusqlite::params![id], WritingEntryRow::from_row)
            .optional()?)
    }

    pub fn insert(&self, entry: &WritingEntryRow) -> Result<i64, DatabaseError> {
        self.conn.execute(
            "INSERT INTO writing_entries (title, content, entry_type, mood, tags, attachments, checklists, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            rusqlite::params![
                entry.title,
                entry.content,
                entry.entry_type,
                entry.mood,
                entry.tags,
                entry.attachments,
                entry.checklists,
                entry.created_at
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    pub fn update(&self, id: i64, entry: &WritingEntryRow) -> Result<bool, DatabaseError> {
        let changed = self.conn.execute(
            "UPDATE writing_entries SET title = ?1, content = ?2, entry_type = ?3, mood = ?4, tags = ?5,
             attachments = ?6, checklists = ?7, created_at = ?8 WHERE id = ?9",
            rusqlite::params![
                entry.title,
                entry.content,
                entry.entry_type,
                entry.mood,
                entry.tags,
                entry.attachments,
                entry.checklists,
                entry.created_at,
                id
            ],
        )?;
        Ok(changed > 0)
    }

    pub fn delete(&self, id: i64) -> Result<bool, DatabaseError> {
        let changed = self
            .conn
            .execute("DELETE FROM writing_entries WHERE id = ?1", rusqlite::params![id])?;
        Ok(changed > 0)
    }
}
