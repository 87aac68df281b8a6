use tracing::debug;

use super::live::{self, Subscription};
use super::{RepositoryError, RepositoryResult, decode_rows};
use crate::codec::{self, CodecError};
use crate::database::{Database, DatabaseError, Table, WritingEntryDao, WritingEntryRow};
use crate::models::{EntryType, Mood, WritingEntry};

const WRITING: &[Table] = &[Table::WritingEntries];

impl TryFrom<WritingEntryRow> for WritingEntry {
    type Error = CodecError;

    fn try_from(row: WritingEntryRow) -> Result<Self, Self::Error> {
        Ok(WritingEntry {
            id: row.id,
            title: row.title,
            content: row.content,
            entry_type: codec::require_enum(&row.entry_type)?,
            mood: codec::require_optional_enum(row.mood.as_deref())?,
            tags: codec::decode_list("writing_entries.tags", &row.tags)?,
            attachments: codec::decode_list("writing_entries.attachments", &row.attachments)?,
            checklists: codec::decode_list("writing_entries.checklists", &row.checklists)?,
            created_at: codec::decode_timestamp("writing_entries.created_at", &row.created_at)?,
        })
    }
}

fn writing_row(entry: &WritingEntry) -> Result<WritingEntryRow, CodecError> {
    Ok(WritingEntryRow {
        id: entry.id,
        title: entry.title.clone(),
        content: entry.content.clone(),
        entry_type: codec::encode_enum(entry.entry_type).to_string(),
        mood: entry.mood.map(|m| codec::encode_enum(m).to_string()),
        tags: codec::encode_list("writing_entries.tags", &entry.tags)?,
        attachments: codec::encode_list("writing_entries.attachments", &entry.attachments)?,
        checklists: codec::encode_list("writing_entries.checklists", &entry.checklists)?,
        created_at: codec::encode_timestamp(&entry.created_at),
    })
}

/// Free-form writing: notes and journal-style entries with attachments and checklists
#[derive(Debug, Clone)]
pub struct WritingRepository {
    db: Database,
}

impl WritingRepository {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    fn observe<F>(&self, query: F) -> Subscription<Vec<WritingEntry>>
    where
        F: Fn(&WritingEntryDao<'_>) -> Result<Vec<WritingEntryRow>, DatabaseError> + Send + Sync + 'static,
    {
        live::subscribe(&self.db, WRITING, move |conn| {
            decode_rows(query(&WritingEntryDao::new(conn))?)
        })
    }

    pub fn observe_all(&self) -> Subscription<Vec<WritingEntry>> {
        self.observe(|dao| dao.all())
    }

    pub fn observe_by_type(&self, entry_type: EntryType) -> Subscription<Vec<WritingEntry>> {
        self.observe(move |dao| dao.by_type(codec::encode_enum(entry_type)))
    }

    pub fn observe_by_mood(&self, mood: Mood) -> Subscription<Vec<WritingEntry>> {
        self.observe(move |dao| dao.by_mood(codec::encode_enum(mood)))
    }

    pub fn observe_with_tag(&self, tag: &str) -> Subscription<Vec<WritingEntry>> {
        let tag = tag.to_string();
        self.observe(move |dao| dao.with_tag(&tag))
    }

    pub fn observe_search(&self, query: &str) -> Subscription<Vec<WritingEntry>> {
        let query = query.to_string();
        self.observe(move |dao| dao.search(&query))
    }

    pub async fn get(&self, id: i64) -> RepositoryResult<Option<WritingEntry>> {
        self.db
            .read(move |conn| -> RepositoryResult<Option<WritingEntry>> {
                Ok(WritingEntryDao::new(conn)
                    .get(id)?
                    .map(WritingEntry::try_from)
                    .transpose()?)
            })
            .await
    }

    pub async fn insert(&self, entry: &WritingEntry) -> RepositoryResult<i64> {
        let row = writing_row(entry)?;
        let id = self
            .db
            .write(WRITING, move |conn| WritingEntryDao::new(conn).insert(&row))
            .await?;
        debug!(id, entry_type = %entry.entry_type, "inserted writing entry");
        Ok(id)
    }

    pub async fn update(&self, entry: &WritingEntry) -> RepositoryResult<bool> {
        let id = entry
            .id
            .ok_or_else(|| RepositoryError::not_persisted("writing entry id"))?;
        let row = writing_row(entry)?;
        Ok(self
            .db
            .write(WRITING, move |conn| WritingEntryDao::new(conn).update(id, &row))
            .await?)
    }

    pub async fn delete(&self, id: i64) -> RepositoryResult<bool> {
        Ok(self
            .db
            .write(WRITING, move |conn| WritingEntryDao::new(conn).delete(id))
            .await?)
    }
}
