use chrono::NaiveDateTime;
use tracing::debug;

use super::live::{self, Subscription};
use super::{RepositoryError, RepositoryResult, decode_rows};
use crate::codec::{self, CodecError};
use crate::database::{Database, DatabaseError, JournalEntryDao, JournalEntryRow, Table};
use crate::models::{JournalEntry, Mood};

const JOURNAL: &[Table] = &[Table::JournalEntries];

impl TryFrom<JournalEntryRow> for JournalEntry {
    type Error = CodecError;

    fn try_from(row: JournalEntryRow) -> Result<Self, Self::Error> {
        Ok(JournalEntry {
            id: row.id,
            title: row.title,
            content: row.content,
            mood: codec::require_optional_enum(row.mood.as_deref())?,
            tags: codec::decode_delimited(&row.tags),
            date: codec::decode_timestamp("journal_entries.date", &row.date)?,
            created_at: codec::decode_timestamp("journal_entries.created_at", &row.created_at)?,
            updated_at: codec::decode_timestamp("journal_entries.updated_at", &row.updated_at)?,
        })
    }
}

impl From<&JournalEntry> for JournalEntryRow {
    fn from(entry: &JournalEntry) -> Self {
        JournalEntryRow {
            id: entry.id,
            title: entry.title.clone(),
            content: entry.content.clone(),
            mood: entry.mood.map(|m| codec::encode_enum(m).to_string()),
            tags: codec::encode_delimited(&entry.tags),
            date: codec::encode_timestamp(&entry.date),
            created_at: codec::encode_timestamp(&entry.created_at),
            updated_at: codec::encode_timestamp(&entry.updated_at),
        }
    }
}

/// Tags share one delimited column, so each must survive being split back out.
fn validate_tags(tags: &[String]) -> RepositoryResult<()> {
    for tag in tags {
        let problem = if tag.is_empty() {
            "tags must not be empty"
        } else if tag.trim() != tag {
            "tags must not start or end with whitespace"
        } else if tag.contains(codec::TAG_DELIMITER) {
            "tags must not contain the delimiter"
        } else {
            continue;
        };
        return Err(RepositoryError::InvalidValue {
            field: "tags",
            message: format!("{problem}: {tag:?}"),
        });
    }
    Ok(())
}

#[derive(Debug, Clone)]
pub struct JournalRepository {
    db: Database,
}

impl JournalRepository {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    fn observe<F>(&self, query: F) -> Subscription<Vec<JournalEntry>>
    where
        F: Fn(&JournalEntryDao<'_>) -> Result<Vec<JournalEntryRow>, DatabaseError> + Send + Sync + 'static,
    {
        live::subscribe(&self.db, JOURNAL, move |conn| {
            decode_rows(query(&JournalEntryDao::new(conn))?)
        })
    }

    /// Newest first
    pub fn observe_all(&self) -> Subscription<Vec<JournalEntry>> {
        self.observe(|dao| dao.all())
    }

    pub fn observe_by_mood(&self, mood: Mood) -> Subscription<Vec<JournalEntry>> {
        self.observe(move |dao| dao.by_mood(codec::encode_enum(mood)))
    }

    pub fn observe_with_tag(&self, tag: &str) -> Subscription<Vec<JournalEntry>> {
        let tag = tag.to_string();
        self.observe(move |dao| dao.with_tag(&tag))
    }

    pub fn observe_search(&self, query: &str) -> Subscription<Vec<JournalEntry>> {
        let query = query.to_string();
        self.observe(move |dao| dao.search(&query))
    }

    /// Entries dated within `[from, to]`
    pub fn observe_between(&self, from: NaiveDateTime, to: NaiveDateTime) -> Subscription<Vec<JournalEntry>> {
        let from = codec::encode_timestamp(&from);
        let to = codec::encode_timestamp(&to);
        self.observe(move |dao| dao.between(&from, &to))
    }

    pub async fn get(&self, id: i64) -> RepositoryResult<Option<JournalEntry>> {
        self.db
            .read(move |conn| -> RepositoryResult<Option<JournalEntry>> {
                Ok(JournalEntryDao::new(conn)
                    .get(id)?
                    .map(JournalEntry::try_from)
                    .transpose()?)
            })
            .await
    }

    pub async fn insert(&self, entry: &JournalEntry) -> RepositoryResult<i64> {
        validate_tags(&entry.tags)?;
        let row = JournalEntryRow::from(entry);
        let id = self
            .db
            .write(JOURNAL, move |conn| JournalEntryDao::new(conn).insert(&row))
            .await?;
        debug!(id, "inserted journal entry");
        Ok(id)
    }

    pub async fn update(&self, entry: &JournalEntry) -> RepositoryResult<bool> {
        let id = entry
            .id
            .ok_or_else(|| RepositoryError::not_persisted("journal entry id"))?;
        validate_tags(&entry.tags)?;
        let mut row = JournalEntryRow::from(entry);
        row.updated_at = codec::encode_timestamp(&codec::now());
        Ok(self
            .db
            .write(JOURNAL, move |conn| JournalEntryDao::new(conn).update(id, &row))
            .await?)
    }

    pub async fn delete(&self, id: i64) -> RepositoryResult<bool> {
        Ok(self
            .db
            .write(JOURNAL, move |conn| JournalEntryDao::new(conn).delete(id))
            .await?)
    }
}
