use tracing::debug;

use super::live::{self, Subscription};
use super::{RepositoryError, RepositoryResult, decode_rows};
use crate::codec::{self, CodecError};
use crate::database::{BookDao, BookRow, Database, DatabaseError, Table};
use crate::models::{Book, BookStatus};

const BOOKS: &[Table] = &[Table::Books];

impl TryFrom<BookRow> for Book {
    type Error = CodecError;

    fn try_from(row: BookRow) -> Result<Self, Self::Error> {
        Ok(Book {
            id: row.id,
            title: row.title,
            author: row.author,
            status: codec::require_enum(&row.status)?,
            genre: row.genre,
            total_pages: row
                .total_pages
                .map(|pages| codec::decode_bounded("books.total_pages", pages, 0..=u32::MAX))
                .transpose()?,
            pages_read: codec::decode_bounded("books.pages_read", row.pages_read, 0..=u32::MAX)?,
            rating: row
                .rating
                .map(|rating| codec::decode_bounded("books.rating", rating, 1..=5))
                .transpose()?,
            notes: row.notes,
            started_date: codec::decode_optional_timestamp("books.started_date", row.started_date.as_deref())?,
            completed_date: codec::decode_optional_timestamp(
                "books.completed_date",
                row.completed_date.as_deref(),
            )?,
            created_at: codec::decode_timestamp("books.created_at", &row.created_at)?,
            updated_at: codec::decode_timestamp("books.updated_at", &row.updated_at)?,
        })
    }
}

impl From<&Book> for BookRow {
    fn from(book: &Book) -> Self {
        BookRow {
            id: book.id,
            title: book.title.clone(),
            author: book.author.clone(),
            status: codec::encode_enum(book.status).to_string(),
            genre: book.genre.clone(),
            total_pages: book.total_pages.map(i64::from),
            pages_read: i64::from(book.pages_read),
            rating: book.rating.map(i64::from),
            notes: book.notes.clone(),
            started_date: codec::encode_optional_timestamp(book.started_date.as_ref()),
            completed_date: codec::encode_optional_timestamp(book.completed_date.as_ref()),
            created_at: codec::encode_timestamp(&book.created_at),
            updated_at: codec::encode_timestamp(&book.updated_at),
        }
    }
}

/// Reading list and progress
#[derive(Debug, Clone)]
pub struct BookRepository {
    db: Database,
}

impl BookRepository {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    fn observe<F>(&self, query: F) -> Subscription<Vec<Book>>
    where
        F: Fn(&BookDao<'_>) -> Result<Vec<BookRow>, DatabaseError> + Send + Sync + 'static,
    {
        live::subscribe(&self.db, BOOKS, move |conn| decode_rows(query(&BookDao::new(conn))?))
    }

    pub fn observe_all(&self) -> Subscription<Vec<Book>> {
        self.observe(|dao| dao.all())
    }

    pub fn observe_reading(&self) -> Subscription<Vec<Book>> {
        self.observe(|dao| dao.reading())
    }

    pub fn observe_completed(&self) -> Subscription<Vec<Book>> {
        self.observe(|dao| dao.completed())
    }

    pub fn observe_by_status(&self, status: BookStatus) -> Subscription<Vec<Book>> {
        self.observe(move |dao| dao.by_status(codec::encode_enum(status)))
    }

    pub fn observe_search(&self, query: &str) -> Subscription<Vec<Book>> {
        let query = query.to_string();
        self.observe(move |dao| dao.search(&query))
    }

    pub async fn get(&self, id: i64) -> RepositoryResult<Option<Book>> {
        self.db
            .read(move |conn| -> RepositoryResult<Option<Book>> {
                Ok(BookDao::new(conn).get(id)?.map(Book::try_from).transpose()?)
            })
            .await
    }

    pub async fn insert(&self, book: &Book) -> RepositoryResult<i64> {
        let row = BookRow::from(book);
        let id = self
            .db
            .write(BOOKS, move |conn| BookDao::new(conn).insert(&row))
            .await?;
        debug!(id, "inserted book");
        Ok(id)
    }

    pub async fn update(&self, book: &Book) -> RepositoryResult<bool> {
        let id = book.id.ok_or_else(|| RepositoryError::not_persisted("book id"))?;
        let mut row = BookRow::from(book);
        row.updated_at = codec::encode_timestamp(&codec::now());
        Ok(self
            .db
            .write(BOOKS, move |conn| BookDao::new(conn).update(id, &row))
            .await?)
    }

    pub async fn delete(&self, id: i64) -> RepositoryResult<bool> {
        Ok(self
            .db
            .write(BOOKS, move |conn| BookDao::new(conn).delete(id))
            .await?)
    }

    /// Record pages read. Exceeding the known page count is the caller's concern.
    pub async fn update_pages_read(&self, id: i64, pages_read: u32) -> RepositoryResult<bool> {
        let now = codec::encode_timestamp(&codec::now());
        Ok(self
            .db
            .write(BOOKS, move |conn| {
                BookDao::new(conn).update_pages_read(id, i64::from(pages_read), &now)
            })
            .await?)
    }

    /// Move a book to `status`, stamping start and completion dates as needed
    pub async fn set_status(&self, id: i64, status: BookStatus) -> RepositoryResult<bool> {
        let now = codec::encode_timestamp(&codec::now());
        let changed = self
            .db
            .write(BOOKS, move |conn| {
                BookDao::new(conn).set_status(id, codec::encode_enum(status), &now)
            })
            .await?;
        debug!(id, %status, changed, "changed book status");
        Ok(changed)
    }

    pub async fn set_rating(&self, id: i64, rating: Option<u8>) -> RepositoryResult<bool> {
        if let Some(r) = rating {
            if !(1..=5).contains(&r) {
                return Err(RepositoryError::InvalidValue {
                    field: "rating",
                    message: format!("{r} is outside 1..=5"),
                });
            }
        }
        let now = codec::encode_timestamp(&codec::now());
        Ok(self
            .db
            .write(BOOKS, move |conn| {
                BookDao::new(conn).set_rating(id, rating.map(i64::from), &now)
            })
            .await?)
    }
}
