use rusqlite::{Connection, OptionalExtension, Params};

use super::DatabaseError;
use super::entities::BookRow;

pub struct BookDao<'a> {
    conn: &'a Connection,
}

impl<'a> BookDao<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    fn list<P: Params>(&self, clause: &str, params: P) -> Result<Vec<BookRow>, DatabaseError> {
        let sql = format!("SELECT {} FROM books {}", BookRow::COLUMNS, clause);
        let mut stmt = self.conn.prepare(&sql)?;
        let books = stmt
            .query_map(params, BookRow::from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(books)
    }

    /// All books, most recently touched first
    pub fn all(&self) -> Result<Vec<BookRow>, DatabaseError> {
        self.list("ORDER BY updated_at DESC, id DESC", [])
    }

    pub fn reading(&self) -> Result<Vec<BookRow>, DatabaseError> {
        self.list(
            "WHERE status = 'READING' ORDER BY started_date DESC, id DESC",
            [],
        )
    }

    pub fn completed(&self) -> Result<Vec<BookRow>, DatabaseError> {
        self.list(
            "WHERE status = 'COMPLETED' ORDER BY completed_date DESC, id DESC",
            [],
        )
    }

    pub fn by_status(&self, status: &str) -> Result<Vec<BookRow>, DatabaseError> {
        self.list(
            "WHERE status = ?1 ORDER BY updated_at DESC, id DESC",
            rusqlite::params![status],
        )
    }

    /// Case-sensitive substring match over title and author
    pub fn search(&self, query: &str) -> Result<Vec<BookRow>, DatabaseError> {
        self.list(
            "WHERE instr(title, ?1) > 0 OR instr(author, ?1) > 0 ORDER BY updated_at DESC, id DESC",
            rusqlite::params![query],
        )
    }

    pub fn get(&self, id: i64) -> Result<Option<BookRow>, DatabaseError> {
        let sql = format!("SELECT {} FROM books WHERE id = ?1", BookRow::COLUMNS);
        Ok(self
            .conn
            .query_row(&sql, rusqlite::params![id], BookRow::from_row)
            .optional()?)
    }

    pub fn insert(&self, book: &BookRow) -> Result<i64, DatabaseError> {
        self.conn.execute(
            "INSERT INTO books (title, author, status, genre, total_pages, pages_read, rating, notes,
                                started_date, completed_date, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
            rusqlite::params![
                book.title,
                book.author,
                book.status,
                book.genre,
                book.total_pages,
                book.pages_read,
                book.rating,
                book.notes,
                book.started_date,
                book.completed_date,
                book.created_at,
                book.updated_at
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    pub fn update(&self, id: i64, book: &BookRow) -> Result<bool, DatabaseError> {
        let changed = self.conn.execute(
            "UPDATE books SET title = ?1, author = ?2, status = ?3, genre = ?4, total_pages = ?5,
             pages_read = ?6, rating = ?7, notes = ?8, started_date = ?9, completed_date = ?10,
             created_at = ?11, updated_at = MAX(updated_at, ?12) WHERE id = ?13",
            rusqlite::params![
                book.title,
                book.author,
                book.status,
                book.genre,
                book.total_pages,
                book.pages_read,
                book.rating,
                book.notes,
                book.started_date,
                book.completed_date,
                book.created_at,
                book.updated_at,
                id
            ],
        )?;
        Ok(changed > 0)
    }

    pub fn update_pages_read(&self, id: i64, pages_read: i64, now: &str) -> Result<bool, DatabaseError> {
        let changed = self.conn.execute(
            "UPDATE books SET pages_read = ?1, updated_at = MAX(updated_at, ?2) WHERE id = ?3",
            rusqlite::params![pages_read, now, id],
        )?;
        Ok(changed > 0)
    }

    /// Change status. Starting to read stamps `started_date` once; finishing
    /// stamps `completed_date`; any other status clears `completed_date`.
    pub fn set_status(&self, id: i64, status: &str, now: &str) -> Result<bool, DatabaseError> {
        let changed = self.conn.execute(
            "UPDATE books
             SET status = ?1,
                 started_date = CASE WHEN ?1 IN ('READING', 'COMPLETED') THEN IFNULL(started_date, ?2)
                                     ELSE started_date END,
                 completed_date = CASE WHEN ?1 = 'COMPLETED' THEN ?2 ELSE NULL END,
                 updated_at = MAX(updated_at, ?2)
             WHERE id = ?3",
            rusqlite::params![status, now, id],
        )?;
        Ok(changed > 0)
    }

    pub fn set_rating(&self, id: i64, rating: Option<i64>, now: &str) -> Result<bool, DatabaseError> {
        let changed = self.conn.execute(
            "UPDATE books SET rating = ?1, updated_at = MAX(updated_at, ?2) WHERE id = ?3",
            rusqlite::params![rating, now, id],
        )?;
        Ok(changed > 0)
    }

    pub fn delete(&self, id: i64) -> Result<bool, DatabaseError> {
        let changed = self
            .conn
            .execute("DELETE FROM books WHERE id = ?1", rusqlite::params![id])?;
        Ok(changed > 0)
    }
}
