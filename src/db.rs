//! Embedded document store: named collections of JSON documents inside a
//! rusqlite database. One table per collection, one document per row;
//! field matching goes through `json_extract`.

use std::fs;
use std::path::Path;

use rusqlite::{params, Connection};
use serde_json::Value;

use crate::error::Result;

pub(crate) const BOOK: &str = "Book";
pub(crate) const AUTHOR: &str = "Author";
pub(crate) const GENRE: &str = "Genre";
pub(crate) const BOOK_AUTHOR: &str = "BookAuthor";
pub(crate) const BOOK_GENRE: &str = "BookGenre";
pub(crate) const BOOK_RATING: &str = "BookRating";

/// Collections bootstrapped at open. `Genre` exists but is never written;
/// the genre catalog is a static table in `models`.
const COLLECTIONS: [&str; 6] = [BOOK, AUTHOR, GENRE, BOOK_AUTHOR, BOOK_GENRE, BOOK_RATING];

/// Connection wrapper exposing document operations over the collections.
pub(crate) struct Storage {
    conn: Connection,
}

impl Storage {
    /// Opens (or creates) the store at `path`, creating parent directories
    /// as needed.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent)?;
            }
        }
        Self::bootstrap(Connection::open(path)?)
    }

    /// Opens an ephemeral store.
    pub fn open_in_memory() -> Result<Self> {
        Self::bootstrap(Connection::open_in_memory()?)
    }

    fn bootstrap(conn: Connection) -> Result<Self> {
        for collection in COLLECTIONS {
            conn.execute(
                &format!("CREATE TABLE IF NOT EXISTS \"{collection}\" (doc TEXT NOT NULL)"),
                [],
            )?;
        }
        conn.execute(
            "CREATE TABLE IF NOT EXISTS id_seq (
                collection TEXT PRIMARY KEY,
                last_id INTEGER NOT NULL
            )",
            [],
        )?;
        Ok(Storage { conn })
    }

    /// Hands out the next id for `collection`. The counter is bumped inside
    /// the engine, so two writers can never observe the same id, and it is
    /// persisted, so ids are not reused after deletes or across reopen.
    /// Ids start at 0.
    pub fn next_id(&self, collection: &str) -> Result<i64> {
        let id = self.conn.query_row(
            "INSERT INTO id_seq (collection, last_id) VALUES (?1, 0)
             ON CONFLICT(collection) DO UPDATE SET last_id = last_id + 1
             RETURNING last_id",
            params![collection],
            |row| row.get(0),
        )?;
        Ok(id)
    }

    pub fn insert(&self, collection: &str, doc: &Value) -> Result<()> {
        self.conn.execute(
            &format!("INSERT INTO \"{}\" (doc) VALUES (?1)", table(collection)),
            params![doc.to_string()],
        )?;
        Ok(())
    }

    /// Every document in the collection, in insertion order.
    pub fn find_all(&self, collection: &str) -> Result<Vec<Value>> {
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT doc FROM \"{}\"", table(collection)))?;
        let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;
        let mut docs = Vec::new();
        for row in rows {
            docs.push(serde_json::from_str(&row?)?);
        }
        Ok(docs)
    }

    /// Documents whose `field` equals `value`, in insertion order.
    pub fn find_eq(&self, collection: &str, field: &str, value: i64) -> Result<Vec<Value>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT doc FROM \"{}\" WHERE json_extract(doc, '$.{field}') = ?1",
            table(collection)
        ))?;
        let rows = stmt.query_map(params![value], |row| row.get::<_, String>(0))?;
        let mut docs = Vec::new();
        for row in rows {
            docs.push(serde_json::from_str(&row?)?);
        }
        Ok(docs)
    }

    pub fn exists(&self, collection: &str, field: &str, value: i64) -> Result<bool> {
        let found: i64 = self.conn.query_row(
            &format!(
                "SELECT EXISTS(
                    SELECT 1 FROM \"{}\" WHERE json_extract(doc, '$.{field}') = ?1
                 )",
                table(collection)
            ),
            params![value],
            |row| row.get(0),
        )?;
        Ok(found != 0)
    }

    /// Match on two fields at once; used for link-record lookups.
    pub fn exists_pair(
        &self,
        collection: &str,
        first: (&str, i64),
        second: (&str, i64),
    ) -> Result<bool> {
        let found: i64 = self.conn.query_row(
            &format!(
                "SELECT EXISTS(
                    SELECT 1 FROM \"{}\"
                    WHERE json_extract(doc, '$.{}') = ?1
                      AND json_extract(doc, '$.{}') = ?2
                 )",
                table(collection),
                first.0,
                second.0
            ),
            params![first.1, second.1],
            |row| row.get(0),
        )?;
        Ok(found != 0)
    }

    /// Removes every document whose `field` equals `value`; returns how
    /// many were removed.
    pub fn delete_eq(&self, collection: &str, field: &str, value: i64) -> Result<usize> {
        let removed = self.conn.execute(
            &format!(
                "DELETE FROM \"{}\" WHERE json_extract(doc, '$.{field}') = ?1",
                table(collection)
            ),
            params![value],
        )?;
        Ok(removed)
    }

    /// Largest integer `field` across the collection, `None` when empty.
    pub fn max_field(&self, collection: &str, field: &str) -> Result<Option<i64>> {
        let max = self.conn.query_row(
            &format!(
                "SELECT MAX(json_extract(doc, '$.{field}')) FROM \"{}\"",
                table(collection)
            ),
            [],
            |row| row.get(0),
        )?;
        Ok(max)
    }

    pub fn close(self) -> Result<()> {
        self.conn.close().map_err(|(_, err)| err.into())
    }
}

/// Collection names are interpolated into SQL; restrict them to the
/// bootstrapped set.
fn table(collection: &str) -> &str {
    debug_assert!(COLLECTIONS.contains(&collection));
    collection
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn sequences_start_at_zero_and_are_independent() {
        let storage = Storage::open_in_memory().unwrap();
        assert_eq!(storage.next_id(BOOK).unwrap(), 0);
        assert_eq!(storage.next_id(BOOK).unwrap(), 1);
        assert_eq!(storage.next_id(AUTHOR).unwrap(), 0);
        assert_eq!(storage.next_id(BOOK).unwrap(), 2);
    }

    #[test]
    fn documents_round_trip_through_field_match() {
        let storage = Storage::open_in_memory().unwrap();
        storage
            .insert(BOOK, &json!({"book_id": 0, "title": "A"}))
            .unwrap();
        storage
            .insert(BOOK, &json!({"book_id": 1, "title": "B"}))
            .unwrap();

        let docs = storage.find_eq(BOOK, "book_id", 1).unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0]["title"], "B");
        assert!(storage.exists(BOOK, "book_id", 0).unwrap());
        assert!(!storage.exists(BOOK, "book_id", 7).unwrap());
    }

    #[test]
    fn max_field_is_none_on_empty_collection() {
        let storage = Storage::open_in_memory().unwrap();
        assert_eq!(storage.max_field(BOOK, "book_id").unwrap(), None);
        storage
            .insert(BOOK, &json!({"book_id": 4, "title": "A"}))
            .unwrap();
        assert_eq!(storage.max_field(BOOK, "book_id").unwrap(), Some(4));
    }
}
