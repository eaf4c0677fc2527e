//! The catalog store port and its document-store-backed implementation.

use std::path::Path;

use chrono::Local;
use log::{debug, info};
use regex::RegexBuilder;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::db::{self, Storage};
use crate::error::{Result, StoreError};
use crate::models::{
    Author, AuthorLink, Book, Genre, GenreLink, NewAuthor, NewBook, Rating,
};

/// The data-access seam between presentation and persistence.
///
/// Every operation is a single synchronous call: no sessions, no retries,
/// no atomicity across calls. Multi-step flows (add a book, add an author,
/// link them, rate the book) are independent calls with no rollback on
/// partial failure; the caller decides how to react to an `Err` in the
/// middle.
pub trait CatalogStore {
    /// Every book in the catalog. Order is unspecified; callers sort.
    fn all_books(&self) -> Result<Vec<Book>>;

    /// Books whose title, ISBN or publication date contains `term`
    /// case-insensitively. An empty term matches everything.
    fn search_books(&self, term: &str) -> Result<Vec<Book>>;

    /// Persists a new book and returns its store-assigned id.
    fn add_book(&self, book: &NewBook) -> Result<i64>;

    /// Removes a book together with its link and rating records.
    fn delete_book(&self, book_id: i64) -> Result<()>;

    /// Highest book id currently in the catalog, `None` when empty.
    fn last_inserted_book_id(&self) -> Result<Option<i64>>;

    /// Authors linked to the given book.
    fn authors_for_book(&self, book_id: i64) -> Result<Vec<Author>>;

    /// Persists a new author and returns its store-assigned id.
    fn add_author(&self, author: &NewAuthor) -> Result<i64>;

    /// Associates an author with a book. Idempotent: linking the same pair
    /// again is a no-op.
    fn link_author_to_book(&self, book_id: i64, author_id: i64) -> Result<()>;

    /// Highest author id currently in the catalog, `None` when empty.
    fn last_inserted_author_id(&self) -> Result<Option<i64>>;

    /// The fixed genre catalog.
    fn all_genres(&self) -> Vec<Genre>;

    /// Genres linked to the given book, resolved against the catalog.
    fn genres_for_book(&self, book_id: i64) -> Result<Vec<Genre>>;

    /// Associates a catalog genre with a book. Idempotent.
    fn link_genre_to_book(&self, book_id: i64, genre_id: i64) -> Result<()>;

    /// Records a 1-5 rating for a book, stamped with today's date.
    fn add_rating_to_book(&self, book_id: i64, value: i32) -> Result<()>;

    /// All ratings recorded for a book. Order is unspecified; "the first
    /// rating is the display rating" is a caller convention, not a
    /// contract.
    fn ratings_for_book(&self, book_id: i64) -> Result<Vec<Rating>>;
}

/// Document-store-backed [`CatalogStore`].
///
/// Safe to use from a single caller thread; the store does no locking of
/// its own beyond what the embedded engine provides.
pub struct Library {
    storage: Storage,
}

impl Library {
    /// Opens (or creates) the catalog at `path`.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let storage = Storage::open(path.as_ref())?;
        info!("catalog opened at {}", path.as_ref().display());
        Ok(Library { storage })
    }

    /// Opens an ephemeral in-memory catalog.
    pub fn open_in_memory() -> Result<Self> {
        Ok(Library {
            storage: Storage::open_in_memory()?,
        })
    }

    /// Closes the store, surfacing any engine error. Dropping the store
    /// closes it silently instead.
    pub fn close(self) -> Result<()> {
        self.storage.close()
    }

    fn require_book(&self, book_id: i64) -> Result<()> {
        if self.storage.exists(db::BOOK, "book_id", book_id)? {
            Ok(())
        } else {
            Err(StoreError::NotFound {
                collection: db::BOOK,
                id: book_id,
            })
        }
    }
}

impl CatalogStore for Library {
    fn all_books(&self) -> Result<Vec<Book>> {
        decode(self.storage.find_all(db::BOOK)?)
    }

    fn search_books(&self, term: &str) -> Result<Vec<Book>> {
        // Substring semantics: the term is escaped, only the match is
        // case-insensitive.
        let matcher = RegexBuilder::new(&regex::escape(term))
            .case_insensitive(true)
            .build()
            .map_err(|err| StoreError::Validation(format!("search term: {err}")))?;
        let mut books = self.all_books()?;
        books.retain(|book| {
            matcher.is_match(&book.title)
                || matcher.is_match(&book.isbn)
                || matcher.is_match(&book.publication_date)
        });
        Ok(books)
    }

    fn add_book(&self, book: &NewBook) -> Result<i64> {
        let record = Book {
            id: self.storage.next_id(db::BOOK)?,
            isbn: book.isbn.clone(),
            title: book.title.clone(),
            publication_date: book.publication_date.clone(),
            rating: book.rating.clone(),
        };
        self.storage.insert(db::BOOK, &serde_json::to_value(&record)?)?;
        debug!("added book {}: {}", record.id, record.title);
        Ok(record.id)
    }

    fn delete_book(&self, book_id: i64) -> Result<()> {
        let removed = self.storage.delete_eq(db::BOOK, "book_id", book_id)?;
        if removed == 0 {
            return Err(StoreError::NotFound {
                collection: db::BOOK,
                id: book_id,
            });
        }
        // Link and rating records must not outlive the book. Author
        // documents stay; authors exist independently of any one book.
        self.storage.delete_eq(db::BOOK_AUTHOR, "book_id", book_id)?;
        self.storage.delete_eq(db::BOOK_GENRE, "book_id", book_id)?;
        self.storage.delete_eq(db::BOOK_RATING, "book_id", book_id)?;
        info!("deleted book {book_id}");
        Ok(())
    }

    fn last_inserted_book_id(&self) -> Result<Option<i64>> {
        self.storage.max_field(db::BOOK, "book_id")
    }

    fn authors_for_book(&self, book_id: i64) -> Result<Vec<Author>> {
        let links: Vec<AuthorLink> =
            decode(self.storage.find_eq(db::BOOK_AUTHOR, "book_id", book_id)?)?;
        let mut authors = Vec::with_capacity(links.len());
        for link in links {
            let found: Vec<Author> =
                decode(self.storage.find_eq(db::AUTHOR, "author_id", link.author_id)?)?;
            match found.into_iter().next() {
                Some(author) => authors.push(author),
                None => {
                    return Err(StoreError::NotFound {
                        collection: db::AUTHOR,
                        id: link.author_id,
                    })
                }
            }
        }
        Ok(authors)
    }

    fn add_author(&self, author: &NewAuthor) -> Result<i64> {
        let record = Author {
            id: self.storage.next_id(db::AUTHOR)?,
            first_name: author.first_name.clone(),
            last_name: author.last_name.clone(),
        };
        self.storage
            .insert(db::AUTHOR, &serde_json::to_value(&record)?)?;
        debug!(
            "added author {}: {} {}",
            record.id, record.first_name, record.last_name
        );
        Ok(record.id)
    }

    fn link_author_to_book(&self, book_id: i64, author_id: i64) -> Result<()> {
        self.require_book(book_id)?;
        if !self.storage.exists(db::AUTHOR, "author_id", author_id)? {
            return Err(StoreError::NotFound {
                collection: db::AUTHOR,
                id: author_id,
            });
        }
        if self.storage.exists_pair(
            db::BOOK_AUTHOR,
            ("book_id", book_id),
            ("author_id", author_id),
        )? {
            return Ok(());
        }
        let link = AuthorLink { book_id, author_id };
        self.storage
            .insert(db::BOOK_AUTHOR, &serde_json::to_value(&link)?)?;
        Ok(())
    }

    fn last_inserted_author_id(&self) -> Result<Option<i64>> {
        self.storage.max_field(db::AUTHOR, "author_id")
    }

    fn all_genres(&self) -> Vec<Genre> {
        Genre::catalog()
    }

    fn genres_for_book(&self, book_id: i64) -> Result<Vec<Genre>> {
        let links: Vec<GenreLink> =
            decode(self.storage.find_eq(db::BOOK_GENRE, "book_id", book_id)?)?;
        links
            .into_iter()
            .map(|link| {
                Genre::by_id(link.genre_id).ok_or(StoreError::NotFound {
                    collection: db::GENRE,
                    id: link.genre_id,
                })
            })
            .collect()
    }

    fn link_genre_to_book(&self, book_id: i64, genre_id: i64) -> Result<()> {
        self.require_book(book_id)?;
        if Genre::by_id(genre_id).is_none() {
            return Err(StoreError::NotFound {
                collection: db::GENRE,
                id: genre_id,
            });
        }
        if self.storage.exists_pair(
            db::BOOK_GENRE,
            ("book_id", book_id),
            ("genre_id", genre_id),
        )? {
            return Ok(());
        }
        let link = GenreLink { book_id, genre_id };
        self.storage
            .insert(db::BOOK_GENRE, &serde_json::to_value(&link)?)?;
        Ok(())
    }

    fn add_rating_to_book(&self, book_id: i64, value: i32) -> Result<()> {
        if !(1..=5).contains(&value) {
            return Err(StoreError::Validation(format!(
                "rating must be between 1 and 5, got {value}"
            )));
        }
        self.require_book(book_id)?;
        let rating = Rating {
            id: self.storage.next_id(db::BOOK_RATING)?,
            book_id,
            value,
            rating_date: Local::now().date_naive(),
        };
        self.storage
            .insert(db::BOOK_RATING, &serde_json::to_value(&rating)?)?;
        debug!("rated book {book_id}: {value}");
        Ok(())
    }

    fn ratings_for_book(&self, book_id: i64) -> Result<Vec<Rating>> {
        decode(self.storage.find_eq(db::BOOK_RATING, "book_id", book_id)?)
    }
}

fn decode<T: DeserializeOwned>(docs: Vec<Value>) -> Result<Vec<T>> {
    docs.into_iter()
        .map(|doc| serde_json::from_value(doc).map_err(StoreError::from))
        .collect()
}
