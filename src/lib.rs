//! Catalog store for a desktop library manager.
//!
//! The crate is the data-access seam between a UI shell and persistence:
//! books, authors, a fixed genre catalog and ratings, kept as JSON
//! documents in named collections inside an embedded SQLite database.
//! Presentation code gets synchronous CRUD, link and search operations
//! through the [`CatalogStore`] trait; [`Library`] is the shipped
//! implementation. Concurrency, dialogs and rendering stay on the caller's
//! side of the seam.

pub mod error;
pub mod models;
pub mod store;

mod db;

pub use error::{Result, StoreError};
pub use models::{Author, Book, Genre, NewAuthor, NewBook, Rating};
pub use store::{CatalogStore, Library};
