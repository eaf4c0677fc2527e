use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A catalog book.
///
/// Snapshots are flat and immutable. Authors, genres and ratings hang off
/// separate link collections and are fetched through the store, not carried
/// on the book itself.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Book {
    #[serde(rename = "book_id")]
    pub id: i64,
    #[serde(rename = "ISBN")]
    pub isbn: String,
    pub title: String,
    /// Free text, not validated as a date.
    pub publication_date: String,
    /// Display-only rating summary, stored verbatim.
    pub rating: String,
}

/// Draft for [`add_book`](crate::store::CatalogStore::add_book); the store
/// assigns the id.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct NewBook {
    pub isbn: String,
    pub title: String,
    pub publication_date: String,
    pub rating: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Author {
    #[serde(rename = "author_id")]
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
}

/// Draft for [`add_author`](crate::store::CatalogStore::add_author).
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct NewAuthor {
    pub first_name: String,
    pub last_name: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Genre {
    #[serde(rename = "genre_id")]
    pub id: i64,
    pub name: String,
}

/// A single rating given to a book.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Rating {
    #[serde(rename = "rating_id")]
    pub id: i64,
    pub book_id: i64,
    /// 1 to 5, enforced by the store.
    pub value: i32,
    pub rating_date: NaiveDate,
}

/// Book-to-author association record.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AuthorLink {
    pub book_id: i64,
    pub author_id: i64,
}

/// Book-to-genre association record.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct GenreLink {
    pub book_id: i64,
    pub genre_id: i64,
}

/// The fixed genre catalog. Genres are enumerable and never user-created.
const GENRE_CATALOG: [(i64, &str); 7] = [
    (1, "Programming"),
    (2, "Science Fiction"),
    (3, "Fantasy"),
    (4, "Romance"),
    (5, "Mystery"),
    (6, "Horror"),
    (7, "Non-Fiction"),
];

impl Genre {
    /// All genres, in catalog order.
    pub fn catalog() -> Vec<Genre> {
        GENRE_CATALOG
            .iter()
            .map(|&(id, name)| Genre {
                id,
                name: name.to_string(),
            })
            .collect()
    }

    /// Looks up a catalog genre by id.
    pub fn by_id(id: i64) -> Option<Genre> {
        GENRE_CATALOG
            .iter()
            .find(|&&(genre_id, _)| genre_id == id)
            .map(|&(id, name)| Genre {
                id,
                name: name.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn book_documents_use_collection_field_names() {
        let book = Book {
            id: 3,
            isbn: "91-7054-552-X".to_string(),
            title: "Mistborn".to_string(),
            publication_date: "2006".to_string(),
            rating: "0".to_string(),
        };
        let doc = serde_json::to_value(&book).unwrap();
        assert_eq!(doc["book_id"], 3);
        assert_eq!(doc["ISBN"], "91-7054-552-X");
        assert_eq!(doc["publication_date"], "2006");
    }

    #[test]
    fn genre_catalog_is_fixed_and_unique() {
        let genres = Genre::catalog();
        assert_eq!(genres.len(), 7);
        for genre in &genres {
            assert_eq!(Genre::by_id(genre.id), Some(genre.clone()));
        }
        assert_eq!(Genre::by_id(0), None);
        assert_eq!(Genre::by_id(8), None);
    }
}
