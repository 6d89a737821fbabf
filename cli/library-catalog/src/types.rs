//! Catalog record and request types.
//!
//! Records ([Book], [Author], [Genre]) are owned by the catalog service.
//! Inputs ([BookInput], [AuthorInput], [GenreInput]) are what gets sent
//! on create and update and never contain server-assigned fields.

use derive_more::{Display, From, FromStr};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Identifiers
// ---------------------------------------------------------------------------

/// Server-assigned identifier of a [Book].
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Display, From, FromStr,
)]
#[serde(transparent)]
pub struct BookId(i64);

/// Server-assigned identifier of an [Author].
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Display, From, FromStr,
)]
#[serde(transparent)]
pub struct AuthorId(i64);

/// Server-assigned identifier of a [Genre].
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Display, From, FromStr,
)]
#[serde(transparent)]
pub struct GenreId(i64);

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Author {
    pub id: AuthorId,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Genre {
    pub id: GenreId,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Book {
    pub id: BookId,
    pub title: String,
    #[serde(default)]
    pub isbn: Option<String>,
    #[serde(default)]
    pub publication_year: Option<i32>,
    #[serde(default)]
    pub page_count: Option<u32>,
    #[serde(default)]
    pub description: Option<String>,
    pub author_id: AuthorId,
    pub genre_id: GenreId,
    /// Creation timestamp as reported by the service.
    #[serde(default)]
    pub created_at: Option<String>,

    /// Embedded for display, never sent back.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<Author>,
    /// Embedded for display, never sent back.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub genre: Option<Genre>,
}

// ---------------------------------------------------------------------------
// Inputs
// ---------------------------------------------------------------------------

/// Body of a book create or (full replace) update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookInput {
    pub title: String,
    pub isbn: Option<String>,
    pub publication_year: Option<i32>,
    pub page_count: Option<u32>,
    pub description: Option<String>,
    pub author_id: AuthorId,
    pub genre_id: GenreId,
}

impl From<&Book> for BookInput {
    fn from(book: &Book) -> Self {
        Self {
            title: book.title.clone(),
            isbn: book.isbn.clone(),
            publication_year: book.publication_year,
            page_count: book.page_count,
            description: book.description.clone(),
            author_id: book.author_id,
            genre_id: book.genre_id,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorInput {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenreInput {
    pub name: String,
}

// ---------------------------------------------------------------------------
// Listing
// ---------------------------------------------------------------------------

/// Pagination parameters for author and genre listings.
///
/// Unset parameters are left out of the query string.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skip: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
}

/// Pagination and filter parameters for book listings.
///
/// Unset parameters are left out of the query string,
/// they are never sent as empty strings or zeros.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookListParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skip: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author_id: Option<AuthorId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub genre_id: Option<GenreId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub publication_year: Option<i32>,
}

/// One page of books as returned by the service.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookPage {
    pub items: Vec<Book>,
    /// 1-based page number
    pub page: u32,
    /// Page size
    pub limit: u32,
    /// Number of books matching the query across all pages
    pub total: u64,
    /// Number of pages
    pub pages: u32,
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    #[test]
    fn book_with_embedded_records_deserializes() {
        let book: Book = serde_json::from_value(json!({
            "id": 7,
            "title": "Solaris",
            "isbn": null,
            "publication_year": 1961,
            "page_count": 204,
            "description": null,
            "author_id": 3,
            "genre_id": 2,
            "created_at": "2024-05-01T10:00:00",
            "author": {"id": 3, "name": "Stanisław Lem"},
            "genre": {"id": 2, "name": "Science fiction"}
        }))
        .unwrap();

        assert_eq!(book.id, BookId::from(7));
        assert_eq!(book.author.as_ref().map(|a| a.name.as_str()), Some("Stanisław Lem"));
        assert_eq!(book.publication_year, Some(1961));
    }

    #[test]
    fn book_input_drops_server_assigned_fields() {
        let book = Book {
            id: BookId::from(1),
            title: "Dune".to_string(),
            isbn: Some("9780441013593".to_string()),
            publication_year: Some(1965),
            page_count: None,
            description: None,
            author_id: AuthorId::from(4),
            genre_id: GenreId::from(2),
            created_at: Some("2024-05-01T10:00:00".to_string()),
            author: Some(Author {
                id: AuthorId::from(4),
                name: "Frank Herbert".to_string(),
            }),
            genre: None,
        };

        let body = serde_json::to_value(BookInput::from(&book)).unwrap();
        assert_eq!(
            body,
            json!({
                "title": "Dune",
                "isbn": "9780441013593",
                "publication_year": 1965,
                "page_count": null,
                "description": null,
                "author_id": 4,
                "genre_id": 2,
            })
        );
    }

    #[test]
    fn ids_parse_from_strings() {
        assert_eq!("42".parse::<AuthorId>().unwrap(), AuthorId::from(42));
        assert!("forty-two".parse::<GenreId>().is_err());
    }
}
