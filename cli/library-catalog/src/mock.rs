//! A catalog client that replays canned responses.
//!
//! Responses are served in the order they were pushed,
//! regardless of which operation is called.
//! Every call is recorded so tests can assert on what would have been sent.

use std::collections::VecDeque;
use std::io;
use std::path::Path;
use std::sync::{Arc, Mutex};

use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::client::ClientTrait;
use crate::error::CatalogClientError;
use crate::types::*;

// Arc allows pushing responses into a client that has been handed out
// Mutex allows sharing across threads (necessary because of tokio)
type MockField<T> = Arc<Mutex<T>>;

/// An error response with a status code.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenericResponse {
    pub status: u16,
    #[serde(default)]
    pub detail: Option<String>,
}

/// A canned response.
///
/// Stored on disk as a JSON array of externally tagged values, e.g.
/// `[{"books": {...}}, "deleted", {"error": {"status": 404, "detail": "Not found"}}]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Response {
    Books(BookPage),
    Book(Book),
    Authors(Vec<Author>),
    Author(Author),
    Genres(Vec<Genre>),
    Genre(Genre),
    Deleted,
    Error(GenericResponse),
    /// The service could not be reached
    Unreachable,
}

/// A call received by a [MockClient].
#[derive(Debug, Clone, PartialEq)]
pub enum RecordedCall {
    ListBooks(BookListParams),
    GetBook(BookId),
    CreateBook(BookInput),
    UpdateBook(BookId, BookInput),
    DeleteBook(BookId),
    ListAuthors(ListParams),
    GetAuthor(AuthorId),
    CreateAuthor(AuthorInput),
    UpdateAuthor(AuthorId, AuthorInput),
    DeleteAuthor(AuthorId),
    ListGenres(ListParams),
    GetGenre(GenreId),
    CreateGenre(GenreInput),
    UpdateGenre(GenreId, GenreInput),
    DeleteGenre(GenreId),
}

#[derive(Debug, Error)]
pub enum MockDataError {
    /// Failed to read the JSON file with mock responses
    #[error("failed to read mock response file")]
    ReadMockFile(#[source] std::io::Error),
    /// Failed to parse the contents of the mock data file as JSON
    #[error("failed to parse mock data as JSON")]
    ParseJson(#[source] serde_json::Error),
}

/// A catalog client that can be seeded with mock responses
#[derive(Debug, Default, Clone)]
pub struct MockClient {
    pub mock_responses: MockField<VecDeque<Response>>,
    pub calls: MockField<Vec<RecordedCall>>,
}

impl MockClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a mock client serving the responses stored at `path`.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, MockDataError> {
        let contents = std::fs::read_to_string(path).map_err(MockDataError::ReadMockFile)?;
        let responses: VecDeque<Response> =
            serde_json::from_str(&contents).map_err(MockDataError::ParseJson)?;
        Ok(Self {
            mock_responses: Arc::new(Mutex::new(responses)),
            calls: Default::default(),
        })
    }

    /// Push a new response into the list of mock responses
    pub fn push_response(&self, response: Response) {
        self.mock_responses
            .lock()
            .expect("couldn't acquire mock lock")
            .push_back(response);
    }

    /// Push an API error into the list of mock responses
    pub fn push_error_response(&self, status: u16, detail: Option<&str>) {
        self.push_response(Response::Error(GenericResponse {
            status,
            detail: detail.map(ToString::to_string),
        }));
    }

    /// Number of responses not yet served.
    pub fn pending_responses(&self) -> usize {
        self.mock_responses
            .lock()
            .expect("couldn't acquire mock lock")
            .len()
    }

    /// Snapshot of the calls received so far, oldest first.
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().expect("couldn't acquire mock lock").clone()
    }

    pub fn clear_calls(&self) {
        self.calls.lock().expect("couldn't acquire mock lock").clear();
    }

    fn respond(&self, call: RecordedCall) -> Option<Response> {
        self.calls
            .lock()
            .expect("couldn't acquire mock lock")
            .push(call);
        self.mock_responses
            .lock()
            .expect("couldn't acquire mock lock")
            .pop_front()
    }
}

/// Convert a response that isn't the one an operation expected into an error.
fn unexpected(response: Option<Response>, expected: &str) -> CatalogClientError {
    match response {
        Some(Response::Error(GenericResponse { status, detail })) => match StatusCode::from_u16(status)
        {
            Ok(status) => CatalogClientError::Api { status, detail },
            Err(_) => CatalogClientError::Other(format!("invalid mock status code {status}")),
        },
        Some(Response::Unreachable) => CatalogClientError::Transport(Box::new(io::Error::new(
            io::ErrorKind::ConnectionRefused,
            "mock catalog unreachable",
        ))),
        other => CatalogClientError::Other(format!(
            "expected {expected} mock response, found {other:?}"
        )),
    }
}

impl ClientTrait for MockClient {
    async fn list_books(&self, params: &BookListParams) -> Result<BookPage, CatalogClientError> {
        match self.respond(RecordedCall::ListBooks(params.clone())) {
            Some(Response::Books(page)) => Ok(page),
            other => Err(unexpected(other, "books")),
        }
    }

    async fn get_book(&self, id: BookId) -> Result<Book, CatalogClientError> {
        match self.respond(RecordedCall::GetBook(id)) {
            Some(Response::Book(book)) => Ok(book),
            other => Err(unexpected(other, "book")),
        }
    }

    async fn create_book(&self, book: &BookInput) -> Result<Book, CatalogClientError> {
        match self.respond(RecordedCall::CreateBook(book.clone())) {
            Some(Response::Book(book)) => Ok(book),
            other => Err(unexpected(other, "book")),
        }
    }

    async fn update_book(&self, id: BookId, book: &BookInput) -> Result<Book, CatalogClientError> {
        match self.respond(RecordedCall::UpdateBook(id, book.clone())) {
            Some(Response::Book(book)) => Ok(book),
            other => Err(unexpected(other, "book")),
        }
    }

    async fn delete_book(&self, id: BookId) -> Result<(), CatalogClientError> {
        match self.respond(RecordedCall::DeleteBook(id)) {
            Some(Response::Deleted) => Ok(()),
            other => Err(unexpected(other, "deleted")),
        }
    }

    async fn list_authors(&self, params: &ListParams) -> Result<Vec<Author>, CatalogClientError> {
        match self.respond(RecordedCall::ListAuthors(params.clone())) {
            Some(Response::Authors(authors)) => Ok(authors),
            other => Err(unexpected(other, "authors")),
        }
    }

    async fn get_author(&self, id: AuthorId) -> Result<Author, CatalogClientError> {
        match self.respond(RecordedCall::GetAuthor(id)) {
            Some(Response::Author(author)) => Ok(author),
            other => Err(unexpected(other, "author")),
        }
    }

    async fn create_author(&self, author: &AuthorInput) -> Result<Author, CatalogClientError> {
        match self.respond(RecordedCall::CreateAuthor(author.clone())) {
            Some(Response::Author(author)) => Ok(author),
            other => Err(unexpected(other, "author")),
        }
    }

    async fn update_author(
        &self,
        id: AuthorId,
        author: &AuthorInput,
    ) -> Result<Author, CatalogClientError> {
        match self.respond(RecordedCall::UpdateAuthor(id, author.clone())) {
            Some(Response::Author(author)) => Ok(author),
            other => Err(unexpected(other, "author")),
        }
    }

    async fn delete_author(&self, id: AuthorId) -> Result<(), CatalogClientError> {
        match self.respond(RecordedCall::DeleteAuthor(id)) {
            Some(Response::Deleted) => Ok(()),
            other => Err(unexpected(other, "deleted")),
        }
    }

    async fn list_genres(&self, params: &ListParams) -> Result<Vec<Genre>, CatalogClientError> {
        match self.respond(RecordedCall::ListGenres(params.clone())) {
            Some(Response::Genres(genres)) => Ok(genres),
            other => Err(unexpected(other, "genres")),
        }
    }

    async fn get_genre(&self, id: GenreId) -> Result<Genre, CatalogClientError> {
        match self.respond(RecordedCall::GetGenre(id)) {
            Some(Response::Genre(genre)) => Ok(genre),
            other => Err(unexpected(other, "genre")),
        }
    }

    async fn create_genre(&self, genre: &GenreInput) -> Result<Genre, CatalogClientError> {
        match self.respond(RecordedCall::CreateGenre(genre.clone())) {
            Some(Response::Genre(genre)) => Ok(genre),
            other => Err(unexpected(other, "genre")),
        }
    }

    async fn update_genre(&self, id: GenreId, genre: &GenreInput) -> Result<Genre, CatalogClientError> {
        match self.respond(RecordedCall::UpdateGenre(id, genre.clone())) {
            Some(Response::Genre(genre)) => Ok(genre),
            other => Err(unexpected(other, "genre")),
        }
    }

    async fn delete_genre(&self, id: GenreId) -> Result<(), CatalogClientError> {
        match self.respond(RecordedCall::DeleteGenre(id)) {
            Some(Response::Deleted) => Ok(()),
            other => Err(unexpected(other, "deleted")),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use pretty_assertions::assert_eq;

    use super::*;

    #[tokio::test]
    async fn serves_responses_in_order_and_records_calls() {
        let client = MockClient::new();
        client.push_response(Response::Genres(vec![Genre {
            id: GenreId::from(1),
            name: "Essay".to_string(),
        }]));
        client.push_response(Response::Deleted);

        let genres = client.list_genres(&ListParams::default()).await.unwrap();
        client.delete_genre(GenreId::from(1)).await.unwrap();

        assert_eq!(genres[0].name, "Essay");
        assert_eq!(client.calls(), vec![
            RecordedCall::ListGenres(ListParams::default()),
            RecordedCall::DeleteGenre(GenreId::from(1)),
        ]);
        assert_eq!(client.pending_responses(), 0);
    }

    #[tokio::test]
    async fn error_responses_become_api_errors() {
        let client = MockClient::new();
        client.push_error_response(422, Some("title must not be empty"));
        client.push_response(Response::Unreachable);

        let err = client.get_author(AuthorId::from(1)).await.unwrap_err();
        assert_eq!(err.status(), Some(StatusCode::UNPROCESSABLE_ENTITY));
        assert_eq!(err.detail(), Some("title must not be empty"));

        let err = client.get_author(AuthorId::from(1)).await.unwrap_err();
        assert!(matches!(err, CatalogClientError::Transport(_)));
    }

    #[tokio::test]
    async fn mismatched_response_is_an_error() {
        let client = MockClient::new();
        client.push_response(Response::Deleted);

        let err = client.get_book(BookId::from(1)).await.unwrap_err();
        assert!(
            matches!(&err, CatalogClientError::Other(msg) if msg.contains("expected book")),
            "found: {err:?}"
        );

        let err = client.get_book(BookId::from(1)).await.unwrap_err();
        assert!(matches!(&err, CatalogClientError::Other(msg) if msg.ends_with("found None")));
    }

    #[test]
    fn reads_responses_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"[
                {{"authors": [{{"id": 1, "name": "Octavia E. Butler"}}]}},
                "deleted",
                {{"error": {{"status": 404, "detail": "Not found"}}}}
            ]"#
        )
        .unwrap();

        let client = MockClient::from_file(file.path()).unwrap();

        assert_eq!(client.pending_responses(), 3);
        assert_eq!(
            client.mock_responses.lock().unwrap().back(),
            Some(&Response::Error(GenericResponse {
                status: 404,
                detail: Some("Not found".to_string())
            }))
        );
    }
}
