//! Create and edit form for books.
//!
//! The form holds a [Draft] that is only turned into a [BookInput] on submit,
//! after validation.
//! Whatever goes wrong, loading reference data, validation or saving,
//! ends up in the single [FormState::error] slot and leaves the draft alone.

use library_catalog::{
    Author,
    AuthorId,
    Book,
    BookId,
    BookInput,
    CatalogClientError,
    ClientTrait,
    Genre,
    GenreId,
    ListParams,
};
use thiserror::Error;
use tracing::{debug, instrument};

pub const MIN_PUBLICATION_YEAR: i32 = 1000;
pub const MAX_PUBLICATION_YEAR: i32 = 2100;

const REFERENCES_FAILED: &str = "failed to load authors and genres";
const RECORD_FAILED: &str = "failed to load book data";
const SAVE_FAILED: &str = "an error occurred while saving the book";

/// A book as it is being edited, not yet validated.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Draft {
    pub title: String,
    pub isbn: Option<String>,
    pub publication_year: Option<i32>,
    pub page_count: Option<u32>,
    pub description: Option<String>,
    pub author_id: Option<AuthorId>,
    pub genre_id: Option<GenreId>,
}

/// A single edit to a [Draft].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DraftField {
    Title(String),
    Isbn(Option<String>),
    PublicationYear(Option<i32>),
    PageCount(Option<u32>),
    Description(Option<String>),
    Author(Option<AuthorId>),
    Genre(Option<GenreId>),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DraftError {
    #[error("title is required")]
    MissingTitle,
    #[error("author is required")]
    MissingAuthor,
    #[error("genre is required")]
    MissingGenre,
    #[error("publication year must be between 1000 and 2100, got {0}")]
    PublicationYearOutOfRange(i32),
    #[error("page count must be positive")]
    PageCountNotPositive,
}

impl Draft {
    /// Merge one field into the draft.
    pub fn with(self, field: DraftField) -> Self {
        match field {
            DraftField::Title(title) => Self { title, ..self },
            DraftField::Isbn(isbn) => Self { isbn, ..self },
            DraftField::PublicationYear(publication_year) => Self {
                publication_year,
                ..self
            },
            DraftField::PageCount(page_count) => Self { page_count, ..self },
            DraftField::Description(description) => Self {
                description,
                ..self
            },
            DraftField::Author(author_id) => Self { author_id, ..self },
            DraftField::Genre(genre_id) => Self { genre_id, ..self },
        }
    }

    /// Check the draft and build the body to send.
    ///
    /// Blank optional text fields are sent as absent.
    pub fn validate(&self) -> Result<BookInput, DraftError> {
        if self.title.trim().is_empty() {
            return Err(DraftError::MissingTitle);
        }
        let author_id = self.author_id.ok_or(DraftError::MissingAuthor)?;
        let genre_id = self.genre_id.ok_or(DraftError::MissingGenre)?;

        if let Some(year) = self.publication_year {
            if !(MIN_PUBLICATION_YEAR..=MAX_PUBLICATION_YEAR).contains(&year) {
                return Err(DraftError::PublicationYearOutOfRange(year));
            }
        }
        if self.page_count == Some(0) {
            return Err(DraftError::PageCountNotPositive);
        }

        Ok(BookInput {
            title: self.title.clone(),
            isbn: non_blank(&self.isbn),
            publication_year: self.publication_year,
            page_count: self.page_count,
            description: non_blank(&self.description),
            author_id,
            genre_id,
        })
    }
}

fn non_blank(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(ToString::to_string)
}

impl From<&Book> for Draft {
    fn from(book: &Book) -> Self {
        Self {
            title: book.title.clone(),
            isbn: book.isbn.clone(),
            publication_year: book.publication_year,
            page_count: book.page_count,
            description: book.description.clone(),
            author_id: Some(book.author_id),
            genre_id: Some(book.genre_id),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FormPhase {
    #[default]
    Idle,
    LoadingRecord,
    Submitting,
}

/// The request a submit turns into.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Submission {
    Create(BookInput),
    Update(BookId, BookInput),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormState {
    /// The book being edited, `None` when creating
    pub record_id: Option<BookId>,
    pub draft: Draft,
    pub authors: Vec<Author>,
    pub genres: Vec<Genre>,
    pub phase: FormPhase,
    pub error: Option<String>,
}

impl FormState {
    pub fn new(record_id: Option<BookId>) -> Self {
        Self {
            record_id,
            phase: if record_id.is_some() {
                FormPhase::LoadingRecord
            } else {
                FormPhase::Idle
            },
            ..Default::default()
        }
    }

    pub fn references_loaded(
        self,
        result: Result<(Vec<Author>, Vec<Genre>), CatalogClientError>,
    ) -> Self {
        match result {
            Ok((authors, genres)) => Self {
                authors,
                genres,
                ..self
            },
            Err(err) => Self {
                error: Some(err.user_message(REFERENCES_FAILED)),
                ..self
            },
        }
    }

    /// Replace the draft with the loaded book.
    pub fn record_loaded(self, result: Result<Book, CatalogClientError>) -> Self {
        match result {
            Ok(book) => Self {
                draft: Draft::from(&book),
                phase: FormPhase::Idle,
                ..self
            },
            Err(err) => Self {
                error: Some(err.user_message(RECORD_FAILED)),
                phase: FormPhase::Idle,
                ..self
            },
        }
    }

    pub fn update_field(self, field: DraftField) -> Self {
        Self {
            draft: self.draft.with(field),
            ..self
        }
    }

    /// Validate the draft and start submitting it.
    ///
    /// On a validation error no submission is returned
    /// and the error is recorded.
    pub fn begin_submit(self) -> (Self, Option<Submission>) {
        let input = match self.draft.validate() {
            Ok(input) => input,
            Err(err) => {
                let state = Self {
                    error: Some(err.to_string()),
                    ..self
                };
                return (state, None);
            },
        };

        let submission = match self.record_id {
            Some(id) => Submission::Update(id, input),
            None => Submission::Create(input),
        };
        let state = Self {
            phase: FormPhase::Submitting,
            error: None,
            ..self
        };
        (state, Some(submission))
    }

    pub fn submit_succeeded(self) -> Self {
        Self {
            phase: FormPhase::Idle,
            error: None,
            ..self
        }
    }

    pub fn submit_failed(self, err: &CatalogClientError) -> Self {
        Self {
            phase: FormPhase::Idle,
            error: Some(err.user_message(SAVE_FAILED)),
            ..self
        }
    }

    /// Name of the draft's author, if it is one of the loaded authors.
    pub fn author_name(&self) -> Option<&str> {
        let id = self.draft.author_id?;
        self.authors
            .iter()
            .find(|author| author.id == id)
            .map(|author| author.name.as_str())
    }

    /// Name of the draft's genre, if it is one of the loaded genres.
    pub fn genre_name(&self) -> Option<&str> {
        let id = self.draft.genre_id?;
        self.genres
            .iter()
            .find(|genre| genre.id == id)
            .map(|genre| genre.name.as_str())
    }
}

/// Drives a [FormState] against a catalog client.
#[derive(Debug)]
pub struct FormController<'a, C> {
    client: &'a C,
    state: FormState,
}

impl<'a, C: ClientTrait> FormController<'a, C> {
    pub fn new(client: &'a C, record_id: Option<BookId>) -> Self {
        Self {
            client,
            state: FormState::new(record_id),
        }
    }

    pub fn state(&self) -> &FormState {
        &self.state
    }

    fn transition(&mut self, f: impl FnOnce(FormState) -> FormState) {
        self.state = f(std::mem::take(&mut self.state));
    }

    /// Load authors, genres and, when editing, the book.
    ///
    /// All three are requested at once.
    /// Authors and genres succeed or fail together.
    #[instrument(skip(self), fields(record_id = ?self.state.record_id))]
    pub async fn initialize(&mut self) {
        let params = ListParams::default();
        let references = async {
            futures::try_join!(
                self.client.list_authors(&params),
                self.client.list_genres(&params)
            )
        };
        let record = async {
            match self.state.record_id {
                Some(id) => Some(self.client.get_book(id).await),
                None => None,
            }
        };

        let (references, record) = futures::join!(references, record);

        if let Err(err) = &references {
            debug!(%err, "loading authors and genres failed");
        }
        self.transition(|state| state.references_loaded(references));
        if let Some(record) = record {
            self.transition(|state| state.record_loaded(record));
        }
    }

    pub fn update_field(&mut self, field: DraftField) {
        self.transition(|state| state.update_field(field));
    }

    /// Validate and save the draft.
    ///
    /// `on_complete` runs with the saved book on success.
    /// Returns whether the book was saved,
    /// on failure the reason is in the state's error.
    #[instrument(skip_all, fields(record_id = ?self.state.record_id))]
    pub async fn submit(&mut self, on_complete: impl FnOnce(&Book)) -> bool {
        let (state, submission) = std::mem::take(&mut self.state).begin_submit();
        self.state = state;
        let Some(submission) = submission else {
            debug!(error = ?self.state.error, "draft failed validation");
            return false;
        };

        let result = match &submission {
            Submission::Create(input) => self.client.create_book(input).await,
            Submission::Update(id, input) => self.client.update_book(*id, input).await,
        };

        match result {
            Ok(book) => {
                self.transition(FormState::submit_succeeded);
                on_complete(&book);
                true
            },
            Err(err) => {
                debug!(%err, "saving book failed");
                self.transition(|state| state.submit_failed(&err));
                false
            },
        }
    }
}
