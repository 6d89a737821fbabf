//! Show a single book and delete it.

use library_catalog::{Book, BookId, CatalogClientError, ClientTrait};
use tracing::{debug, instrument};

const LOAD_FAILED: &str = "failed to load book details";
const DELETE_FAILED: &str = "failed to delete book";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetailState {
    pub book_id: BookId,
    pub book: Option<Book>,
    pub loading: bool,
    /// Set when the service reported no book with [DetailState::book_id].
    pub not_found: bool,
    pub error: Option<String>,
}

impl DetailState {
    pub fn new(book_id: BookId) -> Self {
        Self {
            book_id,
            book: None,
            loading: true,
            not_found: false,
            error: None,
        }
    }

    pub fn loaded(self, result: Result<Book, CatalogClientError>) -> Self {
        match result {
            Ok(book) => Self {
                book: Some(book),
                loading: false,
                not_found: false,
                error: None,
                ..self
            },
            Err(err) if err.is_not_found() => Self {
                book: None,
                loading: false,
                not_found: true,
                error: None,
                ..self
            },
            Err(err) => Self {
                loading: false,
                error: Some(err.user_message(LOAD_FAILED)),
                ..self
            },
        }
    }

    pub fn delete_failed(self, err: &CatalogClientError) -> Self {
        Self {
            error: Some(err.user_message(DELETE_FAILED)),
            ..self
        }
    }
}

/// What the caller should do after a delete attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    /// The book is gone, move away from it.
    Deleted,
    /// Confirmation was declined, nothing changed.
    Cancelled,
    /// The delete failed, the reason is in the state's error.
    Failed,
}

#[derive(Debug)]
pub struct DetailController<'a, C> {
    client: &'a C,
    state: DetailState,
}

impl<'a, C: ClientTrait> DetailController<'a, C> {
    pub fn new(client: &'a C, book_id: BookId) -> Self {
        Self {
            client,
            state: DetailState::new(book_id),
        }
    }

    pub fn state(&self) -> &DetailState {
        &self.state
    }

    pub fn into_state(self) -> DetailState {
        self.state
    }

    #[instrument(skip(self), fields(book_id = %self.state.book_id))]
    pub async fn load(&mut self) {
        let result = self.client.get_book(self.state.book_id).await;
        self.state = self.state.clone().loaded(result);
    }

    /// Delete the book once `confirm` agrees.
    ///
    /// `confirm` is asked before anything is sent.
    #[instrument(skip_all, fields(book_id = %self.state.book_id))]
    pub async fn delete(&mut self, confirm: impl FnOnce(&DetailState) -> bool) -> DeleteOutcome {
        if !confirm(&self.state) {
            debug!("delete not confirmed");
            return DeleteOutcome::Cancelled;
        }

        match self.client.delete_book(self.state.book_id).await {
            Ok(()) => DeleteOutcome::Deleted,
            Err(err) => {
                debug!(%err, "deleting book failed");
                self.state = self.state.clone().delete_failed(&err);
                DeleteOutcome::Failed
            },
        }
    }
}
