//! List, filter and paginate books.
//!
//! [ListState] is a plain value with pure transitions.
//! Every transition that needs a round trip returns the [LoadRequest] to issue,
//! stamped with a sequence number.
//! Responses are applied only if they answer the most recent request,
//! so a slow response can't clobber the result of a later one.
//!
//! [ListController] drives the transitions against a catalog client.

use std::num::NonZeroU32;

use library_catalog::{AuthorId, Book, BookId, BookListParams, BookPage, CatalogClientError, ClientTrait, GenreId};
use tracing::{debug, instrument};

pub const FIRST_PAGE: u32 = 1;
pub const DEFAULT_PAGE_SIZE: NonZeroU32 = NonZeroU32::new(10).unwrap();

const LOAD_FAILED: &str = "failed to load books";
const DELETE_FAILED: &str = "failed to delete book";

/// Optional constraints narrowing a book listing.
///
/// Absent fields don't constrain the listing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterCriteria {
    /// Substring of the title
    pub title: Option<String>,
    pub author_id: Option<AuthorId>,
    pub genre_id: Option<GenreId>,
    /// Exact publication year
    pub publication_year: Option<i32>,
}

impl FilterCriteria {
    /// Drop values that would not constrain a listing, i.e. blank titles.
    pub fn normalized(self) -> Self {
        Self {
            title: self
                .title
                .map(|title| title.trim().to_string())
                .filter(|title| !title.is_empty()),
            ..self
        }
    }

    fn to_params(&self, skip: u64, limit: u32) -> BookListParams {
        BookListParams {
            skip: Some(skip),
            limit: Some(limit),
            title: self.title.clone(),
            author_id: self.author_id,
            genre_id: self.genre_id,
            publication_year: self.publication_year,
        }
    }
}

/// Position within a paginated listing, as last reported by the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    /// 1-based page number
    pub page: u32,
    pub limit: u32,
    pub total: u64,
    pub pages: u32,
}

impl PageWindow {
    /// The window before any response has been received.
    pub fn new(page_size: NonZeroU32) -> Self {
        Self {
            page: FIRST_PAGE,
            limit: page_size.get(),
            total: 0,
            pages: 0,
        }
    }

    /// Whether `page` is a page the service reported.
    pub fn contains(&self, page: u32) -> bool {
        (FIRST_PAGE..=self.pages).contains(&page)
    }

    pub fn has_next(&self) -> bool {
        self.page < self.pages
    }

    fn skip_for(&self, page: u32) -> u64 {
        u64::from(page.saturating_sub(1)) * u64::from(self.limit)
    }
}

impl Default for PageWindow {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE_SIZE)
    }
}

impl From<&BookPage> for PageWindow {
    fn from(page: &BookPage) -> Self {
        Self {
            page: page.page,
            limit: page.limit,
            total: page.total,
            pages: page.pages,
        }
    }
}

/// Sequence number of a list request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct RequestSeq(u64);

impl RequestSeq {
    fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

/// A list request to send to the catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadRequest {
    pub seq: RequestSeq,
    pub params: BookListParams,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListState {
    pub filter: FilterCriteria,
    pub window: PageWindow,
    /// Books of the last successful load
    pub books: Vec<Book>,
    pub loading: bool,
    pub error: Option<String>,
    latest: RequestSeq,
}

impl ListState {
    pub fn new(page_size: NonZeroU32) -> Self {
        Self {
            window: PageWindow::new(page_size),
            ..Default::default()
        }
    }

    /// Start loading `page` with the current filter.
    ///
    /// Clears the error, keeps the current books until the response arrives.
    pub fn load(self, page: u32) -> (Self, LoadRequest) {
        let seq = self.latest.next();
        let params = self
            .filter
            .to_params(self.window.skip_for(page), self.window.limit);

        let state = Self {
            loading: true,
            error: None,
            latest: seq,
            ..self
        };
        (state, LoadRequest { seq, params })
    }

    /// Replace the filter and start loading the first page.
    pub fn apply_filter(self, criteria: FilterCriteria) -> (Self, LoadRequest) {
        Self {
            filter: criteria.normalized(),
            ..self
        }
        .load(FIRST_PAGE)
    }

    /// Start loading `page` if the service reported it, otherwise do nothing.
    pub fn change_page(self, page: u32) -> (Self, Option<LoadRequest>) {
        if !self.window.contains(page) {
            debug!(page, pages = self.window.pages, "ignoring page change out of range");
            return (self, None);
        }
        let (state, request) = self.load(page);
        (state, Some(request))
    }

    /// Whether `seq` belongs to the most recently issued request.
    pub fn is_latest(&self, seq: RequestSeq) -> bool {
        seq == self.latest
    }

    /// Apply a page of books, unless a newer request has been issued since.
    pub fn load_succeeded(self, seq: RequestSeq, page: BookPage) -> Self {
        if !self.is_latest(seq) {
            debug!(?seq, latest = ?self.latest, "discarding stale list response");
            return self;
        }
        Self {
            window: PageWindow::from(&page),
            books: page.items,
            loading: false,
            ..self
        }
    }

    /// Record a failed load, unless a newer request has been issued since.
    ///
    /// The previous books stay in place.
    pub fn load_failed(self, seq: RequestSeq, message: String) -> Self {
        if !self.is_latest(seq) {
            debug!(?seq, latest = ?self.latest, "discarding stale list error");
            return self;
        }
        Self {
            loading: false,
            error: Some(message),
            ..self
        }
    }

    pub fn delete_failed(self, message: String) -> Self {
        Self {
            error: Some(message),
            ..self
        }
    }
}

/// Drives a [ListState] against a catalog client.
#[derive(Debug)]
pub struct ListController<'a, C> {
    client: &'a C,
    state: ListState,
}

impl<'a, C: ClientTrait> ListController<'a, C> {
    pub fn new(client: &'a C, page_size: NonZeroU32) -> Self {
        Self {
            client,
            state: ListState::new(page_size),
        }
    }

    pub fn state(&self) -> &ListState {
        &self.state
    }

    fn transition(&mut self, f: impl FnOnce(ListState) -> ListState) {
        self.state = f(std::mem::take(&mut self.state));
    }

    async fn send(&mut self, request: LoadRequest) {
        let result = self.client.list_books(&request.params).await;
        match result {
            Ok(page) => self.transition(|state| state.load_succeeded(request.seq, page)),
            Err(err) => {
                debug!(%err, "listing books failed");
                let message = err.user_message(LOAD_FAILED);
                self.transition(|state| state.load_failed(request.seq, message));
            },
        }
    }

    /// Load `page` with the current filter.
    #[instrument(skip(self))]
    pub async fn load(&mut self, page: u32) {
        let (state, request) = std::mem::take(&mut self.state).load(page);
        self.state = state;
        self.send(request).await;
    }

    /// Replace the filter and load the first page.
    #[instrument(skip(self))]
    pub async fn apply_filter(&mut self, criteria: FilterCriteria) {
        let (state, request) = std::mem::take(&mut self.state).apply_filter(criteria);
        self.state = state;
        self.send(request).await;
    }

    /// Load `page` if it is within the current window.
    ///
    /// Returns whether a request was issued.
    #[instrument(skip(self))]
    pub async fn change_page(&mut self, page: u32) -> bool {
        let (state, request) = std::mem::take(&mut self.state).change_page(page);
        self.state = state;
        match request {
            Some(request) => {
                self.send(request).await;
                true
            },
            None => false,
        }
    }

    /// Delete a book and reload the current page.
    ///
    /// The page is reloaded rather than patched locally,
    /// the service decides how the window changes.
    /// Nothing is reloaded if the delete fails.
    #[instrument(skip(self))]
    pub async fn delete_record(&mut self, id: BookId) -> Result<(), CatalogClientError> {
        if let Err(err) = self.client.delete_book(id).await {
            let message = err.user_message(DELETE_FAILED);
            self.transition(|state| state.delete_failed(message));
            return Err(err);
        }
        debug!(%id, "deleted book, reloading page");
        self.load(self.state.window.page).await;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use library_catalog::{MockClient, RecordedCall, Response};
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    use super::*;
    use crate::controllers::tests::{book, book_page};

    fn params(skip: u64, limit: u32) -> BookListParams {
        BookListParams {
            skip: Some(skip),
            limit: Some(limit),
            ..Default::default()
        }
    }

    /// A state that has received page `page` of `pages`.
    fn state_at(page: u32, pages: u32) -> ListState {
        let (state, request) = ListState::default().load(page);
        state.load_succeeded(request.seq, book_page(vec![book(1, "Dune")], page, 10, 23, pages))
    }

    #[test]
    fn initial_state_is_first_page_with_zero_totals() {
        let state = ListState::new(DEFAULT_PAGE_SIZE);
        assert_eq!(state.window, PageWindow {
            page: 1,
            limit: 10,
            total: 0,
            pages: 0
        });
        assert!(state.books.is_empty());
        assert!(!state.loading);
    }

    #[test]
    fn load_computes_offset_from_page() {
        let (state, request) = ListState::default().load(3);
        assert!(state.loading);
        assert_eq!(request.params, params(20, 10));
    }

    #[test]
    fn empty_filter_sends_only_pagination() {
        let state = state_at(2, 3);
        let (_, request) = state.apply_filter(FilterCriteria {
            title: Some("   ".to_string()),
            ..Default::default()
        });
        assert_eq!(request.params, params(0, 10));
    }

    #[test]
    fn year_zero_is_forwarded() {
        let (_, request) = ListState::default().apply_filter(FilterCriteria {
            publication_year: Some(0),
            ..Default::default()
        });
        assert_eq!(request.params, BookListParams {
            publication_year: Some(0),
            ..params(0, 10)
        });
    }

    #[test]
    fn response_replaces_books_and_window() {
        let state = state_at(1, 3);
        assert_eq!(state.window, PageWindow {
            page: 1,
            limit: 10,
            total: 23,
            pages: 3
        });
        assert_eq!(state.books.len(), 1);
        assert!(!state.loading);
        assert!(state.window.has_next());
    }

    #[test]
    fn change_page_out_of_range_is_a_no_op() {
        let state = state_at(1, 3);
        for page in [0, 4, u32::MAX] {
            let (next, request) = state.clone().change_page(page);
            assert_eq!(request, None);
            assert_eq!(next, state);
        }
    }

    #[test]
    fn change_page_before_first_response_is_a_no_op() {
        let (state, request) = ListState::default().change_page(1);
        assert_eq!(request, None);
        assert_eq!(state, ListState::default());
    }

    #[test]
    fn change_page_keeps_filter() {
        let (state, request) = state_at(1, 3).apply_filter(FilterCriteria {
            author_id: Some(AuthorId::from(4)),
            ..Default::default()
        });
        let state = state.load_succeeded(
            request.seq,
            book_page(vec![book(1, "Dune")], 1, 10, 23, 3),
        );

        let (_, request) = state.change_page(2);
        assert_eq!(request.unwrap().params, BookListParams {
            author_id: Some(AuthorId::from(4)),
            ..params(10, 10)
        });
    }

    #[test]
    fn stale_response_is_discarded() {
        let state = state_at(1, 3);
        let (state, slow) = state.change_page(2);
        let (state, fast) = state.change_page(3);
        let (slow, fast) = (slow.unwrap(), fast.unwrap());

        let state = state.load_succeeded(fast.seq, book_page(vec![book(21, "Ubik")], 3, 10, 23, 3));
        let after_fast = state.clone();
        let state = state.load_succeeded(slow.seq, book_page(vec![book(11, "Emma")], 2, 10, 23, 3));

        assert_eq!(state, after_fast);
        assert_eq!(state.window.page, 3);
        assert_eq!(state.books[0].title, "Ubik");
    }

    #[test]
    fn stale_error_is_discarded_and_loading_stays_set() {
        let state = state_at(1, 3);
        let (state, first) = state.change_page(2);
        let (state, _second) = state.change_page(3);

        let state = state.load_failed(first.unwrap().seq, "boom".to_string());
        assert_eq!(state.error, None);
        assert!(state.loading);
    }

    #[test]
    fn failure_keeps_previous_books() {
        let state = state_at(1, 3);
        let (state, request) = state.change_page(2);
        let state = state.load_failed(request.unwrap().seq, "failed to load books".to_string());

        assert_eq!(state.error.as_deref(), Some("failed to load books"));
        assert_eq!(state.books.len(), 1);
        assert_eq!(state.window.page, 1);
        assert!(!state.loading);
    }

    #[test]
    fn load_clears_previous_error() {
        let state = state_at(1, 3).delete_failed("nope".to_string());
        let (state, _) = state.load(1);
        assert_eq!(state.error, None);
    }

    proptest! {
        /// Exactly the non-empty criteria are forwarded, always from the first page.
        #[test]
        fn filter_forwards_only_present_fields(
            title in proptest::option::of("[ a-z]{0,8}"),
            author in proptest::option::of(1..100_i64),
            genre in proptest::option::of(1..100_i64),
            year in proptest::option::of(0..2100_i32),
            prior_page in 1..4_u32,
        ) {
            let criteria = FilterCriteria {
                title: title.clone(),
                author_id: author.map(AuthorId::from),
                genre_id: genre.map(GenreId::from),
                publication_year: year,
            };
            let (state, request) = state_at(prior_page, 3).apply_filter(criteria);

            let expected_title = title
                .map(|t| t.trim().to_string())
                .filter(|t| !t.is_empty());
            prop_assert_eq!(request.params, BookListParams {
                skip: Some(0),
                limit: Some(10),
                title: expected_title,
                author_id: author.map(AuthorId::from),
                genre_id: genre.map(GenreId::from),
                publication_year: year,
            });
            prop_assert!(state.loading);
        }
    }

    // region: controller

    #[tokio::test]
    async fn next_page_requests_following_offset() {
        let client = MockClient::new();
        client.push_response(Response::Books(book_page(
            (1..=10).map(|i| book(i, "Book")).collect(),
            1,
            10,
            23,
            3,
        )));
        client.push_response(Response::Books(book_page(
            (11..=20).map(|i| book(i, "Book")).collect(),
            2,
            10,
            23,
            3,
        )));

        let mut controller = ListController::new(&client, DEFAULT_PAGE_SIZE);
        controller.load(FIRST_PAGE).await;
        assert_eq!(controller.state().window.pages, 3);

        assert!(controller.change_page(2).await);
        assert_eq!(client.calls(), vec![
            RecordedCall::ListBooks(params(0, 10)),
            RecordedCall::ListBooks(params(10, 10)),
        ]);
        assert_eq!(controller.state().window.page, 2);
    }

    #[tokio::test]
    async fn invalid_page_change_issues_no_request() {
        let client = MockClient::new();
        client.push_response(Response::Books(book_page(vec![book(1, "Dune")], 1, 10, 1, 1)));

        let mut controller = ListController::new(&client, DEFAULT_PAGE_SIZE);
        controller.load(FIRST_PAGE).await;
        client.clear_calls();

        assert!(!controller.change_page(2).await);
        assert!(!controller.change_page(0).await);
        assert!(client.calls().is_empty());
    }

    #[tokio::test]
    async fn filter_resets_to_first_page() {
        let client = MockClient::new();
        client.push_response(Response::Books(book_page(vec![book(1, "Dune")], 3, 10, 23, 3)));
        client.push_response(Response::Books(book_page(vec![book(1, "Dune")], 1, 10, 1, 1)));

        let mut controller = ListController::new(&client, DEFAULT_PAGE_SIZE);
        controller.load(3).await;
        controller
            .apply_filter(FilterCriteria {
                title: Some("dune".to_string()),
                ..Default::default()
            })
            .await;

        assert_eq!(client.calls()[1], RecordedCall::ListBooks(BookListParams {
            title: Some("dune".to_string()),
            ..params(0, 10)
        }));
        assert_eq!(controller.state().window.page, 1);
    }

    #[tokio::test]
    async fn delete_reloads_current_page_once() {
        let client = MockClient::new();
        client.push_response(Response::Books(book_page(vec![book(21, "Ubik")], 3, 10, 21, 3)));
        client.push_response(Response::Deleted);
        // the service renumbers, the last page is gone
        client.push_response(Response::Books(book_page(vec![], 3, 10, 20, 2)));

        let mut controller = ListController::new(&client, DEFAULT_PAGE_SIZE);
        controller.load(3).await;
        controller.delete_record(BookId::from(21)).await.unwrap();

        assert_eq!(client.calls(), vec![
            RecordedCall::ListBooks(params(20, 10)),
            RecordedCall::DeleteBook(BookId::from(21)),
            RecordedCall::ListBooks(params(20, 10)),
        ]);
        // no local clamping, the window is what the service said
        assert_eq!(controller.state().window, PageWindow {
            page: 3,
            limit: 10,
            total: 20,
            pages: 2
        });
        assert!(controller.state().books.is_empty());
    }

    #[tokio::test]
    async fn failed_delete_does_not_reload() {
        let client = MockClient::new();
        client.push_response(Response::Books(book_page(vec![book(1, "Dune")], 1, 10, 1, 1)));
        client.push_error_response(500, None);

        let mut controller = ListController::new(&client, DEFAULT_PAGE_SIZE);
        controller.load(FIRST_PAGE).await;
        let result = controller.delete_record(BookId::from(1)).await;

        assert!(result.is_err());
        assert_eq!(client.calls().len(), 2);
        assert_eq!(client.pending_responses(), 0);
        assert_eq!(controller.state().error.as_deref(), Some("failed to delete book"));
        assert_eq!(controller.state().books.len(), 1);
    }

    #[tokio::test]
    async fn load_failure_surfaces_service_detail() {
        let client = MockClient::new();
        client.push_error_response(503, Some("catalog is under maintenance"));

        let mut controller = ListController::new(&client, DEFAULT_PAGE_SIZE);
        controller.load(FIRST_PAGE).await;

        assert_eq!(
            controller.state().error.as_deref(),
            Some("catalog is under maintenance")
        );
        assert!(!controller.state().loading);
    }

    // endregion
}
