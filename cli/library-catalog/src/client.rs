//! Catalog client talking to the catalog REST API.

use std::fmt::{Debug, Display};
use std::str::FromStr;

use enum_dispatch::enum_dispatch;
use reqwest::header::{self, HeaderMap};
use reqwest::{Method, RequestBuilder};
use serde::de::DeserializeOwned;
use tracing::{debug, instrument};

use crate::config::CatalogClientConfig;
use crate::error::{CatalogClientError, parse_api_error};
use crate::mock::MockClient;
use crate::types::*;

const USER_AGENT: &str = concat!("library/", env!("CARGO_PKG_VERSION"));

/// Either a client for the actual catalog service,
/// or a mock client for testing.
#[derive(Debug)]
#[enum_dispatch(ClientTrait)]
pub enum Client {
    Catalog(CatalogClient),
    Mock(MockClient),
}

/// The collections exposed by the catalog service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    Books,
    Authors,
    Genres,
}

impl Resource {
    fn path(self) -> &'static str {
        match self {
            Resource::Books => "books",
            Resource::Authors => "authors",
            Resource::Genres => "genres",
        }
    }
}

/// A client for the catalog service.
///
/// Every call is a fresh round trip:
/// there are no retries and nothing is cached.
pub struct CatalogClient {
    client: reqwest::Client,
    config: CatalogClientConfig,
}

impl Debug for CatalogClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CatalogClient")
            .field("catalog_url", &self.config.catalog_url)
            .finish_non_exhaustive()
    }
}

impl CatalogClient {
    /// Create a new catalog client from configuration.
    pub fn new(config: CatalogClientConfig) -> Result<Self, CatalogClientError> {
        let client = build_http_client(&config)?;
        Ok(Self { client, config })
    }

    /// Get the configured catalog URL.
    pub fn catalog_url(&self) -> &str {
        &self.config.catalog_url
    }

    /// `{catalog_url}/{resource}/`
    fn collection_url(&self, resource: Resource) -> String {
        format!(
            "{}/{}/",
            self.config.catalog_url.trim_end_matches('/'),
            resource.path()
        )
    }

    /// `{catalog_url}/{resource}/{id}`
    fn record_url(&self, resource: Resource, id: impl Display) -> String {
        format!(
            "{}/{}/{id}",
            self.config.catalog_url.trim_end_matches('/'),
            resource.path()
        )
    }

    fn request(&self, method: Method, url: String) -> RequestBuilder {
        self.client.request(method, url)
    }

    fn list_books_request(&self, params: &BookListParams) -> RequestBuilder {
        self.request(Method::GET, self.collection_url(Resource::Books))
            .query(params)
    }

    /// Send a request and return the response if its status is a success.
    async fn execute(&self, request: RequestBuilder) -> Result<reqwest::Response, CatalogClientError> {
        let request = request
            .build()
            .map_err(|e| CatalogClientError::Other(e.to_string()))?;
        let method = request.method().clone();
        let url = request.url().clone();

        let response = self
            .client
            .execute(request)
            .await
            .map_err(|e| CatalogClientError::Transport(Box::new(e)))?;

        debug!(%method, %url, status = %response.status(), "catalog response");

        if !response.status().is_success() {
            return Err(parse_api_error(response).await);
        }
        Ok(response)
    }

    /// Send a request and parse the JSON body of a successful response.
    async fn fetch<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, CatalogClientError> {
        self.execute(request)
            .await?
            .json::<T>()
            .await
            .map_err(|e| CatalogClientError::InvalidResponse(Box::new(e)))
    }

    async fn list<T: DeserializeOwned>(
        &self,
        resource: Resource,
        params: &ListParams,
    ) -> Result<Vec<T>, CatalogClientError> {
        self.fetch(
            self.request(Method::GET, self.collection_url(resource))
                .query(params),
        )
        .await
    }

    async fn get<T: DeserializeOwned>(
        &self,
        resource: Resource,
        id: impl Display,
    ) -> Result<T, CatalogClientError> {
        self.fetch(self.request(Method::GET, self.record_url(resource, id)))
            .await
    }

    async fn create<T: DeserializeOwned>(
        &self,
        resource: Resource,
        body: &impl serde::Serialize,
    ) -> Result<T, CatalogClientError> {
        self.fetch(
            self.request(Method::POST, self.collection_url(resource))
                .json(body),
        )
        .await
    }

    async fn update<T: DeserializeOwned>(
        &self,
        resource: Resource,
        id: impl Display,
        body: &impl serde::Serialize,
    ) -> Result<T, CatalogClientError> {
        self.fetch(
            self.request(Method::PUT, self.record_url(resource, id))
                .json(body),
        )
        .await
    }

    /// The response body of a delete is ignored,
    /// services answer with anything from `204` to the deleted record.
    async fn delete(&self, resource: Resource, id: impl Display) -> Result<(), CatalogClientError> {
        self.execute(self.request(Method::DELETE, self.record_url(resource, id)))
            .await?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Catalog trait
// ---------------------------------------------------------------------------

/// The complete catalog API interface.
///
/// One operation per resource and verb.
/// Implemented over HTTP by [`CatalogClient`]
/// and with canned responses by [`MockClient`].
#[enum_dispatch]
#[allow(async_fn_in_trait)]
pub trait ClientTrait {
    /// List one page of books matching the filters in `params`.
    async fn list_books(&self, params: &BookListParams) -> Result<BookPage, CatalogClientError>;

    async fn get_book(&self, id: BookId) -> Result<Book, CatalogClientError>;

    async fn create_book(&self, book: &BookInput) -> Result<Book, CatalogClientError>;

    /// Replace all fields of the book `id`.
    async fn update_book(&self, id: BookId, book: &BookInput) -> Result<Book, CatalogClientError>;

    async fn delete_book(&self, id: BookId) -> Result<(), CatalogClientError>;

    async fn list_authors(&self, params: &ListParams) -> Result<Vec<Author>, CatalogClientError>;

    async fn get_author(&self, id: AuthorId) -> Result<Author, CatalogClientError>;

    async fn create_author(&self, author: &AuthorInput) -> Result<Author, CatalogClientError>;

    async fn update_author(
        &self,
        id: AuthorId,
        author: &AuthorInput,
    ) -> Result<Author, CatalogClientError>;

    async fn delete_author(&self, id: AuthorId) -> Result<(), CatalogClientError>;

    async fn list_genres(&self, params: &ListParams) -> Result<Vec<Genre>, CatalogClientError>;

    async fn get_genre(&self, id: GenreId) -> Result<Genre, CatalogClientError>;

    async fn create_genre(&self, genre: &GenreInput) -> Result<Genre, CatalogClientError>;

    async fn update_genre(&self, id: GenreId, genre: &GenreInput) -> Result<Genre, CatalogClientError>;

    async fn delete_genre(&self, id: GenreId) -> Result<(), CatalogClientError>;
}

// ---------------------------------------------------------------------------
// ClientTrait implementation for CatalogClient
// ---------------------------------------------------------------------------

impl ClientTrait for CatalogClient {
    #[instrument(skip_all, fields(params = ?params))]
    async fn list_books(&self, params: &BookListParams) -> Result<BookPage, CatalogClientError> {
        let page: BookPage = self.fetch(self.list_books_request(params)).await?;
        debug!(
            n_items = page.items.len(),
            page = page.page,
            pages = page.pages,
            total = page.total,
            "received page of books"
        );
        Ok(page)
    }

    #[instrument(skip(self))]
    async fn get_book(&self, id: BookId) -> Result<Book, CatalogClientError> {
        self.get(Resource::Books, id).await
    }

    #[instrument(skip_all, fields(title = %book.title))]
    async fn create_book(&self, book: &BookInput) -> Result<Book, CatalogClientError> {
        let created: Book = self.create(Resource::Books, book).await?;
        debug!(id = %created.id, "created book");
        Ok(created)
    }

    #[instrument(skip(self, book))]
    async fn update_book(&self, id: BookId, book: &BookInput) -> Result<Book, CatalogClientError> {
        self.update(Resource::Books, id, book).await
    }

    #[instrument(skip(self))]
    async fn delete_book(&self, id: BookId) -> Result<(), CatalogClientError> {
        self.delete(Resource::Books, id).await
    }

    async fn list_authors(&self, params: &ListParams) -> Result<Vec<Author>, CatalogClientError> {
        self.list(Resource::Authors, params).await
    }

    async fn get_author(&self, id: AuthorId) -> Result<Author, CatalogClientError> {
        self.get(Resource::Authors, id).await
    }

    async fn create_author(&self, author: &AuthorInput) -> Result<Author, CatalogClientError> {
        self.create(Resource::Authors, author).await
    }

    async fn update_author(
        &self,
        id: AuthorId,
        author: &AuthorInput,
    ) -> Result<Author, CatalogClientError> {
        self.update(Resource::Authors, id, author).await
    }

    async fn delete_author(&self, id: AuthorId) -> Result<(), CatalogClientError> {
        self.delete(Resource::Authors, id).await
    }

    async fn list_genres(&self, params: &ListParams) -> Result<Vec<Genre>, CatalogClientError> {
        self.list(Resource::Genres, params).await
    }

    async fn get_genre(&self, id: GenreId) -> Result<Genre, CatalogClientError> {
        self.get(Resource::Genres, id).await
    }

    async fn create_genre(&self, genre: &GenreInput) -> Result<Genre, CatalogClientError> {
        self.create(Resource::Genres, genre).await
    }

    async fn update_genre(&self, id: GenreId, genre: &GenreInput) -> Result<Genre, CatalogClientError> {
        self.update(Resource::Genres, id, genre).await
    }

    async fn delete_genre(&self, id: GenreId) -> Result<(), CatalogClientError> {
        self.delete(Resource::Genres, id).await
    }
}

// ---------------------------------------------------------------------------
// HTTP client builder
// ---------------------------------------------------------------------------

fn build_http_client(config: &CatalogClientConfig) -> Result<reqwest::Client, CatalogClientError> {
    let mut headers = HeaderMap::new();

    headers.insert(
        header::ACCEPT,
        header::HeaderValue::from_static("application/json"),
    );
    headers.insert(
        header::CONTENT_TYPE,
        header::HeaderValue::from_static("application/json"),
    );

    for (key, value) in &config.extra_headers {
        headers.insert(
            header::HeaderName::from_str(key).map_err(
                |e: reqwest::header::InvalidHeaderName| CatalogClientError::Other(e.to_string()),
            )?,
            header::HeaderValue::from_str(value).map_err(
                |e: reqwest::header::InvalidHeaderValue| CatalogClientError::Other(e.to_string()),
            )?,
        );
    }

    debug!(
        catalog_url = %config.catalog_url,
        extra_headers = config.extra_headers.len(),
        "building catalog HTTP client"
    );

    reqwest::Client::builder()
        .default_headers(headers)
        .user_agent(config.user_agent.as_deref().unwrap_or(USER_AGENT))
        .connect_timeout(config.connect_timeout)
        .timeout(config.request_timeout)
        .build()
        .map_err(|e| CatalogClientError::Other(e.to_string()))
}
