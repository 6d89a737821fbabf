//! Error handling for catalog API operations.

use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

type BoxedError = Box<dyn std::error::Error + Send + Sync>;

/// Body of an error response as sent by the catalog service.
///
/// `detail` is usually a string, but validation errors carry a list of
/// objects instead.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ErrorResponse {
    #[serde(default)]
    pub detail: Option<Value>,
}

impl ErrorResponse {
    /// The detail as a message fit to show to a user.
    ///
    /// String details are returned verbatim,
    /// anything else is rendered as compact JSON.
    pub fn message(&self) -> Option<String> {
        match self.detail.as_ref()? {
            Value::Null => None,
            Value::String(detail) => Some(detail.clone()),
            other => Some(other.to_string()),
        }
    }
}

/// Common error type for catalog API operations.
#[derive(Debug, Error)]
pub enum CatalogClientError {
    /// No response was received, e.g. the service is unreachable or timed out.
    #[error("could not reach the catalog service")]
    Transport(#[source] BoxedError),
    /// The service responded with a non-success status.
    #[error("{}", fmt_api_error(.status, .detail))]
    Api {
        status: StatusCode,
        detail: Option<String>,
    },
    /// The service responded with success but the body could not be parsed.
    #[error("invalid response from the catalog service")]
    InvalidResponse(#[source] BoxedError),
    #[error("{0}")]
    Other(String),
}

impl CatalogClientError {
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            CatalogClientError::Api { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// The detail message supplied by the service, if any.
    pub fn detail(&self) -> Option<&str> {
        match self {
            CatalogClientError::Api { detail, .. } => detail.as_deref(),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(StatusCode::NOT_FOUND)
    }

    /// The message to show a user: the service's detail when present,
    /// `fallback` otherwise.
    pub fn user_message(&self, fallback: &str) -> String {
        self.detail()
            .map(ToString::to_string)
            .unwrap_or_else(|| fallback.to_string())
    }
}

/// Turn a non-success response into a [CatalogClientError::Api].
///
/// A body that isn't an [ErrorResponse] is dropped,
/// it may well be an HTML error page from a proxy.
pub(crate) async fn parse_api_error(response: reqwest::Response) -> CatalogClientError {
    let status = response.status();
    let detail = match response.bytes().await {
        Ok(body) => serde_json::from_slice::<ErrorResponse>(&body)
            .ok()
            .and_then(|error_response| error_response.message()),
        Err(_) => None,
    };

    CatalogClientError::Api { status, detail }
}

fn fmt_api_error(status: &StatusCode, detail: &Option<String>) -> String {
    match detail {
        Some(detail) => format!("{status}: {detail}"),
        None => format!("{status}"),
    }
}
