//! Error taxonomy shared by the HTTP adapter, resource layer, cache and session.

use thiserror::Error;

/// Errors surfaced by every layer of the admin client.
///
/// `Clone` so a single in-flight fetch can hand the same outcome to every
/// caller waiting on it.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ApiError {
  /// Transport failure, no response received
  #[error("network error: {0}")]
  Network(String),

  /// Non-2xx response other than 401
  #[error("HTTP {status}: {body}")]
  Http { status: u16, body: String },

  /// 404 on a by-id lookup
  #[error("not found")]
  NotFound,

  /// 401 from the backend, or a login for a non-admin identity
  #[error("not authorized: {0}")]
  NotAuthorized(String),

  /// Malformed input caught before dispatch
  #[error("invalid input: {0}")]
  Validation(String),

  /// Response body did not match the expected shape
  #[error("failed to decode response: {0}")]
  Decode(String),

  /// Durable token storage failed
  #[error("token storage error: {0}")]
  Storage(String),
}

impl ApiError {
  pub fn is_not_found(&self) -> bool {
    matches!(self, ApiError::NotFound)
  }

  pub fn is_not_authorized(&self) -> bool {
    matches!(self, ApiError::NotAuthorized(_))
  }

  /// HTTP status carried by the error, if it came from a response.
  pub fn status(&self) -> Option<u16> {
    match self {
      ApiError::Http { status, .. } => Some(*status),
      ApiError::NotFound => Some(404),
      _ => None,
    }
  }
}

impl From<serde_json::Error> for ApiError {
  fn from(e: serde_json::Error) -> Self {
    ApiError::Decode(e.to_string())
  }
}

pub type Result<T, E = ApiError> = std::result::Result<T, E>;
