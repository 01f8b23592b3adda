//! The single request pipeline every resource call goes through.

use serde::de::DeserializeOwned;
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::sync::Arc;
use tracing::{debug, warn};

use super::transport::{ApiPath, ApiRequest, Method, Transport};
use crate::error::{ApiError, Result};
use crate::session::SessionHandle;

/// HTTP client adapter.
///
/// Attaches the stored bearer token to every request and tears the session
/// down on 401. Errors are always returned to the caller; nothing is retried.
#[derive(Clone)]
pub struct HttpClient {
  transport: Arc<dyn Transport>,
  session: SessionHandle,
}

impl HttpClient {
  pub fn new(transport: Arc<dyn Transport>, session: SessionHandle) -> Self {
    Self { transport, session }
  }

  pub fn session(&self) -> &SessionHandle {
    &self.session
  }

  /// Send a request and return the decoded JSON body.
  ///
  /// An empty success body decodes as `null`.
  pub async fn request(
    &self,
    method: Method,
    path: &ApiPath,
    query: &[(&str, String)],
    body: Option<Value>,
  ) -> Result<Value> {
    let bearer = self.session.token()?;
    if let Some(token) = &bearer {
      debug!(%method, %path, token = %fingerprint(token), "sending request");
    } else {
      debug!(%method, %path, "sending request without token");
    }

    let request = ApiRequest {
      method,
      path: path.clone(),
      query: query
        .iter()
        .map(|(k, v)| (k.to_string(), v.clone()))
        .collect(),
      body,
      bearer,
    };

    let response = self.transport.send(request).await?;
    debug!(%method, %path, status = response.status, "received response");

    if response.status == 401 {
      // Forced teardown happens whether or not the caller handles the error
      self.session.expire();
      return Err(ApiError::NotAuthorized(non_empty_or(
        response.body,
        "session expired",
      )));
    }

    if !response.is_success() {
      warn!(%method, %path, status = response.status, "request failed");
      return Err(ApiError::Http {
        status: response.status,
        body: response.body,
      });
    }

    if response.body.trim().is_empty() {
      return Ok(Value::Null);
    }

    serde_json::from_str(&response.body)
      .map_err(|e| ApiError::Decode(format!("{} {}: {}", method, path, e)))
  }

  /// Send a request and deserialize the body into `T`.
  pub async fn request_json<T: DeserializeOwned>(
    &self,
    method: Method,
    path: &ApiPath,
    query: &[(&str, String)],
    body: Option<Value>,
  ) -> Result<T> {
    let value = self.request(method, path, query, body).await?;
    serde_json::from_value(value)
      .map_err(|e| ApiError::Decode(format!("{} {}: {}", method, path, e)))
  }
}

/// Short, stable token fingerprint for logs. Raw tokens are never logged.
fn fingerprint(token: &str) -> String {
  let digest = Sha256::digest(token.as_bytes());
  hex::encode(&digest[..4])
}

fn non_empty_or(body: String, fallback: &str) -> String {
  if body.trim().is_empty() {
    fallback.to_string()
  } else {
    body
  }
}
