//! Wire-level request/response types and the transport seam.

use async_trait::async_trait;
use serde_json::Value;
use std::fmt;
use std::time::Duration;
use url::Url;

use crate::error::{ApiError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
  Get,
  Post,
  Put,
}

impl fmt::Display for Method {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let s = match self {
      Method::Get => "GET",
      Method::Post => "POST",
      Method::Put => "PUT",
    };
    f.write_str(s)
  }
}

impl From<Method> for reqwest::Method {
  fn from(m: Method) -> Self {
    match m {
      Method::Get => reqwest::Method::GET,
      Method::Post => reqwest::Method::POST,
      Method::Put => reqwest::Method::PUT,
    }
  }
}

/// Path relative to the API base URL, kept as segments so ids are encoded
/// one segment at a time.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ApiPath(Vec<String>);

impl ApiPath {
  pub fn new<I, S>(segments: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    Self(segments.into_iter().map(Into::into).collect())
  }

  pub fn segments(&self) -> &[String] {
    &self.0
  }
}

impl fmt::Display for ApiPath {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "/{}", self.0.join("/"))
  }
}

/// A fully prepared request handed to the transport.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
  pub method: Method,
  pub path: ApiPath,
  pub query: Vec<(String, String)>,
  pub body: Option<Value>,
  /// Bearer token to send, if any
  pub bearer: Option<String>,
}

/// Status and raw body of a response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
  pub status: u16,
  pub body: String,
}

impl RawResponse {
  pub fn is_success(&self) -> bool {
    (200..300).contains(&self.status)
  }
}

/// Sends prepared requests over the wire.
///
/// Implementations report transport failures as [`ApiError::Network`] and
/// return every received response, whatever its status.
#[async_trait]
pub trait Transport: Send + Sync {
  async fn send(&self, request: ApiRequest) -> Result<RawResponse>;
}

/// Production transport backed by reqwest.
#[derive(Clone)]
pub struct ReqwestTransport {
  client: reqwest::Client,
  base_url: Url,
}

impl ReqwestTransport {
  pub fn new(base_url: &str, timeout: Option<Duration>) -> Result<Self> {
    let base_url = Url::parse(base_url)
      .map_err(|e| ApiError::Validation(format!("Invalid API URL {}: {}", base_url, e)))?;
    if base_url.cannot_be_a_base() {
      return Err(ApiError::Validation(format!(
        "API URL cannot be used as a base: {}",
        base_url
      )));
    }

    let mut builder = reqwest::Client::builder();
    if let Some(timeout) = timeout {
      builder = builder.timeout(timeout);
    }
    let client = builder
      .build()
      .map_err(|e| ApiError::Network(format!("Failed to create HTTP client: {}", e)))?;

    Ok(Self { client, base_url })
  }

  /// Resolve a request path and query against the base URL.
  pub fn url_for(&self, path: &ApiPath, query: &[(String, String)]) -> Url {
    let mut url = self.base_url.clone();
    // Checked in `new`: the base URL can hold path segments
    if let Ok(mut segments) = url.path_segments_mut() {
      segments.pop_if_empty().extend(path.segments());
    }
    if !query.is_empty() {
      url.query_pairs_mut().extend_pairs(query);
    }
    url
  }
}

#[async_trait]
impl Transport for ReqwestTransport {
  async fn send(&self, request: ApiRequest) -> Result<RawResponse> {
    let url = self.url_for(&request.path, &request.query);

    let mut builder = self.client.request(request.method.into(), url);
    if let Some(token) = &request.bearer {
      builder = builder.bearer_auth(token);
    }
    if let Some(body) = &request.body {
      builder = builder.json(body);
    }

    let response = builder
      .send()
      .await
      .map_err(|e| ApiError::Network(format!("{} {} failed: {}", request.method, request.path, e)))?;

    let status = response.status().as_u16();
    let body = response
      .text()
      .await
      .map_err(|e| ApiError::Network(format!("Failed to read response body: {}", e)))?;

    Ok(RawResponse { status, body })
  }
}
