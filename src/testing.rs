//! In-process mock backend for tests.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::Duration;

use crate::error::{ApiError, Result};
use crate::http::{ApiRequest, Method, RawResponse, Transport};

#[derive(Debug, Clone)]
enum Reply {
  Response(RawResponse),
  NetworkError,
}

#[derive(Default)]
struct Route {
  /// Replies served in order; the last one repeats
  replies: VecDeque<Reply>,
  delay: Option<Duration>,
}

/// Scripted backend keyed by method and path (query string ignored).
#[derive(Default)]
pub struct MockBackend {
  routes: Mutex<HashMap<(Method, String), Route>>,
  requests: Mutex<Vec<ApiRequest>>,
}

impl MockBackend {
  pub fn new() -> Self {
    Self::default()
  }

  fn push(&self, method: Method, path: &str, reply: Reply) {
    let mut routes = self.routes.lock().unwrap();
    routes
      .entry((method, path.to_string()))
      .or_default()
      .replies
      .push_back(reply);
  }

  /// Queue a JSON response.
  pub fn respond(&self, method: Method, path: &str, status: u16, body: Value) {
    self.respond_raw(method, path, status, &body.to_string());
  }

  /// Queue a response with a raw body.
  pub fn respond_raw(&self, method: Method, path: &str, status: u16, body: &str) {
    self.push(
      method,
      path,
      Reply::Response(RawResponse {
        status,
        body: body.to_string(),
      }),
    );
  }

  /// Queue a transport failure.
  pub fn fail(&self, method: Method, path: &str) {
    self.push(method, path, Reply::NetworkError);
  }

  /// Hold every reply on this route for `delay` before answering.
  pub fn delay(&self, method: Method, path: &str, delay: Duration) {
    let mut routes = self.routes.lock().unwrap();
    routes.entry((method, path.to_string())).or_default().delay = Some(delay);
  }

  /// Number of requests received for a route.
  pub fn calls(&self, method: Method, path: &str) -> usize {
    self
      .requests
      .lock()
      .unwrap()
      .iter()
      .filter(|r| r.method == method && r.path.to_string() == path)
      .count()
  }

  /// Every request received, in order.
  pub fn requests(&self) -> Vec<ApiRequest> {
    self.requests.lock().unwrap().clone()
  }

  pub fn total_calls(&self) -> usize {
    self.requests.lock().unwrap().len()
  }
}

#[async_trait]
impl Transport for MockBackend {
  async fn send(&self, request: ApiRequest) -> Result<RawResponse> {
    let key = (request.method, request.path.to_string());
    self.requests.lock().unwrap().push(request);

    let (reply, delay) = {
      let mut routes = self.routes.lock().unwrap();
      match routes.get_mut(&key) {
        Some(route) => {
          let reply = if route.replies.len() > 1 {
            route.replies.pop_front()
          } else {
            route.replies.front().cloned()
          };
          (reply, route.delay)
        }
        None => (None, None),
      }
    };

    if let Some(delay) = delay {
      tokio::time::sleep(delay).await;
    }

    match reply {
      Some(Reply::Response(response)) => Ok(response),
      Some(Reply::NetworkError) => Err(ApiError::Network("connection refused".to_string())),
      None => Ok(RawResponse {
        status: 404,
        body: format!("no route for {} {}", key.0, key.1),
      }),
    }
  }
}
