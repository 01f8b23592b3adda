//! View-side query handle over the shared [`QueryClient`].
//!
//! A `Query<T>` owns one cache key and a fetcher. Views call `fetch()` when
//! they mount, `poll()` on every tick to pick up results, and simply drop the
//! query when torn down; a result that arrives after the drop is discarded.
//!
//! # Example
//!
//! ```ignore
//! let api = admin_api.clone();
//! let mut query = Query::new(client.clone(), keys::dashboard_stats(), move || {
//!     let api = api.clone();
//!     async move { api.dashboard_stats().await }
//! })
//! .with_stale_time(chrono::Duration::seconds(30))
//! .with_refetch_interval(std::time::Duration::from_secs(30));
//!
//! query.fetch();
//!
//! // In event loop tick
//! query.tick();
//! if query.poll() {
//!     // State changed, trigger re-render
//! }
//! ```

use chrono::{DateTime, Duration, Utc};
use futures::future::{BoxFuture, FutureExt};
use std::future::Future;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::mpsc;
use tracing::trace;

use super::client::QueryClient;
use super::key::QueryKey;
use super::traits::{Cacheable, QueryResult};
use crate::error::{ApiError, Result};

/// The state of a query
#[derive(Debug, Clone)]
pub enum QueryState<T> {
  /// Query has not been started
  Idle,
  /// Query is fetching and has no data yet
  Loading,
  /// Query has data
  Success(T),
  /// Query failed and has no data to fall back on
  Error(ApiError),
}

impl<T> QueryState<T> {
  pub fn is_loading(&self) -> bool {
    matches!(self, QueryState::Loading)
  }

  pub fn is_success(&self) -> bool {
    matches!(self, QueryState::Success(_))
  }

  pub fn is_error(&self) -> bool {
    matches!(self, QueryState::Error(_))
  }

  pub fn data(&self) -> Option<&T> {
    match self {
      QueryState::Success(data) => Some(data),
      _ => None,
    }
  }

  pub fn error(&self) -> Option<&ApiError> {
    match self {
      QueryState::Error(e) => Some(e),
      _ => None,
    }
  }
}

type FetcherFn<T> = Arc<dyn Fn() -> BoxFuture<'static, Result<T>> + Send + Sync>;

/// Async query bound to one cache key.
pub struct Query<T> {
  client: QueryClient,
  key: QueryKey,
  fetcher: FetcherFn<T>,
  state: QueryState<T>,
  receiver: Option<mpsc::UnboundedReceiver<Result<QueryResult<T>>>>,
  stale_time: Duration,
  refetch_interval: Option<std::time::Duration>,
  last_fetch: Option<Instant>,
  fetched_at: Option<DateTime<Utc>>,
  /// Error of the latest fetch when older data is still shown
  last_error: Option<ApiError>,
  enabled: bool,
}

impl<T: Cacheable> Query<T> {
  pub fn new<F, Fut>(client: QueryClient, key: QueryKey, fetcher: F) -> Self
  where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<T>> + Send + 'static,
  {
    Self {
      client,
      key,
      fetcher: Arc::new(move || fetcher().boxed()),
      state: QueryState::Idle,
      receiver: None,
      stale_time: Duration::minutes(5),
      refetch_interval: None,
      last_fetch: None,
      fetched_at: None,
      last_error: None,
      enabled: true,
    }
  }

  pub fn with_stale_time(mut self, stale_time: Duration) -> Self {
    self.stale_time = stale_time;
    self
  }

  /// Refetch in the background every `interval`, keeping current data
  /// visible while the refetch runs.
  pub fn with_refetch_interval(mut self, interval: std::time::Duration) -> Self {
    self.refetch_interval = Some(interval);
    self
  }

  /// Disabled queries never fetch (e.g. while the session is not
  /// authenticated).
  pub fn with_enabled(mut self, enabled: bool) -> Self {
    self.enabled = enabled;
    self
  }

  pub fn set_enabled(&mut self, enabled: bool) {
    self.enabled = enabled;
  }

  pub fn key(&self) -> &QueryKey {
    &self.key
  }

  pub fn state(&self) -> &QueryState<T> {
    &self.state
  }

  pub fn data(&self) -> Option<&T> {
    self.state.data()
  }

  pub fn is_loading(&self) -> bool {
    self.state.is_loading()
  }

  /// A fetch is running, with or without data on screen.
  pub fn is_fetching(&self) -> bool {
    self.receiver.is_some()
  }

  pub fn is_success(&self) -> bool {
    self.state.is_success()
  }

  pub fn is_error(&self) -> bool {
    self.state.is_error()
  }

  /// Error to show: the failure state, or a failed refresh behind stale data.
  pub fn error(&self) -> Option<&ApiError> {
    self.state.error().or(self.last_error.as_ref())
  }

  pub fn fetched_at(&self) -> Option<DateTime<Utc>> {
    self.fetched_at
  }

  /// Start fetching through the cache if not already fetching.
  pub fn fetch(&mut self) {
    if !self.enabled || self.receiver.is_some() {
      return;
    }
    self.start_fetch();
  }

  /// Mark this key stale and fetch again, dropping any pending fetch.
  pub fn refetch(&mut self) {
    if !self.enabled {
      return;
    }
    self.receiver = None;
    self.client.invalidate(&self.key);
    self.start_fetch();
  }

  /// Drive the refetch interval. Call on every event loop tick.
  pub fn tick(&mut self) {
    let Some(interval) = self.refetch_interval else {
      return;
    };
    if self.receiver.is_some() {
      return;
    }
    let due = self
      .last_fetch
      .map(|t| t.elapsed() >= interval)
      .unwrap_or(true);
    if due && self.enabled {
      trace!(key = %self.key, "refetch interval elapsed");
      self.refresh_in_background();
    }
  }

  /// Show the cached value right away and refresh it on a shared background
  /// fetch, which the pending read then joins.
  fn refresh_in_background(&mut self) {
    self.client.invalidate(&self.key);
    let fetcher = self.fetcher.clone();
    match self
      .client
      .read_background(&self.key, self.stale_time, move || fetcher())
    {
      Ok(Some(current)) => {
        self.fetched_at = Some(current.fetched_at);
        self.state = QueryState::Success(current.data);
      }
      Ok(None) => {}
      Err(e) => trace!(key = %self.key, error = %e, "cached value unreadable"),
    }
    self.start_fetch();
  }

  /// Poll for results from a pending fetch.
  ///
  /// Returns `true` if the state changed (data arrived or error occurred).
  pub fn poll(&mut self) -> bool {
    let receiver = match &mut self.receiver {
      Some(rx) => rx,
      None => return false,
    };

    match receiver.try_recv() {
      Ok(Ok(result)) => {
        self.fetched_at = Some(result.fetched_at);
        self.last_error = result.error;
        self.state = QueryState::Success(result.data);
        self.receiver = None;
        true
      }
      Ok(Err(error)) => {
        // Keep showing older data if we have it
        if self.state.is_success() {
          self.last_error = Some(error);
        } else {
          self.state = QueryState::Error(error);
        }
        self.receiver = None;
        true
      }
      Err(mpsc::error::TryRecvError::Empty) => false,
      Err(mpsc::error::TryRecvError::Disconnected) => {
        self.receiver = None;
        if !self.state.is_success() {
          self.state = QueryState::Error(ApiError::Network("query was cancelled".to_string()));
        }
        true
      }
    }
  }

  fn start_fetch(&mut self) {
    let (tx, rx) = mpsc::unbounded_channel();
    self.receiver = Some(rx);
    self.last_fetch = Some(Instant::now());
    if !self.state.is_success() {
      self.state = QueryState::Loading;
    }

    let client = self.client.clone();
    let key = self.key.clone();
    let stale_time = self.stale_time;
    let fetcher = self.fetcher.clone();

    tokio::spawn(async move {
      tokio::select! {
        // Receiver dropped: view went away, discard whatever comes back
        _ = tx.closed() => {}
        result = client.read(&key, stale_time, move || fetcher()) => {
          let _ = tx.send(result);
        }
      }
    });
  }
}

impl<T: std::fmt::Debug> std::fmt::Debug for Query<T> {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("Query")
      .field("key", &self.key)
      .field("state", &self.state)
      .field("fetched_at", &self.fetched_at)
      .field("stale_time", &self.stale_time)
      .finish_non_exhaustive()
  }
}
