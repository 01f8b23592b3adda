//! Keyed TTL cache with in-flight deduplication and prefix invalidation.

use chrono::{DateTime, Duration, Utc};
use futures::future::{BoxFuture, FutureExt, Shared};
use serde_json::Value;
use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, trace, warn};

use super::key::QueryKey;
use super::traits::{Cacheable, EntrySnapshot, EntryStatus, Invalidates, QueryResult};
use crate::error::{ApiError, Result};

type SharedFetch = Shared<BoxFuture<'static, Result<Value>>>;

struct InFlight {
  id: u64,
  future: SharedFetch,
}

#[derive(Default)]
struct Entry {
  value: Option<Value>,
  fetched_at: Option<DateTime<Utc>>,
  /// TTL used by the most recent read
  stale_time: Duration,
  invalidated: bool,
  error: Option<ApiError>,
  in_flight: Option<InFlight>,
}

impl Entry {
  fn is_fresh(&self, now: DateTime<Utc>, stale_time: Duration) -> bool {
    if self.invalidated || self.value.is_none() {
      return false;
    }
    match self.fetched_at {
      Some(fetched_at) => now - fetched_at < stale_time,
      None => false,
    }
  }

  fn status(&self, now: DateTime<Utc>) -> EntryStatus {
    if self.in_flight.is_some() {
      EntryStatus::Fetching
    } else if self.error.is_some() {
      EntryStatus::Failed
    } else if self.value.is_none() {
      EntryStatus::Idle
    } else if self.is_fresh(now, self.stale_time) {
      EntryStatus::Fresh
    } else {
      EntryStatus::Stale
    }
  }

  fn last_value(&self) -> Option<(Value, DateTime<Utc>)> {
    self.value.clone().zip(self.fetched_at)
  }
}

struct Inner {
  entries: Mutex<HashMap<QueryKey, Entry>>,
  next_fetch_id: AtomicU64,
}

/// Shared query cache.
///
/// Cloning is cheap; clones share the same entries. The entry lock is never
/// held across an `.await`.
#[derive(Clone)]
pub struct QueryClient {
  inner: Arc<Inner>,
}

impl Default for QueryClient {
  fn default() -> Self {
    Self::new()
  }
}

impl QueryClient {
  pub fn new() -> Self {
    Self {
      inner: Arc::new(Inner {
        entries: Mutex::new(HashMap::new()),
        next_fetch_id: AtomicU64::new(1),
      }),
    }
  }

  fn entries(&self) -> MutexGuard<'_, HashMap<QueryKey, Entry>> {
    // Entries stay consistent even if a holder panicked; every write is a
    // single field assignment
    self
      .inner
      .entries
      .lock()
      .unwrap_or_else(PoisonError::into_inner)
  }

  /// Register a new shared fetch on `entry`.
  fn begin_fetch<T, F, Fut>(&self, key: &QueryKey, entry: &mut Entry, fetcher: F) -> (u64, SharedFetch)
  where
    T: Cacheable,
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T>> + Send + 'static,
  {
    let id = self.inner.next_fetch_id.fetch_add(1, Ordering::Relaxed);
    let fetch = fetcher();
    let future = async move {
      let data = fetch.await?;
      serde_json::to_value(data).map_err(ApiError::from)
    }
    .boxed()
    .shared();

    debug!(%key, fetch_id = id, "starting fetch");
    entry.in_flight = Some(InFlight {
      id,
      future: future.clone(),
    });
    (id, future)
  }

  /// Record the outcome of fetch `id` and return the entry's previous value.
  ///
  /// Only the fetch currently registered on the entry writes; results of
  /// fetches detached by `invalidate` or `clear` are discarded.
  fn settle(&self, key: &QueryKey, id: u64, outcome: &Result<Value>) -> Option<(Value, DateTime<Utc>)> {
    let mut entries = self.entries();
    let entry = entries.get_mut(key)?;
    let previous = entry.last_value();

    let owned = matches!(&entry.in_flight, Some(in_flight) if in_flight.id == id);
    if !owned {
      trace!(%key, fetch_id = id, "fetch detached or already settled");
      return previous;
    }

    entry.in_flight = None;
    match outcome {
      Ok(value) => {
        entry.value = Some(value.clone());
        entry.fetched_at = Some(Utc::now());
        entry.invalidated = false;
        entry.error = None;
        debug!(%key, fetch_id = id, "fetch settled");
      }
      Err(e) => {
        entry.error = Some(e.clone());
        warn!(%key, fetch_id = id, error = %e, "fetch failed");
      }
    }
    previous
  }

  /// Read through the cache.
  ///
  /// A fresh entry is returned without calling `fetcher`. Otherwise exactly
  /// one fetch runs for the key and every concurrent caller awaits it. If the
  /// fetch fails and a previous value exists, that value is returned with
  /// the error attached; with no previous value the error is returned.
  pub async fn read<T, F, Fut>(&self, key: &QueryKey, ttl: Duration, fetcher: F) -> Result<QueryResult<T>>
  where
    T: Cacheable,
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T>> + Send + 'static,
  {
    let (id, fetch) = {
      let mut entries = self.entries();
      let entry = entries.entry(key.clone()).or_default();
      entry.stale_time = ttl;

      if entry.is_fresh(Utc::now(), ttl) {
        if let Some((value, fetched_at)) = entry.last_value() {
          trace!(%key, "cache hit");
          return Ok(QueryResult::from_cache(
            serde_json::from_value(value)?,
            fetched_at,
            false,
          ));
        }
      }

      match &entry.in_flight {
        Some(in_flight) => {
          trace!(%key, fetch_id = in_flight.id, "joining in-flight fetch");
          (in_flight.id, in_flight.future.clone())
        }
        None => self.begin_fetch(key, entry, fetcher),
      }
    };

    let outcome = fetch.await;
    let previous = self.settle(key, id, &outcome);

    match outcome {
      Ok(value) => Ok(QueryResult::from_network(
        serde_json::from_value(value)?,
        Utc::now(),
      )),
      Err(error) => match previous {
        Some((value, fetched_at)) => Ok(QueryResult::fallback(
          serde_json::from_value(value)?,
          fetched_at,
          error,
        )),
        None => Err(error),
      },
    }
  }

  /// Serve the last known value immediately and refresh in the background.
  ///
  /// Used by polling views. When the entry is stale (or empty) a shared
  /// refetch is started on a spawned task; the returned value is whatever
  /// the cache held before it. Must be called inside a tokio runtime.
  pub fn read_background<T, F, Fut>(
    &self,
    key: &QueryKey,
    ttl: Duration,
    fetcher: F,
  ) -> Result<Option<QueryResult<T>>>
  where
    T: Cacheable,
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T>> + Send + 'static,
  {
    let mut entries = self.entries();
    let entry = entries.entry(key.clone()).or_default();
    entry.stale_time = ttl;

    let fresh = entry.is_fresh(Utc::now(), ttl);
    let current = match entry.last_value() {
      Some((value, fetched_at)) => Some(QueryResult::from_cache(
        serde_json::from_value(value)?,
        fetched_at,
        !fresh,
      )),
      None => None,
    };

    if !fresh && entry.in_flight.is_none() {
      let (id, fetch) = self.begin_fetch(key, entry, fetcher);
      let client = self.clone();
      let key = key.clone();
      tokio::spawn(async move {
        let outcome = fetch.await;
        client.settle(&key, id, &outcome);
      });
    }

    Ok(current)
  }

  /// Mark every entry under `prefix` stale. Returns how many were touched.
  ///
  /// Fetches already in flight are detached: callers awaiting them still get
  /// their result, but it is not written and the next read starts a new
  /// fetch.
  pub fn invalidate(&self, prefix: &QueryKey) -> usize {
    let mut entries = self.entries();
    let mut count = 0;
    for (key, entry) in entries.iter_mut() {
      if key.starts_with(prefix) {
        entry.invalidated = true;
        if let Some(in_flight) = entry.in_flight.take() {
          trace!(%key, fetch_id = in_flight.id, "detached in-flight fetch");
        }
        count += 1;
      }
    }
    debug!(%prefix, count, "invalidated entries");
    count
  }

  /// Run a mutation; on success invalidate every prefix the command names.
  ///
  /// On failure the cache is left untouched and the error is returned as is.
  pub async fn mutate<C, T, F, Fut>(&self, command: &C, fetcher: F) -> Result<T>
  where
    C: Invalidates,
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T>>,
  {
    let result = fetcher().await;
    match &result {
      Ok(_) => {
        for prefix in command.invalidates() {
          self.invalidate(&prefix);
        }
      }
      Err(e) => debug!(error = %e, "mutation failed, cache untouched"),
    }
    result
  }

  /// Drop every entry. Results of fetches still in flight are discarded.
  pub fn clear(&self) {
    let mut entries = self.entries();
    debug!(count = entries.len(), "clearing cache");
    entries.clear();
  }

  pub fn snapshot(&self, key: &QueryKey) -> Option<EntrySnapshot> {
    let entries = self.entries();
    let entry = entries.get(key)?;
    Some(EntrySnapshot {
      status: entry.status(Utc::now()),
      fetched_at: entry.fetched_at,
      has_value: entry.value.is_some(),
      invalidated: entry.invalidated,
      error: entry.error.clone(),
    })
  }

  pub fn len(&self) -> usize {
    self.entries().len()
  }

  pub fn is_empty(&self) -> bool {
    self.entries().is_empty()
  }
}
