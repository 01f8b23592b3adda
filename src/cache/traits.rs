//! Core traits and types for the caching system.

use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Serialize};

use super::key::QueryKey;
use crate::error::ApiError;

/// Values the cache can hold.
///
/// Entries are stored as JSON so one cache can hold every resource type.
pub trait Cacheable: Clone + Send + Sync + Serialize + DeserializeOwned + 'static {}

impl<T> Cacheable for T where T: Clone + Send + Sync + Serialize + DeserializeOwned + 'static {}

/// Commands that declare which cache prefixes their success invalidates.
pub trait Invalidates {
  fn invalidates(&self) -> Vec<QueryKey>;
}

/// Result from a cache read, including data and metadata about the source.
#[derive(Debug, Clone)]
pub struct QueryResult<T> {
  /// The actual data
  pub data: T,
  /// Where the data came from
  pub source: CacheSource,
  /// When the data was fetched
  pub fetched_at: DateTime<Utc>,
  /// Set when the latest fetch failed and `data` is the last known value
  pub error: Option<ApiError>,
}

impl<T> QueryResult<T> {
  /// Create a new result from fresh network data.
  pub fn from_network(data: T, fetched_at: DateTime<Utc>) -> Self {
    Self {
      data,
      source: CacheSource::Network,
      fetched_at,
      error: None,
    }
  }

  /// Create a new result from cached data.
  pub fn from_cache(data: T, fetched_at: DateTime<Utc>, is_stale: bool) -> Self {
    Self {
      data,
      source: if is_stale {
        CacheSource::CacheStale
      } else {
        CacheSource::CacheFresh
      },
      fetched_at,
      error: None,
    }
  }

  /// The fetch failed; serve the last known value with the error attached.
  pub fn fallback(data: T, fetched_at: DateTime<Utc>, error: ApiError) -> Self {
    Self {
      data,
      source: CacheSource::Fallback,
      fetched_at,
      error: Some(error),
    }
  }

  pub fn is_fallback(&self) -> bool {
    self.error.is_some()
  }
}

/// Indicates where the data came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheSource {
  /// Fresh data from network
  Network,
  /// Data from cache, still considered fresh
  CacheFresh,
  /// Data from cache past its TTL, served while a background refetch runs
  CacheStale,
  /// Fetch failed, serving the last known value
  Fallback,
}

/// Lifecycle state of one cache entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryStatus {
  /// Never fetched
  Idle,
  /// A fetch is in flight
  Fetching,
  /// Has a value within its TTL
  Fresh,
  /// Has a value past its TTL or invalidated
  Stale,
  /// The latest fetch failed
  Failed,
}

/// Point-in-time view of one entry, for diagnostics.
#[derive(Debug, Clone)]
pub struct EntrySnapshot {
  pub status: EntryStatus,
  pub fetched_at: Option<DateTime<Utc>>,
  pub has_value: bool,
  pub invalidated: bool,
  pub error: Option<ApiError>,
}

/// Default TTLs per kind of data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StaleTimes {
  /// List pages and detail records
  pub resources: chrono::Duration,
  /// Dashboard aggregates change often
  pub dashboard: chrono::Duration,
  /// Identity behind the stored token
  pub identity: chrono::Duration,
}

impl Default for StaleTimes {
  fn default() -> Self {
    Self {
      resources: chrono::Duration::minutes(5),
      dashboard: chrono::Duration::seconds(30),
      identity: chrono::Duration::minutes(5),
    }
  }
}
