//! Query/cache layer.
//!
//! This module provides a resource-agnostic read cache that:
//! - Keys entries by hierarchical tuples (`["admin", "companies", 2, 10]`)
//! - Treats entries as stale after a per-read TTL or an explicit invalidation
//! - Deduplicates fetches: one in-flight request per key, shared by all callers
//! - Keeps the last known value when a refetch fails
//! - Invalidates affected prefixes after successful mutations

mod client;
mod key;
mod mutation;
mod query;
mod traits;

pub use client::QueryClient;
pub use key::{keys, KeySegment, QueryKey};
pub use mutation::{StatusUpdate, VerificationCommand};
pub use query::{Query, QueryState};
pub use traits::{
  CacheSource, Cacheable, EntrySnapshot, EntryStatus, Invalidates, QueryResult, StaleTimes,
};
