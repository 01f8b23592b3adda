//! Hierarchical cache keys.
//!
//! Keys are ordered tuples of segments. Prefix matching compares whole
//! segments, so `["admin", "company"]` is not a prefix of
//! `["admin", "companies"]`.

use std::fmt;

use crate::api::{ListParams, ResourceKind};

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum KeySegment {
  Str(String),
  Int(i64),
  Null,
}

impl From<&str> for KeySegment {
  fn from(s: &str) -> Self {
    KeySegment::Str(s.to_string())
  }
}

impl From<String> for KeySegment {
  fn from(s: String) -> Self {
    KeySegment::Str(s)
  }
}

impl From<&String> for KeySegment {
  fn from(s: &String) -> Self {
    KeySegment::Str(s.clone())
  }
}

impl From<i64> for KeySegment {
  fn from(n: i64) -> Self {
    KeySegment::Int(n)
  }
}

impl From<u32> for KeySegment {
  fn from(n: u32) -> Self {
    KeySegment::Int(i64::from(n))
  }
}

impl<T: Into<KeySegment>> From<Option<T>> for KeySegment {
  fn from(value: Option<T>) -> Self {
    value.map(Into::into).unwrap_or(KeySegment::Null)
  }
}

impl fmt::Display for KeySegment {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      KeySegment::Str(s) => write!(f, "{:?}", s),
      KeySegment::Int(n) => write!(f, "{}", n),
      KeySegment::Null => f.write_str("null"),
    }
  }
}

/// Composite cache key, e.g. `["admin", "companies", 2, 10, null]`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, PartialOrd, Ord)]
pub struct QueryKey(Vec<KeySegment>);

impl QueryKey {
  pub fn new<I, S>(segments: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: Into<KeySegment>,
  {
    Self(segments.into_iter().map(Into::into).collect())
  }

  /// Append one segment.
  pub fn with(mut self, segment: impl Into<KeySegment>) -> Self {
    self.0.push(segment.into());
    self
  }

  pub fn segments(&self) -> &[KeySegment] {
    &self.0
  }

  /// Segment-wise prefix test. Every key starts with the empty key.
  pub fn starts_with(&self, prefix: &QueryKey) -> bool {
    self.0.starts_with(&prefix.0)
  }
}

impl fmt::Display for QueryKey {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str("[")?;
    for (i, segment) in self.0.iter().enumerate() {
      if i > 0 {
        f.write_str(",")?;
      }
      write!(f, "{}", segment)?;
    }
    f.write_str("]")
  }
}

/// Build a [`QueryKey`] from heterogeneous segments.
#[macro_export]
macro_rules! query_key {
  ($($segment:expr),* $(,)?) => {
    $crate::cache::QueryKey::default()$(.with($segment))*
  };
}

/// Keys used by the admin console.
pub mod keys {
  use super::*;

  pub fn admin() -> QueryKey {
    QueryKey::new(["admin"])
  }

  /// Identity behind the stored token
  pub fn me() -> QueryKey {
    admin().with("me")
  }

  pub fn dashboard_stats() -> QueryKey {
    admin().with("dashboard").with("stats")
  }

  /// Prefix covering every list page and detail entry of a resource.
  pub fn resource(kind: ResourceKind) -> QueryKey {
    admin().with(kind.as_str())
  }

  pub fn list(kind: ResourceKind, params: &ListParams) -> QueryKey {
    resource(kind)
      .with(params.page)
      .with(params.limit)
      .with(params.status.clone())
  }

  pub fn detail(kind: ResourceKind, id: &str) -> QueryKey {
    resource(kind).with(id)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_prefix_is_segment_wise() {
    let companies = query_key!["admin", "companies", 1u32, 10u32];
    assert!(companies.starts_with(&query_key!["admin", "companies"]));
    assert!(companies.starts_with(&query_key!["admin"]));
    assert!(companies.starts_with(&QueryKey::default()));
    assert!(!companies.starts_with(&query_key!["admin", "company"]));
    assert!(!companies.starts_with(&query_key!["admin", "users"]));
  }

  #[test]
  fn test_string_and_int_segments_differ() {
    assert_ne!(query_key!["admin", "users", "1"], query_key!["admin", "users", 1u32]);
  }

  #[test]
  fn test_list_and_detail_share_resource_prefix() {
    let list = keys::list(ResourceKind::Companies, &ListParams::new(2, 10));
    let detail = keys::detail(ResourceKind::Companies, "c-17");
    let prefix = keys::resource(ResourceKind::Companies);

    assert!(list.starts_with(&prefix));
    assert!(detail.starts_with(&prefix));
    assert!(!keys::dashboard_stats().starts_with(&prefix));
  }

  #[test]
  fn test_display() {
    let key = keys::list(ResourceKind::Requests, &ListParams::new(1, 10).with_status("PENDING"));
    assert_eq!(key.to_string(), r#"["admin","requests",1,10,"PENDING"]"#);

    let key = keys::list(ResourceKind::Users, &ListParams::default());
    assert_eq!(key.to_string(), r#"["admin","users",1,10,null]"#);
  }
}
