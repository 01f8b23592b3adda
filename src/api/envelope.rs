//! List envelopes and their normalization into one paginated shape.
//!
//! Some list endpoints wrap pagination in a `meta` object, others inline it
//! next to `data`. Both decode into [`Envelope`] and leave through
//! [`Envelope::normalize`].

use serde::{Deserialize, Serialize};

/// Canonical paginated response handed to callers.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PaginatedResult<T> {
  pub data: Vec<T>,
  pub total: u64,
  pub page: u32,
  pub limit: u32,
  pub total_pages: u64,
}

impl<T> PaginatedResult<T> {
  pub fn has_next(&self) -> bool {
    u64::from(self.page) < self.total_pages
  }

  pub fn has_previous(&self) -> bool {
    self.page > 1
  }
}

/// Pagination fields as the backend sends them; any may be missing.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct PageMeta {
  pub total: Option<u64>,
  pub page: Option<u32>,
  pub limit: Option<u32>,
  pub total_pages: Option<u64>,
}

/// The two envelope shapes list endpoints return.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum Envelope<T> {
  /// `{data, meta: {total, page, limit, totalPages}}`
  Nested {
    data: Option<Vec<T>>,
    meta: PageMeta,
  },
  /// `{data, total, page, limit, totalPages}`, any field possibly absent
  Flat {
    data: Option<Vec<T>>,
    #[serde(flatten)]
    meta: PageMeta,
  },
}

impl<T> Envelope<T> {
  /// Collapse either shape into a [`PaginatedResult`].
  ///
  /// Missing `data` becomes empty, missing `total` becomes 0, missing or
  /// zero `page`/`limit` fall back to what was requested, and a missing
  /// `totalPages` is recomputed from `total` and `limit`.
  pub fn normalize(self, requested_page: u32, requested_limit: u32) -> PaginatedResult<T> {
    let (data, meta) = match self {
      Envelope::Nested { data, meta } => (data, meta),
      Envelope::Flat { data, meta } => (data, meta),
    };

    let total = meta.total.unwrap_or(0);
    let page = meta.page.filter(|p| *p > 0).unwrap_or(requested_page);
    let limit = meta.limit.filter(|l| *l > 0).unwrap_or(requested_limit);
    let total_pages = meta
      .total_pages
      .unwrap_or_else(|| page_count(total, limit));

    PaginatedResult {
      data: data.unwrap_or_default(),
      total,
      page,
      limit,
      total_pages,
    }
  }
}

/// `ceil(total / limit)`, 0 when `limit` is 0.
pub fn page_count(total: u64, limit: u32) -> u64 {
  if limit == 0 {
    return 0;
  }
  total.div_ceil(u64::from(limit))
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  #[derive(Debug, Deserialize, PartialEq)]
  struct Row {
    id: u32,
  }

  fn decode(value: serde_json::Value) -> Envelope<Row> {
    serde_json::from_value(value).unwrap()
  }

  #[test]
  fn test_nested_meta_is_lifted() {
    let result = decode(json!({
      "data": [{"id": 1}, {"id": 2}],
      "meta": {"total": 42, "page": 2, "limit": 10, "totalPages": 5}
    }))
    .normalize(1, 10);

    assert_eq!(
      result,
      PaginatedResult {
        data: vec![Row { id: 1 }, Row { id: 2 }],
        total: 42,
        page: 2,
        limit: 10,
        total_pages: 5,
      }
    );
  }

  #[test]
  fn test_flat_shape_passes_through() {
    let result = decode(json!({
      "data": [{"id": 7}],
      "total": 11, "page": 3, "limit": 5, "totalPages": 3
    }))
    .normalize(1, 10);

    assert_eq!(result.data, vec![Row { id: 7 }]);
    assert_eq!((result.total, result.page, result.limit, result.total_pages), (11, 3, 5, 3));
  }

  #[test]
  fn test_missing_meta_defaults_to_request() {
    let result = decode(json!({})).normalize(4, 25);

    assert_eq!(
      result,
      PaginatedResult {
        data: vec![],
        total: 0,
        page: 4,
        limit: 25,
        total_pages: 0,
      }
    );
  }

  #[test]
  fn test_missing_total_pages_is_recomputed() {
    let result = decode(json!({"data": [], "meta": {"total": 21, "limit": 10}})).normalize(1, 10);
    assert_eq!(result.total_pages, 3);
    assert_eq!(result.page, 1);
  }

  #[test]
  fn test_null_meta_and_data() {
    let result = decode(json!({"data": null, "meta": null})).normalize(2, 10);
    assert!(result.data.is_empty());
    assert_eq!(result.page, 2);
  }

  #[test]
  fn test_page_count() {
    assert_eq!(page_count(0, 10), 0);
    assert_eq!(page_count(10, 10), 1);
    assert_eq!(page_count(11, 10), 2);
    assert_eq!(page_count(5, 0), 0);
  }

  #[test]
  fn test_has_next() {
    let result = decode(json!({"total": 30, "page": 2, "limit": 10})).normalize(1, 10);
    assert!(result.has_next());
    assert!(result.has_previous());
  }
}
