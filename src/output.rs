//! Plain-text rendering for command output.

use mpadmin::api::{
  Company, DashboardStats, Identity, PaginatedResult, Professional, ServiceRequest, User,
};
use mpadmin::cache::{CacheSource, QueryResult};

const MAX_CELL: usize = 40;

/// Truncate a string to a maximum number of characters, adding "..." if
/// truncated
pub fn truncate(s: &str, max_len: usize) -> String {
  if s.chars().count() <= max_len {
    s.to_string()
  } else {
    let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
    format!("{}...", kept)
  }
}

/// A record that renders as one table row.
pub trait TableRow {
  const HEADERS: &'static [&'static str];

  fn cells(&self) -> Vec<String>;
}

impl TableRow for User {
  const HEADERS: &'static [&'static str] = &["ID", "EMAIL", "NAME", "STATUS", "ADMIN"];

  fn cells(&self) -> Vec<String> {
    vec![
      self.id.clone(),
      self.email.clone(),
      format!("{} {}", self.first_name, self.last_name).trim().to_string(),
      self.status.clone(),
      if self.is_admin { "yes" } else { "" }.to_string(),
    ]
  }
}

impl TableRow for Professional {
  const HEADERS: &'static [&'static str] = &["ID", "NAME", "CITY", "TRADES", "STATUS"];

  fn cells(&self) -> Vec<String> {
    let name = self
      .user
      .as_ref()
      .map(|u| {
        format!(
          "{} {}",
          u.first_name.as_deref().unwrap_or_default(),
          u.last_name.as_deref().unwrap_or_default()
        )
        .trim()
        .to_string()
      })
      .unwrap_or_default();
    let trades = self
      .trades
      .iter()
      .map(|t| t.trade.name.as_str())
      .collect::<Vec<_>>()
      .join(", ");
    vec![self.id.clone(), name, self.city.clone(), trades, self.status.clone()]
  }
}

impl TableRow for Company {
  const HEADERS: &'static [&'static str] = &["ID", "COMPANY", "CITY", "STATUS"];

  fn cells(&self) -> Vec<String> {
    vec![
      self.id.clone(),
      self.display_name().to_string(),
      self.city.clone().unwrap_or_default(),
      self.status.clone(),
    ]
  }
}

impl TableRow for ServiceRequest {
  const HEADERS: &'static [&'static str] = &["ID", "TITLE", "TRADE", "CLIENT", "STATUS"];

  fn cells(&self) -> Vec<String> {
    vec![
      self.id.clone(),
      self.title.clone(),
      self.trade.as_ref().map(|t| t.name.clone()).unwrap_or_default(),
      self.client.as_ref().map(|c| c.email.clone()).unwrap_or_default(),
      self.status.clone(),
    ]
  }
}

/// Left-aligned columns separated by two spaces.
pub fn table(headers: &[&str], rows: &[Vec<String>]) -> String {
  let rows: Vec<Vec<String>> = rows
    .iter()
    .map(|r| r.iter().map(|c| truncate(c, MAX_CELL)).collect())
    .collect();

  let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
  for row in &rows {
    for (i, cell) in row.iter().enumerate() {
      if let Some(w) = widths.get_mut(i) {
        *w = (*w).max(cell.chars().count());
      }
    }
  }

  let mut out = String::new();
  let header: Vec<String> = headers.iter().map(|h| h.to_string()).collect();
  for row in std::iter::once(&header).chain(rows.iter()) {
    let line = row
      .iter()
      .zip(&widths)
      .map(|(cell, w)| format!("{:<width$}", cell, width = w))
      .collect::<Vec<_>>()
      .join("  ");
    out.push_str(line.trim_end());
    out.push('\n');
  }
  out
}

pub fn page<T: TableRow>(result: &QueryResult<PaginatedResult<T>>) -> String {
  let page = &result.data;
  let rows: Vec<Vec<String>> = page.data.iter().map(TableRow::cells).collect();

  let mut out = if rows.is_empty() {
    "No results.\n".to_string()
  } else {
    table(T::HEADERS, &rows)
  };
  out.push_str(&format!(
    "\nPage {} of {} ({} total)\n",
    page.page,
    page.total_pages.max(1),
    page.total
  ));
  out.push_str(&source_note(result));
  out
}

pub fn record<T: serde::Serialize>(result: &QueryResult<T>) -> String {
  let mut out = serde_json::to_string_pretty(&result.data).unwrap_or_default();
  out.push('\n');
  out.push_str(&source_note(result));
  out
}

pub fn dashboard(stats: &DashboardStats) -> String {
  let mut rows = vec![
    vec![
      "users".to_string(),
      stats.users.total.to_string(),
      format!("{} new (7d)", stats.users.new_last7_days),
      format!("{} active (30d)", stats.users.active_last30_days),
    ],
    vec![
      "requests".to_string(),
      stats.requests.total.to_string(),
      format!("{} new (7d)", stats.requests.new_last7_days),
      stats
        .requests
        .by_status
        .iter()
        .map(|(status, n)| format!("{}={}", status, n))
        .collect::<Vec<_>>()
        .join(" "),
    ],
  ];
  for (name, p) in [
    ("professionals", &stats.professionals),
    ("companies", &stats.companies),
  ] {
    rows.push(vec![
      name.to_string(),
      p.total.to_string(),
      format!("{} pending", p.pending),
      format!("{} verified, {} suspended", p.verified, p.suspended),
    ]);
  }

  table(&["RESOURCE", "TOTAL", "", ""], &rows)
}

pub fn identity(identity: &Identity) -> String {
  format!(
    "{} <{}>{}\n",
    identity.display_name(),
    identity.email,
    if identity.is_admin { " (admin)" } else { "" }
  )
}

/// Footer telling where the data came from.
pub fn source_note<T>(result: &QueryResult<T>) -> String {
  let at = result.fetched_at.format("%Y-%m-%d %H:%M:%S UTC");
  match (&result.source, &result.error) {
    (_, Some(error)) => format!("Showing data from {} (refresh failed: {})\n", at, error),
    (CacheSource::Network, None) => String::new(),
    (CacheSource::CacheFresh, None) => format!("Cached at {}\n", at),
    (CacheSource::CacheStale, None) | (CacheSource::Fallback, None) => {
      format!("Cached at {} (stale, refreshing)\n", at)
    }
  }
}
