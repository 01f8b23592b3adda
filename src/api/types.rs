//! Domain records returned by the marketplace API.
//!
//! Field names follow the backend (camelCase on the wire). Optional fields
//! default so partially populated records still decode.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::error::ApiError;

/// One backend-managed entity kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
  Users,
  Professionals,
  Companies,
  Requests,
}

impl ResourceKind {
  pub const ALL: [ResourceKind; 4] = [
    ResourceKind::Users,
    ResourceKind::Professionals,
    ResourceKind::Companies,
    ResourceKind::Requests,
  ];

  /// Path segment under `/admin`, also used as the cache key segment.
  pub fn as_str(&self) -> &'static str {
    match self {
      ResourceKind::Users => "users",
      ResourceKind::Professionals => "professionals",
      ResourceKind::Companies => "companies",
      ResourceKind::Requests => "requests",
    }
  }

  /// Whether a status change on this kind shifts the dashboard counts.
  ///
  /// Provider and request counts are broken down by status; user stats
  /// only count sign-ups and activity.
  pub fn affects_dashboard_stats(&self) -> bool {
    !matches!(self, ResourceKind::Users)
  }

  /// Status values the backend is known to accept. Informational only;
  /// the backend stays authoritative.
  pub fn known_statuses(&self) -> &'static [&'static str] {
    match self {
      ResourceKind::Users => USER_STATUSES,
      ResourceKind::Professionals | ResourceKind::Companies => PROVIDER_STATUSES,
      ResourceKind::Requests => REQUEST_STATUSES,
    }
  }
}

impl fmt::Display for ResourceKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for ResourceKind {
  type Err = ApiError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.trim().to_lowercase().as_str() {
      "users" | "user" | "u" => Ok(ResourceKind::Users),
      "professionals" | "professional" | "pros" | "p" => Ok(ResourceKind::Professionals),
      "companies" | "company" | "c" => Ok(ResourceKind::Companies),
      "requests" | "request" | "r" => Ok(ResourceKind::Requests),
      other => Err(ApiError::Validation(format!("unknown resource: {}", other))),
    }
  }
}

pub const USER_STATUSES: &[&str] = &["ACTIVE", "PENDING", "SUSPENDED", "BANNED"];

pub const PROVIDER_STATUSES: &[&str] = &[
  "PENDING_VERIFICATION",
  "ACTIVE",
  "VERIFIED",
  "INACTIVE",
  "REJECTED",
  "SUSPENDED",
];

pub const REQUEST_STATUSES: &[&str] = &["PENDING", "ACCEPTED", "IN_PROGRESS", "DONE", "CANCELLED"];

// ============================================================================
// Auth
// ============================================================================

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct LoginCredentials {
  pub email: String,
  pub password: String,
}

/// The signed-in user as resolved by `/users/me`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct Identity {
  pub id: String,
  pub email: String,
  pub first_name: Option<String>,
  pub last_name: Option<String>,
  pub is_admin: bool,
}

impl Identity {
  pub fn display_name(&self) -> String {
    match (&self.first_name, &self.last_name) {
      (Some(first), Some(last)) => format!("{} {}", first, last),
      (Some(first), None) => first.clone(),
      _ => self.email.clone(),
    }
  }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
  pub access_token: String,
  pub user: Identity,
}

// ============================================================================
// Shared nested types
// ============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct UserRef {
  pub id: String,
  pub email: String,
  pub first_name: Option<String>,
  pub last_name: Option<String>,
  pub phone: Option<String>,
  pub status: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Trade {
  pub id: String,
  pub name: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct TradeLink {
  pub trade: Trade,
  pub is_primary: Option<bool>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct ServiceProviderSummary {
  pub id: String,
  pub average_rating: Option<f64>,
  pub total_reviews: u64,
}

// ============================================================================
// Resources
// ============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct User {
  pub id: String,
  pub email: String,
  pub first_name: String,
  pub last_name: String,
  pub phone: Option<String>,
  pub status: String,
  pub created_at: String,
  pub updated_at: String,
  pub has_client_profile: bool,
  pub has_professional_profile: bool,
  pub has_company_profile: Option<bool>,
  pub is_admin: bool,
  pub email_verified: Option<bool>,
  pub phone_verified: Option<bool>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct Professional {
  pub id: String,
  pub user_id: String,
  pub status: String,
  pub bio: Option<String>,
  pub city: String,
  pub zone: Option<String>,
  pub address: Option<String>,
  pub phone: Option<String>,
  pub whatsapp: Option<String>,
  pub website: Option<String>,
  pub profile_image: Option<String>,
  pub gallery: Vec<String>,
  pub user: Option<UserRef>,
  pub trades: Vec<TradeLink>,
  pub service_provider: Option<ServiceProviderSummary>,
  pub created_at: String,
  pub updated_at: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct Company {
  pub id: String,
  pub user_id: String,
  pub status: String,
  pub company_name: String,
  /// Older backends send `name` instead of `companyName`
  pub name: Option<String>,
  pub tax_id: Option<String>,
  pub description: Option<String>,
  pub address: Option<String>,
  pub city: Option<String>,
  pub phone: Option<String>,
  pub website: Option<String>,
  pub user: Option<UserRef>,
  pub trades: Vec<TradeLink>,
  pub service_provider: Option<ServiceProviderSummary>,
  pub created_at: String,
  pub updated_at: Option<String>,
}

impl Company {
  pub fn display_name(&self) -> &str {
    if self.company_name.is_empty() {
      self.name.as_deref().unwrap_or_default()
    } else {
      &self.company_name
    }
  }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct ServiceRequest {
  pub id: String,
  pub title: String,
  pub description: String,
  pub status: String,
  pub created_at: String,
  pub updated_at: String,
  pub client_id: String,
  pub client: Option<UserRef>,
  pub address: Option<String>,
  pub photos: Vec<String>,
  pub trade: Option<Trade>,
}

// ============================================================================
// Dashboard
// ============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct UserStats {
  pub total: u64,
  pub new_last7_days: u64,
  pub new_last30_days: u64,
  pub active_last30_days: u64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct RequestStats {
  pub total: u64,
  pub by_status: BTreeMap<String, u64>,
  pub new_last7_days: u64,
  pub new_last30_days: u64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ProviderStats {
  pub total: u64,
  pub verified: u64,
  pub pending: u64,
  pub suspended: u64,
}

/// Aggregate counts shown on the dashboard.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DashboardStats {
  pub users: UserStats,
  pub requests: RequestStats,
  pub professionals: ProviderStats,
  pub companies: ProviderStats,
}

// ============================================================================
// Commands
// ============================================================================

/// Body of `PUT /admin/users/{id}/verification`.
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct VerificationUpdate {
  #[serde(skip_serializing_if = "Option::is_none")]
  pub email_verified: Option<bool>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub phone_verified: Option<bool>,
}

impl VerificationUpdate {
  pub fn is_empty(&self) -> bool {
    self.email_verified.is_none() && self.phone_verified.is_none()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  #[test]
  fn test_resource_kind_parse() {
    assert_eq!("companies".parse::<ResourceKind>().unwrap(), ResourceKind::Companies);
    assert_eq!(" Pros ".parse::<ResourceKind>().unwrap(), ResourceKind::Professionals);
    assert!(matches!(
      "widgets".parse::<ResourceKind>(),
      Err(ApiError::Validation(_))
    ));
  }

  #[test]
  fn test_identity_defaults_non_admin() {
    let identity: Identity = serde_json::from_value(json!({"id": "u1", "email": "a@b.com"})).unwrap();
    assert!(!identity.is_admin);
    assert_eq!(identity.display_name(), "a@b.com");
  }

  #[test]
  fn test_dashboard_stats_decodes_by_status() {
    let stats: DashboardStats = serde_json::from_value(json!({
      "users": {"total": 12, "newLast7Days": 2, "newLast30Days": 5, "activeLast30Days": 9},
      "requests": {"total": 4, "byStatus": {"PENDING": 3, "DONE": 1}},
      "companies": {"total": 2, "verified": 1, "pending": 1, "suspended": 0}
    }))
    .unwrap();

    assert_eq!(stats.users.new_last7_days, 2);
    assert_eq!(stats.users.active_last30_days, 9);
    assert_eq!(stats.requests.by_status.get("PENDING"), Some(&3));
    assert_eq!(stats.professionals, ProviderStats::default());
  }

  #[test]
  fn test_company_name_fallback() {
    let company: Company = serde_json::from_value(json!({"id": "c1", "name": "Acme"})).unwrap();
    assert_eq!(company.display_name(), "Acme");
  }

  #[test]
  fn test_verification_update_skips_unset() {
    let update = VerificationUpdate {
      email_verified: Some(true),
      phone_verified: None,
    };
    assert_eq!(serde_json::to_value(&update).unwrap(), json!({"emailVerified": true}));
  }
}
