//! Typed request functions for the `/admin` endpoints.

use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use tracing::debug;

use super::envelope::{Envelope, PaginatedResult};
use super::types::{
  Company, DashboardStats, Professional, ResourceKind, ServiceRequest, User, VerificationUpdate,
};
use crate::error::{ApiError, Result};
use crate::http::{ApiPath, HttpClient, Method};

pub const DEFAULT_PAGE: u32 = 1;
pub const DEFAULT_LIMIT: u32 = 10;

/// Pagination and filter parameters for a list call.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ListParams {
  pub page: u32,
  pub limit: u32,
  pub status: Option<String>,
}

impl Default for ListParams {
  fn default() -> Self {
    Self {
      page: DEFAULT_PAGE,
      limit: DEFAULT_LIMIT,
      status: None,
    }
  }
}

impl ListParams {
  pub fn new(page: u32, limit: u32) -> Self {
    Self {
      page,
      limit,
      status: None,
    }
  }

  /// Filter by status. An empty filter means "no filter".
  pub fn with_status(mut self, status: impl Into<String>) -> Self {
    let status = status.into();
    self.status = if status.trim().is_empty() {
      None
    } else {
      Some(status)
    };
    self
  }

  pub fn validate(&self) -> Result<()> {
    if self.page < 1 {
      return Err(ApiError::Validation("page must be at least 1".to_string()));
    }
    if self.limit == 0 {
      return Err(ApiError::Validation("limit must be greater than 0".to_string()));
    }
    Ok(())
  }

  fn query(&self) -> Vec<(&'static str, String)> {
    let mut query = vec![("page", self.page.to_string()), ("limit", self.limit.to_string())];
    if let Some(status) = &self.status {
      query.push(("status", status.clone()));
    }
    query
  }
}

fn validate_id(id: &str) -> Result<()> {
  if id.trim().is_empty() {
    return Err(ApiError::Validation("id must not be empty".to_string()));
  }
  Ok(())
}

/// Admin resource access layer.
#[derive(Clone)]
pub struct AdminApi {
  http: HttpClient,
}

impl AdminApi {
  pub fn new(http: HttpClient) -> Self {
    Self { http }
  }

  /// Aggregate counts for the dashboard
  pub async fn dashboard_stats(&self) -> Result<DashboardStats> {
    self
      .http
      .request_json(
        Method::Get,
        &ApiPath::new(["admin", "dashboard", "stats"]),
        &[],
        None,
      )
      .await
  }

  /// List one page of a resource, normalizing whichever envelope comes back.
  pub async fn list<T: DeserializeOwned>(
    &self,
    kind: ResourceKind,
    params: &ListParams,
  ) -> Result<PaginatedResult<T>> {
    params.validate()?;

    let envelope: Envelope<T> = self
      .http
      .request_json(
        Method::Get,
        &ApiPath::new(["admin", kind.as_str()]),
        &params.query(),
        None,
      )
      .await?;

    let result = envelope.normalize(params.page, params.limit);
    debug!(%kind, page = result.page, total = result.total, "listed resources");
    Ok(result)
  }

  /// Fetch one record by id. A 404 becomes [`ApiError::NotFound`].
  pub async fn get<T: DeserializeOwned>(&self, kind: ResourceKind, id: &str) -> Result<T> {
    validate_id(id)?;

    self
      .http
      .request_json(
        Method::Get,
        &ApiPath::new(["admin", kind.as_str(), id]),
        &[],
        None,
      )
      .await
      .map_err(|e| match e {
        ApiError::Http { status: 404, .. } => ApiError::NotFound,
        other => other,
      })
  }

  /// Set the status of one record. The value is forwarded verbatim.
  pub async fn update_status(&self, kind: ResourceKind, id: &str, status: &str) -> Result<Value> {
    validate_id(id)?;
    self
      .http
      .request(
        Method::Put,
        &ApiPath::new(["admin", kind.as_str(), id, "status"]),
        &[],
        Some(json!({ "status": status })),
      )
      .await
  }

  pub async fn list_users(&self, params: &ListParams) -> Result<PaginatedResult<User>> {
    self.list(ResourceKind::Users, params).await
  }

  pub async fn get_user(&self, id: &str) -> Result<User> {
    self.get(ResourceKind::Users, id).await
  }

  pub async fn update_user_status(&self, id: &str, status: &str) -> Result<Value> {
    self.update_status(ResourceKind::Users, id, status).await
  }

  /// Toggle email/phone verification flags on a user.
  pub async fn update_user_verification(
    &self,
    id: &str,
    update: &VerificationUpdate,
  ) -> Result<User> {
    validate_id(id)?;
    if update.is_empty() {
      return Err(ApiError::Validation(
        "verification update sets no flags".to_string(),
      ));
    }

    self
      .http
      .request_json(
        Method::Put,
        &ApiPath::new(["admin", "users", id, "verification"]),
        &[],
        Some(serde_json::to_value(update)?),
      )
      .await
  }

  pub async fn list_professionals(
    &self,
    params: &ListParams,
  ) -> Result<PaginatedResult<Professional>> {
    self.list(ResourceKind::Professionals, params).await
  }

  pub async fn get_professional(&self, id: &str) -> Result<Professional> {
    self.get(ResourceKind::Professionals, id).await
  }

  pub async fn update_professional_status(&self, id: &str, status: &str) -> Result<Value> {
    self
      .update_status(ResourceKind::Professionals, id, status)
      .await
  }

  pub async fn list_companies(&self, params: &ListParams) -> Result<PaginatedResult<Company>> {
    self.list(ResourceKind::Companies, params).await
  }

  pub async fn get_company(&self, id: &str) -> Result<Company> {
    self.get(ResourceKind::Companies, id).await
  }

  pub async fn update_company_status(&self, id: &str, status: &str) -> Result<Value> {
    self.update_status(ResourceKind::Companies, id, status).await
  }

  pub async fn list_requests(
    &self,
    params: &ListParams,
  ) -> Result<PaginatedResult<ServiceRequest>> {
    self.list(ResourceKind::Requests, params).await
  }

  pub async fn get_request(&self, id: &str) -> Result<ServiceRequest> {
    self.get(ResourceKind::Requests, id).await
  }

  pub async fn update_request_status(&self, id: &str, status: &str) -> Result<Value> {
    self.update_status(ResourceKind::Requests, id, status).await
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::session::{MemoryTokenStore, SessionHandle};
  use crate::testing::MockBackend;
  use std::sync::Arc;

  fn api(backend: &Arc<MockBackend>) -> AdminApi {
    let session = SessionHandle::new(Arc::new(MemoryTokenStore::with_token("tok")));
    AdminApi::new(HttpClient::new(backend.clone(), session))
  }

  #[tokio::test]
  async fn test_list_companies_normalizes_nested_meta() {
    let backend = Arc::new(MockBackend::new());
    backend.respond(
      Method::Get,
      "/admin/companies",
      200,
      json!({
        "data": [{"id": "c1", "companyName": "Acme", "status": "ACTIVE"}],
        "meta": {"total": 42, "page": 2, "limit": 10, "totalPages": 5}
      }),
    );

    let result = api(&backend)
      .list_companies(&ListParams::new(2, 10))
      .await
      .unwrap();

    assert_eq!(result.total, 42);
    assert_eq!(result.page, 2);
    assert_eq!(result.limit, 10);
    assert_eq!(result.total_pages, 5);
    assert_eq!(result.data[0].company_name, "Acme");

    let sent = backend.requests();
    assert_eq!(
      sent[0].query,
      vec![
        ("page".to_string(), "2".to_string()),
        ("limit".to_string(), "10".to_string())
      ]
    );
  }

  #[tokio::test]
  async fn test_list_without_meta_uses_requested_page() {
    let backend = Arc::new(MockBackend::new());
    backend.respond(Method::Get, "/admin/professionals", 200, json!({}));

    let result = api(&backend)
      .list_professionals(&ListParams::new(3, 20))
      .await
      .unwrap();

    assert!(result.data.is_empty());
    assert_eq!((result.total, result.page, result.limit, result.total_pages), (0, 3, 20, 0));
  }

  #[tokio::test]
  async fn test_list_requests_forwards_status_filter() {
    let backend = Arc::new(MockBackend::new());
    backend.respond(Method::Get, "/admin/requests", 200, json!({"data": [], "total": 0}));

    api(&backend)
      .list_requests(&ListParams::default().with_status("PENDING"))
      .await
      .unwrap();

    let sent = backend.requests();
    assert!(sent[0]
      .query
      .contains(&("status".to_string(), "PENDING".to_string())));
  }

  #[tokio::test]
  async fn test_list_decodes_rows_without_default() {
    #[derive(Debug, serde::Deserialize)]
    struct Row {
      id: String,
    }

    let backend = Arc::new(MockBackend::new());
    backend.respond(
      Method::Get,
      "/admin/requests",
      200,
      json!({"data": [{"id": "r1"}, {"id": "r2"}], "total": 2}),
    );
    backend.respond(Method::Get, "/admin/users", 200, json!({"meta": {"total": 0}}));
    let api = api(&backend);

    let rows = api
      .list::<Row>(ResourceKind::Requests, &ListParams::default())
      .await
      .unwrap();
    assert_eq!(rows.total, 2);
    assert_eq!(
      rows.data.iter().map(|r| r.id.as_str()).collect::<Vec<_>>(),
      vec!["r1", "r2"]
    );

    let empty = api
      .list::<Row>(ResourceKind::Users, &ListParams::default())
      .await
      .unwrap();
    assert!(empty.data.is_empty());
  }

  #[tokio::test]
  async fn test_invalid_params_never_dispatch() {
    let backend = Arc::new(MockBackend::new());
    let api = api(&backend);

    let err = api.list_users(&ListParams::new(0, 10)).await.unwrap_err();
    assert!(matches!(err, ApiError::Validation(_)));

    let err = api.list_users(&ListParams::new(1, 0)).await.unwrap_err();
    assert!(matches!(err, ApiError::Validation(_)));

    let err = api.get_user("  ").await.unwrap_err();
    assert!(matches!(err, ApiError::Validation(_)));

    assert_eq!(backend.total_calls(), 0);
  }

  #[tokio::test]
  async fn test_get_by_id_404_is_not_found() {
    let backend = Arc::new(MockBackend::new());
    backend.respond(Method::Get, "/admin/users/missing", 404, json!({"message": "nope"}));

    let err = api(&backend).get_user("missing").await.unwrap_err();
    assert_eq!(err, ApiError::NotFound);
  }

  #[tokio::test]
  async fn test_get_by_id_other_errors_stay_distinct() {
    let backend = Arc::new(MockBackend::new());
    backend.respond_raw(Method::Get, "/admin/companies/c1", 503, "maintenance");

    let err = api(&backend).get_company("c1").await.unwrap_err();
    assert_eq!(err.status(), Some(503));
    assert!(!err.is_not_found());
  }

  #[tokio::test]
  async fn test_update_status_forwards_unknown_values() {
    let backend = Arc::new(MockBackend::new());
    backend.respond(
      Method::Put,
      "/admin/professionals/p1/status",
      200,
      json!({"id": "p1", "status": "SOMETHING_NEW"}),
    );

    let updated = api(&backend)
      .update_professional_status("p1", "SOMETHING_NEW")
      .await
      .unwrap();

    assert_eq!(updated["status"], "SOMETHING_NEW");
    let sent = backend.requests();
    assert_eq!(sent[0].body, Some(json!({"status": "SOMETHING_NEW"})));
  }

  #[tokio::test]
  async fn test_update_status_forwards_blank_value() {
    let backend = Arc::new(MockBackend::new());
    backend.respond(
      Method::Put,
      "/admin/companies/c1/status",
      400,
      json!({"message": "invalid status"}),
    );

    let err = api(&backend)
      .update_status(ResourceKind::Companies, "c1", "")
      .await
      .unwrap_err();

    assert_eq!(err.status(), Some(400));
    let sent = backend.requests();
    assert_eq!(sent[0].body, Some(json!({"status": ""})));
  }

  #[tokio::test]
  async fn test_update_user_verification() {
    let backend = Arc::new(MockBackend::new());
    backend.respond(
      Method::Put,
      "/admin/users/u1/verification",
      200,
      json!({"id": "u1", "emailVerified": true}),
    );
    let api = api(&backend);

    let user = api
      .update_user_verification(
        "u1",
        &VerificationUpdate {
          email_verified: Some(true),
          phone_verified: None,
        },
      )
      .await
      .unwrap();
    assert_eq!(user.email_verified, Some(true));

    let err = api
      .update_user_verification("u1", &VerificationUpdate::default())
      .await
      .unwrap_err();
    assert!(matches!(err, ApiError::Validation(_)));
    assert_eq!(backend.total_calls(), 1);
  }

  #[tokio::test]
  async fn test_dashboard_stats() {
    let backend = Arc::new(MockBackend::new());
    backend.respond(
      Method::Get,
      "/admin/dashboard/stats",
      200,
      json!({"users": {"total": 3}, "companies": {"total": 1, "pending": 1}}),
    );

    let stats = api(&backend).dashboard_stats().await.unwrap();
    assert_eq!(stats.users.total, 3);
    assert_eq!(stats.companies.pending, 1);
  }
}
