//! Admin API with transparent caching.

use serde_json::Value;
use std::time::Duration;

use super::admin::{AdminApi, ListParams};
use super::envelope::PaginatedResult;
use super::types::{
  Company, DashboardStats, Professional, ResourceKind, ServiceRequest, User,
};
use crate::cache::{
  keys, Cacheable, Query, QueryClient, QueryResult, StaleTimes, StatusUpdate, VerificationCommand,
};
use crate::error::Result;

/// Admin client that reads through the query cache and invalidates it on
/// successful mutations.
#[derive(Clone)]
pub struct CachedAdminApi {
  inner: AdminApi,
  cache: QueryClient,
  stale: StaleTimes,
}

impl CachedAdminApi {
  pub fn new(inner: AdminApi, cache: QueryClient, stale: StaleTimes) -> Self {
    Self {
      inner,
      cache,
      stale,
    }
  }

  pub fn inner(&self) -> &AdminApi {
    &self.inner
  }

  pub fn cache(&self) -> &QueryClient {
    &self.cache
  }

  /// Dashboard aggregates, cached with the short dashboard TTL.
  pub async fn dashboard_stats(&self) -> Result<QueryResult<DashboardStats>> {
    self
      .cache
      .read(&keys::dashboard_stats(), self.stale.dashboard, || {
        let inner = self.inner.clone();
        async move { inner.dashboard_stats().await }
      })
      .await
  }

  /// Polling dashboard query for views that stay on screen.
  pub fn dashboard_query(&self, refetch_interval: Duration) -> Query<DashboardStats> {
    let inner = self.inner.clone();
    Query::new(self.cache.clone(), keys::dashboard_stats(), move || {
      let inner = inner.clone();
      async move { inner.dashboard_stats().await }
    })
    .with_stale_time(self.stale.dashboard)
    .with_refetch_interval(refetch_interval)
  }

  pub async fn list<T: Cacheable>(
    &self,
    kind: ResourceKind,
    params: &ListParams,
  ) -> Result<QueryResult<PaginatedResult<T>>> {
    // Reject bad params before they reach the cache
    params.validate()?;

    self
      .cache
      .read(&keys::list(kind, params), self.stale.resources, || {
        let inner = self.inner.clone();
        let params = params.clone();
        async move { inner.list(kind, &params).await }
      })
      .await
  }

  pub async fn detail<T: Cacheable>(&self, kind: ResourceKind, id: &str) -> Result<QueryResult<T>> {
    self
      .cache
      .read(&keys::detail(kind, id), self.stale.resources, || {
        let inner = self.inner.clone();
        let id = id.to_string();
        async move { inner.get(kind, &id).await }
      })
      .await
  }

  pub async fn users(&self, params: &ListParams) -> Result<QueryResult<PaginatedResult<User>>> {
    self.list(ResourceKind::Users, params).await
  }

  pub async fn user(&self, id: &str) -> Result<QueryResult<User>> {
    self.detail(ResourceKind::Users, id).await
  }

  pub async fn professionals(
    &self,
    params: &ListParams,
  ) -> Result<QueryResult<PaginatedResult<Professional>>> {
    self.list(ResourceKind::Professionals, params).await
  }

  pub async fn professional(&self, id: &str) -> Result<QueryResult<Professional>> {
    self.detail(ResourceKind::Professionals, id).await
  }

  pub async fn companies(
    &self,
    params: &ListParams,
  ) -> Result<QueryResult<PaginatedResult<Company>>> {
    self.list(ResourceKind::Companies, params).await
  }

  pub async fn company(&self, id: &str) -> Result<QueryResult<Company>> {
    self.detail(ResourceKind::Companies, id).await
  }

  pub async fn requests(
    &self,
    params: &ListParams,
  ) -> Result<QueryResult<PaginatedResult<ServiceRequest>>> {
    self.list(ResourceKind::Requests, params).await
  }

  pub async fn request(&self, id: &str) -> Result<QueryResult<ServiceRequest>> {
    self.detail(ResourceKind::Requests, id).await
  }

  /// Apply a status change, then invalidate the resource and, where the
  /// change moves aggregate counts, the dashboard.
  ///
  /// Concurrent updates to the same record are not serialized; whichever
  /// response lands last is what the next read sees.
  pub async fn update_status(&self, command: &StatusUpdate) -> Result<Value> {
    self
      .cache
      .mutate(command, || {
        self
          .inner
          .update_status(command.kind, &command.id, &command.status)
      })
      .await
  }

  pub async fn update_user_verification(&self, command: &VerificationCommand) -> Result<User> {
    self
      .cache
      .mutate(command, || {
        self
          .inner
          .update_user_verification(&command.id, &command.update)
      })
      .await
  }
}
