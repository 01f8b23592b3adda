//! Everything a console process shares, built once and passed explicitly.

use std::sync::Arc;
use tracing::info;

use crate::api::{AdminApi, AuthApi, CachedAdminApi};
use crate::cache::{QueryClient, StaleTimes};
use crate::config::Config;
use crate::error::Result;
use crate::http::{HttpClient, ReqwestTransport, Transport};
use crate::session::{Session, SessionHandle, TokenStore};

#[derive(Clone)]
pub struct AdminContext {
  pub store: Arc<dyn TokenStore>,
  pub session_handle: SessionHandle,
  pub http: HttpClient,
  pub auth: AuthApi,
  pub admin: CachedAdminApi,
  pub cache: QueryClient,
  pub session: Session,
  pub page_size: u32,
}

impl AdminContext {
  /// Build the context against the configured REST API.
  pub fn init(config: &Config, store: Arc<dyn TokenStore>) -> Result<Self> {
    let transport = ReqwestTransport::new(&config.api.url, config.timeout())?;
    info!(api = %config.api.url, "admin context initialized");
    Ok(Self::with_transport(
      Arc::new(transport),
      store,
      config.stale_times(),
      config.page_size,
    ))
  }

  /// Build the context over any transport.
  pub fn with_transport(
    transport: Arc<dyn Transport>,
    store: Arc<dyn TokenStore>,
    stale: StaleTimes,
    page_size: u32,
  ) -> Self {
    let session_handle = SessionHandle::new(store.clone());
    let http = HttpClient::new(transport, session_handle.clone());
    let cache = QueryClient::new();
    let auth = AuthApi::new(http.clone());
    let admin = CachedAdminApi::new(AdminApi::new(http.clone()), cache.clone(), stale);
    let session = Session::new(session_handle.clone(), auth.clone(), cache.clone(), stale.identity);

    Self {
      store,
      session_handle,
      http,
      auth,
      admin,
      cache,
      session,
      page_size,
    }
  }

  /// Drop all cached data and end the session.
  pub fn reset(&self) -> Result<()> {
    self.session.logout()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::api::ListParams;
  use crate::http::Method;
  use crate::session::{MemoryTokenStore, SessionState};
  use crate::testing::MockBackend;
  use serde_json::json;

  fn context(backend: &Arc<MockBackend>) -> AdminContext {
    AdminContext::with_transport(
      backend.clone(),
      Arc::new(MemoryTokenStore::with_token("tok")),
      StaleTimes::default(),
      10,
    )
  }

  #[test]
  fn test_init_rejects_bad_url() {
    let config = Config {
      api: crate::config::ApiConfig {
        url: "nope".to_string(),
        timeout_secs: None,
      },
      ..Default::default()
    };
    assert!(AdminContext::init(&config, Arc::new(MemoryTokenStore::new())).is_err());
  }

  #[tokio::test]
  async fn test_parts_share_cache_and_session() {
    let backend = Arc::new(MockBackend::new());
    backend.respond(
      Method::Get,
      "/users/me",
      200,
      json!({"id": "u1", "email": "a@b.com", "isAdmin": true}),
    );
    backend.respond(Method::Get, "/admin/users", 200, json!({"data": []}));
    let ctx = context(&backend);

    ctx.session.restore().await.unwrap();
    ctx.admin.users(&ListParams::default()).await.unwrap();

    assert_eq!(ctx.cache.len(), 2);
    assert!(ctx.session_handle.is_authenticated());
  }

  #[tokio::test]
  async fn test_reset_clears_everything() {
    let backend = Arc::new(MockBackend::new());
    backend.respond(Method::Get, "/admin/users", 200, json!({"data": []}));
    let ctx = context(&backend);
    ctx.admin.users(&ListParams::default()).await.unwrap();

    ctx.reset().unwrap();

    assert!(ctx.cache.is_empty());
    assert_eq!(ctx.store.token().unwrap(), None);
    assert_eq!(ctx.session.state(), SessionState::Unauthenticated);
  }
}
