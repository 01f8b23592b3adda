//! Login, logout and start-up session restore.

use chrono::Duration;
use tokio::sync::watch;
use tracing::{info, warn};

use super::state::{SessionHandle, SessionState};
use crate::api::{AuthApi, Identity, LoginCredentials};
use crate::cache::{keys, QueryClient};
use crate::error::{ApiError, Result};

/// Session component: owns the `Unknown → Authenticated/Unauthenticated`
/// transitions.
///
/// Only admin identities are ever authenticated, and a token belonging to
/// anyone else is never left in storage.
#[derive(Clone)]
pub struct Session {
  handle: SessionHandle,
  auth: AuthApi,
  cache: QueryClient,
  identity_ttl: Duration,
}

impl Session {
  pub fn new(handle: SessionHandle, auth: AuthApi, cache: QueryClient, identity_ttl: Duration) -> Self {
    Self {
      handle,
      auth,
      cache,
      identity_ttl,
    }
  }

  pub fn handle(&self) -> &SessionHandle {
    &self.handle
  }

  pub fn state(&self) -> SessionState {
    self.handle.state()
  }

  pub fn subscribe(&self) -> watch::Receiver<SessionState> {
    self.handle.subscribe()
  }

  /// The authenticated admin, or `NotAuthorized`.
  pub fn require_admin(&self) -> Result<Identity> {
    match self.handle.state() {
      SessionState::Authenticated(identity) => Ok(identity),
      _ => Err(ApiError::NotAuthorized("not logged in".to_string())),
    }
  }

  /// Read token storage and resolve the identity behind it.
  ///
  /// Transport and server errors are returned and leave the state `Unknown`.
  pub async fn restore(&self) -> Result<SessionState> {
    let Some(_) = self.handle.token()? else {
      self.handle.set_state(SessionState::Unauthenticated);
      return Ok(self.state());
    };

    match self.resolve_identity().await {
      Ok(identity) if identity.is_admin => {
        info!(user = %identity.email, "session restored");
        self.handle.set_state(SessionState::Authenticated(identity));
      }
      Ok(identity) => {
        warn!(user = %identity.email, "stored token belongs to a non-admin, dropping it");
        self.drop_token()?;
      }
      // The adapter already cleared the token and moved to Unauthenticated
      Err(ApiError::NotAuthorized(_)) => {}
      Err(e) => return Err(e),
    }

    Ok(self.state())
  }

  /// Log in with credentials. Succeeds only for admin identities.
  pub async fn login(&self, credentials: &LoginCredentials) -> Result<Identity> {
    if credentials.email.trim().is_empty() || credentials.password.is_empty() {
      return Err(ApiError::Validation(
        "email and password are required".to_string(),
      ));
    }

    let response = self.auth.login(credentials).await?;
    if !response.user.is_admin {
      warn!(user = %response.user.email, "login rejected: not an admin");
      self.handle.set_state(SessionState::Unauthenticated);
      return Err(ApiError::NotAuthorized("user is not an admin".to_string()));
    }

    self.handle.store().set_token(&response.access_token)?;
    self.cache.invalidate(&keys::me());

    match self.resolve_identity().await {
      Ok(identity) if identity.is_admin => {
        info!(user = %identity.email, "logged in");
        self
          .handle
          .set_state(SessionState::Authenticated(identity.clone()));
        Ok(identity)
      }
      Ok(_) => {
        self.drop_token()?;
        Err(ApiError::NotAuthorized("user is not an admin".to_string()))
      }
      Err(e) => {
        self.drop_token()?;
        Err(e)
      }
    }
  }

  /// Clear the token and the whole cache.
  pub fn logout(&self) -> Result<()> {
    let cleared = self.handle.store().clear_token();
    self.cache.clear();
    self.handle.set_state(SessionState::Unauthenticated);
    info!("logged out");
    cleared
  }

  /// Identity behind the current token, cached under `["admin", "me"]`.
  ///
  /// A failed refresh is an error here even when an older identity is
  /// cached: authentication must never rest on a stale answer.
  async fn resolve_identity(&self) -> Result<Identity> {
    let result = self
      .cache
      .read(&keys::me(), self.identity_ttl, || {
        let auth = self.auth.clone();
        async move { auth.me().await }
      })
      .await?;

    match result.error {
      Some(error) => Err(error),
      None => Ok(result.data),
    }
  }

  fn drop_token(&self) -> Result<()> {
    self.cache.invalidate(&keys::me());
    self.handle.set_state(SessionState::Unauthenticated);
    self.handle.store().clear_token()
  }
}
