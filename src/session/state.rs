//! Process-wide session state shared between the HTTP adapter and the
//! session component.

use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, warn};

use super::store::TokenStore;
use crate::api::types::Identity;
use crate::error::Result;

/// Authentication state of the console.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum SessionState {
  /// Token storage has not been read yet
  #[default]
  Unknown,
  /// No usable token, or the token belongs to a non-admin
  Unauthenticated,
  /// Token present and the resolved identity is an admin
  Authenticated(Identity),
}

impl SessionState {
  pub fn is_authenticated(&self) -> bool {
    matches!(self, SessionState::Authenticated(_))
  }

  pub fn is_known(&self) -> bool {
    !matches!(self, SessionState::Unknown)
  }

  pub fn identity(&self) -> Option<&Identity> {
    match self {
      SessionState::Authenticated(identity) => Some(identity),
      _ => None,
    }
  }
}

struct Inner {
  store: Arc<dyn TokenStore>,
  state: watch::Sender<SessionState>,
}

/// Cheap handle over the token store and the observable session state.
///
/// The HTTP adapter holds one to tear the session down on 401; views hold
/// one to gate rendering via [`SessionHandle::subscribe`].
#[derive(Clone)]
pub struct SessionHandle {
  inner: Arc<Inner>,
}

impl SessionHandle {
  pub fn new(store: Arc<dyn TokenStore>) -> Self {
    let (state, _) = watch::channel(SessionState::Unknown);
    Self {
      inner: Arc::new(Inner { store, state }),
    }
  }

  pub fn store(&self) -> &Arc<dyn TokenStore> {
    &self.inner.store
  }

  /// Current bearer token, if one is stored.
  pub fn token(&self) -> Result<Option<String>> {
    self.inner.store.token()
  }

  pub fn state(&self) -> SessionState {
    self.inner.state.borrow().clone()
  }

  pub fn is_authenticated(&self) -> bool {
    self.inner.state.borrow().is_authenticated()
  }

  /// Watch session transitions. A transition to `Unauthenticated` is the
  /// signal to send the user back to the login screen.
  pub fn subscribe(&self) -> watch::Receiver<SessionState> {
    self.inner.state.subscribe()
  }

  pub(crate) fn set_state(&self, state: SessionState) {
    debug!(?state, "session transition");
    self.inner.state.send_replace(state);
  }

  /// Forced teardown after the backend rejected the token.
  pub fn expire(&self) {
    warn!("session expired, clearing stored token");
    if let Err(e) = self.inner.store.clear_token() {
      warn!(error = %e, "failed to clear token after 401");
    }
    self.set_state(SessionState::Unauthenticated);
  }
}

impl std::fmt::Debug for SessionHandle {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("SessionHandle")
      .field("state", &*self.inner.state.borrow())
      .finish_non_exhaustive()
  }
}
