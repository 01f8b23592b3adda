//! Login and identity endpoints.

use super::types::{AuthResponse, Identity, LoginCredentials};
use crate::error::Result;
use crate::http::{ApiPath, HttpClient, Method};

#[derive(Clone)]
pub struct AuthApi {
  http: HttpClient,
}

impl AuthApi {
  pub fn new(http: HttpClient) -> Self {
    Self { http }
  }

  /// Exchange credentials for an access token. Does not touch token storage.
  pub async fn login(&self, credentials: &LoginCredentials) -> Result<AuthResponse> {
    self
      .http
      .request_json(
        Method::Post,
        &ApiPath::new(["auth", "login"]),
        &[],
        Some(serde_json::to_value(credentials)?),
      )
      .await
  }

  /// Resolve the identity behind the stored token.
  pub async fn me(&self) -> Result<Identity> {
    self
      .http
      .request_json(Method::Get, &ApiPath::new(["users", "me"]), &[], None)
      .await
  }
}
