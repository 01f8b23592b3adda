//! Mutation commands and their invalidation fan-out.

use super::key::{keys, QueryKey};
use super::traits::Invalidates;
use crate::api::{ResourceKind, VerificationUpdate};

/// Intent to change the status of one record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusUpdate {
  pub kind: ResourceKind,
  pub id: String,
  pub status: String,
}

impl StatusUpdate {
  pub fn new(kind: ResourceKind, id: impl Into<String>, status: impl Into<String>) -> Self {
    Self {
      kind,
      id: id.into(),
      status: status.into(),
    }
  }
}

impl Invalidates for StatusUpdate {
  fn invalidates(&self) -> Vec<QueryKey> {
    let mut prefixes = vec![keys::resource(self.kind)];
    if self.kind.affects_dashboard_stats() {
      prefixes.push(keys::dashboard_stats());
    }
    prefixes
  }
}

/// Intent to change a user's verification flags.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerificationCommand {
  pub id: String,
  pub update: VerificationUpdate,
}

impl Invalidates for VerificationCommand {
  fn invalidates(&self) -> Vec<QueryKey> {
    vec![keys::resource(ResourceKind::Users)]
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_company_status_fans_out_to_dashboard() {
    let command = StatusUpdate::new(ResourceKind::Companies, "c1", "VERIFIED");
    assert_eq!(
      command.invalidates(),
      vec![keys::resource(ResourceKind::Companies), keys::dashboard_stats()]
    );
  }

  #[test]
  fn test_user_status_stays_local() {
    let command = StatusUpdate::new(ResourceKind::Users, "u1", "BANNED");
    assert_eq!(command.invalidates(), vec![keys::resource(ResourceKind::Users)]);
  }

  #[test]
  fn test_verification_invalidates_users() {
    let command = VerificationCommand {
      id: "u1".to_string(),
      update: VerificationUpdate::default(),
    };
    assert_eq!(command.invalidates(), vec![keys::resource(ResourceKind::Users)]);
  }
}
