//! Resource access layer: one typed function per resource and operation.

mod admin;
mod auth;
mod cached;
mod envelope;
pub mod types;

pub use admin::{AdminApi, ListParams, DEFAULT_LIMIT, DEFAULT_PAGE};
pub use auth::AuthApi;
pub use cached::CachedAdminApi;
pub use envelope::{page_count, Envelope, PageMeta, PaginatedResult};
pub use types::{
  AuthResponse, Company, DashboardStats, Identity, LoginCredentials, Professional, ResourceKind,
  ServiceRequest, User, VerificationUpdate,
};
