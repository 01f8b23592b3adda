//! Data-fetching and cache layer of the marketplace admin console.
//!
//! Every resource call goes through [`http::HttpClient`], which attaches the
//! session token and ends the session on 401. [`api`] maps resources onto
//! typed functions, [`cache`] keeps their results keyed and deduplicated, and
//! [`session`] owns login state. [`context::AdminContext`] wires them up.

pub mod api;
pub mod cache;
pub mod config;
pub mod context;
pub mod error;
pub mod http;
pub mod logging;
pub mod session;

#[cfg(test)]
mod testing;
