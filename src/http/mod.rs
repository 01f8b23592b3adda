//! HTTP client adapter: bearer-token request pipeline over a pluggable transport.

mod client;
mod transport;

pub use client::HttpClient;
pub use transport::{ApiPath, ApiRequest, Method, RawResponse, ReqwestTransport, Transport};
