//! Network transport for svcbridge.
//!
//! Calls service functions over HTTP: `POST /api/{service}/{function}` with the
//! argument list as a JSON body, and the JSON response body as the result.
//! This is the guaranteed fallback path, so it never reports itself unavailable.

pub mod client;
pub mod config;

pub use client::NetworkStrategy;
pub use config::NetworkConfig;
