//! httpmocker - HTTP mock server
//!
//! Serves fixed JSON responses for exact `(method, path)` routes loaded from a
//! configuration file, with per-endpoint status codes and delays. Meant as a
//! stand-in API when integration-testing HTTP clients.

pub mod config;
pub mod http;
pub mod lifecycle;
pub mod mock;
pub mod server;
