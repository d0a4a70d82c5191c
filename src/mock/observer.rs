//! Request lifecycle notifications.
//!
//! The dispatcher reports what it does through [`Observer`] and never writes
//! output itself. [`TracingObserver`] is the implementation used by the
//! binary; tests plug in their own to record events.

use std::net::SocketAddr;
use std::time::Duration;

use tracing::{debug, error, info};

use crate::http::request::Request;
use crate::http::response::StatusCode;
use crate::mock::endpoint::{Endpoint, PayloadError};

pub trait Observer: Send + Sync {
    /// A complete request was read from a client.
    fn request_received(&self, peer: Option<SocketAddr>, request: &Request);

    /// The request matched a configured endpoint.
    fn response_matched(&self, endpoint: &Endpoint);

    /// No endpoint is configured for the request's method and path.
    fn response_not_found(&self, method: &str, path: &str);

    /// A matched endpoint's payload could not be produced.
    fn payload_failed(&self, endpoint: &Endpoint, error: &PayloadError);

    /// The response has been completely written to the client.
    fn response_sent(&self, status: StatusCode);

    fn delay_started(&self, _delay: Duration) {}
}

/// Renders notifications as `tracing` events.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl Observer for TracingObserver {
    fn request_received(&self, peer: Option<SocketAddr>, request: &Request) {
        let peer = peer.map(|p| p.to_string()).unwrap_or_else(|| "unknown".to_string());
        info!(
            %peer,
            method = %request.method,
            target = %request.path,
            version = %request.version,
            "Request received"
        );

        for (name, value) in &request.headers {
            debug!(header = %name, %value);
        }

        if !request.body.is_empty() {
            debug!(body = %render_body(&request.body), "Request body");
        }
    }

    fn response_matched(&self, endpoint: &Endpoint) {
        info!(
            method = endpoint.method(),
            path = endpoint.path(),
            status = endpoint.status().as_u16(),
            payload = %endpoint.payload().describe(),
            delay_ms = endpoint.delay().as_millis() as u64,
            "Response matched"
        );
    }

    fn response_not_found(&self, method: &str, path: &str) {
        info!(method, path, "Response: 404 (no match)");
    }

    fn payload_failed(&self, endpoint: &Endpoint, error: &PayloadError) {
        error!(
            method = endpoint.method(),
            path = endpoint.path(),
            error = %error,
            "Failed to load payload"
        );
    }

    fn response_sent(&self, status: StatusCode) {
        debug!(status = status.as_u16(), "Response sent");
    }

    fn delay_started(&self, delay: Duration) {
        debug!(delay_ms = delay.as_millis() as u64, "Delaying response");
    }
}

/// Pretty-prints JSON bodies, falls back to lossy UTF-8 for anything else.
fn render_body(body: &[u8]) -> String {
    serde_json::from_slice::<serde_json::Value>(body)
        .ok()
        .and_then(|value| serde_json::to_string_pretty(&value).ok())
        .unwrap_or_else(|| String::from_utf8_lossy(body).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_body_pretty_prints_json() {
        assert_eq!(render_body(br#"{"a":1}"#), "{\n  \"a\": 1\n}");
    }

    #[test]
    fn render_body_falls_back_to_text() {
        assert_eq!(render_body(b"plain text"), "plain text");
        assert_eq!(render_body(b"caf\xc3\xa9"), "café");
    }
}
