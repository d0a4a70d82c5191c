//! Request dispatch and response synthesis.

use std::net::SocketAddr;
use std::sync::Arc;

use serde_json::Value;

use crate::http::request::{Method, Request};
use crate::http::response::{Response, ResponseBuilder, StatusCode};
use crate::lifecycle::ShutdownSignal;
use crate::mock::delay::{Interrupted, interruptible_delay};
use crate::mock::endpoint::{EndpointTable, PayloadError};
use crate::mock::observer::Observer;

/// Body returned for every request without a configured endpoint.
pub const NOT_FOUND_BODY: &[u8] = br#"{"error":"endpoint not found"}"#;

/// Body returned when a matched endpoint's payload cannot be produced.
pub const INTERNAL_ERROR_BODY: &[u8] = br#"{"error":"internal server error"}"#;

#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    /// Shutdown began while the response was being delayed; nothing should
    /// be written.
    #[error(transparent)]
    Interrupted(#[from] Interrupted),
}

/// Matches requests against the endpoint table and builds responses.
///
/// Holds no per-request state. One instance is shared by every connection.
pub struct Dispatcher {
    table: Arc<EndpointTable>,
    observer: Arc<dyn Observer>,
    shutdown: ShutdownSignal,
}

impl Dispatcher {
    pub fn new(table: EndpointTable, observer: Arc<dyn Observer>, shutdown: ShutdownSignal) -> Self {
        Self {
            table: Arc::new(table),
            observer,
            shutdown,
        }
    }

    /// Produces the response for one request.
    ///
    /// Matched endpoints are delayed by their configured amount before the
    /// response is built. Payload failures become a 500 for this request
    /// only. Responses to HEAD never carry a body, whatever the outcome.
    pub async fn dispatch(
        &self,
        request: &Request,
        peer: Option<SocketAddr>,
    ) -> Result<Response, DispatchError> {
        self.observer.request_received(peer, request);

        let method = request.method.as_str();
        let path = request.route_path();

        let Some(endpoint) = self.table.lookup(method, path) else {
            self.observer.response_not_found(method, path);
            return Ok(not_found(request.method));
        };

        self.observer.response_matched(endpoint);

        let payload = endpoint.payload().resolve();

        if !endpoint.delay().is_zero() {
            self.observer.delay_started(endpoint.delay());
            let mut shutdown = self.shutdown.clone();
            interruptible_delay(endpoint.delay(), &mut shutdown).await?;
        }

        let response = match payload.and_then(|value| {
            synthesize_response(endpoint.status(), request.method, &value)
        }) {
            Ok(response) => response,
            Err(e) => {
                self.observer.payload_failed(endpoint, &e);
                internal_error(request.method)
            }
        };

        Ok(response)
    }

    /// Reports that a response has been fully written to the client.
    pub fn response_written(&self, status: StatusCode) {
        self.observer.response_sent(status);
    }
}

/// Builds the response for a matched endpoint.
///
/// - 204 carries neither a body nor a Content-Type.
/// - HEAD gets the Content-Type and the Content-Length of the body a GET
///   would receive, but no body.
/// - Everything else gets the compact JSON body.
pub fn synthesize_response(
    status: StatusCode,
    method: Method,
    payload: &Value,
) -> Result<Response, PayloadError> {
    if status == StatusCode::NO_CONTENT {
        return Ok(ResponseBuilder::new(status).build());
    }

    let body = serde_json::to_vec(payload).map_err(PayloadError::Serialize)?;

    Ok(json_for(status, method, body))
}

pub fn not_found(method: Method) -> Response {
    json_for(StatusCode::NOT_FOUND, method, NOT_FOUND_BODY.to_vec())
}

pub fn internal_error(method: Method) -> Response {
    json_for(StatusCode::INTERNAL_SERVER_ERROR, method, INTERNAL_ERROR_BODY.to_vec())
}

/// JSON response, or for HEAD its headers alone with the Content-Length the
/// body would have had.
fn json_for(status: StatusCode, method: Method, body: Vec<u8>) -> Response {
    if method == Method::HEAD {
        return ResponseBuilder::new(status)
            .header("Content-Type", "application/json")
            .header("Content-Length", body.len().to_string())
            .build();
    }

    Response::json(status, body)
}
