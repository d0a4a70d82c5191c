//! Configured endpoints and the lookup table built from them.
//!
//! Everything here is constructed once at startup and never mutated, so the
//! table can be shared between connections behind an `Arc` without locking.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde_json::Value;

use crate::http::response::StatusCode;

const DESCRIBE_MAX_CHARS: usize = 50;

/// Why a single endpoint definition was rejected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EndpointError {
    #[error("HTTP method must be uppercase, got: {0:?}")]
    MethodNotUppercase(String),
    #[error("path must start with '/' and contain no '?' or whitespace, got: {0:?}")]
    InvalidPath(String),
    #[error("HTTP status code must be between 100-599, got: {0}")]
    StatusOutOfRange(i64),
    #[error("delay must be non-negative, got: {0}")]
    NegativeDelay(i64),
    #[error("either payload_inline or payload_file must be specified")]
    MissingPayload,
    #[error("cannot specify both payload_inline and payload_file")]
    ConflictingPayload,
}

/// Failure to produce a payload while serving a request.
#[derive(Debug, thiserror::Error)]
pub enum PayloadError {
    #[error("could not read payload file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid JSON in payload file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("could not serialize payload: {0}")]
    Serialize(#[source] serde_json::Error),
}

/// Where an endpoint's response body comes from.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    /// JSON stored directly in the configuration.
    Inline(Value),
    /// JSON file read on every request.
    File(PathBuf),
}

impl Payload {
    /// Builds a payload from the two optional configuration sources.
    ///
    /// Exactly one source must be present.
    pub fn from_sources(
        inline: Option<Value>,
        file: Option<PathBuf>,
    ) -> Result<Self, EndpointError> {
        match (inline, file) {
            (Some(value), None) => Ok(Payload::Inline(value)),
            (None, Some(path)) => Ok(Payload::File(path)),
            (None, None) => Err(EndpointError::MissingPayload),
            (Some(_), Some(_)) => Err(EndpointError::ConflictingPayload),
        }
    }

    /// Produces the JSON value to send.
    ///
    /// File payloads are read and parsed on every call, so edits to the file
    /// are picked up without a restart.
    pub fn resolve(&self) -> Result<Value, PayloadError> {
        match self {
            Payload::Inline(value) => Ok(value.clone()),
            Payload::File(path) => {
                let content = std::fs::read_to_string(path).map_err(|source| PayloadError::Read {
                    path: path.clone(),
                    source,
                })?;
                serde_json::from_str(&content).map_err(|source| PayloadError::Parse {
                    path: path.clone(),
                    source,
                })
            }
        }
    }

    /// Short human-readable description for logs.
    ///
    /// Inline payloads are rendered as compact JSON cut to 50 characters.
    pub fn describe(&self) -> String {
        match self {
            Payload::Inline(value) => {
                let json = value.to_string();
                if json.chars().count() > DESCRIBE_MAX_CHARS {
                    let head: String = json.chars().take(DESCRIBE_MAX_CHARS - 3).collect();
                    format!("payload_inline: {head}...")
                } else {
                    format!("payload_inline: {json}")
                }
            }
            Payload::File(path) => format!("payload_file: {}", path.display()),
        }
    }

    /// The backing file, if this is a file payload.
    pub fn file(&self) -> Option<&Path> {
        match self {
            Payload::File(path) => Some(path),
            Payload::Inline(_) => None,
        }
    }
}

/// A single configured route and the response it produces.
#[derive(Debug, Clone)]
pub struct Endpoint {
    method: String,
    path: String,
    status: StatusCode,
    delay: Duration,
    payload: Payload,
}

impl Endpoint {
    /// Validates and builds an endpoint.
    ///
    /// The method is taken verbatim and must be upper-case ASCII; it is
    /// never normalized. The path is matched byte-for-byte.
    pub fn new(
        method: impl Into<String>,
        path: impl Into<String>,
        status: i64,
        delay_ms: i64,
        payload: Payload,
    ) -> Result<Self, EndpointError> {
        let method = method.into();
        let path = path.into();

        if !is_uppercase_method(&method) {
            return Err(EndpointError::MethodNotUppercase(method));
        }
        if !is_literal_path(&path) {
            return Err(EndpointError::InvalidPath(path));
        }
        let status = u16::try_from(status)
            .ok()
            .and_then(StatusCode::from_u16)
            .ok_or(EndpointError::StatusOutOfRange(status))?;
        let delay_ms = u64::try_from(delay_ms).map_err(|_| EndpointError::NegativeDelay(delay_ms))?;

        Ok(Self {
            method,
            path,
            status,
            delay: Duration::from_millis(delay_ms),
            payload,
        })
    }

    pub fn method(&self) -> &str {
        &self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    pub fn payload(&self) -> &Payload {
        &self.payload
    }
}

fn is_uppercase_method(method: &str) -> bool {
    !method.is_empty()
        && method.bytes().any(|b| b.is_ascii_uppercase())
        && method
            .bytes()
            .all(|b| b.is_ascii_uppercase() || b == b'-' || b == b'_')
}

fn is_literal_path(path: &str) -> bool {
    path.starts_with('/') && !path.contains('?') && !path.chars().any(char::is_whitespace)
}

/// Why a set of endpoints could not form a table.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TableError {
    #[error("at least one endpoint must be configured")]
    Empty,
    #[error("endpoints #{first} and #{second} are both {method} {path}")]
    Duplicate {
        method: String,
        path: String,
        first: usize,
        second: usize,
    },
}

/// Immutable `(method, path)` → endpoint mapping.
#[derive(Debug, Clone)]
pub struct EndpointTable {
    endpoints: Vec<Endpoint>,
    // method -> path -> index into `endpoints`
    index: HashMap<String, HashMap<String, usize>>,
}

impl EndpointTable {
    /// Builds the table, rejecting an empty list and duplicate keys.
    pub fn new(endpoints: Vec<Endpoint>) -> Result<Self, TableError> {
        if endpoints.is_empty() {
            return Err(TableError::Empty);
        }

        let mut index: HashMap<String, HashMap<String, usize>> = HashMap::new();
        for (i, endpoint) in endpoints.iter().enumerate() {
            let by_path = index.entry(endpoint.method.clone()).or_default();
            if let Some(&first) = by_path.get(&endpoint.path) {
                return Err(TableError::Duplicate {
                    method: endpoint.method.clone(),
                    path: endpoint.path.clone(),
                    first,
                    second: i,
                });
            }
            by_path.insert(endpoint.path.clone(), i);
        }

        Ok(Self { endpoints, index })
    }

    /// Exact, case-sensitive lookup.
    pub fn lookup(&self, method: &str, path: &str) -> Option<&Endpoint> {
        self.index
            .get(method)
            .and_then(|by_path| by_path.get(path))
            .map(|&i| &self.endpoints[i])
    }

    pub fn len(&self) -> usize {
        self.endpoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.endpoints.is_empty()
    }

    /// Endpoints in configuration order.
    pub fn iter(&self) -> impl Iterator<Item = &Endpoint> {
        self.endpoints.iter()
    }
}
