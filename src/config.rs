//! Configuration loading.
//!
//! The configuration is a JSON document:
//!
//! ```json
//! {
//!   "endpoints": [
//!     {"method": "GET", "path": "/ping", "status": 200, "delay_ms": 0,
//!      "payload_inline": {"ok": true}},
//!     {"method": "GET", "path": "/users", "status": 200, "delay_ms": 250,
//!      "payload_file": "payloads/users.json"}
//!   ]
//! }
//! ```
//!
//! Loading turns it into an [`EndpointTable`] or fails with a [`ConfigError`]
//! that lists every problem found. Nothing past this module ever sees an
//! invalid endpoint.

use std::fmt::Display;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use serde_json::Value;
use tracing::warn;

use crate::mock::endpoint::{Endpoint, EndpointError, EndpointTable, Payload, TableError};

/// Raw configuration document.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    pub endpoints: Vec<EndpointConfig>,
}

/// Raw endpoint definition, before validation.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EndpointConfig {
    pub method: String,
    pub path: String,
    pub status: i64,
    pub delay_ms: i64,
    #[serde(default)]
    pub payload_inline: Option<Value>,
    /// Resolved against the process working directory.
    #[serde(default)]
    pub payload_file: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("endpoint #{index} ({method} {path}): {source}")]
    Endpoint {
        index: usize,
        method: String,
        path: String,
        #[source]
        source: EndpointError,
    },
    #[error(transparent)]
    Table(#[from] TableError),
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Configuration file not found: {}", .0.display())]
    NotFound(PathBuf),
    #[error("Could not read configuration file {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid JSON in configuration file: {0}")]
    Parse(#[source] serde_json::Error),
    #[error("Invalid configuration: {0}")]
    Schema(#[source] serde_json::Error),
    #[error("Invalid configuration: {}", join(.0, "; "))]
    Invalid(Vec<ValidationError>),
    #[error("Missing payload files: {}", display_paths(.0))]
    MissingPayloadFiles(Vec<PathBuf>),
}

fn join<I>(items: I, sep: &str) -> String
where
    I: IntoIterator,
    I::Item: Display,
{
    items
        .into_iter()
        .map(|item| item.to_string())
        .collect::<Vec<_>>()
        .join(sep)
}

fn display_paths(paths: &[PathBuf]) -> String {
    join(paths.iter().map(|p| p.display()), ", ")
}

impl Config {
    /// Parses a configuration document without validating endpoint values.
    ///
    /// Malformed JSON and a document of the wrong shape are reported
    /// separately.
    pub fn from_json_str(content: &str) -> Result<Self, ConfigError> {
        let value: Value = serde_json::from_str(content).map_err(ConfigError::Parse)?;
        Config::deserialize(value).map_err(ConfigError::Schema)
    }

    /// Validates every endpoint and builds the lookup table.
    ///
    /// All invalid endpoints are reported together. Duplicate and empty
    /// checks run once every endpoint is individually valid.
    pub fn to_table(&self) -> Result<EndpointTable, ConfigError> {
        let mut endpoints = Vec::with_capacity(self.endpoints.len());
        let mut errors = Vec::new();

        for (index, raw) in self.endpoints.iter().enumerate() {
            match raw.to_endpoint() {
                Ok(endpoint) => endpoints.push(endpoint),
                Err(source) => errors.push(ValidationError::Endpoint {
                    index,
                    method: raw.method.clone(),
                    path: raw.path.clone(),
                    source,
                }),
            }
        }

        if !errors.is_empty() {
            return Err(ConfigError::Invalid(errors));
        }

        EndpointTable::new(endpoints)
            .map_err(|e| ConfigError::Invalid(vec![ValidationError::Table(e)]))
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.to_table().map(|_| ())
    }
}

impl EndpointConfig {
    pub fn to_endpoint(&self) -> Result<Endpoint, EndpointError> {
        let payload = Payload::from_sources(self.payload_inline.clone(), self.payload_file.clone())?;
        Endpoint::new(
            self.method.clone(),
            self.path.clone(),
            self.status,
            self.delay_ms,
            payload,
        )
    }
}

/// Loads, validates and checks payload files for the configuration at `path`.
pub fn load_config(path: &Path) -> Result<EndpointTable, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::NotFound(path.to_path_buf()));
    }

    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    let table = Config::from_json_str(&content)?.to_table()?;
    check_payload_files(&table)?;

    for endpoint in table.iter().filter(|e| e.status().is_informational()) {
        warn!(
            method = endpoint.method(),
            path = endpoint.path(),
            status = endpoint.status().as_u16(),
            "1xx status is sent as the final response; most clients will wait for another"
        );
    }

    Ok(table)
}

/// Fails with every file-backed payload whose file does not exist.
///
/// Only existence is checked; contents are parsed when requests arrive.
pub fn check_payload_files(table: &EndpointTable) -> Result<(), ConfigError> {
    let missing: Vec<PathBuf> = table
        .iter()
        .filter_map(|endpoint| endpoint.payload().file())
        .filter(|file| !file.exists())
        .map(Path::to_path_buf)
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(ConfigError::MissingPayloadFiles(missing))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_minimal_config() {
        let config = Config::from_json_str(
            r#"{"endpoints":[{"method":"GET","path":"/ping","status":200,"delay_ms":0,"payload_inline":{"ok":true}}]}"#,
        )
        .unwrap();

        assert_eq!(config.endpoints.len(), 1);
        let table = config.to_table().unwrap();
        assert_eq!(table.lookup("GET", "/ping").unwrap().status().as_u16(), 200);
    }

    #[test]
    fn inline_payload_may_be_any_json() {
        let config = Config::from_json_str(
            r#"{"endpoints":[{"method":"GET","path":"/list","status":200,"delay_ms":0,"payload_inline":[1,"two"]}]}"#,
        )
        .unwrap();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn null_inline_counts_as_missing() {
        let config = Config::from_json_str(
            r#"{"endpoints":[{"method":"GET","path":"/","status":200,"delay_ms":0,"payload_inline":null}]}"#,
        )
        .unwrap();

        match config.validate().unwrap_err() {
            ConfigError::Invalid(errors) => assert!(matches!(
                errors[0],
                ValidationError::Endpoint {
                    source: EndpointError::MissingPayload,
                    ..
                }
            )),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn malformed_json_is_parse_error() {
        assert!(matches!(
            Config::from_json_str("{\"endpoints\": ["),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn wrong_shape_is_schema_error() {
        assert!(matches!(
            Config::from_json_str(r#"{"routes": []}"#),
            Err(ConfigError::Schema(_))
        ));
        assert!(matches!(
            Config::from_json_str(
                r#"{"endpoints":[{"method":"GET","path":"/","status":"200","delay_ms":0,"payload_inline":{}}]}"#
            ),
            Err(ConfigError::Schema(_))
        ));
    }

    #[test]
    fn error_message_names_endpoint() {
        let config = Config::from_json_str(
            r#"{"endpoints":[{"method":"get","path":"/x","status":200,"delay_ms":0,"payload_inline":{}}]}"#,
        )
        .unwrap();

        let message = config.validate().unwrap_err().to_string();
        assert_eq!(
            message,
            r#"Invalid configuration: endpoint #0 (get /x): HTTP method must be uppercase, got: "get""#
        );
    }
}
