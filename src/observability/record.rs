//! HTTP log record model.
//!
//! # Responsibilities
//! - Represent one logged request or response as a flat record
//! - Build records from prepared requests and received responses
//! - Serialize to a sparse mapping under the `http` key
//!
//! # Design Decisions
//! - Fields holding a zero/empty value are dropped on serialization, so an
//!   absent key always means "not set"
//! - Bodies are only captured when body logging is enabled for that direction
//! - The obscurer chain runs exactly once, right before serialization

use std::collections::BTreeMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use url::Url;

use crate::config::schema::{LoggingConfig, ResponseSourcePolicy};
use crate::http::headers::header_fields;
use crate::http::{HttpResponse, PreparedRequest};
use crate::observability::obscurer::apply_obscurers;

/// Key under which every record is nested in an emitted payload.
pub const HTTP_LOG_KEY: &str = "http";

/// Serialization contract shared by log records.
///
/// Any `Serialize` struct can opt in to get the sparse mapping and the
/// `http` envelope. Non-struct values serialize to an empty mapping.
pub trait LoggableRecord: Serialize {
    /// Top-level fields of the record, minus those holding an empty value.
    fn to_loggable_map(&self) -> Result<Map<String, Value>, serde_json::Error> {
        match serde_json::to_value(self)? {
            Value::Object(fields) => Ok(elide_empty(fields)),
            _ => Ok(Map::new()),
        }
    }

    /// `{"http": <loggable map>}`.
    fn to_envelope(&self) -> Result<Value, serde_json::Error> {
        let mut envelope = Map::with_capacity(1);
        envelope.insert(HTTP_LOG_KEY.to_string(), Value::Object(self.to_loggable_map()?));
        Ok(Value::Object(envelope))
    }
}

/// True for `null`, `false`, `0`, `0.0`, `""`, `[]` and `{}`.
pub fn is_empty_value(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(fields) => fields.is_empty(),
    }
}

/// Drop every top-level entry holding an empty value.
pub fn elide_empty(fields: Map<String, Value>) -> Map<String, Value> {
    fields
        .into_iter()
        .filter(|(_, value)| !is_empty_value(value))
        .collect()
}

/// One logged request or response.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HttpLogRecord {
    pub request_id: String,
    pub request_source: String,
    pub request_method: String,
    pub request_url: String,
    pub request_query_params: BTreeMap<String, String>,
    pub request_headers: BTreeMap<String, String>,
    pub request_body: Option<String>,
    pub response_source: String,
    pub response_status: u16,
    pub response_headers: BTreeMap<String, String>,
    pub response_duration_ms: u64,
    pub response_body: Option<String>,
}

impl LoggableRecord for HttpLogRecord {}

impl HttpLogRecord {
    /// Raw record for a prepared request, before any obscurer runs.
    pub fn capture_request(request: &PreparedRequest, config: &LoggingConfig) -> Self {
        let request_body = request
            .body()
            .filter(|body| config.request_body_logging_enabled && !body.is_empty())
            .map(|body| String::from_utf8_lossy(body).into_owned());

        Self {
            request_id: request.request_id().unwrap_or_default().to_string(),
            request_source: request.source().unwrap_or_default().to_string(),
            request_method: request.method().to_string(),
            request_url: request.url().to_string(),
            request_query_params: request.query_params(),
            request_headers: header_fields(request.headers()),
            request_body,
            ..Self::default()
        }
    }

    /// Raw record for a received response, before any obscurer runs.
    pub fn capture_response(response: &HttpResponse, config: &LoggingConfig) -> Self {
        let body = response.bytes();
        let response_body = (config.response_body_logging_enabled && !body.is_empty())
            .then(|| String::from_utf8_lossy(body).into_owned());

        Self {
            request_id: response
                .request()
                .request_id()
                .unwrap_or_default()
                .to_string(),
            response_source: response_source(response, config.response_source_policy)
                .unwrap_or_default(),
            response_status: response.status().as_u16(),
            response_headers: header_fields(response.headers()),
            response_duration_ms: duration_ms(response.elapsed()),
            response_body,
            ..Self::default()
        }
    }

    /// Request record after the request obscurer chain, wrapped under `http`.
    pub fn from_request(
        request: &PreparedRequest,
        config: &LoggingConfig,
    ) -> Result<Value, serde_json::Error> {
        let record = apply_obscurers(
            Self::capture_request(request, config),
            &config.request_log_record_obscurers,
        );
        record.to_envelope()
    }

    /// Response record after the response obscurer chain, wrapped under `http`.
    pub fn from_response(
        response: &HttpResponse,
        config: &LoggingConfig,
    ) -> Result<Value, serde_json::Error> {
        let record = apply_obscurers(
            Self::capture_response(response, config),
            &config.response_log_record_obscurers,
        );
        record.to_envelope()
    }
}

fn response_source(response: &HttpResponse, policy: ResponseSourcePolicy) -> Option<String> {
    if let Some(source) = response.source() {
        return Some(source.to_string());
    }
    match policy {
        ResponseSourcePolicy::RequestUrlHost => host_with_port(response.request().url()),
        ResponseSourcePolicy::HeaderOnly => None,
    }
}

/// `host[:port]`, the port only when it is explicit and not the scheme default.
fn host_with_port(url: &Url) -> Option<String> {
    let host = url.host_str()?;
    Some(match url.port() {
        Some(port) => format!("{host}:{port}"),
        None => host.to_string(),
    })
}

fn duration_ms(elapsed: Duration) -> u64 {
    u64::try_from(elapsed.as_micros() / 1000).unwrap_or(u64::MAX)
}
