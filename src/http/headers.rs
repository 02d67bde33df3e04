//! Reserved headers and identity propagation.
//!
//! # Responsibilities
//! - Name the headers that carry caller identity across services
//! - Stamp request id, source and correlation id on outgoing requests
//! - Flatten header maps into loggable string maps
//!
//! # Design Decisions
//! - Headers already present are never overwritten
//! - Stamping is fallible internally; the client logs the failure and sends
//!   the request anyway

use std::collections::BTreeMap;
use std::panic::{catch_unwind, AssertUnwindSafe};

use http::header::{HeaderMap, HeaderName, HeaderValue, InvalidHeaderValue};
use thiserror::Error;
use uuid::Uuid;

use crate::config::schema::CorrelationIdProvider;
use crate::observability::hooks::panic_message;

/// Caller-declared system identity.
pub const X_SOURCE: HeaderName = HeaderName::from_static("x-source");
/// Per-call unique identifier.
pub const X_REQUEST_ID: HeaderName = HeaderName::from_static("x-request-id");
/// Cross-service trace identifier.
pub const X_CORRELATION_ID: HeaderName = HeaderName::from_static("x-correlation-id");

/// Errors raised while stamping identity headers.
#[derive(Debug, Error)]
pub enum IdentityError {
    #[error("invalid value for header {header}: {source}")]
    InvalidHeaderValue {
        header: HeaderName,
        #[source]
        source: InvalidHeaderValue,
    },

    #[error("correlation id provider panicked: {0}")]
    ProviderPanicked(String),
}

/// Header map holding only `x-source: value`.
pub fn with_source_header(value: &str) -> Result<HeaderMap, InvalidHeaderValue> {
    let mut headers = HeaderMap::with_capacity(1);
    headers.insert(X_SOURCE, HeaderValue::from_str(value)?);
    Ok(headers)
}

/// First value of `name` as text, if present and visible ASCII.
pub fn header_str<'a>(headers: &'a HeaderMap, name: &HeaderName) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

/// Flatten headers into `name -> value`, joining repeated values with ", ".
///
/// Non-UTF-8 bytes are replaced rather than dropped.
pub fn header_fields(headers: &HeaderMap) -> BTreeMap<String, String> {
    let mut fields: BTreeMap<String, String> = BTreeMap::new();
    for (name, value) in headers {
        let value = String::from_utf8_lossy(value.as_bytes());
        fields
            .entry(name.as_str().to_string())
            .and_modify(|existing| {
                existing.push_str(", ");
                existing.push_str(&value);
            })
            .or_insert_with(|| value.into_owned());
    }
    fields
}

/// Ensure `x-request-id`, `x-source` and `x-correlation-id` are present.
///
/// Stops at the first failure; headers stamped before it are kept.
pub fn ensure_identity_headers(
    headers: &mut HeaderMap,
    source: Option<&str>,
    correlation_id_provider: Option<&dyn CorrelationIdProvider>,
) -> Result<(), IdentityError> {
    if !headers.contains_key(X_REQUEST_ID) {
        let request_id = Uuid::new_v4().to_string();
        headers.insert(X_REQUEST_ID, header_value(&X_REQUEST_ID, &request_id)?);
    }

    if let Some(source) = source {
        if !headers.contains_key(X_SOURCE) {
            headers.insert(X_SOURCE, header_value(&X_SOURCE, source)?);
        }
    }

    if let Some(provider) = correlation_id_provider {
        if !headers.contains_key(X_CORRELATION_ID) {
            let correlation_id = catch_unwind(AssertUnwindSafe(|| provider.correlation_id()))
                .map_err(|payload| IdentityError::ProviderPanicked(panic_message(payload.as_ref())))?;
            headers.insert(
                X_CORRELATION_ID,
                header_value(&X_CORRELATION_ID, &correlation_id)?,
            );
        }
    }

    Ok(())
}

fn header_value(header: &HeaderName, value: &str) -> Result<HeaderValue, IdentityError> {
    HeaderValue::from_str(value).map_err(|source| IdentityError::InvalidHeaderValue {
        header: header.clone(),
        source,
    })
}
