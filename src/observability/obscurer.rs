//! Log record obscurers.
//!
//! An obscurer takes a record and returns a record of the same shape,
//! either the same instance mutated or a new one. Obscurers run in
//! registration order, each one receiving the previous one's output.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::observability::record::HttpLogRecord;

/// Mask written over redacted values.
pub const REDACTED: &str = "******";

/// Transformation applied to a record right before it is serialized.
pub trait LogRecordObscurer: Send + Sync {
    fn obscure(&self, record: HttpLogRecord) -> HttpLogRecord;

    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }
}

impl<F> LogRecordObscurer for F
where
    F: Fn(HttpLogRecord) -> HttpLogRecord + Send + Sync,
{
    fn obscure(&self, record: HttpLogRecord) -> HttpLogRecord {
        self(record)
    }
}

/// Wrap a closure as a shareable obscurer.
pub fn obscurer<F>(f: F) -> Arc<dyn LogRecordObscurer>
where
    F: Fn(HttpLogRecord) -> HttpLogRecord + Send + Sync + 'static,
{
    Arc::new(f)
}

/// Run `obscurers` over `record` in order.
pub fn apply_obscurers(
    record: HttpLogRecord,
    obscurers: &[Arc<dyn LogRecordObscurer>],
) -> HttpLogRecord {
    obscurers
        .iter()
        .fold(record, |record, obscurer| obscurer.obscure(record))
}

/// Masks the values of the named headers in both request and response headers.
///
/// Names are matched case-insensitively.
#[derive(Debug, Clone)]
pub struct RedactHeaders {
    names: Vec<String>,
}

impl RedactHeaders {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            names: names
                .into_iter()
                .map(|n| n.as_ref().to_ascii_lowercase())
                .collect(),
        }
    }

    fn redact(&self, headers: &mut BTreeMap<String, String>) {
        for (name, value) in headers.iter_mut() {
            if self.names.iter().any(|n| n.eq_ignore_ascii_case(name)) {
                *value = REDACTED.to_string();
            }
        }
    }
}

impl LogRecordObscurer for RedactHeaders {
    fn obscure(&self, mut record: HttpLogRecord) -> HttpLogRecord {
        self.redact(&mut record.request_headers);
        self.redact(&mut record.response_headers);
        record
    }

    fn name(&self) -> &str {
        "redact_headers"
    }
}
