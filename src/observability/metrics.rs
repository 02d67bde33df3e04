//! Metrics collection.
//!
//! # Responsibilities
//! - Count log records emitted by the default hooks
//! - Count hook failures (errors and panics) per direction
//! - Count identity propagation failures
//!
//! # Metrics
//! - `http_client_log_records_total` (counter): records emitted, by direction
//! - `http_client_hook_failures_total` (counter): failed hook runs, by direction
//! - `http_client_identity_failures_total` (counter): header stamping failures
//!
//! # Design Decisions
//! - Uses the `metrics` facade; installing an exporter is left to the host
//! - Without a recorder installed every call is a no-op

use std::fmt;

/// Which side of the exchange a hook or record belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Request,
    Response,
}

impl Direction {
    pub fn as_str(self) -> &'static str {
        match self {
            Direction::Request => "request",
            Direction::Response => "response",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub fn record_log_record(direction: Direction) {
    ::metrics::counter!("http_client_log_records_total", "direction" => direction.as_str())
        .increment(1);
}

pub fn record_hook_failure(direction: Direction) {
    ::metrics::counter!("http_client_hook_failures_total", "direction" => direction.as_str())
        .increment(1);
}

pub fn record_identity_failure() {
    ::metrics::counter!("http_client_identity_failures_total").increment(1);
}
