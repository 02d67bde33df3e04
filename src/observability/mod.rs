//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Prepared request / received response
//!     → hooks.rs (ordered, per-hook guarded execution)
//!     → record.rs (build HttpLogRecord from request/response)
//!     → obscurer.rs (accumulative redaction chain)
//!     → record.rs (elide empty fields, wrap under "http")
//!     → logging.rs (Logger → LogSink → tracing event)
//!
//! Side channel:
//!     → metrics.rs (records emitted, hook failures, identity failures)
//! ```
//!
//! # Design Decisions
//! - Hooks observe, they never alter what is sent or returned
//! - A failing hook is logged and counted, never propagated
//! - Records are sparse: absent fields mean "not set"

pub mod hooks;
pub mod logging;
pub mod metrics;
pub mod obscurer;
pub mod record;

pub use hooks::{
    request_hook, response_hook, BoxError, DefaultRequestLoggingHook, DefaultResponseLoggingHook,
    HookContext, HookError, HookOutcome, HookResult, RequestHook, ResponseHook,
};
pub use logging::{LogEntry, LogLevel, LogSink, Logger, MemorySink, TracingSink};
pub use obscurer::{apply_obscurers, obscurer, LogRecordObscurer, RedactHeaders};
pub use record::{HttpLogRecord, LoggableRecord, HTTP_LOG_KEY};
