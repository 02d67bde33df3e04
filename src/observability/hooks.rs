//! Request/response logging hooks.
//!
//! # Responsibilities
//! - Define the hook contracts for both directions
//! - Provide the default hooks that log one record per request/response
//! - Run the configured hooks in order, each one in its own guarded scope
//!
//! # Design Decisions
//! - Per-hook isolation: a hook that errors or panics is logged and counted,
//!   and the next hook still runs
//! - Hooks receive shared references to immutable snapshots, so they cannot
//!   change what is sent or returned
//! - A disabled direction runs zero hooks regardless of registration

use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use thiserror::Error;

use crate::config::schema::LoggingConfig;
use crate::http::{HttpResponse, PreparedRequest};
use crate::observability::logging::{LogLevel, Logger};
use crate::observability::metrics::{self, Direction};
use crate::observability::record::HttpLogRecord;

/// Message of entries written by the default request hook.
pub const REQUEST_MESSAGE: &str = "REQUEST";
/// Message of entries written by the default response hook.
pub const RESPONSE_MESSAGE: &str = "RESPONSE";

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Outcome of a single hook invocation.
pub type HookResult = Result<(), BoxError>;

/// Failure of one hook, as reported by the pipeline.
#[derive(Debug, Error)]
pub enum HookError {
    #[error("hook {hook} failed: {source}")]
    Failed {
        hook: String,
        #[source]
        source: BoxError,
    },

    #[error("hook {hook} panicked: {message}")]
    Panicked { hook: String, message: String },
}

/// What a hook gets besides the request or response.
#[derive(Debug, Clone, Copy)]
pub struct HookContext<'a> {
    logger: &'a Logger,
    config: &'a LoggingConfig,
}

impl<'a> HookContext<'a> {
    pub fn new(logger: &'a Logger, config: &'a LoggingConfig) -> Self {
        Self { logger, config }
    }

    pub fn logger(&self) -> &'a Logger {
        self.logger
    }

    /// Configuration snapshot the current call runs with.
    pub fn config(&self) -> &'a LoggingConfig {
        self.config
    }

    /// Level the default hooks log at.
    pub fn level(&self) -> LogLevel {
        self.config.default_hook_log_level
    }
}

/// Hook run on every prepared request before it is transmitted.
pub trait RequestHook: Send + Sync {
    fn on_request(&self, ctx: &HookContext<'_>, request: &PreparedRequest) -> HookResult;

    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }
}

/// Hook run on every fully received response before it is returned.
pub trait ResponseHook: Send + Sync {
    fn on_response(&self, ctx: &HookContext<'_>, response: &HttpResponse) -> HookResult;

    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }
}

impl<F> RequestHook for F
where
    F: Fn(&HookContext<'_>, &PreparedRequest) -> HookResult + Send + Sync,
{
    fn on_request(&self, ctx: &HookContext<'_>, request: &PreparedRequest) -> HookResult {
        self(ctx, request)
    }
}

impl<F> ResponseHook for F
where
    F: Fn(&HookContext<'_>, &HttpResponse) -> HookResult + Send + Sync,
{
    fn on_response(&self, ctx: &HookContext<'_>, response: &HttpResponse) -> HookResult {
        self(ctx, response)
    }
}

/// Wrap a closure as a shareable request hook.
pub fn request_hook<F>(f: F) -> Arc<dyn RequestHook>
where
    F: Fn(&HookContext<'_>, &PreparedRequest) -> HookResult + Send + Sync + 'static,
{
    Arc::new(f)
}

/// Wrap a closure as a shareable response hook.
pub fn response_hook<F>(f: F) -> Arc<dyn ResponseHook>
where
    F: Fn(&HookContext<'_>, &HttpResponse) -> HookResult + Send + Sync + 'static,
{
    Arc::new(f)
}

/// Logs one `REQUEST` entry carrying the obscured request record.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultRequestLoggingHook;

impl RequestHook for DefaultRequestLoggingHook {
    fn on_request(&self, ctx: &HookContext<'_>, request: &PreparedRequest) -> HookResult {
        let payload = HttpLogRecord::from_request(request, ctx.config())?;
        ctx.logger().log(ctx.level(), REQUEST_MESSAGE, Some(payload));
        metrics::record_log_record(Direction::Request);
        Ok(())
    }

    fn name(&self) -> &str {
        "default_request_logging_hook"
    }
}

/// Logs one `RESPONSE` entry carrying the obscured response record.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultResponseLoggingHook;

impl ResponseHook for DefaultResponseLoggingHook {
    fn on_response(&self, ctx: &HookContext<'_>, response: &HttpResponse) -> HookResult {
        let payload = HttpLogRecord::from_response(response, ctx.config())?;
        ctx.logger().log(ctx.level(), RESPONSE_MESSAGE, Some(payload));
        metrics::record_log_record(Direction::Response);
        Ok(())
    }

    fn name(&self) -> &str {
        "default_response_logging_hook"
    }
}

/// Counts reported by one pipeline run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HookOutcome {
    pub invoked: usize,
    pub failed: usize,
}

/// Run the request hooks if request logging is enabled.
pub fn run_request_hooks(
    config: &LoggingConfig,
    logger: &Logger,
    request: &PreparedRequest,
) -> HookOutcome {
    if !config.request_logging_enabled {
        return HookOutcome::default();
    }

    let ctx = HookContext::new(logger, config);
    let mut outcome = HookOutcome::default();
    for hook in &config.request_logging_hooks {
        outcome.invoked += 1;
        if let Err(error) = guarded(hook.name(), || hook.on_request(&ctx, request)) {
            outcome.failed += 1;
            report_failure(Direction::Request, logger, &error);
        }
    }
    outcome
}

/// Run the response hooks if response logging is enabled.
pub fn run_response_hooks(
    config: &LoggingConfig,
    logger: &Logger,
    response: &HttpResponse,
) -> HookOutcome {
    if !config.response_logging_enabled {
        return HookOutcome::default();
    }

    let ctx = HookContext::new(logger, config);
    let mut outcome = HookOutcome::default();
    for hook in &config.response_logging_hooks {
        outcome.invoked += 1;
        if let Err(error) = guarded(hook.name(), || hook.on_response(&ctx, response)) {
            outcome.failed += 1;
            report_failure(Direction::Response, logger, &error);
        }
    }
    outcome
}

fn guarded(name: &str, run: impl FnOnce() -> HookResult) -> Result<(), HookError> {
    match catch_unwind(AssertUnwindSafe(run)) {
        Ok(Ok(())) => Ok(()),
        Ok(Err(source)) => Err(HookError::Failed {
            hook: name.to_string(),
            source,
        }),
        Err(payload) => Err(HookError::Panicked {
            hook: name.to_string(),
            message: panic_message(payload.as_ref()),
        }),
    }
}

pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

fn report_failure(direction: Direction, logger: &Logger, error: &HookError) {
    metrics::record_hook_failure(direction);
    logger.error(format!("Error applying {direction} logging hooks: {error}"));
}
