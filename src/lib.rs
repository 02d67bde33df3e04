//! Logging HTTP Client Library
//!
//! Wraps `reqwest` with an observability layer: identity headers on every
//! request, ordered and isolated logging hooks, redaction of log records,
//! and a hot-swappable configuration store.
//!
//! ```no_run
//! # async fn run() -> logging_http_client::ClientResult<()> {
//! let client = logging_http_client::create("billing-service")?;
//! let response = client.get("https://example.com/health").send().await?;
//! assert!(response.is_success());
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod http;
pub mod observability;

pub use config::{ConfigStore, LoggingConfig, LoggingSettings, ResponseSourcePolicy};
pub use crate::http::client::{create, delete, get, head, one_shot, options, patch, post, put};
pub use crate::http::{
    with_source_header, ClientError, ClientResult, HttpMethod, HttpResponse, LoggingClient,
    LoggingClientBuilder, PreparedRequest, RequestBuilder,
};
pub use observability::{
    HookContext, HttpLogRecord, LogLevel, LogRecordObscurer, LoggableRecord, Logger, RequestHook,
    ResponseHook,
};
