//! HTTP client subsystem.
//!
//! # Data Flow
//! ```text
//! caller
//!     → client.rs (verb method → RequestBuilder)
//!     → client.rs prepare (shared headers, headers.rs identity stamping)
//!     → request.rs (PreparedRequest snapshot) → request hooks
//!     → reqwest::Client::execute
//!     → response.rs (buffer body into HttpResponse) → response hooks
//!     → caller
//! ```

pub mod client;
pub mod headers;
pub mod method;
pub mod request;
pub mod response;
pub mod types;

pub use client::{LoggingClient, LoggingClientBuilder, TransportOptions};
pub use headers::{with_source_header, IdentityError, X_CORRELATION_ID, X_REQUEST_ID, X_SOURCE};
pub use method::HttpMethod;
pub use request::{PreparedRequest, RequestBuilder};
pub use response::HttpResponse;
pub use types::{ClientError, ClientResult};
