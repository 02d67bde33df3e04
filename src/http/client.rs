//! Logging HTTP client.
//!
//! # Responsibilities
//! - Build and hold the underlying `reqwest::Client`
//! - Prepare requests: shared headers, then identity headers
//! - Run request hooks, transmit, buffer the body, run response hooks
//!
//! # Design Decisions
//! - Composition over `reqwest::Client`; transport behavior is untouched
//! - Configuration is read from the injected `ConfigStore` on every call
//! - Logging failures never change what the caller gets back

use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use arc_swap::ArcSwap;
use http::header::HeaderMap;
use http::Method;
use reqwest::IntoUrl;

use crate::config::schema::LoggingConfig;
use crate::config::store::ConfigStore;
use crate::http::headers::ensure_identity_headers;
use crate::http::method::HttpMethod;
use crate::http::request::{PreparedRequest, RequestBuilder};
use crate::http::response::HttpResponse;
use crate::http::types::ClientResult;
use crate::observability::hooks::{run_request_hooks, run_response_hooks};
use crate::observability::logging::Logger;
use crate::observability::metrics;

/// Options passed through to the `reqwest::Client` builder.
#[derive(Debug, Clone, Default)]
pub struct TransportOptions {
    pub timeout: Option<Duration>,
    pub connect_timeout: Option<Duration>,
    /// Redirects to follow; `None` keeps reqwest's default policy.
    pub max_redirects: Option<usize>,
    pub no_proxy: bool,
    pub user_agent: Option<String>,
}

impl TransportOptions {
    pub fn build_client(&self) -> reqwest::Result<reqwest::Client> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = self.timeout {
            builder = builder.timeout(timeout);
        }
        if let Some(timeout) = self.connect_timeout {
            builder = builder.connect_timeout(timeout);
        }
        if let Some(max) = self.max_redirects {
            builder = builder.redirect(reqwest::redirect::Policy::limited(max));
        }
        if self.no_proxy {
            builder = builder.no_proxy();
        }
        if let Some(user_agent) = &self.user_agent {
            builder = builder.user_agent(user_agent.as_str());
        }
        builder.build()
    }
}

struct ClientInner {
    transport: reqwest::Client,
    options: TransportOptions,
    reusable_session: bool,
    source: Option<String>,
    logger: Logger,
    config: Arc<ConfigStore>,
    shared_headers: ArcSwap<HeaderMap>,
}

/// HTTP client that logs every request and response through the hook pipeline.
///
/// Cloning is cheap and clones share configuration, logger and shared headers.
#[derive(Clone)]
pub struct LoggingClient {
    inner: Arc<ClientInner>,
}

impl fmt::Debug for LoggingClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoggingClient")
            .field("source", &self.inner.source)
            .field("logger", &self.inner.logger)
            .field("reusable_session", &self.inner.reusable_session)
            .field("options", &self.inner.options)
            .finish()
    }
}

impl LoggingClient {
    pub fn builder() -> LoggingClientBuilder {
        LoggingClientBuilder::default()
    }

    /// Client with default options over the global store.
    pub fn new() -> ClientResult<Self> {
        Self::builder().build()
    }

    pub fn source(&self) -> Option<&str> {
        self.inner.source.as_deref()
    }

    pub fn logger(&self) -> &Logger {
        &self.inner.logger
    }

    pub fn config(&self) -> &Arc<ConfigStore> {
        &self.inner.config
    }

    pub fn is_reusable_session(&self) -> bool {
        self.inner.reusable_session
    }

    /// Headers added to every request that does not already carry them.
    pub fn shared_headers(&self) -> HeaderMap {
        HeaderMap::clone(&self.inner.shared_headers.load())
    }

    pub fn set_shared_headers(&self, headers: HeaderMap) {
        self.inner.shared_headers.store(Arc::new(headers));
    }

    pub fn clear_shared_headers(&self) {
        self.set_shared_headers(HeaderMap::new());
    }

    pub fn request<U: IntoUrl>(&self, method: impl Into<Method>, url: U) -> RequestBuilder {
        RequestBuilder::new(self.clone(), self.inner.transport.request(method.into(), url))
    }

    pub fn get<U: IntoUrl>(&self, url: U) -> RequestBuilder {
        self.request(HttpMethod::Get, url)
    }

    pub fn post<U: IntoUrl>(&self, url: U) -> RequestBuilder {
        self.request(HttpMethod::Post, url)
    }

    pub fn put<U: IntoUrl>(&self, url: U) -> RequestBuilder {
        self.request(HttpMethod::Put, url)
    }

    pub fn delete<U: IntoUrl>(&self, url: U) -> RequestBuilder {
        self.request(HttpMethod::Delete, url)
    }

    pub fn patch<U: IntoUrl>(&self, url: U) -> RequestBuilder {
        self.request(HttpMethod::Patch, url)
    }

    pub fn head<U: IntoUrl>(&self, url: U) -> RequestBuilder {
        self.request(HttpMethod::Head, url)
    }

    pub fn options<U: IntoUrl>(&self, url: U) -> RequestBuilder {
        self.request(HttpMethod::Options, url)
    }

    /// Apply shared headers and identity headers to `request`.
    ///
    /// Identity failures are logged and counted; the request is returned
    /// with whatever headers were stamped before the failure.
    pub fn prepare(&self, request: reqwest::Request) -> reqwest::Request {
        let config = self.inner.config.snapshot();
        self.prepare_with(request, &config)
    }

    fn prepare_with(&self, mut request: reqwest::Request, config: &LoggingConfig) -> reqwest::Request {
        let shared = self.inner.shared_headers.load();
        let headers = request.headers_mut();
        for name in shared.keys() {
            if !headers.contains_key(name) {
                for value in shared.get_all(name) {
                    headers.append(name.clone(), value.clone());
                }
            }
        }

        if let Err(e) = ensure_identity_headers(
            headers,
            self.inner.source.as_deref(),
            config.correlation_id_provider.as_deref(),
        ) {
            metrics::record_identity_failure();
            self.inner
                .logger
                .error(format!("Error adding identity headers: {e}"));
        }
        request
    }

    /// Prepare and send `request` through the logging pipeline.
    pub async fn execute(&self, request: reqwest::Request) -> ClientResult<HttpResponse> {
        let config = self.inner.config.snapshot();
        let request = self.prepare_with(request, &config);
        let capture_body = config.request_logging_enabled && config.request_body_logging_enabled;
        let prepared = PreparedRequest::from_reqwest(&request, capture_body);
        run_request_hooks(&config, &self.inner.logger, &prepared);

        let transport = self.transport()?;
        let started = Instant::now();
        let response = transport.execute(request).await.map_err(|e| {
            tracing::debug!(
                request_id = prepared.request_id().unwrap_or_default(),
                error = %e,
                "Request failed"
            );
            e
        })?;
        let elapsed = started.elapsed();
        let response = HttpResponse::receive(response, prepared, elapsed).await?;

        let config = self.inner.config.snapshot();
        run_response_hooks(&config, &self.inner.logger, &response);
        Ok(response)
    }

    fn transport(&self) -> ClientResult<reqwest::Client> {
        if self.inner.reusable_session {
            Ok(self.inner.transport.clone())
        } else {
            Ok(self.inner.options.build_client()?)
        }
    }
}

/// Builder for [`LoggingClient`].
#[derive(Default)]
pub struct LoggingClientBuilder {
    source: Option<String>,
    logger: Option<Logger>,
    config: Option<Arc<ConfigStore>>,
    shared_headers: HeaderMap,
    single_use: bool,
    options: TransportOptions,
}

impl LoggingClientBuilder {
    /// Identity stamped into `x-source` when a request has none.
    pub fn source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    pub fn logger(mut self, logger: Logger) -> Self {
        self.logger = Some(logger);
        self
    }

    /// Store to read configuration from. Defaults to [`ConfigStore::global`].
    pub fn config(mut self, config: Arc<ConfigStore>) -> Self {
        self.config = Some(config);
        self
    }

    pub fn shared_headers(mut self, headers: HeaderMap) -> Self {
        self.shared_headers = headers;
        self
    }

    /// When false, a fresh transport is built for every send.
    pub fn reusable_session(mut self, reusable: bool) -> Self {
        self.single_use = !reusable;
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.options.timeout = Some(timeout);
        self
    }

    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.options.connect_timeout = Some(timeout);
        self
    }

    pub fn max_redirects(mut self, max: usize) -> Self {
        self.options.max_redirects = Some(max);
        self
    }

    pub fn no_proxy(mut self) -> Self {
        self.options.no_proxy = true;
        self
    }

    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.options.user_agent = Some(user_agent.into());
        self
    }

    pub fn build(self) -> ClientResult<LoggingClient> {
        let transport = self.options.build_client()?;
        let inner = ClientInner {
            transport,
            options: self.options,
            reusable_session: !self.single_use,
            source: self.source,
            logger: self.logger.unwrap_or_default(),
            config: self.config.unwrap_or_else(ConfigStore::global),
            shared_headers: ArcSwap::from_pointee(self.shared_headers),
        };
        Ok(LoggingClient {
            inner: Arc::new(inner),
        })
    }
}

/// Client identifying itself as `source`, over the global store.
pub fn create(source: impl Into<String>) -> ClientResult<LoggingClient> {
    LoggingClient::builder().source(source).build()
}

/// Request on a single-use client over the global store.
///
/// The transport is built for this request only; add a body, headers or a
/// timeout on the returned builder before sending.
pub fn one_shot<U: IntoUrl>(method: HttpMethod, url: U) -> ClientResult<RequestBuilder> {
    Ok(LoggingClient::builder()
        .reusable_session(false)
        .build()?
        .request(method, url))
}

pub fn get<U: IntoUrl>(url: U) -> ClientResult<RequestBuilder> {
    one_shot(HttpMethod::Get, url)
}

pub fn post<U: IntoUrl>(url: U) -> ClientResult<RequestBuilder> {
    one_shot(HttpMethod::Post, url)
}

pub fn put<U: IntoUrl>(url: U) -> ClientResult<RequestBuilder> {
    one_shot(HttpMethod::Put, url)
}

pub fn delete<U: IntoUrl>(url: U) -> ClientResult<RequestBuilder> {
    one_shot(HttpMethod::Delete, url)
}

pub fn patch<U: IntoUrl>(url: U) -> ClientResult<RequestBuilder> {
    one_shot(HttpMethod::Patch, url)
}

pub fn head<U: IntoUrl>(url: U) -> ClientResult<RequestBuilder> {
    one_shot(HttpMethod::Head, url)
}

pub fn options<U: IntoUrl>(url: U) -> ClientResult<RequestBuilder> {
    one_shot(HttpMethod::Options, url)
}
