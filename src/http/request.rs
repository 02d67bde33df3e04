//! Outgoing request handling.
//!
//! # Responsibilities
//! - Build requests through a thin wrapper over `reqwest::RequestBuilder`
//! - Snapshot the prepared request for hooks and log records
//!
//! # Design Decisions
//! - Hooks see a `PreparedRequest` copy, never the `reqwest::Request` that is
//!   transmitted, so nothing a hook does reaches the wire
//! - Streaming bodies are not captured; only buffered bodies are

use std::collections::BTreeMap;
use std::fmt::Display;
use std::time::Duration;

use bytes::Bytes;
use http::header::{HeaderMap, HeaderName, HeaderValue};
use http::Method;
use serde::Serialize;
use url::Url;

use crate::http::client::LoggingClient;
use crate::http::headers::{header_str, X_CORRELATION_ID, X_REQUEST_ID, X_SOURCE};
use crate::http::response::HttpResponse;
use crate::http::types::ClientResult;

/// Immutable view of a request after preparation, as handed to hooks.
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedRequest {
    method: Method,
    url: Url,
    headers: HeaderMap,
    body: Option<Bytes>,
}

impl PreparedRequest {
    pub fn new(method: Method, url: Url) -> Self {
        Self {
            method,
            url,
            headers: HeaderMap::new(),
            body: None,
        }
    }

    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.append(name, value);
        self
    }

    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Copy of `request` as it is about to be transmitted.
    ///
    /// The buffered body is copied only when `capture_body` is set.
    pub fn from_reqwest(request: &reqwest::Request, capture_body: bool) -> Self {
        let body = if capture_body {
            request
                .body()
                .and_then(|body| body.as_bytes())
                .map(Bytes::copy_from_slice)
        } else {
            None
        };

        Self {
            method: request.method().clone(),
            url: request.url().clone(),
            headers: request.headers().clone(),
            body,
        }
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Buffered body, if any. `None` for streaming or absent bodies, and
    /// when request body logging is off.
    pub fn body(&self) -> Option<&Bytes> {
        self.body.as_ref()
    }

    pub fn request_id(&self) -> Option<&str> {
        header_str(&self.headers, &X_REQUEST_ID)
    }

    pub fn source(&self) -> Option<&str> {
        header_str(&self.headers, &X_SOURCE)
    }

    pub fn correlation_id(&self) -> Option<&str> {
        header_str(&self.headers, &X_CORRELATION_ID)
    }

    /// Decoded query parameters; repeated keys are joined with ", ".
    pub fn query_params(&self) -> BTreeMap<String, String> {
        let mut params: BTreeMap<String, String> = BTreeMap::new();
        for (key, value) in self.url.query_pairs() {
            params
                .entry(key.into_owned())
                .and_modify(|existing| {
                    existing.push_str(", ");
                    existing.push_str(&value);
                })
                .or_insert_with(|| value.into_owned());
        }
        params
    }
}

/// Request under construction, sent through the logging pipeline.
#[derive(Debug)]
#[must_use = "a RequestBuilder does nothing until it is sent"]
pub struct RequestBuilder {
    client: LoggingClient,
    inner: reqwest::RequestBuilder,
}

impl RequestBuilder {
    pub(crate) fn new(client: LoggingClient, inner: reqwest::RequestBuilder) -> Self {
        Self { client, inner }
    }

    fn map(self, f: impl FnOnce(reqwest::RequestBuilder) -> reqwest::RequestBuilder) -> Self {
        Self {
            client: self.client,
            inner: f(self.inner),
        }
    }

    pub fn header<K, V>(self, key: K, value: V) -> Self
    where
        HeaderName: TryFrom<K>,
        <HeaderName as TryFrom<K>>::Error: Into<http::Error>,
        HeaderValue: TryFrom<V>,
        <HeaderValue as TryFrom<V>>::Error: Into<http::Error>,
    {
        self.map(|inner| inner.header(key, value))
    }

    /// Merge `headers` into the request, replacing same-named entries.
    pub fn headers(self, headers: HeaderMap) -> Self {
        self.map(|inner| inner.headers(headers))
    }

    pub fn query<T: Serialize + ?Sized>(self, query: &T) -> Self {
        self.map(|inner| inner.query(query))
    }

    pub fn form<T: Serialize + ?Sized>(self, form: &T) -> Self {
        self.map(|inner| inner.form(form))
    }

    pub fn json<T: Serialize + ?Sized>(self, json: &T) -> Self {
        self.map(|inner| inner.json(json))
    }

    pub fn body<T: Into<reqwest::Body>>(self, body: T) -> Self {
        self.map(|inner| inner.body(body))
    }

    /// Per-request timeout, overriding the client's.
    pub fn timeout(self, timeout: Duration) -> Self {
        self.map(|inner| inner.timeout(timeout))
    }

    pub fn basic_auth<U: Display, P: Display>(self, username: U, password: Option<P>) -> Self {
        self.map(|inner| inner.basic_auth(username, password))
    }

    pub fn bearer_auth<T: Display>(self, token: T) -> Self {
        self.map(|inner| inner.bearer_auth(token))
    }

    /// Build the request without preparing or sending it.
    pub fn build(self) -> ClientResult<reqwest::Request> {
        let (_, request) = self.inner.build_split();
        Ok(request?)
    }

    /// Prepare, log and send the request.
    pub async fn send(self) -> ClientResult<HttpResponse> {
        let (_, request) = self.inner.build_split();
        self.client.execute(request?).await
    }
}
