//! Buffered responses.
//!
//! # Responsibilities
//! - Receive the full body before response hooks run
//! - Keep a back-reference to the request that produced the response
//!
//! # Design Decisions
//! - Bodies are buffered; hooks and callers read the same bytes
//! - Elapsed time covers send until response headers arrived

use std::borrow::Cow;
use std::time::Duration;

use bytes::Bytes;
use http::header::{HeaderMap, HeaderName, HeaderValue};
use http::StatusCode;
use serde::de::DeserializeOwned;
use url::Url;

use crate::http::headers::{header_str, X_SOURCE};
use crate::http::request::PreparedRequest;
use crate::http::types::ClientResult;

/// Fully received response.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    status: StatusCode,
    headers: HeaderMap,
    url: Url,
    body: Bytes,
    elapsed: Duration,
    request: PreparedRequest,
}

impl HttpResponse {
    /// Empty response to `request`.
    pub fn new(status: StatusCode, request: PreparedRequest) -> Self {
        Self {
            status,
            headers: HeaderMap::new(),
            url: request.url().clone(),
            body: Bytes::new(),
            elapsed: Duration::ZERO,
            request,
        }
    }

    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.append(name, value);
        self
    }

    pub fn with_headers(mut self, headers: HeaderMap) -> Self {
        self.headers.extend(headers);
        self
    }

    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    pub fn with_elapsed(mut self, elapsed: Duration) -> Self {
        self.elapsed = elapsed;
        self
    }

    /// Read the whole body of `response`.
    pub(crate) async fn receive(
        response: reqwest::Response,
        request: PreparedRequest,
        elapsed: Duration,
    ) -> reqwest::Result<Self> {
        let status = response.status();
        let headers = response.headers().clone();
        let url = response.url().clone();
        let body = response.bytes().await?;

        Ok(Self {
            status,
            headers,
            url,
            body,
            elapsed,
            request,
        })
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Final URL, after redirects.
    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn bytes(&self) -> &Bytes {
        &self.body
    }

    pub fn into_bytes(self) -> Bytes {
        self.body
    }

    /// Body decoded as UTF-8, invalid sequences replaced.
    pub fn text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.body)
    }

    pub fn json<T: DeserializeOwned>(&self) -> ClientResult<T> {
        Ok(serde_json::from_slice(&self.body)?)
    }

    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    /// The prepared request this response answers.
    pub fn request(&self) -> &PreparedRequest {
        &self.request
    }

    /// Value of the response's `x-source` header.
    pub fn source(&self) -> Option<&str> {
        header_str(&self.headers, &X_SOURCE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::types::ClientError;
    use http::Method;
    use serde_json::Value;

    fn response() -> HttpResponse {
        let request = PreparedRequest::new(Method::GET, Url::parse("http://example.com/a").unwrap());
        HttpResponse::new(StatusCode::OK, request)
    }

    #[test]
    fn test_body_accessors() {
        let res = response().with_body(r#"{"ok":true}"#);
        assert_eq!(res.text(), r#"{"ok":true}"#);
        assert_eq!(res.json::<Value>().unwrap()["ok"], true);
        assert_eq!(res.url().as_str(), "http://example.com/a");
        assert!(res.is_success());
    }

    #[test]
    fn test_invalid_json_is_decode_error() {
        let err = response().with_body("not json").json::<Value>().unwrap_err();
        assert!(matches!(err, ClientError::Decode(_)));
    }

    #[test]
    fn test_source_header() {
        assert_eq!(response().source(), None);
        let res = response().with_header(X_SOURCE, HeaderValue::from_static("upstream"));
        assert_eq!(res.source(), Some("upstream"));
    }
}
