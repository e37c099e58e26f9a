//! Request descriptor handed to API handlers.
//!
//! [`ApiRequest`] is the fully-buffered view of an inbound request. The body
//! is read once by the dispatcher, under the configured size limit, so that
//! handlers can inspect it as many times as they like.

use std::collections::HashMap;

use axum::body::Body;
use axum::http::{HeaderMap, Method, Request, StatusCode, Uri, header};
use bytes::Bytes;
use http_body_util::LengthLimitError;
use serde::de::DeserializeOwned;

use study_gateway_common::RequestError;

/// Buffered HTTP request passed to an [`ApiHandler`](crate::handler::ApiHandler).
#[derive(Debug, Clone)]
pub struct ApiRequest {
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
}

/// Why a request body could not be collected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyRejection {
    /// The body exceeded the configured limit.
    TooLarge,
    /// The body stream failed.
    Unreadable,
}

impl BodyRejection {
    /// Status code sent to the client.
    pub fn status(self) -> StatusCode {
        match self {
            Self::TooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            Self::Unreadable => StatusCode::BAD_REQUEST,
        }
    }

    /// Message placed in the JSON error body.
    pub fn message(self) -> &'static str {
        match self {
            Self::TooLarge => "Payload Too Large",
            Self::Unreadable => "Bad Request",
        }
    }
}

impl ApiRequest {
    /// Create a request with an empty body and no headers.
    pub fn new(method: Method, uri: Uri) -> Self {
        Self {
            method,
            uri,
            headers: HeaderMap::new(),
            body: Bytes::new(),
        }
    }

    /// Replace the body.
    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    /// Replace the headers.
    pub fn with_headers(mut self, headers: HeaderMap) -> Self {
        self.headers = headers;
        self
    }

    /// Buffer an axum request, reading at most `limit` body bytes.
    pub async fn from_axum(request: Request<Body>, limit: usize) -> Result<Self, BodyRejection> {
        let (parts, body) = request.into_parts();

        let body = axum::body::to_bytes(body, limit).await.map_err(|e| {
            if e.into_inner().is::<LengthLimitError>() {
                BodyRejection::TooLarge
            } else {
                BodyRejection::Unreadable
            }
        })?;

        Ok(Self {
            method: parts.method,
            uri: parts.uri,
            headers: parts.headers,
            body,
        })
    }

    /// HTTP method.
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Request URI.
    pub fn uri(&self) -> &Uri {
        &self.uri
    }

    /// Request path without the query string.
    pub fn path(&self) -> &str {
        self.uri.path()
    }

    /// All request headers.
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Get a header value by name (case-insensitive).
    ///
    /// Values that are not valid visible ASCII are skipped.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Get the Content-Type header.
    pub fn content_type(&self) -> Option<&str> {
        self.header(header::CONTENT_TYPE.as_str())
    }

    /// Check if the request has a JSON content type.
    pub fn is_json(&self) -> bool {
        self.content_type()
            .is_some_and(|ct| ct.contains("application/json"))
    }

    /// Raw body bytes.
    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// Decode the body as JSON.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, RequestError> {
        Ok(serde_json::from_slice(&self.body)?)
    }

    /// Decode an `application/x-www-form-urlencoded` body.
    ///
    /// Later duplicates of a key win.
    pub fn form(&self) -> HashMap<String, String> {
        url::form_urlencoded::parse(&self.body)
            .into_owned()
            .collect()
    }

    /// Decode the query string into key/value pairs.
    pub fn query(&self) -> HashMap<String, String> {
        self.uri
            .query()
            .map(|q| {
                url::form_urlencoded::parse(q.as_bytes())
                    .into_owned()
                    .collect()
            })
            .unwrap_or_default()
    }
}
