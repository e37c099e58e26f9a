//! Write-once response capability for API handlers.
//!
//! A [`ResponseWriter`] moves through three phases:
//!
//! ```text
//! Pending ──write_head/write──▶ HeadersSent ──end──▶ Finished
//!    └──────────────end/send/json───────────────────────▲
//! ```
//!
//! Status and headers are only mutable while `Pending`. The dispatcher keeps
//! a clone of every writer it hands out and consults [`ResponseWriter::headers_sent`]
//! before it considers writing a fallback, which is what guarantees a single
//! response per request.

use std::sync::Arc;

use axum::Json;
use axum::body::Body;
use axum::http::{HeaderMap, HeaderName, HeaderValue, Response, StatusCode, header};
use axum::response::IntoResponse;
use bytes::{Bytes, BytesMut};
use parking_lot::Mutex;
use serde::Serialize;

use study_gateway_common::ResponseError;

/// Message body of the uniform handler-failure response.
pub const INTERNAL_ERROR_MESSAGE: &str = "Internal Server Error";

/// Progress of a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponsePhase {
    /// Nothing committed; status and headers may still change.
    Pending,
    /// Status and headers are committed; body may still grow.
    HeadersSent,
    /// The response is complete.
    Finished,
}

#[derive(Debug)]
struct ResponseState {
    status: StatusCode,
    headers: HeaderMap,
    body: BytesMut,
    phase: ResponsePhase,
}

/// Shared handle to the response of one request.
///
/// Clones refer to the same response.
#[derive(Debug, Clone)]
pub struct ResponseWriter {
    inner: Arc<Mutex<ResponseState>>,
}

impl Default for ResponseWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl ResponseWriter {
    /// Create a pending `200 OK` response with no headers.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(ResponseState {
                status: StatusCode::OK,
                headers: HeaderMap::new(),
                body: BytesMut::new(),
                phase: ResponsePhase::Pending,
            })),
        }
    }

    /// Current phase.
    pub fn phase(&self) -> ResponsePhase {
        self.inner.lock().phase
    }

    /// Whether status and headers have been committed.
    pub fn headers_sent(&self) -> bool {
        self.phase() != ResponsePhase::Pending
    }

    /// Whether the response has been ended.
    pub fn is_finished(&self) -> bool {
        self.phase() == ResponsePhase::Finished
    }

    /// Set the status code.
    pub fn status(&self, status: StatusCode) -> Result<(), ResponseError> {
        let mut state = self.inner.lock();
        ensure_pending(&state)?;
        state.status = status;
        Ok(())
    }

    /// Set a header, replacing any previous value.
    pub fn set_header(&self, name: HeaderName, value: HeaderValue) -> Result<(), ResponseError> {
        let mut state = self.inner.lock();
        ensure_pending(&state)?;
        state.headers.insert(name, value);
        Ok(())
    }

    /// Commit status and headers without ending the response.
    pub fn write_head(&self) -> Result<(), ResponseError> {
        let mut state = self.inner.lock();
        ensure_pending(&state)?;
        state.phase = ResponsePhase::HeadersSent;
        Ok(())
    }

    /// Append a body chunk, committing the head if needed.
    pub fn write(&self, chunk: impl AsRef<[u8]>) -> Result<(), ResponseError> {
        let mut state = self.inner.lock();
        if state.phase == ResponsePhase::Finished {
            return Err(ResponseError::AlreadyFinished);
        }
        state.phase = ResponsePhase::HeadersSent;
        state.body.extend_from_slice(chunk.as_ref());
        Ok(())
    }

    /// Append a final chunk and finish the response.
    pub fn end(&self, chunk: impl AsRef<[u8]>) -> Result<(), ResponseError> {
        let mut state = self.inner.lock();
        if state.phase == ResponsePhase::Finished {
            return Err(ResponseError::AlreadyFinished);
        }
        state.body.extend_from_slice(chunk.as_ref());
        state.phase = ResponsePhase::Finished;
        Ok(())
    }

    /// Set the status and finish with `body`.
    pub fn send(&self, status: StatusCode, body: impl AsRef<[u8]>) -> Result<(), ResponseError> {
        self.status(status)?;
        self.end(body)
    }

    /// Finish with a plain-text body.
    pub fn text(&self, status: StatusCode, body: &str) -> Result<(), ResponseError> {
        self.set_header(
            header::CONTENT_TYPE,
            HeaderValue::from_static("text/plain; charset=utf-8"),
        )?;
        self.send(status, body)
    }

    /// Finish with a JSON body.
    pub fn json<T: Serialize + ?Sized>(
        &self,
        status: StatusCode,
        value: &T,
    ) -> Result<(), ResponseError> {
        let body = serde_json::to_vec(value)?;
        self.set_header(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        )?;
        self.send(status, body)
    }

    /// Take the committed response, if any.
    ///
    /// A writer left in `HeadersSent` is closed with whatever body was
    /// written. Returns `None` while the writer is still `Pending`.
    pub fn take_committed(&self) -> Option<Response<Body>> {
        let mut state = self.inner.lock();
        if state.phase == ResponsePhase::Pending {
            return None;
        }
        state.phase = ResponsePhase::Finished;

        let body: Bytes = std::mem::take(&mut state.body).freeze();
        let mut response = Response::new(Body::from(body));
        *response.status_mut() = state.status;
        *response.headers_mut() = std::mem::take(&mut state.headers);
        Some(response)
    }
}

fn ensure_pending(state: &ResponseState) -> Result<(), ResponseError> {
    if state.phase == ResponsePhase::Pending {
        Ok(())
    } else {
        Err(ResponseError::HeadersAlreadySent)
    }
}

/// JSON `{"message": ...}` response.
pub fn message_response(status: StatusCode, message: &str) -> Response<Body> {
    (status, Json(serde_json::json!({ "message": message }))).into_response()
}

/// The uniform handler-failure response.
pub fn internal_error_response() -> Response<Body> {
    message_response(StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_ERROR_MESSAGE)
}
