//! Handler contract and the adapter that enforces it.
//!
//! Every API collaborator implements [`ApiHandler`]. Closures can be adapted
//! with [`handler_fn`] (async) or [`sync_handler_fn`] (blocking-free, plain
//! return). Whatever the style, the router only ever calls [`dispatch`],
//! which:
//!
//! 1. Buffers the request body under the configured limit
//! 2. Runs the handler on its own task, trapping errors and panics
//! 3. Emits the handler's committed response, or the uniform 500 fallback
//!    when nothing was committed

use std::future::Future;
use std::marker::PhantomData;
use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, Response};
use tokio::task::JoinError;
use tracing::{Instrument, debug, error, info_span};
use uuid::Uuid;

use crate::request::ApiRequest;
use crate::response::{ResponseWriter, internal_error_response, message_response};

/// A unit of business logic bound to one API route.
///
/// Implementations complete by writing to `res`, or fail by returning an
/// error (or panicking). The verb is not pre-validated.
#[async_trait]
pub trait ApiHandler: Send + Sync + 'static {
    /// Handle one request.
    async fn handle(&self, req: ApiRequest, res: ResponseWriter) -> anyhow::Result<()>;
}

/// Shared handler reference stored in the route table.
pub type SharedHandler = Arc<dyn ApiHandler>;

/// Adapter for async closures. See [`handler_fn`].
pub struct HandlerFn<F, Fut> {
    f: F,
    _fut: PhantomData<fn() -> Fut>,
}

/// Adapt an async closure into a [`SharedHandler`].
pub fn handler_fn<F, Fut>(f: F) -> SharedHandler
where
    F: Fn(ApiRequest, ResponseWriter) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
{
    Arc::new(HandlerFn {
        f,
        _fut: PhantomData,
    })
}

#[async_trait]
impl<F, Fut> ApiHandler for HandlerFn<F, Fut>
where
    F: Fn(ApiRequest, ResponseWriter) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
{
    async fn handle(&self, req: ApiRequest, res: ResponseWriter) -> anyhow::Result<()> {
        (self.f)(req, res).await
    }
}

/// Adapter for synchronous closures. See [`sync_handler_fn`].
pub struct SyncHandlerFn<F> {
    f: F,
}

/// Adapt a closure that completes by returning into a [`SharedHandler`].
pub fn sync_handler_fn<F>(f: F) -> SharedHandler
where
    F: Fn(&ApiRequest, &ResponseWriter) -> anyhow::Result<()> + Send + Sync + 'static,
{
    Arc::new(SyncHandlerFn { f })
}

#[async_trait]
impl<F> ApiHandler for SyncHandlerFn<F>
where
    F: Fn(&ApiRequest, &ResponseWriter) -> anyhow::Result<()> + Send + Sync + 'static,
{
    async fn handle(&self, req: ApiRequest, res: ResponseWriter) -> anyhow::Result<()> {
        (self.f)(&req, &res)
    }
}

/// How a handler invocation ended.
enum Outcome {
    Completed,
    Failed(anyhow::Error),
    Panicked(String),
}

/// Dispatch one request to `handler`, producing exactly one response.
pub async fn dispatch(
    route: &'static str,
    handler: SharedHandler,
    request: Request<Body>,
    body_limit: usize,
) -> Response<Body> {
    let request_id = Uuid::new_v4();
    let span = info_span!(
        "dispatch",
        request_id = %request_id,
        route,
        method = %request.method(),
    );

    async move {
        let request = match ApiRequest::from_axum(request, body_limit).await {
            Ok(request) => request,
            Err(rejection) => {
                debug!(?rejection, "Request body rejected");
                return message_response(rejection.status(), rejection.message());
            }
        };

        invoke(handler, request).await
    }
    .instrument(span)
    .await
}

/// Run `handler` and convert its outcome into a response.
pub async fn invoke(handler: SharedHandler, request: ApiRequest) -> Response<Body> {
    let writer = ResponseWriter::new();
    let task_writer = writer.clone();

    let task = tokio::spawn(
        async move { handler.handle(request, task_writer).await }.in_current_span(),
    );

    let outcome = match task.await {
        Ok(Ok(())) => Outcome::Completed,
        Ok(Err(e)) => Outcome::Failed(e),
        Err(e) => Outcome::Panicked(panic_message(e)),
    };

    let committed = writer.headers_sent();
    match &outcome {
        Outcome::Completed if committed => {}
        Outcome::Completed => {
            error!("API handler completed without writing a response");
        }
        Outcome::Failed(e) if committed => {
            error!(
                error = %format!("{e:#}"),
                details = ?e,
                "API handler error after response was committed; not sending fallback"
            );
        }
        Outcome::Failed(e) => {
            error!(error = %format!("{e:#}"), details = ?e, "API handler error");
        }
        Outcome::Panicked(message) if committed => {
            error!(
                panic = %message,
                "API handler panicked after response was committed; not sending fallback"
            );
        }
        Outcome::Panicked(message) => {
            error!(panic = %message, "API handler panicked");
        }
    }

    writer
        .take_committed()
        .unwrap_or_else(internal_error_response)
}

fn panic_message(err: JoinError) -> String {
    if !err.is_panic() {
        return err.to_string();
    }
    let payload = err.into_panic();
    if let Some(s) = payload.downcast_ref::<&'static str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
