//! Server lifecycle and shutdown coordination.
//!
//! ```text
//! Starting ──bind──▶ Listening ──signal──▶ Draining ──connections done──▶ Closed
//! ```
//!
//! Termination signals are delivered to [`Lifecycle::request_shutdown`], which
//! performs the `Listening → Draining` transition at most once. Later requests
//! are logged and ignored, so a second SIGINT/SIGTERM during draining has no
//! effect on the shutdown sequence.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::watch;
use tracing::{info, warn};

use study_gateway_common::GatewayError;

/// Listening socket state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ServerState {
    Starting,
    Listening,
    Draining,
    Closed,
}

/// What asked the server to stop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownSource {
    /// SIGINT / Ctrl+C.
    Interrupt,
    /// SIGTERM.
    Terminate,
    /// Requested in-process.
    Manual,
}

impl fmt::Display for ShutdownSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Interrupt => "SIGINT",
            Self::Terminate => "SIGTERM",
            Self::Manual => "manual shutdown",
        })
    }
}

/// Shared handle to the server's lifecycle state.
#[derive(Clone)]
pub struct Lifecycle {
    state: Arc<watch::Sender<ServerState>>,
}

impl Default for Lifecycle {
    fn default() -> Self {
        Self::new()
    }
}

impl Lifecycle {
    /// New lifecycle in `Starting`.
    pub fn new() -> Self {
        let (tx, _) = watch::channel(ServerState::Starting);
        Self {
            state: Arc::new(tx),
        }
    }

    /// Current state.
    pub fn state(&self) -> ServerState {
        *self.state.borrow()
    }

    /// Observe state changes.
    pub fn subscribe(&self) -> watch::Receiver<ServerState> {
        self.state.subscribe()
    }

    /// `Starting → Listening`. Returns `false` if shutdown already began.
    pub fn mark_listening(&self) -> bool {
        self.state.send_if_modified(|state| {
            if *state == ServerState::Starting {
                *state = ServerState::Listening;
                true
            } else {
                false
            }
        })
    }

    /// Begin draining. Returns `true` only for the request that caused the
    /// transition.
    pub fn request_shutdown(&self, source: ShutdownSource) -> bool {
        let transitioned = self.state.send_if_modified(|state| {
            if *state < ServerState::Draining {
                *state = ServerState::Draining;
                true
            } else {
                false
            }
        });

        if transitioned {
            info!(%source, "Shutdown requested, draining connections");
        } else {
            warn!(%source, state = ?self.state(), "Shutdown already in progress, ignoring");
        }
        transitioned
    }

    /// Mark the server closed.
    pub fn mark_closed(&self) {
        self.state.send_replace(ServerState::Closed);
    }

    /// Resolve once draining has begun.
    pub async fn draining(&self) {
        self.wait_for(ServerState::Draining).await;
    }

    /// Resolve once the server is closed.
    pub async fn closed(&self) {
        self.wait_for(ServerState::Closed).await;
    }

    async fn wait_for(&self, target: ServerState) {
        let mut rx = self.subscribe();
        // The sender lives in `self`, so the channel cannot close here.
        let _ = rx.wait_for(|state| *state >= target).await;
    }
}

impl fmt::Debug for Lifecycle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Lifecycle")
            .field("state", &self.state())
            .finish()
    }
}

/// A source of signal deliveries. `None` means the stream has ended.
#[async_trait]
pub trait SignalStream: Send {
    async fn recv(&mut self) -> Option<()>;
}

#[cfg(unix)]
#[async_trait]
impl SignalStream for tokio::signal::unix::Signal {
    async fn recv(&mut self) -> Option<()> {
        tokio::signal::unix::Signal::recv(self).await
    }
}

/// Forward SIGINT and SIGTERM to `lifecycle` until the server closes.
///
/// Handlers are installed before this returns, so a failure to install them
/// is reported to the caller instead of being lost in a background task.
pub fn spawn_signal_listener(
    lifecycle: Lifecycle,
) -> Result<tokio::task::JoinHandle<()>, GatewayError> {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        let interrupt = signal(SignalKind::interrupt()).map_err(GatewayError::Signal)?;
        let terminate = signal(SignalKind::terminate()).map_err(GatewayError::Signal)?;

        Ok(tokio::spawn(forward_signals(lifecycle, interrupt, terminate)))
    }

    #[cfg(not(unix))]
    {
        Ok(tokio::spawn(async move {
            loop {
                tokio::select! {
                    result = tokio::signal::ctrl_c() => {
                        if let Err(e) = result {
                            warn!(error = %e, "Failed to listen for Ctrl+C");
                            break;
                        }
                        lifecycle.request_shutdown(ShutdownSource::Interrupt);
                    }
                    () = lifecycle.closed() => break,
                }
            }
        }))
    }
}

/// Deliver `interrupt` and `terminate` to `lifecycle` until the server
/// closes or either stream ends.
pub async fn forward_signals(
    lifecycle: Lifecycle,
    mut interrupt: impl SignalStream,
    mut terminate: impl SignalStream,
) {
    loop {
        let received = tokio::select! {
            received = interrupt.recv() => received.map(|()| ShutdownSource::Interrupt),
            received = terminate.recv() => received.map(|()| ShutdownSource::Terminate),
            () = lifecycle.closed() => break,
        };

        let Some(source) = received else {
            warn!("Signal stream ended, no longer listening for signals");
            break;
        };
        lifecycle.request_shutdown(source);
    }
}
