//! Box readiness.
//!
//! Boxes take a while to start (models are loaded on boot), so callers poll
//! `GET /info` until the reported status is `ready`. [`StatusPoller`] turns
//! that polling into a stream of distinct status values and offers
//! [`StatusPoller::wait_for_ready`] on top of it.
//!
//! Polling runs on a spawned tokio task. It stops when the caller's
//! [`CancellationToken`] fires or when the [`StatusStream`] is dropped,
//! whichever comes first.

use crate::config::DEFAULT_POLL_INTERVAL;
use crate::error::BoxError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_util::sync::{CancellationToken, DropGuard};
use tracing::debug;

/// Status reported by a box that is ready to serve requests.
pub const READY: &str = "ready";

/// Status emitted by the poller when `/info` could not be fetched.
pub const UNAVAILABLE: &str = "unavailable";

/// Build and status information reported by `GET /info`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Info {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub version: i64,
    #[serde(default)]
    pub build: String,
    #[serde(default)]
    pub status: String,
}

impl Info {
    /// Whether the box reported [`READY`].
    pub fn is_ready(&self) -> bool {
        is_ready(&self.status)
    }
}

/// Whether `status` is the ready status.
pub fn is_ready(status: &str) -> bool {
    status == READY
}

/// Anything that can report box [`Info`]. Implemented by every box client.
#[async_trait]
pub trait InfoProvider: Send + Sync {
    async fn info(&self) -> Result<Info, BoxError>;
}

/// Receiving end of a status poll.
///
/// Yields each status value that differs from the previous one. Dropping the
/// stream stops the polling task.
#[derive(Debug)]
pub struct StatusStream {
    rx: mpsc::Receiver<String>,
    token: CancellationToken,
    _guard: DropGuard,
}

impl StatusStream {
    /// Next distinct status, or `None` once polling has stopped.
    pub async fn next(&mut self) -> Option<String> {
        self.rx.recv().await
    }

    /// Stop polling. Statuses already buffered can still be received.
    pub fn cancel(&self) {
        self.token.cancel();
    }
}

/// Polls a box until told to stop.
#[derive(Debug, Clone)]
pub struct StatusPoller {
    interval: Duration,
}

impl Default for StatusPoller {
    fn default() -> Self {
        Self {
            interval: DEFAULT_POLL_INTERVAL,
        }
    }
}

impl StatusPoller {
    /// A poller that checks once per [`DEFAULT_POLL_INTERVAL`].
    pub fn new() -> Self {
        Self::default()
    }

    /// Poll every `interval` instead. Tests use a few milliseconds.
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Time between two `/info` calls.
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Start polling `provider` and return the stream of status changes.
    ///
    /// The first `/info` call happens one interval after this returns. A
    /// failed call is reported as [`UNAVAILABLE`]. At most one status is
    /// buffered; the task waits for the consumer before polling again.
    ///
    /// Must be called from within a tokio runtime.
    pub fn status_stream<P>(&self, provider: Arc<P>, cancel: CancellationToken) -> StatusStream
    where
        P: InfoProvider + ?Sized + 'static,
    {
        let token = cancel.child_token();
        let (tx, rx) = mpsc::channel(1);
        tokio::spawn(poll_status(provider, self.interval, tx, token.clone()));
        StatusStream {
            rx,
            _guard: token.clone().drop_guard(),
            token,
        }
    }

    /// Block until `provider` reports [`READY`].
    ///
    /// Returns [`BoxError::Cancelled`] if `cancel` fires first. Transport
    /// failures while polling are not errors; the box simply counts as
    /// unavailable and polling continues.
    pub async fn wait_for_ready<P>(
        &self,
        provider: Arc<P>,
        cancel: &CancellationToken,
    ) -> Result<(), BoxError>
    where
        P: InfoProvider + ?Sized + 'static,
    {
        let mut stream = self.status_stream(provider, cancel.clone());
        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(BoxError::Cancelled),
                status = stream.next() => match status {
                    Some(status) if is_ready(&status) => {
                        debug!("Box is ready");
                        return Ok(());
                    }
                    Some(status) => debug!(status = %status, "Waiting for box"),
                    None => return Err(BoxError::Cancelled),
                },
            }
        }
    }

    /// [`wait_for_ready`](Self::wait_for_ready) bounded by `timeout`.
    pub async fn wait_for_ready_timeout<P>(
        &self,
        provider: Arc<P>,
        timeout: Duration,
    ) -> Result<(), BoxError>
    where
        P: InfoProvider + ?Sized + 'static,
    {
        let cancel = CancellationToken::new();
        match tokio::time::timeout(timeout, self.wait_for_ready(provider, &cancel)).await {
            Ok(result) => result,
            Err(_) => Err(BoxError::DeadlineExceeded(timeout)),
        }
    }
}

/// [`StatusPoller::status_stream`] with the default interval.
pub fn status_stream<P>(provider: Arc<P>, cancel: CancellationToken) -> StatusStream
where
    P: InfoProvider + ?Sized + 'static,
{
    StatusPoller::default().status_stream(provider, cancel)
}

/// [`StatusPoller::wait_for_ready`] with the default interval.
pub async fn wait_for_ready<P>(provider: Arc<P>, cancel: &CancellationToken) -> Result<(), BoxError>
where
    P: InfoProvider + ?Sized + 'static,
{
    StatusPoller::default().wait_for_ready(provider, cancel).await
}

async fn poll_status<P>(
    provider: Arc<P>,
    interval: Duration,
    tx: mpsc::Sender<String>,
    cancel: CancellationToken,
) where
    P: InfoProvider + ?Sized,
{
    let mut last = String::new();
    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            _ = tokio::time::sleep(interval) => {}
        }

        let status = match provider.info().await {
            Ok(info) => info.status,
            Err(err) => {
                debug!(error = %err, "Box info unavailable");
                UNAVAILABLE.to_string()
            }
        };
        if status == last {
            continue;
        }
        last.clone_from(&status);

        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            sent = tx.send(status) => {
                if sent.is_err() {
                    break;
                }
            }
        }
    }
    debug!("Status polling stopped");
}
