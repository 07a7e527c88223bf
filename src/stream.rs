//! The streaming loop shared by every call site.
//!
//! A [`StreamContext`] owns the accumulated text of one streamed response and
//! the token that can cancel it. [`StreamContext::drive`] pulls events from an
//! SSE event stream and forwards them to a [`StreamSink`].

use async_trait::async_trait;
use futures::{Stream, StreamExt};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::client::ClientError;
pub use crate::sse::SseEvent;

/// Callbacks invoked while a stream is being driven.
///
/// Implementations own the presentation side (rendering, notifications).
/// Nothing here touches the accumulator directly.
#[async_trait]
pub trait StreamSink: Send {
    /// Called after each text delta has been appended, with the full text so far.
    async fn on_text(&mut self, accumulated: &str);

    /// Called when the backend reports an in-band error. The stream stops after this.
    async fn on_error(&mut self, message: &str);

    async fn on_subject(&mut self, _name: &str) {}

    async fn on_done(&mut self) {}
}

/// How a driven stream ended, when it did not fail at the transport level.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamOutcome {
    /// The byte stream ran out. `done` records whether a `done` event was seen.
    Completed { done: bool },
    /// The backend sent an `error` event.
    Failed(String),
    /// The context's token was cancelled before the stream finished.
    Cancelled,
}

/// Per-operation state for one streamed response.
#[derive(Debug, Default)]
pub struct StreamContext {
    accumulated: String,
    subject: Option<String>,
    cancel: CancellationToken,
}

impl StreamContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use an existing token, so another task can abandon this stream.
    pub fn with_cancel(cancel: CancellationToken) -> Self {
        Self {
            cancel,
            ..Self::default()
        }
    }

    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Text accumulated so far. Only ever grows while the stream runs.
    pub fn text(&self) -> &str {
        &self.accumulated
    }

    pub fn into_text(self) -> String {
        self.accumulated
    }

    /// Subject name announced by the stream, if any.
    pub fn subject(&self) -> Option<&str> {
        self.subject.as_deref()
    }

    /// Drive `events` to a terminal state, forwarding each event to `sink`.
    ///
    /// Transport faults are returned as `Err` and leave the accumulated text
    /// in place. An `error` event ends the stream as [`StreamOutcome::Failed`];
    /// a `done` event does not stop reading.
    pub async fn drive<S, K>(&mut self, events: S, sink: &mut K) -> Result<StreamOutcome, ClientError>
    where
        S: Stream<Item = Result<SseEvent, ClientError>> + Send,
        K: StreamSink + ?Sized,
    {
        futures::pin_mut!(events);
        let mut done = false;

        loop {
            let next = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => {
                    debug!("Stream cancelled after {} bytes", self.accumulated.len());
                    return Ok(StreamOutcome::Cancelled);
                }
                next = events.next() => next,
            };

            match next {
                Some(Ok(SseEvent::Text(delta))) => {
                    self.accumulated.push_str(&delta);
                    sink.on_text(&self.accumulated).await;
                }
                Some(Ok(SseEvent::Subject(name))) => {
                    sink.on_subject(&name).await;
                    self.subject = Some(name);
                }
                Some(Ok(SseEvent::Error(message))) => {
                    warn!("Stream reported error: {}", message);
                    sink.on_error(&message).await;
                    return Ok(StreamOutcome::Failed(message));
                }
                Some(Ok(SseEvent::Done)) => {
                    debug!("Stream signalled done");
                    done = true;
                    sink.on_done().await;
                }
                Some(Err(e)) => {
                    warn!("Stream aborted: {}", e);
                    return Err(e);
                }
                None => {
                    info!("Stream completed with {} bytes", self.accumulated.len());
                    return Ok(StreamOutcome::Completed { done });
                }
            }
        }
    }
}
