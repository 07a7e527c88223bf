//! Chat tab: streamed answers from the study assistant.

use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::{renew, Pane, Presenter, RenderSink};
use crate::client::{ClientError, StudyClient};
use crate::markdown::escape_html;
use crate::model::ChatRequest;
use crate::stream::{StreamContext, StreamOutcome};

/// Shown in place of the reply when a chat request fails.
pub const CHAT_ERROR_REPLY: &str = "Sorry, I encountered an error. Please try again.";

/// History lines sent along with each message.
const HISTORY_WINDOW: usize = 5;

#[derive(Debug, Default)]
pub struct ChatSession {
    history: Vec<String>,
    cancel: CancellationToken,
}

impl ChatSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Transcript lines, `User: ...` and `Assistant: ...` alternating.
    pub fn history(&self) -> &[String] {
        &self.history
    }

    /// Token that abandons the reply in flight. Once used, later sends get a
    /// fresh token.
    pub fn cancel_handle(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Send `message` and stream the reply into [`Pane::ChatReply`].
    ///
    /// Returns `Ok(None)` for a blank message. The finished reply, or the
    /// fallback reply on failure, is appended to [`Pane::Chat`]. The exchange
    /// is added to the history only when the reply completes.
    pub async fn send<P: Presenter + ?Sized>(
        &mut self,
        client: &StudyClient,
        message: &str,
        context: Option<&str>,
        presenter: &mut P,
    ) -> Result<Option<String>, ClientError> {
        let message = message.trim();
        if message.is_empty() {
            return Ok(None);
        }

        presenter.append(
            Pane::Chat,
            &format!("<div class=\"chat-message user\"><p>{}</p></div>", escape_html(message)),
        );
        presenter.render(Pane::ChatReply, "");

        let request = ChatRequest {
            message: message.to_string(),
            context: context.unwrap_or_default().to_string(),
            chat_history: self.recent_history(),
        };

        match self.stream_reply(client, &request, presenter).await {
            Ok(reply) => {
                presenter.append(Pane::Chat, &assistant_bubble(&escape_html(&reply)));
                self.history.push(format!("User: {message}"));
                self.history.push(format!("Assistant: {reply}"));
                Ok(Some(reply))
            }
            Err(ClientError::StreamCancelled) => {
                debug!("Chat reply abandoned");
                Err(ClientError::StreamCancelled)
            }
            Err(e) => {
                warn!("Chat request failed: {}", e);
                presenter.render(Pane::ChatReply, CHAT_ERROR_REPLY);
                presenter.append(Pane::Chat, &assistant_bubble(CHAT_ERROR_REPLY));
                Err(e)
            }
        }
    }

    fn recent_history(&self) -> String {
        let start = self.history.len().saturating_sub(HISTORY_WINDOW);
        self.history[start..].join("\n")
    }

    async fn stream_reply<P: Presenter + ?Sized>(
        &mut self,
        client: &StudyClient,
        request: &ChatRequest,
        presenter: &mut P,
    ) -> Result<String, ClientError> {
        let events = client.stream_chat(request).await?;

        let mut ctx = StreamContext::with_cancel(renew(&mut self.cancel));
        let mut sink = RenderSink::plain_text(presenter, Pane::ChatReply);

        match ctx.drive(events, &mut sink).await? {
            StreamOutcome::Completed { .. } => Ok(ctx.into_text()),
            StreamOutcome::Failed(message) => Err(ClientError::Api(message)),
            StreamOutcome::Cancelled => Err(ClientError::StreamCancelled),
        }
    }
}

fn assistant_bubble(html: &str) -> String {
    format!("<div class=\"chat-message assistant\"><p>{html}</p></div>")
}
