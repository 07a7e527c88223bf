//! The three streaming call sites: study notes, chat and the study planner.
//!
//! Each call site owns its state (an accumulator per request, stored results,
//! chat history) and talks to the screen only through a [`Presenter`].

pub mod chat;
pub mod notes;
pub mod planner;

pub use chat::ChatSession;
pub use notes::{CurrentNotes, NotesSession};
pub use planner::PlannerSession;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::markdown::{escape_html, render_markdown};
use crate::stream::StreamSink;

/// Display regions a call site can write to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Pane {
    Flashcards,
    MindMap,
    Notes,
    /// The chat transcript.
    Chat,
    /// The assistant reply currently being streamed.
    ChatReply,
    Schedule,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Success,
    Error,
}

/// A transient message shown to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Success,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            message: message.into(),
        }
    }
}

/// The presentation layer, as seen by the call sites.
pub trait Presenter: Send {
    /// Replace the content of `pane`.
    fn render(&mut self, pane: Pane, html: &str);

    /// Add content to the end of `pane`.
    fn append(&mut self, pane: Pane, html: &str);

    fn notify(&mut self, notice: Notice);

    /// Show or hide the loading state of `pane`.
    fn set_busy(&mut self, _pane: Pane, _busy: bool) {}
}

pub(crate) fn streaming_indicator(message: &str) -> String {
    format!("<p class=\"streaming-indicator\">{}</p>", escape_html(message))
}

/// Give `slot` a fresh token if the previous one was cancelled, and return it.
pub(crate) fn renew(slot: &mut CancellationToken) -> CancellationToken {
    if slot.is_cancelled() {
        *slot = CancellationToken::new();
    }
    slot.clone()
}

#[derive(Debug, Clone, Copy)]
enum Format {
    Markdown,
    PlainText,
}

/// Re-renders a pane with the full accumulated text on every delta.
pub(crate) struct RenderSink<'a, P: Presenter + ?Sized> {
    presenter: &'a mut P,
    pane: Pane,
    format: Format,
    done_notice: Option<&'static str>,
}

impl<'a, P: Presenter + ?Sized> RenderSink<'a, P> {
    pub(crate) fn markdown(presenter: &'a mut P, pane: Pane) -> Self {
        Self {
            presenter,
            pane,
            format: Format::Markdown,
            done_notice: None,
        }
    }

    pub(crate) fn plain_text(presenter: &'a mut P, pane: Pane) -> Self {
        Self {
            presenter,
            pane,
            format: Format::PlainText,
            done_notice: None,
        }
    }

    /// Show a success notice when the backend signals `done`.
    pub(crate) fn with_done_notice(mut self, message: &'static str) -> Self {
        self.done_notice = Some(message);
        self
    }
}

#[async_trait]
impl<'a, P: Presenter + ?Sized> StreamSink for RenderSink<'a, P> {
    async fn on_text(&mut self, accumulated: &str) {
        let html = match self.format {
            Format::Markdown => render_markdown(accumulated),
            Format::PlainText => escape_html(accumulated),
        };
        self.presenter.render(self.pane, &html);
    }

    // The call site decides what to show once the stream has failed.
    async fn on_error(&mut self, _message: &str) {}

    async fn on_done(&mut self) {
        if let Some(message) = self.done_notice {
            self.presenter.notify(Notice::success(message));
        }
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;

    /// Presenter that records everything for assertions.
    #[derive(Debug, Default)]
    pub struct RecordingPresenter {
        pub renders: Vec<(Pane, String)>,
        pub appends: Vec<(Pane, String)>,
        pub notices: Vec<Notice>,
        pub busy: Vec<(Pane, bool)>,
    }

    impl RecordingPresenter {
        pub fn last_render(&self, pane: Pane) -> Option<&str> {
            self.renders
                .iter()
                .rev()
                .find(|(p, _)| *p == pane)
                .map(|(_, html)| html.as_str())
        }
    }

    impl Presenter for RecordingPresenter {
        fn render(&mut self, pane: Pane, html: &str) {
            self.renders.push((pane, html.to_string()));
        }

        fn append(&mut self, pane: Pane, html: &str) {
            self.appends.push((pane, html.to_string()));
        }

        fn notify(&mut self, notice: Notice) {
            self.notices.push(notice);
        }

        fn set_busy(&mut self, pane: Pane, busy: bool) {
            self.busy.push((pane, busy));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::RecordingPresenter;
    use super::*;

    #[tokio::test]
    async fn test_render_sink_formats() {
        let mut presenter = RecordingPresenter::default();

        let mut sink = RenderSink::markdown(&mut presenter, Pane::Notes).with_done_notice("ok");
        sink.on_text("# Hi").await;
        sink.on_done().await;

        let mut sink = RenderSink::plain_text(&mut presenter, Pane::ChatReply);
        sink.on_text("**not bold** <b>").await;

        assert_eq!(presenter.last_render(Pane::Notes), Some("<h1>Hi</h1>"));
        assert_eq!(
            presenter.last_render(Pane::ChatReply),
            Some("**not bold** &lt;b&gt;")
        );
        assert_eq!(presenter.notices, vec![Notice::success("ok")]);
    }

    #[test]
    fn test_renew_replaces_cancelled_token() {
        let mut slot = CancellationToken::new();
        let first = renew(&mut slot);
        assert!(!first.is_cancelled());

        first.cancel();
        let second = renew(&mut slot);
        assert!(!second.is_cancelled());
        assert!(first.is_cancelled());
    }
}
