//! Study tab: flashcards, mind map and streamed notes for one subject.

use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use super::{renew, streaming_indicator, Notice, Pane, Presenter, RenderSink};
use crate::client::{ClientError, StudyClient};
use crate::display::{placeholder, render_flashcards, render_mind_map};
use crate::model::{ExamType, PdfRequest, StudyContentRequest};
use crate::stream::{StreamContext, StreamOutcome};

/// Notes from the last stream that completed normally.
#[derive(Debug, Clone, PartialEq)]
pub struct CurrentNotes {
    pub subject_name: String,
    pub subject_code: String,
    pub exam_type: ExamType,
    pub notes: String,
    pub mindmap: Value,
}

impl CurrentNotes {
    /// Request body for exporting these notes as a PDF.
    pub fn pdf_request(&self) -> PdfRequest {
        PdfRequest {
            notes: self.notes.clone(),
            subject_name: self.subject_name.clone(),
            subject_code: self.subject_code.clone(),
            exam_type: self.exam_type,
            mindmap: (!self.mindmap.is_null()).then(|| self.mindmap.clone()),
        }
    }
}

#[derive(Debug, Default)]
pub struct NotesSession {
    current: Option<CurrentNotes>,
    context: Option<String>,
    cancel: CancellationToken,
}

impl NotesSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Option<&CurrentNotes> {
        self.current.as_ref()
    }

    /// Chat context describing the subject last loaded, e.g.
    /// `Subject: Operating Systems (CS301), Exam: semester`.
    pub fn chat_context(&self) -> Option<&str> {
        self.context.as_deref()
    }

    /// Token that abandons the notes stream in flight.
    pub fn cancel_handle(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Load flashcards and the mind map, then stream the notes into [`Pane::Notes`].
    ///
    /// The notes are stored only when the stream completes. On failure the
    /// partial notes stay on screen and the previous stored notes are kept.
    pub async fn generate<P: Presenter + ?Sized>(
        &mut self,
        client: &StudyClient,
        subject_code: &str,
        exam_type: ExamType,
        presenter: &mut P,
    ) -> Result<&CurrentNotes, ClientError> {
        let request = StudyContentRequest::new(subject_code, exam_type);
        if request.subject_code.is_empty() {
            presenter.notify(Notice::error("Please enter a subject code"));
            return Err(ClientError::Validation("subject code is required".to_string()));
        }

        presenter.set_busy(Pane::Notes, true);
        let result = self.run(client, &request, presenter).await;
        presenter.set_busy(Pane::Notes, false);

        match result {
            Ok(notes) => {
                presenter.notify(Notice::success(format!(
                    "Study material generated for {}!",
                    notes.subject_name
                )));
                let notes: &CurrentNotes = self.current.insert(notes);
                Ok(notes)
            }
            Err(e) => {
                warn!("Generating study content for {} failed: {}", request.subject_code, e);
                presenter.notify(Notice::error("Error generating content"));
                Err(e)
            }
        }
    }

    async fn run<P: Presenter + ?Sized>(
        &mut self,
        client: &StudyClient,
        request: &StudyContentRequest,
        presenter: &mut P,
    ) -> Result<CurrentNotes, ClientError> {
        let content = client.generate_study_content(request).await?;
        self.context = Some(format!(
            "Subject: {} ({}), Exam: {}",
            content.subject_name, request.subject_code, request.exam_type
        ));

        let flashcards = match content.flashcards() {
            Ok(cards) => render_flashcards(&cards),
            Err(e) => {
                warn!("Flashcards are not valid JSON: {}", e);
                placeholder("Error loading flashcards")
            }
        };
        presenter.render(Pane::Flashcards, &flashcards);

        let mind_map = match content.mind_map() {
            Ok(root) => render_mind_map(&root),
            Err(e) => {
                warn!("Mind map is not valid JSON: {}", e);
                placeholder("Error loading mind map")
            }
        };
        presenter.render(Pane::MindMap, &mind_map);

        presenter.render(Pane::Notes, &streaming_indicator("Generating notes..."));
        let events = client.stream_notes(request).await?;

        let mut ctx = StreamContext::with_cancel(renew(&mut self.cancel));
        let outcome = {
            let mut sink = RenderSink::markdown(&mut *presenter, Pane::Notes);
            ctx.drive(events, &mut sink).await?
        };

        match outcome {
            StreamOutcome::Completed { .. } => {
                info!("Notes for {} complete ({} bytes)", request.subject_code, ctx.text().len());
                let subject_name = ctx
                    .subject()
                    .map(str::to_string)
                    .unwrap_or(content.subject_name);
                Ok(CurrentNotes {
                    subject_name,
                    subject_code: request.subject_code.clone(),
                    exam_type: request.exam_type,
                    notes: ctx.into_text(),
                    mindmap: content.mindmap,
                })
            }
            StreamOutcome::Failed(message) => Err(ClientError::Api(message)),
            StreamOutcome::Cancelled => Err(ClientError::StreamCancelled),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::test_support::RecordingPresenter;
    use serde_json::json;

    #[test]
    fn test_pdf_request_omits_missing_mind_map() {
        let notes = CurrentNotes {
            subject_name: "Compilers".to_string(),
            subject_code: "CS402".to_string(),
            exam_type: ExamType::Internal1,
            notes: "# Lexing".to_string(),
            mindmap: Value::Null,
        };
        let body = serde_json::to_value(notes.pdf_request()).unwrap();
        assert_eq!(
            body,
            json!({
                "notes": "# Lexing",
                "subject_name": "Compilers",
                "subject_code": "CS402",
                "exam_type": "internal1"
            })
        );
    }

    #[tokio::test]
    async fn test_empty_subject_code_is_rejected() {
        let client = StudyClient::new(Default::default()).unwrap();
        let mut session = NotesSession::new();
        let mut presenter = RecordingPresenter::default();

        let result = session
            .generate(&client, "   ", ExamType::Semester, &mut presenter)
            .await;

        assert!(matches!(result, Err(ClientError::Validation(_))));
        assert_eq!(presenter.notices, vec![Notice::error("Please enter a subject code")]);
        assert!(presenter.renders.is_empty());
    }
}
