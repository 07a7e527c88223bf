//! # studykit - Study Assistant Client Library
//!
//! A client for the study-assistant backend: generated notes, flashcards and
//! mind maps, a chat assistant, a study planner and Pomodoro bookkeeping.
//!
//! ## Features
//! - Async-first, tokio compatible
//! - Incremental Server-Sent Events decoding that is independent of chunk boundaries
//! - One generic streaming loop shared by notes, chat and planner
//! - Live markdown rendering of partial responses
//! - Cancellation of in-flight streams
//!
//! ## Architecture
//!
//! - **`sse`**: bytes to [`SseEvent`]s (`text`, `error`, `done`, subject metadata)
//! - **`stream`**: [`StreamContext`] drives events into a [`StreamSink`], owning the
//!   accumulated text of one response
//! - **`markdown`**: renders the accumulated text to HTML after every delta
//! - **`features`**: the notes, chat and planner call sites, writing to a `Presenter`
//! - **`client`**: typed access to every backend endpoint
//!
//! ## Example
//! ```no_run
//! use studykit::client::StudyClient;
//! use studykit::markdown::render_markdown;
//! use studykit::model::{ExamType, StudyContentRequest};
//! use studykit::options::TransportOptions;
//! use studykit::stream::{StreamContext, StreamSink};
//!
//! struct Print;
//!
//! #[async_trait::async_trait]
//! impl StreamSink for Print {
//!     async fn on_text(&mut self, accumulated: &str) {
//!         println!("{}", render_markdown(accumulated));
//!     }
//!
//!     async fn on_error(&mut self, message: &str) {
//!         eprintln!("backend error: {message}");
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = StudyClient::new(TransportOptions::from_env()?)?;
//!     let request = StudyContentRequest::new("CS301", ExamType::Semester);
//!
//!     let events = client.stream_notes(&request).await?;
//!     let mut ctx = StreamContext::new();
//!     let outcome = ctx.drive(events, &mut Print).await?;
//!
//!     println!("{:?}: {} bytes of notes", outcome, ctx.text().len());
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod display;
pub mod features;
pub mod http;
pub mod markdown;
pub mod model;
pub mod options;
pub mod sessions;
pub mod sse;
pub mod stream;
pub mod timer;

// Re-exports for convenience
pub use client::{ClientError, StudyClient};
pub use sse::SseEvent;
pub use stream::{StreamContext, StreamOutcome, StreamSink};
