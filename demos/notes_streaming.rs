//! Stream study notes for one subject and print each rendered update.
//!
//! Run with:
//! ```bash
//! export STUDYKIT_BASE_URL="http://127.0.0.1:5000"
//! cargo run --example notes_streaming -- CS301 semester
//! ```

use studykit::client::StudyClient;
use studykit::features::{ChatSession, Notice, NoticeLevel, NotesSession, Pane, Presenter};
use studykit::model::ExamType;
use studykit::options::TransportOptions;
use tracing_subscriber::EnvFilter;

/// Prints the final render of every pane instead of drawing a page.
struct Terminal;

impl Presenter for Terminal {
    fn render(&mut self, pane: Pane, html: &str) {
        // Notes re-render on every delta; only show how much has arrived.
        if pane == Pane::Notes {
            eprint!("\rnotes: {} bytes of html", html.len());
        } else {
            println!("\n[{pane:?}]\n{html}");
        }
    }

    fn append(&mut self, pane: Pane, html: &str) {
        println!("\n[{pane:?} +]\n{html}");
    }

    fn notify(&mut self, notice: Notice) {
        match notice.level {
            NoticeLevel::Success => println!("\n✓ {}", notice.message),
            NoticeLevel::Error => eprintln!("\n✗ {}", notice.message),
        }
    }
}

fn exam_type(arg: Option<&str>) -> ExamType {
    match arg {
        Some("internal1") => ExamType::Internal1,
        Some("internal2") => ExamType::Internal2,
        Some("internal3") => ExamType::Internal3,
        _ => ExamType::Semester,
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let subject_code = args.first().map(String::as_str).unwrap_or("CS301");
    let exam_type = exam_type(args.get(1).map(String::as_str));

    let client = StudyClient::new(TransportOptions::from_env()?)?;
    let mut terminal = Terminal;

    println!("Streaming notes for {subject_code} ({exam_type}) from {}...", client.options().base_url);

    let mut notes = NotesSession::new();
    let current = notes
        .generate(&client, subject_code, exam_type, &mut terminal)
        .await?
        .clone();

    println!("\n\n=== Notes ===\n{}", current.notes);

    // Ask a follow-up with the subject as chat context.
    let mut chat = ChatSession::new();
    if let Some(reply) = chat
        .send(
            &client,
            "Summarise these notes in three sentences.",
            notes.chat_context(),
            &mut terminal,
        )
        .await?
    {
        println!("\n=== Assistant ===\n{reply}");
    }

    Ok(())
}
