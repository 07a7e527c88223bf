//! Planner tab: a streamed day-by-day study schedule.

use tokio_util::sync::CancellationToken;
use tracing::warn;

use super::{renew, streaming_indicator, Notice, Pane, Presenter, RenderSink};
use crate::client::{ClientError, StudyClient};
use crate::model::ScheduleRequest;
use crate::stream::{StreamContext, StreamOutcome};

/// The backend refuses plans with fewer daily hours.
pub const MIN_HOURS_PER_DAY: u32 = 2;

#[derive(Debug, Default)]
pub struct PlannerSession {
    schedule: Option<String>,
    cancel: CancellationToken,
}

impl PlannerSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Markdown of the last schedule that completed.
    pub fn schedule(&self) -> Option<&str> {
        self.schedule.as_deref()
    }

    pub fn cancel_handle(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Stream a schedule into [`Pane::Schedule`], rendering it as it arrives.
    pub async fn generate<P: Presenter + ?Sized>(
        &mut self,
        client: &StudyClient,
        request: &ScheduleRequest,
        presenter: &mut P,
    ) -> Result<&str, ClientError> {
        if let Err(message) = validate(request) {
            presenter.notify(Notice::error(message));
            return Err(ClientError::Validation(message.to_string()));
        }

        presenter.set_busy(Pane::Schedule, true);
        presenter.render(Pane::Schedule, &streaming_indicator("Creating your schedule..."));
        let result = self.run(client, request, presenter).await;
        presenter.set_busy(Pane::Schedule, false);

        match result {
            Ok(schedule) => Ok(self.schedule.insert(schedule).as_str()),
            Err(e) => {
                warn!("Schedule generation failed: {}", e);
                presenter.notify(Notice::error("Error generating schedule"));
                Err(e)
            }
        }
    }

    async fn run<P: Presenter + ?Sized>(
        &mut self,
        client: &StudyClient,
        request: &ScheduleRequest,
        presenter: &mut P,
    ) -> Result<String, ClientError> {
        let events = client.stream_schedule(request).await?;

        let mut ctx = StreamContext::with_cancel(renew(&mut self.cancel));
        let mut sink = RenderSink::markdown(presenter, Pane::Schedule)
            .with_done_notice("Schedule created successfully!");

        match ctx.drive(events, &mut sink).await? {
            StreamOutcome::Completed { .. } => Ok(ctx.into_text()),
            StreamOutcome::Failed(message) => Err(ClientError::Api(message)),
            StreamOutcome::Cancelled => Err(ClientError::StreamCancelled),
        }
    }
}

fn validate(request: &ScheduleRequest) -> Result<(), &'static str> {
    let missing = [&request.subjects, &request.start_date, &request.end_date]
        .iter()
        .any(|field| field.trim().is_empty());
    if missing {
        return Err("Please fill in all fields");
    }
    if request.hours_per_day < MIN_HOURS_PER_DAY {
        return Err("Minimum study hours is 2 hours per day");
    }
    Ok(())
}
