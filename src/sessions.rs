//! Completed study sessions and the study streak derived from them.

use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::client::ClientError;

/// Subject recorded when no study context is active.
pub const GENERAL_STUDY: &str = "General Study";

/// One finished Pomodoro session.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SessionRecord {
    /// Length in minutes
    pub duration: u32,
    pub timestamp: DateTime<Utc>,
    pub subject: String,
}

impl SessionRecord {
    pub fn new(duration: u32, timestamp: DateTime<Utc>, subject: Option<&str>) -> Self {
        let subject = subject
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .unwrap_or(GENERAL_STUDY);
        Self {
            duration,
            timestamp,
            subject: subject.to_string(),
        }
    }
}

/// Session records persisted as a JSON array in a local file.
#[derive(Debug)]
pub struct SessionLog {
    path: PathBuf,
    records: Vec<SessionRecord>,
}

impl SessionLog {
    /// Load the log at `path`. A missing file is an empty log.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, ClientError> {
        let path = path.into();
        let records = match std::fs::read_to_string(&path) {
            Ok(text) if text.trim().is_empty() => Vec::new(),
            Ok(text) => serde_json::from_str(&text)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Vec::new(),
            Err(e) => return Err(e.into()),
        };
        debug!("Loaded {} study sessions from {}", records.len(), path.display());
        Ok(Self { path, records })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn records(&self) -> &[SessionRecord] {
        &self.records
    }

    /// Append a record and write the whole log back to disk.
    pub fn append(&mut self, record: SessionRecord) -> Result<(), ClientError> {
        self.records.push(record);
        self.save()
    }

    fn save(&self) -> Result<(), ClientError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.path, serde_json::to_string_pretty(&self.records)?)?;
        Ok(())
    }

    /// The last `n` records, newest first.
    pub fn recent(&self, n: usize) -> impl Iterator<Item = &SessionRecord> {
        self.records.iter().rev().take(n)
    }

    /// Consecutive days with at least one session, counting back from `today`.
    pub fn streak_days<Tz: TimeZone>(&self, today: NaiveDate, tz: &Tz) -> u32 {
        streak_days(&self.records, today, tz)
    }
}

/// Consecutive days with at least one session, counting back from `today`.
///
/// Session dates are taken in `tz`. A day without sessions ends the streak,
/// so no session today means a streak of zero.
pub fn streak_days<Tz: TimeZone>(records: &[SessionRecord], today: NaiveDate, tz: &Tz) -> u32 {
    let days = records
        .iter()
        .map(|r| r.timestamp.with_timezone(tz).date_naive())
        .unique()
        .sorted_unstable_by(|a, b| b.cmp(a));

    let mut streak = 0;
    for day in days {
        if (today - day).num_days() == i64::from(streak) {
            streak += 1;
        } else {
            break;
        }
    }
    streak
}

/// Human readable streak, e.g. `1 day` or `3 days`.
pub fn format_streak(days: u32) -> String {
    format!("{days} day{}", if days == 1 { "" } else { "s" })
}
