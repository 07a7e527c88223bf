//! Request and response bodies of the study backend.

use std::collections::BTreeMap;
use std::fmt;

use serde::de::{DeserializeOwned, Deserializer};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::sessions::SessionRecord;

/// Exam a piece of content is prepared for.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ExamType {
    Internal1,
    Internal2,
    Internal3,
    #[default]
    Semester,
}

impl ExamType {
    /// Wire name, as sent in request bodies and query strings.
    pub fn as_str(&self) -> &'static str {
        match self {
            ExamType::Internal1 => "internal1",
            ExamType::Internal2 => "internal2",
            ExamType::Internal3 => "internal3",
            ExamType::Semester => "semester",
        }
    }
}

impl fmt::Display for ExamType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Body of `/api/generate-study-content` and `/api/generate-notes/stream`.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct StudyContentRequest {
    pub subject_code: String,
    pub exam_type: ExamType,
}

impl StudyContentRequest {
    /// Subject codes are normalized to trimmed upper case.
    pub fn new(subject_code: &str, exam_type: ExamType) -> Self {
        Self {
            subject_code: normalize_subject_code(subject_code),
            exam_type,
        }
    }
}

pub(crate) fn normalize_subject_code(code: &str) -> String {
    code.trim().to_uppercase()
}

/// Generated flashcards and mind map for one subject.
///
/// The backend passes model output through untouched, so both fields may hold
/// either structured JSON or a string containing JSON.
#[derive(Debug, Clone, Deserialize)]
pub struct StudyContent {
    pub subject_name: String,
    pub subject_code: String,
    pub exam_type: ExamType,
    #[serde(default)]
    pub flashcards: Value,
    #[serde(default)]
    pub mindmap: Value,
}

impl StudyContent {
    pub fn flashcards(&self) -> Result<Vec<Flashcard>, serde_json::Error> {
        embedded(&self.flashcards)
    }

    pub fn mind_map(&self) -> Result<MindMapNode, serde_json::Error> {
        embedded(&self.mindmap)
    }
}

/// Decode a value that is either the JSON itself or a string holding it.
pub fn embedded<T: DeserializeOwned>(value: &Value) -> Result<T, serde_json::Error> {
    match value {
        Value::String(text) => serde_json::from_str(text),
        other => T::deserialize(other),
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Flashcard {
    pub question: String,
    pub answer: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MindMapNode {
    pub topic: String,
    #[serde(default)]
    pub subtopics: Vec<MindMapNode>,
}

/// Previous-year questions of one exam year.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct PyqYear {
    #[serde(deserialize_with = "string_or_number")]
    pub year: String,
    #[serde(default)]
    pub questions: Vec<String>,
}

/// Previous-year questions, either grouped by exam type or a flat list of years.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum Pyqs {
    ByExam(BTreeMap<String, Vec<PyqYear>>),
    Years(Vec<PyqYear>),
}

impl Pyqs {
    pub fn is_empty(&self) -> bool {
        match self {
            Pyqs::ByExam(groups) => groups.is_empty(),
            Pyqs::Years(years) => years.is_empty(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct PyqResponse {
    pub subject_name: String,
    #[serde(default)]
    pub pyqs: Option<Pyqs>,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct ResourceLink {
    pub title: String,
    pub url: String,
    pub category: String,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct Certification {
    pub name: String,
    pub provider: String,
    pub category: String,
}

#[derive(Debug, Clone, Deserialize, Default, PartialEq, Eq)]
pub struct Resources {
    #[serde(default)]
    pub links: Vec<ResourceLink>,
    #[serde(default)]
    pub certifications: Vec<Certification>,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct Subject {
    pub code: String,
    pub name: String,
}

/// Body of `/api/chat` and `/api/chat/stream`.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ChatRequest {
    pub message: String,
    pub context: String,
    pub chat_history: String,
}

/// Body of `/api/create-schedule/stream`.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ScheduleRequest {
    pub subjects: String,
    pub start_date: String,
    pub end_date: String,
    pub hours_per_day: u32,
}

/// Body of the non-streaming `/api/create-schedule`.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ExamScheduleRequest {
    pub subjects: String,
    pub exam_date: String,
    pub hours_per_day: u32,
}

/// Body of `/api/download-pdf`.
#[derive(Debug, Clone, Serialize)]
pub struct PdfRequest {
    pub notes: String,
    pub subject_name: String,
    pub subject_code: String,
    pub exam_type: ExamType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mindmap: Option<Value>,
}

// --- Envelope payloads ---

#[derive(Debug, Deserialize)]
pub(crate) struct ChatReply {
    pub response: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ScheduleReply {
    pub schedule: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SessionReply {
    pub session: SessionRecord,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SessionsReply {
    #[serde(default)]
    pub sessions: Vec<SessionRecord>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ResourcesReply {
    pub resources: Resources,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SubjectsReply {
    #[serde(default)]
    pub subjects: Vec<Subject>,
}

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "expected a year, got {other}"
        ))),
    }
}
