//! Data model for turns and aggregate resource documents
//!
//! All wire formats use PascalCase field names; the interchange file and
//! the turn-ingest payload are the same JSON shape. Fields this tool does
//! not model are captured in a flattened map so that documents round-trip
//! without losing data the server (or a later version of this tool) cares
//! about.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One student interaction event, the atomic unit moved by the pipeline.
///
/// Turns are immutable once created; this tool only ever relabels the
/// `UserID` field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Turn {
    #[serde(rename = "UserID")]
    pub user_id: String,

    #[serde(rename = "LessonID", default, skip_serializing_if = "Option::is_none")]
    pub lesson_id: Option<String>,

    #[serde(rename = "TurnID", default, skip_serializing_if = "Option::is_none")]
    pub turn_id: Option<i64>,

    #[serde(rename = "Duration", default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<f64>,

    #[serde(rename = "Input", default, skip_serializing_if = "Option::is_none")]
    pub input: Option<TurnInput>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// The input section of a turn record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TurnInput {
    #[serde(rename = "AllText", default, skip_serializing_if = "Option::is_none")]
    pub all_text: Option<String>,

    #[serde(rename = "CurrentText", default, skip_serializing_if = "Option::is_none")]
    pub current_text: Option<String>,

    #[serde(rename = "Event", default, skip_serializing_if = "Option::is_none")]
    pub event: Option<String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Turn {
    /// Short `user:lesson:turnid:event` label used in progress logging.
    ///
    /// Missing pieces render as `{MISSING}`, a turn without an input
    /// section as `{NOINPUT}`, and an input without an event as `{BLANK}`.
    pub fn log_label(&self) -> String {
        let lesson = self.lesson_id.as_deref().unwrap_or("{MISSING}");
        let turn_id = self.turn_id.unwrap_or(-1);
        let event = match &self.input {
            None => "{NOINPUT}",
            Some(input) => input.event.as_deref().unwrap_or("{BLANK}"),
        };
        format!("{}:{}:{}:{}", self.user_id, lesson, turn_id, event)
    }
}

/// A class aggregate document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassDoc {
    #[serde(rename = "ClassID")]
    pub class_id: String,

    #[serde(rename = "TeacherName", default, skip_serializing_if = "Option::is_none")]
    pub teacher_name: Option<String>,

    #[serde(rename = "Location", default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,

    #[serde(rename = "MeetingTime", default, skip_serializing_if = "Option::is_none")]
    pub meeting_time: Option<String>,

    #[serde(rename = "Students", default)]
    pub students: Vec<String>,

    #[serde(rename = "Lessons", default)]
    pub lessons: Vec<String>,

    #[serde(rename = "AutoCreated", default, skip_serializing_if = "Option::is_none")]
    pub auto_created: Option<bool>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A lesson aggregate document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LessonDoc {
    #[serde(rename = "LessonID")]
    pub lesson_id: String,

    #[serde(rename = "ShortName", default, skip_serializing_if = "Option::is_none")]
    pub short_name: Option<String>,

    #[serde(rename = "TurnCount", default)]
    pub turn_count: i64,

    #[serde(rename = "Students", default)]
    pub students: Vec<String>,

    #[serde(rename = "StudentsAttempted", default)]
    pub students_attempted: Vec<String>,

    #[serde(rename = "StudentsCompleted", default)]
    pub students_completed: Vec<String>,

    /// Attempt timestamps are carried opaquely; this tool never interprets
    /// or rewrites them
    #[serde(rename = "AttemptTimes", default)]
    pub attempt_times: Vec<Value>,

    #[serde(rename = "URLs", default)]
    pub urls: Vec<String>,

    #[serde(rename = "AutoCreated", default, skip_serializing_if = "Option::is_none")]
    pub auto_created: Option<bool>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A student aggregate document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudentDoc {
    #[serde(rename = "UserID")]
    pub user_id: String,

    #[serde(rename = "FirstName", default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,

    #[serde(rename = "LastName", default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,

    #[serde(rename = "TurnCount", default)]
    pub turn_count: i64,

    /// May arrive as null from older records; normalized to an empty list
    /// on merge
    #[serde(rename = "ReadingURLs", default, skip_serializing_if = "Option::is_none")]
    pub reading_urls: Option<Vec<String>>,

    #[serde(rename = "AutoCreated", default, skip_serializing_if = "Option::is_none")]
    pub auto_created: Option<bool>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// The per-student+lesson document held by the document store, embedding
/// the ordered turn sequence. Entries in `Turns` may be null and are
/// skipped on export.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudentActionsDoc {
    #[serde(rename = "UserID", default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,

    #[serde(rename = "LessonID", default, skip_serializing_if = "Option::is_none")]
    pub lesson_id: Option<String>,

    #[serde(rename = "TurnCount", default)]
    pub turn_count: i64,

    #[serde(rename = "Turns", default)]
    pub turns: Vec<Value>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Sort key for lesson IDs.
///
/// IDs of the form `lesson<N>` sort numerically (`lesson2` before
/// `lesson10`) by left-padding `<N>` to eight digits; anything else sorts
/// as its trimmed, lowercased self.
pub fn lesson_sort_key(lesson_id: &str) -> String {
    let ret = lesson_id.trim().to_lowercase();
    if ret.is_empty() || !ret.starts_with("lesson") {
        return ret;
    }
    format!("{:0>8}", &ret[6..])
}
