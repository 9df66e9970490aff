//! Merge logic for aggregate resource documents
//!
//! A sync never blindly replaces a document: the existing document (when
//! present) is the base, scalar descriptive fields are overwritten with
//! the incoming values, and membership lists become the sorted union of
//! old and new members. Nothing is ever removed from a list, so repeated,
//! partial, and out-of-order syncs converge on the same document.

use std::collections::BTreeSet;

use serde::Deserialize;
use serde_json::Map;

use crate::model::{ClassDoc, LessonDoc, StudentDoc};

/// Seed record for a class: identity plus the owner-overwritten scalars
#[derive(Debug, Clone, Deserialize)]
pub struct ClassSeed {
    pub class_id: String,
    pub location: String,
    pub teacher_name: String,
    pub meeting_time: String,
}

/// Seed record for a lesson
#[derive(Debug, Clone, Deserialize)]
pub struct LessonSeed {
    pub lesson_id: String,
    pub short_name: String,
}

/// Seed record for a student
#[derive(Debug, Clone, Deserialize)]
pub struct StudentSeed {
    pub user_id: String,
    pub first_name: String,
    pub last_name: String,
}

/// Sorted union of two membership lists. Duplicates collapse; the result
/// is deterministic regardless of input order.
pub fn sorted_union(existing: &[String], incoming: &[String]) -> Vec<String> {
    existing
        .iter()
        .chain(incoming.iter())
        .cloned()
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Merge a class seed into an existing class document, or synthesize a
/// fresh one when absent.
pub fn merge_class(
    existing: Option<ClassDoc>,
    seed: &ClassSeed,
    students: &[String],
    lessons: &[String],
) -> ClassDoc {
    let mut doc = existing.unwrap_or_else(|| ClassDoc {
        class_id: seed.class_id.clone(),
        teacher_name: None,
        location: None,
        meeting_time: None,
        students: Vec::new(),
        lessons: Vec::new(),
        auto_created: Some(false),
        extra: Map::new(),
    });

    doc.teacher_name = Some(seed.teacher_name.clone());
    doc.location = Some(seed.location.clone());
    doc.meeting_time = Some(seed.meeting_time.clone());
    doc.students = sorted_union(&doc.students, students);
    doc.lessons = sorted_union(&doc.lessons, lessons);
    doc
}

/// Merge a lesson seed into an existing lesson document, or synthesize a
/// fresh one when absent.
pub fn merge_lesson(
    existing: Option<LessonDoc>,
    seed: &LessonSeed,
    students: &[String],
) -> LessonDoc {
    let mut doc = existing.unwrap_or_else(|| LessonDoc {
        lesson_id: seed.lesson_id.clone(),
        short_name: None,
        turn_count: 0,
        students: Vec::new(),
        students_attempted: Vec::new(),
        students_completed: Vec::new(),
        attempt_times: Vec::new(),
        urls: Vec::new(),
        auto_created: Some(false),
        extra: Map::new(),
    });

    doc.short_name = Some(seed.short_name.clone());
    doc.students = sorted_union(&doc.students, students);
    doc
}

/// Merge a student seed into an existing student document, or synthesize a
/// fresh one when absent. A null reading-URL list is normalized to empty.
pub fn merge_student(existing: Option<StudentDoc>, seed: &StudentSeed) -> StudentDoc {
    let mut doc = existing.unwrap_or_else(|| StudentDoc {
        user_id: seed.user_id.clone(),
        first_name: None,
        last_name: None,
        turn_count: 0,
        reading_urls: None,
        auto_created: Some(false),
        extra: Map::new(),
    });

    doc.first_name = Some(seed.first_name.clone());
    doc.last_name = Some(seed.last_name.clone());
    if doc.reading_urls.is_none() {
        doc.reading_urls = Some(Vec::new());
    }
    doc
}
