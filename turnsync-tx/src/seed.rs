//! Resource seeding
//!
//! Reads classes, lessons, and students from an external seed file and
//! merge-upserts each one against the resource API: fetch-or-default,
//! overwrite the owner scalars, union-merge the membership lists, persist.
//! Repeating a seed run is a no-op by construction.
//!
//! Enrollment follows the seed file's cohort assumption: every student is
//! in every lesson and every lesson in every class, so a seed file should
//! describe one class cohort at a time.

use std::path::Path;

use serde::Deserialize;
use tracing::info;
use turnsync_common::merge::{
    merge_class, merge_lesson, merge_student, ClassSeed, LessonSeed, StudentSeed,
};
use turnsync_common::model::{ClassDoc, LessonDoc, StudentDoc};
use turnsync_common::{Error, Result};

/// The resource API surface the seeding workflow needs: fetch-or-absent
/// and silent upsert per resource kind. Implemented by the REST client
/// and by in-memory fakes in tests.
#[allow(async_fn_in_trait)]
pub trait ResourceApi {
    async fn fetch_class(&self, class_id: &str) -> Result<Option<ClassDoc>>;
    async fn store_class(&self, doc: &ClassDoc) -> Result<()>;

    async fn fetch_lesson(&self, lesson_id: &str) -> Result<Option<LessonDoc>>;
    async fn store_lesson(&self, doc: &LessonDoc) -> Result<()>;

    async fn fetch_student(&self, user_id: &str) -> Result<Option<StudentDoc>>;
    async fn store_student(&self, doc: &StudentDoc) -> Result<()>;
}

/// Parsed seed file contents
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SeedFile {
    #[serde(default)]
    pub classes: Vec<ClassSeed>,

    #[serde(default)]
    pub lessons: Vec<LessonSeed>,

    #[serde(default)]
    pub students: Vec<StudentSeed>,
}

/// Counts of upserted resources
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeedReport {
    pub students: usize,
    pub lessons: usize,
    pub classes: usize,
}

/// Load a TOML seed file (`[[classes]]`, `[[lessons]]`, `[[students]]`)
pub fn load_seed_file(path: &Path) -> Result<SeedFile> {
    let contents = std::fs::read_to_string(path)?;
    toml::from_str(&contents).map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))
}

/// Merge-upsert every seed resource: students first, then lessons (each
/// enrolling all students), then classes (each enrolling all lessons and
/// students). The first fault stops the run; resources already upserted
/// stay as written.
pub async fn run_seed<A: ResourceApi>(api: &A, seed: &SeedFile) -> Result<SeedReport> {
    let student_ids: Vec<String> = seed.students.iter().map(|s| s.user_id.clone()).collect();
    let lesson_ids: Vec<String> = seed.lessons.iter().map(|l| l.lesson_id.clone()).collect();

    let mut report = SeedReport::default();

    for student in &seed.students {
        let existing = api.fetch_student(&student.user_id).await?;
        let created = existing.is_none();
        let doc = merge_student(existing, student);
        info!(student = %student.user_id, created, "upserting student");
        api.store_student(&doc).await?;
        report.students += 1;
    }

    for lesson in &seed.lessons {
        let existing = api.fetch_lesson(&lesson.lesson_id).await?;
        let created = existing.is_none();
        let doc = merge_lesson(existing, lesson, &student_ids);
        info!(lesson = %lesson.lesson_id, created, "upserting lesson");
        api.store_lesson(&doc).await?;
        report.lessons += 1;
    }

    for class in &seed.classes {
        let existing = api.fetch_class(&class.class_id).await?;
        let created = existing.is_none();
        let doc = merge_class(existing, class, &student_ids, &lesson_ids);
        info!(class = %class.class_id, created, "upserting class");
        api.store_class(&doc).await?;
        report.classes += 1;
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_seed_file_format() {
        let seed: SeedFile = toml::from_str(
            r#"
            [[classes]]
            class_id = "testclass"
            location = "Memphis"
            teacher_name = "whitney.baer@gmail.com"
            meeting_time = "Tue 10am"

            [[lessons]]
            lesson_id = "lesson0"
            short_name = "0. Introduction"

            [[lessons]]
            lesson_id = "lesson1"
            short_name = "1. Text Signals"

            [[students]]
            user_id = "craig"
            first_name = "Craig"
            last_name = "Kelly"
            "#,
        )
        .unwrap();

        assert_eq!(seed.classes.len(), 1);
        assert_eq!(seed.lessons.len(), 2);
        assert_eq!(seed.students.len(), 1);
        assert_eq!(seed.classes[0].meeting_time, "Tue 10am");
        assert_eq!(seed.lessons[1].short_name, "1. Text Signals");
    }

    #[test]
    fn empty_sections_default() {
        let seed: SeedFile = toml::from_str("").unwrap();
        assert!(seed.classes.is_empty());
        assert!(seed.lessons.is_empty());
        assert!(seed.students.is_empty());
    }
}
