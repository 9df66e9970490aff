//! Integration tests for the seeding workflow
//!
//! Drives run_seed against an in-memory fake of the resource API to check
//! creation defaults, merge behavior against existing documents,
//! idempotence, and the abort-on-contract-violation policy.

use std::collections::HashMap;
use std::sync::Mutex;

use serde_json::json;
use turnsync_common::model::{ClassDoc, LessonDoc, StudentDoc};
use turnsync_common::{Error, Result};
use turnsync_tx::seed::{run_seed, ResourceApi, SeedFile};

/// In-memory resource API double
#[derive(Default)]
struct FakeApi {
    classes: Mutex<HashMap<String, ClassDoc>>,
    lessons: Mutex<HashMap<String, LessonDoc>>,
    students: Mutex<HashMap<String, StudentDoc>>,
    fail_lesson_writes: bool,
}

impl ResourceApi for FakeApi {
    async fn fetch_class(&self, class_id: &str) -> Result<Option<ClassDoc>> {
        Ok(self.classes.lock().unwrap().get(class_id).cloned())
    }

    async fn store_class(&self, doc: &ClassDoc) -> Result<()> {
        self.classes
            .lock()
            .unwrap()
            .insert(doc.class_id.clone(), doc.clone());
        Ok(())
    }

    async fn fetch_lesson(&self, lesson_id: &str) -> Result<Option<LessonDoc>> {
        Ok(self.lessons.lock().unwrap().get(lesson_id).cloned())
    }

    async fn store_lesson(&self, doc: &LessonDoc) -> Result<()> {
        if self.fail_lesson_writes {
            return Err(Error::Contract("unexpected ack body".to_string()));
        }
        self.lessons
            .lock()
            .unwrap()
            .insert(doc.lesson_id.clone(), doc.clone());
        Ok(())
    }

    async fn fetch_student(&self, user_id: &str) -> Result<Option<StudentDoc>> {
        Ok(self.students.lock().unwrap().get(user_id).cloned())
    }

    async fn store_student(&self, doc: &StudentDoc) -> Result<()> {
        self.students
            .lock()
            .unwrap()
            .insert(doc.user_id.clone(), doc.clone());
        Ok(())
    }
}

fn sample_seed() -> SeedFile {
    toml::from_str(
        r#"
        [[classes]]
        class_id = "testclass"
        location = "Memphis"
        teacher_name = "whitney.baer@gmail.com"
        meeting_time = "Tue 10am"

        [[lessons]]
        lesson_id = "lesson1"
        short_name = "1. Text Signals"

        [[lessons]]
        lesson_id = "lesson2"
        short_name = "2. Writer's Purpose"

        [[students]]
        user_id = "craig"
        first_name = "Craig"
        last_name = "Kelly"

        [[students]]
        user_id = "whitney"
        first_name = "Whitney"
        last_name = "Baer"
        "#,
    )
    .unwrap()
}

#[tokio::test]
async fn seed_creates_documents_with_defaults() {
    let api = FakeApi::default();
    let report = run_seed(&api, &sample_seed()).await.unwrap();

    assert_eq!(report.students, 2);
    assert_eq!(report.lessons, 2);
    assert_eq!(report.classes, 1);

    let students = api.students.lock().unwrap();
    let craig = &students["craig"];
    assert_eq!(craig.first_name.as_deref(), Some("Craig"));
    assert_eq!(craig.turn_count, 0);
    assert_eq!(craig.auto_created, Some(false));
    assert_eq!(craig.reading_urls, Some(Vec::new()));

    let lessons = api.lessons.lock().unwrap();
    let lesson1 = &lessons["lesson1"];
    assert_eq!(lesson1.short_name.as_deref(), Some("1. Text Signals"));
    assert_eq!(lesson1.students, vec!["craig", "whitney"]);
    assert!(lesson1.students_attempted.is_empty());

    let classes = api.classes.lock().unwrap();
    let class = &classes["testclass"];
    assert_eq!(class.location.as_deref(), Some("Memphis"));
    assert_eq!(class.students, vec!["craig", "whitney"]);
    assert_eq!(class.lessons, vec!["lesson1", "lesson2"]);
    assert_eq!(class.auto_created, Some(false));
}

#[tokio::test]
async fn seed_merges_into_existing_documents() {
    let api = FakeApi::default();

    // A class the ingest side auto-created earlier, with its own members
    // and a field this tool does not model
    let existing: ClassDoc = serde_json::from_value(json!({
        "ClassID": "testclass",
        "Location": "OldTown",
        "Students": ["dana"],
        "Lessons": ["lesson0"],
        "AutoCreated": true,
        "Term": "Fall"
    }))
    .unwrap();
    api.classes
        .lock()
        .unwrap()
        .insert("testclass".to_string(), existing);

    run_seed(&api, &sample_seed()).await.unwrap();

    let classes = api.classes.lock().unwrap();
    let class = &classes["testclass"];
    // Scalars owner-overwritten, memberships unioned, the rest untouched
    assert_eq!(class.location.as_deref(), Some("Memphis"));
    assert_eq!(class.students, vec!["craig", "dana", "whitney"]);
    assert_eq!(class.lessons, vec!["lesson0", "lesson1", "lesson2"]);
    assert_eq!(class.auto_created, Some(true));
    assert_eq!(class.extra["Term"], "Fall");
}

#[tokio::test]
async fn seed_is_idempotent() {
    let api = FakeApi::default();
    let seed = sample_seed();

    run_seed(&api, &seed).await.unwrap();
    let classes_once = api.classes.lock().unwrap().clone();
    let lessons_once = api.lessons.lock().unwrap().clone();
    let students_once = api.students.lock().unwrap().clone();

    run_seed(&api, &seed).await.unwrap();
    assert_eq!(*api.classes.lock().unwrap(), classes_once);
    assert_eq!(*api.lessons.lock().unwrap(), lessons_once);
    assert_eq!(*api.students.lock().unwrap(), students_once);
}

#[tokio::test]
async fn seed_stops_at_first_contract_violation() {
    let api = FakeApi {
        fail_lesson_writes: true,
        ..FakeApi::default()
    };

    let err = run_seed(&api, &sample_seed()).await.unwrap_err();
    assert!(matches!(err, Error::Contract(_)));

    // Students were written before the fault and stay; classes never start
    assert_eq!(api.students.lock().unwrap().len(), 2);
    assert!(api.lessons.lock().unwrap().is_empty());
    assert!(api.classes.lock().unwrap().is_empty());
}
