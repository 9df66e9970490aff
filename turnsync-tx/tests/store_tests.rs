//! Integration tests for the document store

use serde_json::json;
use turnsync_common::model::StudentActionsDoc;
use turnsync_tx::store;

async fn put_raw(pool: &sqlx::SqlitePool, doc: serde_json::Value) {
    let doc: StudentActionsDoc = serde_json::from_value(doc).unwrap();
    store::put_action_doc(pool, &doc).await.unwrap();
}

#[tokio::test]
async fn documents_round_trip_in_insertion_order() {
    let dir = tempfile::tempdir().unwrap();
    let pool = store::connect(&dir.path().join("store.db")).await.unwrap();

    put_raw(&pool, json!({"UserID": "zoe", "LessonID": "lesson2", "Turns": []})).await;
    put_raw(&pool, json!({"UserID": "amy", "LessonID": "lesson1", "Turns": []})).await;

    let docs = store::all_action_docs(&pool).await.unwrap();
    pool.close().await;

    assert_eq!(docs.len(), 2);
    assert_eq!(docs[0]["UserID"], "zoe");
    assert_eq!(docs[1]["UserID"], "amy");
}

#[tokio::test]
async fn replacing_a_document_keeps_one_copy() {
    let dir = tempfile::tempdir().unwrap();
    let pool = store::connect(&dir.path().join("store.db")).await.unwrap();

    put_raw(
        &pool,
        json!({"UserID": "craig", "LessonID": "lesson1", "TurnCount": 1}),
    )
    .await;
    put_raw(
        &pool,
        json!({"UserID": "craig", "LessonID": "lesson1", "TurnCount": 2}),
    )
    .await;

    let docs = store::all_action_docs(&pool).await.unwrap();
    pool.close().await;

    assert_eq!(docs.len(), 1);
    assert_eq!(docs[0]["TurnCount"], 2);
}

#[tokio::test]
async fn turn_summary_sorts_by_lesson_key_then_user() {
    let dir = tempfile::tempdir().unwrap();
    let pool = store::connect(&dir.path().join("store.db")).await.unwrap();

    put_raw(&pool, json!({"UserID": "bob", "LessonID": "lesson10", "TurnCount": 4})).await;
    put_raw(&pool, json!({"UserID": "bob", "LessonID": "lesson2", "TurnCount": 7})).await;
    put_raw(&pool, json!({"UserID": "amy", "LessonID": "lesson2", "TurnCount": 1})).await;
    // No ids at all: renders as ??? and sorts as a plain string
    put_raw(&pool, json!({"Turns": []})).await;

    let rows = store::turn_summary(&pool).await.unwrap();
    pool.close().await;

    let keys: Vec<(String, String, i64)> = rows
        .into_iter()
        .map(|r| (r.lesson_id, r.user_id, r.turn_count))
        .collect();

    assert_eq!(
        keys,
        vec![
            ("lesson2".to_string(), "amy".to_string(), 1),
            ("lesson2".to_string(), "bob".to_string(), 7),
            ("lesson10".to_string(), "bob".to_string(), 4),
            ("???".to_string(), "???".to_string(), 0),
        ]
    );
}
