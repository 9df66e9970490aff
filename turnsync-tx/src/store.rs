//! Document store access
//!
//! The store is a SQLite-backed document collection: one row per
//! student+lesson activity document, with the full JSON document in the
//! `doc` column and denormalized id columns for lookups. Rowid order is
//! the store's native cursor order, which the export pipeline relies on.

use std::path::Path;

use serde_json::Value;
use sqlx::{Row, SqlitePool};
use turnsync_common::model::{lesson_sort_key, StudentActionsDoc};
use turnsync_common::{Error, Result};

/// Open (or create) the document store read-write
pub async fn connect(db_path: &Path) -> Result<SqlitePool> {
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let db_url = format!("sqlite://{}?mode=rwc", db_path.display());
    tracing::debug!("Connecting to document store: {}", db_url);

    let pool = SqlitePool::connect(&db_url).await?;
    init_tables(&pool).await?;
    Ok(pool)
}

/// Open an existing document store read-only (export and summary never
/// mutate the store)
pub async fn connect_readonly(db_path: &Path) -> Result<SqlitePool> {
    let db_url = format!("sqlite://{}?mode=ro", db_path.display());
    tracing::debug!("Connecting to document store (read-only): {}", db_url);

    let pool = SqlitePool::connect(&db_url).await?;
    Ok(pool)
}

async fn init_tables(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS student_actions (
            id TEXT PRIMARY KEY,
            user_id TEXT,
            lesson_id TEXT,
            doc TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Store one student-actions document under its `user:lesson` key
pub async fn put_action_doc(pool: &SqlitePool, doc: &StudentActionsDoc) -> Result<()> {
    let user_id = doc.user_id.clone().unwrap_or_default();
    let lesson_id = doc.lesson_id.clone().unwrap_or_default();
    let id = format!("{}:{}", user_id, lesson_id);
    let body = serde_json::to_string(doc)
        .map_err(|e| Error::Validation(format!("serializing document {}: {}", id, e)))?;

    sqlx::query(
        "INSERT OR REPLACE INTO student_actions (id, user_id, lesson_id, doc) VALUES (?, ?, ?, ?)",
    )
    .bind(&id)
    .bind(&user_id)
    .bind(&lesson_id)
    .bind(&body)
    .execute(pool)
    .await?;

    Ok(())
}

/// Every student-actions document, in cursor (rowid) order.
///
/// Documents come back as raw JSON values: the store accepts nearly any
/// record shape in an effort to preserve data, so export must not force
/// them through the typed model.
pub async fn all_action_docs(pool: &SqlitePool) -> Result<Vec<Value>> {
    let rows = sqlx::query("SELECT id, doc FROM student_actions ORDER BY rowid")
        .fetch_all(pool)
        .await?;

    let mut docs = Vec::with_capacity(rows.len());
    for row in rows {
        let id: String = row.get("id");
        let body: String = row.get("doc");
        let doc: Value = serde_json::from_str(&body)
            .map_err(|e| Error::Validation(format!("stored document {}: {}", id, e)))?;
        docs.push(doc);
    }
    Ok(docs)
}

/// One row of the turn summary listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SummaryRow {
    pub lesson_id: String,
    pub user_id: String,
    pub turn_count: i64,
}

/// Per-document (lesson, student, turn count) summary, sorted by lesson
/// sort key then student id. Missing fields render as `???` / 0 rather
/// than failing the listing.
pub async fn turn_summary(pool: &SqlitePool) -> Result<Vec<SummaryRow>> {
    let docs = all_action_docs(pool).await?;

    let mut rows: Vec<SummaryRow> = docs
        .iter()
        .map(|doc| SummaryRow {
            lesson_id: doc
                .get("LessonID")
                .and_then(Value::as_str)
                .unwrap_or("???")
                .to_string(),
            user_id: doc
                .get("UserID")
                .and_then(Value::as_str)
                .unwrap_or("???")
                .to_string(),
            turn_count: doc.get("TurnCount").and_then(Value::as_i64).unwrap_or(0),
        })
        .collect();

    rows.sort_by(|a, b| {
        lesson_sort_key(&a.lesson_id)
            .cmp(&lesson_sort_key(&b.lesson_id))
            .then_with(|| a.user_id.cmp(&b.user_id))
    });
    Ok(rows)
}
