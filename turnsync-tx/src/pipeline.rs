//! Bulk transfer of turn records between the interchange file format, the
//! document store, and the turn-ingest endpoint.
//!
//! Every direction observes the read-all-before-write invariant: the whole
//! source is parsed and validated in memory before the first write to the
//! destination. A malformed record anywhere in the source aborts the run
//! with zero partial writes. Records reach the destination in exactly the
//! order they were read.

use std::io::Write;
use std::path::Path;

use serde_json::Value;
use sqlx::SqlitePool;
use tracing::{debug, info};
use turnsync_common::model::Turn;
use turnsync_common::rewrite::Relabel;
use turnsync_common::{Error, Result};

use crate::store;

/// Destination for validated turns: the turn-ingest endpoint in
/// production, a recording fake in tests.
#[allow(async_fn_in_trait)]
pub trait TurnSink {
    async fn post_turn(&self, turn: &Turn) -> Result<()>;
}

/// Phases of one pipeline run.
///
/// Writing begins only after the whole source validated, so `Failed` is
/// reachable from `Writing` only through a destination-side fault.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Collecting,
    Validated,
    Writing,
    Done,
    Failed,
}

impl RunState {
    /// Step to the next phase, panicking on a transition the pipeline can
    /// never legally make.
    pub fn advance(self, next: RunState) -> RunState {
        use RunState::*;
        let legal = matches!(
            (self, next),
            (Collecting, Validated)
                | (Collecting, Failed)
                | (Validated, Writing)
                | (Validated, Failed)
                | (Writing, Done)
                | (Writing, Failed)
        );
        assert!(legal, "illegal run state transition {:?} -> {:?}", self, next);
        next
    }
}

/// Outcome of a successful run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunReport {
    pub state: RunState,
    pub read: usize,
    pub written: usize,
}

/// Parse every non-blank line of an interchange file as one turn.
///
/// Line numbers are 1-based in validation errors. Blank lines are
/// ignored.
fn collect_turns(contents: &str) -> Result<Vec<Turn>> {
    let mut turns = Vec::new();
    for (idx, line) in contents.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let turn: Turn = serde_json::from_str(line)
            .map_err(|e| Error::Validation(format!("line {}: {}", idx + 1, e)))?;
        turns.push(turn);
    }
    Ok(turns)
}

/// Import: interchange file -> turn-ingest endpoint.
///
/// The whole file is parsed (and, when requested, relabeled) before the
/// first post. A destination acknowledgement fault aborts the remaining
/// batch; posts already made stay committed.
pub async fn import_file<S: TurnSink>(
    path: &Path,
    relabel: Option<&Relabel>,
    sink: &S,
) -> Result<RunReport> {
    let mut state = RunState::Collecting;
    info!(file = %path.display(), "importing turns");

    let contents = std::fs::read_to_string(path)?;
    let turns = match collect_turns(&contents).and_then(|turns| match relabel {
        Some(relabel) => relabel.apply_all(turns),
        None => Ok(turns),
    }) {
        Ok(turns) => turns,
        Err(e) => {
            state.advance(RunState::Failed);
            return Err(e);
        }
    };
    state = state.advance(RunState::Validated);
    info!(turns = turns.len(), "source validated");

    state = state.advance(RunState::Writing);
    let mut written = 0;
    for turn in &turns {
        debug!(turn = %turn.log_label(), "posting turn");
        if let Err(e) = sink.post_turn(turn).await {
            state.advance(RunState::Failed);
            return Err(e);
        }
        written += 1;
    }
    state = state.advance(RunState::Done);

    Ok(RunReport {
        state,
        read: turns.len(),
        written,
    })
}

/// Export: document store -> interchange file.
///
/// Documents are visited in store cursor order, their embedded turn
/// sequences in array order; null entries are skipped without error. All
/// lines are rendered in memory before the output file is opened, so a
/// malformed stored document leaves no partial file behind.
pub async fn export_store(pool: &SqlitePool, path: &Path) -> Result<RunReport> {
    let mut state = RunState::Collecting;
    info!(file = %path.display(), "exporting turns");

    let docs = match store::all_action_docs(pool).await {
        Ok(docs) => docs,
        Err(e) => {
            state.advance(RunState::Failed);
            return Err(e);
        }
    };

    let mut lines = Vec::new();
    for doc in &docs {
        let user = doc
            .get("UserID")
            .and_then(Value::as_str)
            .unwrap_or("{MISSING}");
        let lesson = doc
            .get("LessonID")
            .and_then(Value::as_str)
            .unwrap_or("{MISSING}");
        debug!(user, lesson, "exporting document");

        let turns = doc.get("Turns").and_then(Value::as_array);
        for turn in turns.map(|t| t.as_slice()).unwrap_or_default() {
            if turn.is_null() {
                continue;
            }
            // Value serialization cannot fail; a line per non-null turn
            lines.push(turn.to_string());
        }
    }
    state = state.advance(RunState::Validated);
    info!(documents = docs.len(), turns = lines.len(), "store read complete");

    state = state.advance(RunState::Writing);
    let mut out = std::fs::File::create(path)?;
    for line in &lines {
        writeln!(out, "{}", line)?;
    }
    state = state.advance(RunState::Done);

    Ok(RunReport {
        state,
        read: lines.len(),
        written: lines.len(),
    })
}

/// Relabel: interchange file -> interchange file with every turn's
/// location and class rewritten.
///
/// The output file is not even created until every input record has
/// parsed and relabeled successfully.
pub fn relabel_file(input: &Path, output: &Path, relabel: &Relabel) -> Result<RunReport> {
    let mut state = RunState::Collecting;
    info!(
        input = %input.display(),
        output = %output.display(),
        location = %relabel.location,
        class = %relabel.class,
        "relabeling turns"
    );

    let contents = std::fs::read_to_string(input)?;
    let turns = match collect_turns(&contents).and_then(|turns| relabel.apply_all(turns)) {
        Ok(turns) => turns,
        Err(e) => {
            state.advance(RunState::Failed);
            return Err(e);
        }
    };
    state = state.advance(RunState::Validated);

    state = state.advance(RunState::Writing);
    let mut out = std::fs::File::create(output)?;
    for turn in &turns {
        let line = serde_json::to_string(turn)
            .map_err(|e| Error::Validation(format!("reserializing turn: {}", e)))?;
        writeln!(out, "{}", line)?;
    }
    state = state.advance(RunState::Done);

    Ok(RunReport {
        state,
        read: turns.len(),
        written: turns.len(),
    })
}
