//! Turn relabeling (relocation/reclassification)
//!
//! A `Relabel` carries the target (location, class) pair and rewrites the
//! composite `UserID` of each turn to point at it. Everything else in the
//! turn passes through untouched.

use crate::error::{Error, Result};
use crate::identity::CompositeUserId;
use crate::model::Turn;

/// Target (location, class) pair for rewriting turn identities
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relabel {
    pub location: String,
    pub class: String,
}

impl Relabel {
    pub fn new(location: impl Into<String>, class: impl Into<String>) -> Self {
        Relabel {
            location: location.into(),
            class: class.into(),
        }
    }

    /// Rewrite one turn's `UserID` to the target location and class.
    ///
    /// Fails with an identity error when the decoded user portion is
    /// empty: there is nothing to attach the new location and class to.
    pub fn apply(&self, mut turn: Turn) -> Result<Turn> {
        let decoded = CompositeUserId::decode(&turn.user_id);
        if decoded.user.is_empty() {
            return Err(Error::Identity(format!(
                "no user id portion in {:?}",
                turn.user_id
            )));
        }

        turn.user_id = CompositeUserId::encode(&self.location, &self.class, &decoded.user);
        Ok(turn)
    }

    /// Rewrite a whole batch, preserving order.
    ///
    /// The first malformed record fails the entire batch. Callers write no
    /// output on failure, so every record is effectively validated before
    /// any output is produced.
    pub fn apply_all(&self, turns: Vec<Turn>) -> Result<Vec<Turn>> {
        turns.into_iter().map(|turn| self.apply(turn)).collect()
    }
}
