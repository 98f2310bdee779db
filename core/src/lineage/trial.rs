//! Trial records and the ancestry they form
//!
//! Every Monte-Carlo move attempt produces one trial record holding the trial
//! trajectory and a link to the trial it was generated from. Parent links are
//! plain identifiers resolved through an [`AncestrySource`], so a working set
//! can reference ancestors it does not contain.
//!
//! Copyright (c) 2025 Mohammad Atashi <mohammadaliatashi@icloud.com>

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use log::trace;
use serde::{Deserialize, Serialize};

use crate::trajectory::Trajectory;

/// Trial identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TrialId(pub u64);

impl fmt::Display for TrialId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "trial#{}", self.0)
    }
}

/// Replica identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ReplicaId(pub i32);

/// Kind of move that produced a trial; only used for presentation
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MoveKind {
    /// Shooting move (forward or backward)
    Shooting,

    /// Path extension
    Extension,

    /// Path truncation
    Truncation,

    /// Path reversal
    Reversal,

    /// Replica exchange
    ReplicaExchange,

    /// Any other mover, by name
    Other(String),
}

impl Default for MoveKind {
    fn default() -> Self {
        MoveKind::Other(String::new())
    }
}

/// One attempted move outcome
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrialRecord {
    id: TrialId,
    replica: ReplicaId,
    trajectory: Trajectory,
    parent: Option<TrialId>,
    move_kind: MoveKind,
}

impl TrialRecord {
    pub fn new(id: TrialId, replica: ReplicaId, trajectory: Trajectory) -> Self {
        Self {
            id,
            replica,
            trajectory,
            parent: None,
            move_kind: MoveKind::default(),
        }
    }

    pub fn with_parent(mut self, parent: TrialId) -> Self {
        self.parent = Some(parent);
        self
    }

    pub fn with_move(mut self, move_kind: MoveKind) -> Self {
        self.move_kind = move_kind;
        self
    }

    #[inline]
    pub fn id(&self) -> TrialId {
        self.id
    }

    #[inline]
    pub fn replica(&self) -> ReplicaId {
        self.replica
    }

    #[inline]
    pub fn trajectory(&self) -> &Trajectory {
        &self.trajectory
    }

    #[inline]
    pub fn parent(&self) -> Option<TrialId> {
        self.parent
    }

    #[inline]
    pub fn move_kind(&self) -> &MoveKind {
        &self.move_kind
    }
}

/// Resolves parent links of trials that are not part of a working set
pub trait AncestrySource {
    /// Parent of `trial`, or `None` when it has none or is unknown
    fn parent_of(&self, trial: TrialId) -> Option<TrialId>;
}

/// Ancestry source that knows no trials at all
#[derive(Debug, Clone, Copy, Default)]
pub struct DetachedAncestry;

impl AncestrySource for DetachedAncestry {
    fn parent_of(&self, _trial: TrialId) -> Option<TrialId> {
        None
    }
}

/// Parent chain exceeded the configured cap
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChainOverflow {
    pub trial: TrialId,
    pub limit: usize,
}

/// Walk parent links starting at `start` until `accept` holds.
///
/// `start` itself is the first candidate. Returns the first accepted
/// candidate, `None` when the chain ends, or [`ChainOverflow`] when more than
/// `limit` links were followed.
pub(crate) fn walk_ancestry<F>(
    origin: TrialId,
    start: Option<TrialId>,
    parent_of: impl Fn(TrialId) -> Option<TrialId>,
    mut accept: F,
    limit: usize,
) -> Result<Option<TrialId>, ChainOverflow>
where
    F: FnMut(TrialId) -> bool,
{
    let mut candidate = start;
    let mut steps = 0usize;

    while let Some(current) = candidate {
        if accept(current) {
            return Ok(Some(current));
        }
        steps += 1;
        if steps > limit {
            return Err(ChainOverflow {
                trial: origin,
                limit,
            });
        }
        trace!("{}: skipping ancestor {} outside working set", origin, current);
        candidate = parent_of(current);
    }

    Ok(None)
}

/// Store of every known trial record
#[derive(Debug, Clone, Default)]
pub struct TrialHistory {
    trials: HashMap<TrialId, Arc<TrialRecord>>,
}

impl TrialHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a record, returning the shared handle; an existing record with
    /// the same id is replaced
    pub fn insert(&mut self, record: TrialRecord) -> Arc<TrialRecord> {
        let record = Arc::new(record);
        self.trials.insert(record.id(), Arc::clone(&record));
        record
    }

    pub fn get(&self, id: TrialId) -> Option<&Arc<TrialRecord>> {
        self.trials.get(&id)
    }

    pub fn len(&self) -> usize {
        self.trials.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trials.is_empty()
    }

    /// Accepted chain ending at `id`, origin first.
    ///
    /// The walk stops at the first trial without a parent or whose parent is
    /// not in the store. Returns [`ChainOverflow`] for chains longer than
    /// `limit`.
    pub fn heritage(&self, id: TrialId, limit: usize) -> Result<Vec<Arc<TrialRecord>>, ChainOverflow> {
        let mut chain = Vec::new();
        let mut current = self.get(id);

        while let Some(record) = current {
            if chain.len() >= limit {
                return Err(ChainOverflow { trial: id, limit });
            }
            chain.push(Arc::clone(record));
            current = record.parent().and_then(|parent| self.get(parent));
        }

        chain.reverse();
        Ok(chain)
    }
}

impl AncestrySource for TrialHistory {
    fn parent_of(&self, trial: TrialId) -> Option<TrialId> {
        self.trials.get(&trial).and_then(|record| record.parent())
    }
}

impl Extend<TrialRecord> for TrialHistory {
    fn extend<I: IntoIterator<Item = TrialRecord>>(&mut self, iter: I) {
        for record in iter {
            self.insert(record);
        }
    }
}
