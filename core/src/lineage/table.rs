//! Lineage table
//!
//! The ordered working set of trials together with the alignment metadata
//! derived for each of them and the snapshot matrix built along the way.
//! Tables are immutable once analyzed; re-running the analysis with another
//! configuration or working set produces a new table.
//!
//! Copyright (c) 2025 Mohammad Atashi <mohammadaliatashi@icloud.com>

use std::collections::HashMap;
use std::sync::Arc;

use log::{debug, info};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::alignment::{AlignmentMetadata, AlignmentPass};
use super::config::{AnalysisConfig, ConfigError};
use super::matrix::{MatrixBounds, SnapshotMatrix};
use super::nesting::nesting_levels;
use super::replica::ReplicaHistory;
use super::trial::{AncestrySource, ChainOverflow, MoveKind, ReplicaId, TrialHistory, TrialId, TrialRecord};

/// Lineage analysis errors
#[derive(Error, Debug)]
pub enum LineageError {
    #[error("Cyclic ancestry: parent chain of {trial} exceeds {limit} links")]
    CyclicAncestry { trial: TrialId, limit: usize },

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<ChainOverflow> for LineageError {
    fn from(overflow: ChainOverflow) -> Self {
        LineageError::CyclicAncestry {
            trial: overflow.trial,
            limit: overflow.limit,
        }
    }
}

/// One analyzed trial
#[derive(Debug, Clone, PartialEq)]
pub struct LineageEntry {
    pub trial: Arc<TrialRecord>,
    pub metadata: AlignmentMetadata,
}

/// Ordered association of trials to their alignment metadata
#[derive(Debug, Clone)]
pub struct LineageTable {
    entries: Vec<LineageEntry>,
    rows: HashMap<TrialId, usize>,
    matrix: SnapshotMatrix,
    config: AnalysisConfig,
}

impl LineageTable {
    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[inline]
    pub fn entries(&self) -> &[LineageEntry] {
        &self.entries
    }

    pub fn get(&self, row: usize) -> Option<&LineageEntry> {
        self.entries.get(row)
    }

    pub fn row_of(&self, trial: TrialId) -> Option<usize> {
        self.rows.get(&trial).copied()
    }

    pub fn contains(&self, trial: TrialId) -> bool {
        self.rows.contains_key(&trial)
    }

    pub fn metadata(&self, trial: TrialId) -> Option<&AlignmentMetadata> {
        self.row_of(trial).map(|row| &self.entries[row].metadata)
    }

    pub fn trials(&self) -> impl Iterator<Item = &Arc<TrialRecord>> + '_ {
        self.entries.iter().map(|entry| &entry.trial)
    }

    #[inline]
    pub fn matrix(&self) -> &SnapshotMatrix {
        &self.matrix
    }

    #[inline]
    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Rows with nesting level zero, in table order
    pub fn mainline_rows(&self) -> Vec<usize> {
        self.entries
            .iter()
            .enumerate()
            .filter(|(_, entry)| entry.metadata.is_mainline())
            .map(|(row, _)| row)
            .collect()
    }

    /// Serializable snapshot of the analysis
    pub fn report(&self) -> LineageReport {
        LineageReport {
            config: self.config.clone(),
            rows: self
                .entries
                .iter()
                .map(|entry| ReportRow {
                    trial: entry.trial.id(),
                    replica: entry.trial.replica(),
                    parent: entry.trial.parent(),
                    move_kind: entry.trial.move_kind().clone(),
                    metadata: entry.metadata.clone(),
                })
                .collect(),
            decorrelated: self.decorrelated().iter().map(|trial| trial.id()).collect(),
            bounds: self.matrix.bounds(),
        }
    }

    /// [`LineageTable::report`] rendered as pretty JSON
    pub fn report_json(&self) -> Result<String, LineageError> {
        Ok(serde_json::to_string_pretty(&self.report())?)
    }
}

/// Serializable analysis result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineageReport {
    pub config: AnalysisConfig,
    pub rows: Vec<ReportRow>,
    pub decorrelated: Vec<TrialId>,
    pub bounds: Option<MatrixBounds>,
}

/// One row of a [`LineageReport`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportRow {
    pub trial: TrialId,
    pub replica: ReplicaId,
    pub parent: Option<TrialId>,
    pub move_kind: MoveKind,
    #[serde(flatten)]
    pub metadata: AlignmentMetadata,
}

/// Runs the lineage analysis for a validated configuration
#[derive(Debug, Clone)]
pub struct LineageAnalyzer {
    config: AnalysisConfig,
}

impl LineageAnalyzer {
    pub fn new(config: AnalysisConfig) -> Result<Self, LineageError> {
        config.validate()?;
        Ok(Self { config })
    }

    #[inline]
    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Analyze a working set in the given (chronological) order.
    ///
    /// Parent links that leave the working set are followed through
    /// `ancestry` until a trial of the working set is reached. Repeated
    /// trial ids keep their first occurrence.
    pub fn analyze<A>(
        &self,
        working_set: &[Arc<TrialRecord>],
        ancestry: &A,
    ) -> Result<LineageTable, LineageError>
    where
        A: AncestrySource + ?Sized,
    {
        let mut trials: Vec<Arc<TrialRecord>> = Vec::with_capacity(working_set.len());
        let mut rows: HashMap<TrialId, usize> = HashMap::with_capacity(working_set.len());
        for trial in working_set {
            if rows.contains_key(&trial.id()) {
                debug!("{} appears more than once in the working set, keeping first", trial.id());
                continue;
            }
            rows.insert(trial.id(), trials.len());
            trials.push(Arc::clone(trial));
        }

        let (aligned, matrix) = AlignmentPass {
            trials: &trials,
            rows: &rows,
            ancestry,
            config: &self.config,
        }
        .run()?;

        let parent_rows: Vec<Option<usize>> = aligned.iter().map(|m| m.parent_row).collect();
        let overlay = nesting_levels(&parent_rows);

        let entries: Vec<LineageEntry> = trials
            .into_iter()
            .zip(aligned)
            .zip(overlay)
            .map(|((trial, metadata), nesting_level)| LineageEntry {
                trial,
                metadata: AlignmentMetadata {
                    nesting_level,
                    ..metadata
                },
            })
            .collect();

        let table = LineageTable {
            entries,
            rows,
            matrix,
            config: self.config.clone(),
        };

        info!(
            "lineage analysis: {} rows, {} occupied cells, {} decorrelated",
            table.len(),
            table.matrix.occupied_cells(),
            table.decorrelated_count()
        );

        Ok(table)
    }

    /// Analyze one working set per replica in parallel
    pub fn analyze_replicas(
        &self,
        history: &TrialHistory,
        replicas: &[ReplicaHistory],
        include_rejected: bool,
    ) -> Result<Vec<LineageTable>, LineageError> {
        replicas
            .par_iter()
            .map(|replica| {
                let samples =
                    replica.samples(history, include_rejected, self.config.max_ancestry_depth)?;
                self.analyze(&samples, history)
            })
            .collect()
    }
}
