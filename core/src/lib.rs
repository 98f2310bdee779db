//! PATHTREE: Trajectory Lineage Analysis
//!
//! Analyzes the ancestry of trial trajectories produced by Monte-Carlo path
//! sampling. Every trial is aligned against its nearest ancestor in the
//! working set so shared frames land in the same column, superseded side
//! lines are separated from the accepted mainline, and a sparse snapshot
//! matrix answers "where did this frame first appear" queries for renderers
//! and statistics consumers.
//!
//! ```
//! use std::sync::Arc;
//! use pathtree_core::lineage::{AnalysisConfig, DetachedAncestry, LineageAnalyzer, ReplicaId, TrialId, TrialRecord};
//! use pathtree_core::trajectory::{Frame, Trajectory};
//!
//! let frames = |c: &[u64]| c.iter().map(|&c| Frame::canonical(c)).collect::<Trajectory>();
//! let trials = vec![
//!     Arc::new(TrialRecord::new(TrialId(0), ReplicaId(0), frames(&[0, 1, 2, 3]))),
//!     Arc::new(TrialRecord::new(TrialId(1), ReplicaId(0), frames(&[1, 2, 3, 4])).with_parent(TrialId(0))),
//! ];
//!
//! let table = LineageAnalyzer::new(AnalysisConfig::default())?
//!     .analyze(&trials, &DetachedAncestry)?;
//! assert_eq!(table.metadata(TrialId(1)).map(|m| m.shift), Some(1));
//! # Ok::<(), pathtree_core::lineage::LineageError>(())
//! ```
//!
//! Copyright (c) 2025 Mohammad Atashi <mohammadaliatashi@icloud.com>

pub mod lineage;
pub mod trajectory;

pub use lineage::{
    AlignmentMetadata, AnalysisConfig, LineageAnalyzer, LineageError, LineageTable, SnapshotMatrix, TrialId,
    TrialRecord,
};
pub use trajectory::{Frame, FrameMatch, Trajectory};
