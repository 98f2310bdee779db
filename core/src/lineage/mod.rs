//! Trial lineage analysis
//!
//! Aligns an ordered working set of trials along a shared column axis,
//! separates the mainline from superseded side lines, and answers
//! decorrelation and snapshot provenance queries over the result.
//!
//! Copyright (c) 2025 Mohammad Atashi <mohammadaliatashi@icloud.com>

pub mod alignment;
pub mod config;
pub mod decorrelation;
pub mod matrix;
pub mod nesting;
pub mod replica;
pub mod table;
pub mod trial;

pub use self::alignment::{AlignmentMetadata, TimeDirection};
pub use self::config::{AnalysisConfig, ConfigError, OrientationPolicy, DEFAULT_MAX_ANCESTRY_DEPTH};
pub use self::decorrelation::decorrelated_rows;
pub use self::matrix::{Column, ColumnRun, MatrixBounds, SnapshotMatrix};
pub use self::nesting::nesting_levels;
pub use self::replica::{ReplicaHistory, StepRecord};
pub use self::table::{LineageAnalyzer, LineageEntry, LineageError, LineageReport, LineageTable, ReportRow};
pub use self::trial::{
    AncestrySource, ChainOverflow, DetachedAncestry, MoveKind, ReplicaId, TrialHistory, TrialId, TrialRecord,
};
