//! Alignment pass
//!
//! Places every trial of a working set on a common column axis. Each trial is
//! aligned against its nearest ancestor present in the working set: the
//! longest block of frames they share must occupy the same columns in both
//! rows. Trials without a usable ancestor start a new line at column zero.
//!
//! Copyright (c) 2025 Mohammad Atashi <mohammadaliatashi@icloud.com>

use std::collections::HashMap;
use std::sync::Arc;

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use super::config::{AnalysisConfig, OrientationPolicy};
use super::matrix::{Column, SnapshotMatrix};
use super::table::LineageError;
use super::trial::{walk_ancestry, AncestrySource, TrialId, TrialRecord};
use crate::trajectory::Trajectory;

/// Reading direction of a trial's frames in aligned coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TimeDirection {
    Forward,
    Backward,
}

impl TimeDirection {
    /// `+1` or `-1`
    #[inline]
    pub fn sign(self) -> i8 {
        match self {
            TimeDirection::Forward => 1,
            TimeDirection::Backward => -1,
        }
    }

    #[inline]
    pub fn flipped(self) -> Self {
        match self {
            TimeDirection::Forward => TimeDirection::Backward,
            TimeDirection::Backward => TimeDirection::Forward,
        }
    }

    /// `trajectory` as it is laid out in aligned coordinates
    pub fn orient(self, trajectory: &Trajectory) -> Trajectory {
        match self {
            TimeDirection::Forward => trajectory.clone(),
            TimeDirection::Backward => trajectory.back_to_front(),
        }
    }
}

impl Default for TimeDirection {
    fn default() -> Self {
        TimeDirection::Forward
    }
}

/// Derived alignment of one trial
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlignmentMetadata {
    /// Row of the nearest ancestor present in the working set
    pub parent_row: Option<usize>,

    /// Column of the trial's first frame (in aligned reading order)
    pub shift: Column,

    /// Number of frames
    pub length: usize,

    /// Frames before the shared block
    pub length_bw: usize,

    /// Frames after the shared block
    pub length_fw: usize,

    /// Frames in the shared block
    pub length_shared: usize,

    pub time_direction: TimeDirection,

    /// Shared block runs backwards inside this trial
    pub overlap_reversed: bool,

    /// No usable overlap with a present ancestor
    pub is_new: bool,

    /// Depth below the mainline; zero for mainline trials
    pub nesting_level: usize,

    /// `length_shared / length`, zero for empty trajectories
    pub correlation: f64,

    /// First and last aligned column of the shared block
    pub overlap_columns: Option<(Column, Column)>,
}

impl AlignmentMetadata {
    fn new_line(parent_row: Option<usize>, length: usize) -> Self {
        Self {
            parent_row,
            shift: 0,
            length,
            length_bw: 0,
            length_fw: 0,
            length_shared: 0,
            time_direction: TimeDirection::Forward,
            overlap_reversed: false,
            is_new: true,
            nesting_level: 0,
            correlation: 0.0,
            overlap_columns: None,
        }
    }

    #[inline]
    pub fn is_mainline(&self) -> bool {
        self.nesting_level == 0
    }

    /// Aligned column of the frame at reading position `offset`
    #[inline]
    pub fn column_of(&self, offset: usize) -> Column {
        self.shift + offset as Column
    }
}

/// First analysis pass over a working set
pub(crate) struct AlignmentPass<'a, A: ?Sized> {
    pub trials: &'a [Arc<TrialRecord>],
    pub rows: &'a HashMap<TrialId, usize>,
    pub ancestry: &'a A,
    pub config: &'a AnalysisConfig,
}

impl<'a, A> AlignmentPass<'a, A>
where
    A: AncestrySource + ?Sized,
{
    /// Align every trial in order, filling a fresh snapshot matrix
    pub fn run(&self) -> Result<(Vec<AlignmentMetadata>, SnapshotMatrix), LineageError> {
        let mut aligned: Vec<AlignmentMetadata> = Vec::with_capacity(self.trials.len());
        let mut matrix = SnapshotMatrix::new(self.config.frame_match());

        for (row, trial) in self.trials.iter().enumerate() {
            let parent_row = self.present_ancestor(trial)?;
            let (metadata, layout) = self.align(row, trial, parent_row, &aligned);

            let matrix_row = matrix.push_row(parent_row);
            debug_assert_eq!(matrix_row, row);
            for (offset, frame) in layout.iter().enumerate() {
                matrix.write(row, metadata.column_of(offset), frame);
            }

            aligned.push(metadata);
        }

        Ok((aligned, matrix))
    }

    /// Row of the nearest ancestor of `trial` that is part of the working set
    fn present_ancestor(&self, trial: &TrialRecord) -> Result<Option<usize>, LineageError> {
        let found = walk_ancestry(
            trial.id(),
            trial.parent(),
            |id| self.ancestry.parent_of(id),
            |id| self.rows.contains_key(&id),
            self.config.max_ancestry_depth,
        )?;

        Ok(found.and_then(|id| self.rows.get(&id).copied()))
    }

    /// Metadata of one trial plus its frames in aligned reading order
    fn align(
        &self,
        row: usize,
        trial: &TrialRecord,
        parent_row: Option<usize>,
        aligned: &[AlignmentMetadata],
    ) -> (AlignmentMetadata, Trajectory) {
        let trajectory = trial.trajectory();
        let length = trajectory.len();
        let policy = self.config.frame_match();

        let Some(parent_row) = parent_row else {
            debug!("{} (row {}): no present ancestor, new line", trial.id(), row);
            return (AlignmentMetadata::new_line(None, length), trajectory.clone());
        };

        let Some(parent) = aligned.get(parent_row) else {
            warn!(
                "{} (row {}): ancestor at row {} is not analyzed yet, treating as new",
                trial.id(),
                row,
                parent_row
            );
            return (
                AlignmentMetadata::new_line(Some(parent_row), length),
                trajectory.clone(),
            );
        };

        let direction = parent.time_direction;
        let parent_layout = direction.orient(self.trials[parent_row].trajectory());
        let layout = direction.orient(trajectory);

        let overlap = parent_layout.shared_subtrajectory(&layout, policy);
        let located = match (overlap.first(), overlap.last()) {
            (Some(first), Some(last)) => layout
                .index_of(first, policy)
                .zip(layout.index_of(last, policy))
                .zip(parent_layout.index_of(first, policy))
                .map(|((bw, fw), in_parent)| (bw, fw, in_parent)),
            _ => None,
        };

        let Some((mut new_bw, mut new_fw, parent_index)) = located else {
            debug!(
                "{} (row {}): no overlap with row {}, new line",
                trial.id(),
                row,
                parent_row
            );
            return (
                AlignmentMetadata::new_line(Some(parent_row), length),
                trajectory.clone(),
            );
        };

        let mut time_direction = direction;
        let mut overlap_reversed = false;
        let mut layout = layout;

        if new_bw > new_fw {
            std::mem::swap(&mut new_bw, &mut new_fw);
            match self.config.orientation {
                OrientationPolicy::MarkReversed => overlap_reversed = true,
                OrientationPolicy::FlipTimeDirection => {
                    time_direction = time_direction.flipped();
                    layout = layout.back_to_front();
                    let (bw, fw) = (length - 1 - new_fw, length - 1 - new_bw);
                    new_bw = bw;
                    new_fw = fw;
                }
            }
        }

        let shift = parent.shift + parent_index as Column - new_bw as Column;
        let length_shared = overlap.len();

        debug!(
            "{} (row {}): aligned to row {} with shift {}, {} shared frames{}",
            trial.id(),
            row,
            parent_row,
            shift,
            length_shared,
            if overlap_reversed { " (reversed)" } else { "" }
        );

        let metadata = AlignmentMetadata {
            parent_row: Some(parent_row),
            shift,
            length,
            length_bw: new_bw,
            length_fw: length - 1 - new_fw,
            length_shared,
            time_direction,
            overlap_reversed,
            is_new: false,
            nesting_level: 0,
            correlation: length_shared as f64 / length as f64,
            overlap_columns: Some((shift + new_bw as Column, shift + new_fw as Column)),
        };

        (metadata, layout)
    }
}
