//! Decorrelation queries
//!
//! Two trajectories are decorrelated when they share no frame at all. Walking
//! the mainline in order, every trajectory that is decorrelated from the last
//! reference becomes the new reference; their number is the count of
//! statistically independent paths in the lineage.
//!
//! Copyright (c) 2025 Mohammad Atashi <mohammadaliatashi@icloud.com>

use std::ops::Range;
use std::sync::Arc;

use super::table::LineageTable;
use super::trial::TrialRecord;
use crate::trajectory::{FrameMatch, Trajectory};

/// Rows of decorrelated trajectories.
///
/// `rows` yields each row's trajectory and whether the row is on the
/// mainline. The first row is always included; afterwards only mainline rows
/// are considered.
pub fn decorrelated_rows<'a, I>(rows: I, policy: FrameMatch) -> Vec<usize>
where
    I: IntoIterator<Item = (&'a Trajectory, bool)>,
{
    let mut rows = rows.into_iter().enumerate();
    let Some((_, (first, _))) = rows.next() else {
        return Vec::new();
    };

    let mut reference = first;
    let mut result = vec![0];

    for (row, (trajectory, mainline)) in rows {
        if !mainline {
            continue;
        }
        if !trajectory.is_correlated(reference, policy) {
            result.push(row);
            reference = trajectory;
        }
    }

    result
}

impl LineageTable {
    fn decorrelated_row_indices(&self) -> Vec<usize> {
        decorrelated_rows(
            self.entries()
                .iter()
                .map(|entry| (entry.trial.trajectory(), entry.metadata.is_mainline())),
            self.config().frame_match(),
        )
    }

    /// Decorrelated trials in table order
    pub fn decorrelated(&self) -> Vec<Arc<TrialRecord>> {
        self.decorrelated_row_indices()
            .into_iter()
            .map(|row| Arc::clone(&self.entries()[row].trial))
            .collect()
    }

    pub fn decorrelated_trajectories(&self) -> Vec<Trajectory> {
        self.decorrelated()
            .iter()
            .map(|trial| trial.trajectory().clone())
            .collect()
    }

    pub fn decorrelated_count(&self) -> usize {
        self.decorrelated_row_indices().len()
    }

    /// Row ranges that share one reference trajectory; each range starts at
    /// a decorrelated row and ends before the next one
    pub fn decorrelated_segments(&self) -> Vec<Range<usize>> {
        let starts = self.decorrelated_row_indices();
        let ends = starts.iter().skip(1).copied().chain(std::iter::once(self.len()));
        starts.iter().copied().zip(ends).map(|(start, end)| start..end).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lineage::config::AnalysisConfig;
    use crate::lineage::table::LineageAnalyzer;
    use crate::lineage::trial::{DetachedAncestry, ReplicaId, TrialId};
    use crate::trajectory::Frame;

    fn traj(configurations: &[u64]) -> Trajectory {
        configurations.iter().map(|&c| Frame::canonical(c)).collect()
    }

    fn trial(id: u64, parent: Option<u64>, trajectory: Trajectory) -> Arc<TrialRecord> {
        let record = TrialRecord::new(TrialId(id), ReplicaId(0), trajectory);
        Arc::new(match parent {
            Some(p) => record.with_parent(TrialId(p)),
            None => record,
        })
    }

    fn ids(trials: &[Arc<TrialRecord>]) -> Vec<u64> {
        trials.iter().map(|t| t.id().0).collect()
    }

    #[test]
    fn test_reference_moves_with_each_decorrelated_path() {
        // chain 0..4 where 2 shares nothing with 0 and 4 nothing with 2
        let trials = vec![
            trial(0, None, traj(&[0, 1, 2])),
            trial(1, Some(0), traj(&[2, 3, 4])),
            trial(2, Some(1), traj(&[4, 5, 6])),
            trial(3, Some(2), traj(&[6, 7])),
            trial(4, Some(3), traj(&[8, 9])),
        ];
        let table = LineageAnalyzer::new(AnalysisConfig::default())
            .unwrap()
            .analyze(&trials, &DetachedAncestry)
            .unwrap();

        // 4 is uncorrelated to its parent but 3 never became a reference
        assert_eq!(ids(&table.decorrelated()), vec![0, 2, 4]);
        assert_eq!(table.decorrelated_count(), 3);
        assert_eq!(table.decorrelated_trajectories()[1], traj(&[4, 5, 6]));
        assert_eq!(table.decorrelated_segments(), vec![0..2, 2..4, 4..5]);
    }

    #[test]
    fn test_side_lines_are_ignored() {
        // row 1 is superseded by row 2 (which returns to row 0)
        let trials = vec![
            trial(0, None, traj(&[0, 1, 2])),
            trial(1, Some(0), traj(&[2, 10, 11])),
            trial(2, Some(0), traj(&[0, 20])),
            trial(3, None, traj(&[30, 31])),
        ];
        let table = LineageAnalyzer::new(AnalysisConfig::default())
            .unwrap()
            .analyze(&trials, &DetachedAncestry)
            .unwrap();

        assert_eq!(table.metadata(TrialId(1)).unwrap().nesting_level, 1);
        assert_eq!(ids(&table.decorrelated()), vec![0, 3]);
    }

    #[test]
    fn test_policy_controls_reversed_frames() {
        let a = traj(&[0, 1]);
        let b = a.reversed();
        let rows = vec![(&a, true), (&b, true)];

        assert_eq!(decorrelated_rows(rows.clone(), FrameMatch::TimeSymmetric), vec![0]);
        assert_eq!(decorrelated_rows(rows, FrameMatch::Exact), vec![0, 1]);
        assert!(decorrelated_rows(Vec::<(&Trajectory, bool)>::new(), FrameMatch::Exact).is_empty());
    }

    #[test]
    fn test_first_row_counts_even_when_nested() {
        let a = traj(&[0, 1]);
        let b = traj(&[5]);
        assert_eq!(decorrelated_rows(vec![(&a, false), (&b, true)], FrameMatch::Exact), vec![0, 1]);
    }
}
