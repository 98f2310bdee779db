//! Sparse snapshot matrix
//!
//! Maps `(row, aligned column)` to the frame occupying that cell. Rows are
//! trials in lineage-table order and columns are aligned frame positions, so
//! a frame carried over from an ancestor appears in the same column in both
//! rows. Besides point lookups the matrix answers provenance queries: for an
//! occupied cell, which ancestor row first held the same frame in that
//! column.
//!
//! Copyright (c) 2025 Mohammad Atashi <mohammadaliatashi@icloud.com>

use std::collections::BTreeMap;

use log::warn;
use serde::{Deserialize, Serialize};

use crate::trajectory::{Frame, FrameMatch};

/// Aligned column coordinate; may be negative
pub type Column = i64;

/// Occupied extent of the matrix
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatrixBounds {
    pub min_column: Column,
    pub max_column: Column,
    pub min_row: usize,
    pub max_row: usize,
}

impl MatrixBounds {
    pub fn width(&self) -> usize {
        (self.max_column - self.min_column + 1) as usize
    }

    pub fn height(&self) -> usize {
        self.max_row - self.min_row + 1
    }
}

/// Maximal run of consecutive columns in one row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnRun {
    pub start: Column,
    pub len: usize,
}

impl ColumnRun {
    /// One past the last column of the run
    pub fn end(&self) -> Column {
        self.start + self.len as Column
    }
}

/// Sparse `(row, column) -> frame` index with ancestry-aware provenance
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotMatrix {
    rows: Vec<BTreeMap<Column, Frame>>,

    /// Nearest present ancestor row of every row
    ancestors: Vec<Option<usize>>,

    policy: FrameMatch,

    overwrites: usize,
}

impl SnapshotMatrix {
    pub(crate) fn new(policy: FrameMatch) -> Self {
        Self {
            rows: Vec::new(),
            ancestors: Vec::new(),
            policy,
            overwrites: 0,
        }
    }

    /// Append an empty row whose nearest present ancestor is `ancestor`
    pub(crate) fn push_row(&mut self, ancestor: Option<usize>) -> usize {
        self.rows.push(BTreeMap::new());
        self.ancestors.push(ancestor);
        self.rows.len() - 1
    }

    /// Write `frame` at `(row, column)`; the latest write wins
    pub(crate) fn write(&mut self, row: usize, column: Column, frame: Frame) {
        let Some(cells) = self.rows.get_mut(row) else {
            return;
        };
        if let Some(previous) = cells.insert(column, frame) {
            if previous != frame {
                self.overwrites += 1;
                warn!(
                    "snapshot matrix cell ({}, {}) overwritten: {} -> {}",
                    row, column, previous, frame
                );
            }
        }
    }

    #[inline]
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn occupied_cells(&self) -> usize {
        self.rows.iter().map(BTreeMap::len).sum()
    }

    /// Number of cells that were overwritten by a different frame
    #[inline]
    pub fn overwrites(&self) -> usize {
        self.overwrites
    }

    #[inline]
    pub fn policy(&self) -> FrameMatch {
        self.policy
    }

    /// Occupied cells of one row in column order
    pub fn row(&self, row: usize) -> Option<&BTreeMap<Column, Frame>> {
        self.rows.get(row)
    }

    pub fn get(&self, row: usize, column: Column) -> Option<Frame> {
        self.rows.get(row)?.get(&column).copied()
    }

    /// Ancestor row that already held the same frame at `column`.
    ///
    /// `None` when the cell is empty, the row has no present ancestor, the
    /// ancestor does not precede the row, or the ancestor holds a different
    /// frame (or nothing) at that column.
    pub fn parent(&self, row: usize, column: Column) -> Option<usize> {
        let frame = self.get(row, column)?;
        let ancestor = (*self.ancestors.get(row)?)?;
        if ancestor >= row {
            return None;
        }
        match self.get(ancestor, column) {
            Some(held) if self.policy.matches(held, frame) => Some(ancestor),
            _ => None,
        }
    }

    /// Earliest row along the ancestor chain at which the occupant of
    /// `(row, column)` first appeared in that column
    pub fn root(&self, row: usize, column: Column) -> Option<usize> {
        self.get(row, column)?;
        let mut current = row;
        // rows strictly decrease along the walk
        while let Some(ancestor) = self.parent(current, column) {
            current = ancestor;
        }
        Some(current)
    }

    /// Occupied extent, `None` for an empty matrix
    pub fn bounds(&self) -> Option<MatrixBounds> {
        let mut bounds: Option<MatrixBounds> = None;

        for (row, cells) in self.rows.iter().enumerate() {
            let (Some((&first, _)), Some((&last, _))) =
                (cells.first_key_value(), cells.last_key_value())
            else {
                continue;
            };
            bounds = Some(match bounds {
                None => MatrixBounds {
                    min_column: first,
                    max_column: last,
                    min_row: row,
                    max_row: row,
                },
                Some(b) => MatrixBounds {
                    min_column: b.min_column.min(first),
                    max_column: b.max_column.max(last),
                    min_row: b.min_row,
                    max_row: row,
                },
            });
        }

        bounds
    }

    /// Dense row-major copy covering [`SnapshotMatrix::bounds`]
    pub fn to_dense(&self) -> Vec<Vec<Option<Frame>>> {
        let Some(bounds) = self.bounds() else {
            return Vec::new();
        };

        (bounds.min_row..=bounds.max_row)
            .map(|row| {
                (bounds.min_column..=bounds.max_column)
                    .map(|column| self.get(row, column))
                    .collect()
            })
            .collect()
    }

    /// Maximal runs of consecutive occupied columns in `row` whose frame
    /// satisfies `predicate`
    pub fn occupancy_runs<P>(&self, row: usize, mut predicate: P) -> Vec<ColumnRun>
    where
        P: FnMut(Frame) -> bool,
    {
        let mut runs = Vec::new();
        let Some(cells) = self.rows.get(row) else {
            return runs;
        };

        let mut current: Option<ColumnRun> = None;
        for (&column, &frame) in cells {
            if !predicate(frame) {
                runs.extend(current.take());
                continue;
            }
            current = match current {
                Some(run) if run.end() == column => Some(ColumnRun {
                    start: run.start,
                    len: run.len + 1,
                }),
                Some(run) => {
                    runs.push(run);
                    Some(ColumnRun { start: column, len: 1 })
                }
                None => Some(ColumnRun { start: column, len: 1 }),
            };
        }
        runs.extend(current);

        runs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(c: u64) -> Frame {
        Frame::canonical(c)
    }

    /// Row 0: frames 0..4 at columns 0..4
    /// Row 1 (ancestor 0): frames 1,2,3,9 at columns 1..5
    /// Row 2 (ancestor 1): frames 2,3 reversed, 7 at columns 2..5
    fn sample(policy: FrameMatch) -> SnapshotMatrix {
        let mut matrix = SnapshotMatrix::new(policy);
        let r0 = matrix.push_row(None);
        for c in 0..4 {
            matrix.write(r0, c as Column, frame(c));
        }
        let r1 = matrix.push_row(Some(0));
        for (offset, c) in [1, 2, 3, 9].into_iter().enumerate() {
            matrix.write(r1, 1 + offset as Column, frame(c));
        }
        let r2 = matrix.push_row(Some(1));
        matrix.write(r2, 2, frame(2).reversed());
        matrix.write(r2, 3, frame(3));
        matrix.write(r2, 4, frame(7));
        matrix
    }

    #[test]
    fn test_point_lookup() {
        let matrix = sample(FrameMatch::Exact);
        assert_eq!(matrix.get(1, 4), Some(frame(9)));
        assert_eq!(matrix.get(1, 0), None);
        assert_eq!(matrix.get(9, 0), None);
        assert_eq!(matrix.row_count(), 3);
        assert_eq!(matrix.occupied_cells(), 11);
    }

    #[test]
    fn test_parent_and_root() {
        let matrix = sample(FrameMatch::Exact);

        assert_eq!(matrix.parent(2, 3), Some(1));
        assert_eq!(matrix.root(2, 3), Some(0));
        assert_eq!(matrix.root(1, 4), Some(1));
        assert_eq!(matrix.parent(1, 4), None);
        assert_eq!(matrix.root(0, 0), Some(0));

        // reversed frame only matches under the symmetric policy
        assert_eq!(matrix.root(2, 2), Some(2));
        let symmetric = sample(FrameMatch::TimeSymmetric);
        assert_eq!(symmetric.root(2, 2), Some(0));
    }

    #[test]
    fn test_absent_cells_are_not_errors() {
        let matrix = sample(FrameMatch::TimeSymmetric);
        assert_eq!(matrix.parent(2, 40), None);
        assert_eq!(matrix.root(2, -3), None);
        assert_eq!(matrix.root(17, 0), None);
    }

    #[test]
    fn test_root_guards_inconsistent_order() {
        let mut matrix = SnapshotMatrix::new(FrameMatch::Exact);
        let r0 = matrix.push_row(Some(1));
        matrix.write(r0, 0, frame(1));
        let r1 = matrix.push_row(None);
        matrix.write(r1, 0, frame(1));

        assert_eq!(matrix.parent(0, 0), None);
        assert_eq!(matrix.root(0, 0), Some(0));
    }

    #[test]
    fn test_overwrite_is_counted() {
        let mut matrix = SnapshotMatrix::new(FrameMatch::Exact);
        let row = matrix.push_row(None);
        matrix.write(row, 0, frame(1));
        matrix.write(row, 0, frame(1));
        assert_eq!(matrix.overwrites(), 0);
        matrix.write(row, 0, frame(2));
        assert_eq!(matrix.overwrites(), 1);
        assert_eq!(matrix.get(row, 0), Some(frame(2)));
    }

    #[test]
    fn test_bounds_and_dense_export() {
        let matrix = sample(FrameMatch::Exact);
        let bounds = matrix.bounds().unwrap();
        assert_eq!(
            bounds,
            MatrixBounds { min_column: 0, max_column: 4, min_row: 0, max_row: 2 }
        );
        assert_eq!(bounds.width(), 5);
        assert_eq!(bounds.height(), 3);

        let dense = matrix.to_dense();
        assert_eq!(dense.len(), 3);
        assert_eq!(dense[0], vec![Some(frame(0)), Some(frame(1)), Some(frame(2)), Some(frame(3)), None]);
        assert_eq!(dense[2][0], None);
        assert_eq!(dense[2][4], Some(frame(7)));

        let empty = SnapshotMatrix::new(FrameMatch::Exact);
        assert!(empty.bounds().is_none());
        assert!(empty.to_dense().is_empty());
    }

    #[test]
    fn test_negative_columns() {
        let mut matrix = SnapshotMatrix::new(FrameMatch::Exact);
        let row = matrix.push_row(None);
        matrix.write(row, -2, frame(1));
        matrix.write(row, 1, frame(2));

        let bounds = matrix.bounds().unwrap();
        assert_eq!(bounds.min_column, -2);
        assert_eq!(matrix.to_dense()[0], vec![Some(frame(1)), None, None, Some(frame(2))]);
    }

    #[test]
    fn test_occupancy_runs() {
        let mut matrix = SnapshotMatrix::new(FrameMatch::Exact);
        let row = matrix.push_row(None);
        for (column, c) in [(0, 2), (1, 4), (2, 5), (3, 6), (4, 8), (6, 10)] {
            matrix.write(row, column, frame(c));
        }

        let even = matrix.occupancy_runs(row, |f| f.configuration() % 2 == 0);
        assert_eq!(
            even,
            vec![
                ColumnRun { start: 0, len: 2 },
                ColumnRun { start: 3, len: 2 },
                ColumnRun { start: 6, len: 1 },
            ]
        );
        assert_eq!(even[1].end(), 5);
        assert!(matrix.occupancy_runs(row, |_| false).is_empty());
        assert!(matrix.occupancy_runs(5, |_| true).is_empty());
    }
}
