//! Nesting pass
//!
//! A trial whose nearest present ancestor is not the row directly above it
//! branches off an earlier line; every row in between belongs to a side line
//! that the later trial superseded. Those rows are pushed one level deeper.
//! Rows that end at nesting level zero form the mainline.
//!
//! Copyright (c) 2025 Mohammad Atashi <mohammadaliatashi@icloud.com>

/// Nesting level of every row, given each row's nearest present ancestor row
///
/// The result is an overlay over the alignment rows; row order matches
/// `parent_rows`.
pub fn nesting_levels(parent_rows: &[Option<usize>]) -> Vec<usize> {
    let rows = parent_rows.len();
    // difference array over rows: +1 at the first skipped row, -1 after the last
    let mut delta = vec![0isize; rows + 1];

    for (row, parent_row) in parent_rows.iter().enumerate().rev() {
        match *parent_row {
            Some(parent) if parent + 1 < row => {
                delta[parent + 1] += 1;
                delta[row] -= 1;
            }
            _ => {}
        }
    }

    let mut level = 0isize;
    delta[..rows]
        .iter()
        .map(|step| {
            level += step;
            level as usize
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_straight_chain_is_mainline() {
        let levels = nesting_levels(&[None, Some(0), Some(1), Some(2)]);
        assert_eq!(levels, vec![0, 0, 0, 0]);
    }

    #[test]
    fn test_skipped_row_is_nested() {
        // A, B, C with C.parent == A
        let levels = nesting_levels(&[None, Some(0), Some(0)]);
        assert_eq!(levels, vec![0, 1, 0]);
    }

    #[test]
    fn test_nested_side_lines_accumulate() {
        // rows 3 and 4 both return to row 0, so rows 1 and 2 are skipped twice
        let levels = nesting_levels(&[None, Some(0), Some(1), Some(0), Some(0)]);
        assert_eq!(levels, vec![0, 2, 2, 1, 0]);

        let levels = nesting_levels(&[None, Some(0), Some(1), Some(1), Some(0)]);
        assert_eq!(levels, vec![0, 1, 2, 1, 0]);
    }

    #[test]
    fn test_superseded_chain_nests_direct_successor() {
        // row 2 follows its own ancestor row 1, but row 3 returns to row 0
        // and supersedes the whole 1 -> 2 side line
        let levels = nesting_levels(&[None, Some(0), Some(1), Some(0)]);
        assert_eq!(levels, vec![0, 1, 1, 0]);
    }

    #[test]
    fn test_missing_or_later_ancestors_do_not_nest() {
        assert_eq!(nesting_levels(&[Some(2), None, Some(1)]), vec![0, 0, 0]);
        assert!(nesting_levels(&[]).is_empty());
    }

    proptest! {
        #[test]
        fn test_direct_predecessor_keeps_level_zero_floor(
            parents in prop::collection::vec(prop::option::of(0usize..30), 1..30)
        ) {
            let parent_rows: Vec<Option<usize>> = parents
                .into_iter()
                .enumerate()
                .map(|(row, p)| p.filter(|&p| p < row))
                .collect();
            let levels = nesting_levels(&parent_rows);

            prop_assert_eq!(levels.len(), parent_rows.len());
            prop_assert_eq!(levels[0], 0);
            for (row, parent) in parent_rows.iter().enumerate() {
                if let Some(parent) = parent {
                    // no later row branches off at or above this one
                    let untouched = parent_rows[row + 1..].iter().flatten().all(|&p| p >= row);
                    if *parent + 1 == row && untouched {
                        prop_assert_eq!(levels[row], 0);
                    }
                }
            }
        }
    }
}
