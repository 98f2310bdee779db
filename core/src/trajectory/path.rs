//! Immutable trajectories with reversal-aware overlap queries
//!
//! A trajectory is an ordered, immutable sequence of frame handles. Frames are
//! shared between trajectories (a shooting move reuses the frames of the old
//! path up to the shooting point), so all overlap queries work on identities
//! under a [`FrameMatch`] policy and never inspect frame payloads.
//!
//! Copyright (c) 2025 Mohammad Atashi <mohammadaliatashi@icloud.com>

use std::collections::{HashMap, HashSet};
use std::ops::Index;
use std::sync::Arc;

use thiserror::Error;

use super::frame::{Frame, FrameMatch};

/// Trajectory access errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TrajectoryError {
    #[error("Trajectory is empty")]
    EmptyTrajectory,

    #[error("Frame index {index} out of range for trajectory of length {len}")]
    IndexOutOfRange { index: usize, len: usize },
}

/// Ordered immutable sequence of frames
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Trajectory {
    frames: Arc<[Frame]>,
}

impl Trajectory {
    pub fn new(frames: Vec<Frame>) -> Self {
        Self {
            frames: frames.into(),
        }
    }

    pub fn empty() -> Self {
        Self::new(Vec::new())
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    #[inline]
    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    pub fn iter(&self) -> impl DoubleEndedIterator<Item = Frame> + ExactSizeIterator + '_ {
        self.frames.iter().copied()
    }

    #[inline]
    pub fn get(&self, index: usize) -> Option<Frame> {
        self.frames.get(index).copied()
    }

    /// Frame at `index`, treating an out-of-range index as a caller bug
    pub fn frame_at(&self, index: usize) -> Result<Frame, TrajectoryError> {
        if self.frames.is_empty() {
            return Err(TrajectoryError::EmptyTrajectory);
        }
        self.get(index).ok_or(TrajectoryError::IndexOutOfRange {
            index,
            len: self.len(),
        })
    }

    #[inline]
    pub fn first(&self) -> Option<Frame> {
        self.frames.first().copied()
    }

    #[inline]
    pub fn last(&self) -> Option<Frame> {
        self.frames.last().copied()
    }

    /// Same frames read back-to-front; frame identities are untouched
    pub fn back_to_front(&self) -> Self {
        self.iter().rev().collect()
    }

    /// Time-reversed trajectory: order reversed and every frame replaced by
    /// its reversed counterpart
    pub fn reversed(&self) -> Self {
        self.iter().rev().map(Frame::reversed).collect()
    }

    /// Position of the first frame matching `frame` under `policy`
    pub fn index_of(&self, frame: Frame, policy: FrameMatch) -> Option<usize> {
        let key = policy.key(frame);
        self.frames.iter().position(|&f| policy.key(f) == key)
    }

    pub fn contains(&self, frame: Frame, policy: FrameMatch) -> bool {
        self.index_of(frame, policy).is_some()
    }

    /// Number of frames of `self` that also occur in `other`
    pub fn shared_frame_count(&self, other: &Trajectory, policy: FrameMatch) -> usize {
        let keys = other.key_set(policy);
        self.iter().filter(|&f| keys.contains(&policy.key(f))).count()
    }

    /// Whether the two trajectories share at least one frame
    pub fn is_correlated(&self, other: &Trajectory, policy: FrameMatch) -> bool {
        let keys = other.key_set(policy);
        self.iter().any(|f| keys.contains(&policy.key(f)))
    }

    /// Longest block of frames shared with `other`.
    ///
    /// A block is a run of consecutive frames of `other` whose positions in
    /// `self` are consecutive too, either all ascending or all descending.
    /// `other` is scanned from its first frame; the longest block wins and the
    /// first one found wins a tie. The result holds the block as it appears
    /// in `self`, so a block that runs backwards inside `other` is detectable
    /// by comparing positions afterwards.
    pub fn shared_subtrajectory(&self, other: &Trajectory, policy: FrameMatch) -> Trajectory {
        let mut positions: HashMap<u64, usize> = HashMap::with_capacity(self.len());
        for (index, frame) in self.iter().enumerate() {
            positions.entry(policy.key(frame)).or_insert(index);
        }

        // (lowest position in self, length) of the best block
        let mut best: Option<(usize, usize)> = None;
        // (first position in self, last position in self, step) of the open block
        let mut run: Option<(usize, usize, isize)> = None;

        for frame in other.iter() {
            let Some(&position) = positions.get(&policy.key(frame)) else {
                run = None;
                continue;
            };

            run = Some(match run {
                Some((first, last, step)) if step != 0 && position as isize == last as isize + step => {
                    (first, position, step)
                }
                Some((first, last, 0)) if position.abs_diff(last) == 1 => {
                    (first, position, position as isize - last as isize)
                }
                Some((_, last, _)) => match position as isize - last as isize {
                    // direction changed: the previous frame opens the new block
                    step @ (-1 | 1) => (last, position, step),
                    _ => (position, position, 0),
                },
                None => (position, position, 0),
            });

            if let Some((first, last, _)) = run {
                let len = first.abs_diff(last) + 1;
                if best.map_or(true, |(_, best_len)| len > best_len) {
                    best = Some((first.min(last), len));
                }
            }
        }

        match best {
            Some((start, len)) => Self::new(self.frames[start..start + len].to_vec()),
            None => Trajectory::empty(),
        }
    }

    fn key_set(&self, policy: FrameMatch) -> HashSet<u64> {
        self.iter().map(|f| policy.key(f)).collect()
    }
}

impl Default for Trajectory {
    fn default() -> Self {
        Self::empty()
    }
}

impl Index<usize> for Trajectory {
    type Output = Frame;

    fn index(&self, index: usize) -> &Frame {
        &self.frames[index]
    }
}

impl From<Vec<Frame>> for Trajectory {
    fn from(frames: Vec<Frame>) -> Self {
        Self::new(frames)
    }
}

impl FromIterator<Frame> for Trajectory {
    fn from_iter<I: IntoIterator<Item = Frame>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

/// Longest shared block of `a` and `b`, see [`Trajectory::shared_subtrajectory`]
pub fn shared_subtrajectory(a: &Trajectory, b: &Trajectory, policy: FrameMatch) -> Trajectory {
    a.shared_subtrajectory(b, policy)
}
