//! Frame identity and the time-reversal relation
//!
//! A frame is an opaque handle onto one stored simulation snapshot. Frames are
//! issued in pairs: index `2k` is configuration `k` in its canonical
//! orientation and index `2k + 1` is the same configuration with reversed
//! momenta. Reversal is therefore a structural involution on the handle and
//! never requires loading or copying frame data.
//!
//! Copyright (c) 2025 Mohammad Atashi <mohammadaliatashi@icloud.com>

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Largest configuration that fits the paired index layout
pub const MAX_CONFIGURATION: u64 = u64::MAX >> 1;

/// Frame issuing errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FrameError {
    #[error("Configuration {0} exceeds the paired index range")]
    ConfigurationOutOfRange(u64),

    #[error("Frame allocator exhausted: {requested} configurations requested at {next}")]
    Exhausted { next: u64, requested: u64 },
}

/// Identity handle of a stored simulation frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Frame(u64);

impl Frame {
    /// Frame from its raw paired storage index
    #[inline]
    pub const fn from_index(index: u64) -> Self {
        Self(index)
    }

    /// Canonical (forward) frame of configuration `configuration`.
    ///
    /// `configuration` must not exceed [`MAX_CONFIGURATION`]; use
    /// [`Frame::try_canonical`] for unchecked input.
    #[inline]
    pub const fn canonical(configuration: u64) -> Self {
        debug_assert!(configuration <= MAX_CONFIGURATION);
        Self(configuration << 1)
    }

    pub const fn try_canonical(configuration: u64) -> Result<Self, FrameError> {
        if configuration > MAX_CONFIGURATION {
            return Err(FrameError::ConfigurationOutOfRange(configuration));
        }
        Ok(Self(configuration << 1))
    }

    /// Raw paired storage index
    #[inline]
    pub const fn index(self) -> u64 {
        self.0
    }

    /// Configuration shared by this frame and its reversed counterpart
    #[inline]
    pub const fn configuration(self) -> u64 {
        self.0 >> 1
    }

    /// Whether this handle is the momentum-reversed member of its pair
    #[inline]
    pub const fn is_reversed(self) -> bool {
        self.0 & 1 == 1
    }

    /// The reversed counterpart of this frame
    #[inline]
    pub const fn reversed(self) -> Self {
        Self(self.0 ^ 1)
    }
}

impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_reversed() {
            write!(f, "{}'", self.configuration())
        } else {
            write!(f, "{}", self.configuration())
        }
    }
}

/// Equality policy used when comparing frames
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FrameMatch {
    /// Reference identity only
    Exact,

    /// A frame also matches its reversed counterpart
    TimeSymmetric,
}

impl FrameMatch {
    /// Policy for a `time_symmetric` flag
    #[inline]
    pub fn from_symmetric(time_symmetric: bool) -> Self {
        if time_symmetric {
            FrameMatch::TimeSymmetric
        } else {
            FrameMatch::Exact
        }
    }

    /// Whether `a` and `b` are considered the same frame under this policy
    #[inline]
    pub fn matches(self, a: Frame, b: Frame) -> bool {
        self.key(a) == self.key(b)
    }

    /// Hash key of a frame under this policy.
    ///
    /// Two frames match exactly when their keys are equal, so set and map
    /// lookups can be keyed on this value directly.
    #[inline]
    pub fn key(self, frame: Frame) -> u64 {
        match self {
            FrameMatch::Exact => frame.index(),
            FrameMatch::TimeSymmetric => frame.configuration(),
        }
    }
}

impl Default for FrameMatch {
    fn default() -> Self {
        FrameMatch::TimeSymmetric
    }
}

/// Issues fresh canonical frames
#[derive(Debug, Default)]
pub struct FrameAllocator {
    next_configuration: AtomicU64,
}

impl FrameAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocator whose first frame is configuration `first`
    pub fn starting_at(first: u64) -> Self {
        Self {
            next_configuration: AtomicU64::new(first),
        }
    }

    /// Allocate one new canonical frame
    pub fn allocate(&self) -> Result<Frame, FrameError> {
        self.reserve(1).map(Frame::canonical)
    }

    /// Allocate `count` consecutive canonical frames
    pub fn allocate_many(&self, count: usize) -> Result<Vec<Frame>, FrameError> {
        let first = self.reserve(count as u64)?;
        Ok((first..first + count as u64).map(Frame::canonical).collect())
    }

    /// Claim `count` configurations, returning the first; nothing is claimed
    /// when the range would leave the paired index space
    fn reserve(&self, count: u64) -> Result<u64, FrameError> {
        self.next_configuration
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |next| {
                next.checked_add(count)
                    .filter(|&end| end <= MAX_CONFIGURATION + 1)
            })
            .map_err(|next| FrameError::Exhausted {
                next,
                requested: count,
            })
    }

    /// Number of configurations issued so far
    pub fn issued(&self) -> u64 {
        self.next_configuration.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reversal_is_involution() {
        let frame = Frame::canonical(7);
        assert!(!frame.is_reversed());
        assert!(frame.reversed().is_reversed());
        assert_ne!(frame, frame.reversed());
        assert_eq!(frame.reversed().reversed(), frame);
        assert_eq!(frame.configuration(), frame.reversed().configuration());
    }

    #[test]
    fn test_match_policies() {
        let frame = Frame::canonical(3);
        let other = Frame::canonical(4);

        assert!(FrameMatch::Exact.matches(frame, frame));
        assert!(!FrameMatch::Exact.matches(frame, frame.reversed()));
        assert!(FrameMatch::TimeSymmetric.matches(frame, frame.reversed()));
        assert!(!FrameMatch::TimeSymmetric.matches(frame, other));
        assert!(!FrameMatch::TimeSymmetric.matches(frame, other.reversed()));
    }

    #[test]
    fn test_allocator_issues_distinct_configurations() {
        let allocator = FrameAllocator::starting_at(10);
        let a = allocator.allocate().unwrap();
        let batch = allocator.allocate_many(3).unwrap();

        assert_eq!(a.configuration(), 10);
        assert_eq!(
            batch.iter().map(|f| f.configuration()).collect::<Vec<_>>(),
            vec![11, 12, 13]
        );
        assert_eq!(allocator.issued(), 14);
        assert!(batch.iter().all(|f| !f.is_reversed()));
    }

    #[test]
    fn test_configurations_past_the_index_range_are_rejected() {
        assert_eq!(
            Frame::try_canonical(MAX_CONFIGURATION).map(Frame::configuration),
            Ok(MAX_CONFIGURATION)
        );
        assert_eq!(
            Frame::try_canonical(MAX_CONFIGURATION + 1),
            Err(FrameError::ConfigurationOutOfRange(MAX_CONFIGURATION + 1))
        );
        assert!(Frame::try_canonical(u64::MAX).is_err());
    }

    #[test]
    fn test_exhausted_allocator_claims_nothing() {
        let allocator = FrameAllocator::starting_at(MAX_CONFIGURATION - 1);
        assert_eq!(
            allocator.allocate_many(3),
            Err(FrameError::Exhausted {
                next: MAX_CONFIGURATION - 1,
                requested: 3
            })
        );
        assert_eq!(allocator.issued(), MAX_CONFIGURATION - 1);

        let last = allocator.allocate_many(2).unwrap();
        assert_eq!(last[1].configuration(), MAX_CONFIGURATION);
        assert!(matches!(allocator.allocate(), Err(FrameError::Exhausted { .. })));

        let wrapping = FrameAllocator::starting_at(u64::MAX);
        assert!(wrapping.allocate().is_err());
        assert_eq!(wrapping.issued(), u64::MAX);
    }

    #[test]
    fn test_display_marks_reversed() {
        assert_eq!(Frame::canonical(5).to_string(), "5");
        assert_eq!(Frame::canonical(5).reversed().to_string(), "5'");
    }
}
