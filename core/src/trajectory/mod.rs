//! Frames and trajectories
//! Copyright (c) 2025 Mohammad Atashi <mohammadaliatashi@icloud.com>

pub mod frame;
pub mod path;

pub use self::frame::{Frame, FrameAllocator, FrameError, FrameMatch, MAX_CONFIGURATION};
pub use self::path::{shared_subtrajectory, Trajectory, TrajectoryError};
