//! Analysis configuration
//!
//! Copyright (c) 2025 Mohammad Atashi <mohammadaliatashi@icloud.com>

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::trajectory::FrameMatch;

/// Default cap on parent chain walks
pub const DEFAULT_MAX_ANCESTRY_DEPTH: usize = 65_536;

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Ancestry depth limit must be positive, got {0}")]
    InvalidAncestryLimit(usize),

    #[error("Failed to parse configuration: {0}")]
    Parse(#[from] serde_json::Error),
}

/// How a shared block that runs backwards inside the child is aligned
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrientationPolicy {
    /// Keep the child in storage order and flag `overlap_reversed`
    MarkReversed,

    /// Lay the child out back-to-front and flip its `time_direction`
    FlipTimeDirection,
}

impl Default for OrientationPolicy {
    fn default() -> Self {
        OrientationPolicy::MarkReversed
    }
}

/// Lineage analysis configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Treat a frame and its reversed counterpart as the same frame
    pub time_symmetric: bool,

    /// Strategy for reversed overlaps
    pub orientation: OrientationPolicy,

    /// Maximum number of parent links followed before the ancestry is
    /// declared cyclic
    pub max_ancestry_depth: usize,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            time_symmetric: true,
            orientation: OrientationPolicy::MarkReversed,
            max_ancestry_depth: DEFAULT_MAX_ANCESTRY_DEPTH,
        }
    }
}

impl AnalysisConfig {
    /// Parse a JSON configuration document; absent fields keep their defaults
    pub fn from_json(source: &str) -> Result<Self, ConfigError> {
        let config: AnalysisConfig = serde_json::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_ancestry_depth == 0 {
            return Err(ConfigError::InvalidAncestryLimit(self.max_ancestry_depth));
        }
        Ok(())
    }

    /// Frame equality policy implied by `time_symmetric`
    #[inline]
    pub fn frame_match(&self) -> FrameMatch {
        FrameMatch::from_symmetric(self.time_symmetric)
    }

    pub fn with_time_symmetric(mut self, time_symmetric: bool) -> Self {
        self.time_symmetric = time_symmetric;
        self
    }

    pub fn with_orientation(mut self, orientation: OrientationPolicy) -> Self {
        self.orientation = orientation;
        self
    }

    pub fn with_max_ancestry_depth(mut self, max_ancestry_depth: usize) -> Self {
        self.max_ancestry_depth = max_ancestry_depth;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AnalysisConfig::default();
        assert!(config.time_symmetric);
        assert_eq!(config.orientation, OrientationPolicy::MarkReversed);
        assert_eq!(config.frame_match(), FrameMatch::TimeSymmetric);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = AnalysisConfig::from_json(r#"{ "orientation": "FlipTimeDirection" }"#).unwrap();
        assert_eq!(config.orientation, OrientationPolicy::FlipTimeDirection);
        assert!(config.time_symmetric);
        assert_eq!(config.max_ancestry_depth, DEFAULT_MAX_ANCESTRY_DEPTH);
    }

    #[test]
    fn test_invalid_configs_rejected() {
        assert!(matches!(
            AnalysisConfig::from_json(r#"{ "max_ancestry_depth": 0 }"#),
            Err(ConfigError::InvalidAncestryLimit(0))
        ));
        assert!(matches!(
            AnalysisConfig::from_json("not json"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_builder_methods() {
        let config = AnalysisConfig::default()
            .with_time_symmetric(false)
            .with_max_ancestry_depth(8);
        assert_eq!(config.frame_match(), FrameMatch::Exact);
        assert_eq!(config.max_ancestry_depth, 8);
    }
}
