//! Configuration for clustering, expansion and recompute behavior
//!
//! Settings are grouped per concern and can be picked from presets through
//! [`ClusteringProfile`], built by hand, or loaded from JSON.

use crate::core::constants::{
    BASE_THRESHOLD, COLLAPSE_RATIO, EXPAND_ANIMATION_MS, FIT_PADDING, GRID_MIN_POINTS,
    MAX_THRESHOLD_FACTOR, MIN_FIT_DELTA, MIN_NEARBY_FOR_CLUSTER, ZOOM_THRESHOLD_MULTIPLIER,
};
use crate::{MarkerError, Result};
use serde::{Deserialize, Serialize};

/// How cluster identifiers are assigned during a build
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClusterIdStrategy {
    /// `cluster-0`, `cluster-1`, ... in emission order; not stable across rebuilds
    Sequential,
    /// Hash of the sorted member keys; stable while membership is unchanged
    MemberHash,
}

impl Default for ClusterIdStrategy {
    fn default() -> Self {
        Self::Sequential
    }
}

/// How candidate neighbors are found for each anchor point
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScanStrategy {
    /// Compare the anchor against every remaining point
    Linear,
    /// Bucket points into a pixel-space grid and only compare neighboring cells
    Grid,
    /// Linear below `grid_min_points` valid points, grid at or above it
    Auto { grid_min_points: usize },
}

impl ScanStrategy {
    /// Whether the grid should be used for `point_count` valid points
    pub fn uses_grid(&self, point_count: usize) -> bool {
        match self {
            Self::Linear => false,
            Self::Grid => true,
            Self::Auto { grid_min_points } => point_count >= *grid_min_points,
        }
    }
}

impl Default for ScanStrategy {
    fn default() -> Self {
        Self::Auto {
            grid_min_points: GRID_MIN_POINTS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClusteringConfig {
    /// Base pixel distance for the nearby test
    pub base_threshold: f64,
    /// Multiplier applied to the zoom factor
    pub zoom_multiplier: f64,
    /// Cap on the zoom-adaptive factor
    pub max_threshold_factor: f64,
    /// Nearby points needed (besides the anchor) to merge a group
    pub min_nearby: usize,
    pub id_strategy: ClusterIdStrategy,
    pub scan_strategy: ScanStrategy,
}

impl Default for ClusteringConfig {
    fn default() -> Self {
        Self {
            base_threshold: BASE_THRESHOLD,
            zoom_multiplier: ZOOM_THRESHOLD_MULTIPLIER,
            max_threshold_factor: MAX_THRESHOLD_FACTOR,
            min_nearby: MIN_NEARBY_FOR_CLUSTER,
            id_strategy: ClusterIdStrategy::default(),
            scan_strategy: ScanStrategy::default(),
        }
    }
}

impl ClusteringConfig {
    pub fn validate(&self) -> Result<()> {
        if !(self.base_threshold.is_finite() && self.base_threshold > 0.0) {
            return Err(MarkerError::InvalidConfig(format!(
                "base_threshold must be positive, got {}",
                self.base_threshold
            )));
        }
        if !(self.zoom_multiplier.is_finite() && self.zoom_multiplier > 0.0) {
            return Err(MarkerError::InvalidConfig(format!(
                "zoom_multiplier must be positive, got {}",
                self.zoom_multiplier
            )));
        }
        if !(self.max_threshold_factor.is_finite() && self.max_threshold_factor > 0.0) {
            return Err(MarkerError::InvalidConfig(format!(
                "max_threshold_factor must be positive, got {}",
                self.max_threshold_factor
            )));
        }
        if self.min_nearby == 0 {
            return Err(MarkerError::InvalidConfig(
                "min_nearby must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExpansionConfig {
    /// Multiplier applied to the member bounding box
    pub fit_padding: f64,
    /// Smallest span on either axis of a fit region
    pub min_fit_delta: f64,
    /// Span growth ratio that collapses an expansion
    pub collapse_ratio: f64,
    pub animation_duration_ms: u64,
}

impl Default for ExpansionConfig {
    fn default() -> Self {
        Self {
            fit_padding: FIT_PADDING,
            min_fit_delta: MIN_FIT_DELTA,
            collapse_ratio: COLLAPSE_RATIO,
            animation_duration_ms: EXPAND_ANIMATION_MS,
        }
    }
}

impl ExpansionConfig {
    pub fn animation_duration(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.animation_duration_ms)
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.fit_padding.is_finite() && self.fit_padding >= 1.0) {
            return Err(MarkerError::InvalidConfig(format!(
                "fit_padding must be at least 1.0, got {}",
                self.fit_padding
            )));
        }
        if !(self.min_fit_delta.is_finite() && self.min_fit_delta > 0.0) {
            return Err(MarkerError::InvalidConfig(format!(
                "min_fit_delta must be positive, got {}",
                self.min_fit_delta
            )));
        }
        if !(self.collapse_ratio.is_finite() && self.collapse_ratio > 1.0) {
            return Err(MarkerError::InvalidConfig(format!(
                "collapse_ratio must be greater than 1.0, got {}",
                self.collapse_ratio
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RecomputeConfig {
    /// Minimum time between viewport-driven rebuilds; 0 rebuilds on every change
    pub min_interval_ms: u64,
}

impl RecomputeConfig {
    pub fn should_update(&self, last_update_time: instant::Instant) -> bool {
        let elapsed = last_update_time.elapsed();
        elapsed.as_millis() >= self.min_interval_ms as u128
    }
}

/// Complete engine configuration
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub clustering: ClusteringConfig,
    pub expansion: ExpansionConfig,
    pub recompute: RecomputeConfig,
}

impl EngineConfig {
    /// Parses and validates a JSON document; missing fields take their defaults
    pub fn from_json(json: &str) -> Result<Self> {
        let config: EngineConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.clustering.validate()?;
        self.expansion.validate()
    }

    pub fn with_profile(mut self, profile: ClusteringProfile) -> Self {
        self.clustering = profile.resolve();
        self
    }
}

/// Clustering presets
#[derive(Debug, Clone, PartialEq)]
pub enum ClusteringProfile {
    Standard,
    /// Tighter grouping for crowded point sets
    Dense,
    /// Fewer, looser merges for sparse point sets
    Sparse,
    Custom(ClusteringConfig),
}

impl ClusteringProfile {
    pub fn resolve(&self) -> ClusteringConfig {
        match self {
            Self::Standard => ClusteringConfig::default(),
            Self::Dense => ClusteringConfig {
                base_threshold: 40.0,
                scan_strategy: ScanStrategy::Grid,
                ..ClusteringConfig::default()
            },
            Self::Sparse => ClusteringConfig {
                base_threshold: 15.0,
                min_nearby: 3,
                scan_strategy: ScanStrategy::Linear,
                ..ClusteringConfig::default()
            },
            Self::Custom(config) => config.clone(),
        }
    }
}

impl Default for ClusteringProfile {
    fn default() -> Self {
        Self::Standard
    }
}
