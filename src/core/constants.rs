//! Engine-wide tuning constants for clustering and cluster expansion.
//! Keeping them in a single place makes it easier to tweak the magic numbers.

/// Base pixel distance under which two markers count as "nearby".
pub const BASE_THRESHOLD: f64 = 25.0;

/// Multiplier applied to the zoom factor before capping the threshold.
pub const ZOOM_THRESHOLD_MULTIPLIER: f64 = 40.0;

/// The threshold never exceeds `BASE_THRESHOLD * MAX_THRESHOLD_FACTOR`.
pub const MAX_THRESHOLD_FACTOR: f64 = 1.5;

/// Nearby points (excluding the anchor) required before a group is merged.
pub const MIN_NEARBY_FOR_CLUSTER: usize = 2;

/// Padding applied to a cluster's bounding box when fitting the viewport to it.
pub const FIT_PADDING: f64 = 1.2;

/// Smallest span (degrees) a fit region may have on either axis.
pub const MIN_FIT_DELTA: f64 = 0.005;

/// Span growth ratio past which an expanded cluster collapses again.
pub const COLLAPSE_RATIO: f64 = 1.5;

/// Advisory duration of the fit animation requested from the host.
pub const EXPAND_ANIMATION_MS: u64 = 300;

/// Point count from which `ScanStrategy::Auto` switches to the bucket grid.
pub const GRID_MIN_POINTS: usize = 64;

/// Prefix of every cluster identifier.
pub const CLUSTER_ID_PREFIX: &str = "cluster-";
