//! # pincluster
//!
//! Marker clustering and cluster expansion for interactive maps.
//!
//! Given a set of geographic points and the current viewport, the engine
//! groups nearby markers into clusters measured in screen pixels, expands a
//! pressed cluster by proposing a viewport that separates its members, and
//! collapses that expansion again once the user zooms back out. Drawing,
//! gestures and data fetching stay with the host, which plugs in through the
//! traits in [`interaction::presenter`].

pub mod core;
pub mod data;
pub mod engine;
pub mod interaction;
pub mod prelude;
pub mod spatial;
pub use crate::core::constants;

// Re-export public API
pub use crate::core::{
    config::{ClusterIdStrategy, ClusteringConfig, EngineConfig, ExpansionConfig, ScanStrategy},
    geo::{LatLng, LatLngBounds},
    viewport::ViewportRegion,
};

pub use data::point::{MapPoint, PointKey};

pub use engine::MarkerEngine;

pub use interaction::{
    expansion::{ExpansionController, ExpansionState, RenderMode},
    presenter::{MarkerEvents, MarkerPresenter, ViewportHost},
};

pub use spatial::{
    clustering::{Cluster, ClusterBuilder},
    scale::PixelScale,
};

/// Result type used throughout the library
pub type Result<T> = std::result::Result<T, MarkerError>;

/// Common error types
#[derive(Debug, thiserror::Error)]
pub enum MarkerError {
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid viewport: {0}")]
    InvalidViewport(String),

    #[error("Invalid surface width: {0}")]
    InvalidSurface(f64),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Unknown cluster: {0}")]
    UnknownCluster(String),

    #[error("Unknown point: {0}")]
    UnknownPoint(String),
}

/// Error type alias for convenience
pub type Error = MarkerError;
