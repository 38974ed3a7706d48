//! Prelude module for common pincluster types and traits
//!
//! This module re-exports the most commonly used types, traits, and functions
//! for easy importing with `use pincluster::prelude::*;`

pub use crate::core::{
    config::{
        ClusterIdStrategy, ClusteringConfig, ClusteringProfile, EngineConfig, ExpansionConfig,
        RecomputeConfig, ScanStrategy,
    },
    geo::{LatLng, LatLngBounds},
    viewport::ViewportRegion,
};

pub use crate::data::point::{points_from_json, MapPoint, PointKey, PressHandler};

pub use crate::spatial::{
    clustering::{BuildStats, Cluster, ClusterBuilder},
    scale::PixelScale,
};

pub use crate::interaction::{
    expansion::{ExpansionController, ExpansionState, RenderMode, ViewportRequest},
    presenter::{present_clusters, MarkerEvents, MarkerPresenter, NoopEvents, ViewportHost},
};

pub use crate::engine::MarkerEngine;

pub use crate::{Error as MarkerError, Result};

pub use std::{sync::Arc, time::Duration};

pub use fxhash::{FxHashMap as HashMap, FxHashSet as HashSet, FxHasher};
