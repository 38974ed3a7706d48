//! Cluster expansion state machine
//!
//! At most one cluster is expanded at a time. Pressing a multi-point cluster
//! expands it and proposes a viewport that fits its members; zooming out far
//! enough afterwards collapses it again.
//!
//! Zooming out is measured against a reference region: the viewport at press
//! time, narrowed to any smaller region seen since (the fit region, once the
//! host applies it). A pinch that arrives as many small steps still collapses.
//!
//! ```text
//! Collapsed    --press(cluster)------------------> Expanded(cluster.id)
//! Expanded(X)  --press(other)--------------------> Expanded(other.id)
//! Expanded(X)  --span grows past collapse_ratio * reference--> Collapsed
//! Expanded(X)  --rebuild without cluster X-------> Collapsed
//! ```

use crate::core::{config::ExpansionConfig, viewport::ViewportRegion};
use crate::spatial::clustering::Cluster;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExpansionState {
    Collapsed,
    Expanded { cluster_id: String },
}

impl ExpansionState {
    pub fn is_expanded(&self) -> bool {
        matches!(self, Self::Expanded { .. })
    }

    pub fn expanded_id(&self) -> Option<&str> {
        match self {
            Self::Expanded { cluster_id } => Some(cluster_id.as_str()),
            Self::Collapsed => None,
        }
    }

    /// Single-point clusters and the expanded cluster draw their members
    /// individually; everything else draws a count badge.
    pub fn render_mode(&self, cluster: &Cluster) -> RenderMode {
        if cluster.is_single() || self.expanded_id() == Some(cluster.id.as_str()) {
            RenderMode::Individual
        } else {
            RenderMode::Badge {
                count: cluster.count(),
            }
        }
    }
}

impl Default for ExpansionState {
    fn default() -> Self {
        Self::Collapsed
    }
}

/// How a cluster should be drawn
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderMode {
    Individual,
    Badge { count: usize },
}

/// Advisory viewport change for the host; it may animate, jump, or ignore it
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewportRequest {
    pub region: ViewportRegion,
    pub duration: Duration,
}

pub struct ExpansionController {
    config: ExpansionConfig,
    state: ExpansionState,
    reference: Option<ViewportRegion>,
}

impl ExpansionController {
    pub fn new(config: ExpansionConfig) -> Self {
        Self {
            config,
            state: ExpansionState::Collapsed,
            reference: None,
        }
    }

    pub fn state(&self) -> &ExpansionState {
        &self.state
    }

    /// Region zoom-out is measured against while expanded
    pub fn reference_region(&self) -> Option<&ViewportRegion> {
        self.reference.as_ref()
    }

    pub fn set_config(&mut self, config: ExpansionConfig) {
        self.config = config;
    }

    /// Region that shows every member of `cluster` with some padding
    pub fn fit_region(&self, cluster: &Cluster) -> ViewportRegion {
        ViewportRegion::fit_to_bounds(
            &cluster.bounds(),
            self.config.fit_padding,
            self.config.min_fit_delta,
        )
    }

    /// Expands a multi-point cluster and returns the viewport to move to.
    /// `current` is the viewport at press time and becomes the zoom-out reference.
    /// Single-point clusters have nothing to expand and return `None`.
    pub fn handle_cluster_press(
        &mut self,
        cluster: &Cluster,
        current: &ViewportRegion,
    ) -> Option<ViewportRequest> {
        if cluster.count() < 2 {
            return None;
        }

        let region = self.fit_region(cluster);
        log::debug!(
            "expanding {} ({} members) to span {:.5}x{:.5}",
            cluster.id,
            cluster.count(),
            region.lat_delta,
            region.lng_delta
        );
        self.state = ExpansionState::Expanded {
            cluster_id: cluster.id.clone(),
        };
        self.reference = Some(*current);

        Some(ViewportRequest {
            region,
            duration: self.config.animation_duration(),
        })
    }

    /// Collapses when either span grew past `collapse_ratio` times the previous
    /// one. Returns true when this call collapsed an expansion.
    pub fn handle_region_change(
        &mut self,
        new_region: &ViewportRegion,
        previous_region: &ViewportRegion,
    ) -> bool {
        if !self.state.is_expanded() {
            return false;
        }
        if new_region.grew_beyond(previous_region, self.config.collapse_ratio) {
            log::debug!(
                "collapsing {:?}: span {:.5}x{:.5} -> {:.5}x{:.5}",
                self.state.expanded_id(),
                previous_region.lat_delta,
                previous_region.lng_delta,
                new_region.lat_delta,
                new_region.lng_delta
            );
            self.collapse();
            return true;
        }
        false
    }

    /// Feeds a host viewport change through the collapse test against the
    /// reference region. A region no larger than the reference on both axes
    /// replaces it. Returns true when this call collapsed an expansion.
    pub fn handle_viewport_change(&mut self, region: &ViewportRegion) -> bool {
        let Some(reference) = self.reference else {
            return false;
        };
        if self.handle_region_change(region, &reference) {
            return true;
        }
        if region.lat_delta <= reference.lat_delta && region.lng_delta <= reference.lng_delta {
            self.reference = Some(*region);
        }
        false
    }

    /// Collapses when the expanded id no longer names a multi-point cluster
    /// of the latest build. Returns true when this call collapsed an expansion.
    pub fn reconcile(&mut self, clusters: &[Cluster]) -> bool {
        let Some(expanded) = self.state.expanded_id() else {
            return false;
        };
        let still_present = clusters
            .iter()
            .any(|c| c.id == expanded && c.count() >= 2);
        if !still_present {
            log::debug!("expanded cluster {} is gone after rebuild", expanded);
            self.collapse();
            return true;
        }
        false
    }

    pub fn collapse(&mut self) {
        self.state = ExpansionState::Collapsed;
        self.reference = None;
    }
}

impl Default for ExpansionController {
    fn default() -> Self {
        Self::new(ExpansionConfig::default())
    }
}
