//! Seams between the engine and the hosting map surface
//!
//! The engine never draws or moves the map itself. Hosts implement these
//! traits and the engine calls them with its decisions.

use crate::core::viewport::ViewportRegion;
use crate::data::point::MapPoint;
use crate::interaction::expansion::{ExpansionState, RenderMode};
use crate::spatial::clustering::Cluster;
use std::time::Duration;

/// Draws markers on the host surface
pub trait MarkerPresenter {
    /// Draw a count badge standing in for every member of `cluster`
    fn render_cluster(&mut self, cluster: &Cluster);

    /// Draw one individual marker
    fn render_singleton(&mut self, point: &MapPoint);
}

/// Receives advisory viewport changes
pub trait ViewportHost {
    fn request_viewport_change(&mut self, region: &ViewportRegion, duration: Duration);
}

/// Tap notifications forwarded to the host
pub trait MarkerEvents {
    fn on_cluster_tap(&mut self, _cluster: &Cluster) {}

    fn on_member_tap(&mut self, _point: &MapPoint) {}
}

/// Host that ignores every notification
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopEvents;

impl MarkerEvents for NoopEvents {}

/// Feeds every cluster to `presenter` according to the expansion state
pub fn present_clusters(
    clusters: &[Cluster],
    state: &ExpansionState,
    presenter: &mut dyn MarkerPresenter,
) {
    for cluster in clusters {
        match state.render_mode(cluster) {
            RenderMode::Individual => {
                for point in &cluster.members {
                    presenter.render_singleton(point);
                }
            }
            RenderMode::Badge { .. } => presenter.render_cluster(cluster),
        }
    }
}
