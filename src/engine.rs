//! The engine facade the host drives
//!
//! [`MarkerEngine`] owns the point set, the last viewport it was told about,
//! the latest cluster build and the expansion state. The host feeds it
//! viewport and point changes, forwards taps, and asks it to present.

use crate::{
    core::{config::EngineConfig, viewport::ViewportRegion},
    data::point::{MapPoint, PointKey},
    interaction::{
        expansion::{ExpansionController, ExpansionState},
        presenter::{present_clusters, MarkerEvents, MarkerPresenter, ViewportHost},
    },
    spatial::clustering::{BuildStats, Cluster, ClusterBuilder},
    MarkerError, Result,
};

pub struct MarkerEngine {
    config: EngineConfig,
    points: Vec<MapPoint>,
    viewport: ViewportRegion,
    surface_width: f64,
    builder: ClusterBuilder,
    expansion: ExpansionController,
    clusters: Vec<Cluster>,
    last_rebuild: Option<instant::Instant>,
    rebuild_pending: bool,
}

impl MarkerEngine {
    pub fn new(config: EngineConfig, viewport: ViewportRegion, surface_width: f64) -> Result<Self> {
        config.validate()?;
        viewport.validate()?;
        validate_surface(surface_width)?;

        let mut engine = Self {
            builder: ClusterBuilder::new(config.clustering.clone()),
            expansion: ExpansionController::new(config.expansion.clone()),
            config,
            points: Vec::new(),
            viewport,
            surface_width,
            clusters: Vec::new(),
            last_rebuild: None,
            rebuild_pending: false,
        };
        engine.rebuild();
        Ok(engine)
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn points(&self) -> &[MapPoint] {
        &self.points
    }

    pub fn viewport(&self) -> &ViewportRegion {
        &self.viewport
    }

    pub fn surface_width(&self) -> f64 {
        self.surface_width
    }

    pub fn clusters(&self) -> &[Cluster] {
        &self.clusters
    }

    pub fn expansion_state(&self) -> &ExpansionState {
        self.expansion.state()
    }

    pub fn stats(&self) -> &BuildStats {
        self.builder.last_stats()
    }

    /// A viewport change arrived inside the debounce window and is not yet clustered
    pub fn is_rebuild_pending(&self) -> bool {
        self.rebuild_pending
    }

    /// Replaces the point set and rebuilds right away
    pub fn set_points(&mut self, points: Vec<MapPoint>) {
        self.points = points;
        self.rebuild();
    }

    /// Applies a host viewport change.
    ///
    /// The collapse test runs before the rebuild, against the region the
    /// expansion started from (or the smallest region seen since). Returns true
    /// when the change collapsed an expansion.
    pub fn set_viewport(&mut self, region: ViewportRegion) -> Result<bool> {
        region.validate()?;

        let collapsed = self.expansion.handle_viewport_change(&region);
        self.viewport = region;

        let due = match self.last_rebuild {
            Some(last) => self.config.recompute.should_update(last),
            None => true,
        };
        if due {
            self.rebuild();
        } else {
            log::trace!("viewport change inside debounce window, rebuild deferred");
            self.rebuild_pending = true;
        }
        Ok(collapsed)
    }

    /// Swaps the configuration and rebuilds with it
    pub fn set_config(&mut self, config: EngineConfig) -> Result<()> {
        config.validate()?;
        self.builder.set_config(config.clustering.clone());
        self.expansion.set_config(config.expansion.clone());
        self.config = config;
        self.rebuild();
        Ok(())
    }

    pub fn set_surface_width(&mut self, surface_width: f64) -> Result<()> {
        validate_surface(surface_width)?;
        self.surface_width = surface_width;
        self.rebuild();
        Ok(())
    }

    /// Runs a deferred rebuild, if any. Returns whether one ran.
    pub fn flush(&mut self) -> bool {
        if self.rebuild_pending {
            self.rebuild();
            true
        } else {
            false
        }
    }

    /// Handles a tap on a rendered cluster.
    ///
    /// A single-point cluster behaves like a tap on its member. Anything larger
    /// is reported to `events`, expanded, and the fit region is requested from `host`.
    pub fn tap_cluster(
        &mut self,
        cluster_id: &str,
        host: &mut dyn ViewportHost,
        events: &mut dyn MarkerEvents,
    ) -> Result<()> {
        let cluster = self
            .clusters
            .iter()
            .find(|c| c.id == cluster_id)
            .ok_or_else(|| MarkerError::UnknownCluster(cluster_id.to_string()))?;

        if cluster.is_single() {
            let point = &cluster.members[0];
            point.press();
            events.on_member_tap(point);
            return Ok(());
        }

        events.on_cluster_tap(cluster);
        if let Some(request) = self.expansion.handle_cluster_press(cluster, &self.viewport) {
            host.request_viewport_change(&request.region, request.duration);
        }
        Ok(())
    }

    /// Handles a tap on an individually drawn marker
    pub fn tap_member(&mut self, key: &PointKey, events: &mut dyn MarkerEvents) -> Result<()> {
        let point = self
            .clusters
            .iter()
            .flat_map(|c| c.members.iter())
            .find(|p| &p.key() == key)
            .ok_or_else(|| MarkerError::UnknownPoint(format!("{:?}", key)))?;

        point.press();
        events.on_member_tap(point);
        Ok(())
    }

    /// Hands every cluster to `presenter` as a badge or as individual markers
    pub fn present(&self, presenter: &mut dyn MarkerPresenter) {
        present_clusters(&self.clusters, self.expansion.state(), presenter);
    }

    /// Resets the expansion when the map session ends
    pub fn end_session(&mut self) {
        self.expansion.collapse();
    }

    fn rebuild(&mut self) {
        self.clusters = self
            .builder
            .build(&self.points, &self.viewport, self.surface_width);
        self.expansion.reconcile(&self.clusters);
        self.last_rebuild = Some(instant::Instant::now());
        self.rebuild_pending = false;
    }
}

fn validate_surface(surface_width: f64) -> Result<()> {
    if surface_width.is_finite() && surface_width > 0.0 {
        Ok(())
    } else {
        Err(MarkerError::InvalidSurface(surface_width))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::ClusterIdStrategy;
    use std::time::Duration;

    #[derive(Default)]
    struct Host {
        requests: Vec<(ViewportRegion, Duration)>,
    }

    impl ViewportHost for Host {
        fn request_viewport_change(&mut self, region: &ViewportRegion, duration: Duration) {
            self.requests.push((*region, duration));
        }
    }

    #[derive(Default)]
    struct Events {
        clusters: Vec<String>,
        members: Vec<String>,
    }

    impl MarkerEvents for Events {
        fn on_cluster_tap(&mut self, cluster: &Cluster) {
            self.clusters.push(cluster.id.clone());
        }

        fn on_member_tap(&mut self, point: &MapPoint) {
            self.members.push(point.id.clone().unwrap_or_default());
        }
    }

    fn view() -> ViewportRegion {
        ViewportRegion::from_coords(10.0, 10.0, 0.01, 0.01).unwrap()
    }

    fn points() -> Vec<MapPoint> {
        vec![
            MapPoint::new(11.0, 11.0).with_id("lonely"),
            MapPoint::new(10.0, 10.0).with_id("a"),
            MapPoint::new(10.0001, 10.0).with_id("b"),
            MapPoint::new(10.0, 10.0001).with_id("c"),
        ]
    }

    fn engine() -> MarkerEngine {
        let mut engine = MarkerEngine::new(EngineConfig::default(), view(), 400.0).unwrap();
        engine.set_points(points());
        engine
    }

    #[test]
    fn test_rejects_bad_inputs() {
        assert!(matches!(
            MarkerEngine::new(EngineConfig::default(), view(), 0.0),
            Err(MarkerError::InvalidSurface(_))
        ));
        let mut engine = engine();
        let bad = ViewportRegion {
            lat_delta: -1.0,
            ..view()
        };
        assert!(matches!(
            engine.set_viewport(bad),
            Err(MarkerError::InvalidViewport(_))
        ));
        assert!(engine.set_surface_width(f64::NAN).is_err());
    }

    #[test]
    fn test_set_points_rebuilds() {
        let engine = engine();
        assert_eq!(engine.clusters().len(), 2);
        assert_eq!(engine.stats().valid_points, 4);
    }

    #[test]
    fn test_tap_cluster_expands_and_requests_fit() {
        let mut engine = engine();
        let mut host = Host::default();
        let mut events = Events::default();

        engine.tap_cluster("cluster-0", &mut host, &mut events).unwrap();
        assert_eq!(events.clusters, vec!["cluster-0"]);
        assert_eq!(engine.expansion_state().expanded_id(), Some("cluster-0"));
        assert_eq!(host.requests.len(), 1);
        assert_eq!(host.requests[0].1, Duration::from_millis(300));

        assert!(matches!(
            engine.tap_cluster("cluster-9", &mut host, &mut events),
            Err(MarkerError::UnknownCluster(_))
        ));
    }

    #[test]
    fn test_tap_singleton_cluster_is_a_member_tap() {
        let mut engine = engine();
        let mut host = Host::default();
        let mut events = Events::default();

        engine.tap_cluster("cluster-1", &mut host, &mut events).unwrap();
        assert_eq!(events.members, vec!["lonely"]);
        assert!(events.clusters.is_empty());
        assert!(host.requests.is_empty());
        assert!(!engine.expansion_state().is_expanded());
    }

    #[test]
    fn test_tap_member() {
        let mut engine = engine();
        let mut events = Events::default();
        engine
            .tap_member(&PointKey::Id("b".to_string()), &mut events)
            .unwrap();
        assert_eq!(events.members, vec!["b"]);
        assert!(engine
            .tap_member(&PointKey::Id("nope".to_string()), &mut events)
            .is_err());
    }

    #[test]
    fn test_zoom_out_collapses() {
        let mut engine = engine();
        engine
            .tap_cluster("cluster-0", &mut Host::default(), &mut Events::default())
            .unwrap();

        let zoomed_out = view().scaled_by(2.0).unwrap();
        assert!(engine.set_viewport(zoomed_out).unwrap());
        assert!(!engine.expansion_state().is_expanded());
    }

    #[test]
    fn test_stepwise_zoom_out_collapses() {
        let mut engine = engine();
        engine
            .tap_cluster("cluster-0", &mut Host::default(), &mut Events::default())
            .unwrap();

        let mut collapsed_at = None;
        for step in 1..=8 {
            let region = view().scaled_by(1.3f64.powi(step)).unwrap();
            if engine.set_viewport(region).unwrap() {
                collapsed_at = Some(step);
                break;
            }
        }
        // 1.3 stays under 1.5x the press-time view, 1.69 does not
        assert_eq!(collapsed_at, Some(2));
        assert!(!engine.expansion_state().is_expanded());
    }

    #[test]
    fn test_set_config_rebuilds() {
        let mut engine = engine();
        engine
            .tap_cluster("cluster-0", &mut Host::default(), &mut Events::default())
            .unwrap();

        let mut config = EngineConfig::default();
        config.clustering.min_nearby = 3;
        engine.set_config(config).unwrap();
        assert_eq!(engine.config().clustering.min_nearby, 3);
        assert_eq!(engine.clusters().len(), 4);
        assert!(!engine.expansion_state().is_expanded());

        let mut invalid = EngineConfig::default();
        invalid.expansion.collapse_ratio = 0.5;
        assert!(engine.set_config(invalid).is_err());
        assert_eq!(engine.config().clustering.min_nearby, 3);
    }

    #[test]
    fn test_end_session_collapses() {
        let mut engine = engine();
        engine
            .tap_cluster("cluster-0", &mut Host::default(), &mut Events::default())
            .unwrap();
        engine.end_session();
        assert_eq!(engine.expansion_state(), &ExpansionState::Collapsed);
    }

    #[test]
    fn test_debounced_viewport_changes() {
        let mut config = EngineConfig::default();
        config.recompute.min_interval_ms = 60_000;
        let mut engine = MarkerEngine::new(config, view(), 400.0).unwrap();
        engine.set_points(points());
        let threshold_before = engine.stats().threshold;

        let wider = view().scaled_by(1.2).unwrap();
        engine.set_viewport(wider).unwrap();
        assert!(engine.is_rebuild_pending());
        assert_eq!(engine.viewport(), &wider);
        assert_eq!(engine.stats().threshold, threshold_before);

        assert!(engine.flush());
        assert!(!engine.is_rebuild_pending());
        assert!(engine.stats().threshold > threshold_before);
        assert!(!engine.flush());
    }

    #[test]
    fn test_member_hash_expansion_survives_rebuild() {
        let mut config = EngineConfig::default();
        config.clustering.id_strategy = ClusterIdStrategy::MemberHash;
        let mut engine = MarkerEngine::new(config, view(), 400.0).unwrap();
        engine.set_points(points());

        let id = engine
            .clusters()
            .iter()
            .find(|c| c.count() == 3)
            .map(|c| c.id.clone())
            .unwrap();
        engine
            .tap_cluster(&id, &mut Host::default(), &mut Events::default())
            .unwrap();

        // new points that do not touch the trio keep its id
        let mut more = points();
        more.insert(0, MapPoint::new(12.0, 12.0).with_id("another"));
        engine.set_points(more);
        assert_eq!(engine.expansion_state().expanded_id(), Some(id.as_str()));
    }
}
