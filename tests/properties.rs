//! Property tests for the clustering invariants

use pincluster::prelude::*;
use proptest::prelude::*;

const CENTER_LAT: f64 = 45.0;
const CENTER_LNG: f64 = 7.0;

/// Offsets from the center, with the occasional unusable coordinate mixed in
fn point_set() -> impl Strategy<Value = Vec<MapPoint>> {
    prop::collection::vec(
        prop_oneof![
            8 => (0.0f64..0.02, 0.0f64..0.02)
                .prop_map(|(dlat, dlng)| (CENTER_LAT + dlat, CENTER_LNG + dlng)),
            1 => Just((0.0, 0.0)),
            1 => Just((f64::NAN, CENTER_LNG)),
        ],
        0..80,
    )
    .prop_map(|coords| {
        coords
            .into_iter()
            .enumerate()
            .map(|(i, (lat, lng))| MapPoint::new(lat, lng).with_id(format!("p{}", i)))
            .collect()
    })
}

fn viewport() -> impl Strategy<Value = ViewportRegion> {
    (0.002f64..0.08, 0.002f64..0.08).prop_map(|(lat_delta, lng_delta)| {
        ViewportRegion::from_coords(CENTER_LAT + 0.01, CENTER_LNG + 0.01, lat_delta, lng_delta)
            .unwrap()
    })
}

fn builder(scan_strategy: ScanStrategy) -> ClusterBuilder {
    ClusterBuilder::new(ClusteringConfig {
        scan_strategy,
        ..ClusteringConfig::default()
    })
}

fn membership(clusters: &[Cluster]) -> Vec<Vec<PointKey>> {
    let mut sets: Vec<Vec<PointKey>> = clusters.iter().map(Cluster::member_keys).collect();
    sets.sort();
    sets
}

proptest! {
    #[test]
    fn proptest_clusters_partition_the_usable_points(
        points in point_set(),
        view in viewport(),
        width in 200.0f64..600.0,
    ) {
        let clusters = builder(ScanStrategy::default()).build(&points, &view, width);

        let mut seen: Vec<PointKey> = clusters
            .iter()
            .flat_map(|c| c.members.iter().map(MapPoint::key))
            .collect();
        seen.sort();
        let mut expected: Vec<PointKey> = points
            .iter()
            .filter(|p| p.has_location())
            .map(MapPoint::key)
            .collect();
        expected.sort();

        prop_assert_eq!(seen, expected);
        prop_assert!(clusters.iter().all(|c| c.count() >= 1));
    }

    #[test]
    fn proptest_merged_clusters_are_tight_and_large_enough(
        points in point_set(),
        view in viewport(),
        width in 200.0f64..600.0,
    ) {
        let config = ClusteringConfig::default();
        let scale = PixelScale::estimate(width, &view, &config);
        let clusters = builder(ScanStrategy::Linear).build(&points, &view, width);

        for cluster in clusters.iter().filter(|c| !c.is_single()) {
            prop_assert!(cluster.count() > config.min_nearby);
            let anchor = &cluster.members[0].position;
            for member in &cluster.members[1..] {
                prop_assert!(scale.is_nearby(anchor, &member.position));
            }
            let centroid = LatLng::mean(cluster.members.iter().map(|p| &p.position)).unwrap();
            prop_assert_eq!(cluster.centroid, centroid);
        }
    }

    #[test]
    fn proptest_points_without_neighbors_are_singletons(
        points in point_set(),
        view in viewport(),
        width in 200.0f64..600.0,
    ) {
        let scale = PixelScale::estimate(width, &view, &ClusteringConfig::default());
        let clusters = builder(ScanStrategy::Linear).build(&points, &view, width);
        let usable: Vec<&MapPoint> = points.iter().filter(|p| p.has_location()).collect();

        for point in &usable {
            let neighbors = usable
                .iter()
                .filter(|other| {
                    other.id != point.id && scale.is_nearby(&point.position, &other.position)
                })
                .count();
            let home = clusters
                .iter()
                .find(|c| c.contains_key(&point.key()))
                .unwrap();
            if neighbors < 2 && home.members[0].id == point.id {
                // an anchor with fewer than two candidates can never merge
                prop_assert!(home.is_single());
            }
            if neighbors == 0 {
                prop_assert!(home.is_single());
            }
        }
    }

    #[test]
    fn proptest_threshold_never_shrinks_when_zooming_out(
        lat_delta in 0.0001f64..10.0,
        lng_delta in 0.0001f64..10.0,
        factor in 1.0f64..20.0,
    ) {
        let config = ClusteringConfig::default();
        let near =
            ViewportRegion::from_coords(CENTER_LAT, CENTER_LNG, lat_delta, lng_delta).unwrap();
        let far = near.scaled_by(factor).unwrap();

        let near_threshold = PixelScale::threshold_for(&near, &config);
        let far_threshold = PixelScale::threshold_for(&far, &config);
        prop_assert!(far_threshold >= near_threshold);
        prop_assert!(far_threshold <= config.base_threshold * config.max_threshold_factor);
    }

    #[test]
    fn proptest_rebuilding_yields_identical_membership(
        points in point_set(),
        view in viewport(),
        width in 200.0f64..600.0,
    ) {
        let mut builder = builder(ScanStrategy::default());
        let first = builder.build(&points, &view, width);
        let second = builder.build(&points, &view, width);
        prop_assert_eq!(membership(&first), membership(&second));
    }

    #[test]
    fn proptest_grid_scan_matches_linear_scan(
        points in point_set(),
        view in viewport(),
        width in 200.0f64..600.0,
    ) {
        let linear = builder(ScanStrategy::Linear).build(&points, &view, width);
        let grid = builder(ScanStrategy::Grid).build(&points, &view, width);

        prop_assert_eq!(linear.len(), grid.len());
        for (l, g) in linear.iter().zip(&grid) {
            prop_assert_eq!(&l.id, &g.id);
            let l_keys: Vec<PointKey> = l.members.iter().map(MapPoint::key).collect();
            let g_keys: Vec<PointKey> = g.members.iter().map(MapPoint::key).collect();
            prop_assert_eq!(l_keys, g_keys);
        }
    }
}
