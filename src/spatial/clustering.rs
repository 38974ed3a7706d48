use crate::core::{
    config::{ClusterIdStrategy, ClusteringConfig},
    constants::CLUSTER_ID_PREFIX,
    geo::{LatLng, LatLngBounds},
    viewport::ViewportRegion,
};
use crate::data::point::{filter_located, MapPoint, PointKey};
use crate::prelude::{FxHasher, HashSet};
use crate::spatial::{grid::BucketGrid, scale::PixelScale};
use std::hash::{Hash, Hasher};

/// Grid cells are slightly wider than the threshold so rounding in absolute
/// pixel positions never pushes a nearby pair two cells apart.
const CELL_SLACK: f64 = 1.01;

/// A group of one or more points presented as a single visual unit
#[derive(Debug, Clone)]
pub struct Cluster {
    /// Assigned at build time; see [`ClusterIdStrategy`] for stability
    pub id: String,
    /// Arithmetic mean of the member coordinates
    pub centroid: LatLng,
    /// Members in discovery order, anchor first
    pub members: Vec<MapPoint>,
}

impl Cluster {
    fn new(id: String, members: Vec<MapPoint>) -> Self {
        let centroid = LatLng::mean(members.iter().map(|p| &p.position)).unwrap_or_default();
        Self {
            id,
            centroid,
            members,
        }
    }

    /// Get the number of points in the cluster
    pub fn count(&self) -> usize {
        self.members.len()
    }

    /// Check if this is a single-point cluster
    pub fn is_single(&self) -> bool {
        self.members.len() == 1
    }

    /// Bounding box of the member coordinates
    pub fn bounds(&self) -> LatLngBounds {
        LatLngBounds::from_points(self.members.iter().map(|p| &p.position))
            .unwrap_or_else(|| LatLngBounds::new(self.centroid, self.centroid))
    }

    pub fn contains_key(&self, key: &PointKey) -> bool {
        self.members.iter().any(|p| &p.key() == key)
    }

    /// Sorted member keys, the identity of the cluster's membership
    pub fn member_keys(&self) -> Vec<PointKey> {
        let mut keys: Vec<PointKey> = self.members.iter().map(MapPoint::key).collect();
        keys.sort();
        keys
    }
}

/// Summary of the most recent build
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BuildStats {
    pub input_points: usize,
    pub valid_points: usize,
    pub dropped_points: usize,
    pub clusters: usize,
    pub singletons: usize,
    pub threshold: f64,
    pub used_grid: bool,
}

/// Greedy single-pass marker clustering.
///
/// Anchors are taken from the end of the working list; every remaining point
/// within the pixel threshold of the anchor is pulled out with it. The group
/// is merged only when at least `min_nearby` points were pulled, otherwise
/// the anchor and its few neighbors are emitted as singletons. Output depends
/// on input order.
pub struct ClusterBuilder {
    config: ClusteringConfig,
    last_stats: BuildStats,
}

impl ClusterBuilder {
    pub fn new(config: ClusteringConfig) -> Self {
        Self {
            config,
            last_stats: BuildStats::default(),
        }
    }

    pub fn set_config(&mut self, config: ClusteringConfig) {
        self.config = config;
    }

    pub fn last_stats(&self) -> &BuildStats {
        &self.last_stats
    }

    /// Partitions the usable points into clusters for the given viewport
    pub fn build(
        &mut self,
        points: &[MapPoint],
        region: &ViewportRegion,
        surface_width: f64,
    ) -> Vec<Cluster> {
        let (located, dropped) = filter_located(points);
        let scale = PixelScale::estimate(surface_width, region, &self.config);
        let used_grid = self.config.scan_strategy.uses_grid(located.len());

        let groups = if used_grid {
            grid_groups(&located, &scale)
        } else {
            linear_groups(&located, &scale)
        };

        let clusters = self.emit(located, groups);

        self.last_stats = BuildStats {
            input_points: points.len(),
            valid_points: points.len() - dropped,
            dropped_points: dropped,
            clusters: clusters.len(),
            singletons: clusters.iter().filter(|c| c.is_single()).count(),
            threshold: scale.threshold,
            used_grid,
        };
        log::debug!(
            "clustered {} points ({} dropped) into {} clusters, threshold {:.2}px, grid: {}",
            self.last_stats.valid_points,
            dropped,
            self.last_stats.clusters,
            scale.threshold,
            used_grid
        );

        clusters
    }

    /// Turns (anchor, nearby) groups into clusters, applying the merge rule
    fn emit(&self, located: Vec<MapPoint>, groups: Vec<(usize, Vec<usize>)>) -> Vec<Cluster> {
        let mut slots: Vec<Option<MapPoint>> = located.into_iter().map(Some).collect();
        let mut take = |index: usize| slots[index].take();

        let mut member_sets: Vec<Vec<MapPoint>> = Vec::with_capacity(groups.len());
        for (anchor, nearby) in groups {
            if nearby.len() >= self.config.min_nearby {
                let members = std::iter::once(anchor)
                    .chain(nearby)
                    .filter_map(&mut take)
                    .collect();
                member_sets.push(members);
            } else {
                for index in std::iter::once(anchor).chain(nearby) {
                    if let Some(point) = take(index) {
                        member_sets.push(vec![point]);
                    }
                }
            }
        }

        let mut ids = ClusterIds::new(self.config.id_strategy);
        member_sets
            .into_iter()
            .map(|members| {
                let id = ids.next(&members);
                Cluster::new(id, members)
            })
            .collect()
    }
}

impl Default for ClusterBuilder {
    fn default() -> Self {
        Self::new(ClusteringConfig::default())
    }
}

/// Nested-scan grouping over a LIFO working list
fn linear_groups(points: &[MapPoint], scale: &PixelScale) -> Vec<(usize, Vec<usize>)> {
    let mut working: Vec<usize> = (0..points.len()).collect();
    let mut groups = Vec::new();

    while let Some(anchor) = working.pop() {
        let origin = &points[anchor].position;
        let mut nearby = Vec::new();
        working.retain(|&candidate| {
            if scale.is_nearby(origin, &points[candidate].position) {
                nearby.push(candidate);
                false
            } else {
                true
            }
        });
        groups.push((anchor, nearby));
    }

    groups
}

/// Same grouping as [`linear_groups`], with candidates drawn from a bucket grid.
///
/// The working list order is the input index order, so the anchor is always
/// the highest live index and nearby points are reported in ascending index order.
fn grid_groups(points: &[MapPoint], scale: &PixelScale) -> Vec<(usize, Vec<usize>)> {
    let positions: Vec<(f64, f64)> = points.iter().map(|p| scale.to_pixels(&p.position)).collect();
    let mut grid = BucketGrid::build(&positions, scale.threshold * CELL_SLACK);
    log::trace!("bucketed {} points into {} cells", points.len(), grid.cell_count());
    let mut alive = vec![true; points.len()];
    let mut groups = Vec::new();

    for anchor in (0..points.len()).rev() {
        if !alive[anchor] {
            continue;
        }
        alive[anchor] = false;
        grid.remove(anchor, positions[anchor]);

        let origin = &points[anchor].position;
        let mut nearby: Vec<usize> = grid
            .neighbors(positions[anchor])
            .filter(|&candidate| {
                alive[candidate] && scale.is_nearby(origin, &points[candidate].position)
            })
            .collect();
        nearby.sort_unstable();

        for &index in &nearby {
            alive[index] = false;
            grid.remove(index, positions[index]);
        }
        groups.push((anchor, nearby));
    }

    groups
}

/// Hands out cluster identifiers for one build
struct ClusterIds {
    strategy: ClusterIdStrategy,
    issued: HashSet<String>,
    sequence: usize,
}

impl ClusterIds {
    fn new(strategy: ClusterIdStrategy) -> Self {
        Self {
            strategy,
            issued: HashSet::default(),
            sequence: 0,
        }
    }

    fn next(&mut self, members: &[MapPoint]) -> String {
        let id = match self.strategy {
            ClusterIdStrategy::Sequential => format!("{}{}", CLUSTER_ID_PREFIX, self.sequence),
            ClusterIdStrategy::MemberHash => self.member_hash_id(members),
        };
        self.sequence += 1;
        id
    }

    fn member_hash_id(&mut self, members: &[MapPoint]) -> String {
        let mut keys: Vec<PointKey> = members.iter().map(MapPoint::key).collect();
        keys.sort();

        let mut hasher = FxHasher::default();
        keys.hash(&mut hasher);
        let base = format!("{}{:016x}", CLUSTER_ID_PREFIX, hasher.finish());

        // identical memberships only happen with duplicate points
        let mut id = base.clone();
        let mut suffix = 1;
        while self.issued.contains(&id) {
            id = format!("{}-{}", base, suffix);
            suffix += 1;
        }
        self.issued.insert(id.clone());
        id
    }
}
