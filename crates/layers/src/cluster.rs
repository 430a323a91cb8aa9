//! Zoom-dependent clustering of target points.
//!
//! Clusters are a pure function of the point set and the viewport width:
//! the merge distance is a fixed fraction of the visible width, so clusters
//! tighten as the user zooms in.

use foundation::bounds::Aabb2;
use foundation::ids::{ClusterId, TargetId};
use foundation::math::Vec2;
use foundation::math::precision::stable_total_cmp_f64;
use scene::targets::TargetPoint;
use tracing::debug;

use crate::layer::{Layer, LayerId};

pub const DEFAULT_THRESHOLD_FRACTION: f64 = 0.08;

#[derive(Debug, Clone, PartialEq)]
pub struct Cluster {
    /// Position in the output; not stable across recomputations.
    pub id: ClusterId,
    /// Mean of the member positions.
    pub centroid: Vec2,
    /// Seed first, then the remaining members in ascending x.
    pub members: Vec<TargetId>,
    pub bounds: Aabb2,
    pub max_probability: f64,
    pub mean_probability: f64,
}

impl Cluster {
    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_multiple(&self) -> bool {
        self.members.len() > 1
    }

    pub fn contains(&self, id: TargetId) -> bool {
        self.members.contains(&id)
    }
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ClusterConfig {
    /// Merge distance as a fraction of the viewport width.
    pub threshold_fraction: f64,
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self {
            threshold_fraction: DEFAULT_THRESHOLD_FRACTION,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClusterLayer {
    id: LayerId,
    pub config: ClusterConfig,
}

impl ClusterLayer {
    pub fn new(id: u64, config: ClusterConfig) -> Self {
        Self {
            id: LayerId(id),
            config,
        }
    }

    pub fn threshold(&self, view_width: f64) -> f64 {
        self.config.threshold_fraction * view_width
    }

    pub fn extract(&self, points: &[TargetPoint], view_width: f64) -> Vec<Cluster> {
        let threshold = self.threshold(view_width);
        let clusters = cluster_targets(points, threshold);
        debug!(
            points = points.len(),
            clusters = clusters.len(),
            threshold,
            "clusters recomputed"
        );
        clusters
    }
}

impl Layer for ClusterLayer {
    fn id(&self) -> LayerId {
        self.id
    }

    fn name(&self) -> &'static str {
        "clusters"
    }

    fn tracks_origin(&self) -> bool {
        false
    }
}

/// Greedy seed clustering.
///
/// Points are visited in ascending x (stable, so equal x keeps input order).
/// Each unvisited point seeds a cluster and absorbs every later unvisited
/// point within `threshold` of the seed itself, not of the running centroid.
///
/// Every input point lands in exactly one cluster. A non-finite or negative
/// threshold yields one cluster per point.
pub fn cluster_targets(points: &[TargetPoint], threshold: f64) -> Vec<Cluster> {
    let threshold = if threshold.is_finite() && threshold > 0.0 {
        threshold
    } else {
        0.0
    };
    let threshold_sq = threshold * threshold;

    let mut order: Vec<usize> = (0..points.len()).collect();
    order.sort_by(|&a, &b| stable_total_cmp_f64(points[a].position.x, points[b].position.x));

    let mut visited = vec![false; points.len()];
    let mut clusters = Vec::new();

    for (rank, &seed) in order.iter().enumerate() {
        if visited[seed] {
            continue;
        }
        visited[seed] = true;
        let seed_pos = points[seed].position;
        let mut members = vec![seed];

        for &other in &order[rank + 1..] {
            let pos = points[other].position;
            // Sorted by x: nothing further right can be within range.
            if pos.x - seed_pos.x > threshold {
                break;
            }
            if visited[other] {
                continue;
            }
            if seed_pos.distance_squared(pos) <= threshold_sq {
                visited[other] = true;
                members.push(other);
            }
        }

        clusters.push(build_cluster(
            ClusterId(clusters.len() as u32),
            points,
            &members,
        ));
    }

    clusters
}

fn build_cluster(id: ClusterId, points: &[TargetPoint], members: &[usize]) -> Cluster {
    let n = members.len() as f64;
    let mut sum = Vec2::ZERO;
    let mut prob_sum = 0.0;
    let mut max_probability = f64::NEG_INFINITY;
    let mut positions = Vec::with_capacity(members.len());
    for &i in members {
        let p = &points[i];
        sum = sum + p.position;
        prob_sum += p.probability;
        max_probability = max_probability.max(p.probability);
        positions.push(p.position);
    }

    let centroid = Vec2::new(sum.x / n, sum.y / n);
    Cluster {
        id,
        centroid,
        members: members.iter().map(|&i| points[i].id).collect(),
        bounds: Aabb2::from_points(&positions)
            .unwrap_or_else(|| Aabb2::new([centroid.x, centroid.y], [centroid.x, centroid.y])),
        max_probability,
        mean_probability: prob_sum / n,
    }
}
