use foundation::ids::{ClusterId, TargetId};
use foundation::math::Vec2;
use scene::projection::ScreenProjector;
use scene::targets::TargetPoint;

use crate::cluster::Cluster;
use crate::symbology::DensityTier;

pub const SINGLE_MARKER_RADIUS_PX: f64 = 10.0;
pub const CLUSTER_MARKER_RADIUS_PX: f64 = 14.0;
/// Badge growth per extra member, capped at ten members.
pub const CLUSTER_RADIUS_STEP_PX: f64 = 2.0;

/// Maps a data-space position to percentage-of-container coordinates.
pub trait OverlayProjector {
    fn project(&self, data: Vec2) -> Option<[f64; 2]>;
}

impl OverlayProjector for ScreenProjector {
    fn project(&self, data: Vec2) -> Option<[f64; 2]> {
        let pct = self.to_percent(data);
        (pct[0].is_finite() && pct[1].is_finite()).then_some(pct)
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum OverlayKind {
    Marker { target: TargetId },
    Cluster { cluster: ClusterId, count: usize },
}

#[derive(Debug, Clone, PartialEq)]
pub struct OverlayAnchor {
    pub kind: OverlayKind,
    pub position: Vec2,
    pub left_pct: f64,
    pub top_pct: f64,
    pub radius_px: f64,
    pub label: String,
    pub tier: DensityTier,
    /// Anchor lies inside the container.
    pub visible: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TooltipAnchor {
    pub target: TargetId,
    pub left_pct: f64,
    pub top_pct: f64,
    pub probability_label: String,
    pub description: String,
    pub reasoning: Option<String>,
    pub visible: bool,
}

pub fn probability_label(probability: f64) -> String {
    format!("{}%", (probability.clamp(0.0, 1.0) * 100.0).round() as i64)
}

pub fn marker_radius_px(cluster: &Cluster) -> f64 {
    if !cluster.is_multiple() {
        return SINGLE_MARKER_RADIUS_PX;
    }
    let extra = (cluster.len() - 1).min(10) as f64;
    CLUSTER_MARKER_RADIUS_PX + extra * CLUSTER_RADIUS_STEP_PX
}

/// One anchor per cluster, in cluster order.
///
/// Anchors the projector cannot place are dropped; off-screen ones are kept
/// with `visible == false`.
pub fn layout_overlays<P: OverlayProjector>(
    clusters: &[Cluster],
    projector: &P,
) -> Vec<OverlayAnchor> {
    let mut out = Vec::with_capacity(clusters.len());
    for cluster in clusters {
        let Some([left, top]) = projector.project(cluster.centroid) else {
            continue;
        };
        let (kind, label, tier) = match (cluster.is_multiple(), cluster.members.first()) {
            (false, Some(&target)) => (
                OverlayKind::Marker { target },
                probability_label(cluster.max_probability),
                DensityTier::from_intensity(cluster.max_probability),
            ),
            _ => (
                OverlayKind::Cluster {
                    cluster: cluster.id,
                    count: cluster.len(),
                },
                cluster.len().to_string(),
                DensityTier::from_intensity(cluster.mean_probability),
            ),
        };
        out.push(OverlayAnchor {
            kind,
            position: cluster.centroid,
            left_pct: left,
            top_pct: top,
            radius_px: marker_radius_px(cluster),
            label,
            tier,
            visible: in_container(left, top),
        });
    }
    out
}

pub fn tooltip_for<P: OverlayProjector>(
    target: &TargetPoint,
    projector: &P,
) -> Option<TooltipAnchor> {
    let [left, top] = projector.project(target.position)?;
    Some(TooltipAnchor {
        target: target.id,
        left_pct: left,
        top_pct: top,
        probability_label: probability_label(target.probability),
        description: target.description.clone(),
        reasoning: target.reasoning.clone(),
        visible: in_container(left, top),
    })
}

fn in_container(left: f64, top: f64) -> bool {
    (0.0..=100.0).contains(&left) && (0.0..=100.0).contains(&top)
}
