use foundation::bounds::Aabb2;
use foundation::math::Vec2;
use scene::targets::TargetPoint;

/// Probability at or above which a target counts as high confidence.
pub const HIGH_CONFIDENCE: f64 = 0.6;

pub struct Statistics;

impl Statistics {
    pub fn mean(values: &[f64]) -> Option<f64> {
        if values.is_empty() {
            return None;
        }
        let mut sum = 0.0;
        for &v in values {
            sum += v;
        }
        Some(sum / values.len() as f64)
    }

    pub fn min_max(values: &[f64]) -> Option<(f64, f64)> {
        let first = *values.first()?;
        let mut min = first;
        let mut max = first;
        for &v in values.iter().skip(1) {
            min = min.min(v);
            max = max.max(v);
        }
        Some((min, max))
    }
}

/// Aggregate view of a target set, shown next to the heatmap.
#[derive(Debug, Clone, PartialEq)]
pub struct TargetSummary {
    pub count: usize,
    pub mean_probability: Option<f64>,
    pub probability_range: Option<(f64, f64)>,
    pub high_confidence: usize,
    pub bounds: Option<Aabb2>,
}

impl TargetSummary {
    pub fn of(points: &[TargetPoint]) -> Self {
        let probabilities: Vec<f64> = points.iter().map(|p| p.probability).collect();
        let positions: Vec<Vec2> = points.iter().map(|p| p.position).collect();
        Self {
            count: points.len(),
            mean_probability: Statistics::mean(&probabilities),
            probability_range: Statistics::min_max(&probabilities),
            high_confidence: probabilities
                .iter()
                .filter(|p| **p >= HIGH_CONFIDENCE)
                .count(),
            bounds: Aabb2::from_points(&positions),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Statistics, TargetSummary};
    use pretty_assertions::assert_eq;
    use scene::targets::TargetPoint;

    #[test]
    fn mean_works() {
        let m = Statistics::mean(&[1.0, 2.0, 3.0]).unwrap();
        assert!((m - 2.0).abs() < 1e-9);
        assert_eq!(Statistics::mean(&[]), None);
    }

    #[test]
    fn summary_of_targets() {
        let pts = vec![
            TargetPoint::new(1, 10.0, 10.0, 0.9),
            TargetPoint::new(2, 12.0, 11.0, 0.5),
            TargetPoint::new(3, 80.0, 40.0, 0.6),
        ];
        let s = TargetSummary::of(&pts);
        assert_eq!(s.count, 3);
        assert_eq!(s.probability_range, Some((0.5, 0.9)));
        assert_eq!(s.high_confidence, 2);
        let b = s.bounds.unwrap();
        assert_eq!(b.min, [10.0, 10.0]);
        assert_eq!(b.max, [80.0, 40.0]);
    }

    #[test]
    fn summary_of_nothing_is_empty() {
        let s = TargetSummary::of(&[]);
        assert_eq!(s.count, 0);
        assert_eq!(s.mean_probability, None);
        assert_eq!(s.bounds, None);
    }
}
