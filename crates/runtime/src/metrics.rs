use std::collections::BTreeMap;

/// Well-known metric names recorded by the viewer.
pub mod names {
    pub const CLUSTERS_RECOMPUTE: &str = "clusters.recompute";
    pub const CLUSTERS_MEMO_HIT: &str = "clusters.memo_hit";
    pub const CLUSTERS_COUNT: &str = "clusters.count";
    pub const DENSITY_RECOMPUTE: &str = "density.recompute";
    pub const DENSITY_MEMO_HIT: &str = "density.memo_hit";
    pub const GESTURE_CLICK: &str = "gesture.click";
    pub const GESTURE_DRAG: &str = "gesture.drag";
    pub const GESTURE_WHEEL: &str = "gesture.wheel";
    pub const DRAG_DISTANCE_PX: &str = "gesture.drag_distance_px";
    pub const SELECTION_COMMIT: &str = "selection.commit";
    pub const SELECTION_COMMIT_FAILED: &str = "selection.commit_failed";
}

/// Deterministic metrics aggregation.
///
/// Metrics must not depend on wall-clock time or unordered iteration.
/// Sorted maps keep snapshots in a stable order.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Metrics {
    counters: BTreeMap<&'static str, u64>,
    gauges: BTreeMap<&'static str, i64>,
    histograms: BTreeMap<&'static str, Histogram>,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub struct Histogram {
    pub count: u64,
    pub sum: i64,
    pub min: i64,
    pub max: i64,
}

impl Histogram {
    pub fn record(&mut self, value: i64) {
        if self.count == 0 {
            self.min = value;
            self.max = value;
        } else {
            self.min = self.min.min(value);
            self.max = self.max.max(value);
        }
        self.count += 1;
        self.sum += value;
    }

    pub fn mean(&self) -> Option<f64> {
        (self.count > 0).then(|| self.sum as f64 / self.count as f64)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub counters: Vec<(&'static str, u64)>,
    pub gauges: Vec<(&'static str, i64)>,
    pub histograms: Vec<(&'static str, Histogram)>,
}

impl Metrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.counters.clear();
        self.gauges.clear();
        self.histograms.clear();
    }

    pub fn counter(&self, name: &str) -> u64 {
        self.counters.get(name).copied().unwrap_or(0)
    }

    pub fn incr(&mut self, name: &'static str) {
        self.inc_counter(name, 1);
    }

    pub fn inc_counter(&mut self, name: &'static str, by: u64) {
        *self.counters.entry(name).or_insert(0) += by;
    }

    pub fn gauge(&self, name: &str) -> Option<i64> {
        self.gauges.get(name).copied()
    }

    pub fn set_gauge(&mut self, name: &'static str, value: i64) {
        self.gauges.insert(name, value);
    }

    pub fn record_histogram(&mut self, name: &'static str, value: i64) {
        self.histograms.entry(name).or_default().record(value);
    }

    pub fn histogram(&self, name: &str) -> Option<Histogram> {
        self.histograms.get(name).copied()
    }

    /// Returns a stable, sorted snapshot suitable for logs and CLI output.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            counters: self.counters.iter().map(|(k, v)| (*k, *v)).collect(),
            gauges: self.gauges.iter().map(|(k, v)| (*k, *v)).collect(),
            histograms: self.histograms.iter().map(|(k, v)| (*k, *v)).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Histogram, Metrics, names};

    #[test]
    fn counters_accumulate() {
        let mut m = Metrics::new();
        m.incr(names::CLUSTERS_RECOMPUTE);
        m.inc_counter(names::CLUSTERS_RECOMPUTE, 2);
        assert_eq!(m.counter(names::CLUSTERS_RECOMPUTE), 3);
        assert_eq!(m.counter("missing"), 0);
    }

    #[test]
    fn gauges_overwrite() {
        let mut m = Metrics::new();
        assert_eq!(m.gauge(names::CLUSTERS_COUNT), None);
        m.set_gauge(names::CLUSTERS_COUNT, 10);
        m.set_gauge(names::CLUSTERS_COUNT, 11);
        assert_eq!(m.gauge(names::CLUSTERS_COUNT), Some(11));
    }

    #[test]
    fn histogram_tracks_min_max_sum_count() {
        let mut h = Histogram::default();
        assert_eq!(h.mean(), None);
        h.record(5);
        h.record(-2);
        h.record(7);
        assert_eq!(h.count, 3);
        assert_eq!(h.sum, 10);
        assert_eq!(h.min, -2);
        assert_eq!(h.max, 7);
    }

    #[test]
    fn snapshot_is_stably_sorted() {
        let mut m = Metrics::new();
        m.incr(names::GESTURE_DRAG);
        m.incr(names::GESTURE_CLICK);
        m.record_histogram(names::DRAG_DISTANCE_PX, 10);

        let snap = m.snapshot();
        assert_eq!(
            snap.counters,
            vec![(names::GESTURE_CLICK, 1), (names::GESTURE_DRAG, 1)]
        );
        assert_eq!(snap.histograms.len(), 1);
        assert_eq!(snap.histograms[0].1.max, 10);
    }
}
