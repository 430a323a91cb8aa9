use foundation::math::Vec2;
use scene::targets::TargetPoint;
use scene::viewport::ViewRect;
use tracing::{debug, warn};

use crate::layer::{Layer, LayerId};
use crate::symbology::{DensityTier, LayerStyle};

pub const DEFAULT_GRID_SIZE: usize = 30;
/// Gaussian kernel denominator, in squared data units.
pub const DEFAULT_DECAY: f64 = 100.0;

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct DensityConfig {
    /// Cells per axis.
    pub grid_size: usize,
    pub decay: f64,
}

impl Default for DensityConfig {
    fn default() -> Self {
        Self {
            grid_size: DEFAULT_GRID_SIZE,
            decay: DEFAULT_DECAY,
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct DensityCell {
    pub ix: usize,
    pub iy: usize,
    pub rect: ViewRect,
    pub intensity: f64,
    pub tier: DensityTier,
}

/// Square grid of kernel-density intensities spanning a viewport.
///
/// Row-major: cell `(ix, iy)` is at `iy * size + ix`, `iy` growing with data y.
#[derive(Debug, Clone, PartialEq)]
pub struct DensityGrid {
    rect: ViewRect,
    size: usize,
    values: Vec<f64>,
}

impl DensityGrid {
    /// Every cell sums `probability * exp(-d² / decay)` over all points,
    /// visible or not, clamped to `[0, 1]`.
    ///
    /// The decay is in absolute data units, so the kernel footprint does not
    /// rescale with zoom.
    pub fn compute(points: &[TargetPoint], rect: ViewRect, config: DensityConfig) -> Self {
        let size = config.grid_size;
        let mut grid = Self {
            rect,
            size,
            values: vec![0.0; size * size],
        };
        if points.is_empty() || size == 0 {
            return grid;
        }
        if !rect.is_valid() || !(config.decay.is_finite() && config.decay > 0.0) {
            warn!(?rect, decay = config.decay, "degenerate density input, grid left empty");
            return grid;
        }

        for iy in 0..size {
            for ix in 0..size {
                let center = grid.cell_center(ix, iy);
                let mut sum = 0.0;
                for p in points {
                    let d2 = center.distance_squared(p.position);
                    sum += p.probability * (-d2 / config.decay).exp();
                }
                grid.values[iy * size + ix] = if sum.is_finite() {
                    sum.clamp(0.0, 1.0)
                } else {
                    0.0
                };
            }
        }
        grid
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn rect(&self) -> ViewRect {
        self.rect
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Intensity at `(ix, iy)`; zero outside the grid.
    pub fn value(&self, ix: usize, iy: usize) -> f64 {
        if ix >= self.size || iy >= self.size {
            return 0.0;
        }
        self.values[iy * self.size + ix]
    }

    pub fn max(&self) -> f64 {
        self.values.iter().copied().fold(0.0, f64::max)
    }

    pub fn cell_size(&self) -> Vec2 {
        if self.size == 0 {
            return Vec2::ZERO;
        }
        Vec2::new(
            self.rect.width / self.size as f64,
            self.rect.height / self.size as f64,
        )
    }

    pub fn cell_center(&self, ix: usize, iy: usize) -> Vec2 {
        let cell = self.cell_size();
        Vec2::new(
            self.rect.x + (ix as f64 + 0.5) * cell.x,
            self.rect.y + (iy as f64 + 0.5) * cell.y,
        )
    }

    pub fn cell_rect(&self, ix: usize, iy: usize) -> ViewRect {
        let cell = self.cell_size();
        ViewRect::new(
            self.rect.x + ix as f64 * cell.x,
            self.rect.y + iy as f64 * cell.y,
            cell.x,
            cell.y,
        )
    }

    /// Cells in row-major order.
    pub fn cells(&self) -> impl Iterator<Item = DensityCell> + '_ {
        (0..self.size * self.size).map(move |i| {
            let (ix, iy) = (i % self.size, i / self.size);
            let intensity = self.values[i];
            DensityCell {
                ix,
                iy,
                rect: self.cell_rect(ix, iy),
                intensity,
                tier: DensityTier::from_intensity(intensity),
            }
        })
    }

    /// Cells that would be drawn (tier above `None`).
    pub fn shaded_cells(&self) -> impl Iterator<Item = DensityCell> + '_ {
        self.cells().filter(|c| c.tier != DensityTier::None)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DensityLayer {
    id: LayerId,
    pub config: DensityConfig,
    pub style: LayerStyle,
}

impl DensityLayer {
    pub fn new(id: u64, config: DensityConfig) -> Self {
        Self {
            id: LayerId(id),
            config,
            style: LayerStyle::default(),
        }
    }

    pub fn extract(&self, points: &[TargetPoint], rect: ViewRect) -> DensityGrid {
        let grid = DensityGrid::compute(points, rect, self.config);
        debug!(
            points = points.len(),
            cells = grid.values.len(),
            max = grid.max(),
            "density grid recomputed"
        );
        grid
    }
}

impl Layer for DensityLayer {
    fn id(&self) -> LayerId {
        self.id
    }

    fn name(&self) -> &'static str {
        "density"
    }

    fn tracks_origin(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::{DensityConfig, DensityGrid, DensityLayer};
    use crate::symbology::DensityTier;
    use proptest::prelude::*;
    use scene::targets::TargetPoint;
    use scene::viewport::ViewRect;

    fn unit_cells() -> ViewRect {
        // 30 cells of 1 data unit: centers at 0.5, 1.5, ...
        ViewRect::new(0.0, 0.0, 30.0, 30.0)
    }

    #[test]
    fn density_follows_the_viewport_origin() {
        use crate::layer::Layer;
        let l = DensityLayer::new(2, DensityConfig::default());
        assert_eq!(l.name(), "density");
        assert!(l.tracks_origin());
    }

    #[test]
    fn point_at_cell_center_reaches_one() {
        let pts = vec![TargetPoint::new(1, 3.5, 7.5, 1.0)];
        let grid = DensityGrid::compute(&pts, unit_cells(), DensityConfig::default());
        assert_eq!(grid.values().len(), 900);
        assert_eq!(grid.value(3, 7), 1.0);
        assert!(grid.value(4, 7) < 1.0);
        assert_eq!(grid.max(), 1.0);
    }

    #[test]
    fn kernel_decays_with_absolute_distance() {
        let pts = vec![TargetPoint::new(1, 0.5, 0.5, 1.0)];
        let grid = DensityGrid::compute(&pts, unit_cells(), DensityConfig::default());
        // Cell (10, 0) is 10 units away: exp(-100 / 100).
        assert!((grid.value(10, 0) - (-1.0f64).exp()).abs() < 1e-12);

        let far = vec![TargetPoint::new(1, 10_000.0, 10_000.0, 1.0)];
        let grid = DensityGrid::compute(&far, unit_cells(), DensityConfig::default());
        assert_eq!(grid.max(), 0.0);
    }

    #[test]
    fn footprint_does_not_rescale_with_zoom() {
        let pts = vec![TargetPoint::new(1, 50.0, 50.0, 0.8)];
        let wide = DensityGrid::compute(
            &pts,
            ViewRect::new(0.0, 0.0, 120.0, 120.0),
            DensityConfig::default(),
        );
        let narrow = DensityGrid::compute(
            &pts,
            ViewRect::new(44.0, 44.0, 12.0, 12.0),
            DensityConfig::default(),
        );
        // Both grids have a cell centered at (54, 54).
        assert_eq!(wide.cell_center(13, 13).x, 54.0);
        assert!((narrow.cell_center(25, 25).x - 54.2).abs() < 1e-9);
        assert!(narrow.value(25, 25) > wide.value(13, 13));
        let expected = 0.8 * (-(2.0 * 16.0) / 100.0f64).exp();
        assert!((wide.value(13, 13) - expected).abs() < 1e-12);
    }

    #[test]
    fn overlapping_points_clamp_to_one() {
        let pts: Vec<TargetPoint> = (0..5)
            .map(|i| TargetPoint::new(i, 15.5, 15.5, 0.9))
            .collect();
        let grid = DensityGrid::compute(&pts, unit_cells(), DensityConfig::default());
        assert_eq!(grid.value(15, 15), 1.0);
        assert_eq!(
            grid.cells().find(|c| c.ix == 15 && c.iy == 15).unwrap().tier,
            DensityTier::High
        );
    }

    #[test]
    fn empty_or_degenerate_input_yields_zero_grid() {
        let layer = DensityLayer::new(2, DensityConfig::default());
        let grid = layer.extract(&[], unit_cells());
        assert_eq!(grid.values().len(), 900);
        assert_eq!(grid.max(), 0.0);
        assert_eq!(grid.shaded_cells().count(), 0);

        let pts = vec![TargetPoint::new(1, 1.0, 1.0, 1.0)];
        let grid = layer.extract(&pts, ViewRect::new(0.0, 0.0, 0.0, 0.0));
        assert_eq!(grid.max(), 0.0);
        assert_eq!(grid.value(99, 99), 0.0);
    }

    #[test]
    fn cells_tile_the_viewport() {
        let rect = ViewRect::new(10.0, 20.0, 60.0, 30.0);
        let grid = DensityGrid::compute(&[], rect, DensityConfig::default());
        let last = grid.cells().last().unwrap();
        assert_eq!((last.ix, last.iy), (29, 29));
        assert!((last.rect.x + last.rect.width - 70.0).abs() < 1e-9);
        assert!((last.rect.y + last.rect.height - 50.0).abs() < 1e-9);
    }

    proptest! {
        #[test]
        fn intensities_stay_in_unit_range(
            raw in prop::collection::vec((0.0f64..100.0, 0.0f64..100.0, 0.0f64..1.0), 0..20),
            x in -50.0f64..100.0,
            y in -50.0f64..100.0,
            w in 2.0f64..150.0,
        ) {
            let pts: Vec<TargetPoint> = raw
                .into_iter()
                .enumerate()
                .map(|(i, (px, py, p))| TargetPoint::new(i as u64, px, py, p))
                .collect();
            let rect = ViewRect::new(x, y, w, w);
            let grid = DensityGrid::compute(&pts, rect, DensityConfig::default());
            prop_assert!(grid.values().iter().all(|v| (0.0..=1.0).contains(v)));
        }
    }
}
