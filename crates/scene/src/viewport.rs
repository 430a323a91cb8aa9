//! Viewport model over the normalized `0..=100` data space.
//!
//! The viewport is a rectangle in data units whose aspect ratio tracks the
//! container's pixel aspect ratio. All operations degrade to the base
//! rectangle rather than producing NaN or inverted extents.

use foundation::bounds::Aabb2;
use foundation::math::Vec2;
use foundation::math::precision::approx_eq;
use tracing::{debug, warn};

use crate::targets::{DATA_MAX, DATA_MIN};

/// Container dimensions in device pixels. Always finite and positive.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ContainerSize {
    pub width: f64,
    pub height: f64,
}

impl ContainerSize {
    /// Non-finite or non-positive dimensions are replaced by 1 px.
    pub fn new(width: f64, height: f64) -> Self {
        let sanitized = Self {
            width: sanitize_px(width),
            height: sanitize_px(height),
        };
        if sanitized.width != width || sanitized.height != height {
            warn!(width, height, "invalid container size, clamped to 1px");
        }
        sanitized
    }

    pub fn aspect(&self) -> f64 {
        self.width / self.height
    }

    pub fn center(&self) -> Vec2 {
        Vec2::new(self.width * 0.5, self.height * 0.5)
    }
}

fn sanitize_px(v: f64) -> f64 {
    if v.is_finite() && v > 0.0 { v } else { 1.0 }
}

/// Visible window into data space: origin plus extent.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ViewRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl ViewRect {
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn centered(center: Vec2, width: f64, height: f64) -> Self {
        Self::new(
            center.x - width * 0.5,
            center.y - height * 0.5,
            width,
            height,
        )
    }

    /// Finite origin and strictly positive finite extent.
    pub fn is_valid(&self) -> bool {
        self.x.is_finite()
            && self.y.is_finite()
            && self.width.is_finite()
            && self.height.is_finite()
            && self.width > 0.0
            && self.height > 0.0
    }

    pub fn center(&self) -> Vec2 {
        Vec2::new(self.x + self.width * 0.5, self.y + self.height * 0.5)
    }

    pub fn approx_eq(&self, other: &ViewRect, eps: f64) -> bool {
        approx_eq(self.x, other.x, eps)
            && approx_eq(self.y, other.y, eps)
            && approx_eq(self.width, other.width, eps)
            && approx_eq(self.height, other.height, eps)
    }
}

/// Clamping rules shared by every viewport mutation.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ViewportLimits {
    /// Narrowest allowed viewport width (data units).
    pub min_width: f64,
    /// Pan/zoom origin bounds: base rectangle grown by this fraction of its
    /// own extent on each side.
    pub pan_buffer_fraction: f64,
    /// A zoom result this close to the base width snaps to the base rectangle.
    pub snap_epsilon: f64,
    /// Drill-down padding as a fraction of the member span.
    pub fit_padding_fraction: f64,
    /// Smallest span a drill-down will fit to (data units).
    pub fit_min_span: f64,
}

impl Default for ViewportLimits {
    fn default() -> Self {
        Self {
            min_width: 2.0,
            pan_buffer_fraction: 0.5,
            snap_epsilon: 0.1,
            fit_padding_fraction: 0.5,
            fit_min_span: 10.0,
        }
    }
}

/// Smallest rectangle with the container's aspect ratio that contains the
/// whole data square, centered on the middle of the square.
pub fn base_rect(container: ContainerSize) -> ViewRect {
    let side = DATA_MAX - DATA_MIN;
    let aspect = container.aspect();
    let (width, height) = if aspect >= 1.0 {
        (side * aspect, side)
    } else {
        (side, side / aspect)
    };
    let mid = (DATA_MIN + DATA_MAX) * 0.5;
    ViewRect::centered(Vec2::new(mid, mid), width, height)
}

/// Base rectangle grown by `fraction` of its extent on every side.
pub fn buffered_bounds(base: ViewRect, fraction: f64) -> Aabb2 {
    let pad_x = base.width * fraction;
    let pad_y = base.height * fraction;
    Aabb2::new(
        [base.x - pad_x, base.y - pad_y],
        [base.x + base.width + pad_x, base.y + base.height + pad_y],
    )
}

/// Rectangle centered on `bounds` that fits it with padding, never smaller
/// than `min_span`, with one axis stretched to match `aspect`.
pub fn fit_rect(bounds: Aabb2, aspect: f64, padding_fraction: f64, min_span: f64) -> ViewRect {
    let pad = 1.0 + padding_fraction;
    let span = (bounds.width() * pad)
        .max(bounds.height() * pad)
        .max(min_span);
    let aspect = if aspect.is_finite() && aspect > 0.0 {
        aspect
    } else {
        1.0
    };
    let (width, height) = if aspect >= 1.0 {
        (span * aspect, span)
    } else {
        (span, span / aspect)
    };
    ViewRect::centered(bounds.center(), width, height)
}

fn clamp_axis(origin: f64, extent: f64, lo: f64, hi: f64) -> f64 {
    let max_origin = hi - extent;
    if max_origin < lo {
        return lo;
    }
    origin.max(lo).min(max_origin)
}

fn clamp_origin(rect: ViewRect, bounds: Aabb2) -> ViewRect {
    ViewRect {
        x: clamp_axis(rect.x, rect.width, bounds.min[0], bounds.max[0]),
        y: clamp_axis(rect.y, rect.height, bounds.min[1], bounds.max[1]),
        ..rect
    }
}

/// The live pan/zoom state of one visualization panel.
#[derive(Debug, Clone, PartialEq)]
pub struct Viewport {
    rect: ViewRect,
    base: ViewRect,
    container: ContainerSize,
    limits: ViewportLimits,
}

impl Viewport {
    pub fn new(container: ContainerSize, limits: ViewportLimits) -> Self {
        let base = base_rect(container);
        Self {
            rect: base,
            base,
            container,
            limits,
        }
    }

    /// Current rectangle; falls back to the base rectangle if it degenerated.
    pub fn rect(&self) -> ViewRect {
        if self.rect.is_valid() {
            self.rect
        } else {
            self.base
        }
    }

    pub fn base(&self) -> ViewRect {
        self.base
    }

    pub fn container(&self) -> ContainerSize {
        self.container
    }

    pub fn limits(&self) -> ViewportLimits {
        self.limits
    }

    pub fn is_at_base(&self) -> bool {
        self.rect() == self.base
    }

    /// Applies a container resize.
    ///
    /// The base rectangle is recomputed and the live rectangle reset to it.
    /// Returns `false` (and changes nothing) if the size is unchanged.
    pub fn set_container(&mut self, container: ContainerSize) -> bool {
        if container == self.container {
            return false;
        }
        self.container = container;
        self.base = base_rect(container);
        self.rect = self.base;
        debug!(
            width = container.width,
            height = container.height,
            "container resized, viewport reset to base"
        );
        true
    }

    /// Zooms by `factor` keeping the data point under `pixel` fixed.
    ///
    /// `factor < 1` zooms in. The width is clamped to `[min_width, base.width]`,
    /// the origin to the buffered bounds, and a result within `snap_epsilon`
    /// of the base width becomes the base rectangle exactly.
    pub fn zoom_at(&mut self, factor: f64, pixel: Vec2) -> ViewRect {
        if !factor.is_finite() || factor <= 0.0 || !pixel.is_finite() {
            warn!(factor, "ignoring invalid zoom request");
            return self.rect();
        }

        let rect = self.rect();
        let anchor = Vec2::new(
            pixel.x / self.container.width,
            pixel.y / self.container.height,
        );
        let focus = Vec2::new(
            rect.x + anchor.x * rect.width,
            rect.y + anchor.y * rect.height,
        );

        let scaled = rect.width * factor;
        let width = scaled.max(self.limits.min_width).min(self.base.width);
        let height = if width == scaled {
            rect.height * factor
        } else {
            width * rect.height / rect.width
        };

        if approx_eq(width, self.base.width, self.limits.snap_epsilon) {
            self.rect = self.base;
            return self.rect;
        }

        let next = ViewRect::new(
            focus.x - anchor.x * width,
            focus.y - anchor.y * height,
            width,
            height,
        );
        self.rect = clamp_origin(
            next,
            buffered_bounds(self.base, self.limits.pan_buffer_fraction),
        );
        self.rect
    }

    /// Zooms about the rectangle's own center.
    ///
    /// Zooming out at the base width returns the base rectangle, and zooming
    /// in at the width floor leaves the rectangle unchanged.
    pub fn zoom_by_step(&mut self, factor: f64) -> ViewRect {
        if !factor.is_finite() || factor <= 0.0 || factor == 1.0 {
            return self.rect();
        }
        let rect = self.rect();
        if factor > 1.0 && rect.width >= self.base.width - self.limits.snap_epsilon {
            self.rect = self.base;
            return self.rect;
        }
        if factor < 1.0 && rect.width <= self.limits.min_width {
            return rect;
        }
        self.zoom_at(factor, self.container.center())
    }

    /// Translates the rectangle so content follows a pointer moved by
    /// `(dx, dy)` pixels.
    ///
    /// No bounds clamping is applied here; the next zoom re-clamps the origin.
    pub fn pan_by(&mut self, dx: f64, dy: f64) -> ViewRect {
        if !dx.is_finite() || !dy.is_finite() {
            return self.rect();
        }
        let rect = self.rect();
        self.rect = ViewRect {
            x: rect.x - dx * rect.width / self.container.width,
            y: rect.y - dy * rect.height / self.container.height,
            ..rect
        };
        self.rect
    }

    pub fn reset(&mut self) -> ViewRect {
        self.rect = self.base;
        self.rect
    }

    /// Fits the viewport to `bounds` (cluster drill-down).
    pub fn zoom_to_bounds(&mut self, bounds: Aabb2) -> ViewRect {
        let fitted = fit_rect(
            bounds,
            self.container.aspect(),
            self.limits.fit_padding_fraction,
            self.limits.fit_min_span,
        );
        if !fitted.is_valid() {
            warn!("drill-down bounds are not finite, keeping viewport");
            return self.rect();
        }

        let width = fitted.width.max(self.limits.min_width).min(self.base.width);
        let height = width * fitted.height / fitted.width;
        if approx_eq(width, self.base.width, self.limits.snap_epsilon) {
            self.rect = self.base;
            return self.rect;
        }

        let next = ViewRect::centered(fitted.center(), width, height);
        self.rect = clamp_origin(
            next,
            buffered_bounds(self.base, self.limits.pan_buffer_fraction),
        );
        debug!(
            x = self.rect.x,
            y = self.rect.y,
            width = self.rect.width,
            "viewport fitted to bounds"
        );
        self.rect
    }
}

#[cfg(test)]
mod tests {
    use super::{ContainerSize, ViewRect, Viewport, ViewportLimits, base_rect, fit_rect};
    use foundation::bounds::Aabb2;
    use foundation::math::Vec2;
    use proptest::prelude::*;

    const EPS: f64 = 1e-9;

    fn landscape() -> Viewport {
        Viewport::new(ContainerSize::new(800.0, 600.0), ViewportLimits::default())
    }

    fn data_under(vp: &Viewport, pixel: Vec2) -> Vec2 {
        let r = vp.rect();
        let c = vp.container();
        Vec2::new(
            r.x + pixel.x / c.width * r.width,
            r.y + pixel.y / c.height * r.height,
        )
    }

    #[test]
    fn base_rect_contains_square_with_container_aspect() {
        let wide = base_rect(ContainerSize::new(800.0, 600.0));
        assert!(wide.approx_eq(&ViewRect::new(-50.0 / 3.0, 0.0, 400.0 / 3.0, 100.0), EPS));

        let tall = base_rect(ContainerSize::new(600.0, 800.0));
        assert!(tall.approx_eq(&ViewRect::new(0.0, -50.0 / 3.0, 100.0, 400.0 / 3.0), EPS));

        let square = base_rect(ContainerSize::new(500.0, 500.0));
        assert_eq!(square, ViewRect::new(0.0, 0.0, 100.0, 100.0));
    }

    #[test]
    fn invalid_container_falls_back_to_one_pixel() {
        let c = ContainerSize::new(0.0, f64::NAN);
        assert_eq!(c, ContainerSize::new(1.0, 1.0));
        assert_eq!(base_rect(c), ViewRect::new(0.0, 0.0, 100.0, 100.0));
    }

    #[test]
    fn zoom_out_at_base_is_noop() {
        let mut vp = landscape();
        let base = vp.base();
        assert_eq!(vp.zoom_by_step(1.25), base);
        assert_eq!(vp.zoom_at(2.0, Vec2::new(10.0, 10.0)), base);
        assert!(vp.is_at_base());
    }

    #[test]
    fn zoom_in_stops_at_min_width() {
        let mut vp = landscape();
        for _ in 0..100 {
            vp.zoom_by_step(0.5);
        }
        let r = vp.rect();
        assert_eq!(r.width, 2.0);
        assert!((r.width / r.height - 800.0 / 600.0).abs() < 1e-9);

        let before = vp.rect();
        assert_eq!(vp.zoom_by_step(0.8), before);
    }

    #[test]
    fn zoom_at_keeps_cursor_point_fixed() {
        let mut vp = landscape();
        let cursor = Vec2::new(200.0, 150.0);
        let before = data_under(&vp, cursor);
        vp.zoom_at(0.5, cursor);
        let after = data_under(&vp, cursor);
        assert!((before.x - after.x).abs() < EPS);
        assert!((before.y - after.y).abs() < EPS);
    }

    #[test]
    fn zoom_near_base_width_snaps_exactly() {
        let mut vp = Viewport::new(ContainerSize::new(500.0, 500.0), ViewportLimits::default());
        vp.zoom_at(0.5, Vec2::new(100.0, 400.0));
        assert_eq!(vp.rect().width, 50.0);
        vp.zoom_at(1.999, Vec2::new(100.0, 400.0));
        assert_eq!(vp.rect(), vp.base());
    }

    #[test]
    fn zoom_clamps_origin_to_buffered_bounds() {
        let mut vp = Viewport::new(ContainerSize::new(500.0, 500.0), ViewportLimits::default());
        vp.zoom_at(0.1, Vec2::new(0.0, 0.0));
        // Drag far away: pan itself never clamps.
        vp.pan_by(-100_000.0, -100_000.0);
        assert!(vp.rect().x > 150.0);
        // The next zoom settles the origin inside [-50, 150 - width].
        vp.zoom_at(1.0, Vec2::new(250.0, 250.0));
        let r = vp.rect();
        assert!((r.x - (150.0 - r.width)).abs() < EPS);
        assert!((r.y - (150.0 - r.height)).abs() < EPS);
    }

    #[test]
    fn pan_scales_pixels_to_data_units() {
        let mut vp = Viewport::new(ContainerSize::new(500.0, 500.0), ViewportLimits::default());
        vp.pan_by(50.0, -25.0);
        assert_eq!(vp.rect(), ViewRect::new(-10.0, 5.0, 100.0, 100.0));
    }

    #[test]
    fn resize_resets_to_new_base() {
        let mut vp = landscape();
        vp.zoom_at(0.5, Vec2::new(10.0, 10.0));
        assert!(!vp.set_container(ContainerSize::new(800.0, 600.0)));
        assert!(!vp.is_at_base());

        assert!(vp.set_container(ContainerSize::new(600.0, 800.0)));
        assert!(vp.is_at_base());
        assert_eq!(vp.rect().width, 100.0);
    }

    #[test]
    fn fit_rect_uses_padding_floor_and_aspect() {
        let b = Aabb2::new([10.0, 10.0], [12.0, 11.0]);
        let r = fit_rect(b, 1.0, 0.5, 10.0);
        assert_eq!(r, ViewRect::new(6.0, 5.5, 10.0, 10.0));

        let wide = Aabb2::new([20.0, 40.0], [60.0, 50.0]);
        let r = fit_rect(wide, 2.0, 0.5, 10.0);
        assert_eq!(r.height, 60.0);
        assert_eq!(r.width, 120.0);
        assert_eq!(r.center(), Vec2::new(40.0, 45.0));
    }

    #[test]
    fn zoom_to_bounds_caps_at_base_width() {
        let mut vp = Viewport::new(ContainerSize::new(500.0, 500.0), ViewportLimits::default());
        let r = vp.zoom_to_bounds(Aabb2::new([30.0, 30.0], [34.0, 32.0]));
        assert_eq!(r, ViewRect::new(27.0, 26.0, 10.0, 10.0));

        let r = vp.zoom_to_bounds(Aabb2::new([0.0, 0.0], [100.0, 100.0]));
        assert_eq!(r, vp.base());
    }

    #[test]
    fn degenerate_zoom_input_is_ignored() {
        let mut vp = landscape();
        let before = vp.rect();
        assert_eq!(vp.zoom_at(f64::NAN, Vec2::new(1.0, 1.0)), before);
        assert_eq!(vp.zoom_at(0.0, Vec2::new(1.0, 1.0)), before);
        assert_eq!(vp.pan_by(f64::INFINITY, 0.0), before);
    }

    proptest! {
        #[test]
        fn zoom_then_inverse_restores_rect(
            factor in 0.6f64..0.95,
            px in 0.0f64..800.0,
            py in 0.0f64..600.0,
        ) {
            let mut vp = landscape();
            vp.zoom_at(0.5, Vec2::new(400.0, 300.0));
            let start = vp.rect();

            vp.zoom_at(factor, Vec2::new(px, py));
            vp.zoom_at(1.0 / factor, Vec2::new(px, py));
            prop_assert!(vp.rect().approx_eq(&start, 1e-6));
        }

        #[test]
        fn pan_keeps_grabbed_point_under_cursor(
            px in 0.0f64..800.0,
            py in 0.0f64..600.0,
            dx in -400.0f64..400.0,
            dy in -300.0f64..300.0,
        ) {
            let mut vp = landscape();
            vp.zoom_at(0.3, Vec2::new(123.0, 456.0));
            let grabbed = data_under(&vp, Vec2::new(px, py));
            vp.pan_by(dx, dy);
            let now = data_under(&vp, Vec2::new(px + dx, py + dy));
            prop_assert!((grabbed.x - now.x).abs() < 1e-9);
            prop_assert!((grabbed.y - now.y).abs() < 1e-9);
        }
    }
}
