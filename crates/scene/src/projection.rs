use foundation::math::Vec2;

use crate::viewport::{ContainerSize, ViewRect, base_rect};

/// Data space <-> device pixel mapping for one viewport and container.
///
/// `pixel = (data - origin) / extent * container`. Pixel y grows downward,
/// matching data y.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ScreenProjector {
    rect: ViewRect,
    container: ContainerSize,
}

impl ScreenProjector {
    /// A degenerate `rect` is replaced by the container's base rectangle so
    /// the mapping never divides by zero.
    pub fn new(rect: ViewRect, container: ContainerSize) -> Self {
        let rect = if rect.is_valid() {
            rect
        } else {
            base_rect(container)
        };
        Self { rect, container }
    }

    pub fn rect(&self) -> ViewRect {
        self.rect
    }

    pub fn container(&self) -> ContainerSize {
        self.container
    }

    pub fn to_screen(&self, data: Vec2) -> Vec2 {
        Vec2::new(
            (data.x - self.rect.x) / self.rect.width * self.container.width,
            (data.y - self.rect.y) / self.rect.height * self.container.height,
        )
    }

    pub fn to_data(&self, pixel: Vec2) -> Vec2 {
        Vec2::new(
            self.rect.x + pixel.x / self.container.width * self.rect.width,
            self.rect.y + pixel.y / self.container.height * self.rect.height,
        )
    }

    /// Position as a percentage of the container, for overlay placement.
    pub fn to_percent(&self, data: Vec2) -> [f64; 2] {
        [
            (data.x - self.rect.x) / self.rect.width * 100.0,
            (data.y - self.rect.y) / self.rect.height * 100.0,
        ]
    }

    /// Data units covered by one pixel along x.
    pub fn data_per_px(&self) -> f64 {
        self.rect.width / self.container.width
    }
}
