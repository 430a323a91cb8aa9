//! Pointer gesture state machine.
//!
//! Turns raw pointer events into pan, zoom and click actions:
//! - a primary-button press starts a drag; every move pans by the incremental
//!   pixel delta and adds `|dx| + |dy|` to the travel accumulator
//! - release or leaving the surface ends the drag
//! - a click counts only if the preceding drag travelled less than the click
//!   threshold
//! - wheel events always zoom, with the delta magnitude capped

use foundation::math::Vec2;
use tracing::trace;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum PointerButton {
    Primary,
    Middle,
    Secondary,
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub enum PointerEvent {
    Down { pos: Vec2, button: PointerButton },
    Move { pos: Vec2 },
    Up { pos: Vec2 },
    Leave,
    /// Press and release on the container, delivered after `Up`.
    Click { pos: Vec2 },
    Wheel { pos: Vec2, delta_y: f64 },
}

#[derive(Debug, Copy, Clone, PartialEq, Default)]
pub enum GestureState {
    #[default]
    Idle,
    Dragging { start: Vec2, last: Vec2 },
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub enum GestureAction {
    None,
    /// Incremental pointer delta in pixels.
    Pan { dx: f64, dy: f64 },
    Zoom { factor: f64, at: Vec2 },
    Click { pos: Vec2 },
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct GestureConfig {
    pub click_threshold_px: f64,
    pub wheel_delta_cap: f64,
    pub wheel_zoom_speed: f64,
}

impl Default for GestureConfig {
    fn default() -> Self {
        Self {
            click_threshold_px: 5.0,
            wheel_delta_cap: 100.0,
            wheel_zoom_speed: 0.001,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct GestureResolver {
    state: GestureState,
    /// Manhattan travel of the current or most recent drag.
    travel_px: f64,
    config: GestureConfig,
}

impl GestureResolver {
    pub fn new(config: GestureConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    pub fn state(&self) -> GestureState {
        self.state
    }

    pub fn travel_px(&self) -> f64 {
        self.travel_px
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.state, GestureState::Dragging { .. })
    }

    pub fn handle(&mut self, event: PointerEvent) -> GestureAction {
        match event {
            PointerEvent::Down { pos, button } => {
                if button != PointerButton::Primary || !pos.is_finite() {
                    return GestureAction::None;
                }
                self.state = GestureState::Dragging {
                    start: pos,
                    last: pos,
                };
                self.travel_px = 0.0;
                trace!(x = pos.x, y = pos.y, "drag start");
                GestureAction::None
            }
            PointerEvent::Move { pos } => {
                let GestureState::Dragging { start, last } = self.state else {
                    return GestureAction::None;
                };
                if !pos.is_finite() {
                    return GestureAction::None;
                }
                let delta = pos - last;
                self.travel_px += delta.x.abs() + delta.y.abs();
                self.state = GestureState::Dragging { start, last: pos };
                GestureAction::Pan {
                    dx: delta.x,
                    dy: delta.y,
                }
            }
            PointerEvent::Up { .. } | PointerEvent::Leave => {
                if self.is_dragging() {
                    trace!(travel_px = self.travel_px, "drag end");
                }
                self.state = GestureState::Idle;
                GestureAction::None
            }
            PointerEvent::Click { pos } => {
                if !pos.is_finite() || self.travel_px >= self.config.click_threshold_px {
                    trace!(travel_px = self.travel_px, "click suppressed after drag");
                    return GestureAction::None;
                }
                GestureAction::Click { pos }
            }
            PointerEvent::Wheel { pos, delta_y } => match self.wheel_factor(delta_y) {
                Some(factor) if pos.is_finite() => GestureAction::Zoom { factor, at: pos },
                _ => GestureAction::None,
            },
        }
    }

    /// `1 + sign * min(|delta|, cap) * speed`; `None` for a zero or
    /// non-finite delta.
    pub fn wheel_factor(&self, delta_y: f64) -> Option<f64> {
        if !delta_y.is_finite() || delta_y == 0.0 {
            return None;
        }
        let magnitude = delta_y.abs().min(self.config.wheel_delta_cap);
        Some(1.0 + delta_y.signum() * magnitude * self.config.wheel_zoom_speed)
    }
}
