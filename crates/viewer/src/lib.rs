//! One heatmap engine instance per visualization panel.
//!
//! Wires the viewport, clustering, density and selection crates together and
//! resolves raw pointer and key input into state transitions.

pub mod config;
pub mod gesture;
pub mod keys;
pub mod panel;

pub use config::{ConfigError, ViewerConfig};
pub use gesture::{GestureAction, GestureResolver, GestureState, PointerButton, PointerEvent};
pub use keys::{EditCommand, Key, KeyInput, Modifiers};
pub use panel::{ClickOutcome, HeatmapPanel};
