use std::path::{Path, PathBuf};

use layers::cluster::ClusterConfig;
use layers::density::DensityConfig;
use scene::targets::{DATA_MAX, DATA_MIN};
use scene::viewport::ViewportLimits;
use serde::{Deserialize, Serialize};

use crate::gesture::GestureConfig;

/// Largest accepted density grid edge; the grid holds `size * size` cells.
pub const MAX_DENSITY_GRID_SIZE: usize = 512;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config json: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid {field}: {reason}")]
    Invalid {
        field: &'static str,
        reason: &'static str,
    },
}

/// Tunables for one panel. Every field is optional in JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    pub min_view_width: f64,
    pub pan_buffer_fraction: f64,
    pub snap_epsilon: f64,
    pub cluster_threshold_fraction: f64,
    pub density_grid_size: usize,
    pub density_decay: f64,
    pub click_threshold_px: f64,
    pub wheel_delta_cap: f64,
    pub wheel_zoom_speed: f64,
    pub zoom_step_in: f64,
    pub zoom_step_out: f64,
    pub drill_padding_fraction: f64,
    pub drill_min_span: f64,
    /// Most recent panel events kept in the trail.
    pub event_trail_capacity: usize,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            min_view_width: 2.0,
            pan_buffer_fraction: 0.5,
            snap_epsilon: 0.1,
            cluster_threshold_fraction: 0.08,
            density_grid_size: 30,
            density_decay: 100.0,
            click_threshold_px: 5.0,
            wheel_delta_cap: 100.0,
            wheel_zoom_speed: 0.001,
            zoom_step_in: 0.8,
            zoom_step_out: 1.25,
            drill_padding_fraction: 0.5,
            drill_min_span: 10.0,
            event_trail_capacity: 256,
        }
    }
}

impl ViewerConfig {
    pub fn from_json_str(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&raw)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        positive("min_view_width", self.min_view_width)?;
        non_negative("pan_buffer_fraction", self.pan_buffer_fraction)?;
        non_negative("snap_epsilon", self.snap_epsilon)?;
        positive("cluster_threshold_fraction", self.cluster_threshold_fraction)?;
        positive("density_decay", self.density_decay)?;
        non_negative("click_threshold_px", self.click_threshold_px)?;
        positive("wheel_delta_cap", self.wheel_delta_cap)?;
        positive("wheel_zoom_speed", self.wheel_zoom_speed)?;
        non_negative("drill_padding_fraction", self.drill_padding_fraction)?;
        positive("drill_min_span", self.drill_min_span)?;
        if self.min_view_width >= DATA_MAX - DATA_MIN {
            return Err(invalid(
                "min_view_width",
                "must be narrower than the data square",
            ));
        }
        if self.density_grid_size == 0 {
            return Err(invalid("density_grid_size", "must be at least 1"));
        }
        if self.density_grid_size > MAX_DENSITY_GRID_SIZE {
            return Err(invalid("density_grid_size", "must be at most 512"));
        }
        if self.event_trail_capacity == 0 {
            return Err(invalid("event_trail_capacity", "must be at least 1"));
        }
        if !(self.zoom_step_in > 0.0 && self.zoom_step_in < 1.0) {
            return Err(invalid("zoom_step_in", "must be in (0, 1)"));
        }
        if !(self.zoom_step_out.is_finite() && self.zoom_step_out > 1.0) {
            return Err(invalid("zoom_step_out", "must be greater than 1"));
        }
        if self.wheel_delta_cap * self.wheel_zoom_speed >= 1.0 {
            return Err(invalid(
                "wheel_zoom_speed",
                "a capped wheel tick must not invert the zoom",
            ));
        }
        Ok(())
    }

    pub fn viewport_limits(&self) -> ViewportLimits {
        ViewportLimits {
            min_width: self.min_view_width,
            pan_buffer_fraction: self.pan_buffer_fraction,
            snap_epsilon: self.snap_epsilon,
            fit_padding_fraction: self.drill_padding_fraction,
            fit_min_span: self.drill_min_span,
        }
    }

    pub fn cluster_config(&self) -> ClusterConfig {
        ClusterConfig {
            threshold_fraction: self.cluster_threshold_fraction,
        }
    }

    pub fn density_config(&self) -> DensityConfig {
        DensityConfig {
            grid_size: self.density_grid_size,
            decay: self.density_decay,
        }
    }

    pub fn gesture_config(&self) -> GestureConfig {
        GestureConfig {
            click_threshold_px: self.click_threshold_px,
            wheel_delta_cap: self.wheel_delta_cap,
            wheel_zoom_speed: self.wheel_zoom_speed,
        }
    }
}

fn invalid(field: &'static str, reason: &'static str) -> ConfigError {
    ConfigError::Invalid { field, reason }
}

fn positive(field: &'static str, v: f64) -> Result<(), ConfigError> {
    if v.is_finite() && v > 0.0 {
        Ok(())
    } else {
        Err(invalid(field, "must be finite and positive"))
    }
}

fn non_negative(field: &'static str, v: f64) -> Result<(), ConfigError> {
    if v.is_finite() && v >= 0.0 {
        Ok(())
    } else {
        Err(invalid(field, "must be finite and non-negative"))
    }
}
