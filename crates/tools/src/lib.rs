//! Headless inspection helpers behind the `geoscope` binary.
//!
//! Loads an analysis result, drives a [`HeatmapPanel`] without a display and
//! renders what a viewer would show as JSON or an ASCII grid.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use catalog::analysis::{AnalysisError, FixtureAnalysisProvider, InputFile, analyze};
use catalog::store::{InMemoryTargetStore, TargetStore};
use foundation::math::Vec2;
use layers::density::DensityGrid;
use layers::symbology::LayerStyle;
use scene::targets::TargetPoint;
use scene::viewport::ViewRect;
use serde::{Deserialize, Serialize};
use viewer::panel::EVENT_DRILL_DOWN;
use viewer::{ConfigError, HeatmapPanel, Key, KeyInput, Modifiers, PointerButton, PointerEvent};

#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    Analysis(#[from] AnalysisError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("invalid json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("replay step {index}: {reason}")]
    Replay { index: usize, reason: String },
}

fn read(path: &Path) -> Result<Vec<u8>, ToolError> {
    fs::read(path).map_err(|source| ToolError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Reads an analysis result file and validates its target areas.
pub fn load_targets(path: impl AsRef<Path>) -> Result<Vec<TargetPoint>, ToolError> {
    let path = path.as_ref();
    let bytes = read(path)?;
    let raw = String::from_utf8_lossy(&bytes).into_owned();
    let provider = FixtureAnalysisProvider::from_json_str(&raw)?;
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "result.json".to_string());
    let input = InputFile::new(name, bytes);
    let targets = pollster::block_on(analyze(&provider, std::slice::from_ref(&input)))?;
    Ok(targets)
}

pub fn load_steps(path: impl AsRef<Path>) -> Result<Vec<ReplayStep>, ToolError> {
    let bytes = read(path.as_ref())?;
    Ok(serde_json::from_slice(&bytes)?)
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RectRow {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl From<ViewRect> for RectRow {
    fn from(r: ViewRect) -> Self {
        Self {
            x: r.x,
            y: r.y,
            width: r.width,
            height: r.height,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClusterRow {
    pub id: u32,
    pub x: f64,
    pub y: f64,
    pub members: Vec<u64>,
    pub max_probability: f64,
    pub mean_probability: f64,
    /// Marker text: a probability for singles, a member count for clusters.
    pub label: String,
    pub tier: &'static str,
    pub radius_px: f64,
    pub left_pct: f64,
    pub top_pct: f64,
    pub visible: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClusterReport {
    pub viewport: RectRow,
    pub threshold: f64,
    pub threshold_px: f64,
    pub clusters: Vec<ClusterRow>,
}

pub fn cluster_report<S: TargetStore>(panel: &mut HeatmapPanel<S>) -> ClusterReport {
    let projector = panel.projector();
    let rect = panel.rect();
    let threshold = panel.config().cluster_threshold_fraction * rect.width;
    let overlays = panel.overlays();
    let clusters = panel
        .clusters()
        .iter()
        .zip(&overlays)
        .map(|(c, anchor)| ClusterRow {
            id: c.id.0,
            x: c.centroid.x,
            y: c.centroid.y,
            members: c.members.iter().map(|m| m.0).collect(),
            max_probability: c.max_probability,
            mean_probability: c.mean_probability,
            label: anchor.label.clone(),
            tier: anchor.tier.as_str(),
            radius_px: anchor.radius_px,
            left_pct: anchor.left_pct,
            top_pct: anchor.top_pct,
            visible: anchor.visible,
        })
        .collect();
    ClusterReport {
        viewport: rect.into(),
        threshold,
        threshold_px: threshold / projector.data_per_px(),
        clusters,
    }
}

/// One row per grid line, top row first, one tier glyph per cell.
pub fn density_ascii(grid: &DensityGrid) -> String {
    let n = grid.size();
    let mut rows = vec![String::with_capacity(n); n];
    for cell in grid.cells() {
        rows[cell.iy].push(cell.tier.glyph());
    }
    let mut out = rows.join("\n");
    out.push('\n');
    out
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DensityCellRow {
    pub ix: usize,
    pub iy: usize,
    pub intensity: f64,
    pub tier: &'static str,
    pub rgba: [f32; 4],
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DensityReport {
    pub viewport: RectRow,
    pub size: usize,
    pub max: f64,
    /// Cells above the transparent tier, row-major.
    pub cells: Vec<DensityCellRow>,
}

/// The shaded cells of `grid` with their palette colours.
pub fn density_report(grid: &DensityGrid, style: &LayerStyle) -> DensityReport {
    let cells = grid
        .shaded_cells()
        .map(|cell| DensityCellRow {
            ix: cell.ix,
            iy: cell.iy,
            intensity: cell.intensity,
            tier: cell.tier.as_str(),
            rgba: style.palette.color(cell.tier),
        })
        .collect();
    DensityReport {
        viewport: grid.rect().into(),
        size: grid.size(),
        max: grid.max(),
        cells,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReplayButton {
    #[default]
    Primary,
    Middle,
    Secondary,
}

impl From<ReplayButton> for PointerButton {
    fn from(b: ReplayButton) -> Self {
        match b {
            ReplayButton::Primary => PointerButton::Primary,
            ReplayButton::Middle => PointerButton::Middle,
            ReplayButton::Secondary => PointerButton::Secondary,
        }
    }
}

/// A recorded input step. Coordinates are container pixels.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ReplayStep {
    Down {
        x: f64,
        y: f64,
        #[serde(default)]
        button: ReplayButton,
    },
    Move {
        x: f64,
        y: f64,
    },
    Up {
        x: f64,
        y: f64,
    },
    Leave,
    Click {
        x: f64,
        y: f64,
    },
    /// Down, up and click at the same spot.
    Tap {
        x: f64,
        y: f64,
    },
    Wheel {
        x: f64,
        y: f64,
        delta_y: f64,
    },
    /// `Enter`, `Escape`, `Backspace` or a single character.
    Key {
        key: String,
        #[serde(default)]
        ctrl: bool,
        #[serde(default)]
        meta: bool,
    },
    /// Types each character through the editor.
    Type {
        text: String,
    },
    ZoomIn,
    ZoomOut,
    Reset,
    Resize {
        width: f64,
        height: f64,
    },
    Select {
        id: u64,
    },
    Edit,
    Save,
    Cancel,
    ToggleHeatmap,
}

fn parse_key(raw: &str) -> Option<Key> {
    match raw {
        "Enter" => Some(Key::Enter),
        "Escape" => Some(Key::Escape),
        "Backspace" => Some(Key::Backspace),
        _ => {
            let mut chars = raw.chars();
            let c = chars.next()?;
            chars.next().is_none().then_some(Key::Char(c))
        }
    }
}

fn apply_step<S: TargetStore>(
    panel: &mut HeatmapPanel<S>,
    index: usize,
    step: &ReplayStep,
) -> Result<(), ToolError> {
    match step {
        ReplayStep::Down { x, y, button } => {
            panel.handle_pointer(PointerEvent::Down {
                pos: Vec2::new(*x, *y),
                button: (*button).into(),
            });
        }
        ReplayStep::Move { x, y } => {
            panel.handle_pointer(PointerEvent::Move {
                pos: Vec2::new(*x, *y),
            });
        }
        ReplayStep::Up { x, y } => {
            panel.handle_pointer(PointerEvent::Up {
                pos: Vec2::new(*x, *y),
            });
        }
        ReplayStep::Leave => {
            panel.handle_pointer(PointerEvent::Leave);
        }
        ReplayStep::Click { x, y } => {
            panel.handle_pointer(PointerEvent::Click {
                pos: Vec2::new(*x, *y),
            });
        }
        ReplayStep::Tap { x, y } => {
            let pos = Vec2::new(*x, *y);
            panel.handle_pointer(PointerEvent::Down {
                pos,
                button: PointerButton::Primary,
            });
            panel.handle_pointer(PointerEvent::Up { pos });
            panel.handle_pointer(PointerEvent::Click { pos });
        }
        ReplayStep::Wheel { x, y, delta_y } => {
            panel.handle_pointer(PointerEvent::Wheel {
                pos: Vec2::new(*x, *y),
                delta_y: *delta_y,
            });
        }
        ReplayStep::Key { key, ctrl, meta } => {
            let Some(key) = parse_key(key) else {
                return Err(ToolError::Replay {
                    index,
                    reason: format!("unknown key {key:?}"),
                });
            };
            panel.handle_key(KeyInput {
                key,
                modifiers: Modifiers {
                    ctrl: *ctrl,
                    meta: *meta,
                    ..Modifiers::NONE
                },
            });
        }
        ReplayStep::Type { text } => {
            for c in text.chars() {
                panel.handle_key(KeyInput::plain(Key::Char(c)));
            }
        }
        ReplayStep::ZoomIn => {
            panel.zoom_in();
        }
        ReplayStep::ZoomOut => {
            panel.zoom_out();
        }
        ReplayStep::Reset => {
            panel.reset_view();
        }
        ReplayStep::Resize { width, height } => {
            panel.set_container(*width, *height);
        }
        ReplayStep::Select { id } => {
            panel.select(foundation::ids::TargetId(*id));
        }
        ReplayStep::Edit => {
            panel.begin_edit();
        }
        ReplayStep::Save => {
            panel.save_edit();
        }
        ReplayStep::Cancel => {
            panel.cancel_edit();
        }
        ReplayStep::ToggleHeatmap => {
            let visible = panel.heatmap_visible();
            panel.set_heatmap_visible(!visible);
        }
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EventRow {
    pub seq: u64,
    pub kind: &'static str,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SummaryRow {
    pub count: usize,
    pub mean_probability: Option<f64>,
    pub high_confidence: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct HistogramRow {
    pub count: u64,
    pub min: i64,
    pub max: i64,
    pub mean: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReplayReport {
    pub steps: usize,
    pub summary: SummaryRow,
    pub viewport: RectRow,
    pub selection: Option<u64>,
    pub editing: bool,
    pub descriptions: BTreeMap<u64, String>,
    pub clusters: Vec<ClusterRow>,
    /// Drill-downs still in the retained event trail.
    pub drill_downs: usize,
    pub events: Vec<EventRow>,
    pub counters: BTreeMap<&'static str, u64>,
    pub histograms: BTreeMap<&'static str, HistogramRow>,
}

/// Feeds `steps` through the panel in order and reports the final state.
pub fn replay(
    panel: &mut HeatmapPanel<InMemoryTargetStore>,
    steps: &[ReplayStep],
) -> Result<ReplayReport, ToolError> {
    for (index, step) in steps.iter().enumerate() {
        apply_step(panel, index, step)?;
    }
    let clusters = cluster_report(panel).clusters;
    let selection = panel.selection().selected().map(|id| id.0);
    let descriptions = panel
        .store()
        .targets()
        .iter()
        .filter(|t| !t.description.is_empty())
        .map(|t| (t.id.0, t.description.clone()))
        .collect();
    let events = panel
        .events()
        .events()
        .iter()
        .map(|e| EventRow {
            seq: e.seq,
            kind: e.kind,
            message: e.message.clone(),
        })
        .collect();
    let snapshot = panel.metrics().snapshot();
    let counters = snapshot.counters.into_iter().collect();
    let histograms = snapshot
        .histograms
        .into_iter()
        .map(|(name, h)| {
            let row = HistogramRow {
                count: h.count,
                min: h.min,
                max: h.max,
                mean: h.mean(),
            };
            (name, row)
        })
        .collect();
    let summary = panel.summary();
    Ok(ReplayReport {
        steps: steps.len(),
        summary: SummaryRow {
            count: summary.count,
            mean_probability: summary.mean_probability,
            high_confidence: summary.high_confidence,
        },
        viewport: panel.rect().into(),
        selection,
        editing: panel.selection().is_editing(),
        descriptions,
        clusters,
        drill_downs: panel.events().of_kind(EVENT_DRILL_DOWN).count(),
        events,
        counters,
        histograms,
    })
}
