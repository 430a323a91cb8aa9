//! The engine instance behind one heatmap panel.
//!
//! Owns the viewport, gesture and selection state for a single view, and
//! memoizes the derived cluster set and density grid on exactly the inputs
//! they depend on: the point-set revision plus the viewport width (clusters)
//! or the full viewport rectangle (density).

use catalog::store::{InMemoryTargetStore, TargetStore};
use compute::analysis::TargetSummary;
use compute::memo::{Memo, MemoStatus};
use foundation::ids::{ClusterId, TargetId};
use foundation::math::Vec2;
use foundation::math::precision::StableF64;
use layers::cluster::{Cluster, ClusterLayer};
use layers::density::{DensityGrid, DensityLayer};
use layers::layer::Layer;
use layers::symbology::LayerStyle;
use layers::overlay::{OverlayAnchor, TooltipAnchor, layout_overlays, marker_radius_px, tooltip_for};
use runtime::event_bus::EventBus;
use runtime::metrics::{Metrics, names};
use scene::picking::{PickItem, pick_screen};
use scene::projection::ScreenProjector;
use scene::selection::{DescriptionCommit, Selection};
use scene::targets::TargetPoint;
use scene::viewport::{ContainerSize, ViewRect, Viewport};
use tracing::{debug, warn};

use crate::config::ViewerConfig;
use crate::gesture::{GestureAction, GestureResolver, PointerEvent};
use crate::keys::{EditCommand, KeyInput, apply_to_buffer, edit_command};

pub const EVENT_VIEWPORT: &str = "viewport";
pub const EVENT_CONTAINER: &str = "container";
pub const EVENT_SELECTION: &str = "selection";
pub const EVENT_DRILL_DOWN: &str = "drill_down";
pub const EVENT_COMMIT: &str = "commit";

const CLUSTER_LAYER_ID: u64 = 1;
const DENSITY_LAYER_ID: u64 = 2;

/// What a qualifying click did.
#[derive(Debug, Clone, PartialEq)]
pub enum ClickOutcome {
    Selected(TargetId),
    DrilledDown { cluster: ClusterId, rect: ViewRect },
    Deselected,
}

type LayerKey = (u64, [StableF64; 4]);

/// Memo key of a layer: the point-set revision plus the viewport terms the
/// layer depends on. Layers that ignore the origin are not invalidated by pans.
fn layer_key(layer: &impl Layer, revision: u64, rect: ViewRect) -> LayerKey {
    let (x, y) = if layer.tracks_origin() {
        (rect.x, rect.y)
    } else {
        (0.0, 0.0)
    };
    (
        revision,
        [
            StableF64(x),
            StableF64(y),
            StableF64(rect.width),
            StableF64(rect.height),
        ],
    )
}

pub struct HeatmapPanel<S> {
    store: S,
    config: ViewerConfig,
    viewport: Viewport,
    gestures: GestureResolver,
    selection: Selection,
    cluster_layer: ClusterLayer,
    density_layer: DensityLayer,
    clusters: Memo<LayerKey, Vec<Cluster>>,
    density: Memo<LayerKey, DensityGrid>,
    events: EventBus,
    metrics: Metrics,
    seen_revision: u64,
}

impl<S: TargetStore> HeatmapPanel<S> {
    pub fn new(store: S, container: ContainerSize, config: ViewerConfig) -> Self {
        let seen_revision = store.targets().revision();
        Self {
            viewport: Viewport::new(container, config.viewport_limits()),
            gestures: GestureResolver::new(config.gesture_config()),
            selection: Selection::new(),
            cluster_layer: ClusterLayer::new(CLUSTER_LAYER_ID, config.cluster_config()),
            density_layer: DensityLayer::new(DENSITY_LAYER_ID, config.density_config()),
            clusters: Memo::new(),
            density: Memo::new(),
            events: EventBus::bounded(config.event_trail_capacity),
            metrics: Metrics::new(),
            seen_revision,
            store,
            config,
        }
    }

    pub fn with_defaults(store: S, container: ContainerSize) -> Self {
        Self::new(store, container, ViewerConfig::default())
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Mutable access to the point-set owner. A replaced point set is picked
    /// up (and a stale selection cleared) on the next read.
    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    pub fn config(&self) -> &ViewerConfig {
        &self.config
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn rect(&self) -> ViewRect {
        self.viewport.rect()
    }

    pub fn projector(&self) -> ScreenProjector {
        ScreenProjector::new(self.viewport.rect(), self.viewport.container())
    }

    /// Raw selection state. It may still name a removed target until the next
    /// mutating call or target read picks up a replaced point set.
    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    pub fn summary(&self) -> TargetSummary {
        TargetSummary::of(self.store.targets().points())
    }

    // Viewport

    /// Applies a container resize; the viewport resets to the new base
    /// rectangle only if the size actually changed.
    pub fn set_container(&mut self, width: f64, height: f64) -> bool {
        let container = ContainerSize::new(width, height);
        if !self.viewport.set_container(container) {
            return false;
        }
        self.events.emit(
            EVENT_CONTAINER,
            format!("{}x{}", container.width, container.height),
        );
        true
    }

    pub fn zoom_in(&mut self) -> ViewRect {
        let rect = self.viewport.zoom_by_step(self.config.zoom_step_in);
        self.note_viewport("zoom_in");
        rect
    }

    pub fn zoom_out(&mut self) -> ViewRect {
        let rect = self.viewport.zoom_by_step(self.config.zoom_step_out);
        self.note_viewport("zoom_out");
        rect
    }

    pub fn reset_view(&mut self) -> ViewRect {
        let rect = self.viewport.reset();
        self.note_viewport("reset");
        rect
    }

    fn note_viewport(&mut self, cause: &str) {
        let r = self.viewport.rect();
        self.events.emit(
            EVENT_VIEWPORT,
            format!(
                "{cause} x={:.3} y={:.3} w={:.3} h={:.3}",
                r.x, r.y, r.width, r.height
            ),
        );
    }

    // Input

    /// Feeds one pointer event through the gesture resolver and applies the
    /// resulting action. Returns what a qualifying click did.
    pub fn handle_pointer(&mut self, event: PointerEvent) -> Option<ClickOutcome> {
        let was_dragging = self.gestures.is_dragging();
        match self.gestures.handle(event) {
            GestureAction::None => {
                if was_dragging && !self.gestures.is_dragging() {
                    self.finish_drag();
                }
                None
            }
            GestureAction::Pan { dx, dy } => {
                self.viewport.pan_by(dx, dy);
                None
            }
            GestureAction::Zoom { factor, at } => {
                self.viewport.zoom_at(factor, at);
                self.metrics.incr(names::GESTURE_WHEEL);
                self.note_viewport("wheel");
                None
            }
            GestureAction::Click { pos } => {
                self.metrics.incr(names::GESTURE_CLICK);
                Some(self.click_at(pos))
            }
        }
    }

    fn finish_drag(&mut self) {
        let travel = self.gestures.travel_px();
        self.metrics
            .record_histogram(names::DRAG_DISTANCE_PX, travel.round() as i64);
        if travel >= self.config.click_threshold_px {
            self.metrics.incr(names::GESTURE_DRAG);
        }
        if travel > 0.0 {
            self.note_viewport("pan");
        }
    }

    /// Resolves a click at `pos` (pixels): a single-target marker selects its
    /// target, a multi-member cluster drills down, empty space deselects.
    pub fn click_at(&mut self, pos: Vec2) -> ClickOutcome {
        let projector = self.projector();
        let hit = {
            let clusters = self.clusters();
            let items: Vec<PickItem<usize>> = clusters
                .iter()
                .enumerate()
                .map(|(i, c)| PickItem {
                    key: i,
                    center_px: projector.to_screen(c.centroid),
                    radius_px: marker_radius_px(c),
                })
                .collect();
            pick_screen(&items, pos).and_then(|h| clusters.get(h.key).cloned())
        };

        let Some(cluster) = hit else {
            if self.selection.deselect() {
                self.events.emit(EVENT_SELECTION, "cleared");
            }
            return ClickOutcome::Deselected;
        };

        match cluster.members.as_slice() {
            [single] => {
                self.select(*single);
                ClickOutcome::Selected(*single)
            }
            _ => {
                let rect = self.viewport.zoom_to_bounds(cluster.bounds);
                debug!(cluster = cluster.id.0, members = cluster.len(), "drill-down");
                self.events.emit(
                    EVENT_DRILL_DOWN,
                    format!(
                        "cluster={} members={} w={:.3}",
                        cluster.id.0,
                        cluster.len(),
                        rect.width
                    ),
                );
                ClickOutcome::DrilledDown {
                    cluster: cluster.id,
                    rect,
                }
            }
        }
    }

    /// Handles a key press while the description editor is open.
    pub fn handle_key(&mut self, input: KeyInput) -> Option<EditCommand> {
        self.sync_store();
        if !self.selection.is_editing() {
            return None;
        }
        let command = edit_command(input)?;
        match command {
            EditCommand::Commit => {
                self.save_edit();
            }
            EditCommand::Cancel => {
                self.cancel_edit();
            }
            edit => {
                if let Some(buffer) = self.selection.buffer_mut() {
                    apply_to_buffer(buffer, edit);
                }
            }
        }
        Some(command)
    }

    // Derived layers

    pub fn clusters(&mut self) -> &[Cluster] {
        self.sync_store();
        let rect = self.viewport.rect();
        let width = rect.width;
        let key = layer_key(&self.cluster_layer, self.store.targets().revision(), rect);
        let (clusters, status) = self.clusters.get_or_compute(key, || {
            self.cluster_layer
                .extract(self.store.targets().points(), width)
        });
        match status {
            MemoStatus::Hit => self.metrics.incr(names::CLUSTERS_MEMO_HIT),
            MemoStatus::Computed => {
                debug!(
                    layer = %self.cluster_layer.id(),
                    name = self.cluster_layer.name(),
                    width,
                    "layer refreshed"
                );
                self.metrics.incr(names::CLUSTERS_RECOMPUTE);
                self.metrics
                    .set_gauge(names::CLUSTERS_COUNT, clusters.len() as i64);
            }
        }
        clusters
    }

    pub fn density(&mut self) -> &DensityGrid {
        self.sync_store();
        let rect = self.viewport.rect();
        let key = layer_key(&self.density_layer, self.store.targets().revision(), rect);
        let (grid, status) = self.density.get_or_compute(key, || {
            self.density_layer
                .extract(self.store.targets().points(), rect)
        });
        match status {
            MemoStatus::Hit => self.metrics.incr(names::DENSITY_MEMO_HIT),
            MemoStatus::Computed => {
                debug!(
                    layer = %self.density_layer.id(),
                    name = self.density_layer.name(),
                    "layer refreshed"
                );
                self.metrics.incr(names::DENSITY_RECOMPUTE);
            }
        }
        grid
    }

    /// The density grid, or `None` while the heatmap is hidden.
    pub fn visible_density(&mut self) -> Option<&DensityGrid> {
        if !self.density_layer.style.visible {
            return None;
        }
        Some(self.density())
    }

    pub fn heatmap_style(&self) -> LayerStyle {
        self.density_layer.style
    }

    pub fn heatmap_visible(&self) -> bool {
        self.density_layer.style.visible
    }

    pub fn set_heatmap_visible(&mut self, visible: bool) {
        self.density_layer.style.visible = visible;
    }

    pub fn overlays(&mut self) -> Vec<OverlayAnchor> {
        let projector = self.projector();
        layout_overlays(self.clusters(), &projector)
    }

    pub fn tooltip(&mut self) -> Option<TooltipAnchor> {
        let projector = self.projector();
        tooltip_for(self.selected_target()?, &projector)
    }

    // Selection

    /// The selected target, looked up in the current point set.
    pub fn selected_target(&mut self) -> Option<&TargetPoint> {
        self.sync_store();
        let id = self.selection.selected()?;
        self.store.targets().get(id)
    }

    /// Selects `id` if it exists in the point set.
    pub fn select(&mut self, id: TargetId) -> bool {
        self.sync_store();
        if !self.store.targets().contains(id) {
            return false;
        }
        if !self.selection.select(id) {
            return false;
        }
        self.events.emit(EVENT_SELECTION, format!("viewing {id}"));
        true
    }

    pub fn deselect(&mut self) -> bool {
        self.sync_store();
        let changed = self.selection.deselect();
        if changed {
            self.events.emit(EVENT_SELECTION, "cleared");
        }
        changed
    }

    /// Opens the editor seeded with the selected target's description.
    pub fn begin_edit(&mut self) -> bool {
        self.sync_store();
        let Some(id) = self.selection.selected() else {
            return false;
        };
        let Some(target) = self.store.targets().get(id) else {
            return false;
        };
        if !self.selection.begin_edit(&target.description) {
            return false;
        }
        self.events.emit(EVENT_SELECTION, format!("editing {id}"));
        true
    }

    pub fn set_edit_buffer(&mut self, text: impl Into<String>) -> bool {
        self.sync_store();
        self.selection.set_buffer(text)
    }

    /// Leaves the editor and relays the buffer to the store.
    ///
    /// The relay is fire-and-forget: a store error is logged and counted, and
    /// the selection still returns to viewing.
    pub fn save_edit(&mut self) -> Option<DescriptionCommit> {
        self.sync_store();
        let commit = self.selection.save()?;
        match self.store.commit_description(commit.id, &commit.text) {
            Ok(()) => {
                self.metrics.incr(names::SELECTION_COMMIT);
                self.events.emit(EVENT_COMMIT, format!("{}", commit.id));
            }
            Err(err) => {
                warn!(target_id = commit.id.0, %err, "description commit failed");
                self.metrics.incr(names::SELECTION_COMMIT_FAILED);
            }
        }
        Some(commit)
    }

    pub fn cancel_edit(&mut self) -> bool {
        self.sync_store();
        let changed = self.selection.cancel();
        if changed {
            self.events.emit(EVENT_SELECTION, "edit cancelled");
        }
        changed
    }

    fn sync_store(&mut self) {
        let revision = self.store.targets().revision();
        if revision == self.seen_revision {
            return;
        }
        self.seen_revision = revision;
        if self.selection.clear_if_stale(self.store.targets()) {
            debug!(revision, "selected target no longer present, selection cleared");
            self.events.emit(EVENT_SELECTION, "cleared: target removed");
        }
    }
}

impl HeatmapPanel<InMemoryTargetStore> {
    /// Replaces the point set. Derived layers recompute on next read.
    pub fn set_targets(&mut self, points: Vec<TargetPoint>) {
        self.store.replace(points);
        self.sync_store();
    }
}
