use catalog::store::{InMemoryTargetStore, StoreError, TargetStore};
use foundation::ids::TargetId;
use foundation::math::Vec2;
use pretty_assertions::assert_eq;
use runtime::metrics::names;
use scene::selection::SelectionState;
use scene::targets::{TargetPoint, TargetSet};
use scene::viewport::ContainerSize;
use viewer::{
    ClickOutcome, EditCommand, HeatmapPanel, Key, KeyInput, PointerButton, PointerEvent,
    ViewerConfig,
};

#[derive(Default)]
struct RecordingStore {
    targets: TargetSet,
    commits: Vec<(TargetId, String)>,
    fail: bool,
}

impl TargetStore for RecordingStore {
    fn targets(&self) -> &TargetSet {
        &self.targets
    }

    fn commit_description(&mut self, id: TargetId, text: &str) -> Result<(), StoreError> {
        self.commits.push((id, text.to_string()));
        if self.fail {
            return Err(StoreError::Unavailable("offline".into()));
        }
        self.targets.set_description(id, text);
        Ok(())
    }
}

fn pair() -> Vec<TargetPoint> {
    vec![
        TargetPoint::new(1, 10.0, 10.0, 0.9).with_description("old"),
        TargetPoint::new(2, 12.0, 11.0, 0.5),
    ]
}

fn square() -> ContainerSize {
    ContainerSize::new(500.0, 500.0)
}

fn zoomed_panel(step: f64) -> HeatmapPanel<InMemoryTargetStore> {
    let config = ViewerConfig {
        zoom_step_in: step,
        ..ViewerConfig::default()
    };
    let mut panel = HeatmapPanel::new(InMemoryTargetStore::new(pair()), square(), config);
    panel.zoom_in();
    panel
}

fn type_text(panel: &mut HeatmapPanel<RecordingStore>, text: &str) {
    for c in text.chars() {
        panel.handle_key(KeyInput::plain(Key::Char(c)));
    }
}

#[test]
fn nearby_pair_merges_at_width_50_and_splits_at_width_20() {
    let mut wide = zoomed_panel(0.5);
    assert_eq!(wide.rect().width, 50.0);
    let clusters = wide.clusters();
    assert_eq!(clusters.len(), 1);
    assert!(clusters[0].is_multiple());
    assert_eq!(clusters[0].members, vec![TargetId(1), TargetId(2)]);

    let mut narrow = zoomed_panel(0.2);
    assert_eq!(narrow.rect().width, 20.0);
    let clusters = narrow.clusters();
    assert_eq!(clusters.len(), 2);
    assert!(clusters.iter().all(|c| !c.is_multiple()));
}

#[test]
fn modifier_enter_commits_exactly_once() {
    let store = RecordingStore {
        targets: TargetSet::new(pair()),
        ..RecordingStore::default()
    };
    let mut panel = HeatmapPanel::with_defaults(store, square());
    assert!(panel.select(TargetId(1)));
    assert!(panel.begin_edit());
    assert!(panel.set_edit_buffer(""));
    type_text(&mut panel, "new text");

    assert_eq!(
        panel.handle_key(KeyInput::with_meta(Key::Enter)),
        Some(EditCommand::Commit)
    );
    assert_eq!(
        panel.store().commits,
        vec![(TargetId(1), "new text".to_string())]
    );
    assert_eq!(
        panel.selection().state(),
        &SelectionState::Viewing(TargetId(1))
    );

    // Not editing any more: further shortcuts are ignored.
    assert_eq!(panel.handle_key(KeyInput::with_ctrl(Key::Enter)), None);
    assert_eq!(panel.store().commits.len(), 1);
    assert_eq!(panel.metrics().counter(names::SELECTION_COMMIT), 1);
}

#[test]
fn escape_discards_the_edit() {
    let store = RecordingStore {
        targets: TargetSet::new(pair()),
        ..RecordingStore::default()
    };
    let mut panel = HeatmapPanel::with_defaults(store, square());
    panel.select(TargetId(1));
    panel.begin_edit();
    type_text(&mut panel, " draft");
    assert_eq!(panel.selection().buffer(), Some("old draft"));
    panel.handle_key(KeyInput::plain(Key::Escape));
    assert!(panel.store().commits.is_empty());
    assert_eq!(panel.selected_target().unwrap().description, "old");
    assert_eq!(
        panel.selection().state(),
        &SelectionState::Viewing(TargetId(1))
    );
}

#[test]
fn failed_commit_is_not_rolled_back() {
    let store = RecordingStore {
        targets: TargetSet::new(pair()),
        fail: true,
        ..RecordingStore::default()
    };
    let mut panel = HeatmapPanel::with_defaults(store, square());
    panel.select(TargetId(2));
    panel.begin_edit();
    panel.set_edit_buffer("attempt");
    let commit = panel.save_edit().expect("commit relayed");
    assert_eq!(commit.text, "attempt");
    assert_eq!(panel.store().commits.len(), 1);
    assert_eq!(
        panel.selection().state(),
        &SelectionState::Viewing(TargetId(2))
    );
    assert_eq!(panel.metrics().counter(names::SELECTION_COMMIT_FAILED), 1);
}

#[test]
fn zoom_out_at_base_is_a_no_op() {
    let mut panel = HeatmapPanel::with_defaults(InMemoryTargetStore::new(pair()), square());
    let base = panel.viewport().base();
    assert_eq!(panel.rect(), base);
    assert_eq!(panel.zoom_out(), base);
    assert_eq!(panel.rect(), base);

    // Zooming in and back out lands exactly on the base rectangle.
    panel.zoom_in();
    panel.zoom_out();
    assert_eq!(panel.rect(), base);
}

#[test]
fn drag_pans_and_swallows_the_click() {
    let mut panel = HeatmapPanel::with_defaults(InMemoryTargetStore::new(pair()), square());
    panel.zoom_in();
    let before = panel.rect();
    let at = Vec2::new(250.0, 250.0);
    let data_before = panel.projector().to_data(at);

    panel.handle_pointer(PointerEvent::Down {
        pos: at,
        button: PointerButton::Primary,
    });
    panel.handle_pointer(PointerEvent::Move {
        pos: Vec2::new(270.0, 240.0),
    });
    panel.handle_pointer(PointerEvent::Up {
        pos: Vec2::new(270.0, 240.0),
    });
    let outcome = panel.handle_pointer(PointerEvent::Click {
        pos: Vec2::new(270.0, 240.0),
    });
    assert_eq!(outcome, None);

    // The grabbed data point followed the pointer.
    let data_after = panel.projector().to_data(Vec2::new(270.0, 240.0));
    assert!((data_after.x - data_before.x).abs() < 1e-9);
    assert!((data_after.y - data_before.y).abs() < 1e-9);
    assert_eq!(panel.rect().width, before.width);
    assert_eq!(panel.metrics().counter(names::GESTURE_DRAG), 1);
    assert_eq!(panel.metrics().counter(names::GESTURE_CLICK), 0);
}

#[test]
fn tap_on_empty_space_clears_selection() {
    let mut panel = HeatmapPanel::with_defaults(InMemoryTargetStore::new(pair()), square());
    panel.select(TargetId(1));
    let at = Vec2::new(400.0, 400.0);
    panel.handle_pointer(PointerEvent::Down {
        pos: at,
        button: PointerButton::Primary,
    });
    panel.handle_pointer(PointerEvent::Move {
        pos: Vec2::new(401.0, 402.0),
    });
    panel.handle_pointer(PointerEvent::Up { pos: at });
    assert_eq!(
        panel.handle_pointer(PointerEvent::Click { pos: at }),
        Some(ClickOutcome::Deselected)
    );
    assert_eq!(panel.selection().selected(), None);
}

#[test]
fn wheel_zooms_about_the_cursor() {
    let mut panel = HeatmapPanel::with_defaults(InMemoryTargetStore::new(pair()), square());
    let cursor = Vec2::new(100.0, 50.0);
    let before = panel.projector().to_data(cursor);
    panel.handle_pointer(PointerEvent::Wheel {
        pos: cursor,
        delta_y: -400.0,
    });
    let rect = panel.rect();
    assert!((rect.width - 90.0).abs() < 1e-9);
    let after = panel.projector().to_data(cursor);
    assert!((after.x - before.x).abs() < 1e-9);
    assert!((after.y - before.y).abs() < 1e-9);
}

#[test]
fn drill_down_then_select_member() {
    let mut panel = HeatmapPanel::with_defaults(InMemoryTargetStore::new(pair()), square());
    let centroid = panel.projector().to_screen(Vec2::new(11.0, 10.5));
    let outcome = panel.handle_pointer(PointerEvent::Click { pos: centroid });
    assert!(matches!(outcome, Some(ClickOutcome::DrilledDown { .. })));

    // At width 10 the threshold is 0.8, so the members separate.
    assert_eq!(panel.clusters().len(), 2);
    let first = panel.projector().to_screen(Vec2::new(10.0, 10.0));
    assert_eq!(
        panel.handle_pointer(PointerEvent::Click { pos: first }),
        Some(ClickOutcome::Selected(TargetId(1)))
    );
    let tooltip = panel.tooltip().expect("tooltip for selection");
    assert_eq!(tooltip.probability_label, "90%");
    assert!(tooltip.visible);
}
