use foundation::ids::TargetId;
use tracing::trace;

use crate::targets::TargetSet;

/// Selection and description-edit state for one panel.
///
/// The edit buffer only exists while editing; leaving edit mode by any path
/// other than [`Selection::save`] discards it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum SelectionState {
    #[default]
    NoSelection,
    Viewing(TargetId),
    Editing { id: TargetId, buffer: String },
}

/// A committed description edit, to be relayed to the point-set owner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DescriptionCommit {
    pub id: TargetId,
    pub text: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    state: SelectionState,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &SelectionState {
        &self.state
    }

    pub fn selected(&self) -> Option<TargetId> {
        match self.state {
            SelectionState::NoSelection => None,
            SelectionState::Viewing(id) | SelectionState::Editing { id, .. } => Some(id),
        }
    }

    pub fn is_editing(&self) -> bool {
        matches!(self.state, SelectionState::Editing { .. })
    }

    pub fn buffer(&self) -> Option<&str> {
        match &self.state {
            SelectionState::Editing { buffer, .. } => Some(buffer.as_str()),
            _ => None,
        }
    }

    /// Selects `id`, dropping any in-progress edit.
    ///
    /// Returns `true` if the state changed.
    pub fn select(&mut self, id: TargetId) -> bool {
        let next = SelectionState::Viewing(id);
        if self.state == next {
            return false;
        }
        trace!(target_id = id.0, "select");
        self.state = next;
        true
    }

    /// Enters edit mode seeded with `description`. Only valid while viewing.
    pub fn begin_edit(&mut self, description: &str) -> bool {
        let SelectionState::Viewing(id) = self.state else {
            return false;
        };
        self.state = SelectionState::Editing {
            id,
            buffer: description.to_string(),
        };
        true
    }

    /// Replaces the edit buffer. No-op unless editing.
    pub fn set_buffer(&mut self, text: impl Into<String>) -> bool {
        match &mut self.state {
            SelectionState::Editing { buffer, .. } => {
                *buffer = text.into();
                true
            }
            _ => false,
        }
    }

    pub fn buffer_mut(&mut self) -> Option<&mut String> {
        match &mut self.state {
            SelectionState::Editing { buffer, .. } => Some(buffer),
            _ => None,
        }
    }

    /// Leaves edit mode, handing back the buffer as a commit.
    pub fn save(&mut self) -> Option<DescriptionCommit> {
        let SelectionState::Editing { id, buffer } = &mut self.state else {
            return None;
        };
        let commit = DescriptionCommit {
            id: *id,
            text: std::mem::take(buffer),
        };
        self.state = SelectionState::Viewing(commit.id);
        Some(commit)
    }

    /// Leaves edit mode, discarding the buffer.
    pub fn cancel(&mut self) -> bool {
        let SelectionState::Editing { id, .. } = self.state else {
            return false;
        };
        self.state = SelectionState::Viewing(id);
        true
    }

    /// Clears any selection, discarding an in-progress edit.
    pub fn deselect(&mut self) -> bool {
        if self.state == SelectionState::NoSelection {
            return false;
        }
        trace!("deselect");
        self.state = SelectionState::NoSelection;
        true
    }

    /// Clears the selection if its target is no longer in `targets`.
    pub fn clear_if_stale(&mut self, targets: &TargetSet) -> bool {
        match self.selected() {
            Some(id) if !targets.contains(id) => {
                self.state = SelectionState::NoSelection;
                true
            }
            _ => false,
        }
    }
}
