use foundation::ids::TargetId;
use scene::targets::{TargetPoint, TargetSet};
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("target {0} not found")]
    NotFound(TargetId),
    #[error("target store unavailable: {0}")]
    Unavailable(String),
}

/// Owner of the point set a panel visualizes.
///
/// The panel only reads targets and relays description commits; it never
/// awaits confirmation or rolls back on error.
pub trait TargetStore {
    fn targets(&self) -> &TargetSet;
    fn commit_description(&mut self, id: TargetId, text: &str) -> Result<(), StoreError>;
}

#[derive(Debug, Clone, Default)]
pub struct InMemoryTargetStore {
    targets: TargetSet,
    commits: u64,
}

impl InMemoryTargetStore {
    pub fn new(points: Vec<TargetPoint>) -> Self {
        Self {
            targets: TargetSet::new(points),
            commits: 0,
        }
    }

    /// Replaces the point set, bumping its revision.
    pub fn replace(&mut self, points: Vec<TargetPoint>) {
        self.targets.replace(points);
    }

    /// Successful commits so far.
    pub fn commits(&self) -> u64 {
        self.commits
    }
}

impl TargetStore for InMemoryTargetStore {
    fn targets(&self) -> &TargetSet {
        &self.targets
    }

    fn commit_description(&mut self, id: TargetId, text: &str) -> Result<(), StoreError> {
        if !self.targets.set_description(id, text) {
            return Err(StoreError::NotFound(id));
        }
        self.commits += 1;
        debug!(target_id = id.0, "description committed");
        Ok(())
    }
}
