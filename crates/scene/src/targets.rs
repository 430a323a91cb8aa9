use foundation::ids::TargetId;
use foundation::math::Vec2;

/// Lower and upper bound of the normalized data space on both axes.
pub const DATA_MIN: f64 = 0.0;
pub const DATA_MAX: f64 = 100.0;

/// A predicted target returned by the analysis.
///
/// `position` lives in data space (`0..=100` on both axes). The engine never
/// creates or deletes targets; it only reads them and relays description edits.
#[derive(Debug, Clone, PartialEq)]
pub struct TargetPoint {
    pub id: TargetId,
    pub position: Vec2,
    /// Probability in `0..=1`.
    pub probability: f64,
    pub description: String,
    pub reasoning: Option<String>,
}

impl TargetPoint {
    pub fn new(id: u64, x: f64, y: f64, probability: f64) -> Self {
        Self {
            id: TargetId(id),
            position: Vec2::new(x, y),
            probability,
            description: String::new(),
            reasoning: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_reasoning(mut self, reasoning: impl Into<String>) -> Self {
        self.reasoning = Some(reasoning.into());
        self
    }
}

/// An immutable-geometry collection of targets with a revision stamp.
///
/// The revision changes only when the set is replaced, so derived structures
/// (clusters, density grid) may key their caches on it. Description edits do
/// not bump the revision because they never move a point.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TargetSet {
    points: Vec<TargetPoint>,
    revision: u64,
}

impl TargetSet {
    pub fn new(points: Vec<TargetPoint>) -> Self {
        Self {
            points,
            revision: 0,
        }
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn points(&self) -> &[TargetPoint] {
        &self.points
    }

    pub fn iter(&self) -> impl Iterator<Item = &TargetPoint> + '_ {
        self.points.iter()
    }

    pub fn get(&self, id: TargetId) -> Option<&TargetPoint> {
        self.points.iter().find(|p| p.id == id)
    }

    pub fn contains(&self, id: TargetId) -> bool {
        self.get(id).is_some()
    }

    /// Replaces every point and bumps the revision.
    pub fn replace(&mut self, points: Vec<TargetPoint>) {
        self.points = points;
        self.revision += 1;
    }

    /// Updates a description in place.
    ///
    /// Returns `false` if `id` is not in the set.
    pub fn set_description(&mut self, id: TargetId, text: &str) -> bool {
        let Some(point) = self.points.iter_mut().find(|p| p.id == id) else {
            return false;
        };
        point.description = text.to_string();
        true
    }
}
