use std::fmt;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct LayerId(pub u64);

impl fmt::Display for LayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "layer#{}", self.0)
    }
}

/// A view derived from the target set and the viewport.
pub trait Layer {
    fn id(&self) -> LayerId;

    fn name(&self) -> &'static str;

    /// `true` if panning (not only zooming) invalidates the layer's output.
    fn tracks_origin(&self) -> bool;
}
