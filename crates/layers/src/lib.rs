pub mod cluster;
pub mod density;
pub mod layer;
pub mod overlay;
pub mod symbology;

pub use layer::*;
