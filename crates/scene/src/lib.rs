pub mod picking;
pub mod projection;
pub mod selection;
pub mod targets;
pub mod viewport;

pub use projection::*;
pub use selection::*;
pub use targets::*;
pub use viewport::*;
