pub mod analysis;
pub mod memo;

pub use memo::*;
