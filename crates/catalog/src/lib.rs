pub mod analysis;
pub mod store;

pub use analysis::{
    AnalysisError, AnalysisProvider, AnalysisResult, FixtureAnalysisProvider, InputFile,
    TargetArea,
};
pub use store::{InMemoryTargetStore, StoreError, TargetStore};
