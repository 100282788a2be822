pub mod types;
pub mod classification;

pub use types::EngineError;
pub use classification::{classify_failure, ErrorClassification};
