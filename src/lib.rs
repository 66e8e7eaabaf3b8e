pub mod analyzers;
pub mod cache;
pub mod clean;
pub mod config;
pub mod error;
pub mod normalize;
pub mod output;
pub mod pipeline;
pub mod records;
pub mod reshape;
pub mod source;
pub mod stats;

pub use cache::SnapshotCache;
pub use config::PipelineConfig;
pub use error::{PipelineError, SourceError};
pub use pipeline::{Snapshot, run};
