//! Error taxonomy for the grading pipeline.
//!
//! [`SourceError`] is scoped to a single source file and is recovered by
//! skipping that file. [`PipelineError`] halts the run before any aggregate
//! is produced.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, PipelineError>;

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Workbook error: {0}")]
    Workbook(#[from] calamine::Error),

    #[error("Sheet '{sheet}' not found (available: {available:?})")]
    SheetNotFound {
        sheet: String,
        available: Vec<String>,
    },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Malformed source: expected at least 3 columns, found {columns}")]
    MalformedSource { columns: usize },
}

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("No usable input: {discovered} sources discovered, {rejected} rejected")]
    NoUsableInput { discovered: usize, rejected: usize },

    #[error("No module columns found to analyze")]
    NoModuleColumns,

    #[error("No valid scores left after cleaning ({dropped} records dropped)")]
    NoValidScores { dropped: usize },

    #[error("Source listing failed: {0}")]
    Source(#[from] SourceError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Pipeline task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

impl PipelineError {
    /// True for the preconditions a caller can fix by changing the input files.
    pub fn is_input_problem(&self) -> bool {
        matches!(
            self,
            PipelineError::NoUsableInput { .. }
                | PipelineError::NoModuleColumns
                | PipelineError::NoValidScores { .. }
        )
    }
}
