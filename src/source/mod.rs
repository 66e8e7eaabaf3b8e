//! Source readers: where raw tables come from.
//!
//! The pipeline only depends on [`SourceReader`]. [`DirectorySource`] reads
//! workbooks and CSV files from disk; [`MemorySource`] serves tables the
//! caller already holds.

mod directory;
mod memory;
mod reader;
mod table;

pub use directory::DirectorySource;
pub use memory::MemorySource;
pub use reader::{Fingerprint, FingerprintBuilder, SourceLoad, SourceReader};
pub use table::{Cell, RawTable};
