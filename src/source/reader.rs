use serde::Serialize;
use sha2::{Digest, Sha256};

use super::table::{Cell, RawTable};
use crate::error::SourceError;

/// Outcome of reading one source: the table, or why it could not be read.
#[derive(Debug)]
pub struct SourceLoad {
    pub source: String,
    pub table: Result<RawTable, SourceError>,
}

/// Supplies raw tables to the pipeline.
///
/// `load` must isolate per-source failures inside each [`SourceLoad`]; an
/// `Err` from `load` itself means the source set could not be listed at all.
pub trait SourceReader: Send + Sync {
    fn load(&self) -> Result<Vec<SourceLoad>, SourceError>;

    /// Content fingerprint of the whole source set. Equal fingerprints mean
    /// `load` would return the same tables.
    fn fingerprint(&self) -> Result<Fingerprint, SourceError>;
}

/// Hex-encoded SHA-256 over the contents of a source set.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Fingerprint(String);

impl Fingerprint {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Incremental [`Fingerprint`] builder. Every chunk is length-prefixed so
/// `("ab", "c")` and `("a", "bc")` hash differently.
#[derive(Default)]
pub struct FingerprintBuilder {
    hasher: Sha256,
}

impl FingerprintBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn chunk(&mut self, bytes: &[u8]) -> &mut Self {
        self.hasher.update((bytes.len() as u64).to_le_bytes());
        self.hasher.update(bytes);
        self
    }

    pub fn table(&mut self, table: &RawTable) -> &mut Self {
        self.chunk(table.source.as_bytes());
        self.chunk(&(table.headers.len() as u64).to_le_bytes());
        for header in &table.headers {
            self.chunk(header.as_bytes());
        }
        self.chunk(&(table.rows.len() as u64).to_le_bytes());
        for row in &table.rows {
            for cell in row {
                self.cell(cell);
            }
        }
        self
    }

    fn cell(&mut self, cell: &Cell) {
        match cell {
            Cell::Empty => self.chunk(&[0]),
            Cell::Absent => self.chunk(&[1]),
            Cell::Number(n) => self.chunk(&[2]).chunk(&n.to_bits().to_le_bytes()),
            Cell::Text(s) => self.chunk(&[3]).chunk(s.as_bytes()),
        };
    }

    pub fn finish(self) -> Fingerprint {
        Fingerprint(hex::encode(self.hasher.finalize()))
    }
}
