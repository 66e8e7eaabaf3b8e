//! Record types flowing between pipeline stages.

use serde::Serialize;

use crate::source::Cell;

/// Who a score belongs to. Keyed by the full triple: the same student id in
/// two groups is two identities.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct Identity {
    pub group: String,
    pub student_id: String,
    pub student_name: String,
}

impl Identity {
    pub fn new(
        group: impl Into<String>,
        student_id: impl Into<String>,
        student_name: impl Into<String>,
    ) -> Self {
        Self {
            group: group.into(),
            student_id: student_id.into(),
            student_name: student_name.into(),
        }
    }
}

/// One (identity, module) cell of the wide table, not yet validated.
#[derive(Debug, Clone, PartialEq)]
pub struct LongRecord {
    pub identity: Identity,
    pub module: String,
    pub score: Cell,
}

/// A long record whose score is a finite number.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CleanRecord {
    #[serde(flatten)]
    pub identity: Identity,
    pub module: String,
    pub score: f64,
}

impl CleanRecord {
    pub fn fails(&self, threshold: f64) -> bool {
        crate::analyzers::grade::fails(self.score, threshold)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DropReason {
    /// The source cell was empty or whitespace.
    Blank,
    /// The module column did not exist in the record's source file.
    Absent,
    /// The value could not be read as a finite number.
    NonNumeric,
}

/// A long record the cleaner removed, and why.
#[derive(Debug, Clone, PartialEq)]
pub struct DroppedRecord {
    pub record: LongRecord,
    pub reason: DropReason,
}
