//! Bookkeeping for one pipeline run: what was read, skipped and dropped.

use serde::Serialize;

use crate::normalize::Rejection;
use crate::records::{DropReason, DroppedRecord};

/// A source left out of the run, with the rendered error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RejectedSource {
    pub source: String,
    pub error: String,
}

impl From<&Rejection> for RejectedSource {
    fn from(r: &Rejection) -> Self {
        Self {
            source: r.source.clone(),
            error: r.error.to_string(),
        }
    }
}

/// Dropped-score counts per reason.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DropTally {
    pub blank: usize,
    pub absent: usize,
    pub non_numeric: usize,
}

impl DropTally {
    pub fn from_dropped(dropped: &[DroppedRecord]) -> Self {
        let mut tally = DropTally::default();
        for d in dropped {
            match d.reason {
                DropReason::Blank => tally.blank += 1,
                DropReason::Absent => tally.absent += 1,
                DropReason::NonNumeric => tally.non_numeric += 1,
            }
        }
        tally
    }

    pub fn total(&self) -> usize {
        self.blank + self.absent + self.non_numeric
    }
}

#[derive(Debug, Default, Clone, PartialEq, Serialize)]
pub struct RunReport {
    pub sources_discovered: usize,
    pub sources_loaded: Vec<String>,
    pub sources_rejected: Vec<RejectedSource>,
    pub wide_rows: usize,
    pub module_columns: Vec<String>,
    pub long_records: usize,
    pub clean_records: usize,
    pub dropped: DropTally,
}

impl RunReport {
    /// Every long record is either clean or dropped.
    pub fn is_balanced(&self) -> bool {
        self.long_records == self.clean_records + self.dropped.total()
            && self.long_records == self.wide_rows * self.module_columns.len()
    }
}
