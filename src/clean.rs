//! Score cleaning. Unusable scores are dropped with a reason, never fatal
//! on their own; only an empty result halts the run.

use tracing::{debug, info, instrument};

use crate::error::{PipelineError, Result};
use crate::records::{CleanRecord, DropReason, DroppedRecord, LongRecord};
use crate::source::Cell;

#[derive(Debug, Clone, PartialEq)]
pub struct Cleaned {
    pub records: Vec<CleanRecord>,
    pub dropped: Vec<DroppedRecord>,
}

impl Cleaned {
    pub fn dropped_for(&self, reason: DropReason) -> usize {
        self.dropped.iter().filter(|d| d.reason == reason).count()
    }
}

/// Reads a score as a finite number, or says why it cannot be one.
pub fn coerce_score(cell: &Cell) -> std::result::Result<f64, DropReason> {
    match cell {
        Cell::Empty => Err(DropReason::Blank),
        Cell::Absent => Err(DropReason::Absent),
        Cell::Number(n) if n.is_finite() => Ok(*n),
        Cell::Number(_) => Err(DropReason::NonNumeric),
        Cell::Text(s) => {
            let s = s.trim();
            if s.is_empty() {
                return Err(DropReason::Blank);
            }
            match s.parse::<f64>() {
                Ok(n) if n.is_finite() => Ok(n),
                _ => Err(DropReason::NonNumeric),
            }
        }
    }
}

/// Splits long records into clean records and drops, preserving order.
///
/// # Errors
///
/// Returns [`PipelineError::NoValidScores`] if nothing survives.
#[instrument(skip_all, fields(records = records.len()))]
pub fn clean(records: Vec<LongRecord>) -> Result<Cleaned> {
    let mut kept = Vec::with_capacity(records.len());
    let mut dropped = Vec::new();

    for record in records {
        match coerce_score(&record.score) {
            Ok(score) => kept.push(CleanRecord {
                identity: record.identity,
                module: record.module,
                score,
            }),
            Err(reason) => {
                debug!(
                    student_id = %record.identity.student_id,
                    module = %record.module,
                    ?reason,
                    "Dropping score"
                );
                dropped.push(DroppedRecord { record, reason });
            }
        }
    }

    if kept.is_empty() {
        return Err(PipelineError::NoValidScores {
            dropped: dropped.len(),
        });
    }

    info!(kept = kept.len(), dropped = dropped.len(), "Scores cleaned");
    Ok(Cleaned {
        records: kept,
        dropped,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::Identity;

    fn record(module: &str, score: Cell) -> LongRecord {
        LongRecord {
            identity: Identity::new("G1", "1", "Ana"),
            module: module.to_string(),
            score,
        }
    }

    #[test]
    fn test_coerce_score() {
        assert_eq!(coerce_score(&Cell::Number(55.0)), Ok(55.0));
        assert_eq!(coerce_score(&Cell::Text(" 72.5 ".into())), Ok(72.5));
        assert_eq!(coerce_score(&Cell::Text("1e2".into())), Ok(100.0));
        assert_eq!(coerce_score(&Cell::Empty), Err(DropReason::Blank));
        assert_eq!(coerce_score(&Cell::Text("   ".into())), Err(DropReason::Blank));
        assert_eq!(coerce_score(&Cell::Absent), Err(DropReason::Absent));
        assert_eq!(coerce_score(&Cell::Text("NP".into())), Err(DropReason::NonNumeric));
        assert_eq!(coerce_score(&Cell::Text("NaN".into())), Err(DropReason::NonNumeric));
        assert_eq!(coerce_score(&Cell::Text("inf".into())), Err(DropReason::NonNumeric));
        assert_eq!(coerce_score(&Cell::Number(f64::NAN)), Err(DropReason::NonNumeric));
    }

    #[test]
    fn test_clean_counts_drops_by_reason() {
        let cleaned = clean(vec![
            record("Math", Cell::Number(55.0)),
            record("Science", Cell::Empty),
            record("History", Cell::Text("sin calificar".into())),
            record("Art", Cell::Absent),
            record("Music", Cell::Text("80".into())),
        ])
        .unwrap();

        assert_eq!(cleaned.records.len(), 2);
        assert_eq!(cleaned.records[1].module, "Music");
        assert_eq!(cleaned.records[1].score, 80.0);
        assert_eq!(cleaned.dropped_for(DropReason::Blank), 1);
        assert_eq!(cleaned.dropped_for(DropReason::NonNumeric), 1);
        assert_eq!(cleaned.dropped_for(DropReason::Absent), 1);
    }

    #[test]
    fn test_no_valid_scores() {
        let err = clean(vec![
            record("Math", Cell::Empty),
            record("Science", Cell::Text("--".into())),
        ])
        .unwrap_err();

        assert!(matches!(err, PipelineError::NoValidScores { dropped: 2 }));
    }
}
