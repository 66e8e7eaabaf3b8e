//! Drives the five stages for one source set.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, instrument};

use crate::analyzers::aggregate::aggregate;
use crate::analyzers::types::AggregateViews;
use crate::clean::clean;
use crate::config::PipelineConfig;
use crate::error::Result;
use crate::normalize::normalize;
use crate::records::{CleanRecord, DroppedRecord};
use crate::reshape::melt;
use crate::source::{Fingerprint, SourceReader};
use crate::stats::{DropTally, RejectedSource, RunReport};

/// One complete, immutable pipeline result.
#[derive(Debug, Clone, Serialize)]
pub struct Snapshot {
    pub fingerprint: Option<Fingerprint>,
    pub computed_at: DateTime<Utc>,
    pub pass_threshold: f64,
    pub views: AggregateViews,
    pub records: Vec<CleanRecord>,
    pub report: RunReport,
    #[serde(skip)]
    pub dropped: Vec<DroppedRecord>,
}

/// Reads, normalizes, reshapes, cleans and aggregates.
///
/// # Errors
///
/// Fails if the source set cannot be listed, or on any of the fatal
/// preconditions (`NoUsableInput`, `NoModuleColumns`, `NoValidScores`).
/// No partial snapshot is ever returned.
#[instrument(skip_all, fields(threshold = config.pass_threshold))]
pub fn run(reader: &dyn SourceReader, config: &PipelineConfig) -> Result<Snapshot> {
    config.validate()?;

    let loads = reader.load()?;
    let sources_discovered = loads.len();

    let normalized = normalize(loads, &config.identity_columns)?;
    let long = melt(&normalized.wide)?;
    let long_records = long.len();
    let cleaned = clean(long)?;
    let views = aggregate(&cleaned.records, config.pass_threshold);

    let report = RunReport {
        sources_discovered,
        sources_loaded: normalized.loaded,
        sources_rejected: normalized.rejections.iter().map(RejectedSource::from).collect(),
        wide_rows: normalized.wide.rows.len(),
        module_columns: normalized.wide.module_columns,
        long_records,
        clean_records: cleaned.records.len(),
        dropped: DropTally::from_dropped(&cleaned.dropped),
    };

    info!(
        loaded = report.sources_loaded.len(),
        rejected = report.sources_rejected.len(),
        clean_records = report.clean_records,
        dropped = report.dropped.total(),
        "Pipeline run complete"
    );

    Ok(Snapshot {
        fingerprint: None,
        computed_at: Utc::now(),
        pass_threshold: config.pass_threshold,
        views,
        records: cleaned.records,
        report,
        dropped: cleaned.dropped,
    })
}
