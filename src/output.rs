//! Read-only views over a [`Snapshot`] for display.
//!
//! Supports a plain-text report, JSON serialization, and CSV export of any
//! view. Filtering for display (one group, failing pairs only, top N) lives
//! here rather than in the aggregation.

use std::fmt::Write as _;
use std::io;

use anyhow::Result;
use csv::WriterBuilder;
use serde::Serialize;
use tracing::debug;

use crate::analyzers::types::{FailureCount, GroupModuleFailures, StudentFailures};
use crate::pipeline::Snapshot;
use crate::records::CleanRecord;

/// Which groups a display query covers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GroupFilter {
    All,
    Group(String),
}

impl GroupFilter {
    pub fn from_option(group: Option<String>) -> Self {
        group.map_or(GroupFilter::All, GroupFilter::Group)
    }

    fn matches(&self, group: &str) -> bool {
        match self {
            GroupFilter::All => true,
            GroupFilter::Group(g) => g == group,
        }
    }

    fn label(&self) -> &str {
        match self {
            GroupFilter::All => "all groups",
            GroupFilter::Group(g) => g,
        }
    }
}

/// Headline numbers for a run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Overview {
    pub total_failed: usize,
    pub groups: usize,
    pub students: usize,
    pub top_module: Option<String>,
}

pub fn overview(snapshot: &Snapshot) -> Overview {
    let views = &snapshot.views;
    Overview {
        total_failed: views.total_failed(),
        groups: views.by_group.len(),
        students: views.by_student.len(),
        top_module: views.by_module.first().map(|m| m.module.clone()),
    }
}

/// Distinct groups, ascending.
pub fn groups(snapshot: &Snapshot) -> Vec<&str> {
    let mut groups: Vec<&str> = snapshot
        .views
        .by_group
        .iter()
        .map(|g| g.group.as_str())
        .collect();
    groups.sort_unstable();
    groups
}

/// Students ranked by failures, optionally restricted to one group.
pub fn top_students<'a>(
    snapshot: &'a Snapshot,
    filter: &GroupFilter,
    limit: usize,
) -> Vec<&'a StudentFailures> {
    snapshot
        .views
        .by_student
        .iter()
        .filter(|s| filter.matches(&s.group))
        .take(limit)
        .collect()
}

/// Group-module rows for display. A single group shows all of its modules,
/// zero-failure ones included; across all groups only failing pairs are
/// shown.
pub fn breakdown<'a>(snapshot: &'a Snapshot, filter: &GroupFilter) -> Vec<&'a GroupModuleFailures> {
    snapshot
        .views
        .by_group_module
        .iter()
        .filter(|p| match filter {
            GroupFilter::All => p.total_failed > 0,
            GroupFilter::Group(g) => &p.group == g,
        })
        .collect()
}

/// Clean records matching the given identity fields.
pub fn records_for<'a>(
    snapshot: &'a Snapshot,
    group: Option<&str>,
    student_id: Option<&str>,
) -> Vec<&'a CleanRecord> {
    snapshot
        .records
        .iter()
        .filter(|r| group.is_none_or(|g| r.identity.group == g))
        .filter(|r| student_id.is_none_or(|id| r.identity.student_id == id))
        .collect()
}

/// A clean record flattened for tabular output, with its verdict.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreRow<'a> {
    pub group: &'a str,
    pub student_id: &'a str,
    pub student_name: &'a str,
    pub module: &'a str,
    pub score: f64,
    pub failed: bool,
}

pub fn score_rows<'a>(records: &[&'a CleanRecord], threshold: f64) -> Vec<ScoreRow<'a>> {
    records
        .iter()
        .map(|&r| ScoreRow {
            group: &r.identity.group,
            student_id: &r.identity.student_id,
            student_name: &r.identity.student_name,
            module: &r.module,
            score: r.score,
            failed: r.fails(threshold),
        })
        .collect()
}

/// Renders the text report shown by the CLI.
pub fn render_report(snapshot: &Snapshot, filter: &GroupFilter, limit: usize) -> String {
    let mut out = String::new();
    let summary = overview(snapshot);
    let report = &snapshot.report;

    let _ = writeln!(out, "# Failure Report");
    let _ = writeln!(
        out,
        "Computed {} (passing score {}, {} of {} sources loaded)",
        snapshot.computed_at.format("%Y-%m-%d %H:%M:%S UTC"),
        snapshot.pass_threshold,
        report.sources_loaded.len(),
        report.sources_discovered,
    );
    for rejected in &report.sources_rejected {
        let _ = writeln!(out, "  skipped {}: {}", rejected.source, rejected.error);
    }
    if report.dropped.total() > 0 {
        let _ = writeln!(
            out,
            "  dropped {} scores ({} blank, {} absent, {} non-numeric)",
            report.dropped.total(),
            report.dropped.blank,
            report.dropped.absent,
            report.dropped.non_numeric
        );
    }

    let _ = writeln!(out);
    let _ = writeln!(out, "## Overview");
    let _ = writeln!(out, "- Total failures: {}", summary.total_failed);
    let _ = writeln!(out, "- Groups analyzed: {}", summary.groups);
    let _ = writeln!(out, "- Students analyzed: {}", summary.students);
    if let Some(module) = &summary.top_module {
        let _ = writeln!(out, "- Module with most failures: {module}");
    }

    let _ = writeln!(out);
    let _ = writeln!(out, "## Top {limit} Modules");
    for module in snapshot.views.by_module.iter().take(limit) {
        let _ = writeln!(
            out,
            "- {}: {} failed of {} ({:.1}%)",
            module.module,
            module.total_failed,
            module.graded,
            module.failure_rate() * 100.0
        );
    }

    let _ = writeln!(out);
    let _ = writeln!(out, "## Module Breakdown for {}", filter.label());
    let rows = breakdown(snapshot, filter);
    if rows.is_empty() {
        let _ = writeln!(out, "No failing modules.");
    } else {
        for row in rows {
            let _ = writeln!(
                out,
                "- {} / {}: {} failed of {}",
                row.group, row.module, row.total_failed, row.graded
            );
        }
    }

    let _ = writeln!(out);
    let _ = writeln!(out, "## Top {limit} Students ({})", filter.label());
    let students = top_students(snapshot, filter, limit);
    if students.is_empty() {
        let _ = writeln!(out, "No students in this selection.");
    } else {
        for student in students {
            let _ = writeln!(
                out,
                "- {} ({}, {}): {} failed of {}",
                student.student_name,
                student.student_id,
                student.group,
                student.total_failed,
                student.graded
            );
        }
    }

    out
}

/// Serializes the snapshot as pretty-printed JSON.
pub fn to_json(snapshot: &Snapshot) -> Result<String> {
    Ok(serde_json::to_string_pretty(snapshot)?)
}

/// Writes view rows as CSV with a header line.
pub fn write_csv<W: io::Write, T: Serialize>(rows: &[T], writer: W) -> Result<()> {
    debug!(rows = rows.len(), "Writing CSV view");
    let mut writer = WriterBuilder::new().has_headers(true).from_writer(writer);

    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;

    Ok(())
}
