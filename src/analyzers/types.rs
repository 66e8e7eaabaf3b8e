//! Aggregate view rows produced by the aggregation step.
//!
//! `total_failed` is the failing-score count for the row's key (the
//! `Total_Reprobadas` column of the original reports); `graded` is how many
//! clean scores the key had in total.

use serde::Serialize;

use crate::analyzers::utility::rate;

/// Shared accessors over every view row.
pub trait FailureCount {
    fn total_failed(&self) -> usize;
    fn graded(&self) -> usize;

    fn failure_rate(&self) -> f64 {
        rate(self.total_failed(), self.graded())
    }
}

macro_rules! impl_failure_count {
    ($($ty:ty),+) => {
        $(
            impl FailureCount for $ty {
                fn total_failed(&self) -> usize {
                    self.total_failed
                }

                fn graded(&self) -> usize {
                    self.graded
                }
            }
        )+
    };
}

/// Failures for one identity (student id, name and group).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StudentFailures {
    pub student_id: String,
    pub student_name: String,
    pub group: String,
    pub graded: usize,
    pub total_failed: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GroupFailures {
    pub group: String,
    pub graded: usize,
    pub total_failed: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModuleFailures {
    pub module: String,
    pub graded: usize,
    pub total_failed: usize,
}

/// Failures for one module within one group. Zero-failure pairs are kept.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GroupModuleFailures {
    pub group: String,
    pub module: String,
    pub graded: usize,
    pub total_failed: usize,
}

impl_failure_count!(StudentFailures, GroupFailures, ModuleFailures, GroupModuleFailures);

/// The four views of one run.
///
/// `by_student`, `by_group` and `by_module` are sorted by `total_failed`
/// descending. `by_group_module` is sorted by group ascending, then
/// `total_failed` descending within each group. Ties keep key order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AggregateViews {
    pub by_student: Vec<StudentFailures>,
    pub by_group: Vec<GroupFailures>,
    pub by_module: Vec<ModuleFailures>,
    pub by_group_module: Vec<GroupModuleFailures>,
}

impl AggregateViews {
    /// Total failing scores across the run.
    pub fn total_failed(&self) -> usize {
        self.by_group.iter().map(|g| g.total_failed).sum()
    }

    /// Total clean scores across the run.
    pub fn total_graded(&self) -> usize {
        self.by_group.iter().map(|g| g.graded).sum()
    }
}
