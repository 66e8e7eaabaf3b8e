use std::collections::BTreeMap;

use tracing::{info, instrument};

use crate::analyzers::grade::fails;
use crate::analyzers::types::{
    AggregateViews, GroupFailures, GroupModuleFailures, ModuleFailures, StudentFailures,
};
use crate::records::CleanRecord;

#[derive(Debug, Default, Clone, Copy)]
struct Tally {
    graded: usize,
    failed: usize,
}

/// Grades every record and sums failures under `key`. The map keeps keys in
/// ascending order, which later becomes the tie order of the sorted views.
fn tally_by<K, F>(records: &[CleanRecord], threshold: f64, key: F) -> BTreeMap<K, Tally>
where
    K: Ord,
    F: Fn(&CleanRecord) -> K,
{
    let mut tallies: BTreeMap<K, Tally> = BTreeMap::new();

    for record in records {
        let entry = tallies.entry(key(record)).or_default();
        entry.graded += 1;
        if fails(record.score, threshold) {
            entry.failed += 1;
        }
    }

    tallies
}

/// Builds the four failure views from the full clean record set.
///
/// Pure: no I/O, and the same records and threshold always give the same
/// views.
#[instrument(skip(records), fields(records = records.len()))]
pub fn aggregate(records: &[CleanRecord], threshold: f64) -> AggregateViews {
    let mut by_student: Vec<StudentFailures> = tally_by(records, threshold, |r| {
        (
            r.identity.student_id.clone(),
            r.identity.student_name.clone(),
            r.identity.group.clone(),
        )
    })
    .into_iter()
    .map(|((student_id, student_name, group), t)| StudentFailures {
        student_id,
        student_name,
        group,
        graded: t.graded,
        total_failed: t.failed,
    })
    .collect();
    // `sort_by` is stable, so equal counts stay in key order.
    by_student.sort_by(|a, b| b.total_failed.cmp(&a.total_failed));

    let mut by_group: Vec<GroupFailures> =
        tally_by(records, threshold, |r| r.identity.group.clone())
            .into_iter()
            .map(|(group, t)| GroupFailures {
                group,
                graded: t.graded,
                total_failed: t.failed,
            })
            .collect();
    by_group.sort_by(|a, b| b.total_failed.cmp(&a.total_failed));

    let mut by_module: Vec<ModuleFailures> = tally_by(records, threshold, |r| r.module.clone())
        .into_iter()
        .map(|(module, t)| ModuleFailures {
            module,
            graded: t.graded,
            total_failed: t.failed,
        })
        .collect();
    by_module.sort_by(|a, b| b.total_failed.cmp(&a.total_failed));

    let mut by_group_module: Vec<GroupModuleFailures> = tally_by(records, threshold, |r| {
        (r.identity.group.clone(), r.module.clone())
    })
    .into_iter()
    .map(|((group, module), t)| GroupModuleFailures {
        group,
        module,
        graded: t.graded,
        total_failed: t.failed,
    })
    .collect();
    by_group_module.sort_by(|a, b| {
        a.group
            .cmp(&b.group)
            .then_with(|| b.total_failed.cmp(&a.total_failed))
    });

    let views = AggregateViews {
        by_student,
        by_group,
        by_module,
        by_group_module,
    };

    info!(
        students = views.by_student.len(),
        groups = views.by_group.len(),
        modules = views.by_module.len(),
        total_failed = views.total_failed(),
        "Aggregated failures"
    );

    views
}
