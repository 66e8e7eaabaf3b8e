//! Wide-to-long reshaping.

use tracing::{debug, instrument};

use crate::error::{PipelineError, Result};
use crate::normalize::WideTable;
use crate::records::LongRecord;

/// Emits one [`LongRecord`] per (row, module column) cell, row-major: every
/// module of a row before the next row, rows in merged order. Values are
/// carried through unvalidated.
///
/// # Errors
///
/// Returns [`PipelineError::NoModuleColumns`] when the table has nothing to
/// analyze beyond its identity columns.
#[instrument(skip_all, fields(rows = wide.rows.len(), modules = wide.module_columns.len()))]
pub fn melt(wide: &WideTable) -> Result<Vec<LongRecord>> {
    if wide.module_columns.is_empty() {
        return Err(PipelineError::NoModuleColumns);
    }

    let mut records = Vec::with_capacity(wide.rows.len() * wide.module_columns.len());

    for row in &wide.rows {
        for (module, score) in wide.module_columns.iter().zip(&row.cells) {
            records.push(LongRecord {
                identity: row.identity.clone(),
                module: module.clone(),
                score: score.clone(),
            });
        }
    }

    debug!(records = records.len(), "Reshaped to long form");
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::WideRow;
    use crate::records::Identity;
    use crate::source::Cell;

    fn wide(modules: &[&str], rows: Vec<(Identity, Vec<Cell>)>) -> WideTable {
        WideTable {
            module_columns: modules.iter().map(|m| m.to_string()).collect(),
            rows: rows
                .into_iter()
                .map(|(identity, cells)| WideRow { identity, cells })
                .collect(),
        }
    }

    #[test]
    fn test_cell_count_is_preserved() {
        let table = wide(
            &["Math", "Science", "History"],
            vec![
                (
                    Identity::new("G1", "1", "Ana"),
                    vec![Cell::Number(50.0), Cell::Empty, Cell::Text("x".into())],
                ),
                (
                    Identity::new("G1", "2", "Luis"),
                    vec![Cell::Number(90.0), Cell::Number(40.0), Cell::Absent],
                ),
            ],
        );

        let records = melt(&table).unwrap();
        assert_eq!(records.len(), table.rows.len() * table.module_columns.len());
    }

    #[test]
    fn test_order_is_row_major() {
        let table = wide(
            &["Math", "Science"],
            vec![
                (
                    Identity::new("G1", "1", "Ana"),
                    vec![Cell::Number(1.0), Cell::Number(2.0)],
                ),
                (
                    Identity::new("G2", "2", "Bea"),
                    vec![Cell::Number(3.0), Cell::Empty],
                ),
            ],
        );

        let order: Vec<_> = melt(&table)
            .unwrap()
            .into_iter()
            .map(|r| (r.identity.student_name, r.module, r.score))
            .collect();

        assert_eq!(
            order,
            vec![
                ("Ana".to_string(), "Math".to_string(), Cell::Number(1.0)),
                ("Ana".to_string(), "Science".to_string(), Cell::Number(2.0)),
                ("Bea".to_string(), "Math".to_string(), Cell::Number(3.0)),
                ("Bea".to_string(), "Science".to_string(), Cell::Empty),
            ]
        );
    }

    #[test]
    fn test_no_module_columns() {
        let table = wide(&[], vec![(Identity::new("G1", "1", "Ana"), vec![])]);
        assert!(matches!(melt(&table), Err(PipelineError::NoModuleColumns)));
    }

    #[test]
    fn test_modules_without_rows_yield_nothing() {
        let table = wide(&["Math"], vec![]);
        assert!(melt(&table).unwrap().is_empty());
    }
}
