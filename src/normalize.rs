//! Schema normalization: positional identity columns and a union merge.
//!
//! The first three columns of every table are the identity, whatever their
//! header says. The rest are modules; module columns are unioned across
//! files in first-seen order and cells a file never had are marked
//! [`Cell::Absent`].

use std::collections::{HashMap, HashSet};

use tracing::{debug, info, instrument, warn};

use crate::config::IdentityColumns;
use crate::error::{PipelineError, Result, SourceError};
use crate::records::Identity;
use crate::source::{Cell, RawTable, SourceLoad};

const IDENTITY_WIDTH: usize = 3;

/// A source that was left out of the merge.
#[derive(Debug)]
pub struct Rejection {
    pub source: String,
    pub error: SourceError,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WideRow {
    pub identity: Identity,
    /// Aligned with [`WideTable::module_columns`].
    pub cells: Vec<Cell>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct WideTable {
    pub module_columns: Vec<String>,
    pub rows: Vec<WideRow>,
}

#[derive(Debug)]
pub struct Normalized {
    pub wide: WideTable,
    pub loaded: Vec<String>,
    pub rejections: Vec<Rejection>,
}

/// Merges every readable source into one wide table.
///
/// # Errors
///
/// Returns [`PipelineError::NoUsableInput`] if no source survives. Unreadable
/// or malformed sources are reported in [`Normalized::rejections`] instead.
#[instrument(skip_all, fields(sources = loads.len()))]
pub fn normalize(loads: Vec<SourceLoad>, identity_columns: &IdentityColumns) -> Result<Normalized> {
    let discovered = loads.len();
    let mut merger = Merger::default();
    let mut loaded = Vec::new();
    let mut rejections = Vec::new();

    for load in loads {
        let table = match load.table {
            Ok(table) if table.column_count() < IDENTITY_WIDTH => {
                Err(SourceError::MalformedSource {
                    columns: table.column_count(),
                })
            }
            other => other,
        };

        match table {
            Ok(table) => {
                debug!(source = %load.source, rows = table.rows.len(), "Merging source");
                merger.merge(table, identity_columns);
                loaded.push(load.source);
            }
            Err(error) => {
                warn!(source = %load.source, error = %error, "Skipping source");
                rejections.push(Rejection {
                    source: load.source,
                    error,
                });
            }
        }
    }

    if loaded.is_empty() {
        return Err(PipelineError::NoUsableInput {
            discovered,
            rejected: rejections.len(),
        });
    }

    let wide = merger.finish();
    info!(
        loaded = loaded.len(),
        rejected = rejections.len(),
        rows = wide.rows.len(),
        modules = wide.module_columns.len(),
        "Sources merged"
    );

    Ok(Normalized {
        wide,
        loaded,
        rejections,
    })
}

#[derive(Default)]
struct Merger {
    module_columns: Vec<String>,
    positions: HashMap<String, usize>,
    rows: Vec<WideRow>,
}

impl Merger {
    fn merge(&mut self, table: RawTable, identity_columns: &IdentityColumns) {
        // Source column index -> union column index.
        let mut mapping = Vec::new();
        let mut names = ColumnNames::new(identity_columns);

        for (index, header) in table.headers.iter().enumerate().skip(IDENTITY_WIDTH) {
            let header = header.trim();
            let base = if header.is_empty() {
                format!("Unnamed: {index}")
            } else {
                header.to_string()
            };

            let name = names.claim(base);
            mapping.push((index, self.position_of(name)));
        }

        let width = self.module_columns.len();
        for mut row in table.rows {
            let field = |i: usize| row.get(i).map(Cell::render).unwrap_or_default();
            let identity = Identity {
                group: field(0),
                student_id: field(1),
                student_name: field(2),
            };

            let mut cells = vec![Cell::Absent; width];
            for &(source_index, column) in &mapping {
                if let Some(cell) = row.get_mut(source_index) {
                    cells[column] = std::mem::replace(cell, Cell::Empty);
                } else {
                    cells[column] = Cell::Empty;
                }
            }

            self.rows.push(WideRow { identity, cells });
        }
    }

    fn position_of(&mut self, name: String) -> usize {
        if let Some(&position) = self.positions.get(&name) {
            return position;
        }
        let position = self.module_columns.len();
        self.positions.insert(name.clone(), position);
        self.module_columns.push(name);
        position
    }

    fn finish(mut self) -> WideTable {
        let width = self.module_columns.len();
        for row in &mut self.rows {
            row.cells.resize(width, Cell::Absent);
        }

        WideTable {
            module_columns: self.module_columns,
            rows: self.rows,
        }
    }
}

/// Header names taken within one file. The identity names are taken from
/// the start, so a module header equal to one of them gets a suffix.
struct ColumnNames {
    taken: HashSet<String>,
    suffixes: HashMap<String, usize>,
}

impl ColumnNames {
    fn new(identity_columns: &IdentityColumns) -> Self {
        Self {
            taken: identity_columns.names().iter().map(|n| n.to_string()).collect(),
            suffixes: HashMap::new(),
        }
    }

    /// Returns `base`, or `base.N` with the next `N` not yet taken.
    fn claim(&mut self, base: String) -> String {
        let name = if self.taken.contains(&base) {
            let suffix = self.suffixes.entry(base.clone()).or_insert(0);
            loop {
                *suffix += 1;
                let candidate = format!("{base}.{suffix}");
                if !self.taken.contains(&candidate) {
                    break candidate;
                }
            }
        } else {
            base
        };

        self.taken.insert(name.clone());
        name
    }
}
