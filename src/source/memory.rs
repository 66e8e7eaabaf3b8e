use super::reader::{Fingerprint, FingerprintBuilder, SourceLoad, SourceReader};
use super::table::RawTable;
use crate::error::SourceError;

/// Serves tables already held in memory.
///
/// Useful when the caller owns its own file handling, and in tests.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    tables: Vec<RawTable>,
}

impl MemorySource {
    pub fn new(tables: Vec<RawTable>) -> Self {
        Self { tables }
    }

    pub fn push(&mut self, table: RawTable) {
        self.tables.push(table);
    }
}

impl SourceReader for MemorySource {
    fn load(&self) -> Result<Vec<SourceLoad>, SourceError> {
        Ok(self
            .tables
            .iter()
            .map(|table| SourceLoad {
                source: table.source.clone(),
                table: Ok(table.clone()),
            })
            .collect())
    }

    fn fingerprint(&self) -> Result<Fingerprint, SourceError> {
        let mut builder = FingerprintBuilder::new();
        for table in &self.tables {
            builder.table(table);
        }
        Ok(builder.finish())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::Cell;

    fn table(score: f64) -> RawTable {
        RawTable::new(
            "mem",
            vec!["g".into(), "id".into(), "n".into(), "Math".into()],
            vec![vec![
                Cell::Text("G1".into()),
                Cell::Text("1".into()),
                Cell::Text("Ana".into()),
                Cell::Number(score),
            ]],
        )
    }

    #[test]
    fn test_fingerprint_follows_cell_values() {
        let a = MemorySource::new(vec![table(55.0)]).fingerprint().unwrap();
        let b = MemorySource::new(vec![table(55.0)]).fingerprint().unwrap();
        let c = MemorySource::new(vec![table(65.0)]).fingerprint().unwrap();

        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_number_and_text_cells_differ() {
        let mut text = table(55.0);
        text.rows[0][3] = Cell::Text("55".into());

        let a = MemorySource::new(vec![table(55.0)]).fingerprint().unwrap();
        let b = MemorySource::new(vec![text]).fingerprint().unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_load_returns_every_table() {
        let mut source = MemorySource::default();
        source.push(table(1.0));
        source.push(table(2.0));

        let loads = source.load().unwrap();
        assert_eq!(loads.len(), 2);
        assert!(loads.iter().all(|l| l.table.is_ok()));
    }
}
