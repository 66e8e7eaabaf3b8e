//! Raw tabular data as handed over by a [`SourceReader`](super::SourceReader).

use serde::Serialize;

/// A single spreadsheet value before any validation.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Cell {
    /// Blank in the source file.
    Empty,
    /// Manufactured by the merge for a module column the source did not have.
    Absent,
    Number(f64),
    Text(String),
}

impl Cell {
    /// Maps a CSV field: empty fields are blank, everything else stays text
    /// until the cleaner coerces it.
    pub fn from_field(field: &str) -> Self {
        if field.is_empty() {
            Cell::Empty
        } else {
            Cell::Text(field.to_string())
        }
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, Cell::Empty | Cell::Absent)
    }

    /// Renders the cell as an identity or header string.
    ///
    /// Integral numbers drop their fractional part so a student id stored as
    /// `1001.0` renders as `"1001"`.
    pub fn render(&self) -> String {
        match self {
            Cell::Empty | Cell::Absent => String::new(),
            Cell::Number(n) => render_number(*n),
            Cell::Text(s) => s.trim().to_string(),
        }
    }
}

fn render_number(n: f64) -> String {
    if n.is_finite() && n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}

/// One sheet of one source file: a header row plus data rows.
///
/// Every row is padded or truncated to the header width on construction.
#[derive(Debug, Clone, PartialEq)]
pub struct RawTable {
    pub source: String,
    pub headers: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
}

impl RawTable {
    pub fn new(source: impl Into<String>, headers: Vec<String>, rows: Vec<Vec<Cell>>) -> Self {
        let width = headers.len();
        let rows = rows
            .into_iter()
            .map(|mut row| {
                row.resize(width, Cell::Empty);
                row
            })
            .collect();

        Self {
            source: source.into(),
            headers,
            rows,
        }
    }

    pub fn column_count(&self) -> usize {
        self.headers.len()
    }

    /// Drops trailing rows with no content at all, which spreadsheet tools
    /// leave behind after formatting.
    pub fn trim_blank_rows(mut self) -> Self {
        while self
            .rows
            .last()
            .is_some_and(|row| row.iter().all(Cell::is_missing))
        {
            self.rows.pop();
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_integral_number_has_no_fraction() {
        assert_eq!(Cell::Number(1001.0).render(), "1001");
        assert_eq!(Cell::Number(59.5).render(), "59.5");
        assert_eq!(Cell::Text("  G1 ".into()).render(), "G1");
        assert_eq!(Cell::Empty.render(), "");
    }

    #[test]
    fn test_rows_are_fitted_to_header_width() {
        let table = RawTable::new(
            "a.csv",
            vec!["g".into(), "id".into(), "name".into()],
            vec![
                vec![Cell::Text("G1".into())],
                vec![
                    Cell::Text("G1".into()),
                    Cell::Text("1".into()),
                    Cell::Text("Ana".into()),
                    Cell::Text("extra".into()),
                ],
            ],
        );

        assert_eq!(table.rows[0].len(), 3);
        assert_eq!(table.rows[0][2], Cell::Empty);
        assert_eq!(table.rows[1].len(), 3);
    }

    #[test]
    fn test_trim_blank_rows() {
        let table = RawTable::new(
            "a.csv",
            vec!["g".into()],
            vec![vec![Cell::Text("G1".into())], vec![Cell::Empty], vec![Cell::Empty]],
        )
        .trim_blank_rows();

        assert_eq!(table.rows.len(), 1);
    }

    #[test]
    fn test_from_field() {
        assert_eq!(Cell::from_field(""), Cell::Empty);
        assert_eq!(Cell::from_field(" 7 "), Cell::Text(" 7 ".into()));
    }
}
