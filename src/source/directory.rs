use std::fs;
use std::path::{Path, PathBuf};

use calamine::{Data, Reader, open_workbook_auto};
use tracing::debug;

use super::reader::{Fingerprint, FingerprintBuilder, SourceLoad, SourceReader};
use super::table::{Cell, RawTable};
use crate::config::PipelineConfig;
use crate::error::SourceError;

const WORKBOOK_EXTENSIONS: &[&str] = &["xlsx", "xlsm", "xls", "ods"];
const CSV_EXTENSION: &str = "csv";

/// Reads every supported spreadsheet directly inside a directory.
///
/// Workbooks are read from the configured sheet; CSV files have a single
/// implicit sheet and ignore the selector.
pub struct DirectorySource {
    dir: PathBuf,
    sheet_name: String,
}

impl DirectorySource {
    pub fn new(dir: impl Into<PathBuf>, sheet_name: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            sheet_name: sheet_name.into(),
        }
    }

    pub fn from_config(config: &PipelineConfig) -> Self {
        Self::new(&config.source_dir, &config.sheet_name)
    }

    /// Lists supported files, sorted by path so runs are reproducible.
    pub fn discover(&self) -> Result<Vec<PathBuf>, SourceError> {
        let mut paths = Vec::new();

        for entry in fs::read_dir(&self.dir)? {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }

            let path = entry.path();
            if is_lock_file(&path) || source_kind(&path).is_none() {
                continue;
            }
            paths.push(path);
        }

        paths.sort();
        debug!(dir = %self.dir.display(), files = paths.len(), "Discovered source files");
        Ok(paths)
    }

    fn read(&self, path: &Path) -> Result<RawTable, SourceError> {
        let table = match source_kind(path) {
            Some(SourceKind::Csv) => read_csv(path)?,
            _ => read_workbook(path, &self.sheet_name)?,
        };
        Ok(table.trim_blank_rows())
    }
}

impl SourceReader for DirectorySource {
    fn load(&self) -> Result<Vec<SourceLoad>, SourceError> {
        let loads = self
            .discover()?
            .into_iter()
            .map(|path| {
                let table = self.read(&path);
                SourceLoad {
                    source: display_name(&path),
                    table,
                }
            })
            .collect();
        Ok(loads)
    }

    fn fingerprint(&self) -> Result<Fingerprint, SourceError> {
        let mut builder = FingerprintBuilder::new();
        builder.chunk(self.sheet_name.as_bytes());

        for path in self.discover()? {
            builder.chunk(display_name(&path).as_bytes());
            // An unreadable file still has to move the fingerprint once it
            // becomes readable again.
            match fs::read(&path) {
                Ok(bytes) => builder.chunk(&bytes),
                Err(e) => builder.chunk(format!("unreadable:{e}").as_bytes()),
            };
        }

        Ok(builder.finish())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SourceKind {
    Workbook,
    Csv,
}

fn source_kind(path: &Path) -> Option<SourceKind> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    if ext == CSV_EXTENSION {
        Some(SourceKind::Csv)
    } else if WORKBOOK_EXTENSIONS.contains(&ext.as_str()) {
        Some(SourceKind::Workbook)
    } else {
        None
    }
}

/// Office writes `~$name.xlsx` lock files next to open workbooks.
fn is_lock_file(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.starts_with("~$"))
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn read_workbook(path: &Path, sheet: &str) -> Result<RawTable, SourceError> {
    let mut workbook = open_workbook_auto(path)?;

    let available = workbook.sheet_names();
    if !available.iter().any(|name| name == sheet) {
        return Err(SourceError::SheetNotFound {
            sheet: sheet.to_string(),
            available,
        });
    }

    let range = workbook.worksheet_range(sheet)?;
    let mut rows = range.rows();

    let headers: Vec<String> = rows
        .next()
        .map(|header| header.iter().map(|d| to_cell(d).render()).collect())
        .unwrap_or_default();
    let body: Vec<Vec<Cell>> = rows.map(|row| row.iter().map(to_cell).collect()).collect();

    Ok(RawTable::new(display_name(path), headers, body))
}

fn read_csv(path: &Path) -> Result<RawTable, SourceError> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_path(path)?;

    let headers: Vec<String> = rdr.headers()?.iter().map(|h| h.trim().to_string()).collect();

    let mut rows = Vec::new();
    for result in rdr.records() {
        let record = result?;
        rows.push(record.iter().map(Cell::from_field).collect());
    }

    Ok(RawTable::new(display_name(path), headers, rows))
}

/// Error cells such as `#N/A` read as blanks; booleans and dates keep their
/// text form and are later rejected as non-numeric scores.
fn to_cell(data: &Data) -> Cell {
    match data {
        Data::Empty | Data::Error(_) => Cell::Empty,
        Data::Int(i) => Cell::Number(*i as f64),
        Data::Float(f) => Cell::Number(*f),
        Data::String(s) => Cell::Text(s.clone()),
        other => Cell::Text(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_xlsxwriter::Workbook;
    use std::fs;
    use tempfile::tempdir;

    /// A cover sheet first, then one grade row on `sheet` with Science blank.
    fn write_workbook(path: &Path, sheet: &str) {
        let mut workbook = Workbook::new();
        let cover = workbook.add_worksheet();
        cover.set_name("Portada").unwrap();
        cover.write_string(0, 0, "Calificaciones").unwrap();

        let grades = workbook.add_worksheet();
        grades.set_name(sheet).unwrap();
        for (col, header) in ["Grupo", "Matricula", "Nombre", "Math", "Science"]
            .into_iter()
            .enumerate()
        {
            grades.write_string(0, col as u16, header).unwrap();
        }
        grades.write_string(1, 0, "G1").unwrap();
        grades.write_number(1, 1, 1001).unwrap();
        grades.write_string(1, 2, "Ana").unwrap();
        grades.write_number(1, 3, 55.5).unwrap();

        workbook.save(path).unwrap();
    }

    #[test]
    fn test_discover_filters_and_sorts() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("b.csv"), "g,id,n,M\n").unwrap();
        fs::write(dir.path().join("a.xlsx"), b"not really").unwrap();
        fs::write(dir.path().join("~$a.xlsx"), b"lock").unwrap();
        fs::write(dir.path().join("notes.txt"), "ignore").unwrap();
        fs::create_dir(dir.path().join("nested.csv")).unwrap();

        let source = DirectorySource::new(dir.path(), "Hoja1");
        let names: Vec<_> = source
            .discover()
            .unwrap()
            .iter()
            .map(|p| display_name(p))
            .collect();

        assert_eq!(names, vec!["a.xlsx", "b.csv"]);
    }

    #[test]
    fn test_missing_directory_is_an_error() {
        let source = DirectorySource::new("/definitely/not/here", "Hoja1");
        assert!(matches!(source.load(), Err(SourceError::Io(_))));
    }

    #[test]
    fn test_csv_is_read_with_blank_cells() {
        let dir = tempdir().unwrap();
        fs::write(
            dir.path().join("g1.csv"),
            "Group,ID,Name,Math,Science\nG1,001,Ana,55,\n",
        )
        .unwrap();

        let source = DirectorySource::new(dir.path(), "Hoja1");
        let loads = source.load().unwrap();
        assert_eq!(loads.len(), 1);

        let table = loads[0].table.as_ref().unwrap();
        assert_eq!(table.headers, vec!["Group", "ID", "Name", "Math", "Science"]);
        assert_eq!(table.rows[0][1], Cell::Text("001".into()));
        assert_eq!(table.rows[0][4], Cell::Empty);
    }

    #[test]
    fn test_corrupt_workbook_is_isolated() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("broken.xlsx"), b"this is not a zip").unwrap();
        fs::write(dir.path().join("good.csv"), "g,id,n,Math\nG1,1,Ana,70\n").unwrap();

        let loads = DirectorySource::new(dir.path(), "Hoja1").load().unwrap();
        assert_eq!(loads.len(), 2);
        assert!(loads[0].table.is_err());
        assert!(loads[1].table.is_ok());
    }

    #[test]
    fn test_fingerprint_tracks_content() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("g1.csv");
        fs::write(&file, "g,id,n,Math\nG1,1,Ana,70\n").unwrap();

        let source = DirectorySource::new(dir.path(), "Hoja1");
        let first = source.fingerprint().unwrap();
        assert_eq!(first, source.fingerprint().unwrap());

        fs::write(&file, "g,id,n,Math\nG1,1,Ana,50\n").unwrap();
        assert_ne!(first, source.fingerprint().unwrap());
    }

    #[test]
    fn test_fingerprint_depends_on_sheet_selector() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("g1.csv"), "g,id,n,Math\n").unwrap();

        let a = DirectorySource::new(dir.path(), "Hoja1").fingerprint().unwrap();
        let b = DirectorySource::new(dir.path(), "Sheet1").fingerprint().unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_workbook_reads_selected_sheet() {
        let dir = tempdir().unwrap();
        write_workbook(&dir.path().join("g1.xlsx"), "Hoja1");

        let loads = DirectorySource::new(dir.path(), "Hoja1").load().unwrap();
        let table = loads[0].table.as_ref().unwrap();

        assert_eq!(table.source, "g1.xlsx");
        assert_eq!(table.headers, vec!["Grupo", "Matricula", "Nombre", "Math", "Science"]);
        assert_eq!(table.rows.len(), 1);
        assert_eq!(table.rows[0][0], Cell::Text("G1".into()));
        assert_eq!(table.rows[0][1].render(), "1001");
        assert_eq!(table.rows[0][3], Cell::Number(55.5));
        assert_eq!(table.rows[0][4], Cell::Empty);
    }

    #[test]
    fn test_workbook_without_sheet_is_rejected() {
        let dir = tempdir().unwrap();
        write_workbook(&dir.path().join("a.xlsx"), "Other");
        fs::write(dir.path().join("b.csv"), "g,id,n,Math\nG1,1,Ana,70\n").unwrap();

        let loads = DirectorySource::new(dir.path(), "Hoja1").load().unwrap();
        assert_eq!(loads.len(), 2);
        match &loads[0].table {
            Err(SourceError::SheetNotFound { sheet, available }) => {
                assert_eq!(sheet, "Hoja1");
                assert_eq!(available, &vec!["Portada".to_string(), "Other".to_string()]);
            }
            other => panic!("expected a missing sheet, got {other:?}"),
        }
        assert!(loads[1].table.is_ok());
    }
}
