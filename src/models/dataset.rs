//! Raw training data as loaded from disk.
//!
//! The dataset keeps the header row and string cells untouched so that
//! structural validation (missing columns, missing values) can point at the
//! exact column and row before any numeric parsing happens. Downstream
//! stages derive new values from it; nothing mutates it in place.

use crate::models::Result;
use std::path::Path;
use tracing::info;

/// Name of the numeric feature column.
pub const FLEX_VALUE_COLUMN: &str = "flex_value";

/// Name of the categorical target column.
pub const LABEL_COLUMN: &str = "label";

/// Columns every training file must carry.
pub const REQUIRED_COLUMNS: [&str; 2] = [FLEX_VALUE_COLUMN, LABEL_COLUMN];

/// An immutable table of string cells with a header row.
#[derive(Debug, Clone)]
pub struct Dataset {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Dataset {
    /// Build a dataset from pre-parsed headers and rows.
    pub fn new(headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        Self { headers, rows }
    }

    /// Load a dataset from a comma-delimited file with a header row.
    ///
    /// Cells are trimmed on read. A ragged row (wrong field count) is a
    /// read error, not a validation error.
    pub fn from_csv_path(path: &Path) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_path(path)?;

        let headers: Vec<String> = reader.headers()?.iter().map(|h| h.to_string()).collect();

        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record?;
            rows.push(record.iter().map(|c| c.to_string()).collect());
        }

        info!(rows = rows.len(), path = %path.display(), "Loaded training data");
        Ok(Self { headers, rows })
    }

    /// Number of data rows (excluding the header).
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the dataset has no data rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Header names in file order.
    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    /// Position of a column by name.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    /// All cells of a column, top to bottom. `None` if the column is absent.
    ///
    /// A cell missing from a short row reads as the empty string, which the
    /// missing-value rules treat as null.
    pub fn column(&self, name: &str) -> Option<Vec<&str>> {
        let idx = self.column_index(name)?;
        Some(
            self.rows
                .iter()
                .map(|row| row.get(idx).map(String::as_str).unwrap_or(""))
                .collect(),
        )
    }
}

/// Whether a cell counts as a missing value.
///
/// Empty and whitespace-only cells are missing, as are the usual NA markers
/// (case-insensitive) that a spreadsheet export produces.
pub fn is_missing(cell: &str) -> bool {
    let trimmed = cell.trim();
    trimmed.is_empty()
        || matches!(
            trimmed.to_ascii_lowercase().as_str(),
            "na" | "n/a" | "nan" | "null"
        )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    fn write_csv(dir: &TempDir, name: &str, content: &str) -> std::path::PathBuf {
        let path = dir.path().join(name);
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(content.as_bytes()).unwrap();
        path
    }

    #[test]
    fn test_from_csv_path() {
        let dir = TempDir::new().unwrap();
        let path = write_csv(
            &dir,
            "train.csv",
            "flex_value,label\n100, Low\n200,Medium\n300,High\n",
        );

        let dataset = Dataset::from_csv_path(&path).unwrap();
        assert_eq!(dataset.len(), 3);
        assert_eq!(dataset.headers(), &["flex_value", "label"]);
        // cells come back trimmed
        assert_eq!(dataset.column("label").unwrap(), vec!["Low", "Medium", "High"]);
        assert_eq!(dataset.column("flex_value").unwrap(), vec!["100", "200", "300"]);
        assert!(dataset.column("confidence").is_none());
    }

    #[test]
    fn test_empty_file_loads_as_empty_dataset() {
        let dir = TempDir::new().unwrap();
        let path = write_csv(&dir, "empty.csv", "");

        let dataset = Dataset::from_csv_path(&path).unwrap();
        assert!(dataset.is_empty());
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("nope.csv");
        assert!(Dataset::from_csv_path(&missing).is_err());
    }

    #[test]
    fn test_is_missing_markers() {
        for cell in ["", "  ", "na", "NA", "n/a", "NaN", "null", "NULL"] {
            assert!(is_missing(cell), "{cell:?} should count as missing");
        }
        for cell in ["0", "420.5", "Low", "-1", "none?"] {
            assert!(!is_missing(cell), "{cell:?} should not count as missing");
        }
    }

    #[test]
    fn test_short_row_reads_as_empty_cell() {
        let dataset = Dataset::new(
            vec!["flex_value".to_string(), "label".to_string()],
            vec![vec!["100".to_string()]],
        );
        assert_eq!(dataset.column("label").unwrap(), vec![""]);
    }
}
