//! Structural dataset validation.
//!
//! Checks run in a fixed order and fail fast on the first violation:
//! non-empty, required columns present, minimum row count, no missing
//! values in either required column.

use crate::models::{is_missing, DataValidationError, Dataset, REQUIRED_COLUMNS};
use tracing::{debug, info};

/// Minimum rows a training file must carry.
pub const MIN_ROWS: usize = 10;

/// Validate a raw dataset, returning the first violated check.
pub fn validate(dataset: &Dataset) -> Result<(), DataValidationError> {
    if dataset.is_empty() {
        return Err(DataValidationError::EmptyDataset);
    }
    debug!("Dataset is non-empty");

    let missing: Vec<String> = REQUIRED_COLUMNS
        .iter()
        .filter(|column| dataset.column_index(column).is_none())
        .map(|column| column.to_string())
        .collect();
    if !missing.is_empty() {
        return Err(DataValidationError::MissingColumns(missing));
    }
    debug!("Required columns present");

    if dataset.len() < MIN_ROWS {
        return Err(DataValidationError::InsufficientRows {
            rows: dataset.len(),
            min: MIN_ROWS,
        });
    }
    debug!(rows = dataset.len(), "Row count sufficient");

    for column in REQUIRED_COLUMNS {
        if let Some(cells) = dataset.column(column) {
            for (idx, cell) in cells.iter().enumerate() {
                if is_missing(cell) {
                    return Err(DataValidationError::NullValue {
                        column: column.to_string(),
                        row: idx + 1,
                    });
                }
            }
        }
    }

    info!(rows = dataset.len(), "Data validation passed");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    fn valid_rows(n: usize) -> Vec<Vec<String>> {
        (0..n)
            .map(|i| vec![format!("{}", 100 + i * 10), "Low".to_string()])
            .collect()
    }

    #[test]
    fn test_valid_dataset_passes() {
        let dataset = Dataset::new(headers(&["flex_value", "label"]), valid_rows(10));
        assert!(validate(&dataset).is_ok());
    }

    #[test]
    fn test_empty_dataset_fails_first() {
        // even a dataset with no headers at all reports emptiness, not columns
        let dataset = Dataset::new(vec![], vec![]);
        assert!(matches!(
            validate(&dataset),
            Err(DataValidationError::EmptyDataset)
        ));

        let with_headers = Dataset::new(headers(&["flex_value", "label"]), vec![]);
        assert!(matches!(
            validate(&with_headers),
            Err(DataValidationError::EmptyDataset)
        ));
    }

    #[test]
    fn test_missing_column_is_named() {
        let dataset = Dataset::new(
            headers(&["flex_value", "confidence"]),
            (0..10).map(|_| vec!["1".to_string(), "2".to_string()]).collect(),
        );
        match validate(&dataset) {
            Err(DataValidationError::MissingColumns(cols)) => {
                assert_eq!(cols, vec!["label".to_string()]);
            }
            other => panic!("expected MissingColumns, got {other:?}"),
        }
    }

    #[test]
    fn test_both_missing_columns_are_named() {
        let dataset = Dataset::new(
            headers(&["reading", "class"]),
            (0..10).map(|_| vec!["1".to_string(), "2".to_string()]).collect(),
        );
        match validate(&dataset) {
            Err(DataValidationError::MissingColumns(cols)) => {
                assert_eq!(cols, vec!["flex_value".to_string(), "label".to_string()]);
            }
            other => panic!("expected MissingColumns, got {other:?}"),
        }
    }

    #[test]
    fn test_missing_columns_reported_before_row_count() {
        let dataset = Dataset::new(headers(&["flex_value"]), vec![vec!["1".to_string()]]);
        assert!(matches!(
            validate(&dataset),
            Err(DataValidationError::MissingColumns(_))
        ));
    }

    #[test]
    fn test_insufficient_rows_regardless_of_columns() {
        let dataset = Dataset::new(headers(&["flex_value", "label"]), valid_rows(9));
        match validate(&dataset) {
            Err(DataValidationError::InsufficientRows { rows, min }) => {
                assert_eq!(rows, 9);
                assert_eq!(min, 10);
            }
            other => panic!("expected InsufficientRows, got {other:?}"),
        }
    }

    #[test]
    fn test_null_in_flex_value_column() {
        let mut data = valid_rows(10);
        data[2][0] = "".to_string();
        let dataset = Dataset::new(headers(&["flex_value", "label"]), data);
        match validate(&dataset) {
            Err(DataValidationError::NullValue { column, row }) => {
                assert_eq!(column, "flex_value");
                assert_eq!(row, 3);
            }
            other => panic!("expected NullValue, got {other:?}"),
        }
    }

    #[test]
    fn test_null_in_label_column() {
        let mut data = valid_rows(10);
        data[7][1] = "n/a".to_string();
        let dataset = Dataset::new(headers(&["flex_value", "label"]), data);
        match validate(&dataset) {
            Err(DataValidationError::NullValue { column, row }) => {
                assert_eq!(column, "label");
                assert_eq!(row, 8);
            }
            other => panic!("expected NullValue, got {other:?}"),
        }
    }

    #[test]
    fn test_flex_column_scanned_before_label() {
        let mut data = valid_rows(10);
        data[1][1] = "na".to_string();
        data[5][0] = "null".to_string();
        let dataset = Dataset::new(headers(&["flex_value", "label"]), data);
        match validate(&dataset) {
            Err(DataValidationError::NullValue { column, row }) => {
                assert_eq!(column, "flex_value");
                assert_eq!(row, 6);
            }
            other => panic!("expected NullValue, got {other:?}"),
        }
    }

    #[test]
    fn test_extra_columns_are_fine() {
        let dataset = Dataset::new(
            headers(&["timestamp", "flex_value", "label"]),
            (0..12)
                .map(|i| {
                    vec![
                        format!("t{i}"),
                        format!("{}", 100 + i),
                        "Medium".to_string(),
                    ]
                })
                .collect(),
        );
        assert!(validate(&dataset).is_ok());
    }
}
