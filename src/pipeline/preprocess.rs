//! Numeric parsing and feature standardization.

use crate::models::{Dataset, FlexionError, Result, FLEX_VALUE_COLUMN, LABEL_COLUMN};
use serde::{Deserialize, Serialize};
use tracing::info;

/// Fitted standardization transform for the flex value feature.
///
/// Persisted inside the model artifact so inference-time scaling uses the
/// exact statistics the training run used.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StandardScaler {
    pub mean: f64,
    pub std_dev: f64,
}

impl StandardScaler {
    /// Fit over all values (population standard deviation).
    pub fn fit(values: &[f64]) -> Result<Self> {
        if values.is_empty() {
            return Err(FlexionError::InvalidInput(
                "cannot fit a scaler on an empty column".to_string(),
            ));
        }
        let n = values.len() as f64;
        let mean = values.iter().sum::<f64>() / n;
        let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
        Ok(Self {
            mean,
            std_dev: variance.sqrt(),
        })
    }

    /// Standardize one value. A zero-variance column maps every value to 0.
    pub fn transform(&self, value: f64) -> f64 {
        let scale = if self.std_dev == 0.0 { 1.0 } else { self.std_dev };
        (value - self.mean) / scale
    }

    /// Standardize a slice of values.
    pub fn transform_all(&self, values: &[f64]) -> Vec<f64> {
        values.iter().map(|&v| self.transform(v)).collect()
    }
}

/// Derived dataset after parsing and scaling, index-aligned with the input.
#[derive(Debug, Clone)]
pub struct ScaledDataset {
    /// Raw flex values as parsed
    pub flex_values: Vec<f64>,
    /// Standardized flex values
    pub flex_values_scaled: Vec<f64>,
    /// Label cells, untouched
    pub labels: Vec<String>,
}

impl ScaledDataset {
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

/// Parse the feature column to finite floats and standardize it.
///
/// The scaler is fitted over the entire dataset, including rows that later
/// land in the test partition. A cell that survived validation but is not a
/// finite number is a parse error naming the row.
pub fn preprocess(dataset: &Dataset) -> Result<(ScaledDataset, StandardScaler)> {
    let raw = dataset.column(FLEX_VALUE_COLUMN).ok_or_else(|| {
        FlexionError::Internal("flex_value column absent after validation".to_string())
    })?;
    let raw_labels = dataset.column(LABEL_COLUMN).ok_or_else(|| {
        FlexionError::Internal("label column absent after validation".to_string())
    })?;

    let mut flex_values = Vec::with_capacity(raw.len());
    for (idx, cell) in raw.iter().enumerate() {
        let value: f64 = cell.trim().parse().map_err(|_| {
            FlexionError::ParseError(format!(
                "Row {}: flex_value '{}' is not numeric",
                idx + 1,
                cell
            ))
        })?;
        if !value.is_finite() {
            return Err(FlexionError::ParseError(format!(
                "Row {}: flex_value '{}' is not finite",
                idx + 1,
                cell
            )));
        }
        flex_values.push(value);
    }

    let scaler = StandardScaler::fit(&flex_values)?;
    let flex_values_scaled = scaler.transform_all(&flex_values);
    let labels = raw_labels.iter().map(|s| s.to_string()).collect();

    info!(
        mean = scaler.mean,
        std_dev = scaler.std_dev,
        "Fitted feature scaler"
    );

    Ok((
        ScaledDataset {
            flex_values,
            flex_values_scaled,
            labels,
        },
        scaler,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dataset(flex: &[&str], labels: &[&str]) -> Dataset {
        let headers = vec!["flex_value".to_string(), "label".to_string()];
        let rows = flex
            .iter()
            .zip(labels)
            .map(|(f, l)| vec![f.to_string(), l.to_string()])
            .collect();
        Dataset::new(headers, rows)
    }

    #[test]
    fn test_scaler_fit() {
        // mean 5, population std 2
        let values = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        let scaler = StandardScaler::fit(&values).unwrap();
        assert!((scaler.mean - 5.0).abs() < 1e-12);
        assert!((scaler.std_dev - 2.0).abs() < 1e-12);
        assert!((scaler.transform(9.0) - 2.0).abs() < 1e-12);
        assert!((scaler.transform(5.0)).abs() < 1e-12);
    }

    #[test]
    fn test_scaler_zero_variance_maps_to_zero() {
        let scaler = StandardScaler::fit(&[3.0, 3.0, 3.0]).unwrap();
        assert_eq!(scaler.std_dev, 0.0);
        assert_eq!(scaler.transform(3.0), 0.0);
    }

    #[test]
    fn test_scaler_rejects_empty() {
        assert!(StandardScaler::fit(&[]).is_err());
    }

    #[test]
    fn test_preprocess_scales_and_keeps_alignment() {
        let data = dataset(&["100", "200", "300"], &["Low", "Medium", "High"]);
        let (scaled, scaler) = preprocess(&data).unwrap();

        assert_eq!(scaled.len(), 3);
        assert_eq!(scaled.flex_values, vec![100.0, 200.0, 300.0]);
        assert_eq!(scaled.labels, vec!["Low", "Medium", "High"]);
        assert!((scaler.mean - 200.0).abs() < 1e-12);
        // middle row standardizes to zero
        assert!(scaled.flex_values_scaled[1].abs() < 1e-12);
        assert!(scaled.flex_values_scaled[0] < 0.0);
        assert!(scaled.flex_values_scaled[2] > 0.0);
    }

    #[test]
    fn test_preprocess_rejects_non_numeric() {
        let data = dataset(&["100", "not-a-number", "300"], &["a", "b", "c"]);
        match preprocess(&data) {
            Err(FlexionError::ParseError(msg)) => {
                assert!(msg.contains("Row 2"), "message was: {msg}");
                assert!(msg.contains("not-a-number"));
            }
            other => panic!("expected ParseError, got {other:?}"),
        }
    }

    #[test]
    fn test_preprocess_rejects_non_finite() {
        let data = dataset(&["100", "inf"], &["a", "b"]);
        match preprocess(&data) {
            Err(FlexionError::ParseError(msg)) => assert!(msg.contains("not finite")),
            other => panic!("expected ParseError, got {other:?}"),
        }
    }
}
