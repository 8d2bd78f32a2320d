//! Deterministic feature/label separation and partitioning.
//!
//! All shuffles run on a ChaCha stream seeded from the training config, so
//! a fixed seed reproduces partitions and folds exactly.

use crate::models::{FlexionError, Result};
use crate::pipeline::ScaledDataset;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

/// Split the scaled dataset into a row-major `N x 1` feature matrix and the
/// aligned label vector. No reordering happens here.
pub fn split_features_labels(data: &ScaledDataset) -> (Vec<Vec<f64>>, Vec<String>) {
    let x = data.flex_values_scaled.iter().map(|&v| vec![v]).collect();
    (x, data.labels.clone())
}

/// Encode labels as indices into the sorted unique class list.
pub fn encode_labels(labels: &[String]) -> (Vec<String>, Vec<usize>) {
    let mut classes = labels.to_vec();
    classes.sort();
    classes.dedup();

    let y = labels
        .iter()
        .map(|label| classes.binary_search(label).unwrap_or(0))
        .collect();
    (classes, y)
}

/// Seeded random train/test partition over row indices `0..n`.
///
/// The test partition takes `ceil(n * test_ratio)` rows, the train partition
/// the rest, so a 0.2 ratio over 10 rows gives 8/2 and over 11 rows 8/3.
pub fn train_test_split(
    n: usize,
    test_ratio: f64,
    seed: u64,
) -> Result<(Vec<usize>, Vec<usize>)> {
    if !(test_ratio > 0.0 && test_ratio < 1.0) {
        return Err(FlexionError::InvalidInput(format!(
            "test_ratio must be in (0, 1), got {test_ratio}"
        )));
    }

    let n_test = (n as f64 * test_ratio).ceil() as usize;
    let n_train = n.saturating_sub(n_test);
    if n_test == 0 || n_train == 0 {
        return Err(FlexionError::InvalidInput(format!(
            "cannot split {n} rows into {n_train} train / {n_test} test"
        )));
    }

    let mut indices: Vec<usize> = (0..n).collect();
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    indices.shuffle(&mut rng);

    let test = indices[..n_test].to_vec();
    let train = indices[n_test..].to_vec();
    Ok((train, test))
}

/// Seeded k-fold partition of the given indices into near-equal folds.
///
/// The first `len % folds` folds take one extra element.
pub fn kfold(indices: &[usize], folds: usize, seed: u64) -> Result<Vec<Vec<usize>>> {
    if folds < 2 {
        return Err(FlexionError::InvalidInput(format!(
            "cross-validation needs at least 2 folds, got {folds}"
        )));
    }
    if indices.len() < folds {
        return Err(FlexionError::InvalidInput(format!(
            "cannot split {} rows into {folds} folds",
            indices.len()
        )));
    }

    let mut shuffled = indices.to_vec();
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    shuffled.shuffle(&mut rng);

    let base = shuffled.len() / folds;
    let extra = shuffled.len() % folds;
    let mut out = Vec::with_capacity(folds);
    let mut start = 0;
    for fold in 0..folds {
        let size = base + usize::from(fold < extra);
        out.push(shuffled[start..start + size].to_vec());
        start += size;
    }
    Ok(out)
}

/// Materialize the rows named by `indices` from `x`/`y`.
pub fn gather(
    x: &[Vec<f64>],
    y: &[usize],
    indices: &[usize],
) -> (Vec<Vec<f64>>, Vec<usize>) {
    let gx = indices.iter().map(|&i| x[i].clone()).collect();
    let gy = indices.iter().map(|&i| y[i]).collect();
    (gx, gy)
}
