//! Bagged ensemble of decision trees with majority voting.

use crate::forest::tree::{DecisionTree, TreeParams};
use crate::models::{FlexionError, Result};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Ensemble hyperparameters.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ForestParams {
    /// Number of trees
    pub trees: usize,
    /// Maximum depth per tree
    pub max_depth: usize,
    /// Minimum samples required to split a node
    pub min_samples_split: usize,
    /// Seed for bootstrap sampling
    pub seed: u64,
}

impl Default for ForestParams {
    fn default() -> Self {
        Self {
            trees: 100,
            max_depth: 10,
            min_samples_split: 5,
            seed: 42,
        }
    }
}

/// A fitted bagged decision tree classifier.
///
/// Immutable after fit. Serializes into the model artifact together with the
/// ordered class list, so a loaded forest can map votes back to label strings
/// without any side channel.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RandomForest {
    classes: Vec<String>,
    params: ForestParams,
    trees: Vec<DecisionTree>,
}

impl RandomForest {
    /// Fit the ensemble. Each tree trains on a with-replacement resample of
    /// the rows, drawn from its own seeded stream (`seed + tree index`), so
    /// a fixed seed reproduces the forest exactly.
    pub fn fit(
        x: &[Vec<f64>],
        y: &[usize],
        classes: &[String],
        params: &ForestParams,
    ) -> Result<Self> {
        if x.is_empty() {
            return Err(FlexionError::InvalidInput(
                "cannot fit a forest on an empty dataset".to_string(),
            ));
        }
        if x.len() != y.len() {
            return Err(FlexionError::InvalidInput(format!(
                "feature/label length mismatch: {} vs {}",
                x.len(),
                y.len()
            )));
        }
        if classes.is_empty() {
            return Err(FlexionError::InvalidInput(
                "class list is empty".to_string(),
            ));
        }
        if params.trees == 0 {
            return Err(FlexionError::InvalidInput(
                "ensemble needs at least one tree".to_string(),
            ));
        }

        let n = x.len();
        let tree_params = TreeParams {
            max_depth: params.max_depth,
            min_samples_split: params.min_samples_split,
        };

        let mut trees = Vec::with_capacity(params.trees);
        for t in 0..params.trees {
            let mut rng = ChaCha8Rng::seed_from_u64(params.seed.wrapping_add(t as u64));
            let sample: Vec<usize> = (0..n).map(|_| rng.gen_range(0..n)).collect();
            trees.push(DecisionTree::fit(x, y, classes.len(), tree_params, &sample)?);
        }

        debug!(
            trees = trees.len(),
            rows = n,
            classes = classes.len(),
            "Fitted forest"
        );

        Ok(Self {
            classes: classes.to_vec(),
            params: *params,
            trees,
        })
    }

    /// Ordered class list the forest was fitted with.
    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    /// Number of trees in the ensemble.
    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    /// Hyperparameters the forest was fitted with.
    pub fn params(&self) -> &ForestParams {
        &self.params
    }

    /// Majority-vote class index for one feature row. Ties resolve to the
    /// lowest class index.
    pub fn predict_row(&self, row: &[f64]) -> usize {
        let mut votes = vec![0usize; self.classes.len()];
        for tree in &self.trees {
            votes[tree.predict_row(row)] += 1;
        }
        let mut winner = 0;
        for (class, &count) in votes.iter().enumerate() {
            if count > votes[winner] {
                winner = class;
            }
        }
        winner
    }

    /// Predict class indices for a batch of rows.
    pub fn predict(&self, x: &[Vec<f64>]) -> Vec<usize> {
        x.iter().map(|row| self.predict_row(row)).collect()
    }

    /// Predict the label string for one feature row.
    pub fn predict_label(&self, row: &[f64]) -> &str {
        &self.classes[self.predict_row(row)]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classes(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    fn separable() -> (Vec<Vec<f64>>, Vec<usize>) {
        let x: Vec<Vec<f64>> = vec![
            vec![100.0],
            vec![110.0],
            vec![120.0],
            vec![130.0],
            vec![400.0],
            vec![410.0],
            vec![420.0],
            vec![430.0],
        ];
        let y = vec![0, 0, 0, 0, 1, 1, 1, 1];
        (x, y)
    }

    #[test]
    fn test_fit_and_predict_separable() {
        let (x, y) = separable();
        let params = ForestParams {
            trees: 25,
            max_depth: 5,
            min_samples_split: 2,
            seed: 42,
        };
        let forest = RandomForest::fit(&x, &y, &classes(&["Low", "High"]), &params).unwrap();

        assert_eq!(forest.n_trees(), 25);
        assert_eq!(forest.predict(&x), y);
        assert_eq!(forest.predict_label(&[105.0]), "Low");
        assert_eq!(forest.predict_label(&[425.0]), "High");
    }

    #[test]
    fn test_fixed_seed_reproduces_forest() {
        let (x, y) = separable();
        let params = ForestParams {
            trees: 10,
            max_depth: 4,
            min_samples_split: 2,
            seed: 7,
        };
        let labels = classes(&["a", "b"]);

        let first = RandomForest::fit(&x, &y, &labels, &params).unwrap();
        let second = RandomForest::fit(&x, &y, &labels, &params).unwrap();

        let a = serde_json::to_string(&first).unwrap();
        let b = serde_json::to_string(&second).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_serde_round_trip_preserves_predictions() {
        let (x, y) = separable();
        let params = ForestParams {
            trees: 10,
            max_depth: 4,
            min_samples_split: 2,
            seed: 42,
        };
        let forest = RandomForest::fit(&x, &y, &classes(&["lo", "hi"]), &params).unwrap();

        let json = serde_json::to_string(&forest).unwrap();
        let restored: RandomForest = serde_json::from_str(&json).unwrap();
        assert_eq!(restored.predict(&x), forest.predict(&x));
        assert_eq!(restored.classes(), forest.classes());
    }

    #[test]
    fn test_fit_rejects_bad_input() {
        let params = ForestParams::default();
        let labels = classes(&["a"]);

        assert!(RandomForest::fit(&[], &[], &labels, &params).is_err());
        assert!(RandomForest::fit(&[vec![1.0]], &[0, 1], &labels, &params).is_err());
        assert!(RandomForest::fit(&[vec![1.0]], &[0], &[], &params).is_err());

        let no_trees = ForestParams {
            trees: 0,
            ..ForestParams::default()
        };
        assert!(RandomForest::fit(&[vec![1.0]], &[0], &labels, &no_trees).is_err());
    }
}
