//! Single CART decision tree grown with Gini impurity splits.
//!
//! Trees are stored as a flat node arena (root at index 0) so they
//! serialize cleanly into the model artifact.

use crate::models::{FlexionError, Result};
use serde::{Deserialize, Serialize};

/// Limits applied while growing a tree.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct TreeParams {
    /// Maximum depth; the root sits at depth 0
    pub max_depth: usize,
    /// Minimum samples a node needs before a split is considered
    pub min_samples_split: usize,
}

/// A node in the tree arena.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Node {
    /// Terminal node emitting a class index.
    Leaf { class: usize },
    /// Binary split: rows with `value <= threshold` go left.
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
}

/// A fitted decision tree.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionTree {
    nodes: Vec<Node>,
}

impl DecisionTree {
    /// Fit a tree on the rows named by `sample` (indices into `x`/`y`,
    /// repeats allowed; bootstrap samples arrive this way).
    pub fn fit(
        x: &[Vec<f64>],
        y: &[usize],
        n_classes: usize,
        params: TreeParams,
        sample: &[usize],
    ) -> Result<Self> {
        if x.is_empty() || sample.is_empty() {
            return Err(FlexionError::InvalidInput(
                "cannot fit a tree on an empty sample".to_string(),
            ));
        }
        if x.len() != y.len() {
            return Err(FlexionError::InvalidInput(format!(
                "feature/label length mismatch: {} vs {}",
                x.len(),
                y.len()
            )));
        }
        if let Some(&bad) = sample.iter().find(|&&i| i >= x.len()) {
            return Err(FlexionError::InvalidInput(format!(
                "sample index {bad} out of range for {} rows",
                x.len()
            )));
        }
        if let Some(&bad) = y.iter().find(|&&c| c >= n_classes) {
            return Err(FlexionError::InvalidInput(format!(
                "class index {bad} out of range for {n_classes} classes"
            )));
        }

        let mut builder = TreeBuilder {
            x,
            y,
            n_classes,
            params,
            nodes: Vec::new(),
        };
        builder.grow(sample.to_vec(), 0);
        Ok(Self {
            nodes: builder.nodes,
        })
    }

    /// Predict the class index for a single feature row.
    pub fn predict_row(&self, row: &[f64]) -> usize {
        let mut idx = 0;
        loop {
            match &self.nodes[idx] {
                Node::Leaf { class } => return *class,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    idx = if row[*feature] <= *threshold {
                        *left
                    } else {
                        *right
                    };
                }
            }
        }
    }

    /// Number of nodes in the arena.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Depth of the tree (a lone leaf has depth 0).
    pub fn depth(&self) -> usize {
        self.depth_at(0)
    }

    fn depth_at(&self, idx: usize) -> usize {
        match &self.nodes[idx] {
            Node::Leaf { .. } => 0,
            Node::Split { left, right, .. } => 1 + self.depth_at(*left).max(self.depth_at(*right)),
        }
    }
}

struct TreeBuilder<'a> {
    x: &'a [Vec<f64>],
    y: &'a [usize],
    n_classes: usize,
    params: TreeParams,
    nodes: Vec<Node>,
}

impl TreeBuilder<'_> {
    /// Grow the subtree for `sample`, returning its arena index.
    fn grow(&mut self, sample: Vec<usize>, depth: usize) -> usize {
        let counts = self.class_counts(&sample);
        let node_gini = gini(&counts, sample.len());

        if node_gini == 0.0
            || depth >= self.params.max_depth
            || sample.len() < self.params.min_samples_split
        {
            return self.push_leaf(&counts);
        }

        let Some((feature, threshold)) = self.best_split(&sample, node_gini) else {
            return self.push_leaf(&counts);
        };

        let (left_rows, right_rows): (Vec<usize>, Vec<usize>) = sample
            .into_iter()
            .partition(|&i| self.x[i][feature] <= threshold);
        if left_rows.is_empty() || right_rows.is_empty() {
            return self.push_leaf(&counts);
        }

        // Reserve the split slot before recursing so the root stays at index 0.
        let idx = self.nodes.len();
        self.nodes.push(Node::Leaf { class: 0 });
        let left = self.grow(left_rows, depth + 1);
        let right = self.grow(right_rows, depth + 1);
        self.nodes[idx] = Node::Split {
            feature,
            threshold,
            left,
            right,
        };
        idx
    }

    /// Best (feature, threshold) by weighted Gini, scanning midpoints between
    /// consecutive distinct values. `None` when no split beats the parent.
    fn best_split(&self, sample: &[usize], parent_gini: f64) -> Option<(usize, f64)> {
        let n_features = self.x[sample[0]].len();
        let total = sample.len();
        let mut best: Option<(usize, f64, f64)> = None;

        for feature in 0..n_features {
            let mut ordered: Vec<(f64, usize)> = sample
                .iter()
                .map(|&i| (self.x[i][feature], self.y[i]))
                .collect();
            ordered.sort_by(|a, b| a.0.total_cmp(&b.0));

            let mut left_counts = vec![0usize; self.n_classes];
            let mut right_counts = vec![0usize; self.n_classes];
            for &(_, class) in &ordered {
                right_counts[class] += 1;
            }

            for i in 1..total {
                let (prev_value, prev_class) = ordered[i - 1];
                left_counts[prev_class] += 1;
                right_counts[prev_class] -= 1;

                let value = ordered[i].0;
                if !(value > prev_value) {
                    continue;
                }

                let left_frac = i as f64 / total as f64;
                let weighted = left_frac * gini(&left_counts, i)
                    + (1.0 - left_frac) * gini(&right_counts, total - i);

                if best.map_or(true, |(_, _, score)| weighted < score) {
                    best = Some((feature, (prev_value + value) / 2.0, weighted));
                }
            }
        }

        let (feature, threshold, score) = best?;
        if score >= parent_gini {
            return None;
        }
        Some((feature, threshold))
    }

    /// Leaf with the majority class; ties resolve to the lowest class index.
    fn push_leaf(&mut self, counts: &[usize]) -> usize {
        let mut class = 0;
        for (candidate, &count) in counts.iter().enumerate() {
            if count > counts[class] {
                class = candidate;
            }
        }
        let idx = self.nodes.len();
        self.nodes.push(Node::Leaf { class });
        idx
    }

    fn class_counts(&self, sample: &[usize]) -> Vec<usize> {
        let mut counts = vec![0usize; self.n_classes];
        for &i in sample {
            counts[self.y[i]] += 1;
        }
        counts
    }
}

/// Gini impurity of a node: `1 - Σ (count / n)²`.
fn gini(counts: &[usize], n: usize) -> f64 {
    if n == 0 {
        return 0.0;
    }
    let n = n as f64;
    1.0 - counts
        .iter()
        .map(|&c| {
            let p = c as f64 / n;
            p * p
        })
        .sum::<f64>()
}
