//! Evaluation metrics for the classifier.

use std::fmt;

/// Confusion matrix for a `K`-class classifier.
#[derive(Debug, Clone)]
pub struct ConfusionMatrix {
    /// Number of classes.
    pub n_classes: usize,
    /// Row-major `KxK` counts (`truth * K + predicted`).
    pub counts: Vec<u32>,
}

impl ConfusionMatrix {
    /// Create an empty `KxK` confusion matrix.
    pub fn new(n_classes: usize) -> Self {
        Self {
            n_classes,
            counts: vec![0; n_classes * n_classes],
        }
    }

    /// Tally the matrix from aligned truth/prediction slices.
    pub fn from_predictions(truth: &[usize], predicted: &[usize], n_classes: usize) -> Self {
        let mut cm = Self::new(n_classes);
        for (&t, &p) in truth.iter().zip(predicted) {
            cm.add(t, p);
        }
        cm
    }

    pub fn add(&mut self, truth: usize, predicted: usize) {
        if truth >= self.n_classes || predicted >= self.n_classes {
            return;
        }
        let idx = truth * self.n_classes + predicted;
        self.counts[idx] = self.counts[idx].saturating_add(1);
    }

    pub fn get(&self, truth: usize, predicted: usize) -> u32 {
        self.counts[truth * self.n_classes + predicted]
    }

    /// Fraction of predictions on the diagonal. Empty matrix scores 0.
    pub fn accuracy(&self) -> f64 {
        let mut correct = 0u64;
        let mut total = 0u64;
        for truth in 0..self.n_classes {
            for predicted in 0..self.n_classes {
                let v = self.get(truth, predicted) as u64;
                total += v;
                if truth == predicted {
                    correct += v;
                }
            }
        }
        if total == 0 {
            0.0
        } else {
            correct as f64 / total as f64
        }
    }
}

/// Accuracy over aligned truth/prediction slices. Empty input scores 0.
pub fn accuracy_score(truth: &[usize], predicted: &[usize]) -> f64 {
    if truth.is_empty() {
        return 0.0;
    }
    let correct = truth
        .iter()
        .zip(predicted)
        .filter(|(t, p)| t == p)
        .count();
    correct as f64 / truth.len() as f64
}

/// Precision/recall/F1 for a single class.
#[derive(Debug, Clone)]
pub struct PerClassStats {
    /// Class label.
    pub label: String,
    /// `TP / (TP + FP)`; 0 when the class was never predicted.
    pub precision: f64,
    /// `TP / (TP + FN)`; 0 when the class has no true examples.
    pub recall: f64,
    /// Harmonic mean of precision and recall.
    pub f1: f64,
    /// Number of true examples for the class.
    pub support: u32,
}

/// Per-class breakdown plus overall accuracy for an evaluation pass.
#[derive(Debug, Clone)]
pub struct ClassificationReport {
    pub per_class: Vec<PerClassStats>,
    pub accuracy: f64,
    pub total: u32,
}

impl ClassificationReport {
    /// Build the report from aligned truth/prediction slices.
    pub fn from_predictions(truth: &[usize], predicted: &[usize], classes: &[String]) -> Self {
        let cm = ConfusionMatrix::from_predictions(truth, predicted, classes.len());
        let k = cm.n_classes;
        let mut per_class = Vec::with_capacity(k);

        for class_idx in 0..k {
            let tp = cm.get(class_idx, class_idx) as f64;
            let mut fp = 0f64;
            let mut fn_ = 0f64;
            let mut support = 0u32;
            for j in 0..k {
                let v = cm.get(class_idx, j);
                support = support.saturating_add(v);
                if j != class_idx {
                    fn_ += v as f64;
                }
            }
            for i in 0..k {
                if i != class_idx {
                    fp += cm.get(i, class_idx) as f64;
                }
            }

            let precision = if tp + fp == 0.0 { 0.0 } else { tp / (tp + fp) };
            let recall = if tp + fn_ == 0.0 { 0.0 } else { tp / (tp + fn_) };
            let f1 = if precision + recall == 0.0 {
                0.0
            } else {
                2.0 * precision * recall / (precision + recall)
            };

            per_class.push(PerClassStats {
                label: classes[class_idx].clone(),
                precision,
                recall,
                f1,
                support,
            });
        }

        Self {
            per_class,
            accuracy: cm.accuracy(),
            total: truth.len() as u32,
        }
    }
}

impl fmt::Display for ClassificationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{:>12}  {:>9}  {:>9}  {:>9}  {:>8}",
            "", "precision", "recall", "f1-score", "support"
        )?;
        writeln!(f)?;
        for stats in &self.per_class {
            writeln!(
                f,
                "{:>12}  {:>9.3}  {:>9.3}  {:>9.3}  {:>8}",
                stats.label, stats.precision, stats.recall, stats.f1, stats.support
            )?;
        }
        writeln!(f)?;
        writeln!(
            f,
            "{:>12}  {:>9}  {:>9}  {:>9.3}  {:>8}",
            "accuracy", "", "", self.accuracy, self.total
        )
    }
}
