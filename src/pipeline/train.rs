//! End-to-end training pipeline.
//!
//! Load → validate → preprocess → split → cross-validate → fit → evaluate →
//! persist. Every stage logs what it did; any failure is logged with its
//! cause and propagated; there is no silent recovery.

use crate::artifact::{ArtifactStore, ModelArtifact};
use crate::forest::{accuracy_score, ClassificationReport, ForestParams, RandomForest};
use crate::models::{Config, Dataset, FlexionError, Result, TrainingConfig};
use crate::pipeline::{
    encode_labels, gather, kfold, preprocess, split_features_labels, train_test_split, validate,
};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, error, info};

/// Statistics for a completed training run.
#[derive(Debug, Clone)]
pub struct TrainingSummary {
    /// Rows in the input dataset
    pub rows: usize,
    /// Sorted class labels
    pub classes: Vec<String>,
    /// Rows in the training partition
    pub train_size: usize,
    /// Rows in the held-out test partition
    pub test_size: usize,
    /// Per-fold cross-validation accuracies
    pub cv_scores: Vec<f64>,
    /// Mean of the cross-validation accuracies
    pub cv_mean: f64,
    /// Accuracy on the held-out partition
    pub test_accuracy: f64,
    /// Per-class precision/recall/F1 on the held-out partition
    pub report: ClassificationReport,
    /// Where the artifact was written
    pub artifact_path: PathBuf,
    /// Wall-clock runtime in seconds
    pub runtime_secs: f64,
}

/// Training pipeline: raw CSV in, persisted model artifact out.
pub struct TrainingPipeline {
    training: TrainingConfig,
    store: ArtifactStore,
}

impl TrainingPipeline {
    /// Create a pipeline from configuration.
    pub fn new(config: &Config) -> Self {
        Self {
            training: config.training.clone(),
            store: ArtifactStore::new(&config.output.model_dir),
        }
    }

    /// Run the full pipeline on a training file.
    pub fn run(&self, data_path: &Path) -> Result<TrainingSummary> {
        let result = self.execute(data_path);
        if let Err(e) = &result {
            match e {
                FlexionError::Validation(cause) => {
                    error!(error = %cause, "Data validation failed")
                }
                _ => error!(error = %e, "Training failed"),
            }
        }
        result
    }

    fn execute(&self, data_path: &Path) -> Result<TrainingSummary> {
        let start = Instant::now();
        self.training.validate()?;

        info!(path = %data_path.display(), "Starting training run");
        let dataset = Dataset::from_csv_path(data_path)?;
        validate(&dataset)?;

        let (scaled, scaler) = preprocess(&dataset)?;
        let (x, labels) = split_features_labels(&scaled);
        let (classes, y) = encode_labels(&labels);
        info!(
            rows = x.len(),
            classes = classes.len(),
            "Prepared feature matrix"
        );

        let (train_idx, test_idx) =
            train_test_split(x.len(), self.training.test_ratio, self.training.seed)?;
        info!(
            train = train_idx.len(),
            test = test_idx.len(),
            "Partitioned dataset"
        );

        let params = ForestParams {
            trees: self.training.trees,
            max_depth: self.training.max_depth,
            min_samples_split: self.training.min_samples_split,
            seed: self.training.seed,
        };

        let cv_scores = self.cross_validate(&x, &y, &classes, &train_idx, &params)?;
        let cv_mean = mean(&cv_scores);
        info!(scores = ?cv_scores, mean = cv_mean, "Cross-validation complete");

        let (train_x, train_y) = gather(&x, &y, &train_idx);
        let forest = RandomForest::fit(&train_x, &train_y, &classes, &params)?;

        let (test_x, test_y) = gather(&x, &y, &test_idx);
        let predicted = forest.predict(&test_x);
        let test_accuracy = accuracy_score(&test_y, &predicted);
        let report = ClassificationReport::from_predictions(&test_y, &predicted, &classes);
        info!(accuracy = test_accuracy, "Evaluated held-out partition");

        let artifact = ModelArtifact::new(scaler, forest);
        let artifact_path = self.store.save(&artifact)?;
        info!(path = %artifact_path.display(), "Persisted model artifact");

        Ok(TrainingSummary {
            rows: dataset.len(),
            classes,
            train_size: train_idx.len(),
            test_size: test_idx.len(),
            cv_scores,
            cv_mean,
            test_accuracy,
            report,
            artifact_path,
            runtime_secs: start.elapsed().as_secs_f64(),
        })
    }

    /// One fit/score cycle per fold, on the training partition only. Scores
    /// are reported, never used for model selection.
    fn cross_validate(
        &self,
        x: &[Vec<f64>],
        y: &[usize],
        classes: &[String],
        train_idx: &[usize],
        params: &ForestParams,
    ) -> Result<Vec<f64>> {
        let folds = kfold(train_idx, self.training.cv_folds, self.training.seed)?;
        let mut scores = Vec::with_capacity(folds.len());

        for (fold_idx, holdout) in folds.iter().enumerate() {
            let fit_idx: Vec<usize> = folds
                .iter()
                .enumerate()
                .filter(|(i, _)| *i != fold_idx)
                .flat_map(|(_, fold)| fold.iter().copied())
                .collect();

            let (fit_x, fit_y) = gather(x, y, &fit_idx);
            let model = RandomForest::fit(&fit_x, &fit_y, classes, params)?;

            let (val_x, val_y) = gather(x, y, holdout);
            let predicted = model.predict(&val_x);
            let score = accuracy_score(&val_y, &predicted);
            debug!(fold = fold_idx + 1, score, "Scored fold");
            scores.push(score);
        }

        Ok(scores)
    }
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}
