//! flexion - Flex sensor classification: training pipeline and serving glue.
//!
//! ## Architecture
//!
//! flexion has two halves:
//! - **Training**: CSV in, validated and standardized, bagged decision trees
//!   fitted with cross-validation, one JSON artifact out
//! - **Serving**: a stateless inference handler in front of a deployed
//!   endpoint, plus training-data uploads to object storage, both going
//!   through one retrying invoker
//!
//! ## Determinism
//!
//! Every randomized step (train/test split, fold assignment, bootstrap
//! sampling) is driven by seeded ChaCha8 streams, so a fixed seed reproduces
//! the exact partition sizes, fold scores and fitted forest.

pub mod artifact;
pub mod client;
pub mod forest;
pub mod inference;
pub mod models;
pub mod pipeline;

// Re-exports for convenience
pub use artifact::{ArtifactStore, ModelArtifact};
pub use client::{Classification, EndpointClient, Invoker, SensorEndpoint, StorageClient};
pub use forest::{ClassificationReport, RandomForest};
pub use inference::{ApiResponse, InferenceHandler};
pub use models::{Config, Dataset, FlexionError, Result};
pub use pipeline::{StandardScaler, TrainingPipeline, TrainingSummary};
