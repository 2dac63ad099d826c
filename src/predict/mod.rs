//! Prediction and inference
//!
//! Serve win probabilities from the current classifier, fall back to the
//! heuristic, and retrain on demand.

pub mod heuristic;
pub mod inference;
pub mod store;

pub use heuristic::{heuristic_probability, heuristic_score};
pub use inference::{
    format_prediction, DefaultBackend, Prediction, PredictionSource, Predictor, TrainOutcome,
    UpcomingPrediction,
};
pub use store::{MemoryModelStore, ModelArtifact, ModelMetadata, ModelStore, ModelVersion, StoredModel};
