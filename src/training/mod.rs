//! Model training
//!
//! Builds labelled examples from the match history and fits the win classifier.

pub mod dataset;
pub mod trainer;

pub use dataset::{build_examples, TrainingExample};
pub use trainer::{ClassifierTrainer, TrainedClassifier, TrainingReport};
