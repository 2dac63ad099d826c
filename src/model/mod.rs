//! Neural win classifier
//!
//! A small feed-forward network over matchup features, with the z-score
//! normalization fitted alongside it.

pub mod classifier;
pub mod normalization;

pub use classifier::{ClassifierConfig, WinClassifier};
pub use normalization::FeatureNormalization;
