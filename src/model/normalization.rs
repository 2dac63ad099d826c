//! Z-score feature normalization fitted on the training set

use burn::tensor::backend::Backend;
use burn::tensor::Tensor;
use serde::{Deserialize, Serialize};

/// Floor for the per-feature standard deviation
const MIN_STD: f32 = 0.001;

/// Per-feature mean and standard deviation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureNormalization {
    pub mean: Vec<f32>,
    pub std: Vec<f32>,
}

impl FeatureNormalization {
    /// Identity normalization for `dim` features
    pub fn identity(dim: usize) -> Self {
        FeatureNormalization {
            mean: vec![0.0; dim],
            std: vec![1.0; dim],
        }
    }

    /// Compute from training rows; all rows must have length `dim`
    pub fn fit(rows: &[Vec<f32>], dim: usize) -> Self {
        if rows.is_empty() {
            return Self::identity(dim);
        }

        let mut sum = vec![0.0f32; dim];
        let mut sum_sq = vec![0.0f32; dim];
        for row in rows {
            for (j, v) in row.iter().take(dim).enumerate() {
                sum[j] += v;
                sum_sq[j] += v * v;
            }
        }

        let n = rows.len() as f32;
        let mean: Vec<f32> = sum.iter().map(|s| s / n).collect();
        let std: Vec<f32> = sum_sq
            .iter()
            .zip(mean.iter())
            .map(|(sq, m)| (sq / n - m * m).max(0.0).sqrt().max(MIN_STD))
            .collect();

        FeatureNormalization { mean, std }
    }

    pub fn dim(&self) -> usize {
        self.mean.len()
    }

    /// Normalize a feature tensor using z-score: (x - mean) / std
    pub fn normalize<B: Backend>(&self, features: Tensor<B, 2>) -> Tensor<B, 2> {
        let device = features.device();
        let mean = Tensor::<B, 1>::from_floats(self.mean.as_slice(), &device).unsqueeze_dim(0);
        let std = Tensor::<B, 1>::from_floats(self.std.as_slice(), &device).unsqueeze_dim(0);
        (features - mean) / std
    }
}
