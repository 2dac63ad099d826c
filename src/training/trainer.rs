//! Full-batch SGD training for the win classifier

use burn::module::AutodiffModule;
use burn::optim::{GradientsParams, Optimizer, SgdConfig};
use burn::tensor::backend::AutodiffBackend;
use burn::tensor::{ElementConversion, Tensor};
use serde::{Deserialize, Serialize};

use super::dataset::TrainingExample;
use crate::features::MatchupFeatures;
use crate::model::{ClassifierConfig, FeatureNormalization, WinClassifier};
use crate::{LeagueError, Result, TrainingConfig};

/// Summary of a training run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingReport {
    pub examples: usize,
    pub epochs: usize,
    pub initial_loss: f32,
    pub final_loss: f32,
    /// Accuracy on the training set after the last epoch
    pub accuracy: f32,
}

/// A trained classifier with the normalization it was fitted with
pub struct TrainedClassifier<B: burn::tensor::backend::Backend> {
    pub model: WinClassifier<B>,
    pub config: ClassifierConfig,
    pub normalization: FeatureNormalization,
    pub report: TrainingReport,
}

/// Trainer for the win classifier
pub struct ClassifierTrainer<B: AutodiffBackend> {
    model: WinClassifier<B>,
    config: ClassifierConfig,
    optimizer: burn::optim::adaptor::OptimizerAdaptor<
        burn::optim::Sgd<B::InnerBackend>,
        WinClassifier<B>,
        B,
    >,
    learning_rate: f64,
    epochs: usize,
    device: B::Device,
}

impl<B: AutodiffBackend> ClassifierTrainer<B> {
    /// Create a new trainer
    pub fn new(device: B::Device, training: &TrainingConfig) -> Self {
        let config = ClassifierConfig::new(training.hidden_dim);
        let model = config.init::<B>(&device);
        let optimizer = SgdConfig::new().init();

        ClassifierTrainer {
            model,
            config,
            optimizer,
            learning_rate: training.learning_rate,
            epochs: training.epochs.max(1),
            device,
        }
    }

    /// Train on the given examples and return the inference-ready model
    pub fn fit(
        mut self,
        examples: &[TrainingExample],
    ) -> Result<TrainedClassifier<B::InnerBackend>> {
        if examples.is_empty() {
            return Err(LeagueError::Model("No training examples".to_string()));
        }

        let rows: Vec<Vec<f32>> = examples.iter().map(|e| e.features.to_vec()).collect();
        let normalization = FeatureNormalization::fit(&rows, MatchupFeatures::DIM);
        log::debug!(
            "Feature normalization: mean={:?}, std={:?}",
            normalization.mean,
            normalization.std
        );

        let n = examples.len();
        let flat: Vec<f32> = rows.into_iter().flatten().collect();
        let labels: Vec<f32> = examples.iter().map(|e| e.label).collect();

        let x = normalization.normalize(
            Tensor::<B, 1>::from_floats(flat.as_slice(), &self.device)
                .reshape([n, MatchupFeatures::DIM]),
        );
        let y = Tensor::<B, 1>::from_floats(labels.as_slice(), &self.device).reshape([n, 1]);

        log::info!("Training classifier on {} matches for {} epochs", n, self.epochs);

        let mut initial_loss = f32::NAN;
        let mut final_loss = f32::NAN;

        for epoch in 0..self.epochs {
            let probs = self.model.predict_proba(x.clone());
            let loss = binary_cross_entropy(probs, y.clone());
            let loss_val: f32 = loss.clone().into_scalar().elem();
            if epoch == 0 {
                initial_loss = loss_val;
            }
            final_loss = loss_val;

            let grads = loss.backward();
            let grads_params = GradientsParams::from_grads(grads, &self.model);
            self.model = self.optimizer.step(self.learning_rate, self.model, grads_params);

            if epoch % 100 == 0 || epoch == self.epochs - 1 {
                log::debug!("Epoch {}/{}: loss={:.4}", epoch + 1, self.epochs, loss_val);
            }
        }

        let model = self.model.valid();
        let probs = model.predict_proba(x.inner());
        let accuracy = compute_accuracy(probs, &labels)?;

        log::info!(
            "Training finished: loss {:.4} -> {:.4}, accuracy {:.1}%",
            initial_loss,
            final_loss,
            accuracy * 100.0
        );

        Ok(TrainedClassifier {
            model,
            config: self.config,
            normalization,
            report: TrainingReport {
                examples: n,
                epochs: self.epochs,
                initial_loss,
                final_loss,
                accuracy,
            },
        })
    }
}

fn binary_cross_entropy<B: AutodiffBackend>(
    probs: Tensor<B, 2>,
    targets: Tensor<B, 2>,
) -> Tensor<B, 1> {
    let eps = 1e-7;
    let probs_clamped = probs.clamp(eps, 1.0 - eps);
    let loss = targets.clone().neg() * probs_clamped.clone().log()
        - (targets.neg() + 1.0) * (probs_clamped.neg() + 1.0).log();
    loss.mean()
}

/// Share of examples where the thresholded probability matches the label
pub fn compute_accuracy<B: burn::tensor::backend::Backend>(
    probs: Tensor<B, 2>,
    labels: &[f32],
) -> Result<f32> {
    let probs: Vec<f32> = probs
        .into_data()
        .convert::<f32>()
        .to_vec()
        .map_err(|e| LeagueError::Model(format!("Failed to read probabilities: {:?}", e)))?;
    if probs.is_empty() {
        return Ok(0.0);
    }

    let correct = probs
        .iter()
        .zip(labels)
        .filter(|(p, t)| (**p >= 0.5) == (**t >= 0.5))
        .count();
    Ok(correct as f32 / probs.len() as f32)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MatchId;
    use burn::backend::{Autodiff, NdArray};
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    type TestBackend = Autodiff<NdArray<f32>>;

    /// Examples where team A wins whenever its form and ACS are ahead
    fn separable_examples(n: usize) -> Vec<TrainingExample> {
        let mut rng = StdRng::seed_from_u64(7);
        (0..n)
            .map(|i| {
                let strength: f64 = rng.gen_range(-1.0..1.0);
                let strength = if strength.abs() < 0.1 {
                    strength.signum() * 0.5
                } else {
                    strength
                };
                TrainingExample {
                    match_id: MatchId(i as i64),
                    week: (i % 8) as u32 + 1,
                    features: MatchupFeatures {
                        form_diff: strength,
                        acs_diff: strength * 40.0 + rng.gen_range(-5.0..5.0),
                        h2h_diff: 0.0,
                        week: ((i % 8) + 1) as f64,
                        map_diff: rng.gen_range(-0.2..0.2),
                    },
                    label: if strength > 0.0 { 1.0 } else { 0.0 },
                }
            })
            .collect()
    }

    #[test]
    fn test_training_reduces_loss() {
        let device = Default::default();
        let training = TrainingConfig {
            epochs: 300,
            ..TrainingConfig::default()
        };
        let trainer = ClassifierTrainer::<TestBackend>::new(device, &training);
        let trained = trainer.fit(&separable_examples(60)).unwrap();

        assert_eq!(trained.report.examples, 60);
        assert_eq!(trained.report.epochs, 300);
        assert!(trained.report.final_loss < trained.report.initial_loss);
        assert!(trained.report.accuracy >= 0.8, "accuracy {}", trained.report.accuracy);
        assert_eq!(trained.config.input_dim, MatchupFeatures::DIM);
        assert_eq!(trained.normalization.dim(), MatchupFeatures::DIM);
    }

    #[test]
    fn test_empty_training_set_is_rejected() {
        let trainer =
            ClassifierTrainer::<TestBackend>::new(Default::default(), &TrainingConfig::default());
        assert!(trainer.fit(&[]).is_err());
    }

    #[test]
    fn test_accuracy_threshold() {
        let device = Default::default();
        let probs =
            Tensor::<NdArray<f32>, 1>::from_floats([0.9f32, 0.2, 0.6, 0.4].as_slice(), &device)
                .reshape([4, 1]);
        let acc = compute_accuracy(probs, &[1.0, 0.0, 0.0, 0.0]).unwrap();
        assert!((acc - 0.75).abs() < 1e-6);
    }
}
