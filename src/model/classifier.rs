//! Feed-forward win classifier
//!
//! Architecture: Input(5) → Hidden → ReLU → win logit(1)

use burn::module::Module;
use burn::nn::{Linear, LinearConfig};
use burn::record::{FullPrecisionSettings, NamedMpkBytesRecorder, Recorder};
use burn::tensor::activation::{relu, sigmoid};
use burn::tensor::backend::Backend;
use burn::tensor::Tensor;
use serde::{Deserialize, Serialize};

use crate::features::MatchupFeatures;
use crate::{LeagueError, Result};

/// Shape of the classifier, stored next to its weights
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassifierConfig {
    /// Input dimension (matchup features)
    pub input_dim: usize,
    /// Hidden layer width
    pub hidden_dim: usize,
}

impl ClassifierConfig {
    pub fn new(hidden_dim: usize) -> Self {
        ClassifierConfig {
            input_dim: MatchupFeatures::DIM,
            hidden_dim: hidden_dim.max(1),
        }
    }

    /// Create a freshly initialized classifier
    pub fn init<B: Backend>(&self, device: &B::Device) -> WinClassifier<B> {
        WinClassifier {
            hidden: LinearConfig::new(self.input_dim, self.hidden_dim).init(device),
            output: LinearConfig::new(self.hidden_dim, 1).init(device),
        }
    }
}

/// Binary classifier: P(team A beats team B)
#[derive(Module, Debug)]
pub struct WinClassifier<B: Backend> {
    hidden: Linear<B>,
    output: Linear<B>,
}

impl<B: Backend> WinClassifier<B> {
    /// Forward pass
    ///
    /// # Arguments
    /// * `features` - Normalized matchup features [batch, input_dim]
    ///
    /// # Returns
    /// Win logits [batch, 1]
    pub fn forward(&self, features: Tensor<B, 2>) -> Tensor<B, 2> {
        let x = relu(self.hidden.forward(features));
        self.output.forward(x)
    }

    /// Win probabilities [batch, 1]
    pub fn predict_proba(&self, features: Tensor<B, 2>) -> Tensor<B, 2> {
        sigmoid(self.forward(features))
    }

    /// Whether the layer weights have the shapes `config` describes
    pub fn matches_config(&self, config: &ClassifierConfig) -> bool {
        self.hidden.weight.dims() == [config.input_dim, config.hidden_dim]
            && self.output.weight.dims() == [config.hidden_dim, 1]
    }

    /// Serialize the weights to a named MessagePack record
    pub fn to_bytes(&self) -> Result<Vec<u8>>
    where
        B::FloatElem: serde::Serialize + serde::de::DeserializeOwned,
        B::IntElem: serde::Serialize + serde::de::DeserializeOwned,
    {
        let recorder = NamedMpkBytesRecorder::<FullPrecisionSettings>::default();
        recorder
            .record(self.clone().into_record(), ())
            .map_err(|e| LeagueError::Model(format!("Failed to encode weights: {}", e)))
    }

    /// Rebuild a classifier from a named MessagePack record.
    ///
    /// Fails when the record does not decode or its layers do not match `config`.
    pub fn from_bytes(config: &ClassifierConfig, bytes: Vec<u8>, device: &B::Device) -> Result<Self>
    where
        B::FloatElem: serde::Serialize + serde::de::DeserializeOwned,
        B::IntElem: serde::Serialize + serde::de::DeserializeOwned,
    {
        let recorder = NamedMpkBytesRecorder::<FullPrecisionSettings>::default();
        let record = recorder
            .load(bytes, device)
            .map_err(|e| LeagueError::Model(format!("Failed to decode weights: {}", e)))?;
        let model = config.init::<B>(device).load_record(record);
        if !model.matches_config(config) {
            return Err(LeagueError::Model(format!(
                "Weights do not match a {}x{} classifier",
                config.input_dim, config.hidden_dim
            )));
        }
        Ok(model)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    type TestBackend = NdArray<f32>;

    #[test]
    fn test_forward_shapes() {
        let device = Default::default();
        let model = ClassifierConfig::new(8).init::<TestBackend>(&device);

        let features = Tensor::random(
            [4, MatchupFeatures::DIM],
            burn::tensor::Distribution::Normal(0.0, 1.0),
            &device,
        );
        let probs = model.predict_proba(features);
        assert_eq!(probs.dims(), [4, 1]);

        let data = probs.into_data();
        for p in data.as_slice::<f32>().unwrap() {
            assert!((0.0..=1.0).contains(p), "probability out of range: {}", p);
        }
    }

    #[test]
    fn test_bytes_round_trip_preserves_output() {
        let device = Default::default();
        let config = ClassifierConfig::new(6);
        let model = config.init::<TestBackend>(&device);

        let input = [0.3f32, -1.2, 2.0, 4.0, 0.1];
        let x = || Tensor::<TestBackend, 1>::from_floats(input.as_slice(), &device).reshape([1, 5]);

        let bytes = model.to_bytes().unwrap();
        let restored = WinClassifier::<TestBackend>::from_bytes(&config, bytes, &device).unwrap();

        let before: f32 = model.predict_proba(x()).into_scalar();
        let after: f32 = restored.predict_proba(x()).into_scalar();
        assert!((before - after).abs() < 1e-6);
    }

    #[test]
    fn test_garbage_bytes_fail_to_decode() {
        let device = Default::default();
        let result =
            WinClassifier::<TestBackend>::from_bytes(&ClassifierConfig::new(4), vec![1, 2, 3], &device);
        assert!(matches!(result, Err(LeagueError::Model(_))));
    }

    #[test]
    fn test_weights_for_other_shape_are_rejected() {
        let device = Default::default();
        let narrow = ClassifierConfig {
            input_dim: 3,
            hidden_dim: 8,
        };
        let bytes = narrow.init::<TestBackend>(&device).to_bytes().unwrap();

        let result =
            WinClassifier::<TestBackend>::from_bytes(&ClassifierConfig::new(8), bytes, &device);
        assert!(matches!(result, Err(LeagueError::Model(_))));
    }
}
