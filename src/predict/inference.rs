//! Model inference for predictions

use std::sync::{Arc, Mutex, RwLock};

use burn::backend::{Autodiff, NdArray};
use burn::tensor::backend::Backend;
use burn::tensor::Tensor;
use chrono::Utc;
use serde::Serialize;

use super::heuristic::heuristic_probability;
use super::store::{ModelArtifact, ModelMetadata, ModelStore, ModelVersion, StoredModel};
use crate::data::LeagueSnapshot;
use crate::features::{extract, MatchupFeatures, MatchupOverrides};
use crate::model::{ClassifierConfig, FeatureNormalization, WinClassifier};
use crate::training::{build_examples, ClassifierTrainer, TrainingReport};
use crate::{Config, LeagueError, MatchId, Result, TeamId};

/// Backend used by the binary and by default embeddings
pub type DefaultBackend = NdArray<f32>;

/// Where a probability came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "version", rename_all = "lowercase")]
pub enum PredictionSource {
    Model(ModelVersion),
    Heuristic,
}

/// Win probabilities for a matchup
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Prediction {
    pub team_a: TeamId,
    pub team_b: TeamId,
    pub team_a_win_prob: f64,
    pub team_b_win_prob: f64,
    pub source: PredictionSource,
    /// Probability of the favoured side
    pub confidence: f64,
}

impl Prediction {
    fn new(team_a: TeamId, team_b: TeamId, p_a: f64, source: PredictionSource) -> Self {
        let p_a = p_a.clamp(0.0, 1.0);
        let p_b = 1.0 - p_a;
        Prediction {
            team_a,
            team_b,
            team_a_win_prob: p_a,
            team_b_win_prob: p_b,
            source,
            confidence: p_a.max(p_b),
        }
    }

    /// The side with the higher probability, team A on an even split
    pub fn favourite(&self) -> TeamId {
        if self.team_a_win_prob >= self.team_b_win_prob {
            self.team_a
        } else {
            self.team_b
        }
    }
}

/// Prediction for a scheduled match
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UpcomingPrediction {
    pub match_id: MatchId,
    pub week: u32,
    pub prediction: Prediction,
}

/// Result of a retraining request
#[derive(Debug, Clone, PartialEq)]
pub enum TrainOutcome {
    Trained {
        version: ModelVersion,
        report: TrainingReport,
    },
    InsufficientData {
        found: usize,
        required: usize,
    },
}

impl TrainOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, TrainOutcome::Trained { .. })
    }
}

/// A decoded classifier, immutable once loaded
struct LoadedModel<B: Backend> {
    version: ModelVersion,
    config: ClassifierConfig,
    normalization: FeatureNormalization,
    classifier: WinClassifier<B>,
}

/// Predictor holding the current classifier and the store it comes from.
///
/// Readers take a cheap handle to the current model; retraining builds a new
/// one and swaps it in. Retraining requests run one at a time.
pub struct Predictor<B: Backend, S: ModelStore> {
    store: S,
    config: Config,
    device: B::Device,
    current: RwLock<Option<Arc<LoadedModel<B>>>>,
    retrain_lock: Mutex<()>,
}

impl<B: Backend, S: ModelStore> Predictor<B, S>
where
    B::FloatElem: serde::Serialize + serde::de::DeserializeOwned,
    B::IntElem: serde::Serialize + serde::de::DeserializeOwned,
{
    /// Create a predictor with no model loaded
    pub fn new(store: S, config: Config, device: B::Device) -> Self {
        Predictor {
            store,
            config,
            device,
            current: RwLock::new(None),
            retrain_lock: Mutex::new(()),
        }
    }

    /// Create a predictor and load the latest stored model
    pub fn load(store: S, config: Config, device: B::Device) -> Result<Self> {
        let predictor = Self::new(store, config, device);
        predictor.load_current()?;
        Ok(predictor)
    }

    /// Load the latest artifact from the store.
    ///
    /// An artifact that fails to decode leaves the predictor without a model.
    /// Only store failures are returned as errors.
    pub fn load_current(&self) -> Result<Option<ModelVersion>> {
        let latest = match self.store.load_latest() {
            Ok(latest) => latest,
            Err(LeagueError::CorruptModel { version, reason }) => {
                log::warn!("Could not load model v{}: {}", version, reason);
                None
            }
            Err(e) => return Err(e),
        };

        let loaded = match latest {
            Some(stored) => {
                let version = stored.version;
                match self.decode(stored) {
                    Ok(model) => {
                        log::info!("Loaded model {}", version);
                        Some(Arc::new(model))
                    }
                    Err(e) => {
                        log::warn!("Could not load model {}: {}", version, e);
                        None
                    }
                }
            }
            None => None,
        };

        let version = loaded.as_ref().map(|m| m.version);
        self.swap(loaded)?;
        Ok(version)
    }

    /// Version of the model currently in use
    pub fn current_version(&self) -> Option<ModelVersion> {
        self.current_model().map(|m| m.version)
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    fn decode(&self, stored: StoredModel) -> Result<LoadedModel<B>> {
        let ModelArtifact { metadata, weights } = stored.artifact;
        if metadata.classifier.input_dim != MatchupFeatures::DIM
            || metadata.normalization.dim() != MatchupFeatures::DIM
        {
            return Err(LeagueError::Model(format!(
                "Expected {} input features, artifact has {}",
                MatchupFeatures::DIM,
                metadata.classifier.input_dim
            )));
        }
        let classifier = WinClassifier::from_bytes(&metadata.classifier, weights, &self.device)?;
        Ok(LoadedModel {
            version: stored.version,
            config: metadata.classifier,
            normalization: metadata.normalization,
            classifier,
        })
    }

    fn current_model(&self) -> Option<Arc<LoadedModel<B>>> {
        match self.current.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    fn swap(&self, model: Option<Arc<LoadedModel<B>>>) -> Result<()> {
        let mut guard = self
            .current
            .write()
            .map_err(|_| LeagueError::Model("Model handle lock poisoned".to_string()))?;
        *guard = model;
        Ok(())
    }

    fn infer(&self, model: &LoadedModel<B>, features: &MatchupFeatures) -> Option<f64> {
        if model.config.input_dim != MatchupFeatures::DIM {
            log::warn!("Model {} has the wrong input shape", model.version);
            return None;
        }

        let x = Tensor::<B, 1>::from_floats(features.to_vec().as_slice(), &self.device)
            .reshape([1, MatchupFeatures::DIM]);
        let probs = model
            .classifier
            .predict_proba(model.normalization.normalize(x));

        match probs.into_data().convert::<f32>().to_vec::<f32>() {
            Ok(values) => values
                .first()
                .map(|p| *p as f64)
                .filter(|p| p.is_finite())
                .map(|p| p.clamp(0.0, 1.0)),
            Err(e) => {
                log::warn!("Inference failed for model {}: {:?}", model.version, e);
                None
            }
        }
    }

    /// Model probability that `a` beats `b`.
    ///
    /// `None` when no model is loaded, a team is unknown, or inference fails.
    pub fn predict_match(
        &self,
        snapshot: &LeagueSnapshot,
        a: TeamId,
        b: TeamId,
        week: Option<u32>,
        overrides: &MatchupOverrides,
    ) -> Option<f64> {
        let model = self.current_model()?;
        snapshot.team(a)?;
        snapshot.team(b)?;
        let features = extract(snapshot, a, b, week, overrides, &self.config.predictor);
        self.infer(&model, &features)
    }

    /// Win probabilities from the model, or from the heuristic when the
    /// model path has no answer. `None` only for unknown teams.
    pub fn predict(
        &self,
        snapshot: &LeagueSnapshot,
        a: TeamId,
        b: TeamId,
        week: Option<u32>,
        overrides: &MatchupOverrides,
    ) -> Option<Prediction> {
        snapshot.team(a)?;
        snapshot.team(b)?;

        if let Some(model) = self.current_model() {
            let features = extract(snapshot, a, b, week, overrides, &self.config.predictor);
            match self.infer(&model, &features) {
                Some(p) => {
                    return Some(Prediction::new(a, b, p, PredictionSource::Model(model.version)))
                }
                None => log::warn!("Model {} gave no answer, using heuristic", model.version),
            }
        }

        let p = heuristic_probability(snapshot, a, b, &self.config.predictor.heuristic);
        Some(Prediction::new(a, b, p, PredictionSource::Heuristic))
    }

    /// One prediction per scheduled match, ordered by week then id
    pub fn predict_upcoming(&self, snapshot: &LeagueSnapshot) -> Vec<UpcomingPrediction> {
        let mut scheduled: Vec<_> = snapshot
            .matches
            .iter()
            .filter(|m| m.is_scheduled())
            .collect();
        scheduled.sort_by_key(|m| (m.week, m.id));

        scheduled
            .into_iter()
            .filter_map(|m| {
                let prediction = self.predict(
                    snapshot,
                    m.team1,
                    m.team2,
                    Some(m.week),
                    &MatchupOverrides::default(),
                )?;
                Some(UpcomingPrediction {
                    match_id: m.id,
                    week: m.week,
                    prediction,
                })
            })
            .collect()
    }

    /// Train a new classifier on the snapshot, save it and make it current.
    ///
    /// Fewer decided matches than `training.min_matches` is reported as
    /// `InsufficientData` and leaves the current model in place. Completed
    /// matches without a winner do not count.
    pub fn retrain(&self, snapshot: &LeagueSnapshot) -> Result<TrainOutcome> {
        let _guard = self
            .retrain_lock
            .lock()
            .map_err(|_| LeagueError::Model("Retrain lock poisoned".to_string()))?;

        let training = &self.config.training;
        let examples = build_examples(snapshot, &self.config.predictor, training.walk_forward);
        let required = training.min_matches.max(1);
        if examples.len() < required {
            log::warn!(
                "Not enough decided matches to train: {} (need {})",
                examples.len(),
                required
            );
            return Ok(TrainOutcome::InsufficientData {
                found: examples.len(),
                required,
            });
        }

        let trainer = ClassifierTrainer::<Autodiff<B>>::new(self.device.clone(), training);
        let trained = trainer.fit(&examples)?;

        let artifact = ModelArtifact {
            metadata: ModelMetadata {
                classifier: trained.config,
                normalization: trained.normalization.clone(),
                report: trained.report.clone(),
                trained_at: Utc::now(),
            },
            weights: trained.model.to_bytes()?,
        };
        let version = self.store.save(&artifact)?;

        self.swap(Some(Arc::new(LoadedModel {
            version,
            config: trained.config,
            normalization: trained.normalization,
            classifier: trained.model,
        })))?;
        log::info!("Model {} is now current", version);

        Ok(TrainOutcome::Trained {
            version,
            report: trained.report,
        })
    }
}

/// Format a prediction for display
pub fn format_prediction(pred: &Prediction, name_a: &str, name_b: &str) -> String {
    let (winner, win_prob) = if pred.favourite() == pred.team_a {
        (name_a, pred.team_a_win_prob)
    } else {
        (name_b, pred.team_b_win_prob)
    };
    let source = match pred.source {
        PredictionSource::Model(version) => format!("model {}", version),
        PredictionSource::Heuristic => "heuristic".to_string(),
    };

    format!(
        r#"
┌─────────────────────────────────────────────────┐
│  {} vs {}
├─────────────────────────────────────────────────┤
│  {:<16} {:.1}%
│  {:<16} {:.1}%
│  Favourite:       {} ({:.1}%)
│  Source:          {}
└─────────────────────────────────────────────────┘
"#,
        name_a,
        name_b,
        name_a,
        pred.team_a_win_prob * 100.0,
        name_b,
        pred.team_b_win_prob * 100.0,
        winner,
        win_prob * 100.0,
        source
    )
}
