//! Versioned storage for trained classifiers

use std::fmt;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use rusqlite::{params, OptionalExtension};
use serde::{Deserialize, Serialize};

use crate::data::Database;
use crate::model::{ClassifierConfig, FeatureNormalization};
use crate::training::TrainingReport;
use crate::{LeagueError, Result};

/// Monotonic version of a saved model
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ModelVersion(pub i64);

impl fmt::Display for ModelVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}", self.0)
    }
}

/// Everything needed to rebuild a classifier besides its weights
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelMetadata {
    pub classifier: ClassifierConfig,
    pub normalization: FeatureNormalization,
    pub report: TrainingReport,
    pub trained_at: DateTime<Utc>,
}

/// A model ready to be saved: metadata plus a binary weight record
#[derive(Debug, Clone, PartialEq)]
pub struct ModelArtifact {
    pub metadata: ModelMetadata,
    pub weights: Vec<u8>,
}

/// An artifact as read back from a store
#[derive(Debug, Clone, PartialEq)]
pub struct StoredModel {
    pub version: ModelVersion,
    pub artifact: ModelArtifact,
}

/// Model repository
pub trait ModelStore {
    /// Save an artifact as a new version
    fn save(&self, artifact: &ModelArtifact) -> Result<ModelVersion>;

    /// The most recently saved artifact, if any.
    ///
    /// An artifact that exists but cannot be read is `LeagueError::CorruptModel`.
    fn load_latest(&self) -> Result<Option<StoredModel>>;
}

/// In-process model store
#[derive(Debug, Default)]
pub struct MemoryModelStore {
    artifacts: Mutex<Vec<ModelArtifact>>,
}

impl MemoryModelStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.artifacts.lock().map(|a| a.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn poisoned<T>(_: T) -> LeagueError {
    LeagueError::Model("Model store lock poisoned".to_string())
}

impl ModelStore for MemoryModelStore {
    fn save(&self, artifact: &ModelArtifact) -> Result<ModelVersion> {
        let mut artifacts = self.artifacts.lock().map_err(poisoned)?;
        artifacts.push(artifact.clone());
        Ok(ModelVersion(artifacts.len() as i64))
    }

    fn load_latest(&self) -> Result<Option<StoredModel>> {
        let artifacts = self.artifacts.lock().map_err(poisoned)?;
        Ok(artifacts.last().map(|artifact| StoredModel {
            version: ModelVersion(artifacts.len() as i64),
            artifact: artifact.clone(),
        }))
    }
}

impl ModelStore for Database {
    fn save(&self, artifact: &ModelArtifact) -> Result<ModelVersion> {
        let metadata = serde_json::to_string(&artifact.metadata)?;
        self.connection().execute(
            "INSERT INTO model_artifacts (created_at, metadata, weights) VALUES (?1, ?2, ?3)",
            params![
                artifact.metadata.trained_at.to_rfc3339(),
                metadata,
                artifact.weights
            ],
        )?;
        Ok(ModelVersion(self.connection().last_insert_rowid()))
    }

    fn load_latest(&self) -> Result<Option<StoredModel>> {
        let row = self
            .connection()
            .query_row(
                "SELECT id, metadata, weights FROM model_artifacts ORDER BY id DESC LIMIT 1",
                [],
                |row| {
                    Ok((
                        row.get::<_, i64>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, Vec<u8>>(2)?,
                    ))
                },
            )
            .optional()?;

        let Some((id, metadata, weights)) = row else {
            return Ok(None);
        };
        let metadata = serde_json::from_str(&metadata).map_err(|e| LeagueError::CorruptModel {
            version: id,
            reason: format!("bad metadata: {}", e),
        })?;
        Ok(Some(StoredModel {
            version: ModelVersion(id),
            artifact: ModelArtifact { metadata, weights },
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn artifact(examples: usize) -> ModelArtifact {
        ModelArtifact {
            metadata: ModelMetadata {
                classifier: ClassifierConfig::new(8),
                normalization: FeatureNormalization::identity(5),
                report: TrainingReport {
                    examples,
                    epochs: 10,
                    initial_loss: 0.69,
                    final_loss: 0.4,
                    accuracy: 0.8,
                },
                trained_at: Utc::now(),
            },
            weights: vec![7, 7, 7],
        }
    }

    #[test]
    fn test_memory_store_versions() {
        let store = MemoryModelStore::new();
        assert!(store.load_latest().unwrap().is_none());

        assert_eq!(store.save(&artifact(3)).unwrap(), ModelVersion(1));
        assert_eq!(store.save(&artifact(4)).unwrap(), ModelVersion(2));

        let latest = store.load_latest().unwrap().unwrap();
        assert_eq!(latest.version, ModelVersion(2));
        assert_eq!(latest.artifact.metadata.report.examples, 4);
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_database_store_round_trip() {
        let db = Database::in_memory().unwrap();
        assert!(db.load_latest().unwrap().is_none());

        let saved = artifact(5);
        let first = db.save(&artifact(3)).unwrap();
        let second = db.save(&saved).unwrap();
        assert!(second > first);

        let latest = db.load_latest().unwrap().unwrap();
        assert_eq!(latest.version, second);
        assert_eq!(latest.artifact, saved);
        assert_eq!(db.get_stats().unwrap().model_versions, 2);
    }

    #[test]
    fn test_unreadable_metadata_is_corrupt_model() {
        let db = Database::in_memory().unwrap();
        db.save(&artifact(3)).unwrap();
        db.connection()
            .execute(
                "INSERT INTO model_artifacts (created_at, metadata, weights)
                 VALUES ('now', '{not json', x'00')",
                [],
            )
            .unwrap();

        assert!(matches!(
            db.load_latest(),
            Err(LeagueError::CorruptModel { version: 2, .. })
        ));
    }
}
