//! In-memory record store with optional JSON file persistence.

use std::path::{Path, PathBuf};
use std::sync::RwLock;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::attempt::Attempt;
use crate::classifier::PredictionResult;
use crate::error::StoreError;
use crate::model::DemographicProfile;
use crate::recommend::{sort_by_severity, Recommendation};
use crate::results::ScoredResult;
use crate::store::{
    AttemptStore, PredictionStore, ProfileStore, RecommendationStore, ResultStore,
};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct StoreState {
    #[serde(default)]
    results: Vec<ScoredResult>,
    #[serde(default)]
    attempts: Vec<Attempt>,
    #[serde(default)]
    recommendations: Vec<Recommendation>,
    #[serde(default)]
    profiles: Vec<DemographicProfile>,
    #[serde(default)]
    predictions: Vec<PredictionResult>,
}

fn lock_err(context: &'static str) -> StoreError {
    StoreError::Backend(format!("poisoned lock: {context}"))
}

/// Thread-safe store for every record kind.
///
/// When opened on a file, the whole state is loaded once and rewritten
/// after each mutation. A mutation only becomes visible once the file
/// write succeeded.
#[derive(Debug)]
pub struct RecordStore {
    state: RwLock<StoreState>,
    path: Option<PathBuf>,
}

impl RecordStore {
    /// A store that lives only in memory.
    pub fn in_memory() -> Self {
        Self {
            state: RwLock::new(StoreState::default()),
            path: None,
        }
    }

    /// Open (or create on first write) a file-backed store.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        let state = if path.exists() {
            let content = std::fs::read_to_string(path)
                .map_err(|e| StoreError::Backend(format!("read {}: {e}", path.display())))?;
            serde_json::from_str(&content)
                .map_err(|e| StoreError::Serialization(format!("{}: {e}", path.display())))?
        } else {
            StoreState::default()
        };
        tracing::debug!(path = %path.display(), "opened record store");
        Ok(Self {
            state: RwLock::new(state),
            path: Some(path.to_path_buf()),
        })
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    fn read<T>(&self, f: impl FnOnce(&StoreState) -> T) -> Result<T, StoreError> {
        let state = self.state.read().map_err(|_| lock_err("read"))?;
        Ok(f(&state))
    }

    fn write<T>(&self, f: impl FnOnce(&mut StoreState) -> T) -> Result<T, StoreError> {
        let mut state = self.state.write().map_err(|_| lock_err("write"))?;
        if self.path.is_none() {
            return Ok(f(&mut state));
        }
        let mut next = state.clone();
        let out = f(&mut next);
        self.persist(&next)?;
        *state = next;
        Ok(out)
    }

    fn persist(&self, state: &StoreState) -> Result<(), StoreError> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        let json = serde_json::to_string_pretty(state)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| StoreError::Backend(format!("{}: {e}", parent.display())))?;
            }
        }
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, json)
            .and_then(|_| std::fs::rename(&tmp, path))
            .map_err(|e| StoreError::Backend(format!("write {}: {e}", path.display())))
    }
}

impl ResultStore for RecordStore {
    fn append_result(&self, result: ScoredResult) -> Result<(), StoreError> {
        self.write(|s| s.results.push(result))
    }

    fn results_for(&self, user_id: &str) -> Result<Vec<ScoredResult>, StoreError> {
        self.read(|s| {
            s.results
                .iter()
                .filter(|r| r.user_id == user_id)
                .cloned()
                .collect()
        })
    }
}

impl AttemptStore for RecordStore {
    fn open_attempt(&self, attempt: Attempt) -> Result<(), StoreError> {
        self.write(|s| {
            s.attempts
                .retain(|a| !(a.user_id == attempt.user_id && a.domain() == attempt.domain()));
            s.attempts.push(attempt);
        })
    }

    fn attempt(&self, user_id: &str, attempt_id: Uuid) -> Result<Option<Attempt>, StoreError> {
        self.read(|s| {
            s.attempts
                .iter()
                .find(|a| a.id == attempt_id && a.user_id == user_id)
                .cloned()
        })
    }

    fn take_attempt(
        &self,
        user_id: &str,
        attempt_id: Uuid,
    ) -> Result<Option<Attempt>, StoreError> {
        if self.attempt(user_id, attempt_id)?.is_none() {
            return Ok(None);
        }
        self.write(|s| {
            let index = s
                .attempts
                .iter()
                .position(|a| a.id == attempt_id && a.user_id == user_id)?;
            Some(s.attempts.remove(index))
        })
    }

    fn complete_attempt(&self, result: ScoredResult) -> Result<bool, StoreError> {
        self.write(|s| {
            let Some(index) = s
                .attempts
                .iter()
                .position(|a| a.id == result.attempt_id && a.user_id == result.user_id)
            else {
                return false;
            };
            s.attempts.remove(index);
            s.results.push(result);
            true
        })
    }
}

impl RecommendationStore for RecordStore {
    fn replace_recommendations(
        &self,
        user_id: &str,
        recommendations: Vec<Recommendation>,
    ) -> Result<(), StoreError> {
        self.write(|s| {
            s.recommendations.retain(|r| r.user_id != user_id);
            s.recommendations.extend(recommendations);
        })
    }

    fn recommendations_for(&self, user_id: &str) -> Result<Vec<Recommendation>, StoreError> {
        let mut recommendations: Vec<Recommendation> = self.read(|s| {
            s.recommendations
                .iter()
                .filter(|r| r.user_id == user_id)
                .cloned()
                .collect()
        })?;
        sort_by_severity(&mut recommendations);
        Ok(recommendations)
    }
}

impl ProfileStore for RecordStore {
    fn insert_profile(&self, profile: DemographicProfile) -> Result<(), StoreError> {
        self.write(|s| s.profiles.push(profile))
    }

    fn profile(&self, user_id: &str, id: Uuid) -> Result<Option<DemographicProfile>, StoreError> {
        self.read(|s| {
            s.profiles
                .iter()
                .find(|p| p.id == id && p.user_id == user_id)
                .cloned()
        })
    }

    fn latest_profile(&self, user_id: &str) -> Result<Option<DemographicProfile>, StoreError> {
        self.read(|s| {
            s.profiles
                .iter()
                .filter(|p| p.user_id == user_id)
                .max_by_key(|p| p.created_at)
                .cloned()
        })
    }
}

impl PredictionStore for RecordStore {
    fn insert_prediction(&self, prediction: PredictionResult) -> Result<(), StoreError> {
        self.write(|s| s.predictions.push(prediction))
    }

    fn predictions_for(&self, user_id: &str) -> Result<Vec<PredictionResult>, StoreError> {
        let mut predictions: Vec<PredictionResult> = self.read(|s| {
            s.predictions
                .iter()
                .filter(|p| p.user_id == user_id)
                .cloned()
                .collect()
        })?;
        // Stable sort keeps later inserts first among equal timestamps.
        predictions.reverse();
        predictions.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(predictions)
    }
}
