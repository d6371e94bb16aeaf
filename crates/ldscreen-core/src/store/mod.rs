//! Record storage traits.
//!
//! The core consumes and produces plain records; these traits are the
//! seam to whatever persists them. Every record is scoped to one user.

mod records;

pub use records::RecordStore;

use uuid::Uuid;

use crate::attempt::Attempt;
use crate::classifier::PredictionResult;
use crate::error::StoreError;
use crate::model::DemographicProfile;
use crate::recommend::Recommendation;
use crate::results::ScoredResult;

/// Append-only history of graded attempts.
pub trait ResultStore: Send + Sync {
    /// Append a graded result.
    fn append_result(&self, result: ScoredResult) -> Result<(), StoreError>;

    /// All results of a user, oldest first.
    fn results_for(&self, user_id: &str) -> Result<Vec<ScoredResult>, StoreError>;
}

/// Open attempt tickets.
pub trait AttemptStore: Send + Sync {
    /// Store an open attempt, replacing any open attempt of the same user in
    /// the same domain.
    fn open_attempt(&self, attempt: Attempt) -> Result<(), StoreError>;

    /// The attempt, if it is open for this user. Does not consume it.
    fn attempt(&self, user_id: &str, attempt_id: Uuid) -> Result<Option<Attempt>, StoreError>;

    /// Remove and return the attempt, if it is open for this user.
    fn take_attempt(&self, user_id: &str, attempt_id: Uuid)
        -> Result<Option<Attempt>, StoreError>;

    /// Consume the attempt `result` was graded from and append `result` to
    /// the history in one write. Returns `false`, recording nothing, when
    /// the attempt is no longer open.
    fn complete_attempt(&self, result: ScoredResult) -> Result<bool, StoreError>;
}

/// The current recommendation set of each user.
pub trait RecommendationStore: Send + Sync {
    /// Delete every recommendation of the user, then insert `recommendations`.
    fn replace_recommendations(
        &self,
        user_id: &str,
        recommendations: Vec<Recommendation>,
    ) -> Result<(), StoreError>;

    /// The user's recommendations by descending severity.
    fn recommendations_for(&self, user_id: &str) -> Result<Vec<Recommendation>, StoreError>;
}

/// Demographic intake submissions.
pub trait ProfileStore: Send + Sync {
    fn insert_profile(&self, profile: DemographicProfile) -> Result<(), StoreError>;

    fn profile(&self, user_id: &str, id: Uuid) -> Result<Option<DemographicProfile>, StoreError>;

    /// The most recent intake of the user.
    fn latest_profile(&self, user_id: &str) -> Result<Option<DemographicProfile>, StoreError>;
}

/// Prediction history. Records are never replaced.
pub trait PredictionStore: Send + Sync {
    fn insert_prediction(&self, prediction: PredictionResult) -> Result<(), StoreError>;

    /// The user's predictions, newest first.
    fn predictions_for(&self, user_id: &str) -> Result<Vec<PredictionResult>, StoreError>;

    fn latest_prediction(&self, user_id: &str) -> Result<Option<PredictionResult>, StoreError> {
        Ok(self.predictions_for(user_id)?.into_iter().next())
    }
}

/// Everything the screening engine needs.
pub trait Store:
    ResultStore + AttemptStore + RecommendationStore + ProfileStore + PredictionStore
{
}

impl<T> Store for T where
    T: ResultStore + AttemptStore + RecommendationStore + ProfileStore + PredictionStore
{
}
