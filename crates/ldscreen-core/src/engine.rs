//! Screening engine.
//!
//! Drives the request-layer flows (start/submit an attempt, aggregate,
//! regenerate recommendations, record intake, predict, compile a report)
//! over a [`Store`]. Every call runs to completion synchronously.

use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use crate::aggregate::{area_scores, AreaScore};
use crate::attempt::{Attempt, Submission};
use crate::classifier::{PredictionResult, RiskClassifier};
use crate::error::{GradeError, ScreeningError, StoreError};
use crate::grading::grade;
use crate::model::{DemographicProfile, IntakeForm, ItemSet};
use crate::recommend::{derive_recommendations, Recommendation};
use crate::report::ScreeningReport;
use crate::results::ScoredResult;
use crate::store::Store;

/// Configuration for the screening engine.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// How long an opened attempt can still be submitted.
    pub attempt_ttl: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            attempt_ttl: Duration::hours(1),
        }
    }
}

/// The screening engine.
pub struct ScreeningEngine<S> {
    store: S,
    classifier: RiskClassifier,
    config: EngineConfig,
}

impl<S: Store> ScreeningEngine<S> {
    pub fn new(store: S, classifier: RiskClassifier, config: EngineConfig) -> Self {
        Self {
            store,
            classifier,
            config,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn classifier(&self) -> &RiskClassifier {
        &self.classifier
    }

    /// Load the risk model. Fails if the artifact is missing or corrupt.
    pub fn load_model(&mut self) -> Result<(), ScreeningError> {
        self.classifier.load()?;
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Assessments
    // -----------------------------------------------------------------------

    /// Open an attempt on `items` for `user_id`.
    pub fn start_attempt(
        &self,
        user_id: &str,
        items: ItemSet,
        now: DateTime<Utc>,
    ) -> Result<Attempt, ScreeningError> {
        let attempt = Attempt::open(user_id, items, now, self.config.attempt_ttl);
        tracing::debug!(
            user = user_id,
            domain = %attempt.domain(),
            "opened attempt {}",
            attempt.id
        );
        self.store.open_attempt(attempt.clone())?;
        Ok(attempt)
    }

    /// Grade a submission and append the result to the user's history.
    ///
    /// The ticket is consumed together with the append, so a failed write
    /// leaves it open for a retry. An expired attempt is consumed without
    /// a result.
    pub fn submit(
        &self,
        user_id: &str,
        submission: &Submission,
        now: DateTime<Utc>,
    ) -> Result<ScoredResult, ScreeningError> {
        let no_attempt = || GradeError::NoActiveAttempt {
            attempt_id: submission.attempt_id,
        };
        let Some(attempt) = self.store.attempt(user_id, submission.attempt_id)? else {
            return Err(no_attempt().into());
        };

        let result = match grade(&attempt, user_id, submission, now) {
            Ok(result) => result,
            Err(e) => {
                tracing::warn!(user = user_id, "rejected submission: {e}");
                if matches!(e, GradeError::AttemptExpired { .. }) {
                    self.store.take_attempt(user_id, attempt.id)?;
                }
                return Err(e.into());
            }
        };
        if !self.store.complete_attempt(result.clone())? {
            return Err(no_attempt().into());
        }
        Ok(result)
    }

    /// Weakness score per domain from the user's full history.
    pub fn area_scores(&self, user_id: &str) -> Result<Vec<AreaScore>, ScreeningError> {
        let history = self.store.results_for(user_id)?;
        let scores = area_scores(&history);
        tracing::debug!(user = user_id, attempts = history.len(), ?scores, "aggregated");
        Ok(scores)
    }

    // -----------------------------------------------------------------------
    // Recommendations
    // -----------------------------------------------------------------------

    /// Recompute the user's recommendations, replacing the previous set.
    ///
    /// Not atomic against a concurrent regeneration for the same user;
    /// callers serialize per user.
    pub fn regenerate_recommendations(
        &self,
        user_id: &str,
        now: DateTime<Utc>,
    ) -> Result<Vec<Recommendation>, ScreeningError> {
        let scores = self.area_scores(user_id)?;
        let recommendations = derive_recommendations(user_id, &scores, now);
        tracing::info!(
            user = user_id,
            count = recommendations.len(),
            "regenerated recommendations"
        );
        self.store
            .replace_recommendations(user_id, recommendations.clone())?;
        Ok(recommendations)
    }

    pub fn recommendations(&self, user_id: &str) -> Result<Vec<Recommendation>, ScreeningError> {
        Ok(self.store.recommendations_for(user_id)?)
    }

    // -----------------------------------------------------------------------
    // Intake and prediction
    // -----------------------------------------------------------------------

    /// Validate and store a demographic intake.
    pub fn record_intake(
        &self,
        user_id: &str,
        form: IntakeForm,
        now: DateTime<Utc>,
    ) -> Result<DemographicProfile, ScreeningError> {
        let profile = form
            .into_profile(user_id, now)
            .map_err(ScreeningError::InvalidIntake)?;
        self.store.insert_profile(profile.clone())?;
        tracing::info!(user = user_id, "recorded intake {}", profile.id);
        Ok(profile)
    }

    /// Predict from a specific intake, or the user's latest one.
    ///
    /// Every call stores a new prediction record.
    pub fn predict(
        &self,
        user_id: &str,
        profile_id: Option<Uuid>,
        now: DateTime<Utc>,
    ) -> Result<PredictionResult, ScreeningError> {
        let profile = match profile_id {
            Some(id) => self
                .store
                .profile(user_id, id)?
                .ok_or(StoreError::NotFound { kind: "intake", id })?,
            None => self
                .store
                .latest_profile(user_id)?
                .ok_or_else(|| ScreeningError::NoIntake(user_id.to_string()))?,
        };

        let prediction = self.classifier.predict(&profile, now)?;
        self.store.insert_prediction(prediction.clone())?;
        Ok(prediction)
    }

    /// Predict from the user's most recent intake.
    pub fn predict_latest(
        &self,
        user_id: &str,
        now: DateTime<Utc>,
    ) -> Result<PredictionResult, ScreeningError> {
        self.predict(user_id, None, now)
    }

    /// Predict from one specific intake of the user.
    pub fn predict_for(
        &self,
        user_id: &str,
        profile_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<PredictionResult, ScreeningError> {
        self.predict(user_id, Some(profile_id), now)
    }

    // -----------------------------------------------------------------------
    // Report
    // -----------------------------------------------------------------------

    /// Assemble the user's report from stored records.
    pub fn compile_report(
        &self,
        user_id: &str,
        now: DateTime<Utc>,
    ) -> Result<ScreeningReport, ScreeningError> {
        let history = self.store.results_for(user_id)?;
        let report = ScreeningReport::compile(
            user_id,
            now,
            self.store.latest_profile(user_id)?,
            self.store.latest_prediction(user_id)?,
            &history,
            self.store.recommendations_for(user_id)?,
        );
        Ok(report)
    }
}
