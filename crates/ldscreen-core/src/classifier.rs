//! Learning-disability risk classifier.
//!
//! The classifier turns a [`DemographicProfile`] into a fixed-order feature
//! vector and runs it through a pre-trained binary model. The feature order
//! is the model's contract: it must match the order used at training time.
//! Nothing checks this at runtime.

use std::fmt;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ClassifierError;
use crate::model::{AttentionSpan, DemographicProfile, Gender};

/// Probability at or above which the label is positive.
pub const DECISION_THRESHOLD: f64 = 0.5;

/// Feature order of the baseline model.
pub const DEFAULT_FEATURE_ORDER: [&str; 8] = [
    "age",
    "gender_male",
    "gender_female",
    "gender_other",
    "reading_difficulties",
    "attention_low",
    "attention_medium",
    "attention_high",
];

/// Where to find the model and which feature order it was trained with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelSpec {
    #[serde(default = "default_model_path")]
    pub path: PathBuf,
    #[serde(default = "default_feature_order")]
    pub feature_order: Vec<String>,
    /// Overrides the name recorded in the artifact.
    #[serde(default)]
    pub name: Option<String>,
}

fn default_model_path() -> PathBuf {
    PathBuf::from("./models/ld_model.json")
}

pub fn default_feature_order() -> Vec<String> {
    DEFAULT_FEATURE_ORDER.iter().map(|s| s.to_string()).collect()
}

impl Default for ModelSpec {
    fn default() -> Self {
        Self::new(default_model_path())
    }
}

impl ModelSpec {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            feature_order: default_feature_order(),
            name: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Vectorization
// ---------------------------------------------------------------------------

/// Value of one named feature, or `None` for names this profile cannot
/// provide.
pub fn feature_value(profile: &DemographicProfile, name: &str) -> Option<f64> {
    let flag = |b: bool| if b { 1.0 } else { 0.0 };
    let value = match name {
        "age" => profile.age as f64,
        "gender_male" => flag(profile.gender == Some(Gender::Male)),
        "gender_female" => flag(profile.gender == Some(Gender::Female)),
        "gender_other" => flag(profile.gender == Some(Gender::Other)),
        "reading_difficulties" => flag(profile.reading_difficulties),
        "attention_low" => flag(profile.attention_span == AttentionSpan::Low),
        "attention_medium" => flag(profile.attention_span == AttentionSpan::Medium),
        "attention_high" => flag(profile.attention_span == AttentionSpan::High),
        _ => return None,
    };
    Some(value)
}

/// Build the feature vector in `feature_order`; unknown names become 0.
pub fn vectorize(profile: &DemographicProfile, feature_order: &[String]) -> Vec<f64> {
    feature_order
        .iter()
        .map(|name| feature_value(profile, name).unwrap_or(0.0))
        .collect()
}

// ---------------------------------------------------------------------------
// Models
// ---------------------------------------------------------------------------

/// A pre-trained binary classifier.
pub trait BinaryModel: Send + Sync {
    /// Class probabilities, if the model exposes them.
    fn predict_proba(&self, features: &[f64]) -> Result<Option<Vec<f64>>, ClassifierError>;

    /// Hard class prediction (0 or 1).
    fn predict(&self, features: &[f64]) -> Result<f64, ClassifierError>;
}

/// Logistic regression with probabilities `[1 - p, p]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogisticRegression {
    pub coefficients: Vec<f64>,
    #[serde(default)]
    pub intercept: f64,
}

impl LogisticRegression {
    fn positive_probability(&self, features: &[f64]) -> Result<f64, ClassifierError> {
        let z = linear(&self.coefficients, self.intercept, features)?;
        Ok(1.0 / (1.0 + (-z).exp()))
    }
}

impl BinaryModel for LogisticRegression {
    fn predict_proba(&self, features: &[f64]) -> Result<Option<Vec<f64>>, ClassifierError> {
        let p = self.positive_probability(features)?;
        Ok(Some(vec![1.0 - p, p]))
    }

    fn predict(&self, features: &[f64]) -> Result<f64, ClassifierError> {
        let p = self.positive_probability(features)?;
        Ok(if p >= DECISION_THRESHOLD { 1.0 } else { 0.0 })
    }
}

/// A linear decision rule without probabilities.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearThreshold {
    pub weights: Vec<f64>,
    #[serde(default)]
    pub bias: f64,
}

impl BinaryModel for LinearThreshold {
    fn predict_proba(&self, _features: &[f64]) -> Result<Option<Vec<f64>>, ClassifierError> {
        Ok(None)
    }

    fn predict(&self, features: &[f64]) -> Result<f64, ClassifierError> {
        let z = linear(&self.weights, self.bias, features)?;
        Ok(if z >= 0.0 { 1.0 } else { 0.0 })
    }
}

fn linear(weights: &[f64], bias: f64, features: &[f64]) -> Result<f64, ClassifierError> {
    if weights.len() != features.len() {
        return Err(ClassifierError::FeatureMismatch {
            expected: weights.len(),
            got: features.len(),
        });
    }
    Ok(bias + weights.iter().zip(features).map(|(w, x)| w * x).sum::<f64>())
}

/// Serialized model artifact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelArtifact {
    pub name: String,
    pub model: ModelKind,
}

/// Supported model families.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ModelKind {
    LogisticRegression(LogisticRegression),
    LinearThreshold(LinearThreshold),
}

impl ModelKind {
    fn into_model(self) -> Box<dyn BinaryModel> {
        match self {
            ModelKind::LogisticRegression(m) => Box::new(m),
            ModelKind::LinearThreshold(m) => Box::new(m),
        }
    }
}

impl ModelArtifact {
    /// Read an artifact from a JSON file.
    pub fn read(path: &Path) -> Result<Self, ClassifierError> {
        let content =
            std::fs::read_to_string(path).map_err(|e| ClassifierError::ArtifactUnreadable {
                path: path.display().to_string(),
                message: e.to_string(),
            })?;
        serde_json::from_str(&content).map_err(|e| ClassifierError::ArtifactInvalid {
            path: path.display().to_string(),
            message: e.to_string(),
        })
    }

    /// Write the artifact as pretty JSON.
    pub fn write(&self, path: &Path) -> anyhow::Result<()> {
        use anyhow::Context;

        let json = serde_json::to_string_pretty(self).context("failed to serialize model")?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, json)
            .with_context(|| format!("failed to write model to {}", path.display()))?;
        Ok(())
    }

    /// Baseline logistic model over [`DEFAULT_FEATURE_ORDER`]: a slight age
    /// effect, reading difficulties and low attention raise risk, high
    /// attention lowers it.
    pub fn baseline() -> Self {
        Self {
            name: "baseline-logistic".to_string(),
            model: ModelKind::LogisticRegression(LogisticRegression {
                coefficients: vec![0.05, 0.0, 0.0, 0.0, 1.5, 0.8, 0.0, -0.5],
                intercept: -0.5,
            }),
        }
    }
}

// ---------------------------------------------------------------------------
// Classifier
// ---------------------------------------------------------------------------

/// Risk label derived from the positive-class probability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLabel {
    Positive,
    Negative,
}

impl RiskLabel {
    pub fn is_positive(self) -> bool {
        matches!(self, RiskLabel::Positive)
    }

    pub fn from_probability(probability: f64) -> Self {
        if probability >= DECISION_THRESHOLD {
            RiskLabel::Positive
        } else {
            RiskLabel::Negative
        }
    }
}

impl fmt::Display for RiskLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RiskLabel::Positive => write!(f, "LD Detected"),
            RiskLabel::Negative => write!(f, "No LD Detected"),
        }
    }
}

/// One prediction, linked to the profile it was derived from. Immutable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    pub id: Uuid,
    pub user_id: String,
    pub profile_id: Uuid,
    pub label: RiskLabel,
    /// Probability of the positive class.
    pub probability: f64,
    pub model_identifier: String,
    pub created_at: DateTime<Utc>,
}

enum ModelState {
    Unloaded,
    Loaded {
        name: String,
        model: Box<dyn BinaryModel>,
    },
}

/// Owns the model. `load` must succeed before `predict`.
pub struct RiskClassifier {
    spec: ModelSpec,
    state: ModelState,
}

impl RiskClassifier {
    /// Create an unloaded classifier.
    pub fn new(spec: ModelSpec) -> Self {
        Self {
            spec,
            state: ModelState::Unloaded,
        }
    }

    /// Create a classifier around an already-built model.
    pub fn with_model(spec: ModelSpec, name: &str, model: Box<dyn BinaryModel>) -> Self {
        Self {
            spec,
            state: ModelState::Loaded {
                name: name.to_string(),
                model,
            },
        }
    }

    pub fn spec(&self) -> &ModelSpec {
        &self.spec
    }

    pub fn is_loaded(&self) -> bool {
        matches!(self.state, ModelState::Loaded { .. })
    }

    /// Read the artifact once. Later calls are no-ops.
    pub fn load(&mut self) -> Result<(), ClassifierError> {
        if self.is_loaded() {
            return Ok(());
        }
        let artifact = ModelArtifact::read(&self.spec.path)?;
        let name = self.spec.name.clone().unwrap_or(artifact.name);
        tracing::info!(model = %name, path = %self.spec.path.display(), "loaded risk model");
        self.state = ModelState::Loaded {
            name,
            model: artifact.model.into_model(),
        };
        Ok(())
    }

    /// Identifier of the loaded model.
    pub fn model_identifier(&self) -> Option<&str> {
        match &self.state {
            ModelState::Loaded { name, .. } => Some(name),
            ModelState::Unloaded => None,
        }
    }

    /// Positive-class probability for `profile`.
    pub fn probability(&self, profile: &DemographicProfile) -> Result<f64, ClassifierError> {
        let ModelState::Loaded { model, .. } = &self.state else {
            return Err(ClassifierError::NotLoaded);
        };
        let features = vectorize(profile, &self.spec.feature_order);

        let probability = match model.predict_proba(&features)? {
            Some(probs) => match probs.as_slice() {
                [] => {
                    return Err(ClassifierError::InvalidOutput(
                        "empty probability vector".into(),
                    ))
                }
                [single] => *single,
                [_, positive, ..] => *positive,
            },
            None => model.predict(&features)?,
        };

        if !probability.is_finite() {
            return Err(ClassifierError::InvalidOutput(format!(
                "non-finite probability {probability}"
            )));
        }
        Ok(probability)
    }

    /// Classify `profile` into a new prediction record.
    pub fn predict(
        &self,
        profile: &DemographicProfile,
        now: DateTime<Utc>,
    ) -> Result<PredictionResult, ClassifierError> {
        let probability = self.probability(profile)?;
        let model_identifier = self
            .model_identifier()
            .ok_or(ClassifierError::NotLoaded)?
            .to_string();
        let label = RiskLabel::from_probability(probability);
        tracing::info!(
            user = %profile.user_id,
            %label,
            probability,
            "risk prediction for intake {}",
            profile.id
        );
        Ok(PredictionResult {
            id: Uuid::new_v4(),
            user_id: profile.user_id.clone(),
            profile_id: profile.id,
            label,
            probability,
            model_identifier,
            created_at: now,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile(
        age: u32,
        gender: Option<Gender>,
        reading: bool,
        attention: AttentionSpan,
    ) -> DemographicProfile {
        DemographicProfile {
            id: Uuid::new_v4(),
            user_id: "u".into(),
            age,
            gender,
            academic_history: String::new(),
            reading_difficulties: reading,
            attention_span: attention,
            learning_issues_notes: String::new(),
            created_at: Utc::now(),
        }
    }

    /// Always returns the configured output.
    struct Fixed {
        proba: Option<Vec<f64>>,
        hard: f64,
    }

    impl BinaryModel for Fixed {
        fn predict_proba(&self, _: &[f64]) -> Result<Option<Vec<f64>>, ClassifierError> {
            Ok(self.proba.clone())
        }

        fn predict(&self, _: &[f64]) -> Result<f64, ClassifierError> {
            Ok(self.hard)
        }
    }

    fn fixed(proba: Option<Vec<f64>>, hard: f64) -> RiskClassifier {
        RiskClassifier::with_model(
            ModelSpec::new("unused.json"),
            "fixed",
            Box::new(Fixed { proba, hard }),
        )
    }

    #[test]
    fn vectorizes_in_contract_order() {
        let p = profile(10, Some(Gender::Male), true, AttentionSpan::Low);
        assert_eq!(
            vectorize(&p, &default_feature_order()),
            vec![10.0, 1.0, 0.0, 0.0, 1.0, 1.0, 0.0, 0.0]
        );
    }

    #[test]
    fn missing_gender_and_unknown_features_are_zero() {
        let p = profile(12, None, false, AttentionSpan::High);
        let order: Vec<String> = ["gender_male", "gender_female", "shoe_size", "attention_high"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        assert_eq!(vectorize(&p, &order), vec![0.0, 0.0, 0.0, 1.0]);
    }

    #[test]
    fn two_column_probability_uses_positive_class() {
        let classifier = fixed(Some(vec![0.3, 0.7]), 0.0);
        let p = profile(10, None, false, AttentionSpan::Medium);
        let prediction = classifier.predict(&p, Utc::now()).unwrap();
        assert_eq!(prediction.probability, 0.7);
        assert_eq!(prediction.label, RiskLabel::Positive);
        assert_eq!(prediction.model_identifier, "fixed");
        assert_eq!(prediction.profile_id, p.id);
    }

    #[test]
    fn single_column_probability_is_used_directly() {
        let classifier = fixed(Some(vec![0.2]), 1.0);
        let p = profile(10, None, false, AttentionSpan::Medium);
        let prediction = classifier.predict(&p, Utc::now()).unwrap();
        assert_eq!(prediction.probability, 0.2);
        assert_eq!(prediction.label, RiskLabel::Negative);
    }

    #[test]
    fn hard_prediction_becomes_probability() {
        let classifier = fixed(None, 1.0);
        let p = profile(10, None, false, AttentionSpan::Medium);
        let prediction = classifier.predict(&p, Utc::now()).unwrap();
        assert_eq!(prediction.probability, 1.0);
        assert_eq!(prediction.label, RiskLabel::Positive);
    }

    #[test]
    fn threshold_is_inclusive() {
        assert_eq!(RiskLabel::from_probability(0.5), RiskLabel::Positive);
        assert_eq!(RiskLabel::from_probability(0.4999), RiskLabel::Negative);
        assert_eq!(RiskLabel::Positive.to_string(), "LD Detected");
    }

    #[test]
    fn empty_probability_vector_is_an_error() {
        let classifier = fixed(Some(vec![]), 0.0);
        let p = profile(10, None, false, AttentionSpan::Medium);
        assert!(matches!(
            classifier.predict(&p, Utc::now()),
            Err(ClassifierError::InvalidOutput(_))
        ));
    }

    #[test]
    fn unloaded_classifier_refuses_to_predict() {
        let classifier = RiskClassifier::new(ModelSpec::new("missing.json"));
        let p = profile(10, None, false, AttentionSpan::Medium);
        assert!(!classifier.is_loaded());
        assert!(matches!(
            classifier.predict(&p, Utc::now()),
            Err(ClassifierError::NotLoaded)
        ));
    }

    #[test]
    fn missing_artifact_fails_to_load() {
        let dir = tempfile::tempdir().unwrap();
        let mut classifier = RiskClassifier::new(ModelSpec::new(dir.path().join("nope.json")));
        assert!(matches!(
            classifier.load(),
            Err(ClassifierError::ArtifactUnreadable { .. })
        ));
        assert!(!classifier.is_loaded());
    }

    #[test]
    fn corrupt_artifact_fails_to_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.json");
        std::fs::write(&path, "{ not json").unwrap();
        let mut classifier = RiskClassifier::new(ModelSpec::new(&path));
        assert!(matches!(
            classifier.load(),
            Err(ClassifierError::ArtifactInvalid { .. })
        ));
    }

    #[test]
    fn baseline_artifact_loads_and_ranks_risk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.json");
        ModelArtifact::baseline().write(&path).unwrap();

        let mut classifier = RiskClassifier::new(ModelSpec::new(&path));
        classifier.load().unwrap();
        classifier.load().unwrap();
        assert_eq!(classifier.model_identifier(), Some("baseline-logistic"));

        let risky = profile(10, Some(Gender::Male), true, AttentionSpan::Low);
        let calm = profile(10, Some(Gender::Female), false, AttentionSpan::High);
        let p_risky = classifier.probability(&risky).unwrap();
        let p_calm = classifier.probability(&calm).unwrap();
        assert!(p_risky >= 0.5, "got {p_risky}");
        assert!(p_calm < 0.5, "got {p_calm}");
    }

    #[test]
    fn spec_name_overrides_artifact_name() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.json");
        ModelArtifact::baseline().write(&path).unwrap();
        let mut spec = ModelSpec::new(&path);
        spec.name = Some("sklearn".into());
        let mut classifier = RiskClassifier::new(spec);
        classifier.load().unwrap();
        assert_eq!(classifier.model_identifier(), Some("sklearn"));
    }

    #[test]
    fn feature_mismatch_is_reported() {
        let model = LogisticRegression {
            coefficients: vec![1.0, 2.0],
            intercept: 0.0,
        };
        assert!(matches!(
            model.predict_proba(&[1.0]),
            Err(ClassifierError::FeatureMismatch {
                expected: 2,
                got: 1
            })
        ));
    }

    #[test]
    fn linear_threshold_has_no_probabilities() {
        let model = LinearThreshold {
            weights: vec![1.0],
            bias: -2.0,
        };
        assert_eq!(model.predict_proba(&[5.0]).unwrap(), None);
        assert_eq!(model.predict(&[5.0]).unwrap(), 1.0);
        assert_eq!(model.predict(&[1.0]).unwrap(), 0.0);
    }

    #[test]
    fn artifact_json_shape() {
        let json = r#"{"name":"t","model":{"kind":"linear_threshold","weights":[1.0],"bias":0.5}}"#;
        let artifact: ModelArtifact = serde_json::from_str(json).unwrap();
        assert!(matches!(artifact.model, ModelKind::LinearThreshold(_)));
    }
}
