//! Scored result records produced by the graders.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::model::Domain;

/// The graded outcome of one attempt. Append-only history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredResult {
    pub id: Uuid,
    pub attempt_id: Uuid,
    pub user_id: String,
    pub domain: Domain,
    pub started_at: DateTime<Utc>,
    pub ended_at: DateTime<Utc>,
    pub duration_seconds: u64,
    pub outcome: Outcome,
}

impl ScoredResult {
    /// `(correct_count, total_count)` for list-graded domains.
    pub fn counts(&self) -> Option<(u32, u32)> {
        match &self.outcome {
            Outcome::Items {
                correct_count,
                total_count,
                ..
            }
            | Outcome::Memory {
                correct_count,
                total_count,
                ..
            } => Some((*correct_count, *total_count)),
            Outcome::Reading(_) => None,
        }
    }

    pub fn reading(&self) -> Option<&ReadingDetail> {
        match &self.outcome {
            Outcome::Reading(detail) => Some(detail),
            _ => None,
        }
    }
}

/// Domain-specific grading detail.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Outcome {
    /// Math, grammar and scenario: one detail row per item.
    Items {
        correct_count: u32,
        total_count: u32,
        details: Vec<ItemDetail>,
    },
    /// Digit-span recall.
    Memory {
        correct_count: u32,
        total_count: u32,
        target_sequence: Vec<u32>,
        recalled_sequence: Vec<u32>,
    },
    /// Oral reading; no discrete items.
    Reading(ReadingDetail),
}

/// One graded item, in presentation order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemDetail {
    /// The item as shown (e.g. `"7 + 5"` or the question text).
    pub item: String,
    pub expected: AnswerValue,
    /// `None` when the answer was missing or could not be parsed.
    pub given: Option<AnswerValue>,
    pub is_correct: bool,
}

/// An expected or given answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AnswerValue {
    Number(i64),
    Text(String),
}

impl fmt::Display for AnswerValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnswerValue::Number(n) => write!(f, "{n}"),
            AnswerValue::Text(s) => write!(f, "{s}"),
        }
    }
}

/// Oral reading metrics, rounded to 2 decimal places.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReadingDetail {
    pub reference_text: String,
    pub transcript: String,
    pub words_per_minute: f64,
    /// Overlap ratio; may exceed 1.0 when the transcript repeats
    /// reference words.
    pub token_overlap_accuracy: f64,
}
