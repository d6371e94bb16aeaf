//! Core data model types for ldscreen.
//!
//! Assessment domains, the item sets presented to a user, and the
//! demographic intake that feeds the risk classifier.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// One assessment category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Domain {
    Math,
    Grammar,
    Reading,
    Memory,
    Scenario,
}

impl Domain {
    /// All domains in report order.
    pub const ALL: [Domain; 5] = [
        Domain::Math,
        Domain::Grammar,
        Domain::Reading,
        Domain::Memory,
        Domain::Scenario,
    ];

    /// Human-readable area name.
    pub fn label(self) -> &'static str {
        match self {
            Domain::Math => "Math",
            Domain::Grammar => "Grammar",
            Domain::Reading => "Reading",
            Domain::Memory => "Memory",
            Domain::Scenario => "Comprehension",
        }
    }

    /// Whether results in this domain are graded item by item.
    pub fn is_list_graded(self) -> bool {
        !matches!(self, Domain::Reading)
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Domain::Math => write!(f, "math"),
            Domain::Grammar => write!(f, "grammar"),
            Domain::Reading => write!(f, "reading"),
            Domain::Memory => write!(f, "memory"),
            Domain::Scenario => write!(f, "scenario"),
        }
    }
}

impl FromStr for Domain {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "math" | "arithmetic" => Ok(Domain::Math),
            "grammar" => Ok(Domain::Grammar),
            "reading" => Ok(Domain::Reading),
            "memory" => Ok(Domain::Memory),
            "scenario" | "comprehension" => Ok(Domain::Scenario),
            other => Err(format!("unknown domain: {other}")),
        }
    }
}

/// Arithmetic operator of a math item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Operator {
    #[serde(rename = "+")]
    Add,
    #[serde(rename = "-")]
    Sub,
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operator::Add => write!(f, "+"),
            Operator::Sub => write!(f, "-"),
        }
    }
}

impl FromStr for Operator {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "+" => Ok(Operator::Add),
            "-" => Ok(Operator::Sub),
            other => Err(format!("unsupported operator: {other}")),
        }
    }
}

/// A math item: `a op b`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArithmeticItem {
    pub a: i64,
    pub b: i64,
    pub op: Operator,
}

impl ArithmeticItem {
    /// The correct answer, or `None` when it does not fit in an `i64`.
    pub fn expected(&self) -> Option<i64> {
        match self.op {
            Operator::Add => self.a.checked_add(self.b),
            Operator::Sub => self.a.checked_sub(self.b),
        }
    }
}

impl fmt::Display for ArithmeticItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.a, self.op, self.b)
    }
}

/// A multiple-choice item used by grammar and scenario tests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChoiceItem {
    /// The question shown to the user.
    pub prompt: String,
    /// Options in presentation order.
    #[serde(default)]
    pub options: Vec<String>,
    /// The correct option text.
    pub answer: String,
}

/// The immutable set of items presented in one attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "domain", rename_all = "lowercase")]
pub enum ItemSet {
    Math {
        items: Vec<ArithmeticItem>,
    },
    Grammar {
        items: Vec<ChoiceItem>,
    },
    Reading {
        passage: String,
    },
    Memory {
        sequence: Vec<u32>,
    },
    Scenario {
        /// Short story the questions refer to.
        #[serde(default)]
        story: String,
        items: Vec<ChoiceItem>,
    },
}

impl ItemSet {
    pub fn domain(&self) -> Domain {
        match self {
            ItemSet::Math { .. } => Domain::Math,
            ItemSet::Grammar { .. } => Domain::Grammar,
            ItemSet::Reading { .. } => Domain::Reading,
            ItemSet::Memory { .. } => Domain::Memory,
            ItemSet::Scenario { .. } => Domain::Scenario,
        }
    }

    /// Number of gradable positions (0 for reading).
    pub fn len(&self) -> usize {
        match self {
            ItemSet::Math { items } => items.len(),
            ItemSet::Grammar { items } | ItemSet::Scenario { items, .. } => items.len(),
            ItemSet::Reading { .. } => 0,
            ItemSet::Memory { sequence } => sequence.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            ItemSet::Reading { passage } => passage.trim().is_empty(),
            _ => self.len() == 0,
        }
    }
}

/// A named item set inside an item bank.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BankSet {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(flatten)]
    pub items: ItemSet,
}

/// A collection of item sets loaded from one file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemBank {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub sets: Vec<BankSet>,
}

impl ItemBank {
    pub fn set(&self, id: &str) -> Option<&BankSet> {
        self.sets.iter().find(|s| s.id == id)
    }
}

/// Gender as recorded on the intake form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
    Other,
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Gender::Male => write!(f, "male"),
            Gender::Female => write!(f, "female"),
            Gender::Other => write!(f, "other"),
        }
    }
}

impl FromStr for Gender {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "male" | "m" => Ok(Gender::Male),
            "female" | "f" => Ok(Gender::Female),
            "other" => Ok(Gender::Other),
            other => Err(format!("unknown gender: {other}")),
        }
    }
}

/// Self-reported attention span.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttentionSpan {
    Low,
    #[default]
    Medium,
    High,
}

impl fmt::Display for AttentionSpan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttentionSpan::Low => write!(f, "low"),
            AttentionSpan::Medium => write!(f, "medium"),
            AttentionSpan::High => write!(f, "high"),
        }
    }
}

impl FromStr for AttentionSpan {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "low" => Ok(AttentionSpan::Low),
            "medium" | "med" => Ok(AttentionSpan::Medium),
            "high" => Ok(AttentionSpan::High),
            other => Err(format!("unknown attention span: {other}")),
        }
    }
}

/// Youngest and oldest accepted ages on the intake form.
pub const MIN_AGE: u32 = 1;
pub const MAX_AGE: u32 = 25;

/// Raw intake form data before it is attached to a user.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IntakeForm {
    pub age: u32,
    #[serde(default)]
    pub gender: Option<Gender>,
    #[serde(default)]
    pub academic_history: String,
    #[serde(default)]
    pub reading_difficulties: bool,
    #[serde(default)]
    pub attention_span: AttentionSpan,
    #[serde(default)]
    pub learning_issues_notes: String,
}

impl IntakeForm {
    /// Check the form and build a profile owned by `user_id`.
    pub fn into_profile(
        self,
        user_id: &str,
        now: DateTime<Utc>,
    ) -> Result<DemographicProfile, String> {
        if !(MIN_AGE..=MAX_AGE).contains(&self.age) {
            return Err(format!(
                "please enter a valid age between {MIN_AGE} and {MAX_AGE}"
            ));
        }
        Ok(DemographicProfile {
            id: Uuid::new_v4(),
            user_id: user_id.to_string(),
            age: self.age,
            gender: self.gender,
            academic_history: self.academic_history,
            reading_difficulties: self.reading_difficulties,
            attention_span: self.attention_span,
            learning_issues_notes: self.learning_issues_notes,
            created_at: now,
        })
    }
}

/// One demographic intake submission. The most recent one per user is
/// authoritative for prediction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DemographicProfile {
    pub id: Uuid,
    pub user_id: String,
    pub age: u32,
    #[serde(default)]
    pub gender: Option<Gender>,
    #[serde(default)]
    pub academic_history: String,
    #[serde(default)]
    pub reading_difficulties: bool,
    #[serde(default)]
    pub attention_span: AttentionSpan,
    #[serde(default)]
    pub learning_issues_notes: String,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn domain_display_and_parse() {
        assert_eq!(Domain::Scenario.to_string(), "scenario");
        assert_eq!(Domain::Scenario.label(), "Comprehension");
        assert_eq!("Math".parse::<Domain>().unwrap(), Domain::Math);
        assert_eq!("arithmetic".parse::<Domain>().unwrap(), Domain::Math);
        assert_eq!(
            "comprehension".parse::<Domain>().unwrap(),
            Domain::Scenario
        );
        assert!("spelling".parse::<Domain>().is_err());
    }

    #[test]
    fn arithmetic_expected_values() {
        let add = ArithmeticItem {
            a: 7,
            b: 5,
            op: Operator::Add,
        };
        let sub = ArithmeticItem {
            a: 7,
            b: 9,
            op: Operator::Sub,
        };
        assert_eq!(add.expected(), Some(12));
        assert_eq!(sub.expected(), Some(-2));
        assert_eq!(add.to_string(), "7 + 5");

        let overflow = ArithmeticItem {
            a: i64::MAX,
            b: 1,
            op: Operator::Add,
        };
        let underflow = ArithmeticItem {
            a: i64::MIN,
            b: 1,
            op: Operator::Sub,
        };
        assert_eq!(overflow.expected(), None);
        assert_eq!(underflow.expected(), None);
    }

    #[test]
    fn item_set_serde_is_tagged_by_domain() {
        let set = ItemSet::Memory {
            sequence: vec![1, 2, 3],
        };
        let json = serde_json::to_string(&set).unwrap();
        assert!(json.contains("\"domain\":\"memory\""));
        let back: ItemSet = serde_json::from_str(&json).unwrap();
        assert_eq!(back.domain(), Domain::Memory);
        assert_eq!(back.len(), 3);
    }

    #[test]
    fn reading_set_is_empty_only_without_passage() {
        let blank = ItemSet::Reading {
            passage: "  ".into(),
        };
        let passage = ItemSet::Reading {
            passage: "The fox.".into(),
        };
        assert!(blank.is_empty());
        assert!(!passage.is_empty());
    }

    #[test]
    fn intake_rejects_out_of_range_age() {
        let form = IntakeForm {
            age: 26,
            ..Default::default()
        };
        let err = form.into_profile("u1", Utc::now()).unwrap_err();
        assert!(err.contains("between 1 and 25"));

        let zero = IntakeForm::default();
        assert!(zero.into_profile("u1", Utc::now()).is_err());
    }

    #[test]
    fn intake_defaults_attention_to_medium() {
        let form: IntakeForm = serde_json::from_str(r#"{"age": 10}"#).unwrap();
        assert_eq!(form.attention_span, AttentionSpan::Medium);
        assert!(form.gender.is_none());
        let profile = form.into_profile("u1", Utc::now()).unwrap();
        assert_eq!(profile.user_id, "u1");
        assert_eq!(profile.age, 10);
    }
}
