//! Assessment graders.
//!
//! Every domain has one [`Grader`]; [`grader_for`] picks it from the item
//! set variant. Grading never fails on malformed answers: unparsable or
//! missing answers count as wrong. Only protocol violations (unknown or
//! expired attempt) are errors, and those are raised before any scoring.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::attempt::{Attempt, Response, Submission};
use crate::error::GradeError;
use crate::model::{ArithmeticItem, ChoiceItem, ItemSet};
use crate::results::{AnswerValue, ItemDetail, Outcome, ReadingDetail, ScoredResult};

/// Turns a raw response into a graded outcome.
pub trait Grader {
    fn grade(&self, response: &Response, duration_seconds: u64) -> Outcome;
}

/// Select the grader for an item set.
pub fn grader_for(items: &ItemSet) -> Box<dyn Grader + '_> {
    match items {
        ItemSet::Math { items } => Box::new(ArithmeticGrader { items }),
        ItemSet::Grammar { items } | ItemSet::Scenario { items, .. } => {
            Box::new(ChoiceGrader { items })
        }
        ItemSet::Reading { passage } => Box::new(ReadingGrader { reference: passage }),
        ItemSet::Memory { sequence } => Box::new(MemoryGrader { target: sequence }),
    }
}

/// Grade `submission` against the attempt it claims to answer.
pub fn grade(
    attempt: &Attempt,
    user_id: &str,
    submission: &Submission,
    now: DateTime<Utc>,
) -> Result<ScoredResult, GradeError> {
    attempt.check(user_id, submission, now)?;

    let duration_seconds = attempt.elapsed_seconds(now);
    let outcome = grader_for(&attempt.items).grade(&submission.response, duration_seconds);

    let result = ScoredResult {
        id: Uuid::new_v4(),
        attempt_id: attempt.id,
        user_id: attempt.user_id.clone(),
        domain: attempt.domain(),
        started_at: attempt.started_at,
        ended_at: now,
        duration_seconds,
        outcome,
    };
    tracing::debug!(
        user = %result.user_id,
        domain = %result.domain,
        counts = ?result.counts(),
        duration_seconds,
        "graded attempt {}",
        attempt.id
    );
    Ok(result)
}

// ---------------------------------------------------------------------------
// List-graded domains
// ---------------------------------------------------------------------------

/// Math items: the answer must parse as an integer equal to `a op b`.
pub struct ArithmeticGrader<'a> {
    pub items: &'a [ArithmeticItem],
}

impl Grader for ArithmeticGrader<'_> {
    fn grade(&self, response: &Response, _duration_seconds: u64) -> Outcome {
        let details: Vec<ItemDetail> = self
            .items
            .iter()
            .enumerate()
            .map(|(i, item)| {
                let expected = item.expected();
                let given = response
                    .answer(i)
                    .and_then(|raw| raw.trim().parse::<i64>().ok());
                ItemDetail {
                    item: item.to_string(),
                    expected: expected
                        .map(AnswerValue::Number)
                        .unwrap_or_else(|| AnswerValue::Text("out of range".into())),
                    given: given.map(AnswerValue::Number),
                    is_correct: expected.is_some() && given == expected,
                }
            })
            .collect();
        items_outcome(details)
    }
}

/// Grammar and scenario items: exact, case-sensitive string equality.
pub struct ChoiceGrader<'a> {
    pub items: &'a [ChoiceItem],
}

impl Grader for ChoiceGrader<'_> {
    fn grade(&self, response: &Response, _duration_seconds: u64) -> Outcome {
        let details: Vec<ItemDetail> = self
            .items
            .iter()
            .enumerate()
            .map(|(i, item)| {
                let given = response.answer(i);
                ItemDetail {
                    item: item.prompt.clone(),
                    expected: AnswerValue::Text(item.answer.clone()),
                    given: given.map(|g| AnswerValue::Text(g.to_string())),
                    is_correct: given == Some(item.answer.as_str()),
                }
            })
            .collect();
        items_outcome(details)
    }
}

fn items_outcome(details: Vec<ItemDetail>) -> Outcome {
    let correct_count = details.iter().filter(|d| d.is_correct).count() as u32;
    Outcome::Items {
        correct_count,
        total_count: details.len() as u32,
        details,
    }
}

/// Digit span: positional matches up to the shorter sequence.
pub struct MemoryGrader<'a> {
    pub target: &'a [u32],
}

impl Grader for MemoryGrader<'_> {
    fn grade(&self, response: &Response, _duration_seconds: u64) -> Outcome {
        let recalled = parse_digit_tokens(&response.text());
        let correct_count = self
            .target
            .iter()
            .zip(&recalled)
            .filter(|(t, r)| t == r)
            .count() as u32;
        Outcome::Memory {
            correct_count,
            total_count: self.target.len() as u32,
            target_sequence: self.target.to_vec(),
            recalled_sequence: recalled,
        }
    }
}

/// Whitespace-separated digit tokens; anything else is dropped.
pub fn parse_digit_tokens(text: &str) -> Vec<u32> {
    text.split_whitespace()
        .filter(|t| t.chars().all(|c| c.is_ascii_digit()))
        .filter_map(|t| t.parse().ok())
        .collect()
}

// ---------------------------------------------------------------------------
// Reading
// ---------------------------------------------------------------------------

/// Oral reading: speed from the transcript length, accuracy from token
/// overlap with the passage.
pub struct ReadingGrader<'a> {
    pub reference: &'a str,
}

impl Grader for ReadingGrader<'_> {
    fn grade(&self, response: &Response, duration_seconds: u64) -> Outcome {
        let transcript = response.text();
        let reference_tokens = tokenize(self.reference);
        let hypothesis = tokenize(&transcript);

        let words_per_minute = if duration_seconds > 0 {
            hypothesis.len() as f64 / (duration_seconds as f64 / 60.0)
        } else {
            0.0
        };

        let accuracy = token_overlap_accuracy(&reference_tokens, &hypothesis);

        Outcome::Reading(ReadingDetail {
            reference_text: self.reference.to_string(),
            transcript,
            words_per_minute: round2(words_per_minute),
            token_overlap_accuracy: round2(accuracy),
        })
    }
}

/// Lower-case, blank out punctuation, split on whitespace.
pub fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || c.is_whitespace() {
                c
            } else {
                ' '
            }
        })
        .collect::<String>()
        .split_whitespace()
        .map(str::to_string)
        .collect()
}

/// Hypothesis tokens found anywhere in the reference, over the reference
/// length. Repeats count every time, so the ratio is not bounded by 1.
pub fn token_overlap_accuracy(reference: &[String], hypothesis: &[String]) -> f64 {
    let vocabulary: HashSet<&str> = reference.iter().map(String::as_str).collect();
    let overlap = hypothesis
        .iter()
        .filter(|t| vocabulary.contains(t.as_str()))
        .count();
    overlap as f64 / reference.len().max(1) as f64
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Operator;
    use chrono::Duration;
    use std::collections::BTreeMap;

    fn answers(values: &[&str]) -> Response {
        Response::Answers(
            values
                .iter()
                .enumerate()
                .map(|(i, v)| (i, v.to_string()))
                .collect::<BTreeMap<_, _>>(),
        )
    }

    fn choice(prompt: &str, answer: &str) -> ChoiceItem {
        ChoiceItem {
            prompt: prompt.into(),
            options: vec![answer.into(), "other".into()],
            answer: answer.into(),
        }
    }

    #[test]
    fn arithmetic_exact_integer_match() {
        let items = [
            ArithmeticItem {
                a: 7,
                b: 5,
                op: Operator::Add,
            },
            ArithmeticItem {
                a: 7,
                b: 5,
                op: Operator::Sub,
            },
            ArithmeticItem {
                a: 3,
                b: 3,
                op: Operator::Add,
            },
        ];
        let outcome = ArithmeticGrader { items: &items }.grade(&answers(&["12", " 2 ", "abc"]), 10);
        let Outcome::Items {
            correct_count,
            total_count,
            details,
        } = outcome
        else {
            panic!("expected item outcome");
        };
        assert_eq!((correct_count, total_count), (2, 3));
        assert_eq!(details[0].expected, AnswerValue::Number(12));
        assert!(details[0].is_correct);
        assert_eq!(details[2].given, None);
        assert!(!details[2].is_correct);
    }

    #[test]
    fn arithmetic_out_of_range_item_is_never_correct() {
        let items = [ArithmeticItem {
            a: i64::MAX,
            b: 1,
            op: Operator::Add,
        }];
        let wrapped = i64::MIN.to_string();
        let outcome = ArithmeticGrader { items: &items }.grade(&answers(&[&wrapped]), 0);
        let Outcome::Items { details, .. } = outcome else {
            panic!("expected item outcome");
        };
        assert!(!details[0].is_correct);
        assert_eq!(details[0].expected, AnswerValue::Text("out of range".into()));
    }

    #[test]
    fn arithmetic_missing_answers_are_wrong() {
        let items = [ArithmeticItem {
            a: 1,
            b: 1,
            op: Operator::Add,
        }];
        let outcome = ArithmeticGrader { items: &items }.grade(&Response::Text("2".into()), 0);
        assert!(matches!(
            outcome,
            Outcome::Items {
                correct_count: 0,
                total_count: 1,
                ..
            }
        ));
    }

    #[test]
    fn choice_is_case_sensitive() {
        let items = [choice("She ___ to school.", "goes"), choice("I ___ happy.", "am")];
        let outcome = ChoiceGrader { items: &items }.grade(&answers(&["Goes", "am"]), 0);
        let Outcome::Items {
            correct_count,
            details,
            ..
        } = outcome
        else {
            panic!("expected item outcome");
        };
        assert_eq!(correct_count, 1);
        assert!(!details[0].is_correct);
        assert_eq!(details[0].given, Some(AnswerValue::Text("Goes".into())));
    }

    #[test]
    fn choice_blank_answer_is_wrong() {
        let items = [choice("Q", "A")];
        let mut map = BTreeMap::new();
        map.insert(5, "A".to_string());
        let outcome = ChoiceGrader { items: &items }.grade(&Response::Answers(map), 0);
        assert!(matches!(
            outcome,
            Outcome::Items {
                correct_count: 0,
                ..
            }
        ));
    }

    #[test]
    fn tokenize_strips_punctuation_and_case() {
        assert_eq!(tokenize("The Fox!"), vec!["the", "fox"]);
        assert_eq!(tokenize("it's   a dog's-life"), vec!["it", "s", "a", "dog", "s", "life"]);
        assert!(tokenize("?!").is_empty());
    }

    #[test]
    fn overlap_accuracy_is_not_clamped() {
        let reference = tokenize("The fox");
        let hypothesis = tokenize("the fox the");
        assert!((token_overlap_accuracy(&reference, &hypothesis) - 1.5).abs() < f64::EPSILON);
    }

    #[test]
    fn overlap_accuracy_with_empty_reference() {
        let hypothesis = tokenize("anything here");
        assert_eq!(token_overlap_accuracy(&[], &hypothesis), 0.0);
    }

    #[test]
    fn reading_wpm_and_rounding() {
        let grader = ReadingGrader {
            reference: "The quick brown fox jumps",
        };
        let outcome = grader.grade(&Response::Text("the quick brown fox".into()), 7);
        let Outcome::Reading(detail) = outcome else {
            panic!("expected reading outcome");
        };
        // 4 words in 7 seconds = 34.2857 wpm
        assert_eq!(detail.words_per_minute, 34.29);
        assert_eq!(detail.token_overlap_accuracy, 0.8);
    }

    #[test]
    fn reading_zero_duration_has_zero_wpm() {
        let grader = ReadingGrader { reference: "a b c" };
        let Outcome::Reading(detail) = grader.grade(&Response::Text("a b".into()), 0) else {
            panic!("expected reading outcome");
        };
        assert_eq!(detail.words_per_minute, 0.0);
    }

    #[test]
    fn memory_positional_matches() {
        let target = [1, 2, 3, 4, 5, 6];
        let outcome = MemoryGrader { target: &target }.grade(&Response::Text("1 2 9 4".into()), 0);
        let Outcome::Memory {
            correct_count,
            total_count,
            recalled_sequence,
            ..
        } = outcome
        else {
            panic!("expected memory outcome");
        };
        assert_eq!(correct_count, 3);
        assert_eq!(total_count, 6);
        assert_eq!(recalled_sequence, vec![1, 2, 9, 4]);
    }

    #[test]
    fn memory_drops_non_digit_tokens() {
        assert_eq!(parse_digit_tokens("1 x 2 -3 4a 5"), vec![1, 2, 5]);
        let target = [1, 2, 5];
        let outcome = MemoryGrader { target: &target }.grade(&Response::Text("1 x 2".into()), 0);
        assert!(matches!(
            outcome,
            Outcome::Memory {
                correct_count: 2,
                ..
            }
        ));
    }

    #[test]
    fn grade_builds_result_from_attempt() {
        let now = Utc::now();
        let attempt = Attempt::open(
            "alice",
            ItemSet::Memory {
                sequence: vec![4, 2],
            },
            now,
            Duration::minutes(10),
        );
        let submission = Submission::text(attempt.id, "4 2");
        let result = grade(&attempt, "alice", &submission, now + Duration::seconds(9)).unwrap();
        assert_eq!(result.duration_seconds, 9);
        assert_eq!(result.counts(), Some((2, 2)));
        assert_eq!(result.attempt_id, attempt.id);
    }

    #[test]
    fn grade_rejects_unknown_ticket() {
        let now = Utc::now();
        let attempt = Attempt::open(
            "alice",
            ItemSet::Math { items: vec![] },
            now,
            Duration::minutes(10),
        );
        let submission = Submission::text(Uuid::new_v4(), "");
        assert!(grade(&attempt, "alice", &submission, now).is_err());
    }
}
