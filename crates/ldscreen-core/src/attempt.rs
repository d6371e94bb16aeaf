//! Attempt tickets and submissions.
//!
//! An [`Attempt`] is opened when a test starts and is handed back to the
//! grader together with the user's [`Submission`]. The ticket carries the
//! item set and start time, so grading never depends on ambient state.

use std::collections::BTreeMap;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::GradeError;
use crate::model::{Domain, ItemSet};

/// An in-progress test for one user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attempt {
    pub id: Uuid,
    pub user_id: String,
    pub items: ItemSet,
    pub started_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl Attempt {
    /// Open a new attempt that stays valid for `ttl`, saturating at the
    /// latest representable time.
    pub fn open(user_id: &str, items: ItemSet, now: DateTime<Utc>, ttl: Duration) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id: user_id.to_string(),
            items,
            started_at: now,
            expires_at: now
                .checked_add_signed(ttl)
                .unwrap_or(DateTime::<Utc>::MAX_UTC),
        }
    }

    pub fn domain(&self) -> Domain {
        self.items.domain()
    }

    /// Check that `submission` belongs to this attempt and that the attempt
    /// is still open at `now`.
    pub fn check(
        &self,
        user_id: &str,
        submission: &Submission,
        now: DateTime<Utc>,
    ) -> Result<(), GradeError> {
        if submission.attempt_id != self.id || user_id != self.user_id {
            return Err(GradeError::NoActiveAttempt {
                attempt_id: submission.attempt_id,
            });
        }
        if now > self.expires_at {
            return Err(GradeError::AttemptExpired {
                attempt_id: self.id,
            });
        }
        Ok(())
    }

    /// Whole seconds between start and `now`, never negative.
    pub fn elapsed_seconds(&self, now: DateTime<Utc>) -> u64 {
        (now - self.started_at).num_seconds().max(0) as u64
    }
}

/// The user's raw answers for one attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Submission {
    pub attempt_id: Uuid,
    pub response: Response,
}

impl Submission {
    /// Answers keyed by item index.
    pub fn answers(attempt_id: Uuid, answers: impl IntoIterator<Item = (usize, String)>) -> Self {
        Self {
            attempt_id,
            response: Response::Answers(answers.into_iter().collect()),
        }
    }

    /// Free text (reading transcript or recalled digits).
    pub fn text(attempt_id: Uuid, text: impl Into<String>) -> Self {
        Self {
            attempt_id,
            response: Response::Text(text.into()),
        }
    }
}

/// Raw response payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Response {
    /// One raw answer per item index; missing indices are blank answers.
    Answers(BTreeMap<usize, String>),
    /// A single free-text response.
    Text(String),
}

impl Response {
    /// The raw answer for item `index`, if one was given.
    pub fn answer(&self, index: usize) -> Option<&str> {
        match self {
            Response::Answers(map) => map.get(&index).map(String::as_str),
            Response::Text(_) => None,
        }
    }

    /// The response as one text; per-item answers are joined in index order.
    pub fn text(&self) -> String {
        match self {
            Response::Text(text) => text.clone(),
            Response::Answers(map) => map.values().map(String::as_str).collect::<Vec<_>>().join(" "),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn math_attempt(now: DateTime<Utc>) -> Attempt {
        Attempt::open(
            "alice",
            ItemSet::Math { items: vec![] },
            now,
            Duration::minutes(30),
        )
    }

    #[test]
    fn check_accepts_matching_submission() {
        let now = Utc::now();
        let attempt = math_attempt(now);
        let submission = Submission::answers(attempt.id, []);
        assert!(attempt.check("alice", &submission, now).is_ok());
    }

    #[test]
    fn check_rejects_foreign_ticket() {
        let now = Utc::now();
        let attempt = math_attempt(now);
        let submission = Submission::answers(Uuid::new_v4(), []);
        assert!(matches!(
            attempt.check("alice", &submission, now),
            Err(GradeError::NoActiveAttempt { .. })
        ));

        let own = Submission::answers(attempt.id, []);
        assert!(matches!(
            attempt.check("bob", &own, now),
            Err(GradeError::NoActiveAttempt { .. })
        ));
    }

    #[test]
    fn huge_ttl_saturates_instead_of_overflowing() {
        let now = Utc::now();
        let attempt = Attempt::open(
            "alice",
            ItemSet::Math { items: vec![] },
            now,
            Duration::days(365 * 1_000_000),
        );
        assert_eq!(attempt.expires_at, DateTime::<Utc>::MAX_UTC);
        let submission = Submission::answers(attempt.id, []);
        assert!(attempt.check("alice", &submission, now).is_ok());
    }

    #[test]
    fn check_rejects_expired_attempt() {
        let now = Utc::now();
        let attempt = math_attempt(now);
        let submission = Submission::answers(attempt.id, []);
        let later = now + Duration::minutes(31);
        assert!(matches!(
            attempt.check("alice", &submission, later),
            Err(GradeError::AttemptExpired { .. })
        ));
    }

    #[test]
    fn elapsed_is_clamped_at_zero() {
        let now = Utc::now();
        let attempt = math_attempt(now);
        assert_eq!(attempt.elapsed_seconds(now - Duration::seconds(5)), 0);
        assert_eq!(attempt.elapsed_seconds(now + Duration::seconds(42)), 42);
    }

    #[test]
    fn response_text_joins_answers_in_order() {
        let response = Response::Answers(BTreeMap::from([
            (1, "two".to_string()),
            (0, "one".to_string()),
        ]));
        assert_eq!(response.text(), "one two");
        assert_eq!(response.answer(1), Some("two"));
        assert_eq!(Response::Text("x".into()).answer(0), None);
    }
}
