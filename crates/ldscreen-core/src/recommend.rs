//! Recommendation derivation.
//!
//! Each weak domain maps to exactly one fixed template. The template lookup
//! is an exhaustive `match`, so a new [`Domain`] variant does not compile
//! until it has a template.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::aggregate::AreaScore;
use crate::model::Domain;

/// Domains at or below this weakness get no recommendation.
pub const MATERIALITY_THRESHOLD: f64 = 0.1;

/// Static recommendation content for one domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecommendationTemplate {
    pub title: &'static str,
    pub description: &'static str,
    pub resource_url: &'static str,
}

/// The fixed template for `domain`.
pub fn template_for(domain: Domain) -> RecommendationTemplate {
    match domain {
        Domain::Math => RecommendationTemplate {
            title: "Basic numeracy practice",
            description:
                "Practice addition and subtraction within 20. Focus on accuracy, then speed.",
            resource_url: "https://www.khanacademy.org/math/arithmetic",
        },
        Domain::Grammar => RecommendationTemplate {
            title: "Subject-verb agreement drills",
            description: "Short exercises on articles and agreement.",
            resource_url: "https://www.ego4u.com/en/cram-up/grammar",
        },
        Domain::Reading => RecommendationTemplate {
            title: "Fluency passages (timed)",
            description: "Read graded passages aloud daily; track WPM and accuracy.",
            resource_url: "https://readtheory.org/",
        },
        Domain::Memory => RecommendationTemplate {
            title: "Working memory games",
            description: "Sequence recall and matching games to build memory span.",
            resource_url: "https://www.cognifit.com/",
        },
        Domain::Scenario => RecommendationTemplate {
            title: "Reading comprehension practice",
            description: "Answer wh- questions after short stories to improve inference.",
            resource_url: "https://www.ixl.com/ela/",
        },
    }
}

/// A recommendation owned by one user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub id: Uuid,
    pub user_id: String,
    pub domain: Domain,
    pub title: String,
    pub description: String,
    pub resource_url: String,
    /// The domain's weakness score.
    pub severity: f64,
    pub created_at: DateTime<Utc>,
}

/// Build the recommendation set for `user_id` from its area scores.
///
/// The result replaces the user's previous set; it is ordered by
/// descending severity.
pub fn derive_recommendations(
    user_id: &str,
    scores: &[AreaScore],
    now: DateTime<Utc>,
) -> Vec<Recommendation> {
    let mut recommendations: Vec<Recommendation> = scores
        .iter()
        .filter(|s| s.weakness > MATERIALITY_THRESHOLD)
        .map(|s| {
            let template = template_for(s.domain);
            Recommendation {
                id: Uuid::new_v4(),
                user_id: user_id.to_string(),
                domain: s.domain,
                title: template.title.to_string(),
                description: template.description.to_string(),
                resource_url: template.resource_url.to_string(),
                severity: s.weakness,
                created_at: now,
            }
        })
        .collect();
    sort_by_severity(&mut recommendations);
    recommendations
}

/// Descending severity; ties keep no particular order.
pub fn sort_by_severity(recommendations: &mut [Recommendation]) {
    recommendations.sort_unstable_by(|a, b| b.severity.total_cmp(&a.severity));
}
