//! Screening report assembly with JSON persistence.

use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::aggregate::{area_scores, AreaScore};
use crate::classifier::PredictionResult;
use crate::model::{DemographicProfile, Domain};
use crate::recommend::Recommendation;
use crate::results::{Outcome, ReadingDetail, ScoredResult};

/// Detail rows shown per test section.
pub const MAX_ROWS: usize = 10;
/// Recommendations shown in the report.
pub const MAX_RECOMMENDATIONS: usize = 10;

/// Everything the downloadable report shows for one user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScreeningReport {
    pub id: Uuid,
    pub user_id: String,
    pub generated_at: DateTime<Utc>,
    pub profile: Option<DemographicProfile>,
    pub prediction: Option<PredictionResult>,
    /// One section per domain, in [`Domain::ALL`] order.
    pub sections: Vec<TestSection>,
    pub area_scores: Vec<AreaScore>,
    /// Top recommendations by descending severity.
    pub recommendations: Vec<Recommendation>,
}

/// The latest attempt in one domain, if any.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestSection {
    pub domain: Domain,
    pub latest: Option<AttemptSummary>,
}

/// Summary of one attempt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttemptSummary {
    pub started_at: DateTime<Utc>,
    pub duration_seconds: u64,
    pub correct_count: Option<u32>,
    pub total_count: Option<u32>,
    #[serde(default)]
    pub rows: Vec<ReportRow>,
    #[serde(default)]
    pub reading: Option<ReadingDetail>,
}

/// One row of a test section table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportRow {
    /// 1-based position.
    pub position: usize,
    /// The item as shown; empty for memory rows.
    pub item: String,
    pub given: String,
    pub expected: String,
    pub is_correct: bool,
}

impl AttemptSummary {
    fn from_result(result: &ScoredResult) -> Self {
        let (correct_count, total_count) = match result.counts() {
            Some((c, t)) => (Some(c), Some(t)),
            None => (None, None),
        };
        let rows = match &result.outcome {
            Outcome::Items { details, .. } => details
                .iter()
                .take(MAX_ROWS)
                .enumerate()
                .map(|(i, d)| ReportRow {
                    position: i + 1,
                    item: d.item.clone(),
                    given: d.given.as_ref().map(ToString::to_string).unwrap_or_default(),
                    expected: d.expected.to_string(),
                    is_correct: d.is_correct,
                })
                .collect(),
            Outcome::Memory {
                target_sequence,
                recalled_sequence,
                ..
            } => memory_rows(target_sequence, recalled_sequence),
            Outcome::Reading(_) => Vec::new(),
        };
        Self {
            started_at: result.started_at,
            duration_seconds: result.duration_seconds,
            correct_count,
            total_count,
            rows,
            reading: result.reading().cloned(),
        }
    }
}

fn memory_rows(target: &[u32], recalled: &[u32]) -> Vec<ReportRow> {
    let shown = MAX_ROWS.min(target.len().max(recalled.len()));
    (0..shown)
        .map(|i| {
            let t = target.get(i);
            let r = recalled.get(i);
            ReportRow {
                position: i + 1,
                item: String::new(),
                given: r.map(ToString::to_string).unwrap_or_default(),
                expected: t.map(ToString::to_string).unwrap_or_default(),
                is_correct: matches!((t, r), (Some(a), Some(b)) if a == b),
            }
        })
        .collect()
}

impl ScreeningReport {
    /// Assemble a report from the user's stored records.
    pub fn compile(
        user_id: &str,
        generated_at: DateTime<Utc>,
        profile: Option<DemographicProfile>,
        prediction: Option<PredictionResult>,
        history: &[ScoredResult],
        mut recommendations: Vec<Recommendation>,
    ) -> Self {
        let sections = Domain::ALL
            .iter()
            .map(|&domain| TestSection {
                domain,
                latest: history
                    .iter()
                    .filter(|r| r.domain == domain)
                    .max_by_key(|r| r.started_at)
                    .map(AttemptSummary::from_result),
            })
            .collect();
        recommendations.truncate(MAX_RECOMMENDATIONS);

        Self {
            id: Uuid::new_v4(),
            user_id: user_id.to_string(),
            generated_at,
            profile,
            prediction,
            sections,
            area_scores: area_scores(history),
            recommendations,
        }
    }

    pub fn section(&self, domain: Domain) -> Option<&TestSection> {
        self.sections.iter().find(|s| s.domain == domain)
    }

    /// Save the report as JSON to a file.
    pub fn save_json(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).context("failed to serialize report")?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, json)
            .with_context(|| format!("failed to write report to {}", path.display()))?;
        Ok(())
    }

    /// Load a report from a JSON file.
    pub fn load_json(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read report from {}", path.display()))?;
        let report: ScreeningReport =
            serde_json::from_str(&content).context("failed to parse report JSON")?;
        Ok(report)
    }

    /// Format the report as markdown.
    pub fn to_markdown(&self) -> String {
        let mut md = String::new();

        md.push_str("# LD Screening - Student Report\n\n");
        md.push_str(&format!(
            "Generated on {}\n\n**User:** {}\n\n",
            self.generated_at.format("%Y-%m-%d %H:%M UTC"),
            self.user_id
        ));

        if let Some(p) = &self.profile {
            md.push_str("| Field | Value |\n|-------|-------|\n");
            md.push_str(&format!("| Age | {} |\n", p.age));
            md.push_str(&format!(
                "| Gender | {} |\n",
                p.gender.map(|g| g.to_string()).unwrap_or_else(|| "-".into())
            ));
            md.push_str(&format!(
                "| Reading difficulties | {} |\n",
                if p.reading_difficulties { "Yes" } else { "No" }
            ));
            md.push_str(&format!("| Attention | {} |\n\n", p.attention_span));
        }

        md.push_str("## Model Prediction\n\n");
        match &self.prediction {
            Some(pred) => md.push_str(&format!(
                "Label: **{}**\n\nProbability (LD): {:.2}\n\n",
                pred.label, pred.probability
            )),
            None => md.push_str("No prediction available.\n\n"),
        }

        for section in &self.sections {
            md.push_str(&format!("## {} Test\n\n", section.domain.label()));
            let Some(latest) = &section.latest else {
                md.push_str("No attempts recorded.\n\n");
                continue;
            };
            if let Some(reading) = &latest.reading {
                md.push_str(&format!(
                    "WPM: {:.1}, Accuracy: {:.2}\n\nPassage: {}\n\n",
                    reading.words_per_minute, reading.token_overlap_accuracy, reading.reference_text
                ));
                continue;
            }
            if let (Some(c), Some(t)) = (latest.correct_count, latest.total_count) {
                md.push_str(&format!("Score: {c} / {t}\n\n"));
            }
            md.push_str(&format!(
                "Duration: {} seconds\n\n",
                latest.duration_seconds
            ));
            if !latest.rows.is_empty() {
                md.push_str("| # | Item | Your | Correct | ✓ |\n");
                md.push_str("|---|------|------|---------|---|\n");
                for row in &latest.rows {
                    md.push_str(&format!(
                        "| {} | {} | {} | {} | {} |\n",
                        row.position,
                        row.item,
                        row.given,
                        row.expected,
                        if row.is_correct { "Yes" } else { "No" }
                    ));
                }
                md.push('\n');
            }
        }

        md.push_str("## Recommendations\n\n");
        if self.recommendations.is_empty() {
            md.push_str("No recommendations at this time.\n");
        } else {
            md.push_str("| Area | Title | Score |\n|------|-------|-------|\n");
            for r in &self.recommendations {
                md.push_str(&format!(
                    "| {} | {} | {:.2} |\n",
                    r.domain.label(),
                    r.title,
                    r.severity
                ));
            }
        }

        md
    }
}
