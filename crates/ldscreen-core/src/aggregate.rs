//! Per-domain weakness scores.
//!
//! A weakness score is in [0, 1], higher meaning weaker performance. Scores
//! are recomputed from full history on every call and never stored.

use serde::{Deserialize, Serialize};

use crate::model::Domain;
use crate::results::ScoredResult;

/// Weight of (1 - mean accuracy) in the reading score.
pub const READING_ACCURACY_WEIGHT: f64 = 0.6;
/// Weight of the speed band in the reading score.
pub const READING_SPEED_WEIGHT: f64 = 0.4;
/// Below this WPM speed counts as fully weak.
pub const SLOW_WPM: f64 = 80.0;
/// Below this WPM (and at or above [`SLOW_WPM`]) speed counts as half weak.
pub const FLUENT_WPM: f64 = 120.0;

/// Weakness in one domain.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AreaScore {
    pub domain: Domain,
    pub weakness: f64,
}

/// Compute the weakness score of every domain, in [`Domain::ALL`] order.
///
/// `history` may mix domains and must belong to a single user.
pub fn area_scores(history: &[ScoredResult]) -> Vec<AreaScore> {
    Domain::ALL
        .iter()
        .map(|&domain| {
            let results: Vec<&ScoredResult> =
                history.iter().filter(|r| r.domain == domain).collect();
            let weakness = if domain.is_list_graded() {
                list_weakness(&results)
            } else {
                reading_weakness(&results)
            };
            AreaScore { domain, weakness }
        })
        .collect()
}

/// `1 - mean(correct) / mean(total)`; 0.0 without history.
///
/// Counts are averaged before dividing, so attempts with more items weigh
/// more than a per-attempt ratio average would give them.
pub fn list_weakness(results: &[&ScoredResult]) -> f64 {
    let counts: Vec<(u32, u32)> = results.iter().filter_map(|r| r.counts()).collect();
    if counts.is_empty() {
        return 0.0;
    }
    let n = counts.len() as f64;
    let mean_correct = counts.iter().map(|&(c, _)| c as f64).sum::<f64>() / n;
    let mean_total = counts.iter().map(|&(_, t)| t as f64).sum::<f64>() / n;
    if mean_total == 0.0 {
        return 0.0;
    }
    1.0 - mean_correct / mean_total
}

/// Blend of accuracy and speed band, clamped to [0, 1]; 0.0 without history.
pub fn reading_weakness(results: &[&ScoredResult]) -> f64 {
    let details: Vec<_> = results.iter().filter_map(|r| r.reading()).collect();
    if details.is_empty() {
        return 0.0;
    }
    let n = details.len() as f64;
    let mean_accuracy = details.iter().map(|d| d.token_overlap_accuracy).sum::<f64>() / n;
    let mean_wpm = details.iter().map(|d| d.words_per_minute).sum::<f64>() / n;

    let weakness = READING_ACCURACY_WEIGHT * (1.0 - mean_accuracy)
        + READING_SPEED_WEIGHT * wpm_band(mean_wpm);
    weakness.clamp(0.0, 1.0)
}

/// Speed weakness band: 1.0 below 80 WPM, 0.5 below 120, else 0.0.
pub fn wpm_band(wpm: f64) -> f64 {
    if wpm < SLOW_WPM {
        1.0
    } else if wpm < FLUENT_WPM {
        0.5
    } else {
        0.0
    }
}
