use chrono::{Duration, Utc};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use uuid::Uuid;

use ldscreen_core::aggregate::area_scores;
use ldscreen_core::model::Domain;
use ldscreen_core::recommend::derive_recommendations;
use ldscreen_core::results::{Outcome, ReadingDetail, ScoredResult};

fn make_history(n: usize) -> Vec<ScoredResult> {
    let start = Utc::now();
    (0..n)
        .map(|i| {
            let domain = Domain::ALL[i % Domain::ALL.len()];
            let outcome = match domain {
                Domain::Reading => Outcome::Reading(ReadingDetail {
                    reference_text: "the cat sat on the mat".into(),
                    transcript: "the cat sat on a mat".into(),
                    words_per_minute: 60.0 + (i % 90) as f64,
                    token_overlap_accuracy: 0.83,
                }),
                Domain::Memory => Outcome::Memory {
                    correct_count: (i % 6) as u32,
                    total_count: 5,
                    target_sequence: vec![1, 2, 3, 4, 5],
                    recalled_sequence: vec![1, 2, 3],
                },
                _ => Outcome::Items {
                    correct_count: (i % 11) as u32,
                    total_count: 10,
                    details: vec![],
                },
            };
            ScoredResult {
                id: Uuid::new_v4(),
                attempt_id: Uuid::new_v4(),
                user_id: "bench".into(),
                domain,
                started_at: start + Duration::seconds(i as i64),
                ended_at: start + Duration::seconds(i as i64 + 60),
                duration_seconds: 60,
                outcome,
            }
        })
        .collect()
}

fn bench_area_scores(c: &mut Criterion) {
    let mut group = c.benchmark_group("area_scores");

    for n in [10usize, 100, 1000] {
        let history = make_history(n);
        group.bench_with_input(BenchmarkId::from_parameter(n), &history, |b, h| {
            b.iter(|| area_scores(black_box(h)))
        });
    }

    group.finish();
}

fn bench_recommendations(c: &mut Criterion) {
    let scores = area_scores(&make_history(100));
    let now = Utc::now();

    c.bench_function("derive_recommendations", |b| {
        b.iter(|| derive_recommendations("bench", black_box(&scores), now))
    });
}

criterion_group!(benches, bench_area_scores, bench_recommendations);
criterion_main!(benches);
