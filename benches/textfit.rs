//! Label fitting benchmarks.
//!
//! Run with: cargo bench --bench textfit

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use wordbubbles::config::FontRange;
use wordbubbles::textfit::{arrangements, TextFitter, TextMetrics};

/// Every glyph is half as wide as the font is tall.
struct HalfEm;

impl TextMetrics for HalfEm {
    fn line_width(&self, size: f32, line: &str) -> f32 {
        line.chars().count() as f32 * size * 0.5
    }
}

const LABELS: [&str; 4] = [
    "Oslo",
    "New York City",
    "Saint Pierre and Miquelon",
    "The United Kingdom of Great Britain and Northern Ireland",
];

fn bench_arrangements(c: &mut Criterion) {
    let mut group = c.benchmark_group("arrangements");
    for label in LABELS {
        let words: Vec<&str> = label.split_whitespace().collect();
        group.bench_with_input(BenchmarkId::from_parameter(words.len()), &words, |b, words| {
            b.iter(|| arrangements(black_box(words)))
        });
    }
    group.finish();
}

fn bench_fit(c: &mut Criterion) {
    let mut group = c.benchmark_group("fit");
    for label in LABELS {
        let words = label.split_whitespace().count();

        // Cold: every candidate is measured.
        group.bench_with_input(BenchmarkId::new("cold", words), &label, |b, label| {
            b.iter(|| {
                let mut fitter = TextFitter::new(label);
                fitter.fit(black_box(120.0), FontRange::default(), &HalfEm)
            })
        });

        // Warm: answers come from the extent cache.
        let mut fitter = TextFitter::new(label);
        fitter.fit(120.0, FontRange::default(), &HalfEm);
        group.bench_with_input(BenchmarkId::new("warm", words), &120.0_f32, |b, &budget| {
            b.iter(|| fitter.fit(black_box(budget), FontRange::default(), &HalfEm))
        });
    }
    group.finish();
}

criterion_group!(benches, bench_arrangements, bench_fit);
criterion_main!(benches);
