//! # Moody Performance Benchmarks
//!
//! Benchmarks for the offline hot paths: sentiment scoring, mood
//! classification and track deduplication.
//!
//! ```bash
//! cargo bench
//! cargo bench sentiment
//! ```

use criterion::{criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion};
use moody::mood::{MoodClassifier, MoodTable};
use moody::sentiment::{VaderScorer, SentimentScorer};
use moody::track::{dedup_by_uri, Track};
use std::hint::black_box;

const SAMPLES: &[&str] = &[
    "I feel so depressed and lonely",
    "nothing special, just an average day",
    "not great, but honestly not terrible either",
    "BEST DAY EVER!!! we won the finals and I am so incredibly happy",
    "meh",
];

fn create_tracks(count: usize, distinct: usize) -> Vec<Track> {
    (0..count)
        .map(|i| {
            let id = i % distinct.max(1);
            Track {
                name: format!("Song {id}"),
                artist: format!("Artist {}", id % 17),
                url: format!("https://open.spotify.com/track/{id}"),
                uri: format!("spotify:track:{id}"),
            }
        })
        .collect()
}

fn benchmark_sentiment(c: &mut Criterion) {
    let mut group = c.benchmark_group("sentiment");
    let scorer = VaderScorer;

    for (i, text) in SAMPLES.iter().enumerate() {
        group.bench_with_input(BenchmarkId::new("score", i), text, |b, text| {
            b.iter(|| scorer.score(black_box(text)))
        });
    }

    let long_text = SAMPLES.join(". ").repeat(20);
    group.bench_function("score_long_text", |b| b.iter(|| scorer.score(black_box(&long_text))));

    group.finish();
}

fn benchmark_classification(c: &mut Criterion) {
    let mut group = c.benchmark_group("classification");
    let classifier = MoodClassifier::new(MoodTable::default_table(), VaderScorer);

    group.bench_function("keyword_hit", |b| {
        b.iter(|| classifier.classify(black_box("what an awful, rough day")))
    });
    group.bench_function("sentiment_fallback", |b| {
        b.iter(|| classifier.classify(black_box("nothing special, just an average day")))
    });

    group.finish();
}

fn benchmark_dedup(c: &mut Criterion) {
    let mut group = c.benchmark_group("dedup");

    for size in [15, 100, 1000] {
        let tracks = create_tracks(size, size / 2);
        group.bench_with_input(BenchmarkId::new("dedup_by_uri", size), &tracks, |b, tracks| {
            b.iter_batched(|| tracks.clone(), |t| dedup_by_uri(black_box(t)), BatchSize::SmallInput)
        });
    }

    group.finish();
}

criterion_group!(benches, benchmark_sentiment, benchmark_classification, benchmark_dedup);
criterion_main!(benches);
