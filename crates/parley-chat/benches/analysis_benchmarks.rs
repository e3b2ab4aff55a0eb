//! Benchmarks for the synchronous analysis path.
//!
//! Analysis runs inline on every submission before the reply request, so it
//! has to stay well under a millisecond even with a long conversation.

use std::time::Duration;

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use parley_chat::{AnalysisResult, QueryAnalyzer, TopicTag, Turn};

/// A conversation of `pairs` user/assistant exchanges.
fn generate_history(pairs: usize) -> Vec<Turn> {
    let mut turns = Vec::with_capacity(pairs * 2);
    for i in 0..pairs {
        let question = format!("Question number {} about the football league table", i);
        turns.push(Turn::user(
            question.clone(),
            AnalysisResult {
                expanded_query: question,
                topic: TopicTag::new("Sports", "Football"),
            },
        ));
        turns.push(Turn::assistant(format!(
            "Answer {}: the league leaders extended their run with a late goal \
             in the second half, and the coach praised the young squad afterwards.",
            i
        )));
    }
    turns
}

fn bench_analyze(c: &mut Criterion) {
    let analyzer = QueryAnalyzer::default();
    let history = generate_history(200);

    let mut group = c.benchmark_group("analyze");
    group.measurement_time(Duration::from_secs(5));

    group.bench_function("neutral_query", |b| {
        b.iter(|| analyzer.analyze(black_box("Tell me about the latest Marvel movie"), &history))
    });

    group.bench_function("demonstrative_query", |b| {
        b.iter(|| analyzer.analyze(black_box("what about that"), &history))
    });

    group.bench_function("personal_query", |b| {
        b.iter(|| analyzer.analyze(black_box("What did you think of him and her?"), &history))
    });

    group.bench_function("fallback_topic", |b| {
        b.iter(|| analyzer.analyze(black_box("good morning, how are you today?"), &history))
    });

    group.finish();
}

criterion_group!(benches, bench_analyze);
criterion_main!(benches);
