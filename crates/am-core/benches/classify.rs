use criterion::{black_box, criterion_group, criterion_main, Criterion};

use am_core::html::{HtmlDocument, RecordingTarget};
use am_core::{FilterEngine, FilterSettings, RuleTable};

const FIXTURE: &str = include_str!("../testdata/search_results.html");

fn bench_filter_pass(c: &mut Criterion) {
    let engine = FilterEngine::new(RuleTable::default().compile().expect("default rules"));
    let doc = HtmlDocument::parse(FIXTURE);
    let settings = FilterSettings {
        enabled: true,
        hide_sponsored: true,
        min_rating: 4.3,
        min_reviews: 5000,
    };

    c.bench_function("plan_all_predicates", |b| {
        b.iter(|| engine.plan(&&doc, black_box(&settings)))
    });

    c.bench_function("run_all_predicates", |b| {
        b.iter(|| {
            let mut target = RecordingTarget::new();
            engine.run(&&doc, &mut target, black_box(&settings))
        })
    });
}

criterion_group!(benches, bench_filter_pass);
criterion_main!(benches);
