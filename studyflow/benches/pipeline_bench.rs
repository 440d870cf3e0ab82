//! Benchmarks for pipeline execution.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use studyflow::models::QaSeverity;
use studyflow::pipeline::PipelineOptions;
use studyflow::testing::{
    qa_response_with, sample_request, MockQaExecutor, PipelineFixture, SAMPLE_DRAFT,
};

fn pipeline_benchmark(c: &mut Criterion) {
    let runtime = tokio::runtime::Runtime::new().expect("tokio runtime");

    let fixture = PipelineFixture::new();
    let orchestrator = fixture.orchestrator().expect("orchestrator");
    let full = sample_request("bench-full");
    c.bench_function("full_run", |b| {
        b.to_async(&runtime)
            .iter(|| async { black_box(orchestrator.run(&full).await) });
    });

    let draft_only = sample_request("bench-draft").with_options(PipelineOptions::draft_only());
    c.bench_function("draft_only_run", |b| {
        b.to_async(&runtime)
            .iter(|| async { black_box(orchestrator.run(&draft_only).await) });
    });

    let fixture = PipelineFixture::new().with_qa(MockQaExecutor::returning(qa_response_with(
        SAMPLE_DRAFT,
        Some("FINDINGS: Clear lungs."),
        &[QaSeverity::Major, QaSeverity::Critical],
    )));
    let orchestrator = fixture.orchestrator().expect("orchestrator");
    let reviewed = sample_request("bench-learning").with_radiologist_id("rad-42");
    c.bench_function("run_with_learning_event", |b| {
        b.to_async(&runtime)
            .iter(|| async { black_box(orchestrator.run(&reviewed).await) });
    });
}

criterion_group!(benches, pipeline_benchmark);
criterion_main!(benches);
