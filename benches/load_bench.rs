use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use core_blueprints::blueprints::{resolve_block, AttributeValue, BlockTemplate, ComponentSpec, Shape};
use core_blueprints::{load_from_str, LoaderConfig};

const SAMPLE_CORE: &str = include_str!("../data/sample_core.toml");

/// One block whose components form a single reference chain of `depth` hops
fn chain_template(depth: usize) -> BlockTemplate {
    let components = (0..=depth)
        .rev()
        .map(|i| {
            let spec = ComponentSpec::new(format!("c{}", i), Shape::Circle, "HT9", 25.0, 450.0);
            if i == 0 {
                spec.with_dimension("od", AttributeValue::Literal(1.0))
            } else {
                spec.with_dimension("od", AttributeValue::reference(format!("c{}", i - 1), "od"))
            }
        })
        .collect();
    BlockTemplate::new("chain", components).expect("valid chain template")
}

fn load_benchmarks(c: &mut Criterion) {
    let config = LoaderConfig::default();
    c.bench_function("load_sample_core", |b| {
        b.iter(|| black_box(load_from_str(black_box(SAMPLE_CORE), &config).expect("sample loads")))
    });

    let mut group = c.benchmark_group("resolve_chain");
    for depth in [8usize, 64, 512] {
        let template = chain_template(depth);
        group.bench_with_input(BenchmarkId::from_parameter(depth), &template, |b, t| {
            b.iter(|| black_box(resolve_block(t).expect("chain resolves")))
        });
    }
    group.finish();
}

criterion_group!(benches, load_benchmarks);
criterion_main!(benches);
