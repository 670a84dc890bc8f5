/// Emissions computation throughput
///
/// Measures `compute` over batches of mixed valid, invalid and unknown-material
/// records, plus the grouping pass that follows it.
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use huella::engine::EmissionsEngine;
use serde_json::{json, Value};

fn batch(size: usize) -> Vec<Value> {
    const MATERIALS: [(&str, &str); 5] = [
        ("concrete", "high_performance"),
        ("steel", "recycled"),
        ("glass", "low_e"),
        ("insulation", "aerogel"),
        ("unobtainium", "x"),
    ];
    (0..size)
        .map(|i| {
            if i % 17 == 0 {
                return json!({"component": "broken", "material": "steel"});
            }
            let (material, material_type) = MATERIALS[i % MATERIALS.len()];
            json!({
                "component": format!("level_{}", i % 40),
                "material": material,
                "material_type": material_type,
                "density": 2.4 + (i % 7) as f64,
                "volume": 10.0 + (i % 13) as f64,
                "quantity": 1 + i % 3,
            })
        })
        .collect()
}

fn bench_compute(c: &mut Criterion) {
    let engine = EmissionsEngine::with_builtin_factors().expect("built-in factors");
    let mut group = c.benchmark_group("compute");

    for size in [100, 1_000, 10_000] {
        let records = batch(size);
        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &records, |b, records| {
            b.iter(|| engine.compute(black_box(records)))
        });
    }
    group.finish();
}

fn bench_group_by(c: &mut Criterion) {
    let engine = EmissionsEngine::with_builtin_factors().expect("built-in factors");
    let computation = engine.compute(&batch(10_000));

    c.bench_function("group_by_component_10k", |b| {
        b.iter(|| computation.group_by(black_box("component")))
    });
}

criterion_group!(benches, bench_compute, bench_group_by);
criterion_main!(benches);
