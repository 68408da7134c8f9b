use criterion::{Criterion, black_box, criterion_group, criterion_main};

use colnest::{
    builder::TreeBuilder,
    flatten::{FlattenOptions, ListStrategy},
    json::JsonConverter,
    node::Node,
};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;
use serde_json::{Value, json};

/// One order-like row: a few optional scalars and one list of line records.
fn random_row(rng: &mut impl Rng) -> Value {
    let lines: Vec<Value> = (0..rng.random_range(0..8))
        .map(|i| {
            json!({
                "sku": format!("sku-{}", rng.random_range(0..100)),
                "quantity": rng.random_range(1..10),
                "price": if rng.random_bool(0.1) { Value::Null } else { json!(rng.random::<f64>()) },
                "position": i,
            })
        })
        .collect();

    let mut row = json!({
        "id": rng.random::<u32>(),
        "customer": {"name": "someone", "tier": rng.random_range(0..3)},
        "lines": lines,
    });
    if rng.random_bool(0.3) {
        row["note"] = json!("late field");
    }
    if rng.random_bool(0.05) {
        row["lines"] = Value::Null;
    }
    row
}

fn random_rows(count: usize) -> Vec<Value> {
    let mut rng = ChaCha20Rng::seed_from_u64(0x42);
    (0..count).map(|_| random_row(&mut rng)).collect()
}

fn build_tree(rows: &[Value]) -> Node {
    let mut builder = TreeBuilder::new(JsonConverter::default());
    for row in rows {
        builder.push(row).expect("rows share one schema");
    }
    builder.finish()
}

fn bench_build(c: &mut Criterion) {
    let rows = random_rows(2_000);
    c.bench_function("build 2k rows", |b| {
        b.iter(|| black_box(build_tree(black_box(&rows))))
    });
}

fn bench_flatten(c: &mut Criterion) {
    let root = build_tree(&random_rows(2_000));
    let all = FlattenOptions::default();
    let available = FlattenOptions::default()
        .with_list_strategy(ListStrategy::Available)
        .with_exclude(["customer.name"]);

    c.bench_function("flatten all", |b| {
        b.iter(|| black_box(root.flatten(black_box(&all)).expect("flatten")))
    });
    c.bench_function("flatten available", |b| {
        b.iter(|| black_box(root.flatten(black_box(&available)).expect("flatten")))
    });
}

criterion_group!(benches, bench_build, bench_flatten);
criterion_main!(benches);
