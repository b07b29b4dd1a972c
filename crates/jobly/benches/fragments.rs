use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use jobly::{COMPANY_FIELDS, FieldMap, JobFilter, sql_for_partial_update};
use serde_json::{Map, Value, json};

/// An update body with `n` keys: `{"field0": 0, "field1": 1, ...}`.
fn update_body(n: usize) -> Value {
    let map: Map<String, Value> = (0..n).map(|i| (format!("field{i}"), json!(i))).collect();
    Value::Object(map)
}

fn bench_partial_update(c: &mut Criterion) {
    let mut group = c.benchmark_group("fragments/partial_update");

    for n in [1, 4, 16, 64] {
        let body = update_body(n);
        group.bench_with_input(BenchmarkId::from_parameter(n), &body, |b, body| {
            b.iter(|| black_box(sql_for_partial_update(body, &FieldMap::EMPTY)));
        });
    }

    group.bench_function("company_mapped", |b| {
        let body = json!({"name": "New", "numEmployees": 10, "logoUrl": "http://x.img"});
        b.iter(|| black_box(sql_for_partial_update(&body, &COMPANY_FIELDS)));
    });

    group.finish();
}

fn bench_job_filter(c: &mut Criterion) {
    let mut group = c.benchmark_group("fragments/job_filter");

    let cases = [
        ("all_keys", json!({"title": "eng", "minSalary": 90000, "hasEquity": true})),
        ("equity_dropped", json!({"minSalary": 90000, "hasEquity": false})),
    ];
    for (name, body) in cases {
        group.bench_with_input(BenchmarkId::new("parse_and_render", name), &body, |b, body| {
            b.iter(|| {
                let filter = JobFilter::from_json(body).unwrap();
                black_box(filter.where_clause().unwrap());
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_partial_update, bench_job_filter);
criterion_main!(benches);
