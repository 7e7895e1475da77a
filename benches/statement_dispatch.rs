//! Criterion benchmark measuring what a statement object adds on top of its
//! session: parameter conversion, the tracing span around each call and row
//! mapping into the declared result type. The scripted session answers from
//! memory so only the facade is measured.

use std::hint::black_box;
use std::ops::ControlFlow;

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use serde::{Deserialize, Serialize};
use sql_mapper::prelude::*;
use sql_mapper::test_utils::ScriptedSession;
use tokio::runtime::Runtime;

#[derive(Debug, Serialize, Deserialize)]
#[allow(dead_code)]
struct BenchRow {
    id: i64,
    name: String,
    score: f64,
    active: bool,
}

sql_mapper::mapped_record!(BenchRow);

fn rows(count: i64) -> Vec<MappedRow> {
    (0..count)
        .map(|id| {
            MappedRow::from_pairs([
                ("id", RowValues::Int(id)),
                ("name", RowValues::Text(format!("name_{id}"))),
                ("score", RowValues::Float(id as f64 * 0.5)),
                ("active", RowValues::Bool(id % 2 == 0)),
            ])
        })
        .collect()
}

fn bench_dispatch(c: &mut Criterion) {
    let rt = Runtime::new().expect("tokio runtime");
    let mut group = c.benchmark_group("statement_dispatch");

    for count in [1_i64, 100, 1_000] {
        let session = ScriptedSession::new()
            .with_rows("bench.list", rows(count))
            .with_rows("bench.map", rows(count));
        let list = SelectListBy::<i64, BenchRow>::new(
            "bench.list",
            "SELECT id, name, score, active FROM test WHERE id >= #{id}",
        );
        let map = SelectMap::<i64, BenchRow>::new(
            "bench.map",
            "SELECT id, name, score, active FROM test",
            "id",
        );
        group.throughput(Throughput::Elements(count as u64));

        group.bench_with_input(BenchmarkId::new("list", count), &count, |b, _| {
            b.to_async(&rt).iter(|| async {
                let out = list.apply(&session, &0).await.expect("list");
                black_box(out);
            });
        });

        group.bench_with_input(BenchmarkId::new("map", count), &count, |b, _| {
            b.to_async(&rt).iter(|| async {
                let out = map.apply(&session).await.expect("map");
                black_box(out);
            });
        });

        group.bench_with_input(BenchmarkId::new("handle", count), &count, |b, _| {
            b.to_async(&rt).iter(|| async {
                let mut total = 0_i64;
                list.handle(&session, &0, |row| {
                    total += row.id;
                    Ok(ControlFlow::Continue(()))
                })
                .await
                .expect("handle");
                black_box(total);
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_dispatch);
criterion_main!(benches);
