use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use counters::analytics::{history_query, streaks_query};
use counters::qb::{self, Cmp, SqlQb};
use counters::Interval;

/// SELECT * FROM "entries" WHERE "c0"=? AND "c1"=? ...
fn build_select(n: usize) -> qb::SelectQb {
    (0..n).fold(qb::select("entries"), |q, i| {
        q.where_(&format!("c{i}"), Cmp::Eq, i as i64)
    })
}

fn bench_select_build(c: &mut Criterion) {
    let mut group = c.benchmark_group("sql_builder/select_build");

    for n in [1, 5, 10, 50, 100] {
        let q = build_select(n);
        group.bench_with_input(BenchmarkId::from_parameter(n), &q, |b, q| {
            b.iter(|| black_box(q.build()));
        });
    }

    group.finish();
}

fn bench_insert_rows(c: &mut Criterion) {
    let mut group = c.benchmark_group("sql_builder/insert_rows");

    for n in [1, 10, 100, 500] {
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, &n| {
            b.iter(|| {
                let q = (0..n).fold(qb::insert("entries"), |q, i| {
                    q.values([("counter_id", 1_i64), ("created", 1_700_000_000 + i as i64)])
                });
                black_box(q.build());
            });
        });
    }

    group.finish();
}

fn bench_analytics(c: &mut Criterion) {
    let mut group = c.benchmark_group("sql_builder/analytics");

    group.bench_function("history", |b| {
        b.iter(|| black_box(history_query(1, Interval::Weekly, 3, 8).build()));
    });
    group.bench_function("streaks", |b| {
        b.iter(|| black_box(streaks_query(1, Interval::Daily, 2, Some(62)).build()));
    });

    group.finish();
}

criterion_group!(benches, bench_select_build, bench_insert_rows, bench_analytics);
criterion_main!(benches);
