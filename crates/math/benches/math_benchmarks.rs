//! Benchmarks for jtmom-math operations.
#![allow(missing_docs)]

use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use jtmom_math::{
    Breakpoints, breakpoint_exprs, newey_west_mean_test, quantile_xsection,
    trailing_compound_return,
};
use polars::prelude::*;
use rand::Rng;

fn random_returns(n: usize) -> Vec<f64> {
    let mut rng = rand::thread_rng();
    (0..n).map(|_| rng.r#gen::<f64>() * 0.2 - 0.1).collect()
}

/// `n_securities` by `n_months` long frame sorted by security then month.
fn random_panel(n_securities: usize, n_months: usize) -> DataFrame {
    let n = n_securities * n_months;
    let ids: Vec<i64> = (0..n).map(|i| (i / n_months) as i64).collect();
    let months: Vec<i32> = (0..n).map(|i| (i % n_months) as i32).collect();
    df! {
        "security_id" => ids,
        "month" => months,
        "ret" => random_returns(n),
    }
    .unwrap()
}

fn bench_quantile_xsection(c: &mut Criterion) {
    let mut group = c.benchmark_group("quantile_xsection");

    for n_securities in [100, 1000, 5000] {
        let df = random_panel(n_securities, 60);
        group.throughput(Throughput::Elements(df.height() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(n_securities), &df, |b, df| {
            b.iter(|| {
                df.clone()
                    .lazy()
                    .select([quantile_xsection(col("ret"), "month", black_box(0.2))])
                    .collect()
                    .unwrap()
            });
        });
    }

    group.finish();
}

fn bench_breakpoints(c: &mut Criterion) {
    let mut group = c.benchmark_group("decile_breakpoints");

    for n_securities in [100, 1000, 5000] {
        let df = random_panel(n_securities, 60);
        group.throughput(Throughput::Elements(df.height() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(n_securities), &df, |b, df| {
            b.iter(|| {
                df.clone()
                    .lazy()
                    .group_by([col("month")])
                    .agg(breakpoint_exprs("ret", 10))
                    .collect()
                    .unwrap()
            });
        });
    }

    group.finish();
}

fn bench_bucket(c: &mut Criterion) {
    let mut group = c.benchmark_group("bucket");

    for size in [1000, 10000, 100000] {
        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, &size| {
            let data = random_returns(size);
            let cuts = (1..10).map(|i| -0.1 + 0.02 * f64::from(i)).collect();
            let bp = Breakpoints::new(cuts).unwrap();
            b.iter(|| data.iter().map(|v| bp.bucket(black_box(*v))).sum::<u32>());
        });
    }

    group.finish();
}

fn bench_compound(c: &mut Criterion) {
    let mut group = c.benchmark_group("trailing_compound_return");

    for n_securities in [100, 1000, 5000] {
        let df = random_panel(n_securities, 120);
        group.throughput(Throughput::Elements(df.height() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(n_securities), &df, |b, df| {
            b.iter(|| {
                df.clone()
                    .lazy()
                    .select([trailing_compound_return("ret", "security_id", 11, 1, true)])
                    .collect()
                    .unwrap()
            });
        });
    }

    group.finish();
}

fn bench_newey_west(c: &mut Criterion) {
    let mut group = c.benchmark_group("newey_west_mean_test");

    for size in [120, 600, 1200] {
        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, &size| {
            let data = random_returns(size);
            b.iter(|| newey_west_mean_test(black_box(&data), 3).unwrap());
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_quantile_xsection,
    bench_breakpoints,
    bench_bucket,
    bench_compound,
    bench_newey_west
);
criterion_main!(benches);
