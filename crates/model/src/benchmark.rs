//! Comparison against a published momentum benchmark.

use std::collections::BTreeMap;

use jtmom_math::pearson;
use jtmom_primitives::{Date, PortfolioSeries};
use serde::{Deserialize, Serialize};
use tracing::info;

/// Agreement between a study's `mom` and a benchmark's `mom`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkComparison {
    /// Months present in both series.
    pub overlap: usize,
    /// Pearson correlation over months where both spreads are present.
    pub correlation: Option<f64>,
    /// First and last shared month.
    pub period: Option<(Date, Date)>,
}

/// Align two series on calendar month and correlate their spreads.
#[must_use]
pub fn compare_benchmark(study: &PortfolioSeries, benchmark: &PortfolioSeries) -> BenchmarkComparison {
    let reference: BTreeMap<Date, Option<f64>> =
        benchmark.rows().iter().map(|r| (r.date, r.mom)).collect();

    let (mut ours, mut theirs, mut dates) = (Vec::new(), Vec::new(), Vec::new());
    for row in study.rows() {
        if let Some(mom) = reference.get(&row.date) {
            ours.push(row.mom);
            theirs.push(*mom);
            dates.push(row.date);
        }
    }

    let comparison = BenchmarkComparison {
        overlap: dates.len(),
        correlation: pearson(&ours, &theirs),
        period: dates.first().copied().zip(dates.last().copied()),
    };
    info!(overlap = comparison.overlap, correlation = ?comparison.correlation, "benchmark comparison");
    comparison
}
