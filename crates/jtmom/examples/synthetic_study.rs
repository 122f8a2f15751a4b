//! Example: Momentum Study on a Synthetic Panel
//!
//! This example runs the full pipeline on a simulated monthly panel in which
//! each stock carries a slowly drifting expected return, so past winners tend
//! to keep winning:
//! 1. Simulate a raw security-month frame
//! 2. Run the Jegadeesh-Titman 6/6 decile study with both join strategies
//! 3. Print the Newey-West summary and the formation diagnostics
//!
//! Run with `RUST_LOG=debug` to see per-stage logging.

use jtmom::{
    holding::JoinStrategy,
    model::{MomentumStudy, StudyConfig, Weighting},
    panel::{PanelCleaner, check_panel},
    primitives::{Date, shift_month_end},
};
use polars::prelude::*;
use rand::{Rng, SeedableRng, rngs::StdRng};
use rand_distr::{Distribution, Normal};
use tracing_subscriber::EnvFilter;

const N_SECURITIES: i64 = 400;
const N_MONTHS: u32 = 240;

/// Persistence of each stock's expected return.
const DRIFT_PERSISTENCE: f64 = 0.95;

fn simulate_panel(seed: u64) -> Result<DataFrame, Box<dyn std::error::Error>> {
    let mut rng = StdRng::seed_from_u64(seed);
    let shock = Normal::new(0.0, 0.09)?;
    let drift_shock = Normal::new(0.0, 0.003)?;
    let start = Date::from_ymd_opt(1970, 1, 31).ok_or("bad start date")?;

    let mut ids = Vec::new();
    let mut dates = Vec::new();
    let mut rets: Vec<Option<f64>> = Vec::new();
    let mut prices = Vec::new();
    let mut shares = Vec::new();
    let mut exchanges = Vec::new();

    for id in 1..=N_SECURITIES {
        let exchange: i64 = rng.gen_range(1..=3);
        let mut price: f64 = rng.gen_range(5.0..80.0);
        let n_shares: f64 = rng.gen_range(1_000.0..50_000.0);
        let mut drift = 0.01;
        let listed = rng.gen_range(0..N_MONTHS / 3);

        for m in listed..N_MONTHS {
            drift = 0.01 + DRIFT_PERSISTENCE * (drift - 0.01) + drift_shock.sample(&mut rng);
            let r: f64 = (drift + shock.sample(&mut rng)).max(-0.95);
            price *= 1.0 + r;

            ids.push(id);
            dates.push(shift_month_end(start, m).format("%Y-%m-%d").to_string());
            // A few missing returns, as in real data.
            rets.push((!rng.gen_bool(0.01)).then_some(r));
            // Negative prices mark bid/ask midpoints.
            prices.push(if rng.gen_bool(0.05) { -price } else { price });
            shares.push(n_shares);
            exchanges.push(exchange);
        }
    }

    Ok(df! {
        "security_id" => ids,
        "date" => dates,
        "ret" => rets,
        "price" => prices,
        "shares_outstanding" => shares,
        "exchange_code" => exchanges,
    }?)
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()))
        .init();

    println!("=== Momentum Study on a Synthetic Panel ===\n");

    let raw = simulate_panel(1993)?;
    println!("Simulated {} security-months for {N_SECURITIES} securities\n", raw.height());

    // =========================================================================
    // DATA CHECKS
    // =========================================================================

    let panel = PanelCleaner::new().clean(&raw)?;
    let report = check_panel(&panel, 6);
    println!("{}\n", report.summary);

    // =========================================================================
    // EQUAL-WEIGHTED 6/6 DECILES
    // =========================================================================

    let config = StudyConfig { start_date: None, end_date: None, ..StudyConfig::jegadeesh_titman() };
    let result = MomentumStudy::with_config(config.clone()).run(&panel)?;

    let diagnostics = result.formations.diagnostics();
    println!(
        "Formations: {} records, {} holding rows, {} months\n",
        result.formations.len(),
        result.holdings.len(),
        result.series.len()
    );
    println!("Decile membership (min / mean / max):");
    for m in &diagnostics.per_rank {
        println!("  {:>2}: {:>4} / {:>6.1} / {:>4}", m.rank, m.min, m.mean, m.max);
    }
    println!();
    println!("Equal-weighted:\n{}\n", result.summary);

    // =========================================================================
    // VALUE-WEIGHTED, QUERY-ENGINE JOIN
    // =========================================================================

    let vw = StudyConfig { weighting: Weighting::Value, join: JoinStrategy::QueryEngine, ..config };
    let vw_result = MomentumStudy::with_config(vw).run(&panel)?;
    println!("Value-weighted:\n{}\n", vw_result.summary);

    Ok(())
}
