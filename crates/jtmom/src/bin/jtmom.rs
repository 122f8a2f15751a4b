//! jtmom CLI binary.
//!
//! Runs momentum studies on a monthly stock panel stored as CSV.
//!
//! Usage: `jtmom run --panel msf.csv --preset jegadeesh-titman`
//! Example: `RUST_LOG=debug jtmom compare --panel msf.csv --benchmark ff10.csv --preset fama-french`

use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand, ValueEnum};
use jtmom::{
    formation::MarketValueFilter,
    holding::JoinStrategy,
    model::{
        MomentumStudy, PortfolioSummary, StudyConfig, StudyResult, Weighting, compare_benchmark,
        write_series_csv,
    },
    panel::{
        CleanConfig, CsvBenchmarkProvider, CsvPanelProvider, DuplicatePolicy, PanelCleaner,
        UniverseFilter, check_panel,
    },
    primitives::{Date, ExchangeCode, month_end, parse_date},
    traits::{BenchmarkProvider, PanelProvider},
};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "jtmom")]
#[command(about = "Momentum portfolio research engine", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Rank, hold and aggregate momentum portfolios
    Run {
        #[command(flatten)]
        study: StudyArgs,

        /// Write the monthly portfolio series to this CSV file
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Report month gaps, trailing return coverage and zero market values
    Check {
        #[command(flatten)]
        input: InputArgs,

        /// Trailing window length in records
        #[arg(long, default_value = "12")]
        lookback: usize,
    },

    /// Run a study and correlate its spread with a decile benchmark
    Compare {
        #[command(flatten)]
        study: StudyArgs,

        /// Benchmark CSV: YYYYMM then one column per decile, in percent
        #[arg(long)]
        benchmark: PathBuf,
    },
}

#[derive(Args)]
struct InputArgs {
    /// Monthly panel CSV
    #[arg(long)]
    panel: PathBuf,

    /// Keep share codes 10-11 and exchange codes -2 to 3 only
    #[arg(long)]
    universe: bool,

    /// Resolution of duplicate security-months
    #[arg(long, value_enum, default_value_t = Duplicates::First)]
    duplicates: Duplicates,
}

#[derive(Args)]
struct StudyArgs {
    #[command(flatten)]
    input: InputArgs,

    /// Starting configuration; individual flags override it
    #[arg(long, value_enum, default_value_t = Preset::JegadeeshTitman)]
    preset: Preset,

    /// Formation window j
    #[arg(long)]
    lookback: Option<usize>,

    /// Holding window k
    #[arg(long)]
    holding: Option<u32>,

    /// Number of portfolios
    #[arg(long)]
    portfolios: Option<u32>,

    /// Treat missing returns as zero when compounding
    #[arg(long)]
    fill_missing: Option<bool>,

    /// Skip the formation month
    #[arg(long)]
    skip: Option<bool>,

    /// Require a gap-free formation window
    #[arg(long)]
    no_gap: Option<bool>,

    /// Market-value filter
    #[arg(long, value_enum)]
    size: Option<SizeFilter>,

    /// Minimum price at formation
    #[arg(long)]
    min_price: Option<f64>,

    /// Eligible exchange codes, comma separated
    #[arg(long, value_delimiter = ',')]
    exchanges: Option<Vec<i64>>,

    /// Use all exchanges
    #[arg(long, conflicts_with = "exchanges")]
    all_exchanges: bool,

    /// Compute breakpoints from NYSE stocks only
    #[arg(long)]
    nyse_breakpoints: Option<bool>,

    /// Aggregation weighting
    #[arg(long, value_enum)]
    weighting: Option<WeightingArg>,

    /// Holding join strategy
    #[arg(long, value_enum, default_value_t = JoinArg::Chunked)]
    join: JoinArg,

    /// Panel rows per batch for the chunked join
    #[arg(long, default_value = "100000")]
    chunk_size: usize,

    /// First month of the sample (YYYY-MM-DD)
    #[arg(long, value_parser = parse_month)]
    start: Option<Date>,

    /// Last month of the sample (YYYY-MM-DD)
    #[arg(long, value_parser = parse_month)]
    end: Option<Date>,

    /// Use the full sample even when the preset restricts it
    #[arg(long, conflicts_with_all = ["start", "end"])]
    full_sample: bool,

    /// Newey-West lags
    #[arg(long)]
    nw_lag: Option<usize>,
}

#[derive(Clone, Copy, ValueEnum)]
enum Preset {
    JegadeeshTitman,
    FamaFrench,
}

#[derive(Clone, Copy, ValueEnum)]
enum SizeFilter {
    None,
    Positive,
    Nyse20,
}

#[derive(Clone, Copy, ValueEnum)]
enum WeightingArg {
    Ew,
    Vw,
}

#[derive(Clone, Copy, ValueEnum)]
enum JoinArg {
    Chunked,
    Query,
}

#[derive(Clone, Copy, ValueEnum)]
enum Duplicates {
    First,
    Last,
    Reject,
}

fn parse_month(raw: &str) -> Result<Date, String> {
    parse_date(raw).map(month_end).ok_or_else(|| format!("invalid date: {raw}"))
}

impl InputArgs {
    fn provider(&self) -> CsvPanelProvider {
        let provider = CsvPanelProvider::new(&self.panel);
        if self.universe { provider.with_universe(UniverseFilter::default()) } else { provider }
    }

    fn clean_config(&self) -> CleanConfig {
        let duplicates = match self.duplicates {
            Duplicates::First => DuplicatePolicy::KeepFirst,
            Duplicates::Last => DuplicatePolicy::KeepLast,
            Duplicates::Reject => DuplicatePolicy::Reject,
        };
        CleanConfig { duplicates }
    }
}

impl StudyArgs {
    fn config(&self) -> StudyConfig {
        let mut config = match self.preset {
            Preset::JegadeeshTitman => StudyConfig::jegadeesh_titman(),
            Preset::FamaFrench => StudyConfig::fama_french(),
        };
        config.clean = self.input.clean_config();

        let f = &mut config.formation;
        if let Some(j) = self.lookback {
            f.lookback_months = j;
        }
        if let Some(k) = self.holding {
            f.holding_months = k;
        }
        if let Some(n) = self.portfolios {
            f.n_portfolios = n;
        }
        if let Some(fill) = self.fill_missing {
            f.fill_missing_with_zero = fill;
        }
        if let Some(skip) = self.skip {
            f.skip_formation_month = skip;
        }
        if let Some(no_gap) = self.no_gap {
            f.require_no_gap = no_gap;
        }
        if let Some(size) = self.size {
            f.market_value_filter = match size {
                SizeFilter::None => MarketValueFilter::None,
                SizeFilter::Positive => MarketValueFilter::Positive,
                SizeFilter::Nyse20 => MarketValueFilter::small_cap_exclusion(),
            };
        }
        if self.min_price.is_some() {
            f.min_price = self.min_price;
        }
        if let Some(codes) = &self.exchanges {
            f.exchange_allowlist = Some(codes.iter().copied().map(ExchangeCode::new).collect());
        }
        if self.all_exchanges {
            f.exchange_allowlist = None;
        }
        if let Some(nyse) = self.nyse_breakpoints {
            f.use_reference_exchange_breakpoints = nyse;
        }

        if let Some(w) = self.weighting {
            config.weighting = match w {
                WeightingArg::Ew => Weighting::Equal,
                WeightingArg::Vw => Weighting::Value,
            };
        }
        config.join = match self.join {
            JoinArg::Chunked => JoinStrategy::Chunked { chunk_size: self.chunk_size },
            JoinArg::Query => JoinStrategy::QueryEngine,
        };
        if self.full_sample {
            config.start_date = None;
            config.end_date = None;
        }
        if self.start.is_some() {
            config.start_date = self.start;
        }
        if self.end.is_some() {
            config.end_date = self.end;
        }
        if let Some(lag) = self.nw_lag {
            config.nw_lag = lag;
        }
        config
    }

    fn run(&self) -> Result<StudyResult> {
        let config = self.config();
        info!(?config, "study configuration");
        let provider = self.input.provider();
        MomentumStudy::with_config(config)
            .run_provider(&provider)
            .with_context(|| format!("study failed on {}", self.input.panel.display()))
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run { study, output } => {
            let result = study.run()?;
            println!("{}", result.summary);
            if let Some(path) = output {
                write_series_csv(&result.series, &path)
                    .with_context(|| format!("writing {}", path.display()))?;
            }
        }
        Commands::Check { input, lookback } => {
            if lookback == 0 {
                bail!("lookback must be positive");
            }
            let raw = input.provider().fetch().context("reading panel")?;
            let panel = PanelCleaner::with_config(input.clean_config()).clean(&raw)?;
            let report = check_panel(&panel, lookback);
            println!("{}", report.summary);
        }
        Commands::Compare { study, benchmark } => {
            let result = study.run()?;
            let reference = CsvBenchmarkProvider::new(&benchmark)
                .fetch()
                .with_context(|| format!("reading benchmark {}", benchmark.display()))?;
            let comparison = compare_benchmark(&result.series, &reference);

            println!("{}\n", result.summary);
            println!("benchmark ({}):", benchmark.display());
            println!("{}\n", PortfolioSummary::from_series(&reference, study.config().nw_lag)?);
            match comparison.correlation {
                Some(rho) => println!("mom correlation: {rho:.3} over {} months", comparison.overlap),
                None => println!("mom correlation: undefined ({} shared months)", comparison.overlap),
            }
        }
    }

    Ok(())
}
