//! CoinLens CLI — analysis, backtesting, correlation, simulation and store commands.
//!
//! Commands:
//! - `analyze` — trend, forecast and decision for one or more assets
//! - `backtest` — replay a rule-based strategy over an asset's history
//! - `correlate` — correlation matrix, pair advice and clusters
//! - `compare` — one metric across assets
//! - `sentiment` — rolling sentiment score and descriptors
//! - `simulate` — Monte Carlo market series, stored and summarised
//! - `import` / `list` / `delete` — manage stored histories
//! - `export` — analysis records as CSV or JSON
//! - `refresh` — one live snapshot pass with anomaly and alert checks
//! - `alert` — manage persisted alert rules

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use chrono::NaiveDateTime;
use clap::{Parser, Subcommand, ValueEnum};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use coinlens_core::analysis::{detect_anomalies, AlertCondition, AlertKind};
use coinlens_core::backtest::Strategy;
use coinlens_core::data::circuit_breaker::CircuitBreaker;
use coinlens_core::data::yahoo::YahooProvider;
use coinlens_core::simulation::SimulationParams;
use coinlens_runner::{
    analyze_batch, backtest_asset, compare_assets, correlate_assets, refresh_snapshots,
    run_simulation, sentiment_for_asset, write_export, AlertBook, AppConfig, AssetReport,
    AssetStore, CompareMetric, ExportFormat, InMemorySnapshotStore, RefreshOptions, SnapshotStore,
};

const ALERTS_FILE: &str = "alerts.json";

#[derive(Parser)]
#[command(
    name = "coinlens",
    about = "CoinLens CLI — crypto price analysis and decision support"
)]
struct Cli {
    /// Path to a TOML config file. Defaults apply when the file is missing.
    #[arg(long, global = true, default_value = "coinlens.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyse assets (all configured assets when none are given).
    Analyze {
        assets: Vec<String>,

        /// Print full reports as JSON.
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Backtest a strategy on one asset.
    Backtest {
        asset: String,

        /// rsi_macd, bollinger or golden_cross. Defaults to the config value.
        #[arg(long)]
        strategy: Option<Strategy>,

        /// Starting capital. Defaults to the config value.
        #[arg(long)]
        capital: Option<f64>,
    },
    /// Correlate asset returns and suggest diversification pairs.
    Correlate { assets: Vec<String> },
    /// Compare one metric across assets.
    Compare {
        assets: Vec<String>,

        /// price, change, rsi or macd.
        #[arg(long, default_value = "price")]
        metric: CompareMetric,
    },
    /// Rolling sentiment for one asset.
    Sentiment { asset: String },
    /// Simulate a market and store it under a name.
    Simulate {
        #[arg(long, default_value = "simulation")]
        name: String,

        #[arg(long)]
        initial: Option<f64>,

        #[arg(long)]
        days: Option<usize>,

        /// Daily volatility.
        #[arg(long)]
        volatility: Option<f64>,

        /// Daily drift.
        #[arg(long)]
        drift: Option<f64>,

        #[arg(long, default_value_t = 42)]
        seed: u64,
    },
    /// Normalise a CSV export and store it as an asset's history.
    Import {
        file: PathBuf,

        /// Asset name. Defaults to the file stem.
        #[arg(long)]
        name: Option<String>,
    },
    /// List stored assets.
    List,
    /// Delete an asset's stored history.
    Delete { asset: String },
    /// Export analysis records to the output directory.
    Export {
        assets: Vec<String>,

        /// csv or json.
        #[arg(long, default_value = "csv")]
        format: ExportFormat,

        /// File name without extension.
        #[arg(long, default_value = "analysis")]
        name: String,
    },
    /// Fetch live prices once, then report anomalies and triggered alerts.
    Refresh {
        assets: Vec<String>,

        /// Also store fetched history as `<ASSET>_online.csv`.
        #[arg(long, default_value_t = false)]
        save: bool,
    },
    /// Manage alert rules.
    Alert {
        #[command(subcommand)]
        action: AlertAction,
    },
}

#[derive(Subcommand)]
enum AlertAction {
    /// Add a rule.
    Add {
        #[arg(value_enum)]
        kind: AlertKindArg,

        /// Asset name, or "all".
        #[arg(long, default_value = "all")]
        asset: String,

        /// Threshold for price and change rules.
        #[arg(long)]
        value: Option<f64>,

        #[arg(long, value_enum)]
        condition: Option<AlertConditionArg>,
    },
    /// List rules.
    List,
    /// Remove a rule by id.
    Remove { id: u32 },
    /// Re-enable a rule.
    Enable { id: u32 },
    /// Disable a rule without removing it.
    Disable { id: u32 },
}

#[derive(Clone, Copy, ValueEnum)]
enum AlertKindArg {
    Pump,
    Dump,
    Volatility,
    Rsi,
    Price,
    Change,
}

impl From<AlertKindArg> for AlertKind {
    fn from(arg: AlertKindArg) -> Self {
        match arg {
            AlertKindArg::Pump => AlertKind::Pump,
            AlertKindArg::Dump => AlertKind::Dump,
            AlertKindArg::Volatility => AlertKind::Volatility,
            AlertKindArg::Rsi => AlertKind::Rsi,
            AlertKindArg::Price => AlertKind::Price,
            AlertKindArg::Change => AlertKind::Change,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum AlertConditionArg {
    Above,
    Below,
    Increase,
    Decrease,
}

impl From<AlertConditionArg> for AlertCondition {
    fn from(arg: AlertConditionArg) -> Self {
        match arg {
            AlertConditionArg::Above => AlertCondition::Above,
            AlertConditionArg::Below => AlertCondition::Below,
            AlertConditionArg::Increase => AlertCondition::Increase,
            AlertConditionArg::Decrease => AlertCondition::Decrease,
        }
    }
}

fn main() -> Result<()> {
    init_logging();
    let cli = Cli::parse();

    let config = AppConfig::from_file(&cli.config)
        .with_context(|| format!("failed to load config {}", cli.config.display()))?;
    debug!(
        config = %cli.config.display(),
        data_dir = %config.data_dir.display(),
        "configuration loaded"
    );
    let store = AssetStore::new(&config.data_dir);

    match cli.command {
        Commands::Analyze { assets, json } => run_analyze(&config, &store, assets, json),
        Commands::Backtest {
            asset,
            strategy,
            capital,
        } => run_backtest(&config, &store, &asset, strategy, capital),
        Commands::Correlate { assets } => run_correlate(&config, &store, assets),
        Commands::Compare { assets, metric } => run_compare(&config, &store, assets, metric),
        Commands::Sentiment { asset } => run_sentiment(&store, &asset),
        Commands::Simulate {
            name,
            initial,
            days,
            volatility,
            drift,
            seed,
        } => {
            let defaults = SimulationParams::default();
            let params = SimulationParams {
                initial_price: initial.unwrap_or(defaults.initial_price),
                days: days.unwrap_or(defaults.days),
                volatility: volatility.unwrap_or(defaults.volatility),
                drift: drift.unwrap_or(defaults.drift),
                ..defaults
            };
            run_simulate(&store, &name, &params, seed)
        }
        Commands::Import { file, name } => run_import(&store, &file, name),
        Commands::List => run_list(&store),
        Commands::Delete { asset } => {
            store.delete(&asset)?;
            println!("Deleted {asset}");
            Ok(())
        }
        Commands::Export {
            assets,
            format,
            name,
        } => run_export(&config, &store, assets, format, &name),
        Commands::Refresh { assets, save } => run_refresh(&config, &store, assets, save),
        Commands::Alert { action } => run_alert(&config, action),
    }
}

/// `COINLENS_LOG`, then `RUST_LOG`, then `info`. Logs go to stderr so stdout
/// stays parseable for `--json`.
fn init_logging() {
    let filter = std::env::var("COINLENS_LOG")
        .ok()
        .and_then(|s| EnvFilter::try_new(s).ok())
        .or_else(|| EnvFilter::try_from_default_env().ok())
        .unwrap_or_else(|| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Synthetic fallback series end at local midnight today.
fn as_of() -> NaiveDateTime {
    chrono::Local::now()
        .date_naive()
        .and_hms_opt(0, 0, 0)
        .unwrap_or_else(|| chrono::Local::now().naive_local())
}

fn assets_or_default(config: &AppConfig, assets: Vec<String>) -> Vec<String> {
    let assets = if assets.is_empty() {
        config.assets.clone()
    } else {
        assets
    };
    assets.into_iter().map(|a| a.to_uppercase()).collect()
}

fn run_analyze(
    config: &AppConfig,
    store: &AssetStore,
    assets: Vec<String>,
    json: bool,
) -> Result<()> {
    let assets = assets_or_default(config, assets);
    let reports = analyze_batch(store, &assets, &config.analysis(), as_of());

    if json {
        println!("{}", serde_json::to_string_pretty(&reports)?);
        return Ok(());
    }

    println!(
        "{:<8} {:>14} {:<8} {:<12} {:>6} {:>14} {:>8} {:>7}  {}",
        "Asset", "Price", "Trend", "Decision", "Conf", "Forecast", "Chg%", "RSI", "Source"
    );
    println!("{}", "-".repeat(90));
    for report in &reports {
        print_report_row(report);
    }
    Ok(())
}

fn print_report_row(report: &AssetReport) {
    match &report.analysis {
        Some(a) => println!(
            "{:<8} {:>14.4} {:<8} {:<12} {:>5.0}% {:>14.4} {:>+8.2} {:>7.2}  {:?}",
            report.asset,
            a.current_price(),
            a.trend.trend,
            a.decision.label,
            a.decision.confidence * 100.0,
            a.prediction.forecast,
            a.prediction.pct_change,
            a.indicators.rsi,
            report.source,
        ),
        None => println!(
            "{:<8} error: {}",
            report.asset,
            report.error.as_deref().unwrap_or("unknown")
        ),
    }
}

fn run_backtest(
    config: &AppConfig,
    store: &AssetStore,
    asset: &str,
    strategy: Option<Strategy>,
    capital: Option<f64>,
) -> Result<()> {
    let strategy = strategy.unwrap_or(config.backtest.strategy);
    let capital = capital.unwrap_or(config.backtest.initial_capital);
    if !(capital.is_finite() && capital > 0.0) {
        bail!("--capital must be positive, got {capital}");
    }

    let asset = asset.to_uppercase();
    let (source, result) = backtest_asset(store, &asset, strategy, capital, as_of())
        .with_context(|| format!("backtest failed for {asset}"))?;

    println!("=== {asset} / {strategy} ({source:?}) ===");
    println!("Initial capital:  {:.2}", result.initial_capital);
    println!("Final capital:    {:.2}", result.final_capital);
    println!("Total return:     {:+.2}%", result.total_return_pct);
    println!("Buy and hold:     {:+.2}%", result.buy_and_hold_pct);
    println!("Max drawdown:     {:.2}%", result.max_drawdown_pct);
    println!(
        "Trades:           {} ({} wins, {} losses)",
        result.trade_count(),
        result.wins,
        result.losses
    );
    for trade in &result.trades {
        let gain = trade
            .realized_gain
            .map(|g| format!("{:+.2}%", g * 100.0))
            .unwrap_or_default();
        println!("  {:?} {} @ {:.4} {gain}", trade.side, trade.timestamp, trade.price);
    }
    Ok(())
}

fn run_correlate(config: &AppConfig, store: &AssetStore, assets: Vec<String>) -> Result<()> {
    let assets = assets_or_default(config, assets);
    let report = correlate_assets(store, &assets, as_of()).context("correlation failed")?;
    let matrix = &report.matrix;

    print!("{:<8}", "");
    for label in &matrix.labels {
        print!("{label:>8}");
    }
    println!();
    for (i, label) in matrix.labels.iter().enumerate() {
        print!("{label:<8}");
        for j in 0..matrix.len() {
            match matrix.get(i, j) {
                Some(r) => print!("{r:>8.3}"),
                None => print!("{:>8}", "n/a"),
            }
        }
        println!();
    }

    println!();
    println!("Periods: {}", report.periods);
    let summary = &report.summary;
    if let (Some(mean), Some(max), Some(min)) = (summary.mean, summary.max, summary.min) {
        println!("Mean {mean:.3}  max {max:.3}  min {min:.3}");
    }
    for rec in &report.recommendations {
        println!("  {}", rec.message);
    }
    for cluster in &report.clusters {
        println!("Cluster {}: {}", cluster.id, cluster.assets.join(", "));
    }
    Ok(())
}

fn run_compare(
    config: &AppConfig,
    store: &AssetStore,
    assets: Vec<String>,
    metric: CompareMetric,
) -> Result<()> {
    let assets = assets_or_default(config, assets);
    let reports = analyze_batch(store, &assets, &config.analysis(), as_of());
    let comparison = compare_assets(&reports, metric);

    println!("Metric: {}", metric.as_str());
    for v in &comparison.values {
        println!("  {:<8} {:>14.4}", v.asset, v.value);
    }
    if let (Some(max), Some(min), Some(mean)) = (comparison.max, comparison.min, comparison.mean) {
        println!("max {max:.4}  min {min:.4}  mean {mean:.4}");
    }
    Ok(())
}

fn run_sentiment(store: &AssetStore, asset: &str) -> Result<()> {
    let asset = asset.to_uppercase();
    let report = sentiment_for_asset(store, &asset, as_of())
        .with_context(|| format!("sentiment failed for {asset}"))?;

    println!("=== {asset} sentiment ===");
    println!("Label:      {:?} ({:.3})", report.label, report.score);
    println!("Direction:  {:?}", report.direction);
    println!("Momentum:   {:?}", report.momentum);
    println!("Volatility: {:?}", report.volatility);
    println!("Condition:  {:?}", report.condition);
    for point in report.history.iter().rev().take(7) {
        println!(
            "  {} score {:.3} price {:.4} chg {:+.2}% rsi {:.1}",
            point.timestamp, point.score, point.price, point.change_pct, point.rsi
        );
    }
    Ok(())
}

fn run_simulate(
    store: &AssetStore,
    name: &str,
    params: &SimulationParams,
    seed: u64,
) -> Result<()> {
    let summary = run_simulation(store, name, params, seed, as_of())
        .with_context(|| format!("simulation '{name}' failed"))?;

    println!("=== simulation {name} (seed {seed}) ===");
    println!("Initial price:        {:.2}", summary.initial_price);
    println!("Current price:        {:.2}", summary.current_price);
    println!("Total change:         {:+.2}%", summary.total_change_pct);
    println!("Annualised vol:       {:.2}%", summary.annualized_volatility_pct);
    println!("Range:                {:.2} .. {:.2}", summary.min, summary.max);
    Ok(())
}

fn run_import(store: &AssetStore, file: &Path, name: Option<String>) -> Result<()> {
    let name = match name {
        Some(n) => n,
        None => file
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .context("cannot derive an asset name from the file path; pass --name")?,
    };
    let asset = name.to_uppercase();
    let bytes = std::fs::read(file).with_context(|| format!("failed to read {}", file.display()))?;
    let (path, stats) = store
        .import_upload(&asset, &bytes)
        .with_context(|| format!("import failed for {}", file.display()))?;

    println!("Imported {asset} -> {}", path.display());
    println!(
        "  encoding {:?}, delimiter '{}', {} rows read, {} without date",
        stats.encoding, stats.delimiter, stats.rows_read, stats.rows_without_date
    );
    if stats.close_inferred {
        println!("  close column inferred from the first numeric column");
    }
    if !stats.synthesized_columns.is_empty() {
        println!("  filled from close: {}", stats.synthesized_columns.join(", "));
    }
    Ok(())
}

fn run_list(store: &AssetStore) -> Result<()> {
    let assets = store.list_assets()?;
    if assets.is_empty() {
        println!("No stored assets in {}", store.root().display());
        return Ok(());
    }
    for asset in assets {
        println!("{asset}");
    }
    Ok(())
}

fn run_export(
    config: &AppConfig,
    store: &AssetStore,
    assets: Vec<String>,
    format: ExportFormat,
    name: &str,
) -> Result<()> {
    let assets = assets_or_default(config, assets);
    let reports = analyze_batch(store, &assets, &config.analysis(), as_of());
    let records: Vec<_> = reports.iter().filter_map(AssetReport::record).collect();
    let path = write_export(&records, &config.output_dir, name, format)?;
    println!("Exported {} records to {}", records.len(), path.display());
    Ok(())
}

fn run_refresh(
    config: &AppConfig,
    store: &AssetStore,
    assets: Vec<String>,
    save: bool,
) -> Result<()> {
    let assets = assets_or_default(config, assets);
    let provider = YahooProvider::new(Arc::new(CircuitBreaker::default()))
        .context("failed to build the live price client")?;
    let snapshots = InMemorySnapshotStore::new();
    let options = RefreshOptions {
        indicators: config.indicators,
        decision: config.decision.clone(),
        history: save.then_some(store),
    };

    let summary = refresh_snapshots(&provider, &snapshots, &assets, &options);
    for (asset, error) in &summary.failed {
        eprintln!("Error for {asset}: {error}");
    }

    let current = snapshots.list();
    for snap in &current {
        println!(
            "{:<8} {:>14.4} {:>+8.2}% {:<8} {:<12} rsi {:>6.2}",
            snap.asset, snap.price, snap.change_pct, snap.trend, snap.decision, snap.rsi
        );
    }

    for anomaly in detect_anomalies(&current) {
        println!("ANOMALY {:?}: {}", anomaly.kind, anomaly.message);
    }

    let book = AlertBook::load(&alerts_path(config))?;
    for alert in book.evaluate(&current) {
        println!("ALERT #{} {:?} on {}", alert.rule_id, alert.kind, alert.asset);
    }

    if summary.updated.is_empty() && !assets.is_empty() {
        bail!("no asset could be refreshed");
    }
    Ok(())
}

fn alerts_path(config: &AppConfig) -> PathBuf {
    config.data_dir.join(ALERTS_FILE)
}

fn run_alert(config: &AppConfig, action: AlertAction) -> Result<()> {
    let path = alerts_path(config);
    let mut book = AlertBook::load(&path)?;

    match action {
        AlertAction::Add {
            kind,
            asset,
            value,
            condition,
        } => {
            let kind = AlertKind::from(kind);
            let needs_threshold = matches!(kind, AlertKind::Price | AlertKind::Change);
            if needs_threshold && (value.is_none() || condition.is_none()) {
                bail!("price and change alerts need --value and --condition");
            }
            let rule = book.add(
                kind,
                &asset,
                value,
                condition.map(AlertCondition::from),
                chrono::Local::now().naive_local(),
            );
            println!("Added alert #{}", rule.id);
        }
        AlertAction::List => {
            for rule in book.rules() {
                println!(
                    "#{:<4} {:<10} {:<8} {:>12} {:<10} {}",
                    rule.id,
                    format!("{:?}", rule.kind),
                    rule.asset,
                    rule.value.map(|v| format!("{v}")).unwrap_or_default(),
                    rule.condition.map(|c| format!("{c:?}")).unwrap_or_default(),
                    if rule.active { "active" } else { "inactive" },
                );
            }
            return Ok(());
        }
        AlertAction::Remove { id } => {
            book.remove(id)?;
            println!("Removed alert #{id}");
        }
        AlertAction::Enable { id } => book.set_active(id, true)?,
        AlertAction::Disable { id } => book.set_active(id, false)?,
    }

    book.save(&path)?;
    Ok(())
}
