//! SynergyLab CLI: run a rule strategy over CSV price and signal tables.
//!
//! Commands:
//! - `run`: load prices and signals, run one backtest, print a summary,
//!   optionally write the artifact set
//! - `show`: print the summary of a previously saved artifact directory

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

use synergylab_core::{CompareOp, Condition, Operand, Rule, RuleStrategy, Side};
use synergylab_runner::{
    load_artifacts, load_prices_csv, load_signal_events_csv, load_signals_csv, run_backtest,
    save_artifacts, short_run_id, summary_table, BacktestConfig, BacktestResult,
};

#[derive(Parser)]
#[command(
    name = "synergylab",
    about = "SynergyLab CLI: signal synergy backtesting engine"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a rule strategy over a price table and a signal table.
    Run(RunArgs),
    /// Print the summary of a saved artifact directory.
    Show {
        /// Directory created by `run --output-dir`.
        dir: PathBuf,
    },
}

#[derive(clap::Args)]
struct RunArgs {
    /// Price CSV: datetime,open,high,low,close[,volume].
    #[arg(long)]
    prices: PathBuf,

    /// Signal CSV: datetime plus one column per signal.
    #[arg(long)]
    signals: PathBuf,

    /// Treat --signals as long-form events (datetime,signal) and pivot them.
    #[arg(long, default_value_t = false)]
    events: bool,

    /// Path to a TOML config file. Defaults apply when omitted.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Signal column the entry rule tests. Without it every row enters.
    #[arg(long)]
    column: Option<String>,

    /// Enter when the column equals this value (number or text).
    #[arg(long, requires = "column", conflicts_with = "above")]
    equals: Option<String>,

    /// Enter when the column is strictly above this threshold.
    #[arg(long, requires = "column")]
    above: Option<f64>,

    /// Bars to hold each trade.
    #[arg(long, default_value_t = RuleStrategy::DEFAULT_HOLD_BARS)]
    hold_bars: usize,

    #[arg(long, value_enum, default_value_t = SideArg::Long)]
    side: SideArg,

    /// Strategy name echoed into the result. Derived from the rule when omitted.
    #[arg(long)]
    name: Option<String>,

    /// Output directory for result.json, trades.csv and equity.csv.
    #[arg(long)]
    output_dir: Option<PathBuf>,
}

#[derive(Clone, Copy, ValueEnum)]
enum SideArg {
    Long,
    Short,
}

impl From<SideArg> for Side {
    fn from(side: SideArg) -> Self {
        match side {
            SideArg::Long => Side::Long,
            SideArg::Short => Side::Short,
        }
    }
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Commands::Run(args) => run_cmd(args),
        Commands::Show { dir } => show_cmd(&dir),
    }
}

/// Log to stderr, filtered by `RUST_LOG` (default `info`).
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn run_cmd(args: RunArgs) -> Result<()> {
    let config = match &args.config {
        Some(path) => BacktestConfig::from_file(path)?,
        None => BacktestConfig::default(),
    };

    let prices = load_prices_csv(&args.prices)?;
    let signals = if args.events {
        load_signal_events_csv(&args.signals)?
    } else {
        load_signals_csv(&args.signals)?
    };
    tracing::info!(bars = prices.len(), signal_rows = signals.len(), "data loaded");

    let strategy = build_strategy(&args, &config)?;
    let result = run_backtest(&strategy, &prices, &signals, &config)
        .context("backtest failed")?;

    print_summary(&result);

    if let Some(output_dir) = &args.output_dir {
        let run_dir = save_artifacts(&result, output_dir)?;
        println!("Artifacts saved to: {}", run_dir.display());
    }

    Ok(())
}

fn build_strategy(args: &RunArgs, config: &BacktestConfig) -> Result<RuleStrategy> {
    let condition = match (&args.column, &args.equals, args.above) {
        (None, _, _) => None,
        (Some(column), Some(value), None) => {
            let operand = match value.parse::<f64>() {
                Ok(n) => Operand::Number(n),
                Err(_) => Operand::Text(value.clone()),
            };
            Some(Condition::new(column.clone(), CompareOp::Eq, operand))
        }
        (Some(column), None, Some(threshold)) => Some(Condition::new(
            column.clone(),
            CompareOp::Gt,
            Operand::Number(threshold),
        )),
        (Some(column), _, _) => bail!("--column {column} needs exactly one of --equals or --above"),
    };

    let name = args.name.clone().unwrap_or_else(|| match &condition {
        Some(c) => format!("{} {} {}", c.column, c.op, describe_operand(&c.value)),
        None => "every signal".to_string(),
    });
    let reason = condition.as_ref().map(|c| c.column.clone());
    let rule = Rule::new(condition.into_iter().collect());

    let mut strategy = RuleStrategy::new(name, rule)
        .with_side(args.side.into())
        .with_hold_bars(args.hold_bars)
        .with_synergy_map(config.synergy_map.clone());
    if let Some(reason) = reason {
        strategy = strategy.with_reason(reason);
    }
    Ok(strategy)
}

fn describe_operand(value: &Operand) -> String {
    match value {
        Operand::Number(n) => n.to_string(),
        Operand::Text(s) => s.clone(),
    }
}

fn show_cmd(dir: &Path) -> Result<()> {
    let result = load_artifacts(dir)?;
    print_summary(&result);
    Ok(())
}

fn print_summary(result: &BacktestResult) {
    println!();
    println!("=== Backtest Results: {} ===", result.strategy_name);
    print!("{}", summary_table(result));
    println!("{:<16}{:>16}", "Final Equity", format!("{:.2}", final_equity(result)));
    println!("{:<16}{:>16}", "Run Id", short_run_id(&result.run_id));
    println!();
}

fn final_equity(result: &BacktestResult) -> f64 {
    result
        .equity_curve
        .last()
        .copied()
        .unwrap_or(result.config.initial_capital)
}
