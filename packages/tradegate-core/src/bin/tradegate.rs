//! Tradegate CLI - size, check and analyze trade proposals.
//!
//! Every command prints a JSON `ApiResponse` on stdout; logs go to stderr.

use std::fs;
use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use serde_json::{json, Value};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use tradegate_core::{
    compute_indicators, compute_sizing_with, get_strategy, list_strategies,
    providers::{AnalysisStore, StaticSeries},
    risk_reward_ratio,
    sizing::check_proposal,
    strategy::evaluate_strategy_with,
    Analyzer, ApiResponse, EngineConfig, Error, IndicatorSnapshot, JsonFileStore, MarginBand,
    PriceSeries, Result, TradeProposal, TradeSide, Verdict,
};

#[derive(Parser)]
#[command(name = "tradegate")]
#[command(about = "Tradegate CLI - risk-gated trade proposal analysis")]
#[command(version)]
struct Cli {
    /// Engine config file (defaults to TRADEGATE_CONFIG or ~/.tradegate/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Position size and margin check for a proposal
    Size {
        #[command(flatten)]
        proposal: ProposalArgs,
    },
    /// Indicator snapshot for a price history file
    Indicators {
        /// JSON array of prices, oldest first
        #[arg(short, long)]
        prices: PathBuf,
        #[arg(short, long, default_value = "BTC/USDT")]
        symbol: String,
    },
    /// Strategy commands
    Strategy {
        #[command(subcommand)]
        action: StrategyAction,
    },
    /// Count a strategy's conditions against an indicator snapshot file
    Evaluate {
        #[arg(long)]
        strategy: String,
        #[arg(long, value_parser = parse_side)]
        side: TradeSide,
        /// IndicatorSnapshot JSON
        #[arg(long)]
        snapshot: PathBuf,
    },
    /// Full analysis: sizing, indicators, rules and optional verdict
    Analyze {
        #[command(flatten)]
        proposal: ProposalArgs,
        /// JSON array of prices, oldest first
        #[arg(short, long)]
        prices: PathBuf,
        /// External verdict JSON
        #[arg(long)]
        verdict: Option<PathBuf>,
        /// Do not write the record to history
        #[arg(long)]
        no_save: bool,
    },
    /// Latest saved analyses
    History {
        #[arg(short, long, default_value = "10")]
        limit: usize,
    },
}

#[derive(Subcommand)]
enum StrategyAction {
    /// List available strategies
    List,
    /// Get strategy details
    Get {
        /// Strategy ID or name
        #[arg(short, long)]
        id: String,
    },
}

#[derive(Args)]
struct ProposalArgs {
    #[arg(short, long)]
    symbol: String,
    #[arg(long, value_parser = parse_side)]
    side: TradeSide,
    #[arg(short, long)]
    entry: f64,
    #[arg(long)]
    stop: f64,
    #[arg(long, default_value = "0")]
    take_profit: f64,
    #[arg(short, long, default_value = "10000")]
    balance: f64,
    /// Percent of balance at risk
    #[arg(short, long, default_value = "1")]
    risk: f64,
    #[arg(short, long, default_value = "1")]
    leverage: f64,
    #[arg(long, default_value = "15m")]
    timeframe: String,
    #[arg(long, default_value = tradegate_core::strategy::DEFAULT_STRATEGY)]
    strategy: String,
}

impl ProposalArgs {
    fn to_proposal(&self) -> TradeProposal {
        TradeProposal::new(&self.symbol, self.side, self.entry, self.stop, self.take_profit)
            .with_account(self.balance, self.risk, self.leverage)
            .with_timeframe(&self.timeframe)
            .with_strategy(&self.strategy)
    }
}

fn parse_side(value: &str) -> std::result::Result<TradeSide, String> {
    match value.to_lowercase().as_str() {
        "long" | "buy" => Ok(TradeSide::Long),
        "short" | "sell" => Ok(TradeSide::Short),
        other => Err(format!("expected LONG or SHORT, got {}", other)),
    }
}

fn main() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let result = load_config(cli.config.as_deref()).and_then(|config| match cli.command {
        Commands::Size { proposal } => handle_size(&proposal, &config),
        Commands::Indicators { prices, symbol } => handle_indicators(&prices, &symbol, &config),
        Commands::Strategy { action } => handle_strategy(action),
        Commands::Evaluate {
            strategy,
            side,
            snapshot,
        } => handle_evaluate(&strategy, side, &snapshot, &config),
        Commands::Analyze {
            proposal,
            prices,
            verdict,
            no_save,
        } => handle_analyze(&proposal, &prices, verdict.as_deref(), no_save, config),
        Commands::History { limit } => handle_history(limit),
    });

    let response = match result {
        Ok(data) => ApiResponse::ok(data),
        Err(e) => ApiResponse::err(e.to_string()),
    };

    match serde_json::to_string_pretty(&response) {
        Ok(output) => println!("{}", output),
        Err(e) => println!(r#"{{"ok":false,"error":"{}"}}"#, e),
    }
}

fn load_config(path: Option<&Path>) -> Result<EngineConfig> {
    match path {
        Some(path) => EngineConfig::load_from_path(path),
        None => EngineConfig::load(),
    }
}

fn read_prices(path: &Path) -> Result<PriceSeries> {
    let content = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

fn handle_size(args: &ProposalArgs, config: &EngineConfig) -> Result<Value> {
    let proposal = args.to_proposal();
    let sizing = compute_sizing_with(&proposal, &config.sizing);

    Ok(json!({
        "proposal": proposal,
        "sizing": sizing,
        "margin_band": MarginBand::classify(&sizing, &config.sizing),
        "risk_reward": risk_reward_ratio(&proposal),
        "defect": check_proposal(&proposal).map(|d| d.to_string()),
    }))
}

fn handle_indicators(prices: &Path, symbol: &str, config: &EngineConfig) -> Result<Value> {
    let series = read_prices(prices)?;
    let snapshot = compute_indicators(symbol, &series, &config.indicators);
    Ok(serde_json::to_value(snapshot)?)
}

fn handle_strategy(action: StrategyAction) -> Result<Value> {
    match action {
        StrategyAction::List => Ok(json!({
            "strategies": list_strategies(),
        })),
        StrategyAction::Get { id } => match get_strategy(&id) {
            Some(strategy) => Ok(serde_json::to_value(strategy)?),
            None => Err(Error::UnknownStrategy(id)),
        },
    }
}

fn handle_evaluate(
    strategy: &str,
    side: TradeSide,
    snapshot: &Path,
    config: &EngineConfig,
) -> Result<Value> {
    let content = fs::read_to_string(snapshot)?;
    let snapshot: IndicatorSnapshot = serde_json::from_str(&content)?;
    let evaluation = evaluate_strategy_with(strategy, side, &snapshot, &config.rules);

    Ok(json!({
        "evaluation": evaluation,
        "score": evaluation.score(),
    }))
}

fn handle_analyze(
    args: &ProposalArgs,
    prices: &Path,
    verdict: Option<&Path>,
    no_save: bool,
    config: EngineConfig,
) -> Result<Value> {
    let proposal = args.to_proposal();
    let source = StaticSeries::new().with_series(&proposal.symbol, read_prices(prices)?);

    let outcome = match verdict {
        Some(path) => {
            let content = fs::read_to_string(path)?;
            let verdict: Verdict = serde_json::from_str(&content)?;
            Analyzer::new(source)
                .with_verdicts(verdict)
                .with_config(config)
                .analyze(&proposal)?
        }
        None => Analyzer::new(source).with_config(config).analyze(&proposal)?,
    };

    if !no_save {
        let mut store = JsonFileStore::new()?;
        store.create(outcome.record.clone())?;
    }

    Ok(json!({
        "record": outcome.record,
        "sizing": outcome.sizing,
        "evaluation": outcome.evaluation,
        "phases": outcome.run.history(),
        "saved": !no_save,
    }))
}

fn handle_history(limit: usize) -> Result<Value> {
    let store = JsonFileStore::new()?;
    let records = store.latest(limit)?;

    Ok(json!({
        "count": records.len(),
        "records": records,
    }))
}
