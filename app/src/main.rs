// In app/src/main.rs

use anyhow::{Context, Result};
use api_client::ApiClient;
use app_config::Settings;
use clap::{Parser, Subcommand};
use core_types::{ExchangeClient, MarketData, Symbol, balance_of};
use engine::{CycleOutcome, Engine, SessionConfig, TradingSession};
use execution::{OrderExecutor, OrderOutcome, TracingSink};
use risk::RiskSizer;
use rust_decimal::Decimal;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::prelude::*;

// --- Command-Line Interface Definition ---

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = "A risk-sized Binance spot trading agent.")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Runs a single trade cycle: signal, sizing, drawdown check, execution.
    Trade {
        /// Current drawdown as a fraction of the portfolio peak (e.g. 0.02).
        #[arg(long, default_value = "0")]
        drawdown: Decimal,
    },

    /// Repeats trade cycles on an interval until Ctrl-C.
    Run {
        /// Drawdown fraction applied to every cycle. Read once at startup
        /// and never refreshed; restart the run to change it.
        #[arg(long, default_value = "0")]
        drawdown: Decimal,

        /// Seconds between cycles. Defaults to `session.interval_secs`.
        #[arg(long)]
        interval_secs: Option<u64>,
    },

    /// Computes a position size without touching the exchange.
    Size {
        /// Portfolio value in the quote currency.
        #[arg(short, long)]
        portfolio: Decimal,

        /// Stop-loss distance in percent. Defaults to `session.stop_loss_percent`.
        #[arg(long)]
        stop_loss: Option<Decimal>,
    },

    /// Shows the balance of one currency.
    Balance {
        /// Defaults to `session.quote_currency`.
        #[arg(short, long)]
        currency: Option<String>,
    },

    /// Shows the last traded price.
    Price {
        /// Pair in BASE/QUOTE form. Defaults to `session.symbol`.
        #[arg(short, long)]
        symbol: Option<String>,
    },

    /// Prints recent candles.
    Candles {
        #[arg(short, long)]
        symbol: Option<String>,

        /// e.g. "5m", "1h". Defaults to `session.timeframe`.
        #[arg(short, long)]
        timeframe: Option<String>,

        #[arg(short, long, default_value_t = 10)]
        limit: u16,
    },

    /// Cancels an open order.
    Cancel {
        /// Exchange order id.
        order_id: String,

        #[arg(short, long)]
        symbol: Option<String>,
    },

    /// Shows the status of an order.
    Status {
        /// Exchange order id.
        order_id: String,

        #[arg(short, long)]
        symbol: Option<String>,
    },
}

// --- Main Application Entry Point ---

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from a .env file, if it exists.
    dotenvy::dotenv().ok();

    // Parse command-line arguments.
    let cli = Cli::parse();

    let settings = app_config::load_settings().context("Failed to load configuration")?;
    init_tracing(&settings);

    tracing::info!(environment = %settings.app.environment, "Starting trading agent");

    match cli.command {
        Commands::Trade { drawdown } => handle_trade(&settings, drawdown).await?,
        Commands::Run {
            drawdown,
            interval_secs,
        } => handle_run(&settings, drawdown, interval_secs).await?,
        Commands::Size {
            portfolio,
            stop_loss,
        } => handle_size(&settings, portfolio, stop_loss)?,
        Commands::Balance { currency } => handle_balance(&settings, currency).await?,
        Commands::Price { symbol } => handle_price(&settings, symbol).await?,
        Commands::Candles {
            symbol,
            timeframe,
            limit,
        } => handle_candles(&settings, symbol, timeframe, limit).await?,
        Commands::Cancel { order_id, symbol } => handle_cancel(&settings, symbol, &order_id).await?,
        Commands::Status { order_id, symbol } => handle_status(&settings, symbol, &order_id).await?,
    }

    Ok(())
}

/// `RUST_LOG` wins over `app.log_level`.
fn init_tracing(settings: &Settings) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&settings.app.log_level));
    let fmt_layer = tracing_subscriber::fmt::layer().with_target(false);
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .init();
}

fn client(settings: &Settings) -> Result<Arc<ApiClient>> {
    Ok(Arc::new(api_client::new(&settings.binance)?))
}

/// Client for endpoints that need an API key and signature.
fn signed_client(settings: &Settings) -> Result<Arc<ApiClient>> {
    if !settings.binance.has_credentials() {
        anyhow::bail!(
            "Binance credentials are missing. Set APP_BINANCE__API_KEY and APP_BINANCE__SECRET_KEY."
        );
    }
    client(settings)
}

fn symbol_or_default(settings: &Settings, symbol: Option<String>) -> Symbol {
    Symbol::new(symbol.unwrap_or_else(|| settings.session.symbol.clone()))
}

/// Wires the Binance adapter, executor and risk policy into a session.
fn build_session(settings: &Settings) -> Result<TradingSession> {
    let client = signed_client(settings)?;
    let risk_policy = settings.risk.policy()?;
    let execution_policy = settings.execution.policy()?;

    let executor = OrderExecutor::new(client.clone(), execution_policy, Arc::new(TracingSink))?;

    Ok(TradingSession::new(
        SessionConfig::from(&settings.session),
        risk_policy,
        client.clone(),
        client,
        Arc::new(executor),
    ))
}

// --- Trading Subcommands ---

async fn handle_trade(settings: &Settings, drawdown: Decimal) -> Result<()> {
    let session = build_session(settings)?;
    let cancel = CancellationToken::new();
    spawn_ctrl_c(cancel.clone());

    let report = session.run_cycle(drawdown, &cancel).await;
    match report.outcome {
        CycleOutcome::Done(OrderOutcome::Filled { order_id, details }) => {
            println!(
                "{} {} filled: order {} ({:?}, executed {})",
                report.request.map(|r| r.side.to_string()).unwrap_or_default(),
                report.symbol,
                order_id,
                details.status,
                details.executed_qty
            );
            Ok(())
        }
        CycleOutcome::Done(outcome) => anyhow::bail!("Order not filled: {outcome:?}"),
        CycleOutcome::Blocked {
            current_drawdown,
            max_drawdown,
        } => {
            println!("Trade blocked: drawdown {current_drawdown} >= limit {max_drawdown}");
            Ok(())
        }
        CycleOutcome::Failed(error) => Err(error.into()),
    }
}

async fn handle_run(settings: &Settings, drawdown: Decimal, interval_secs: Option<u64>) -> Result<()> {
    let session = Arc::new(build_session(settings)?);
    let interval = Duration::from_secs(interval_secs.unwrap_or(settings.session.interval_secs));
    let engine = Engine::new(session, interval);

    let cancel = CancellationToken::new();
    spawn_ctrl_c(cancel.clone());

    tracing::info!(drawdown = %drawdown, "Drawdown is fixed for this run.");
    let cycles = engine.run(|| drawdown, &cancel).await;
    tracing::info!(cycles, "Shut down cleanly.");
    Ok(())
}

/// Cancels `token` on Ctrl-C. In-flight retries stop at their next check.
fn spawn_ctrl_c(token: CancellationToken) {
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                tracing::warn!("Ctrl-C received, stopping.");
                token.cancel();
            }
            Err(e) => tracing::error!(error = %e, "Failed to listen for Ctrl-C."),
        }
    });
}

fn handle_size(settings: &Settings, portfolio: Decimal, stop_loss: Option<Decimal>) -> Result<()> {
    let policy = settings.risk.policy()?;
    let stop_loss_percent = stop_loss.unwrap_or(settings.session.stop_loss_percent);
    let size = RiskSizer::new(policy).size(&risk::PositionSizeRequest {
        portfolio_value: portfolio,
        stop_loss_percent,
    })?;
    println!(
        "size {size} (portfolio {portfolio}, risk {}, stop {stop_loss_percent}%)",
        policy.risk_per_trade_fraction()
    );
    Ok(())
}

// --- Query Subcommands ---

async fn handle_balance(settings: &Settings, currency: Option<String>) -> Result<()> {
    let client = signed_client(settings)?;
    let currency = currency
        .unwrap_or_else(|| settings.session.quote_currency.clone())
        .to_uppercase();
    let balances = client.fetch_balance().await?;
    println!("{} {}", balance_of(&balances, &currency), currency);
    Ok(())
}

async fn handle_price(settings: &Settings, symbol: Option<String>) -> Result<()> {
    let client = client(settings)?;
    let symbol = symbol_or_default(settings, symbol);
    let ticker = client.fetch_ticker(&symbol).await?;
    println!("{} {}", ticker.symbol, ticker.last);
    Ok(())
}

async fn handle_candles(
    settings: &Settings,
    symbol: Option<String>,
    timeframe: Option<String>,
    limit: u16,
) -> Result<()> {
    let client = client(settings)?;
    let symbol = symbol_or_default(settings, symbol);
    let timeframe = timeframe.unwrap_or_else(|| settings.session.timeframe.clone());

    let candles = client.get_candles(&symbol, &timeframe, limit).await;
    if candles.is_empty() {
        anyhow::bail!("No candles returned for {symbol} ({timeframe})");
    }
    println!("{:>15} {:>14} {:>14} {:>14} {:>14} {:>16}", "open_time", "open", "high", "low", "close", "volume");
    for candle in &candles {
        println!(
            "{:>15} {:>14} {:>14} {:>14} {:>14} {:>16}",
            candle.open_time, candle.open, candle.high, candle.low, candle.close, candle.volume
        );
    }
    Ok(())
}

async fn handle_cancel(settings: &Settings, symbol: Option<String>, order_id: &str) -> Result<()> {
    let client = signed_client(settings)?;
    let symbol = symbol_or_default(settings, symbol);
    let report = client.cancel_order(&symbol, order_id).await?;
    println!("order {} on {}: {:?}", report.order_id, symbol, report.status);
    Ok(())
}

async fn handle_status(settings: &Settings, symbol: Option<String>, order_id: &str) -> Result<()> {
    let client = signed_client(settings)?;
    let symbol = symbol_or_default(settings, symbol);
    let report = client.fetch_order(&symbol, order_id).await?;
    println!(
        "order {} on {}: {:?}, executed {}",
        report.order_id, symbol, report.status, report.executed_qty
    );
    Ok(())
}
