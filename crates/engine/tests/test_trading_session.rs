use async_trait::async_trait;
use core_types::{
    Balances, Candle, ClientOrderId, ExchangeClient, ExchangeError, MarketData, OrderReport,
    OrderRequest, OrderStatus, OrderType, Side, Symbol, Ticker,
};
use engine::{CycleOutcome, Engine, Error, Phase, SessionConfig, Trend, TradingSession};
use execution::{ExecutionPolicy, Executor, OrderExecutor, OrderOutcome, RecordingSink};
use risk::RiskPolicy;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

struct StubMarket {
    closes: Vec<Decimal>,
}

#[async_trait]
impl MarketData for StubMarket {
    async fn get_candles(&self, _symbol: &Symbol, _timeframe: &str, limit: u16) -> Vec<Candle> {
        self.closes
            .iter()
            .take(limit as usize)
            .enumerate()
            .map(|(i, close)| Candle {
                open_time: i as i64 * 3_600_000,
                open: *close,
                high: *close,
                low: *close,
                close: *close,
                volume: dec!(3),
                close_time: (i as i64 + 1) * 3_600_000 - 1,
            })
            .collect()
    }
}

/// Exchange stub with a fixed account and price; counts what the session asks for.
struct StubExchange {
    balance: core_types::Result<Balances>,
    last_price: Decimal,
    balance_calls: AtomicU32,
    ticker_calls: AtomicU32,
    orders: Mutex<Vec<OrderRequest>>,
}

impl StubExchange {
    fn with_usdt(amount: Decimal) -> Arc<Self> {
        Self::with_balance(Ok(Balances::from([("USDT".to_string(), amount)])))
    }

    fn with_balance(balance: core_types::Result<Balances>) -> Arc<Self> {
        Arc::new(Self {
            balance,
            last_price: dec!(64000.5),
            balance_calls: AtomicU32::new(0),
            ticker_calls: AtomicU32::new(0),
            orders: Mutex::new(Vec::new()),
        })
    }

    fn orders(&self) -> Vec<OrderRequest> {
        self.orders.lock().unwrap().clone()
    }
}

fn filled(order_id: &str) -> OrderReport {
    OrderReport {
        order_id: order_id.to_string(),
        client_order_id: None,
        status: OrderStatus::Filled,
        executed_qty: dec!(1),
        raw: serde_json::json!({ "orderId": order_id }),
    }
}

#[async_trait]
impl ExchangeClient for StubExchange {
    fn name(&self) -> &'static str {
        "stub"
    }

    async fn create_order(
        &self,
        request: &OrderRequest,
        _client_order_id: &ClientOrderId,
    ) -> core_types::Result<OrderReport> {
        self.orders.lock().unwrap().push(request.clone());
        Ok(filled("42"))
    }

    async fn fetch_balance(&self) -> core_types::Result<Balances> {
        self.balance_calls.fetch_add(1, Ordering::SeqCst);
        self.balance.clone()
    }

    async fn fetch_ticker(&self, symbol: &Symbol) -> core_types::Result<Ticker> {
        self.ticker_calls.fetch_add(1, Ordering::SeqCst);
        Ok(Ticker {
            symbol: symbol.clone(),
            last: self.last_price,
        })
    }

    async fn cancel_order(&self, _symbol: &Symbol, order_id: &str) -> core_types::Result<OrderReport> {
        Ok(filled(order_id))
    }

    async fn fetch_order(&self, _symbol: &Symbol, order_id: &str) -> core_types::Result<OrderReport> {
        Ok(filled(order_id))
    }
}

/// Executor stub that records requests and always fills.
#[derive(Default)]
struct CountingExecutor {
    requests: Mutex<Vec<OrderRequest>>,
}

impl CountingExecutor {
    fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl Executor for CountingExecutor {
    fn name(&self) -> &'static str {
        "counting"
    }

    async fn execute(
        &self,
        request: &OrderRequest,
        _cancel: &CancellationToken,
    ) -> execution::Result<OrderOutcome> {
        self.requests.lock().unwrap().push(request.clone());
        Ok(OrderOutcome::Filled {
            order_id: "7".into(),
            details: filled("7"),
        })
    }
}

fn config(order_type: OrderType) -> SessionConfig {
    SessionConfig {
        symbol: Symbol::new("BTC/USDT"),
        timeframe: "1h".into(),
        candle_limit: 100,
        trend_window: 3,
        stop_loss_percent: dec!(2),
        order_type,
        quote_currency: "USDT".into(),
    }
}

fn rising() -> Arc<StubMarket> {
    Arc::new(StubMarket {
        closes: vec![dec!(100), dec!(101), dec!(102), dec!(110)],
    })
}

fn falling() -> Arc<StubMarket> {
    Arc::new(StubMarket {
        closes: vec![dec!(110), dec!(108), dec!(104), dec!(100)],
    })
}

fn real_executor(exchange: Arc<StubExchange>) -> Arc<OrderExecutor> {
    let policy = ExecutionPolicy::new(3, dec!(1000), 2.0).unwrap();
    Arc::new(OrderExecutor::new(exchange, policy, Arc::new(RecordingSink::new())).unwrap())
}

#[tokio::test]
async fn uptrend_buys_the_computed_size() {
    let exchange = StubExchange::with_usdt(dec!(1000));
    let session = TradingSession::new(
        config(OrderType::Market),
        RiskPolicy::default(),
        rising(),
        exchange.clone(),
        real_executor(exchange.clone()),
    );

    let report = session.run_cycle(dec!(0.01), &CancellationToken::new()).await;

    assert_eq!(
        report.path,
        vec![
            Phase::Idle,
            Phase::SignalFetched,
            Phase::Sized,
            Phase::GuardChecked,
            Phase::Executing,
            Phase::Done
        ]
    );
    assert_eq!(report.signal.unwrap().trend, Trend::Up);
    // 1000 * 0.01 / 0.02
    assert_eq!(report.size.unwrap().to_string(), "500.000000");
    assert!(matches!(report.outcome, CycleOutcome::Done(OrderOutcome::Filled { .. })));

    let orders = exchange.orders();
    assert_eq!(orders.len(), 1);
    assert_eq!(orders[0].side, Side::Buy);
    assert_eq!(orders[0].amount, dec!(500));
    assert_eq!(orders[0].order_type, OrderType::Market);
    assert_eq!(orders[0].price, None);
}

#[tokio::test]
async fn downtrend_sells() {
    let exchange = StubExchange::with_usdt(dec!(1000));
    let executor = Arc::new(CountingExecutor::default());
    let session = TradingSession::new(
        config(OrderType::Market),
        RiskPolicy::default(),
        falling(),
        exchange,
        executor.clone(),
    );

    let report = session.run_cycle(Decimal::ZERO, &CancellationToken::new()).await;

    assert_eq!(report.phase(), Phase::Done);
    assert_eq!(report.signal.unwrap().trend, Trend::Down);
    assert_eq!(report.request.unwrap().side, Side::Sell);
    assert_eq!(executor.calls(), 1);
}

#[tokio::test]
async fn missing_candles_fail_before_any_account_call() {
    let exchange = StubExchange::with_usdt(dec!(1000));
    let executor = Arc::new(CountingExecutor::default());
    let session = TradingSession::new(
        config(OrderType::Market),
        RiskPolicy::default(),
        Arc::new(StubMarket { closes: vec![] }),
        exchange.clone(),
        executor.clone(),
    );

    let report = session.run_cycle(Decimal::ZERO, &CancellationToken::new()).await;

    assert_eq!(report.path, vec![Phase::Idle, Phase::Failed]);
    assert_eq!(
        report.outcome,
        CycleOutcome::Failed(Error::DataUnavailable {
            symbol: "BTC/USDT".into(),
            timeframe: "1h".into()
        })
    );
    assert_eq!(exchange.balance_calls.load(Ordering::SeqCst), 0);
    assert_eq!(executor.calls(), 0);
}

#[tokio::test]
async fn drawdown_at_the_ceiling_blocks_the_trade() {
    let exchange = StubExchange::with_usdt(dec!(1000));
    let executor = Arc::new(CountingExecutor::default());
    let session = TradingSession::new(
        config(OrderType::Market),
        RiskPolicy::new(dec!(0.05), dec!(0.01)).unwrap(),
        rising(),
        exchange,
        executor.clone(),
    );

    let report = session.run_cycle(dec!(0.05), &CancellationToken::new()).await;

    assert_eq!(
        report.path,
        vec![
            Phase::Idle,
            Phase::SignalFetched,
            Phase::Sized,
            Phase::GuardChecked,
            Phase::Blocked
        ]
    );
    assert_eq!(
        report.outcome,
        CycleOutcome::Blocked {
            current_drawdown: dec!(0.05),
            max_drawdown: dec!(0.05)
        }
    );
    assert_eq!(report.request, None);
    assert_eq!(executor.calls(), 0);
}

#[tokio::test]
async fn balance_failure_fails_the_cycle() {
    let exchange =
        StubExchange::with_balance(Err(ExchangeError::Network("connection refused".into())));
    let executor = Arc::new(CountingExecutor::default());
    let session = TradingSession::new(
        config(OrderType::Market),
        RiskPolicy::default(),
        rising(),
        exchange,
        executor.clone(),
    );

    let report = session.run_cycle(Decimal::ZERO, &CancellationToken::new()).await;

    assert_eq!(report.path, vec![Phase::Idle, Phase::SignalFetched, Phase::Failed]);
    assert!(matches!(
        report.outcome,
        CycleOutcome::Failed(Error::Exchange(ExchangeError::Network(_)))
    ));
    assert_eq!(executor.calls(), 0);
}

#[tokio::test]
async fn empty_quote_balance_cannot_be_sized() {
    let exchange = StubExchange::with_balance(Ok(Balances::from([("BTC".to_string(), dec!(2))])));
    let session = TradingSession::new(
        config(OrderType::Market),
        RiskPolicy::default(),
        rising(),
        exchange,
        Arc::new(CountingExecutor::default()),
    );

    let report = session.run_cycle(Decimal::ZERO, &CancellationToken::new()).await;

    assert!(matches!(
        report.outcome,
        CycleOutcome::Failed(Error::Risk(risk::Error::InvalidInput(_)))
    ));
    assert_eq!(report.size, None);
}

#[tokio::test]
async fn limit_orders_are_priced_at_the_last_trade() {
    let exchange = StubExchange::with_usdt(dec!(1000));
    let executor = Arc::new(CountingExecutor::default());
    let session = TradingSession::new(
        config(OrderType::Limit),
        RiskPolicy::default(),
        rising(),
        exchange.clone(),
        executor.clone(),
    );

    let report = session.run_cycle(Decimal::ZERO, &CancellationToken::new()).await;

    assert_eq!(report.phase(), Phase::Done);
    assert_eq!(exchange.ticker_calls.load(Ordering::SeqCst), 1);
    let request = executor.requests.lock().unwrap()[0].clone();
    assert_eq!(request.order_type, OrderType::Limit);
    assert_eq!(request.price, Some(dec!(64000.5)));
}

#[tokio::test]
async fn oversized_order_fails_in_execution_without_submitting() {
    // 10000 * 0.01 / 0.02 = 5000, above the 1000 limit.
    let exchange = StubExchange::with_usdt(dec!(10000));
    let session = TradingSession::new(
        config(OrderType::Market),
        RiskPolicy::default(),
        rising(),
        exchange.clone(),
        real_executor(exchange.clone()),
    );

    let report = session.run_cycle(Decimal::ZERO, &CancellationToken::new()).await;

    assert_eq!(report.path.last(), Some(&Phase::Failed));
    assert!(report.path.contains(&Phase::Executing));
    assert!(matches!(
        report.outcome,
        CycleOutcome::Failed(Error::Execution(execution::Error::LimitExceeded { .. }))
    ));
    assert!(exchange.orders().is_empty());
}

#[tokio::test(start_paused = true)]
async fn engine_repeats_cycles_until_cancelled() {
    let exchange = StubExchange::with_usdt(dec!(1000));
    let executor = Arc::new(CountingExecutor::default());
    let session = Arc::new(TradingSession::new(
        config(OrderType::Market),
        RiskPolicy::default(),
        rising(),
        exchange,
        executor.clone(),
    ));
    let engine = Engine::new(session, Duration::from_secs(60));

    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_secs(150)).await;
        trigger.cancel();
    });

    // Cycles at t = 0, 60 and 120; cancellation lands at 150.
    let cycles = engine.run(|| Decimal::ZERO, &cancel).await;

    assert_eq!(cycles, 3);
    assert_eq!(executor.calls(), 3);
}

#[tokio::test(start_paused = true)]
async fn engine_does_nothing_when_already_cancelled() {
    let executor = Arc::new(CountingExecutor::default());
    let session = Arc::new(TradingSession::new(
        config(OrderType::Market),
        RiskPolicy::default(),
        rising(),
        StubExchange::with_usdt(dec!(1000)),
        executor.clone(),
    ));
    let cancel = CancellationToken::new();
    cancel.cancel();

    let cycles = Engine::new(session, Duration::from_secs(60)).run(|| Decimal::ZERO, &cancel).await;

    assert_eq!(cycles, 0);
    assert_eq!(executor.calls(), 0);
}

#[tokio::test(start_paused = true)]
async fn engine_reads_drawdown_before_every_cycle() {
    let executor = Arc::new(CountingExecutor::default());
    let session = Arc::new(TradingSession::new(
        config(OrderType::Market),
        RiskPolicy::default(),
        rising(),
        StubExchange::with_usdt(dec!(1000)),
        executor.clone(),
    ));
    let engine = Engine::new(session, Duration::from_secs(60));

    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_secs(150)).await;
        trigger.cancel();
    });

    // Healthy for the first cycle, past the 5% limit afterwards.
    let reads = AtomicU32::new(0);
    let cycles = engine
        .run(
            || match reads.fetch_add(1, Ordering::SeqCst) {
                0 => Decimal::ZERO,
                _ => dec!(0.06),
            },
            &cancel,
        )
        .await;

    assert_eq!(cycles, 3);
    assert_eq!(reads.load(Ordering::SeqCst), 3);
    assert_eq!(executor.calls(), 1);
}
