//! The Hyperliquid perpetual connector.
//!
//! [`HyperliquidPerpetual`] composes the building blocks of this crate into
//! the connector contract: the REST client and API groups for placement and
//! metadata, the market-data and user-stream sessions, the in-flight order
//! tracker, and the event fan-out.
//!
//! The placement path follows one critical ordering rule: an order is
//! inserted into the tracker **before** its submit is scheduled, so a fill
//! notification racing the synchronous acknowledgement always finds its
//! record. `buy`/`sell` therefore return a client order id immediately and
//! never block on I/O; the actual wire interaction happens on a dedicated
//! worker task fed by a bounded queue, and outcomes are delivered through
//! the registered event listeners.
//!
use std::collections::HashMap;
use std::str::FromStr;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};
use rust_decimal::Decimal;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::hyperliquid::book::OrderBook;
use crate::hyperliquid::connect::api::{Exchange, Info};
use crate::hyperliquid::connect::client::HttpClient;
use crate::hyperliquid::connect::config::Config;
use crate::hyperliquid::connect::models::{
    CancelAction, L2Level, OrderAction, Tif, WireCancel, WireOrder, WireOrderType,
};
use crate::hyperliquid::error::{HalyardError, Result};
use crate::hyperliquid::events::{
    BalanceEventListener, ErrorEventListener, OrderEventListener, PositionEventListener,
    TradeEventListener,
};
use crate::hyperliquid::orders::{
    ClientOrderTracker, InFlightOrder, Liquidity, OrderState, OrderUpdate, TradeUpdate,
};
use crate::hyperliquid::reasons;
use crate::hyperliquid::rules::TradingRule;
use crate::hyperliquid::ticker::{MarketDataSession, OrderBookCallback};
use crate::hyperliquid::traits::{Connector, PerpetualConnector, SignL1Action};
use crate::hyperliquid::types::{
    current_timestamp_ns, ConnectorType, OrderParams, OrderType, Position, PositionAction,
    PositionMode, PositionSide, TradeType,
};
use crate::hyperliquid::user::models::{PositionSnapshot, WsFill, WsOrderUpdate};
use crate::hyperliquid::user::{UserStreamMessage, UserStreamSession};
use crate::hyperliquid::wire;

/// Connector name; the domain appends `"_testnet"` off mainnet.
pub const CONNECTOR_NAME: &str = "hyperliquid_perpetual";

// Bounded submit/cancel queue depth. Overflow fails the order rather than
// blocking the caller.
const SUBMIT_QUEUE_CAPACITY: usize = 256;

// Bounded wait for the venue order id before a cancel gives up.
const EXCHANGE_ID_WAIT: Duration = Duration::from_secs(2);
const EXCHANGE_ID_POLL: Duration = Duration::from_millis(100);

// Hyperliquid quotes most perpetuals with 5 price decimals.
const DEFAULT_PRICE_DECIMALS: u32 = 5;

// Fallback extreme prices for the market-order IOC mapping, used when the
// pair's rule carries no explicit price bounds.
const MARKET_BUY_PRICE_CEILING: f64 = 1_000_000.0;
const MARKET_SELL_PRICE_FLOOR: f64 = 0.01;

// Work items served by the submit/cancel worker task.
enum WorkerCommand {
    Submit {
        client_order_id: String,
    },
    Cancel {
        trading_pair: String,
        client_order_id: String,
        reply: oneshot::Sender<Result<bool>>,
    },
    Shutdown,
}

#[derive(Default)]
struct Listeners {
    order: RwLock<Option<Arc<dyn OrderEventListener>>>,
    trade: RwLock<Option<Arc<dyn TradeEventListener>>>,
    error: RwLock<Option<Arc<dyn ErrorEventListener>>>,
    balance: RwLock<Option<Arc<dyn BalanceEventListener>>>,
    position: RwLock<Option<Arc<dyn PositionEventListener>>>,
}

// State shared between the public handle, the worker task and the stream
// routing callback.
struct PerpetualInner {
    config: Config,
    signer: Arc<dyn SignL1Action>,
    http: HttpClient,
    tracker: ClientOrderTracker,
    trading_rules: RwLock<HashMap<String, TradingRule>>,
    coin_to_asset: RwLock<HashMap<String, u32>>,
    // Coins in asset-index order, for joining webData2 asset contexts.
    universe: RwLock<Vec<String>>,
    positions: RwLock<HashMap<String, Position>>,
    funding_rates: RwLock<HashMap<String, f64>>,
    mark_prices: RwLock<HashMap<String, f64>>,
    index_prices: RwLock<HashMap<String, f64>>,
    position_mode: RwLock<PositionMode>,
    listeners: Listeners,
    order_id_counter: AtomicU64,
    running: AtomicBool,
    submit_tx: Mutex<mpsc::Sender<WorkerCommand>>,
}

/// The Hyperliquid perpetual futures connector.
///
/// # Example
///
/// ```ignore
/// let config = Config::testnet(AccountCredentials::load_from_env());
/// let connector = HyperliquidPerpetual::new(config, signer)?;
/// connector.initialize().await?;
/// connector.start().await?;
///
/// let client_order_id = connector.buy(OrderParams::limit("ETH-USD", 0.1, 2500.0));
/// ```
///
pub struct HyperliquidPerpetual {
    inner: Arc<PerpetualInner>,
    market: MarketDataSession,
    user: UserStreamSession,
    worker_rx: Mutex<Option<mpsc::Receiver<WorkerCommand>>>,
    worker_handle: Mutex<Option<JoinHandle<()>>>,
}

impl HyperliquidPerpetual {
    /// Creates a connector from a configuration and an external signer.
    ///
    /// No network activity happens here; call
    /// [`initialize`](Connector::initialize) and [`start`](Connector::start)
    /// next.
    ///
    pub fn new(config: Config, signer: Arc<dyn SignL1Action>) -> Result<Self> {
        let http = HttpClient::new(config.clone())?;
        let market = MarketDataSession::new(config.ws_url());
        let user = UserStreamSession::new(config.ws_url(), config.credentials().address());
        let (submit_tx, worker_rx) = mpsc::channel(SUBMIT_QUEUE_CAPACITY);
        let inner = Arc::new(PerpetualInner {
            config,
            signer,
            http,
            tracker: ClientOrderTracker::new(),
            trading_rules: RwLock::new(HashMap::new()),
            coin_to_asset: RwLock::new(HashMap::new()),
            universe: RwLock::new(Vec::new()),
            positions: RwLock::new(HashMap::new()),
            funding_rates: RwLock::new(HashMap::new()),
            mark_prices: RwLock::new(HashMap::new()),
            index_prices: RwLock::new(HashMap::new()),
            position_mode: RwLock::new(PositionMode::OneWay),
            listeners: Listeners::default(),
            order_id_counter: AtomicU64::new(0),
            running: AtomicBool::new(false),
            submit_tx: Mutex::new(submit_tx),
        });
        Ok(Self {
            inner,
            market,
            user,
            worker_rx: Mutex::new(Some(worker_rx)),
            worker_handle: Mutex::new(None),
        })
    }

    // ===== [ Listener registration ] =====

    /// Registers the order lifecycle listener.
    pub fn set_order_event_listener(&self, listener: Arc<dyn OrderEventListener>) {
        *self.inner.listeners.order.write() = Some(listener);
    }

    /// Registers the per-fill listener.
    pub fn set_trade_event_listener(&self, listener: Arc<dyn TradeEventListener>) {
        *self.inner.listeners.trade.write() = Some(listener);
    }

    /// Registers the error listener.
    pub fn set_error_event_listener(&self, listener: Arc<dyn ErrorEventListener>) {
        *self.inner.listeners.error.write() = Some(listener);
    }

    /// Registers the balance listener.
    pub fn set_balance_event_listener(&self, listener: Arc<dyn BalanceEventListener>) {
        *self.inner.listeners.balance.write() = Some(listener);
    }

    /// Registers the position listener.
    pub fn set_position_event_listener(&self, listener: Arc<dyn PositionEventListener>) {
        *self.inner.listeners.position.write() = Some(listener);
    }

    // ===== [ Order and market data access ] =====

    /// The tracker's record for a client order id, when tracked.
    pub fn get_order(&self, client_order_id: &str) -> Option<InFlightOrder> {
        self.inner.tracker.get_order(client_order_id)
    }

    /// Snapshot of all non-terminal orders.
    pub fn get_open_orders(&self) -> Vec<InFlightOrder> {
        self.inner.tracker.all_fillable_orders()
    }

    /// The in-flight order tracker.
    pub fn order_tracker(&self) -> &ClientOrderTracker {
        &self.inner.tracker
    }

    /// The market-data session, for direct subscription management.
    pub fn market_data(&self) -> &MarketDataSession {
        &self.market
    }

    /// Subscribes the market-data session to a pair's book channel.
    pub fn subscribe_order_book(&self, trading_pair: &str) {
        self.market.subscribe(trading_pair);
    }

    /// Unsubscribes a pair's book channel.
    pub fn unsubscribe_order_book(&self, trading_pair: &str) {
        self.market.unsubscribe(trading_pair);
    }

    /// Registers the callback receiving decoded book messages.
    pub fn set_order_book_callback(&self, callback: OrderBookCallback) {
        self.market.set_message_callback(callback);
    }

    /// Fetches a full order book snapshot over REST.
    ///
    pub async fn order_book_snapshot(&self, trading_pair: &str) -> Result<OrderBook> {
        let pair = wire::normalize_trading_pair(trading_pair);
        let coin = wire::extract_coin(&pair).to_string();
        let info = Info::new(&self.inner.http);
        let snapshot = info.l2_book(&coin).await?;

        fn parse_levels(rows: &[L2Level]) -> Vec<(Decimal, Decimal)> {
            rows.iter()
                .filter_map(|row| {
                    let price = Decimal::from_str(&row.px).ok()?;
                    let size = Decimal::from_str(&row.sz).ok()?;
                    Some((price, size))
                })
                .collect()
        }

        let mut book = OrderBook::new(pair);
        book.apply_snapshot(parse_levels(snapshot.bids()), parse_levels(snapshot.asks()), 0);
        Ok(book)
    }

    /// Cancels an order by client order id alone, resolving the pair from
    /// the tracker.
    ///
    pub async fn cancel_by_id(&self, client_order_id: &str) -> Result<bool> {
        let order = self
            .inner
            .tracker
            .get_order(client_order_id)
            .ok_or_else(|| HalyardError::OrderNotFound(client_order_id.to_string()))?;
        self.cancel(&order.trading_pair, client_order_id).await
    }
}

#[async_trait]
impl Connector for HyperliquidPerpetual {
    fn name(&self) -> &str {
        CONNECTOR_NAME
    }

    fn domain(&self) -> String {
        if self.inner.config.is_mainnet() {
            CONNECTOR_NAME.to_string()
        } else {
            format!("{}_testnet", CONNECTOR_NAME)
        }
    }

    fn connector_type(&self) -> ConnectorType {
        ConnectorType::DerivativePerpetual
    }

    /// Loads trading rules and the asset index map from the venue metadata
    /// endpoint. Rules are immutable afterwards.
    ///
    async fn initialize(&self) -> Result<()> {
        let info = Info::new(&self.inner.http);
        let meta = info.meta().await?;

        let mut rules = HashMap::new();
        let mut coin_to_asset = HashMap::new();
        let mut universe = Vec::with_capacity(meta.universe.len());
        for (index, asset) in meta.universe.iter().enumerate() {
            let trading_pair = wire::coin_to_trading_pair(&asset.name);
            coin_to_asset.insert(asset.name.clone(), index as u32);
            universe.push(asset.name.clone());

            let rule = TradingRule {
                trading_pair: trading_pair.clone(),
                tick_size: 10f64.powi(-(DEFAULT_PRICE_DECIMALS as i32)),
                price_decimals: DEFAULT_PRICE_DECIMALS,
                step_size: 10f64.powi(-(asset.sz_decimals as i32)),
                size_decimals: asset.sz_decimals,
                // The venue enforces notional minimums dynamically and
                // reports violations as MinTradeNtlRejected.
                min_order_size: 0.0,
                max_order_size: 1_000_000.0,
                supports_post_only: true,
                supports_market_orders: true,
                supports_stop_orders: false,
                ..TradingRule::default()
            };
            debug!(
                pair = %trading_pair,
                tick = rule.tick_size,
                step = rule.step_size,
                "loaded trading rule"
            );
            rules.insert(trading_pair, rule);
        }

        info!(pairs = rules.len(), "fetched trading rules");
        *self.inner.trading_rules.write() = rules;
        *self.inner.coin_to_asset.write() = coin_to_asset;
        *self.inner.universe.write() = universe;
        Ok(())
    }

    /// Starts the sessions and the submit/cancel worker.
    ///
    async fn start(&self) -> Result<()> {
        if self.inner.running.swap(true, Ordering::SeqCst) {
            return Ok(());
        }
        let router = Arc::clone(&self.inner);
        self.user.set_message_callback(Arc::new(move |message| {
            router.handle_user_stream_message(message);
        }));

        let worker_rx = self.worker_rx.lock().take();
        let Some(worker_rx) = worker_rx else {
            self.inner.running.store(false, Ordering::SeqCst);
            return Err(HalyardError::Internal(
                "submit worker already consumed".to_string(),
            ));
        };
        *self.worker_handle.lock() = Some(tokio::spawn(run_worker(
            Arc::clone(&self.inner),
            worker_rx,
        )));

        self.market.start();
        self.user.start();
        info!("{} started", CONNECTOR_NAME);
        Ok(())
    }

    /// Stops the sessions and drains the worker. The connector can be
    /// started again afterwards.
    ///
    async fn stop(&self) {
        if !self.inner.running.swap(false, Ordering::SeqCst) {
            return;
        }
        self.market.stop().await;
        self.user.stop().await;

        let submit_tx = self.inner.submit_tx.lock().clone();
        let _ = submit_tx.send(WorkerCommand::Shutdown).await;
        let handle = self.worker_handle.lock().take();
        if let Some(handle) = handle {
            if let Err(e) = handle.await {
                error!("submit worker panicked: {}", e);
            }
        }

        // Re-arm the worker queue for a future start.
        let (submit_tx, worker_rx) = mpsc::channel(SUBMIT_QUEUE_CAPACITY);
        *self.inner.submit_tx.lock() = submit_tx;
        *self.worker_rx.lock() = Some(worker_rx);
        info!("{} stopped", CONNECTOR_NAME);
    }

    fn is_connected(&self) -> bool {
        self.user.is_connected()
    }

    fn is_ready(&self) -> bool {
        self.inner.running.load(Ordering::SeqCst)
            && self.market.is_connected()
            && self.user.is_connected()
            && !self.inner.trading_rules.read().is_empty()
    }

    fn buy(&self, params: OrderParams) -> String {
        self.inner.place_order(params, TradeType::Buy)
    }

    fn sell(&self, params: OrderParams) -> String {
        self.inner.place_order(params, TradeType::Sell)
    }

    /// Cancels an order through the worker queue.
    ///
    /// When the venue order id is not yet bound, the worker waits up to two
    /// seconds for the acknowledgement or the user stream to populate it
    /// before giving up with a timeout error.
    ///
    async fn cancel(&self, trading_pair: &str, client_order_id: &str) -> Result<bool> {
        let (reply, response) = oneshot::channel();
        let submit_tx = self.inner.submit_tx.lock().clone();
        submit_tx
            .send(WorkerCommand::Cancel {
                trading_pair: trading_pair.to_string(),
                client_order_id: client_order_id.to_string(),
                reply,
            })
            .await
            .map_err(|_| HalyardError::Internal("submit worker unavailable".to_string()))?;
        response
            .await
            .map_err(|_| HalyardError::Internal("cancel dropped by worker".to_string()))?
    }

    fn get_trading_rule(&self, trading_pair: &str) -> Option<TradingRule> {
        self.inner
            .trading_rules
            .read()
            .get(&wire::normalize_trading_pair(trading_pair))
            .cloned()
    }

    fn get_all_trading_rules(&self) -> Vec<TradingRule> {
        self.inner.trading_rules.read().values().cloned().collect()
    }
}

impl PerpetualConnector for HyperliquidPerpetual {
    fn get_position(&self, symbol: &str) -> Option<Position> {
        self.inner
            .positions
            .read()
            .get(&wire::normalize_trading_pair(symbol))
            .cloned()
    }

    fn get_all_positions(&self) -> Vec<Position> {
        self.inner.positions.read().values().cloned().collect()
    }

    fn get_funding_rate(&self, symbol: &str) -> Option<f64> {
        self.inner
            .funding_rates
            .read()
            .get(&wire::normalize_trading_pair(symbol))
            .copied()
    }

    fn get_mark_price(&self, symbol: &str) -> Option<f64> {
        self.inner
            .mark_prices
            .read()
            .get(&wire::normalize_trading_pair(symbol))
            .copied()
    }

    fn get_index_price(&self, symbol: &str) -> Option<f64> {
        self.inner
            .index_prices
            .read()
            .get(&wire::normalize_trading_pair(symbol))
            .copied()
    }

    fn get_position_mode(&self) -> PositionMode {
        *self.inner.position_mode.read()
    }

    fn set_position_mode(&self, mode: PositionMode) {
        *self.inner.position_mode.write() = mode;
    }
}

// The submit/cancel worker: one task draining the bounded queue, so wire
// interactions for placement and cancellation are serialized.
async fn run_worker(inner: Arc<PerpetualInner>, mut queue: mpsc::Receiver<WorkerCommand>) {
    while let Some(command) = queue.recv().await {
        match command {
            WorkerCommand::Submit { client_order_id } => {
                inner.place_order_and_process_update(&client_order_id).await;
            }
            WorkerCommand::Cancel {
                trading_pair,
                client_order_id,
                reply,
            } => {
                let result = inner.execute_cancel(&trading_pair, &client_order_id).await;
                let _ = reply.send(result);
            }
            WorkerCommand::Shutdown => break,
        }
    }
    debug!("submit worker stopped");
}

impl PerpetualInner {
    // `<prefix>-<epoch_millis>-<counter>`: unique within the process.
    fn next_client_order_id(&self) -> String {
        let counter = self.order_id_counter.fetch_add(1, Ordering::Relaxed);
        let millis = chrono::Utc::now().timestamp_millis().max(0);
        format!(
            "{}-{}-{}",
            self.config.client_order_id_prefix(),
            millis,
            counter
        )
    }

    // The non-blocking placement entry: generate id, quantize, insert into
    // the tracker FIRST, then hand off to the worker.
    fn place_order(&self, params: OrderParams, trade_type: TradeType) -> String {
        let client_order_id = self.next_client_order_id();
        let trading_pair = wire::normalize_trading_pair(&params.trading_pair);

        let rule = self.trading_rules.read().get(&trading_pair).cloned();
        let (price, amount) = match &rule {
            Some(rule) => (
                rule.quantize_price(params.price),
                rule.quantize_size(params.amount),
            ),
            None => (params.price, params.amount),
        };

        let mut order = InFlightOrder::new(
            client_order_id.clone(),
            trading_pair,
            params.order_type,
            trade_type,
            params.position_action,
            price,
            amount,
            current_timestamp_ns(),
        );

        let user_cloid = params.extra_params.get("cloid").cloned();
        let cloid_error = match &user_cloid {
            Some(cloid) if !wire::is_valid_cloid(cloid) => Some(format!(
                "invalid cloid `{}`: expected 0x followed by 32 hex characters",
                cloid
            )),
            _ => None,
        };
        order.cloid = Some(match user_cloid {
            Some(cloid) if cloid_error.is_none() => cloid,
            _ => wire::derive_cloid(&client_order_id),
        });

        // Tracking must exist before anything can fail or race: the user
        // stream resolves fills against it.
        if let Err(e) = self.tracker.start_tracking(order) {
            error!(%client_order_id, "failed to track order: {}", e);
            return client_order_id;
        }

        // Validation failures never touch the network.
        let validation_error = cloid_error.or_else(|| validate_order_params(&params));
        if let Some(reason) = validation_error {
            self.fail_order(&client_order_id, &reason);
            return client_order_id;
        }

        let enqueue = self.submit_tx.lock().try_send(WorkerCommand::Submit {
            client_order_id: client_order_id.clone(),
        });
        if enqueue.is_err() {
            warn!(%client_order_id, "submit queue full");
            self.fail_order(&client_order_id, "submit queue full");
        }

        client_order_id
    }

    // Marks an order failed and notifies listeners once.
    fn fail_order(&self, client_order_id: &str, reason: &str) {
        let update = OrderUpdate {
            client_order_id: client_order_id.to_string(),
            exchange_order_id: None,
            trading_pair: None,
            new_state: OrderState::Failed,
            update_timestamp: current_timestamp_ns(),
            reason: Some(reason.to_string()),
        };
        match self.tracker.process_order_update(&update) {
            Ok(outcome) if outcome.applied => {
                error!(%client_order_id, "order failed: {}", reason);
                self.emit_order_failed(client_order_id, reason);
            }
            Ok(_) => {}
            Err(e) => error!(%client_order_id, "could not mark order failed: {}", e),
        }
    }

    // The worker half of placement: rule checks, wire build, sign, POST,
    // and reconciliation of the synchronous acknowledgement.
    async fn place_order_and_process_update(&self, client_order_id: &str) {
        let Some(order) = self.tracker.get_order(client_order_id) else {
            error!(%client_order_id, "order missing from tracker");
            return;
        };
        if order.state.is_terminal() {
            return;
        }

        // A venue-bound order requires a loaded rule.
        let rule = self.trading_rules.read().get(&order.trading_pair).cloned();
        let Some(rule) = rule else {
            self.fail_order(
                client_order_id,
                &format!("no trading rule loaded for {}", order.trading_pair),
            );
            return;
        };

        let effective_price = effective_limit_price(&order, &rule);
        if let Err(reason) = rule.validate_order(effective_price, order.amount) {
            self.fail_order(client_order_id, &reason);
            return;
        }

        match self.execute_place_order(&order, &rule, effective_price).await {
            Ok((exchange_order_id, timestamp)) => {
                let ack = OrderUpdate {
                    client_order_id: client_order_id.to_string(),
                    exchange_order_id: Some(exchange_order_id.clone()),
                    trading_pair: Some(order.trading_pair.clone()),
                    new_state: OrderState::Open,
                    update_timestamp: timestamp,
                    reason: None,
                };
                if let Err(e) = self.tracker.process_order_update(&ack) {
                    error!(%client_order_id, "failed to apply ack: {}", e);
                }
                info!(%client_order_id, %exchange_order_id, "order created");
                self.emit_order_created(client_order_id, &exchange_order_id);
            }
            Err(e) => {
                let reason = match &e {
                    HalyardError::OrderRejected(raw) => {
                        let mapping = reasons::map_raw_reason(raw);
                        debug!(%client_order_id, code = %mapping.code, "venue rejection");
                        self.emit_error(&mapping.code.to_string(), &mapping.text);
                        mapping.text
                    }
                    other => other.to_string(),
                };
                self.fail_order(client_order_id, &reason);
            }
        }
    }

    // Builds, signs and POSTs the order action; parses the acknowledgement.
    async fn execute_place_order(
        &self,
        order: &InFlightOrder,
        rule: &TradingRule,
        effective_price: f64,
    ) -> Result<(String, u64)> {
        let coin = wire::extract_coin(&order.trading_pair);
        let asset = self
            .coin_to_asset
            .read()
            .get(coin)
            .copied()
            .ok_or_else(|| HalyardError::UnknownAsset(coin.to_string()))?;

        let tif = match order.order_type {
            OrderType::LimitMaker => Tif::Alo,
            OrderType::Market | OrderType::StopMarket => Tif::Ioc,
            OrderType::Limit | OrderType::StopLimit => Tif::Gtc,
        };

        // The venue bounds prices twice over: at most
        // `price_significant_digits` significant figures and at most
        // `price_decimals` decimal places.
        let capped_price =
            wire::round_to_significant_digits(effective_price, rule.price_significant_digits);
        let wire_order = WireOrder {
            asset,
            is_buy: order.trade_type.is_buy(),
            limit_px: wire::format_decimal(capped_price, rule.price_decimals),
            size: wire::format_decimal(order.amount, rule.size_decimals),
            reduce_only: order.position_action == PositionAction::Close,
            order_type: WireOrderType::limit(tif),
            cloid: order.cloid.clone(),
        };
        let action = OrderAction::new(vec![wire_order]);

        let exchange = Exchange::new(&self.http, self.signer.as_ref());
        let response = exchange.place_order(&action).await?;

        if !response.is_ok() {
            let message = response
                .rejection_message()
                .unwrap_or("exchange rejected the request")
                .to_string();
            return Err(HalyardError::OrderRejected(message));
        }
        let status = response
            .first_status()
            .ok_or_else(|| HalyardError::Internal("exchange response missing order status".into()))?;
        if let Some(raw) = status.error() {
            return Err(HalyardError::OrderRejected(raw.to_string()));
        }
        let oid = status
            .oid()
            .ok_or_else(|| HalyardError::Internal("unexpected order status".into()))?;

        Ok((oid.to_string(), current_timestamp_ns()))
    }

    // The worker half of cancellation, including the bounded wait for the
    // venue order id.
    async fn execute_cancel(&self, trading_pair: &str, client_order_id: &str) -> Result<bool> {
        let mut order = self
            .tracker
            .get_order(client_order_id)
            .ok_or_else(|| HalyardError::OrderNotFound(client_order_id.to_string()))?;

        if order.exchange_order_id.is_none() {
            warn!(%client_order_id, "exchange order id not bound yet, waiting");
            let polls = (EXCHANGE_ID_WAIT.as_millis() / EXCHANGE_ID_POLL.as_millis()) as u32;
            let mut bound = false;
            for _ in 0..polls {
                tokio::time::sleep(EXCHANGE_ID_POLL).await;
                if let Some(updated) = self.tracker.get_order(client_order_id) {
                    if updated.exchange_order_id.is_some() {
                        order = updated;
                        bound = true;
                        break;
                    }
                }
            }
            if !bound {
                return Err(HalyardError::Timeout(format!(
                    "order {} has no exchange order id",
                    client_order_id
                )));
            }
        }
        let Some(exchange_order_id) = order.exchange_order_id.clone() else {
            return Err(HalyardError::Internal("exchange order id vanished".into()));
        };

        let pair = if trading_pair.is_empty() {
            order.trading_pair.clone()
        } else {
            wire::normalize_trading_pair(trading_pair)
        };
        let coin = wire::extract_coin(&pair);
        let asset = self
            .coin_to_asset
            .read()
            .get(coin)
            .copied()
            .ok_or_else(|| HalyardError::UnknownAsset(coin.to_string()))?;
        let oid: u64 = exchange_order_id.parse().map_err(|_| {
            HalyardError::Internal(format!(
                "malformed exchange order id `{}`",
                exchange_order_id
            ))
        })?;

        let action = CancelAction::new(vec![WireCancel { asset, oid }]);
        let exchange = Exchange::new(&self.http, self.signer.as_ref());
        let response = exchange.cancel_order(&action).await?;

        let accepted = response.is_ok()
            && response
                .first_status()
                .map(|status| status.error().is_none())
                .unwrap_or(true);
        if !accepted {
            warn!(%client_order_id, "cancel rejected by venue");
            return Ok(false);
        }

        let update = OrderUpdate {
            client_order_id: client_order_id.to_string(),
            exchange_order_id: None,
            trading_pair: Some(pair),
            new_state: OrderState::PendingCancel,
            update_timestamp: current_timestamp_ns(),
            reason: None,
        };
        let _ = self.tracker.process_order_update(&update);
        info!(%client_order_id, %exchange_order_id, "cancel request accepted");
        Ok(true)
    }

    // ===== [ User stream routing ] =====

    // Runs on the user-stream session task; everything here is synchronous
    // and non-blocking.
    fn handle_user_stream_message(&self, message: UserStreamMessage) {
        match message {
            UserStreamMessage::Trade(fill) => self.process_stream_trade(fill),
            UserStreamMessage::OrderUpdate(update) => self.process_stream_order_update(update),
            UserStreamMessage::BalanceUpdate(balance) => {
                debug!(asset = %balance.asset, total = balance.total_balance, "balance update");
                self.emit_balance_update(
                    &balance.asset,
                    balance.available_balance,
                    balance.total_balance,
                );
            }
            UserStreamMessage::PositionUpdate(snapshot) => {
                self.apply_position_snapshot(snapshot)
            }
        }
    }

    // Resolves a fill to its tracked order (cloid first, venue id second),
    // applies it and emits fill/completion events.
    fn process_stream_trade(&self, fill: WsFill) {
        let order = fill
            .cloid
            .as_deref()
            .and_then(|cloid| self.tracker.get_order_by_cloid(cloid))
            .or_else(|| self.tracker.get_order_by_exchange_id(&fill.oid.to_string()));
        let Some(order) = order else {
            warn!(oid = fill.oid, tid = fill.tid, "fill for unknown order dropped");
            return;
        };

        // Backfill the venue id if the ack has not landed yet; binding
        // happens even when the state itself is unchanged.
        if order.exchange_order_id.is_none() {
            let bind = OrderUpdate {
                client_order_id: order.client_order_id.clone(),
                exchange_order_id: Some(fill.oid.to_string()),
                trading_pair: Some(order.trading_pair.clone()),
                new_state: order.state,
                update_timestamp: order.last_update_timestamp,
                reason: None,
            };
            let _ = self.tracker.process_order_update(&bind);
        }

        let liquidity = match fill.crossed {
            Some(true) => Liquidity::Taker,
            Some(false) => Liquidity::Maker,
            // A negative fee is a maker rebate.
            None if fill.fee_amount() < 0.0 => Liquidity::Maker,
            None => Liquidity::Taker,
        };
        let trade = TradeUpdate {
            trade_id: fill.tid.to_string(),
            client_order_id: order.client_order_id.clone(),
            exchange_order_id: fill.oid.to_string(),
            trading_pair: order.trading_pair.clone(),
            fill_price: fill.price(),
            fill_base_amount: fill.size(),
            fill_quote_amount: fill.price() * fill.size(),
            fee_amount: fill.fee_amount(),
            fee_currency: fill.fee_token.clone().unwrap_or_else(|| "USDC".to_string()),
            fill_timestamp: fill.time.saturating_mul(1_000_000),
            liquidity,
        };

        match self.tracker.process_trade_update(&trade) {
            Ok(outcome) => {
                if !outcome.applied {
                    return;
                }
                self.emit_order_filled(
                    &order.client_order_id,
                    trade.fill_price,
                    trade.fill_base_amount,
                );
                self.emit_trade(&trade);
                if outcome.new_state == OrderState::Filled
                    && outcome.previous_state != OrderState::Filled
                {
                    self.emit_order_completed(
                        &order.client_order_id,
                        outcome.average_fill_price,
                        outcome.filled_amount,
                    );
                }
            }
            Err(e) => warn!(tid = fill.tid, "failed to apply trade: {}", e),
        }
    }

    // Derives the target state from the venue status plus fill progress and
    // reconciles it into the tracker.
    fn process_stream_order_update(&self, update: WsOrderUpdate) {
        let order = update
            .order
            .cloid
            .as_deref()
            .and_then(|cloid| self.tracker.get_order_by_cloid(cloid))
            .or_else(|| {
                self.tracker
                    .get_order_by_exchange_id(&update.order.oid.to_string())
            });
        let Some(order) = order else {
            debug!(oid = update.order.oid, "order update for unknown order dropped");
            return;
        };

        let new_state = match update.status.as_str() {
            "filled" => OrderState::Filled,
            "canceled" | "cancelled" | "marginCanceled" => OrderState::Cancelled,
            "rejected" => OrderState::Failed,
            _ => {
                let orig = update.order.orig_size();
                let filled = update.order.filled_size();
                if filled > 0.0 && filled < orig {
                    OrderState::PartiallyFilled
                } else if orig > 0.0 && filled >= orig {
                    OrderState::Filled
                } else {
                    OrderState::Open
                }
            }
        };

        let timestamp = if update.status_timestamp > 0 {
            update.status_timestamp.saturating_mul(1_000_000)
        } else {
            current_timestamp_ns()
        };
        let tracker_update = OrderUpdate {
            client_order_id: order.client_order_id.clone(),
            exchange_order_id: Some(update.order.oid.to_string()),
            trading_pair: Some(order.trading_pair.clone()),
            new_state,
            update_timestamp: timestamp,
            reason: (new_state == OrderState::Failed).then(|| update.status.clone()),
        };

        match self.tracker.process_order_update(&tracker_update) {
            Ok(outcome) if outcome.applied => match new_state {
                OrderState::Filled => {
                    // Use the tracker's accumulated numbers, never the
                    // zeroed values on the raw event.
                    if let Some(record) = self.tracker.get_order(&order.client_order_id) {
                        self.emit_order_completed(
                            &record.client_order_id,
                            record.average_fill_price,
                            record.filled_amount,
                        );
                    }
                }
                OrderState::Cancelled => self.emit_order_cancelled(&order.client_order_id),
                OrderState::Failed => {
                    let mapping = reasons::map_raw_reason(&update.status);
                    self.emit_order_failed(&order.client_order_id, &mapping.text);
                }
                _ => {}
            },
            Ok(_) => {}
            Err(e) => warn!(oid = update.order.oid, "failed to apply order update: {}", e),
        }
    }

    // Replaces the position cache from a webData2 snapshot and refreshes the
    // funding/mark/index caches from the joined asset contexts.
    fn apply_position_snapshot(&self, snapshot: PositionSnapshot) {
        let universe = self.universe.read().clone();
        for (index, ctx) in snapshot.asset_ctxs.iter().enumerate() {
            let Some(coin) = universe.get(index) else {
                break;
            };
            let symbol = wire::coin_to_trading_pair(coin);
            if let Some(funding) = parse_opt(ctx.funding.as_deref()) {
                self.funding_rates.write().insert(symbol.clone(), funding);
            }
            if let Some(mark) = parse_opt(ctx.mark_px.as_deref()) {
                self.mark_prices.write().insert(symbol.clone(), mark);
            }
            if let Some(oracle) = parse_opt(ctx.oracle_px.as_deref()) {
                self.index_prices.write().insert(symbol, oracle);
            }
        }

        let mut positions = HashMap::new();
        for wrapper in &snapshot.asset_positions {
            let raw = &wrapper.position;
            let szi: f64 = raw.szi.parse().unwrap_or(0.0);
            if szi == 0.0 {
                continue;
            }
            let symbol = wire::coin_to_trading_pair(&raw.coin);
            let mark_price = self
                .mark_prices
                .read()
                .get(&symbol)
                .copied()
                .unwrap_or(0.0);
            let position = Position {
                symbol: symbol.clone(),
                side: if szi > 0.0 {
                    PositionSide::Long
                } else {
                    PositionSide::Short
                },
                size: szi.abs(),
                entry_price: parse_opt(raw.entry_px.as_deref()).unwrap_or(0.0),
                mark_price,
                liquidation_price: parse_opt(raw.liquidation_px.as_deref()).unwrap_or(0.0),
                unrealized_pnl: parse_opt(raw.unrealized_pnl.as_deref()).unwrap_or(0.0),
                realized_pnl: 0.0,
                leverage: raw.leverage.as_ref().map(|l| l.value).unwrap_or(1),
                margin: parse_opt(raw.margin_used.as_deref()).unwrap_or(0.0),
                timestamp: snapshot.timestamp,
                funding_fee: raw
                    .cum_funding
                    .as_ref()
                    .and_then(|f| parse_opt(f.since_open.as_deref())),
                position_id: None,
            };
            positions.insert(symbol, position);
        }

        for position in positions.values() {
            self.emit_position_update(position);
        }
        // A webData2 frame is a full account snapshot: positions absent
        // from it are closed.
        *self.positions.write() = positions;
    }

    // ===== [ Event emission ] =====

    fn emit_order_created(&self, client_order_id: &str, exchange_order_id: &str) {
        if let Some(listener) = self.listeners.order.read().as_ref() {
            listener.on_order_created(client_order_id, exchange_order_id);
        }
    }

    fn emit_order_filled(&self, client_order_id: &str, fill_price: f64, fill_amount: f64) {
        if let Some(listener) = self.listeners.order.read().as_ref() {
            listener.on_order_filled(client_order_id, fill_price, fill_amount);
        }
    }

    fn emit_order_completed(&self, client_order_id: &str, average_price: f64, total_filled: f64) {
        if let Some(listener) = self.listeners.order.read().as_ref() {
            listener.on_order_completed(client_order_id, average_price, total_filled);
        }
    }

    fn emit_order_cancelled(&self, client_order_id: &str) {
        if let Some(listener) = self.listeners.order.read().as_ref() {
            listener.on_order_cancelled(client_order_id);
        }
    }

    fn emit_order_failed(&self, client_order_id: &str, reason: &str) {
        if let Some(listener) = self.listeners.order.read().as_ref() {
            listener.on_order_failed(client_order_id, reason);
        }
    }

    fn emit_trade(&self, trade: &TradeUpdate) {
        if let Some(listener) = self.listeners.trade.read().as_ref() {
            listener.on_trade(
                &trade.client_order_id,
                &trade.trade_id,
                trade.fill_price,
                trade.fill_base_amount,
                &trade.fee_currency,
                trade.fee_amount,
            );
        }
    }

    fn emit_error(&self, error_code: &str, error_message: &str) {
        if let Some(listener) = self.listeners.error.read().as_ref() {
            listener.on_error(error_code, error_message);
        }
    }

    fn emit_balance_update(&self, asset: &str, available: f64, total: f64) {
        if let Some(listener) = self.listeners.balance.read().as_ref() {
            listener.on_balance_update(asset, available, total);
        }
    }

    fn emit_position_update(&self, position: &Position) {
        if let Some(listener) = self.listeners.position.read().as_ref() {
            listener.on_position_update(
                &position.symbol,
                position.side,
                position.size,
                position.entry_price,
                position.unrealized_pnl,
            );
        }
    }
}

// Market orders map to IOC with an extreme limit price to guarantee
// immediate matching; the bound comes from the rule when it has one.
fn effective_limit_price(order: &InFlightOrder, rule: &TradingRule) -> f64 {
    if order.order_type != OrderType::Market {
        return order.price;
    }
    if order.trade_type.is_buy() {
        if rule.max_price > 0.0 {
            rule.max_price
        } else {
            MARKET_BUY_PRICE_CEILING
        }
    } else if rule.min_price > 0.0 {
        rule.min_price
    } else {
        MARKET_SELL_PRICE_FLOOR
    }
}

// Basic parameter validation, applied after the order is tracked.
fn validate_order_params(params: &OrderParams) -> Option<String> {
    if params.trading_pair.trim().is_empty() {
        return Some("trading pair must not be empty".to_string());
    }
    if params.amount <= 0.0 {
        return Some(format!("order amount {} must be positive", params.amount));
    }
    let needs_price = matches!(
        params.order_type,
        OrderType::Limit | OrderType::LimitMaker | OrderType::StopLimit
    );
    if needs_price && params.price <= 0.0 {
        return Some(format!("limit price {} must be positive", params.price));
    }
    None
}

fn parse_opt(value: Option<&str>) -> Option<f64> {
    value.and_then(|v| v.parse().ok())
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::hyperliquid::connect::config::Config;
    use crate::hyperliquid::connect::credentials::AccountCredentials;
    use crate::hyperliquid::user::models::WsBasicOrder;
    use parking_lot::Mutex as PlMutex;
    use serde_json::json;

    struct EchoSigner;

    impl SignL1Action for EchoSigner {
        fn sign_l1_action(
            &self,
            action: &serde_json::Value,
            _is_mainnet: bool,
        ) -> Result<serde_json::Value> {
            Ok(json!({"action": action, "nonce": 1, "signature": {"r": "0x0", "s": "0x0", "v": 27}}))
        }
    }

    #[derive(Default)]
    struct RecordingListener {
        events: PlMutex<Vec<String>>,
    }

    impl RecordingListener {
        fn events(&self) -> Vec<String> {
            self.events.lock().clone()
        }
    }

    impl OrderEventListener for RecordingListener {
        fn on_order_created(&self, cid: &str, eid: &str) {
            self.events.lock().push(format!("created:{}:{}", cid, eid));
        }
        fn on_order_filled(&self, cid: &str, price: f64, amount: f64) {
            self.events
                .lock()
                .push(format!("filled:{}:{}:{}", cid, price, amount));
        }
        fn on_order_completed(&self, cid: &str, avg: f64, total: f64) {
            self.events
                .lock()
                .push(format!("completed:{}:{}:{}", cid, avg, total));
        }
        fn on_order_cancelled(&self, cid: &str) {
            self.events.lock().push(format!("cancelled:{}", cid));
        }
        fn on_order_failed(&self, cid: &str, reason: &str) {
            self.events.lock().push(format!("failed:{}:{}", cid, reason));
        }
    }

    fn test_config(api_base: &str) -> Config {
        Config::from_parts(
            api_base,
            "wss://example.invalid/ws",
            true,
            AccountCredentials::new("0xfeedface"),
        )
    }

    fn test_connector(api_base: &str) -> (HyperliquidPerpetual, Arc<RecordingListener>) {
        let connector =
            HyperliquidPerpetual::new(test_config(api_base), Arc::new(EchoSigner)).unwrap();
        let listener = Arc::new(RecordingListener::default());
        connector.set_order_event_listener(Arc::clone(&listener) as Arc<dyn OrderEventListener>);
        (connector, listener)
    }

    fn install_rule(connector: &HyperliquidPerpetual) {
        let rule = TradingRule {
            trading_pair: "ETH-USD".to_string(),
            tick_size: 0.01,
            price_decimals: 5,
            step_size: 0.001,
            size_decimals: 3,
            ..TradingRule::default()
        };
        connector
            .inner
            .trading_rules
            .write()
            .insert("ETH-USD".to_string(), rule);
        connector
            .inner
            .coin_to_asset
            .write()
            .insert("ETH".to_string(), 4);
        *connector.inner.universe.write() = vec!["ETH".to_string()];
    }

    fn stream_fill(cloid: &str, price: &str, size: &str, tid: u64) -> WsFill {
        let json = json!({
            "coin": "ETH", "px": price, "sz": size, "side": "B",
            "time": 1_718_000_000_000u64, "oid": 98765, "tid": tid,
            "fee": "-0.01", "feeToken": "USDC", "cloid": cloid
        });
        serde_json::from_value(json).unwrap()
    }

    #[test]
    fn test_client_order_id_format() {
        let (connector, _) = test_connector("https://example.invalid");
        let a = connector.inner.next_client_order_id();
        let b = connector.inner.next_client_order_id();
        assert_ne!(a, b);
        let parts: Vec<&str> = a.split('-').collect();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0], "hal");
        assert!(parts[1].parse::<u64>().is_ok());
        assert_eq!(parts[2], "0");
        assert!(b.ends_with("-1"));
    }

    #[test]
    fn test_buy_tracks_before_submit() {
        let (connector, _) = test_connector("https://example.invalid");
        install_rule(&connector);

        let cid = connector.buy(OrderParams::limit("ETH-USD", 0.12345, 2500.12678));
        let order = connector.get_order(&cid).unwrap();
        assert_eq!(order.state, OrderState::PendingCreate);
        assert_eq!(order.trade_type, TradeType::Buy);
        // quantized against the rule before tracking
        assert!((order.price - 2500.13).abs() < 1e-9);
        assert!((order.amount - 0.123).abs() < 1e-9);
        let cloid = order.cloid.unwrap();
        assert!(wire::is_valid_cloid(&cloid));
        assert_eq!(cloid, wire::derive_cloid(&cid));
    }

    #[test]
    fn test_invalid_params_fail_without_network() {
        let (connector, listener) = test_connector("https://example.invalid");
        install_rule(&connector);

        let cid = connector.buy(OrderParams::limit("ETH-USD", -1.0, 2500.0));
        let order = connector.get_order(&cid).unwrap();
        assert_eq!(order.state, OrderState::Failed);
        let events = listener.events();
        assert_eq!(events.len(), 1);
        assert!(events[0].starts_with(&format!("failed:{}", cid)));
    }

    #[test]
    fn test_invalid_cloid_is_rejected() {
        let (connector, listener) = test_connector("https://example.invalid");
        install_rule(&connector);

        let mut params = OrderParams::limit("ETH-USD", 0.1, 2500.0);
        params
            .extra_params
            .insert("cloid".to_string(), "0x123".to_string());
        let cid = connector.sell(params);
        assert_eq!(connector.get_order(&cid).unwrap().state, OrderState::Failed);
        assert!(listener.events()[0].contains("invalid cloid"));
    }

    #[test]
    fn test_user_supplied_cloid_is_kept() {
        let (connector, _) = test_connector("https://example.invalid");
        install_rule(&connector);

        let cloid = "0x0123456789abcdef0123456789abcdef";
        let mut params = OrderParams::limit("ETH-USD", 0.1, 2500.0);
        params.extra_params.insert("cloid".to_string(), cloid.to_string());
        let cid = connector.buy(params);
        assert_eq!(connector.get_order(&cid).unwrap().cloid.as_deref(), Some(cloid));
    }

    #[test]
    fn test_fill_before_ack_completes_order() {
        let (connector, listener) = test_connector("https://example.invalid");
        install_rule(&connector);

        let cid = connector.buy(OrderParams::limit("ETH-USD", 0.1, 2500.0));
        let cloid = connector.get_order(&cid).unwrap().cloid.unwrap();

        // the fill arrives before the POST response
        connector
            .inner
            .handle_user_stream_message(UserStreamMessage::Trade(stream_fill(
                &cloid, "2500.0", "0.1", 42,
            )));

        let order = connector.get_order(&cid).unwrap();
        assert_eq!(order.state, OrderState::Filled);
        assert_eq!(order.exchange_order_id.as_deref(), Some("98765"));
        assert!((order.average_fill_price - 2500.0).abs() < 1e-9);

        let events = listener.events();
        assert_eq!(events[0], format!("filled:{}:2500:0.1", cid));
        assert_eq!(events[1], format!("completed:{}:2500:0.1", cid));

        // the late ack is absorbed without regression and without a second
        // completion event
        let ack = OrderUpdate {
            client_order_id: cid.clone(),
            exchange_order_id: Some("98765".to_string()),
            trading_pair: None,
            new_state: OrderState::Open,
            update_timestamp: current_timestamp_ns(),
            reason: None,
        };
        let outcome = connector.inner.tracker.process_order_update(&ack).unwrap();
        assert!(!outcome.applied);
        assert_eq!(listener.events().len(), 2);

        // a duplicate of the same fill is a no-op
        connector
            .inner
            .handle_user_stream_message(UserStreamMessage::Trade(stream_fill(
                &cloid, "2500.0", "0.1", 42,
            )));
        assert_eq!(listener.events().len(), 2);
    }

    #[test]
    fn test_stream_order_update_derives_partial_state() {
        let (connector, _) = test_connector("https://example.invalid");
        install_rule(&connector);

        let cid = connector.buy(OrderParams::limit("ETH-USD", 0.1, 2500.0));
        let cloid = connector.get_order(&cid).unwrap().cloid.unwrap();

        let update = WsOrderUpdate {
            order: WsBasicOrder {
                coin: "ETH".to_string(),
                side: "B".to_string(),
                limit_px: "2500.0".to_string(),
                sz: "0.05".to_string(),
                oid: 98765,
                timestamp: 1_718_000_000_000,
                orig_sz: "0.1".to_string(),
                cloid: Some(cloid),
            },
            status: "open".to_string(),
            status_timestamp: 1_718_000_000_500,
        };
        connector
            .inner
            .handle_user_stream_message(UserStreamMessage::OrderUpdate(update));

        let order = connector.get_order(&cid).unwrap();
        assert_eq!(order.state, OrderState::PartiallyFilled);
        assert_eq!(order.exchange_order_id.as_deref(), Some("98765"));
    }

    #[test]
    fn test_cancelled_after_fill_is_suppressed() {
        let (connector, listener) = test_connector("https://example.invalid");
        install_rule(&connector);

        let cid = connector.buy(OrderParams::limit("ETH-USD", 0.1, 2500.0));
        let cloid = connector.get_order(&cid).unwrap().cloid.unwrap();
        connector
            .inner
            .handle_user_stream_message(UserStreamMessage::Trade(stream_fill(
                &cloid, "2500.0", "0.1", 7,
            )));

        let update = WsOrderUpdate {
            order: WsBasicOrder {
                coin: "ETH".to_string(),
                side: "B".to_string(),
                limit_px: "2500.0".to_string(),
                sz: "0.0".to_string(),
                oid: 98765,
                timestamp: 1_718_000_000_000,
                orig_sz: "0.1".to_string(),
                cloid: Some(cloid),
            },
            status: "canceled".to_string(),
            status_timestamp: 1_718_000_001_000,
        };
        connector
            .inner
            .handle_user_stream_message(UserStreamMessage::OrderUpdate(update));

        let events = listener.events();
        assert!(events.iter().all(|e| !e.starts_with("cancelled:")));
        assert_eq!(connector.get_order(&cid).unwrap().state, OrderState::Filled);
    }

    #[test]
    fn test_position_snapshot_updates_caches() {
        let (connector, _) = test_connector("https://example.invalid");
        install_rule(&connector);

        let frame = r#"{
            "channel": "webData2",
            "data": {
                "clearinghouseState": {
                    "marginSummary": {"accountValue": "10000"},
                    "withdrawable": "8000",
                    "assetPositions": [{
                        "position": {
                            "coin": "ETH", "szi": "-0.5", "entryPx": "2500.0",
                            "unrealizedPnl": "-12.5", "liquidationPx": "3100.0",
                            "marginUsed": "125.0", "leverage": {"type": "cross", "value": 10}
                        }
                    }]
                },
                "assetCtxs": [{"funding": "-0.0000042", "markPx": "2500.2", "oraclePx": "2500.1"}],
                "serverTime": 1718000000000
            }
        }"#;
        for message in crate::hyperliquid::user::client_decode_for_tests(frame) {
            connector.inner.handle_user_stream_message(message);
        }

        let position = connector.get_position("ETH-USD").unwrap();
        assert_eq!(position.side, PositionSide::Short);
        assert!((position.size - 0.5).abs() < 1e-12);
        assert_eq!(position.leverage, 10);
        assert!((position.mark_price - 2500.2).abs() < 1e-9);
        assert_eq!(connector.get_funding_rate("ETH-USD"), Some(-0.0000042));
        assert_eq!(connector.get_mark_price("ETH-USD"), Some(2500.2));
        assert_eq!(connector.get_index_price("ETH-USD"), Some(2500.1));

        // an empty follow-up snapshot closes the position
        let empty = r#"{
            "channel": "webData2",
            "data": {
                "clearinghouseState": {
                    "marginSummary": {"accountValue": "10000"},
                    "assetPositions": []
                },
                "assetCtxs": [],
                "serverTime": 1718000001000
            }
        }"#;
        for message in crate::hyperliquid::user::client_decode_for_tests(empty) {
            connector.inner.handle_user_stream_message(message);
        }
        assert!(connector.get_position("ETH-USD").is_none());
    }

    #[test]
    fn test_identity_and_domain() {
        let (connector, _) = test_connector("https://example.invalid");
        assert_eq!(connector.name(), "hyperliquid_perpetual");
        assert_eq!(connector.domain(), "hyperliquid_perpetual_testnet");
        assert_eq!(connector.connector_type(), ConnectorType::DerivativePerpetual);
        assert!(!connector.is_ready());
    }

    #[test]
    fn test_market_order_price_mapping() {
        let rule = TradingRule {
            trading_pair: "ETH-USD".to_string(),
            ..TradingRule::default()
        };
        let mut order = InFlightOrder::new(
            "c",
            "ETH-USD",
            OrderType::Market,
            TradeType::Buy,
            PositionAction::Nil,
            0.0,
            0.1,
            1,
        );
        assert_eq!(effective_limit_price(&order, &rule), MARKET_BUY_PRICE_CEILING);
        order.trade_type = TradeType::Sell;
        assert_eq!(effective_limit_price(&order, &rule), MARKET_SELL_PRICE_FLOOR);

        // rule-derived bounds take precedence over the literals
        let bounded = TradingRule {
            min_price: 0.5,
            max_price: 100_000.0,
            ..rule
        };
        order.trade_type = TradeType::Buy;
        assert_eq!(effective_limit_price(&order, &bounded), 100_000.0);
        order.trade_type = TradeType::Sell;
        assert_eq!(effective_limit_price(&order, &bounded), 0.5);

        order.order_type = OrderType::Limit;
        order.price = 2500.0;
        assert_eq!(effective_limit_price(&order, &bounded), 2500.0);
    }

    #[tokio::test]
    async fn test_initialize_loads_rules_from_meta() {
        let mut server = mockito::Server::new_async().await;
        let body = json!({
            "universe": [
                {"name": "BTC", "szDecimals": 5, "maxLeverage": 50},
                {"name": "ETH", "szDecimals": 4, "maxLeverage": 50}
            ]
        });
        let mock = server
            .mock("POST", "/info")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(body.to_string())
            .create_async()
            .await;

        let (connector, _) = test_connector(&server.url());
        connector.initialize().await.unwrap();
        mock.assert_async().await;

        let rule = connector.get_trading_rule("ETH-USD").unwrap();
        assert_eq!(rule.size_decimals, 4);
        assert_eq!(rule.price_decimals, 5);
        assert_eq!(connector.get_all_trading_rules().len(), 2);
        assert_eq!(
            connector.inner.coin_to_asset.read().get("ETH").copied(),
            Some(1)
        );
    }

    #[tokio::test]
    async fn test_placement_ack_opens_order() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/exchange")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                json!({
                    "status": "ok",
                    "response": {"type": "order", "data": {"statuses": [{"resting": {"oid": 98765}}]}}
                })
                .to_string(),
            )
            .create_async()
            .await;

        let (connector, listener) = test_connector(&server.url());
        install_rule(&connector);

        let cid = connector.buy(OrderParams::limit("ETH-USD", 0.1, 2500.0));
        connector.inner.place_order_and_process_update(&cid).await;
        mock.assert_async().await;

        let order = connector.get_order(&cid).unwrap();
        assert_eq!(order.state, OrderState::Open);
        assert_eq!(order.exchange_order_id.as_deref(), Some("98765"));
        assert_eq!(listener.events(), vec![format!("created:{}:98765", cid)]);
        assert_eq!(
            connector
                .order_tracker()
                .get_order_by_exchange_id("98765")
                .unwrap()
                .client_order_id,
            cid
        );
    }

    #[tokio::test]
    async fn test_wire_price_capped_to_significant_digits() {
        let mut server = mockito::Server::new_async().await;
        // The matcher pins the submitted price string: 60123.45 carries
        // seven significant digits and must go out as "60123".
        let mock = server
            .mock("POST", "/exchange")
            .match_body(mockito::Matcher::PartialJson(json!({
                "action": {"orders": [{"p": "60123", "s": "0.1"}]}
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                json!({
                    "status": "ok",
                    "response": {"type": "order", "data": {"statuses": [{"resting": {"oid": 5}}]}}
                })
                .to_string(),
            )
            .create_async()
            .await;

        let (connector, _) = test_connector(&server.url());
        install_rule(&connector);

        let cid = connector.buy(OrderParams::limit("ETH-USD", 0.1, 60123.45));
        // quantization keeps the tick-aligned price on the record
        assert!((connector.get_order(&cid).unwrap().price - 60123.45).abs() < 1e-9);

        connector.inner.place_order_and_process_update(&cid).await;
        mock.assert_async().await;
        assert_eq!(connector.get_order(&cid).unwrap().state, OrderState::Open);
    }

    #[tokio::test]
    async fn test_placement_rejection_maps_reason() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/exchange")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                json!({
                    "status": "ok",
                    "response": {"type": "order", "data": {"statuses": [{"error": "BadAloPxRejected"}]}}
                })
                .to_string(),
            )
            .create_async()
            .await;

        let (connector, listener) = test_connector(&server.url());
        install_rule(&connector);

        let mut params = OrderParams::limit("ETH-USD", 0.1, 2500.0);
        params.order_type = OrderType::LimitMaker;
        let cid = connector.buy(params);
        connector.inner.place_order_and_process_update(&cid).await;

        let order = connector.get_order(&cid).unwrap();
        assert_eq!(order.state, OrderState::Failed);
        assert_eq!(
            order.failure_reason.as_deref(),
            Some("Post-only would match immediately")
        );
        let events = listener.events();
        assert_eq!(events.len(), 1);
        assert!(events[0].contains("Post-only would match immediately"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_times_out_without_exchange_id() {
        let (connector, _) = test_connector("https://example.invalid");
        install_rule(&connector);

        let cid = connector.buy(OrderParams::limit("ETH-USD", 0.1, 2500.0));
        let result = connector.inner.execute_cancel("ETH-USD", &cid).await;
        assert!(matches!(result, Err(HalyardError::Timeout(_))));
        // the order itself is untouched by the failed cancel
        assert_eq!(
            connector.get_order(&cid).unwrap().state,
            OrderState::PendingCreate
        );
    }

    #[tokio::test]
    async fn test_cancel_accepted_marks_pending_cancel() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/exchange")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                json!({
                    "status": "ok",
                    "response": {"type": "cancel", "data": {"statuses": ["success"]}}
                })
                .to_string(),
            )
            .create_async()
            .await;

        let (connector, _) = test_connector(&server.url());
        install_rule(&connector);

        let cid = connector.buy(OrderParams::limit("ETH-USD", 0.1, 2500.0));
        let ack = OrderUpdate {
            client_order_id: cid.clone(),
            exchange_order_id: Some("98765".to_string()),
            trading_pair: None,
            new_state: OrderState::Open,
            update_timestamp: current_timestamp_ns(),
            reason: None,
        };
        connector.inner.tracker.process_order_update(&ack).unwrap();

        let accepted = connector.inner.execute_cancel("ETH-USD", &cid).await.unwrap();
        assert!(accepted);
        assert_eq!(
            connector.get_order(&cid).unwrap().state,
            OrderState::PendingCancel
        );
    }
}
