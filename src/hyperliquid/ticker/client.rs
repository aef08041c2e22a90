//! Market-data WebSocket session.
//!
//! This module provides the [`MarketDataSession`]: a supervised, persistent
//! WebSocket consumer of L2 book updates. The session owns its socket
//! exclusively; subscriptions live in a shared set that is replayed on every
//! (re)connect; transport failures trigger a fixed-delay reconnect while the
//! supervising flag holds; and a graceful stop closes the socket on the way
//! out.
//!
use std::sync::Arc;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use parking_lot::{Mutex, RwLock};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio_tungstenite::connect_async;
use tracing::{debug, error, info, warn};
use tungstenite::Message;

use crate::hyperliquid::connect::models::L2Book;
use crate::hyperliquid::ticker::models::{OrderBookMessage, OrderBookMessageType, WsEnvelope};
use crate::hyperliquid::ticker::stream::{l2_book_frame, SessionState, SubscriptionSet};
use crate::hyperliquid::wire;

/// Fixed delay between reconnect attempts.
pub const RECONNECT_DELAY: Duration = Duration::from_secs(5);

// Keep-alive cadence; the venue drops quiet connections.
const PING_INTERVAL: Duration = Duration::from_secs(30);

/// Callback invoked for every decoded order book message.
///
/// Runs on the session task: implementations MUST be non-blocking.
///
pub type OrderBookCallback = Arc<dyn Fn(OrderBookMessage) + Send + Sync>;

/// A supervised market-data WebSocket session.
///
/// # Example
///
/// ```ignore
/// let session = MarketDataSession::new("wss://api.hyperliquid.xyz/ws");
/// session.set_message_callback(Arc::new(|msg| info!("book: {}", msg.trading_pair)));
/// session.subscribe("BTC-USD");
/// session.start();
/// ```
///
pub struct MarketDataSession {
    ws_url: String,
    subscriptions: Arc<SubscriptionSet>,
    state: Arc<RwLock<SessionState>>,
    callback: Arc<RwLock<Option<OrderBookCallback>>>,
    command_tx: Mutex<mpsc::UnboundedSender<Message>>,
    command_rx: Mutex<Option<mpsc::UnboundedReceiver<Message>>>,
    shutdown_tx: Mutex<watch::Sender<bool>>,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl MarketDataSession {
    /// Creates a session for the given WebSocket URL. Nothing connects
    /// until [`start`](Self::start) is called.
    ///
    pub fn new<InS>(ws_url: InS) -> Self
    where
        InS: Into<String>,
    {
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (shutdown_tx, _) = watch::channel(false);
        Self {
            ws_url: ws_url.into(),
            subscriptions: Arc::new(SubscriptionSet::new()),
            state: Arc::new(RwLock::new(SessionState::Idle)),
            callback: Arc::new(RwLock::new(None)),
            command_tx: Mutex::new(command_tx),
            command_rx: Mutex::new(Some(command_rx)),
            shutdown_tx: Mutex::new(shutdown_tx),
            handle: Mutex::new(None),
        }
    }

    /// Registers the callback receiving decoded order book messages.
    ///
    pub fn set_message_callback(&self, callback: OrderBookCallback) {
        *self.callback.write() = Some(callback);
    }

    /// Subscribes a trading pair.
    ///
    /// Idempotent: a pair already in the set is a no-op. When the pair is
    /// new and the socket is up, a subscribe frame goes out immediately;
    /// otherwise the subscription is picked up by the replay on the next
    /// (re)connect.
    ///
    pub fn subscribe(&self, trading_pair: &str) {
        let pair = wire::normalize_trading_pair(trading_pair);
        if !self.subscriptions.insert(&pair) {
            return;
        }
        match l2_book_frame(&pair, true) {
            Ok(frame) => {
                let _ = self.command_tx.lock().send(frame);
            }
            Err(e) => error!(%pair, "failed to build subscribe frame: {}", e),
        }
    }

    /// Unsubscribes a trading pair. A pair not in the set is a no-op.
    ///
    pub fn unsubscribe(&self, trading_pair: &str) {
        let pair = wire::normalize_trading_pair(trading_pair);
        if !self.subscriptions.remove(&pair) {
            return;
        }
        match l2_book_frame(&pair, false) {
            Ok(frame) => {
                let _ = self.command_tx.lock().send(frame);
            }
            Err(e) => error!(%pair, "failed to build unsubscribe frame: {}", e),
        }
    }

    /// Snapshot of the subscribed pairs.
    pub fn subscriptions(&self) -> Vec<String> {
        self.subscriptions.snapshot()
    }

    /// Current session state.
    pub fn state(&self) -> SessionState {
        *self.state.read()
    }

    /// `true` while frames are being received.
    pub fn is_connected(&self) -> bool {
        self.state() == SessionState::Streaming
    }

    /// Spawns the supervised session task. Calling `start` on a running
    /// session is a no-op.
    ///
    pub fn start(&self) {
        let Some(command_rx) = self.command_rx.lock().take() else {
            warn!("market data session already started");
            return;
        };
        let shutdown_rx = self.shutdown_tx.lock().subscribe();
        let task = run_session(
            self.ws_url.clone(),
            Arc::clone(&self.subscriptions),
            Arc::clone(&self.state),
            Arc::clone(&self.callback),
            command_rx,
            shutdown_rx,
        );
        *self.handle.lock() = Some(tokio::spawn(task));
    }

    /// Signals the session to stop and waits for the task to exit. The
    /// session can be started again afterwards with an intact subscription
    /// set.
    ///
    pub async fn stop(&self) {
        let _ = self.shutdown_tx.lock().send(true);
        let handle = self.handle.lock().take();
        if let Some(handle) = handle {
            if let Err(e) = handle.await {
                error!("market data session task panicked: {}", e);
            }
        }
        // Re-arm for a future start.
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        *self.command_tx.lock() = command_tx;
        *self.command_rx.lock() = Some(command_rx);
        let (shutdown_tx, _) = watch::channel(false);
        *self.shutdown_tx.lock() = shutdown_tx;
        *self.state.write() = SessionState::Idle;
    }
}

// A dropped shutdown sender counts as a stop request: it means the owning
// session is gone and the task must release its socket.
pub(crate) fn shutdown_requested(shutdown_rx: &watch::Receiver<bool>) -> bool {
    *shutdown_rx.borrow() || shutdown_rx.has_changed().is_err()
}

// The supervised connect/subscribe/stream loop.
async fn run_session(
    ws_url: String,
    subscriptions: Arc<SubscriptionSet>,
    state: Arc<RwLock<SessionState>>,
    callback: Arc<RwLock<Option<OrderBookCallback>>>,
    mut command_rx: mpsc::UnboundedReceiver<Message>,
    mut shutdown_rx: watch::Receiver<bool>,
) {
    let set_state = |s: SessionState| *state.write() = s;

    loop {
        if shutdown_requested(&shutdown_rx) {
            break;
        }
        set_state(SessionState::Connecting);
        match connect_async(ws_url.as_str()).await {
            Ok((mut ws, response)) => {
                debug!(status = %response.status(), "market data socket connected");
                set_state(SessionState::Subscribing);

                // Drop frames queued while disconnected; the replay below
                // re-establishes the full set.
                while command_rx.try_recv().is_ok() {}

                let mut send_failed = false;
                match subscriptions.replay_frames() {
                    Ok(frames) => {
                        for frame in frames {
                            if let Err(e) = ws.send(frame).await {
                                error!("failed to replay subscription: {}", e);
                                send_failed = true;
                                break;
                            }
                        }
                    }
                    Err(e) => {
                        error!("failed to build replay frames: {}", e);
                        send_failed = true;
                    }
                }

                if !send_failed {
                    set_state(SessionState::Streaming);
                    info!(
                        pairs = subscriptions.len(),
                        "market data session streaming"
                    );
                    let mut ping = tokio::time::interval(PING_INTERVAL);
                    ping.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
                    ping.reset();

                    loop {
                        tokio::select! {
                            changed = shutdown_rx.changed() => {
                                if changed.is_err() || *shutdown_rx.borrow() {
                                    set_state(SessionState::Closing);
                                    let _ = ws.close(None).await;
                                    set_state(SessionState::Idle);
                                    return;
                                }
                            }
                            Some(frame) = command_rx.recv() => {
                                if let Err(e) = ws.send(frame).await {
                                    error!("failed to send frame: {}", e);
                                    break;
                                }
                            }
                            _ = ping.tick() => {
                                let keepalive = Message::Text(r#"{"method":"ping"}"#.to_string());
                                if let Err(e) = ws.send(keepalive).await {
                                    error!("keep-alive failed: {}", e);
                                    break;
                                }
                            }
                            frame = ws.next() => {
                                match frame {
                                    Some(Ok(Message::Text(text))) => {
                                        handle_frame(&text, &callback);
                                    }
                                    Some(Ok(Message::Ping(payload))) => {
                                        let _ = ws.send(Message::Pong(payload)).await;
                                    }
                                    Some(Ok(Message::Close(_))) | None => {
                                        warn!("market data socket closed by peer");
                                        break;
                                    }
                                    Some(Ok(_)) => {}
                                    Some(Err(e)) => {
                                        error!("market data read error: {}", e);
                                        break;
                                    }
                                }
                            }
                        }
                    }
                }
                set_state(SessionState::Faulted);
            }
            Err(e) => {
                error!("market data connect failed: {}", e);
                set_state(SessionState::Faulted);
            }
        }

        if shutdown_requested(&shutdown_rx) {
            break;
        }
        set_state(SessionState::Backoff);
        info!("reconnecting market data session in {:?}", RECONNECT_DELAY);
        tokio::time::sleep(RECONNECT_DELAY).await;
    }
    set_state(SessionState::Idle);
}

// Decodes one inbound text frame and dispatches it to the callback.
// Unknown frames are logged and dropped, never fatal to the session.
fn handle_frame(text: &str, callback: &Arc<RwLock<Option<OrderBookCallback>>>) {
    let envelope: WsEnvelope = match serde_json::from_str(text) {
        Ok(envelope) => envelope,
        Err(e) => {
            warn!("undecodable frame dropped: {}", e);
            return;
        }
    };
    match envelope.channel.as_str() {
        "l2Book" => match serde_json::from_value::<L2Book>(envelope.data) {
            Ok(book) => {
                let message = OrderBookMessage {
                    message_type: OrderBookMessageType::Snapshot,
                    trading_pair: wire::coin_to_trading_pair(&book.coin),
                    timestamp: book.time.saturating_mul(1_000_000),
                    book,
                };
                if let Some(callback) = callback.read().as_ref() {
                    callback(message);
                }
            }
            Err(e) => warn!("undecodable l2Book payload dropped: {}", e),
        },
        "subscriptionResponse" | "pong" => {
            debug!(channel = %envelope.channel, "control frame");
        }
        other => {
            debug!(channel = %other, "unknown channel dropped");
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_handle_frame_dispatches_l2_book() {
        let count = Arc::new(AtomicUsize::new(0));
        let callback: Arc<RwLock<Option<OrderBookCallback>>> = Arc::new(RwLock::new(None));
        {
            let count = Arc::clone(&count);
            *callback.write() = Some(Arc::new(move |msg: OrderBookMessage| {
                assert_eq!(msg.trading_pair, "BTC-USD");
                assert_eq!(msg.message_type, OrderBookMessageType::Snapshot);
                assert_eq!(msg.timestamp, 1_718_000_000_000 * 1_000_000);
                count.fetch_add(1, Ordering::SeqCst);
            }));
        }

        let frame = r#"{
            "channel": "l2Book",
            "data": {
                "coin": "BTC",
                "time": 1718000000000,
                "levels": [[{"px": "60000", "sz": "1.0", "n": 1}], [{"px": "60001", "sz": "2.0", "n": 1}]]
            }
        }"#;
        handle_frame(frame, &callback);
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_unknown_frames_are_dropped() {
        let callback: Arc<RwLock<Option<OrderBookCallback>>> = Arc::new(RwLock::new(Some(
            Arc::new(|_| panic!("callback must not fire for unknown channels")),
        )));
        handle_frame(r#"{"channel": "somethingElse", "data": {}}"#, &callback);
        handle_frame("not json at all", &callback);
    }

    #[tokio::test]
    async fn test_subscribe_is_idempotent_on_session() {
        let session = MarketDataSession::new("wss://example.invalid/ws");
        session.subscribe("BTC-USD");
        session.subscribe("btc/usd"); // normalizes to the same pair
        session.subscribe("ETH-USD");
        let mut pairs = session.subscriptions();
        pairs.sort();
        assert_eq!(pairs, vec!["BTC-USD".to_string(), "ETH-USD".to_string()]);

        session.unsubscribe("BTC-USD");
        session.unsubscribe("BTC-USD");
        assert_eq!(session.subscriptions(), vec!["ETH-USD".to_string()]);
        assert_eq!(session.state(), SessionState::Idle);
    }
}
