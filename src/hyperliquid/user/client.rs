//! Private user-stream WebSocket session.
//!
//! This module provides the [`UserStreamSession`]: a supervised WebSocket
//! consumer of per-account order, fill, balance and position events. On
//! every (re)connect the session re-authenticates by subscribing the
//! account's channels (`orderUpdates`, `userFills`, `webData2`), then
//! decodes inbound frames into [`UserStreamMessage`]s for the connector's
//! routing handler.
//!
use std::sync::Arc;

use futures_util::{SinkExt, StreamExt};
use parking_lot::{Mutex, RwLock};
use secrecy::{ExposeSecret, Secret};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_tungstenite::connect_async;
use tracing::{debug, error, info, warn};
use tungstenite::Message;

use crate::hyperliquid::error::Result;
use crate::hyperliquid::ticker::models::{SubscribeRequest, Subscription, WsEnvelope};
use crate::hyperliquid::ticker::{shutdown_requested, SessionState, RECONNECT_DELAY};
use crate::hyperliquid::types::current_timestamp_ns;
use crate::hyperliquid::user::models::{
    BalanceUpdate, PositionSnapshot, UserStreamMessage, WsFills, WsOrderUpdate, WsWebData2,
};

// Keep-alive cadence, matching the market-data session.
const PING_INTERVAL: std::time::Duration = std::time::Duration::from_secs(30);

/// Callback invoked for every decoded user-stream message.
///
/// Runs on the session task: implementations MUST be non-blocking.
///
pub type UserStreamCallback = Arc<dyn Fn(UserStreamMessage) + Send + Sync>;

/// A supervised private-stream WebSocket session.
///
pub struct UserStreamSession {
    ws_url: String,
    address: Secret<String>,
    state: Arc<RwLock<SessionState>>,
    callback: Arc<RwLock<Option<UserStreamCallback>>>,
    shutdown_tx: Mutex<watch::Sender<bool>>,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl UserStreamSession {
    /// Creates a session for the given WebSocket URL and account address.
    /// Nothing connects until [`start`](Self::start) is called.
    ///
    pub fn new<InS>(ws_url: InS, address: Secret<String>) -> Self
    where
        InS: Into<String>,
    {
        let (shutdown_tx, _) = watch::channel(false);
        Self {
            ws_url: ws_url.into(),
            address,
            state: Arc::new(RwLock::new(SessionState::Idle)),
            callback: Arc::new(RwLock::new(None)),
            shutdown_tx: Mutex::new(shutdown_tx),
            handle: Mutex::new(None),
        }
    }

    /// Registers the callback receiving decoded user-stream messages.
    ///
    pub fn set_message_callback(&self, callback: UserStreamCallback) {
        *self.callback.write() = Some(callback);
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
        let mut handle = self.handle.lock();
        if handle.is_some() {
            warn!("user stream session already started");
            return;
        }
        let shutdown_rx = self.shutdown_tx.lock().subscribe();
        let task = run_session(
            self.ws_url.clone(),
            self.address.expose_secret().clone(),
            Arc::clone(&self.state),
            Arc::clone(&self.callback),
            shutdown_rx,
        );
        *handle = Some(tokio::spawn(task));
    }

    /// Signals the session to stop and waits for the task to exit.
    ///
    pub async fn stop(&self) {
        let _ = self.shutdown_tx.lock().send(true);
        let handle = self.handle.lock().take();
        if let Some(handle) = handle {
            if let Err(e) = handle.await {
                error!("user stream session task panicked: {}", e);
            }
        }
        let (shutdown_tx, _) = watch::channel(false);
        *self.shutdown_tx.lock() = shutdown_tx;
        *self.state.write() = SessionState::Idle;
    }
}

// Builds the per-account subscription frames sent after every connect.
fn account_subscriptions(address: &str) -> Result<Vec<Message>> {
    let user = address.to_string();
    let channels = [
        Subscription::OrderUpdates { user: user.clone() },
        Subscription::UserFills { user: user.clone() },
        Subscription::WebData2 { user },
    ];
    channels
        .into_iter()
        .map(|subscription| SubscribeRequest::subscribe(subscription).to_message())
        .collect()
}

// The supervised connect/authenticate/stream loop.
async fn run_session(
    ws_url: String,
    address: String,
    state: Arc<RwLock<SessionState>>,
    callback: Arc<RwLock<Option<UserStreamCallback>>>,
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
                debug!(status = %response.status(), "user stream socket connected");
                set_state(SessionState::Subscribing);

                let mut send_failed = false;
                match account_subscriptions(&address) {
                    Ok(frames) => {
                        for frame in frames {
                            if let Err(e) = ws.send(frame).await {
                                error!("failed to subscribe account channel: {}", e);
                                send_failed = true;
                                break;
                            }
                        }
                    }
                    Err(e) => {
                        error!("failed to build account subscriptions: {}", e);
                        send_failed = true;
                    }
                }

                if !send_failed {
                    set_state(SessionState::Streaming);
                    info!("user stream session streaming");
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
                                        dispatch_frame(&text, &callback);
                                    }
                                    Some(Ok(Message::Ping(payload))) => {
                                        let _ = ws.send(Message::Pong(payload)).await;
                                    }
                                    Some(Ok(Message::Close(_))) | None => {
                                        warn!("user stream socket closed by peer");
                                        break;
                                    }
                                    Some(Ok(_)) => {}
                                    Some(Err(e)) => {
                                        error!("user stream read error: {}", e);
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
                error!("user stream connect failed: {}", e);
                set_state(SessionState::Faulted);
            }
        }

        if shutdown_requested(&shutdown_rx) {
            break;
        }
        set_state(SessionState::Backoff);
        info!("reconnecting user stream session in {:?}", RECONNECT_DELAY);
        tokio::time::sleep(RECONNECT_DELAY).await;
    }
    set_state(SessionState::Idle);
}

// Decodes a frame and pushes the resulting messages to the callback.
fn dispatch_frame(text: &str, callback: &Arc<RwLock<Option<UserStreamCallback>>>) {
    let messages = decode_frame(text);
    if messages.is_empty() {
        return;
    }
    if let Some(callback) = callback.read().as_ref() {
        for message in messages {
            callback(message);
        }
    }
}

// Decodes one inbound text frame into user-stream messages. Unknown or
// undecodable frames are logged and dropped, never fatal to the session.
pub(crate) fn decode_frame(text: &str) -> Vec<UserStreamMessage> {
    let envelope: WsEnvelope = match serde_json::from_str(text) {
        Ok(envelope) => envelope,
        Err(e) => {
            warn!("undecodable user frame dropped: {}", e);
            return Vec::new();
        }
    };
    match envelope.channel.as_str() {
        "orderUpdates" => match serde_json::from_value::<Vec<WsOrderUpdate>>(envelope.data) {
            Ok(updates) => updates.into_iter().map(UserStreamMessage::OrderUpdate).collect(),
            Err(e) => {
                warn!("undecodable orderUpdates payload dropped: {}", e);
                Vec::new()
            }
        },
        "userFills" => match serde_json::from_value::<WsFills>(envelope.data) {
            Ok(fills) => {
                if fills.is_snapshot {
                    // The post-(re)connect snapshot replays historical fills;
                    // live tracking must not double-apply them.
                    debug!(count = fills.fills.len(), "skipping fill snapshot");
                    return Vec::new();
                }
                fills.fills.into_iter().map(UserStreamMessage::Trade).collect()
            }
            Err(e) => {
                warn!("undecodable userFills payload dropped: {}", e);
                Vec::new()
            }
        },
        "webData2" => match serde_json::from_value::<WsWebData2>(envelope.data) {
            Ok(data) => decode_web_data(data),
            Err(e) => {
                warn!("undecodable webData2 payload dropped: {}", e);
                Vec::new()
            }
        },
        "subscriptionResponse" | "pong" => Vec::new(),
        other => {
            debug!(channel = %other, "unknown channel dropped");
            Vec::new()
        }
    }
}

// Splits a webData2 frame into balance and position messages.
fn decode_web_data(data: WsWebData2) -> Vec<UserStreamMessage> {
    let mut messages = Vec::new();
    let timestamp = if data.server_time > 0 {
        data.server_time.saturating_mul(1_000_000)
    } else {
        current_timestamp_ns()
    };

    if let Some(state) = data.clearinghouse_state {
        if let Some(summary) = &state.margin_summary {
            let total: f64 = summary.account_value.parse().unwrap_or(0.0);
            let available: f64 = state
                .withdrawable
                .as_deref()
                .and_then(|w| w.parse().ok())
                .unwrap_or(total);
            messages.push(UserStreamMessage::BalanceUpdate(BalanceUpdate {
                asset: "USDC".to_string(),
                available_balance: available,
                total_balance: total,
                timestamp,
            }));
        }
        messages.push(UserStreamMessage::PositionUpdate(PositionSnapshot {
            asset_positions: state.asset_positions,
            asset_ctxs: data.asset_ctxs,
            timestamp,
        }));
    }
    messages
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_decode_order_updates_frame() {
        let frame = r#"{
            "channel": "orderUpdates",
            "data": [{
                "order": {"coin": "ETH", "side": "B", "limitPx": "2500.0", "sz": "0.1",
                          "oid": 98765, "timestamp": 1, "origSz": "0.1"},
                "status": "open",
                "statusTimestamp": 2
            }]
        }"#;
        let messages = decode_frame(frame);
        assert_eq!(messages.len(), 1);
        match &messages[0] {
            UserStreamMessage::OrderUpdate(update) => {
                assert_eq!(update.order.oid, 98765);
                assert_eq!(update.status, "open");
            }
            other => panic!("unexpected message: {:?}", other),
        }
    }

    #[test]
    fn test_decode_fills_and_skip_snapshot() {
        let live = r#"{
            "channel": "userFills",
            "data": {"isSnapshot": false, "fills": [
                {"coin": "ETH", "px": "2500.0", "sz": "0.1", "side": "B",
                 "time": 1718000000000, "oid": 1, "tid": 42, "fee": "-0.01"}
            ]}
        }"#;
        let messages = decode_frame(live);
        assert_eq!(messages.len(), 1);
        assert!(matches!(messages[0], UserStreamMessage::Trade(_)));

        let snapshot = r#"{
            "channel": "userFills",
            "data": {"isSnapshot": true, "fills": [
                {"coin": "ETH", "px": "2500.0", "sz": "0.1", "side": "B",
                 "time": 1718000000000, "oid": 1, "tid": 42, "fee": "-0.01"}
            ]}
        }"#;
        assert!(decode_frame(snapshot).is_empty());
    }

    #[test]
    fn test_decode_web_data_splits_messages() {
        let frame = r#"{
            "channel": "webData2",
            "data": {
                "clearinghouseState": {
                    "marginSummary": {"accountValue": "10000"},
                    "withdrawable": "8000",
                    "assetPositions": [{"position": {"coin": "ETH", "szi": "0.5"}}]
                },
                "assetCtxs": [{"funding": "0.00001", "markPx": "2500.0", "oraclePx": "2499.9"}],
                "serverTime": 1718000000000
            }
        }"#;
        let messages = decode_frame(frame);
        assert_eq!(messages.len(), 2);
        match &messages[0] {
            UserStreamMessage::BalanceUpdate(balance) => {
                assert_eq!(balance.asset, "USDC");
                assert_eq!(balance.available_balance, 8000.0);
                assert_eq!(balance.total_balance, 10000.0);
            }
            other => panic!("unexpected message: {:?}", other),
        }
        match &messages[1] {
            UserStreamMessage::PositionUpdate(snapshot) => {
                assert_eq!(snapshot.asset_positions.len(), 1);
                assert_eq!(snapshot.asset_ctxs.len(), 1);
            }
            other => panic!("unexpected message: {:?}", other),
        }
    }

    #[test]
    fn test_unknown_frames_are_dropped() {
        assert!(decode_frame(r#"{"channel": "mystery", "data": 1}"#).is_empty());
        assert!(decode_frame("garbage").is_empty());
    }

    #[test]
    fn test_account_subscription_frames() {
        let frames = account_subscriptions("0xabc").unwrap();
        assert_eq!(frames.len(), 3);
        let texts: Vec<String> = frames
            .into_iter()
            .map(|m| match m {
                Message::Text(t) => t,
                other => panic!("unexpected frame: {:?}", other),
            })
            .collect();
        assert!(texts.iter().any(|t| t.contains("orderUpdates")));
        assert!(texts.iter().any(|t| t.contains("userFills")));
        assert!(texts.iter().any(|t| t.contains("webData2")));
        assert!(texts.iter().all(|t| t.contains("\"user\":\"0xabc\"")));
    }
}
