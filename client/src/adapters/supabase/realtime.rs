//! Supabase realtime adapter
//!
//! Speaks the Phoenix channel protocol (vsn 1.0.0, JSON objects) over a
//! websocket. Each subscription owns one connection and one channel task:
//! the task keeps the heartbeat going, turns `postgres_changes` frames into
//! [`ChangeEvent`]s and leaves the channel when asked to stop.

use std::collections::{HashMap, VecDeque};
use std::time::Duration;

use async_trait::async_trait;
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::net::TcpStream;
use tokio::sync::{mpsc, oneshot, Mutex};
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

use crate::domain::entities::{ChangeEvent, ChangeKind};
use crate::domain::ports::{ChangeStream, RealtimeFeed, SubscriptionId};
use crate::error::RealtimeError;

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;
type WsSink = SplitSink<WsStream, Message>;
type WsSource = SplitStream<WsStream>;

const PROTOCOL_VERSION: &str = "1.0.0";
const JOIN_REF: &str = "1";
const JOIN_TIMEOUT: Duration = Duration::from_secs(10);
const LEAVE_TIMEOUT: Duration = Duration::from_secs(5);
const EVENT_BUFFER: usize = 256;
const DEFAULT_HEARTBEAT: Duration = Duration::from_secs(25);

/// One frame of the Phoenix channel protocol
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhoenixMessage {
    pub topic: String,
    pub event: String,
    #[serde(default)]
    pub payload: Value,
    #[serde(rename = "ref", default)]
    pub reference: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub join_ref: Option<String>,
}

impl PhoenixMessage {
    fn to_frame(&self) -> Result<Message, RealtimeError> {
        serde_json::to_string(self)
            .map(Message::text)
            .map_err(|e| RealtimeError::Protocol(e.to_string()))
    }
}

/// Channel topic for a table
pub fn topic_for(table: &str) -> String {
    format!("realtime:{}", table)
}

/// Join request subscribing to every change on `public.{table}`
pub fn join_message(table: &str, access_token: &str) -> PhoenixMessage {
    PhoenixMessage {
        topic: topic_for(table),
        event: "phx_join".to_string(),
        payload: json!({
            "config": {
                "broadcast": { "self": false },
                "presence": { "key": "" },
                "postgres_changes": [
                    { "event": "*", "schema": "public", "table": table }
                ]
            },
            "access_token": access_token
        }),
        reference: Some(JOIN_REF.to_string()),
        join_ref: Some(JOIN_REF.to_string()),
    }
}

fn heartbeat_message(reference: u64) -> PhoenixMessage {
    PhoenixMessage {
        topic: "phoenix".to_string(),
        event: "heartbeat".to_string(),
        payload: json!({}),
        reference: Some(reference.to_string()),
        join_ref: None,
    }
}

fn leave_message(topic: &str, reference: u64) -> PhoenixMessage {
    PhoenixMessage {
        topic: topic.to_string(),
        event: "phx_leave".to_string(),
        payload: json!({}),
        reference: Some(reference.to_string()),
        join_ref: Some(JOIN_REF.to_string()),
    }
}

/// Turn a `postgres_changes` frame into a change event
pub fn decode_change(message: &PhoenixMessage) -> Option<ChangeEvent> {
    if message.event != "postgres_changes" {
        return None;
    }
    let data = message.payload.get("data")?;
    let kind = data.get("type")?.as_str()?;

    Some(ChangeEvent {
        event_type: ChangeKind::from(kind.to_string()),
        new: data.get("record").filter(|v| !v.is_null()).cloned(),
        old: data.get("old_record").filter(|v| !v.is_null()).cloned(),
    })
}

/// Outcome of a `phx_reply` to our join
fn join_status(message: &PhoenixMessage) -> Option<Result<(), RealtimeError>> {
    if message.event != "phx_reply" || message.reference.as_deref() != Some(JOIN_REF) {
        return None;
    }
    match message.payload.get("status").and_then(Value::as_str) {
        Some("ok") => Some(Ok(())),
        _ => Some(Err(RealtimeError::JoinRejected(
            message
                .payload
                .get("response")
                .map(Value::to_string)
                .unwrap_or_else(|| "no reason given".to_string()),
        ))),
    }
}

struct Channel {
    shutdown: oneshot::Sender<()>,
    task: JoinHandle<()>,
}

/// Realtime feed backed by Supabase's websocket endpoint
pub struct SupabaseRealtime {
    socket_url: String,
    access_token: String,
    heartbeat: Duration,
    channels: Mutex<HashMap<SubscriptionId, Channel>>,
}

impl SupabaseRealtime {
    /// A zero `heartbeat` falls back to the default interval
    pub fn new(base_url: &str, anon_key: &str, access_token: &str, heartbeat: Duration) -> Self {
        Self {
            socket_url: socket_url(base_url, anon_key),
            access_token: access_token.to_string(),
            heartbeat: if heartbeat.is_zero() {
                DEFAULT_HEARTBEAT
            } else {
                heartbeat
            },
            channels: Mutex::new(HashMap::new()),
        }
    }

    async fn join(
        &self,
        sink: &mut WsSink,
        source: &mut WsSource,
        table: &str,
    ) -> Result<(), RealtimeError> {
        sink.send(join_message(table, &self.access_token).to_frame()?)
            .await?;

        let wait = async {
            while let Some(frame) = source.next().await {
                if let Message::Text(text) = frame? {
                    let Ok(message) = serde_json::from_str::<PhoenixMessage>(text.as_str()) else {
                        continue;
                    };
                    if let Some(status) = join_status(&message) {
                        return status;
                    }
                }
            }
            Err::<(), RealtimeError>(RealtimeError::Closed)
        };

        tokio::time::timeout(JOIN_TIMEOUT, wait)
            .await
            .map_err(|_| RealtimeError::Protocol("timed out waiting for join reply".to_string()))?
    }
}

/// Websocket URL for a project URL
pub fn socket_url(base_url: &str, anon_key: &str) -> String {
    let base = base_url.trim_end_matches('/');
    let base = if let Some(rest) = base.strip_prefix("https://") {
        format!("wss://{}", rest)
    } else if let Some(rest) = base.strip_prefix("http://") {
        format!("ws://{}", rest)
    } else {
        base.to_string()
    };
    format!(
        "{}/realtime/v1/websocket?apikey={}&vsn={}",
        base,
        urlencoding::encode(anon_key),
        PROTOCOL_VERSION
    )
}

#[async_trait]
impl RealtimeFeed for SupabaseRealtime {
    async fn subscribe(&self, table: &str) -> Result<ChangeStream, RealtimeError> {
        tracing::debug!(table, "Connecting realtime socket");
        let (socket, _) = connect_async(self.socket_url.as_str()).await?;
        let (mut sink, mut source) = socket.split();

        self.join(&mut sink, &mut source, table).await?;

        let id = SubscriptionId::new();
        let (events_tx, events_rx) = mpsc::channel(EVENT_BUFFER);
        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        let task = tokio::spawn(run_channel(
            sink,
            source,
            topic_for(table),
            self.heartbeat,
            events_tx,
            shutdown_rx,
        ));

        self.channels.lock().await.insert(
            id,
            Channel {
                shutdown: shutdown_tx,
                task,
            },
        );
        tracing::info!(table, subscription = %id, "Joined realtime channel");

        Ok(ChangeStream {
            id,
            events: events_rx,
        })
    }

    async fn unsubscribe(&self, id: &SubscriptionId) -> Result<(), RealtimeError> {
        let Some(channel) = self.channels.lock().await.remove(id) else {
            return Ok(());
        };

        // The task may already be gone if the socket closed on its own
        let _ = channel.shutdown.send(());
        match tokio::time::timeout(LEAVE_TIMEOUT, channel.task).await {
            Ok(_) => Ok(()),
            Err(_) => Err(RealtimeError::Protocol(
                "timed out leaving channel".to_string(),
            )),
        }
    }
}

async fn run_channel(
    mut sink: WsSink,
    mut source: WsSource,
    topic: String,
    heartbeat: Duration,
    events: mpsc::Sender<ChangeEvent>,
    mut shutdown: oneshot::Receiver<()>,
) {
    let mut next_ref: u64 = 2;
    // Decoded events waiting for room in the queue; the socket keeps being
    // served (heartbeats included) while the consumer catches up
    let mut pending: VecDeque<ChangeEvent> = VecDeque::new();
    let mut ticker = tokio::time::interval(heartbeat);
    // The first tick completes immediately
    ticker.tick().await;

    loop {
        tokio::select! {
            _ = &mut shutdown => {
                let leave = leave_message(&topic, next_ref);
                if let Ok(frame) = leave.to_frame() {
                    let _ = sink.send(frame).await;
                }
                let _ = sink.close().await;
                tracing::debug!(%topic, "Left realtime channel");
                break;
            }
            _ = ticker.tick() => {
                let beat = heartbeat_message(next_ref);
                next_ref += 1;
                let sent = match beat.to_frame() {
                    Ok(frame) => sink.send(frame).await.map_err(RealtimeError::from),
                    Err(e) => Err(e),
                };
                if let Err(e) = sent {
                    tracing::warn!(%topic, "Heartbeat failed: {}", e);
                    break;
                }
            }
            permit = events.reserve(), if !pending.is_empty() => {
                let Ok(permit) = permit else {
                    // Nobody is listening any more
                    break;
                };
                if let Some(event) = pending.pop_front() {
                    permit.send(event);
                }
            }
            frame = source.next() => {
                match frame {
                    Some(Ok(Message::Text(text))) => {
                        let message = match serde_json::from_str::<PhoenixMessage>(text.as_str()) {
                            Ok(message) => message,
                            Err(e) => {
                                tracing::warn!(%topic, "Unreadable realtime frame: {}", e);
                                continue;
                            }
                        };
                        if message.topic != topic {
                            continue;
                        }
                        if matches!(message.event.as_str(), "phx_error" | "phx_close") {
                            tracing::warn!(%topic, event = %message.event, "Channel closed by server");
                            break;
                        }
                        if let Some(event) = decode_change(&message) {
                            pending.push_back(event);
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => {
                        tracing::info!(%topic, "Realtime socket closed");
                        break;
                    }
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        tracing::warn!(%topic, "Realtime socket error: {}", e);
                        break;
                    }
                }
            }
        }
    }
}
