use std::{any::Any, panic::AssertUnwindSafe, sync::Arc, time::Duration};

use async_trait::async_trait;
use futures_util::{
    stream::{SplitSink, SplitStream},
    FutureExt, SinkExt, StreamExt,
};
use secrecy::{ExposeSecret, SecretString};
use serde_json::{json, Value};
use thiserror::Error;
use tokio::{
    net::TcpStream,
    sync::Mutex,
    task::{JoinError, JoinSet},
};
use tokio_tungstenite::{tungstenite::Message, MaybeTlsStream, WebSocketStream};
use tracing::{debug, info, warn};

use crate::events::{parse_envelope, EventContext, EventDispatcher, SlackEnvelope, SlackEvent};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("transport failed to connect: {0}")]
    Connect(String),
    #[error("transport read failed: {0}")]
    Receive(String),
    #[error("transport ack failed: {0}")]
    Acknowledge(String),
    #[error("transport disconnect failed: {0}")]
    Disconnect(String),
    #[error("slack closed the socket: {0}")]
    Closed(String),
}

#[derive(Debug, Error)]
pub enum SocketError {
    #[error("socket mode gave up after {retries} reconnect attempts: {last_error}")]
    RetriesExhausted { retries: u32, last_error: TransportError },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReconnectPolicy {
    pub max_retries: u32,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self { max_retries: 5, base_delay_ms: 250, max_delay_ms: 5_000 }
    }
}

impl ReconnectPolicy {
    fn backoff(&self, attempt: u32) -> Duration {
        let exponent = attempt.min(16);
        let multiplier = 1_u64 << exponent;
        let delay_ms = self.base_delay_ms.saturating_mul(multiplier).min(self.max_delay_ms);
        Duration::from_millis(delay_ms)
    }
}

/// Source of Socket Mode envelopes. `next_envelope` returning `Ok(None)`
/// means the transport is finished for good; errors ask for a reconnect.
#[async_trait]
pub trait SocketTransport: Send + Sync {
    fn mode(&self) -> &'static str;
    async fn connect(&self) -> Result<(), TransportError>;
    async fn next_envelope(&self) -> Result<Option<SlackEnvelope>, TransportError>;
    /// Acks an envelope. `payload` rides along as the ack's `payload` field.
    async fn acknowledge(
        &self,
        envelope_id: &str,
        payload: Option<&Value>,
    ) -> Result<(), TransportError>;
    async fn disconnect(&self) -> Result<(), TransportError>;
}

#[derive(Default)]
pub struct NoopSocketTransport;

#[async_trait]
impl SocketTransport for NoopSocketTransport {
    fn mode(&self) -> &'static str {
        "noop"
    }

    async fn connect(&self) -> Result<(), TransportError> {
        Ok(())
    }

    async fn next_envelope(&self) -> Result<Option<SlackEnvelope>, TransportError> {
        Ok(None)
    }

    async fn acknowledge(
        &self,
        _envelope_id: &str,
        _payload: Option<&Value>,
    ) -> Result<(), TransportError> {
        Ok(())
    }

    async fn disconnect(&self) -> Result<(), TransportError> {
        Ok(())
    }
}

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Slack Socket Mode over a WebSocket opened through `apps.connections.open`.
pub struct WebSocketTransport {
    http: reqwest::Client,
    app_token: SecretString,
    api_base: String,
    writer: Mutex<Option<SplitSink<WsStream, Message>>>,
    reader: Mutex<Option<SplitStream<WsStream>>>,
}

#[derive(Debug, PartialEq, Eq)]
pub(crate) enum SocketFrame {
    Hello,
    Disconnect { reason: String },
    Envelope(SlackEnvelope),
    Ignored,
}

pub(crate) fn classify_frame(text: &str) -> SocketFrame {
    let Ok(frame) = serde_json::from_str::<Value>(text) else {
        return SocketFrame::Ignored;
    };
    match frame.get("type").and_then(Value::as_str) {
        Some("hello") => SocketFrame::Hello,
        Some("disconnect") => SocketFrame::Disconnect {
            reason: frame.get("reason").and_then(Value::as_str).unwrap_or("unknown").to_owned(),
        },
        _ => parse_envelope(&frame).map(SocketFrame::Envelope).unwrap_or(SocketFrame::Ignored),
    }
}

pub(crate) fn ack_frame(envelope_id: &str, payload: Option<&Value>) -> String {
    let mut frame = json!({ "envelope_id": envelope_id });
    if let Some(payload) = payload {
        frame["payload"] = payload.clone();
    }
    frame.to_string()
}

impl WebSocketTransport {
    pub fn new(app_token: SecretString, api_base: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            app_token,
            api_base: api_base.into().trim_end_matches('/').to_owned(),
            writer: Mutex::new(None),
            reader: Mutex::new(None),
        }
    }

    async fn socket_url(&self) -> Result<String, TransportError> {
        let response = self
            .http
            .post(format!("{}/apps.connections.open", self.api_base))
            .bearer_auth(self.app_token.expose_secret())
            .send()
            .await
            .map_err(|error| TransportError::Connect(error.to_string()))?;
        let body: Value =
            response.json().await.map_err(|error| TransportError::Connect(error.to_string()))?;

        if body.get("ok").and_then(Value::as_bool) != Some(true) {
            let error = body.get("error").and_then(Value::as_str).unwrap_or("unknown_error");
            return Err(TransportError::Connect(format!("apps.connections.open failed: {error}")));
        }
        body.get("url")
            .and_then(Value::as_str)
            .map(str::to_owned)
            .ok_or_else(|| TransportError::Connect("apps.connections.open returned no url".into()))
    }

    async fn send(&self, message: Message) -> Result<(), String> {
        let mut writer = self.writer.lock().await;
        let Some(sink) = writer.as_mut() else {
            return Err("socket is not connected".to_owned());
        };
        sink.send(message).await.map_err(|error| error.to_string())
    }
}

#[async_trait]
impl SocketTransport for WebSocketTransport {
    fn mode(&self) -> &'static str {
        "socket"
    }

    async fn connect(&self) -> Result<(), TransportError> {
        let url = self.socket_url().await?;
        let (stream, _) = tokio_tungstenite::connect_async(url.as_str())
            .await
            .map_err(|error| TransportError::Connect(error.to_string()))?;
        let (sink, source) = stream.split();
        *self.writer.lock().await = Some(sink);
        *self.reader.lock().await = Some(source);
        Ok(())
    }

    async fn next_envelope(&self) -> Result<Option<SlackEnvelope>, TransportError> {
        loop {
            let next = {
                let mut reader = self.reader.lock().await;
                let Some(source) = reader.as_mut() else {
                    return Err(TransportError::Receive("socket is not connected".to_owned()));
                };
                source.next().await
            };

            match next {
                Some(Ok(Message::Text(text))) => match classify_frame(&text) {
                    SocketFrame::Envelope(envelope) => return Ok(Some(envelope)),
                    SocketFrame::Hello => debug!("received socket mode hello"),
                    SocketFrame::Disconnect { reason } => {
                        return Err(TransportError::Closed(format!("disconnect requested: {reason}")));
                    }
                    SocketFrame::Ignored => debug!("ignoring unrecognized socket mode frame"),
                },
                Some(Ok(Message::Ping(payload))) => {
                    if let Err(error) = self.send(Message::Pong(payload)).await {
                        warn!(error = %error, "failed to answer socket ping");
                    }
                }
                Some(Ok(Message::Close(frame))) => {
                    let reason = frame.map(|frame| frame.reason.to_string()).unwrap_or_default();
                    return Err(TransportError::Closed(reason));
                }
                Some(Ok(_)) => {}
                Some(Err(error)) => return Err(TransportError::Receive(error.to_string())),
                None => return Err(TransportError::Closed("stream ended".to_owned())),
            }
        }
    }

    async fn acknowledge(
        &self,
        envelope_id: &str,
        payload: Option<&Value>,
    ) -> Result<(), TransportError> {
        let ack = ack_frame(envelope_id, payload);
        self.send(Message::Text(ack)).await.map_err(TransportError::Acknowledge)
    }

    async fn disconnect(&self) -> Result<(), TransportError> {
        self.reader.lock().await.take();
        let Some(mut sink) = self.writer.lock().await.take() else {
            return Ok(());
        };
        sink.close().await.map_err(|error| TransportError::Disconnect(error.to_string()))
    }
}

pub struct SocketModeRunner {
    transport: Arc<dyn SocketTransport>,
    dispatcher: Arc<EventDispatcher>,
    reconnect_policy: ReconnectPolicy,
    in_flight: Mutex<JoinSet<()>>,
}

impl SocketModeRunner {
    pub fn new(
        transport: Arc<dyn SocketTransport>,
        dispatcher: Arc<EventDispatcher>,
        reconnect_policy: ReconnectPolicy,
    ) -> Self {
        Self { transport, dispatcher, reconnect_policy, in_flight: Mutex::new(JoinSet::new()) }
    }

    pub fn transport_mode(&self) -> &'static str {
        self.transport.mode()
    }

    /// Closes the transport, then waits for events that are still being
    /// handled. Tasks survive `start` being dropped until this runs.
    pub async fn shutdown(&self) -> Result<(), TransportError> {
        let disconnected = self.transport.disconnect().await;
        self.drain_in_flight().await;
        disconnected
    }

    /// Pumps envelopes until the transport finishes. Each envelope is
    /// acknowledged, then handled on its own task. The retry budget resets
    /// whenever a connection succeeds.
    pub async fn start(&self) -> Result<(), SocketError> {
        let mut attempt = 0_u32;

        let result = loop {
            match self.connect_and_pump(&mut attempt).await {
                Ok(()) => break Ok(()),
                Err(transport_error) => {
                    warn!(
                        attempt,
                        max_retries = self.reconnect_policy.max_retries,
                        error = %transport_error,
                        "socket mode transport failed"
                    );

                    if attempt >= self.reconnect_policy.max_retries {
                        break Err(SocketError::RetriesExhausted {
                            retries: self.reconnect_policy.max_retries,
                            last_error: transport_error,
                        });
                    }

                    let delay = self.reconnect_policy.backoff(attempt);
                    if !delay.is_zero() {
                        tokio::time::sleep(delay).await;
                    }
                    attempt += 1;
                }
            }
        };

        self.drain_in_flight().await;
        result
    }

    async fn drain_in_flight(&self) {
        let mut in_flight = std::mem::take(&mut *self.in_flight.lock().await);
        if !in_flight.is_empty() {
            info!(
                event_name = "ingress.slack.draining",
                correlation_id = "socket-runner",
                tasks = in_flight.len(),
                "waiting for in-flight slack events"
            );
        }
        while let Some(joined) = in_flight.join_next().await {
            log_join_error(joined);
        }
    }

    async fn reap_finished(&self) {
        let mut in_flight = self.in_flight.lock().await;
        while let Some(joined) = in_flight.try_join_next() {
            log_join_error(joined);
        }
    }

    async fn connect_and_pump(&self, attempt: &mut u32) -> Result<(), TransportError> {
        info!(attempt = *attempt, "opening socket mode transport connection");
        self.transport.connect().await?;
        info!(attempt = *attempt, "socket mode transport connected");
        *attempt = 0;

        loop {
            self.reap_finished().await;

            let Some(envelope) = self.transport.next_envelope().await? else {
                info!("socket mode transport stream closed");
                self.transport.disconnect().await?;
                return Ok(());
            };
            let (channel_id, thread_ts) = correlation_fields(&envelope);

            info!(
                event_name = "ingress.slack.envelope_received",
                envelope_id = %envelope.envelope_id,
                event_type = ?envelope.event.event_type(),
                correlation_id = %envelope.envelope_id,
                channel_id = channel_id.unwrap_or("unknown"),
                thread_ts = thread_ts.unwrap_or("unknown"),
                "received slack envelope"
            );

            let ack_payload = self.dispatcher.ack_payload(&envelope);
            if let Err(error) =
                self.transport.acknowledge(&envelope.envelope_id, ack_payload.as_ref()).await
            {
                warn!(
                    event_name = "ingress.slack.ack_sent",
                    envelope_id = %envelope.envelope_id,
                    correlation_id = %envelope.envelope_id,
                    error = %error,
                    "failed to acknowledge slack envelope"
                );
            } else {
                debug!(
                    event_name = "ingress.slack.ack_sent",
                    envelope_id = %envelope.envelope_id,
                    correlation_id = %envelope.envelope_id,
                    with_payload = ack_payload.is_some(),
                    "acknowledged slack envelope"
                );
            }

            let dispatcher = Arc::clone(&self.dispatcher);
            self.in_flight.lock().await.spawn(async move {
                let context = EventContext { correlation_id: envelope.envelope_id.clone() };
                let dispatched =
                    AssertUnwindSafe(dispatcher.dispatch(&envelope, &context)).catch_unwind().await;
                match dispatched {
                    Ok(Ok(_)) => {}
                    Ok(Err(error)) => warn!(
                        event_name = "ingress.slack.dispatch_failed",
                        envelope_id = %envelope.envelope_id,
                        correlation_id = %envelope.envelope_id,
                        error = %error,
                        "event dispatch failed; continuing socket loop"
                    ),
                    Err(panic) => warn!(
                        event_name = "ingress.slack.handler_panicked",
                        envelope_id = %envelope.envelope_id,
                        correlation_id = %envelope.envelope_id,
                        panic = panic_message(panic.as_ref()),
                        "event handler panicked; continuing socket loop"
                    ),
                }
            });
        }
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> &str {
    panic
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| panic.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("unknown panic")
}

fn log_join_error(joined: Result<(), JoinError>) {
    if let Err(error) = joined {
        warn!(
            event_name = "ingress.slack.task_failed",
            correlation_id = "socket-runner",
            cancelled = error.is_cancelled(),
            error = %error,
            "slack event task did not complete"
        );
    }
}

fn correlation_fields(envelope: &SlackEnvelope) -> (Option<&str>, Option<&str>) {
    match &envelope.event {
        SlackEvent::ReactionAdded(event) => (event.item.channel.as_deref(), event.item.ts.as_deref()),
        SlackEvent::Message(message) => (message.channel.as_deref(), message.ts.as_deref()),
        SlackEvent::Shortcut(_) | SlackEvent::ViewSubmission(_) | SlackEvent::Unsupported { .. } => {
            (None, None)
        }
    }
}
