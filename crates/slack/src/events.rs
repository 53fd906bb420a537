use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use polyglot_core::{ReactionAdded, ReactionItem};
use serde_json::Value;
use thiserror::Error;

use crate::api::SlackApiError;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SlackEnvelope {
    pub envelope_id: String,
    pub event: SlackEvent,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SlackEvent {
    ReactionAdded(ReactionAdded),
    Message(MessageEvent),
    Shortcut(ShortcutEvent),
    ViewSubmission(ViewSubmissionEvent),
    Unsupported { event_type: String },
}

impl SlackEvent {
    pub fn event_type(&self) -> SlackEventType {
        match self {
            Self::ReactionAdded(_) => SlackEventType::ReactionAdded,
            Self::Message(_) => SlackEventType::Message,
            Self::Shortcut(_) => SlackEventType::Shortcut,
            Self::ViewSubmission(_) => SlackEventType::ViewSubmission,
            Self::Unsupported { .. } => SlackEventType::Unsupported,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SlackEventType {
    ReactionAdded,
    Message,
    Shortcut,
    ViewSubmission,
    Unsupported,
}

/// A `message` event as delivered by the Events API. Everything is optional
/// because edits, joins and bot posts arrive through the same event type.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MessageEvent {
    pub channel: Option<String>,
    pub ts: Option<String>,
    pub user: Option<String>,
    pub text: Option<String>,
    pub subtype: Option<String>,
    pub bot_id: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ShortcutEvent {
    pub callback_id: String,
    pub trigger_id: String,
    pub user_id: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ViewSubmissionEvent {
    pub callback_id: String,
    pub view_id: String,
    pub user_id: Option<String>,
    pub private_metadata: Option<String>,
    pub source_text: Option<String>,
    pub selected_language: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EventContext {
    pub correlation_id: String,
}

impl Default for EventContext {
    fn default() -> Self {
        Self { correlation_id: "unknown-correlation-id".to_owned() }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum HandlerResult {
    Processed,
    Ignored,
}

#[derive(Debug, Error)]
pub enum EventHandlerError {
    #[error(transparent)]
    SlackApi(#[from] SlackApiError),
}

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error(transparent)]
    Handler(#[from] EventHandlerError),
}

#[async_trait]
pub trait EventHandler: Send + Sync {
    fn event_type(&self) -> SlackEventType;

    /// Payload returned to Slack with the envelope ack, e.g. a
    /// `response_action` for a view submission. Computed before `handle`.
    fn ack_payload(&self, _envelope: &SlackEnvelope) -> Option<Value> {
        None
    }

    async fn handle(
        &self,
        envelope: &SlackEnvelope,
        ctx: &EventContext,
    ) -> Result<HandlerResult, EventHandlerError>;
}

#[derive(Default)]
pub struct EventDispatcher {
    handlers: HashMap<SlackEventType, Arc<dyn EventHandler>>,
}

impl EventDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<H>(&mut self, handler: H)
    where
        H: EventHandler + 'static,
    {
        self.handlers.insert(handler.event_type(), Arc::new(handler));
    }

    pub async fn dispatch(
        &self,
        envelope: &SlackEnvelope,
        ctx: &EventContext,
    ) -> Result<HandlerResult, DispatchError> {
        let Some(handler) = self.handlers.get(&envelope.event.event_type()) else {
            return Ok(HandlerResult::Ignored);
        };

        handler.handle(envelope, ctx).await.map_err(DispatchError::from)
    }

    pub fn ack_payload(&self, envelope: &SlackEnvelope) -> Option<Value> {
        self.handlers.get(&envelope.event.event_type())?.ack_payload(envelope)
    }

    pub fn handler_count(&self) -> usize {
        self.handlers.len()
    }

    pub fn handles(&self, event_type: SlackEventType) -> bool {
        self.handlers.contains_key(&event_type)
    }
}

/// Turns one Socket Mode frame into an envelope. Frames without an
/// `envelope_id` (hello, disconnect) yield `None`.
pub fn parse_envelope(frame: &Value) -> Option<SlackEnvelope> {
    let envelope_id = str_field(frame, "envelope_id")?;
    let payload = frame.get("payload").unwrap_or(&Value::Null);
    let frame_type = frame.get("type").and_then(Value::as_str).unwrap_or_default();

    let event = match frame_type {
        "events_api" => parse_events_api(payload.get("event").unwrap_or(&Value::Null)),
        "interactive" => parse_interactive(payload),
        other => SlackEvent::Unsupported { event_type: other.to_owned() },
    };

    Some(SlackEnvelope { envelope_id, event })
}

fn parse_events_api(event: &Value) -> SlackEvent {
    match event.get("type").and_then(Value::as_str).unwrap_or_default() {
        "reaction_added" => {
            let item = event.get("item").unwrap_or(&Value::Null);
            SlackEvent::ReactionAdded(ReactionAdded {
                reaction: str_field(event, "reaction").unwrap_or_default(),
                user_id: str_field(event, "user"),
                item: ReactionItem {
                    item_type: str_field(item, "type").unwrap_or_default(),
                    channel: str_field(item, "channel"),
                    ts: str_field(item, "ts"),
                },
            })
        }
        "message" => SlackEvent::Message(MessageEvent {
            channel: str_field(event, "channel"),
            ts: str_field(event, "ts"),
            user: str_field(event, "user"),
            text: str_field(event, "text"),
            subtype: str_field(event, "subtype"),
            bot_id: str_field(event, "bot_id"),
        }),
        other => SlackEvent::Unsupported { event_type: other.to_owned() },
    }
}

fn parse_interactive(payload: &Value) -> SlackEvent {
    match payload.get("type").and_then(Value::as_str).unwrap_or_default() {
        "shortcut" | "message_action" => SlackEvent::Shortcut(ShortcutEvent {
            callback_id: str_field(payload, "callback_id").unwrap_or_default(),
            trigger_id: str_field(payload, "trigger_id").unwrap_or_default(),
            user_id: payload.get("user").and_then(|user| str_field(user, "id")),
        }),
        "view_submission" => {
            let view = payload.get("view").unwrap_or(&Value::Null);
            let values = view.pointer("/state/values").unwrap_or(&Value::Null);
            SlackEvent::ViewSubmission(ViewSubmissionEvent {
                callback_id: str_field(view, "callback_id").unwrap_or_default(),
                view_id: str_field(view, "id").unwrap_or_default(),
                user_id: payload.get("user").and_then(|user| str_field(user, "id")),
                private_metadata: str_field(view, "private_metadata").filter(|v| !v.is_empty()),
                source_text: values.pointer("/text/a/value").and_then(Value::as_str).map(str::to_owned),
                selected_language: values
                    .pointer("/lang/a/selected_option/value")
                    .and_then(Value::as_str)
                    .map(str::to_owned),
            })
        }
        other => SlackEvent::Unsupported { event_type: format!("interactive:{other}") },
    }
}

fn str_field(value: &Value, key: &str) -> Option<String> {
    value.get(key).and_then(Value::as_str).map(str::to_owned)
}
