use serde::{Deserialize, Serialize};

/// First message of a thread, addressed by channel and timestamp.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ThreadAnchor {
    pub channel: String,
    pub ts: String,
}

impl ThreadAnchor {
    pub fn new(channel: impl Into<String>, ts: impl Into<String>) -> Self {
        Self { channel: channel.into(), ts: ts.into() }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThreadMessage {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    pub ts: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thread_ts: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bot_id: Option<String>,
}

impl ThreadMessage {
    /// Non-empty message text.
    pub fn text(&self) -> Option<&str> {
        self.text.as_deref().filter(|text| !text.is_empty())
    }

    /// Timestamp a reply to this message should be threaded under.
    pub fn reply_target(&self) -> &str {
        self.thread_ts.as_deref().unwrap_or(&self.ts)
    }
}

/// Ordered messages of one thread, anchor first. Fetched per event and
/// discarded afterwards.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplySet {
    #[serde(default)]
    pub messages: Vec<ThreadMessage>,
}

impl ReplySet {
    pub fn new(messages: Vec<ThreadMessage>) -> Self {
        Self { messages }
    }

    pub fn anchor(&self) -> Option<&ThreadMessage> {
        self.messages.first()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Exact-text duplicate check across every message in the thread.
    pub fn is_already_posted(&self, candidate: &str) -> bool {
        self.messages.iter().any(|message| message.text.as_deref() == Some(candidate))
    }
}
