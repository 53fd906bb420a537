use std::time::Duration;

use async_trait::async_trait;
use polyglot_core::{ReplySet, ThreadAnchor, ThreadMessage};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use thiserror::Error;

use crate::blocks::ModalView;

pub const SLACK_API_BASE: &str = "https://slack.com/api";

#[derive(Debug, Error)]
pub enum SlackApiError {
    #[error("slack request `{method}` failed: {source}")]
    Transport {
        method: &'static str,
        #[source]
        source: reqwest::Error,
    },
    #[error("slack `{method}` returned HTTP {status}")]
    Status { method: &'static str, status: u16 },
    #[error("slack `{method}` rejected the call: {error}")]
    Api { method: &'static str, error: String },
    #[error("slack `{method}` response could not be decoded: {message}")]
    Decode { method: &'static str, message: String },
}

/// Outbound chat message. `parse` is always `none` so translated text is
/// posted literally.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PostMessage {
    pub channel: String,
    pub text: String,
    pub parse: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thread_ts: Option<String>,
}

impl PostMessage {
    pub fn in_thread(
        channel: impl Into<String>,
        thread_ts: impl Into<String>,
        text: impl Into<String>,
    ) -> Self {
        Self {
            channel: channel.into(),
            text: text.into(),
            parse: "none",
            thread_ts: Some(thread_ts.into()),
        }
    }
}

#[async_trait]
pub trait SlackApi: Send + Sync {
    /// `conversations.replies` for the thread at `anchor`, anchor included.
    async fn conversation_replies(&self, anchor: &ThreadAnchor) -> Result<ReplySet, SlackApiError>;

    async fn post_message(&self, message: &PostMessage) -> Result<(), SlackApiError>;

    async fn user_real_name(&self, user_id: &str) -> Result<Option<String>, SlackApiError>;

    async fn open_view(&self, trigger_id: &str, view: &ModalView) -> Result<(), SlackApiError>;

    async fn update_view(&self, view_id: &str, view: &ModalView) -> Result<(), SlackApiError>;
}

pub struct HttpSlackApi {
    http: reqwest::Client,
    bot_token: SecretString,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct RepliesResponse {
    #[serde(default)]
    messages: Vec<ThreadMessage>,
}

#[derive(Debug, Deserialize)]
struct UserInfoResponse {
    user: Option<UserInfo>,
}

#[derive(Debug, Deserialize)]
struct UserInfo {
    #[serde(default)]
    real_name: Option<String>,
    #[serde(default)]
    profile: Option<UserProfile>,
}

#[derive(Debug, Deserialize)]
struct UserProfile {
    #[serde(default)]
    real_name: Option<String>,
}

impl HttpSlackApi {
    pub fn new(
        bot_token: SecretString,
        base_url: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, SlackApiError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|source| SlackApiError::Transport { method: "client.build", source })?;
        Ok(Self { http, bot_token, base_url: base_url.into().trim_end_matches('/').to_owned() })
    }

    async fn get(&self, method: &'static str, query: &[(&str, &str)]) -> Result<Value, SlackApiError> {
        let request = self
            .http
            .get(format!("{}/{method}", self.base_url))
            .bearer_auth(self.bot_token.expose_secret())
            .query(query);
        Self::send(method, request).await
    }

    async fn post(&self, method: &'static str, body: &Value) -> Result<Value, SlackApiError> {
        let request = self
            .http
            .post(format!("{}/{method}", self.base_url))
            .bearer_auth(self.bot_token.expose_secret())
            .json(body);
        Self::send(method, request).await
    }

    async fn send(
        method: &'static str,
        request: reqwest::RequestBuilder,
    ) -> Result<Value, SlackApiError> {
        let response =
            request.send().await.map_err(|source| SlackApiError::Transport { method, source })?;
        let status = response.status();
        if !status.is_success() {
            return Err(SlackApiError::Status { method, status: status.as_u16() });
        }

        let body: Value = response
            .json()
            .await
            .map_err(|error| SlackApiError::Decode { method, message: error.to_string() })?;
        check_ok(method, body)
    }
}

fn check_ok(method: &'static str, body: Value) -> Result<Value, SlackApiError> {
    if body.get("ok").and_then(Value::as_bool) == Some(true) {
        return Ok(body);
    }
    let error = body.get("error").and_then(Value::as_str).unwrap_or("unknown_error").to_owned();
    Err(SlackApiError::Api { method, error })
}

fn decode<T: serde::de::DeserializeOwned>(
    method: &'static str,
    body: Value,
) -> Result<T, SlackApiError> {
    serde_json::from_value(body)
        .map_err(|error| SlackApiError::Decode { method, message: error.to_string() })
}

#[async_trait]
impl SlackApi for HttpSlackApi {
    async fn conversation_replies(&self, anchor: &ThreadAnchor) -> Result<ReplySet, SlackApiError> {
        const METHOD: &str = "conversations.replies";
        let body = self
            .get(
                METHOD,
                &[("channel", anchor.channel.as_str()), ("ts", anchor.ts.as_str()), ("inclusive", "true")],
            )
            .await?;
        let replies: RepliesResponse = decode(METHOD, body)?;
        Ok(ReplySet::new(replies.messages))
    }

    async fn post_message(&self, message: &PostMessage) -> Result<(), SlackApiError> {
        let body = serde_json::to_value(message).map_err(|error| SlackApiError::Decode {
            method: "chat.postMessage",
            message: error.to_string(),
        })?;
        self.post("chat.postMessage", &body).await.map(|_| ())
    }

    async fn user_real_name(&self, user_id: &str) -> Result<Option<String>, SlackApiError> {
        const METHOD: &str = "users.info";
        let body = self.get(METHOD, &[("user", user_id)]).await?;
        let info: UserInfoResponse = decode(METHOD, body)?;
        Ok(info.user.and_then(|user| {
            user.real_name
                .or_else(|| user.profile.and_then(|profile| profile.real_name))
                .filter(|name| !name.trim().is_empty())
        }))
    }

    async fn open_view(&self, trigger_id: &str, view: &ModalView) -> Result<(), SlackApiError> {
        self.post("views.open", &json!({ "trigger_id": trigger_id, "view": view })).await.map(|_| ())
    }

    async fn update_view(&self, view_id: &str, view: &ModalView) -> Result<(), SlackApiError> {
        self.post("views.update", &json!({ "view_id": view_id, "view": view })).await.map(|_| ())
    }
}
