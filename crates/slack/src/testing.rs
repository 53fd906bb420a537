use std::collections::{HashMap, VecDeque};

use async_trait::async_trait;
use polyglot_core::{Language, ReplySet, ThreadAnchor};
use polyglot_translate::{TranslationError, TranslationOutcome, Translator};
use tokio::sync::Mutex;

use crate::api::{PostMessage, SlackApi, SlackApiError};
use crate::blocks::ModalView;

#[derive(Debug, Default)]
pub struct RecordedCalls {
    pub replies_requests: Vec<ThreadAnchor>,
    pub posts: Vec<PostMessage>,
    pub user_lookups: Vec<String>,
    pub opened_views: Vec<(String, ModalView)>,
    pub updated_views: Vec<(String, ModalView)>,
}

/// In-memory Slack workspace: canned thread replies and user names, every
/// outbound call recorded.
#[derive(Default)]
pub struct FakeSlackApi {
    replies: HashMap<(String, String), ReplySet>,
    real_names: HashMap<String, String>,
    fail_replies: bool,
    calls: Mutex<RecordedCalls>,
}

impl FakeSlackApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_thread(mut self, anchor: ThreadAnchor, replies: ReplySet) -> Self {
        self.replies.insert((anchor.channel, anchor.ts), replies);
        self
    }

    pub fn with_real_name(mut self, user_id: &str, name: &str) -> Self {
        self.real_names.insert(user_id.to_owned(), name.to_owned());
        self
    }

    pub fn failing_replies(mut self) -> Self {
        self.fail_replies = true;
        self
    }

    pub async fn posts(&self) -> Vec<PostMessage> {
        self.calls.lock().await.posts.clone()
    }

    pub async fn replies_requests(&self) -> Vec<ThreadAnchor> {
        self.calls.lock().await.replies_requests.clone()
    }

    pub async fn user_lookups(&self) -> Vec<String> {
        self.calls.lock().await.user_lookups.clone()
    }

    pub async fn opened_views(&self) -> Vec<(String, ModalView)> {
        self.calls.lock().await.opened_views.clone()
    }

    pub async fn updated_views(&self) -> Vec<(String, ModalView)> {
        self.calls.lock().await.updated_views.clone()
    }
}

#[async_trait]
impl SlackApi for FakeSlackApi {
    async fn conversation_replies(&self, anchor: &ThreadAnchor) -> Result<ReplySet, SlackApiError> {
        self.calls.lock().await.replies_requests.push(anchor.clone());
        if self.fail_replies {
            return Err(SlackApiError::Api {
                method: "conversations.replies",
                error: "channel_not_found".to_owned(),
            });
        }
        Ok(self.replies.get(&(anchor.channel.clone(), anchor.ts.clone())).cloned().unwrap_or_default())
    }

    async fn post_message(&self, message: &PostMessage) -> Result<(), SlackApiError> {
        self.calls.lock().await.posts.push(message.clone());
        Ok(())
    }

    async fn user_real_name(&self, user_id: &str) -> Result<Option<String>, SlackApiError> {
        self.calls.lock().await.user_lookups.push(user_id.to_owned());
        Ok(self.real_names.get(user_id).cloned())
    }

    async fn open_view(&self, trigger_id: &str, view: &ModalView) -> Result<(), SlackApiError> {
        self.calls.lock().await.opened_views.push((trigger_id.to_owned(), view.clone()));
        Ok(())
    }

    async fn update_view(&self, view_id: &str, view: &ModalView) -> Result<(), SlackApiError> {
        self.calls.lock().await.updated_views.push((view_id.to_owned(), view.clone()));
        Ok(())
    }
}

pub enum ScriptedReply {
    Text(&'static str),
    /// Translation plus the source language the provider detected.
    Detected(&'static str, &'static str),
    Unavailable,
    Fail,
}

/// Translator fake answering from a script and recording each request.
#[derive(Default)]
pub struct ScriptedTranslator {
    replies: Mutex<VecDeque<ScriptedReply>>,
    requests: Mutex<Vec<(String, Language)>>,
}

impl ScriptedTranslator {
    pub fn new(replies: Vec<ScriptedReply>) -> Self {
        Self { replies: Mutex::new(replies.into()), requests: Mutex::new(Vec::new()) }
    }

    pub fn answering(text: &'static str) -> Self {
        Self::new(vec![ScriptedReply::Text(text)])
    }

    pub async fn requests(&self) -> Vec<(String, Language)> {
        self.requests.lock().await.clone()
    }
}

#[async_trait]
impl Translator for ScriptedTranslator {
    fn provider(&self) -> &'static str {
        "scripted"
    }

    async fn translate(
        &self,
        text: &str,
        target: Language,
    ) -> Result<TranslationOutcome, TranslationError> {
        self.requests.lock().await.push((text.to_owned(), target));
        match self.replies.lock().await.pop_front() {
            Some(ScriptedReply::Text(text)) => Ok(TranslationOutcome::translated(text)),
            Some(ScriptedReply::Detected(text, source)) => Ok(TranslationOutcome::Translated {
                text: text.to_owned(),
                detected_source: Some(source.to_owned()),
            }),
            Some(ScriptedReply::Unavailable) | None => {
                Ok(TranslationOutcome::unavailable("scripted unavailable"))
            }
            Some(ScriptedReply::Fail) => {
                Err(TranslationError::Status { status: 456, body: "quota exceeded".to_owned() })
            }
        }
    }
}
