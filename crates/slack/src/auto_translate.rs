use std::sync::Arc;

use async_trait::async_trait;
use polyglot_core::{Language, LanguagePair};
use polyglot_translate::{TranslationOutcome, Translator};
use tracing::{debug, info, warn};

use crate::api::{PostMessage, SlackApi, SlackApiError};
use crate::events::{
    EventContext, EventHandler, EventHandlerError, HandlerResult, MessageEvent, SlackEnvelope,
    SlackEvent, SlackEventType,
};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AutoTranslateOutcome {
    /// Edits, bot posts, empty text or messages without an address.
    Ignored,
    Undetermined,
    Unavailable,
    Posted { target: Language },
}

/// Translates every plain user message between the two languages of a pair
/// and answers in the message's thread as `"<real name>: <translation>"`.
pub struct AutoTranslator {
    slack: Arc<dyn SlackApi>,
    translator: Arc<dyn Translator>,
    pair: LanguagePair,
}

impl AutoTranslator {
    pub fn new(
        slack: Arc<dyn SlackApi>,
        translator: Arc<dyn Translator>,
        pair: LanguagePair,
    ) -> Self {
        Self { slack, translator, pair }
    }

    pub async fn translate_message(
        &self,
        message: &MessageEvent,
        ctx: &EventContext,
    ) -> Result<AutoTranslateOutcome, SlackApiError> {
        let (Some(channel), Some(ts)) = (message.channel.as_deref(), message.ts.as_deref()) else {
            return Ok(AutoTranslateOutcome::Ignored);
        };
        if message.subtype.is_some() || message.bot_id.is_some() {
            return Ok(AutoTranslateOutcome::Ignored);
        }
        let Some(text) = message.text.as_deref().filter(|text| !text.trim().is_empty()) else {
            return Ok(AutoTranslateOutcome::Ignored);
        };

        let Some(target) = self.pair.detect(text).and_then(|source| self.pair.counterpart(source))
        else {
            debug!(
                event_name = "auto_translate.undetermined",
                correlation_id = %ctx.correlation_id,
                channel_id = channel,
                "source language undetermined"
            );
            return Ok(AutoTranslateOutcome::Undetermined);
        };

        let translated = match self.translator.translate(text, target).await {
            Ok(TranslationOutcome::Translated { text, .. }) => text,
            Ok(TranslationOutcome::Unavailable { reason }) => {
                warn!(
                    event_name = "auto_translate.unavailable",
                    correlation_id = %ctx.correlation_id,
                    target_lang = target.code(),
                    reason = %reason,
                    "translation unavailable"
                );
                return Ok(AutoTranslateOutcome::Unavailable);
            }
            Err(error) => {
                warn!(
                    event_name = "auto_translate.failed",
                    correlation_id = %ctx.correlation_id,
                    target_lang = target.code(),
                    error = %error,
                    "translation request failed"
                );
                return Ok(AutoTranslateOutcome::Unavailable);
            }
        };

        let real_name = match message.user.as_deref() {
            Some(user_id) => self.slack.user_real_name(user_id).await?,
            None => None,
        };
        let text = match real_name {
            Some(name) => format!("{name}: {translated}"),
            None => translated,
        };

        self.slack.post_message(&PostMessage::in_thread(channel, ts, text)).await?;
        info!(
            event_name = "auto_translate.posted",
            correlation_id = %ctx.correlation_id,
            channel_id = channel,
            thread_ts = ts,
            target_lang = target.code(),
            "posted automatic translation"
        );
        Ok(AutoTranslateOutcome::Posted { target })
    }
}

pub struct MessageHandler {
    auto_translator: AutoTranslator,
}

impl MessageHandler {
    pub fn new(auto_translator: AutoTranslator) -> Self {
        Self { auto_translator }
    }
}

#[async_trait]
impl EventHandler for MessageHandler {
    fn event_type(&self) -> SlackEventType {
        SlackEventType::Message
    }

    async fn handle(
        &self,
        envelope: &SlackEnvelope,
        ctx: &EventContext,
    ) -> Result<HandlerResult, EventHandlerError> {
        let SlackEvent::Message(message) = &envelope.event else {
            return Ok(HandlerResult::Ignored);
        };

        Ok(match self.auto_translator.translate_message(message, ctx).await? {
            AutoTranslateOutcome::Posted { .. } => HandlerResult::Processed,
            _ => HandlerResult::Ignored,
        })
    }
}
