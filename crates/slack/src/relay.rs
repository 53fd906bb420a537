//! Reaction relay: a language reaction on a message posts the translation of
//! the thread's first message into that thread.

use std::sync::Arc;

use async_trait::async_trait;
use polyglot_core::{target_language, Language, LanguageTable, ReactionAdded, ThreadAnchor};
use polyglot_translate::{TranslationOutcome, Translator};
use tracing::{debug, info, warn};

use crate::api::{PostMessage, SlackApi, SlackApiError};
use crate::events::{
    EventContext, EventHandler, EventHandlerError, HandlerResult, SlackEnvelope, SlackEvent,
    SlackEventType,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SkipReason {
    EmptyThread,
    NoAnchorText,
    TranslationUnavailable,
    AlreadyPosted,
}

impl SkipReason {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::EmptyThread => "empty_thread",
            Self::NoAnchorText => "no_anchor_text",
            Self::TranslationUnavailable => "translation_unavailable",
            Self::AlreadyPosted => "already_posted",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RelayOutcome {
    /// The reaction carries no translation intent.
    Filtered,
    Skipped(SkipReason),
    Posted {
        channel: String,
        thread_ts: String,
        language: Language,
        /// Source language reported by the provider, lower-cased.
        source_language: Option<String>,
    },
}

pub struct ReactionRelay {
    slack: Arc<dyn SlackApi>,
    translator: Arc<dyn Translator>,
    table: &'static LanguageTable,
}

impl ReactionRelay {
    pub fn new(slack: Arc<dyn SlackApi>, translator: Arc<dyn Translator>) -> Self {
        Self { slack, translator, table: LanguageTable::global() }
    }

    /// Runs one reaction event to completion. Only Slack API failures surface
    /// as errors; every other dead end is a quiet outcome.
    pub async fn relay(
        &self,
        event: &ReactionAdded,
        ctx: &EventContext,
    ) -> Result<RelayOutcome, SlackApiError> {
        let (Some(channel), Some(ts)) = (event.item.channel.as_deref(), event.item.ts.as_deref())
        else {
            debug!(
                event_name = "relay.reaction.filtered",
                correlation_id = %ctx.correlation_id,
                reaction = %event.reaction,
                "reaction item has no channel or timestamp"
            );
            return Ok(RelayOutcome::Filtered);
        };
        let Some(language) = target_language(event, self.table) else {
            debug!(
                event_name = "relay.reaction.filtered",
                correlation_id = %ctx.correlation_id,
                reaction = %event.reaction,
                item_type = %event.item.item_type,
                "reaction does not map to a language"
            );
            return Ok(RelayOutcome::Filtered);
        };

        let replies = self.slack.conversation_replies(&ThreadAnchor::new(channel, ts)).await?;
        let Some(anchor) = replies.anchor() else {
            return Ok(self.skipped(SkipReason::EmptyThread, ctx, channel, ts));
        };
        let Some(source_text) = anchor.text() else {
            return Ok(self.skipped(SkipReason::NoAnchorText, ctx, channel, ts));
        };

        let outcome = self.translator.translate(source_text, language).await;
        let (translated, source_language) = match outcome {
            Ok(TranslationOutcome::Translated { text, detected_source }) => (text, detected_source),
            Ok(TranslationOutcome::Unavailable { reason }) => {
                warn!(
                    event_name = "relay.translation.unavailable",
                    correlation_id = %ctx.correlation_id,
                    provider = self.translator.provider(),
                    target_lang = language.code(),
                    reason = %reason,
                    "translation unavailable"
                );
                return Ok(self.skipped(SkipReason::TranslationUnavailable, ctx, channel, ts));
            }
            Err(error) => {
                warn!(
                    event_name = "relay.translation.failed",
                    correlation_id = %ctx.correlation_id,
                    provider = self.translator.provider(),
                    target_lang = language.code(),
                    error = %error,
                    "translation request failed"
                );
                return Ok(self.skipped(SkipReason::TranslationUnavailable, ctx, channel, ts));
            }
        };

        if replies.is_already_posted(&translated) {
            return Ok(self.skipped(SkipReason::AlreadyPosted, ctx, channel, ts));
        }

        let thread_ts = anchor.reply_target().to_owned();
        self.slack.post_message(&PostMessage::in_thread(channel, &thread_ts, translated)).await?;

        info!(
            event_name = "relay.reaction.posted",
            correlation_id = %ctx.correlation_id,
            channel_id = channel,
            thread_ts = %thread_ts,
            target_lang = language.code(),
            source_lang = source_language.as_deref().unwrap_or("unknown"),
            "posted translation into thread"
        );
        Ok(RelayOutcome::Posted {
            channel: channel.to_owned(),
            thread_ts,
            language,
            source_language,
        })
    }

    fn skipped(
        &self,
        reason: SkipReason,
        ctx: &EventContext,
        channel: &str,
        ts: &str,
    ) -> RelayOutcome {
        debug!(
            event_name = "relay.reaction.skipped",
            correlation_id = %ctx.correlation_id,
            channel_id = channel,
            thread_ts = ts,
            reason = reason.as_str(),
            "reaction relay skipped"
        );
        RelayOutcome::Skipped(reason)
    }
}

pub struct ReactionAddedHandler {
    relay: ReactionRelay,
}

impl ReactionAddedHandler {
    pub fn new(relay: ReactionRelay) -> Self {
        Self { relay }
    }
}

#[async_trait]
impl EventHandler for ReactionAddedHandler {
    fn event_type(&self) -> SlackEventType {
        SlackEventType::ReactionAdded
    }

    async fn handle(
        &self,
        envelope: &SlackEnvelope,
        ctx: &EventContext,
    ) -> Result<HandlerResult, EventHandlerError> {
        let SlackEvent::ReactionAdded(event) = &envelope.event else {
            return Ok(HandlerResult::Ignored);
        };

        Ok(match self.relay.relay(event, ctx).await? {
            RelayOutcome::Posted { .. } => HandlerResult::Processed,
            RelayOutcome::Filtered | RelayOutcome::Skipped(_) => HandlerResult::Ignored,
        })
    }
}
