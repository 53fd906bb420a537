//! Modal "runner": a global shortcut opens a form, the submission is
//! translated and the result replaces the form in place.

use std::sync::Arc;

use async_trait::async_trait;
use polyglot_core::Language;
use polyglot_translate::{TranslationOutcome, Translator};
use serde_json::{json, Value};
use tracing::{info, warn};

use crate::api::{SlackApi, SlackApiError};
use crate::blocks::{InputElement, ModalBuilder, ModalView, SelectOption, TextObject};
use crate::events::{
    EventContext, EventHandler, EventHandlerError, HandlerResult, ShortcutEvent, SlackEnvelope,
    SlackEvent, SlackEventType, ViewSubmissionEvent,
};

pub const SHORTCUT_CALLBACK_ID: &str = "deepl-translation";
pub const RUN_CALLBACK_ID: &str = "run-translation";
pub const NEW_RUNNER_CALLBACK_ID: &str = "new-runner";
pub const TRANSLATION_FAILED_TEXT: &str = ":x: Failed to translate it for some reason";

const TITLE: &str = "DeepL API Runner :books:";
const TEXT_BLOCK_ID: &str = "text";
const LANG_BLOCK_ID: &str = "lang";
const INPUT_ACTION_ID: &str = "a";

fn option_label(language: Language) -> String {
    format!("{} {}", language.reaction(), language.name())
}

fn language_option(language: Language) -> SelectOption {
    SelectOption::new(option_label(language), language.code())
}

/// Fresh input form. `initial` is preselected when it is one of `languages`.
pub fn new_runner_modal(languages: &[Language], initial: Language) -> ModalView {
    let initial_option = languages
        .iter()
        .copied()
        .find(|language| *language == initial)
        .or_else(|| languages.first().copied())
        .map(language_option);

    ModalBuilder::new(TITLE)
        .callback_id(RUN_CALLBACK_ID)
        .submit("Translate")
        .input(
            TEXT_BLOCK_ID,
            TextObject::plain("Text"),
            InputElement::PlainTextInput {
                action_id: INPUT_ACTION_ID.to_owned(),
                multiline: true,
                placeholder: TextObject::plain("Put the text to translate"),
            },
        )
        .input(
            LANG_BLOCK_ID,
            TextObject::plain_emoji("Language"),
            InputElement::StaticSelect {
                action_id: INPUT_ACTION_ID.to_owned(),
                placeholder: TextObject::plain("Choose language"),
                initial_option,
                options: languages.iter().copied().map(language_option).collect(),
            },
        )
        .build()
}

pub fn loading_view(language: Language, source_text: &str) -> ModalView {
    ModalBuilder::new(TITLE)
        .section(format!("Translating the text into {} ...", language.reaction()))
        .divider()
        .section(source_text)
        .build()
}

pub fn result_view(language: Language, source_text: &str, translated_text: &str) -> ModalView {
    ModalBuilder::new(TITLE)
        .callback_id(NEW_RUNNER_CALLBACK_ID)
        .submit("Try Another")
        .private_metadata(language.code())
        .section(format!("Here is the same text in {}", language.reaction()))
        .divider()
        .section(translated_text)
        .divider()
        .section(source_text)
        .build()
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RunnerOutcome {
    Opened,
    Translated { language: Language },
    Failed { language: Language },
    Reset { language: Language },
    Ignored,
}

pub struct TranslationRunner {
    slack: Arc<dyn SlackApi>,
    translator: Arc<dyn Translator>,
    languages: Vec<Language>,
}

impl TranslationRunner {
    pub fn new(
        slack: Arc<dyn SlackApi>,
        translator: Arc<dyn Translator>,
        languages: Vec<Language>,
    ) -> Self {
        Self { slack, translator, languages }
    }

    fn default_language(&self) -> Language {
        self.languages.first().copied().unwrap_or(Language::En)
    }

    pub async fn open(
        &self,
        shortcut: &ShortcutEvent,
        ctx: &EventContext,
    ) -> Result<RunnerOutcome, SlackApiError> {
        if shortcut.callback_id != SHORTCUT_CALLBACK_ID || shortcut.trigger_id.is_empty() {
            return Ok(RunnerOutcome::Ignored);
        }

        let view = new_runner_modal(&self.languages, self.default_language());
        self.slack.open_view(&shortcut.trigger_id, &view).await?;
        info!(
            event_name = "runner.modal.opened",
            correlation_id = %ctx.correlation_id,
            user_id = shortcut.user_id.as_deref().unwrap_or("unknown"),
            "opened translation runner"
        );
        Ok(RunnerOutcome::Opened)
    }

    /// View that replaces the submitted modal through the ack's
    /// `response_action`. `None` lets the ack close the modal.
    pub fn ack_view(&self, submission: &ViewSubmissionEvent) -> Option<ModalView> {
        match submission.callback_id.as_str() {
            RUN_CALLBACK_ID => {
                let (source_text, language) = run_request(submission)?;
                Some(loading_view(language, source_text))
            }
            NEW_RUNNER_CALLBACK_ID => {
                Some(new_runner_modal(&self.languages, self.reset_language(submission)))
            }
            _ => None,
        }
    }

    /// Work left after the ack: the translation and the result view.
    pub async fn submit(
        &self,
        submission: &ViewSubmissionEvent,
        ctx: &EventContext,
    ) -> Result<RunnerOutcome, SlackApiError> {
        match submission.callback_id.as_str() {
            RUN_CALLBACK_ID => self.run(submission, ctx).await,
            NEW_RUNNER_CALLBACK_ID => {
                let language = self.reset_language(submission);
                info!(
                    event_name = "runner.modal.reset",
                    correlation_id = %ctx.correlation_id,
                    target_lang = language.code(),
                    "runner form reset"
                );
                Ok(RunnerOutcome::Reset { language })
            }
            _ => Ok(RunnerOutcome::Ignored),
        }
    }

    fn reset_language(&self, submission: &ViewSubmissionEvent) -> Language {
        submission
            .private_metadata
            .as_deref()
            .and_then(Language::from_code)
            .unwrap_or_else(|| self.default_language())
    }

    async fn run(
        &self,
        submission: &ViewSubmissionEvent,
        ctx: &EventContext,
    ) -> Result<RunnerOutcome, SlackApiError> {
        let Some((source_text, language)) = run_request(submission) else {
            return Ok(RunnerOutcome::Ignored);
        };

        let translated = match self.translator.translate(source_text, language).await {
            Ok(TranslationOutcome::Translated { text, .. }) => Some(text),
            Ok(TranslationOutcome::Unavailable { reason }) => {
                warn!(
                    event_name = "runner.translation.unavailable",
                    correlation_id = %ctx.correlation_id,
                    target_lang = language.code(),
                    reason = %reason,
                    "translation unavailable"
                );
                None
            }
            Err(error) => {
                warn!(
                    event_name = "runner.translation.failed",
                    correlation_id = %ctx.correlation_id,
                    target_lang = language.code(),
                    error = %error,
                    "translation request failed"
                );
                None
            }
        };

        let shown = translated.as_deref().unwrap_or(TRANSLATION_FAILED_TEXT);
        self.slack
            .update_view(&submission.view_id, &result_view(language, source_text, shown))
            .await?;

        Ok(match translated {
            Some(_) => RunnerOutcome::Translated { language },
            None => RunnerOutcome::Failed { language },
        })
    }
}

fn run_request(submission: &ViewSubmissionEvent) -> Option<(&str, Language)> {
    let source_text = submission.source_text.as_deref().filter(|text| !text.is_empty())?;
    let language = submission.selected_language.as_deref().and_then(Language::from_code)?;
    Some((source_text, language))
}

pub struct ShortcutHandler {
    runner: Arc<TranslationRunner>,
}

impl ShortcutHandler {
    pub fn new(runner: Arc<TranslationRunner>) -> Self {
        Self { runner }
    }
}

#[async_trait]
impl EventHandler for ShortcutHandler {
    fn event_type(&self) -> SlackEventType {
        SlackEventType::Shortcut
    }

    async fn handle(
        &self,
        envelope: &SlackEnvelope,
        ctx: &EventContext,
    ) -> Result<HandlerResult, EventHandlerError> {
        let SlackEvent::Shortcut(shortcut) = &envelope.event else {
            return Ok(HandlerResult::Ignored);
        };

        Ok(match self.runner.open(shortcut, ctx).await? {
            RunnerOutcome::Ignored => HandlerResult::Ignored,
            _ => HandlerResult::Processed,
        })
    }
}

pub struct ViewSubmissionHandler {
    runner: Arc<TranslationRunner>,
}

impl ViewSubmissionHandler {
    pub fn new(runner: Arc<TranslationRunner>) -> Self {
        Self { runner }
    }
}

#[async_trait]
impl EventHandler for ViewSubmissionHandler {
    fn event_type(&self) -> SlackEventType {
        SlackEventType::ViewSubmission
    }

    fn ack_payload(&self, envelope: &SlackEnvelope) -> Option<Value> {
        let SlackEvent::ViewSubmission(submission) = &envelope.event else {
            return None;
        };
        let view = serde_json::to_value(self.runner.ack_view(submission)?).ok()?;
        Some(json!({ "response_action": "update", "view": view }))
    }

    async fn handle(
        &self,
        envelope: &SlackEnvelope,
        ctx: &EventContext,
    ) -> Result<HandlerResult, EventHandlerError> {
        let SlackEvent::ViewSubmission(submission) = &envelope.event else {
            return Ok(HandlerResult::Ignored);
        };

        Ok(match self.runner.submit(submission, ctx).await? {
            RunnerOutcome::Ignored => HandlerResult::Ignored,
            _ => HandlerResult::Processed,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use polyglot_core::Language;
    use serde_json::Value;

    use super::{
        loading_view, new_runner_modal, result_view, RunnerOutcome, TranslationRunner,
        ViewSubmissionHandler, NEW_RUNNER_CALLBACK_ID, RUN_CALLBACK_ID, SHORTCUT_CALLBACK_ID,
        TRANSLATION_FAILED_TEXT,
    };
    use crate::events::{
        EventContext, EventHandler, ShortcutEvent, SlackEnvelope, SlackEvent, ViewSubmissionEvent,
    };
    use crate::testing::{FakeSlackApi, ScriptedReply, ScriptedTranslator};

    const LANGUAGES: [Language; 3] = [Language::En, Language::Ja, Language::De];

    fn runner(slack: &Arc<FakeSlackApi>, translator: &Arc<ScriptedTranslator>) -> TranslationRunner {
        TranslationRunner::new(slack.clone(), translator.clone(), LANGUAGES.to_vec())
    }

    fn run_submission(text: &str, lang: &str) -> ViewSubmissionEvent {
        ViewSubmissionEvent {
            callback_id: RUN_CALLBACK_ID.to_owned(),
            view_id: "V1".to_owned(),
            source_text: Some(text.to_owned()),
            selected_language: Some(lang.to_owned()),
            ..ViewSubmissionEvent::default()
        }
    }

    #[test]
    fn new_modal_lists_languages_with_reaction_labels() {
        let view = new_runner_modal(&LANGUAGES, Language::Ja);
        let value = serde_json::to_value(&view).expect("serializes");
        let select = &value["blocks"][1]["element"];

        assert_eq!(value["callback_id"], RUN_CALLBACK_ID);
        assert_eq!(value["title"]["text"], "DeepL API Runner :books:");
        assert_eq!(value["blocks"][0]["block_id"], "text");
        assert_eq!(value["blocks"][0]["element"]["action_id"], "a");
        assert_eq!(value["blocks"][1]["block_id"], "lang");
        assert_eq!(select["initial_option"]["value"], "ja");
        assert_eq!(select["initial_option"]["text"]["text"], ":jp: Japanese");
        let values: Vec<&str> = select["options"]
            .as_array()
            .expect("options")
            .iter()
            .filter_map(|option| option["value"].as_str())
            .collect();
        assert_eq!(values, vec!["en", "ja", "de"]);
    }

    #[test]
    fn new_modal_falls_back_to_first_language() {
        let view = new_runner_modal(&LANGUAGES, Language::Ko);
        let value = serde_json::to_value(&view).expect("serializes");

        assert_eq!(value["blocks"][1]["element"]["initial_option"]["value"], Value::from("en"));
    }

    #[test]
    fn loading_and_result_views_carry_source_text() {
        let loading = loading_view(Language::Ja, "Hello");
        let result = result_view(Language::Ja, "Hello", "こんにちは");

        assert_eq!(loading.section_texts(), vec!["Translating the text into :jp: ...", "Hello"]);
        assert_eq!(loading.callback_id(), None);
        assert_eq!(
            result.section_texts(),
            vec!["Here is the same text in :jp:", "こんにちは", "Hello"]
        );
        assert_eq!(result.callback_id(), Some(NEW_RUNNER_CALLBACK_ID));
        assert_eq!(result.private_metadata.as_deref(), Some("ja"));
    }

    #[tokio::test]
    async fn shortcut_opens_modal_with_trigger_id() {
        let slack = Arc::new(FakeSlackApi::new());
        let translator = Arc::new(ScriptedTranslator::default());
        let shortcut = ShortcutEvent {
            callback_id: SHORTCUT_CALLBACK_ID.to_owned(),
            trigger_id: "T-1".to_owned(),
            user_id: Some("U1".to_owned()),
        };

        let outcome = runner(&slack, &translator)
            .open(&shortcut, &EventContext::default())
            .await
            .expect("open");

        let opened = slack.opened_views().await;
        assert_eq!(outcome, RunnerOutcome::Opened);
        assert_eq!(opened.len(), 1);
        assert_eq!(opened[0].0, "T-1");
        assert_eq!(opened[0].1, new_runner_modal(&LANGUAGES, Language::En));
    }

    #[tokio::test]
    async fn other_shortcuts_are_ignored() {
        let slack = Arc::new(FakeSlackApi::new());
        let translator = Arc::new(ScriptedTranslator::default());
        let shortcut = ShortcutEvent {
            callback_id: "something-else".to_owned(),
            trigger_id: "T-1".to_owned(),
            user_id: None,
        };

        let outcome = runner(&slack, &translator)
            .open(&shortcut, &EventContext::default())
            .await
            .expect("open");

        assert_eq!(outcome, RunnerOutcome::Ignored);
        assert!(slack.opened_views().await.is_empty());
    }

    fn submission_envelope(submission: ViewSubmissionEvent) -> SlackEnvelope {
        SlackEnvelope {
            envelope_id: "env-v".to_owned(),
            event: SlackEvent::ViewSubmission(submission),
        }
    }

    #[test]
    fn run_submission_ack_swaps_in_loading_view() {
        let slack = Arc::new(FakeSlackApi::new());
        let translator = Arc::new(ScriptedTranslator::default());
        let handler = ViewSubmissionHandler::new(Arc::new(runner(&slack, &translator)));

        let payload = handler
            .ack_payload(&submission_envelope(run_submission("Good morning", "de")))
            .expect("ack payload");

        assert_eq!(payload["response_action"], "update");
        assert_eq!(
            payload["view"],
            serde_json::to_value(loading_view(Language::De, "Good morning")).expect("serializes")
        );
    }

    #[test]
    fn try_another_ack_swaps_in_new_form() {
        let slack = Arc::new(FakeSlackApi::new());
        let translator = Arc::new(ScriptedTranslator::default());
        let handler = ViewSubmissionHandler::new(Arc::new(runner(&slack, &translator)));
        let submission = ViewSubmissionEvent {
            callback_id: NEW_RUNNER_CALLBACK_ID.to_owned(),
            view_id: "V2".to_owned(),
            private_metadata: Some("de".to_owned()),
            ..ViewSubmissionEvent::default()
        };

        let payload = handler.ack_payload(&submission_envelope(submission)).expect("ack payload");

        assert_eq!(payload["response_action"], "update");
        assert_eq!(payload["view"]["callback_id"], RUN_CALLBACK_ID);
        assert_eq!(payload["view"]["blocks"][1]["element"]["initial_option"]["value"], "de");
    }

    #[test]
    fn incomplete_submission_gets_plain_ack() {
        let slack = Arc::new(FakeSlackApi::new());
        let translator = Arc::new(ScriptedTranslator::default());
        let handler = ViewSubmissionHandler::new(Arc::new(runner(&slack, &translator)));

        let missing_language = ViewSubmissionEvent {
            selected_language: None,
            ..run_submission("Good morning", "de")
        };
        let unknown_callback =
            ViewSubmissionEvent { callback_id: "other".to_owned(), ..run_submission("Hi", "de") };

        assert_eq!(handler.ack_payload(&submission_envelope(missing_language)), None);
        assert_eq!(handler.ack_payload(&submission_envelope(unknown_callback)), None);
    }

    #[tokio::test]
    async fn submission_updates_view_with_result_only() {
        let slack = Arc::new(FakeSlackApi::new());
        let translator = Arc::new(ScriptedTranslator::answering("Guten Morgen"));

        let outcome = runner(&slack, &translator)
            .submit(&run_submission("Good morning", "de"), &EventContext::default())
            .await
            .expect("submit");

        assert_eq!(outcome, RunnerOutcome::Translated { language: Language::De });
        assert_eq!(
            slack.updated_views().await,
            vec![("V1".to_owned(), result_view(Language::De, "Good morning", "Guten Morgen"))]
        );
        assert_eq!(translator.requests().await, vec![("Good morning".to_owned(), Language::De)]);
    }

    #[tokio::test]
    async fn failed_translation_shows_failure_placeholder() {
        let slack = Arc::new(FakeSlackApi::new());
        let translator = Arc::new(ScriptedTranslator::new(vec![ScriptedReply::Unavailable]));

        let outcome = runner(&slack, &translator)
            .submit(&run_submission("Good morning", "ja"), &EventContext::default())
            .await
            .expect("submit");

        let updates = slack.updated_views().await;
        assert_eq!(outcome, RunnerOutcome::Failed { language: Language::Ja });
        assert_eq!(updates.len(), 1);
        assert_eq!(updates[0].1.section_texts()[1], TRANSLATION_FAILED_TEXT);
    }

    #[tokio::test]
    async fn try_another_is_handled_by_the_ack_alone() {
        let slack = Arc::new(FakeSlackApi::new());
        let translator = Arc::new(ScriptedTranslator::default());
        let submission = ViewSubmissionEvent {
            callback_id: NEW_RUNNER_CALLBACK_ID.to_owned(),
            view_id: "V2".to_owned(),
            private_metadata: Some("de".to_owned()),
            ..ViewSubmissionEvent::default()
        };

        let outcome = runner(&slack, &translator)
            .submit(&submission, &EventContext::default())
            .await
            .expect("submit");

        assert_eq!(outcome, RunnerOutcome::Reset { language: Language::De });
        assert!(slack.updated_views().await.is_empty());
        assert!(translator.requests().await.is_empty());
    }
}
