use std::{sync::Arc, time::Duration};

use polyglot_core::config::AppConfig;
use polyglot_slack::{
    api::{HttpSlackApi, SlackApi, SlackApiError, SLACK_API_BASE},
    auto_translate::{AutoTranslator, MessageHandler},
    events::EventDispatcher,
    relay::{ReactionAddedHandler, ReactionRelay},
    runner::{ShortcutHandler, TranslationRunner, ViewSubmissionHandler},
    socket::{ReconnectPolicy, SocketModeRunner, SocketTransport, WebSocketTransport},
};
use polyglot_translate::{DeepLClient, TranslationError, Translator};
use thiserror::Error;
use tracing::info;

const SLACK_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

pub struct Application {
    pub config: AppConfig,
    pub flows: EnabledFlows,
    pub slack_runner: SocketModeRunner,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize)]
pub struct EnabledFlows {
    pub reactions: bool,
    pub auto_translate: bool,
    pub runner: bool,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error("translation client setup failed: {0}")]
    Translator(#[from] TranslationError),
    #[error("slack client setup failed: {0}")]
    SlackApi(#[from] SlackApiError),
}

pub fn bootstrap_with_config(config: AppConfig) -> Result<Application, BootstrapError> {
    info!(
        event_name = "system.bootstrap.start",
        correlation_id = "bootstrap",
        "starting application bootstrap"
    );
    let transport =
        Arc::new(WebSocketTransport::new(config.slack.app_token.clone(), SLACK_API_BASE));
    bootstrap_with_transport(config, transport)
}

pub fn bootstrap_with_transport(
    config: AppConfig,
    transport: Arc<dyn SocketTransport>,
) -> Result<Application, BootstrapError> {
    let translator: Arc<dyn Translator> = Arc::new(DeepLClient::from_config(&config.deepl)?);
    let slack: Arc<dyn SlackApi> = Arc::new(HttpSlackApi::new(
        config.slack.bot_token.clone(),
        SLACK_API_BASE,
        SLACK_HTTP_TIMEOUT,
    )?);
    info!(
        event_name = "system.bootstrap.clients_ready",
        correlation_id = "bootstrap",
        deepl_endpoint = %config.deepl.endpoint(),
        "translation and slack clients initialized"
    );

    let (dispatcher, flows) = build_dispatcher(&config, slack, translator);
    info!(
        event_name = "system.bootstrap.dispatcher_ready",
        correlation_id = "bootstrap",
        handlers = dispatcher.handler_count(),
        reactions = flows.reactions,
        auto_translate = flows.auto_translate,
        "event dispatcher initialized"
    );

    let slack_runner =
        SocketModeRunner::new(transport, Arc::new(dispatcher), ReconnectPolicy::default());
    Ok(Application { config, flows, slack_runner })
}

pub fn build_dispatcher(
    config: &AppConfig,
    slack: Arc<dyn SlackApi>,
    translator: Arc<dyn Translator>,
) -> (EventDispatcher, EnabledFlows) {
    let mut dispatcher = EventDispatcher::new();

    if config.relay.reactions_enabled {
        dispatcher.register(ReactionAddedHandler::new(ReactionRelay::new(
            slack.clone(),
            translator.clone(),
        )));
    }
    if config.relay.auto_translate_enabled {
        dispatcher.register(MessageHandler::new(AutoTranslator::new(
            slack.clone(),
            translator.clone(),
            config.relay.auto_translate_languages,
        )));
    }

    let runner =
        Arc::new(TranslationRunner::new(slack, translator, config.runner.languages.clone()));
    dispatcher.register(ShortcutHandler::new(runner.clone()));
    dispatcher.register(ViewSubmissionHandler::new(runner));

    let flows = EnabledFlows {
        reactions: config.relay.reactions_enabled,
        auto_translate: config.relay.auto_translate_enabled,
        runner: true,
    };
    (dispatcher, flows)
}
