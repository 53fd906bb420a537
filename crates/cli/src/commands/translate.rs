use polyglot_core::config::{AppConfig, LoadOptions};
use polyglot_core::Language;
use polyglot_translate::{DeepLClient, TranslationOutcome, Translator};

use super::{CommandResult, EXIT_CONFIG, EXIT_FAILURE, EXIT_UNAVAILABLE};

const COMMAND: &str = "translate";

pub fn run(to: &str, text: &str) -> CommandResult {
    run_with(LoadOptions::default(), to, text)
}

pub fn run_with(options: LoadOptions, to: &str, text: &str) -> CommandResult {
    let target = match to.parse::<Language>() {
        Ok(language) => language,
        Err(error) => {
            return CommandResult::failure(
                COMMAND,
                "invalid_language",
                error.to_string(),
                EXIT_CONFIG,
            )
        }
    };

    let deepl = match AppConfig::load_deepl(options) {
        Ok(deepl) => deepl,
        Err(error) => {
            return CommandResult::failure(
                COMMAND,
                "config_validation",
                error.to_string(),
                EXIT_CONFIG,
            )
        }
    };

    let client = match DeepLClient::from_config(&deepl) {
        Ok(client) => client,
        Err(error) => {
            return CommandResult::failure(COMMAND, "client_setup", error.to_string(), EXIT_FAILURE)
        }
    };

    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(error) => {
            return CommandResult::failure(
                COMMAND,
                "runtime",
                format!("failed to initialize async runtime: {error}"),
                EXIT_FAILURE,
            )
        }
    };

    match runtime.block_on(client.translate(text, target)) {
        Ok(TranslationOutcome::Translated { text, .. }) => CommandResult::success(COMMAND, text),
        Ok(TranslationOutcome::Unavailable { reason }) => {
            CommandResult::failure(COMMAND, "translation_unavailable", reason, EXIT_UNAVAILABLE)
        }
        Err(error) => CommandResult::failure(
            COMMAND,
            "translation_unavailable",
            error.to_string(),
            EXIT_UNAVAILABLE,
        ),
    }
}
