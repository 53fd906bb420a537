use std::time::Duration;

use async_trait::async_trait;
use polyglot_core::config::DeepLConfig;
use polyglot_core::Language;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use tracing::debug;

use crate::client::{TranslationError, TranslationOutcome, Translator};

pub struct DeepLClient {
    http: reqwest::Client,
    auth_key: SecretString,
    endpoint: String,
}

#[derive(Debug, Deserialize)]
struct DeepLResponse {
    #[serde(default)]
    translations: Vec<DeepLTranslation>,
}

#[derive(Debug, Deserialize)]
struct DeepLTranslation {
    text: String,
    #[serde(default)]
    detected_source_language: Option<String>,
}

impl DeepLClient {
    pub fn new(
        auth_key: SecretString,
        endpoint: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, TranslationError> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { http, auth_key, endpoint: endpoint.into() })
    }

    pub fn from_config(config: &DeepLConfig) -> Result<Self, TranslationError> {
        Self::new(
            config.auth_key.clone(),
            config.endpoint(),
            Duration::from_secs(config.timeout_secs),
        )
    }
}

#[async_trait]
impl Translator for DeepLClient {
    fn provider(&self) -> &'static str {
        "deepl"
    }

    async fn translate(
        &self,
        text: &str,
        target: Language,
    ) -> Result<TranslationOutcome, TranslationError> {
        if text.trim().is_empty() {
            return Ok(TranslationOutcome::unavailable("source text is empty"));
        }

        let params = [("text", text), ("target_lang", target.provider_code())];
        let response = self
            .http
            .post(format!("{}/v2/translate", self.endpoint))
            .header("Authorization", format!("DeepL-Auth-Key {}", self.auth_key.expose_secret()))
            .form(&params)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(TranslationError::Status { status: status.as_u16(), body });
        }

        let payload: DeepLResponse = response
            .json()
            .await
            .map_err(|error| TranslationError::Decode(error.to_string()))?;

        let Some(translation) = payload.translations.into_iter().next() else {
            return Ok(TranslationOutcome::unavailable("provider returned no translations"));
        };
        if translation.text.is_empty() {
            return Ok(TranslationOutcome::unavailable("provider returned empty text"));
        }

        debug!(
            event_name = "translate.deepl.completed",
            target_lang = target.code(),
            detected_source = translation.detected_source_language.as_deref().unwrap_or("unknown"),
            "deepl translation completed"
        );

        Ok(TranslationOutcome::Translated {
            text: translation.text,
            detected_source: translation.detected_source_language.map(|lang| lang.to_lowercase()),
        })
    }
}
