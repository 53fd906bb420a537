use async_trait::async_trait;
use polyglot_core::Language;
use thiserror::Error;

/// What a provider produced for one request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TranslationOutcome {
    Translated { text: String, detected_source: Option<String> },
    /// The provider answered but gave nothing usable.
    Unavailable { reason: String },
}

impl TranslationOutcome {
    pub fn translated(text: impl Into<String>) -> Self {
        Self::Translated { text: text.into(), detected_source: None }
    }

    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self::Unavailable { reason: reason.into() }
    }
}

#[derive(Debug, Error)]
pub enum TranslationError {
    #[error("translation request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("translation provider returned HTTP {status}: {body}")]
    Status { status: u16, body: String },
    #[error("translation response could not be decoded: {0}")]
    Decode(String),
}

#[async_trait]
pub trait Translator: Send + Sync {
    fn provider(&self) -> &'static str;

    async fn translate(
        &self,
        text: &str,
        target: Language,
    ) -> Result<TranslationOutcome, TranslationError>;
}
