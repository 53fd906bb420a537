//! Translation Client - provider-agnostic `Translator` capability
//!
//! Call sites only ever see a [`TranslationOutcome`] or a
//! [`TranslationError`]; both "no usable text" and provider failures end the
//! relay path quietly, but the error variant is kept separate so it can be
//! logged.
//!
//! # Providers
//!
//! - **DeepL** (`deepl`) - `POST /v2/translate` with `DeepL-Auth-Key` auth.
//!   Keys ending in `:fx` go to the free API host.

pub mod client;
pub mod deepl;

pub use client::{TranslationError, TranslationOutcome, Translator};
pub use deepl::DeepLClient;
