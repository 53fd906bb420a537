//! Platform-independent pieces of the translation relay: the language
//! mapping table, reaction interpretation, thread/reply model with the
//! duplicate guard, script-based source language detection, and
//! configuration loading.

pub mod config;
pub mod detect;
pub mod languages;
pub mod reaction;
pub mod thread;

pub use detect::LanguagePair;
pub use languages::{Language, LanguageTable, Script, UnknownLanguage};
pub use reaction::{target_language, ReactionAdded, ReactionItem};
pub use thread::{ReplySet, ThreadAnchor, ThreadMessage};
