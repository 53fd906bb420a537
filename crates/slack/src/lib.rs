//! Slack Integration - Socket Mode translation bot
//!
//! This crate provides the Slack surface of polyglot:
//! - **Web API** (`api`) - `conversations.replies`, `chat.postMessage`,
//!   `users.info`, `views.open` / `views.update`
//! - **Socket Mode** (`socket`) - WebSocket connection to Slack (no public URL needed)
//! - **Events** (`events`) - envelope parsing and the event dispatcher
//! - **Reaction relay** (`relay`) - language reactions post thread translations
//! - **Auto translation** (`auto_translate`) - every message in a language pair
//! - **Runner** (`runner`) - the `deepl-translation` shortcut modal
//! - **Block Kit** (`blocks`) - modal view builders
//!
//! # Getting Started
//!
//! 1. Create a Slack app at https://api.slack.com/apps
//! 2. Enable Socket Mode and subscribe to `reaction_added` and `message.*` events
//! 3. Add a global shortcut with callback id `deepl-translation`
//! 4. Set env vars: `SLACK_APP_TOKEN`, `SLACK_BOT_TOKEN`, `DEEPL_AUTH_KEY`
//!
//! # Architecture
//!
//! ```text
//! Socket Mode → EventDispatcher → ReactionRelay / AutoTranslator / TranslationRunner
//!                                        ↓                  ↓
//!                                   Translator         Slack Web API
//! ```

pub mod api;
pub mod auto_translate;
pub mod blocks;
pub mod events;
pub mod relay;
pub mod runner;
pub mod socket;

#[cfg(test)]
mod testing;
