use polyglot_core::{Language, LanguageTable};
use serde::Serialize;

use super::{CommandResult, EXIT_FAILURE};

#[derive(Debug, Serialize)]
struct LanguageEntry {
    code: &'static str,
    name: &'static str,
    emoji: &'static str,
    deepl_code: &'static str,
    reactions: Vec<&'static str>,
    flag_countries: Vec<&'static str>,
}

pub fn run(json_output: bool) -> CommandResult {
    let entries = entries(LanguageTable::global());

    if json_output {
        return match serde_json::to_string_pretty(&entries) {
            Ok(output) => CommandResult::text(0, output),
            Err(error) => CommandResult::failure(
                "languages",
                "serialization",
                error.to_string(),
                EXIT_FAILURE,
            ),
        };
    }

    let mut lines = vec![format!("{} supported languages:", entries.len())];
    lines.extend(entries.iter().map(render_line));
    CommandResult::text(0, lines.join("\n"))
}

fn entries(table: &LanguageTable) -> Vec<LanguageEntry> {
    Language::ALL
        .into_iter()
        .map(|language| LanguageEntry {
            code: language.code(),
            name: language.name(),
            emoji: language.reaction(),
            deepl_code: language.provider_code(),
            reactions: table.reactions_for(language),
            flag_countries: table.countries_for(language),
        })
        .collect()
}

fn render_line(entry: &LanguageEntry) -> String {
    let reactions = if entry.reactions.is_empty() {
        "-".to_string()
    } else {
        entry.reactions.join(",")
    };
    let flags = entry
        .flag_countries
        .iter()
        .map(|country| format!("flag-{country}"))
        .collect::<Vec<_>>()
        .join(",");

    format!(
        "- {} {} {} (deepl: {}) reactions: {reactions}; flags: {flags}",
        entry.code, entry.name, entry.emoji, entry.deepl_code
    )
}
