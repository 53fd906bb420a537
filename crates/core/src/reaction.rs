use crate::languages::{Language, LanguageTable};

const FLAG_PREFIX: &str = "flag-";

/// The item a reaction was attached to.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ReactionItem {
    pub item_type: String,
    pub channel: Option<String>,
    pub ts: Option<String>,
}

impl ReactionItem {
    pub fn is_message(&self) -> bool {
        self.item_type == "message"
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ReactionAdded {
    pub reaction: String,
    pub user_id: Option<String>,
    pub item: ReactionItem,
}

/// Resolves the target language a reaction asks for, if any.
///
/// Only reactions on messages carry translation intent. A `flag-<country>`
/// reaction goes through the country table; anything else is looked up as a
/// direct reaction name.
pub fn target_language(event: &ReactionAdded, table: &LanguageTable) -> Option<Language> {
    if !event.item.is_message() {
        return None;
    }

    let reaction = normalize_reaction_token(&event.reaction);
    match flag_country(&reaction) {
        Some(country) => table.by_country(country),
        None if reaction.contains(FLAG_PREFIX) => None,
        None => table.by_reaction(&reaction),
    }
}

/// Country token following the first `flag-` in a reaction name.
pub fn flag_country(reaction: &str) -> Option<&str> {
    let start = reaction.find(FLAG_PREFIX)? + FLAG_PREFIX.len();
    let rest = &reaction[start..];
    let end =
        rest.find(|ch: char| !(ch.is_ascii_alphanumeric() || ch == '_')).unwrap_or(rest.len());
    (end > 0).then(|| &rest[..end])
}

fn normalize_reaction_token(reaction: &str) -> String {
    reaction.trim().trim_matches(':').to_ascii_lowercase()
}

#[cfg(test)]
mod tests {
    use super::{flag_country, target_language, ReactionAdded, ReactionItem};
    use crate::languages::{Language, LanguageTable};

    fn reaction_on(item_type: &str, reaction: &str) -> ReactionAdded {
        ReactionAdded {
            reaction: reaction.to_owned(),
            user_id: Some("U1".to_owned()),
            item: ReactionItem {
                item_type: item_type.to_owned(),
                channel: Some("C1".to_owned()),
                ts: Some("1730000000.1000".to_owned()),
            },
        }
    }

    fn lang(reaction: &str) -> Option<Language> {
        target_language(&reaction_on("message", reaction), LanguageTable::global())
    }

    #[test]
    fn direct_reaction_resolves_language() {
        assert_eq!(lang("jp"), Some(Language::Ja));
        assert_eq!(lang("us"), Some(Language::En));
    }

    #[test]
    fn flag_reaction_resolves_through_country_table() {
        assert_eq!(lang("flag-fr"), Some(Language::Fr));
        assert_eq!(lang("flag-br"), Some(Language::Pt));
        assert_eq!(lang("flag-ua"), Some(Language::Uk));
    }

    #[test]
    fn flag_token_is_found_regardless_of_surrounding_characters() {
        assert_eq!(lang("xflag-de"), Some(Language::De));
        assert_eq!(lang("flag-jp-alt"), Some(Language::Ja));
        assert_eq!(lang(":flag-kr:"), Some(Language::Ko));
    }

    #[test]
    fn unmapped_reactions_yield_no_language() {
        assert_eq!(lang("thumbsup"), None);
        assert_eq!(lang("flag-england"), None);
        assert_eq!(lang("flag-"), None);
        assert_eq!(lang(""), None);
    }

    #[test]
    fn flag_prefix_never_falls_back_to_direct_table() {
        assert_eq!(lang("flag-?"), None);
    }

    #[test]
    fn reactions_on_files_are_ignored() {
        let event = reaction_on("file", "jp");
        assert_eq!(target_language(&event, LanguageTable::global()), None);
    }

    #[test]
    fn reaction_names_are_normalized() {
        assert_eq!(lang(" :JP: "), Some(Language::Ja));
    }

    #[test]
    fn flag_country_extracts_word_token() {
        assert_eq!(flag_country("flag-fr"), Some("fr"));
        assert_eq!(flag_country("flag-gb::skin-tone-2"), Some("gb"));
        assert_eq!(flag_country("fr"), None);
        assert_eq!(flag_country("flag-"), None);
    }
}
