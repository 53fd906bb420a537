use std::collections::HashMap;

use crate::languages::{Language, Script};

const MIN_LETTERS: usize = 2;

/// Two languages whose messages are translated into each other.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LanguagePair {
    pub first: Language,
    pub second: Language,
}

impl LanguagePair {
    pub fn new(first: Language, second: Language) -> Self {
        Self { first, second }
    }

    /// A pair is only detectable when its members use different scripts.
    pub fn is_distinguishable(&self) -> bool {
        self.first.script() != self.second.script()
    }

    pub fn counterpart(&self, language: Language) -> Option<Language> {
        if language == self.first {
            Some(self.second)
        } else if language == self.second {
            Some(self.first)
        } else {
            None
        }
    }

    /// Picks the pair member written in the text's dominant script.
    pub fn detect(&self, text: &str) -> Option<Language> {
        let script = dominant_script(text)?;
        [self.first, self.second].into_iter().find(|language| language.script() == script)
    }
}

impl Default for LanguagePair {
    fn default() -> Self {
        Self::new(Language::En, Language::Ko)
    }
}

/// Most frequent script among the letters of `text`. Han characters count as
/// Japanese when any kana is present.
pub fn dominant_script(text: &str) -> Option<Script> {
    let mut counts: HashMap<Script, usize> = HashMap::new();
    for ch in text.chars() {
        if let Some(script) = script_of(ch) {
            *counts.entry(script).or_default() += 1;
        }
    }

    if counts.contains_key(&Script::Kana) {
        if let Some(han) = counts.remove(&Script::Han) {
            *counts.entry(Script::Kana).or_default() += han;
        }
    }

    let total: usize = counts.values().sum();
    if total < MIN_LETTERS {
        return None;
    }

    let mut ranked: Vec<_> = counts.into_iter().collect();
    ranked.sort_by(|(left_script, left), (right_script, right)| {
        right.cmp(left).then_with(|| script_rank(*left_script).cmp(&script_rank(*right_script)))
    });
    ranked.first().map(|(script, _)| *script)
}

fn script_of(ch: char) -> Option<Script> {
    match ch {
        'A'..='Z' | 'a'..='z' | '\u{00C0}'..='\u{024F}' => Some(Script::Latin),
        '\u{0400}'..='\u{04FF}' => Some(Script::Cyrillic),
        '\u{0370}'..='\u{03FF}' => Some(Script::Greek),
        '\u{AC00}'..='\u{D7AF}' | '\u{1100}'..='\u{11FF}' | '\u{3130}'..='\u{318F}' => {
            Some(Script::Hangul)
        }
        '\u{3040}'..='\u{309F}' | '\u{30A0}'..='\u{30FF}' => Some(Script::Kana),
        '\u{4E00}'..='\u{9FFF}' => Some(Script::Han),
        _ => None,
    }
}

fn script_rank(script: Script) -> u8 {
    match script {
        Script::Latin => 0,
        Script::Cyrillic => 1,
        Script::Greek => 2,
        Script::Hangul => 3,
        Script::Kana => 4,
        Script::Han => 5,
    }
}

#[cfg(test)]
mod tests {
    use super::{dominant_script, LanguagePair};
    use crate::languages::{Language, Script};

    #[test]
    fn default_pair_detects_english_and_korean() {
        let pair = LanguagePair::default();

        assert_eq!(pair.detect("Hello there"), Some(Language::En));
        assert_eq!(pair.detect("안녕하세요"), Some(Language::Ko));
        assert_eq!(pair.detect("안녕하세요 team"), Some(Language::Ko));
    }

    #[test]
    fn short_or_letterless_text_is_undetermined() {
        let pair = LanguagePair::default();

        assert_eq!(pair.detect("a"), None);
        assert_eq!(pair.detect("ok 42"), Some(Language::En));
        assert_eq!(pair.detect("!!! 42"), None);
    }

    #[test]
    fn scripts_outside_the_pair_are_undetermined() {
        assert_eq!(LanguagePair::default().detect("Привет мир"), None);
    }

    #[test]
    fn kana_absorbs_han_counts() {
        assert_eq!(dominant_script("日本語を話します"), Some(Script::Kana));
        assert_eq!(dominant_script("中文翻译"), Some(Script::Han));
    }

    #[test]
    fn counterpart_swaps_pair_members() {
        let pair = LanguagePair::new(Language::Ja, Language::En);

        assert_eq!(pair.counterpart(Language::Ja), Some(Language::En));
        assert_eq!(pair.counterpart(Language::En), Some(Language::Ja));
        assert_eq!(pair.counterpart(Language::Fr), None);
    }

    #[test]
    fn same_script_pairs_are_not_distinguishable() {
        assert!(!LanguagePair::new(Language::En, Language::Fr).is_distinguishable());
        assert!(LanguagePair::new(Language::En, Language::Ru).is_distinguishable());
    }
}
