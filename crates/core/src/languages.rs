use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Writing system a language is primarily written in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Script {
    Latin,
    Cyrillic,
    Greek,
    Hangul,
    Kana,
    Han,
}

/// Closed set of languages the relay can translate into.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Bg,
    Cs,
    Da,
    De,
    El,
    En,
    Es,
    Et,
    Fi,
    Fr,
    Hu,
    Id,
    It,
    Ja,
    Ko,
    Lt,
    Lv,
    Nb,
    Nl,
    Pl,
    Pt,
    Ro,
    Ru,
    Sk,
    Sl,
    Sv,
    Tr,
    Uk,
    Zh,
}

struct LanguageProfile {
    code: &'static str,
    name: &'static str,
    reaction: &'static str,
    provider_code: &'static str,
    script: Script,
}

impl Language {
    pub const ALL: [Language; 29] = [
        Self::Bg,
        Self::Cs,
        Self::Da,
        Self::De,
        Self::El,
        Self::En,
        Self::Es,
        Self::Et,
        Self::Fi,
        Self::Fr,
        Self::Hu,
        Self::Id,
        Self::It,
        Self::Ja,
        Self::Ko,
        Self::Lt,
        Self::Lv,
        Self::Nb,
        Self::Nl,
        Self::Pl,
        Self::Pt,
        Self::Ro,
        Self::Ru,
        Self::Sk,
        Self::Sl,
        Self::Sv,
        Self::Tr,
        Self::Uk,
        Self::Zh,
    ];

    fn profile(self) -> LanguageProfile {
        use Script::*;

        let (code, name, reaction, provider_code, script) = match self {
            Self::Bg => ("bg", "Bulgarian", ":flag-bg:", "BG", Cyrillic),
            Self::Cs => ("cs", "Czech", ":flag-cz:", "CS", Latin),
            Self::Da => ("da", "Danish", ":flag-dk:", "DA", Latin),
            Self::De => ("de", "German", ":de:", "DE", Latin),
            Self::El => ("el", "Greek", ":flag-gr:", "EL", Greek),
            Self::En => ("en", "English", ":us:", "EN-US", Latin),
            Self::Es => ("es", "Spanish", ":es:", "ES", Latin),
            Self::Et => ("et", "Estonian", ":flag-ee:", "ET", Latin),
            Self::Fi => ("fi", "Finnish", ":flag-fi:", "FI", Latin),
            Self::Fr => ("fr", "French", ":fr:", "FR", Latin),
            Self::Hu => ("hu", "Hungarian", ":flag-hu:", "HU", Latin),
            Self::Id => ("id", "Indonesian", ":flag-id:", "ID", Latin),
            Self::It => ("it", "Italian", ":it:", "IT", Latin),
            Self::Ja => ("ja", "Japanese", ":jp:", "JA", Kana),
            Self::Ko => ("ko", "Korean", ":kr:", "KO", Hangul),
            Self::Lt => ("lt", "Lithuanian", ":flag-lt:", "LT", Latin),
            Self::Lv => ("lv", "Latvian", ":flag-lv:", "LV", Latin),
            Self::Nb => ("nb", "Norwegian", ":flag-no:", "NB", Latin),
            Self::Nl => ("nl", "Dutch", ":flag-nl:", "NL", Latin),
            Self::Pl => ("pl", "Polish", ":flag-pl:", "PL", Latin),
            Self::Pt => ("pt", "Portuguese", ":flag-pt:", "PT-PT", Latin),
            Self::Ro => ("ro", "Romanian", ":flag-ro:", "RO", Latin),
            Self::Ru => ("ru", "Russian", ":ru:", "RU", Cyrillic),
            Self::Sk => ("sk", "Slovak", ":flag-sk:", "SK", Latin),
            Self::Sl => ("sl", "Slovenian", ":flag-si:", "SL", Latin),
            Self::Sv => ("sv", "Swedish", ":flag-se:", "SV", Latin),
            Self::Tr => ("tr", "Turkish", ":flag-tr:", "TR", Latin),
            Self::Uk => ("uk", "Ukrainian", ":flag-ua:", "UK", Cyrillic),
            Self::Zh => ("zh", "Chinese", ":cn:", "ZH", Han),
        };

        LanguageProfile { code, name, reaction, provider_code, script }
    }

    pub fn code(self) -> &'static str {
        self.profile().code
    }

    pub fn name(self) -> &'static str {
        self.profile().name
    }

    /// Emoji shown next to the language name in pickers, e.g. `:jp:`.
    pub fn reaction(self) -> &'static str {
        self.profile().reaction
    }

    /// Target language code as the translation provider expects it.
    pub fn provider_code(self) -> &'static str {
        self.profile().provider_code
    }

    pub fn script(self) -> Script {
        self.profile().script
    }

    pub fn from_code(code: &str) -> Option<Self> {
        let normalized = code.trim().to_ascii_lowercase();
        Self::ALL.into_iter().find(|language| language.code() == normalized)
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("unsupported language code `{0}`")]
pub struct UnknownLanguage(pub String);

impl FromStr for Language {
    type Err = UnknownLanguage;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::from_code(value).ok_or_else(|| UnknownLanguage(value.trim().to_owned()))
    }
}

const DIRECT_REACTIONS: &[(&str, Language)] = &[
    ("jp", Language::Ja),
    ("kr", Language::Ko),
    ("cn", Language::Zh),
    ("de", Language::De),
    ("fr", Language::Fr),
    ("es", Language::Es),
    ("it", Language::It),
    ("ru", Language::Ru),
    ("us", Language::En),
    ("gb", Language::En),
    ("uk", Language::En),
];

const COUNTRIES: &[(&str, Language)] = &[
    ("us", Language::En),
    ("gb", Language::En),
    ("au", Language::En),
    ("ca", Language::En),
    ("nz", Language::En),
    ("ie", Language::En),
    ("sg", Language::En),
    ("ag", Language::En),
    ("jm", Language::En),
    ("jp", Language::Ja),
    ("kr", Language::Ko),
    ("cn", Language::Zh),
    ("tw", Language::Zh),
    ("hk", Language::Zh),
    ("mo", Language::Zh),
    ("de", Language::De),
    ("at", Language::De),
    ("ch", Language::De),
    ("li", Language::De),
    ("fr", Language::Fr),
    ("be", Language::Fr),
    ("lu", Language::Fr),
    ("mc", Language::Fr),
    ("es", Language::Es),
    ("mx", Language::Es),
    ("ar", Language::Es),
    ("co", Language::Es),
    ("cl", Language::Es),
    ("pe", Language::Es),
    ("ve", Language::Es),
    ("cu", Language::Es),
    ("uy", Language::Es),
    ("ec", Language::Es),
    ("bo", Language::Es),
    ("py", Language::Es),
    ("cr", Language::Es),
    ("pa", Language::Es),
    ("do", Language::Es),
    ("gt", Language::Es),
    ("hn", Language::Es),
    ("sv", Language::Es),
    ("ni", Language::Es),
    ("pr", Language::Es),
    ("it", Language::It),
    ("sm", Language::It),
    ("va", Language::It),
    ("nl", Language::Nl),
    ("sr", Language::Nl),
    ("pl", Language::Pl),
    ("pt", Language::Pt),
    ("br", Language::Pt),
    ("ao", Language::Pt),
    ("mz", Language::Pt),
    ("ru", Language::Ru),
    ("by", Language::Ru),
    ("kz", Language::Ru),
    ("bg", Language::Bg),
    ("cz", Language::Cs),
    ("dk", Language::Da),
    ("gr", Language::El),
    ("cy", Language::El),
    ("ee", Language::Et),
    ("fi", Language::Fi),
    ("hu", Language::Hu),
    ("id", Language::Id),
    ("lt", Language::Lt),
    ("lv", Language::Lv),
    ("no", Language::Nb),
    ("ro", Language::Ro),
    ("md", Language::Ro),
    ("sk", Language::Sk),
    ("si", Language::Sl),
    ("se", Language::Sv),
    ("tr", Language::Tr),
    ("ua", Language::Uk),
];

/// Immutable reaction and country lookups, built once per process.
#[derive(Debug)]
pub struct LanguageTable {
    reactions: HashMap<&'static str, Language>,
    countries: HashMap<&'static str, Language>,
}

impl LanguageTable {
    pub fn global() -> &'static Self {
        static TABLE: OnceLock<LanguageTable> = OnceLock::new();
        TABLE.get_or_init(Self::new)
    }

    fn new() -> Self {
        Self {
            reactions: DIRECT_REACTIONS.iter().copied().collect(),
            countries: COUNTRIES.iter().copied().collect(),
        }
    }

    pub fn by_reaction(&self, reaction: &str) -> Option<Language> {
        self.reactions.get(reaction).copied()
    }

    pub fn by_country(&self, country: &str) -> Option<Language> {
        self.countries.get(country).copied()
    }

    pub fn reactions_for(&self, language: Language) -> Vec<&'static str> {
        collect_keys(DIRECT_REACTIONS, language)
    }

    pub fn countries_for(&self, language: Language) -> Vec<&'static str> {
        collect_keys(COUNTRIES, language)
    }
}

fn collect_keys(entries: &[(&'static str, Language)], language: Language) -> Vec<&'static str> {
    entries.iter().filter(|(_, mapped)| *mapped == language).map(|(key, _)| *key).collect()
}
