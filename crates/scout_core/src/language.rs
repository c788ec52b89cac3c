use std::fmt;

/// Subtitle languages the scout looks for, in declaration order.
///
/// The declaration order is the rendering order of an [`IndicatorSet`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Language {
    Swedish,
    Norwegian,
    Finnish,
    Danish,
    Icelandic,
    English,
    German,
    French,
}

impl Language {
    pub const ALL: [Language; 8] = [
        Language::Swedish,
        Language::Norwegian,
        Language::Finnish,
        Language::Danish,
        Language::Icelandic,
        Language::English,
        Language::German,
        Language::French,
    ];

    /// Lowercase keyword searched for in page text.
    pub fn token(self) -> &'static str {
        match self {
            Language::Swedish => "swedish",
            Language::Norwegian => "norwegian",
            Language::Finnish => "finnish",
            Language::Danish => "danish",
            Language::Icelandic => "icelandic",
            Language::English => "english",
            Language::German => "german",
            Language::French => "french",
        }
    }

    /// Flag symbol shown for the language.
    pub fn flag(self) -> &'static str {
        match self {
            Language::Swedish => "🇸🇪",
            Language::Norwegian => "🇳🇴",
            Language::Finnish => "🇫🇮",
            Language::Danish => "🇩🇰",
            Language::Icelandic => "🇮🇸",
            Language::English => "🇬🇧",
            Language::German => "🇩🇪",
            Language::French => "🇫🇷",
        }
    }

    fn bit(self) -> u8 {
        1 << (self as u8)
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

/// Set of matched languages. Iteration and rendering follow [`Language::ALL`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct IndicatorSet(u8);

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unrecognized flag sequence at byte {offset}: {rest:?}")]
pub struct FlagParseError {
    pub offset: usize,
    pub rest: String,
}

impl IndicatorSet {
    pub const fn empty() -> Self {
        Self(0)
    }

    pub fn insert(&mut self, language: Language) {
        self.0 |= language.bit();
    }

    pub fn contains(&self, language: Language) -> bool {
        self.0 & language.bit() != 0
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    pub fn len(&self) -> usize {
        self.0.count_ones() as usize
    }

    pub fn iter(&self) -> impl Iterator<Item = Language> + '_ {
        Language::ALL
            .into_iter()
            .filter(move |language| self.contains(*language))
    }

    /// Concatenated flag symbols; empty string for an empty set.
    pub fn to_flags(&self) -> String {
        self.iter().map(Language::flag).collect()
    }

    /// Parses a flag sequence produced by [`IndicatorSet::to_flags`].
    ///
    /// Flags may appear in any order; anything that is not a known flag is rejected.
    pub fn parse_flags(flags: &str) -> Result<Self, FlagParseError> {
        let mut set = Self::empty();
        let mut rest = flags.trim();
        let total = rest.len();
        while !rest.is_empty() {
            let matched = Language::ALL
                .into_iter()
                .find(|language| rest.starts_with(language.flag()));
            match matched {
                Some(language) => {
                    set.insert(language);
                    rest = &rest[language.flag().len()..];
                }
                None => {
                    return Err(FlagParseError {
                        offset: total - rest.len(),
                        rest: rest.to_string(),
                    })
                }
            }
        }
        Ok(set)
    }
}

impl FromIterator<Language> for IndicatorSet {
    fn from_iter<I: IntoIterator<Item = Language>>(iter: I) -> Self {
        let mut set = Self::empty();
        for language in iter {
            set.insert(language);
        }
        set
    }
}

impl fmt::Display for IndicatorSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for language in self.iter() {
            f.write_str(language.flag())?;
        }
        Ok(())
    }
}
