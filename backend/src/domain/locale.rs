//! Locale handling for the bilingual (English/Arabic) surface.

use std::fmt;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Supported user-facing languages.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    /// English, the default.
    #[default]
    En,
    /// Arabic.
    Ar,
}

impl Locale {
    /// Stable storage representation.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::En => "en",
            Self::Ar => "ar",
        }
    }

    /// Parse a stored or user-supplied language tag such as `ar` or `en-GB`.
    pub fn parse(raw: &str) -> Option<Self> {
        let primary = raw.trim().split(['-', '_']).next()?.to_ascii_lowercase();
        match primary.as_str() {
            "en" => Some(Self::En),
            "ar" => Some(Self::Ar),
            _ => None,
        }
    }

    /// Guess the language of free text: any Arabic script selects Arabic.
    pub fn detect(text: &str) -> Self {
        if text.chars().any(is_arabic) {
            Self::Ar
        } else {
            Self::En
        }
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

const fn is_arabic(ch: char) -> bool {
    matches!(
        ch,
        '\u{0600}'..='\u{06FF}'
            | '\u{0750}'..='\u{077F}'
            | '\u{08A0}'..='\u{08FF}'
            | '\u{FB50}'..='\u{FDFF}'
            | '\u{FE70}'..='\u{FEFF}'
    )
}

/// Validation errors for [`LocalizedText`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LocalizedTextError {
    /// English text was blank.
    #[error("english text must not be empty")]
    EmptyEnglish,
    /// One of the translations exceeded the allowed length.
    #[error("text must be at most {max} characters")]
    TooLong {
        /// Limit that was exceeded.
        max: usize,
    },
}

/// Text with a mandatory English value and an optional Arabic translation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct LocalizedText {
    en: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    ar: Option<String>,
}

impl LocalizedText {
    /// Validate and construct text, trimming both values. Blank Arabic text
    /// is treated as missing.
    pub fn new(
        en: impl AsRef<str>,
        ar: Option<&str>,
        max: usize,
    ) -> Result<Self, LocalizedTextError> {
        let en = en.as_ref().trim();
        if en.is_empty() {
            return Err(LocalizedTextError::EmptyEnglish);
        }
        let ar = ar.map(str::trim).filter(|value| !value.is_empty());
        let too_long = |value: &str| value.chars().count() > max;
        if too_long(en) || ar.is_some_and(too_long) {
            return Err(LocalizedTextError::TooLong { max });
        }
        Ok(Self {
            en: en.to_owned(),
            ar: ar.map(str::to_owned),
        })
    }

    /// Build text from trusted templates without length checks.
    pub fn from_pair(en: impl Into<String>, ar: impl Into<String>) -> Self {
        Self {
            en: en.into(),
            ar: Some(ar.into()),
        }
    }

    /// Rehydrate text that was validated before it was stored.
    pub fn from_stored(en: String, ar: Option<String>) -> Self {
        Self { en, ar }
    }

    /// English value.
    pub fn en(&self) -> &str {
        self.en.as_str()
    }

    /// Arabic value, if translated.
    pub fn ar(&self) -> Option<&str> {
        self.ar.as_deref()
    }

    /// Pick the value for `locale`, falling back to English.
    pub fn get(&self, locale: Locale) -> &str {
        match locale {
            Locale::Ar => self.ar.as_deref().unwrap_or(&self.en),
            Locale::En => &self.en,
        }
    }

    /// Case-insensitive substring match against either language.
    pub fn contains_ignore_case(&self, needle: &str) -> bool {
        let needle = needle.to_lowercase();
        self.en.to_lowercase().contains(&needle)
            || self
                .ar
                .as_deref()
                .is_some_and(|ar| ar.to_lowercase().contains(&needle))
    }
}
