use serde::{Deserialize, Serialize};

/// Explanation language declared by the client. Unknown codes fall back to English.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    En,
    Fr,
    Ar,
}

impl Language {
    pub fn from_code(code: Option<&str>) -> Self {
        match code.map(|c| c.trim().to_ascii_lowercase()).as_deref() {
            Some("fr") => Language::Fr,
            Some("ar") => Language::Ar,
            _ => Language::En,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Language::En => "en",
            Language::Fr => "fr",
            Language::Ar => "ar",
        }
    }

    /// Selects the variant of a fixed string for this language.
    pub fn pick<'a>(&self, en: &'a str, fr: &'a str, ar: &'a str) -> &'a str {
        match self {
            Language::En => en,
            Language::Fr => fr,
            Language::Ar => ar,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_code() {
        assert_eq!(Language::from_code(Some("fr")), Language::Fr);
        assert_eq!(Language::from_code(Some(" AR ")), Language::Ar);
        assert_eq!(Language::from_code(Some("de")), Language::En);
        assert_eq!(Language::from_code(None), Language::En);
    }
}
