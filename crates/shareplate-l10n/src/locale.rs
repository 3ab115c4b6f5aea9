//! Supported locales and their static display metadata

use serde::{Deserialize, Serialize};

/// Writing direction for a locale
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextDirection {
    Ltr,
    Rtl,
}

/// Supported locales
///
/// Serde serializes each variant to its short code (e.g. `"en"`), which is
/// also the code used in persisted records and on the wire.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum LocaleCode {
    #[serde(rename = "en")]
    English,
    #[serde(rename = "es")]
    Spanish,
    #[serde(rename = "fr")]
    French,
    #[serde(rename = "de")]
    German,
    #[serde(rename = "pt")]
    Portuguese,
    #[serde(rename = "ru")]
    Russian,
    #[serde(rename = "pl")]
    Polish,
    #[serde(rename = "ar")]
    Arabic,
}

impl Default for LocaleCode {
    fn default() -> Self {
        Self::English
    }
}

impl LocaleCode {
    /// Get the short language code for this locale
    pub fn code(&self) -> &'static str {
        match self {
            Self::English => "en",
            Self::Spanish => "es",
            Self::French => "fr",
            Self::German => "de",
            Self::Portuguese => "pt",
            Self::Russian => "ru",
            Self::Polish => "pl",
            Self::Arabic => "ar",
        }
    }

    /// Get the extended language code for this locale
    pub fn extended_code(&self) -> &'static str {
        match self {
            Self::English => "en-US",
            Self::Spanish => "es-ES",
            Self::French => "fr-FR",
            Self::German => "de-DE",
            Self::Portuguese => "pt-PT",
            Self::Russian => "ru-RU",
            Self::Polish => "pl-PL",
            Self::Arabic => "ar-SA",
        }
    }

    /// Parse a locale from a short or extended language code
    pub fn from_code(code: &str) -> Option<Self> {
        let primary = code.split(['-', '_']).next().unwrap_or(code);
        match primary {
            "en" => Some(Self::English),
            "es" => Some(Self::Spanish),
            "fr" => Some(Self::French),
            "de" => Some(Self::German),
            "pt" => Some(Self::Portuguese),
            "ru" => Some(Self::Russian),
            "pl" => Some(Self::Polish),
            "ar" => Some(Self::Arabic),
            _ => None,
        }
    }

    /// Get all supported locales
    pub fn all() -> Vec<Self> {
        vec![
            Self::English,
            Self::Spanish,
            Self::French,
            Self::German,
            Self::Portuguese,
            Self::Russian,
            Self::Polish,
            Self::Arabic,
        ]
    }

    /// Get the English display name for this locale
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::English => "English",
            Self::Spanish => "Spanish",
            Self::French => "French",
            Self::German => "German",
            Self::Portuguese => "Portuguese",
            Self::Russian => "Russian",
            Self::Polish => "Polish",
            Self::Arabic => "Arabic",
        }
    }

    /// Get the native display name for this locale
    pub fn native_name(&self) -> &'static str {
        match self {
            Self::English => "English",
            Self::Spanish => "Español",
            Self::French => "Français",
            Self::German => "Deutsch",
            Self::Portuguese => "Português",
            Self::Russian => "Русский",
            Self::Polish => "Polski",
            Self::Arabic => "العربية",
        }
    }

    /// Get the writing direction for this locale
    pub fn direction(&self) -> TextDirection {
        match self {
            Self::Arabic => TextDirection::Rtl,
            _ => TextDirection::Ltr,
        }
    }

    /// Get the default region for this locale
    pub fn region(&self) -> &'static str {
        match self {
            Self::English => "US",
            Self::Spanish => "ES",
            Self::French => "FR",
            Self::German => "DE",
            Self::Portuguese => "PT",
            Self::Russian => "RU",
            Self::Polish => "PL",
            Self::Arabic => "SA",
        }
    }
}

impl std::fmt::Display for LocaleCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_code_round_trip() {
        for locale in LocaleCode::all() {
            assert_eq!(LocaleCode::from_code(locale.code()), Some(locale));
            assert_eq!(LocaleCode::from_code(locale.extended_code()), Some(locale));
        }
    }

    #[test]
    fn test_unsupported_code() {
        assert_eq!(LocaleCode::from_code("xx"), None);
        assert_eq!(LocaleCode::from_code(""), None);
    }

    #[test]
    fn test_serde_uses_short_code() {
        let json = serde_json::to_string(&LocaleCode::Russian).unwrap();
        assert_eq!(json, "\"ru\"");
        let parsed: LocaleCode = serde_json::from_str("\"pl\"").unwrap();
        assert_eq!(parsed, LocaleCode::Polish);
    }

    #[test]
    fn test_direction() {
        assert_eq!(LocaleCode::Arabic.direction(), TextDirection::Rtl);
        assert_eq!(LocaleCode::English.direction(), TextDirection::Ltr);
    }
}
