//! Language type: validated language representation.
//!
//! A `Language` can only be built from a code the registry knows and has
//! enabled, so holding one is proof the site ships a dictionary for it.

use std::fmt;

use serde::{Serialize, Serializer};
use thiserror::Error;
use tracing::warn;

use crate::i18n::LanguageRegistry;

/// A code that is not one of the supported languages.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unsupported language code '{0}'")]
pub struct UnsupportedLanguage(pub String);

/// A validated language.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Language {
    /// ISO 639-1 language code (e.g., "de", "en")
    code: &'static str,
}

impl Language {
    pub const GERMAN: Language = Language { code: "de" };

    pub const ENGLISH: Language = Language { code: "en" };

    /// Create a Language from a language code string.
    ///
    /// # Returns
    /// * `Ok(Language)` if the code is valid and the language is enabled
    /// * `Err(UnsupportedLanguage)` if the code is unknown or disabled
    pub fn from_code(code: &str) -> Result<Language, UnsupportedLanguage> {
        match LanguageRegistry::get().get_by_code(code) {
            Some(config) if config.enabled => Ok(Language { code: config.code }),
            _ => Err(UnsupportedLanguage(code.to_string())),
        }
    }

    /// Like `from_code`, but substitutes the default language for anything
    /// unsupported and logs the substitution.
    pub fn resolve(code: &str) -> Language {
        Language::from_code(code).unwrap_or_else(|e| {
            let fallback = Language::default();
            warn!("{}. Falling back to {}", e, fallback);
            fallback
        })
    }

    /// Get the ISO 639-1 language code.
    pub fn code(&self) -> &'static str {
        self.code
    }

    /// The language's own name for itself ("Deutsch").
    pub fn native_name(&self) -> &'static str {
        let registry = LanguageRegistry::get();
        registry
            .get_by_code(self.code)
            .unwrap_or_else(|| registry.default_language())
            .native_name
    }
}

impl Default for Language {
    /// The registry's fallback language (German).
    fn default() -> Self {
        Language {
            code: LanguageRegistry::get().default_language().code,
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code)
    }
}

impl Serialize for Language {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.code)
    }
}
