//! Languages the site ships dictionaries for.
//!
//! Built once on first access and immutable afterwards. Everything that asks
//! "is this code supported?" goes through here.

use std::sync::OnceLock;

#[derive(Debug, Clone)]
pub struct LanguageConfig {
    /// ISO 639-1 code, also the stem of `lang/{code}.json`.
    pub code: &'static str,
    /// Shown next to the code in the shell's `state` output.
    pub native_name: &'static str,
    /// Fallback for missing or unsupported codes.
    pub is_default: bool,
    pub enabled: bool,
}

pub struct LanguageRegistry {
    languages: Vec<LanguageConfig>,
}

static REGISTRY: OnceLock<LanguageRegistry> = OnceLock::new();

impl LanguageRegistry {
    pub fn get() -> &'static LanguageRegistry {
        REGISTRY.get_or_init(|| LanguageRegistry {
            languages: site_languages(),
        })
    }

    /// Exact, case-sensitive lookup.
    pub fn get_by_code(&self, code: &str) -> Option<&LanguageConfig> {
        self.languages.iter().find(|lang| lang.code == code)
    }

    /// The language flagged `is_default`, else the first registered one.
    pub fn default_language(&self) -> &LanguageConfig {
        self.languages
            .iter()
            .find(|lang| lang.is_default)
            .unwrap_or(&self.languages[0])
    }
}

/// German first, with an English translation.
fn site_languages() -> Vec<LanguageConfig> {
    vec![
        LanguageConfig {
            code: "de",
            native_name: "Deutsch",
            is_default: true,
            enabled: true,
        },
        LanguageConfig {
            code: "en",
            native_name: "English",
            is_default: false,
            enabled: true,
        },
    ]
}
