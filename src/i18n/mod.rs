//! Internationalization (i18n) module for the site's language switch.
//!
//! # Architecture
//!
//! - `registry`: Single source of truth for all supported languages and their metadata
//! - `language`: Validated `Language` type; unsupported codes never get past it
//! - `dictionary`: Immutable key → string translation maps
//! - `apply`: Writes a dictionary into tagged elements of the document
//! - `manager`: Loads, caches, applies and persists the active language
//! - `metrics`: Dictionary cache and fetch counters
//!
//! # Example
//!
//! ```rust,ignore
//! use folio_shell::i18n::Language;
//!
//! let english = Language::from_code("en")?;
//! let fallback = Language::resolve("fr"); // German, with a warning
//! assert_eq!(fallback.native_name(), "Deutsch");
//! ```

pub mod apply;
mod dictionary;
mod language;
mod manager;
mod metrics;
mod registry;

pub use dictionary::TranslationDictionary;
pub use language::{Language, UnsupportedLanguage};
pub use manager::{LanguageManager, LanguageOutcome, LanguageView, STORAGE_KEY};
pub use metrics::{MetricsReport, TranslationMetrics};
pub use registry::{LanguageConfig, LanguageRegistry};
