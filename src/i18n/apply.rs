//! Writing a dictionary into the document.
//!
//! These are plain functions over `&mut Document` so the manager can run them
//! inside one short borrow of the browsing context.

use tracing::debug;

use crate::dom::Document;
use crate::i18n::{Language, TranslationDictionary};

pub const TEXT_ATTR: &str = "data-i18n";
pub const PLACEHOLDER_ATTR: &str = "data-i18n-placeholder";
pub const HTML_ATTR: &str = "data-i18n-html";

/// Language toggle controls in the header.
pub const LANG_SWITCH_SELECTOR: &str = ".lang-switch span";

/// Apply every tagged element's translation. Elements whose key is missing
/// keep their current content. Returns how many elements changed.
pub fn apply_translations(document: &mut Document, dictionary: &TranslationDictionary) -> usize {
    let mut updated = 0;

    for path in document.select_paths("[data-i18n]") {
        let Some(el) = document.element_mut(&path) else {
            continue;
        };
        let Some(text) = el.attr(TEXT_ATTR).and_then(|key| dictionary.lookup(key)) else {
            continue;
        };
        let text = text.to_string();
        if el.has_attr("placeholder") {
            el.set_attr("placeholder", &text);
        } else {
            el.set_text_content(&text);
        }
        updated += 1;
    }

    updated += document.for_each_mut("[data-i18n-placeholder]", |el| {
        if let Some(text) = el.attr(PLACEHOLDER_ATTR).and_then(|key| dictionary.lookup(key)) {
            let text = text.to_string();
            el.set_attr("placeholder", &text);
        }
    });

    // Rich content is injected as markup, unsanitized. Dictionaries are
    // served from the site itself and are trusted.
    // Deepest-last order keeps the remaining paths valid while subtrees are
    // replaced.
    for path in document.select_paths("[data-i18n-html]").into_iter().rev() {
        let Some(el) = document.element_mut(&path) else {
            continue;
        };
        if let Some(markup) = el.attr(HTML_ATTR).and_then(|key| dictionary.lookup(key)) {
            let markup = markup.to_string();
            el.set_inner_html(&markup);
            updated += 1;
        }
    }

    debug!("Applied translations to {} elements", updated);
    updated
}

/// Mark the toggle for `language` active and every other toggle inactive.
pub fn update_language_ui(document: &mut Document, language: Language) {
    document.for_each_mut(LANG_SWITCH_SELECTOR, |span| {
        let is_active = span.attr("data-lang") == Some(language.code());
        span.toggle_class("active", is_active);
    });
}

pub fn set_html_lang(document: &mut Document, language: Language) {
    document.document_element_mut().set_attr("lang", language.code());
}

/// Swap the bootstrap `i18n-loading` class on `<html>` for `i18n-ready`.
pub fn mark_ready(document: &mut Document) {
    let root = document.document_element_mut();
    root.remove_class("i18n-loading");
    root.add_class("i18n-ready");
}
