//! Language selection: load, apply, persist and announce dictionaries.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::{debug, error, info, warn};

use crate::browser::SharedContext;
use crate::error::FetchError;
use crate::events::{EventBus, Signal};
use crate::fetch::Fetcher;
use crate::i18n::apply::{self, LANG_SWITCH_SELECTOR};
use crate::i18n::{Language, TranslationDictionary, TranslationMetrics};
use crate::interaction::{ClickResponse, Interactions};
use crate::storage::LocalStorage;

/// Storage key holding the selected language code.
pub const STORAGE_KEY: &str = "portfolio_language";

/// How a `set_language` call ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LanguageOutcome {
    /// The dictionary was applied and `languageChanged` broadcast.
    Applied(Language),
    /// A later call started while this one was loading; nothing was applied.
    Superseded(Language),
    /// The dictionary could not be loaded; the previous language stays.
    Failed(FetchError),
}

#[derive(Debug, Default)]
struct LanguageState {
    current: Option<Language>,
    dictionary: TranslationDictionary,
}

/// Read-only access to the active language for widgets.
#[derive(Debug, Clone)]
pub struct LanguageView {
    state: Arc<Mutex<LanguageState>>,
}

impl LanguageView {
    /// Active language, or the default before the first successful switch.
    pub fn current(&self) -> Language {
        self.lock().current.unwrap_or_default()
    }

    /// Active dictionary; empty before the first successful switch.
    pub fn dictionary(&self) -> TranslationDictionary {
        self.lock().dictionary.clone()
    }

    pub fn is_ready(&self) -> bool {
        self.lock().current.is_some()
    }

    pub fn translate(&self, key: &str) -> Option<String> {
        self.lock().dictionary.lookup(key).map(str::to_string)
    }

    fn lock(&self) -> MutexGuard<'_, LanguageState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

pub struct LanguageManager {
    context: SharedContext,
    fetcher: Arc<dyn Fetcher>,
    storage: Arc<LocalStorage>,
    bus: Arc<EventBus>,
    lang_dir: String,
    guard_stale_results: bool,
    state: Arc<Mutex<LanguageState>>,
    cache: Mutex<HashMap<Language, TranslationDictionary>>,
    generation: AtomicU64,
    metrics: TranslationMetrics,
}

impl LanguageManager {
    pub fn new(
        context: SharedContext,
        fetcher: Arc<dyn Fetcher>,
        storage: Arc<LocalStorage>,
        bus: Arc<EventBus>,
    ) -> Self {
        Self {
            context,
            fetcher,
            storage,
            bus,
            lang_dir: "lang".to_string(),
            guard_stale_results: true,
            state: Arc::new(Mutex::new(LanguageState::default())),
            cache: Mutex::new(HashMap::new()),
            generation: AtomicU64::new(0),
            metrics: TranslationMetrics::new(),
        }
    }

    /// Directory the `{code}.json` dictionaries are served from.
    pub fn with_lang_dir(mut self, lang_dir: &str) -> Self {
        self.lang_dir = lang_dir.trim_end_matches('/').to_string();
        self
    }

    /// When off, every completed load is applied even if a newer one started,
    /// so the last load to finish wins.
    pub fn with_stale_guard(mut self, enabled: bool) -> Self {
        self.guard_stale_results = enabled;
        self
    }

    pub fn view(&self) -> LanguageView {
        LanguageView {
            state: Arc::clone(&self.state),
        }
    }

    /// Active language, or the default before initialization.
    pub fn current_language(&self) -> Language {
        self.view().current()
    }

    pub fn current_dictionary(&self) -> TranslationDictionary {
        self.view().dictionary()
    }

    pub fn metrics(&self) -> &TranslationMetrics {
        &self.metrics
    }

    /// URL of the dictionary resource for `language`.
    pub fn dictionary_url(&self, language: Language) -> String {
        format!("{}/{}.json", self.lang_dir, language.code())
    }

    /// Switch the page to `code`.
    ///
    /// Unsupported codes become the default language. On any load failure
    /// the document, the persisted choice and the active language are left
    /// untouched.
    pub async fn set_language(&self, code: &str) -> LanguageOutcome {
        let language = Language::resolve(code);
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;

        let loaded = self.load_dictionary(language).await;

        if self.guard_stale_results && self.generation.load(Ordering::SeqCst) != generation {
            debug!("Discarding superseded switch to {}", language);
            return LanguageOutcome::Superseded(language);
        }

        let dictionary = match loaded {
            Ok(dictionary) => dictionary,
            Err(e) => {
                error!("Failed to set language to {}: {}", language, e);
                return LanguageOutcome::Failed(e);
            }
        };

        self.context.with_document(|doc| {
            apply::apply_translations(doc, &dictionary);
            apply::update_language_ui(doc, language);
            apply::set_html_lang(doc, language);
            apply::mark_ready(doc);
        });

        {
            let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
            state.current = Some(language);
            state.dictionary = dictionary.clone();
        }
        self.storage.set_item(STORAGE_KEY, language.code());

        self.bus.emit(&Signal::LanguageChanged { language, dictionary });
        info!("Language set to: {}", language.code().to_uppercase());
        LanguageOutcome::Applied(language)
    }

    /// Translate freshly swapped-in content with the active dictionary.
    /// Nothing is fetched and no signal is emitted.
    pub fn reapply(&self) -> usize {
        let (ready, dictionary) = {
            let state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
            (state.current.is_some(), state.dictionary.clone())
        };
        if !ready {
            return 0;
        }
        let applied = self
            .context
            .with_document(|doc| apply::apply_translations(doc, &dictionary));
        debug!("Re-applied {} translations to new content", applied);
        applied
    }

    /// Apply the persisted language (default when absent), then wire the
    /// header toggles.
    pub async fn init_language(self: &Arc<Self>, interactions: &Interactions) -> LanguageOutcome {
        let saved = self
            .storage
            .get_item(STORAGE_KEY)
            .filter(|code| !code.is_empty())
            .unwrap_or_else(|| Language::default().code().to_string());
        let outcome = self.set_language(&saved).await;

        let manager = Arc::clone(self);
        let wired = interactions.on_click(LANG_SWITCH_SELECTOR, move |event| {
            let code = event.element.attr("data-lang").unwrap_or_default().to_string();
            let manager = Arc::clone(&manager);
            ClickResponse::done().with_task(async move {
                manager.set_language(&code).await;
            })
        });
        if let Err(e) = wired {
            warn!("Language toggles not wired: {}", e);
        }

        info!("i18n system initialized");
        outcome
    }

    async fn load_dictionary(&self, language: Language) -> Result<TranslationDictionary, FetchError> {
        if let Some(cached) = self.cache_lock().get(&language).cloned() {
            self.metrics.record_cache_hit();
            debug!("Loaded {} translations from cache", language);
            return Ok(cached);
        }
        self.metrics.record_cache_miss();

        let url = self.dictionary_url(language);
        let parsed = match self.fetcher.get_text(&url).await {
            Ok(body) => TranslationDictionary::from_json(&body).map_err(|e| FetchError::Malformed {
                url: url.clone(),
                reason: e.to_string(),
            }),
            Err(e) => Err(e),
        };

        match parsed {
            Ok(dictionary) => {
                self.metrics.record_fetch();
                debug!("Fetched {} with {} keys", url, dictionary.len());
                self.cache_lock().insert(language, dictionary.clone());
                Ok(dictionary)
            }
            Err(e) => {
                self.metrics.record_fetch_failure();
                Err(e)
            }
        }
    }

    fn cache_lock(&self) -> MutexGuard<'_, HashMap<Language, TranslationDictionary>> {
        self.cache.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::browser::BrowsingContext;
    use crate::dom::Document;
    use crate::events::SignalKind;
    use crate::fetch::testing::FakeFetcher;
    use crate::interaction::TaskSet;
    use std::time::Duration;

    const PAGE: &str = r#"<html class="i18n-loading"><body>
        <div class="lang-switch"><span data-lang="de">DE</span><span data-lang="en">EN</span></div>
        <main><h1 data-i18n="greeting">…</h1></main>
    </body></html>"#;

    struct Fixture {
        context: SharedContext,
        storage: Arc<LocalStorage>,
        bus: Arc<EventBus>,
        fetcher: Arc<FakeFetcher>,
        manager: Arc<LanguageManager>,
    }

    fn fixture(fetcher: FakeFetcher) -> Fixture {
        let context = SharedContext::new(BrowsingContext::new(Document::parse(PAGE), "/index.html"));
        let storage = Arc::new(LocalStorage::in_memory());
        let bus = Arc::new(EventBus::new());
        let fetcher = Arc::new(fetcher);
        let manager = Arc::new(LanguageManager::new(
            context.clone(),
            fetcher.clone(),
            storage.clone(),
            bus.clone(),
        ));
        Fixture {
            context,
            storage,
            bus,
            fetcher,
            manager,
        }
    }

    fn both_languages() -> FakeFetcher {
        FakeFetcher::new()
            .with_body("lang/de.json", r#"{"greeting": "Hallo"}"#)
            .with_body("lang/en.json", r#"{"greeting": "Hello"}"#)
    }

    fn heading(context: &SharedContext) -> String {
        context.with_document(|doc| doc.first("h1").map(|h| h.text_content()).unwrap_or_default())
    }

    // ==================== set_language Tests ====================

    #[tokio::test]
    async fn test_set_language_applies_and_persists() {
        let f = fixture(both_languages());

        let outcome = f.manager.set_language("en").await;

        assert_eq!(outcome, LanguageOutcome::Applied(Language::ENGLISH));
        assert_eq!(f.manager.current_language(), Language::ENGLISH);
        assert_eq!(f.manager.current_dictionary().lookup("greeting"), Some("Hello"));
        assert_eq!(heading(&f.context), "Hello");
        assert_eq!(f.storage.get_item(STORAGE_KEY).as_deref(), Some("en"));
        f.context.with_document(|doc| {
            let root = doc.document_element();
            assert_eq!(root.attr("lang"), Some("en"));
            assert!(root.has_class("i18n-ready"));
            assert!(!root.has_class("i18n-loading"));
            assert!(doc.first(r#"span[data-lang="en"]"#).unwrap().has_class("active"));
            assert!(!doc.first(r#"span[data-lang="de"]"#).unwrap().has_class("active"));
        });
    }

    #[tokio::test]
    async fn test_unsupported_code_uses_default() {
        let f = fixture(both_languages());

        let outcome = f.manager.set_language("fr").await;

        assert_eq!(outcome, LanguageOutcome::Applied(Language::GERMAN));
        assert_eq!(f.manager.current_language().code(), "de");
        assert_eq!(f.fetcher.request_count("lang/fr.json"), 0);
    }

    #[tokio::test]
    async fn test_cached_dictionary_not_refetched() {
        let f = fixture(both_languages());

        f.manager.set_language("de").await;
        f.manager.set_language("en").await;
        f.manager.set_language("de").await;

        assert_eq!(f.fetcher.request_count("lang/de.json"), 1);
        assert_eq!(f.fetcher.request_count("lang/en.json"), 1);
        let report = f.manager.metrics().report();
        assert_eq!(report.cache_hits, 1);
        assert_eq!(report.cache_misses, 2);
        assert_eq!(report.fetches, 2);
    }

    #[tokio::test]
    async fn test_failed_load_keeps_previous_state() {
        let f = fixture(FakeFetcher::new().with_body("lang/de.json", r#"{"greeting": "Hallo"}"#));
        f.manager.set_language("de").await;
        let before = f.context.with_document(|doc| doc.outer_html());
        let events = Arc::new(Mutex::new(0));
        let events_clone = Arc::clone(&events);
        f.bus
            .subscribe(SignalKind::LanguageChanged, move |_| *events_clone.lock().unwrap() += 1);

        let outcome = f.manager.set_language("en").await;

        assert!(matches!(outcome, LanguageOutcome::Failed(FetchError::Status { status: 404, .. })));
        assert_eq!(f.manager.current_language(), Language::GERMAN);
        assert_eq!(f.storage.get_item(STORAGE_KEY).as_deref(), Some("de"));
        assert_eq!(f.context.with_document(|doc| doc.outer_html()), before);
        assert_eq!(*events.lock().unwrap(), 0);
        assert_eq!(f.manager.metrics().fetch_failures(), 1);
    }

    #[tokio::test]
    async fn test_malformed_dictionary_is_failure() {
        let f = fixture(FakeFetcher::new().with_body("lang/de.json", r#"{"greeting": ["Hallo"]}"#));

        let outcome = f.manager.set_language("de").await;

        assert!(matches!(outcome, LanguageOutcome::Failed(FetchError::Malformed { .. })));
        assert!(!f.manager.view().is_ready());
        f.context.with_document(|doc| assert!(doc.document_element().has_class("i18n-loading")));
    }

    #[tokio::test]
    async fn test_listeners_receive_code_and_dictionary() {
        let f = fixture(both_languages());
        let received = Arc::new(Mutex::new(Vec::new()));
        let received_clone = Arc::clone(&received);
        f.bus.subscribe(SignalKind::LanguageChanged, move |signal| {
            if let Signal::LanguageChanged { language, dictionary } = signal {
                received_clone
                    .lock()
                    .unwrap()
                    .push((language.code(), dictionary.lookup("greeting").map(str::to_string)));
            }
        });

        f.manager.set_language("de").await;

        assert_eq!(*received.lock().unwrap(), vec![("de", Some("Hallo".to_string()))]);
    }

    #[tokio::test]
    async fn test_custom_lang_dir() {
        let f = fixture(FakeFetcher::new().with_body("assets/lang/en.json", r#"{"greeting": "Hello"}"#));
        let manager = LanguageManager::new(f.context.clone(), f.fetcher.clone(), f.storage.clone(), f.bus.clone())
            .with_lang_dir("assets/lang/");

        assert_eq!(manager.set_language("en").await, LanguageOutcome::Applied(Language::ENGLISH));
    }

    #[tokio::test]
    async fn test_reapply_translates_swapped_content() {
        let f = fixture(both_languages());
        assert_eq!(f.manager.reapply(), 0);

        f.manager.set_language("en").await;
        f.context.with_document(|doc| {
            doc.first_mut("main")
                .unwrap()
                .set_inner_html(r#"<h1 data-i18n="greeting">Hallo</h1>"#)
        });

        assert_eq!(f.manager.reapply(), 1);
        assert_eq!(heading(&f.context), "Hello");
        assert_eq!(f.fetcher.request_count("lang/en.json"), 1);
    }

    // ==================== Overlap Tests ====================

    fn slow_german() -> FakeFetcher {
        FakeFetcher::new()
            .with_delayed_body("lang/de.json", r#"{"greeting": "Hallo"}"#, Duration::from_millis(500))
            .with_delayed_body("lang/en.json", r#"{"greeting": "Hello"}"#, Duration::from_millis(100))
    }

    #[tokio::test(start_paused = true)]
    async fn test_superseded_switch_is_discarded() {
        let f = fixture(slow_german());

        let (first, second) = tokio::join!(f.manager.set_language("de"), f.manager.set_language("en"));

        assert_eq!(first, LanguageOutcome::Superseded(Language::GERMAN));
        assert_eq!(second, LanguageOutcome::Applied(Language::ENGLISH));
        assert_eq!(f.manager.current_language(), Language::ENGLISH);
        assert_eq!(heading(&f.context), "Hello");
    }

    #[tokio::test(start_paused = true)]
    async fn test_unguarded_last_to_finish_wins() {
        let f = fixture(slow_german());
        let manager = LanguageManager::new(f.context.clone(), f.fetcher.clone(), f.storage.clone(), f.bus.clone())
            .with_stale_guard(false);

        let (first, second) = tokio::join!(manager.set_language("de"), manager.set_language("en"));

        assert_eq!(first, LanguageOutcome::Applied(Language::GERMAN));
        assert_eq!(second, LanguageOutcome::Applied(Language::ENGLISH));
        assert_eq!(manager.current_language(), Language::GERMAN);
        assert_eq!(heading(&f.context), "Hallo");
    }

    // ==================== init_language Tests ====================

    #[tokio::test]
    async fn test_init_without_saved_language_uses_default() {
        let f = fixture(both_languages());
        let interactions = Interactions::new(f.context.clone(), TaskSet::new());

        let outcome = f.manager.init_language(&interactions).await;

        assert_eq!(outcome, LanguageOutcome::Applied(Language::GERMAN));
        assert_eq!(heading(&f.context), "Hallo");
    }

    #[tokio::test]
    async fn test_init_with_unsupported_saved_language() {
        let f = fixture(both_languages());
        f.storage.set_item(STORAGE_KEY, "fr");
        let interactions = Interactions::new(f.context.clone(), TaskSet::new());

        f.manager.init_language(&interactions).await;

        assert_eq!(f.manager.current_language().code(), "de");
        assert_eq!(f.storage.get_item(STORAGE_KEY).as_deref(), Some("de"));
    }

    #[tokio::test]
    async fn test_toggle_click_switches_language() {
        let f = fixture(both_languages());
        let interactions = Interactions::new(f.context.clone(), TaskSet::new());
        f.manager.init_language(&interactions).await;

        let outcome = interactions.click_selector(r#".lang-switch span[data-lang="en"]"#).unwrap();
        interactions.tasks().drain().await;

        assert_eq!(outcome.handled, 1);
        assert_eq!(f.manager.current_language(), Language::ENGLISH);
        assert_eq!(heading(&f.context), "Hello");
    }
}
