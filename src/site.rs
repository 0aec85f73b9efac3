//! One running copy of the site: the browsing context plus everything wired
//! into it, driven from the outside like a user would.

use std::fmt;
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::browser::{BrowsingContext, SharedContext};
use crate::config::Config;
use crate::dom::Document;
use crate::error::ShellError;
use crate::events::{EventBus, SignalKind};
use crate::fetch::Fetcher;
use crate::i18n::{Language, LanguageManager, LanguageOutcome, MetricsReport};
use crate::interaction::{ClickOutcome, Interactions, TaskSet};
use crate::loader::{NavigationOutcome, PageLoader};
use crate::storage::LocalStorage;
use crate::widgets::{
    mount, ContactForm, DailyQuote, HobbyCarousel, SkillFilters, SkillsChart, SpotifyToggle, Timeline,
    WeatherWidget, Widget,
};

/// Bootstrap classes the page markup puts on `<html>` before any script runs.
const PAGE_LOADING_CLASS: &str = "page-loading";
const I18N_LOADING_CLASS: &str = "i18n-loading";

pub struct Site {
    context: SharedContext,
    bus: Arc<EventBus>,
    interactions: Arc<Interactions>,
    loader: Arc<PageLoader>,
    language: Arc<LanguageManager>,
}

/// Snapshot for the `state` command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteStatus {
    pub path: String,
    pub language: Language,
    pub history_len: usize,
    pub cached_pages: usize,
    pub pending_tasks: usize,
    pub full_navigation: Option<String>,
}

impl fmt::Display for SiteStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "path:           {}", self.path)?;
        writeln!(f, "language:       {} ({})", self.language, self.language.native_name())?;
        writeln!(f, "history:        {} entries", self.history_len)?;
        writeln!(f, "cached pages:   {}", self.cached_pages)?;
        write!(f, "pending tasks:  {}", self.pending_tasks)?;
        if let Some(url) = &self.full_navigation {
            write!(f, "\nfull navigation requested: {url}")?;
        }
        Ok(())
    }
}

impl Site {
    /// Load the entry page and bring every component up, in the order the
    /// page scripts initialize: navigation, translations, then widgets.
    pub async fn boot(config: &Config, fetcher: Arc<dyn Fetcher>, storage: Arc<LocalStorage>) -> Result<Self, ShellError> {
        info!("Booting site from {}", config.entry_path);
        let html = fetcher
            .get_text(&config.entry_path)
            .await
            .map_err(ShellError::EntryPage)?;

        let mut document = Document::parse(&html);
        if !document.exists("main") {
            return Err(ShellError::MissingMain(config.entry_path.clone()));
        }
        let root = document.document_element_mut();
        root.add_class(PAGE_LOADING_CLASS);
        root.add_class(I18N_LOADING_CLASS);

        let context = SharedContext::new(BrowsingContext::new(document, &config.entry_path));
        let bus = Arc::new(EventBus::new());
        let interactions = Arc::new(Interactions::new(context.clone(), TaskSet::new()));

        let loader = Arc::new(
            PageLoader::new(context.clone(), Arc::clone(&fetcher), Arc::clone(&bus))
                .with_timings(config.transition_timings())
                .with_stale_guard(config.guard_stale_results),
        );
        let language = Arc::new(
            LanguageManager::new(context.clone(), Arc::clone(&fetcher), Arc::clone(&storage), Arc::clone(&bus))
                .with_lang_dir(&config.lang_dir)
                .with_stale_guard(config.guard_stale_results),
        );

        loader.init(&interactions);

        // Swapped-in markup arrives untranslated; translate it before any
        // widget sees the signal.
        let weak = Arc::downgrade(&language);
        bus.subscribe(SignalKind::PageContentLoaded, move |_| {
            if let Some(language) = weak.upgrade() {
                language.reapply();
            }
        });

        if let LanguageOutcome::Failed(e) = language.init_language(&interactions).await {
            warn!("Starting without translations: {}", e);
        }

        let widgets = build_widgets(config, &context, &language, &fetcher, &storage);
        mount(&widgets, &bus, &interactions);

        let settle = config.transition_timings().settle;
        let page = context.clone();
        interactions.tasks().spawn(async move {
            tokio::time::sleep(settle).await;
            page.with_document(|doc| doc.document_element_mut().remove_class(PAGE_LOADING_CLASS));
        });

        info!("Site ready with {} widgets", widgets.len());
        Ok(Self {
            context,
            bus,
            interactions,
            loader,
            language,
        })
    }

    /// Click the first element matching `selector`. Work the click starts
    /// runs in the background; see [`Site::idle`].
    pub fn click(&self, selector: &str) -> Option<ClickOutcome> {
        self.interactions.click_selector(selector)
    }

    pub fn press_key(&self, key: &str) -> usize {
        self.interactions.press_key(key)
    }

    /// Navigate in place to `href`, as a nav link would.
    pub async fn open(&self, href: &str) -> NavigationOutcome {
        self.loader.load_page(href, true).await
    }

    /// `None` when there is no entry to go back to or the entry carries no
    /// page.
    pub async fn back(&self) -> Option<NavigationOutcome> {
        let pop = self.context.with(|ctx| ctx.back())?;
        debug!("popstate to {}", pop.url);
        self.loader.handle_popstate(&pop).await
    }

    pub async fn forward(&self) -> Option<NavigationOutcome> {
        let pop = self.context.with(|ctx| ctx.forward())?;
        debug!("popstate to {}", pop.url);
        self.loader.handle_popstate(&pop).await
    }

    pub async fn set_language(&self, code: &str) -> LanguageOutcome {
        self.language.set_language(code).await
    }

    /// Wait for every background task (transitions, widget fetches, timers).
    pub async fn idle(&self) {
        self.interactions.tasks().drain().await;
    }

    /// Outer markup of every element matching `selector`, or of the main
    /// region when no selector is given.
    pub fn markup(&self, selector: Option<&str>) -> Vec<String> {
        let selector = selector.unwrap_or("main");
        self.context
            .with_document(|doc| doc.select(selector).into_iter().map(|el| el.outer_html()).collect())
    }

    pub fn status(&self) -> SiteStatus {
        let (path, history_len, full_navigation) = self.context.with(|ctx| {
            (
                format!("{}{}", ctx.location.pathname(), ctx.location.search()),
                ctx.history.len(),
                ctx.location.assigned().map(str::to_string),
            )
        });
        SiteStatus {
            path,
            language: self.language.current_language(),
            history_len,
            cached_pages: self.loader.cached_pages(),
            pending_tasks: self.interactions.tasks().pending(),
            full_navigation,
        }
    }

    pub fn translation_metrics(&self) -> MetricsReport {
        self.language.metrics().report()
    }

    pub fn context(&self) -> &SharedContext {
        &self.context
    }

    pub fn bus(&self) -> &Arc<EventBus> {
        &self.bus
    }

    pub fn language(&self) -> &Arc<LanguageManager> {
        &self.language
    }

    pub fn loader(&self) -> &Arc<PageLoader> {
        &self.loader
    }
}

fn build_widgets(
    config: &Config,
    context: &SharedContext,
    language: &LanguageManager,
    fetcher: &Arc<dyn Fetcher>,
    storage: &Arc<LocalStorage>,
) -> Vec<Arc<dyn Widget>> {
    vec![
        Arc::new(SkillFilters::new(context.clone())),
        Arc::new(Timeline::new(context.clone(), language.view())),
        Arc::new(HobbyCarousel::new(context.clone())),
        Arc::new(SkillsChart::new(context.clone(), language.view())),
        Arc::new(SpotifyToggle::new(
            context.clone(),
            language.view(),
            &config.spotify_playlist_id,
        )),
        Arc::new(DailyQuote::new(
            context.clone(),
            Arc::clone(storage),
            Arc::clone(fetcher),
            &config.quote_api_url,
        )),
        Arc::new(WeatherWidget::new(
            context.clone(),
            Arc::clone(storage),
            Arc::clone(fetcher),
            config,
        )),
        Arc::new(ContactForm::new(context.clone())),
    ]
}
