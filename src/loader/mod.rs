//! Single-page navigation: swap the `<main>` region instead of reloading.

mod cache;
mod transition;

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde_json::json;
use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::browser::{PopState, ScrollBehavior, SharedContext};
use crate::dom::{Document, Element};
use crate::error::FetchError;
use crate::events::{EventBus, Signal};
use crate::fetch::Fetcher;
use crate::interaction::{ClickEvent, ClickResponse, Interactions};

pub use cache::PageCache;
pub use transition::{TransitionTimings, LOADED_CLASS, SLIDE_TRANSITION, TRANSITIONING_CLASS};

/// Links the loader intercepts.
pub const NAV_LINK_SELECTOR: &str = "nav a";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NavigationError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("{0} has no <main> region")]
    MissingMain(String),
}

/// How a `load_page` call ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavigationOutcome {
    /// The new main region is in place.
    Swapped,
    /// A later navigation started first; this one stopped without touching
    /// the page further.
    Superseded,
    /// The page could not be loaded in place; a full navigation to `url` was
    /// requested instead.
    FellBack { url: String, error: NavigationError },
}

pub struct PageLoader {
    context: SharedContext,
    fetcher: Arc<dyn Fetcher>,
    bus: Arc<EventBus>,
    cache: Mutex<PageCache>,
    timings: TransitionTimings,
    guard_stale_results: bool,
    generation: AtomicU64,
}

impl PageLoader {
    pub fn new(context: SharedContext, fetcher: Arc<dyn Fetcher>, bus: Arc<EventBus>) -> Self {
        Self {
            context,
            fetcher,
            bus,
            cache: Mutex::new(PageCache::new()),
            timings: TransitionTimings::default(),
            guard_stale_results: true,
            generation: AtomicU64::new(0),
        }
    }

    pub fn with_timings(mut self, timings: TransitionTimings) -> Self {
        self.timings = timings;
        self
    }

    /// When off, overlapping navigations all run to completion and the last
    /// to finish owns the page.
    pub fn with_stale_guard(mut self, enabled: bool) -> Self {
        self.guard_stale_results = enabled;
        self
    }

    pub fn cached_pages(&self) -> usize {
        self.cache_lock().len()
    }

    /// Whether the page `url` points at, seen from the current location, is
    /// cached.
    pub fn is_cached(&self, url: &str) -> bool {
        let path = self.context.with(|ctx| ctx.location.resolve(url));
        self.cache_lock().contains(&path)
    }

    /// Set up the initial page: seed the history entry, mark the current
    /// link and wire nav link interception.
    pub fn init(self: &Arc<Self>, interactions: &Interactions) {
        self.context.with(|ctx| {
            let pathname = ctx.location.pathname().to_string();
            ctx.replace_state(json!({ "url": pathname.clone() }), &pathname);
            update_active_nav_link(&mut ctx.document, &pathname);
            if let Some(main) = ctx.document.first_mut("main") {
                main.add_class(LOADED_CLASS);
            }
        });

        let loader = Arc::clone(self);
        let wired = interactions.on_click(NAV_LINK_SELECTOR, move |event| loader.handle_link_click(event));
        if let Err(e) = wired {
            warn!("Navigation links not wired: {}", e);
        }
        debug!("Page loader initialized");
    }

    /// Intercept a nav link: never a full navigation, and no load when the
    /// link already points at the current page.
    pub fn handle_link_click(self: &Arc<Self>, event: &ClickEvent) -> ClickResponse {
        if event.element.has_class("active") {
            debug!("Link already active, not reloading");
            return ClickResponse::prevented();
        }
        let Some(href) = event.element.attr("href").map(str::to_string) else {
            warn!("Navigation link without href");
            return ClickResponse::prevented();
        };

        let loader = Arc::clone(self);
        ClickResponse::prevented().with_task(async move {
            loader.load_page(&href, true).await;
        })
    }

    /// Back/forward: load the entry's page without pushing a new entry.
    /// Entries without a `url` in their state are ignored.
    pub async fn handle_popstate(&self, pop: &PopState) -> Option<NavigationOutcome> {
        let url = pop.state_url()?.to_string();
        Some(self.load_page(&url, false).await)
    }

    /// Load `url` into the main region with the fade/slide transition.
    ///
    /// `url` is resolved against the current location first; the resulting
    /// site-relative path is what gets fetched, cached and recorded.
    pub async fn load_page(&self, url: &str, push_history: bool) -> NavigationOutcome {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let target = self.context.with(|ctx| ctx.location.resolve(url));
        let url = target.as_str();
        debug!("Loading {} (navigation {})", url, generation);

        let live_main = self.context.with_document(|doc| {
            doc.first_mut("main")
                .map(|main| main.add_class(TRANSITIONING_CLASS))
                .is_some()
        });
        if !live_main {
            return self.fall_back(url, NavigationError::MissingMain("current page".to_string()), generation);
        }

        let new_main = match self.resolve_main(url).await {
            Ok(main) => main,
            Err(e) => return self.fall_back(url, e, generation),
        };
        if self.is_stale(generation) {
            return self.superseded(url);
        }

        tokio::time::sleep(self.timings.fade_out).await;
        if self.is_stale(generation) {
            return self.superseded(url);
        }

        self.context.with(|ctx| {
            if let Some(main) = ctx.document.first_mut("main") {
                main.replace_children(new_main.children().to_vec());
                main.set_class_name(new_main.class_name());
            }
            update_active_nav_link(&mut ctx.document, url);
            if push_history {
                ctx.push_state(json!({ "url": url }), url);
            }
            if let Some(main) = ctx.document.first_mut("main") {
                transition::reset_for_entry(main);
            }
        });

        self.timings.next_frame().await;
        self.context.with_document(|doc| {
            if let Some(main) = doc.first_mut("main") {
                transition::start_entry(main);
            }
        });

        self.timings.next_frame().await;
        self.bus.emit(&Signal::PageContentLoaded);

        tokio::time::sleep(self.timings.settle).await;
        if self.is_stale(generation) {
            // The newer navigation finishes the transition itself.
            return NavigationOutcome::Swapped;
        }
        self.context.with(|ctx| {
            if let Some(main) = ctx.document.first_mut("main") {
                transition::finish(main);
            }
            ctx.viewport.scroll_to_top(ScrollBehavior::Smooth);
        });

        info!("Loaded {}", url);
        NavigationOutcome::Swapped
    }

    async fn resolve_main(&self, url: &str) -> Result<Element, NavigationError> {
        let cached = self.cache_lock().get(url).map(str::to_string);
        let html = match cached {
            Some(html) => {
                debug!("Serving {} from page cache", url);
                html
            }
            None => {
                let html = self.fetcher.get_text(url).await?;
                self.cache_lock().insert(url, html.clone());
                html
            }
        };
        extract_main(&html).ok_or_else(|| NavigationError::MissingMain(url.to_string()))
    }

    fn fall_back(&self, url: &str, error: NavigationError, generation: u64) -> NavigationOutcome {
        if self.is_stale(generation) {
            debug!("Ignoring failure of superseded navigation to {}: {}", url, error);
            return NavigationOutcome::Superseded;
        }

        error!("Failed to load {}: {}", url, error);
        self.context.with(|ctx| {
            if let Some(main) = ctx.document.first_mut("main") {
                main.remove_class(TRANSITIONING_CLASS);
            }
            ctx.location.assign(url);
        });
        NavigationOutcome::FellBack {
            url: url.to_string(),
            error,
        }
    }

    fn superseded(&self, url: &str) -> NavigationOutcome {
        debug!("Navigation to {} superseded", url);
        NavigationOutcome::Superseded
    }

    fn is_stale(&self, generation: u64) -> bool {
        self.guard_stale_results && self.generation.load(Ordering::SeqCst) != generation
    }

    fn cache_lock(&self) -> MutexGuard<'_, PageCache> {
        self.cache.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// The `<main>` element of a full page, detached from its document.
pub fn extract_main(html: &str) -> Option<Element> {
    Document::parse(html).first("main").cloned()
}

/// Mark the nav link for `url` active and every other one inactive.
///
/// Links are matched on the last path segment of `url`, with the site root
/// mapping to `index.html`.
pub fn update_active_nav_link(document: &mut Document, url: &str) {
    let path = url.split(['?', '#']).next().unwrap_or_default();
    let filename = match path.rsplit('/').next() {
        Some(segment) if !segment.is_empty() => segment,
        _ => "index.html",
    };

    document.for_each_mut(NAV_LINK_SELECTOR, |link| {
        let is_current = link.attr("href") == Some(filename);
        link.toggle_class("active", is_current);
    });
}
