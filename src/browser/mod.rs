//! Browsing context: the document plus the window surfaces the scripts use.
//!
//! Everything here is mutated from one logical thread. `SharedContext` hands
//! out short synchronous borrows through `with`, so no lock is ever held
//! across an `.await`.

mod history;
mod location;

use std::sync::{Arc, Mutex, PoisonError};

use serde_json::Value;

use crate::dom::Document;

pub use history::{History, HistoryEntry, PopState};
pub use location::{resolve_path, Location};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollBehavior {
    Auto,
    Smooth,
}

/// Scroll requests issued by the page.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Viewport {
    scroll_top: u32,
    last_behavior: Option<ScrollBehavior>,
    scrolled_into_view: Option<String>,
}

impl Viewport {
    pub fn scroll_to_top(&mut self, behavior: ScrollBehavior) {
        self.scroll_top = 0;
        self.last_behavior = Some(behavior);
    }

    /// Record a request to bring the element with `id` into view.
    pub fn scroll_into_view(&mut self, id: &str, behavior: ScrollBehavior) {
        self.scrolled_into_view = Some(id.to_string());
        self.last_behavior = Some(behavior);
    }

    /// Simulate the user scrolling down the page.
    pub fn scroll_by(&mut self, delta: u32) {
        self.scroll_top = self.scroll_top.saturating_add(delta);
    }

    pub fn scroll_top(&self) -> u32 {
        self.scroll_top
    }

    pub fn last_behavior(&self) -> Option<ScrollBehavior> {
        self.last_behavior
    }

    pub fn scrolled_into_view(&self) -> Option<&str> {
        self.scrolled_into_view.as_deref()
    }
}

#[derive(Debug, Clone)]
pub struct BrowsingContext {
    pub document: Document,
    pub history: History,
    pub location: Location,
    pub viewport: Viewport,
}

impl BrowsingContext {
    pub fn new(document: Document, path: &str) -> Self {
        let location = Location::new(path);
        Self {
            document,
            history: History::new(location.pathname()),
            location,
            viewport: Viewport::default(),
        }
    }

    /// `history.pushState`: new entry, location follows without a load.
    pub fn push_state(&mut self, state: Value, url: &str) {
        let resolved = self.location.resolve(url);
        self.history.push_state(state, &resolved);
        self.location.set_path(&resolved);
    }

    /// `history.replaceState`: rewrite the current entry in place.
    pub fn replace_state(&mut self, state: Value, url: &str) {
        let resolved = self.location.resolve(url);
        self.history.replace_state(state, &resolved);
        self.location.set_path(&resolved);
    }

    /// Step back; the location follows the entry.
    pub fn back(&mut self) -> Option<PopState> {
        let pop = self.history.back()?;
        self.location.set_path(&pop.url);
        Some(pop)
    }

    pub fn forward(&mut self) -> Option<PopState> {
        let pop = self.history.forward()?;
        self.location.set_path(&pop.url);
        Some(pop)
    }
}

/// Cloneable handle to the one browsing context.
#[derive(Debug, Clone)]
pub struct SharedContext {
    inner: Arc<Mutex<BrowsingContext>>,
}

impl SharedContext {
    pub fn new(context: BrowsingContext) -> Self {
        Self {
            inner: Arc::new(Mutex::new(context)),
        }
    }

    /// Run `f` with exclusive access. Must not be re-entered from `f`.
    pub fn with<R>(&self, f: impl FnOnce(&mut BrowsingContext) -> R) -> R {
        let mut guard = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut guard)
    }

    pub fn with_document<R>(&self, f: impl FnOnce(&mut Document) -> R) -> R {
        self.with(|ctx| f(&mut ctx.document))
    }
}
