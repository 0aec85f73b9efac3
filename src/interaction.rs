//! Delegated user input: clicks routed by selector, key presses, and the
//! background tasks handlers start.

use std::sync::{Arc, Mutex, PoisonError};

use futures::future::BoxFuture;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::browser::SharedContext;
use crate::dom::{Element, NodePath, Selector, SelectorError};

/// A click delivered to one handler.
#[derive(Debug, Clone)]
pub struct ClickEvent {
    /// The element that was clicked.
    pub target: NodePath,
    /// The nearest ancestor-or-self that matched the handler's selector.
    pub current: NodePath,
    /// Snapshot of the matched element at dispatch time.
    pub element: Element,
}

/// What a click handler wants done.
#[derive(Default)]
pub struct ClickResponse {
    pub prevent_default: bool,
    pub task: Option<BoxFuture<'static, ()>>,
}

impl ClickResponse {
    /// Handled synchronously; default action proceeds.
    pub fn done() -> Self {
        Self::default()
    }

    /// Default action suppressed, nothing else to do.
    pub fn prevented() -> Self {
        Self {
            prevent_default: true,
            task: None,
        }
    }

    pub fn with_task(mut self, task: impl std::future::Future<Output = ()> + Send + 'static) -> Self {
        self.task = Some(Box::pin(task));
        self
    }
}

pub type ClickHandler = Arc<dyn Fn(&ClickEvent) -> ClickResponse + Send + Sync>;
pub type KeyHandler = Arc<dyn Fn(&str) -> Option<BoxFuture<'static, ()>> + Send + Sync>;

/// Result of dispatching one click.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClickOutcome {
    pub handled: usize,
    pub default_prevented: bool,
    /// Full navigation performed as the default action of a link.
    pub navigated_to: Option<String>,
}

/// Handles to spawned handler tasks so callers can wait for quiescence.
#[derive(Clone, Default)]
pub struct TaskSet {
    handles: Arc<Mutex<Vec<JoinHandle<()>>>>,
}

impl TaskSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Spawn onto the current runtime.
    pub fn spawn(&self, task: impl std::future::Future<Output = ()> + Send + 'static) {
        let handle = tokio::spawn(task);
        self.lock().push(handle);
    }

    /// Wait until every task, including ones spawned while waiting, is done.
    pub async fn drain(&self) {
        loop {
            let pending = std::mem::take(&mut *self.lock());
            if pending.is_empty() {
                return;
            }
            for handle in pending {
                if let Err(e) = handle.await {
                    warn!("Background task failed: {}", e);
                }
            }
        }
    }

    pub fn pending(&self) -> usize {
        self.lock().iter().filter(|h| !h.is_finished()).count()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<JoinHandle<()>>> {
        self.handles.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

struct ClickRegistration {
    selector: Selector,
    handler: ClickHandler,
}

/// Document-level listeners, like handlers delegated from `document.body`.
///
/// Handlers are registered once and keep working after the main region is
/// swapped, because matching happens at click time.
pub struct Interactions {
    context: SharedContext,
    tasks: TaskSet,
    clicks: Mutex<Vec<ClickRegistration>>,
    keys: Mutex<Vec<KeyHandler>>,
}

impl Interactions {
    pub fn new(context: SharedContext, tasks: TaskSet) -> Self {
        Self {
            context,
            tasks,
            clicks: Mutex::new(Vec::new()),
            keys: Mutex::new(Vec::new()),
        }
    }

    pub fn tasks(&self) -> &TaskSet {
        &self.tasks
    }

    pub fn on_click(
        &self,
        selector: &str,
        handler: impl Fn(&ClickEvent) -> ClickResponse + Send + Sync + 'static,
    ) -> Result<(), SelectorError> {
        let selector = Selector::parse(selector)?;
        self.clicks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(ClickRegistration {
                selector,
                handler: Arc::new(handler),
            });
        Ok(())
    }

    pub fn on_key(&self, handler: impl Fn(&str) -> Option<BoxFuture<'static, ()>> + Send + Sync + 'static) {
        self.keys
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Arc::new(handler));
    }

    /// Click the first element matching `selector`. `None` if nothing matches.
    pub fn click_selector(&self, selector: &str) -> Option<ClickOutcome> {
        let target = self.context.with_document(|doc| doc.first_path(selector))?;
        Some(self.click(&target))
    }

    /// Dispatch a click on the element at `target`.
    ///
    /// Every handler whose selector matches the target or one of its
    /// ancestors runs, in registration order. Unless one of them prevented
    /// it, clicking inside a link performs a full navigation.
    pub fn click(&self, target: &[usize]) -> ClickOutcome {
        let registrations: Vec<(Selector, ClickHandler)> = self
            .clicks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|r| (r.selector.clone(), Arc::clone(&r.handler)))
            .collect();

        let mut outcome = ClickOutcome {
            handled: 0,
            default_prevented: false,
            navigated_to: None,
        };

        for (selector, handler) in registrations {
            let event = self.context.with_document(|doc| {
                let current = doc.closest_path(target, &selector)?;
                let element = doc.element(&current)?.clone();
                Some(ClickEvent {
                    target: target.to_vec(),
                    current,
                    element,
                })
            });
            let Some(event) = event else {
                continue;
            };

            let response = handler(&event);
            outcome.handled += 1;
            outcome.default_prevented |= response.prevent_default;
            if let Some(task) = response.task {
                self.tasks.spawn(task);
            }
        }

        if !outcome.default_prevented {
            outcome.navigated_to = self.follow_link(target);
        }
        debug!(
            "Click on {:?}: {} handlers, default prevented: {}",
            target, outcome.handled, outcome.default_prevented
        );
        outcome
    }

    /// Deliver a `keydown` to every key handler.
    pub fn press_key(&self, key: &str) -> usize {
        let handlers: Vec<KeyHandler> = self
            .keys
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        for handler in &handlers {
            if let Some(task) = handler(key) {
                self.tasks.spawn(task);
            }
        }
        handlers.len()
    }

    fn follow_link(&self, target: &[usize]) -> Option<String> {
        let selector = Selector::parse("a[href]").ok()?;
        self.context.with(|ctx| {
            let link = ctx.document.closest_path(target, &selector)?;
            let href = ctx.document.element(&link)?.attr("href")?.to_string();
            ctx.location.assign(&href);
            ctx.location.assigned().map(str::to_string)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::browser::BrowsingContext;
    use crate::dom::Document;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn interactions(html: &str) -> Interactions {
        let context = SharedContext::new(BrowsingContext::new(Document::parse(html), "/index.html"));
        Interactions::new(context, TaskSet::new())
    }

    #[test]
    fn test_click_delegates_to_ancestor_handler() {
        let interactions = interactions(r#"<nav><a href="about.html"><span>About</span></a></nav>"#);
        let seen = Arc::new(Mutex::new(None));
        let seen_clone = Arc::clone(&seen);
        interactions
            .on_click("nav a", move |event| {
                *seen_clone.lock().unwrap() = event.element.attr("href").map(str::to_string);
                ClickResponse::prevented()
            })
            .unwrap();

        let outcome = interactions.click_selector("nav a span").unwrap();
        assert_eq!(outcome.handled, 1);
        assert!(outcome.default_prevented);
        assert_eq!(outcome.navigated_to, None);
        assert_eq!(seen.lock().unwrap().as_deref(), Some("about.html"));
    }

    #[test]
    fn test_unprevented_link_click_navigates() {
        let interactions = interactions(r#"<footer><a href="impressum.html">Impressum</a></footer>"#);
        let outcome = interactions.click_selector("footer a").unwrap();

        assert_eq!(outcome.handled, 0);
        assert_eq!(outcome.navigated_to.as_deref(), Some("/impressum.html"));
    }

    #[test]
    fn test_handlers_run_in_registration_order() {
        let interactions = interactions(r#"<button class="skill-filter-btn">All</button>"#);
        let order = Arc::new(Mutex::new(Vec::new()));
        for name in ["first", "second"] {
            let order = Arc::clone(&order);
            interactions
                .on_click("button", move |_| {
                    order.lock().unwrap().push(name);
                    ClickResponse::done()
                })
                .unwrap();
        }

        interactions.click_selector(".skill-filter-btn").unwrap();
        assert_eq!(*order.lock().unwrap(), vec!["first", "second"]);
    }

    #[test]
    fn test_click_missing_target() {
        let interactions = interactions("<main></main>");
        assert!(interactions.click_selector(".carousel-nav-next").is_none());
    }

    #[test]
    fn test_invalid_selector_rejected() {
        let interactions = interactions("<main></main>");
        assert!(interactions.on_click("nav > a", |_| ClickResponse::done()).is_err());
    }

    #[tokio::test]
    async fn test_tasks_spawned_and_drained() {
        let interactions = interactions(r#"<span data-lang="en">EN</span>"#);
        let runs = Arc::new(AtomicUsize::new(0));
        let runs_clone = Arc::clone(&runs);
        interactions
            .on_click("span", move |_| {
                let runs = Arc::clone(&runs_clone);
                ClickResponse::done().with_task(async move {
                    tokio::task::yield_now().await;
                    runs.fetch_add(1, Ordering::SeqCst);
                })
            })
            .unwrap();

        interactions.click_selector("span").unwrap();
        interactions.tasks().drain().await;
        assert_eq!(runs.load(Ordering::SeqCst), 1);
        assert_eq!(interactions.tasks().pending(), 0);
    }

    #[test]
    fn test_press_key_reaches_all_handlers() {
        let interactions = interactions("<main></main>");
        let keys = Arc::new(Mutex::new(Vec::new()));
        let keys_clone = Arc::clone(&keys);
        interactions.on_key(move |key| {
            keys_clone.lock().unwrap().push(key.to_string());
            None
        });

        assert_eq!(interactions.press_key("ArrowLeft"), 1);
        assert_eq!(*keys.lock().unwrap(), vec!["ArrowLeft".to_string()]);
    }
}
