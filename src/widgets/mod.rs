//! Page widgets. Each one re-queries its anchors on every refresh, does
//! nothing when they are absent, and tolerates being refreshed repeatedly.

mod carousel;
mod chart;
mod contact;
mod quote;
mod skills;
mod spotify;
mod timeline;
mod weather;

use std::sync::Arc;

use futures::future::BoxFuture;
use tracing::debug;

use crate::events::{EventBus, Signal, SignalKind};
use crate::interaction::Interactions;

pub use carousel::HobbyCarousel;
pub use chart::{SkillsChart, PROFICIENCY_LEVELS};
pub use contact::ContactForm;
pub use quote::{DailyQuote, Quote};
pub use skills::SkillFilters;
pub use spotify::SpotifyToggle;
pub use timeline::Timeline;
pub use weather::WeatherWidget;

/// Why a widget is being refreshed.
#[derive(Debug, Clone, Copy)]
pub enum Trigger<'a> {
    /// The document finished its first load.
    Boot,
    Signal(&'a Signal),
}

pub trait Widget: Send + Sync + 'static {
    fn name(&self) -> &'static str;

    /// Signals that refresh this widget.
    fn subscriptions(&self) -> &'static [SignalKind];

    /// Register delegated input handlers. Called once, before the first refresh.
    fn install(self: Arc<Self>, _interactions: &Interactions) {}

    /// Re-initialize against the current document. Work that has to wait
    /// (network, timers) is returned as a task for the caller to spawn.
    fn refresh(self: Arc<Self>, trigger: Trigger<'_>) -> Option<BoxFuture<'static, ()>>;
}

/// Install `widgets`, subscribe them in order and run their boot refresh.
pub fn mount(widgets: &[Arc<dyn Widget>], bus: &EventBus, interactions: &Interactions) {
    for widget in widgets {
        Arc::clone(widget).install(interactions);

        for &kind in widget.subscriptions() {
            let widget = Arc::clone(widget);
            let tasks = interactions.tasks().clone();
            bus.subscribe(kind, move |signal| {
                debug!("Refreshing {} on {}", widget.name(), signal.kind().name());
                if let Some(task) = Arc::clone(&widget).refresh(Trigger::Signal(signal)) {
                    tasks.spawn(task);
                }
            });
        }

        if let Some(task) = Arc::clone(widget).refresh(Trigger::Boot) {
            interactions.tasks().spawn(task);
        }
        debug!("Mounted {}", widget.name());
    }
}
