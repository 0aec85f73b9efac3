use std::sync::Arc;

use futures::future::BoxFuture;
use tracing::{debug, warn};

use super::{Trigger, Widget};
use crate::browser::SharedContext;
use crate::dom::Document;
use crate::events::SignalKind;
use crate::interaction::{ClickResponse, Interactions};

const FILTER_BUTTON: &str = ".skill-filter-btn";

/// Category filter buttons above the skill badges.
pub struct SkillFilters {
    context: SharedContext,
}

impl SkillFilters {
    pub fn new(context: SharedContext) -> Self {
        Self { context }
    }
}

impl Widget for SkillFilters {
    fn name(&self) -> &'static str {
        "skill-filters"
    }

    fn subscriptions(&self) -> &'static [SignalKind] {
        &[SignalKind::PageContentLoaded]
    }

    fn install(self: Arc<Self>, interactions: &Interactions) {
        let context = self.context.clone();
        let wired = interactions.on_click(FILTER_BUTTON, move |event| {
            context.with_document(|doc| {
                doc.for_each_mut(FILTER_BUTTON, |btn| btn.remove_class("active"));
                if let Some(btn) = doc.element_mut(&event.current) {
                    btn.add_class("active");
                }
                filter_skills(doc, event.element.attr("data-filter"));
            });
            ClickResponse::done()
        });
        if let Err(e) = wired {
            warn!("Skill filters not wired: {}", e);
        }
    }

    fn refresh(self: Arc<Self>, _trigger: Trigger<'_>) -> Option<BoxFuture<'static, ()>> {
        self.context.with_document(|doc| {
            if let Some(first) = doc.first_mut(FILTER_BUTTON) {
                if !first.has_class("active") {
                    first.add_class("active");
                    debug!("First skill filter button activated");
                }
            }
        });
        None
    }
}

/// Show badges of `category` (or all for `all`) and hide the rest.
pub fn filter_skills(document: &mut Document, category: Option<&str>) -> usize {
    let show_all = category == Some("all");
    let mut visible = 0;
    document.for_each_mut(".skill-badge", |badge| {
        let show = show_all || badge.attr("data-category") == category;
        badge.toggle_class("hidden", !show);
        if show {
            visible += 1;
        }
    });
    visible
}
