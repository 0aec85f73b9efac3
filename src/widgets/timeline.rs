use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use futures::future::BoxFuture;
use tracing::{debug, warn};

use super::{Trigger, Widget};
use crate::browser::{ScrollBehavior, SharedContext};
use crate::dom::Document;
use crate::events::{Signal, SignalKind};
use crate::i18n::{LanguageView, TranslationDictionary};
use crate::interaction::{ClickResponse, Interactions};

const ITEM: &str = ".timeline-item";
const INFO_BOX_ID: &str = "timelineInfoBox";

/// Info box fields and the dictionary suffix that fills each.
const FIELDS: [(&str, &str); 4] = [
    ("infoBoxTitle", "title"),
    ("infoBoxPeriod", "period"),
    ("infoBoxCompany", "company"),
    ("infoBoxDescription", "desc"),
];

const SCROLL_DELAY: Duration = Duration::from_millis(150);

/// Career timeline with a translatable detail popup.
pub struct Timeline {
    context: SharedContext,
    language: LanguageView,
    /// Station number of the last clicked item on the current page.
    last_station: Mutex<Option<String>>,
}

impl Timeline {
    pub fn new(context: SharedContext, language: LanguageView) -> Self {
        Self {
            context,
            language,
            last_station: Mutex::new(None),
        }
    }

    fn set_last_station(&self, station: Option<String>) {
        *self.last_station.lock().unwrap_or_else(PoisonError::into_inner) = station;
    }

    fn last_station(&self) -> Option<String> {
        self.last_station
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn select_station(self: &Arc<Self>, path: &[usize], station: String) -> ClickResponse {
        let dictionary = self.language.dictionary();
        self.context.with_document(|doc| {
            doc.for_each_mut(ITEM, |item| item.remove_class("item-active"));
            if let Some(item) = doc.element_mut(path) {
                item.add_class("item-active");
            }
            fill_popup(doc, &dictionary, &station);
            if let Some(info_box) = doc.get_element_by_id_mut(INFO_BOX_ID) {
                info_box.add_class("visible");
            }
        });
        self.set_last_station(Some(station));

        let context = self.context.clone();
        ClickResponse::done().with_task(async move {
            tokio::time::sleep(SCROLL_DELAY).await;
            context.with(|ctx| ctx.viewport.scroll_into_view(INFO_BOX_ID, ScrollBehavior::Smooth));
        })
    }
}

impl Widget for Timeline {
    fn name(&self) -> &'static str {
        "timeline"
    }

    fn subscriptions(&self) -> &'static [SignalKind] {
        &[SignalKind::PageContentLoaded, SignalKind::LanguageChanged]
    }

    fn install(self: Arc<Self>, interactions: &Interactions) {
        let wired = interactions.on_click(ITEM, move |event| {
            let has_info_box = self
                .context
                .with_document(|doc| doc.get_element_by_id(INFO_BOX_ID).is_some());
            let Some(station) = event.element.attr("data-station").map(str::to_string) else {
                return ClickResponse::done();
            };
            if !has_info_box {
                return ClickResponse::done();
            }
            self.select_station(&event.current, station)
        });
        if let Err(e) = wired {
            warn!("Timeline not wired: {}", e);
        }
    }

    fn refresh(self: Arc<Self>, trigger: Trigger<'_>) -> Option<BoxFuture<'static, ()>> {
        match trigger {
            Trigger::Signal(Signal::LanguageChanged { dictionary, .. }) => {
                if let Some(station) = self.last_station() {
                    self.context
                        .with_document(|doc| fill_popup(doc, dictionary, &station));
                }
            }
            Trigger::Boot | Trigger::Signal(Signal::PageContentLoaded) => {
                self.set_last_station(None);
                let numbered = self.context.with_document(number_stations);
                if numbered > 0 {
                    debug!("Timeline initialized with {} items", numbered);
                }
            }
        }
        None
    }
}

/// Number timeline items 1..n in `data-station`. Pages without the info box
/// are left alone.
fn number_stations(document: &mut Document) -> usize {
    if document.get_element_by_id(INFO_BOX_ID).is_none() {
        return 0;
    }
    let mut station = 0;
    document.for_each_mut(ITEM, |item| {
        station += 1;
        item.set_attr("data-station", &station.to_string());
    })
}

fn fill_popup(document: &mut Document, dictionary: &TranslationDictionary, station: &str) {
    for (id, field) in FIELDS {
        let key = format!("timeline_station{station}_{field}");
        let Some(text) = dictionary.lookup(&key) else {
            continue;
        };
        if let Some(el) = document.get_element_by_id_mut(id) {
            el.set_text_content(text);
        }
    }
}
