use std::sync::Arc;

use futures::future::BoxFuture;
use tracing::{info, warn};

use super::{Trigger, Widget};
use crate::browser::SharedContext;
use crate::dom::Element;
use crate::events::SignalKind;
use crate::i18n::{Language, LanguageView};
use crate::interaction::{ClickResponse, Interactions};

const BUTTON_ID: &str = "musik-button";
const CONTAINER_ID: &str = "spotify-container";
const SHOW_KEY: &str = "interest_music_btn";
const SHOW_FALLBACK: &str = "🎧 Meine Playlist anhören";

/// Button that reveals an embedded Spotify playlist on the about page.
pub struct SpotifyToggle {
    context: SharedContext,
    language: LanguageView,
    playlist_id: String,
}

impl SpotifyToggle {
    pub fn new(context: SharedContext, language: LanguageView, playlist_id: &str) -> Self {
        Self {
            context,
            language,
            playlist_id: playlist_id.to_string(),
        }
    }

    fn embed_markup(&self) -> String {
        format!(
            r#"<iframe class="spotify-playlist-embed" style="border-radius:12px" src="https://open.spotify.com/embed/playlist/{}?utm_source=generator&amp;theme=0" width="100%" height="520" frameborder="0" allow="autoplay; clipboard-write; encrypted-media; fullscreen; picture-in-picture" loading="lazy" title="Spotify Playlist Player" aria-label="Spotify Playlist Embed"></iframe>"#,
            self.playlist_id
        )
    }

    fn button_text(&self, player_shown: bool) -> String {
        if player_shown {
            if self.language.current() == Language::ENGLISH {
                "🎧 Hide Player".to_string()
            } else {
                "🎧 Player ausblenden".to_string()
            }
        } else {
            self.language
                .translate(SHOW_KEY)
                .unwrap_or_else(|| SHOW_FALLBACK.to_string())
        }
    }

    fn toggle(&self) {
        let embed = self.embed_markup();
        let shown = self.context.with_document(|doc| {
            let container = doc.get_element_by_id_mut(CONTAINER_ID)?;
            if container.inner_html().trim().is_empty() {
                container.set_inner_html(&embed);
                info!("Spotify playlist player loaded");
            }
            let now_shown = !is_shown(container);
            container.set_style("display", if now_shown { "block" } else { "none" });
            Some(now_shown)
        });
        let Some(shown) = shown else {
            return;
        };

        let text = self.button_text(shown);
        self.context.with_document(|doc| {
            if let Some(button) = doc.get_element_by_id_mut(BUTTON_ID) {
                button.set_text_content(&text);
            }
        });
        info!("Spotify player {}", if shown { "shown" } else { "hidden" });
    }
}

fn is_shown(container: &Element) -> bool {
    matches!(container.style("display").as_deref(), Some(display) if display != "none")
}

impl Widget for SpotifyToggle {
    fn name(&self) -> &'static str {
        "spotify-toggle"
    }

    fn subscriptions(&self) -> &'static [SignalKind] {
        &[SignalKind::LanguageChanged]
    }

    fn install(self: Arc<Self>, interactions: &Interactions) {
        let wired = interactions.on_click(&format!("#{BUTTON_ID}"), move |_| {
            self.toggle();
            ClickResponse::done()
        });
        if let Err(e) = wired {
            warn!("Spotify toggle not wired: {}", e);
        }
    }

    /// Keep the button label in step with the player state after the
    /// dictionary has rewritten it.
    fn refresh(self: Arc<Self>, trigger: Trigger<'_>) -> Option<BoxFuture<'static, ()>> {
        if let Trigger::Boot = trigger {
            return None;
        }
        let shown = self.context.with_document(|doc| {
            doc.get_element_by_id(BUTTON_ID)?;
            doc.get_element_by_id(CONTAINER_ID).map(is_shown)
        });
        if let Some(shown) = shown {
            let text = self.button_text(shown);
            self.context.with_document(|doc| {
                if let Some(button) = doc.get_element_by_id_mut(BUTTON_ID) {
                    button.set_text_content(&text);
                }
            });
        }
        None
    }
}
