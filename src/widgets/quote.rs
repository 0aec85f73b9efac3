//! Quote of the day, cached for a day in local storage.

use std::sync::Arc;

use chrono::{Datelike, Local, NaiveDate, Utc};
use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::{Trigger, Widget};
use crate::browser::SharedContext;
use crate::error::FetchError;
use crate::events::SignalKind;
use crate::fetch::{self, Fetcher};
use crate::retry::{with_retry_if, RetryConfig};
use crate::storage::LocalStorage;

pub const CACHE_KEY: &str = "dailyquote_cache";
pub const CACHE_TTL_MS: i64 = 24 * 60 * 60 * 1000;

const TEXT_ID: &str = "quote-text";
const AUTHOR_ID: &str = "quote-author";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quote {
    /// Quote text
    pub q: String,
    /// Author
    pub a: String,
}

impl Quote {
    fn new(q: &str, a: &str) -> Self {
        Self {
            q: q.to_string(),
            a: a.to_string(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct CachedQuote {
    quote: Quote,
    /// Milliseconds since the Unix epoch.
    timestamp: i64,
}

#[derive(Debug, Deserialize)]
struct ApiQuote {
    #[serde(default)]
    content: String,
    #[serde(default)]
    author: String,
}

const FALLBACK_QUOTES: [(&str, &str); 7] = [
    ("Der einzige Weg, grossartige Arbeit zu leisten, ist zu lieben, was du tust.", "Steve Jobs"),
    ("Die Zukunft gehört denen, die an die Schönheit ihrer Träume glauben.", "Eleanor Roosevelt"),
    ("Der beste Weg, die Zukunft vorherzusagen, ist sie zu erschaffen.", "Peter Drucker"),
    ("Phantasie ist wichtiger als Wissen, denn Wissen ist begrenzt.", "Albert Einstein"),
    ("Das Geheimnis des Erfolgs ist anzufangen.", "Mark Twain"),
    ("Sei du selbst die Veränderung, die du dir wünschst für diese Welt.", "Mahatma Gandhi"),
    ("Es ist nie zu spät, das zu werden, was du hättest sein können.", "George Eliot"),
];

/// The built-in quote for `date`, rotating by day of the year.
pub fn fallback_quote(date: NaiveDate) -> Quote {
    let (q, a) = FALLBACK_QUOTES[date.ordinal() as usize % FALLBACK_QUOTES.len()];
    Quote::new(q, a)
}

pub struct DailyQuote {
    context: SharedContext,
    storage: Arc<LocalStorage>,
    fetcher: Arc<dyn Fetcher>,
    api_url: String,
    retry: RetryConfig,
}

impl DailyQuote {
    pub fn new(context: SharedContext, storage: Arc<LocalStorage>, fetcher: Arc<dyn Fetcher>, api_url: &str) -> Self {
        Self {
            context,
            storage,
            fetcher,
            api_url: api_url.to_string(),
            retry: RetryConfig::widget_api(),
        }
    }

    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    fn cached_quote(&self) -> Option<Quote> {
        let raw = self.storage.get_item(CACHE_KEY)?;
        match serde_json::from_str::<CachedQuote>(&raw) {
            Ok(cached) if Utc::now().timestamp_millis() - cached.timestamp < CACHE_TTL_MS => Some(cached.quote),
            Ok(_) => None,
            Err(e) => {
                warn!("Cache read error: {}", e);
                None
            }
        }
    }

    fn cache_quote(&self, quote: &Quote) {
        let cached = CachedQuote {
            quote: quote.clone(),
            timestamp: Utc::now().timestamp_millis(),
        };
        match serde_json::to_string(&cached) {
            Ok(raw) => self.storage.set_item(CACHE_KEY, &raw),
            Err(e) => warn!("Cache write error: {}", e),
        }
    }

    fn display(&self, quote: &Quote) {
        self.context.with_document(|doc| {
            if doc.get_element_by_id(TEXT_ID).is_none() || doc.get_element_by_id(AUTHOR_ID).is_none() {
                return;
            }
            if let Some(text) = doc.get_element_by_id_mut(TEXT_ID) {
                text.set_text_content(&format!("\"{}\"", quote.q));
            }
            if let Some(author) = doc.get_element_by_id_mut(AUTHOR_ID) {
                author.set_text_content(&format!("— {}", quote.a));
            }
        });
    }

    async fn fetch_from_api(&self) -> Result<Quote, FetchError> {
        let payload: ApiQuote = with_retry_if(
            &self.retry,
            "Quote API",
            || fetch::get_json::<ApiQuote>(self.fetcher.as_ref(), &self.api_url),
            FetchError::is_retryable,
        )
        .await?;

        if payload.content.is_empty() || payload.author.is_empty() {
            return Err(FetchError::Malformed {
                url: self.api_url.clone(),
                reason: "missing content or author".to_string(),
            });
        }
        Ok(Quote {
            q: payload.content,
            a: payload.author,
        })
    }

    async fn load_remote(self: Arc<Self>, fallback: Quote) {
        match self.fetch_from_api().await {
            Ok(quote) => {
                info!("Quote from API");
                self.display(&quote);
                self.cache_quote(&quote);
            }
            Err(e) => {
                warn!("Quote API error: {}. Using fallback quote", e);
                self.cache_quote(&fallback);
            }
        }
    }
}

impl Widget for DailyQuote {
    fn name(&self) -> &'static str {
        "daily-quote"
    }

    fn subscriptions(&self) -> &'static [SignalKind] {
        &[SignalKind::PageContentLoaded]
    }

    fn refresh(self: Arc<Self>, _trigger: Trigger<'_>) -> Option<BoxFuture<'static, ()>> {
        let on_page = self
            .context
            .with_document(|doc| doc.get_element_by_id(TEXT_ID).is_some());
        if !on_page {
            return None;
        }

        if let Some(quote) = self.cached_quote() {
            debug!("Quote from cache");
            self.display(&quote);
            return None;
        }

        // Show something right away; the API result replaces it.
        let fallback = fallback_quote(Local::now().date_naive());
        self.display(&fallback);
        Some(Box::pin(self.load_remote(fallback)))
    }
}
