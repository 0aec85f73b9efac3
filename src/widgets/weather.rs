//! Current weather for the configured city, cached for half an hour.

use std::sync::Arc;

use chrono::Utc;
use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use super::{Trigger, Widget};
use crate::browser::SharedContext;
use crate::config::Config;
use crate::dom::{Element, Node};
use crate::error::FetchError;
use crate::events::SignalKind;
use crate::fetch::{self, Fetcher};
use crate::retry::{with_retry_if, RetryConfig};
use crate::storage::LocalStorage;

pub const DATA_KEY: &str = "weatherData";
pub const TIMESTAMP_KEY: &str = "weatherDataTimestamp";
pub const CACHE_TTL_MS: i64 = 30 * 60 * 1000;

const WIDGET_ID: &str = "weatherWidget";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherData {
    pub main: MainReadings,
    pub weather: Vec<Conditions>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MainReadings {
    pub temp: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Conditions {
    pub description: String,
    pub icon: String,
}

pub struct WeatherWidget {
    context: SharedContext,
    storage: Arc<LocalStorage>,
    fetcher: Arc<dyn Fetcher>,
    api_url: String,
    api_key: Option<String>,
    city: String,
    location: String,
    retry: RetryConfig,
}

impl WeatherWidget {
    pub fn new(context: SharedContext, storage: Arc<LocalStorage>, fetcher: Arc<dyn Fetcher>, config: &Config) -> Self {
        Self {
            context,
            storage,
            fetcher,
            api_url: config.weather_api_url.clone(),
            api_key: config.weather_api_key.clone(),
            city: config.weather_city.clone(),
            location: config.weather_location_label().to_string(),
            retry: RetryConfig::widget_api(),
        }
    }

    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    fn request_url(&self, api_key: &str) -> String {
        format!(
            "{}?q={}&units=metric&lang=de&appid={}",
            self.api_url, self.city, api_key
        )
    }

    fn cached(&self) -> Option<WeatherData> {
        let timestamp: i64 = self.storage.get_item(TIMESTAMP_KEY)?.parse().ok()?;
        if Utc::now().timestamp_millis() - timestamp >= CACHE_TTL_MS {
            return None;
        }
        let raw = self.storage.get_item(DATA_KEY)?;
        match serde_json::from_str(&raw) {
            Ok(data) => Some(data),
            Err(e) => {
                warn!("Ignoring unreadable weather cache: {}", e);
                None
            }
        }
    }

    fn store(&self, data: &WeatherData) {
        match serde_json::to_string(data) {
            Ok(raw) => {
                self.storage.set_item(DATA_KEY, &raw);
                self.storage
                    .set_item(TIMESTAMP_KEY, &Utc::now().timestamp_millis().to_string());
            }
            Err(e) => warn!("Weather cache write error: {}", e),
        }
    }

    fn render(&self, content: Element) {
        self.context.with_document(|doc| {
            if let Some(widget) = doc.get_element_by_id_mut(WIDGET_ID) {
                widget.replace_children(vec![Node::Element(content)]);
            }
        });
    }

    async fn fetch_weather(&self, api_key: &str) -> Result<WeatherData, FetchError> {
        let url = self.request_url(api_key);
        let data: WeatherData = with_retry_if(
            &self.retry,
            "Weather API",
            || fetch::get_json::<WeatherData>(self.fetcher.as_ref(), &url),
            FetchError::is_retryable,
        )
        .await?;

        if data.weather.is_empty() {
            return Err(FetchError::Malformed {
                url,
                reason: "no weather conditions".to_string(),
            });
        }
        Ok(data)
    }

    async fn load_remote(self: Arc<Self>, api_key: String) {
        match self.fetch_weather(&api_key).await {
            Ok(data) => {
                info!("Weather updated: {:.0}°C", data.main.temp);
                self.store(&data);
                self.render(weather_content(&data, &self.location));
            }
            Err(e) => {
                error!("Failed to load weather data: {}", e);
                self.render(error_content(&self.location));
            }
        }
    }
}

impl Widget for WeatherWidget {
    fn name(&self) -> &'static str {
        "weather"
    }

    fn subscriptions(&self) -> &'static [SignalKind] {
        &[SignalKind::PageContentLoaded]
    }

    fn refresh(self: Arc<Self>, _trigger: Trigger<'_>) -> Option<BoxFuture<'static, ()>> {
        let on_page = self
            .context
            .with_document(|doc| doc.get_element_by_id(WIDGET_ID).is_some());
        if !on_page {
            return None;
        }

        if let Some(data) = self.cached() {
            debug!("Weather from cache");
            self.render(weather_content(&data, &self.location));
            return None;
        }

        let Some(api_key) = self.api_key.clone() else {
            warn!("WEATHER_API_KEY not set, showing placeholder");
            self.render(error_content(&self.location));
            return None;
        };
        Some(Box::pin(self.load_remote(api_key)))
    }
}

fn div(class: &str) -> Element {
    Element::new("div").with_attr("class", class)
}

fn text_div(class: &str, text: &str) -> Node {
    Node::Element(div(class).with_child(Node::Text(text.to_string())))
}

fn weather_content(data: &WeatherData, location: &str) -> Element {
    let temp = data.main.temp.round() as i64;
    let (description, icon) = data
        .weather
        .first()
        .map(|c| (c.description.as_str(), c.icon.as_str()))
        .unwrap_or_default();

    let image = Element::new("img")
        .with_attr("src", &format!("https://openweathermap.org/img/wn/{icon}.png"))
        .with_attr("alt", description);

    div("weather-content")
        .with_child(Node::Element(div("weather-icon").with_child(Node::Element(image))))
        .with_child(Node::Element(
            div("weather-info")
                .with_child(text_div("weather-temp", &format!("{temp}°C")))
                .with_child(text_div("weather-location", location)),
        ))
}

fn error_content(location: &str) -> Element {
    div("weather-content weather-error").with_child(Node::Element(
        div("weather-info")
            .with_child(text_div("weather-temp", "--°C"))
            .with_child(text_div("weather-location", location)),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::testing::FakeFetcher;
    use crate::widgets::testing;
    use std::time::Duration;

    const PAGE: &str = r#"<main><aside id="weatherWidget"><span class="loading">…</span></aside></main>"#;
    const PAYLOAD: &str = r#"{
        "main": {"temp": 17.6, "humidity": 60},
        "weather": [{"id": 801, "description": "ein paar Wolken", "icon": "02d"}],
        "name": "Bern"
    }"#;

    fn config(api_key: Option<&str>) -> Config {
        let mut config = Config::for_site("http://localhost");
        config.weather_api_url = "https://weather.test/data".to_string();
        config.weather_api_key = api_key.map(str::to_string);
        config
    }

    fn api_url() -> String {
        "https://weather.test/data?q=Bern,CH&units=metric&lang=de&appid=secret".to_string()
    }

    fn widget(
        context: &SharedContext,
        storage: &Arc<LocalStorage>,
        fetcher: &Arc<FakeFetcher>,
        api_key: Option<&str>,
    ) -> Arc<WeatherWidget> {
        Arc::new(
            WeatherWidget::new(context.clone(), storage.clone(), fetcher.clone(), &config(api_key))
                .with_retry(RetryConfig::new(2, Duration::from_millis(10))),
        )
    }

    fn text_of(context: &SharedContext, selector: &str) -> Option<String> {
        context.with_document(|doc| doc.first(selector).map(|el| el.text_content()))
    }

    #[tokio::test]
    async fn test_fetch_renders_and_caches() {
        let context = testing::context(PAGE);
        let storage = Arc::new(LocalStorage::in_memory());
        let fetcher = Arc::new(FakeFetcher::new().with_body(&api_url(), PAYLOAD));

        widget(&context, &storage, &fetcher, Some("secret"))
            .refresh(Trigger::Boot)
            .unwrap()
            .await;

        assert_eq!(text_of(&context, ".weather-temp").as_deref(), Some("18°C"));
        assert_eq!(text_of(&context, ".weather-location").as_deref(), Some("Bern"));
        context.with_document(|doc| {
            let img = doc.first("#weatherWidget .weather-icon img").unwrap();
            assert_eq!(img.attr("src"), Some("https://openweathermap.org/img/wn/02d.png"));
            assert_eq!(img.attr("alt"), Some("ein paar Wolken"));
            assert!(!doc.exists(".loading"));
        });
        assert!(storage.get_item(DATA_KEY).is_some());
        assert!(storage.get_item(TIMESTAMP_KEY).unwrap().parse::<i64>().is_ok());
    }

    #[tokio::test]
    async fn test_fresh_cache_renders_without_fetch() {
        let context = testing::context(PAGE);
        let storage = Arc::new(LocalStorage::in_memory());
        let fetcher = Arc::new(FakeFetcher::new());
        storage.set_item(DATA_KEY, PAYLOAD);
        storage.set_item(
            TIMESTAMP_KEY,
            &(Utc::now().timestamp_millis() - 5 * 60 * 1000).to_string(),
        );

        assert!(widget(&context, &storage, &fetcher, Some("secret"))
            .refresh(Trigger::Boot)
            .is_none());

        assert_eq!(text_of(&context, ".weather-temp").as_deref(), Some("18°C"));
        assert!(fetcher.requests().is_empty());
    }

    #[tokio::test]
    async fn test_expired_cache_refetches() {
        let context = testing::context(PAGE);
        let storage = Arc::new(LocalStorage::in_memory());
        let fetcher = Arc::new(FakeFetcher::new().with_body(&api_url(), PAYLOAD));
        storage.set_item(DATA_KEY, PAYLOAD);
        storage.set_item(
            TIMESTAMP_KEY,
            &(Utc::now().timestamp_millis() - CACHE_TTL_MS).to_string(),
        );

        widget(&context, &storage, &fetcher, Some("secret"))
            .refresh(Trigger::Boot)
            .unwrap()
            .await;

        assert_eq!(fetcher.request_count(&api_url()), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_api_failure_renders_placeholder() {
        let context = testing::context(PAGE);
        let storage = Arc::new(LocalStorage::in_memory());
        let fetcher = Arc::new(FakeFetcher::new().with_unreachable(&api_url()));

        widget(&context, &storage, &fetcher, Some("secret"))
            .refresh(Trigger::Boot)
            .unwrap()
            .await;

        assert_eq!(text_of(&context, ".weather-temp").as_deref(), Some("--°C"));
        assert!(context.with_document(|doc| doc.exists(".weather-content.weather-error")));
        assert_eq!(fetcher.request_count(&api_url()), 2);
        assert!(storage.get_item(DATA_KEY).is_none());
    }

    #[tokio::test]
    async fn test_missing_api_key_skips_network() {
        let context = testing::context(PAGE);
        let storage = Arc::new(LocalStorage::in_memory());
        let fetcher = Arc::new(FakeFetcher::new());

        assert!(widget(&context, &storage, &fetcher, None).refresh(Trigger::Boot).is_none());

        assert_eq!(text_of(&context, ".weather-temp").as_deref(), Some("--°C"));
        assert!(fetcher.requests().is_empty());
    }

    #[test]
    fn test_other_pages_untouched() {
        let context = testing::context("<main><p>Projekte</p></main>");
        let storage = Arc::new(LocalStorage::in_memory());
        let fetcher = Arc::new(FakeFetcher::new());
        assert!(widget(&context, &storage, &fetcher, Some("secret"))
            .refresh(Trigger::Boot)
            .is_none());
    }
}
