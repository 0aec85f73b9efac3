use std::collections::HashMap;

/// Raw page markup keyed by site-relative path (`/about.html`). Callers
/// resolve links before touching the cache. Entries live for the whole
/// session.
#[derive(Debug, Default)]
pub struct PageCache {
    pages: HashMap<String, String>,
}

impl PageCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, url: &str) -> Option<&str> {
        self.pages.get(url).map(String::as_str)
    }

    pub fn insert(&mut self, url: &str, html: String) {
        self.pages.insert(url.to_string(), html);
    }

    pub fn contains(&self, url: &str) -> bool {
        self.pages.contains_key(url)
    }

    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }
}
