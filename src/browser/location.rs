//! Current address and full-navigation requests.

use tracing::info;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    pathname: String,
    search: String,
    /// Set when something requested a full document navigation.
    assigned: Option<String>,
}

impl Location {
    /// Build from a site-relative path, optionally carrying a query string.
    pub fn new(path: &str) -> Self {
        let (pathname, search) = split_search(path);
        Self {
            pathname: absolutize(pathname),
            search: search.to_string(),
            assigned: None,
        }
    }

    pub fn pathname(&self) -> &str {
        &self.pathname
    }

    /// Query string including the leading `?`, or empty.
    pub fn search(&self) -> &str {
        &self.search
    }

    /// Value of one query parameter.
    pub fn query_param(&self, name: &str) -> Option<&str> {
        self.search
            .trim_start_matches('?')
            .split('&')
            .filter_map(|pair| pair.split_once('=').or(Some((pair, ""))))
            .find(|(key, _)| *key == name)
            .map(|(_, value)| value)
    }

    /// Resolve `href` against the current path the way a browser resolves a
    /// relative link. Fragments are dropped.
    pub fn resolve(&self, href: &str) -> String {
        resolve_path(&self.pathname, href)
    }

    /// Point the location at `path` without a document load (history API).
    pub fn set_path(&mut self, path: &str) {
        let resolved = self.resolve(path);
        let (pathname, search) = split_search(&resolved);
        self.pathname = pathname.to_string();
        self.search = search.to_string();
    }

    /// Request a full navigation to `href`, leaving the current document.
    pub fn assign(&mut self, href: &str) {
        let target = self.resolve(href);
        info!("Full navigation to {}", target);
        self.set_path(&target);
        self.assigned = Some(target);
    }

    /// Target of the last full navigation request, if any.
    pub fn assigned(&self) -> Option<&str> {
        self.assigned.as_deref()
    }
}

fn split_search(path: &str) -> (&str, &str) {
    match path.find('?') {
        Some(idx) => (&path[..idx], &path[idx..]),
        None => (path, ""),
    }
}

fn absolutize(path: &str) -> String {
    if path.starts_with('/') {
        path.to_string()
    } else {
        format!("/{path}")
    }
}

/// Resolve a link target against a base path.
///
/// Absolute URLs (with a scheme) keep only their path and query; `./` and
/// `../` segments are collapsed.
pub fn resolve_path(base: &str, href: &str) -> String {
    let href = href.split('#').next().unwrap_or("");
    let href = match href.find("://") {
        Some(scheme_end) => {
            let after_host = &href[scheme_end + 3..];
            after_host.find('/').map_or("/", |slash| &after_host[slash..])
        }
        None => href,
    };

    if href.is_empty() {
        return base.to_string();
    }

    let (path, search) = split_search(href);
    if path.is_empty() {
        let (base_path, _) = split_search(base);
        return format!("{base_path}{search}");
    }

    let joined = if path.starts_with('/') {
        path.to_string()
    } else {
        let (base_path, _) = split_search(base);
        let dir = base_path.rfind('/').map_or("/", |slash| &base_path[..=slash]);
        format!("{dir}{path}")
    };

    let mut segments: Vec<&str> = Vec::new();
    let trailing_slash = joined.ends_with('/');
    for segment in joined.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            other => segments.push(other),
        }
    }

    let mut normalized = format!("/{}", segments.join("/"));
    if trailing_slash && normalized.len() > 1 {
        normalized.push('/');
    }
    normalized.push_str(search);
    normalized
}
