use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use url::Url;

/// Mutually-exclusive link classification, decided once at discovery time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkCategory {
    /// Hash-routed application route (`#/...`), resolved client-side.
    InternalHash,
    /// Guide page behind the hash router (`#/guides/...` or legacy `#/document/...`).
    InternalGuide,
    /// Absolute or root-relative URL served by an ordinary HTTP request.
    External,
    /// Hash-routed anchor found inside a `<nav>` element. Reported, not verified.
    Navigation,
}

impl LinkCategory {
    pub fn label(&self) -> &'static str {
        match self {
            LinkCategory::InternalHash => "internal_hash",
            LinkCategory::InternalGuide => "internal_guide",
            LinkCategory::External => "external",
            LinkCategory::Navigation => "navigation",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Link {
    pub url: String,
    pub text: String,
    pub category: LinkCategory,
    /// Set for `#/document/` guide links kept for backwards compatibility.
    pub legacy: bool,
}

impl Link {
    pub fn new(url: impl Into<String>, text: impl Into<String>, category: LinkCategory) -> Self {
        Self {
            url: url.into(),
            text: text.into(),
            category,
            legacy: false,
        }
    }

    /// Classify a raw `href` by prefix. The precedence is fixed:
    /// guide hash paths, then legacy document hash paths, then other hash
    /// paths, then absolute http(s), then root-relative paths resolved
    /// against `base_url`. Anything else (mailto:, bare `#`, empty) yields
    /// no link at all.
    pub fn classify(href: &str, text: &str, base_url: &str) -> Option<Link> {
        if href.is_empty() {
            return None;
        }

        if href.starts_with("#/guides/") {
            return Some(Link::new(href, text, LinkCategory::InternalGuide));
        }

        if href.starts_with("#/document/") {
            let mut link = Link::new(href, text, LinkCategory::InternalGuide);
            link.legacy = true;
            return Some(link);
        }

        if href.starts_with("#/") {
            return Some(Link::new(href, text, LinkCategory::InternalHash));
        }

        if href.starts_with("http") {
            return Some(Link::new(href, text, LinkCategory::External));
        }

        if href.starts_with('/') {
            let absolute = Url::parse(base_url)
                .ok()
                .and_then(|base| base.join(href).ok())?;
            return Some(Link::new(absolute.to_string(), text, LinkCategory::External));
        }

        None
    }
}

/// Every link found in one discovery run, bucketed by category.
///
/// URLs are additionally tracked in a set so the runtime-discovery merge can
/// dedupe in O(1) per candidate instead of rescanning every bucket.
#[derive(Debug, Default, Clone)]
pub struct DiscoveredLinks {
    pub internal_hash: Vec<Link>,
    pub internal_guide: Vec<Link>,
    pub external: Vec<Link>,
    pub navigation: Vec<Link>,
    seen_urls: HashSet<String>,
}

impl DiscoveredLinks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a link to its category bucket and remember its URL.
    /// Duplicates are the caller's concern; navigation entries in particular
    /// intentionally repeat URLs already present in the hash bucket.
    pub fn push(&mut self, link: Link) {
        self.seen_urls.insert(link.url.clone());
        match link.category {
            LinkCategory::InternalHash => self.internal_hash.push(link),
            LinkCategory::InternalGuide => self.internal_guide.push(link),
            LinkCategory::External => self.external.push(link),
            LinkCategory::Navigation => self.navigation.push(link),
        }
    }

    /// Exact-string membership test over every URL discovered so far.
    pub fn contains_url(&self, url: &str) -> bool {
        self.seen_urls.contains(url)
    }

    /// Number of links that will actually be verified (navigation excluded).
    pub fn verifiable_count(&self) -> usize {
        self.internal_hash.len() + self.internal_guide.len() + self.external.len()
    }
}
