use crate::error::Result;
use crate::link::{DiscoveredLinks, Link, LinkCategory};
use crate::renderer::PageRenderer;
use scraper::{Html, Selector};
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info};

/// Settle delay for the runtime-discovery render of the home route.
pub const RUNTIME_SETTLE: Duration = Duration::from_secs(3);

/// Read the static HTML document and extract its links. Unreadable files
/// are fatal for the run: there is nothing to verify without a document.
pub fn discover_from_file(path: &Path, base_url: &str) -> Result<DiscoveredLinks> {
    let html = std::fs::read_to_string(path)?;
    Ok(discover_from_html(&html, base_url))
}

/// Classify every `a[href]` in the document, then record hash-routed
/// anchors living inside `<nav>` elements a second time under Navigation.
/// Navigation entries are reported but never verified, so the repetition
/// is intentional.
pub fn discover_from_html(html: &str, base_url: &str) -> DiscoveredLinks {
    let document = Html::parse_document(html);
    let mut links = DiscoveredLinks::new();

    let anchor_selector = Selector::parse("a[href]").unwrap();
    for element in document.select(&anchor_selector) {
        if let Some(href) = element.value().attr("href") {
            let text: String = element.text().collect();
            if let Some(link) = Link::classify(href, text.trim(), base_url) {
                links.push(link);
            }
        }
    }

    let nav_selector = Selector::parse("nav a[href]").unwrap();
    for element in document.select(&nav_selector) {
        if let Some(href) = element.value().attr("href")
            && href.starts_with("#/")
        {
            let text: String = element.text().collect();
            links.push(Link::new(href, text.trim(), LinkCategory::Navigation));
        }
    }

    info!(
        "discovered {} hash, {} guide, {} external, {} navigation links",
        links.internal_hash.len(),
        links.internal_guide.len(),
        links.external.len(),
        links.navigation.len()
    );

    links
}

/// Second discovery pass: render the home route in a real browser and merge
/// any anchor the static parse missed. Dedup is by exact URL string against
/// everything discovered so far. Renderer failures here are fatal, matching
/// the static pass; they are not retried.
pub async fn discover_from_runtime(
    renderer: &dyn PageRenderer,
    base_url: &str,
    links: &mut DiscoveredLinks,
) -> Result<usize> {
    let home_url = format!("{}/#/home", base_url.trim_end_matches('/'));
    let page = renderer.render(&home_url, RUNTIME_SETTLE).await?;

    let mut merged = 0;
    for anchor in &page.anchors {
        if anchor.href.is_empty() || anchor.text.is_empty() {
            continue;
        }
        if links.contains_url(&anchor.href) {
            debug!("runtime anchor already known: {}", anchor.href);
            continue;
        }

        let category = if anchor.href.starts_with("#/") {
            Some(LinkCategory::InternalHash)
        } else if anchor.href.starts_with("http") {
            Some(LinkCategory::External)
        } else {
            None
        };

        if let Some(category) = category {
            links.push(Link::new(anchor.href.clone(), anchor.text.clone(), category));
            merged += 1;
        }
    }

    info!("runtime discovery merged {} new links", merged);
    Ok(merged)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::testing::StubRenderer;
    use crate::renderer::{PageAnchor, RenderedPage};

    const BASE: &str = "https://ccri-cyberknights.github.io/page";

    const FIXTURE: &str = r##"
        <html><body>
            <nav>
                <a href="#/home">Home</a>
                <a href="#/resources">Resources</a>
            </nav>
            <a href="#/guides/linux">Linux Guide</a>
            <a href="#/document/legacy-notes">Legacy Notes</a>
            <a href="#/calendar">Calendar</a>
            <a href="https://ctftime.org/">CTFtime</a>
            <a href="/flyer.pdf">Flyer</a>
            <a href="mailto:club@ccri.edu">Email us</a>
            <a>No href at all</a>
        </body></html>
    "##;

    #[test]
    fn static_discovery_buckets_by_prefix() {
        let links = discover_from_html(FIXTURE, BASE);

        // nav anchors land in internal_hash via the main pass too
        assert_eq!(links.internal_hash.len(), 3);
        assert_eq!(links.internal_guide.len(), 2);
        assert_eq!(links.external.len(), 2);
        assert_eq!(links.navigation.len(), 2);

        assert!(links.internal_guide.iter().any(|l| l.legacy));
        assert!(
            links
                .external
                .iter()
                .any(|l| l.url == "https://ccri-cyberknights.github.io/flyer.pdf")
        );
    }

    #[test]
    fn anchors_without_usable_href_are_skipped() {
        let links = discover_from_html(FIXTURE, BASE);
        assert!(!links.contains_url("mailto:club@ccri.edu"));
    }

    #[test]
    fn unparseable_document_still_yields_no_links() {
        // html5ever recovers from almost anything; worst case is zero links,
        // which the caller treats as a verified-nothing run.
        let links = discover_from_html("<<<%%% not html", BASE);
        assert_eq!(links.verifiable_count(), 0);
    }

    #[test]
    fn missing_file_is_fatal() {
        let result = discover_from_file(Path::new("/nonexistent/index.html"), BASE);
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn runtime_merge_dedupes_by_exact_url() {
        let mut links = discover_from_html(FIXTURE, BASE);
        let before = links.verifiable_count();

        let renderer = StubRenderer::page(RenderedPage {
            final_url: format!("{}/#/home", BASE),
            body: "<html></html>".to_string(),
            anchors: vec![
                // already discovered statically, must not be duplicated
                PageAnchor {
                    href: "https://ctftime.org/".to_string(),
                    text: "CTFtime".to_string(),
                },
                // genuinely new, rendered by client-side JS only
                PageAnchor {
                    href: "https://discord.gg/cyberknights".to_string(),
                    text: "Discord".to_string(),
                },
                // unreadable/blank anchors are tolerated and skipped
                PageAnchor {
                    href: String::new(),
                    text: "ghost".to_string(),
                },
                PageAnchor {
                    href: "https://example.com/untitled".to_string(),
                    text: String::new(),
                },
            ],
        });

        let merged = discover_from_runtime(&renderer, BASE, &mut links)
            .await
            .unwrap();

        assert_eq!(merged, 1);
        assert_eq!(links.verifiable_count(), before + 1);
        assert!(links.contains_url("https://discord.gg/cyberknights"));
    }

    #[tokio::test]
    async fn runtime_renderer_failure_is_fatal() {
        let mut links = DiscoveredLinks::new();
        let renderer = StubRenderer::failing("no chrome binary");

        let result = discover_from_runtime(&renderer, BASE, &mut links).await;
        assert!(result.is_err());
    }
}
