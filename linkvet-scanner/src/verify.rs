use crate::error::Result;
use crate::link::Link;
use crate::outcome::Outcome;
use crate::renderer::PageRenderer;
use reqwest::Client;
use sha2::{Digest, Sha256};
use std::time::Duration;
use tracing::debug;

/// How long client-side hash routing gets to settle after navigation.
pub const SETTLE_DELAY: Duration = Duration::from_secs(5);

/// Default timeout for external GET requests.
pub const EXTERNAL_TIMEOUT: Duration = Duration::from_secs(10);

/// Substrings whose presence in the rendered page text indicates the route
/// resolved to an error page. Kept specific to avoid false positives.
const ERROR_MARKERS: &[&str] = &["404", "not found", "site not found", "page not found"];

/// Substrings proving the rendered page is actually ours and not some
/// off-site error page.
const SITE_MARKERS: &[&str] = &["cyberknights", "ccri"];

/// The three independent conditions an internal link must satisfy. All
/// three are reported on failure for debuggability.
#[derive(Debug, Clone, Copy)]
pub struct InternalCheck {
    /// No error marker appeared in the page text.
    pub clean: bool,
    /// A site marker was present.
    pub on_site: bool,
    /// The routing fragment survived into the browser's final URL.
    pub hash_correct: bool,
}

impl InternalCheck {
    pub fn passed(&self) -> bool {
        self.clean && self.on_site && self.hash_correct
    }
}

/// Resolve a hash-routed URL against the base URL. Non-hash URLs pass
/// through untouched.
pub fn resolve_hash_url(base_url: &str, url: &str) -> String {
    if url.starts_with("#/") {
        format!("{}/{}", base_url.trim_end_matches('/'), url)
    } else {
        url.to_string()
    }
}

/// Build the HTTP client used by external verification workers.
pub fn http_client(timeout: Duration) -> Result<Client> {
    Client::builder()
        .user_agent(concat!("linkvet/", env!("CARGO_PKG_VERSION")))
        .timeout(timeout)
        .redirect(reqwest::redirect::Policy::limited(5))
        .build()
        .map_err(Into::into)
}

/// Verify a hash-routed internal link by rendering it in a fresh browser
/// session. Never returns an error: every failure mode becomes a failed
/// [`Outcome`] so the coordinator's batch is never aborted.
pub async fn verify_internal(
    renderer: &dyn PageRenderer,
    base_url: &str,
    link: &Link,
    settle: Duration,
) -> Outcome {
    let full_url = resolve_hash_url(base_url, &link.url);
    debug!("verifying internal link {} ({})", link.text, full_url);

    let page = match renderer.render(&full_url, settle).await {
        Ok(page) => page,
        Err(e) => return Outcome::fail(link.clone(), None, e.to_string()),
    };

    let body = page.body.to_lowercase();
    let check = InternalCheck {
        clean: !ERROR_MARKERS.iter().any(|m| body.contains(m)),
        on_site: SITE_MARKERS.iter().any(|m| body.contains(m)),
        hash_correct: if let Some(fragment) = link.url.strip_prefix('#') {
            page.final_url.contains(fragment)
        } else {
            true
        },
    };

    if check.passed() {
        Outcome::pass(link.clone(), Some(200))
    } else {
        let error = format!(
            "page load failed or incorrect navigation - expected hash: {}, final url: {}, \
             error marker: {}, on site: {}, hash correct: {}",
            link.url, page.final_url, !check.clean, check.on_site, check.hash_correct
        );
        Outcome::fail(link.clone(), None, error)
    }
}

/// Verify an external link with a plain GET. Success is exactly HTTP 200;
/// anything else, including transport errors, is a failed outcome.
pub async fn verify_external(client: &Client, link: &Link) -> Outcome {
    debug!("verifying external link {} ({})", link.text, link.url);

    match client.get(&link.url).send().await {
        Ok(response) => {
            let status = response.status().as_u16();
            if status == 200 {
                // Hash the body we already have so the history sink can
                // flag drift without a second fetch.
                match response.bytes().await {
                    Ok(bytes) => {
                        let hash = format!("{:x}", Sha256::digest(&bytes));
                        Outcome::pass(link.clone(), Some(200))
                            .with_content(hash, bytes.len() as u64)
                    }
                    Err(_) => Outcome::pass(link.clone(), Some(200)),
                }
            } else {
                Outcome::fail(link.clone(), Some(status), format!("HTTP {}", status))
            }
        }
        Err(e) => Outcome::fail(link.clone(), None, e.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::link::LinkCategory;
    use crate::renderer::testing::StubRenderer;
    use crate::renderer::{PageAnchor, RenderedPage};
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const BASE: &str = "https://ccri-cyberknights.github.io/page";

    fn hash_link(url: &str) -> Link {
        Link::new(url, "Home", LinkCategory::InternalHash)
    }

    fn rendered(final_url: &str, body: &str) -> RenderedPage {
        RenderedPage {
            final_url: final_url.to_string(),
            body: body.to_string(),
            anchors: Vec::<PageAnchor>::new(),
        }
    }

    #[test]
    fn hash_urls_resolve_against_base() {
        assert_eq!(
            resolve_hash_url(BASE, "#/home"),
            "https://ccri-cyberknights.github.io/page/#/home"
        );
        assert_eq!(
            resolve_hash_url(&format!("{}/", BASE), "#/home"),
            "https://ccri-cyberknights.github.io/page/#/home"
        );
        assert_eq!(
            resolve_hash_url(BASE, "https://example.com"),
            "https://example.com"
        );
    }

    #[tokio::test]
    async fn internal_link_passes_when_all_three_conditions_hold() {
        let renderer = StubRenderer::page(rendered(
            "https://ccri-cyberknights.github.io/page/#/home",
            "<html><body>Welcome to the CCRI Cyberknights</body></html>",
        ));

        let outcome = verify_internal(&renderer, BASE, &hash_link("#/home"), Duration::ZERO).await;
        assert!(outcome.success);
        assert_eq!(outcome.status_code, Some(200));
    }

    #[tokio::test]
    async fn internal_link_fails_on_error_marker() {
        let renderer = StubRenderer::page(rendered(
            "https://ccri-cyberknights.github.io/page/#/home",
            "<html><body>CCRI Cyberknights - Page Not Found</body></html>",
        ));

        let outcome = verify_internal(&renderer, BASE, &hash_link("#/home"), Duration::ZERO).await;
        assert!(!outcome.success);
        let error = outcome.error.unwrap();
        assert!(error.contains("error marker: true"));
        assert!(error.contains("on site: true"));
        assert!(error.contains("hash correct: true"));
    }

    #[tokio::test]
    async fn internal_link_fails_when_fragment_is_dropped() {
        // Router bounced us back to the bare base URL.
        let renderer = StubRenderer::page(rendered(
            "https://ccri-cyberknights.github.io/page/",
            "<html><body>CCRI Cyberknights</body></html>",
        ));

        let outcome =
            verify_internal(&renderer, BASE, &hash_link("#/linux"), Duration::ZERO).await;
        assert!(!outcome.success);
        assert!(outcome.error.unwrap().contains("hash correct: false"));
    }

    #[tokio::test]
    async fn internal_link_fails_when_off_site() {
        let renderer = StubRenderer::page(rendered(
            "https://ccri-cyberknights.github.io/page/#/home",
            "<html><body>Some unrelated hosting placeholder</body></html>",
        ));

        let outcome = verify_internal(&renderer, BASE, &hash_link("#/home"), Duration::ZERO).await;
        assert!(!outcome.success);
        assert!(outcome.error.unwrap().contains("on site: false"));
    }

    #[tokio::test]
    async fn renderer_failure_becomes_failed_outcome() {
        let renderer = StubRenderer::failing("chrome refused to start");

        let outcome = verify_internal(&renderer, BASE, &hash_link("#/home"), Duration::ZERO).await;
        assert!(!outcome.success);
        assert!(outcome.error.unwrap().contains("chrome refused to start"));
    }

    #[tokio::test]
    async fn external_200_passes_and_captures_drift_hash() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/ok"))
            .respond_with(ResponseTemplate::new(200).set_body_string("stable content"))
            .mount(&server)
            .await;

        let client = http_client(EXTERNAL_TIMEOUT).unwrap();
        let link = Link::new(
            format!("{}/ok", server.uri()),
            "OK",
            LinkCategory::External,
        );

        let outcome = verify_external(&client, &link).await;
        assert!(outcome.success);
        assert_eq!(outcome.status_code, Some(200));
        assert!(outcome.content_hash.is_some());
        assert_eq!(outcome.content_length, Some("stable content".len() as u64));
    }

    #[tokio::test]
    async fn external_404_fails_with_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/gone"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let client = http_client(EXTERNAL_TIMEOUT).unwrap();
        let link = Link::new(
            format!("{}/gone", server.uri()),
            "Broken",
            LinkCategory::External,
        );

        let outcome = verify_external(&client, &link).await;
        assert!(!outcome.success);
        assert_eq!(outcome.status_code, Some(404));
        assert_eq!(outcome.error.as_deref(), Some("HTTP 404"));
    }

    #[tokio::test]
    async fn unreachable_host_fails_without_panicking() {
        let client = http_client(Duration::from_millis(500)).unwrap();
        // Reserved TEST-NET address, nothing listens here.
        let link = Link::new(
            "http://192.0.2.1:9/void",
            "Void",
            LinkCategory::External,
        );

        let outcome = verify_external(&client, &link).await;
        assert!(!outcome.success);
        assert!(outcome.status_code.is_none());
        assert!(outcome.error.is_some());
    }
}
