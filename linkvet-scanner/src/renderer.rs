use crate::error::{Result, VerifyError};
use async_trait::async_trait;
use chromiumoxide::Page;
use chromiumoxide::browser::{Browser, BrowserConfig};
use futures::StreamExt;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, warn};

/// One anchor as the browser resolved it: absolute `href`, trimmed text.
#[derive(Debug, Clone, Deserialize)]
pub struct PageAnchor {
    pub href: String,
    pub text: String,
}

/// Snapshot of a page after client-side routing has settled.
#[derive(Debug, Clone)]
pub struct RenderedPage {
    /// The URL the browser ended up on, fragment included.
    pub final_url: String,
    /// Full serialized DOM at snapshot time.
    pub body: String,
    pub anchors: Vec<PageAnchor>,
}

/// Seam between the verifier and the browser runtime. Tests substitute a
/// stub; production uses [`ChromiumRenderer`].
#[async_trait]
pub trait PageRenderer: Send + Sync {
    /// Load `url`, wait `settle` for hash routing, and snapshot the result.
    async fn render(&self, url: &str, settle: Duration) -> Result<RenderedPage>;
}

/// Headless-Chrome renderer. Every call launches its own browser and tears
/// it down before returning, so a hung or crashed session never leaks into
/// a sibling worker.
pub struct ChromiumRenderer {
    nav_timeout: Duration,
}

impl ChromiumRenderer {
    pub fn new() -> Self {
        Self::with_timeout(Duration::from_secs(30))
    }

    pub fn with_timeout(nav_timeout: Duration) -> Self {
        Self { nav_timeout }
    }

    async fn snapshot(page: &Page, settle: Duration) -> Result<RenderedPage> {
        page.wait_for_navigation().await?;
        tokio::time::sleep(settle).await;

        let final_url = page.url().await?.unwrap_or_default();
        let body = page.content().await?;
        let anchors = page
            .evaluate(ANCHOR_SNAPSHOT_JS)
            .await?
            .into_value::<Vec<PageAnchor>>()
            .map_err(|e| VerifyError::ParseError(format!("anchor snapshot: {}", e)))?;

        Ok(RenderedPage {
            final_url,
            body,
            anchors,
        })
    }
}

impl Default for ChromiumRenderer {
    fn default() -> Self {
        Self::new()
    }
}

// Anchors whose attributes cannot be read are skipped, not fatal.
const ANCHOR_SNAPSHOT_JS: &str = r#"
Array.from(document.querySelectorAll('a')).flatMap((a) => {
    try {
        const href = a.href;
        const text = (a.textContent || '').trim();
        return href ? [{ href: href, text: text }] : [];
    } catch (_) {
        return [];
    }
})
"#;


#[async_trait]
impl PageRenderer for ChromiumRenderer {
    async fn render(&self, url: &str, settle: Duration) -> Result<RenderedPage> {
        let config = BrowserConfig::builder()
            .no_sandbox()
            .window_size(1920, 1080)
            .args(vec!["--disable-gpu", "--disable-dev-shm-usage"])
            .request_timeout(self.nav_timeout)
            .build()
            .map_err(VerifyError::BrowserLaunch)?;

        let (mut browser, mut handler) = Browser::launch(config).await?;
        let driver = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if event.is_err() {
                    break;
                }
            }
        });

        debug!("rendering {}", url);
        let result = match browser.new_page(url).await {
            Ok(page) => {
                let snapshot = Self::snapshot(&page, settle).await;
                if let Err(e) = page.close().await {
                    debug!("failed to close page for {}: {}", url, e);
                }
                snapshot
            }
            Err(e) => Err(e.into()),
        };

        // Teardown runs regardless of how the snapshot went.
        if let Err(e) = browser.close().await {
            warn!("failed to close browser session: {}", e);
        }
        let _ = browser.wait().await;
        driver.abort();

        result
    }
}
