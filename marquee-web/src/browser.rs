use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use marquee_drivers::browser::driver::{DriverOptions, MarqueeDriver};
use std::time::Duration;
use url::Url;

/// Ticketmaster's landing page; the search box lives in its header.
pub const DEFAULT_SITE_URL: &str = "https://www.ticketmaster.com/";
pub const DEFAULT_SEARCH_SELECTOR: &str = "#searchFormInput-input";
pub const DEFAULT_RENDER_WAIT: Duration = Duration::from_millis(3000);

/// Rendered markup of a search results page.
#[derive(Debug, Clone)]
pub struct PageCapture {
    pub url: Url,
    pub query: String,
    pub html: String,
    pub html_checksum: String,
    pub captured_at: DateTime<Utc>,
}

impl PageCapture {
    pub fn new(url: Url, query: &str, html: String) -> Self {
        let html_checksum = blake3::hash(html.as_bytes()).to_hex().to_string();
        Self {
            url,
            query: query.to_string(),
            html,
            html_checksum,
            captured_at: Utc::now(),
        }
    }
}

/// Where and how a search is performed.
#[derive(Debug, Clone)]
pub struct SearchTarget {
    pub site_url: Url,
    pub search_selector: String,
    /// Fixed pause after submitting, for client-side rendering to settle.
    pub render_wait: Duration,
}

impl SearchTarget {
    pub fn new(site_url: &str, search_selector: &str, render_wait: Duration) -> Result<Self> {
        let site_url =
            Url::parse(site_url).with_context(|| format!("invalid site url: {site_url}"))?;
        Ok(Self {
            site_url,
            search_selector: search_selector.to_string(),
            render_wait,
        })
    }
}

/// Runs a site search and hands back the rendered page.
#[async_trait::async_trait]
pub trait BrowserCapturer: Send + Sync {
    async fn capture_search(&self, query: &str) -> Result<PageCapture>;
}

/// One open browser session able to perform a search.
#[async_trait::async_trait]
pub trait SearchSession: Send + Sized {
    async fn run_search(&mut self, target: &SearchTarget, query: &str) -> Result<PageCapture>;

    async fn close(self) -> Result<()>;
}

/// Run a search on `session` and close it afterwards, whether the search
/// succeeded or not. A close error is logged and does not replace the
/// search outcome.
pub async fn search_then_close<S: SearchSession>(
    mut session: S,
    target: &SearchTarget,
    query: &str,
) -> Result<PageCapture> {
    let outcome = session.run_search(target, query).await;

    if let Err(e) = session.close().await {
        tracing::warn!(target: "marquee.scraper", error = %e, "failed to close browser session");
    }

    outcome
}

#[async_trait::async_trait]
impl SearchSession for MarqueeDriver {
    async fn run_search(&mut self, target: &SearchTarget, query: &str) -> Result<PageCapture> {
        tracing::info!(target: "marquee.scraper", site = %target.site_url, "navigating to site");
        let page = self.goto(target.site_url.as_str()).await?;

        tracing::info!(target: "marquee.scraper", %query, "searching");
        let input = page.find_element(&target.search_selector).await?;
        input.click().await?;
        input.fill(query).await?;
        input.press_enter().await?;

        tracing::info!(
            target: "marquee.scraper",
            wait_ms = target.render_wait.as_millis() as u64,
            "waiting for results"
        );
        page.wait_for_render(target.render_wait).await;

        let html = page.get_content().await?;
        let url = match page.get_url().await {
            Ok(raw) => Url::parse(&raw).unwrap_or_else(|_| target.site_url.clone()),
            Err(_) => target.site_url.clone(),
        };
        Ok(PageCapture::new(url, query, html))
    }

    async fn close(self) -> Result<()> {
        MarqueeDriver::close(self).await
    }
}

/// Concrete capturer backed by the fantoccini-based driver.
///
/// Each call opens its own browser session and closes it before returning.
pub struct FantocciniCapturer {
    target: SearchTarget,
    driver_options: DriverOptions,
}

impl FantocciniCapturer {
    pub fn new(target: SearchTarget, driver_options: DriverOptions) -> Self {
        Self {
            target,
            driver_options,
        }
    }
}

#[async_trait::async_trait]
impl BrowserCapturer for FantocciniCapturer {
    async fn capture_search(&self, query: &str) -> Result<PageCapture> {
        let driver = MarqueeDriver::new(&self.driver_options).await?;
        let capture = search_then_close(driver, &self.target, query).await?;
        tracing::info!(
            target: "marquee.scraper",
            url = %capture.url,
            bytes = capture.html.len(),
            checksum = %capture.html_checksum,
            "captured search results"
        );
        Ok(capture)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, Ordering};

    #[test]
    fn captures_carry_a_stable_checksum() {
        let url = Url::parse(DEFAULT_SITE_URL).unwrap();
        let a = PageCapture::new(url.clone(), "jazz", "<div>Jazz Night</div>".into());
        let b = PageCapture::new(url, "jazz", "<div>Jazz Night</div>".into());
        assert_eq!(a.html_checksum, b.html_checksum);
        assert_eq!(a.html_checksum.len(), 64);
    }

    #[test]
    fn invalid_site_urls_are_rejected() {
        assert!(SearchTarget::new("not a url", DEFAULT_SEARCH_SELECTOR, DEFAULT_RENDER_WAIT).is_err());
        let target =
            SearchTarget::new(DEFAULT_SITE_URL, DEFAULT_SEARCH_SELECTOR, DEFAULT_RENDER_WAIT)
                .unwrap();
        assert_eq!(target.site_url.host_str(), Some("www.ticketmaster.com"));
    }

    struct FakeSession {
        fail_search: bool,
        fail_close: bool,
        closed: Arc<AtomicBool>,
    }

    #[async_trait::async_trait]
    impl SearchSession for FakeSession {
        async fn run_search(&mut self, target: &SearchTarget, query: &str) -> Result<PageCapture> {
            if self.fail_search {
                anyhow::bail!("timed out waiting for selector {}", target.search_selector);
            }
            Ok(PageCapture::new(
                target.site_url.clone(),
                query,
                "<div>Jazz Night</div>".into(),
            ))
        }

        async fn close(self) -> Result<()> {
            self.closed.store(true, Ordering::SeqCst);
            if self.fail_close {
                anyhow::bail!("session already gone");
            }
            Ok(())
        }
    }

    fn target() -> SearchTarget {
        SearchTarget::new(DEFAULT_SITE_URL, DEFAULT_SEARCH_SELECTOR, DEFAULT_RENDER_WAIT).unwrap()
    }

    #[tokio::test]
    async fn failed_searches_still_close_the_session() {
        let closed = Arc::new(AtomicBool::new(false));
        let session = FakeSession {
            fail_search: true,
            fail_close: false,
            closed: closed.clone(),
        };

        let err = search_then_close(session, &target(), "jazz").await.unwrap_err();
        assert!(err.to_string().contains("#searchFormInput-input"));
        assert!(closed.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn successful_searches_close_the_session() {
        let closed = Arc::new(AtomicBool::new(false));
        let session = FakeSession {
            fail_search: false,
            fail_close: false,
            closed: closed.clone(),
        };

        let capture = search_then_close(session, &target(), "jazz").await.unwrap();
        assert_eq!(capture.query, "jazz");
        assert!(closed.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn close_errors_do_not_mask_the_search_result() {
        let closed = Arc::new(AtomicBool::new(false));
        let session = FakeSession {
            fail_search: false,
            fail_close: true,
            closed: closed.clone(),
        };

        let capture = search_then_close(session, &target(), "jazz").await.unwrap();
        assert_eq!(capture.html, "<div>Jazz Night</div>");
        assert!(closed.load(Ordering::SeqCst));
    }

    #[tokio::test]
    #[ignore = "requires chromedriver on localhost:9515 and network access"]
    async fn ticketmaster_search_smoketest() {
        let target =
            SearchTarget::new(DEFAULT_SITE_URL, DEFAULT_SEARCH_SELECTOR, DEFAULT_RENDER_WAIT)
                .unwrap();
        let capturer = FantocciniCapturer::new(
            target,
            DriverOptions {
                headless: true,
                ..DriverOptions::default()
            },
        );
        let capture = capturer.capture_search("techno").await.unwrap();
        assert!(capture.html.contains("<html"));
    }
}
