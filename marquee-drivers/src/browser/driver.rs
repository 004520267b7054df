use crate::browser::page::MarqueePage;
use anyhow::{Context, Result};
use fantoccini::{Client, ClientBuilder};
use serde_json::json;
use std::collections::HashMap;
use std::time::Duration;
use webdriver::capabilities::Capabilities;

/// Chromedriver's default listen address.
pub const DEFAULT_WEBDRIVER_URL: &str = "http://localhost:9515";

/// How a browser session is launched.
#[derive(Debug, Clone)]
pub struct DriverOptions {
    /// Run Chrome without a visible window.
    pub headless: bool,
    /// WebDriver endpoint (chromedriver, selenium, ...).
    pub webdriver_url: String,
    /// Upper bound for element waits.
    pub element_timeout: Duration,
}

impl Default for DriverOptions {
    fn default() -> Self {
        Self {
            headless: false,
            webdriver_url: DEFAULT_WEBDRIVER_URL.to_string(),
            element_timeout: Duration::from_secs(30),
        }
    }
}

/// Thin wrapper around a `fantoccini` WebDriver client.
///
/// One instance is one browser session. Callers own teardown: every path
/// that creates a driver must end in [`MarqueeDriver::close`].
pub struct MarqueeDriver {
    pub client: Client,
    element_timeout: Duration,
}

impl MarqueeDriver {
    /// Create a new session on a running WebDriver service.
    pub async fn new(options: &DriverOptions) -> Result<Self> {
        let mut caps = Capabilities::new();
        let mut chrome_opts = HashMap::new();
        chrome_opts.insert("args".to_string(), json!(launch_arguments(options.headless)));
        caps.insert("goog:chromeOptions".to_string(), json!(chrome_opts));

        tracing::debug!(
            target: "marquee.browser",
            webdriver = %options.webdriver_url,
            headless = options.headless,
            "opening browser session"
        );

        let client = ClientBuilder::native()
            .capabilities(caps)
            .connect(&options.webdriver_url)
            .await
            .with_context(|| format!("failed to connect to WebDriver at {}", options.webdriver_url))?;

        Ok(Self {
            client,
            element_timeout: options.element_timeout,
        })
    }

    /// Navigate to `url` and return a [`MarqueePage`] bound to this session.
    pub async fn goto(&mut self, url: &str) -> Result<MarqueePage> {
        let mut page = MarqueePage::new(self.client.clone(), self.element_timeout);
        page.goto(url).await?;
        Ok(page)
    }

    /// Close the underlying browser session.
    pub async fn close(self) -> Result<()> {
        self.client.close().await?;
        tracing::debug!(target: "marquee.browser", "browser session closed");
        Ok(())
    }
}

/// Chrome command-line arguments for a session.
pub fn launch_arguments(headless: bool) -> Vec<String> {
    let mut args = vec![
        "--disable-dev-shm-usage".to_string(),
        "--window-size=1920,1080".to_string(),
        "--lang=en-US".to_string(),
    ];
    if headless {
        args.push("--headless".to_string());
        args.push("--disable-gpu".to_string());
    }
    args
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn headless_adds_headless_flags() {
        let args = launch_arguments(true);
        assert!(args.iter().any(|a| a == "--headless"));
        assert!(args.iter().any(|a| a == "--disable-gpu"));
    }

    #[test]
    fn headful_sessions_keep_a_window() {
        let args = launch_arguments(false);
        assert!(!args.iter().any(|a| a == "--headless"));
        assert!(!args.iter().any(|a| a.starts_with("--user-agent=")));
        assert!(!args.iter().any(|a| a.contains("AutomationControlled")));
    }
}
