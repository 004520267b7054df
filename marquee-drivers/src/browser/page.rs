use anyhow::{Context, Result};
use fantoccini::{elements::Element, key::Key, Client, Locator};
use std::time::Duration;

/// High‑level page wrapper providing navigation, waits, and element queries.
pub struct MarqueePage {
    pub(crate) client: Client,
    pub(crate) element_timeout: Duration,
}

impl MarqueePage {
    /// Construct a page wrapper around an existing WebDriver client.
    pub fn new(client: Client, element_timeout: Duration) -> Self {
        Self {
            client,
            element_timeout,
        }
    }

    /// Navigate to `url`.
    pub async fn goto(&mut self, url: &str) -> Result<()> {
        self.client
            .goto(url)
            .await
            .with_context(|| format!("navigation to {url} failed"))?;
        Ok(())
    }

    /// Return the full page HTML source.
    pub async fn get_content(&self) -> Result<String> {
        self.client.source().await.map_err(anyhow::Error::msg)
    }

    /// Return the current page URL.
    pub async fn get_url(&self) -> Result<String> {
        self.client
            .current_url()
            .await
            .map(|url| url.to_string())
            .map_err(anyhow::Error::msg)
    }

    /// Wait for an element matching the CSS selector to appear.
    pub async fn find_element(&self, selector: &str) -> Result<MarqueeElement> {
        let element = self
            .client
            .wait()
            .at_most(self.element_timeout)
            .for_element(Locator::Css(selector))
            .await
            .with_context(|| format!("timed out waiting for selector {selector}"))?;
        Ok(MarqueeElement::new(element))
    }

    /// Sleep for a fixed duration so asynchronous content can render.
    pub async fn wait_for_render(&self, wait: Duration) {
        tokio::time::sleep(wait).await;
    }
}

// =========================
// MarqueeElement Definition
// =========================

#[derive(Clone)]
/// Wrapper for DOM elements that provides typed helpers consistent with [`MarqueePage`].
pub struct MarqueeElement {
    pub element: Element,
}

impl MarqueeElement {
    /// Construct an element wrapper.
    pub fn new(element: Element) -> Self {
        Self { element }
    }

    /// Click the element.
    pub async fn click(&self) -> Result<()> {
        self.element.click().await?;
        Ok(())
    }

    /// Replace the element's value with `text`.
    pub async fn fill(&self, text: &str) -> Result<()> {
        self.element.clear().await?;
        self.element.send_keys(text).await?;
        Ok(())
    }

    /// Send the Enter key to the element.
    pub async fn press_enter(&self) -> Result<()> {
        let enter = char::from(Key::Enter).to_string();
        self.element.send_keys(&enter).await?;
        Ok(())
    }
}
