use crate::envelope::StageResult;
use crate::query::SearchQuery;
use crate::stage::Stage;
use async_trait::async_trait;
use marquee_common::MarqueeError;
use marquee_web::browser::BrowserCapturer;
use std::sync::Arc;

/// Runs a site search and yields the rendered page markup.
pub struct ScrapeStage {
    capturer: Arc<dyn BrowserCapturer>,
}

impl ScrapeStage {
    pub fn new(capturer: Arc<dyn BrowserCapturer>) -> Self {
        Self { capturer }
    }
}

#[async_trait]
impl Stage for ScrapeStage {
    type Input = SearchQuery;
    type Output = String;

    fn name(&self) -> &str {
        "scraper"
    }

    async fn execute(&self, query: SearchQuery) -> StageResult<String> {
        match self.capturer.capture_search(query.as_str()).await {
            Ok(capture) => StageResult::success(capture.html),
            Err(e) => {
                let err = MarqueeError::Scrape(format!("{e:#}"));
                tracing::error!(target: "marquee.scraper", %query, error = %err, "scrape failed");
                StageResult::failure(err.to_string())
            }
        }
    }
}
