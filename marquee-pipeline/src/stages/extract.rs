use crate::envelope::StageResult;
use crate::stage::Stage;
use async_trait::async_trait;
use marquee_common::MarqueeError;
use marquee_web::extract::{flatten_html, FlattenOptions};

/// Flattens page markup into `TAG: text` lines.
#[derive(Debug, Default)]
pub struct ExtractStage {
    options: FlattenOptions,
}

impl ExtractStage {
    pub fn new(options: FlattenOptions) -> Self {
        Self { options }
    }
}

#[async_trait]
impl Stage for ExtractStage {
    type Input = String;
    type Output = String;

    fn name(&self) -> &str {
        "extractor"
    }

    async fn execute(&self, markup: String) -> StageResult<String> {
        match flatten_html(&markup, &self.options) {
            Ok(text) => {
                tracing::debug!(
                    target: "marquee.extractor",
                    markup_bytes = markup.len(),
                    text_bytes = text.len(),
                    "flattened markup"
                );
                StageResult::success(text)
            }
            Err(e) => {
                let err = MarqueeError::Extract(e.to_string());
                tracing::error!(target: "marquee.extractor", error = %err, "extraction failed");
                StageResult::failure(err.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn labels_each_text_line() {
        let stage = ExtractStage::default();
        let result = stage.execute("<div>Jazz Night</div>".into()).await;
        assert_eq!(result, StageResult::Success("DIV: Jazz Night".into()));
    }

    #[tokio::test]
    async fn unlabelled_mode_yields_bare_text() {
        let stage = ExtractStage::new(FlattenOptions {
            label_tags: false,
            ..FlattenOptions::default()
        });
        let result = stage.execute("<div>Jazz Night</div>".into()).await;
        assert_eq!(result, StageResult::Success("Jazz Night".into()));
    }

    #[tokio::test]
    async fn markup_without_text_is_an_empty_success() {
        let stage = ExtractStage::default();
        let result = stage.execute("<div><img src=\"a.png\"></div>".into()).await;
        assert_eq!(result, StageResult::Success(String::new()));
    }

    #[tokio::test]
    async fn oversized_markup_fails() {
        let stage = ExtractStage::new(FlattenOptions {
            max_markup_bytes: 4,
            ..FlattenOptions::default()
        });
        let result = stage.execute("<p>hello</p>".into()).await;
        assert!(result.error().unwrap().starts_with("Extract error: "));
    }
}
