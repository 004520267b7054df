//! Structured extraction of event records through a chat model.

use crate::envelope::StageResult;
use crate::record::{EventRecord, RECORD_KEYS};
use crate::stage::Stage;
use async_trait::async_trait;
use marquee_common::{MarqueeError, Result};
use marquee_llm::traits::LlmClient;
use regex::Regex;
use serde_json::{Map, Value};
use std::sync::Arc;

pub const DEFAULT_TEMPERATURE: f32 = 0.7;

pub const EXTRACTION_PROMPT: &str = r#"Extract event information from the text and return it as JSON with this structure:
[{
    "title": str,
    "date": str (YYYY-MM-DD),
    "time": str (HH:MM),
    "venue": {"name": str, "address": str},
    "ticket_prices": {"category": price},
    "performers": ["performer1", "performer2"],
    "additional_info": "optional additional information"
}]
Only return the JSON object, no other text."#;

/// Sends flattened page text to the model and decodes the records it returns.
pub struct ParseStage {
    llm: Arc<dyn LlmClient>,
    temperature: f32,
    max_tokens: Option<u32>,
}

impl ParseStage {
    pub fn new(llm: Arc<dyn LlmClient>) -> Self {
        Self {
            llm,
            temperature: DEFAULT_TEMPERATURE,
            max_tokens: None,
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: Option<u32>) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    async fn parse(&self, text: &str) -> Result<Vec<EventRecord>> {
        tracing::info!(
            target: "marquee.parser",
            model = %self.llm.model_name(),
            text_bytes = text.len(),
            "requesting structured extraction"
        );
        let response = self
            .llm
            .generate_json(
                text,
                Some(EXTRACTION_PROMPT),
                self.max_tokens,
                Some(self.temperature),
            )
            .await?;

        let records = decode_records(&response.text)?;
        tracing::info!(
            target: "marquee.parser",
            records = records.len(),
            tokens = ?response.tokens_used,
            "model output decoded"
        );
        Ok(records)
    }
}

#[async_trait]
impl Stage for ParseStage {
    type Input = String;
    type Output = Vec<EventRecord>;

    fn name(&self) -> &str {
        "parser"
    }

    async fn execute(&self, text: String) -> StageResult<Vec<EventRecord>> {
        let result = self.parse(&text).await;
        if let Err(e) = &result {
            tracing::error!(target: "marquee.parser", error = %e, "parsing failed");
        }
        StageResult::from_result(result)
    }
}

/// Decode model output into records.
///
/// Accepts a JSON array of records, a wrapper object holding exactly one list
/// of objects (JSON mode tends to answer `{"events": [...]}`), or a single
/// record object. An object carrying any record key is always a record, so
/// its `performers` list is never mistaken for a wrapper. A fenced ```json
/// block is unwrapped first.
pub fn decode_records(raw: &str) -> Result<Vec<EventRecord>> {
    let body = extract_json_block(raw).unwrap_or_else(|| raw.trim().to_string());
    let value: Value = serde_json::from_str(&body)
        .map_err(|e| MarqueeError::Parse(format!("model output is not JSON: {e}")))?;

    let items = match value {
        Value::Array(items) => items,
        Value::Object(map) => unwrap_object(map)?,
        other => {
            return Err(MarqueeError::Parse(format!(
                "expected a JSON array or object, got {}",
                kind(&other)
            )));
        }
    };

    items
        .into_iter()
        .map(|item| {
            serde_json::from_value(item)
                .map_err(|e| MarqueeError::Parse(format!("invalid event record: {e}")))
        })
        .collect()
}

fn unwrap_object(map: Map<String, Value>) -> Result<Vec<Value>> {
    if RECORD_KEYS.iter().any(|key| map.contains_key(*key)) {
        return Ok(vec![Value::Object(map)]);
    }

    let is_record_list =
        |v: &Value| matches!(v, Value::Array(items) if items.iter().all(Value::is_object));
    match map.values().filter(|v| is_record_list(v)).count() {
        0 => Ok(vec![Value::Object(map)]),
        1 => Ok(map
            .into_iter()
            .find_map(|(_, v)| match v {
                Value::Array(items) if items.iter().all(Value::is_object) => Some(items),
                _ => None,
            })
            .unwrap_or_default()),
        _ => Err(MarqueeError::Parse(
            "model output holds more than one list of records".into(),
        )),
    }
}

/// Try to extract a ```json ... ``` fenced block.
fn extract_json_block(text: &str) -> Option<String> {
    let re_fence = Regex::new("(?s)```(?:json)?\\s*(.*?)\\s*```").ok()?;
    let caps = re_fence.captures(text)?;
    Some(caps.get(1)?.as_str().to_string())
}

fn kind(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use marquee_llm::traits::LlmResponse;
    use std::sync::Mutex;

    struct CannedLlm {
        reply: std::result::Result<String, String>,
        calls: Mutex<Vec<(String, Option<String>, Option<f32>)>>,
    }

    impl CannedLlm {
        fn replying(text: &str) -> Arc<Self> {
            Arc::new(Self {
                reply: Ok(text.to_string()),
                calls: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl LlmClient for CannedLlm {
        async fn generate(
            &self,
            prompt: &str,
            system_prompt: Option<&str>,
            _max_tokens: Option<u32>,
            temperature: Option<f32>,
        ) -> Result<LlmResponse> {
            self.calls.lock().unwrap().push((
                prompt.to_string(),
                system_prompt.map(str::to_string),
                temperature,
            ));
            match &self.reply {
                Ok(text) => Ok(LlmResponse {
                    text: text.clone(),
                    model: Some("canned".into()),
                    tokens_used: None,
                }),
                Err(msg) => Err(MarqueeError::Llm(msg.clone())),
            }
        }

        fn model_name(&self) -> &str {
            "canned"
        }
    }

    #[test]
    fn arrays_decode_directly() {
        let records = decode_records(r#"[{"title":"A"},{"title":"B"}]"#).unwrap();
        let titles: Vec<_> = records.iter().map(|r| r.title.as_str()).collect();
        assert_eq!(titles, ["A", "B"]);
    }

    #[test]
    fn single_list_objects_are_unwrapped() {
        let records = decode_records(r#"{"events":[{"title":"Jazz Night"}]}"#).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].title, "Jazz Night");
    }

    #[test]
    fn single_records_with_performers_stay_whole() {
        let records =
            decode_records(r#"{"title":"Jazz Night","performers":["Trio A","Trio B"]}"#).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].title, "Jazz Night");
        assert_eq!(records[0].performers, ["Trio A", "Trio B"]);
    }

    #[test]
    fn wrappers_only_unwrap_lists_of_objects() {
        let records = decode_records(r#"{"tags":["a","b"],"events":[{"title":"X"}]}"#).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].title, "X");
        assert_eq!(records[0].extra.len(), 0);
    }

    #[test]
    fn wrongly_shaped_fields_do_not_fail_decoding() {
        let records = decode_records(
            r#"[{"title":"Rave","ticket_prices":[{"category":"GA","price":30}]},{"performers":"x"}]"#,
        )
        .unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].title, "Rave");
        assert!(records[0].extra["ticket_prices"].is_array());
        assert_eq!(records[1].extra["performers"], serde_json::json!("x"));
    }

    #[test]
    fn single_records_become_one_element_lists() {
        let records =
            decode_records(r#"{"title":"Jazz Night","venue":{"name":"Blue Note"}}"#).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].venue.name, "Blue Note");
    }

    #[test]
    fn fenced_blocks_are_unwrapped() {
        let raw = "Here you go:\n```json\n[{\"title\":\"Rave\"}]\n```";
        assert_eq!(decode_records(raw).unwrap()[0].title, "Rave");
    }

    #[test]
    fn empty_lists_are_valid() {
        assert!(decode_records("[]").unwrap().is_empty());
        assert!(decode_records(r#"{"events": []}"#).unwrap().is_empty());
    }

    #[test]
    fn invalid_output_is_a_parse_error() {
        for raw in [
            "not json",
            "42",
            r#"{"a":[{"title":"A"}],"b":[{"title":"B"}]}"#,
            r#"["Trio A"]"#,
        ] {
            let err = decode_records(raw).unwrap_err();
            assert!(matches!(err, MarqueeError::Parse(_)), "{raw}: {err}");
        }
    }

    #[tokio::test]
    async fn sends_the_text_with_the_extraction_prompt() {
        let llm = CannedLlm::replying(r#"[{"title":"Jazz Night"}]"#);
        let stage = ParseStage::new(llm.clone());

        let result = stage.execute("DIV: Jazz Night".into()).await;
        assert_eq!(result.data().unwrap()[0].title, "Jazz Night");

        let calls = llm.calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0, "DIV: Jazz Night");
        assert_eq!(calls[0].1.as_deref(), Some(EXTRACTION_PROMPT));
        assert_eq!(calls[0].2, Some(0.7));
    }

    #[tokio::test]
    async fn model_errors_become_failures() {
        let llm = Arc::new(CannedLlm {
            reply: Err("HTTP 401: invalid api key".into()),
            calls: Mutex::new(Vec::new()),
        });
        let stage = ParseStage::new(llm).with_temperature(0.2);

        let result = stage.execute("DIV: x".into()).await;
        assert_eq!(
            result.error(),
            Some("LLM error: HTTP 401: invalid api key")
        );
    }

    #[tokio::test]
    async fn malformed_model_output_becomes_a_failure() {
        let stage = ParseStage::new(CannedLlm::replying("I found no events."));
        let result = stage.execute("DIV: x".into()).await;
        assert!(result.error().unwrap().starts_with("Parse error: "));
    }
}
