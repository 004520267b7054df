//! Sequential composition of the stages with a short-circuit on failure.

use crate::envelope::StageResult;
use crate::query::SearchQuery;
use crate::record::EventRecord;
use crate::sink::EventSink;
use crate::stage::Stage;
use std::fmt;
use std::sync::Arc;
use uuid::Uuid;

pub type ScrapeStep = Arc<dyn Stage<Input = SearchQuery, Output = String>>;
pub type ExtractStep = Arc<dyn Stage<Input = String, Output = String>>;
pub type ParseStep = Arc<dyn Stage<Input = String, Output = Vec<EventRecord>>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Start,
    Scrape,
    Extract,
    Parse,
    Persist,
    Done,
    Failed,
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Start => "start",
            Self::Scrape => "scrape",
            Self::Extract => "extract",
            Self::Parse => "parse",
            Self::Persist => "persist",
            Self::Done => "done",
            Self::Failed => "failed",
        };
        f.write_str(s)
    }
}

pub struct Orchestrator {
    scraper: ScrapeStep,
    extractor: ExtractStep,
    parser: ParseStep,
    sink: Arc<dyn EventSink>,
}

impl Orchestrator {
    pub fn new(
        scraper: ScrapeStep,
        extractor: ExtractStep,
        parser: ParseStep,
        sink: Arc<dyn EventSink>,
    ) -> Self {
        Self {
            scraper,
            extractor,
            parser,
            sink,
        }
    }

    /// Run scrape, extract, parse and persist in order.
    ///
    /// The first failing stage ends the run and its error message is handed
    /// back unchanged; nothing is persisted in that case.
    pub async fn process_event(&self, query: SearchQuery) -> StageResult<Vec<EventRecord>> {
        let run_id = Uuid::new_v4();
        transition(run_id, PipelineState::Start, &format!("processing query '{query}'"));

        let markup = match step(run_id, PipelineState::Scrape, self.scraper.as_ref(), query).await {
            Ok(markup) => markup,
            Err(e) => return StageResult::Failure(e),
        };

        let text = match step(run_id, PipelineState::Extract, self.extractor.as_ref(), markup).await
        {
            Ok(text) => text,
            Err(e) => return StageResult::Failure(e),
        };

        let records = match step(run_id, PipelineState::Parse, self.parser.as_ref(), text).await {
            Ok(records) => records,
            Err(e) => return StageResult::Failure(e),
        };

        transition(
            run_id,
            PipelineState::Persist,
            &format!("saving {} records to {}", records.len(), self.sink.location()),
        );
        if let Err(e) = self.sink.persist(&records).await {
            let message = e.to_string();
            tracing::error!(target: "marquee.persist", %run_id, error = %message, "persist failed");
            transition(run_id, PipelineState::Failed, &message);
            return StageResult::Failure(message);
        }

        transition(
            run_id,
            PipelineState::Done,
            &format!("saved results to {}", self.sink.location()),
        );
        StageResult::Success(records)
    }
}

async fn step<I, O>(
    run_id: Uuid,
    state: PipelineState,
    stage: &dyn Stage<Input = I, Output = O>,
    input: I,
) -> Result<O, String>
where
    I: Send + 'static,
    O: Send + 'static,
{
    transition(run_id, state, &format!("running {}", stage.name()));
    let result = stage.execute(input).await.into_result();
    if let Err(e) = &result {
        transition(run_id, PipelineState::Failed, e);
    }
    result
}

fn transition(run_id: Uuid, state: PipelineState, detail: &str) {
    tracing::info!(target: "marquee.orchestrator", %run_id, %state, "{detail}");
}
