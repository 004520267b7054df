//! The event scraping pipeline: scrape a ticketing site, flatten the page
//! into text, ask a model for structured records, and persist them.
//!
//! Every stage implements [`Stage`] and reports through the uniform
//! [`StageResult`] envelope. [`Orchestrator`] runs them in order and stops at
//! the first failure.
//!
//! # Examples
//!
//! ```
//! use marquee_pipeline::StageResult;
//!
//! let ok = StageResult::success(vec!["Jazz Night"]);
//! assert_eq!(
//!     serde_json::to_string(&ok).unwrap(),
//!     r#"{"success":true,"data":["Jazz Night"]}"#
//! );
//! ```
pub mod envelope;
pub mod orchestrator;
pub mod query;
pub mod record;
pub mod sink;
pub mod stage;
pub mod stages;

pub use envelope::StageResult;
pub use orchestrator::{Orchestrator, PipelineState};
pub use query::SearchQuery;
pub use record::{EventRecord, Venue};
pub use sink::{EventSink, JsonFileSink};
pub use stage::Stage;
