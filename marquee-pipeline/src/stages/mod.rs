//! The three leaf stages of the pipeline.
pub mod extract;
pub mod parse;
pub mod scrape;

pub use extract::ExtractStage;
pub use parse::ParseStage;
pub use scrape::ScrapeStage;
