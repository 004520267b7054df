//! Web acquisition and text extraction.
//!
//! - Browser capture trait and Fantoccini-backed implementation (`browser`)
//! - Line-oriented HTML flattening (`extract`)

pub mod browser;
pub mod extract;
