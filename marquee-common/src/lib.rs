//! Common types and utilities shared across Marquee crates.
//!
//! This crate defines the shared error taxonomy and the observability
//! helpers used throughout the Marquee workspace. It stays
//! dependency‑light so that every crate can depend on it.
//!
//! # Overview
//!
//! - [`observability`]: Centralised tracing/logging initialisation
//! - [`MarqueeError`] and [`Result`]: Shared error handling
//! - [`DEFAULT_QUERY`]: Search term used when the caller supplies none
//!
//! # Examples
//!
//! Stage failures render as flat, human-readable strings:
//!
//! ```rust
//! use marquee_common::MarqueeError;
//!
//! let err = MarqueeError::Scrape("selector timed out".into());
//! assert_eq!(err.to_string(), "Scrape error: selector timed out");
//! ```

pub mod observability;

/// Search term used when the user enters nothing.
pub const DEFAULT_QUERY: &str = "techno";

/// Error types used across the Marquee system.
///
/// The taxonomy is flat: pipeline stages convert these into a plain message
/// at their boundary and nobody downstream inspects the variant.
#[derive(thiserror::Error, Debug)]
pub enum MarqueeError {
    /// Browser navigation, selector lookup, or render wait failed.
    #[error("Scrape error: {0}")]
    Scrape(String),

    /// Markup could not be flattened into text.
    #[error("Extract error: {0}")]
    Extract(String),

    /// The model call failed or its output was not usable JSON.
    #[error("Parse error: {0}")]
    Parse(String),

    /// Writing the final output failed.
    #[error("Persist error: {0}")]
    Persist(String),

    /// The LLM provider rejected or failed a request.
    #[error("LLM error: {0}")]
    Llm(String),

    /// A driver (browser, network, etc.) reported an error.
    #[error("Driver error: {0}")]
    Driver(#[from] anyhow::Error),

    /// Configuration was incomplete or invalid.
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Convenient alias for results that use [`MarqueeError`].
pub type Result<T> = std::result::Result<T, MarqueeError>;
