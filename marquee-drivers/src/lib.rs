//! Driver layer for browser automation.
//!
//! This crate exposes the WebDriver session wrapper and the page/element
//! helpers the scraper uses to run a search and capture rendered markup.
//!
//! - [`browser::driver::MarqueeDriver`]: WebDriver client wrapper
//! - [`browser::page::MarqueePage`]: navigation, waits, and DOM helpers
pub mod browser;
