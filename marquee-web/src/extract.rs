//! Line-oriented flattening of HTML into text for model consumption.
//!
//! Every element whose content is a single string (directly, or through a
//! chain of single-child elements) becomes one line, `TAG: text`, in
//! document order. Mixed-content elements contribute nothing themselves but
//! their children are still visited, so nested text shows up once per
//! element in the chain.

use anyhow::{bail, Result};
use scraper::{ElementRef, Html};

/// Elements removed together with their subtree before flattening.
const INVISIBLE: [&str; 2] = ["script", "style"];

/// Default ceiling for markup handed to [`flatten_html`] (16 MiB).
pub const DEFAULT_MAX_MARKUP_BYTES: usize = 16 * 1024 * 1024;

/// Tuning for [`flatten_html`].
#[derive(Debug, Clone)]
pub struct FlattenOptions {
    /// Prefix each line with the upper-cased tag name.
    pub label_tags: bool,
    /// Markup above this size is rejected instead of parsed.
    pub max_markup_bytes: usize,
}

impl Default for FlattenOptions {
    fn default() -> Self {
        Self {
            label_tags: true,
            max_markup_bytes: DEFAULT_MAX_MARKUP_BYTES,
        }
    }
}

/// Flatten `markup` into newline-separated lines of text.
///
/// Inputs without an `<html` tag or doctype are parsed as fragments so the
/// parser's synthetic wrappers do not show up as extra lines.
///
/// ```
/// use marquee_web::extract::{flatten_html, FlattenOptions};
///
/// let text = flatten_html("<a>X</a><b>Y</b>", &FlattenOptions::default()).unwrap();
/// assert_eq!(text, "A: X\nB: Y");
/// ```
pub fn flatten_html(markup: &str, opts: &FlattenOptions) -> Result<String> {
    if markup.len() > opts.max_markup_bytes {
        bail!(
            "markup is {} bytes, above the {} byte limit",
            markup.len(),
            opts.max_markup_bytes
        );
    }

    let parsed = if is_full_document(markup) {
        Html::parse_document(markup)
    } else {
        Html::parse_fragment(markup)
    };
    // The `<html>` root always holds a `<head>` next to its content, so it
    // never has a single string of its own and only its children are walked.
    let mut out = String::new();
    walk(parsed.root_element(), opts, &mut out);

    Ok(out.trim().to_string())
}

fn is_full_document(markup: &str) -> bool {
    let lower = markup.to_ascii_lowercase();
    lower.contains("<html") || lower.contains("<!doctype")
}

fn is_invisible(el: &ElementRef<'_>) -> bool {
    INVISIBLE.contains(&el.value().name())
}

fn walk(el: ElementRef<'_>, opts: &FlattenOptions, out: &mut String) {
    for child in el.children() {
        if let Some(child_el) = ElementRef::wrap(child) {
            if is_invisible(&child_el) {
                continue;
            }
            emit(child_el, opts, out);
            walk(child_el, opts, out);
        }
    }
}

fn emit(el: ElementRef<'_>, opts: &FlattenOptions, out: &mut String) {
    let Some(text) = direct_string(el) else {
        return;
    };
    let text = text.trim();
    if text.is_empty() {
        return;
    }
    if opts.label_tags {
        out.push_str(&el.value().name().to_ascii_uppercase());
        out.push_str(": ");
    }
    out.push_str(text);
    out.push('\n');
}

/// The single string an element holds, looking through single-child chains.
fn direct_string<'a>(el: ElementRef<'a>) -> Option<&'a str> {
    let mut children = el
        .children()
        .filter(|c| ElementRef::wrap(*c).map_or(true, |e| !is_invisible(&e)));
    let only = children.next()?;
    if children.next().is_some() {
        return None;
    }
    if let Some(text) = only.value().as_text() {
        return Some(&**text);
    }
    ElementRef::wrap(only).and_then(direct_string)
}
