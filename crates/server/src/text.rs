//! Request text cleanup and Markdown rendering

use once_cell::sync::Lazy;
use pulldown_cmark::{html, Options, Parser};
use regex::Regex;
use std::borrow::Cow;

static HTML_TAG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]*>").unwrap());
static HTML_ENTITY_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"&(nbsp|lt|gt|amp|quot|apos|#\d+);").unwrap());
static SPECIAL_CHARS_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^a-zA-Z0-9\s]").unwrap());
static WHITESPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

/// Normalize caller text before summarization
///
/// Percent-decodes, strips HTML tags and entities, replaces anything
/// outside `[A-Za-z0-9\s]` with a space and collapses whitespace.
pub fn sanitize_content(content: &str) -> String {
    let decoded = urlencoding::decode(content).unwrap_or(Cow::Borrowed(content));

    let text = HTML_TAG_RE.replace_all(&decoded, " ");
    let text = HTML_ENTITY_RE.replace_all(&text, " ");
    let text = SPECIAL_CHARS_RE.replace_all(&text, " ");
    let text = WHITESPACE_RE.replace_all(&text, " ");

    text.trim().to_string()
}

/// Render a Markdown summary as HTML
pub fn format_to_html(markdown: &str) -> String {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_STRIKETHROUGH);

    let parser = Parser::new_ext(markdown, options);
    let mut output = String::with_capacity(markdown.len() * 3 / 2);
    html::push_html(&mut output, parser);
    output
}
