//! Markdown scanning using pulldown-cmark
//!
//! Inline `#hashtags` are found with a regex and then filtered against the
//! code spans and code blocks pulldown-cmark reports, so a `#include` inside
//! a fenced block never counts as a tag.

use std::ops::Range;

use once_cell::sync::Lazy;
use pulldown_cmark::{Event, Options, Parser, Tag};
use regex::Regex;

/// `#` followed by a run of tag characters. The regex crate has no
/// lookbehind, so the preceding-character rule is checked by hand.
static HASHTAG_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"#([\p{L}\p{N}_/-]+)").expect("hashtag regex"));

/// An inline tag occurrence
#[derive(Debug, Clone, PartialEq)]
pub struct Hashtag<'a> {
    /// Tag text without the leading `#`
    pub name: &'a str,
    /// Byte range of `#name` in the scanned text
    pub range: Range<usize>,
}

/// Byte ranges of inline code spans and code blocks
pub fn code_ranges(text: &str) -> Vec<Range<usize>> {
    let mut ranges = Vec::new();

    for (event, range) in Parser::new_ext(text, Options::empty()).into_offset_iter() {
        match event {
            Event::Code(_) => ranges.push(range),
            Event::Start(Tag::CodeBlock(_)) => ranges.push(range),
            _ => {}
        }
    }

    ranges
}

fn in_ranges(ranges: &[Range<usize>], pos: usize) -> bool {
    ranges.iter().any(|r| r.contains(&pos))
}

fn blocks_tag_start(c: char) -> bool {
    c.is_alphanumeric() || matches!(c, '_' | '#' | '/' | '&')
}

fn is_tag_char(c: char) -> bool {
    c.is_alphanumeric() || matches!(c, '_' | '-' | '/')
}

/// Whether `name` would be read back as an inline tag after a `#`
pub fn is_tag_name(name: &str) -> bool {
    !name.is_empty()
        && !name.ends_with('/')
        && name.chars().all(is_tag_char)
        && !name.chars().all(|c| c.is_ascii_digit() || c == '/')
}

/// Find inline hashtags outside code.
///
/// A tag must not directly follow a word character, `#`, `/` or `&`
/// (headings, URL fragments, HTML entities) and must contain at least one
/// non-digit (`#123` is an issue number, not a tag).
pub fn hashtags(text: &str) -> Vec<Hashtag<'_>> {
    let code = code_ranges(text);

    HASHTAG_RE
        .captures_iter(text)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            let name = caps.get(1)?.as_str().trim_end_matches('/');
            let start = whole.start();

            if let Some(prev) = text[..start].chars().next_back() {
                if blocks_tag_start(prev) {
                    return None;
                }
            }
            if !is_tag_name(name) {
                return None;
            }
            if in_ranges(&code, start) {
                return None;
            }

            Some(Hashtag {
                name,
                range: start..start + 1 + name.len(),
            })
        })
        .collect()
}

/// Rewrite inline hashtags outside code.
///
/// `f` receives each tag name and returns the replacement for the whole
/// `#name` token, or `None` to keep it. An empty replacement also swallows
/// one adjacent space so removed tags don't leave gaps behind. Returns the
/// new text and the number of rewritten tags.
pub fn rewrite_hashtags(
    text: &str,
    mut f: impl FnMut(&str) -> Option<String>,
) -> (String, usize) {
    let bytes = text.as_bytes();
    let mut out = String::with_capacity(text.len());
    let mut last = 0;
    let mut count = 0;

    for tag in hashtags(text) {
        let replacement = match f(tag.name) {
            Some(r) => r,
            None => continue,
        };

        let mut start = tag.range.start;
        let mut end = tag.range.end;
        if replacement.is_empty() {
            if start > last && matches!(bytes[start - 1], b' ' | b'\t') {
                start -= 1;
            } else if bytes.get(end) == Some(&b' ') {
                end += 1;
            }
        }

        out.push_str(&text[last..start]);
        out.push_str(&replacement);
        last = end;
        count += 1;
    }

    out.push_str(&text[last..]);
    (out, count)
}
