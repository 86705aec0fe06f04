//! Inline hashtag extraction from free text.
//!
//! A hashtag token is `#` immediately followed by one or more of
//! `[A-Za-z0-9_]`, terminated by the first character outside that class or the
//! end of input. Tokens need no preceding boundary, so `tag#notahashtag`
//! contains the tag `notahashtag`. Names are case-sensitive: `#Work` and
//! `#work` are distinct tags.

use std::collections::HashSet;
use std::ops::Range;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

static HASHTAG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"#([A-Za-z0-9_]+)").expect("valid hashtag regex"));

/// A hashtag token found in text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HashtagMatch<'a> {
    /// Tag name without the leading `#`.
    pub name: &'a str,
    /// Byte range of the full token, including the `#`.
    pub span: Range<usize>,
}

/// Iterate over every hashtag token in `text`, in order of appearance.
pub fn hashtag_matches(text: &str) -> impl Iterator<Item = HashtagMatch<'_>> {
    HASHTAG.captures_iter(text).filter_map(|cap| {
        let token = cap.get(0)?;
        let name = cap.get(1)?;
        Some(HashtagMatch {
            name: name.as_str(),
            span: token.range(),
        })
    })
}

/// Extract tag names from text, without the leading `#`.
///
/// Names are returned in first-occurrence order and may repeat; use
/// [`distinct_hashtags`] when each name should appear once.
///
/// # Examples
///
/// ```
/// use taskdaily_core::extract_hashtags;
///
/// let tags = extract_hashtags("Plan #Work then #home, more #Work");
/// assert_eq!(tags, vec!["Work", "home", "Work"]);
/// ```
pub fn extract_hashtags(text: &str) -> Vec<String> {
    hashtag_matches(text).map(|m| m.name.to_string()).collect()
}

/// Extract tag names with duplicates collapsed, keeping first-occurrence order.
pub fn distinct_hashtags(text: &str) -> Vec<String> {
    dedup_names(hashtag_matches(text).map(|m| m.name))
}

/// Collapse repeated names, keeping the first occurrence of each.
pub fn dedup_names<I, S>(names: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for name in names {
        let name = name.as_ref();
        if seen.insert(name.to_string()) {
            out.push(name.to_string());
        }
    }
    out
}

// =============================================================================
// SEGMENTATION
// =============================================================================

/// A run of text, either plain or a hashtag token (including its `#`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "text", rename_all = "snake_case")]
pub enum Segment<'a> {
    Plain(&'a str),
    Hashtag(&'a str),
}

impl<'a> Segment<'a> {
    pub fn as_str(&self) -> &'a str {
        match self {
            Self::Plain(s) | Self::Hashtag(s) => s,
        }
    }

    pub fn is_hashtag(&self) -> bool {
        matches!(self, Self::Hashtag(_))
    }
}

/// Split text into plain and hashtag segments for highlighting.
///
/// Concatenating the segments reproduces `text` exactly. Empty plain runs
/// between adjacent tokens are omitted.
pub fn segment_hashtags(text: &str) -> Vec<Segment<'_>> {
    let mut segments = Vec::new();
    let mut last = 0;

    for m in hashtag_matches(text) {
        if m.span.start > last {
            segments.push(Segment::Plain(&text[last..m.span.start]));
        }
        segments.push(Segment::Hashtag(&text[m.span.clone()]));
        last = m.span.end;
    }

    if last < text.len() {
        segments.push(Segment::Plain(&text[last..]));
    }

    segments
}

/// Stable palette index for a hashtag token.
///
/// Rolling hash over UTF-16 code units: `unit + ((hash << 5) - hash)` where
/// only the shift wraps to 32 bits and the running value does not. Tokens
/// get the same color the web client gives them.
pub fn tag_color_index(token: &str, palette_len: usize) -> usize {
    if palette_len == 0 {
        return 0;
    }
    let hash = token.encode_utf16().fold(0i64, |hash, unit| {
        let shifted = i64::from((hash as i32).wrapping_shl(5));
        i64::from(unit).wrapping_add(shifted.wrapping_sub(hash))
    });
    (hash.unsigned_abs() % palette_len as u64) as usize
}
