//! Procedure-code references recovered from group paragraphs.
//!
//! Matching is split into three small templates instead of one expression:
//! a phrase keyword (`CPT code`, `HCPCS codes`, `CPT/HCPCS codes`), a list
//! grammar (items separated by commas, slashes or `and`) and a range grammar
//! (`81162-81167`, `J9271-J9275`). Extraction never fails: an unreadable
//! paragraph yields an empty or partial list.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;

use crate::codes::normalize_code;
use crate::html;

/// Upper bound on the codes produced by a single range.
pub const MAX_RANGE_EXPANSION: usize = 500;

/// Hyphen, the Unicode hyphens and dashes, and the minus sign.
const RANGE_DASHES: [char; 7] = [
    '-', '\u{2010}', '\u{2011}', '\u{2012}', '\u{2013}', '\u{2014}', '\u{2212}',
];

/// An extracted procedure-code string: uppercase, no whitespace.
pub type CodeReference = String;

static PHRASE_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(CPT\s*/\s*HCPCS|CPT\s+HCPCS|CPT|HCPCS)\s+codes?\b(?:\(s\))?")
        .expect("Invalid code phrase regex")
});

static STANDALONE_HCPCS_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b([A-Z]\d{4})\b").expect("Invalid HCPCS token regex"));

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExtractOptions {
    /// Per-range cap; longer ranges are truncated. Values above
    /// [`MAX_RANGE_EXPANSION`] are clamped to it.
    pub max_range_expansion: usize,
    /// When no phrase list matches, collect bare HCPCS-shaped tokens instead.
    pub standalone_hcpcs: bool,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            max_range_expansion: MAX_RANGE_EXPANSION,
            standalone_hcpcs: false,
        }
    }
}

/// Ordered, de-duplicated procedure codes referenced by a paragraph.
pub fn extract_codes(paragraph_text: &str) -> Vec<CodeReference> {
    extract_codes_with(paragraph_text, &ExtractOptions::default())
}

pub fn extract_codes_with(paragraph_text: &str, opts: &ExtractOptions) -> Vec<CodeReference> {
    if paragraph_text.trim().is_empty() {
        return Vec::new();
    }

    let text = html::strip_tags(&html::unescape_html(paragraph_text));
    let cap = opts.max_range_expansion.min(MAX_RANGE_EXPANSION);
    let mut out = OrderedCodes::default();

    for phrase in PHRASE_REGEX.find_iter(&text) {
        for item in parse_list(&text[phrase.end()..]) {
            item.expand_into(cap, &mut out);
        }
    }

    if out.is_empty() && opts.standalone_hcpcs {
        for caps in STANDALONE_HCPCS_REGEX.captures_iter(&text) {
            out.push(caps[1].to_string());
        }
    }

    out.into_vec()
}

#[derive(Debug, Default)]
struct OrderedCodes {
    seen: HashSet<String>,
    codes: Vec<String>,
}

impl OrderedCodes {
    fn push(&mut self, code: String) {
        if code.is_empty() || self.seen.contains(&code) {
            return;
        }
        self.seen.insert(code.clone());
        self.codes.push(code);
    }

    fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }

    fn into_vec(self) -> Vec<String> {
        self.codes
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum ListItem {
    Single(String),
    Span { start: String, end: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RangeKind {
    Numeric {
        start: u128,
        end: u128,
        width: usize,
    },
    Prefixed {
        prefix: char,
        start: u128,
        end: u128,
        width: usize,
    },
}

impl ListItem {
    fn expand_into(&self, cap: usize, out: &mut OrderedCodes) {
        match self {
            Self::Single(code) => out.push(normalize_code(code)),
            Self::Span { start, end } => {
                let start = normalize_code(start);
                let end = normalize_code(end);
                match classify_range(&start, &end) {
                    Some(range) => range.expand(cap).into_iter().for_each(|c| out.push(c)),
                    None => out.push(format!("{start}-{end}")),
                }
            }
        }
    }
}

impl RangeKind {
    fn expand(self, cap: usize) -> Vec<String> {
        match self {
            Self::Numeric { start, end, width } => (start..=end)
                .take(cap)
                .map(|n| format!("{n:0width$}"))
                .collect(),
            Self::Prefixed {
                prefix,
                start,
                end,
                width,
            } => (start..=end)
                .take(cap)
                .map(|n| format!("{prefix}{n:0width$}"))
                .collect(),
        }
    }
}

/// Returns `None` when the span is not an expandable range; the caller then
/// keeps it as a literal token.
fn classify_range(start: &str, end: &str) -> Option<RangeKind> {
    if is_digits(start) && is_digits(end) {
        let (lo, hi) = (start.parse::<u128>().ok()?, end.parse::<u128>().ok()?);
        return (lo <= hi).then_some(RangeKind::Numeric {
            start: lo,
            end: hi,
            width: start.len(),
        });
    }

    let (p1, d1) = split_prefix(start)?;
    let (p2, d2) = split_prefix(end)?;
    if p1 != p2 || d1.len() != d2.len() {
        return None;
    }
    let (lo, hi) = (d1.parse::<u128>().ok()?, d2.parse::<u128>().ok()?);
    (lo <= hi).then_some(RangeKind::Prefixed {
        prefix: p1,
        start: lo,
        end: hi,
        width: d1.len(),
    })
}

fn split_prefix(code: &str) -> Option<(char, &str)> {
    let mut chars = code.chars();
    let prefix = chars.next().filter(char::is_ascii_alphabetic)?;
    let digits = chars.as_str();
    is_digits(digits).then_some((prefix, digits))
}

fn is_digits(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}

fn has_digit(s: &str) -> bool {
    s.bytes().any(|b| b.is_ascii_digit())
}

/// Reads the code list that follows a phrase keyword.
fn parse_list(input: &str) -> Vec<ListItem> {
    let mut items = Vec::new();
    let mut rest = input.trim_start();

    loop {
        if !items.is_empty() {
            match skip_separator(rest) {
                Some(after) => rest = after,
                None => break,
            }
        }
        match parse_item(rest) {
            Some((item, after)) => {
                items.push(item);
                rest = after;
            }
            None => break,
        }
    }
    items
}

fn parse_item(input: &str) -> Option<(ListItem, &str)> {
    let (first, rest) = take_token(input)?;

    let after_hyphen = rest
        .trim_start()
        .strip_prefix(RANGE_DASHES)
        .map(str::trim_start);
    if let Some((second, after)) = after_hyphen.and_then(take_token) {
        if has_digit(second) {
            let item = ListItem::Span {
                start: first.to_string(),
                end: second.to_string(),
            };
            return Some((item, after));
        }
    }

    has_digit(first).then(|| (ListItem::Single(first.to_string()), rest))
}

fn take_token(input: &str) -> Option<(&str, &str)> {
    let end = input
        .find(|c: char| !c.is_ascii_alphanumeric())
        .unwrap_or(input.len());
    (end > 0).then(|| input.split_at(end))
}

/// Consumes commas, slashes and the connector `and`; `None` if none is present.
fn skip_separator(input: &str) -> Option<&str> {
    let mut rest = input.trim_start();
    let mut consumed = false;

    loop {
        if let Some(after) = rest.strip_prefix([',', '/']) {
            rest = after.trim_start();
            consumed = true;
            continue;
        }
        if let Some((word, after)) = take_token(rest) {
            if word.eq_ignore_ascii_case("and") {
                rest = after.trim_start();
                consumed = true;
                continue;
            }
        }
        break;
    }
    consumed.then_some(rest)
}
