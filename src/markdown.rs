//! Line-oriented markdown preview.
//!
//! Only a fixed subset is understood: three heading levels, checkbox items,
//! and `**strong**`, `*emphasis*` and `` `code` `` inside paragraphs. Anything
//! else (links, lists, quotes, tables) is kept as literal paragraph text.
use std::sync::LazyLock;

use regex::Regex;

/// Preview length used by list views when none is configured.
pub const DEFAULT_SUMMARY_LENGTH: usize = 100;

/// One inline run inside a paragraph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Span {
    Text(String),
    Strong(String),
    Emphasis(String),
    Code(String),
}

impl Span {
    pub fn text(&self) -> &str {
        match self {
            Span::Text(s) | Span::Strong(s) | Span::Emphasis(s) | Span::Code(s) => s,
        }
    }
}

/// One classified line of a note.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineNode {
    Heading { level: u8, text: String },
    Checkbox { checked: bool, text: String },
    Paragraph { spans: Vec<Span> },
    Blank,
}

impl LineNode {
    /// The visible text of the line, markers removed.
    pub fn plain_text(&self) -> String {
        match self {
            LineNode::Heading { text, .. } | LineNode::Checkbox { text, .. } => text.clone(),
            LineNode::Paragraph { spans } => spans.iter().map(Span::text).collect(),
            LineNode::Blank => String::new(),
        }
    }
}

/// Renders the whole note, one node per `\n`-separated line.
pub fn render_markdown(content: &str) -> Vec<LineNode> {
    content
        .split('\n')
        .map(|line| render_line(line.strip_suffix('\r').unwrap_or(line)))
        .collect()
}

/// Classifies a single line. First matching rule wins.
pub fn render_line(line: &str) -> LineNode {
    const HEADINGS: [(&str, u8); 3] = [("# ", 1), ("## ", 2), ("### ", 3)];
    for (marker, level) in HEADINGS {
        if let Some(text) = line.strip_prefix(marker) {
            return LineNode::Heading {
                level,
                text: text.to_string(),
            };
        }
    }

    if line.contains("- [ ]") || line.contains("- [x]") {
        return LineNode::Checkbox {
            checked: line.contains("- [x]"),
            text: strip_first_checkbox_marker(line),
        };
    }

    if !line.trim().is_empty() {
        return LineNode::Paragraph {
            spans: parse_inline(line),
        };
    }

    LineNode::Blank
}

fn strip_first_checkbox_marker(line: &str) -> String {
    let first = ["- [ ] ", "- [x] "]
        .iter()
        .filter_map(|marker| line.find(marker).map(|at| (at, marker.len())))
        .min_by_key(|(at, _)| *at);

    match first {
        Some((at, len)) => format!("{}{}", &line[..at], &line[at + len..]),
        None => line.to_string(),
    }
}

/// Inline markers in the order they are applied.
const INLINE_MARKERS: [(&str, fn(String) -> Span); 3] = [
    ("**", Span::Strong),
    ("*", Span::Emphasis),
    ("`", Span::Code),
];

/// Splits a paragraph line into typed spans.
///
/// Markers are applied one kind at a time: every `**` pair across the line
/// first, then `*` pairs in the text left over, then `` ` `` pairs. Each
/// opening marker pairs with the nearest closing one and the enclosed text is
/// taken literally, so spans never nest. Markers without a partner stay in the
/// text.
pub fn parse_inline(line: &str) -> Vec<Span> {
    let mut spans = vec![Span::Text(line.to_string())];
    for (marker, make) in INLINE_MARKERS {
        spans = spans
            .into_iter()
            .flat_map(|span| match span {
                Span::Text(text) => split_pairs(&text, marker, make),
                other => vec![other],
            })
            .collect();
    }
    spans
}

/// Cuts `text` on left-to-right pairs of `marker`, wrapping each enclosed run with `make`.
fn split_pairs(text: &str, marker: &str, make: fn(String) -> Span) -> Vec<Span> {
    let mut spans = Vec::new();
    let mut rest = text;

    while let Some(open) = rest.find(marker) {
        let body = &rest[open + marker.len()..];
        let Some(close) = body.find(marker) else {
            break;
        };
        if open > 0 {
            spans.push(Span::Text(rest[..open].to_string()));
        }
        spans.push(make(body[..close].to_string()));
        rest = &body[close + marker.len()..];
    }

    if !rest.is_empty() {
        spans.push(Span::Text(rest.to_string()));
    }
    spans
}

static HEADING_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"#{1,6}\s+").expect("valid heading regex"));
static STRONG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\*\*(.*?)\*\*").expect("valid strong regex"));
static EMPHASIS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\*(.*?)\*").expect("valid emphasis regex"));
static LINK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[(.*?)\]\(.*?\)").expect("valid link regex"));
static INLINE_CODE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"`(.*?)`").expect("valid code regex"));
static LINE_BREAK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\r\n|\n|\r").expect("valid line break regex"));

/// Strips markdown markers and cuts the result to `max_length` characters.
///
/// The cut is a plain character count followed by `...`; it does not look for
/// word boundaries.
pub fn summarize(content: &str, max_length: usize) -> String {
    let text = HEADING_MARKER.replace_all(content, "");
    let text = STRONG.replace_all(&text, "$1");
    let text = EMPHASIS.replace_all(&text, "$1");
    let text = LINK.replace_all(&text, "$1");
    let text = INLINE_CODE.replace_all(&text, "$1");
    let text = LINE_BREAK.replace_all(&text, " ");
    let plain = text.trim();

    if plain.chars().count() <= max_length {
        return plain.to_string();
    }
    let cut: String = plain.chars().take(max_length).collect();
    format!("{}...", cut)
}
