//! Markdown stripping and whitespace normalization (`spec.md` §4.1).
//!
//! Cleaning never fails: on any pathological input it degrades to
//! passing the text through unchanged, per the Preparer's Failure clause.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref FENCED_CODE: Regex = Regex::new(r"(?s)```.*?```").unwrap();
    static ref INDENTED_CODE: Regex = Regex::new(r"(?m)^( {4,}|\t+)\S.*$").unwrap();
    static ref INLINE_CODE: Regex = Regex::new(r"`([^`]*)`").unwrap();
    static ref ATX_HEADING: Regex = Regex::new(r"(?m)^#{1,6}\s*(.*)$").unwrap();
    static ref SETEXT_HEADING_UNDERLINE: Regex = Regex::new(r"(?m)^[=-]{2,}\s*$").unwrap();
    static ref STRONG_EMPHASIS: Regex = Regex::new(r"(\*\*|__)(.+?)\1").unwrap();
    static ref EMPHASIS: Regex = Regex::new(r"([*_])(.+?)\1").unwrap();
    static ref IMAGE: Regex = Regex::new(r"!\[([^\]]*)\]\([^)]*\)").unwrap();
    static ref LINK: Regex = Regex::new(r"\[([^\]]*)\]\([^)]*\)").unwrap();
    static ref UNORDERED_BULLET: Regex = Regex::new(r"(?m)^[ \t]*[-*+]\s+").unwrap();
    static ref ORDERED_BULLET: Regex = Regex::new(r"(?m)^[ \t]*\d+[.)]\s+").unwrap();
    static ref TABLE_SEPARATOR_ROW: Regex = Regex::new(r"(?m)^\s*\|?[\s:|-]+\|[\s:|-]*$").unwrap();
    static ref HTML_TAG: Regex = Regex::new(r"</?[a-zA-Z][^>]*>").unwrap();
    static ref BLANK_RUN: Regex = Regex::new(r"\n{3,}").unwrap();
    static ref SPACE_RUN: Regex = Regex::new(r"[ \t]{2,}").unwrap();
}

/// Strip the markdown constructs enumerated in `spec.md` §4.1 while
/// keeping their readable text content, then normalize whitespace.
pub fn clean(raw: &str) -> String {
    let cleaned = std::panic::catch_unwind(|| clean_inner(raw)).unwrap_or_else(|_| raw.to_string());
    cleaned
}

fn clean_inner(raw: &str) -> String {
    let mut text = raw.to_string();

    text = FENCED_CODE.replace_all(&text, "").to_string();
    text = INDENTED_CODE.replace_all(&text, "").to_string();
    text = INLINE_CODE.replace_all(&text, "$1").to_string();

    text = IMAGE.replace_all(&text, "$1").to_string();
    text = LINK.replace_all(&text, "$1").to_string();

    text = TABLE_SEPARATOR_ROW.replace_all(&text, "").to_string();
    text = strip_table_pipes(&text);

    text = ATX_HEADING.replace_all(&text, "$1").to_string();
    text = SETEXT_HEADING_UNDERLINE.replace_all(&text, "").to_string();

    text = STRONG_EMPHASIS.replace_all(&text, "$2").to_string();
    text = EMPHASIS.replace_all(&text, "$2").to_string();

    text = strip_list_markers(&text);

    text = HTML_TAG.replace_all(&text, "").to_string();

    normalize_whitespace(&text)
}

/// Strip a leading list marker from each line and, per `spec.md` §4.1,
/// append a period to any item left without terminal punctuation — a
/// bare item would otherwise carry no sentence-ending punctuation for
/// `split_into_sentences` to find, collapsing every item into one chunk.
fn strip_list_markers(text: &str) -> String {
    text.lines()
        .map(|line| {
            let marker_end = UNORDERED_BULLET
                .find(line)
                .or_else(|| ORDERED_BULLET.find(line))
                .map(|m| m.end());
            let Some(end) = marker_end else {
                return line.to_string();
            };
            let item = line[end..].trim_end();
            if item.is_empty() || item.ends_with(['.', '!', '?']) {
                item.to_string()
            } else {
                format!("{item}.")
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Table rows keep their cells, joined with commas, and lose the `|`s
/// (`spec.md` §4.1: "pipe characters ... removed; cells joined with
/// commas per row").
fn strip_table_pipes(text: &str) -> String {
    text.lines()
        .map(|line| {
            let trimmed = line.trim();
            if trimmed.starts_with('|') && trimmed.ends_with('|') && trimmed.len() > 1 {
                trimmed
                    .trim_matches('|')
                    .split('|')
                    .map(|cell| cell.trim())
                    .collect::<Vec<_>>()
                    .join(", ")
            } else {
                line.to_string()
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Collapse runs of spaces/tabs and excess blank lines while keeping
/// paragraph breaks (`spec.md` §4.1).
fn normalize_whitespace(text: &str) -> String {
    let collapsed = SPACE_RUN.replace_all(text, " ");
    let lines: Vec<&str> = collapsed.lines().map(|l| l.trim_end()).collect();
    let joined = lines.join("\n");
    BLANK_RUN.replace_all(&joined, "\n\n").trim().to_string()
}
