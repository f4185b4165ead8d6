//! Full-text content search over the flattened page sequence.
//!
//! Matching is case-insensitive substring containment, not tokenised or
//! fuzzy. Each content-item kind contributes its own searchable text and its
//! own display excerpt; text items get a context window around the first
//! occurrence, expanded outward so the excerpt never begins or ends inside a
//! word.

use serde::Serialize;
use sor_book::{ContentItem, ContentKind, ListItem, NestedContent, TableCell};

use crate::flatten::FlattenedPage;

/// Characters of context kept either side of a text match.
const EXCERPT_CONTEXT: usize = 50;

/// One page that matched the query.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SearchResult {
    /// The matched page, as flattened.
    pub page: FlattenedPage,

    /// Index of the page in the searched sequence; the navigation target.
    pub page_index: usize,

    /// The matching items only, each with its display excerpt.
    pub matches: Vec<ItemMatch>,
}

/// One matching content item within a result page.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ItemMatch {
    pub item: ContentItem,
    pub kind: MatchKind,
    pub excerpt: String,
}

/// Which kind of content produced a match; shown as the excerpt caption.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum MatchKind {
    Text,
    Heading,
    UnorderedList,
    OrderedList,
    Table,
    Image,
    Video,
}

impl MatchKind {
    /// Display caption for the result list.
    pub fn label(&self) -> &'static str {
        match self {
            MatchKind::Text => "Text",
            MatchKind::Heading => "Heading",
            MatchKind::UnorderedList => "Unordered List",
            MatchKind::OrderedList => "Ordered List",
            MatchKind::Table => "Table",
            MatchKind::Image => "Image",
            MatchKind::Video => "Video",
        }
    }
}

/// Searches the flattened pages for a query.
///
/// An empty or whitespace-only query returns no results rather than matching
/// everything. A page appears in the output iff at least one of its content
/// items matches; results keep ascending page order, so `page_index` is both
/// the rank and the jump target.
pub fn search(query: &str, pages: &[FlattenedPage]) -> Vec<SearchResult> {
    if query.trim().is_empty() {
        return Vec::new();
    }

    pages
        .iter()
        .enumerate()
        .filter_map(|(page_index, page)| {
            let matches: Vec<ItemMatch> = page
                .content
                .iter()
                .filter_map(|item| match_item(item, query))
                .collect();

            if matches.is_empty() {
                None
            } else {
                Some(SearchResult {
                    page: page.clone(),
                    page_index,
                    matches,
                })
            }
        })
        .collect()
}

/// Applies the per-kind matching rule and builds the display excerpt.
fn match_item(item: &ContentItem, query: &str) -> Option<ItemMatch> {
    let (kind, excerpt) = match &item.kind {
        ContentKind::Text { content, .. } => {
            (MatchKind::Text, text_excerpt(content, query)?)
        }
        ContentKind::Heading1 { content }
        | ContentKind::Heading2 { content }
        | ContentKind::Heading3 { content } => {
            if !contains_ci(content, query) {
                return None;
            }
            (MatchKind::Heading, format!("Heading: {}", content.trim()))
        }
        ContentKind::UnorderedList { items } => (
            MatchKind::UnorderedList,
            list_excerpt(items, query, false)?,
        ),
        ContentKind::OrderedList { items } => {
            (MatchKind::OrderedList, list_excerpt(items, query, true)?)
        }
        ContentKind::Table { headers, rows, .. } => {
            let header_cells = headers.iter().flatten().flatten();
            let row_cells = rows.iter().flatten();
            let mut cells = header_cells.chain(row_cells);
            if !cells.any(|cell| cell_matches(cell, query)) {
                return None;
            }
            (MatchKind::Table, "Match found in Table".to_string())
        }
        ContentKind::Image { alt, .. } => {
            if !contains_ci(alt, query) {
                return None;
            }
            (MatchKind::Image, format!("Image Alt: {alt}"))
        }
        ContentKind::Video {
            title, description, ..
        } => {
            let description_text = description.as_deref().unwrap_or("");
            if !contains_ci(title, query) && !contains_ci(description_text, query) {
                return None;
            }
            let label = if title.is_empty() { description_text } else { title };
            (MatchKind::Video, format!("Video: {label}"))
        }
        // Spaces, rules, media without text metadata, quizzes, decisions,
        // links and downloads never match.
        _ => return None,
    };

    Some(ItemMatch {
        item: item.clone(),
        kind,
        excerpt,
    })
}

fn cell_matches(cell: &TableCell, query: &str) -> bool {
    cell.content_text()
        .is_some_and(|text| contains_ci(text, query))
}

/// The searchable text of one top-level list entry.
///
/// Child lists under a nested entry are not consulted; list matching is
/// deliberately shallow.
fn list_entry_text(entry: &ListItem) -> Option<&str> {
    match entry {
        ListItem::Plain(text) => Some(text),
        ListItem::Item(item) => item.kind.text_content(),
        ListItem::Nested(nested) => match &nested.content {
            NestedContent::Plain(text) => Some(text),
            NestedContent::Item(item) => item.kind.text_content(),
        },
    }
}

/// Renders the matching entries of a list, bulleted or renumbered.
///
/// Non-matching entries are omitted entirely; numbering runs over the
/// matching subset in source order.
fn list_excerpt(items: &[ListItem], query: &str, ordered: bool) -> Option<String> {
    let matching: Vec<&str> = items
        .iter()
        .filter_map(list_entry_text)
        .filter(|text| contains_ci(text, query))
        .collect();

    if matching.is_empty() {
        return None;
    }

    let lines: Vec<String> = matching
        .iter()
        .enumerate()
        .map(|(position, text)| {
            if ordered {
                format!("{}. {text}", position + 1)
            } else {
                format!("• {text}")
            }
        })
        .collect();

    Some(lines.join("\n"))
}

/// Excerpt of a text item: a ±[`EXCERPT_CONTEXT`]-character window around the
/// first match, grown to word boundaries, trimmed.
fn text_excerpt(content: &str, query: &str) -> Option<String> {
    excerpt_window(content, query).map(|(start, end)| content[start..end].trim().to_string())
}

/// Computes the excerpt window as a byte range into `content`.
///
/// The raw window is `EXCERPT_CONTEXT` characters either side of the first
/// case-insensitive occurrence of `query`; both edges are then pushed
/// outward while they sit on a word character, so the window only ever cuts
/// at whitespace/punctuation or the string ends.
fn excerpt_window(content: &str, query: &str) -> Option<(usize, usize)> {
    let (match_start, match_end) = find_ci(content, query)?;

    let chars: Vec<(usize, char)> = content.char_indices().collect();
    let match_start_char = chars.iter().position(|(byte, _)| *byte == match_start)?;
    let match_end_char = chars
        .iter()
        .position(|(byte, _)| *byte >= match_end)
        .unwrap_or(chars.len());

    let mut start = match_start_char.saturating_sub(EXCERPT_CONTEXT);
    let mut end = (match_end_char + EXCERPT_CONTEXT).min(chars.len());

    while start > 0 && is_word_char(chars[start - 1].1) {
        start -= 1;
    }
    while end < chars.len() && is_word_char(chars[end].1) {
        end += 1;
    }

    let start_byte = chars.get(start).map_or(content.len(), |(byte, _)| *byte);
    let end_byte = chars.get(end).map_or(content.len(), |(byte, _)| *byte);
    Some((start_byte, end_byte))
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

fn contains_ci(haystack: &str, needle: &str) -> bool {
    find_ci(haystack, needle).is_some()
}

/// Byte range of the first case-insensitive occurrence of `needle`.
///
/// Folds each character to the first char of its lowercase mapping; adequate
/// for the Latin-script content the CMS produces.
fn find_ci(haystack: &str, needle: &str) -> Option<(usize, usize)> {
    if needle.is_empty() {
        return None;
    }

    let needle: Vec<char> = needle.chars().map(fold_char).collect();
    let hay: Vec<(usize, char)> = haystack.char_indices().collect();
    if hay.len() < needle.len() {
        return None;
    }

    for start in 0..=hay.len() - needle.len() {
        let window = &hay[start..start + needle.len()];
        if window
            .iter()
            .zip(&needle)
            .all(|((_, hay_char), needle_char)| fold_char(*hay_char) == *needle_char)
        {
            let start_byte = hay[start].0;
            let end_byte = hay
                .get(start + needle.len())
                .map_or(haystack.len(), |(byte, _)| *byte);
            return Some((start_byte, end_byte));
        }
    }

    None
}

fn fold_char(c: char) -> char {
    c.to_lowercase().next().unwrap_or(c)
}
