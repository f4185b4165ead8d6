//! The book content schema.
//!
//! A book is a three-level hierarchy (chapter, sub-chapter, sub-sub-chapter)
//! where every level may carry pages, and every page carries a list of
//! content items drawn from a closed, `type`-tagged union. Wire field names
//! are the CMS export's mixed camelCase/snake_case convention, preserved via
//! serde renames.
//!
//! Nothing here is validated beyond structure: titles may be empty, arrays
//! may be missing, and `null` placeholders inside sequences are silently
//! dropped at the boundary (see [`crate::read_book_json`]).

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;

use crate::decision::{Decision, DecisionWire};

/// Deserialises an optional sequence, dropping `null` entries.
///
/// Accepts a missing key, an explicit `null`, or an array containing `null`
/// placeholders, all of which collapse to "zero items".
fn non_null_seq<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    let items = Option::<Vec<Option<T>>>::deserialize(deserializer)?;
    Ok(items.unwrap_or_default().into_iter().flatten().collect())
}

fn is_false(value: &bool) -> bool {
    !*value
}

/// Root document: the whole standing-order book.
///
/// The configuration scalars (`cpd_enabled`, the various thresholds,
/// `points_config`) are carried through untouched for the app shell; the
/// engine only reads `content`.
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
pub struct Book {
    #[serde(default, rename = "bookTitle")]
    pub book_title: String,

    #[serde(default, rename = "subTitle")]
    pub sub_title: String,

    #[serde(default)]
    pub heading: String,

    #[serde(default, rename = "coverUrl")]
    pub cover_url: String,

    #[serde(default, deserialize_with = "non_null_seq")]
    pub content: Vec<Chapter>,

    #[serde(default)]
    pub cpd_enabled: bool,

    #[serde(default)]
    pub content_keystrokes_threshold: f64,

    #[serde(default)]
    pub topbar_search_threshold: f64,

    #[serde(default)]
    pub cpd_minimum_threshold: f64,

    #[serde(default)]
    pub learning_hours_threshold: f64,

    #[serde(default)]
    pub points_multiplier_increment: f64,

    #[serde(default, rename = "courseName")]
    pub course_name: String,

    #[serde(default, rename = "trainingProvider")]
    pub training_provider: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub utils: Option<serde_json::Value>,

    #[serde(
        default,
        rename = "pointsConfig",
        skip_serializing_if = "BTreeMap::is_empty"
    )]
    pub points_config: BTreeMap<String, f64>,
}

impl Book {
    /// Collapses the duplicate decision-data representations on every
    /// chapter-level node into the single canonical `decision` field.
    ///
    /// Called automatically by [`crate::read_book_json`]; only needed
    /// directly when a tree has been assembled or mutated in memory.
    pub fn normalise_decisions(&mut self) {
        for chapter in &mut self.content {
            for sub in &mut chapter.sub_chapters {
                sub.decision = crate::decision::normalised_decision(&sub.wire, &sub.pages);
                for sub_sub in &mut sub.sub_sub_chapters {
                    sub_sub.decision =
                        crate::decision::normalised_decision(&sub_sub.wire, &sub_sub.pages);
                }
            }
        }
    }
}

/// Top level of the topic hierarchy.
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
pub struct Chapter {
    /// Chapter title; the wire key is simply `chapter`.
    #[serde(default)]
    pub chapter: String,

    /// Content pages before any sub-chapter.
    #[serde(default, deserialize_with = "non_null_seq", skip_serializing_if = "Vec::is_empty")]
    pub pages: Vec<Page>,

    #[serde(
        default,
        rename = "subChapters",
        deserialize_with = "non_null_seq",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub sub_chapters: Vec<SubChapter>,
}

/// Second level of the topic hierarchy.
///
/// Decision content may arrive on the wire either as direct fields here or
/// as a nested `decision` content item on the first page; after
/// [`Book::normalise_decisions`] the canonical form is the `decision` field
/// and the wire duplicates are not visible outside this crate.
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
pub struct SubChapter {
    #[serde(default, rename = "subChapterTitle")]
    pub sub_chapter_title: String,

    #[serde(default, deserialize_with = "non_null_seq", skip_serializing_if = "Vec::is_empty")]
    pub pages: Vec<Page>,

    #[serde(
        default,
        rename = "subSubChapters",
        deserialize_with = "non_null_seq",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub sub_sub_chapters: Vec<SubSubChapter>,

    #[serde(flatten)]
    pub(crate) wire: DecisionWire,

    /// Canonical decision record, populated by [`Book::normalise_decisions`].
    #[serde(skip)]
    pub decision: Option<Decision>,
}

/// Terminal level of the topic hierarchy.
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
pub struct SubSubChapter {
    #[serde(default, rename = "subSubChapterTitle")]
    pub sub_sub_chapter_title: String,

    #[serde(default, deserialize_with = "non_null_seq", skip_serializing_if = "Vec::is_empty")]
    pub pages: Vec<Page>,

    #[serde(flatten)]
    pub(crate) wire: DecisionWire,

    /// Canonical decision record, populated by [`Book::normalise_decisions`].
    #[serde(skip)]
    pub decision: Option<Decision>,
}

/// A leaf unit of renderable content.
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
pub struct Page {
    #[serde(default, rename = "pageTitle", skip_serializing_if = "Option::is_none")]
    pub page_title: Option<String>,

    #[serde(default, deserialize_with = "non_null_seq")]
    pub items: Vec<ContentItem>,

    #[serde(default, rename = "markVisit", skip_serializing_if = "is_false")]
    pub mark_visit: bool,
}

/// One content block plus its render-gating flags.
///
/// The flags decide which renderer may show the block (book viewer vs
/// decision-maker surface); the engine preserves them but never filters on
/// them.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct ContentItem {
    #[serde(flatten)]
    pub kind: ContentKind,

    #[serde(default, rename = "onlyBook", skip_serializing_if = "is_false")]
    pub only_book: bool,

    #[serde(default, rename = "onlyDecisionMaker", skip_serializing_if = "is_false")]
    pub only_decision_maker: bool,
}

impl ContentItem {
    /// Wraps a bare kind with both gating flags cleared.
    pub fn new(kind: ContentKind) -> Self {
        Self {
            kind,
            only_book: false,
            only_decision_maker: false,
        }
    }

    /// Convenience constructor for a plain text block.
    pub fn text(content: impl Into<String>) -> Self {
        Self::new(ContentKind::Text {
            content: content.into(),
            style: None,
        })
    }

    /// Returns the decision record when this item is a `decision` block.
    pub fn as_decision(&self) -> Option<&Decision> {
        match &self.kind {
            ContentKind::Decision(decision) => Some(decision),
            _ => None,
        }
    }
}

/// The closed content-item union, discriminated by the wire `type` field.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ContentKind {
    Space {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        content: Option<String>,
    },
    Heading1 {
        #[serde(default)]
        content: String,
    },
    Heading2 {
        #[serde(default)]
        content: String,
    },
    Heading3 {
        #[serde(default)]
        content: String,
    },
    Text {
        #[serde(default)]
        content: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        style: Option<serde_json::Value>,
    },
    Image {
        #[serde(default)]
        src: String,
        #[serde(default)]
        alt: String,
        #[serde(default, skip_serializing_if = "is_false")]
        translate: bool,
    },
    UnorderedList {
        #[serde(default, deserialize_with = "non_null_seq")]
        items: Vec<ListItem>,
    },
    OrderedList {
        #[serde(default, deserialize_with = "non_null_seq")]
        items: Vec<ListItem>,
    },
    #[serde(rename_all = "camelCase")]
    Video {
        #[serde(default)]
        src: String,
        #[serde(default)]
        title: String,
        #[serde(default)]
        file_name: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        description: Option<String>,
        #[serde(default, skip_serializing_if = "is_false")]
        open_external: bool,
        #[serde(default, skip_serializing_if = "is_false")]
        translate: bool,
        #[serde(default, skip_serializing_if = "is_false")]
        youtube: bool,
    },
    #[serde(rename_all = "camelCase")]
    Table {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        title: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        headers: Option<Vec<Vec<TableCell>>>,
        #[serde(default)]
        rows: Vec<Vec<TableCell>>,
        #[serde(default, skip_serializing_if = "is_false")]
        show_cell_borders: bool,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        table_style: Option<serde_json::Value>,
        #[serde(default, skip_serializing_if = "is_false")]
        headless: bool,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        items_per_page: Option<u32>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        column_count: Option<u32>,
    },
    #[serde(rename_all = "camelCase")]
    Quiz {
        #[serde(default)]
        title: String,
        #[serde(default)]
        section_id: String,
        #[serde(default)]
        duration: u32,
        #[serde(default)]
        retries: u32,
        #[serde(default)]
        questions: Vec<QuizQuestion>,
    },
    HorizontalLine {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        style: Option<serde_json::Value>,
    },
    Infographic {
        #[serde(default)]
        src: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        height: Option<f64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        width: Option<f64>,
        #[serde(default)]
        alt: String,
        #[serde(default, skip_serializing_if = "is_false")]
        translate: bool,
    },
    Sidebar {
        #[serde(default)]
        content: String,
    },
    #[serde(rename_all = "camelCase")]
    InteractiveContent {
        #[serde(default)]
        interactive_src: String,
        #[serde(default)]
        interactive_description: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        style: Option<serde_json::Value>,
    },
    Question {
        #[serde(default)]
        question: String,
        #[serde(default)]
        answer: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        style: Option<serde_json::Value>,
    },
    Linkable {
        #[serde(default)]
        content: Vec<LinkEntry>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        style: Option<serde_json::Value>,
    },
    #[serde(rename_all = "camelCase")]
    Downloadable {
        #[serde(default)]
        label: String,
        #[serde(default)]
        url: String,
        #[serde(default)]
        name: String,
        #[serde(default)]
        file_name: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        style: Option<serde_json::Value>,
    },
    Decision(Decision),
}

impl ContentKind {
    /// Returns the plain string content of this kind, when it has one.
    ///
    /// Covers the variants whose wire `content` is a bare string: text,
    /// headings, sidebars and (optionally) spaces. Media, lists, tables and
    /// link collections have no single string content.
    pub fn text_content(&self) -> Option<&str> {
        match self {
            ContentKind::Text { content, .. }
            | ContentKind::Heading1 { content }
            | ContentKind::Heading2 { content }
            | ContentKind::Heading3 { content }
            | ContentKind::Sidebar { content } => Some(content),
            ContentKind::Space { content } => content.as_deref(),
            _ => None,
        }
    }
}

/// One entry of a `linkable` block.
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkEntry {
    #[serde(default)]
    pub text: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link_to: Option<String>,

    #[serde(default)]
    pub link_type: LinkType,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_style: Option<serde_json::Value>,
}

/// Whether a link targets another page of the book or an external URL.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkType {
    #[default]
    Internal,
    External,
}

/// One question embedded in an in-book quiz block.
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizQuestion {
    #[serde(default)]
    pub question: String,

    #[serde(default)]
    pub options: Vec<String>,

    #[serde(default)]
    pub correct_answer: String,
}

/// One top-level entry of an ordered or unordered list.
///
/// The wire allows a bare string, a full content item (text or linkable),
/// or a nested-list wrapper. Untagged: the presence of a `type` key selects
/// the content-item form.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum ListItem {
    Plain(String),
    Item(ContentItem),
    Nested(NestedListItem),
}

/// A list entry that carries its own child list.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NestedListItem {
    #[serde(default)]
    pub content: NestedContent,

    /// The child list, itself a full `unorderedList`/`orderedList` item.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nested_items: Option<Box<ContentItem>>,
}

/// The label of a nested list entry: a bare string or a content item.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum NestedContent {
    Plain(String),
    Item(Box<ContentItem>),
}

impl Default for NestedContent {
    fn default() -> Self {
        NestedContent::Plain(String::new())
    }
}

/// One table cell: a bare string or a content item with span metadata.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum TableCell {
    Plain(String),
    Item(TableCellItem),
}

impl TableCell {
    /// Returns the cell's plain string content, when it has one.
    pub fn content_text(&self) -> Option<&str> {
        match self {
            TableCell::Plain(text) => Some(text),
            TableCell::Item(cell) => cell.item.kind.text_content(),
        }
    }
}

/// A structured table cell wrapping a content item.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TableCellItem {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub row_span: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub col_span: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cell_style: Option<serde_json::Value>,

    #[serde(flatten)]
    pub item: ContentItem,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_kind_round_trips_with_wire_tags() {
        let json = r#"{"type": "heading2", "content": "Danger signs"}"#;
        let item: ContentItem = serde_json::from_str(json).expect("parse");
        assert!(matches!(&item.kind, ContentKind::Heading2 { content } if content == "Danger signs"));

        let out = serde_json::to_value(&item).expect("serialise");
        assert_eq!(out["type"], "heading2");
        assert_eq!(out["content"], "Danger signs");
    }

    #[test]
    fn gating_flags_default_off_and_round_trip() {
        let json = r#"{"type": "text", "content": "For nurses only", "onlyDecisionMaker": true}"#;
        let item: ContentItem = serde_json::from_str(json).expect("parse");
        assert!(item.only_decision_maker);
        assert!(!item.only_book);

        let out = serde_json::to_value(&item).expect("serialise");
        assert_eq!(out["onlyDecisionMaker"], true);
        assert!(out.get("onlyBook").is_none());
    }

    #[test]
    fn list_items_accept_all_wire_shapes() {
        let json = r#"{
            "type": "unorderedList",
            "items": [
                "plain entry",
                {"type": "text", "content": "rich entry"},
                {"content": "parent entry", "nestedItems": {"type": "unorderedList", "items": ["child"]}}
            ]
        }"#;
        let item: ContentItem = serde_json::from_str(json).expect("parse");
        let ContentKind::UnorderedList { items } = &item.kind else {
            panic!("expected a list");
        };
        assert_eq!(items.len(), 3);
        assert!(matches!(&items[0], ListItem::Plain(s) if s == "plain entry"));
        assert!(matches!(&items[1], ListItem::Item(_)));
        let ListItem::Nested(nested) = &items[2] else {
            panic!("expected a nested entry");
        };
        assert!(nested.nested_items.is_some());
    }

    #[test]
    fn table_cells_accept_strings_and_items() {
        let json = r#"{
            "type": "table",
            "headers": [[{"type": "text", "content": "Sign"}, {"type": "text", "content": "Action"}]],
            "rows": [["fever", {"type": "text", "content": "give paracetamol", "colSpan": 2}]]
        }"#;
        let item: ContentItem = serde_json::from_str(json).expect("parse");
        let ContentKind::Table { headers, rows, .. } = &item.kind else {
            panic!("expected a table");
        };
        assert_eq!(headers.as_ref().map(|h| h.len()), Some(1));
        assert_eq!(rows[0][0].content_text(), Some("fever"));
        assert_eq!(rows[0][1].content_text(), Some("give paracetamol"));
    }

    #[test]
    fn unknown_content_type_is_rejected() {
        let result = serde_json::from_str::<ContentItem>(r#"{"type": "hologram"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn text_content_covers_string_variants_only() {
        assert_eq!(ContentItem::text("abc").kind.text_content(), Some("abc"));
        let image = ContentKind::Image {
            src: "x.png".into(),
            alt: "an x-ray".into(),
            translate: false,
        };
        assert_eq!(image.text_content(), None);
    }
}
