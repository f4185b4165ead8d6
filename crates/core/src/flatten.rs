//! Flattening the chapter hierarchy into a linear page sequence.
//!
//! The viewer and the search engine both work over the flattened sequence;
//! the index of a page in it is the stable identifier used for navigation
//! jumps, so traversal order must be deterministic: depth-first, pre-order,
//! in input order.

use serde::{Deserialize, Serialize};
use sor_book::{Chapter, ContentItem, Page};

/// A linearised, hierarchy-tagged projection of one content page.
///
/// Every flattened page carries at least one content item; pages with no
/// items never produce one.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct FlattenedPage {
    pub content: Vec<ContentItem>,

    pub chapter_title: String,

    pub sub_chapter_title: Option<String>,

    pub sub_sub_chapter_title: Option<String>,
}

/// Flattens a chapter tree into its ordered page sequence.
///
/// Traversal order per chapter: the chapter's own pages first, then each
/// sub-chapter's pages, then each of that sub-chapter's sub-sub-chapters'
/// pages. Pages with an empty item list are dropped. The function is pure;
/// re-running it on the same tree yields an identical sequence.
pub fn flatten_pages(chapters: &[Chapter]) -> Vec<FlattenedPage> {
    let mut pages = Vec::new();

    for chapter in chapters {
        for page in non_empty(&chapter.pages) {
            pages.push(FlattenedPage {
                content: page.items.clone(),
                chapter_title: chapter.chapter.clone(),
                sub_chapter_title: None,
                sub_sub_chapter_title: None,
            });
        }

        for sub in &chapter.sub_chapters {
            for page in non_empty(&sub.pages) {
                pages.push(FlattenedPage {
                    content: page.items.clone(),
                    chapter_title: chapter.chapter.clone(),
                    sub_chapter_title: Some(sub.sub_chapter_title.clone()),
                    sub_sub_chapter_title: None,
                });
            }

            for sub_sub in &sub.sub_sub_chapters {
                for page in non_empty(&sub_sub.pages) {
                    pages.push(FlattenedPage {
                        content: page.items.clone(),
                        chapter_title: chapter.chapter.clone(),
                        sub_chapter_title: Some(sub.sub_chapter_title.clone()),
                        sub_sub_chapter_title: Some(sub_sub.sub_sub_chapter_title.clone()),
                    });
                }
            }
        }
    }

    pages
}

fn non_empty(pages: &[Page]) -> impl Iterator<Item = &Page> {
    pages.iter().filter(|page| !page.items.is_empty())
}

/// Finds the first flattened page for a hierarchy position.
///
/// Used by the table of contents to jump the viewer to a chapter,
/// sub-chapter or sub-sub-chapter heading. Titles are compared after
/// trimming, treating missing and empty as equivalent. When no page matches
/// all three levels, the sub-sub-chapter constraint is relaxed and the first
/// page under the same chapter/sub-chapter is returned instead.
pub fn first_page_index(
    pages: &[FlattenedPage],
    chapter_title: &str,
    sub_chapter_title: Option<&str>,
    sub_sub_chapter_title: Option<&str>,
) -> Option<usize> {
    let wanted_chapter = normalise(Some(chapter_title));
    let wanted_sub = normalise(sub_chapter_title);
    let wanted_sub_sub = normalise(sub_sub_chapter_title);

    let direct = pages.iter().position(|page| {
        normalise(Some(&page.chapter_title)) == wanted_chapter
            && normalise(page.sub_chapter_title.as_deref()) == wanted_sub
            && normalise(page.sub_sub_chapter_title.as_deref()) == wanted_sub_sub
    });
    if direct.is_some() {
        return direct;
    }

    pages.iter().position(|page| {
        normalise(Some(&page.chapter_title)) == wanted_chapter
            && normalise(page.sub_chapter_title.as_deref()) == wanted_sub
    })
}

fn normalise(value: Option<&str>) -> &str {
    value.map(str::trim).unwrap_or("")
}

#[cfg(test)]
mod tests {
    use super::*;
    use sor_book::read_book_json;

    fn sample_chapters() -> Vec<Chapter> {
        let book = read_book_json(
            r#"{
                "content": [
                    {
                        "chapter": "Fever",
                        "pages": [
                            {"items": [{"type": "text", "content": "Fever overview"}]},
                            {"items": []}
                        ],
                        "subChapters": [
                            {
                                "subChapterTitle": "Assessment",
                                "pages": [{"items": [{"type": "text", "content": "Take the temperature"}]}],
                                "subSubChapters": [
                                    {
                                        "subSubChapterTitle": "Infants",
                                        "pages": [{"items": [{"type": "text", "content": "Axillary reading"}]}]
                                    }
                                ]
                            },
                            {"subChapterTitle": "No pages yet"}
                        ]
                    },
                    {"chapter": "Cough"}
                ]
            }"#,
        )
        .expect("parse");
        book.content
    }

    #[test]
    fn flattens_in_pre_order_with_hierarchy_titles() {
        let pages = flatten_pages(&sample_chapters());
        assert_eq!(pages.len(), 3);

        assert_eq!(pages[0].chapter_title, "Fever");
        assert_eq!(pages[0].sub_chapter_title, None);

        assert_eq!(pages[1].sub_chapter_title.as_deref(), Some("Assessment"));
        assert_eq!(pages[1].sub_sub_chapter_title, None);

        assert_eq!(pages[2].sub_sub_chapter_title.as_deref(), Some("Infants"));
        assert_eq!(pages[2].chapter_title, "Fever");
    }

    #[test]
    fn drops_pages_without_items() {
        let pages = flatten_pages(&sample_chapters());
        assert!(pages.iter().all(|page| !page.content.is_empty()));
    }

    #[test]
    fn flattening_is_deterministic() {
        let chapters = sample_chapters();
        assert_eq!(flatten_pages(&chapters), flatten_pages(&chapters));
    }

    #[test]
    fn empty_tree_flattens_to_nothing() {
        assert!(flatten_pages(&[]).is_empty());
        assert!(flatten_pages(&[Chapter::default()]).is_empty());
    }

    #[test]
    fn first_page_index_matches_exact_hierarchy_position() {
        let pages = flatten_pages(&sample_chapters());
        assert_eq!(first_page_index(&pages, "Fever", None, None), Some(0));
        assert_eq!(
            first_page_index(&pages, "Fever", Some("Assessment"), None),
            Some(1)
        );
        assert_eq!(
            first_page_index(&pages, "Fever", Some("Assessment"), Some("Infants")),
            Some(2)
        );
    }

    #[test]
    fn first_page_index_relaxes_the_sub_sub_chapter_constraint() {
        let pages = flatten_pages(&sample_chapters());
        // "Toddlers" has no pages of its own; fall back to the sub-chapter.
        assert_eq!(
            first_page_index(&pages, "Fever", Some("Assessment"), Some("Toddlers")),
            Some(1)
        );
    }

    #[test]
    fn first_page_index_treats_blank_and_missing_titles_alike() {
        let pages = flatten_pages(&sample_chapters());
        assert_eq!(first_page_index(&pages, "  Fever ", Some(""), None), Some(0));
        assert_eq!(first_page_index(&pages, "Rash", None, None), None);
    }
}
