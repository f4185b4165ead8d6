//! Decision records: history questions, examination findings and candidate
//! cases attached to chapter-level nodes.
//!
//! The wire format grew organically and stores the same decision content in
//! two places: direct fields on a sub-chapter/sub-sub-chapter, and/or a
//! nested `decision`-type content item on the node's first page. This module
//! owns both shapes and the normalisation that collapses them into one
//! canonical [`Decision`] per node. Direct fields win; the nested item is the
//! fallback; the two are never merged.

use serde::{Deserialize, Serialize};

use crate::schema::{Page, SubChapter, SubSubChapter};

/// A canonical decision record.
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Decision {
    #[serde(default)]
    pub name: String,

    /// Questions to ask for the patient's medical history.
    #[serde(default)]
    pub history: Vec<String>,

    /// Examinations or actions to carry out before recording findings.
    #[serde(default)]
    pub examinations_actions: Vec<String>,

    /// The findings a health worker marks yes/no during the flow.
    #[serde(default)]
    pub findings_on_examination: Vec<String>,

    /// Candidate diagnoses evaluated against the positive findings.
    #[serde(default)]
    pub cases: Vec<Case>,

    #[serde(default)]
    pub health_education: Vec<String>,
}

impl Decision {
    /// True when the record carries no usable content at all.
    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
            && self.examinations_actions.is_empty()
            && self.findings_on_examination.is_empty()
            && self.cases.is_empty()
    }
}

/// One candidate diagnosis and its acceptance rule.
///
/// When `decision_dependencies` is non-empty the dependency rule is the sole
/// acceptance criterion and `decision_score` is ignored; otherwise the case
/// is accepted when the fraction of its findings observed positive reaches
/// `decision_score`.
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Case {
    #[serde(default)]
    pub findings_on_history: String,

    #[serde(default)]
    pub findings_on_examination: Vec<String>,

    #[serde(default)]
    pub clinical_judgement: String,

    #[serde(default)]
    pub actions: Vec<String>,

    #[serde(default)]
    pub health_education: Vec<String>,

    /// Threshold fraction in `0..=1`; absent on the wire means 0.
    #[serde(default)]
    pub decision_score: f64,

    #[serde(default)]
    pub decision_dependencies: Vec<String>,
}

/// The direct-field wire duplicate of a decision record.
///
/// Lives flattened inside [`SubChapter`]/[`SubSubChapter`] so the CMS export
/// round-trips; consumed by [`normalised_decision`] and never exposed.
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct DecisionWire {
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub(crate) has_decisions: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) history: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) examinations_actions: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) findings_on_examination: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) cases: Option<Vec<Case>>,
}

impl DecisionWire {
    fn has_direct_fields(&self) -> bool {
        self.history.is_some()
            || self.examinations_actions.is_some()
            || self.findings_on_examination.is_some()
            || self.cases.is_some()
    }

    fn to_decision(&self) -> Decision {
        Decision {
            name: String::new(),
            history: self.history.clone().unwrap_or_default(),
            examinations_actions: self.examinations_actions.clone().unwrap_or_default(),
            findings_on_examination: self.findings_on_examination.clone().unwrap_or_default(),
            cases: self.cases.clone().unwrap_or_default(),
            health_education: Vec::new(),
        }
    }
}

/// Resolves a node's canonical decision record.
///
/// Direct wire fields take precedence; otherwise the first page is scanned
/// for a `decision` content item. Returns `None` when neither shape is
/// present.
pub(crate) fn normalised_decision(wire: &DecisionWire, pages: &[Page]) -> Option<Decision> {
    if wire.has_direct_fields() {
        return Some(wire.to_decision());
    }
    pages
        .first()
        .and_then(|page| page.items.iter().find_map(|item| item.as_decision()))
        .cloned()
}

/// Common access to the decision-bearing hierarchy levels.
///
/// The evaluator in `sor-core` works against this trait so it does not care
/// whether the active node is a sub-chapter or a sub-sub-chapter.
pub trait DecisionNode {
    /// The node's display title.
    fn title(&self) -> &str;

    /// The canonical decision record, if any.
    fn decision(&self) -> Option<&Decision>;

    /// Whether the node should appear in a decision-flow chooser.
    fn has_decision_content(&self) -> bool;
}

impl DecisionNode for SubChapter {
    fn title(&self) -> &str {
        &self.sub_chapter_title
    }

    fn decision(&self) -> Option<&Decision> {
        self.decision.as_ref()
    }

    fn has_decision_content(&self) -> bool {
        self.wire.has_decisions || self.decision.as_ref().is_some_and(|d| !d.is_empty())
    }
}

impl DecisionNode for SubSubChapter {
    fn title(&self) -> &str {
        &self.sub_sub_chapter_title
    }

    fn decision(&self) -> Option<&Decision> {
        self.decision.as_ref()
    }

    fn has_decision_content(&self) -> bool {
        self.wire.has_decisions || self.decision.as_ref().is_some_and(|d| !d.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::read_book_json;

    fn parse_sub_chapter(body: &str) -> SubChapter {
        let json = format!(
            r#"{{"content": [{{"chapter": "Fever", "subChapters": [{body}]}}]}}"#
        );
        let book = read_book_json(&json).expect("parse");
        book.content[0].sub_chapters[0].clone()
    }

    #[test]
    fn direct_fields_become_the_canonical_decision() {
        let sub = parse_sub_chapter(
            r#"{
                "subChapterTitle": "High fever",
                "history": ["How long?"],
                "findingsOnExamination": ["Temp above 39"],
                "cases": [{"clinicalJudgement": "Malaria", "decisionScore": 0.5}]
            }"#,
        );
        let decision = sub.decision.as_ref().expect("normalised");
        assert_eq!(decision.history, vec!["How long?"]);
        assert_eq!(decision.cases.len(), 1);
        assert!(sub.has_decision_content());
    }

    #[test]
    fn nested_decision_item_is_the_fallback() {
        let sub = parse_sub_chapter(
            r#"{
                "subChapterTitle": "Cough",
                "pages": [{"items": [
                    {"type": "text", "content": "intro"},
                    {"type": "decision", "history": ["Any wheeze?"], "cases": []}
                ]}]
            }"#,
        );
        let decision = sub.decision.as_ref().expect("normalised");
        assert_eq!(decision.history, vec!["Any wheeze?"]);
    }

    #[test]
    fn direct_fields_shadow_the_nested_item_without_merging() {
        let sub = parse_sub_chapter(
            r#"{
                "subChapterTitle": "Cough",
                "history": ["Direct question"],
                "pages": [{"items": [
                    {"type": "decision", "history": ["Nested question"], "findingsOnExamination": ["Wheeze"]}
                ]}]
            }"#,
        );
        let decision = sub.decision.as_ref().expect("normalised");
        assert_eq!(decision.history, vec!["Direct question"]);
        // No merging: the nested item's findings do not leak in.
        assert!(decision.findings_on_examination.is_empty());
    }

    #[test]
    fn nodes_without_decision_content_are_not_flagged() {
        let sub = parse_sub_chapter(
            r#"{"subChapterTitle": "Background", "pages": [{"items": [{"type": "text", "content": "reading"}]}]}"#,
        );
        assert!(sub.decision.is_none());
        assert!(!sub.has_decision_content());
    }

    #[test]
    fn wire_flag_alone_marks_a_node_decision_capable() {
        let sub = parse_sub_chapter(r#"{"subChapterTitle": "Flagged", "hasDecisions": true}"#);
        assert!(sub.decision.is_none());
        assert!(sub.has_decision_content());
    }

    #[test]
    fn decision_score_defaults_to_zero() {
        let case: Case = serde_json::from_str(r#"{"clinicalJudgement": "Sepsis"}"#).expect("parse");
        assert_eq!(case.decision_score, 0.0);
        assert!(case.decision_dependencies.is_empty());
    }
}
