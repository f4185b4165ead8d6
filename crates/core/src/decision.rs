//! The clinical decision-flow evaluator.
//!
//! A stateful wizard over one chapter's decision-bearing descendants:
//! choose a sub-chapter (and possibly a sub-sub-chapter), read the history
//! questions and examination actions, record yes/no findings, then compute
//! which candidate cases match. The evaluator is single-session and owns its
//! state; nothing here performs I/O.
//!
//! View order: `SubChapters → SubSubChapters → History → ExaminationActions
//! → Examination → Diagnosis`, with `back()` retracing the same path.

use serde::{Deserialize, Serialize};
use sor_book::{Book, Case, Chapter, DecisionNode, SubChapter, SubSubChapter};

/// The wizard's current view.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FlowState {
    SubChapters,
    SubSubChapters,
    History,
    ExaminationActions,
    Examination,
    Diagnosis,
}

/// A yes/no answer to one finding-on-examination.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Response {
    Yes,
    No,
}

/// One finding of the active node and its recorded answer.
///
/// Responses are positional: the vector is seeded from the active node's
/// findings list and fully reset whenever the active node changes, so
/// identical finding strings on different nodes can never inherit stale
/// answers.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FindingResponse {
    pub finding: String,
    pub response: Option<Response>,
}

/// Errors from driving the wizard out of order.
#[derive(Debug, thiserror::Error)]
pub enum FlowError {
    #[error("no decision-capable sub-chapter at choice index {0}")]
    InvalidSubChapter(usize),

    #[error("no decision-capable sub-sub-chapter at choice index {0}")]
    InvalidSubSubChapter(usize),

    #[error("no finding at index {0}")]
    InvalidFinding(usize),

    #[error("cannot {action} from the {state:?} view")]
    InvalidTransition {
        action: &'static str,
        state: FlowState,
    },
}

/// Restorable wizard state, minus the chapter it runs over.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlowSnapshot {
    pub state: FlowState,
    pub selected_sub_chapter: Option<usize>,
    pub selected_sub_sub_chapter: Option<usize>,
    pub responses: Vec<FindingResponse>,
    pub path: Vec<String>,
}

/// The decision-flow session for one chapter.
#[derive(Clone, Debug)]
pub struct DecisionFlow {
    chapter: Chapter,
    state: FlowState,
    selected_sub_chapter: Option<usize>,
    selected_sub_sub_chapter: Option<usize>,
    responses: Vec<FindingResponse>,
    path: Vec<String>,
}

impl DecisionFlow {
    /// Opens a flow on a chapter, starting at the sub-chapter chooser.
    pub fn new(chapter: Chapter) -> Self {
        let path = vec![chapter.chapter.clone()];
        Self {
            chapter,
            state: FlowState::SubChapters,
            selected_sub_chapter: None,
            selected_sub_sub_chapter: None,
            responses: Vec::new(),
            path,
        }
    }

    pub fn state(&self) -> FlowState {
        self.state
    }

    /// Breadcrumb of selected titles, chapter first.
    pub fn path(&self) -> &[String] {
        &self.path
    }

    /// Title of the active node, falling back to the chapter.
    pub fn active_title(&self) -> &str {
        self.active_node()
            .map(|node| node.title())
            .unwrap_or(&self.chapter.chapter)
    }

    /// Sub-chapters offered by the chooser: those with decision content.
    pub fn sub_chapter_choices(&self) -> Vec<&SubChapter> {
        self.chapter
            .sub_chapters
            .iter()
            .filter(|sub| sub.has_decision_content())
            .collect()
    }

    /// Sub-sub-chapters offered once a bare sub-chapter is selected.
    pub fn sub_sub_chapter_choices(&self) -> Vec<&SubSubChapter> {
        self.selected_sub_chapter
            .and_then(|index| self.chapter.sub_chapters.get(index))
            .map(|sub| {
                sub.sub_sub_chapters
                    .iter()
                    .filter(|sub_sub| sub_sub.has_decision_content())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Selects a sub-chapter by its position in [`Self::sub_chapter_choices`].
    ///
    /// A node that itself carries history or examination-action content goes
    /// straight to the History view; otherwise the wizard drops to the
    /// sub-sub-chapter chooser.
    ///
    /// # Errors
    ///
    /// Returns [`FlowError::InvalidTransition`] outside the sub-chapter
    /// chooser and [`FlowError::InvalidSubChapter`] for an out-of-range
    /// choice.
    pub fn select_sub_chapter(&mut self, choice: usize) -> Result<FlowState, FlowError> {
        if self.state != FlowState::SubChapters {
            return Err(FlowError::InvalidTransition {
                action: "select a sub-chapter",
                state: self.state,
            });
        }

        let index = self
            .chapter
            .sub_chapters
            .iter()
            .enumerate()
            .filter(|(_, sub)| sub.has_decision_content())
            .nth(choice)
            .map(|(index, _)| index)
            .ok_or(FlowError::InvalidSubChapter(choice))?;

        self.selected_sub_chapter = Some(index);
        let sub = &self.chapter.sub_chapters[index];
        self.path.push(sub.sub_chapter_title.clone());

        let has_own_flow = sub
            .decision
            .as_ref()
            .is_some_and(|d| !d.history.is_empty() || !d.examinations_actions.is_empty());

        if has_own_flow {
            self.reset_responses();
            self.state = FlowState::History;
        } else {
            self.responses.clear();
            self.state = FlowState::SubSubChapters;
        }
        Ok(self.state)
    }

    /// Selects a sub-sub-chapter by its position in
    /// [`Self::sub_sub_chapter_choices`]; always moves to the History view.
    ///
    /// # Errors
    ///
    /// Returns [`FlowError::InvalidTransition`] outside the sub-sub-chapter
    /// chooser and [`FlowError::InvalidSubSubChapter`] for an out-of-range
    /// choice.
    pub fn select_sub_sub_chapter(&mut self, choice: usize) -> Result<FlowState, FlowError> {
        if self.state != FlowState::SubSubChapters {
            return Err(FlowError::InvalidTransition {
                action: "select a sub-sub-chapter",
                state: self.state,
            });
        }

        let parent = self
            .selected_sub_chapter
            .and_then(|index| self.chapter.sub_chapters.get(index))
            .ok_or(FlowError::InvalidSubSubChapter(choice))?;

        let index = parent
            .sub_sub_chapters
            .iter()
            .enumerate()
            .filter(|(_, sub_sub)| sub_sub.has_decision_content())
            .nth(choice)
            .map(|(index, _)| index)
            .ok_or(FlowError::InvalidSubSubChapter(choice))?;

        let title = parent.sub_sub_chapters[index].sub_sub_chapter_title.clone();
        self.selected_sub_sub_chapter = Some(index);
        self.path.push(title);
        self.reset_responses();
        self.state = FlowState::History;
        Ok(self.state)
    }

    /// Moves forward one view.
    ///
    /// Entering Diagnosis seeds a "no" for every finding still unanswered:
    /// unanswered findings count as negative, they are not excluded.
    ///
    /// # Errors
    ///
    /// Returns [`FlowError::InvalidTransition`] from views without a forward
    /// transition (the choosers and Diagnosis).
    pub fn advance(&mut self) -> Result<FlowState, FlowError> {
        self.state = match self.state {
            FlowState::History => FlowState::ExaminationActions,
            FlowState::ExaminationActions => FlowState::Examination,
            FlowState::Examination => {
                for response in &mut self.responses {
                    if response.response.is_none() {
                        response.response = Some(Response::No);
                    }
                }
                FlowState::Diagnosis
            }
            state => {
                return Err(FlowError::InvalidTransition {
                    action: "continue",
                    state,
                })
            }
        };
        Ok(self.state)
    }

    /// Moves back one view, retracing the forward path.
    ///
    /// Returns the view now active, or `None` when backing out of the
    /// sub-chapter chooser exits the flow altogether.
    pub fn back(&mut self) -> Option<FlowState> {
        match self.state {
            FlowState::Diagnosis => self.state = FlowState::Examination,
            FlowState::Examination => self.state = FlowState::ExaminationActions,
            FlowState::ExaminationActions => self.state = FlowState::History,
            FlowState::History => {
                if self.selected_sub_sub_chapter.take().is_some() {
                    self.state = FlowState::SubSubChapters;
                } else {
                    self.selected_sub_chapter = None;
                    self.state = FlowState::SubChapters;
                }
                self.responses.clear();
                self.path.pop();
            }
            FlowState::SubSubChapters => {
                self.selected_sub_chapter = None;
                self.state = FlowState::SubChapters;
                self.path.pop();
            }
            FlowState::SubChapters => return None,
        }
        Some(self.state)
    }

    /// History questions of the active node.
    pub fn history(&self) -> &[String] {
        self.active_decision()
            .map(|d| d.history.as_slice())
            .unwrap_or_default()
    }

    /// Examination actions of the active node.
    pub fn examination_actions(&self) -> &[String] {
        self.active_decision()
            .map(|d| d.examinations_actions.as_slice())
            .unwrap_or_default()
    }

    /// The findings of the active node with their recorded answers.
    pub fn responses(&self) -> &[FindingResponse] {
        &self.responses
    }

    /// Records a yes/no answer for the finding at `index`.
    ///
    /// # Errors
    ///
    /// Returns [`FlowError::InvalidTransition`] outside the Examination view
    /// and [`FlowError::InvalidFinding`] for an out-of-range index.
    pub fn set_response(&mut self, index: usize, response: Response) -> Result<(), FlowError> {
        if self.state != FlowState::Examination {
            return Err(FlowError::InvalidTransition {
                action: "record a finding",
                state: self.state,
            });
        }
        let slot = self
            .responses
            .get_mut(index)
            .ok_or(FlowError::InvalidFinding(index))?;
        slot.response = Some(response);
        Ok(())
    }

    /// The findings currently answered yes.
    pub fn positive_findings(&self) -> Vec<&str> {
        self.responses
            .iter()
            .filter(|r| r.response == Some(Response::Yes))
            .map(|r| r.finding.as_str())
            .collect()
    }

    /// Candidate cases of the active node that match the positive findings.
    pub fn matching_cases(&self) -> Vec<&Case> {
        let positives = self.positive_findings();
        self.active_decision()
            .map(|decision| {
                decision
                    .cases
                    .iter()
                    .filter(|case| case_matches(case, &positives))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// The completed flow's output, ready for the submission adapter.
    ///
    /// Only "yes" responses are included; negative and unanswered findings
    /// are dropped from the record.
    pub fn selections(&self) -> UserSelections {
        let sub_chapter_title = self
            .selected_sub_chapter
            .and_then(|index| self.chapter.sub_chapters.get(index))
            .map(|sub| sub.sub_chapter_title.clone())
            .unwrap_or_default();

        let sub_sub_chapter_title = self
            .selected_sub_chapter
            .zip(self.selected_sub_sub_chapter)
            .and_then(|(sub, sub_sub)| {
                self.chapter
                    .sub_chapters
                    .get(sub)
                    .and_then(|s| s.sub_sub_chapters.get(sub_sub))
            })
            .map(|sub_sub| sub_sub.sub_sub_chapter_title.clone());

        UserSelections {
            chapter_title: self.chapter.chapter.clone(),
            sub_chapter_title,
            sub_sub_chapter_title,
            exam_responses: self
                .responses
                .iter()
                .filter(|r| r.response == Some(Response::Yes))
                .map(|r| ExamResponse {
                    question: r.finding.clone(),
                    response: Response::Yes,
                })
                .collect(),
            matching_diagnoses: self.matching_cases().into_iter().cloned().collect(),
        }
    }

    /// Captures the restorable part of the session.
    pub fn snapshot(&self) -> FlowSnapshot {
        FlowSnapshot {
            state: self.state,
            selected_sub_chapter: self.selected_sub_chapter,
            selected_sub_sub_chapter: self.selected_sub_sub_chapter,
            responses: self.responses.clone(),
            path: self.path.clone(),
        }
    }

    /// Rebuilds a session from a snapshot over the same chapter.
    ///
    /// # Errors
    ///
    /// Returns [`FlowError::InvalidSubChapter`]/[`FlowError::InvalidSubSubChapter`]
    /// when the snapshot's selections do not exist in the chapter, which
    /// happens when the book content changed between sessions.
    pub fn restore(chapter: Chapter, snapshot: FlowSnapshot) -> Result<Self, FlowError> {
        if let Some(index) = snapshot.selected_sub_chapter {
            let sub = chapter
                .sub_chapters
                .get(index)
                .ok_or(FlowError::InvalidSubChapter(index))?;
            if let Some(sub_sub_index) = snapshot.selected_sub_sub_chapter {
                sub.sub_sub_chapters
                    .get(sub_sub_index)
                    .ok_or(FlowError::InvalidSubSubChapter(sub_sub_index))?;
            }
        }

        Ok(Self {
            chapter,
            state: snapshot.state,
            selected_sub_chapter: snapshot.selected_sub_chapter,
            selected_sub_sub_chapter: snapshot.selected_sub_sub_chapter,
            responses: snapshot.responses,
            path: snapshot.path,
        })
    }

    /// The active decision node: the sub-sub-chapter when one is selected,
    /// else the sub-chapter.
    fn active_node(&self) -> Option<&dyn DecisionNode> {
        let sub = self
            .selected_sub_chapter
            .and_then(|index| self.chapter.sub_chapters.get(index))?;

        if let Some(sub_sub) = self
            .selected_sub_sub_chapter
            .and_then(|index| sub.sub_sub_chapters.get(index))
        {
            return Some(sub_sub);
        }
        Some(sub)
    }

    fn active_decision(&self) -> Option<&sor_book::Decision> {
        self.active_node().and_then(|node| node.decision())
    }

    /// Reseeds the response vector from the active node's findings.
    ///
    /// Always a full reset: answers never survive a node change.
    fn reset_responses(&mut self) {
        self.responses = self
            .active_decision()
            .map(|decision| {
                decision
                    .findings_on_examination
                    .iter()
                    .map(|finding| FindingResponse {
                        finding: finding.clone(),
                        response: None,
                    })
                    .collect()
            })
            .unwrap_or_default();
    }
}

/// Chapters that can host a decision flow: those with sub-chapters.
pub fn decision_chapters(book: &Book) -> Vec<&Chapter> {
    book.content
        .iter()
        .filter(|chapter| !chapter.sub_chapters.is_empty())
        .collect()
}

/// Whether a case is accepted for the given positive findings.
///
/// A case with dependencies is judged by the dependency rule alone; its
/// threshold is ignored. Otherwise the fraction of the case's findings
/// observed positive must reach `decision_score`, and a case with no
/// findings at all never matches.
pub fn case_matches(case: &Case, positive_findings: &[&str]) -> bool {
    if !case.decision_dependencies.is_empty() {
        return dependency_satisfied(case, positive_findings);
    }
    threshold_satisfied(case, positive_findings)
}

/// Any-of rule: one present dependency accepts the case.
fn dependency_satisfied(case: &Case, positive_findings: &[&str]) -> bool {
    case.decision_dependencies
        .iter()
        .any(|dependency| positive_findings.contains(&dependency.as_str()))
}

fn threshold_satisfied(case: &Case, positive_findings: &[&str]) -> bool {
    if case.findings_on_examination.is_empty() {
        return false;
    }
    let matching = case
        .findings_on_examination
        .iter()
        .filter(|finding| positive_findings.contains(&finding.as_str()))
        .count();
    let fraction = matching as f64 / case.findings_on_examination.len() as f64;
    fraction >= case.decision_score
}

/// The output of a completed flow: selections plus computed diagnoses.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSelections {
    pub chapter_title: String,

    pub sub_chapter_title: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub sub_sub_chapter_title: Option<String>,

    /// Positive findings only.
    pub exam_responses: Vec<ExamResponse>,

    pub matching_diagnoses: Vec<Case>,
}

/// One recorded finding in the submission wire shape.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ExamResponse {
    pub question: String,
    pub response: Response,
}

#[cfg(test)]
mod tests {
    use super::*;
    use sor_book::read_book_json;

    fn sample_chapter() -> Chapter {
        let book = read_book_json(
            r#"{
                "content": [{
                    "chapter": "Child with fever",
                    "subChapters": [
                        {
                            "subChapterTitle": "Malaria",
                            "history": ["How many days of fever?"],
                            "examinationsActions": ["Take axillary temperature"],
                            "findingsOnExamination": ["Temp above 38", "Chills", "Poor feeding", "Vomiting"],
                            "cases": [
                                {
                                    "clinicalJudgement": "Uncomplicated malaria",
                                    "findingsOnExamination": ["Temp above 38", "Chills", "Poor feeding", "Vomiting"],
                                    "decisionScore": 0.5,
                                    "actions": ["Give antimalarial"]
                                },
                                {
                                    "clinicalJudgement": "Severe malaria",
                                    "findingsOnExamination": ["Convulsions"],
                                    "decisionScore": 0.9,
                                    "decisionDependencies": ["Chills", "Convulsions"]
                                }
                            ]
                        },
                        {"subChapterTitle": "Background reading"},
                        {
                            "subChapterTitle": "Injuries",
                            "hasDecisions": true,
                            "subSubChapters": [
                                {
                                    "subSubChapterTitle": "Burns",
                                    "findingsOnExamination": ["Blistering"],
                                    "cases": [{"clinicalJudgement": "Partial thickness burn", "findingsOnExamination": ["Blistering"], "decisionScore": 1.0}]
                                },
                                {"subSubChapterTitle": "Notes only"}
                            ]
                        }
                    ]
                }]
            }"#,
        )
        .expect("parse");
        book.content[0].clone()
    }

    #[test]
    fn chooser_lists_only_decision_capable_sub_chapters() {
        let flow = DecisionFlow::new(sample_chapter());
        let titles: Vec<&str> = flow
            .sub_chapter_choices()
            .iter()
            .map(|sub| sub.sub_chapter_title.as_str())
            .collect();
        assert_eq!(titles, vec!["Malaria", "Injuries"]);
    }

    #[test]
    fn sub_chapter_with_own_flow_goes_straight_to_history() {
        let mut flow = DecisionFlow::new(sample_chapter());
        let state = flow.select_sub_chapter(0).expect("select Malaria");
        assert_eq!(state, FlowState::History);
        assert_eq!(flow.history(), ["How many days of fever?"]);
        assert_eq!(flow.path(), ["Child with fever", "Malaria"]);
    }

    #[test]
    fn bare_sub_chapter_drops_to_the_sub_sub_chooser() {
        let mut flow = DecisionFlow::new(sample_chapter());
        let state = flow.select_sub_chapter(1).expect("select Injuries");
        assert_eq!(state, FlowState::SubSubChapters);

        let titles: Vec<&str> = flow
            .sub_sub_chapter_choices()
            .iter()
            .map(|sub_sub| sub_sub.sub_sub_chapter_title.as_str())
            .collect();
        assert_eq!(titles, vec!["Burns"]);

        let state = flow.select_sub_sub_chapter(0).expect("select Burns");
        assert_eq!(state, FlowState::History);
        assert_eq!(flow.path(), ["Child with fever", "Injuries", "Burns"]);
    }

    #[test]
    fn advancing_walks_the_view_sequence() {
        let mut flow = DecisionFlow::new(sample_chapter());
        flow.select_sub_chapter(0).expect("select");
        assert_eq!(flow.advance().expect("to actions"), FlowState::ExaminationActions);
        assert_eq!(flow.examination_actions(), ["Take axillary temperature"]);
        assert_eq!(flow.advance().expect("to examination"), FlowState::Examination);
        assert_eq!(flow.advance().expect("to diagnosis"), FlowState::Diagnosis);
    }

    #[test]
    fn entering_diagnosis_defaults_unanswered_findings_to_no() {
        let mut flow = DecisionFlow::new(sample_chapter());
        flow.select_sub_chapter(0).expect("select");
        flow.advance().expect("to actions");
        flow.advance().expect("to examination");
        flow.set_response(0, Response::Yes).expect("answer");
        flow.advance().expect("to diagnosis");

        assert!(flow
            .responses()
            .iter()
            .all(|r| r.response.is_some()));
        assert_eq!(flow.positive_findings(), vec!["Temp above 38"]);
    }

    #[test]
    fn responses_can_only_be_recorded_in_the_examination_view() {
        let mut flow = DecisionFlow::new(sample_chapter());
        flow.select_sub_chapter(0).expect("select");
        let err = flow.set_response(0, Response::Yes).unwrap_err();
        assert!(matches!(err, FlowError::InvalidTransition { .. }));
    }

    #[test]
    fn responses_reset_when_the_active_node_changes() {
        let mut flow = DecisionFlow::new(sample_chapter());
        flow.select_sub_chapter(0).expect("select Malaria");
        flow.advance().expect("to actions");
        flow.advance().expect("to examination");
        flow.set_response(0, Response::Yes).expect("answer");

        // Back out to the chooser and enter a different node.
        flow.back();
        flow.back();
        flow.back();
        assert_eq!(flow.state(), FlowState::SubChapters);
        assert!(flow.responses().is_empty());

        flow.select_sub_chapter(1).expect("select Injuries");
        flow.select_sub_sub_chapter(0).expect("select Burns");
        assert_eq!(flow.responses().len(), 1);
        assert_eq!(flow.responses()[0].finding, "Blistering");
        assert_eq!(flow.responses()[0].response, None);
    }

    #[test]
    fn back_retraces_the_path_and_exits_at_the_top() {
        let mut flow = DecisionFlow::new(sample_chapter());
        flow.select_sub_chapter(1).expect("select Injuries");
        flow.select_sub_sub_chapter(0).expect("select Burns");
        assert_eq!(flow.back(), Some(FlowState::SubSubChapters));
        assert_eq!(flow.path(), ["Child with fever", "Injuries"]);
        assert_eq!(flow.back(), Some(FlowState::SubChapters));
        assert_eq!(flow.path(), ["Child with fever"]);
        assert_eq!(flow.back(), None);
    }

    #[test]
    fn dependency_rule_accepts_on_any_present_dependency() {
        let case = Case {
            decision_dependencies: vec!["fever".into(), "cough".into()],
            decision_score: 0.9,
            findings_on_examination: vec!["fever".into(), "cough".into(), "rash".into()],
            ..Case::default()
        };
        // One dependency present is enough; the high threshold is ignored.
        assert!(case_matches(&case, &["cough"]));
        assert!(!case_matches(&case, &["rash"]));
    }

    #[test]
    fn threshold_rule_is_boundary_inclusive() {
        let case = Case {
            findings_on_examination: vec!["a".into(), "b".into(), "c".into(), "d".into()],
            decision_score: 0.5,
            ..Case::default()
        };
        assert!(case_matches(&case, &["a", "b"]));
        assert!(!case_matches(&case, &["a"]));
    }

    #[test]
    fn cases_without_findings_never_match() {
        let case = Case {
            decision_score: 0.0,
            ..Case::default()
        };
        assert!(!case_matches(&case, &[]));
        assert!(!case_matches(&case, &["anything"]));
    }

    #[test]
    fn diagnosis_reports_matching_cases_for_the_recorded_findings() {
        let mut flow = DecisionFlow::new(sample_chapter());
        flow.select_sub_chapter(0).expect("select Malaria");
        flow.advance().expect("to actions");
        flow.advance().expect("to examination");
        flow.set_response(0, Response::Yes).expect("temp");
        flow.set_response(1, Response::Yes).expect("chills");
        flow.advance().expect("to diagnosis");

        let judgements: Vec<&str> = flow
            .matching_cases()
            .iter()
            .map(|case| case.clinical_judgement.as_str())
            .collect();
        // 2/4 findings reach the 0.5 threshold; "Chills" satisfies the
        // severe-malaria dependency rule.
        assert_eq!(judgements, vec!["Uncomplicated malaria", "Severe malaria"]);
    }

    #[test]
    fn selections_carry_titles_and_positive_responses_only() {
        let mut flow = DecisionFlow::new(sample_chapter());
        flow.select_sub_chapter(0).expect("select Malaria");
        flow.advance().expect("to actions");
        flow.advance().expect("to examination");
        flow.set_response(0, Response::Yes).expect("temp");
        flow.set_response(1, Response::No).expect("chills");
        flow.advance().expect("to diagnosis");

        let selections = flow.selections();
        assert_eq!(selections.chapter_title, "Child with fever");
        assert_eq!(selections.sub_chapter_title, "Malaria");
        assert_eq!(selections.sub_sub_chapter_title, None);
        assert_eq!(selections.exam_responses.len(), 1);
        assert_eq!(selections.exam_responses[0].question, "Temp above 38");
    }

    #[test]
    fn snapshot_and_restore_round_trip() {
        let chapter = sample_chapter();
        let mut flow = DecisionFlow::new(chapter.clone());
        flow.select_sub_chapter(0).expect("select");
        flow.advance().expect("to actions");
        flow.advance().expect("to examination");
        flow.set_response(0, Response::Yes).expect("answer");

        let snapshot = flow.snapshot();
        let restored = DecisionFlow::restore(chapter, snapshot).expect("restore");
        assert_eq!(restored.state(), FlowState::Examination);
        assert_eq!(restored.positive_findings(), vec!["Temp above 38"]);
    }

    #[test]
    fn restore_rejects_selections_missing_from_the_chapter() {
        let chapter = sample_chapter();
        let mut flow = DecisionFlow::new(chapter.clone());
        flow.select_sub_chapter(0).expect("select");
        let mut snapshot = flow.snapshot();
        snapshot.selected_sub_chapter = Some(99);

        let err = DecisionFlow::restore(chapter, snapshot).unwrap_err();
        assert!(matches!(err, FlowError::InvalidSubChapter(99)));
    }

    #[test]
    fn decision_chapters_require_sub_chapters() {
        let book = read_book_json(
            r#"{"content": [
                {"chapter": "Has subs", "subChapters": [{"subChapterTitle": "S"}]},
                {"chapter": "Pages only", "pages": [{"items": [{"type": "text", "content": "x"}]}]}
            ]}"#,
        )
        .expect("parse");
        let titles: Vec<&str> = decision_chapters(&book)
            .iter()
            .map(|chapter| chapter.chapter.as_str())
            .collect();
        assert_eq!(titles, vec!["Has subs"]);
    }

    #[test]
    fn selections_serialise_with_wire_names() {
        let selections = UserSelections {
            chapter_title: "C".into(),
            sub_chapter_title: "S".into(),
            sub_sub_chapter_title: None,
            exam_responses: vec![ExamResponse {
                question: "Q".into(),
                response: Response::Yes,
            }],
            matching_diagnoses: Vec::new(),
        };
        let value = serde_json::to_value(&selections).expect("serialise");
        assert_eq!(value["chapterTitle"], "C");
        assert_eq!(value["examResponses"][0]["response"], "yes");
    }
}
