//! Quiz scoring and the restart-surviving quiz session.
//!
//! Assessment questions arrive with four fixed option slots and the name of
//! the correct slot. Scoring is all-or-nothing per question against the full
//! question count; an unanswered question is simply wrong.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::storage::{self, KeyValueStore};

/// Storage key for the persisted quiz session.
const QUIZ_STATE_KEY: &str = "quiz_state";

/// One assessment question in its wire shape.
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    #[serde(default)]
    pub question: String,

    #[serde(default)]
    pub option1: String,

    #[serde(default)]
    pub option2: String,

    #[serde(default)]
    pub option3: String,

    #[serde(default)]
    pub option4: String,

    #[serde(default)]
    pub correct_option: String,
}

impl Question {
    /// The option text at `index`, 0-based.
    pub fn option(&self, index: usize) -> Option<&str> {
        match index {
            0 => Some(&self.option1),
            1 => Some(&self.option2),
            2 => Some(&self.option3),
            3 => Some(&self.option4),
            _ => None,
        }
    }
}

/// The wire name of an option slot, as the submission endpoint expects.
///
/// Out-of-range indices fall back to the first slot.
pub fn option_label(index: usize) -> &'static str {
    match index {
        1 => "option2",
        2 => "option3",
        3 => "option4",
        _ => "option1",
    }
}

/// Percentage score for a set of answers, `0.0..=100.0`.
///
/// `answers` maps question index to selected option index. A question counts
/// as correct when its selected option text equals `correct_option`; the
/// denominator is the full question count, so unanswered questions count
/// against the score. An empty question list scores 0, never NaN.
pub fn score(questions: &[Question], answers: &BTreeMap<usize, usize>) -> f64 {
    if questions.is_empty() {
        return 0.0;
    }

    let correct = questions
        .iter()
        .enumerate()
        .filter(|(index, question)| {
            answers
                .get(index)
                .and_then(|&selected| question.option(selected))
                .is_some_and(|text| text == question.correct_option)
        })
        .count();

    correct as f64 / questions.len() as f64 * 100.0
}

/// The quiz wizard's restart-surviving state.
///
/// Holds the position and answers only; timer state is a UI concern and is
/// not persisted here.
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizSession {
    #[serde(default)]
    pub current_question_index: usize,

    #[serde(default)]
    pub answers: BTreeMap<usize, usize>,
}

impl QuizSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the selected option for a question.
    pub fn answer(&mut self, question_index: usize, option_index: usize) {
        self.answers.insert(question_index, option_index);
    }

    /// Moves to the next question, clamped to the question range.
    pub fn next(&mut self, total_questions: usize) {
        if self.current_question_index + 1 < total_questions {
            self.current_question_index += 1;
        }
    }

    /// Moves to the previous question, clamped at the first.
    pub fn previous(&mut self) {
        self.current_question_index = self.current_question_index.saturating_sub(1);
    }

    /// Scores the recorded answers against the question list.
    pub fn score(&self, questions: &[Question]) -> f64 {
        score(questions, &self.answers)
    }

    /// Persists the session, best-effort.
    ///
    /// Storage failures are logged and swallowed; losing the saved position
    /// must never break the quiz itself.
    pub fn save(&self, store: &dyn KeyValueStore) {
        storage::save_session_best_effort(store, QUIZ_STATE_KEY, self);
    }

    /// Loads the previously saved session, if any survives.
    pub fn load(store: &dyn KeyValueStore) -> Option<Self> {
        storage::load_session_best_effort(store, QUIZ_STATE_KEY)
            .map(|saved| saved.state)
    }

    /// Discards the saved session, best-effort.
    pub fn clear(store: &dyn KeyValueStore) {
        if let Err(error) = store.remove(QUIZ_STATE_KEY) {
            tracing::warn!("failed to clear saved quiz session: {error}");
        }
    }
}
