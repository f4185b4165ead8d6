//! Shaping a completed decision flow into the backend submission contract.
//!
//! The core only builds the payload and hands it to a [`DecisionSink`]; the
//! HTTP transport, retries and authentication live in the app shell's API
//! client.

use serde::Serialize;
use sor_book::Case;
use sor_types::NonEmptyText;

use crate::decision::{ExamResponse, UserSelections};

/// Why the health worker ran the flow.
///
/// Patient-care submissions must identify the patient; the other reasons
/// carry no details.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SubmissionReason {
    Tutoring,
    SelfStudy,
    PatientCare {
        patient_id: NonEmptyText,
        patient_age: NonEmptyText,
    },
}

impl SubmissionReason {
    /// The reason string the backend expects.
    pub fn label(&self) -> &'static str {
        match self {
            SubmissionReason::Tutoring => "Tutoring",
            SubmissionReason::SelfStudy => "Self-study",
            SubmissionReason::PatientCare { .. } => "Patient Care",
        }
    }
}

/// Errors from handing a submission to its sink.
#[derive(Debug, thiserror::Error)]
pub enum SubmissionError {
    #[error("submission rejected: {0}")]
    Rejected(String),

    #[error("transport failure: {0}")]
    Transport(String),
}

/// The decision-recording endpoint, as seen from the core.
///
/// Implementations wrap whatever transport the app shell uses; the core
/// neither retries nor interprets responses beyond success/failure.
pub trait DecisionSink {
    fn submit(&mut self, submission: &DecisionSubmission) -> Result<(), SubmissionError>;
}

/// The payload contract of the decision-recording endpoint.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DecisionSubmission {
    /// The positive findings, comma-joined, as the free-text case summary.
    pub case_description: String,

    pub exam_responses: Vec<ExamResponse>,

    pub chapter_title: String,

    pub sub_chapter_title: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub sub_sub_chapter_title: Option<String>,

    pub matching_diagnoses: Vec<Case>,

    pub reason: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub patient_id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub patient_age: Option<String>,
}

impl DecisionSubmission {
    /// Shapes a completed flow's output into the wire payload.
    pub fn from_selections(selections: &UserSelections, reason: &SubmissionReason) -> Self {
        let case_description = selections
            .exam_responses
            .iter()
            .map(|response| response.question.as_str())
            .collect::<Vec<_>>()
            .join(", ");

        let (patient_id, patient_age) = match reason {
            SubmissionReason::PatientCare {
                patient_id,
                patient_age,
            } => (
                Some(patient_id.as_str().to_owned()),
                Some(patient_age.as_str().to_owned()),
            ),
            _ => (None, None),
        };

        Self {
            case_description,
            exam_responses: selections.exam_responses.clone(),
            chapter_title: selections.chapter_title.clone(),
            sub_chapter_title: selections.sub_chapter_title.clone(),
            sub_sub_chapter_title: selections.sub_sub_chapter_title.clone(),
            matching_diagnoses: selections.matching_diagnoses.clone(),
            reason: reason.label().to_owned(),
            patient_id,
            patient_age,
        }
    }

    /// The request body as posted: the payload nested under
    /// `decisionDetails`.
    pub fn to_request_body(&self) -> serde_json::Value {
        serde_json::json!({ "decisionDetails": self })
    }
}
