// src/models/exam.rs

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::models::question::{PublicQuestion, Question, QuestionRef};

/// Chosen option per snapshot position. Sparse: unanswered positions are absent.
pub type Answers = BTreeMap<usize, u8>;

/// Scored outcome of one session. Derived once and never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExamResult {
    pub score: usize,
    pub total_questions: usize,
    pub percentage: u8,
    /// Positions answered correctly.
    pub correct_answers: BTreeSet<usize>,
    pub user_answers: Answers,
    pub questions: Vec<Question>,
}

/// DTO for returning a generated exam.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionsResponse {
    pub questions: Vec<PublicQuestion>,
    pub total_questions: usize,
    /// Minutes.
    pub time_limit: u32,
}

impl QuestionsResponse {
    /// Countdown length in seconds, capped at `u32::MAX`.
    pub fn time_limit_secs(&self) -> u32 {
        self.time_limit.saturating_mul(60)
    }
}

/// DTO for submitting a quiz attempt.
/// Both fields are optional so that a missing one is reported as invalid input.
#[derive(Debug, Serialize, Deserialize)]
pub struct SubmitExamRequest {
    pub answers: Option<Answers>,
    pub questions: Option<Vec<QuestionRef>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionResponse {
    #[serde(flatten)]
    pub result: ExamResult,
    pub submitted_at: chrono::DateTime<chrono::Utc>,
}
