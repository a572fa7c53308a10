// src/models/question.rs

use serde::{Deserialize, Serialize};

/// Number of options every question carries.
pub const OPTION_COUNT: usize = 4;

/// A single multiple-choice question from the bank.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    pub id: u32,

    #[serde(rename = "question")]
    pub text: String,

    pub options: [String; OPTION_COUNT],

    /// Index into `options` of the correct answer.
    #[serde(rename = "correctAnswer")]
    pub correct_option: u8,
}

/// DTO for sending a question to the client (excludes the correct answer).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicQuestion {
    pub id: u32,
    #[serde(rename = "question")]
    pub text: String,
    pub options: [String; OPTION_COUNT],
}

impl From<&Question> for PublicQuestion {
    fn from(q: &Question) -> Self {
        Self {
            id: q.id,
            text: q.text.clone(),
            options: q.options.clone(),
        }
    }
}

/// Minimal view of a submitted question: only the id is trusted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionRef {
    pub id: u32,
}

/// Anything the exam session can present as a question.
pub trait ExamItem: Clone + Send + Sync + 'static {
    fn id(&self) -> u32;
    fn text(&self) -> &str;
    fn options(&self) -> &[String];

    fn option_count(&self) -> usize {
        self.options().len()
    }
}

impl ExamItem for Question {
    fn id(&self) -> u32 {
        self.id
    }
    fn text(&self) -> &str {
        &self.text
    }
    fn options(&self) -> &[String] {
        &self.options
    }
}

impl ExamItem for PublicQuestion {
    fn id(&self) -> u32 {
        self.id
    }
    fn text(&self) -> &str {
        &self.text
    }
    fn options(&self) -> &[String] {
        &self.options
    }
}
