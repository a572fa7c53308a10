// src/services/scoring.rs

use std::collections::BTreeSet;

use crate::{
    error::AppError,
    models::{
        exam::{Answers, ExamResult},
        question::Question,
    },
};

/// Scores a snapshot against the chosen answers.
///
/// Unanswered positions count as incorrect. Fails with `MalformedSubmission`
/// when the snapshot is empty or an answer points past its end.
pub fn score(questions: &[Question], answers: &Answers) -> Result<ExamResult, AppError> {
    if questions.is_empty() {
        return Err(AppError::MalformedSubmission("no questions submitted".to_string()));
    }

    if let Some((&position, _)) = answers.range(questions.len()..).next() {
        return Err(AppError::MalformedSubmission(format!(
            "answer for position {} but only {} questions",
            position,
            questions.len()
        )));
    }

    let correct_answers: BTreeSet<usize> = questions
        .iter()
        .enumerate()
        .filter(|(i, q)| answers.get(i) == Some(&q.correct_option))
        .map(|(i, _)| i)
        .collect();

    let score = correct_answers.len();
    let total_questions = questions.len();

    Ok(ExamResult {
        score,
        total_questions,
        percentage: percentage(score, total_questions),
        correct_answers,
        user_answers: answers.clone(),
        questions: questions.to_vec(),
    })
}

/// `round(100 * score / total)`, rounding halves up. `total` must be non-zero.
pub fn percentage(score: usize, total: usize) -> u8 {
    let score = score.min(total);
    ((200 * score + total) / (2 * total)) as u8
}
