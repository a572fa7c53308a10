// src/handlers/exam.rs

use std::sync::Arc;

use axum::{Extension, Json, extract::State, response::IntoResponse};

use crate::{
    config::Config,
    error::AppError,
    models::{
        exam::{QuestionsResponse, SubmissionResponse, SubmitExamRequest},
        question::PublicQuestion,
    },
    services::{question_bank::QuestionBank, scoring},
    utils::{json::AppJson, jwt::Claims},
};

/// Hands the caller a freshly shuffled snapshot of the question bank.
///
/// Correct answers are stripped; they are only revealed in the result.
pub async fn get_questions(
    State(bank): State<Arc<QuestionBank>>,
    State(config): State<Config>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let snapshot = bank.fetch_shuffled(None)?;
    tracing::debug!("Serving {} questions to user {}", snapshot.len(), claims.sub);

    let questions: Vec<PublicQuestion> = snapshot.iter().map(PublicQuestion::from).collect();

    Ok(Json(QuestionsResponse {
        total_questions: questions.len(),
        questions,
        time_limit: config.time_limit_minutes,
    }))
}

/// Scores a submitted exam.
///
/// * Questions are looked up by id; the bank's answer key is authoritative.
/// * Answers are keyed by snapshot position.
pub async fn submit_exam(
    State(bank): State<Arc<QuestionBank>>,
    Extension(claims): Extension<Claims>,
    AppJson(req): AppJson<SubmitExamRequest>,
) -> Result<impl IntoResponse, AppError> {
    let (Some(answers), Some(question_refs)) = (req.answers, req.questions) else {
        return Err(AppError::InvalidInput("Invalid submission data".to_string()));
    };

    let questions = bank.resolve(&question_refs)?;
    let result = scoring::score(&questions, &answers)?;

    tracing::info!(
        "User {} scored {}/{} ({}%)",
        claims.sub,
        result.score,
        result.total_questions,
        result.percentage
    );

    Ok(Json(SubmissionResponse {
        result,
        submitted_at: chrono::Utc::now(),
    }))
}
