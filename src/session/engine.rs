// src/session/engine.rs

use std::fmt;

use serde::Serialize;

use crate::{
    error::AppError,
    models::{
        exam::Answers,
        question::ExamItem,
    },
};

/// 30 minutes.
pub const DEFAULT_TIME_LIMIT_SECS: u32 = 30 * 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SessionPhase {
    Loading,
    InProgress,
    Submitting,
    Completed,
}

#[derive(Debug)]
pub enum SessionError {
    NoQuestionsAvailable,
    NotInProgress(SessionPhase),
    OptionOutOfRange { option: u8, available: usize },
    Grading(AppError),
    /// The session task is gone (completed or torn down).
    Closed,
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionError::NoQuestionsAvailable => write!(f, "No questions available"),
            SessionError::NotInProgress(phase) => {
                write!(f, "Session is not in progress (currently {:?})", phase)
            }
            SessionError::OptionOutOfRange { option, available } => write!(
                f,
                "Option {} is out of range; the question has {} options",
                option, available
            ),
            SessionError::Grading(err) => write!(f, "Submission failed: {}", err),
            SessionError::Closed => write!(f, "Session is closed"),
        }
    }
}

impl std::error::Error for SessionError {}

/// Everything handed to the grader when a session is submitted.
/// Owned copies: later changes to the session cannot reach it.
#[derive(Debug, Clone, PartialEq)]
pub struct Submission<Q> {
    pub questions: Vec<Q>,
    pub answers: Answers,
}

/// Read-only picture of a session for rendering.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionView {
    pub phase: SessionPhase,
    pub current_index: usize,
    pub total_questions: usize,
    pub answers: Answers,
    pub time_remaining: u32,
}

/// One attempt at a question snapshot.
///
/// All mutation goes through the methods below; the owner applies them one
/// at a time, so there is never more than one transition in flight.
#[derive(Debug, Clone)]
pub struct ExamSession<Q> {
    questions: Vec<Q>,
    current_index: usize,
    answers: Answers,
    time_remaining: u32,
    phase: SessionPhase,
}

impl<Q: ExamItem> Default for ExamSession<Q> {
    fn default() -> Self {
        Self::new()
    }
}

impl<Q: ExamItem> ExamSession<Q> {
    pub fn new() -> Self {
        Self {
            questions: Vec::new(),
            current_index: 0,
            answers: Answers::new(),
            time_remaining: DEFAULT_TIME_LIMIT_SECS,
            phase: SessionPhase::Loading,
        }
    }

    pub fn start(&mut self, questions: Vec<Q>) -> Result<(), SessionError> {
        self.start_with_limit(questions, DEFAULT_TIME_LIMIT_SECS)
    }

    pub fn start_with_limit(
        &mut self,
        questions: Vec<Q>,
        time_limit_secs: u32,
    ) -> Result<(), SessionError> {
        if self.phase != SessionPhase::Loading {
            return Err(SessionError::NotInProgress(self.phase));
        }
        if questions.is_empty() {
            return Err(SessionError::NoQuestionsAvailable);
        }

        self.questions = questions;
        self.current_index = 0;
        self.answers.clear();
        self.time_remaining = time_limit_secs;
        self.phase = SessionPhase::InProgress;
        Ok(())
    }

    /// Records (or replaces) the answer for the current question.
    pub fn select_answer(&mut self, option: u8) -> Result<(), SessionError> {
        if self.phase != SessionPhase::InProgress {
            return Err(SessionError::NotInProgress(self.phase));
        }

        let available = self.questions[self.current_index].option_count();
        if usize::from(option) >= available {
            return Err(SessionError::OptionOutOfRange { option, available });
        }

        self.answers.insert(self.current_index, option);
        Ok(())
    }

    /// Jumps to any question. Returns false, leaving the state alone, if the
    /// index is out of range or the session is not in progress.
    pub fn navigate(&mut self, index: usize) -> bool {
        if self.phase != SessionPhase::InProgress || index >= self.questions.len() {
            return false;
        }
        self.current_index = index;
        true
    }

    pub fn next(&mut self) -> bool {
        self.navigate(self.current_index + 1)
    }

    pub fn previous(&mut self) -> bool {
        match self.current_index.checked_sub(1) {
            Some(index) => self.navigate(index),
            None => false,
        }
    }

    /// Advances the countdown by one second.
    ///
    /// Reaching zero submits the session; the resulting submission is returned
    /// exactly once.
    pub fn tick(&mut self) -> Option<Submission<Q>> {
        if self.phase != SessionPhase::InProgress {
            return None;
        }

        self.time_remaining = self.time_remaining.saturating_sub(1);
        if self.time_remaining == 0 {
            tracing::info!("Time is up, submitting");
            return self.submit();
        }
        None
    }

    /// Moves `InProgress -> Submitting`. Any later call returns `None`.
    pub fn submit(&mut self) -> Option<Submission<Q>> {
        if self.phase != SessionPhase::InProgress {
            return None;
        }

        self.phase = SessionPhase::Submitting;
        Some(Submission {
            questions: self.questions.clone(),
            answers: self.answers.clone(),
        })
    }

    /// Moves `Submitting -> Completed` once the submission has been graded.
    pub fn complete(&mut self) -> bool {
        if self.phase != SessionPhase::Submitting {
            return false;
        }
        self.phase = SessionPhase::Completed;
        true
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn is_submitted(&self) -> bool {
        matches!(self.phase, SessionPhase::Submitting | SessionPhase::Completed)
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn questions(&self) -> &[Q] {
        &self.questions
    }

    pub fn answers(&self) -> &Answers {
        &self.answers
    }

    pub fn time_remaining(&self) -> u32 {
        self.time_remaining
    }

    pub fn view(&self) -> SessionView {
        SessionView {
            phase: self.phase,
            current_index: self.current_index,
            total_questions: self.questions.len(),
            answers: self.answers.clone(),
            time_remaining: self.time_remaining,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        models::question::Question,
        services::question_bank::QuestionBank,
    };

    fn started(limit: u32) -> ExamSession<Question> {
        let mut session = ExamSession::new();
        session
            .start_with_limit(QuestionBank::builtin().fetch_shuffled(Some(1)).unwrap(), limit)
            .unwrap();
        session
    }

    #[test]
    fn start_initializes_state() {
        let mut session: ExamSession<Question> = ExamSession::new();
        assert_eq!(session.phase(), SessionPhase::Loading);

        session
            .start(QuestionBank::builtin().questions().to_vec())
            .unwrap();
        assert_eq!(session.phase(), SessionPhase::InProgress);
        assert_eq!(session.current_index(), 0);
        assert!(session.answers().is_empty());
        assert_eq!(session.time_remaining(), 1800);
        assert!(!session.is_submitted());
    }

    #[test]
    fn start_requires_questions() {
        let mut session: ExamSession<Question> = ExamSession::new();
        assert!(matches!(
            session.start(Vec::new()),
            Err(SessionError::NoQuestionsAvailable)
        ));
        assert_eq!(session.phase(), SessionPhase::Loading);
    }

    #[test]
    fn answers_follow_current_question() {
        let mut session = started(60);
        session.select_answer(2).unwrap();
        session.select_answer(1).unwrap();
        assert!(session.navigate(5));
        session.select_answer(3).unwrap();

        assert_eq!(session.answers(), &Answers::from([(0, 1), (5, 3)]));
    }

    #[test]
    fn out_of_range_option_is_rejected() {
        let mut session = started(60);
        assert!(matches!(
            session.select_answer(4),
            Err(SessionError::OptionOutOfRange { option: 4, available: 4 })
        ));
        assert!(session.answers().is_empty());
    }

    #[test]
    fn navigation_is_free_but_bounded() {
        let mut session = started(60);
        assert!(session.navigate(19));
        assert!(!session.next());
        assert_eq!(session.current_index(), 19);

        assert!(!session.navigate(20));
        assert_eq!(session.current_index(), 19);

        assert!(session.navigate(0));
        assert!(!session.previous());
        assert_eq!(session.current_index(), 0);
    }

    #[test]
    fn tick_counts_down_then_submits_once() {
        let mut session = started(3);
        assert!(session.tick().is_none());
        assert!(session.tick().is_none());
        assert_eq!(session.time_remaining(), 1);

        let submission = session.tick();
        assert!(submission.is_some());
        assert!(session.is_submitted());
        assert_eq!(session.time_remaining(), 0);

        assert!(session.tick().is_none());
        assert!(session.submit().is_none());
    }

    #[test]
    fn one_second_limit_submits_on_first_tick() {
        let mut session = started(1);
        assert!(session.tick().is_some());
        assert!(session.is_submitted());
    }

    #[test]
    fn manual_submit_then_timeout_is_single_transition() {
        let mut session = started(1);
        session.select_answer(0).unwrap();

        let submission = session.submit().unwrap();
        assert_eq!(submission.answers, Answers::from([(0, 0)]));
        assert!(session.tick().is_none());
        assert!(session.submit().is_none());
        assert_eq!(session.phase(), SessionPhase::Submitting);
    }

    #[test]
    fn submission_is_a_copy() {
        let mut session = started(60);
        session.select_answer(1).unwrap();
        let submission = session.submit().unwrap();

        assert!(session.select_answer(2).is_err());
        assert!(!session.navigate(3));
        assert_eq!(submission.answers, Answers::from([(0, 1)]));
        assert_eq!(session.answers(), &Answers::from([(0, 1)]));
    }

    #[test]
    fn completion_needs_a_pending_submission() {
        let mut session = started(60);
        assert!(!session.complete());
        assert_eq!(session.phase(), SessionPhase::InProgress);

        session.submit().unwrap();
        assert!(session.complete());
        assert_eq!(session.phase(), SessionPhase::Completed);
        assert!(!session.complete());
        assert!(session.is_submitted());
    }

    #[test]
    fn inputs_before_start_are_rejected() {
        let mut session: ExamSession<Question> = ExamSession::new();
        assert!(matches!(
            session.select_answer(0),
            Err(SessionError::NotInProgress(SessionPhase::Loading))
        ));
        assert!(!session.navigate(0));
        assert!(session.tick().is_none());
        assert!(session.submit().is_none());
    }
}
