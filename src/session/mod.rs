// src/session/mod.rs

//! Exam session engine: the state machine and its timed driver.

pub mod engine;
pub mod runner;

pub use engine::{
    DEFAULT_TIME_LIMIT_SECS, ExamSession, SessionError, SessionPhase, SessionView, Submission,
};
pub use runner::{Grader, LocalGrader, OutcomeReceiver, SessionHandle, spawn};
