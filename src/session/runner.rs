// src/session/runner.rs

//! Drives an `ExamSession` on a single tokio task.
//!
//! The task owns the session and serializes both event sources (commands from
//! the handle and the one-second countdown). Dropping the handle aborts the
//! task, which stops the countdown and prevents any submission.

use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use tokio::{
    sync::{mpsc, oneshot, watch},
    task::JoinHandle,
    time::{self, Instant},
};

use crate::{
    error::AppError,
    models::{
        exam::ExamResult,
        question::{ExamItem, Question},
    },
    services::scoring,
    session::engine::{ExamSession, SessionError, SessionView, Submission},
};

const TICK: Duration = Duration::from_secs(1);

/// Turns a submission into a scored result.
#[async_trait]
pub trait Grader<Q>: Send + Sync {
    async fn grade(&self, submission: Submission<Q>) -> Result<ExamResult, AppError>;
}

/// Grades in process with the scoring service.
#[derive(Debug, Default, Clone, Copy)]
pub struct LocalGrader;

#[async_trait]
impl Grader<Question> for LocalGrader {
    async fn grade(&self, submission: Submission<Question>) -> Result<ExamResult, AppError> {
        scoring::score(&submission.questions, &submission.answers)
    }
}

enum Command {
    Select {
        option: u8,
        reply: oneshot::Sender<Result<(), SessionError>>,
    },
    Navigate {
        index: usize,
        reply: oneshot::Sender<bool>,
    },
    Step {
        forward: bool,
        reply: oneshot::Sender<bool>,
    },
    Submit {
        reply: oneshot::Sender<bool>,
    },
}

pub type OutcomeReceiver = oneshot::Receiver<Result<ExamResult, SessionError>>;

pub struct SessionHandle {
    commands: mpsc::Sender<Command>,
    view: watch::Receiver<SessionView>,
    outcome: Option<OutcomeReceiver>,
    task: JoinHandle<()>,
}

/// Starts a session over `questions` and spawns its driver task.
pub fn spawn<Q, G>(
    questions: Vec<Q>,
    time_limit_secs: u32,
    grader: Arc<G>,
) -> Result<SessionHandle, SessionError>
where
    Q: ExamItem,
    G: Grader<Q> + ?Sized + 'static,
{
    let mut session = ExamSession::new();
    session.start_with_limit(questions, time_limit_secs)?;

    let (command_tx, command_rx) = mpsc::channel(16);
    let (view_tx, view_rx) = watch::channel(session.view());
    let (outcome_tx, outcome_rx) = oneshot::channel();

    tracing::info!(
        "Exam session started: {} questions, {}s",
        session.questions().len(),
        time_limit_secs
    );

    let task = tokio::spawn(drive(session, grader, command_rx, view_tx, outcome_tx));

    Ok(SessionHandle {
        commands: command_tx,
        view: view_rx,
        outcome: Some(outcome_rx),
        task,
    })
}

/// Applies one command; returns the submission if the command caused one.
fn apply<Q: ExamItem>(session: &mut ExamSession<Q>, command: Command) -> Option<Submission<Q>> {
    match command {
        Command::Select { option, reply } => {
            let _ = reply.send(session.select_answer(option));
            None
        }
        Command::Navigate { index, reply } => {
            let _ = reply.send(session.navigate(index));
            None
        }
        Command::Step { forward, reply } => {
            let moved = if forward {
                session.next()
            } else {
                session.previous()
            };
            let _ = reply.send(moved);
            None
        }
        Command::Submit { reply } => {
            let submission = session.submit();
            if submission.is_some() {
                tracing::info!("Exam submitted manually");
            }
            let _ = reply.send(submission.is_some());
            submission
        }
    }
}

async fn drive<Q, G>(
    mut session: ExamSession<Q>,
    grader: Arc<G>,
    mut commands: mpsc::Receiver<Command>,
    view: watch::Sender<SessionView>,
    outcome: oneshot::Sender<Result<ExamResult, SessionError>>,
) where
    Q: ExamItem,
    G: Grader<Q> + ?Sized,
{
    let mut ticker = time::interval_at(Instant::now() + TICK, TICK);

    let submission = loop {
        let submission = tokio::select! {
            _ = ticker.tick() => session.tick(),
            command = commands.recv() => match command {
                Some(command) => apply(&mut session, command),
                None => {
                    tracing::info!("Exam session abandoned before submission");
                    return;
                }
            },
        };
        view.send_replace(session.view());
        if let Some(submission) = submission {
            break submission;
        }
    };

    // The countdown ends with the in-progress phase.
    drop(ticker);

    let grading = grader.grade(submission);
    tokio::pin!(grading);

    let graded = loop {
        tokio::select! {
            graded = &mut grading => break graded,
            command = commands.recv() => match command {
                // Every input is rejected by the session from here on.
                Some(command) => {
                    apply(&mut session, command);
                }
                None => {
                    tracing::info!("Exam session abandoned while grading");
                    return;
                }
            },
        }
    };

    let result = match graded {
        Ok(result) => {
            session.complete();
            tracing::info!(
                "Exam completed: {}/{} ({}%)",
                result.score,
                result.total_questions,
                result.percentage
            );
            Ok(result)
        }
        Err(err) => {
            tracing::warn!("Exam grading failed: {}", err);
            Err(SessionError::Grading(err))
        }
    };

    view.send_replace(session.view());
    let _ = outcome.send(result);
}

impl SessionHandle {
    pub async fn select_answer(&self, option: u8) -> Result<(), SessionError> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::Select { option, reply }).await?;
        rx.await.map_err(|_| SessionError::Closed)?
    }

    /// Returns whether the jump happened.
    pub async fn navigate(&self, index: usize) -> Result<bool, SessionError> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::Navigate { index, reply }).await?;
        rx.await.map_err(|_| SessionError::Closed)
    }

    /// Moves to the following question. Returns false at the last one.
    pub async fn next(&self) -> Result<bool, SessionError> {
        self.step(true).await
    }

    /// Moves to the preceding question. Returns false at the first one.
    pub async fn previous(&self) -> Result<bool, SessionError> {
        self.step(false).await
    }

    async fn step(&self, forward: bool) -> Result<bool, SessionError> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::Step { forward, reply }).await?;
        rx.await.map_err(|_| SessionError::Closed)
    }

    /// Returns true only for the call that actually submitted the session.
    ///
    /// The task only exits on its own after a submission, so a closed channel
    /// here also means "already submitted".
    pub async fn submit(&self) -> bool {
        let (reply, rx) = oneshot::channel();
        if self.send(Command::Submit { reply }).await.is_err() {
            return false;
        }
        rx.await.unwrap_or(false)
    }

    /// Latest published state.
    pub fn view(&self) -> SessionView {
        self.view.borrow().clone()
    }

    /// Waits until the state changes, then returns it.
    pub async fn changed(&mut self) -> Result<SessionView, SessionError> {
        self.view.changed().await.map_err(|_| SessionError::Closed)?;
        Ok(self.view.borrow_and_update().clone())
    }

    /// Waits for the scored result. Only the first call receives it.
    pub async fn outcome(&mut self) -> Result<ExamResult, SessionError> {
        let rx = self.outcome.as_mut().ok_or(SessionError::Closed)?;
        let outcome = rx.await.map_err(|_| SessionError::Closed);
        self.outcome = None;
        outcome?
    }

    /// Detaches the result channel, e.g. to wait on it in a `select!` next to
    /// other calls on this handle.
    pub fn take_outcome(&mut self) -> Option<OutcomeReceiver> {
        self.outcome.take()
    }

    /// Tears the session down without submitting.
    pub fn abandon(self) {
        drop(self);
    }

    async fn send(&self, command: Command) -> Result<(), SessionError> {
        self.commands
            .send(command)
            .await
            .map_err(|_| SessionError::Closed)
    }
}

impl Drop for SessionHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}
