// src/quiz/runner.rs

use std::{sync::Arc, time::Duration};

use chrono::Utc;
use serde::Serialize;
use tokio::{
    sync::{Mutex, watch},
    task::JoinHandle,
};
use uuid::Uuid;

use crate::{
    config::QuizSettings,
    quiz::{
        evaluator::{AnswerEvaluator, SaveOutcome},
        loader::QuestionLoader,
        session::{QuizPhase, QuizResults, QuizSession, QuizView, Submission},
    },
};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum SubmitOutcome {
    Evaluated {
        question_id: Uuid,
        is_correct: bool,
        correct_answer: String,
        save: SaveOutcome,
    },
    /// Nothing was recorded: no question was waiting for an answer.
    Ignored { phase: QuizPhase },
}

#[derive(Debug, Clone, Copy)]
enum Timer {
    Advance { index: usize },
    Expire { index: usize },
}

struct RunnerInner {
    session: QuizSession,
    /// The one scheduled transition, if any.
    pending: Option<JoinHandle<()>>,
}

/// Drives one quiz attempt: owns the session, writes answers through the
/// evaluator and schedules the delayed transitions.
///
/// Scheduled tasks only hold a `Weak` reference and are aborted on exit,
/// so nothing fires against a session that is gone.
pub struct QuizRunner {
    id: Uuid,
    student_id: Uuid,
    inner: Mutex<RunnerInner>,
    evaluator: AnswerEvaluator,
    settings: QuizSettings,
    phase_tx: watch::Sender<QuizPhase>,
}

impl QuizRunner {
    pub fn new(
        id: Uuid,
        student_id: Uuid,
        category_id: Uuid,
        evaluator: AnswerEvaluator,
        settings: QuizSettings,
    ) -> Arc<Self> {
        let session = QuizSession::new(id, student_id, category_id);
        let (phase_tx, _) = watch::channel(session.phase().clone());

        Arc::new(Self {
            id,
            student_id,
            inner: Mutex::new(RunnerInner {
                session,
                pending: None,
            }),
            evaluator,
            settings,
            phase_tx,
        })
    }

    /// Creates the runner and loads its questions.
    pub async fn start(
        student_id: Uuid,
        category_id: Uuid,
        loader: &QuestionLoader,
        evaluator: AnswerEvaluator,
        settings: QuizSettings,
    ) -> Arc<Self> {
        let runner = Self::new(Uuid::new_v4(), student_id, category_id, evaluator, settings);
        runner.load(loader).await;
        runner
    }

    pub async fn load(self: &Arc<Self>, loader: &QuestionLoader) {
        let category_id = self.inner.lock().await.session.category_id();
        let loaded = loader.load(category_id).await;

        let mut inner = self.inner.lock().await;
        inner.session.loaded(loaded, Utc::now());
        if let QuizPhase::Empty { reason } = inner.session.phase() {
            tracing::info!("Quiz {} has nothing to present: {}", self.id, reason);
        }
        self.after_transition(&mut inner);
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn student_id(&self) -> Uuid {
        self.student_id
    }

    pub fn subscribe(&self) -> watch::Receiver<QuizPhase> {
        self.phase_tx.subscribe()
    }

    pub async fn phase(&self) -> QuizPhase {
        self.inner.lock().await.session.phase().clone()
    }

    pub async fn view(&self) -> QuizView {
        self.inner.lock().await.session.view(Utc::now())
    }

    pub async fn results(&self) -> Option<QuizResults> {
        self.inner.lock().await.session.results()
    }

    pub async fn submit(self: &Arc<Self>, raw: &str) -> SubmitOutcome {
        let mut inner = self.inner.lock().await;
        let submission = inner.session.submit(raw, Utc::now());
        self.settle(&mut inner, submission).await
    }

    /// Leaves the quiz and cancels whatever transition was scheduled.
    pub async fn exit(&self) -> bool {
        let mut inner = self.inner.lock().await;
        if let Some(timer) = inner.pending.take() {
            timer.abort();
        }

        let exited = inner.session.exit();
        if exited {
            tracing::info!("Quiz {} exited by student {}", self.id, self.student_id);
            self.phase_tx.send_replace(inner.session.phase().clone());
        }
        exited
    }

    async fn settle(self: &Arc<Self>, inner: &mut RunnerInner, submission: Submission) -> SubmitOutcome {
        let record = match submission {
            Submission::Accepted(record) => record,
            Submission::Ignored => {
                return SubmitOutcome::Ignored {
                    phase: inner.session.phase().clone(),
                };
            }
        };

        // Whichever of submit and expiry gets here first disables the other.
        if let Some(timer) = inner.pending.take() {
            timer.abort();
        }

        let question_id = record.question_id;
        let is_correct = record.is_correct;
        let save = self.evaluator.record(record).await;
        inner.session.record_save(question_id, save.clone());

        let correct_answer = inner
            .session
            .current_question()
            .map(|q| q.correct_answer.clone())
            .unwrap_or_default();

        self.after_transition(inner);

        SubmitOutcome::Evaluated {
            question_id,
            is_correct,
            correct_answer,
            save,
        }
    }

    /// Publishes the phase and schedules what follows it.
    fn after_transition(self: &Arc<Self>, inner: &mut RunnerInner) {
        let phase = inner.session.phase().clone();
        self.phase_tx.send_replace(phase.clone());

        match phase {
            QuizPhase::Answered { index } => {
                self.schedule(inner, self.settings.answer_delay, Timer::Advance { index });
            }
            QuizPhase::Presenting { index } if self.settings.auto_submit_on_timeout => {
                let limit = inner
                    .session
                    .current_question()
                    .map(|q| q.time_limit.max(0) as u64)
                    .unwrap_or(0);
                self.schedule(inner, Duration::from_secs(limit), Timer::Expire { index });
            }
            QuizPhase::Finished => {
                if let Some(results) = inner.session.results() {
                    tracing::info!(
                        "Quiz {} finished: {}/{} correct, {} unsaved",
                        self.id,
                        results.correct_answers,
                        results.total_questions,
                        results.unsaved_answers
                    );
                }
            }
            _ => {}
        }
    }

    fn schedule(self: &Arc<Self>, inner: &mut RunnerInner, delay: Duration, timer: Timer) {
        let runner = Arc::downgrade(self);
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if let Some(runner) = runner.upgrade() {
                runner.fire(timer).await;
            }
        });

        if let Some(previous) = inner.pending.replace(handle) {
            previous.abort();
        }
    }

    async fn fire(self: &Arc<Self>, timer: Timer) {
        let mut inner = self.inner.lock().await;
        // This task is the pending one; forget it rather than abort it.
        inner.pending = None;

        match timer {
            Timer::Advance { index } => {
                if inner.session.phase() != &(QuizPhase::Answered { index }) {
                    return;
                }
                if inner.session.advance(Utc::now()) {
                    self.after_transition(&mut inner);
                }
            }
            Timer::Expire { index } => {
                let submission = inner.session.time_out(index, Utc::now());
                if matches!(submission, Submission::Accepted(_)) {
                    tracing::info!("Quiz {} question {} timed out", self.id, index);
                }
                self.settle(&mut inner, submission).await;
            }
        }
    }
}

impl Drop for QuizRunner {
    fn drop(&mut self) {
        if let Some(timer) = self.inner.get_mut().pending.take() {
            timer.abort();
        }
    }
}
