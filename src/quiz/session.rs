// src/quiz/session.rs

//! The quiz attempt as a value object. Every change goes through the
//! transition methods below; nothing else mutates a session.

use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::{
    models::{
        answer::NewAnswerRecord,
        question::{PublicQuestion, Question},
    },
    quiz::{
        evaluator::{SaveOutcome, is_correct},
        loader::LoadError,
    },
    statistics::accuracy_percentage,
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum QuizPhase {
    Loading,
    /// Terminal: the category had no questions or they could not be fetched.
    Empty { reason: String },
    Presenting { index: usize },
    Answered { index: usize },
    Finished,
    /// Terminal: the learner left before the end.
    Exited,
}

impl QuizPhase {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            QuizPhase::Empty { .. } | QuizPhase::Finished | QuizPhase::Exited
        )
    }
}

/// What the session remembers about one answered question.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionAnswer {
    pub question_id: Uuid,
    pub answer: String,
    pub is_correct: bool,
    pub time_spent: i32,
    pub timed_out: bool,
    /// `None` until the write has been attempted.
    pub save: Option<SaveOutcome>,
}

/// Outcome of a submission attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum Submission {
    /// The answer was taken; the record still has to be written.
    Accepted(NewAnswerRecord),
    /// Not presenting a question (already answered, finished, exited...).
    Ignored,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuestionResult {
    pub question_id: Uuid,
    pub answer: Option<String>,
    pub is_correct: bool,
    pub time_spent: i32,
    pub points: i32,
    pub saved: bool,
}

/// Summary handed to the caller once the quiz is finished.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuizResults {
    pub total_questions: usize,
    pub answered: usize,
    pub correct_answers: usize,
    pub incorrect_answers: usize,
    pub accuracy_percentage: f64,
    pub points_earned: i32,
    pub points_possible: i32,
    pub total_time_spent: i32,
    /// Answers whose record could not be written.
    pub unsaved_answers: usize,
    pub questions: Vec<QuestionResult>,
}

/// Feedback shown while a question sits in `Answered`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnswerFeedback {
    pub question_id: Uuid,
    pub answer: String,
    pub is_correct: bool,
    pub correct_answer: String,
    pub timed_out: bool,
    pub save: Option<SaveOutcome>,
}

/// Read-only snapshot for rendering.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuizView {
    pub session_id: Uuid,
    pub category_id: Uuid,
    pub phase: QuizPhase,
    pub total_questions: usize,
    pub question: Option<PublicQuestion>,
    pub remaining_seconds: Option<i64>,
    pub feedback: Option<AnswerFeedback>,
    pub results: Option<QuizResults>,
}

#[derive(Debug, Clone)]
pub struct QuizSession {
    id: Uuid,
    student_id: Uuid,
    category_id: Uuid,
    questions: Vec<Question>,
    phase: QuizPhase,
    answers: HashMap<Uuid, SessionAnswer>,
    presented_at: Option<DateTime<Utc>>,
}

impl QuizSession {
    pub fn new(id: Uuid, student_id: Uuid, category_id: Uuid) -> Self {
        Self {
            id,
            student_id,
            category_id,
            questions: Vec::new(),
            phase: QuizPhase::Loading,
            answers: HashMap::new(),
            presented_at: None,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn student_id(&self) -> Uuid {
        self.student_id
    }

    pub fn category_id(&self) -> Uuid {
        self.category_id
    }

    pub fn phase(&self) -> &QuizPhase {
        &self.phase
    }

    pub fn total_questions(&self) -> usize {
        self.questions.len()
    }

    pub fn answer_for(&self, question_id: Uuid) -> Option<&SessionAnswer> {
        self.answers.get(&question_id)
    }

    /// `Loading` → `Presenting(0)` or `Empty`. Ignored in any other phase.
    pub fn loaded(&mut self, loaded: Result<Vec<Question>, LoadError>, now: DateTime<Utc>) {
        if self.phase != QuizPhase::Loading {
            return;
        }

        match loaded {
            Ok(questions) if !questions.is_empty() => {
                self.questions = questions;
                self.present(0, now);
            }
            Ok(_) => {
                self.phase = QuizPhase::Empty {
                    reason: LoadError::NoQuestions.to_string(),
                }
            }
            Err(e) => {
                self.phase = QuizPhase::Empty {
                    reason: e.to_string(),
                }
            }
        }
    }

    fn present(&mut self, index: usize, now: DateTime<Utc>) {
        self.phase = QuizPhase::Presenting { index };
        self.presented_at = Some(now);
    }

    /// Index of the question on screen, presenting or answered.
    pub fn current_index(&self) -> Option<usize> {
        match self.phase {
            QuizPhase::Presenting { index } | QuizPhase::Answered { index } => Some(index),
            _ => None,
        }
    }

    pub fn current_question(&self) -> Option<&Question> {
        self.current_index().and_then(|i| self.questions.get(i))
    }

    /// When the timer of the presented question runs out.
    pub fn deadline(&self) -> Option<DateTime<Utc>> {
        match self.phase {
            QuizPhase::Presenting { index } => {
                let question = self.questions.get(index)?;
                let presented_at = self.presented_at?;
                Some(presented_at + Duration::seconds(i64::from(question.time_limit)))
            }
            _ => None,
        }
    }

    pub fn remaining_seconds(&self, now: DateTime<Utc>) -> Option<i64> {
        self.deadline()
            .map(|deadline| (deadline - now).num_seconds().max(0))
    }

    /// Accepts exactly one answer for the presented question and moves to
    /// `Answered`. Anything submitted outside `Presenting` is ignored.
    pub fn submit(&mut self, raw: &str, now: DateTime<Utc>) -> Submission {
        self.take_answer(raw, now, false)
    }

    /// Expiry of the question timer. Only acts if question `index` is still
    /// the one being presented, so a late timer never answers the next one.
    pub fn time_out(&mut self, index: usize, now: DateTime<Utc>) -> Submission {
        if self.phase != (QuizPhase::Presenting { index }) {
            return Submission::Ignored;
        }
        self.take_answer("", now, true)
    }

    fn take_answer(&mut self, raw: &str, now: DateTime<Utc>, timed_out: bool) -> Submission {
        let index = match self.phase {
            QuizPhase::Presenting { index } => index,
            _ => return Submission::Ignored,
        };
        let Some(question) = self.questions.get(index) else {
            return Submission::Ignored;
        };
        if self.answers.contains_key(&question.id) {
            return Submission::Ignored;
        }

        let correct = is_correct(raw, &question.correct_answer);
        let time_spent = self
            .presented_at
            .map(|at| (now - at).num_seconds().clamp(0, i64::from(i32::MAX)) as i32)
            .unwrap_or(0);

        self.answers.insert(
            question.id,
            SessionAnswer {
                question_id: question.id,
                answer: raw.to_string(),
                is_correct: correct,
                time_spent,
                timed_out,
                save: None,
            },
        );
        let record = NewAnswerRecord {
            question_id: question.id,
            student_id: self.student_id,
            answer: raw.to_string(),
            is_correct: correct,
            time_spent,
            answered_at: now,
        };
        self.phase = QuizPhase::Answered { index };

        Submission::Accepted(record)
    }

    pub fn record_save(&mut self, question_id: Uuid, outcome: SaveOutcome) {
        if let Some(answer) = self.answers.get_mut(&question_id) {
            answer.save = Some(outcome);
        }
    }

    /// `Answered(i)` → `Presenting(i + 1)` or `Finished`. Returns whether
    /// a transition happened.
    pub fn advance(&mut self, now: DateTime<Utc>) -> bool {
        let QuizPhase::Answered { index } = self.phase else {
            return false;
        };

        let next = index + 1;
        if next < self.questions.len() {
            self.present(next, now);
        } else {
            self.phase = QuizPhase::Finished;
            self.presented_at = None;
        }
        true
    }

    /// Leaves the quiz. Terminal phases stay as they are.
    pub fn exit(&mut self) -> bool {
        if self.phase.is_terminal() {
            return false;
        }
        self.phase = QuizPhase::Exited;
        self.presented_at = None;
        true
    }

    /// Available once the quiz is finished.
    pub fn results(&self) -> Option<QuizResults> {
        if self.phase != QuizPhase::Finished {
            return None;
        }
        Some(self.tally())
    }

    fn tally(&self) -> QuizResults {
        let questions: Vec<QuestionResult> = self
            .questions
            .iter()
            .map(|q| match self.answers.get(&q.id) {
                Some(a) => QuestionResult {
                    question_id: q.id,
                    answer: Some(a.answer.clone()),
                    is_correct: a.is_correct,
                    time_spent: a.time_spent,
                    points: q.points,
                    saved: a.save.as_ref().is_some_and(SaveOutcome::is_saved),
                },
                None => QuestionResult {
                    question_id: q.id,
                    answer: None,
                    is_correct: false,
                    time_spent: 0,
                    points: q.points,
                    saved: false,
                },
            })
            .collect();

        let total_questions = questions.len();
        let answered = questions.iter().filter(|r| r.answer.is_some()).count();
        let correct_answers = questions.iter().filter(|r| r.is_correct).count();
        let points_earned = questions
            .iter()
            .filter(|r| r.is_correct)
            .map(|r| r.points)
            .sum();
        let points_possible = questions.iter().map(|r| r.points).sum();
        let total_time_spent = questions.iter().map(|r| r.time_spent).sum();
        let unsaved_answers = self
            .answers
            .values()
            .filter(|a| matches!(a.save, Some(SaveOutcome::SaveFailed { .. })))
            .count();

        QuizResults {
            total_questions,
            answered,
            correct_answers,
            incorrect_answers: total_questions - correct_answers,
            accuracy_percentage: accuracy_percentage(correct_answers, total_questions),
            points_earned,
            points_possible,
            total_time_spent,
            unsaved_answers,
            questions,
        }
    }

    pub fn view(&self, now: DateTime<Utc>) -> QuizView {
        let feedback = match self.phase {
            QuizPhase::Answered { index } => self.questions.get(index).and_then(|q| {
                self.answers.get(&q.id).map(|a| AnswerFeedback {
                    question_id: q.id,
                    answer: a.answer.clone(),
                    is_correct: a.is_correct,
                    correct_answer: q.correct_answer.clone(),
                    timed_out: a.timed_out,
                    save: a.save.clone(),
                })
            }),
            _ => None,
        };

        QuizView {
            session_id: self.id,
            category_id: self.category_id,
            phase: self.phase.clone(),
            total_questions: self.questions.len(),
            question: self.current_question().map(PublicQuestion::from),
            remaining_seconds: self.remaining_seconds(now),
            feedback,
            results: self.results(),
        }
    }
}
