// src/quiz/evaluator.rs

use std::sync::Arc;

use serde::Serialize;
use uuid::Uuid;

use crate::{
    models::answer::{AnswerRecord, NewAnswerRecord},
    store::AnswerStore,
};

/// Trims surrounding whitespace and lowercases. Nothing else: punctuation
/// and diacritics are significant.
pub fn normalize_answer(raw: &str) -> String {
    raw.trim().to_lowercase()
}

pub fn is_correct(submitted: &str, correct_answer: &str) -> bool {
    normalize_answer(submitted) == normalize_answer(correct_answer)
}

/// Result of writing one answer record.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SaveOutcome {
    Saved { record_id: Uuid },
    SaveFailed { reason: String },
}

impl SaveOutcome {
    pub fn is_saved(&self) -> bool {
        matches!(self, SaveOutcome::Saved { .. })
    }
}

/// Persists evaluated answers. A failed write is reported, never raised:
/// the learner keeps going and the caller decides what to do with it.
#[derive(Clone)]
pub struct AnswerEvaluator {
    store: Arc<dyn AnswerStore>,
}

impl AnswerEvaluator {
    pub fn new(store: Arc<dyn AnswerStore>) -> Self {
        Self { store }
    }

    pub async fn record(&self, record: NewAnswerRecord) -> SaveOutcome {
        let question_id = record.question_id;
        let student_id = record.student_id;

        match self.store.insert_answer(record).await {
            Ok(AnswerRecord { id, .. }) => SaveOutcome::Saved { record_id: id },
            Err(e) => {
                tracing::warn!(
                    "Answer of student {} to question {} was not saved: {}",
                    student_id,
                    question_id,
                    e
                );
                SaveOutcome::SaveFailed {
                    reason: e.to_string(),
                }
            }
        }
    }
}
