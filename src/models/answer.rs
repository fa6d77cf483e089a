// src/models/answer.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

/// Represents the 'student_answers' table in the database.
/// One row per (student, question, attempt).
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct AnswerRecord {
    pub id: Uuid,
    pub question_id: Uuid,
    pub student_id: Uuid,

    /// The answer exactly as submitted, kept for display.
    pub answer: String,

    /// Denormalized evaluation result.
    pub is_correct: bool,

    /// Whole seconds between presentation and submission.
    pub time_spent: i32,

    pub answered_at: DateTime<Utc>,
}

/// An evaluated answer that has not been written yet.
#[derive(Debug, Clone, PartialEq)]
pub struct NewAnswerRecord {
    pub question_id: Uuid,
    pub student_id: Uuid,
    pub answer: String,
    pub is_correct: bool,
    pub time_spent: i32,
    pub answered_at: DateTime<Utc>,
}

impl NewAnswerRecord {
    pub fn into_record(self, id: Uuid) -> AnswerRecord {
        AnswerRecord {
            id,
            question_id: self.question_id,
            student_id: self.student_id,
            answer: self.answer,
            is_correct: self.is_correct,
            time_spent: self.time_spent,
            answered_at: self.answered_at,
        }
    }
}

/// Answer row joined to its question's category, as read by statistics.
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct CategorizedAnswer {
    pub student_id: Uuid,
    pub category_name: String,
    pub is_correct: bool,
}

/// DTO for submitting one answer to a running quiz.
#[derive(Debug, Deserialize, Validate)]
pub struct SubmitAnswerRequest {
    #[validate(length(max = 2000))]
    pub answer: String,
}
