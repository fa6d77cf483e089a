// src/models/question.rs

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use sqlx::{prelude::FromRow, types::Json};
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::{
    config::{
        MAX_CHOICE_OPTIONS, MAX_POINTS, MAX_TIME_LIMIT_SECS, MIN_CHOICE_OPTIONS, MIN_POINTS,
        MIN_TIME_LIMIT_SECS,
    },
    error::AppError,
    quiz::evaluator::normalize_answer,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum QuestionType {
    MultipleChoice,
    TrueFalse,
    FreeText,
}

impl QuestionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            QuestionType::MultipleChoice => "multipleChoice",
            QuestionType::TrueFalse => "trueFalse",
            QuestionType::FreeText => "freeText",
        }
    }
}

impl fmt::Display for QuestionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for QuestionType {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "multipleChoice" => Ok(QuestionType::MultipleChoice),
            "trueFalse" => Ok(QuestionType::TrueFalse),
            "freeText" => Ok(QuestionType::FreeText),
            other => Err(AppError::BadRequest(format!("Unknown question type '{}'", other))),
        }
    }
}

/// A quiz question as read by the runner. Immutable once created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    pub id: Uuid,
    pub category_id: Uuid,

    /// Prompt text.
    pub question: String,

    #[serde(rename = "type")]
    pub question_type: QuestionType,

    /// Ordered choices. Only meaningful for `multipleChoice`.
    pub options: Vec<String>,

    pub correct_answer: String,

    /// Seconds the learner is given. The countdown is advisory unless
    /// auto-submit is enabled.
    pub time_limit: i32,

    pub points: i32,
}

/// Raw row of the 'questions' table.
#[derive(Debug, FromRow)]
pub struct QuestionRow {
    pub id: Uuid,
    pub category_id: Uuid,
    pub question: String,
    #[sqlx(rename = "type")]
    pub question_type: String,
    pub options: Option<Json<Vec<String>>>,
    pub correct_answer: String,
    pub time_limit: i32,
    pub points: i32,
}

impl TryFrom<QuestionRow> for Question {
    type Error = AppError;

    fn try_from(row: QuestionRow) -> Result<Self, Self::Error> {
        let question_type = row.question_type.parse::<QuestionType>().map_err(|_| {
            AppError::InternalServerError(format!(
                "Question {} has unknown type '{}'",
                row.id, row.question_type
            ))
        })?;

        Ok(Question {
            id: row.id,
            category_id: row.category_id,
            question: row.question,
            question_type,
            options: row.options.map(|o| o.0).unwrap_or_default(),
            correct_answer: row.correct_answer,
            time_limit: row.time_limit,
            points: row.points,
        })
    }
}

/// DTO for sending a question to the learner (excludes the correct answer).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PublicQuestion {
    pub id: Uuid,
    pub question: String,
    #[serde(rename = "type")]
    pub question_type: QuestionType,
    pub options: Vec<String>,
    pub time_limit: i32,
    pub points: i32,
}

impl From<&Question> for PublicQuestion {
    fn from(q: &Question) -> Self {
        PublicQuestion {
            id: q.id,
            question: q.question.clone(),
            question_type: q.question_type,
            options: q.options.clone(),
            time_limit: q.time_limit,
            points: q.points,
        }
    }
}

/// DTO for creating a new question.
#[derive(Debug, Clone, Deserialize, Validate)]
#[validate(schema(function = validate_question_shape))]
pub struct CreateQuestionRequest {
    pub category_id: Uuid,
    #[validate(length(min = 1, max = 1000))]
    pub question: String,
    #[serde(rename = "type")]
    pub question_type: QuestionType,
    #[serde(default)]
    #[validate(custom(function = validate_options))]
    pub options: Vec<String>,
    #[validate(length(min = 1, max = 500))]
    pub correct_answer: String,
    #[validate(range(min = MIN_TIME_LIMIT_SECS, max = MAX_TIME_LIMIT_SECS))]
    pub time_limit: i32,
    #[validate(range(min = MIN_POINTS, max = MAX_POINTS))]
    pub points: i32,
}

fn validate_options(options: &[String]) -> Result<(), ValidationError> {
    for opt in options {
        if opt.trim().is_empty() {
            return Err(ValidationError::new("option_cannot_be_blank"));
        }
        if opt.len() > 500 {
            return Err(ValidationError::new("option_too_long"));
        }
    }
    Ok(())
}

/// Cross-field rules: choice questions need a sensible option list that
/// contains the correct answer, true/false answers are `true` or `false`.
fn validate_question_shape(req: &CreateQuestionRequest) -> Result<(), ValidationError> {
    let correct = normalize_answer(&req.correct_answer);
    match req.question_type {
        QuestionType::MultipleChoice => {
            if req.options.len() < MIN_CHOICE_OPTIONS || req.options.len() > MAX_CHOICE_OPTIONS {
                return Err(ValidationError::new("invalid_option_count"));
            }
            if !req.options.iter().any(|o| normalize_answer(o) == correct) {
                return Err(ValidationError::new("correct_answer_not_in_options"));
            }
        }
        QuestionType::TrueFalse => {
            if correct != "true" && correct != "false" {
                return Err(ValidationError::new("true_false_answer"));
            }
        }
        QuestionType::FreeText => {
            if !req.options.is_empty() {
                return Err(ValidationError::new("free_text_has_no_options"));
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(question_type: QuestionType, options: &[&str], answer: &str) -> CreateQuestionRequest {
        CreateQuestionRequest {
            category_id: Uuid::new_v4(),
            question: "What does ABS stand for?".to_string(),
            question_type,
            options: options.iter().map(|o| o.to_string()).collect(),
            correct_answer: answer.to_string(),
            time_limit: 30,
            points: 10,
        }
    }

    #[test]
    fn test_question_type_wire_names() {
        let json = serde_json::to_string(&QuestionType::MultipleChoice).unwrap();
        assert_eq!(json, "\"multipleChoice\"");
        assert_eq!("trueFalse".parse::<QuestionType>().unwrap(), QuestionType::TrueFalse);
        assert!("essay".parse::<QuestionType>().is_err());
    }

    #[test]
    fn test_multiple_choice_requires_answer_among_options() {
        let ok = request(
            QuestionType::MultipleChoice,
            &["Anti-lock Braking System", "Auto Brake Sensor"],
            "anti-lock braking system",
        );
        assert!(ok.validate().is_ok());

        let missing = request(QuestionType::MultipleChoice, &["A", "B"], "C");
        assert!(missing.validate().is_err());

        let too_few = request(QuestionType::MultipleChoice, &["A"], "A");
        assert!(too_few.validate().is_err());
    }

    #[test]
    fn test_true_false_answer_must_be_boolean_word() {
        assert!(request(QuestionType::TrueFalse, &[], " True ").validate().is_ok());
        assert!(request(QuestionType::TrueFalse, &[], "maybe").validate().is_err());
    }

    #[test]
    fn test_time_limit_range() {
        let mut req = request(QuestionType::FreeText, &[], "brake fluid");
        req.time_limit = 1;
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_row_with_unknown_type_is_rejected() {
        let row = QuestionRow {
            id: Uuid::new_v4(),
            category_id: Uuid::new_v4(),
            question: "q".to_string(),
            question_type: "essay".to_string(),
            options: None,
            correct_answer: "a".to_string(),
            time_limit: 30,
            points: 1,
        };
        assert!(Question::try_from(row).is_err());
    }
}
