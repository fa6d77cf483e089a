// src/quiz/loader.rs

use std::{fmt, sync::Arc};

use uuid::Uuid;

use crate::{models::question::Question, store::QuestionStore};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadError {
    NoQuestions,
    Fetch(String),
}

impl fmt::Display for LoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoadError::NoQuestions => f.write_str("No questions available for this category"),
            LoadError::Fetch(reason) => write!(f, "Questions could not be loaded: {}", reason),
        }
    }
}

/// Fetches the ordered questions of a category.
#[derive(Clone)]
pub struct QuestionLoader {
    store: Arc<dyn QuestionStore>,
}

impl QuestionLoader {
    pub fn new(store: Arc<dyn QuestionStore>) -> Self {
        Self { store }
    }

    pub async fn load(&self, category_id: Uuid) -> Result<Vec<Question>, LoadError> {
        let questions = self
            .store
            .questions_by_category(category_id)
            .await
            .map_err(|e| {
                tracing::error!("Failed to load questions of category {}: {}", category_id, e);
                LoadError::Fetch(e.to_string())
            })?;

        if questions.is_empty() {
            return Err(LoadError::NoQuestions);
        }

        Ok(questions)
    }
}
