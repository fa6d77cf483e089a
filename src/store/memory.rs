// src/store/memory.rs

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::{
        answer::{AnswerRecord, CategorizedAnswer, NewAnswerRecord},
        category::Category,
        question::{CreateQuestionRequest, Question},
    },
    store::{AnswerStore, CategoryStore, QuestionStore, UNCATEGORIZED},
};

/// Process-local datastore with the same contract as `PgStore`.
#[derive(Default)]
pub struct MemoryStore {
    categories: RwLock<Vec<Category>>,
    // insertion order is presentation order
    questions: RwLock<Vec<Question>>,
    answers: RwLock<Vec<AnswerRecord>>,
    published: RwLock<HashSet<(Uuid, Uuid)>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn add_category(&self, name: &str) -> Category {
        let category = Category {
            id: Uuid::new_v4(),
            name: name.to_string(),
            description: None,
            is_active: true,
        };
        self.categories.write().await.push(category.clone());
        category
    }

    pub async fn add_question(&self, question: Question) {
        self.questions.write().await.push(question);
    }

    pub async fn answers(&self) -> Vec<AnswerRecord> {
        self.answers.read().await.clone()
    }

    async fn categorize(&self, records: &[AnswerRecord]) -> Vec<CategorizedAnswer> {
        let questions = self.questions.read().await;
        let categories = self.categories.read().await;

        let category_of: HashMap<Uuid, Uuid> =
            questions.iter().map(|q| (q.id, q.category_id)).collect();
        let name_of: HashMap<Uuid, &str> =
            categories.iter().map(|c| (c.id, c.name.as_str())).collect();

        records
            .iter()
            .filter_map(|r| {
                let category_id = category_of.get(&r.question_id)?;
                let name = name_of.get(category_id).copied().unwrap_or(UNCATEGORIZED);
                Some(CategorizedAnswer {
                    student_id: r.student_id,
                    category_name: name.to_string(),
                    is_correct: r.is_correct,
                })
            })
            .collect()
    }
}

#[async_trait]
impl QuestionStore for MemoryStore {
    async fn questions_by_category(&self, category_id: Uuid) -> AppResult<Vec<Question>> {
        let questions = self.questions.read().await;
        Ok(questions
            .iter()
            .filter(|q| q.category_id == category_id)
            .cloned()
            .collect())
    }

    async fn insert_question(&self, req: CreateQuestionRequest) -> AppResult<Question> {
        if self.find_category(req.category_id).await?.is_none() {
            return Err(AppError::NotFound(format!(
                "Category '{}' not found",
                req.category_id
            )));
        }

        let question = Question {
            id: Uuid::new_v4(),
            category_id: req.category_id,
            question: req.question,
            question_type: req.question_type,
            options: req.options,
            correct_answer: req.correct_answer,
            time_limit: req.time_limit,
            points: req.points,
        };
        self.questions.write().await.push(question.clone());
        Ok(question)
    }
}

#[async_trait]
impl AnswerStore for MemoryStore {
    async fn insert_answer(&self, record: NewAnswerRecord) -> AppResult<AnswerRecord> {
        let known = self
            .questions
            .read()
            .await
            .iter()
            .any(|q| q.id == record.question_id);
        if !known {
            return Err(AppError::NotFound(format!(
                "Question '{}' not found",
                record.question_id
            )));
        }

        let saved = record.into_record(Uuid::new_v4());
        self.answers.write().await.push(saved.clone());
        Ok(saved)
    }

    async fn answers_by_student(&self, student_id: Uuid) -> AppResult<Vec<CategorizedAnswer>> {
        let records: Vec<AnswerRecord> = self
            .answers
            .read()
            .await
            .iter()
            .filter(|r| r.student_id == student_id)
            .cloned()
            .collect();
        Ok(self.categorize(&records).await)
    }

    async fn all_answers(&self) -> AppResult<Vec<CategorizedAnswer>> {
        let records = self.answers().await;
        Ok(self.categorize(&records).await)
    }

    async fn delete_answers_by_student(&self, student_id: Uuid) -> AppResult<u64> {
        let mut answers = self.answers.write().await;
        let before = answers.len();
        answers.retain(|r| r.student_id != student_id);
        Ok((before - answers.len()) as u64)
    }
}

#[async_trait]
impl CategoryStore for MemoryStore {
    async fn active_categories(&self) -> AppResult<Vec<Category>> {
        let mut active: Vec<Category> = self
            .categories
            .read()
            .await
            .iter()
            .filter(|c| c.is_active)
            .cloned()
            .collect();
        active.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(active)
    }

    async fn published_categories(&self, student_id: Uuid) -> AppResult<Vec<Category>> {
        let published = self.published.read().await;
        Ok(self
            .active_categories()
            .await?
            .into_iter()
            .filter(|c| published.contains(&(student_id, c.id)))
            .collect())
    }

    async fn find_category(&self, category_id: Uuid) -> AppResult<Option<Category>> {
        let categories = self.categories.read().await;
        Ok(categories.iter().find(|c| c.id == category_id).cloned())
    }

    async fn set_publication(
        &self,
        student_id: Uuid,
        category_id: Uuid,
        published: bool,
    ) -> AppResult<()> {
        if self.find_category(category_id).await?.is_none() {
            return Err(AppError::NotFound(format!(
                "Category '{}' not found",
                category_id
            )));
        }

        let mut set = self.published.write().await;
        if published {
            set.insert((student_id, category_id));
        } else {
            set.remove(&(student_id, category_id));
        }
        Ok(())
    }
}
