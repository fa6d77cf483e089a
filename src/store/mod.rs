// src/store/mod.rs

//! Datastore seams. The quiz core only ever reads questions by category,
//! inserts answer records, and reads answer records back for statistics.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use uuid::Uuid;

use crate::{
    error::AppResult,
    models::{
        answer::{AnswerRecord, CategorizedAnswer, NewAnswerRecord},
        category::Category,
        question::{CreateQuestionRequest, Question},
    },
};

pub use memory::MemoryStore;
pub use postgres::PgStore;

#[async_trait]
pub trait QuestionStore: Send + Sync {
    /// Questions of a category, in presentation order.
    async fn questions_by_category(&self, category_id: Uuid) -> AppResult<Vec<Question>>;
    async fn insert_question(&self, question: CreateQuestionRequest) -> AppResult<Question>;
}

#[async_trait]
pub trait AnswerStore: Send + Sync {
    async fn insert_answer(&self, record: NewAnswerRecord) -> AppResult<AnswerRecord>;
    async fn answers_by_student(&self, student_id: Uuid) -> AppResult<Vec<CategorizedAnswer>>;
    async fn all_answers(&self) -> AppResult<Vec<CategorizedAnswer>>;
    /// Returns the number of records removed.
    async fn delete_answers_by_student(&self, student_id: Uuid) -> AppResult<u64>;
}

#[async_trait]
pub trait CategoryStore: Send + Sync {
    async fn active_categories(&self) -> AppResult<Vec<Category>>;
    /// Active categories published to the student.
    async fn published_categories(&self, student_id: Uuid) -> AppResult<Vec<Category>>;
    async fn find_category(&self, category_id: Uuid) -> AppResult<Option<Category>>;
    async fn set_publication(
        &self,
        student_id: Uuid,
        category_id: Uuid,
        published: bool,
    ) -> AppResult<()>;
}

/// Name used for answers whose question lost its category.
pub const UNCATEGORIZED: &str = "Uncategorized";
