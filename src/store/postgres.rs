// src/store/postgres.rs

use async_trait::async_trait;
use sqlx::{PgPool, types::Json};
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::{
        answer::{AnswerRecord, CategorizedAnswer, NewAnswerRecord},
        category::Category,
        question::{CreateQuestionRequest, Question, QuestionRow},
    },
    store::{AnswerStore, CategoryStore, QuestionStore, UNCATEGORIZED},
};

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Postgres SQLSTATE 23503: the referenced row does not exist.
fn is_foreign_key_violation(e: &sqlx::Error) -> bool {
    e.as_database_error()
        .is_some_and(|d| d.is_foreign_key_violation())
}

const QUESTION_COLUMNS: &str =
    "id, category_id, question, type, options, correct_answer, time_limit, points";

#[async_trait]
impl QuestionStore for PgStore {
    async fn questions_by_category(&self, category_id: Uuid) -> AppResult<Vec<Question>> {
        let sql = format!(
            "SELECT {} FROM questions WHERE category_id = $1 ORDER BY created_at, id",
            QUESTION_COLUMNS
        );

        let rows = sqlx::query_as::<_, QuestionRow>(&sql)
            .bind(category_id)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to fetch questions of {}: {:?}", category_id, e);
                AppError::from(e)
            })?;

        rows.into_iter().map(Question::try_from).collect()
    }

    async fn insert_question(&self, req: CreateQuestionRequest) -> AppResult<Question> {
        let sql = format!(
            r#"
            INSERT INTO questions
            (id, category_id, question, type, options, correct_answer, time_limit, points)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {}
            "#,
            QUESTION_COLUMNS
        );

        let row = sqlx::query_as::<_, QuestionRow>(&sql)
            .bind(Uuid::new_v4())
            .bind(req.category_id)
            .bind(&req.question)
            .bind(req.question_type.as_str())
            .bind(Json(req.options.clone()))
            .bind(&req.correct_answer)
            .bind(req.time_limit)
            .bind(req.points)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                if is_foreign_key_violation(&e) {
                    AppError::NotFound(format!("Category '{}' not found", req.category_id))
                } else {
                    tracing::error!("Failed to create question: {:?}", e);
                    AppError::from(e)
                }
            })?;

        Question::try_from(row)
    }
}

#[async_trait]
impl AnswerStore for PgStore {
    async fn insert_answer(&self, record: NewAnswerRecord) -> AppResult<AnswerRecord> {
        let saved = sqlx::query_as::<_, AnswerRecord>(
            r#"
            INSERT INTO student_answers
            (id, question_id, student_id, answer, is_correct, time_spent, answered_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id, question_id, student_id, answer, is_correct, time_spent, answered_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(record.question_id)
        .bind(record.student_id)
        .bind(&record.answer)
        .bind(record.is_correct)
        .bind(record.time_spent)
        .bind(record.answered_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if is_foreign_key_violation(&e) {
                AppError::NotFound(format!("Question '{}' not found", record.question_id))
            } else {
                AppError::from(e)
            }
        })?;

        Ok(saved)
    }

    async fn answers_by_student(&self, student_id: Uuid) -> AppResult<Vec<CategorizedAnswer>> {
        let rows = sqlx::query_as::<_, CategorizedAnswer>(
            r#"
            SELECT
                sa.student_id,
                COALESCE(c.name, $2) as category_name,
                sa.is_correct
            FROM student_answers sa
            JOIN questions q ON sa.question_id = q.id
            LEFT JOIN categories c ON q.category_id = c.id
            WHERE sa.student_id = $1
            "#,
        )
        .bind(student_id)
        .bind(UNCATEGORIZED)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to fetch answers of {}: {:?}", student_id, e);
            AppError::from(e)
        })?;

        Ok(rows)
    }

    async fn all_answers(&self) -> AppResult<Vec<CategorizedAnswer>> {
        let rows = sqlx::query_as::<_, CategorizedAnswer>(
            r#"
            SELECT
                sa.student_id,
                COALESCE(c.name, $1) as category_name,
                sa.is_correct
            FROM student_answers sa
            JOIN questions q ON sa.question_id = q.id
            LEFT JOIN categories c ON q.category_id = c.id
            "#,
        )
        .bind(UNCATEGORIZED)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    async fn delete_answers_by_student(&self, student_id: Uuid) -> AppResult<u64> {
        let result = sqlx::query("DELETE FROM student_answers WHERE student_id = $1")
            .bind(student_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }
}

#[async_trait]
impl CategoryStore for PgStore {
    async fn active_categories(&self) -> AppResult<Vec<Category>> {
        let categories = sqlx::query_as::<_, Category>(
            "SELECT id, name, description, is_active FROM categories WHERE is_active ORDER BY name",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(categories)
    }

    async fn published_categories(&self, student_id: Uuid) -> AppResult<Vec<Category>> {
        let categories = sqlx::query_as::<_, Category>(
            r#"
            SELECT c.id, c.name, c.description, c.is_active
            FROM categories c
            JOIN student_categories sc ON sc.category_id = c.id
            WHERE sc.student_id = $1 AND sc.published AND c.is_active
            ORDER BY c.name
            "#,
        )
        .bind(student_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(categories)
    }

    async fn find_category(&self, category_id: Uuid) -> AppResult<Option<Category>> {
        let category = sqlx::query_as::<_, Category>(
            "SELECT id, name, description, is_active FROM categories WHERE id = $1",
        )
        .bind(category_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(category)
    }

    async fn set_publication(
        &self,
        student_id: Uuid,
        category_id: Uuid,
        published: bool,
    ) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO student_categories (student_id, category_id, published)
            VALUES ($1, $2, $3)
            ON CONFLICT (student_id, category_id) DO UPDATE SET published = EXCLUDED.published
            "#,
        )
        .bind(student_id)
        .bind(category_id)
        .bind(published)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to set category publication: {:?}", e);
            AppError::from(e)
        })?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_non_database_errors_are_not_foreign_key_violations() {
        assert!(!is_foreign_key_violation(&sqlx::Error::RowNotFound));
        assert!(!is_foreign_key_violation(&sqlx::Error::PoolTimedOut));
    }
}
