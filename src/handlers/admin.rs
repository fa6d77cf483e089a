// src/handlers/admin.rs

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    error::AppError,
    models::{category::SetPublicationRequest, question::CreateQuestionRequest},
    state::AppState,
    utils::html::clean_html,
};

/// Creates a new quiz question.
/// Admin only. The prompt is sanitized since the UI renders it as HTML.
pub async fn create_question(
    State(state): State<AppState>,
    Json(mut payload): Json<CreateQuestionRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    payload.question = clean_html(&payload.question);
    if payload.question.trim().is_empty() {
        return Err(AppError::BadRequest(
            "Question text is empty after sanitizing".to_string(),
        ));
    }

    let question = state.questions.insert_question(payload).await?;
    tracing::info!(
        "Question {} created in category {}",
        question.id,
        question.category_id
    );

    Ok((StatusCode::CREATED, Json(question)))
}

/// Publishes or hides a category for one student.
/// Admin only.
pub async fn set_publication(
    State(state): State<AppState>,
    Path((student_id, category_id)): Path<(Uuid, Uuid)>,
    Json(payload): Json<SetPublicationRequest>,
) -> Result<impl IntoResponse, AppError> {
    if state.categories.find_category(category_id).await?.is_none() {
        return Err(AppError::NotFound("Category not found".to_string()));
    }

    state
        .categories
        .set_publication(student_id, category_id, payload.published)
        .await?;

    Ok(StatusCode::OK)
}

/// Statistics of any student.
/// Admin only.
pub async fn student_stats(
    State(state): State<AppState>,
    Path(student_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let stats = state.statistics().for_student(student_id).await?;
    Ok(Json(stats))
}

/// Deletes every answer record of a student.
/// Admin only.
pub async fn reset_student_answers(
    State(state): State<AppState>,
    Path(student_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let deleted = state.answers.delete_answers_by_student(student_id).await?;
    tracing::info!("Deleted {} answer records of student {}", deleted, student_id);

    Ok(Json(serde_json::json!({ "deleted": deleted })))
}

/// Class-wide aggregate over all answer records.
/// Admin only.
pub async fn overview(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let overview = state.statistics().overview().await?;
    Ok(Json(overview))
}
