// src/handlers/quiz.rs

use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    error::AppError,
    handlers::category::visible_categories,
    models::{answer::SubmitAnswerRequest, category::StartQuizRequest},
    quiz::{QuizRunner, runner::SubmitOutcome},
    state::AppState,
    utils::jwt::Identity,
};

/// Starts a quiz on a category for the caller.
///
/// * The category must be active and visible to the caller.
/// * An empty category yields a session in the `empty` state, which is
///   returned but not kept.
/// * A running quiz of the same student is exited and replaced.
pub async fn start_quiz(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Json(req): Json<StartQuizRequest>,
) -> Result<impl IntoResponse, AppError> {
    let visible = visible_categories(&state, &identity).await?;
    if !visible.iter().any(|c| c.id == req.category_id) {
        return Err(AppError::NotFound("Category not found".to_string()));
    }

    let runner = QuizRunner::start(
        identity.user_id,
        req.category_id,
        &state.loader(),
        state.evaluator(),
        state.config.quiz.clone(),
    )
    .await;

    let view = runner.view().await;
    if !view.phase.is_terminal() {
        tracing::info!(
            "Student {} started quiz {} on category {}",
            identity.user_id,
            runner.id(),
            req.category_id
        );
        state.sessions.insert(runner).await;
    }

    Ok((StatusCode::CREATED, Json(view)))
}

async fn find_runner(
    state: &AppState,
    identity: &Identity,
    session_id: Uuid,
) -> Result<std::sync::Arc<QuizRunner>, AppError> {
    state
        .sessions
        .get(session_id, identity.user_id)
        .await
        .ok_or(AppError::NotFound("Quiz session not found".to_string()))
}

/// Current state of a quiz: the question on screen (without its answer),
/// the remaining seconds, the last feedback or the final results.
pub async fn get_quiz(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(session_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let runner = find_runner(&state, &identity, session_id).await?;
    Ok(Json(runner.view().await))
}

/// Submits the answer to the question on screen.
/// A second submission for the same question is reported as ignored.
pub async fn submit_answer(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(session_id): Path<Uuid>,
    Json(req): Json<SubmitAnswerRequest>,
) -> Result<impl IntoResponse, AppError> {
    req.validate()?;

    let runner = find_runner(&state, &identity, session_id).await?;
    let outcome = runner.submit(&req.answer).await;

    if let SubmitOutcome::Ignored { phase } = &outcome {
        tracing::debug!("Ignored submission on quiz {} in phase {:?}", session_id, phase);
    }

    Ok(Json(outcome))
}

/// Leaves a quiz early. Pending transitions are cancelled.
pub async fn exit_quiz(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(session_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let runner = state
        .sessions
        .remove(session_id, identity.user_id)
        .await
        .ok_or(AppError::NotFound("Quiz session not found".to_string()))?;

    runner.exit().await;

    Ok(StatusCode::NO_CONTENT)
}
