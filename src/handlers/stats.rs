// src/handlers/stats.rs

use axum::{Extension, Json, extract::State, response::IntoResponse};
use serde::Serialize;

use crate::{
    error::AppError,
    handlers::category::visible_categories,
    models::category::Category,
    state::AppState,
    statistics::StudentStatistics,
    utils::jwt::Identity,
};

/// Statistics of the current student, recomputed from their answers.
pub async fn my_stats(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
) -> Result<impl IntoResponse, AppError> {
    let stats = state.statistics().for_student(identity.user_id).await?;
    Ok(Json(stats))
}

#[derive(Debug, Serialize)]
pub struct DashboardResponse {
    pub categories: Vec<Category>,
    pub statistics: StudentStatistics,
}

/// Everything the student dashboard needs. Both loads are independent
/// and run concurrently.
pub async fn dashboard(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
) -> Result<impl IntoResponse, AppError> {
    let statistics = state.statistics();
    let (categories, statistics) = tokio::try_join!(
        visible_categories(&state, &identity),
        statistics.for_student(identity.user_id),
    )?;

    Ok(Json(DashboardResponse {
        categories,
        statistics,
    }))
}
