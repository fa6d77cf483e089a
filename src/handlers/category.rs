// src/handlers/category.rs

use axum::{Extension, Json, extract::State, response::IntoResponse};

use crate::{
    error::{AppError, AppResult},
    models::category::Category,
    state::AppState,
    utils::jwt::Identity,
};

/// Active categories the caller may take a quiz on.
/// Students only see categories published to them.
pub async fn visible_categories(state: &AppState, identity: &Identity) -> AppResult<Vec<Category>> {
    if identity.is_admin() {
        state.categories.active_categories().await
    } else {
        state.categories.published_categories(identity.user_id).await
    }
}

pub async fn list_categories(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
) -> Result<impl IntoResponse, AppError> {
    let categories = visible_categories(&state, &identity).await?;
    Ok(Json(categories))
}
