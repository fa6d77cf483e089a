// src/models/category.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Represents the 'categories' table in the database.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct Category {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub is_active: bool,
}

/// DTO for starting a quiz on a category.
#[derive(Debug, Deserialize)]
pub struct StartQuizRequest {
    pub category_id: Uuid,
}

/// DTO for publishing or hiding a category for one student.
#[derive(Debug, Deserialize)]
pub struct SetPublicationRequest {
    pub published: bool,
}
