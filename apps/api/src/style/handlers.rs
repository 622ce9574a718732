use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::auth::CurrentUser;
use crate::errors::AppError;
use crate::models::user::WritingSampleRow;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct WritingSamplePayload {
    pub content: String,
}

/// GET /api/writing-samples
pub async fn handle_list_samples(
    State(state): State<AppState>,
    user: CurrentUser,
) -> Result<Json<Value>, AppError> {
    let samples: Vec<WritingSampleRow> = sqlx::query_as(
        "SELECT * FROM writing_samples WHERE user_id = $1 ORDER BY created_at DESC",
    )
    .bind(user.id)
    .fetch_all(&state.db)
    .await?;

    Ok(Json(json!({ "writing_samples": samples })))
}

/// POST /api/writing-samples
pub async fn handle_create_sample(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(payload): Json<WritingSamplePayload>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    if payload.content.trim().is_empty() {
        return Err(AppError::Validation("content is required".to_string()));
    }

    let sample: WritingSampleRow = sqlx::query_as(
        "INSERT INTO writing_samples (user_id, content) VALUES ($1, $2) RETURNING *",
    )
    .bind(user.id)
    .bind(&payload.content)
    .fetch_one(&state.db)
    .await?;

    Ok((StatusCode::CREATED, Json(json!({ "writing_sample": sample }))))
}

/// DELETE /api/writing-samples/:id
pub async fn handle_delete_sample(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let result = sqlx::query("DELETE FROM writing_samples WHERE id = $1 AND user_id = $2")
        .bind(id)
        .bind(user.id)
        .execute(&state.db)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound(format!("Writing sample {id} not found")));
    }

    Ok(Json(json!({ "message": "Writing sample deleted successfully" })))
}
