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
use crate::models::newsletter::NewsletterRow;
use crate::newsletter;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct UpdateNewsletterPayload {
    pub content: String,
}

/// GET /api/newsletters
pub async fn handle_list_newsletters(
    State(state): State<AppState>,
    user: CurrentUser,
) -> Result<Json<Value>, AppError> {
    let rows: Vec<NewsletterRow> = sqlx::query_as(
        "SELECT * FROM newsletters WHERE user_id = $1 ORDER BY created_at DESC",
    )
    .bind(user.id)
    .fetch_all(&state.db)
    .await?;

    Ok(Json(json!({ "newsletters": rows })))
}

/// GET /api/newsletters/stats
pub async fn handle_newsletter_stats(
    State(state): State<AppState>,
    user: CurrentUser,
) -> Result<Json<Value>, AppError> {
    let stats = newsletter::get_newsletter_stats(&state.db, user.id).await?;
    Ok(Json(json!({ "stats": stats })))
}

/// GET /api/newsletters/:id
pub async fn handle_get_newsletter(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let row: Option<NewsletterRow> =
        sqlx::query_as("SELECT * FROM newsletters WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user.id)
            .fetch_optional(&state.db)
            .await?;

    let row = row.ok_or_else(|| AppError::NotFound(format!("Newsletter {id} not found")))?;
    Ok(Json(json!({ "newsletter": row })))
}

/// POST /api/newsletters/generate
pub async fn handle_generate_newsletter(
    State(state): State<AppState>,
    user: CurrentUser,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let row = newsletter::generate_newsletter(&state.db, state.llm.as_ref(), user.id).await?;
    Ok((StatusCode::CREATED, Json(json!({ "newsletter": row }))))
}

/// POST /api/newsletters/:id/send
pub async fn handle_send_newsletter(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let row = newsletter::send_newsletter(&state.db, &state.mailer, id, user.id).await?;
    Ok(Json(json!({
        "message": "Newsletter sent successfully",
        "newsletter": row,
    })))
}

/// PUT /api/newsletters/:id
pub async fn handle_update_newsletter(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateNewsletterPayload>,
) -> Result<Json<Value>, AppError> {
    if payload.content.trim().is_empty() {
        return Err(AppError::Validation("content is required".to_string()));
    }

    let row: Option<NewsletterRow> = sqlx::query_as(
        "UPDATE newsletters SET content = $1 WHERE id = $2 AND user_id = $3 RETURNING *",
    )
    .bind(&payload.content)
    .bind(id)
    .bind(user.id)
    .fetch_optional(&state.db)
    .await?;

    let row = row.ok_or_else(|| AppError::NotFound(format!("Newsletter {id} not found")))?;
    Ok(Json(json!({ "newsletter": row })))
}

/// DELETE /api/newsletters/:id
pub async fn handle_delete_newsletter(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let result = sqlx::query("DELETE FROM newsletters WHERE id = $1 AND user_id = $2")
        .bind(id)
        .bind(user.id)
        .execute(&state.db)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound(format!("Newsletter {id} not found")));
    }

    Ok(Json(json!({ "message": "Newsletter deleted successfully" })))
}
