//! Newsletter feedback — thumbs up/down with an optional comment.

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
use crate::models::newsletter::FeedbackRow;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateFeedbackPayload {
    pub newsletter_id: Uuid,
    pub rating: String,
    #[serde(default)]
    pub comment: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateFeedbackPayload {
    pub rating: String,
    #[serde(default)]
    pub comment: Option<String>,
}

fn validate_rating(rating: &str) -> Result<(), AppError> {
    match rating {
        "positive" | "negative" => Ok(()),
        _ => Err(AppError::Validation(
            "rating must be 'positive' or 'negative'".to_string(),
        )),
    }
}

/// GET /api/feedback/newsletter/:newsletter_id
pub async fn handle_list_feedback(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(newsletter_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let rows: Vec<FeedbackRow> = sqlx::query_as(
        r#"
        SELECT * FROM feedback
        WHERE newsletter_id = $1 AND user_id = $2
        ORDER BY created_at DESC
        "#,
    )
    .bind(newsletter_id)
    .bind(user.id)
    .fetch_all(&state.db)
    .await?;

    Ok(Json(json!({ "feedback": rows })))
}

/// POST /api/feedback
pub async fn handle_create_feedback(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(payload): Json<CreateFeedbackPayload>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    validate_rating(&payload.rating)?;

    let owns: Option<(Uuid,)> =
        sqlx::query_as("SELECT id FROM newsletters WHERE id = $1 AND user_id = $2")
            .bind(payload.newsletter_id)
            .bind(user.id)
            .fetch_optional(&state.db)
            .await?;
    if owns.is_none() {
        return Err(AppError::NotFound(format!(
            "Newsletter {} not found",
            payload.newsletter_id
        )));
    }

    let row: FeedbackRow = sqlx::query_as(
        r#"
        INSERT INTO feedback (newsletter_id, user_id, rating, comment)
        VALUES ($1, $2, $3, $4)
        RETURNING *
        "#,
    )
    .bind(payload.newsletter_id)
    .bind(user.id)
    .bind(&payload.rating)
    .bind(&payload.comment)
    .fetch_one(&state.db)
    .await?;

    Ok((StatusCode::CREATED, Json(json!({ "feedback": row }))))
}

/// PUT /api/feedback/:id
pub async fn handle_update_feedback(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateFeedbackPayload>,
) -> Result<Json<Value>, AppError> {
    validate_rating(&payload.rating)?;

    let row: Option<FeedbackRow> = sqlx::query_as(
        r#"
        UPDATE feedback
        SET rating = $1, comment = $2
        WHERE id = $3 AND user_id = $4
        RETURNING *
        "#,
    )
    .bind(&payload.rating)
    .bind(&payload.comment)
    .bind(id)
    .bind(user.id)
    .fetch_optional(&state.db)
    .await?;

    let row = row.ok_or_else(|| AppError::NotFound(format!("Feedback {id} not found")))?;
    Ok(Json(json!({ "feedback": row })))
}

/// DELETE /api/feedback/:id
pub async fn handle_delete_feedback(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let result = sqlx::query("DELETE FROM feedback WHERE id = $1 AND user_id = $2")
        .bind(id)
        .bind(user.id)
        .execute(&state.db)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound(format!("Feedback {id} not found")));
    }

    Ok(Json(json!({ "message": "Feedback deleted successfully" })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_rating_accepts_known_values() {
        assert!(validate_rating("positive").is_ok());
        assert!(validate_rating("negative").is_ok());
    }

    #[test]
    fn test_validate_rating_rejects_everything_else() {
        assert!(validate_rating("neutral").is_err());
        assert!(validate_rating("POSITIVE").is_err());
        assert!(validate_rating("").is_err());
    }
}
