use axum::{extract::State, http::StatusCode, Json};
use serde_json::{json, Value};

use crate::auth::CurrentUser;
use crate::errors::AppError;
use crate::models::trend::TrendRow;
use crate::state::AppState;
use crate::trends;

const LATEST_TRENDS_LIMIT: i64 = 5;

/// GET /api/trends
pub async fn handle_list_trends(
    State(state): State<AppState>,
    user: CurrentUser,
) -> Result<Json<Value>, AppError> {
    let rows: Vec<TrendRow> =
        sqlx::query_as("SELECT * FROM trends WHERE user_id = $1 ORDER BY created_at DESC")
            .bind(user.id)
            .fetch_all(&state.db)
            .await?;

    Ok(Json(json!({ "trends": rows })))
}

/// GET /api/trends/latest
pub async fn handle_latest_trends(
    State(state): State<AppState>,
    user: CurrentUser,
) -> Result<Json<Value>, AppError> {
    let rows = trends::get_latest_trends(&state.db, user.id, LATEST_TRENDS_LIMIT).await?;
    Ok(Json(json!({ "trends": rows })))
}

/// POST /api/trends/fetch
pub async fn handle_fetch_trends(
    State(state): State<AppState>,
    user: CurrentUser,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let rows = trends::fetch_trends(&state.db, state.llm.as_ref(), user.id).await?;
    Ok((StatusCode::CREATED, Json(json!({ "trends": rows }))))
}
