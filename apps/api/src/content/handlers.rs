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
use crate::models::source::{SourceKind, SourceRow};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct SourcePayload {
    #[serde(rename = "type")]
    pub kind: String,
    pub handle: String,
    #[serde(default)]
    pub url: Option<String>,
}

fn validate_source(payload: &SourcePayload) -> Result<(), AppError> {
    if SourceKind::parse(&payload.kind).is_none() {
        return Err(AppError::Validation(
            "type must be one of 'social', 'video', 'feed'".to_string(),
        ));
    }
    if payload.handle.trim().is_empty() {
        return Err(AppError::Validation("handle is required".to_string()));
    }
    if let Some(url) = &payload.url {
        url::Url::parse(url)
            .map_err(|_| AppError::Validation("url must be a valid URI".to_string()))?;
    }
    Ok(())
}

/// GET /api/sources
pub async fn handle_list_sources(
    State(state): State<AppState>,
    user: CurrentUser,
) -> Result<Json<Value>, AppError> {
    let sources: Vec<SourceRow> =
        sqlx::query_as("SELECT * FROM sources WHERE user_id = $1 ORDER BY created_at DESC")
            .bind(user.id)
            .fetch_all(&state.db)
            .await?;

    Ok(Json(json!({ "sources": sources })))
}

/// POST /api/sources
pub async fn handle_create_source(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(payload): Json<SourcePayload>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    validate_source(&payload)?;

    let source: SourceRow = sqlx::query_as(
        r#"
        INSERT INTO sources (user_id, kind, handle, url)
        VALUES ($1, $2, $3, $4)
        RETURNING *
        "#,
    )
    .bind(user.id)
    .bind(&payload.kind)
    .bind(&payload.handle)
    .bind(&payload.url)
    .fetch_one(&state.db)
    .await?;

    Ok((StatusCode::CREATED, Json(json!({ "source": source }))))
}

/// PUT /api/sources/:id
pub async fn handle_update_source(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<SourcePayload>,
) -> Result<Json<Value>, AppError> {
    validate_source(&payload)?;

    let source: Option<SourceRow> = sqlx::query_as(
        r#"
        UPDATE sources
        SET kind = $1, handle = $2, url = $3
        WHERE id = $4 AND user_id = $5
        RETURNING *
        "#,
    )
    .bind(&payload.kind)
    .bind(&payload.handle)
    .bind(&payload.url)
    .bind(id)
    .bind(user.id)
    .fetch_optional(&state.db)
    .await?;

    let source = source.ok_or_else(|| AppError::NotFound(format!("Source {id} not found")))?;
    Ok(Json(json!({ "source": source })))
}

/// DELETE /api/sources/:id
pub async fn handle_delete_source(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let result = sqlx::query("DELETE FROM sources WHERE id = $1 AND user_id = $2")
        .bind(id)
        .bind(user.id)
        .execute(&state.db)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound(format!("Source {id} not found")));
    }

    Ok(Json(json!({ "message": "Source deleted successfully" })))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload(kind: &str, handle: &str, url: Option<&str>) -> SourcePayload {
        SourcePayload {
            kind: kind.to_string(),
            handle: handle.to_string(),
            url: url.map(String::from),
        }
    }

    #[test]
    fn test_validate_source_accepts_each_kind() {
        for kind in ["social", "video", "feed"] {
            assert!(validate_source(&payload(kind, "handle", None)).is_ok());
        }
    }

    #[test]
    fn test_validate_source_rejects_unknown_kind() {
        assert!(validate_source(&payload("podcast", "handle", None)).is_err());
    }

    #[test]
    fn test_validate_source_rejects_empty_handle() {
        assert!(validate_source(&payload("feed", "  ", None)).is_err());
    }

    #[test]
    fn test_validate_source_checks_url_when_present() {
        assert!(validate_source(&payload("feed", "h", Some("https://example.com/rss"))).is_ok());
        assert!(validate_source(&payload("feed", "h", Some("not a url"))).is_err());
    }
}
