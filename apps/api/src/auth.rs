//! Bearer-token auth: signup/signin/signout/me handlers plus the
//! `CurrentUser` extractor used by every protected route.
//!
//! Sessions are DB-backed: the bearer token is a session UUID looked up on
//! every request. Passwords are argon2id PHC strings.

use argon2::password_hash::{rand_core::OsRng, SaltString};
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use axum::{
    async_trait,
    extract::{FromRequestParts, State},
    http::{request::Parts, StatusCode},
    Json,
};
use chrono::{Duration, Utc};
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::user::UserRow;
use crate::state::AppState;

const SESSION_TTL_DAYS: i64 = 30;
const MIN_PASSWORD_LEN: usize = 6;

/// The authenticated user's id, extracted from the bearer session token.
/// Presence in a handler signature means the request was authenticated.
#[derive(Debug, Clone, Copy)]
pub struct CurrentUser {
    pub id: Uuid,
}

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts).ok_or(AppError::Unauthorized)?;
        let token = Uuid::parse_str(token).map_err(|_| AppError::Unauthorized)?;

        let user_id: Option<(Uuid,)> = sqlx::query_as(
            "SELECT user_id FROM sessions WHERE token = $1 AND expires_at > now()",
        )
        .bind(token)
        .fetch_optional(&state.db)
        .await?;

        match user_id {
            Some((id,)) => Ok(CurrentUser { id }),
            None => Err(AppError::Unauthorized),
        }
    }
}

fn bearer_token(parts: &Parts) -> Option<&str> {
    parts
        .headers
        .get(axum::http::header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
}

#[derive(Debug, Deserialize)]
pub struct SignupRequest {
    pub email: String,
    pub password: String,
    pub name: String,
    #[serde(default)]
    pub timezone: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SigninRequest {
    pub email: String,
    pub password: String,
}

/// POST /api/auth/signup
pub async fn handle_signup(
    State(state): State<AppState>,
    Json(req): Json<SignupRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    validate_signup(&req)?;
    let timezone = req.timezone.unwrap_or_else(|| "UTC".to_string());

    let password_hash = hash_password(&req.password)?;

    let user: UserRow = sqlx::query_as(
        r#"
        INSERT INTO users (email, name, timezone, password_hash)
        VALUES ($1, $2, $3, $4)
        RETURNING *
        "#,
    )
    .bind(&req.email)
    .bind(&req.name)
    .bind(&timezone)
    .bind(&password_hash)
    .fetch_one(&state.db)
    .await
    .map_err(|e| match &e {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            AppError::Validation("Email is already registered".to_string())
        }
        _ => AppError::Database(e),
    })?;

    let session = open_session(&state, user.id).await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "User created successfully",
            "user": { "id": user.id, "email": user.email, "name": user.name },
            "session": session,
        })),
    ))
}

/// POST /api/auth/signin
pub async fn handle_signin(
    State(state): State<AppState>,
    Json(req): Json<SigninRequest>,
) -> Result<Json<Value>, AppError> {
    let user: Option<UserRow> = sqlx::query_as("SELECT * FROM users WHERE email = $1")
        .bind(&req.email)
        .fetch_optional(&state.db)
        .await?;

    let user = user.ok_or(AppError::Unauthorized)?;
    verify_password(&req.password, &user.password_hash)?;

    let session = open_session(&state, user.id).await?;

    Ok(Json(json!({
        "message": "Sign in successful",
        "user": { "id": user.id, "email": user.email },
        "session": session,
    })))
}

/// POST /api/auth/signout
pub async fn handle_signout(
    State(state): State<AppState>,
    headers: axum::http::HeaderMap,
) -> Result<Json<Value>, AppError> {
    let token = headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .and_then(|t| Uuid::parse_str(t).ok())
        .ok_or(AppError::Unauthorized)?;

    sqlx::query("DELETE FROM sessions WHERE token = $1")
        .bind(token)
        .execute(&state.db)
        .await?;

    Ok(Json(json!({ "message": "Sign out successful" })))
}

/// GET /api/auth/me
pub async fn handle_me(
    State(state): State<AppState>,
    user: CurrentUser,
) -> Result<Json<Value>, AppError> {
    let profile: UserRow = sqlx::query_as("SELECT * FROM users WHERE id = $1")
        .bind(user.id)
        .fetch_one(&state.db)
        .await?;

    Ok(Json(json!({
        "user": {
            "id": profile.id,
            "email": profile.email,
            "name": profile.name,
            "timezone": profile.timezone,
        }
    })))
}

async fn open_session(state: &AppState, user_id: Uuid) -> Result<Value, AppError> {
    let token = Uuid::new_v4();
    let expires_at = Utc::now() + Duration::days(SESSION_TTL_DAYS);

    sqlx::query("INSERT INTO sessions (token, user_id, expires_at) VALUES ($1, $2, $3)")
        .bind(token)
        .bind(user_id)
        .bind(expires_at)
        .execute(&state.db)
        .await?;

    Ok(json!({ "token": token, "expires_at": expires_at }))
}

fn validate_signup(req: &SignupRequest) -> Result<(), AppError> {
    if !req.email.contains('@') || req.email.len() < 3 {
        return Err(AppError::Validation("A valid email is required".to_string()));
    }
    if req.password.len() < MIN_PASSWORD_LEN {
        return Err(AppError::Validation(format!(
            "Password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }
    if req.name.trim().is_empty() {
        return Err(AppError::Validation("Name is required".to_string()));
    }
    Ok(())
}

fn hash_password(password: &str) -> Result<String, AppError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|h| h.to_string())
        .map_err(|e| AppError::Internal(anyhow::anyhow!("password hashing failed: {e}")))
}

fn verify_password(password: &str, stored_hash: &str) -> Result<(), AppError> {
    let parsed = PasswordHash::new(stored_hash).map_err(|_| AppError::Unauthorized)?;
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .map_err(|_| AppError::Unauthorized)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signup(email: &str, password: &str, name: &str) -> SignupRequest {
        SignupRequest {
            email: email.to_string(),
            password: password.to_string(),
            name: name.to_string(),
            timezone: None,
        }
    }

    #[test]
    fn test_validate_signup_accepts_well_formed() {
        assert!(validate_signup(&signup("a@b.co", "secret1", "Jane")).is_ok());
    }

    #[test]
    fn test_validate_signup_rejects_bad_email() {
        assert!(validate_signup(&signup("not-an-email", "secret1", "Jane")).is_err());
    }

    #[test]
    fn test_validate_signup_rejects_short_password() {
        assert!(validate_signup(&signup("a@b.co", "short", "Jane")).is_err());
    }

    #[test]
    fn test_validate_signup_rejects_blank_name() {
        assert!(validate_signup(&signup("a@b.co", "secret1", "  ")).is_err());
    }

    #[test]
    fn test_password_hash_round_trip() {
        let hash = hash_password("correct horse").expect("hashes");
        assert!(verify_password("correct horse", &hash).is_ok());
        assert!(verify_password("wrong", &hash).is_err());
    }
}
