use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A newsletter is a draft until `sent_at` is stamped by a confirmed delivery.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct NewsletterRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub sent_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct FeedbackRow {
    pub id: Uuid,
    pub newsletter_id: Uuid,
    pub user_id: Uuid,
    /// "positive" | "negative" — validated at the API boundary.
    pub rating: String,
    pub comment: Option<String>,
    pub created_at: DateTime<Utc>,
}
