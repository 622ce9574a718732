use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct TrendRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub summary: String,
    /// Keyword order is the relevance rank as returned by the generator —
    /// never re-sorted.
    pub keywords: Vec<String>,
    pub created_at: DateTime<Utc>,
}

/// A trend as parsed from the generator's JSON output (or synthesized by the
/// deterministic fallback) before it is persisted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewTrend {
    pub title: String,
    pub summary: String,
    pub keywords: Vec<String>,
}
