use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A persisted content item. `id` is the upstream item's native guid/url —
/// the sole dedup key across repeated fetches of the same origin item.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ContentItemRow {
    pub id: String,
    pub source_id: Uuid,
    pub title: String,
    pub content: String,
    pub url: String,
    pub published_at: DateTime<Utc>,
    pub engagement: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

/// A fetched-but-not-yet-persisted content item as produced by a fetcher.
/// The aggregator tags it with its source id before upserting.
#[derive(Debug, Clone, Serialize)]
pub struct NewContentItem {
    pub id: String,
    pub title: String,
    pub content: String,
    pub url: String,
    pub published_at: DateTime<Utc>,
    pub engagement: serde_json::Value,
}
