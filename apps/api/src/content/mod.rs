//! Content aggregation — fans source fetchers out across a user's configured
//! sources, persists the merged results, and answers recency-windowed reads.

pub mod fetchers;
pub mod handlers;

use chrono::{DateTime, Duration, Utc};
use reqwest::Client;
use sqlx::PgPool;
use tracing::{info, warn};
use uuid::Uuid;

use crate::models::content::{ContentItemRow, NewContentItem};
use crate::models::source::SourceRow;

/// A fetched item tagged with the source it came from.
#[derive(Debug, Clone)]
pub struct FetchedItem {
    pub source_id: Uuid,
    pub item: NewContentItem,
}

/// Fetches fresh content from every source the user has configured.
///
/// Each source is fetched in turn; a failing source is logged and skipped so
/// a single bad feed never aborts the batch. The merged list is upserted
/// keyed by item id — re-fetching the same origin item is an update, not a
/// duplicate — and returned regardless of the persistence outcome (a storage
/// failure is logged, not raised).
pub async fn fetch_all_user_content(
    pool: &PgPool,
    client: &Client,
    user_id: Uuid,
) -> anyhow::Result<Vec<FetchedItem>> {
    let sources: Vec<SourceRow> =
        sqlx::query_as("SELECT * FROM sources WHERE user_id = $1")
            .bind(user_id)
            .fetch_all(pool)
            .await?;

    if sources.is_empty() {
        return Ok(Vec::new());
    }

    let mut all_items: Vec<FetchedItem> = Vec::new();
    let mut failed_sources = 0usize;

    for source in &sources {
        match fetchers::fetch_for_source(client, source).await {
            Ok(items) => {
                all_items.extend(items.into_iter().map(|item| FetchedItem {
                    source_id: source.id,
                    item,
                }));
            }
            Err(e) => {
                warn!(source_id = %source.id, kind = %source.kind, error = ?e, "source fetch failed, continuing");
                failed_sources += 1;
            }
        }
    }

    info!(
        user_id = %user_id,
        fetched = all_items.len(),
        sources = sources.len(),
        failed = failed_sources,
        "content fetch complete"
    );

    if !all_items.is_empty() {
        if let Err(e) = upsert_content_items(pool, &all_items).await {
            warn!(user_id = %user_id, error = ?e, "failed to persist fetched content");
        }
    }

    Ok(all_items)
}

/// Idempotent write contract: put-if-absent-or-replace keyed by the item's
/// upstream id. This upsert is the system's only de-duplication mechanism.
async fn upsert_content_items(pool: &PgPool, items: &[FetchedItem]) -> sqlx::Result<()> {
    for fetched in items {
        sqlx::query(
            r#"
            INSERT INTO content_items (id, source_id, title, content, url, published_at, engagement)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (id) DO UPDATE SET
                source_id = EXCLUDED.source_id,
                title = EXCLUDED.title,
                content = EXCLUDED.content,
                url = EXCLUDED.url,
                published_at = EXCLUDED.published_at,
                engagement = EXCLUDED.engagement
            "#,
        )
        .bind(&fetched.item.id)
        .bind(fetched.source_id)
        .bind(&fetched.item.title)
        .bind(&fetched.item.content)
        .bind(&fetched.item.url)
        .bind(fetched.item.published_at)
        .bind(&fetched.item.engagement)
        .execute(pool)
        .await?;
    }
    Ok(())
}

/// Returns the user's persisted content published within the last `days`
/// days, newest first. Owner scoping goes through the source relationship —
/// content items carry no direct owner column.
pub async fn get_recent_content(
    pool: &PgPool,
    user_id: Uuid,
    days: i64,
) -> sqlx::Result<Vec<ContentItemRow>> {
    let cutoff = recency_cutoff(Utc::now(), days);

    sqlx::query_as(
        r#"
        SELECT ci.*
        FROM content_items ci
        JOIN sources s ON s.id = ci.source_id
        WHERE s.user_id = $1 AND ci.published_at >= $2
        ORDER BY ci.published_at DESC
        "#,
    )
    .bind(user_id)
    .bind(cutoff)
    .fetch_all(pool)
    .await
}

/// Deletes content items older than the retention window.
pub async fn prune_old_content(pool: &PgPool, days: i64) -> sqlx::Result<u64> {
    let cutoff = recency_cutoff(Utc::now(), days);
    let result = sqlx::query("DELETE FROM content_items WHERE published_at < $1")
        .bind(cutoff)
        .execute(pool)
        .await?;
    Ok(result.rows_affected())
}

/// Cutoff for a recency window ending at `now`. The window is inclusive at
/// exactly `days` days (`published_at >= cutoff`).
pub fn recency_cutoff(now: DateTime<Utc>, days: i64) -> DateTime<Utc> {
    now - Duration::days(days)
}

/// Mirror of the SQL recency predicate, used to pin the boundary semantics.
pub fn is_within_window(published_at: DateTime<Utc>, now: DateTime<Utc>, days: i64) -> bool {
    published_at >= recency_cutoff(now, days)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_window_excludes_eight_days_old() {
        let now = Utc::now();
        let published = now - Duration::days(8);
        assert!(!is_within_window(published, now, 7));
    }

    #[test]
    fn test_window_includes_six_days_old() {
        let now = Utc::now();
        let published = now - Duration::days(6);
        assert!(is_within_window(published, now, 7));
    }

    #[test]
    fn test_window_boundary_is_inclusive() {
        let now = Utc::now();
        let published = now - Duration::days(7);
        assert!(is_within_window(published, now, 7));
        // One second past the boundary falls out of the window.
        assert!(!is_within_window(published - Duration::seconds(1), now, 7));
    }
}
