//! Trend derivation — distills a user's recent content into named trends via
//! the LLM, with a deterministic fallback when the model output is unusable.

pub mod handlers;
pub mod prompts;

use sqlx::PgPool;
use tracing::{info, warn};
use uuid::Uuid;

use crate::content;
use crate::errors::AppError;
use crate::llm_client::{strip_json_fences, GenerationRequest, TextGenerator};
use crate::models::content::ContentItemRow;
use crate::models::trend::{NewTrend, TrendRow};
use crate::util::truncate_chars;

const RECENT_CONTENT_DAYS: i64 = 7;
const FALLBACK_TREND_COUNT: usize = 3;

/// Derives trends for the user from their recent content and persists them.
///
/// Zero recent content short-circuits to an empty list without touching the
/// generator. A persistence failure is logged and the in-memory trends are
/// returned so the caller still sees the analysis.
pub async fn fetch_trends(
    pool: &PgPool,
    generator: &dyn TextGenerator,
    user_id: Uuid,
) -> Result<Vec<TrendRow>, AppError> {
    let recent = content::get_recent_content(pool, user_id, RECENT_CONTENT_DAYS).await?;
    if recent.is_empty() {
        info!(user_id = %user_id, "no recent content, skipping trend analysis");
        return Ok(Vec::new());
    }

    let trends = analyze_trends(generator, &recent).await?;

    match insert_trends(pool, user_id, &trends).await {
        Ok(rows) => Ok(rows),
        Err(e) => {
            warn!(user_id = %user_id, error = ?e, "failed to persist trends, returning in-memory results");
            Ok(trends
                .into_iter()
                .map(|t| TrendRow {
                    id: Uuid::new_v4(),
                    user_id,
                    title: t.title,
                    summary: t.summary,
                    keywords: t.keywords,
                    created_at: chrono::Utc::now(),
                })
                .collect())
        }
    }
}

/// Asks the generator for trends over the batch. Unparseable output degrades
/// to the deterministic fallback; a transport error propagates so callers can
/// distinguish "LLM down" from "LLM confused".
pub async fn analyze_trends(
    generator: &dyn TextGenerator,
    items: &[ContentItemRow],
) -> Result<Vec<NewTrend>, AppError> {
    if items.is_empty() {
        return Ok(Vec::new());
    }

    let content_text = items
        .iter()
        .map(|item| format!("{} {}", item.title, item.content))
        .collect::<Vec<_>>()
        .join(" ");

    let prompt = prompts::TREND_ANALYSIS_PROMPT.replace("{content}", &content_text);

    let response = generator
        .complete(GenerationRequest {
            system: prompts::TREND_ANALYSIS_SYSTEM,
            prompt: &prompt,
            temperature: 0.3,
            max_tokens: 1000,
        })
        .await
        .map_err(|e| AppError::Llm(e.to_string()))?;

    match serde_json::from_str::<Vec<NewTrend>>(strip_json_fences(&response)) {
        Ok(trends) => Ok(trends),
        Err(e) => {
            warn!(error = %e, "trend response was not valid JSON, using fallback");
            Ok(fallback_trends(items))
        }
    }
}

/// Deterministic substitute trends built from the first few items. Keeps the
/// pipeline producing output when the model goes off-script.
pub fn fallback_trends(items: &[ContentItemRow]) -> Vec<NewTrend> {
    items
        .iter()
        .take(FALLBACK_TREND_COUNT)
        .enumerate()
        .map(|(i, item)| NewTrend {
            title: format!("Trend {}: {}", i + 1, truncate_chars(&item.title, 50)),
            summary: format!("{}...", truncate_chars(&item.content, 150)),
            keywords: item
                .title
                .split_whitespace()
                .take(3)
                .map(String::from)
                .collect(),
        })
        .collect()
}

async fn insert_trends(
    pool: &PgPool,
    user_id: Uuid,
    trends: &[NewTrend],
) -> sqlx::Result<Vec<TrendRow>> {
    let mut tx = pool.begin().await?;
    let mut rows = Vec::with_capacity(trends.len());

    for trend in trends {
        let row: TrendRow = sqlx::query_as(
            r#"
            INSERT INTO trends (user_id, title, summary, keywords)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(&trend.title)
        .bind(&trend.summary)
        .bind(&trend.keywords)
        .fetch_one(&mut *tx)
        .await?;
        rows.push(row);
    }

    tx.commit().await?;
    Ok(rows)
}

/// Returns the user's most recent trends, newest first.
pub async fn get_latest_trends(
    pool: &PgPool,
    user_id: Uuid,
    limit: i64,
) -> sqlx::Result<Vec<TrendRow>> {
    sqlx::query_as(
        "SELECT * FROM trends WHERE user_id = $1 ORDER BY created_at DESC LIMIT $2",
    )
    .bind(user_id)
    .bind(limit)
    .fetch_all(pool)
    .await
}

/// Deletes trends older than the retention window.
pub async fn prune_old_trends(pool: &PgPool, days: i64) -> sqlx::Result<u64> {
    let cutoff = chrono::Utc::now() - chrono::Duration::days(days);
    let result = sqlx::query("DELETE FROM trends WHERE created_at < $1")
        .bind(cutoff)
        .execute(pool)
        .await?;
    Ok(result.rows_affected())
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::Utc;
    use serde_json::json;

    use crate::llm_client::LlmError;

    struct FixedGenerator(&'static str);

    #[async_trait]
    impl TextGenerator for FixedGenerator {
        async fn complete(&self, _request: GenerationRequest<'_>) -> Result<String, LlmError> {
            Ok(self.0.to_string())
        }
    }

    struct PanickingGenerator;

    #[async_trait]
    impl TextGenerator for PanickingGenerator {
        async fn complete(&self, _request: GenerationRequest<'_>) -> Result<String, LlmError> {
            panic!("generator must not be invoked");
        }
    }

    fn item(title: &str, body: &str) -> ContentItemRow {
        ContentItemRow {
            id: format!("test-{title}"),
            source_id: Uuid::new_v4(),
            title: title.to_string(),
            content: body.to_string(),
            url: "https://example.com/post".to_string(),
            published_at: Utc::now(),
            engagement: json!({}),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_fallback_caps_at_three_trends() {
        let items: Vec<_> = (0..5).map(|i| item(&format!("Title {i}"), "body")).collect();
        assert_eq!(fallback_trends(&items).len(), 3);
    }

    #[test]
    fn test_fallback_uses_all_items_when_fewer_than_three() {
        let items = vec![item("One topic", "body"), item("Two topic", "body")];
        let trends = fallback_trends(&items);
        assert_eq!(trends.len(), 2);
        assert!(trends.iter().all(|t| !t.title.is_empty()));
        assert_eq!(trends[0].title, "Trend 1: One topic");
        assert_eq!(trends[0].keywords, vec!["One", "topic"]);
    }

    #[test]
    fn test_fallback_is_deterministic() {
        let items = vec![item("Same title", "same body")];
        assert_eq!(fallback_trends(&items), fallback_trends(&items));
    }

    #[test]
    fn test_fallback_truncates_long_multibyte_title_without_panic() {
        let long_title = "é".repeat(120);
        let trends = fallback_trends(&[item(&long_title, "body")]);
        // "Trend 1: " prefix plus 50 title chars
        assert_eq!(trends[0].title.chars().count(), 9 + 50);
    }

    #[tokio::test]
    async fn test_analyze_empty_batch_skips_generator() {
        let trends = analyze_trends(&PanickingGenerator, &[]).await.unwrap();
        assert!(trends.is_empty());
    }

    #[tokio::test]
    async fn test_analyze_parses_well_formed_response() {
        let generator = FixedGenerator(
            r#"[{"title": "AI tooling", "summary": "Everyone ships agents.", "keywords": ["ai", "agents"]}]"#,
        );
        let trends = analyze_trends(&generator, &[item("t", "b")]).await.unwrap();
        assert_eq!(trends.len(), 1);
        assert_eq!(trends[0].title, "AI tooling");
    }

    #[tokio::test]
    async fn test_analyze_falls_back_on_invalid_json() {
        let generator = FixedGenerator("not json");
        let items = vec![item("Fallback title", "fallback body")];
        let trends = analyze_trends(&generator, &items).await.unwrap();
        assert_eq!(trends, fallback_trends(&items));
    }
}
