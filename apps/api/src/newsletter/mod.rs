//! Newsletter composition and delivery — turns a user's recent content,
//! derived trends, and extracted writing style into a dated draft, and sends
//! drafts out over SMTP.

pub mod handlers;
pub mod prompts;

use chrono::Utc;
use chrono_tz::Tz;
use serde::Serialize;
use sqlx::PgPool;
use tracing::{info, warn};
use uuid::Uuid;

use crate::content;
use crate::errors::AppError;
use crate::llm_client::{GenerationRequest, TextGenerator};
use crate::mailer::Mailer;
use crate::models::content::ContentItemRow;
use crate::models::newsletter::{FeedbackRow, NewsletterRow};
use crate::models::trend::TrendRow;
use crate::models::user::{UserRow, WritingSampleRow};
use crate::style::{self, WritingStyle};
use crate::trends;
use crate::util::truncate_chars;

const RECENT_CONTENT_DAYS: i64 = 7;
const TRENDS_IN_PROMPT: usize = 5;
const CONTENT_ITEMS_IN_PROMPT: usize = 5;
const CONTENT_SNIPPET_CHARS: usize = 200;
const SAMPLES_IN_PROMPT: usize = 3;
const SAMPLE_SNIPPET_CHARS: usize = 500;

/// Composes a new draft newsletter for the user and persists it.
///
/// The draft is dated in the user's timezone. Any stage failure propagates;
/// a half-generated newsletter is never stored.
pub async fn generate_newsletter(
    pool: &PgPool,
    generator: &dyn TextGenerator,
    user_id: Uuid,
) -> Result<NewsletterRow, AppError> {
    let user: UserRow = sqlx::query_as("SELECT * FROM users WHERE id = $1")
        .bind(user_id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User {user_id} not found")))?;

    let date = local_date_line(&user.timezone);

    let recent = content::get_recent_content(pool, user_id, RECENT_CONTENT_DAYS).await?;
    let latest_trends =
        trends::get_latest_trends(pool, user_id, TRENDS_IN_PROMPT as i64).await?;

    let samples: Vec<WritingSampleRow> = sqlx::query_as(
        "SELECT * FROM writing_samples WHERE user_id = $1 ORDER BY created_at DESC",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;
    let writing_style = style::extract_writing_style(
        generator,
        samples.into_iter().map(|s| s.content).collect(),
    )
    .await;

    let prompt = build_newsletter_prompt(&date, &writing_style, &latest_trends, &recent);

    let body = generator
        .complete(GenerationRequest {
            system: prompts::NEWSLETTER_SYSTEM,
            prompt: &prompt,
            temperature: 0.7,
            max_tokens: 2000,
        })
        .await
        .map_err(|e| AppError::Llm(e.to_string()))?;

    let newsletter: NewsletterRow = sqlx::query_as(
        "INSERT INTO newsletters (user_id, content) VALUES ($1, $2) RETURNING *",
    )
    .bind(user_id)
    .bind(&body)
    .fetch_one(pool)
    .await?;

    info!(user_id = %user_id, newsletter_id = %newsletter.id, "newsletter draft generated");
    Ok(newsletter)
}

/// Emails a stored newsletter to its owner, then stamps `sent_at`.
///
/// Sending is allowed regardless of a previous send; re-sends simply restamp.
/// A failed stamp after a successful send is logged but the send still counts.
pub async fn send_newsletter(
    pool: &PgPool,
    mailer: &Mailer,
    newsletter_id: Uuid,
    user_id: Uuid,
) -> Result<NewsletterRow, AppError> {
    #[derive(sqlx::FromRow)]
    struct NewsletterWithOwner {
        #[sqlx(flatten)]
        newsletter: NewsletterRow,
        email: String,
        name: String,
    }

    let row: Option<NewsletterWithOwner> = sqlx::query_as(
        r#"
        SELECT n.*, u.email, u.name
        FROM newsletters n
        JOIN users u ON u.id = n.user_id
        WHERE n.id = $1 AND n.user_id = $2
        "#,
    )
    .bind(newsletter_id)
    .bind(user_id)
    .fetch_optional(pool)
    .await?;

    let NewsletterWithOwner {
        mut newsletter,
        email,
        name,
    } = row.ok_or_else(|| AppError::NotFound(format!("Newsletter {newsletter_id} not found")))?;

    mailer
        .send_newsletter(&email, &name, &newsletter.content)
        .await?;

    let sent_at = Utc::now();
    let stamp = sqlx::query("UPDATE newsletters SET sent_at = $1 WHERE id = $2")
        .bind(sent_at)
        .bind(newsletter_id)
        .execute(pool)
        .await;
    match stamp {
        Ok(_) => newsletter.sent_at = Some(sent_at),
        Err(e) => {
            warn!(newsletter_id = %newsletter_id, error = ?e, "sent but failed to stamp sent_at");
        }
    }

    info!(newsletter_id = %newsletter_id, to = %email, "newsletter sent");
    Ok(newsletter)
}

/// Aggregate delivery and feedback counters for a user's newsletters.
/// Open and click rates are always zero, there is no tracking pixel.
#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct NewsletterStats {
    pub total: usize,
    pub sent: usize,
    pub drafts: usize,
    pub positive_feedback: usize,
    pub negative_feedback: usize,
    pub open_rate: u32,
    pub click_rate: u32,
}

pub async fn get_newsletter_stats(
    pool: &PgPool,
    user_id: Uuid,
) -> Result<NewsletterStats, AppError> {
    let newsletters: Vec<NewsletterRow> =
        sqlx::query_as("SELECT * FROM newsletters WHERE user_id = $1")
            .bind(user_id)
            .fetch_all(pool)
            .await?;

    let feedback: Vec<FeedbackRow> =
        sqlx::query_as("SELECT * FROM feedback WHERE user_id = $1")
            .bind(user_id)
            .fetch_all(pool)
            .await?;

    Ok(compute_stats(&newsletters, &feedback))
}

fn compute_stats(newsletters: &[NewsletterRow], feedback: &[FeedbackRow]) -> NewsletterStats {
    let sent = newsletters.iter().filter(|n| n.sent_at.is_some()).count();
    NewsletterStats {
        total: newsletters.len(),
        sent,
        drafts: newsletters.len() - sent,
        positive_feedback: feedback.iter().filter(|f| f.rating == "positive").count(),
        negative_feedback: feedback.iter().filter(|f| f.rating == "negative").count(),
        open_rate: 0,
        click_rate: 0,
    }
}

/// Formats today's date in the user's timezone, e.g. "Monday, January 5, 2026".
/// An unrecognized timezone falls back to UTC.
fn local_date_line(timezone: &str) -> String {
    let tz: Tz = timezone.parse().unwrap_or(chrono_tz::UTC);
    Utc::now()
        .with_timezone(&tz)
        .format("%A, %B %-d, %Y")
        .to_string()
}

fn build_newsletter_prompt(
    date: &str,
    writing_style: &WritingStyle,
    latest_trends: &[TrendRow],
    items: &[ContentItemRow],
) -> String {
    let trend_lines = if latest_trends.is_empty() {
        "(no trends available)".to_string()
    } else {
        latest_trends
            .iter()
            .take(TRENDS_IN_PROMPT)
            .map(|t| format!("- {}: {}", t.title, t.summary))
            .collect::<Vec<_>>()
            .join("\n")
    };

    let content_lines = if items.is_empty() {
        "(no recent content)".to_string()
    } else {
        items
            .iter()
            .take(CONTENT_ITEMS_IN_PROMPT)
            .map(|item| {
                format!(
                    "- {}: {}",
                    item.title,
                    truncate_chars(&item.content, CONTENT_SNIPPET_CHARS)
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    };

    let sample_lines = if writing_style.samples.is_empty() {
        "(no samples available)".to_string()
    } else {
        writing_style
            .samples
            .iter()
            .take(SAMPLES_IN_PROMPT)
            .map(|s| truncate_chars(s, SAMPLE_SNIPPET_CHARS).to_string())
            .collect::<Vec<_>>()
            .join("\n---\n")
    };

    prompts::NEWSLETTER_PROMPT
        .replace("{date}", date)
        .replace("{tone}", &writing_style.tone)
        .replace("{structure}", &writing_style.structure)
        .replace("{samples}", &sample_lines)
        .replace("{trends}", &trend_lines)
        .replace("{content}", &content_lines)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn newsletter(sent: bool) -> NewsletterRow {
        NewsletterRow {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            content: "body".to_string(),
            created_at: Utc::now(),
            sent_at: sent.then(Utc::now),
        }
    }

    fn feedback(rating: &str) -> FeedbackRow {
        FeedbackRow {
            id: Uuid::new_v4(),
            newsletter_id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            rating: rating.to_string(),
            comment: None,
            created_at: Utc::now(),
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
    fn test_compute_stats_counts_sent_and_drafts() {
        let newsletters = vec![newsletter(true), newsletter(true), newsletter(false)];
        let feedback = vec![feedback("positive"), feedback("positive"), feedback("negative")];
        let stats = compute_stats(&newsletters, &feedback);
        assert_eq!(
            stats,
            NewsletterStats {
                total: 3,
                sent: 2,
                drafts: 1,
                positive_feedback: 2,
                negative_feedback: 1,
                open_rate: 0,
                click_rate: 0,
            }
        );
    }

    #[test]
    fn test_compute_stats_empty() {
        let stats = compute_stats(&[], &[]);
        assert_eq!(stats.total, 0);
        assert_eq!(stats.sent, 0);
        assert_eq!(stats.drafts, 0);
    }

    #[test]
    fn test_prompt_caps_trends_and_content() {
        let style = WritingStyle {
            samples: Vec::new(),
            tone: "casual".to_string(),
            structure: "listicle".to_string(),
        };
        let items: Vec<_> = (0..8).map(|i| item(&format!("T{i}"), "body")).collect();
        let prompt = build_newsletter_prompt("Monday, January 5, 2026", &style, &[], &items);
        assert!(prompt.contains("T4"));
        assert!(!prompt.contains("T5"));
        assert!(prompt.contains("(no trends available)"));
        assert!(prompt.contains("Tone: casual"));
    }

    #[test]
    fn test_prompt_truncates_long_content_safely() {
        let style = WritingStyle {
            samples: Vec::new(),
            tone: "t".to_string(),
            structure: "s".to_string(),
        };
        let long_body = "é".repeat(500);
        let prompt =
            build_newsletter_prompt("d", &style, &[], &[item("Title", &long_body)]);
        assert!(!prompt.contains(&long_body));
    }

    #[test]
    fn test_local_date_line_bad_timezone_falls_back() {
        // Should not panic, and should still render a date
        let line = local_date_line("Not/AZone");
        assert!(line.contains(','));
    }
}
