//! Background jobs — periodic content refresh, daily newsletter delivery,
//! and weekly retention pruning, all run as spawned tokio loops.

use chrono::{DateTime, Datelike, Duration, NaiveTime, Utc, Weekday};
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::content;
use crate::newsletter;
use crate::state::AppState;
use crate::trends;

const REFRESH_INTERVAL_HOURS: u64 = 6;
const CONTENT_RETENTION_DAYS: i64 = 30;
const TREND_RETENTION_DAYS: i64 = 7;
const CONTENT_PRUNE_HOUR_UTC: u32 = 2;
const TREND_PRUNE_HOUR_UTC: u32 = 3;

/// Spawns all recurring jobs. Each loop owns a clone of the state and runs
/// for the lifetime of the process.
pub fn spawn_background_jobs(state: AppState) {
    let refresh_state = state.clone();
    tokio::spawn(async move {
        let period = std::time::Duration::from_secs(REFRESH_INTERVAL_HOURS * 3600);
        let mut ticker = tokio::time::interval(period);
        // First tick fires immediately; skip it so startup is not a refresh.
        ticker.tick().await;
        loop {
            ticker.tick().await;
            refresh_all_users(&refresh_state).await;
        }
    });

    let send_state = state.clone();
    tokio::spawn(async move {
        let hour = send_state.config.newsletter_send_hour_utc;
        loop {
            tokio::time::sleep(duration_until_next_utc_hour(Utc::now(), hour)).await;
            send_daily_newsletters(&send_state).await;
        }
    });

    let content_prune_state = state.clone();
    tokio::spawn(async move {
        loop {
            tokio::time::sleep(duration_until_next_weekday_hour(
                Utc::now(),
                Weekday::Sun,
                CONTENT_PRUNE_HOUR_UTC,
            ))
            .await;
            match content::prune_old_content(&content_prune_state.db, CONTENT_RETENTION_DAYS).await
            {
                Ok(deleted) => info!(deleted, "pruned old content"),
                Err(e) => error!(error = ?e, "content prune failed"),
            }
        }
    });

    tokio::spawn(async move {
        loop {
            tokio::time::sleep(duration_until_next_weekday_hour(
                Utc::now(),
                Weekday::Sun,
                TREND_PRUNE_HOUR_UTC,
            ))
            .await;
            match trends::prune_old_trends(&state.db, TREND_RETENTION_DAYS).await {
                Ok(deleted) => info!(deleted, "pruned old trends"),
                Err(e) => error!(error = ?e, "trend prune failed"),
            }
        }
    });
}

/// Refreshes content and trends for every user, one at a time. A failing
/// user is logged and skipped; the tally goes out at the end of the batch.
async fn refresh_all_users(state: &AppState) {
    let users = match all_user_ids(state).await {
        Ok(ids) => ids,
        Err(e) => {
            error!(error = ?e, "refresh aborted, could not list users");
            return;
        }
    };

    let mut succeeded = 0usize;
    let mut failed = 0usize;

    for user_id in users {
        let result = async {
            content::fetch_all_user_content(&state.db, &state.http, user_id).await?;
            trends::fetch_trends(&state.db, state.llm.as_ref(), user_id).await?;
            Ok::<_, anyhow::Error>(())
        }
        .await;

        match result {
            Ok(()) => succeeded += 1,
            Err(e) => {
                warn!(user_id = %user_id, error = ?e, "refresh failed for user");
                failed += 1;
            }
        }
    }

    info!(succeeded, failed, "content and trend refresh complete");
}

/// Generates and sends the daily newsletter for every user.
async fn send_daily_newsletters(state: &AppState) {
    let users = match all_user_ids(state).await {
        Ok(ids) => ids,
        Err(e) => {
            error!(error = ?e, "daily send aborted, could not list users");
            return;
        }
    };

    let mut succeeded = 0usize;
    let mut failed = 0usize;

    for user_id in users {
        let result = async {
            let draft =
                newsletter::generate_newsletter(&state.db, state.llm.as_ref(), user_id).await?;
            newsletter::send_newsletter(&state.db, &state.mailer, draft.id, user_id).await?;
            Ok::<_, crate::errors::AppError>(())
        }
        .await;

        match result {
            Ok(()) => succeeded += 1,
            Err(e) => {
                warn!(user_id = %user_id, error = ?e, "daily newsletter failed for user");
                failed += 1;
            }
        }
    }

    info!(succeeded, failed, "daily newsletter run complete");
}

async fn all_user_ids(state: &AppState) -> sqlx::Result<Vec<Uuid>> {
    let rows: Vec<(Uuid,)> = sqlx::query_as("SELECT id FROM users ORDER BY created_at")
        .fetch_all(&state.db)
        .await?;
    Ok(rows.into_iter().map(|(id,)| id).collect())
}

/// Time until the next occurrence of `hour:00:00` UTC, strictly after `now`.
pub fn duration_until_next_utc_hour(now: DateTime<Utc>, hour: u32) -> std::time::Duration {
    let hour = hour % 24;
    let time = NaiveTime::from_hms_opt(hour, 0, 0).unwrap_or(NaiveTime::MIN);
    let mut target = now.date_naive().and_time(time);
    if target <= now.naive_utc() {
        target += Duration::days(1);
    }
    (target - now.naive_utc())
        .to_std()
        .unwrap_or(std::time::Duration::ZERO)
}

/// Time until the next `weekday` at `hour:00:00` UTC, strictly after `now`.
pub fn duration_until_next_weekday_hour(
    now: DateTime<Utc>,
    weekday: Weekday,
    hour: u32,
) -> std::time::Duration {
    let hour = hour % 24;
    let time = NaiveTime::from_hms_opt(hour, 0, 0).unwrap_or(NaiveTime::MIN);
    let days_ahead = (weekday.num_days_from_monday() + 7 - now.weekday().num_days_from_monday()) % 7;
    let mut target = (now.date_naive() + Duration::days(days_ahead as i64)).and_time(time);
    if target <= now.naive_utc() {
        target += Duration::days(7);
    }
    (target - now.naive_utc())
        .to_std()
        .unwrap_or(std::time::Duration::ZERO)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, mo, d, h, mi, s).unwrap()
    }

    #[test]
    fn test_next_hour_later_same_day() {
        // 2026-01-05 06:30 -> 08:00 same day
        let d = duration_until_next_utc_hour(at(2026, 1, 5, 6, 30, 0), 8);
        assert_eq!(d.as_secs(), 90 * 60);
    }

    #[test]
    fn test_next_hour_rolls_to_tomorrow() {
        // 2026-01-05 08:00 exactly -> tomorrow 08:00
        let d = duration_until_next_utc_hour(at(2026, 1, 5, 8, 0, 0), 8);
        assert_eq!(d.as_secs(), 24 * 3600);
    }

    #[test]
    fn test_next_weekday_hour_upcoming_sunday() {
        // 2026-01-05 is a Monday; next Sunday 02:00 is in 6 days minus 10 hours
        let d = duration_until_next_weekday_hour(at(2026, 1, 5, 12, 0, 0), Weekday::Sun, 2);
        assert_eq!(d.as_secs(), (6 * 24 - 10) * 3600);
    }

    #[test]
    fn test_next_weekday_hour_same_day_past_hour_rolls_a_week() {
        // 2026-01-04 is a Sunday; 03:00 already passed at 04:00
        let d = duration_until_next_weekday_hour(at(2026, 1, 4, 4, 0, 0), Weekday::Sun, 3);
        assert_eq!(d.as_secs(), (7 * 24 - 1) * 3600);
    }

    #[test]
    fn test_next_weekday_hour_same_day_before_hour() {
        // 2026-01-04 is a Sunday; 01:00 is before the 02:00 slot
        let d = duration_until_next_weekday_hour(at(2026, 1, 4, 1, 0, 0), Weekday::Sun, 2);
        assert_eq!(d.as_secs(), 3600);
    }
}
