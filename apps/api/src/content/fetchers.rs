//! Per-kind source fetchers.
//!
//! Contract: given a source descriptor, return a bounded list of normalized
//! content items. Network failures, malformed feeds, and missing channels are
//! the caller's problem to degrade — fetchers return `Err`, the aggregator
//! logs and continues with the next source. No retries here.

use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Utc};
use feed_rs::parser;
use reqwest::Client;
use serde_json::json;

use crate::models::content::NewContentItem;
use crate::models::source::{SourceKind, SourceRow};

/// Social profiles cap at 20 items per fetch; video channels and generic
/// feeds at 10, matching the upstream page sizes.
const SOCIAL_ITEM_LIMIT: usize = 20;
const VIDEO_ITEM_LIMIT: usize = 10;
const FEED_ITEM_LIMIT: usize = 10;

/// Fetches content for one source, dispatching on its kind.
pub async fn fetch_for_source(client: &Client, source: &SourceRow) -> Result<Vec<NewContentItem>> {
    let kind = SourceKind::parse(&source.kind)
        .ok_or_else(|| anyhow!("unknown source kind '{}'", source.kind))?;

    match kind {
        SourceKind::Social => fetch_social(client, &source.handle).await,
        SourceKind::Video => {
            let channel_id = video_channel_id(&source.handle, source.url.as_deref());
            fetch_video(client, &channel_id).await
        }
        SourceKind::Feed => {
            let url = source.url.as_deref().unwrap_or(&source.handle);
            fetch_feed(client, url).await
        }
    }
}

/// Social: resolve the handle to the profile's RSS feed and treat entries as
/// post-equivalents.
pub async fn fetch_social(client: &Client, handle: &str) -> Result<Vec<NewContentItem>> {
    let url = social_feed_url(handle);
    let fallback_title = format!("Post by @{handle}");
    fetch_and_parse(client, &url, SOCIAL_ITEM_LIMIT, &fallback_title).await
}

/// Video: fetch the channel's upload feed; entries are video-equivalents.
pub async fn fetch_video(client: &Client, channel_id: &str) -> Result<Vec<NewContentItem>> {
    let url = video_feed_url(channel_id);
    fetch_and_parse(client, &url, VIDEO_ITEM_LIMIT, "Untitled video").await
}

/// Generic feed: fetch the URL directly.
pub async fn fetch_feed(client: &Client, url: &str) -> Result<Vec<NewContentItem>> {
    fetch_and_parse(client, url, FEED_ITEM_LIMIT, "Untitled").await
}

pub fn social_feed_url(handle: &str) -> String {
    format!("https://nitter.net/{handle}/rss")
}

pub fn video_feed_url(channel_id: &str) -> String {
    format!("https://www.youtube.com/feeds/videos.xml?channel_id={channel_id}")
}

/// Extracts a channel id from the source's URL (last path segment) when one
/// is configured, otherwise the handle itself is the channel id.
pub fn video_channel_id(handle: &str, url: Option<&str>) -> String {
    match url {
        Some(u) => u
            .trim_end_matches('/')
            .rsplit('/')
            .next()
            .unwrap_or(handle)
            .to_string(),
        None => handle.to_string(),
    }
}

async fn fetch_and_parse(
    client: &Client,
    url: &str,
    limit: usize,
    fallback_title: &str,
) -> Result<Vec<NewContentItem>> {
    let response = client
        .get(url)
        .send()
        .await
        .with_context(|| format!("fetching feed {url}"))?;

    if !response.status().is_success() {
        return Err(anyhow!("feed {url} returned HTTP {}", response.status()));
    }

    let bytes = response.bytes().await.context("reading feed body")?;
    let feed = parser::parse(&bytes[..]).with_context(|| format!("parsing feed {url}"))?;

    let fetched_at = Utc::now();
    Ok(normalize_entries(feed, limit, fallback_title, fetched_at))
}

/// Maps parsed feed entries into content items. Items missing a publish time
/// are stamped with the fetch time so recency windowing always has a value.
fn normalize_entries(
    feed: feed_rs::model::Feed,
    limit: usize,
    fallback_title: &str,
    fetched_at: DateTime<Utc>,
) -> Vec<NewContentItem> {
    feed.entries
        .into_iter()
        .take(limit)
        .filter_map(|entry| {
            let link = entry
                .links
                .first()
                .map(|l| l.href.clone())
                .unwrap_or_default();

            // The upstream guid (falling back to the link) is the dedup key.
            // It must be deterministic for identical upstream input.
            let id = if entry.id.is_empty() {
                link.clone()
            } else {
                entry.id.clone()
            };
            if id.is_empty() {
                return None;
            }

            let title = entry
                .title
                .map(|t| t.content)
                .filter(|t| !t.is_empty())
                .unwrap_or_else(|| fallback_title.to_string());

            let content = entry
                .summary
                .map(|s| s.content)
                .or_else(|| entry.content.and_then(|c| c.body))
                .unwrap_or_default();

            Some(NewContentItem {
                id,
                title,
                content,
                url: link,
                published_at: entry.published.or(entry.updated).unwrap_or(fetched_at),
                engagement: json!({}),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_social_feed_url() {
        assert_eq!(
            social_feed_url("janedoe"),
            "https://nitter.net/janedoe/rss"
        );
    }

    #[test]
    fn test_video_feed_url() {
        assert_eq!(
            video_feed_url("UC123"),
            "https://www.youtube.com/feeds/videos.xml?channel_id=UC123"
        );
    }

    #[test]
    fn test_video_channel_id_from_url_last_segment() {
        assert_eq!(
            video_channel_id("fallback", Some("https://www.youtube.com/channel/UCabc")),
            "UCabc"
        );
        assert_eq!(
            video_channel_id("fallback", Some("https://www.youtube.com/channel/UCabc/")),
            "UCabc"
        );
    }

    #[test]
    fn test_video_channel_id_falls_back_to_handle() {
        assert_eq!(video_channel_id("UCxyz", None), "UCxyz");
    }

    fn parse_fixture(xml: &str) -> feed_rs::model::Feed {
        parser::parse(xml.as_bytes()).expect("fixture parses")
    }

    const RSS_FIXTURE: &str = r#"<?xml version="1.0"?>
<rss version="2.0"><channel><title>Example</title>
<item><guid>item-1</guid><title>First post</title><link>https://example.com/1</link>
<description>Body one</description><pubDate>Mon, 01 Jul 2024 10:00:00 GMT</pubDate></item>
<item><guid>item-2</guid><title>Second post</title><link>https://example.com/2</link>
<description>Body two</description></item>
</channel></rss>"#;

    #[test]
    fn test_normalize_entries_stable_ids() {
        let now = Utc::now();
        let a = normalize_entries(parse_fixture(RSS_FIXTURE), 10, "Untitled", now);
        let b = normalize_entries(parse_fixture(RSS_FIXTURE), 10, "Untitled", now);
        assert_eq!(a.len(), 2);
        assert_eq!(a[0].id, b[0].id);
        assert_eq!(a[1].id, b[1].id);
        assert_ne!(a[0].id, a[1].id);
    }

    #[test]
    fn test_normalize_entries_stamps_missing_publish_time() {
        let now = Utc::now();
        let items = normalize_entries(parse_fixture(RSS_FIXTURE), 10, "Untitled", now);
        // item-2 has no pubDate: stamped with the fetch time
        assert_eq!(items[1].published_at, now);
        // item-1 keeps its upstream publish time
        assert_ne!(items[0].published_at, now);
    }

    #[test]
    fn test_normalize_entries_respects_limit() {
        let now = Utc::now();
        let items = normalize_entries(parse_fixture(RSS_FIXTURE), 1, "Untitled", now);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].title, "First post");
    }
}
