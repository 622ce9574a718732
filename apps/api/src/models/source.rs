use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// The three supported source kinds. The kind determines the fetch strategy
/// (see `content::fetchers`). Stored as lowercase text in the database.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    Social,
    Video,
    Feed,
}

impl SourceKind {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "social" => Some(SourceKind::Social),
            "video" => Some(SourceKind::Video),
            "feed" => Some(SourceKind::Feed),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SourceKind::Social => "social",
            SourceKind::Video => "video",
            SourceKind::Feed => "feed",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct SourceRow {
    pub id: Uuid,
    pub user_id: Uuid,
    /// One of "social" | "video" | "feed" — validated at the API boundary.
    #[serde(rename = "type")]
    pub kind: String,
    pub handle: String,
    pub url: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_known_kinds() {
        assert_eq!(SourceKind::parse("social"), Some(SourceKind::Social));
        assert_eq!(SourceKind::parse("video"), Some(SourceKind::Video));
        assert_eq!(SourceKind::parse("feed"), Some(SourceKind::Feed));
    }

    #[test]
    fn test_parse_rejects_unknown_kind() {
        assert_eq!(SourceKind::parse("twitter"), None);
        assert_eq!(SourceKind::parse(""), None);
        assert_eq!(SourceKind::parse("Social"), None);
    }

    #[test]
    fn test_as_str_round_trips() {
        for kind in [SourceKind::Social, SourceKind::Video, SourceKind::Feed] {
            assert_eq!(SourceKind::parse(kind.as_str()), Some(kind));
        }
    }
}
