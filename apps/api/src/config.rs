use anyhow::{Context, Result};

/// Application configuration loaded from environment variables.
/// Fails at startup if required variables are missing.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    /// Maximum size of the PostgreSQL connection pool.
    pub db_max_connections: u32,
    pub groq_api_key: String,
    pub smtp_host: String,
    pub smtp_user: String,
    pub smtp_pass: String,
    pub email_from: String,
    pub port: u16,
    pub rust_log: String,
    /// UTC hour at which the daily newsletter job fires.
    pub newsletter_send_hour_utc: u32,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            database_url: require_env("DATABASE_URL")?,
            db_max_connections: parse_env("DB_MAX_CONNECTIONS", 10)?,
            groq_api_key: require_env("GROQ_API_KEY")?,
            smtp_host: require_env("SMTP_HOST")?,
            smtp_user: require_env("SMTP_USER")?,
            smtp_pass: require_env("SMTP_PASS")?,
            email_from: require_env("EMAIL_FROM")?,
            port: parse_env("PORT", 8080)?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            newsletter_send_hour_utc: parse_env("NEWSLETTER_SEND_HOUR_UTC", 8)?,
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

/// Parses an optional numeric variable, falling back to `default` when unset.
fn parse_env<T>(key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(value) => value
            .parse::<T>()
            .with_context(|| format!("{key} must be a valid number")),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_env_defaults_when_unset() {
        let value: u32 = parse_env("CREATORPULSE_TEST_UNSET_VAR", 10).unwrap();
        assert_eq!(value, 10);
    }

    #[test]
    fn test_parse_env_reads_override() {
        std::env::set_var("CREATORPULSE_TEST_POOL_SIZE", "25");
        let value: u32 = parse_env("CREATORPULSE_TEST_POOL_SIZE", 10).unwrap();
        assert_eq!(value, 25);
    }

    #[test]
    fn test_parse_env_rejects_garbage() {
        std::env::set_var("CREATORPULSE_TEST_BAD_POOL_SIZE", "lots");
        assert!(parse_env::<u32>("CREATORPULSE_TEST_BAD_POOL_SIZE", 10).is_err());
    }
}
