use std::sync::Arc;

use sqlx::PgPool;

use crate::config::Config;
use crate::llm_client::TextGenerator;
use crate::mailer::Mailer;

/// Shared application state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub http: reqwest::Client,
    pub llm: Arc<dyn TextGenerator>,
    pub mailer: Arc<Mailer>,
    pub config: Arc<Config>,
}
