pub mod health;

use axum::{
    routing::{delete, get, post, put},
    Router,
};

use crate::auth;
use crate::content::handlers as source_handlers;
use crate::feedback;
use crate::newsletter::handlers as newsletter_handlers;
use crate::state::AppState;
use crate::style::handlers as sample_handlers;
use crate::trends::handlers as trend_handlers;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Auth
        .route("/api/auth/signup", post(auth::handle_signup))
        .route("/api/auth/signin", post(auth::handle_signin))
        .route("/api/auth/signout", post(auth::handle_signout))
        .route("/api/auth/me", get(auth::handle_me))
        // Sources
        .route("/api/sources", get(source_handlers::handle_list_sources))
        .route("/api/sources", post(source_handlers::handle_create_source))
        .route("/api/sources/:id", put(source_handlers::handle_update_source))
        .route(
            "/api/sources/:id",
            delete(source_handlers::handle_delete_source),
        )
        // Trends
        .route("/api/trends", get(trend_handlers::handle_list_trends))
        .route("/api/trends/latest", get(trend_handlers::handle_latest_trends))
        .route("/api/trends/fetch", post(trend_handlers::handle_fetch_trends))
        // Newsletters
        .route(
            "/api/newsletters",
            get(newsletter_handlers::handle_list_newsletters),
        )
        .route(
            "/api/newsletters/stats",
            get(newsletter_handlers::handle_newsletter_stats),
        )
        .route(
            "/api/newsletters/generate",
            post(newsletter_handlers::handle_generate_newsletter),
        )
        .route(
            "/api/newsletters/:id",
            get(newsletter_handlers::handle_get_newsletter),
        )
        .route(
            "/api/newsletters/:id",
            put(newsletter_handlers::handle_update_newsletter),
        )
        .route(
            "/api/newsletters/:id",
            delete(newsletter_handlers::handle_delete_newsletter),
        )
        .route(
            "/api/newsletters/:id/send",
            post(newsletter_handlers::handle_send_newsletter),
        )
        // Feedback
        .route("/api/feedback", post(feedback::handle_create_feedback))
        .route(
            "/api/feedback/newsletter/:newsletter_id",
            get(feedback::handle_list_feedback),
        )
        .route("/api/feedback/:id", put(feedback::handle_update_feedback))
        .route("/api/feedback/:id", delete(feedback::handle_delete_feedback))
        // Writing samples
        .route(
            "/api/writing-samples",
            get(sample_handlers::handle_list_samples),
        )
        .route(
            "/api/writing-samples",
            post(sample_handlers::handle_create_sample),
        )
        .route(
            "/api/writing-samples/:id",
            delete(sample_handlers::handle_delete_sample),
        )
        .with_state(state)
}
