pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{delete, get, patch, post},
    Router,
};

use crate::document::handlers as document;
use crate::export::handlers as export;
use crate::layout::handlers as layout;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Document
        .route(
            "/api/v1/document",
            get(document::handle_get_document).put(document::handle_replace_document),
        )
        .route(
            "/api/v1/document/fields/:field",
            patch(document::handle_update_field),
        )
        .route(
            "/api/v1/document/entries/:list",
            post(document::handle_add_entry),
        )
        .route(
            "/api/v1/document/entries/:list/:id",
            patch(document::handle_update_entry).delete(document::handle_remove_entry),
        )
        .route("/api/v1/document/skills", post(document::handle_add_skill))
        .route(
            "/api/v1/document/skills/:id",
            delete(document::handle_remove_skill),
        )
        .route(
            "/api/v1/document/projects/:id/technologies",
            post(document::handle_add_technology),
        )
        .route(
            "/api/v1/document/projects/:id/technologies/:tech_id",
            delete(document::handle_remove_technology),
        )
        .route(
            "/api/v1/document/experience/:id/responsibilities",
            post(document::handle_add_responsibility),
        )
        .route(
            "/api/v1/document/experience/:id/responsibilities/:index",
            delete(document::handle_remove_responsibility),
        )
        .route("/api/v1/document/save", post(document::handle_save_now))
        // Preview
        .route("/api/v1/preview", get(layout::handle_preview))
        // Export
        .route(
            "/api/v1/export",
            get(export::handle_export)
                .post(export::handle_export_capture)
                .layer(DefaultBodyLimit::max(export::MAX_CAPTURE_BYTES)),
        )
        .with_state(state)
}
