use axum::{
    extract::{Query, State},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::layout::renderer::{render, Page, PageLayout, Variant};
use crate::state::AppState;

#[derive(Deserialize)]
pub struct PreviewQuery {
    #[serde(default)]
    pub variant: Variant,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PreviewResponse {
    pub variant: Variant,
    pub page_count: usize,
    #[serde(flatten)]
    pub layout: PageLayout,
    /// The same elements split into page-local coordinates.
    pub pages: Vec<Page>,
}

/// GET /api/v1/preview?variant=live|final
pub async fn handle_preview(
    State(state): State<AppState>,
    Query(params): Query<PreviewQuery>,
) -> Json<PreviewResponse> {
    let document = state.editor.lock().await.document().clone();
    let layout = render(&document, &state.style, params.variant);
    Json(PreviewResponse {
        variant: params.variant,
        page_count: layout.page_count(),
        pages: layout.pages(),
        layout,
    })
}
