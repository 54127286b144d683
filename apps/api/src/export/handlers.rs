use axum::{
    extract::{Multipart, State},
    http::{header, HeaderName, StatusCode},
    response::{IntoResponse, Response},
};
use bytes::Bytes;

use crate::errors::AppError;
use crate::export::paginate::PageGeometry;
use crate::export::{export_capture, export_layout, ExportArtifact};
use crate::layout::renderer::{render, Variant};
use crate::state::AppState;

/// Multipart field carrying the front end's own capture.
pub const CAPTURE_FIELD: &str = "capture";

/// Upper bound on an uploaded capture.
pub const MAX_CAPTURE_BYTES: usize = 25 * 1024 * 1024;

const PAGE_COUNT_HEADER: HeaderName = HeaderName::from_static("x-page-count");

fn busy() -> AppError {
    AppError::Conflict("An export is already in progress".to_string())
}

fn pdf_response(artifact: ExportArtifact) -> Response {
    (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "application/pdf".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", artifact.filename),
            ),
            (PAGE_COUNT_HEADER, artifact.page_count.to_string()),
        ],
        artifact.bytes,
    )
        .into_response()
}

/// GET /api/v1/export
/// Renders the current document and rasterizes it server-side.
pub async fn handle_export(State(state): State<AppState>) -> Result<Response, AppError> {
    let _permit = state.export_gate.try_begin().ok_or_else(busy)?;

    let document = state.editor.lock().await.document().clone();
    let layout = render(&document, &state.style, Variant::Final);
    let artifact = export_layout(
        state.rasterizer.as_ref(),
        &layout,
        PageGeometry::from(&state.style),
        state.config.export_scale,
    )
    .await?;
    Ok(pdf_response(artifact))
}

/// POST /api/v1/export
/// Paginates a PNG/JPEG capture uploaded as multipart field `capture`.
pub async fn handle_export_capture(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Response, AppError> {
    let _permit = state.export_gate.try_begin().ok_or_else(busy)?;

    let mut capture: Option<Bytes> = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Malformed multipart body: {e}")))?
    {
        if field.name() == Some(CAPTURE_FIELD) {
            capture = Some(
                field
                    .bytes()
                    .await
                    .map_err(|e| AppError::Validation(format!("Could not read capture: {e}")))?,
            );
        }
    }
    let capture = capture.ok_or_else(|| {
        AppError::Validation(format!("Missing '{CAPTURE_FIELD}' image field"))
    })?;

    let artifact = export_capture(capture, PageGeometry::from(&state.style)).await?;
    Ok(pdf_response(artifact))
}
