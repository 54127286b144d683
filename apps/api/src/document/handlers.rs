use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;

use crate::document::completeness::CompletionReport;
use crate::document::form::{FieldValue, FormController};
use crate::document::migration::normalize;
use crate::errors::AppError;
use crate::models::document::{Document, ListField, ScalarField};
use crate::state::AppState;

#[derive(Debug, Serialize, Deserialize)]
pub struct DocumentResponse {
    pub document: Document,
    pub completion: CompletionReport,
    pub completion_rounded: u8,
}

impl From<&FormController> for DocumentResponse {
    fn from(form: &FormController) -> Self {
        DocumentResponse {
            document: form.document().clone(),
            completion: form.completion().clone(),
            completion_rounded: form.completion_rounded(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreatedResponse {
    pub id: String,
}

#[derive(Deserialize)]
pub struct ScalarUpdate {
    pub value: String,
}

#[derive(Deserialize)]
pub struct EntryUpdate {
    pub field: String,
    pub value: FieldValue,
}

#[derive(Deserialize)]
pub struct NameRequest {
    pub name: String,
}

fn parse_list(name: &str) -> Result<ListField, AppError> {
    ListField::from_name(name).ok_or_else(|| AppError::Validation(format!("Unknown list '{name}'")))
}

/// GET /api/v1/document
pub async fn handle_get_document(State(state): State<AppState>) -> Json<DocumentResponse> {
    let form = state.editor.lock().await;
    Json(DocumentResponse::from(&*form))
}

/// PUT /api/v1/document
/// Accepts any stored shape, including legacy ones, and normalizes it.
pub async fn handle_replace_document(
    State(state): State<AppState>,
    Json(raw): Json<Value>,
) -> Result<Json<DocumentResponse>, AppError> {
    if !raw.is_object() {
        return Err(AppError::Validation(
            "Document must be a JSON object".to_string(),
        ));
    }
    let document = normalize(&raw);
    let mut form = state.editor.lock().await;
    form.replace_document(document);
    info!("Document replaced");
    Ok(Json(DocumentResponse::from(&*form)))
}

/// PATCH /api/v1/document/fields/:field
pub async fn handle_update_field(
    State(state): State<AppState>,
    Path(field): Path<String>,
    Json(req): Json<ScalarUpdate>,
) -> Result<Json<DocumentResponse>, AppError> {
    let field = ScalarField::from_name(&field)
        .ok_or_else(|| AppError::Validation(format!("Unknown field '{field}'")))?;
    let mut form = state.editor.lock().await;
    form.update_scalar_field(field, req.value);
    Ok(Json(DocumentResponse::from(&*form)))
}

/// POST /api/v1/document/entries/:list
pub async fn handle_add_entry(
    State(state): State<AppState>,
    Path(list): Path<String>,
) -> Result<(StatusCode, Json<CreatedResponse>), AppError> {
    let list = parse_list(&list)?;
    let id = state.editor.lock().await.add_entry(list);
    Ok((StatusCode::CREATED, Json(CreatedResponse { id })))
}

/// PATCH /api/v1/document/entries/:list/:id
pub async fn handle_update_entry(
    State(state): State<AppState>,
    Path((list, id)): Path<(String, String)>,
    Json(req): Json<EntryUpdate>,
) -> Result<Json<DocumentResponse>, AppError> {
    let list = parse_list(&list)?;
    let mut form = state.editor.lock().await;
    if !form.update_entry_field(list, &id, &req.field, req.value)? {
        return Err(AppError::NotFound(format!(
            "No {} entry with id {id}",
            list.as_str()
        )));
    }
    Ok(Json(DocumentResponse::from(&*form)))
}

/// DELETE /api/v1/document/entries/:list/:id
/// Removing an id that is not there succeeds and changes nothing.
pub async fn handle_remove_entry(
    State(state): State<AppState>,
    Path((list, id)): Path<(String, String)>,
) -> Result<StatusCode, AppError> {
    let list = parse_list(&list)?;
    state.editor.lock().await.remove_entry(list, &id);
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/v1/document/skills
pub async fn handle_add_skill(
    State(state): State<AppState>,
    Json(req): Json<NameRequest>,
) -> Result<(StatusCode, Json<CreatedResponse>), AppError> {
    let id = state
        .editor
        .lock()
        .await
        .add_skill(&req.name)
        .ok_or_else(|| AppError::Validation("Skill name must not be blank".to_string()))?;
    Ok((StatusCode::CREATED, Json(CreatedResponse { id })))
}

/// DELETE /api/v1/document/skills/:id
pub async fn handle_remove_skill(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> StatusCode {
    state.editor.lock().await.remove_skill(&id);
    StatusCode::NO_CONTENT
}

/// POST /api/v1/document/projects/:id/technologies
pub async fn handle_add_technology(
    State(state): State<AppState>,
    Path(project_id): Path<String>,
    Json(req): Json<NameRequest>,
) -> Result<(StatusCode, Json<CreatedResponse>), AppError> {
    if req.name.trim().is_empty() {
        return Err(AppError::Validation(
            "Technology name must not be blank".to_string(),
        ));
    }
    let id = state
        .editor
        .lock()
        .await
        .add_technology(&project_id, &req.name)
        .ok_or_else(|| AppError::NotFound(format!("No project with id {project_id}")))?;
    Ok((StatusCode::CREATED, Json(CreatedResponse { id })))
}

/// DELETE /api/v1/document/projects/:id/technologies/:tech_id
pub async fn handle_remove_technology(
    State(state): State<AppState>,
    Path((project_id, tech_id)): Path<(String, String)>,
) -> StatusCode {
    state
        .editor
        .lock()
        .await
        .remove_technology(&project_id, &tech_id);
    StatusCode::NO_CONTENT
}

/// POST /api/v1/document/experience/:id/responsibilities
pub async fn handle_add_responsibility(
    State(state): State<AppState>,
    Path(experience_id): Path<String>,
) -> Result<Json<DocumentResponse>, AppError> {
    let mut form = state.editor.lock().await;
    if !form.add_responsibility(&experience_id) {
        return Err(AppError::NotFound(format!(
            "No experience entry with id {experience_id}"
        )));
    }
    Ok(Json(DocumentResponse::from(&*form)))
}

/// DELETE /api/v1/document/experience/:id/responsibilities/:index
pub async fn handle_remove_responsibility(
    State(state): State<AppState>,
    Path((experience_id, index)): Path<(String, usize)>,
) -> Result<Json<DocumentResponse>, AppError> {
    let mut form = state.editor.lock().await;
    if !form.remove_responsibility(&experience_id, index) {
        return Err(AppError::NotFound(format!(
            "No responsibility {index} on experience entry {experience_id}"
        )));
    }
    Ok(Json(DocumentResponse::from(&*form)))
}

/// POST /api/v1/document/save
pub async fn handle_save_now(State(state): State<AppState>) -> StatusCode {
    state.editor.lock().await.save_now();
    StatusCode::NO_CONTENT
}
