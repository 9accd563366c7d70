//! Resource handlers: index, list feed, create/edit forms and submissions, delete.

use crate::error::{AppError, InvalidInput};
use crate::model::{DatabaseEntry, FormPostEntry, Resource, ValidationMode};
use crate::response::{DataTableResponse, EditPost, EditView, ListView, ResourceIndex};
use crate::service::{apply_input_transformers, row_id, transform_database_results, InputValidator};
use crate::state::AppState;
use axum::{
    extract::{Path, Query, State},
    Form, Json,
};
use std::collections::HashMap;
use std::sync::Arc;

/// Shown to users when the data store rejects a save; the cause is only logged.
const SAVE_FAILED: &str = "could not save the record, see server log for details";
const DELETE_FAILED: &str = "could not delete the record, see server log for details";

fn lookup(state: &AppState, name: &str) -> Result<Arc<Resource>, AppError> {
    state
        .registry
        .resource(name)
        .cloned()
        .ok_or_else(|| AppError::NotFound(format!("resource {}", name)))
}

/// Split a `/` delimited path into one key value per key column. Each segment must
/// parse as its column's type, so a malformed id is rejected as user input.
fn split_ids(resource: &Resource, ids: &str) -> Result<Vec<String>, AppError> {
    let keys: Vec<String> = ids.split('/').map(str::to_string).collect();
    let primary_keys = resource.primary_keys();
    if primary_keys.is_empty() {
        return Err(AppError::BadRequest(format!("{} has no key columns", resource.table_name())));
    }
    if keys.len() != primary_keys.len() {
        return Err(AppError::BadRequest(format!(
            "expected {} key values, got {}",
            primary_keys.len(),
            keys.len()
        )));
    }
    for (column, raw) in primary_keys.iter().zip(&keys) {
        if column.column_type.parse(&column.name, raw).map_err(InvalidInput::from)?.is_null() {
            return Err(InvalidInput::MissingKeyColumn(column.name.clone()).into());
        }
    }
    Ok(keys)
}

/// Invalid path keys on a submission are reported like any other rejected input.
fn rejected(e: AppError) -> Result<Json<EditPost>, AppError> {
    match e {
        AppError::InvalidInput(reason) => Ok(Json(EditPost::failed(reason.to_string()))),
        other => Err(other),
    }
}

/// Validate, transform and persist one submission.
async fn save(resource: &Resource, entry: &mut FormPostEntry, mode: ValidationMode) -> EditPost {
    if let Err(e) = InputValidator::validate(entry, resource, mode) {
        tracing::debug!(table = %resource.table_name(), reason = %e, "submission rejected");
        return EditPost::failed(e.to_string());
    }
    apply_input_transformers(entry);
    let result = match mode {
        ValidationMode::Create => resource.dao().insert(entry).await,
        ValidationMode::Edit => resource.dao().update(entry).await,
    };
    match result {
        Ok(()) => EditPost::ok(),
        Err(e) => {
            tracing::error!(table = %resource.table_name(), error = %e, "save failed");
            EditPost::failed(SAVE_FAILED)
        }
    }
}

pub async fn index(State(state): State<AppState>) -> Json<ResourceIndex> {
    Json(ResourceIndex {
        resources: state.registry.names().into_iter().map(str::to_string).collect(),
    })
}

pub async fn list_view(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<ListView>, AppError> {
    let resource = lookup(&state, &name)?;
    Ok(Json(ListView {
        resource: resource.table_name().to_string(),
        headers: resource.index_columns().to_vec(),
        primary_keys: resource.primary_keys().iter().map(|c| c.name.clone()).collect(),
        per_page: resource.per_page(),
    }))
}

/// DataTables server-side feed. Reads `draw`, `start`, `length`, `order[0][column]`
/// (an index into the list columns) and `order[0][dir]`.
pub async fn list_json(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<DataTableResponse>, AppError> {
    let resource = lookup(&state, &name)?;
    let number = |key: &str| params.get(key).and_then(|v| v.trim().parse::<i64>().ok());

    let draw = number("draw").unwrap_or(0).max(0) as u64;
    let start = number("start").unwrap_or(0).max(0) as u64;
    let length = match number("length") {
        Some(n) if n > 0 => n as u64,
        _ => resource.per_page() as u64,
    };
    let order_index = number("order[0][column]").unwrap_or(0);
    let sort_column = usize::try_from(order_index)
        .ok()
        .and_then(|i| resource.index_columns().get(i))
        .ok_or_else(|| AppError::BadRequest(format!("invalid sort column {}", order_index)))?;
    let ascending = !params
        .get("order[0][dir]")
        .is_some_and(|d| d.eq_ignore_ascii_case("desc"));

    let total = resource.dao().count().await?;
    let rows = resource
        .dao()
        .select_multiple(start, length, sort_column, ascending)
        .await?;
    Ok(Json(DataTableResponse {
        draw,
        records_total: total,
        records_filtered: total,
        data: transform_database_results(&resource, &rows),
    }))
}

pub async fn create_view(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<EditView>, AppError> {
    let resource = lookup(&state, &name)?;
    Ok(Json(EditView {
        resource: resource.table_name().to_string(),
        create: true,
        row_id: None,
        object: DatabaseEntry::new(),
        form: resource.form_layout().to_vec(),
    }))
}

pub async fn create_post(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Form(params): Form<Vec<(String, String)>>,
) -> Result<Json<EditPost>, AppError> {
    let resource = lookup(&state, &name)?;
    let mut entry = FormPostEntry::extract(&resource, &params);
    Ok(Json(save(&resource, &mut entry, ValidationMode::Create).await))
}

pub async fn edit_view(
    State(state): State<AppState>,
    Path((name, ids)): Path<(String, String)>,
) -> Result<Json<EditView>, AppError> {
    let resource = lookup(&state, &name)?;
    let keys = split_ids(&resource, &ids)?;
    let row = resource
        .dao()
        .select_one(&keys)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("{} {}", resource.table_name(), ids)))?;
    Ok(Json(EditView {
        resource: resource.table_name().to_string(),
        create: false,
        row_id: Some(row_id(&resource, &row)),
        object: row,
        form: resource.form_layout().to_vec(),
    }))
}

/// Key values come from the path and override any submitted for key columns.
pub async fn edit_post(
    State(state): State<AppState>,
    Path((name, ids)): Path<(String, String)>,
    Form(params): Form<Vec<(String, String)>>,
) -> Result<Json<EditPost>, AppError> {
    let resource = lookup(&state, &name)?;
    let keys = match split_ids(&resource, &ids) {
        Ok(keys) => keys,
        Err(e) => return rejected(e),
    };
    let mut entry = FormPostEntry::extract(&resource, &params);
    for (column, value) in resource.primary_keys().into_iter().zip(keys) {
        entry.add_key_value(column.clone(), value);
    }
    Ok(Json(save(&resource, &mut entry, ValidationMode::Edit).await))
}

pub async fn delete_post(
    State(state): State<AppState>,
    Path((name, ids)): Path<(String, String)>,
) -> Result<Json<EditPost>, AppError> {
    let resource = lookup(&state, &name)?;
    let keys = match split_ids(&resource, &ids) {
        Ok(keys) => keys,
        Err(e) => return rejected(e),
    };
    match resource.dao().delete(&keys).await {
        Ok(()) => Ok(Json(EditPost::ok())),
        Err(e) => {
            tracing::error!(table = %resource.table_name(), error = %e, "delete failed");
            Ok(Json(EditPost::failed(DELETE_FAILED)))
        }
    }
}
