//! Resource CRUD handlers: list, read, create, update, update by id, delete.

use crate::error::AppError;
use crate::extractors::JsonBody;
use crate::response;
use crate::service::{messages, BatchWriter, CrudService};
use crate::state::ResourceState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};

pub async fn list(State(state): State<ResourceState>) -> Result<impl IntoResponse, AppError> {
    let rows = CrudService::list(state.store.as_ref(), &state.resource).await?;
    Ok(response::success(rows, messages::fetched(&state.resource), StatusCode::OK))
}

pub async fn read(State(state): State<ResourceState>, Path(id): Path<String>) -> Result<impl IntoResponse, AppError> {
    let row = CrudService::get(state.store.as_ref(), &state.resource, &id).await?;
    Ok(response::success(row, messages::fetched(&state.resource), StatusCode::OK))
}

pub async fn create(
    State(state): State<ResourceState>,
    JsonBody(body): JsonBody,
) -> Result<impl IntoResponse, AppError> {
    let created = CrudService::create(state.store.as_ref(), &state.resource, body).await?;
    Ok(response::success(
        created.data,
        messages::created(&state.resource, created.batch),
        StatusCode::CREATED,
    ))
}

pub async fn update(
    State(state): State<ResourceState>,
    JsonBody(body): JsonBody,
) -> Result<impl IntoResponse, AppError> {
    let updated = BatchWriter::update(state.store.as_ref(), &state.resource, body).await?;
    let message = match updated.single_key {
        Some(key) => messages::updated_one(&state.resource, key),
        None => messages::updated_many(&state.resource, updated.count),
    };
    Ok(response::success(updated.data, message, StatusCode::OK))
}

pub async fn update_by_id(
    State(state): State<ResourceState>,
    Path(id): Path<String>,
    JsonBody(body): JsonBody,
) -> Result<impl IntoResponse, AppError> {
    let updated = BatchWriter::update_by_id(state.store.as_ref(), &state.resource, &id, body).await?;
    Ok(response::success(
        updated.data,
        messages::updated_one(&state.resource, &id),
        StatusCode::OK,
    ))
}

pub async fn delete(
    State(state): State<ResourceState>,
    JsonBody(body): JsonBody,
) -> Result<impl IntoResponse, AppError> {
    let affected = CrudService::delete(state.store.as_ref(), &state.resource, &body).await?;
    Ok(response::success_message(
        messages::deleted(&state.resource, affected),
        StatusCode::OK,
    ))
}
