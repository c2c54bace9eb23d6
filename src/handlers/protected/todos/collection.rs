use axum::{
    body::Bytes,
    extract::{rejection::QueryRejection, Extension, Query, State},
};
use serde::Deserialize;
use std::sync::Arc;

use crate::database::models::{
    CreateTodoRequest, CreateTodoResponse, DeleteTodoRequest, DeleteTodoResponse,
    ReadTodoRequest, ReadTodoResponse, UpdateTodoRequest, UpdateTodoResponse, DEFAULT_PAGE_SIZE,
};
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, RequestContext};
use crate::services::TodoStore;

use super::utils::{decode_body, parse_query_i64};

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    /// Page size, default 5
    pub size: Option<String>,
    /// Keyset cursor: return ids strictly below this one. 0 or absent starts at the newest.
    pub prev_id: Option<String>,
}

/// GET /todos - List TODOs newest first, keyset paginated
pub async fn get(
    State(store): State<Arc<dyn TodoStore>>,
    context: Option<Extension<RequestContext>>,
    query: Result<Query<ListQuery>, QueryRejection>,
) -> ApiResult<ReadTodoResponse> {
    let Query(query) = query.map_err(|rejection| {
        tracing::debug!("Rejecting list query: {}", rejection.body_text());
        ApiError::bad_request(rejection.body_text())
    })?;
    let request = ReadTodoRequest {
        size: parse_query_i64("size", query.size.as_deref(), DEFAULT_PAGE_SIZE)?,
        prev_id: parse_query_i64("prev_id", query.prev_id.as_deref(), 0)?,
    };

    if let Some(Extension(context)) = context {
        tracing::debug!(os = %context.os, "Listing todos {:?}", request);
    }

    let todos = store.read(request.prev_id, request.size).await?;
    Ok(ApiResponse::success(ReadTodoResponse { todos }))
}

/// POST /todos - Create a TODO
pub async fn post(
    State(store): State<Arc<dyn TodoStore>>,
    body: Bytes,
) -> ApiResult<CreateTodoResponse> {
    let request: CreateTodoRequest = decode_body(&body)?;

    if request.subject.is_empty() {
        tracing::debug!("Rejecting create: subject is empty");
        return Err(ApiError::field_error("subject", "must not be empty"));
    }

    let todo = store.create(&request.subject, &request.description).await?;
    Ok(ApiResponse::success(CreateTodoResponse { todo }))
}

/// PUT /todos - Replace subject and description of an existing TODO
pub async fn put(
    State(store): State<Arc<dyn TodoStore>>,
    body: Bytes,
) -> ApiResult<UpdateTodoResponse> {
    let request: UpdateTodoRequest = decode_body(&body)?;

    if request.id == 0 {
        tracing::debug!("Rejecting update: id is missing");
        return Err(ApiError::field_error("id", "must not be zero"));
    }
    if request.subject.is_empty() {
        tracing::debug!("Rejecting update: subject is empty");
        return Err(ApiError::field_error("subject", "must not be empty"));
    }

    // A missing id shares the generic 400 with every other failure here, unlike DELETE
    let todo = store
        .update(request.id, &request.subject, &request.description)
        .await?;
    Ok(ApiResponse::success(UpdateTodoResponse { todo }))
}

/// DELETE /todos - Delete TODOs by id list
pub async fn delete(
    State(store): State<Arc<dyn TodoStore>>,
    body: Bytes,
) -> ApiResult<DeleteTodoResponse> {
    let request: DeleteTodoRequest = decode_body(&body)?;

    store.delete(&request.ids).await.map_err(|err| {
        if err.is_not_found() {
            tracing::debug!("Delete matched none of {:?}", request.ids);
            ApiError::not_found("None of the given TODOs exist")
        } else {
            err.into()
        }
    })?;

    Ok(ApiResponse::success(DeleteTodoResponse {}))
}
