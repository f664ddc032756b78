//! Endpoint handlers
//!
//! Thin adapters: decode the request body, hand the canonical parameters to
//! the storage layer or the hub client, and wrap whatever comes back in the
//! response envelope. Filesystem work runs on the blocking pool.

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use log::error;
use serde::Serialize;
use serde_json::{Value, json};
use std::sync::Arc;

use crate::error::handlers::{log_file_error, log_hub_error};
use crate::error::FileOpError;
use crate::protocol::commands::{
    ContentSearchRequest, PathRequest, SearchRequest, TransferRequest, TreeRequest, WriteRequest,
};
use crate::protocol::responses::{ApiResponse, OperationResult};
use crate::server::AppState;
use crate::storage::FileOperations;
use crate::storage::results::{
    ContentSearchResult, DeleteResult, InfoResult, ListResult, MkdirResult, NameSearchResult,
    ReadResult, TransferResult, TreeNode, WriteResult,
};

type Body<T> = Result<Json<T>, JsonRejection>;

/// Unwrap a JSON body, turning a rejection into an error envelope
fn parse<T>(payload: Body<T>) -> Result<T, ApiResponse> {
    payload
        .map(|Json(body)| body)
        .map_err(|rejection| ApiResponse::bad_request("invalid_request", &rejection.body_text()))
}

fn shown(path: &str) -> &str {
    if path.is_empty() { "." } else { path }
}

/// Runs a file operation off the async scheduler and wraps its outcome
async fn run_file_op<T, F, M>(
    state: &AppState,
    operation: &'static str,
    job: F,
    message: M,
) -> ApiResponse
where
    T: Serialize + Send + 'static,
    F: FnOnce(&FileOperations) -> Result<T, FileOpError> + Send + 'static,
    M: FnOnce(&T) -> String,
{
    let files = Arc::clone(&state.files);
    match tokio::task::spawn_blocking(move || job(&files)).await {
        Ok(Ok(value)) => ApiResponse::ok(OperationResult::success_with(message(&value), &value)),
        Ok(Err(err)) => {
            log_file_error(operation, &err);
            ApiResponse::from(&err)
        }
        Err(join_error) => {
            error!("{} did not complete: {}", operation, join_error);
            ApiResponse::internal("operation did not complete")
        }
    }
}

pub async fn health(State(state): State<AppState>) -> ApiResponse {
    ApiResponse::ok(OperationResult::success_with(
        "ok",
        &json!({
            "version": env!("CARGO_PKG_VERSION"),
            "hub_configured": state.hub.is_configured(),
        }),
    ))
}

pub async fn read_file(State(state): State<AppState>, payload: Body<PathRequest>) -> ApiResponse {
    let req = match parse(payload) {
        Ok(req) => req,
        Err(resp) => return resp,
    };
    run_file_op(
        &state,
        "read",
        move |files| files.read(&req.path),
        |r: &ReadResult| format!("Read {} bytes from {}", r.size, r.path),
    )
    .await
}

pub async fn write_file(State(state): State<AppState>, payload: Body<WriteRequest>) -> ApiResponse {
    let req = match parse(payload) {
        Ok(req) => req,
        Err(resp) => return resp,
    };
    run_file_op(
        &state,
        "write",
        move |files| files.write(&req.path, &req.content, req.create_backup),
        |r: &WriteResult| match &r.backup {
            Some(backup) => format!(
                "Wrote {} bytes to {} (backup: {})",
                r.bytes_written, r.path, backup
            ),
            None => format!("Wrote {} bytes to {}", r.bytes_written, r.path),
        },
    )
    .await
}

pub async fn list_directory(
    State(state): State<AppState>,
    payload: Body<PathRequest>,
) -> ApiResponse {
    let req = match parse(payload) {
        Ok(req) => req,
        Err(resp) => return resp,
    };
    run_file_op(
        &state,
        "list",
        move |files| files.list(&req.path),
        |r: &ListResult| format!("Listed {} entries in {}", r.entries.len(), shown(&r.path)),
    )
    .await
}

pub async fn directory_tree(
    State(state): State<AppState>,
    payload: Body<TreeRequest>,
) -> ApiResponse {
    let req = match parse(payload) {
        Ok(req) => req,
        Err(resp) => return resp,
    };
    run_file_op(
        &state,
        "tree",
        move |files| files.tree(&req.path, req.max_depth),
        |r: &TreeNode| format!("Built tree of {} nodes for {}", r.count(), shown(&r.path)),
    )
    .await
}

pub async fn make_directory(
    State(state): State<AppState>,
    payload: Body<PathRequest>,
) -> ApiResponse {
    let req = match parse(payload) {
        Ok(req) => req,
        Err(resp) => return resp,
    };
    run_file_op(
        &state,
        "mkdir",
        move |files| files.mkdir(&req.path),
        |r: &MkdirResult| {
            if r.created {
                format!("Created directory {}", shown(&r.path))
            } else {
                format!("Directory {} already exists", shown(&r.path))
            }
        },
    )
    .await
}

pub async fn delete_path(State(state): State<AppState>, payload: Body<PathRequest>) -> ApiResponse {
    let req = match parse(payload) {
        Ok(req) => req,
        Err(resp) => return resp,
    };
    run_file_op(
        &state,
        "delete",
        move |files| files.delete(&req.path),
        |r: &DeleteResult| format!("Deleted {}", r.path),
    )
    .await
}

pub async fn move_path(
    State(state): State<AppState>,
    payload: Body<TransferRequest>,
) -> ApiResponse {
    let req = match parse(payload) {
        Ok(req) => req,
        Err(resp) => return resp,
    };
    run_file_op(
        &state,
        "move",
        move |files| files.move_path(&req.source, &req.destination),
        |r: &TransferResult| format!("Moved {} to {}", r.source, r.destination),
    )
    .await
}

pub async fn copy_path(
    State(state): State<AppState>,
    payload: Body<TransferRequest>,
) -> ApiResponse {
    let req = match parse(payload) {
        Ok(req) => req,
        Err(resp) => return resp,
    };
    run_file_op(
        &state,
        "copy",
        move |files| files.copy(&req.source, &req.destination, req.overwrite),
        |r: &TransferResult| format!("Copied {} to {}", r.source, r.destination),
    )
    .await
}

pub async fn path_info(State(state): State<AppState>, payload: Body<PathRequest>) -> ApiResponse {
    let req = match parse(payload) {
        Ok(req) => req,
        Err(resp) => return resp,
    };
    run_file_op(
        &state,
        "info",
        move |files| files.info(&req.path),
        |r: &InfoResult| format!("Retrieved info for {}", shown(&r.path)),
    )
    .await
}

pub async fn search_files(
    State(state): State<AppState>,
    payload: Body<SearchRequest>,
) -> ApiResponse {
    let req = match parse(payload) {
        Ok(req) => req,
        Err(resp) => return resp,
    };
    run_file_op(
        &state,
        "search",
        move |files| files.search_files(&req.path, &req.pattern, req.recursive),
        |r: &NameSearchResult| format!("Found {} matching files", r.matches.len()),
    )
    .await
}

pub async fn search_content(
    State(state): State<AppState>,
    payload: Body<ContentSearchRequest>,
) -> ApiResponse {
    let req = match parse(payload) {
        Ok(req) => req,
        Err(resp) => return resp,
    };
    run_file_op(
        &state,
        "search_content",
        move |files| files.search_content(&req.path, &req.pattern, req.extension.as_deref()),
        |r: &ContentSearchResult| {
            format!(
                "Found matches in {} of {} files",
                r.matches.len(),
                r.files_scanned
            )
        },
    )
    .await
}

pub async fn hub_states(State(state): State<AppState>) -> ApiResponse {
    match state.hub.get_states().await {
        Ok(states) => {
            let count = states.as_array().map(Vec::len).unwrap_or(0);
            ApiResponse::ok(OperationResult::success_with(
                format!("Retrieved {} entity states", count),
                &states,
            ))
        }
        Err(err) => {
            log_hub_error("get_states", &err);
            ApiResponse::from(&err)
        }
    }
}

pub async fn hub_state(
    State(state): State<AppState>,
    Path(entity_id): Path<String>,
) -> ApiResponse {
    match state.hub.get_state(&entity_id).await {
        Ok(entity) => ApiResponse::ok(OperationResult::success_with(
            format!("Retrieved state of {}", entity_id),
            &entity,
        )),
        Err(err) => {
            log_hub_error("get_state", &err);
            ApiResponse::from(&err)
        }
    }
}

pub async fn hub_call_service(
    State(state): State<AppState>,
    Path((domain, service)): Path<(String, String)>,
    payload: Body<Value>,
) -> ApiResponse {
    // A bodiless call is a service call without service data.
    let data = match payload {
        Ok(Json(value)) => value,
        Err(JsonRejection::MissingJsonContentType(_)) => Value::Null,
        Err(rejection) => {
            return ApiResponse::bad_request("invalid_request", &rejection.body_text());
        }
    };
    match state.hub.call_service(&domain, &service, data).await {
        Ok(changed) => ApiResponse::ok(OperationResult::success_with(
            format!("Called {}.{}", domain, service),
            &changed,
        )),
        Err(err) => {
            log_hub_error("call_service", &err);
            ApiResponse::from(&err)
        }
    }
}

pub async fn not_found() -> ApiResponse {
    ApiResponse::new(
        axum::http::StatusCode::NOT_FOUND,
        OperationResult::error("not_found", Some("no such endpoint")),
    )
}
