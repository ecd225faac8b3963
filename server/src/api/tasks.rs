//! Task handlers

use super::caller::CurrentCaller;
use super::error::ApiResult;
use super::extract::{ApiJson, ApiQuery};
use super::ListQuery;
use crate::app::AppState;
use crate::config::DEFAULT_TASK_PAGE_SIZE;
use crate::database::{CreateTaskRequest, Task, TaskDetail, UpdateTaskRequest};
use crate::pagination::Page;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

/// GET /api/tasks
pub async fn list_tasks(
    State(state): State<AppState>,
    CurrentCaller(caller): CurrentCaller,
    ApiQuery(query): ApiQuery<ListQuery>,
) -> ApiResult<Json<Page<TaskDetail>>> {
    let page = state
        .tasks_service
        .list_tasks(
            &caller,
            query.hospital_id.as_deref(),
            query.area_id.as_deref(),
            query.search.as_deref(),
            query.page_request(DEFAULT_TASK_PAGE_SIZE),
        )
        .await?;
    Ok(Json(page))
}

/// GET /api/tasks/:id
pub async fn get_task(
    State(state): State<AppState>,
    CurrentCaller(caller): CurrentCaller,
    Path(id): Path<String>,
) -> ApiResult<Json<TaskDetail>> {
    Ok(Json(state.tasks_service.get_task(&caller, &id).await?))
}

/// POST /api/tasks
pub async fn create_task(
    State(state): State<AppState>,
    CurrentCaller(caller): CurrentCaller,
    ApiJson(request): ApiJson<CreateTaskRequest>,
) -> ApiResult<(StatusCode, Json<Task>)> {
    let task = state.tasks_service.create_task(&caller, request).await?;
    Ok((StatusCode::CREATED, Json(task)))
}

/// PUT /api/tasks/:id
pub async fn update_task(
    State(state): State<AppState>,
    CurrentCaller(caller): CurrentCaller,
    Path(id): Path<String>,
    ApiJson(request): ApiJson<UpdateTaskRequest>,
) -> ApiResult<Json<Task>> {
    Ok(Json(
        state.tasks_service.update_task(&caller, &id, request).await?,
    ))
}

/// DELETE /api/tasks/:id
pub async fn delete_task(
    State(state): State<AppState>,
    CurrentCaller(caller): CurrentCaller,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    state.tasks_service.delete_task(&caller, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/tasks/:id/toggle
pub async fn toggle_task(
    State(state): State<AppState>,
    CurrentCaller(caller): CurrentCaller,
    Path(id): Path<String>,
) -> ApiResult<Json<Task>> {
    Ok(Json(state.tasks_service.toggle_active(&caller, &id).await?))
}
