//! Area handlers

use super::caller::CurrentCaller;
use super::error::ApiResult;
use super::extract::{ApiJson, ApiQuery};
use super::ListQuery;
use crate::app::AppState;
use crate::config::DEFAULT_PAGE_SIZE;
use crate::database::{Area, CreateAreaRequest, TaskDetail, UpdateAreaRequest};
use crate::pagination::Page;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

/// GET /api/areas
pub async fn list_areas(
    State(state): State<AppState>,
    CurrentCaller(caller): CurrentCaller,
    ApiQuery(query): ApiQuery<ListQuery>,
) -> ApiResult<Json<Page<Area>>> {
    let page = state
        .areas_service
        .list_areas(
            &caller,
            query.hospital_id.as_deref(),
            query.search.as_deref(),
            query.page_request(DEFAULT_PAGE_SIZE),
        )
        .await?;
    Ok(Json(page))
}

/// GET /api/areas/active
pub async fn list_active_areas(
    State(state): State<AppState>,
    CurrentCaller(caller): CurrentCaller,
    ApiQuery(query): ApiQuery<ListQuery>,
) -> ApiResult<Json<Vec<Area>>> {
    let areas = state
        .areas_service
        .list_active_areas(&caller, query.hospital_id.as_deref())
        .await?;
    Ok(Json(areas))
}

/// GET /api/areas/:id
pub async fn get_area(
    State(state): State<AppState>,
    CurrentCaller(caller): CurrentCaller,
    Path(id): Path<String>,
) -> ApiResult<Json<Area>> {
    Ok(Json(state.areas_service.get_area(&caller, &id).await?))
}

/// GET /api/areas/:id/tasks
pub async fn list_area_tasks(
    State(state): State<AppState>,
    CurrentCaller(caller): CurrentCaller,
    Path(id): Path<String>,
) -> ApiResult<Json<Vec<TaskDetail>>> {
    Ok(Json(state.tasks_service.list_tasks_by_area(&caller, &id).await?))
}

/// POST /api/areas
pub async fn create_area(
    State(state): State<AppState>,
    CurrentCaller(caller): CurrentCaller,
    ApiJson(request): ApiJson<CreateAreaRequest>,
) -> ApiResult<(StatusCode, Json<Area>)> {
    let area = state.areas_service.create_area(&caller, request).await?;
    Ok((StatusCode::CREATED, Json(area)))
}

/// PUT /api/areas/:id
pub async fn update_area(
    State(state): State<AppState>,
    CurrentCaller(caller): CurrentCaller,
    Path(id): Path<String>,
    ApiJson(request): ApiJson<UpdateAreaRequest>,
) -> ApiResult<Json<Area>> {
    Ok(Json(
        state.areas_service.update_area(&caller, &id, request).await?,
    ))
}

/// DELETE /api/areas/:id
pub async fn delete_area(
    State(state): State<AppState>,
    CurrentCaller(caller): CurrentCaller,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    state.areas_service.delete_area(&caller, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/areas/:id/toggle
pub async fn toggle_area(
    State(state): State<AppState>,
    CurrentCaller(caller): CurrentCaller,
    Path(id): Path<String>,
) -> ApiResult<Json<Area>> {
    Ok(Json(state.areas_service.toggle_active(&caller, &id).await?))
}
