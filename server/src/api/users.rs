//! User handlers

use super::caller::CurrentCaller;
use super::error::ApiResult;
use super::extract::{ApiJson, ApiQuery};
use super::ListQuery;
use crate::app::AppState;
use crate::config::DEFAULT_PAGE_SIZE;
use crate::database::{CreateUserRequest, UpdateUserRequest, User};
use crate::pagination::Page;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;

/// GET /api/users
pub async fn list_users(
    State(state): State<AppState>,
    CurrentCaller(caller): CurrentCaller,
    ApiQuery(query): ApiQuery<ListQuery>,
) -> ApiResult<Json<Page<User>>> {
    let page = state
        .users_service
        .list_users(
            &caller,
            query.hospital_id.as_deref(),
            query.search.as_deref(),
            query.page_request(DEFAULT_PAGE_SIZE),
        )
        .await?;
    Ok(Json(page))
}

/// GET /api/users/me
pub async fn get_profile(
    State(state): State<AppState>,
    CurrentCaller(caller): CurrentCaller,
) -> ApiResult<Json<User>> {
    Ok(Json(
        state.users_service.get_user(&caller, &caller.user_id).await?,
    ))
}

#[derive(Debug, Deserialize)]
pub struct ProfileRequest {
    pub name: Option<String>,
    pub email: Option<String>,
}

/// PUT /api/users/me
pub async fn update_profile(
    State(state): State<AppState>,
    CurrentCaller(caller): CurrentCaller,
    ApiJson(request): ApiJson<ProfileRequest>,
) -> ApiResult<Json<User>> {
    Ok(Json(
        state
            .users_service
            .update_profile(&caller, request.name, request.email)
            .await?,
    ))
}

/// GET /api/users/:id
pub async fn get_user(
    State(state): State<AppState>,
    CurrentCaller(caller): CurrentCaller,
    Path(id): Path<String>,
) -> ApiResult<Json<User>> {
    Ok(Json(state.users_service.get_user(&caller, &id).await?))
}

/// POST /api/users
pub async fn create_user(
    State(state): State<AppState>,
    CurrentCaller(caller): CurrentCaller,
    ApiJson(request): ApiJson<CreateUserRequest>,
) -> ApiResult<(StatusCode, Json<User>)> {
    let user = state.users_service.create_user(&caller, request).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

/// PUT /api/users/:id
pub async fn update_user(
    State(state): State<AppState>,
    CurrentCaller(caller): CurrentCaller,
    Path(id): Path<String>,
    ApiJson(request): ApiJson<UpdateUserRequest>,
) -> ApiResult<Json<User>> {
    Ok(Json(
        state.users_service.update_user(&caller, &id, request).await?,
    ))
}

/// DELETE /api/users/:id
pub async fn delete_user(
    State(state): State<AppState>,
    CurrentCaller(caller): CurrentCaller,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    state.users_service.delete_user(&caller, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/users/:id/toggle
pub async fn toggle_user(
    State(state): State<AppState>,
    CurrentCaller(caller): CurrentCaller,
    Path(id): Path<String>,
) -> ApiResult<Json<User>> {
    Ok(Json(state.users_service.toggle_active(&caller, &id).await?))
}
