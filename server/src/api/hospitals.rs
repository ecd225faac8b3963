//! Hospital handlers
//!
//! Reads are open to any known caller; writes require the admin role.

use super::caller::CurrentCaller;
use super::error::ApiResult;
use super::extract::{ApiJson, ApiQuery};
use super::ListQuery;
use crate::app::AppState;
use crate::config::DEFAULT_PAGE_SIZE;
use crate::database::{CreateHospitalRequest, Hospital, HospitalBranding, UpdateHospitalRequest};
use crate::pagination::Page;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;

/// GET /api/hospitals
pub async fn list_hospitals(
    State(state): State<AppState>,
    CurrentCaller(caller): CurrentCaller,
    ApiQuery(query): ApiQuery<ListQuery>,
) -> ApiResult<Json<Page<Hospital>>> {
    let include_inactive = caller.is_admin() && query.include_inactive.unwrap_or(false);
    let page = state
        .hospitals_service
        .list_hospitals(
            query.search.as_deref(),
            include_inactive,
            query.page_request(DEFAULT_PAGE_SIZE),
        )
        .await?;
    Ok(Json(page))
}

/// GET /api/hospitals/active
pub async fn list_active_hospitals(
    State(state): State<AppState>,
    CurrentCaller(_caller): CurrentCaller,
) -> ApiResult<Json<Vec<Hospital>>> {
    Ok(Json(state.hospitals_service.list_active_hospitals().await?))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BrandingQuery {
    pub hospital_id: Option<String>,
}

/// GET /api/hospitals/branding
pub async fn get_branding(
    State(state): State<AppState>,
    CurrentCaller(caller): CurrentCaller,
    ApiQuery(query): ApiQuery<BrandingQuery>,
) -> ApiResult<Json<HospitalBranding>> {
    let scope = state
        .tenant
        .read_scope(&caller, query.hospital_id.as_deref())
        .await?;
    let branding = state.hospitals_service.branding(scope.hospital_id()).await?;
    Ok(Json(branding))
}

/// GET /api/hospitals/code/:code
pub async fn get_hospital_by_code(
    State(state): State<AppState>,
    CurrentCaller(_caller): CurrentCaller,
    Path(code): Path<String>,
) -> ApiResult<Json<Hospital>> {
    Ok(Json(state.hospitals_service.get_hospital_by_code(&code).await?))
}

/// GET /api/hospitals/:id
pub async fn get_hospital(
    State(state): State<AppState>,
    CurrentCaller(_caller): CurrentCaller,
    Path(id): Path<String>,
) -> ApiResult<Json<Hospital>> {
    Ok(Json(state.hospitals_service.get_hospital(&id).await?))
}

/// POST /api/hospitals
pub async fn create_hospital(
    State(state): State<AppState>,
    CurrentCaller(caller): CurrentCaller,
    ApiJson(request): ApiJson<CreateHospitalRequest>,
) -> ApiResult<(StatusCode, Json<Hospital>)> {
    caller.require_admin("create hospitals")?;
    let hospital = state.hospitals_service.create_hospital(request).await?;
    Ok((StatusCode::CREATED, Json(hospital)))
}

/// PUT /api/hospitals/:id
pub async fn update_hospital(
    State(state): State<AppState>,
    CurrentCaller(caller): CurrentCaller,
    Path(id): Path<String>,
    ApiJson(request): ApiJson<UpdateHospitalRequest>,
) -> ApiResult<Json<Hospital>> {
    caller.require_admin("update hospitals")?;
    Ok(Json(state.hospitals_service.update_hospital(&id, request).await?))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogoRequest {
    pub logo_url: Option<String>,
}

/// PUT /api/hospitals/:id/logo
pub async fn update_logo(
    State(state): State<AppState>,
    CurrentCaller(caller): CurrentCaller,
    Path(id): Path<String>,
    ApiJson(request): ApiJson<LogoRequest>,
) -> ApiResult<Json<Hospital>> {
    caller.require_admin("update hospital logos")?;
    Ok(Json(
        state
            .hospitals_service
            .update_logo(&id, request.logo_url)
            .await?,
    ))
}

/// DELETE /api/hospitals/:id
pub async fn delete_hospital(
    State(state): State<AppState>,
    CurrentCaller(caller): CurrentCaller,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    caller.require_admin("delete hospitals")?;
    state.hospitals_service.delete_hospital(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/hospitals/:id/toggle
pub async fn toggle_hospital(
    State(state): State<AppState>,
    CurrentCaller(caller): CurrentCaller,
    Path(id): Path<String>,
) -> ApiResult<Json<Hospital>> {
    caller.require_admin("activate or deactivate hospitals")?;
    Ok(Json(state.hospitals_service.toggle_active(&id).await?))
}

/// POST /api/hospitals/:id/default
pub async fn set_default_hospital(
    State(state): State<AppState>,
    CurrentCaller(caller): CurrentCaller,
    Path(id): Path<String>,
) -> ApiResult<Json<Hospital>> {
    caller.require_admin("change the default hospital")?;
    Ok(Json(state.hospitals_service.set_default(&id).await?))
}
