//! Staff record handlers

use super::caller::CurrentCaller;
use super::error::ApiResult;
use super::extract::{ApiJson, ApiQuery};
use crate::app::AppState;
use crate::config::DEFAULT_RECORD_PAGE_SIZE;
use crate::database::{
    CreateStaffRecordRequest, RecordCategory, RecordPriority, StaffRecordDetail, StaffRecordStats,
    UpdateStaffRecordRequest,
};
use crate::pagination::{Page, PageRequest};
use crate::services::staff_records::parse_statuses;
use crate::services::RecordQuery;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordListQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub category: Option<RecordCategory>,
    /// One status or a comma-separated list
    pub status: Option<String>,
    pub priority: Option<RecordPriority>,
    pub my_records: Option<bool>,
    pub hospital_id: Option<String>,
}

/// GET /api/staff-records
pub async fn list_records(
    State(state): State<AppState>,
    CurrentCaller(caller): CurrentCaller,
    ApiQuery(query): ApiQuery<RecordListQuery>,
) -> ApiResult<Json<Page<StaffRecordDetail>>> {
    let page = PageRequest::new(query.page, query.limit, DEFAULT_RECORD_PAGE_SIZE);
    let filters = RecordQuery {
        statuses: parse_statuses(query.status.as_deref())?,
        hospital_id: query.hospital_id,
        category: query.category,
        priority: query.priority,
        mine: query.my_records.unwrap_or(false),
    };
    let records = state
        .staff_records_service
        .list_records(&caller, filters, page)
        .await?;
    Ok(Json(records))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsQuery {
    pub hospital_id: Option<String>,
}

/// GET /api/staff-records/stats
pub async fn get_stats(
    State(state): State<AppState>,
    CurrentCaller(caller): CurrentCaller,
    ApiQuery(query): ApiQuery<StatsQuery>,
) -> ApiResult<Json<StaffRecordStats>> {
    let stats = state
        .staff_records_service
        .stats(&caller, query.hospital_id.as_deref())
        .await?;
    Ok(Json(stats))
}

/// GET /api/staff-records/:id
pub async fn get_record(
    State(state): State<AppState>,
    CurrentCaller(caller): CurrentCaller,
    Path(id): Path<String>,
) -> ApiResult<Json<StaffRecordDetail>> {
    Ok(Json(
        state.staff_records_service.get_record(&caller, &id).await?,
    ))
}

/// POST /api/staff-records
pub async fn create_record(
    State(state): State<AppState>,
    CurrentCaller(caller): CurrentCaller,
    ApiJson(request): ApiJson<CreateStaffRecordRequest>,
) -> ApiResult<(StatusCode, Json<StaffRecordDetail>)> {
    let record = state
        .staff_records_service
        .create_record(&caller, request)
        .await?;
    Ok((StatusCode::CREATED, Json(record)))
}

/// PUT /api/staff-records/:id
pub async fn update_record(
    State(state): State<AppState>,
    CurrentCaller(caller): CurrentCaller,
    Path(id): Path<String>,
    ApiJson(request): ApiJson<UpdateStaffRecordRequest>,
) -> ApiResult<Json<StaffRecordDetail>> {
    Ok(Json(
        state
            .staff_records_service
            .update_record(&caller, &id, request)
            .await?,
    ))
}

/// DELETE /api/staff-records/:id
pub async fn delete_record(
    State(state): State<AppState>,
    CurrentCaller(caller): CurrentCaller,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    state
        .staff_records_service
        .delete_record(&caller, &id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
