//! Checklist, report and export handlers

use super::caller::CurrentCaller;
use super::error::{ApiError, ApiResult};
use super::extract::{ApiJson, ApiQuery};
use crate::app::AppState;
use crate::database::ChecklistEntry;
use crate::error::AppError;
use crate::services::{
    BulkUpsertResult, ChecklistRow, ChecklistStatistics, EntryInput,
    ExportFormat, Report,
};
use axum::{
    extract::{Path, State},
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChecklistQuery {
    pub date: String,
    pub area_id: Option<String>,
    pub hospital_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ChecklistResponse {
    pub checklist: Vec<ChecklistRow>,
}

/// GET /api/checklist
pub async fn get_checklist(
    State(state): State<AppState>,
    CurrentCaller(caller): CurrentCaller,
    ApiQuery(query): ApiQuery<ChecklistQuery>,
) -> ApiResult<Json<ChecklistResponse>> {
    let checklist = state
        .checklist_service
        .get_checklist(
            &caller,
            &query.date,
            query.area_id.as_deref(),
            query.hospital_id.as_deref(),
        )
        .await?;
    Ok(Json(ChecklistResponse { checklist }))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HospitalQuery {
    pub hospital_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct EntryResponse {
    pub entry: ChecklistEntry,
}

/// PUT /api/checklist/entries/:task_id
pub async fn upsert_entry(
    State(state): State<AppState>,
    CurrentCaller(caller): CurrentCaller,
    Path(task_id): Path<String>,
    ApiQuery(query): ApiQuery<HospitalQuery>,
    ApiJson(input): ApiJson<EntryInput>,
) -> ApiResult<Json<EntryResponse>> {
    let entry = state
        .checklist_service
        .upsert_entry(&caller, &task_id, input, query.hospital_id.as_deref())
        .await?;
    Ok(Json(EntryResponse { entry }))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveChecklistRequest {
    pub date: String,
    /// Decoded item by item so one bad entry cannot reject the batch
    pub entries: Vec<serde_json::Value>,
    pub hospital_id: Option<String>,
}

/// POST /api/checklist/save
pub async fn save_checklist(
    State(state): State<AppState>,
    CurrentCaller(caller): CurrentCaller,
    ApiJson(request): ApiJson<SaveChecklistRequest>,
) -> ApiResult<Json<BulkUpsertResult>> {
    let result = state
        .checklist_service
        .save_checklist_json(
            &caller,
            &request.date,
            request.entries,
            request.hospital_id.as_deref(),
        )
        .await?;
    Ok(Json(result))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatisticsQuery {
    pub date: String,
    pub hospital_id: Option<String>,
}

/// GET /api/checklist/statistics
pub async fn get_statistics(
    State(state): State<AppState>,
    CurrentCaller(caller): CurrentCaller,
    ApiQuery(query): ApiQuery<StatisticsQuery>,
) -> ApiResult<Json<ChecklistStatistics>> {
    let statistics = state
        .checklist_service
        .statistics(&caller, &query.date, query.hospital_id.as_deref())
        .await?;
    Ok(Json(statistics))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportQuery {
    pub start_date: String,
    pub end_date: String,
    pub area_id: Option<String>,
    pub hospital_id: Option<String>,
}

/// GET /api/reports
pub async fn get_report(
    State(state): State<AppState>,
    CurrentCaller(caller): CurrentCaller,
    ApiQuery(query): ApiQuery<ReportQuery>,
) -> ApiResult<Json<Report>> {
    let report = state
        .reports_service
        .get_report(
            &caller,
            &query.start_date,
            &query.end_date,
            query.area_id.as_deref(),
            query.hospital_id.as_deref(),
        )
        .await?;
    Ok(Json(report))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportQuery {
    pub date: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub area_id: Option<String>,
    pub hospital_id: Option<String>,
    pub format: Option<String>,
}

/// GET /api/checklist/export
///
/// A single `date` exports that day's checklist; `startDate` + `endDate`
/// export entries recorded in that range.
pub async fn export_checklist(
    State(state): State<AppState>,
    CurrentCaller(caller): CurrentCaller,
    ApiQuery(query): ApiQuery<ExportQuery>,
) -> ApiResult<Response> {
    let format = match query.format.as_deref() {
        Some(format) => format.parse::<ExportFormat>()?,
        None => ExportFormat::Csv,
    };
    let formatter = state.exports_service.formatter(format).ok_or_else(|| {
        ApiError::NotImplemented(format!("{} export is not available on this server", format))
    })?;

    let area_id = query.area_id.as_deref();
    let hospital_id = query.hospital_id.as_deref();
    let exports = &state.exports_service;

    let document = match (&query.date, &query.start_date, &query.end_date) {
        (Some(date), _, _) => {
            exports
                .daily_export(&caller, date, area_id, hospital_id, format)
                .await?
        }
        (None, Some(start), Some(end)) => {
            exports
                .range_export(&caller, start, end, area_id, hospital_id, format)
                .await?
        }
        _ => {
            return Err(AppError::InvalidInput(
                "Either date or startDate and endDate are required".into(),
            )
            .into())
        }
    };

    let body = formatter.render(&document)?;
    let disposition = format!("attachment; filename=\"{}\"", document.filename);

    Ok((
        [
            (header::CONTENT_TYPE, document.content_type.to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        body,
    )
        .into_response())
}
