//! Export service
//!
//! Builds export documents (branding, column headers and string rows) for
//! a daily checklist or a creation-date range. Rendering to bytes goes
//! through an [`ExportFormatter`]; CSV ships here, other formats plug in
//! from outside.

use super::checklist::{ChecklistRow, ChecklistService};
use super::hospitals::HospitalsService;
use super::reports::{ReportRow, ReportsService};
use super::tenant::{normalize_requested, Caller, TenantResolver};
use crate::database::HospitalBranding;
use crate::dates;
use crate::error::{AppError, Result};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S UTC";

const DAILY_COLUMNS: [&str; 8] = [
    "Hospital",
    "Task ID",
    "Area",
    "Task Name",
    "Description",
    "Status",
    "Staff Name",
    "Timestamp",
];

const RANGE_COLUMNS: [&str; 10] = [
    "Hospital",
    "Date",
    "Task ID",
    "Area",
    "Task Name",
    "Description",
    "Status",
    "Staff Name",
    "Created At",
    "Completed At",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Csv,
    Pdf,
    Docx,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Pdf => "pdf",
            ExportFormat::Docx => "docx",
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "text/csv",
            ExportFormat::Pdf => "application/pdf",
            ExportFormat::Docx => {
                "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
            }
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for ExportFormat {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "csv" => Ok(ExportFormat::Csv),
            "pdf" => Ok(ExportFormat::Pdf),
            "docx" => Ok(ExportFormat::Docx),
            other => Err(AppError::InvalidInput(format!("Unsupported export format: {}", other))),
        }
    }
}

/// Everything a formatter needs to render one export
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportDocument {
    pub filename: String,
    pub format: ExportFormat,
    pub content_type: &'static str,
    pub title: String,
    /// "Date: ..." or "Date Range: ... - ..."
    pub period: String,
    pub branding: HospitalBranding,
    pub columns: Vec<&'static str>,
    pub rows: Vec<Vec<String>>,
}

/// Renders an export document to bytes
pub trait ExportFormatter: Send + Sync {
    fn format(&self) -> ExportFormat;

    fn render(&self, document: &ExportDocument) -> Result<Vec<u8>>;
}

/// RFC 4180 CSV: header row, then one line per row
#[derive(Debug, Clone, Copy, Default)]
pub struct CsvFormatter;

impl ExportFormatter for CsvFormatter {
    fn format(&self) -> ExportFormat {
        ExportFormat::Csv
    }

    fn render(&self, document: &ExportDocument) -> Result<Vec<u8>> {
        let mut out = String::new();
        push_csv_line(&mut out, document.columns.iter().copied());
        for row in &document.rows {
            push_csv_line(&mut out, row.iter().map(String::as_str));
        }
        Ok(out.into_bytes())
    }
}

fn push_csv_line<'a>(out: &mut String, fields: impl Iterator<Item = &'a str>) {
    for (i, field) in fields.enumerate() {
        if i > 0 {
            out.push(',');
        }
        if field.contains([',', '"', '\n', '\r']) {
            out.push('"');
            out.push_str(&field.replace('"', "\"\""));
            out.push('"');
        } else {
            out.push_str(field);
        }
    }
    out.push_str("\r\n");
}

/// Hospital code made safe for a filename
pub fn sanitize_code(code: &str) -> String {
    code.chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect()
}

pub fn daily_filename(code: &str, date: NaiveDate, format: ExportFormat) -> String {
    format!("checklist_{}_{}.{}", sanitize_code(code), date, format.extension())
}

pub fn range_filename(code: &str, start: NaiveDate, end: NaiveDate, format: ExportFormat) -> String {
    format!(
        "checklist_{}_{}_to_{}.{}",
        sanitize_code(code),
        start,
        end,
        format.extension()
    )
}

fn timestamp(instant: Option<DateTime<Utc>>) -> String {
    instant
        .map(|t| t.format(TIMESTAMP_FORMAT).to_string())
        .unwrap_or_default()
}

fn yes_no(status: bool) -> String {
    let label = if status { "Yes" } else { "No" };
    label.to_string()
}

/// `fallback` labels rows whose task has no hospital
fn daily_row(fallback: &str, row: &ChecklistRow) -> Vec<String> {
    let task = &row.task.task;
    let entry = row.entry.as_ref();
    vec![
        row.task.hospital_name.as_deref().unwrap_or(fallback).to_string(),
        task.task_code.clone(),
        row.task.area_name.clone(),
        task.name.clone(),
        task.description.clone(),
        yes_no(row.is_completed()),
        entry.map(|e| e.staff_name.clone()).unwrap_or_default(),
        timestamp(entry.and_then(|e| e.completed_at)),
    ]
}

fn range_row(fallback: &str, row: &ReportRow) -> Vec<String> {
    let hospital = if row.hospital.is_empty() { fallback } else { &row.hospital };
    vec![
        hospital.to_string(),
        row.date.to_string(),
        row.task_id.clone(),
        row.area.clone(),
        row.task_name.clone(),
        row.description.clone(),
        yes_no(row.status),
        row.staff_name.clone(),
        timestamp(Some(row.created_at)),
        timestamp(row.completed_at),
    ]
}

/// Service producing export documents
#[derive(Clone)]
pub struct ExportsService {
    checklist: ChecklistService,
    reports: ReportsService,
    hospitals: HospitalsService,
    tenant: TenantResolver,
    formatters: Vec<Arc<dyn ExportFormatter>>,
}

impl ExportsService {
    pub fn new(
        checklist: ChecklistService,
        reports: ReportsService,
        hospitals: HospitalsService,
        tenant: TenantResolver,
    ) -> Self {
        Self {
            checklist,
            reports,
            hospitals,
            tenant,
            formatters: vec![Arc::new(CsvFormatter)],
        }
    }

    /// Register a formatter, replacing any existing one for its format
    pub fn with_formatter(mut self, formatter: Arc<dyn ExportFormatter>) -> Self {
        self.formatters.retain(|f| f.format() != formatter.format());
        self.formatters.push(formatter);
        self
    }

    pub fn formatter(&self, format: ExportFormat) -> Option<Arc<dyn ExportFormatter>> {
        self.formatters.iter().find(|f| f.format() == format).cloned()
    }

    /// The daily checklist of `date` as an export document
    pub async fn daily_export(
        &self,
        caller: &Caller,
        date: &str,
        area_id: Option<&str>,
        hospital_id: Option<&str>,
        format: ExportFormat,
    ) -> Result<ExportDocument> {
        let date = dates::parse_day(date)?;
        let scope = self.tenant.read_scope(caller, hospital_id).await?;

        let rows = self
            .checklist
            .reconcile(date, &scope, normalize_requested(area_id))
            .await?;
        if rows.is_empty() {
            return Err(AppError::NoData("No data available for export".into()));
        }

        let branding = self.hospitals.branding(scope.hospital_id()).await?;
        tracing::info!(
            "Exporting checklist for {} ({} rows, {}) for {}",
            date,
            rows.len(),
            format,
            caller.user_id
        );

        Ok(ExportDocument {
            filename: daily_filename(&branding.code, date, format),
            format,
            content_type: format.content_type(),
            title: "Daily Checklist Report".into(),
            period: format!("Date: {}", date.format("%A, %B %-d, %Y")),
            columns: DAILY_COLUMNS.to_vec(),
            rows: rows.iter().map(|r| daily_row(&branding.name, r)).collect(),
            branding,
        })
    }

    /// Entries recorded between `start` and `end` as an export document
    pub async fn range_export(
        &self,
        caller: &Caller,
        start: &str,
        end: &str,
        area_id: Option<&str>,
        hospital_id: Option<&str>,
        format: ExportFormat,
    ) -> Result<ExportDocument> {
        let start = dates::parse_day(start)?;
        let end = dates::parse_day(end)?;
        let scope = self.tenant.read_scope(caller, hospital_id).await?;

        let rows = self
            .reports
            .entries_by_creation_range(start, end, &scope, normalize_requested(area_id))
            .await?;
        if rows.is_empty() {
            return Err(AppError::NoData(
                "No data available for export in this date range".into(),
            ));
        }

        let branding = self.hospitals.branding(scope.hospital_id()).await?;
        tracing::info!(
            "Exporting range {}..{} ({} rows, {}) for {}",
            start,
            end,
            rows.len(),
            format,
            caller.user_id
        );

        Ok(ExportDocument {
            filename: range_filename(&branding.code, start, end, format),
            format,
            content_type: format.content_type(),
            title: "Daily Checklist Report".into(),
            period: format!(
                "Date Range: {} - {}",
                start.format("%b %-d, %Y"),
                end.format("%b %-d, %Y")
            ),
            columns: RANGE_COLUMNS.to_vec(),
            rows: rows.iter().map(|r| range_row(&branding.name, r)).collect(),
            branding,
        })
    }
}
