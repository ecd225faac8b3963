//! Database models
//!
//! Rust structs representing database entities. Field names serialize in
//! camelCase so API consumers see `isActive`, `taskId`, `completedAt`, ...

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A hospital: the unit of tenant isolation
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Hospital {
    pub id: String,
    pub name: String,
    /// Unique, uppercase
    pub code: String,
    pub logo_url: Option<String>,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub is_active: bool,
    pub is_default: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Create hospital request
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateHospitalRequest {
    pub name: String,
    pub code: String,
    pub logo_url: Option<String>,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    #[serde(default)]
    pub is_default: bool,
}

/// Update hospital request; `None` leaves a field unchanged
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateHospitalRequest {
    pub name: Option<String>,
    pub code: Option<String>,
    pub logo_url: Option<String>,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub is_active: Option<bool>,
    pub is_default: Option<bool>,
}

/// Hospital identity used to label exports
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HospitalBranding {
    pub id: String,
    pub name: String,
    pub code: String,
    pub logo_url: Option<String>,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
}

impl From<Hospital> for HospitalBranding {
    fn from(h: Hospital) -> Self {
        Self {
            id: h.id,
            name: h.name,
            code: h.code,
            logo_url: h.logo_url,
            address: h.address,
            phone: h.phone,
            email: h.email,
        }
    }
}

/// Caller role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Staff,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Staff => "staff",
        }
    }
}

/// A staff or admin account. Credentials live with the external
/// authentication provider.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub hospital_id: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserRequest {
    pub name: String,
    pub email: String,
    pub role: Role,
    pub hospital_id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub role: Option<Role>,
    pub hospital_id: Option<String>,
    pub is_active: Option<bool>,
}

/// A functional area of a hospital (ward, unit, department)
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Area {
    pub id: String,
    pub name: String,
    /// Unique per hospital, uppercase
    pub code: String,
    pub description: Option<String>,
    pub is_active: bool,
    /// `None` marks a legacy/global area
    pub hospital_id: Option<String>,
    pub created_by: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateAreaRequest {
    pub name: String,
    pub code: String,
    pub description: Option<String>,
    /// Admin-only override; otherwise the caller's hospital is used
    pub hospital_id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateAreaRequest {
    pub name: Option<String>,
    pub code: Option<String>,
    pub description: Option<String>,
    pub is_active: Option<bool>,
    /// Move the area (and its tasks) to another hospital
    pub hospital_id: Option<String>,
}

/// A recurring checklist task
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,
    /// Short human code, unique per hospital (e.g. "ICU1")
    #[serde(rename = "taskId")]
    pub task_code: String,
    pub name: String,
    pub description: String,
    pub area_id: String,
    /// Copied from the owning area by the task write path only
    pub hospital_id: Option<String>,
    pub is_active: bool,
    #[serde(rename = "order")]
    pub sort_order: i64,
    pub created_by: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTaskRequest {
    /// Generated from the area code when omitted
    #[serde(rename = "taskId")]
    pub task_code: Option<String>,
    pub name: String,
    pub description: String,
    pub area_id: String,
    pub order: Option<i64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTaskRequest {
    #[serde(rename = "taskId")]
    pub task_code: Option<String>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub area_id: Option<String>,
    pub is_active: Option<bool>,
    pub order: Option<i64>,
}

/// Task joined with its area and hospital labels
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct TaskDetail {
    #[serde(flatten)]
    #[sqlx(flatten)]
    pub task: Task,
    pub area_name: String,
    pub area_code: String,
    pub area_hospital_id: Option<String>,
    pub hospital_name: Option<String>,
    pub hospital_code: Option<String>,
}

/// One task's completion record for one calendar day
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ChecklistEntry {
    pub id: String,
    pub task_id: String,
    /// The checklist day this entry belongs to
    #[sqlx(rename = "entry_date")]
    pub date: NaiveDate,
    pub status: bool,
    pub staff_name: String,
    pub completed_by: Option<String>,
    pub completed_at: Option<DateTime<Utc>>,
    pub notes: Option<String>,
    pub hospital_id: Option<String>,
    /// When the record was first saved; independent of `date`
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Kind of staff record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
pub enum RecordCategory {
    Observation,
    Incident,
    Maintenance,
    #[default]
    General,
    PatientFeedback,
    SupplyRequest,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
pub enum RecordPriority {
    Low,
    #[default]
    Medium,
    High,
    Urgent,
}

/// Workflow state of a staff record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
pub enum RecordStatus {
    #[default]
    Open,
    InProgress,
    Resolved,
    Closed,
}

impl RecordStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordStatus::Open => "open",
            RecordStatus::InProgress => "in_progress",
            RecordStatus::Resolved => "resolved",
            RecordStatus::Closed => "closed",
        }
    }
}

impl std::str::FromStr for RecordStatus {
    type Err = crate::error::AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "open" => Ok(RecordStatus::Open),
            "in_progress" => Ok(RecordStatus::InProgress),
            "resolved" => Ok(RecordStatus::Resolved),
            "closed" => Ok(RecordStatus::Closed),
            other => Err(crate::error::AppError::InvalidInput(format!(
                "Invalid status: {}",
                other
            ))),
        }
    }
}

/// An observation, incident or request filed by a staff member
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct StaffRecord {
    pub id: String,
    pub title: String,
    pub category: RecordCategory,
    pub description: String,
    pub priority: RecordPriority,
    pub status: RecordStatus,
    pub area_id: Option<String>,
    pub hospital_id: Option<String>,
    pub created_by: String,
    /// Set together with `resolved_at` while the record is resolved
    pub resolved_by: Option<String>,
    pub resolved_at: Option<DateTime<Utc>>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Staff record joined with the names of the people and area it refers to
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct StaffRecordDetail {
    #[serde(flatten)]
    #[sqlx(flatten)]
    pub record: StaffRecord,
    pub created_by_name: Option<String>,
    pub resolved_by_name: Option<String>,
    pub area_name: Option<String>,
    pub area_code: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateStaffRecordRequest {
    pub title: String,
    #[serde(default)]
    pub category: RecordCategory,
    pub description: String,
    pub priority: Option<RecordPriority>,
    pub area_id: Option<String>,
    pub notes: Option<String>,
    /// Admin-only override; otherwise the caller's hospital is used
    pub hospital_id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateStaffRecordRequest {
    pub title: Option<String>,
    pub category: Option<RecordCategory>,
    pub description: Option<String>,
    pub priority: Option<RecordPriority>,
    pub status: Option<RecordStatus>,
    pub notes: Option<String>,
}
