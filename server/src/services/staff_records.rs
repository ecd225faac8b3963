//! Staff records service
//!
//! Observations, incidents and requests filed by staff. Everyone in a
//! hospital reads its records; only the author or an admin changes one.

use super::areas::ensure_visible;
use super::tenant::{Caller, HospitalScope, TenantResolver};
use super::validation;
use crate::config::{MAX_NOTES_LENGTH, MAX_RECORD_DESCRIPTION_LENGTH, MAX_RECORD_TITLE_LENGTH};
use crate::database::{
    CreateStaffRecordRequest, NewStaffRecord, RecordCategory, RecordPriority, RecordStatus,
    Repository, StaffRecord, StaffRecordDetail, StaffRecordFilter, StaffRecordStats,
    UpdateStaffRecordRequest,
};
use crate::error::{AppError, Result};
use crate::pagination::{Page, PageRequest};
use chrono::Utc;

/// Listing filters as requested by the caller
#[derive(Debug, Clone, Default)]
pub struct RecordQuery {
    pub hospital_id: Option<String>,
    pub category: Option<RecordCategory>,
    pub statuses: Vec<RecordStatus>,
    pub priority: Option<RecordPriority>,
    /// Only records filed by the caller
    pub mine: bool,
}

/// Service for staff records
#[derive(Clone)]
pub struct StaffRecordsService {
    repo: Repository,
    tenant: TenantResolver,
}

impl StaffRecordsService {
    pub fn new(repo: Repository, tenant: TenantResolver) -> Self {
        Self { repo, tenant }
    }

    /// File a record in the caller's write hospital
    pub async fn create_record(
        &self,
        caller: &Caller,
        req: CreateStaffRecordRequest,
    ) -> Result<StaffRecordDetail> {
        let title = validation::required("title", &req.title, MAX_RECORD_TITLE_LENGTH)?;
        let description =
            validation::required("description", &req.description, MAX_RECORD_DESCRIPTION_LENGTH)?;
        let notes = validation::optional("notes", req.notes.as_deref(), MAX_NOTES_LENGTH)?;
        let hospital_id = self
            .tenant
            .write_hospital(caller, req.hospital_id.as_deref())
            .await?;

        let area_id = match req.area_id.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            Some(area_id) => {
                let area = self.repo.get_area(area_id).await?;
                ensure_visible(
                    &HospitalScope::Hospital(hospital_id.clone()),
                    area.hospital_id.as_deref(),
                )?;
                Some(area.id)
            }
            None => None,
        };

        let record = self
            .repo
            .create_staff_record(&NewStaffRecord {
                title,
                category: req.category,
                description,
                priority: req.priority.unwrap_or_default(),
                area_id,
                hospital_id: Some(hospital_id),
                created_by: caller.user_id.clone(),
                notes,
            })
            .await?;

        tracing::info!(
            "Staff record {} ({:?}) filed by {}",
            record.record.id,
            record.record.category,
            caller.user_id
        );
        Ok(record)
    }

    pub async fn get_record(&self, caller: &Caller, id: &str) -> Result<StaffRecordDetail> {
        let record = self.repo.get_staff_record(id).await?;
        if !caller.is_admin() {
            let scope = self.tenant.read_scope(caller, None).await?;
            ensure_visible(&scope, record.record.hospital_id.as_deref())?;
        }
        Ok(record)
    }

    /// Newest first
    pub async fn list_records(
        &self,
        caller: &Caller,
        query: RecordQuery,
        page: PageRequest,
    ) -> Result<Page<StaffRecordDetail>> {
        let scope = self
            .tenant
            .read_scope(caller, query.hospital_id.as_deref())
            .await?;
        let filter = StaffRecordFilter {
            hospital_id: scope.hospital_id().map(str::to_string),
            category: query.category,
            statuses: query.statuses,
            priority: query.priority,
            created_by: query.mine.then(|| caller.user_id.clone()),
        };

        let (items, total) = self
            .repo
            .list_staff_records(&filter, page.limit, page.offset())
            .await?;
        Ok(Page::new(items, page, total))
    }

    /// Partial update by the author or an admin. Moving to `resolved`
    /// stamps who resolved it and when; leaving `resolved` clears both.
    pub async fn update_record(
        &self,
        caller: &Caller,
        id: &str,
        req: UpdateStaffRecordRequest,
    ) -> Result<StaffRecordDetail> {
        let mut record = self.get_record(caller, id).await?.record;
        ensure_author(caller, &record, "edit")?;

        if let Some(title) = &req.title {
            record.title = validation::required("title", title, MAX_RECORD_TITLE_LENGTH)?;
        }
        if let Some(description) = &req.description {
            record.description =
                validation::required("description", description, MAX_RECORD_DESCRIPTION_LENGTH)?;
        }
        if let Some(notes) = &req.notes {
            record.notes = validation::optional("notes", Some(notes), MAX_NOTES_LENGTH)?;
        }
        if let Some(category) = req.category {
            record.category = category;
        }
        if let Some(priority) = req.priority {
            record.priority = priority;
        }
        if let Some(status) = req.status {
            apply_status(&mut record, status, caller);
        }

        let updated = self.repo.update_staff_record(&record).await?;

        tracing::debug!(
            "Staff record updated: {} ({})",
            updated.record.id,
            updated.record.status.as_str()
        );
        Ok(updated)
    }

    pub async fn delete_record(&self, caller: &Caller, id: &str) -> Result<()> {
        let record = self.get_record(caller, id).await?.record;
        ensure_author(caller, &record, "delete")?;

        self.repo.delete_staff_record(id).await?;
        tracing::info!("Staff record {} deleted by {}", id, caller.user_id);
        Ok(())
    }

    /// Counts by status and category. Admins count every record in scope,
    /// staff only their own.
    pub async fn stats(&self, caller: &Caller, hospital_id: Option<&str>) -> Result<StaffRecordStats> {
        let scope = self.tenant.read_scope(caller, hospital_id).await?;
        let filter = StaffRecordFilter {
            hospital_id: scope.hospital_id().map(str::to_string),
            created_by: (!caller.is_admin()).then(|| caller.user_id.clone()),
            ..Default::default()
        };
        self.repo.staff_record_stats(&filter).await
    }
}

fn ensure_author(caller: &Caller, record: &StaffRecord, action: &str) -> Result<()> {
    if caller.is_admin() || record.created_by == caller.user_id {
        return Ok(());
    }
    tracing::warn!(
        "User {} tried to {} staff record {} of {}",
        caller.user_id,
        action,
        record.id,
        record.created_by
    );
    Err(AppError::AccessDenied(format!(
        "You can only {} your own records",
        action
    )))
}

fn apply_status(record: &mut StaffRecord, status: RecordStatus, caller: &Caller) {
    match status {
        RecordStatus::Resolved if record.status != RecordStatus::Resolved => {
            record.resolved_by = Some(caller.user_id.clone());
            record.resolved_at = Some(Utc::now());
        }
        RecordStatus::Resolved => {}
        _ => {
            record.resolved_by = None;
            record.resolved_at = None;
        }
    }
    record.status = status;
}

/// Parse a comma-separated status list such as `open,in_progress`
pub fn parse_statuses(raw: Option<&str>) -> Result<Vec<RecordStatus>> {
    raw.map(|raw| {
        raw.split(',')
            .filter(|s| !s.trim().is_empty())
            .map(|s| s.parse::<RecordStatus>())
            .collect()
    })
    .unwrap_or_else(|| Ok(Vec::new()))
}
