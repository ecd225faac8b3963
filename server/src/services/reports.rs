//! Reports service
//!
//! Reports select entries by when they were recorded (`created_at`), not
//! by the checklist day they belong to.

use super::checklist::completion_rate;
use super::tenant::{normalize_requested, Caller, HospitalScope, TenantResolver};
use crate::database::{CreatedRangeRecord, Repository};
use crate::dates::{self, DayRange};
use crate::error::Result;
use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use std::collections::{BTreeMap, HashSet};

/// Area label used when an entry's area no longer resolves
pub const UNKNOWN_AREA: &str = "Unknown";

/// One recorded entry with its task, area and hospital labels
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportRow {
    pub entry_id: String,
    /// Checklist day the entry belongs to
    pub date: NaiveDate,
    /// Short task code
    pub task_id: String,
    #[serde(skip)]
    pub area_id: Option<String>,
    pub area: String,
    pub hospital: String,
    pub task_name: String,
    pub description: String,
    pub status: bool,
    pub staff_name: String,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl ReportRow {
    /// `None` when the entry's task has been removed
    fn from_record(record: CreatedRangeRecord) -> Option<Self> {
        record.task_id.as_ref()?;
        Some(Self {
            entry_id: record.entry_id,
            date: record.entry_date,
            task_id: record.task_code.unwrap_or_default(),
            area_id: record.area_id,
            area: record.area_name.unwrap_or_default(),
            hospital: record.hospital_name.unwrap_or_default(),
            task_name: record.task_name.unwrap_or_default(),
            description: record.task_description.unwrap_or_default(),
            status: record.status,
            staff_name: record.staff_name,
            created_at: record.created_at,
            completed_at: record.completed_at,
        })
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct AreaTally {
    pub total: i64,
    pub completed: i64,
}

/// Completion summary over report rows, with a per-area breakdown
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportStatistics {
    pub total: i64,
    pub completed: i64,
    pub pending: i64,
    pub completion_rate: i64,
    pub by_area: BTreeMap<String, AreaTally>,
}

impl ReportStatistics {
    pub fn from_rows(rows: &[ReportRow]) -> Self {
        let mut by_area: BTreeMap<String, AreaTally> = BTreeMap::new();
        for row in rows {
            let name = if row.area.is_empty() {
                UNKNOWN_AREA.to_string()
            } else {
                row.area.clone()
            };
            let tally = by_area.entry(name).or_default();
            tally.total += 1;
            if row.status {
                tally.completed += 1;
            }
        }

        let total = rows.len() as i64;
        let completed = rows.iter().filter(|r| r.status).count() as i64;
        Self {
            total,
            completed,
            pending: total - completed,
            completion_rate: completion_rate(total, completed),
            by_area,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub entries: Vec<ReportRow>,
    pub statistics: ReportStatistics,
}

/// Service for creation-range reports
#[derive(Clone)]
pub struct ReportsService {
    repo: Repository,
    tenant: TenantResolver,
}

impl ReportsService {
    pub fn new(repo: Repository, tenant: TenantResolver) -> Self {
        Self { repo, tenant }
    }

    /// Entries recorded between the start of `start` and the end of `end`,
    /// newest first. Entries whose task is gone are dropped.
    pub async fn entries_by_creation_range(
        &self,
        start: NaiveDate,
        end: NaiveDate,
        scope: &HospitalScope,
        area_id: Option<&str>,
    ) -> Result<Vec<ReportRow>> {
        let range = DayRange::spanning(start, end)?;

        let allowed: Option<HashSet<String>> = match scope {
            HospitalScope::AllHospitals => None,
            HospitalScope::Hospital(hospital_id) => {
                let ids = self.repo.area_ids_for_hospital(hospital_id).await?;
                if ids.is_empty() {
                    return Ok(Vec::new());
                }
                Some(ids.into_iter().collect())
            }
        };

        let records = self.repo.entries_created_within(&range).await?;
        let scanned = records.len();

        let rows: Vec<ReportRow> = records
            .into_iter()
            .filter_map(ReportRow::from_record)
            .filter(|row| match (&allowed, row.area_id.as_deref()) {
                (None, _) => true,
                (Some(allowed), Some(area)) => allowed.contains(area),
                (Some(_), None) => false,
            })
            .filter(|row| match area_id {
                Some(area_id) => row.area_id.as_deref() == Some(area_id),
                None => true,
            })
            .collect();

        tracing::debug!(
            "Report {}..{}: {} of {} recorded entries in scope",
            start,
            end,
            rows.len(),
            scanned
        );
        Ok(rows)
    }

    /// Report rows plus statistics for a caller
    pub async fn get_report(
        &self,
        caller: &Caller,
        start: &str,
        end: &str,
        area_id: Option<&str>,
        hospital_id: Option<&str>,
    ) -> Result<Report> {
        let start = dates::parse_day(start)?;
        let end = dates::parse_day(end)?;
        let scope = self.tenant.read_scope(caller, hospital_id).await?;

        let entries = self
            .entries_by_creation_range(start, end, &scope, normalize_requested(area_id))
            .await?;
        let statistics = ReportStatistics::from_rows(&entries);

        Ok(Report {
            entries,
            statistics,
        })
    }
}
