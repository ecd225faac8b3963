//! Checklist service
//!
//! Reconciles the active task catalog with the sparse entries of one day
//! into a complete daily checklist, and owns the entry write path.

use super::tenant::{normalize_requested, Caller, HospitalScope, TenantResolver};
use super::validation;
use crate::config::{MAX_NOTES_LENGTH, MAX_STAFF_NAME_LENGTH};
use crate::database::{ChecklistEntry, EntryUpsert, Repository, Task, TaskDetail, TaskFilter};
use crate::dates;
use crate::error::{AppError, Result};
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One task of the daily checklist with its entry, if recorded
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChecklistRow {
    pub task: TaskDetail,
    pub entry: Option<ChecklistEntry>,
}

impl ChecklistRow {
    pub fn is_completed(&self) -> bool {
        self.entry.as_ref().map(|e| e.status).unwrap_or(false)
    }
}

/// Completion summary of a daily checklist
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChecklistStatistics {
    pub total: i64,
    pub completed: i64,
    pub pending: i64,
    /// Whole percent, 0 when there are no tasks
    pub completion_rate: i64,
}

impl ChecklistStatistics {
    pub fn from_counts(total: i64, completed: i64) -> Self {
        Self {
            total,
            completed,
            pending: total - completed,
            completion_rate: completion_rate(total, completed),
        }
    }

    pub fn from_rows(rows: &[ChecklistRow]) -> Self {
        let completed = rows.iter().filter(|r| r.is_completed()).count() as i64;
        Self::from_counts(rows.len() as i64, completed)
    }
}

pub(crate) fn completion_rate(total: i64, completed: i64) -> i64 {
    if total == 0 {
        return 0;
    }
    (completed as f64 * 100.0 / total as f64).round() as i64
}

/// Fields written by a single entry update
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryInput {
    pub date: String,
    pub status: bool,
    pub staff_name: Option<String>,
    pub notes: Option<String>,
}

/// One item of a bulk save
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkEntryInput {
    pub task_id: String,
    pub status: bool,
    pub staff_name: Option<String>,
    pub notes: Option<String>,
}

impl BulkEntryInput {
    /// Decode one raw bulk item. A malformed item becomes its own failed
    /// outcome so the rest of the batch still saves.
    pub fn from_json(value: serde_json::Value) -> std::result::Result<Self, BulkItemOutcome> {
        let task_id = value
            .get("taskId")
            .and_then(|v| v.as_str())
            .unwrap_or_default()
            .to_string();
        serde_json::from_value(value).map_err(|e| BulkItemOutcome::Failed {
            task_id,
            error: format!("Invalid input: {}", e),
        })
    }
}

/// Outcome of one bulk item, in request order
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "outcome", rename_all = "lowercase")]
pub enum BulkItemOutcome {
    #[serde(rename_all = "camelCase")]
    Saved { task_id: String, entry_id: String },
    #[serde(rename_all = "camelCase")]
    Failed { task_id: String, error: String },
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkUpsertResult {
    pub saved: usize,
    pub failed: usize,
    pub results: Vec<BulkItemOutcome>,
}

/// Where an entry write lands
enum WriteTarget {
    Hospital(String),
    /// Unassigned admin without an override: the task's own hospital
    TaskHospital,
}

/// Service for daily checklists
#[derive(Clone)]
pub struct ChecklistService {
    repo: Repository,
    tenant: TenantResolver,
}

impl ChecklistService {
    pub fn new(repo: Repository, tenant: TenantResolver) -> Self {
        Self { repo, tenant }
    }

    /// One row per active task in scope, ordered by area name, area,
    /// task order and task ID, each with that day's entry if any.
    pub async fn reconcile(
        &self,
        date: NaiveDate,
        scope: &HospitalScope,
        area_id: Option<&str>,
    ) -> Result<Vec<ChecklistRow>> {
        let area_ids = match scope {
            HospitalScope::AllHospitals => None,
            HospitalScope::Hospital(hospital_id) => {
                Some(self.repo.area_ids_for_hospital(hospital_id).await?)
            }
        };

        let filter = TaskFilter {
            area_id: area_id.map(str::to_string),
            area_ids,
        };
        let tasks = self.repo.list_active_tasks(&filter).await?;
        if tasks.is_empty() {
            return Ok(Vec::new());
        }

        let mut entries: HashMap<String, ChecklistEntry> = self
            .repo
            .entries_for_day(date)
            .await?
            .into_iter()
            .map(|entry| (entry.task_id.clone(), entry))
            .collect();

        let rows = tasks
            .into_iter()
            .map(|task| {
                let entry = entries.remove(&task.task.id);
                ChecklistRow { task, entry }
            })
            .collect();

        Ok(rows)
    }

    /// Daily checklist for a caller
    pub async fn get_checklist(
        &self,
        caller: &Caller,
        date: &str,
        area_id: Option<&str>,
        hospital_id: Option<&str>,
    ) -> Result<Vec<ChecklistRow>> {
        let date = dates::parse_day(date)?;
        let scope = self.tenant.read_scope(caller, hospital_id).await?;

        tracing::debug!("Loading checklist for {} ({:?})", date, scope);
        self.reconcile(date, &scope, normalize_requested(area_id)).await
    }

    pub async fn statistics(
        &self,
        caller: &Caller,
        date: &str,
        hospital_id: Option<&str>,
    ) -> Result<ChecklistStatistics> {
        let rows = self.get_checklist(caller, date, None, hospital_id).await?;
        Ok(ChecklistStatistics::from_rows(&rows))
    }

    /// Record one task's status for a day
    pub async fn upsert_entry(
        &self,
        caller: &Caller,
        task_id: &str,
        input: EntryInput,
        hospital_id: Option<&str>,
    ) -> Result<ChecklistEntry> {
        let date = dates::parse_day(&input.date)?;
        let target = self.write_target(caller, hospital_id).await?;

        let upsert = self
            .prepare(
                caller,
                &target,
                task_id,
                date,
                input.status,
                input.staff_name.as_deref(),
                input.notes.as_deref(),
            )
            .await?;

        let entry = self.repo.upsert_entry(&upsert).await?;

        tracing::info!(
            "Entry saved for task {} on {} by {} (status={})",
            task_id,
            date,
            caller.user_id,
            entry.status
        );
        Ok(entry)
    }

    /// Save many entries for one day. Items are independent: a failing
    /// item is reported and never blocks the others.
    pub async fn save_checklist(
        &self,
        caller: &Caller,
        date: &str,
        items: Vec<BulkEntryInput>,
        hospital_id: Option<&str>,
    ) -> Result<BulkUpsertResult> {
        let items = items.into_iter().map(Ok).collect();
        self.save_items(caller, date, items, hospital_id).await
    }

    /// Same as [`Self::save_checklist`] for undecoded items; an item that
    /// does not decode is reported as failed.
    pub async fn save_checklist_json(
        &self,
        caller: &Caller,
        date: &str,
        items: Vec<serde_json::Value>,
        hospital_id: Option<&str>,
    ) -> Result<BulkUpsertResult> {
        let items = items.into_iter().map(BulkEntryInput::from_json).collect();
        self.save_items(caller, date, items, hospital_id).await
    }

    async fn save_items(
        &self,
        caller: &Caller,
        date: &str,
        items: Vec<std::result::Result<BulkEntryInput, BulkItemOutcome>>,
        hospital_id: Option<&str>,
    ) -> Result<BulkUpsertResult> {
        let date = dates::parse_day(date)?;
        let target = self.write_target(caller, hospital_id).await?;

        let mut outcomes: Vec<Option<BulkItemOutcome>> = vec![None; items.len()];
        let mut pending = Vec::new();
        let mut pending_slots = Vec::new();
        let mut task_ids = vec![String::new(); items.len()];

        for (slot, item) in items.into_iter().enumerate() {
            let item = match item {
                Ok(item) => item,
                Err(outcome) => {
                    tracing::warn!("Bulk item {} could not be decoded", slot);
                    outcomes[slot] = Some(outcome);
                    continue;
                }
            };
            task_ids[slot] = item.task_id.clone();

            let prepared = self
                .prepare(
                    caller,
                    &target,
                    &item.task_id,
                    date,
                    item.status,
                    item.staff_name.as_deref(),
                    item.notes.as_deref(),
                )
                .await;

            match prepared {
                Ok(upsert) => {
                    pending.push(upsert);
                    pending_slots.push(slot);
                }
                Err(e) => {
                    tracing::warn!("Bulk item for task {} rejected: {}", item.task_id, e);
                    outcomes[slot] = Some(BulkItemOutcome::Failed {
                        task_id: item.task_id.clone(),
                        error: e.to_string(),
                    });
                }
            }
        }

        let stored = self.repo.bulk_upsert_entries(&pending).await?;
        for (slot, result) in pending_slots.into_iter().zip(stored) {
            let task_id = std::mem::take(&mut task_ids[slot]);
            outcomes[slot] = Some(match result {
                Ok(entry) => BulkItemOutcome::Saved {
                    task_id,
                    entry_id: entry.id,
                },
                Err(e) => BulkItemOutcome::Failed {
                    task_id,
                    error: e.to_string(),
                },
            });
        }

        let results: Vec<BulkItemOutcome> = outcomes.into_iter().flatten().collect();
        let saved = results
            .iter()
            .filter(|o| matches!(o, BulkItemOutcome::Saved { .. }))
            .count();
        let failed = results.len() - saved;

        tracing::info!(
            "Checklist for {} saved by {}: {} saved, {} failed",
            date,
            caller.user_id,
            saved,
            failed
        );

        Ok(BulkUpsertResult {
            saved,
            failed,
            results,
        })
    }

    async fn write_target(&self, caller: &Caller, requested: Option<&str>) -> Result<WriteTarget> {
        if caller.is_admin() && caller.hospital_id.is_none() && normalize_requested(requested).is_none() {
            return Ok(WriteTarget::TaskHospital);
        }
        let hospital_id = self.tenant.write_hospital(caller, requested).await?;
        Ok(WriteTarget::Hospital(hospital_id))
    }

    /// Validate one write and resolve the hospital it lands on
    #[allow(clippy::too_many_arguments)]
    async fn prepare(
        &self,
        caller: &Caller,
        target: &WriteTarget,
        task_id: &str,
        date: NaiveDate,
        status: bool,
        staff_name: Option<&str>,
        notes: Option<&str>,
    ) -> Result<EntryUpsert> {
        let staff_name = validation::text("staffName", staff_name, MAX_STAFF_NAME_LENGTH)?;
        let notes = validation::text("notes", notes, MAX_NOTES_LENGTH)?;
        let task = self.repo.get_task(task_id.trim()).await?;
        if !task.is_active {
            return Err(AppError::InvalidInput(format!(
                "Task {} is inactive",
                task.task_code
            )));
        }
        let hospital_id = self.entry_hospital(caller, target, &task).await?;

        Ok(EntryUpsert {
            task_id: task.id,
            date,
            status,
            staff_name,
            notes,
            completed_by: Some(caller.user_id.clone()),
            hospital_id: Some(hospital_id),
            now: Utc::now(),
        })
    }

    async fn entry_hospital(&self, caller: &Caller, target: &WriteTarget, task: &Task) -> Result<String> {
        match (target, task.hospital_id.as_deref()) {
            (WriteTarget::Hospital(hospital_id), Some(owner)) if owner != hospital_id => {
                tracing::warn!(
                    "User {} tried to record task {} of hospital {} under {}",
                    caller.user_id,
                    task.id,
                    owner,
                    hospital_id
                );
                Err(AppError::AccessDenied(
                    "This task belongs to another hospital".into(),
                ))
            }
            (WriteTarget::Hospital(hospital_id), _) => Ok(hospital_id.clone()),
            (WriteTarget::TaskHospital, Some(owner)) => Ok(owner.to_string()),
            (WriteTarget::TaskHospital, None) => self.tenant.write_hospital(caller, None).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::{test_pool, Area, CreateHospitalRequest, Hospital, NewTask, Role};
    use crate::services::hospitals::HospitalsService;

    struct Fixture {
        service: ChecklistService,
        repo: Repository,
        a: Hospital,
        b: Hospital,
        icu: Area,
        tasks: Vec<Task>,
        staff_a: Caller,
        staff_b: Caller,
        admin: Caller,
    }

    /// Hospital A with area ICU and tasks ICU1..ICU3; hospital B with a ward
    async fn fixture() -> Fixture {
        let repo = Repository::new(test_pool().await);
        let hospitals = HospitalsService::new(repo.clone(), "Default Hospital");
        let mut created = Vec::new();
        for code in ["A", "B"] {
            created.push(
                hospitals
                    .create_hospital(CreateHospitalRequest {
                        name: format!("Hospital {}", code),
                        code: code.into(),
                        ..Default::default()
                    })
                    .await
                    .unwrap(),
            );
        }
        let b = created.pop().unwrap();
        let a = created.pop().unwrap();

        let icu = repo.create_area("ICU", "ICU", None, Some(&a.id), None).await.unwrap();
        let ward = repo.create_area("Ward", "WRD", None, Some(&b.id), None).await.unwrap();

        let mut tasks = Vec::new();
        for (n, area) in [(1, &icu), (2, &icu), (3, &icu), (1, &ward)] {
            tasks.push(
                repo.create_task(&NewTask {
                    task_code: format!("{}{}", area.code, n),
                    name: format!("Task {}", n),
                    description: "Check".into(),
                    area_id: area.id.clone(),
                    hospital_id: area.hospital_id.clone(),
                    sort_order: n,
                    created_by: None,
                })
                .await
                .unwrap(),
            );
        }
        tasks.truncate(3);

        let staff_a: Caller = repo
            .create_user("Ann", "ann@example.org", Role::Staff, Some(&a.id))
            .await
            .unwrap()
            .into();
        let staff_b: Caller = repo
            .create_user("Bob", "bob@example.org", Role::Staff, Some(&b.id))
            .await
            .unwrap()
            .into();
        let admin: Caller = repo
            .create_user("Root", "root@example.org", Role::Admin, None)
            .await
            .unwrap()
            .into();

        let tenant = TenantResolver::new(repo.clone(), hospitals);
        Fixture {
            service: ChecklistService::new(repo.clone(), tenant),
            repo,
            a,
            b,
            icu,
            tasks,
            staff_a,
            staff_b,
            admin,
        }
    }

    fn day(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn input(date: &str, status: bool) -> EntryInput {
        EntryInput {
            date: date.into(),
            status,
            staff_name: Some("Jane".into()),
            notes: None,
        }
    }

    #[tokio::test]
    async fn test_reconcile_emits_row_per_task_without_entries() {
        let f = fixture().await;
        let scope = HospitalScope::Hospital(f.a.id.clone());

        let rows = f.service.reconcile(day("2024-06-01"), &scope, None).await.unwrap();

        assert_eq!(rows.len(), 3);
        assert!(rows.iter().all(|r| r.entry.is_none()));
        let codes: Vec<_> = rows.iter().map(|r| r.task.task.task_code.as_str()).collect();
        assert_eq!(codes, ["ICU1", "ICU2", "ICU3"]);
    }

    #[tokio::test]
    async fn test_upsert_then_statistics() {
        let f = fixture().await;

        f.service
            .upsert_entry(&f.staff_a, &f.tasks[0].id, input("2024-06-01", true), None)
            .await
            .unwrap();

        let rows = f
            .service
            .get_checklist(&f.staff_a, "2024-06-01", None, None)
            .await
            .unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows.iter().filter(|r| r.is_completed()).count(), 1);
        assert!(rows[0].entry.as_ref().unwrap().completed_at.is_some());

        let stats = f.service.statistics(&f.staff_a, "2024-06-01", None).await.unwrap();
        assert_eq!(stats, ChecklistStatistics::from_counts(3, 1));
        assert_eq!(stats.pending, 2);
        assert_eq!(stats.completion_rate, 33);
    }

    #[tokio::test]
    async fn test_area_outside_scoped_hospital_is_empty() {
        let f = fixture().await;
        let scope = HospitalScope::Hospital(f.b.id.clone());

        let rows = f
            .service
            .reconcile(day("2024-06-01"), &scope, Some(&f.icu.id))
            .await
            .unwrap();
        assert!(rows.is_empty());
    }

    #[tokio::test]
    async fn test_hospital_without_areas_is_empty() {
        let f = fixture().await;
        let empty = HospitalsService::new(f.repo.clone(), "Default")
            .create_hospital(CreateHospitalRequest {
                name: "Empty".into(),
                code: "EMPTY".into(),
                ..Default::default()
            })
            .await
            .unwrap();

        let rows = f
            .service
            .reconcile(day("2024-06-01"), &HospitalScope::Hospital(empty.id), None)
            .await
            .unwrap();
        assert!(rows.is_empty());
    }

    #[tokio::test]
    async fn test_all_hospitals_scope_sees_every_active_task() {
        let f = fixture().await;
        let rows = f
            .service
            .get_checklist(&f.admin, "2024-06-01", None, None)
            .await
            .unwrap();
        assert_eq!(rows.len(), 4);
        // Sorted by area name: ICU before Ward
        assert_eq!(rows[3].task.area_name, "Ward");
    }

    #[tokio::test]
    async fn test_times_of_day_collapse_into_one_entry() {
        let f = fixture().await;
        let task = &f.tasks[0].id;

        let early = f
            .service
            .upsert_entry(&f.staff_a, task, input("2024-01-01T03:00:00", false), None)
            .await
            .unwrap();
        let late = f
            .service
            .upsert_entry(&f.staff_a, task, input("2024-01-01T22:00:00", true), None)
            .await
            .unwrap();
        let next = f
            .service
            .upsert_entry(&f.staff_a, task, input("2024-01-02T00:00:00", true), None)
            .await
            .unwrap();

        assert_eq!(early.id, late.id);
        assert!(late.status);
        assert_ne!(late.id, next.id);
    }

    #[tokio::test]
    async fn test_staff_cannot_write_other_hospital() {
        let f = fixture().await;

        let denied = f
            .service
            .upsert_entry(&f.staff_a, &f.tasks[0].id, input("2024-06-01", true), Some(&f.b.id))
            .await;
        assert!(matches!(denied, Err(AppError::AccessDenied(_))));

        // Task of hospital A written under B's scope
        let denied = f
            .service
            .upsert_entry(&f.staff_b, &f.tasks[0].id, input("2024-06-01", true), None)
            .await;
        assert!(matches!(denied, Err(AppError::AccessDenied(_))));
    }

    #[tokio::test]
    async fn test_unassigned_admin_writes_to_task_hospital() {
        let f = fixture().await;
        let entry = f
            .service
            .upsert_entry(&f.admin, &f.tasks[1].id, input("2024-06-01", true), None)
            .await
            .unwrap();
        assert_eq!(entry.hospital_id.as_deref(), Some(f.a.id.as_str()));
        assert_eq!(entry.completed_by.as_deref(), Some(f.admin.user_id.as_str()));
    }

    #[tokio::test]
    async fn test_unknown_task_is_not_found() {
        let f = fixture().await;
        let result = f
            .service
            .upsert_entry(&f.staff_a, "missing", input("2024-06-01", true), None)
            .await;
        assert!(matches!(result, Err(AppError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_invalid_date_rejected() {
        let f = fixture().await;
        let result = f
            .service
            .upsert_entry(&f.staff_a, &f.tasks[0].id, input("yesterday", true), None)
            .await;
        assert!(matches!(result, Err(AppError::InvalidInput(_))));
    }

    #[tokio::test]
    async fn test_bulk_save_reports_each_item() {
        let f = fixture().await;
        let items = vec![
            BulkEntryInput {
                task_id: f.tasks[0].id.clone(),
                status: true,
                staff_name: Some("Jane".into()),
                notes: None,
            },
            BulkEntryInput {
                task_id: "missing".into(),
                status: true,
                staff_name: None,
                notes: None,
            },
            BulkEntryInput {
                task_id: f.tasks[2].id.clone(),
                status: false,
                staff_name: None,
                notes: Some("later".into()),
            },
        ];

        let result = f
            .service
            .save_checklist(&f.staff_a, "2024-06-01", items, None)
            .await
            .unwrap();

        assert_eq!((result.saved, result.failed), (2, 1));
        assert!(matches!(result.results[0], BulkItemOutcome::Saved { .. }));
        assert!(matches!(
            &result.results[1],
            BulkItemOutcome::Failed { task_id, .. } if task_id == "missing"
        ));
        assert!(matches!(result.results[2], BulkItemOutcome::Saved { .. }));

        let stats = f.service.statistics(&f.staff_a, "2024-06-01", None).await.unwrap();
        assert_eq!((stats.total, stats.completed), (3, 1));
    }

    #[tokio::test]
    async fn test_undecodable_bulk_item_fails_alone() {
        let f = fixture().await;
        let items = vec![
            serde_json::json!({ "taskId": f.tasks[0].id, "status": true }),
            serde_json::json!({ "taskId": f.tasks[1].id, "status": "yes" }),
            serde_json::json!({ "status": true }),
        ];

        let result = f
            .service
            .save_checklist_json(&f.staff_a, "2024-06-01", items, None)
            .await
            .unwrap();

        assert_eq!((result.saved, result.failed), (1, 2));
        assert!(matches!(
            &result.results[1],
            BulkItemOutcome::Failed { task_id, error }
                if *task_id == f.tasks[1].id && error.starts_with("Invalid input")
        ));
        assert!(matches!(
            &result.results[2],
            BulkItemOutcome::Failed { task_id, .. } if task_id.is_empty()
        ));

        let rows = f
            .service
            .get_checklist(&f.staff_a, "2024-06-01", None, None)
            .await
            .unwrap();
        assert!(rows[0].is_completed());
        assert!(rows[1].entry.is_none());
    }

    #[tokio::test]
    async fn test_inactive_task_cannot_be_recorded() {
        let f = fixture().await;
        let mut task = f.tasks[2].clone();
        task.is_active = false;
        f.repo.update_task(&task).await.unwrap();

        let result = f
            .service
            .upsert_entry(&f.staff_a, &task.id, input("2024-06-01", true), None)
            .await;
        assert!(matches!(result, Err(AppError::InvalidInput(ref m)) if m.contains("ICU3")));

        let items = vec![BulkEntryInput {
            task_id: task.id.clone(),
            status: true,
            staff_name: None,
            notes: None,
        }];
        let result = f
            .service
            .save_checklist(&f.staff_a, "2024-06-01", items, None)
            .await
            .unwrap();
        assert_eq!((result.saved, result.failed), (0, 1));
    }

    #[test]
    fn test_completion_rate_rounds() {
        assert_eq!(completion_rate(0, 0), 0);
        assert_eq!(completion_rate(3, 1), 33);
        assert_eq!(completion_rate(3, 2), 67);
        assert_eq!(completion_rate(4, 4), 100);
    }
}
