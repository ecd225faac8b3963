//! Entry store: sparse per-(task, day) completion records
//!
//! Entries are written only through the upsert below, a single
//! `INSERT .. ON CONFLICT .. DO UPDATE .. RETURNING` statement keyed on
//! `(task_id, entry_date)`. Concurrent writers to the same pair are
//! serialized by SQLite; the last one wins.

use super::models::ChecklistEntry;
use super::repository::Repository;
use crate::dates::DayRange;
use crate::error::Result;
use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use sqlx::{Connection, FromRow, SqliteExecutor};
use uuid::Uuid;

/// Values for one entry upsert
#[derive(Debug, Clone)]
pub struct EntryUpsert {
    pub task_id: String,
    pub date: NaiveDate,
    pub status: bool,
    /// `None` keeps the stored value on update
    pub staff_name: Option<String>,
    /// `None` keeps the stored value on update
    pub notes: Option<String>,
    pub completed_by: Option<String>,
    /// Only applied when the entry is inserted
    pub hospital_id: Option<String>,
    pub now: DateTime<Utc>,
}

/// An entry recorded within a creation-time window, joined to whatever
/// task/area/hospital labels still resolve.
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct CreatedRangeRecord {
    pub entry_id: String,
    pub entry_date: NaiveDate,
    pub status: bool,
    pub staff_name: String,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    /// `None` when the task no longer exists
    pub task_id: Option<String>,
    pub task_code: Option<String>,
    pub task_name: Option<String>,
    pub task_description: Option<String>,
    pub area_id: Option<String>,
    pub area_name: Option<String>,
    pub hospital_name: Option<String>,
}

const UPSERT_ENTRY_SQL: &str = r#"
    INSERT INTO checklist_entries (id, task_id, entry_date, status, staff_name, completed_by,
                                   completed_at, notes, hospital_id, created_at, updated_at)
    VALUES (?, ?, ?, ?, COALESCE(?, ''), ?, ?, ?, ?, ?, ?)
    ON CONFLICT (task_id, entry_date) DO UPDATE SET
        status = excluded.status,
        staff_name = CASE WHEN ? IS NULL THEN checklist_entries.staff_name
                          ELSE excluded.staff_name END,
        notes = CASE WHEN ? IS NULL THEN checklist_entries.notes
                     ELSE excluded.notes END,
        completed_by = excluded.completed_by,
        completed_at = CASE
            WHEN excluded.status = 0 THEN NULL
            WHEN checklist_entries.status = 1 THEN checklist_entries.completed_at
            ELSE excluded.completed_at
        END,
        updated_at = excluded.updated_at
    RETURNING *
"#;

/// Upsert one entry on any SQLite executor (pool, connection or
/// transaction).
pub(crate) async fn upsert_entry_with<'e, E>(executor: E, upsert: &EntryUpsert) -> Result<ChecklistEntry>
where
    E: SqliteExecutor<'e>,
{
    let completed_at = upsert.status.then_some(upsert.now);

    let entry = sqlx::query_as::<_, ChecklistEntry>(UPSERT_ENTRY_SQL)
        .bind(Uuid::new_v4().to_string())
        .bind(&upsert.task_id)
        .bind(upsert.date)
        .bind(upsert.status)
        .bind(&upsert.staff_name)
        .bind(&upsert.completed_by)
        .bind(completed_at)
        .bind(&upsert.notes)
        .bind(&upsert.hospital_id)
        .bind(upsert.now)
        .bind(upsert.now)
        .bind(&upsert.staff_name)
        .bind(&upsert.notes)
        .fetch_one(executor)
        .await?;

    Ok(entry)
}

impl Repository {
    /// Create or update the entry for `(task, date)` atomically
    pub async fn upsert_entry(&self, upsert: &EntryUpsert) -> Result<ChecklistEntry> {
        let entry = upsert_entry_with(&self.pool, upsert).await?;

        tracing::debug!(
            "Upserted entry {} for task {} on {} (status={})",
            entry.id,
            entry.task_id,
            entry.date,
            entry.status
        );
        Ok(entry)
    }

    /// Upsert a batch inside one transaction, each item under its own
    /// savepoint: a failing item is rolled back alone and reported in its
    /// slot while the others commit.
    pub async fn bulk_upsert_entries(
        &self,
        upserts: &[EntryUpsert],
    ) -> Result<Vec<Result<ChecklistEntry>>> {
        let mut tx = self.pool.begin().await?;
        let mut outcomes = Vec::with_capacity(upserts.len());

        for upsert in upserts {
            let mut savepoint = tx.begin().await?;
            match upsert_entry_with(&mut *savepoint, upsert).await {
                Ok(entry) => {
                    savepoint.commit().await?;
                    outcomes.push(Ok(entry));
                }
                Err(e) => {
                    tracing::warn!("Bulk upsert item for task {} failed: {}", upsert.task_id, e);
                    savepoint.rollback().await?;
                    outcomes.push(Err(e));
                }
            }
        }

        tx.commit().await?;

        tracing::debug!("Bulk upserted {} entries", upserts.len());
        Ok(outcomes)
    }

    /// Every entry belonging to the checklist of `date`
    pub async fn entries_for_day(&self, date: NaiveDate) -> Result<Vec<ChecklistEntry>> {
        let entries = sqlx::query_as::<_, ChecklistEntry>(
            "SELECT * FROM checklist_entries WHERE entry_date = ?",
        )
        .bind(date)
        .fetch_all(&self.pool)
        .await?;

        Ok(entries)
    }

    pub async fn find_entry(&self, task_id: &str, date: NaiveDate) -> Result<Option<ChecklistEntry>> {
        let entry = sqlx::query_as::<_, ChecklistEntry>(
            "SELECT * FROM checklist_entries WHERE task_id = ? AND entry_date = ?",
        )
        .bind(task_id)
        .bind(date)
        .fetch_optional(&self.pool)
        .await?;

        Ok(entry)
    }

    pub async fn count_entries_for_task(&self, task_id: &str) -> Result<i64> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM checklist_entries WHERE task_id = ?")
                .bind(task_id)
                .fetch_one(&self.pool)
                .await?;

        Ok(count)
    }

    /// Entries whose `created_at` falls in `range`, newest first. Filters
    /// on the recording instant, never on the checklist day.
    pub async fn entries_created_within(&self, range: &DayRange) -> Result<Vec<CreatedRangeRecord>> {
        let records = sqlx::query_as::<_, CreatedRangeRecord>(
            r#"
            SELECT e.id AS entry_id,
                   e.entry_date,
                   e.status,
                   e.staff_name,
                   e.created_at,
                   e.completed_at,
                   t.id AS task_id,
                   t.task_code,
                   t.name AS task_name,
                   t.description AS task_description,
                   a.id AS area_id,
                   a.name AS area_name,
                   h.name AS hospital_name
            FROM checklist_entries e
            LEFT JOIN tasks t ON t.id = e.task_id
            LEFT JOIN areas a ON a.id = t.area_id
            LEFT JOIN hospitals h ON h.id = a.hospital_id
            WHERE e.created_at >= ? AND e.created_at < ?
            ORDER BY e.created_at DESC
            "#,
        )
        .bind(range.start)
        .bind(range.end)
        .fetch_all(&self.pool)
        .await?;

        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::catalog::NewTask;
    use crate::database::{test_pool, CreateHospitalRequest, Task};
    use chrono::TimeZone;

    async fn create_test_repo() -> (Repository, Task) {
        let repo = Repository::new(test_pool().await);
        let hospital = repo
            .create_hospital(
                &CreateHospitalRequest {
                    name: "A".into(),
                    code: "A".into(),
                    ..Default::default()
                },
                true,
            )
            .await
            .unwrap();
        let area = repo
            .create_area("ICU", "ICU", None, Some(&hospital.id), None)
            .await
            .unwrap();
        let task = repo
            .create_task(&NewTask {
                task_code: "ICU1".into(),
                name: "Check oxygen".into(),
                description: "Verify oxygen supply".into(),
                area_id: area.id.clone(),
                hospital_id: area.hospital_id.clone(),
                sort_order: 0,
                created_by: None,
            })
            .await
            .unwrap();
        (repo, task)
    }

    fn upsert(task: &Task, date: &str, status: bool, now: DateTime<Utc>) -> EntryUpsert {
        EntryUpsert {
            task_id: task.id.clone(),
            date: NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
            status,
            staff_name: Some("Jane".into()),
            notes: None,
            completed_by: None,
            hospital_id: task.hospital_id.clone(),
            now,
        }
    }

    #[tokio::test]
    async fn test_upsert_keeps_one_row_per_task_and_day() {
        let (repo, task) = create_test_repo().await;
        let now = Utc::now();

        let first = repo.upsert_entry(&upsert(&task, "2024-06-01", false, now)).await.unwrap();
        let mut second_req = upsert(&task, "2024-06-01", true, now);
        second_req.staff_name = Some("John".into());
        let second = repo.upsert_entry(&second_req).await.unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(second.staff_name, "John");
        assert_eq!(repo.entries_for_day(first.date).await.unwrap().len(), 1);
        assert_eq!(repo.count_entries_for_task(&task.id).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_completed_at_follows_status() {
        let (repo, task) = create_test_repo().await;
        let t1 = Utc.with_ymd_and_hms(2024, 6, 1, 8, 0, 0).unwrap();
        let t2 = Utc.with_ymd_and_hms(2024, 6, 1, 9, 0, 0).unwrap();

        let done = repo.upsert_entry(&upsert(&task, "2024-06-01", true, t1)).await.unwrap();
        assert_eq!(done.completed_at, Some(t1));

        // Already complete: first completion time is kept
        let again = repo.upsert_entry(&upsert(&task, "2024-06-01", true, t2)).await.unwrap();
        assert_eq!(again.completed_at, Some(t1));

        let undone = repo.upsert_entry(&upsert(&task, "2024-06-01", false, t2)).await.unwrap();
        assert_eq!(undone.completed_at, None);
        assert_eq!(undone.date, done.date);
    }

    #[tokio::test]
    async fn test_omitted_fields_are_kept_and_creation_time_is_stable() {
        let (repo, task) = create_test_repo().await;
        let t1 = Utc.with_ymd_and_hms(2024, 6, 1, 8, 0, 0).unwrap();
        let t2 = Utc.with_ymd_and_hms(2024, 6, 2, 8, 0, 0).unwrap();

        let mut first = upsert(&task, "2024-06-01", true, t1);
        first.notes = Some("restocked".into());
        repo.upsert_entry(&first).await.unwrap();

        let mut second = upsert(&task, "2024-06-01", false, t2);
        second.staff_name = None;
        second.hospital_id = None;
        let updated = repo.upsert_entry(&second).await.unwrap();

        assert_eq!(updated.staff_name, "Jane");
        assert_eq!(updated.notes.as_deref(), Some("restocked"));
        assert_eq!(updated.created_at, t1);
        assert_eq!(updated.updated_at, t2);
        // Hospital is only written on insert
        assert_eq!(updated.hospital_id, task.hospital_id);
    }

    #[tokio::test]
    async fn test_bulk_upsert_isolates_failures() {
        let (repo, task) = create_test_repo().await;
        let now = Utc::now();

        let mut broken = upsert(&task, "2024-06-01", true, now);
        broken.task_id = "missing-task".into();

        let outcomes = repo
            .bulk_upsert_entries(&[
                upsert(&task, "2024-06-01", true, now),
                broken,
                upsert(&task, "2024-06-02", false, now),
            ])
            .await
            .unwrap();

        assert!(outcomes[0].is_ok());
        assert!(outcomes[1].is_err());
        assert!(outcomes[2].is_ok());
        assert_eq!(repo.count_entries_for_task(&task.id).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_created_range_uses_creation_time_not_entry_date() {
        let (repo, task) = create_test_repo().await;
        let june_3 = Utc.with_ymd_and_hms(2024, 6, 3, 12, 0, 0).unwrap();
        let june_5 = Utc.with_ymd_and_hms(2024, 6, 5, 0, 0, 0).unwrap();

        // Checklist for June 1, recorded on June 3
        repo.upsert_entry(&upsert(&task, "2024-06-01", true, june_3)).await.unwrap();
        repo.upsert_entry(&upsert(&task, "2024-06-02", true, june_5)).await.unwrap();

        let d = |s: &str| NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap();
        let range = DayRange::spanning(d("2024-06-03"), d("2024-06-04")).unwrap();
        let records = repo.entries_created_within(&range).await.unwrap();

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].entry_date, d("2024-06-01"));
        assert_eq!(records[0].task_code.as_deref(), Some("ICU1"));
        assert_eq!(records[0].area_name.as_deref(), Some("ICU"));
        assert_eq!(records[0].hospital_name.as_deref(), Some("A"));
    }
}
