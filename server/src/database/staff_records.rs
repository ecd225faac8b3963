//! Staff record store

use super::models::*;
use super::repository::Repository;
use crate::error::{AppError, Result};
use chrono::Utc;
use sqlx::{QueryBuilder, Sqlite};
use std::collections::HashMap;
use uuid::Uuid;

const RECORD_DETAIL_SELECT: &str = r#"
    SELECT r.*,
           cu.name AS created_by_name,
           ru.name AS resolved_by_name,
           a.name AS area_name,
           a.code AS area_code
    FROM staff_records r
    LEFT JOIN users cu ON cu.id = r.created_by
    LEFT JOIN users ru ON ru.id = r.resolved_by
    LEFT JOIN areas a ON a.id = r.area_id
"#;

/// Insert values for a new staff record
#[derive(Debug, Clone)]
pub struct NewStaffRecord {
    pub title: String,
    pub category: RecordCategory,
    pub description: String,
    pub priority: RecordPriority,
    pub area_id: Option<String>,
    pub hospital_id: Option<String>,
    pub created_by: String,
    pub notes: Option<String>,
}

/// Staff record selection for listings and statistics
#[derive(Debug, Clone, Default)]
pub struct StaffRecordFilter {
    pub hospital_id: Option<String>,
    pub category: Option<RecordCategory>,
    /// Any of these; empty matches every status
    pub statuses: Vec<RecordStatus>,
    pub priority: Option<RecordPriority>,
    pub created_by: Option<String>,
}

impl StaffRecordFilter {
    fn push_where(&self, qb: &mut QueryBuilder<'static, Sqlite>) {
        qb.push(" WHERE 1 = 1");
        if let Some(hospital_id) = &self.hospital_id {
            qb.push(" AND r.hospital_id = ").push_bind(hospital_id.clone());
        }
        if let Some(category) = self.category {
            qb.push(" AND r.category = ").push_bind(category);
        }
        if !self.statuses.is_empty() {
            qb.push(" AND r.status IN (");
            let mut separated = qb.separated(", ");
            for status in &self.statuses {
                separated.push_bind(*status);
            }
            qb.push(")");
        }
        if let Some(priority) = self.priority {
            qb.push(" AND r.priority = ").push_bind(priority);
        }
        if let Some(created_by) = &self.created_by {
            qb.push(" AND r.created_by = ").push_bind(created_by.clone());
        }
    }
}

/// Record counts grouped by status and by category
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StaffRecordStats {
    pub total: i64,
    pub by_status: HashMap<RecordStatus, i64>,
    pub by_category: HashMap<RecordCategory, i64>,
}

impl Repository {
    pub async fn create_staff_record(&self, new: &NewStaffRecord) -> Result<StaffRecordDetail> {
        let id = Uuid::new_v4().to_string();
        let now = Utc::now();

        sqlx::query(
            r#"
            INSERT INTO staff_records (id, title, category, description, priority, status,
                                       area_id, hospital_id, created_by, notes,
                                       created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, 'open', ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&id)
        .bind(&new.title)
        .bind(new.category)
        .bind(&new.description)
        .bind(new.priority)
        .bind(&new.area_id)
        .bind(&new.hospital_id)
        .bind(&new.created_by)
        .bind(&new.notes)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await?;

        tracing::debug!("Created staff record: {}", id);
        self.get_staff_record(&id).await
    }

    pub async fn get_staff_record(&self, id: &str) -> Result<StaffRecordDetail> {
        let mut query = QueryBuilder::<Sqlite>::new(RECORD_DETAIL_SELECT);
        query.push(" WHERE r.id = ").push_bind(id.to_string());

        query
            .build_query_as::<StaffRecordDetail>()
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::not_found("Record", id))
    }

    /// Newest first
    pub async fn list_staff_records(
        &self,
        filter: &StaffRecordFilter,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<StaffRecordDetail>, i64)> {
        let mut count_query = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM staff_records r");
        filter.push_where(&mut count_query);
        let total: i64 = count_query.build_query_scalar().fetch_one(&self.pool).await?;

        let mut query = QueryBuilder::<Sqlite>::new(RECORD_DETAIL_SELECT);
        filter.push_where(&mut query);
        query
            .push(" ORDER BY r.created_at DESC, r.id LIMIT ")
            .push_bind(limit)
            .push(" OFFSET ")
            .push_bind(offset);

        let records = query
            .build_query_as::<StaffRecordDetail>()
            .fetch_all(&self.pool)
            .await?;

        Ok((records, total))
    }

    pub async fn update_staff_record(&self, record: &StaffRecord) -> Result<StaffRecordDetail> {
        let rows = sqlx::query(
            r#"
            UPDATE staff_records
            SET title = ?, category = ?, description = ?, priority = ?, status = ?,
                resolved_by = ?, resolved_at = ?, notes = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&record.title)
        .bind(record.category)
        .bind(&record.description)
        .bind(record.priority)
        .bind(record.status)
        .bind(&record.resolved_by)
        .bind(record.resolved_at)
        .bind(&record.notes)
        .bind(Utc::now())
        .bind(&record.id)
        .execute(&self.pool)
        .await?
        .rows_affected();

        if rows == 0 {
            return Err(AppError::not_found("Record", &record.id));
        }
        self.get_staff_record(&record.id).await
    }

    pub async fn delete_staff_record(&self, id: &str) -> Result<()> {
        let rows = sqlx::query("DELETE FROM staff_records WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?
            .rows_affected();

        if rows == 0 {
            return Err(AppError::not_found("Record", id));
        }

        tracing::debug!("Deleted staff record: {}", id);
        Ok(())
    }

    pub async fn staff_record_stats(&self, filter: &StaffRecordFilter) -> Result<StaffRecordStats> {
        let mut status_query =
            QueryBuilder::<Sqlite>::new("SELECT r.status, COUNT(*) FROM staff_records r");
        filter.push_where(&mut status_query);
        status_query.push(" GROUP BY r.status");
        let by_status: Vec<(RecordStatus, i64)> = status_query
            .build_query_as()
            .fetch_all(&self.pool)
            .await?;

        let mut category_query =
            QueryBuilder::<Sqlite>::new("SELECT r.category, COUNT(*) FROM staff_records r");
        filter.push_where(&mut category_query);
        category_query.push(" GROUP BY r.category");
        let by_category: Vec<(RecordCategory, i64)> = category_query
            .build_query_as()
            .fetch_all(&self.pool)
            .await?;

        Ok(StaffRecordStats {
            total: by_status.iter().map(|(_, n)| n).sum(),
            by_status: by_status.into_iter().collect(),
            by_category: by_category.into_iter().collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::test_pool;

    async fn setup() -> (Repository, User) {
        let repo = Repository::new(test_pool().await);
        let user = repo
            .create_user("Ann", "ann@example.org", Role::Staff, None)
            .await
            .unwrap();
        (repo, user)
    }

    fn record(title: &str, category: RecordCategory, created_by: &str) -> NewStaffRecord {
        NewStaffRecord {
            title: title.into(),
            category,
            description: "Seen on the morning round".into(),
            priority: RecordPriority::Medium,
            area_id: None,
            hospital_id: None,
            created_by: created_by.into(),
            notes: None,
        }
    }

    #[tokio::test]
    async fn test_create_joins_creator_name() {
        let (repo, user) = setup().await;

        let created = repo
            .create_staff_record(&record("Leaking tap", RecordCategory::Maintenance, &user.id))
            .await
            .unwrap();

        assert_eq!(created.record.status, RecordStatus::Open);
        assert_eq!(created.created_by_name.as_deref(), Some("Ann"));
        assert!(created.resolved_by_name.is_none());
    }

    #[tokio::test]
    async fn test_status_filter_matches_any_listed_status() {
        let (repo, user) = setup().await;
        for title in ["One", "Two", "Three"] {
            repo.create_staff_record(&record(title, RecordCategory::General, &user.id))
                .await
                .unwrap();
        }
        let (items, _) = repo
            .list_staff_records(&StaffRecordFilter::default(), 10, 0)
            .await
            .unwrap();
        let mut closed = items[0].record.clone();
        closed.status = RecordStatus::Closed;
        repo.update_staff_record(&closed).await.unwrap();

        let filter = StaffRecordFilter {
            statuses: vec![RecordStatus::Open, RecordStatus::InProgress],
            ..Default::default()
        };
        let (items, total) = repo.list_staff_records(&filter, 10, 0).await.unwrap();
        assert_eq!(total, 2);
        assert!(items.iter().all(|r| r.record.status == RecordStatus::Open));

        let (page, total) = repo
            .list_staff_records(&StaffRecordFilter::default(), 2, 2)
            .await
            .unwrap();
        assert_eq!((page.len(), total), (1, 3));
    }

    #[tokio::test]
    async fn test_stats_group_by_status_and_category() {
        let (repo, user) = setup().await;
        repo.create_staff_record(&record("A", RecordCategory::Incident, &user.id))
            .await
            .unwrap();
        repo.create_staff_record(&record("B", RecordCategory::Incident, &user.id))
            .await
            .unwrap();
        repo.create_staff_record(&record("C", RecordCategory::SupplyRequest, &user.id))
            .await
            .unwrap();

        let stats = repo
            .staff_record_stats(&StaffRecordFilter::default())
            .await
            .unwrap();
        assert_eq!(stats.total, 3);
        assert_eq!(stats.by_status.get(&RecordStatus::Open), Some(&3));
        assert_eq!(stats.by_category.get(&RecordCategory::Incident), Some(&2));
        assert_eq!(stats.by_category.get(&RecordCategory::SupplyRequest), Some(&1));
    }

    #[tokio::test]
    async fn test_delete_missing_record_is_not_found() {
        let (repo, _) = setup().await;
        let result = repo.delete_staff_record("missing").await;
        assert!(matches!(result, Err(AppError::NotFound { entity: "Record", .. })));
    }
}
