//! Catalog store: hospitals, users, areas and tasks
//!
//! Callers pass already-validated, normalized values (uppercase codes,
//! trimmed names). Uniqueness is enforced by the schema; violations come
//! back as `AppError::Conflict`.

use super::models::*;
use super::repository::{like_pattern, Repository};
use crate::error::{AppError, Result};
use chrono::Utc;
use sqlx::{QueryBuilder, Sqlite};
use uuid::Uuid;

const TASK_DETAIL_SELECT: &str = r#"
    SELECT t.*,
           a.name AS area_name,
           a.code AS area_code,
           a.hospital_id AS area_hospital_id,
           h.name AS hospital_name,
           h.code AS hospital_code
    FROM tasks t
    JOIN areas a ON a.id = t.area_id
    LEFT JOIN hospitals h ON h.id = a.hospital_id
"#;

const TASK_DETAIL_ORDER: &str = " ORDER BY a.name, a.id, t.sort_order, t.task_code";

/// Task selection for checklist reconciliation: active tasks only
#[derive(Debug, Clone, Default)]
pub struct TaskFilter {
    pub area_id: Option<String>,
    /// Restrict to tasks whose area is in this set
    pub area_ids: Option<Vec<String>>,
}

/// Task selection for catalog listings
#[derive(Debug, Clone, Default)]
pub struct TaskListFilter {
    pub hospital_id: Option<String>,
    pub area_id: Option<String>,
    pub search: Option<String>,
    pub limit: i64,
    pub offset: i64,
}

/// Insert values for a new task
#[derive(Debug, Clone)]
pub struct NewTask {
    pub task_code: String,
    pub name: String,
    pub description: String,
    pub area_id: String,
    pub hospital_id: Option<String>,
    pub sort_order: i64,
    pub created_by: Option<String>,
}

impl Repository {
    // ===== Hospitals =====

    /// Create a hospital. When `make_default` is set, the current default
    /// is cleared in the same transaction.
    pub async fn create_hospital(
        &self,
        req: &CreateHospitalRequest,
        make_default: bool,
    ) -> Result<Hospital> {
        let id = Uuid::new_v4().to_string();
        let now = Utc::now();

        let mut tx = self.pool.begin().await?;

        if make_default {
            sqlx::query("UPDATE hospitals SET is_default = 0, updated_at = ? WHERE is_default = 1")
                .bind(now)
                .execute(&mut *tx)
                .await?;
        }

        let hospital = sqlx::query_as::<_, Hospital>(
            r#"
            INSERT INTO hospitals (id, name, code, logo_url, address, phone, email,
                                   is_active, is_default, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, 1, ?, ?, ?)
            RETURNING *
            "#,
        )
        .bind(&id)
        .bind(&req.name)
        .bind(&req.code)
        .bind(&req.logo_url)
        .bind(&req.address)
        .bind(&req.phone)
        .bind(&req.email)
        .bind(make_default)
        .bind(now)
        .bind(now)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| {
            AppError::conflict_on_unique(e, format!("Hospital with code {} already exists", req.code))
        })?;

        tx.commit().await?;

        tracing::debug!("Created hospital: {} ({})", hospital.code, id);
        Ok(hospital)
    }

    /// Insert the fallback default hospital unless a row with its code, or
    /// another default, already exists.
    pub async fn insert_default_hospital(&self, name: &str, code: &str) -> Result<()> {
        let now = Utc::now();

        sqlx::query(
            r#"
            INSERT INTO hospitals (id, name, code, is_active, is_default, created_at, updated_at)
            VALUES (?, ?, ?, 1, 1, ?, ?)
            ON CONFLICT DO NOTHING
            "#,
        )
        .bind(Uuid::new_v4().to_string())
        .bind(name)
        .bind(code)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn find_hospital(&self, id: &str) -> Result<Option<Hospital>> {
        let hospital = sqlx::query_as::<_, Hospital>("SELECT * FROM hospitals WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(hospital)
    }

    pub async fn get_hospital(&self, id: &str) -> Result<Hospital> {
        self.find_hospital(id)
            .await?
            .ok_or_else(|| AppError::not_found("Hospital", id))
    }

    pub async fn find_hospital_by_code(&self, code: &str) -> Result<Option<Hospital>> {
        let hospital = sqlx::query_as::<_, Hospital>("SELECT * FROM hospitals WHERE code = ?")
            .bind(code)
            .fetch_optional(&self.pool)
            .await?;

        Ok(hospital)
    }

    pub async fn find_default_hospital(&self) -> Result<Option<Hospital>> {
        let hospital =
            sqlx::query_as::<_, Hospital>("SELECT * FROM hospitals WHERE is_default = 1 LIMIT 1")
                .fetch_optional(&self.pool)
                .await?;

        Ok(hospital)
    }

    pub async fn count_hospitals(&self) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM hospitals")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    /// List hospitals, default first then by name
    pub async fn list_hospitals(
        &self,
        search: Option<&str>,
        include_inactive: bool,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<Hospital>, i64)> {
        let pattern = search.filter(|s| !s.trim().is_empty()).map(like_pattern);

        let push_filters = |qb: &mut QueryBuilder<'static, Sqlite>| {
            qb.push(" WHERE 1 = 1");
            if !include_inactive {
                qb.push(" AND is_active = 1");
            }
            if let Some(pattern) = &pattern {
                qb.push(" AND (name LIKE ")
                    .push_bind(pattern.clone())
                    .push(" ESCAPE '\\' OR code LIKE ")
                    .push_bind(pattern.clone())
                    .push(" ESCAPE '\\')");
            }
        };

        let mut count_query = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM hospitals");
        push_filters(&mut count_query);
        let total: i64 = count_query.build_query_scalar().fetch_one(&self.pool).await?;

        let mut query = QueryBuilder::<Sqlite>::new("SELECT * FROM hospitals");
        push_filters(&mut query);
        query
            .push(" ORDER BY is_default DESC, name ASC LIMIT ")
            .push_bind(limit)
            .push(" OFFSET ")
            .push_bind(offset);

        let hospitals = query
            .build_query_as::<Hospital>()
            .fetch_all(&self.pool)
            .await?;

        Ok((hospitals, total))
    }

    pub async fn list_active_hospitals(&self) -> Result<Vec<Hospital>> {
        let hospitals = sqlx::query_as::<_, Hospital>(
            "SELECT * FROM hospitals WHERE is_active = 1 ORDER BY is_default DESC, name ASC",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(hospitals)
    }

    /// Write back every mutable hospital column except `is_default`,
    /// which only changes through [`Repository::set_default_hospital`].
    pub async fn update_hospital(&self, hospital: &Hospital) -> Result<Hospital> {
        let updated = sqlx::query_as::<_, Hospital>(
            r#"
            UPDATE hospitals
            SET name = ?, code = ?, logo_url = ?, address = ?, phone = ?, email = ?,
                is_active = ?, updated_at = ?
            WHERE id = ?
            RETURNING *
            "#,
        )
        .bind(&hospital.name)
        .bind(&hospital.code)
        .bind(&hospital.logo_url)
        .bind(&hospital.address)
        .bind(&hospital.phone)
        .bind(&hospital.email)
        .bind(hospital.is_active)
        .bind(Utc::now())
        .bind(&hospital.id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            AppError::conflict_on_unique(
                e,
                format!("Hospital with code {} already exists", hospital.code),
            )
        })?
        .ok_or_else(|| AppError::not_found("Hospital", &hospital.id))?;

        tracing::debug!("Updated hospital: {}", updated.id);
        Ok(updated)
    }

    /// Make `id` the single default hospital: unset all, then set one,
    /// inside one transaction.
    pub async fn set_default_hospital(&self, id: &str) -> Result<Hospital> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        sqlx::query("UPDATE hospitals SET is_default = 0, updated_at = ? WHERE is_default = 1 AND id != ?")
            .bind(now)
            .bind(id)
            .execute(&mut *tx)
            .await?;

        let hospital = sqlx::query_as::<_, Hospital>(
            "UPDATE hospitals SET is_default = 1, updated_at = ? WHERE id = ? RETURNING *",
        )
        .bind(now)
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::not_found("Hospital", id))?;

        tx.commit().await?;

        tracing::debug!("Default hospital is now: {}", id);
        Ok(hospital)
    }

    pub async fn delete_hospital(&self, id: &str) -> Result<()> {
        let rows = sqlx::query("DELETE FROM hospitals WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?
            .rows_affected();

        if rows == 0 {
            return Err(AppError::not_found("Hospital", id));
        }

        tracing::debug!("Deleted hospital: {}", id);
        Ok(())
    }

    pub async fn count_users_in_hospital(&self, hospital_id: &str) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE hospital_id = ?")
            .bind(hospital_id)
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    // ===== Users =====

    pub async fn create_user(
        &self,
        name: &str,
        email: &str,
        role: Role,
        hospital_id: Option<&str>,
    ) -> Result<User> {
        let id = Uuid::new_v4().to_string();
        let now = Utc::now();

        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (id, name, email, role, hospital_id, is_active, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, 1, ?, ?)
            RETURNING *
            "#,
        )
        .bind(&id)
        .bind(name)
        .bind(email)
        .bind(role)
        .bind(hospital_id)
        .bind(now)
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::conflict_on_unique(e, "User with this email already exists"))?;

        tracing::debug!("Created user: {}", id);
        Ok(user)
    }

    pub async fn get_user(&self, id: &str) -> Result<User> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::not_found("User", id))
    }

    pub async fn find_user_by_email(&self, email: &str) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = ?")
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    pub async fn list_users(
        &self,
        hospital_id: Option<&str>,
        search: Option<&str>,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<User>, i64)> {
        let pattern = search.filter(|s| !s.trim().is_empty()).map(like_pattern);

        let push_filters = |qb: &mut QueryBuilder<'static, Sqlite>| {
            qb.push(" WHERE 1 = 1");
            if let Some(hospital_id) = hospital_id {
                qb.push(" AND hospital_id = ").push_bind(hospital_id.to_string());
            }
            if let Some(pattern) = &pattern {
                qb.push(" AND (name LIKE ")
                    .push_bind(pattern.clone())
                    .push(" ESCAPE '\\' OR email LIKE ")
                    .push_bind(pattern.clone())
                    .push(" ESCAPE '\\')");
            }
        };

        let mut count_query = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM users");
        push_filters(&mut count_query);
        let total: i64 = count_query.build_query_scalar().fetch_one(&self.pool).await?;

        let mut query = QueryBuilder::<Sqlite>::new("SELECT * FROM users");
        push_filters(&mut query);
        query
            .push(" ORDER BY name ASC LIMIT ")
            .push_bind(limit)
            .push(" OFFSET ")
            .push_bind(offset);

        let users = query.build_query_as::<User>().fetch_all(&self.pool).await?;

        Ok((users, total))
    }

    pub async fn update_user(&self, user: &User) -> Result<User> {
        sqlx::query_as::<_, User>(
            r#"
            UPDATE users
            SET name = ?, email = ?, role = ?, hospital_id = ?, is_active = ?, updated_at = ?
            WHERE id = ?
            RETURNING *
            "#,
        )
        .bind(&user.name)
        .bind(&user.email)
        .bind(user.role)
        .bind(&user.hospital_id)
        .bind(user.is_active)
        .bind(Utc::now())
        .bind(&user.id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::conflict_on_unique(e, "User with this email already exists"))?
        .ok_or_else(|| AppError::not_found("User", &user.id))
    }

    pub async fn delete_user(&self, id: &str) -> Result<()> {
        let rows = sqlx::query("DELETE FROM users WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?
            .rows_affected();

        if rows == 0 {
            return Err(AppError::not_found("User", id));
        }

        tracing::debug!("Deleted user: {}", id);
        Ok(())
    }

    // ===== Areas =====

    pub async fn create_area(
        &self,
        name: &str,
        code: &str,
        description: Option<&str>,
        hospital_id: Option<&str>,
        created_by: Option<&str>,
    ) -> Result<Area> {
        let id = Uuid::new_v4().to_string();
        let now = Utc::now();

        let area = sqlx::query_as::<_, Area>(
            r#"
            INSERT INTO areas (id, name, code, description, is_active, hospital_id, created_by,
                               created_at, updated_at)
            VALUES (?, ?, ?, ?, 1, ?, ?, ?, ?)
            RETURNING *
            "#,
        )
        .bind(&id)
        .bind(name)
        .bind(code)
        .bind(description)
        .bind(hospital_id)
        .bind(created_by)
        .bind(now)
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            AppError::conflict_on_unique(e, "Area with this code already exists in this hospital")
        })?;

        tracing::debug!("Created area: {} ({})", area.code, id);
        Ok(area)
    }

    pub async fn find_area(&self, id: &str) -> Result<Option<Area>> {
        let area = sqlx::query_as::<_, Area>("SELECT * FROM areas WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(area)
    }

    pub async fn get_area(&self, id: &str) -> Result<Area> {
        self.find_area(id)
            .await?
            .ok_or_else(|| AppError::not_found("Area", id))
    }

    /// Look up an area by code within one hospital (`None` = legacy areas)
    pub async fn find_area_by_code(
        &self,
        code: &str,
        hospital_id: Option<&str>,
    ) -> Result<Option<Area>> {
        let area =
            sqlx::query_as::<_, Area>("SELECT * FROM areas WHERE code = ? AND hospital_id IS ?")
                .bind(code)
                .bind(hospital_id)
                .fetch_optional(&self.pool)
                .await?;

        Ok(area)
    }

    /// Ids of every area (active or not) belonging to a hospital
    pub async fn area_ids_for_hospital(&self, hospital_id: &str) -> Result<Vec<String>> {
        let ids: Vec<String> = sqlx::query_scalar("SELECT id FROM areas WHERE hospital_id = ?")
            .bind(hospital_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(ids)
    }

    pub async fn list_areas(
        &self,
        hospital_id: Option<&str>,
        search: Option<&str>,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<Area>, i64)> {
        let pattern = search.filter(|s| !s.trim().is_empty()).map(like_pattern);

        let push_filters = |qb: &mut QueryBuilder<'static, Sqlite>| {
            qb.push(" WHERE 1 = 1");
            if let Some(hospital_id) = hospital_id {
                qb.push(" AND hospital_id = ").push_bind(hospital_id.to_string());
            }
            if let Some(pattern) = &pattern {
                qb.push(" AND (name LIKE ")
                    .push_bind(pattern.clone())
                    .push(" ESCAPE '\\' OR code LIKE ")
                    .push_bind(pattern.clone())
                    .push(" ESCAPE '\\')");
            }
        };

        let mut count_query = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM areas");
        push_filters(&mut count_query);
        let total: i64 = count_query.build_query_scalar().fetch_one(&self.pool).await?;

        let mut query = QueryBuilder::<Sqlite>::new("SELECT * FROM areas");
        push_filters(&mut query);
        query
            .push(" ORDER BY name ASC LIMIT ")
            .push_bind(limit)
            .push(" OFFSET ")
            .push_bind(offset);

        let areas = query.build_query_as::<Area>().fetch_all(&self.pool).await?;

        Ok((areas, total))
    }

    pub async fn list_active_areas(&self, hospital_id: Option<&str>) -> Result<Vec<Area>> {
        let mut query = QueryBuilder::<Sqlite>::new("SELECT * FROM areas WHERE is_active = 1");
        if let Some(hospital_id) = hospital_id {
            query.push(" AND hospital_id = ").push_bind(hospital_id.to_string());
        }
        query.push(" ORDER BY name ASC");

        let areas = query.build_query_as::<Area>().fetch_all(&self.pool).await?;
        Ok(areas)
    }

    /// Write back an area. When `reassign_tasks` is set the area moved to
    /// another hospital, and every task of the area gets its denormalized
    /// hospital recomputed in the same transaction.
    pub async fn update_area(&self, area: &Area, reassign_tasks: bool) -> Result<Area> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        let updated = sqlx::query_as::<_, Area>(
            r#"
            UPDATE areas
            SET name = ?, code = ?, description = ?, is_active = ?, hospital_id = ?, updated_at = ?
            WHERE id = ?
            RETURNING *
            "#,
        )
        .bind(&area.name)
        .bind(&area.code)
        .bind(&area.description)
        .bind(area.is_active)
        .bind(&area.hospital_id)
        .bind(now)
        .bind(&area.id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| {
            AppError::conflict_on_unique(e, "Area with this code already exists in this hospital")
        })?
        .ok_or_else(|| AppError::not_found("Area", &area.id))?;

        if reassign_tasks {
            let moved = sqlx::query("UPDATE tasks SET hospital_id = ?, updated_at = ? WHERE area_id = ?")
                .bind(&updated.hospital_id)
                .bind(now)
                .bind(&updated.id)
                .execute(&mut *tx)
                .await
                .map_err(|e| {
                    AppError::conflict_on_unique(
                        e,
                        "A task of this area uses a task ID that already exists in the target hospital",
                    )
                })?
                .rows_affected();

            tracing::debug!("Reassigned {} task(s) with area {}", moved, updated.id);
        }

        tx.commit().await?;

        tracing::debug!("Updated area: {}", updated.id);
        Ok(updated)
    }

    pub async fn delete_area(&self, id: &str) -> Result<()> {
        let rows = sqlx::query("DELETE FROM areas WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?
            .rows_affected();

        if rows == 0 {
            return Err(AppError::not_found("Area", id));
        }

        tracing::debug!("Deleted area: {}", id);
        Ok(())
    }

    pub async fn count_areas_in_hospital(&self, hospital_id: &str) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM areas WHERE hospital_id = ?")
            .bind(hospital_id)
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    // ===== Tasks =====

    pub async fn create_task(&self, new: &NewTask) -> Result<Task> {
        let id = Uuid::new_v4().to_string();
        let now = Utc::now();

        let task = sqlx::query_as::<_, Task>(
            r#"
            INSERT INTO tasks (id, task_code, name, description, area_id, hospital_id,
                               is_active, sort_order, created_by, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, 1, ?, ?, ?, ?)
            RETURNING *
            "#,
        )
        .bind(&id)
        .bind(&new.task_code)
        .bind(&new.name)
        .bind(&new.description)
        .bind(&new.area_id)
        .bind(&new.hospital_id)
        .bind(new.sort_order)
        .bind(&new.created_by)
        .bind(now)
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::conflict_on_unique(e, "Task ID already exists in this hospital"))?;

        tracing::debug!("Created task: {} ({})", task.task_code, id);
        Ok(task)
    }

    pub async fn find_task(&self, id: &str) -> Result<Option<Task>> {
        let task = sqlx::query_as::<_, Task>("SELECT * FROM tasks WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(task)
    }

    pub async fn get_task(&self, id: &str) -> Result<Task> {
        self.find_task(id)
            .await?
            .ok_or_else(|| AppError::not_found("Task", id))
    }

    pub async fn get_task_detail(&self, id: &str) -> Result<TaskDetail> {
        let mut query = QueryBuilder::<Sqlite>::new(TASK_DETAIL_SELECT);
        query.push(" WHERE t.id = ").push_bind(id.to_string());

        query
            .build_query_as::<TaskDetail>()
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::not_found("Task", id))
    }

    pub async fn find_task_by_code(
        &self,
        task_code: &str,
        hospital_id: Option<&str>,
    ) -> Result<Option<Task>> {
        let task =
            sqlx::query_as::<_, Task>("SELECT * FROM tasks WHERE task_code = ? AND hospital_id IS ?")
                .bind(task_code)
                .bind(hospital_id)
                .fetch_optional(&self.pool)
                .await?;

        Ok(task)
    }

    /// Active tasks matching the filter, ordered by area, order, task ID
    pub async fn list_active_tasks(&self, filter: &TaskFilter) -> Result<Vec<TaskDetail>> {
        let mut query = QueryBuilder::<Sqlite>::new(TASK_DETAIL_SELECT);
        query.push(" WHERE t.is_active = 1");

        if let Some(area_id) = &filter.area_id {
            query.push(" AND t.area_id = ").push_bind(area_id.clone());
        }

        if let Some(area_ids) = &filter.area_ids {
            if area_ids.is_empty() {
                return Ok(Vec::new());
            }
            query.push(" AND t.area_id IN (");
            {
                let mut ids = query.separated(", ");
                for area_id in area_ids {
                    ids.push_bind(area_id.clone());
                }
                ids.push_unseparated(")");
            }
        }

        query.push(TASK_DETAIL_ORDER);

        let tasks = query
            .build_query_as::<TaskDetail>()
            .fetch_all(&self.pool)
            .await?;

        Ok(tasks)
    }

    /// Catalog listing, active and inactive. A hospital filter matches
    /// either the task's own hospital or its area's hospital.
    pub async fn list_tasks(&self, filter: &TaskListFilter) -> Result<(Vec<TaskDetail>, i64)> {
        let pattern = filter
            .search
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .map(like_pattern);

        let push_filters = |qb: &mut QueryBuilder<'static, Sqlite>| {
            qb.push(" WHERE 1 = 1");
            if let Some(hospital_id) = &filter.hospital_id {
                qb.push(" AND (t.hospital_id = ")
                    .push_bind(hospital_id.clone())
                    .push(" OR a.hospital_id = ")
                    .push_bind(hospital_id.clone())
                    .push(")");
            }
            if let Some(area_id) = &filter.area_id {
                qb.push(" AND t.area_id = ").push_bind(area_id.clone());
            }
            if let Some(pattern) = &pattern {
                qb.push(" AND (t.task_code LIKE ")
                    .push_bind(pattern.clone())
                    .push(" ESCAPE '\\' OR t.name LIKE ")
                    .push_bind(pattern.clone())
                    .push(" ESCAPE '\\' OR t.description LIKE ")
                    .push_bind(pattern.clone())
                    .push(" ESCAPE '\\')");
            }
        };

        let mut count_query = QueryBuilder::<Sqlite>::new(
            "SELECT COUNT(*) FROM tasks t JOIN areas a ON a.id = t.area_id",
        );
        push_filters(&mut count_query);
        let total: i64 = count_query.build_query_scalar().fetch_one(&self.pool).await?;

        let mut query = QueryBuilder::<Sqlite>::new(TASK_DETAIL_SELECT);
        push_filters(&mut query);
        query
            .push(TASK_DETAIL_ORDER)
            .push(" LIMIT ")
            .push_bind(filter.limit)
            .push(" OFFSET ")
            .push_bind(filter.offset);

        let tasks = query
            .build_query_as::<TaskDetail>()
            .fetch_all(&self.pool)
            .await?;

        Ok((tasks, total))
    }

    pub async fn count_tasks_in_area(&self, area_id: &str) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM tasks WHERE area_id = ?")
            .bind(area_id)
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    pub async fn update_task(&self, task: &Task) -> Result<Task> {
        sqlx::query_as::<_, Task>(
            r#"
            UPDATE tasks
            SET task_code = ?, name = ?, description = ?, area_id = ?, hospital_id = ?,
                is_active = ?, sort_order = ?, updated_at = ?
            WHERE id = ?
            RETURNING *
            "#,
        )
        .bind(&task.task_code)
        .bind(&task.name)
        .bind(&task.description)
        .bind(&task.area_id)
        .bind(&task.hospital_id)
        .bind(task.is_active)
        .bind(task.sort_order)
        .bind(Utc::now())
        .bind(&task.id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::conflict_on_unique(e, "Task ID already exists in this hospital"))?
        .ok_or_else(|| AppError::not_found("Task", &task.id))
    }

    pub async fn delete_task(&self, id: &str) -> Result<()> {
        let rows = sqlx::query("DELETE FROM tasks WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?
            .rows_affected();

        if rows == 0 {
            return Err(AppError::not_found("Task", id));
        }

        tracing::debug!("Deleted task: {}", id);
        Ok(())
    }
}
