//! Tasks service
//!
//! The task write path is the only writer of a task's hospital: it is
//! copied from the owning area on create and on area reassignment.

use super::areas::ensure_visible;
use super::tenant::{Caller, TenantResolver};
use super::validation;
use crate::config::{MAX_TASK_DESCRIPTION_LENGTH, MAX_TASK_ID_LENGTH, MAX_TASK_NAME_LENGTH};
use crate::database::{
    Area, CreateTaskRequest, NewTask, Repository, Task, TaskDetail, TaskFilter, TaskListFilter,
    UpdateTaskRequest,
};
use crate::error::{AppError, Result};
use crate::pagination::{Page, PageRequest};

/// Service for managing tasks
#[derive(Clone)]
pub struct TasksService {
    repo: Repository,
    tenant: TenantResolver,
}

impl TasksService {
    pub fn new(repo: Repository, tenant: TenantResolver) -> Self {
        Self { repo, tenant }
    }

    /// Create a task under an area. Without an explicit task ID one is
    /// generated from the area code.
    pub async fn create_task(&self, caller: &Caller, req: CreateTaskRequest) -> Result<Task> {
        caller.require_admin("create tasks")?;

        let name = validation::required("name", &req.name, MAX_TASK_NAME_LENGTH)?;
        let description =
            validation::required("description", &req.description, MAX_TASK_DESCRIPTION_LENGTH)?;
        let area = self.repo.get_area(req.area_id.trim()).await?;

        let task_code = match req.task_code.as_deref().map(str::trim) {
            Some(code) if !code.is_empty() => validation::code("taskId", code, MAX_TASK_ID_LENGTH)?,
            _ => self.next_task_code(&area).await?,
        };

        tracing::info!("Creating task {} in area {}", task_code, area.code);

        let task = self
            .repo
            .create_task(&NewTask {
                task_code,
                name,
                description,
                area_id: area.id.clone(),
                hospital_id: area.hospital_id.clone(),
                sort_order: req.order.unwrap_or(0),
                created_by: Some(caller.user_id.clone()),
            })
            .await?;

        tracing::info!("Task created successfully: {}", task.id);
        Ok(task)
    }

    /// `<AREA_CODE><n>` with n = tasks in the area + 1, skipping codes
    /// already taken in the area's hospital.
    async fn next_task_code(&self, area: &Area) -> Result<String> {
        let mut n = self.repo.count_tasks_in_area(&area.id).await? + 1;
        loop {
            let candidate = format!("{}{}", area.code, n);
            if self
                .repo
                .find_task_by_code(&candidate, area.hospital_id.as_deref())
                .await?
                .is_none()
            {
                return Ok(candidate);
            }
            n += 1;
        }
    }

    pub async fn get_task(&self, caller: &Caller, id: &str) -> Result<TaskDetail> {
        let detail = self.repo.get_task_detail(id).await?;
        if !caller.is_admin() {
            let scope = self.tenant.read_scope(caller, None).await?;
            let owner = detail
                .task
                .hospital_id
                .as_deref()
                .or(detail.area_hospital_id.as_deref());
            ensure_visible(&scope, owner)?;
        }
        Ok(detail)
    }

    /// Catalog listing ordered like the daily checklist
    pub async fn list_tasks(
        &self,
        caller: &Caller,
        hospital_id: Option<&str>,
        area_id: Option<&str>,
        search: Option<&str>,
        page: PageRequest,
    ) -> Result<Page<TaskDetail>> {
        let scope = self.tenant.read_scope(caller, hospital_id).await?;
        let filter = TaskListFilter {
            hospital_id: scope.hospital_id().map(str::to_string),
            area_id: area_id.map(str::to_string),
            search: search.map(str::to_string),
            limit: page.limit,
            offset: page.offset(),
        };

        let (items, total) = self.repo.list_tasks(&filter).await?;
        Ok(Page::new(items, page, total))
    }

    /// Active tasks of one area
    pub async fn list_tasks_by_area(&self, caller: &Caller, area_id: &str) -> Result<Vec<TaskDetail>> {
        let area = self.repo.get_area(area_id).await?;
        if !caller.is_admin() {
            let scope = self.tenant.read_scope(caller, None).await?;
            ensure_visible(&scope, area.hospital_id.as_deref())?;
        }

        self.repo
            .list_active_tasks(&TaskFilter {
                area_id: Some(area.id),
                area_ids: None,
            })
            .await
    }

    /// Partial update. Changing the area recomputes the task's hospital.
    pub async fn update_task(
        &self,
        caller: &Caller,
        id: &str,
        req: UpdateTaskRequest,
    ) -> Result<Task> {
        caller.require_admin("update tasks")?;
        tracing::debug!("Updating task: {}", id);

        let mut task = self.repo.get_task(id).await?;

        if let Some(code) = &req.task_code {
            task.task_code = validation::code("taskId", code, MAX_TASK_ID_LENGTH)?;
        }
        if let Some(name) = &req.name {
            task.name = validation::required("name", name, MAX_TASK_NAME_LENGTH)?;
        }
        if let Some(description) = &req.description {
            task.description =
                validation::required("description", description, MAX_TASK_DESCRIPTION_LENGTH)?;
        }
        if let Some(is_active) = req.is_active {
            task.is_active = is_active;
        }
        if let Some(order) = req.order {
            task.sort_order = order;
        }
        if let Some(area_id) = req.area_id.as_deref().map(str::trim) {
            if area_id != task.area_id {
                let area = self.repo.get_area(area_id).await?;
                tracing::debug!("Reassigning task {} to area {}", task.id, area.code);
                task.area_id = area.id;
                task.hospital_id = area.hospital_id;
            }
        }

        let updated = self.repo.update_task(&task).await?;

        tracing::debug!("Task updated successfully: {}", updated.id);
        Ok(updated)
    }

    /// Delete a task that has never been recorded on a checklist
    pub async fn delete_task(&self, caller: &Caller, id: &str) -> Result<()> {
        caller.require_admin("delete tasks")?;
        tracing::info!("Deleting task: {}", id);

        let task = self.repo.get_task(id).await?;
        let entries = self.repo.count_entries_for_task(&task.id).await?;
        if entries > 0 {
            return Err(AppError::Conflict(format!(
                "Task {} is recorded on {} checklist day(s); deactivate it instead",
                task.task_code, entries
            )));
        }

        self.repo.delete_task(id).await?;

        tracing::info!("Task deleted successfully: {}", id);
        Ok(())
    }

    pub async fn toggle_active(&self, caller: &Caller, id: &str) -> Result<Task> {
        let task = self.repo.get_task(id).await?;
        self.update_task(
            caller,
            id,
            UpdateTaskRequest {
                is_active: Some(!task.is_active),
                ..Default::default()
            },
        )
        .await
    }
}
