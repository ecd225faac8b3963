//! Areas service
//!
//! Areas belong to a hospital (or to none, for legacy rows). Moving an
//! area to another hospital recomputes the hospital of all its tasks.

use super::tenant::{Caller, HospitalScope, TenantResolver};
use super::validation;
use crate::config::{MAX_AREA_CODE_LENGTH, MAX_AREA_DESCRIPTION_LENGTH, MAX_AREA_NAME_LENGTH};
use crate::database::{Area, CreateAreaRequest, Repository, UpdateAreaRequest};
use crate::error::{AppError, Result};
use crate::pagination::{Page, PageRequest};

/// Service for managing areas
#[derive(Clone)]
pub struct AreasService {
    repo: Repository,
    tenant: TenantResolver,
}

impl AreasService {
    pub fn new(repo: Repository, tenant: TenantResolver) -> Self {
        Self { repo, tenant }
    }

    /// Create an area in the caller's write hospital
    pub async fn create_area(&self, caller: &Caller, req: CreateAreaRequest) -> Result<Area> {
        caller.require_admin("create areas")?;

        let name = validation::required("name", &req.name, MAX_AREA_NAME_LENGTH)?;
        let code = validation::code("code", &req.code, MAX_AREA_CODE_LENGTH)?;
        let description = validation::optional(
            "description",
            req.description.as_deref(),
            MAX_AREA_DESCRIPTION_LENGTH,
        )?;
        let hospital_id = self
            .tenant
            .write_hospital(caller, req.hospital_id.as_deref())
            .await?;

        tracing::info!("Creating area {} in hospital {}", code, hospital_id);

        let area = self
            .repo
            .create_area(
                &name,
                &code,
                description.as_deref(),
                Some(&hospital_id),
                Some(&caller.user_id),
            )
            .await?;

        tracing::info!("Area created successfully: {}", area.id);
        Ok(area)
    }

    pub async fn get_area(&self, caller: &Caller, id: &str) -> Result<Area> {
        let area = self.repo.get_area(id).await?;
        if !caller.is_admin() {
            let scope = self.tenant.read_scope(caller, None).await?;
            ensure_visible(&scope, area.hospital_id.as_deref())?;
        }
        Ok(area)
    }

    pub async fn list_areas(
        &self,
        caller: &Caller,
        hospital_id: Option<&str>,
        search: Option<&str>,
        page: PageRequest,
    ) -> Result<Page<Area>> {
        let scope = self.tenant.read_scope(caller, hospital_id).await?;
        let (items, total) = self
            .repo
            .list_areas(scope.hospital_id(), search, page.limit, page.offset())
            .await?;
        Ok(Page::new(items, page, total))
    }

    pub async fn list_active_areas(
        &self,
        caller: &Caller,
        hospital_id: Option<&str>,
    ) -> Result<Vec<Area>> {
        let scope = self.tenant.read_scope(caller, hospital_id).await?;
        self.repo.list_active_areas(scope.hospital_id()).await
    }

    /// Partial update. A new `hospitalId` moves the area and its tasks.
    pub async fn update_area(
        &self,
        caller: &Caller,
        id: &str,
        req: UpdateAreaRequest,
    ) -> Result<Area> {
        caller.require_admin("update areas")?;
        tracing::debug!("Updating area: {}", id);

        let mut area = self.repo.get_area(id).await?;

        if let Some(name) = &req.name {
            area.name = validation::required("name", name, MAX_AREA_NAME_LENGTH)?;
        }
        if let Some(code) = &req.code {
            area.code = validation::code("code", code, MAX_AREA_CODE_LENGTH)?;
        }
        if let Some(description) = &req.description {
            area.description =
                validation::optional("description", Some(description), MAX_AREA_DESCRIPTION_LENGTH)?;
        }
        if let Some(is_active) = req.is_active {
            area.is_active = is_active;
        }

        let mut moved = false;
        if let Some(requested) = req.hospital_id.as_deref() {
            let target = self.tenant.write_hospital(caller, Some(requested)).await?;
            if area.hospital_id.as_deref() != Some(target.as_str()) {
                tracing::info!(
                    "Moving area {} from {:?} to hospital {}",
                    area.id,
                    area.hospital_id,
                    target
                );
                area.hospital_id = Some(target);
                moved = true;
            }
        }

        let updated = self.repo.update_area(&area, moved).await?;

        tracing::debug!("Area updated successfully: {}", updated.id);
        Ok(updated)
    }

    /// Delete an area that has no tasks
    pub async fn delete_area(&self, caller: &Caller, id: &str) -> Result<()> {
        caller.require_admin("delete areas")?;
        tracing::info!("Deleting area: {}", id);

        let area = self.repo.get_area(id).await?;
        let tasks = self.repo.count_tasks_in_area(&area.id).await?;
        if tasks > 0 {
            return Err(AppError::Conflict(format!(
                "Area {} still has {} task(s); deactivate it instead",
                area.code, tasks
            )));
        }

        self.repo.delete_area(id).await?;

        tracing::info!("Area deleted successfully: {}", id);
        Ok(())
    }

    pub async fn toggle_active(&self, caller: &Caller, id: &str) -> Result<Area> {
        let area = self.repo.get_area(id).await?;
        self.update_area(
            caller,
            id,
            UpdateAreaRequest {
                is_active: Some(!area.is_active),
                ..Default::default()
            },
        )
        .await
    }
}

/// Catalog rows of another hospital are invisible to a hospital-scoped
/// read. Legacy rows without a hospital are visible everywhere.
pub(crate) fn ensure_visible(scope: &HospitalScope, owner: Option<&str>) -> Result<()> {
    match (scope, owner) {
        (HospitalScope::Hospital(scoped), Some(owner)) if scoped != owner => Err(
            AppError::AccessDenied("This record belongs to another hospital".into()),
        ),
        _ => Ok(()),
    }
}
