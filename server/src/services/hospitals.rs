//! Hospitals service
//!
//! Hospital lifecycle and the single-default rule. The first hospital
//! ever created becomes the default; when none exists, one is created
//! lazily under the `DEFAULT` code.

use super::validation;
use crate::config::{
    DEFAULT_HOSPITAL_CODE, MAX_ADDRESS_LENGTH, MAX_HOSPITAL_CODE_LENGTH, MAX_HOSPITAL_NAME_LENGTH,
    MAX_PHONE_LENGTH,
};
use crate::database::{
    CreateHospitalRequest, Hospital, HospitalBranding, Repository, UpdateHospitalRequest,
};
use crate::error::{AppError, Result};
use crate::pagination::{Page, PageRequest};

/// Service for managing hospitals
#[derive(Clone)]
pub struct HospitalsService {
    repo: Repository,
    default_name: String,
}

impl HospitalsService {
    pub fn new(repo: Repository, default_name: impl Into<String>) -> Self {
        Self {
            repo,
            default_name: default_name.into(),
        }
    }

    /// Create a hospital. Becomes the default when requested or when it is
    /// the first hospital.
    pub async fn create_hospital(&self, req: CreateHospitalRequest) -> Result<Hospital> {
        let req = normalize_create(req)?;
        tracing::info!("Creating hospital: {} ({})", req.name, req.code);

        let make_default = req.is_default || self.repo.count_hospitals().await? == 0;
        let hospital = self.repo.create_hospital(&req, make_default).await?;

        tracing::info!(
            "Hospital created successfully: {} (default={})",
            hospital.id,
            hospital.is_default
        );
        Ok(hospital)
    }

    pub async fn get_hospital(&self, id: &str) -> Result<Hospital> {
        self.repo.get_hospital(id).await
    }

    pub async fn get_hospital_by_code(&self, code: &str) -> Result<Hospital> {
        let code = code.trim().to_uppercase();
        self.repo
            .find_hospital_by_code(&code)
            .await?
            .ok_or_else(|| AppError::not_found("Hospital", code))
    }

    /// List hospitals, default first then by name
    pub async fn list_hospitals(
        &self,
        search: Option<&str>,
        include_inactive: bool,
        page: PageRequest,
    ) -> Result<Page<Hospital>> {
        let (items, total) = self
            .repo
            .list_hospitals(search, include_inactive, page.limit, page.offset())
            .await?;
        Ok(Page::new(items, page, total))
    }

    pub async fn list_active_hospitals(&self) -> Result<Vec<Hospital>> {
        self.repo.list_active_hospitals().await
    }

    /// Apply a partial update. `isDefault: true` promotes the hospital;
    /// the current default can neither be deactivated nor un-defaulted.
    pub async fn update_hospital(&self, id: &str, req: UpdateHospitalRequest) -> Result<Hospital> {
        tracing::debug!("Updating hospital: {}", id);

        let mut hospital = self.repo.get_hospital(id).await?;

        if let Some(name) = &req.name {
            hospital.name = validation::required("name", name, MAX_HOSPITAL_NAME_LENGTH)?;
        }
        if let Some(code) = &req.code {
            hospital.code = validation::code("code", code, MAX_HOSPITAL_CODE_LENGTH)?;
        }
        if let Some(logo_url) = &req.logo_url {
            hospital.logo_url = validation::optional("logoUrl", Some(logo_url), usize::MAX)?;
        }
        if let Some(address) = &req.address {
            hospital.address = validation::optional("address", Some(address), MAX_ADDRESS_LENGTH)?;
        }
        if let Some(phone) = &req.phone {
            hospital.phone = validation::optional("phone", Some(phone), MAX_PHONE_LENGTH)?;
        }
        if let Some(email) = &req.email {
            hospital.email = validation::email(Some(email))?;
        }
        if let Some(is_active) = req.is_active {
            if hospital.is_default && !is_active {
                tracing::warn!("Refused to deactivate default hospital {}", id);
                return Err(AppError::InvariantViolation(
                    "The default hospital cannot be deactivated".into(),
                ));
            }
            hospital.is_active = is_active;
        }
        if req.is_default == Some(false) && hospital.is_default {
            return Err(AppError::InvariantViolation(
                "Set another hospital as default instead of unsetting this one".into(),
            ));
        }
        let promote = req.is_default == Some(true) && !hospital.is_default;
        if promote && !hospital.is_active {
            tracing::warn!("Refused to make inactive hospital {} the default", id);
            return Err(AppError::InvariantViolation(
                "An inactive hospital cannot be the default".into(),
            ));
        }

        let updated = self.repo.update_hospital(&hospital).await?;

        if promote {
            return self.set_default(&updated.id).await;
        }

        tracing::debug!("Hospital updated successfully: {}", updated.id);
        Ok(updated)
    }

    pub async fn update_logo(&self, id: &str, logo_url: Option<String>) -> Result<Hospital> {
        let mut hospital = self.repo.get_hospital(id).await?;
        hospital.logo_url = validation::optional("logoUrl", logo_url.as_deref(), usize::MAX)?;
        self.repo.update_hospital(&hospital).await
    }

    /// Delete a hospital that owns no areas or users. The default hospital
    /// is never deleted.
    pub async fn delete_hospital(&self, id: &str) -> Result<()> {
        tracing::info!("Deleting hospital: {}", id);

        let hospital = self.repo.get_hospital(id).await?;
        if hospital.is_default {
            tracing::warn!("Refused to delete default hospital {}", id);
            return Err(AppError::InvariantViolation(
                "The default hospital cannot be deleted".into(),
            ));
        }

        let areas = self.repo.count_areas_in_hospital(id).await?;
        let users = self.repo.count_users_in_hospital(id).await?;
        if areas > 0 || users > 0 {
            return Err(AppError::Conflict(format!(
                "Hospital {} still has {} area(s) and {} user(s)",
                hospital.code, areas, users
            )));
        }

        self.repo.delete_hospital(id).await?;

        tracing::info!("Hospital deleted successfully: {}", id);
        Ok(())
    }

    pub async fn toggle_active(&self, id: &str) -> Result<Hospital> {
        let hospital = self.repo.get_hospital(id).await?;
        self.update_hospital(
            id,
            UpdateHospitalRequest {
                is_active: Some(!hospital.is_active),
                ..Default::default()
            },
        )
        .await
    }

    /// Make `id` the only default hospital
    pub async fn set_default(&self, id: &str) -> Result<Hospital> {
        let hospital = self.repo.get_hospital(id).await?;
        if !hospital.is_active {
            return Err(AppError::InvariantViolation(
                "An inactive hospital cannot be the default".into(),
            ));
        }

        let hospital = self.repo.set_default_hospital(id).await?;
        tracing::info!("Default hospital set to {} ({})", hospital.code, hospital.id);
        Ok(hospital)
    }

    /// The default hospital, created on first use when none exists.
    pub async fn default_hospital(&self) -> Result<Hospital> {
        if let Some(hospital) = self.repo.find_default_hospital().await? {
            return Ok(hospital);
        }

        if self.repo.find_hospital_by_code(DEFAULT_HOSPITAL_CODE).await?.is_none() {
            tracing::info!("No default hospital found, creating {}", DEFAULT_HOSPITAL_CODE);
            self.repo
                .insert_default_hospital(&self.default_name, DEFAULT_HOSPITAL_CODE)
                .await?;
        }

        // Either our insert, or a concurrent writer's default
        if let Some(hospital) = self.repo.find_default_hospital().await? {
            return Ok(hospital);
        }

        // A DEFAULT-coded hospital exists without the flag: promote it
        let existing = self
            .repo
            .find_hospital_by_code(DEFAULT_HOSPITAL_CODE)
            .await?
            .ok_or_else(|| AppError::not_found("Hospital", DEFAULT_HOSPITAL_CODE))?;
        tracing::info!("Promoting existing {} hospital to default", DEFAULT_HOSPITAL_CODE);
        self.repo.set_default_hospital(&existing.id).await
    }

    /// Branding for exports: the given hospital, or the default one
    pub async fn branding(&self, hospital_id: Option<&str>) -> Result<HospitalBranding> {
        let hospital = match hospital_id {
            Some(id) => self.repo.get_hospital(id).await?,
            None => self.default_hospital().await?,
        };
        Ok(hospital.into())
    }
}

fn normalize_create(req: CreateHospitalRequest) -> Result<CreateHospitalRequest> {
    Ok(CreateHospitalRequest {
        name: validation::required("name", &req.name, MAX_HOSPITAL_NAME_LENGTH)?,
        code: validation::code("code", &req.code, MAX_HOSPITAL_CODE_LENGTH)?,
        logo_url: validation::optional("logoUrl", req.logo_url.as_deref(), usize::MAX)?,
        address: validation::optional("address", req.address.as_deref(), MAX_ADDRESS_LENGTH)?,
        phone: validation::optional("phone", req.phone.as_deref(), MAX_PHONE_LENGTH)?,
        email: validation::email(req.email.as_deref())?,
        is_default: req.is_default,
    })
}
