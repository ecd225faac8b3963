//! Tenant resolution
//!
//! Every request is reduced to a [`HospitalScope`] before it touches the
//! catalog or entry stores. Resolution order for an optional requested
//! hospital:
//!
//! 1. admin + requested: the requested hospital (must exist)
//! 2. non-admin assigned to another hospital + requested: access denied
//! 3. caller's assigned hospital
//! 4. the default hospital
//!
//! Reads diverge on step 4 for admins: an admin with no hospital and no
//! override sees all hospitals.

use super::hospitals::HospitalsService;
use crate::database::{Repository, Role, User};
use crate::error::{AppError, Result};
use serde::Serialize;

/// The authenticated principal behind a request
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Caller {
    pub user_id: String,
    pub name: String,
    pub role: Role,
    pub hospital_id: Option<String>,
}

impl Caller {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// Fail with `AccessDenied` unless the caller is an admin
    pub fn require_admin(&self, action: &str) -> Result<()> {
        if self.is_admin() {
            Ok(())
        } else {
            Err(AppError::AccessDenied(format!("Only administrators can {}", action)))
        }
    }
}

impl From<User> for Caller {
    fn from(user: User) -> Self {
        Self {
            user_id: user.id,
            name: user.name,
            role: user.role,
            hospital_id: user.hospital_id,
        }
    }
}

/// Which hospitals' data a read may see
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HospitalScope {
    AllHospitals,
    Hospital(String),
}

impl HospitalScope {
    pub fn hospital_id(&self) -> Option<&str> {
        match self {
            HospitalScope::AllHospitals => None,
            HospitalScope::Hospital(id) => Some(id),
        }
    }
}

/// Resolves callers and their effective hospital
#[derive(Clone)]
pub struct TenantResolver {
    repo: Repository,
    hospitals: HospitalsService,
}

impl TenantResolver {
    pub fn new(repo: Repository, hospitals: HospitalsService) -> Self {
        Self { repo, hospitals }
    }

    /// Load the caller for an upstream-verified user id
    pub async fn caller(&self, user_id: &str) -> Result<Caller> {
        let user = self
            .repo
            .get_user(user_id)
            .await
            .map_err(|e| match e {
                AppError::NotFound { .. } => AppError::AccessDenied("Unknown user".into()),
                other => other,
            })?;

        if !user.is_active {
            return Err(AppError::AccessDenied("User account is disabled".into()));
        }
        Ok(user.into())
    }

    /// Scope for a read
    pub async fn read_scope(&self, caller: &Caller, requested: Option<&str>) -> Result<HospitalScope> {
        let requested = normalize_requested(requested);

        if requested.is_none() && caller.is_admin() && caller.hospital_id.is_none() {
            return Ok(HospitalScope::AllHospitals);
        }

        self.resolve(caller, requested).await.map(HospitalScope::Hospital)
    }

    /// Concrete hospital a write lands on
    pub async fn write_hospital(&self, caller: &Caller, requested: Option<&str>) -> Result<String> {
        self.resolve(caller, normalize_requested(requested)).await
    }

    async fn resolve(&self, caller: &Caller, requested: Option<&str>) -> Result<String> {
        if let Some(requested) = requested {
            if !caller.is_admin() {
                if let Some(own) = caller.hospital_id.as_deref() {
                    if own != requested {
                        tracing::warn!(
                            "User {} denied access to hospital {}",
                            caller.user_id,
                            requested
                        );
                        return Err(AppError::AccessDenied(
                            "You can only access data from your assigned hospital".into(),
                        ));
                    }
                }
            }
            let hospital = self.hospitals.get_hospital(requested).await?;
            return Ok(hospital.id);
        }

        if let Some(own) = &caller.hospital_id {
            return Ok(own.clone());
        }

        Ok(self.hospitals.default_hospital().await?.id)
    }
}

/// Blank overrides count as absent
pub(crate) fn normalize_requested(requested: Option<&str>) -> Option<&str> {
    requested.map(str::trim).filter(|s| !s.is_empty())
}
