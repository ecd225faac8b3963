//! Users service
//!
//! Staff and admin accounts. Authentication happens upstream; a user row
//! only carries the role and assigned hospital used to scope requests.

use super::tenant::{Caller, TenantResolver};
use super::validation;
use crate::config::MAX_USER_NAME_LENGTH;
use crate::database::{CreateUserRequest, Repository, Role, UpdateUserRequest, User};
use crate::error::{AppError, Result};
use crate::pagination::{Page, PageRequest};

/// Service for managing users
#[derive(Clone)]
pub struct UsersService {
    repo: Repository,
    tenant: TenantResolver,
}

impl UsersService {
    pub fn new(repo: Repository, tenant: TenantResolver) -> Self {
        Self { repo, tenant }
    }

    pub async fn create_user(&self, caller: &Caller, req: CreateUserRequest) -> Result<User> {
        caller.require_admin("create users")?;

        let name = validation::required("name", &req.name, MAX_USER_NAME_LENGTH)?;
        let email = validation::email(Some(&req.email))?
            .ok_or_else(|| AppError::InvalidInput("email is required".into()))?;
        let hospital_id = self.existing_hospital(req.hospital_id.as_deref()).await?;

        tracing::info!("Creating {} user: {}", req.role.as_str(), email);

        let user = self
            .repo
            .create_user(&name, &email, req.role, hospital_id.as_deref())
            .await?;

        tracing::info!("User created successfully: {}", user.id);
        Ok(user)
    }

    /// Admins read anyone; other callers only themselves
    pub async fn get_user(&self, caller: &Caller, id: &str) -> Result<User> {
        if !caller.is_admin() && caller.user_id != id {
            return Err(AppError::AccessDenied("You can only view your own profile".into()));
        }
        self.repo.get_user(id).await
    }

    pub async fn list_users(
        &self,
        caller: &Caller,
        hospital_id: Option<&str>,
        search: Option<&str>,
        page: PageRequest,
    ) -> Result<Page<User>> {
        caller.require_admin("list users")?;

        let scope = self.tenant.read_scope(caller, hospital_id).await?;
        let (items, total) = self
            .repo
            .list_users(scope.hospital_id(), search, page.limit, page.offset())
            .await?;
        Ok(Page::new(items, page, total))
    }

    pub async fn update_user(
        &self,
        caller: &Caller,
        id: &str,
        req: UpdateUserRequest,
    ) -> Result<User> {
        caller.require_admin("update users")?;
        tracing::debug!("Updating user: {}", id);

        let mut user = self.repo.get_user(id).await?;

        if let Some(name) = &req.name {
            user.name = validation::required("name", name, MAX_USER_NAME_LENGTH)?;
        }
        if let Some(email) = &req.email {
            user.email = validation::email(Some(email))?
                .ok_or_else(|| AppError::InvalidInput("email is required".into()))?;
        }
        if let Some(role) = req.role {
            if caller.user_id == user.id && role != Role::Admin {
                return Err(AppError::InvariantViolation(
                    "You cannot remove your own administrator role".into(),
                ));
            }
            user.role = role;
        }
        if let Some(hospital_id) = &req.hospital_id {
            user.hospital_id = self.existing_hospital(Some(hospital_id)).await?;
        }
        if let Some(is_active) = req.is_active {
            if caller.user_id == user.id && !is_active {
                return Err(AppError::InvariantViolation(
                    "You cannot deactivate your own account".into(),
                ));
            }
            user.is_active = is_active;
        }

        let updated = self.repo.update_user(&user).await?;

        tracing::debug!("User updated successfully: {}", updated.id);
        Ok(updated)
    }

    /// Self-service update of name and email
    pub async fn update_profile(
        &self,
        caller: &Caller,
        name: Option<String>,
        email: Option<String>,
    ) -> Result<User> {
        let mut user = self.repo.get_user(&caller.user_id).await?;

        if let Some(name) = &name {
            user.name = validation::required("name", name, MAX_USER_NAME_LENGTH)?;
        }
        if let Some(email) = &email {
            user.email = validation::email(Some(email))?
                .ok_or_else(|| AppError::InvalidInput("email is required".into()))?;
        }

        self.repo.update_user(&user).await
    }

    pub async fn delete_user(&self, caller: &Caller, id: &str) -> Result<()> {
        caller.require_admin("delete users")?;
        if caller.user_id == id {
            return Err(AppError::InvariantViolation(
                "You cannot delete your own account".into(),
            ));
        }

        tracing::info!("Deleting user: {}", id);
        self.repo.delete_user(id).await?;
        tracing::info!("User deleted successfully: {}", id);
        Ok(())
    }

    pub async fn toggle_active(&self, caller: &Caller, id: &str) -> Result<User> {
        let user = self.repo.get_user(id).await?;
        self.update_user(
            caller,
            id,
            UpdateUserRequest {
                is_active: Some(!user.is_active),
                ..Default::default()
            },
        )
        .await
    }

    /// Create the first administrator when no account uses `email` yet.
    pub async fn ensure_admin(&self, email: &str) -> Result<User> {
        let email = validation::email(Some(email))?
            .ok_or_else(|| AppError::Config("admin email cannot be empty".into()))?;

        if let Some(user) = self.repo.find_user_by_email(&email).await? {
            return Ok(user);
        }

        tracing::info!("Creating bootstrap administrator: {}", email);
        self.repo
            .create_user("Administrator", &email, Role::Admin, None)
            .await
    }

    async fn existing_hospital(&self, hospital_id: Option<&str>) -> Result<Option<String>> {
        match hospital_id.map(str::trim).filter(|s| !s.is_empty()) {
            Some(id) => Ok(Some(self.repo.get_hospital(id).await?.id)),
            None => Ok(None),
        }
    }
}
