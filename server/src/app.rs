//! Application state and initialization
//!
//! This module manages the central application state and lifecycle.
//! All services are initialized here and made available through AppState.

use crate::config::ServerConfig;
use crate::database::{create_pool, Repository};
use crate::error::Result;
use crate::services::{
    AreasService, ChecklistService, ExportsService, HospitalsService, ReportsService,
    StaffRecordsService, TasksService, TenantResolver, UsersService,
};
use sqlx::SqlitePool;

/// Central application state holding all services
#[derive(Clone)]
pub struct AppState {
    pub tenant: TenantResolver,
    pub hospitals_service: HospitalsService,
    pub areas_service: AreasService,
    pub tasks_service: TasksService,
    pub users_service: UsersService,
    pub checklist_service: ChecklistService,
    pub reports_service: ReportsService,
    pub exports_service: ExportsService,
    pub staff_records_service: StaffRecordsService,
}

impl AppState {
    /// Wire every service over an already migrated pool
    pub fn from_pool(pool: SqlitePool, config: &ServerConfig) -> Self {
        let repo = Repository::new(pool);
        let hospitals_service = HospitalsService::new(repo.clone(), &config.default_hospital_name);
        let tenant = TenantResolver::new(repo.clone(), hospitals_service.clone());

        let checklist_service = ChecklistService::new(repo.clone(), tenant.clone());
        let reports_service = ReportsService::new(repo.clone(), tenant.clone());
        let exports_service = ExportsService::new(
            checklist_service.clone(),
            reports_service.clone(),
            hospitals_service.clone(),
            tenant.clone(),
        );

        Self {
            areas_service: AreasService::new(repo.clone(), tenant.clone()),
            tasks_service: TasksService::new(repo.clone(), tenant.clone()),
            staff_records_service: StaffRecordsService::new(repo.clone(), tenant.clone()),
            users_service: UsersService::new(repo, tenant.clone()),
            tenant,
            hospitals_service,
            checklist_service,
            reports_service,
            exports_service,
        }
    }
}

/// Application setup - called once on startup
pub async fn initialize(config: &ServerConfig) -> Result<AppState> {
    tracing::info!("Initializing application");
    tracing::info!("Database path: {:?}", config.database_path);

    let pool = create_pool(&config.database_path).await?;
    let state = AppState::from_pool(pool, config);

    if let Some(email) = config.admin_email.as_deref() {
        let admin = state.users_service.ensure_admin(email).await?;
        tracing::info!("Administrator available: {} ({})", admin.email, admin.id);
    }

    tracing::info!("Application initialized successfully");

    Ok(state)
}
