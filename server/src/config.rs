//! Application configuration
//!
//! Central location for validation boundaries and pagination defaults,
//! plus the runtime `ServerConfig` loaded from an optional JSON file and
//! `CHECKLIST_*` environment overrides.

use crate::error::{AppError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

// ===== Hospital Limits =====

/// Maximum length for a hospital name
pub const MAX_HOSPITAL_NAME_LENGTH: usize = 200;
/// Maximum length for a hospital code (stored uppercase)
pub const MAX_HOSPITAL_CODE_LENGTH: usize = 20;
pub const MAX_ADDRESS_LENGTH: usize = 500;
pub const MAX_PHONE_LENGTH: usize = 20;

/// Code of the hospital created lazily when no default exists.
pub const DEFAULT_HOSPITAL_CODE: &str = "DEFAULT";

// ===== Area Limits =====

pub const MAX_AREA_NAME_LENGTH: usize = 100;
/// Area codes are short labels shown next to task IDs (e.g. "ICU")
pub const MAX_AREA_CODE_LENGTH: usize = 10;
pub const MAX_AREA_DESCRIPTION_LENGTH: usize = 500;

// ===== Task Limits =====

pub const MAX_TASK_ID_LENGTH: usize = 20;
pub const MAX_TASK_NAME_LENGTH: usize = 200;
pub const MAX_TASK_DESCRIPTION_LENGTH: usize = 1000;

// ===== Entry Limits =====

pub const MAX_STAFF_NAME_LENGTH: usize = 100;
pub const MAX_NOTES_LENGTH: usize = 1000;

// ===== Staff Record Limits =====

pub const MAX_RECORD_TITLE_LENGTH: usize = 200;
pub const MAX_RECORD_DESCRIPTION_LENGTH: usize = 2000;

// ===== User Limits =====

pub const MAX_USER_NAME_LENGTH: usize = 100;

// ===== Pagination =====

/// Page size used when a listing request does not specify one
pub const DEFAULT_PAGE_SIZE: i64 = 50;
/// Task listings are longer than other catalog listings
pub const DEFAULT_TASK_PAGE_SIZE: i64 = 100;
pub const DEFAULT_RECORD_PAGE_SIZE: i64 = 20;
/// Upper bound on any requested page size
pub const MAX_PAGE_SIZE: i64 = 500;

/// Runtime server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Socket address the HTTP listener binds to
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
    /// SQLite database file
    #[serde(default = "default_database_path")]
    pub database_path: PathBuf,
    /// Display name given to the lazily created default hospital
    #[serde(default = "default_hospital_name")]
    pub default_hospital_name: String,
    /// `tracing` filter used when `RUST_LOG` is unset
    #[serde(default = "default_log_filter")]
    pub log_filter: String,
    /// Email of an administrator to create at startup if missing
    #[serde(default)]
    pub admin_email: Option<String>,
}

fn default_bind_address() -> String {
    "127.0.0.1:5080".to_string()
}

fn default_database_path() -> PathBuf {
    PathBuf::from("data/checklist.sqlite")
}

fn default_hospital_name() -> String {
    "Default Hospital".to_string()
}

fn default_log_filter() -> String {
    "hospital_checklist=debug,info".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            database_path: default_database_path(),
            default_hospital_name: default_hospital_name(),
            log_filter: default_log_filter(),
            admin_email: None,
        }
    }
}

impl ServerConfig {
    /// Load configuration from a JSON file (if present) and apply
    /// environment overrides on top.
    pub async fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) if tokio::fs::try_exists(path).await? => {
                tracing::info!("Loading configuration from {:?}", path);
                let content = tokio::fs::read_to_string(path).await?;
                serde_json::from_str::<ServerConfig>(&content)?
            }
            Some(path) => {
                tracing::info!("Configuration file {:?} not found, using defaults", path);
                ServerConfig::default()
            }
            None => ServerConfig::default(),
        };

        config.apply_overrides(|key| std::env::var(key).ok());
        config.validate()?;

        Ok(config)
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(bind) = lookup("CHECKLIST_BIND") {
            self.bind_address = bind;
        }
        if let Some(db) = lookup("CHECKLIST_DATABASE") {
            self.database_path = PathBuf::from(db);
        }
        if let Some(name) = lookup("CHECKLIST_DEFAULT_HOSPITAL_NAME") {
            self.default_hospital_name = name;
        }
        if let Some(filter) = lookup("CHECKLIST_LOG") {
            self.log_filter = filter;
        }
        if let Some(email) = lookup("CHECKLIST_ADMIN_EMAIL") {
            self.admin_email = Some(email).filter(|e| !e.trim().is_empty());
        }
    }

    fn validate(&self) -> Result<()> {
        if self.bind_address.trim().is_empty() {
            return Err(AppError::Config("bind_address cannot be empty".into()));
        }
        let name = self.default_hospital_name.trim();
        if name.is_empty() || name.chars().count() > MAX_HOSPITAL_NAME_LENGTH {
            return Err(AppError::Config(format!(
                "default_hospital_name must be 1-{} characters",
                MAX_HOSPITAL_NAME_LENGTH
            )));
        }
        Ok(())
    }
}
