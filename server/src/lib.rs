//! Hospital checklist library
//!
//! Multi-hospital daily checklist tracking: catalog of hospitals, areas
//! and tasks, per-day completion entries, reports and exports. Exposed as
//! a library for the binary and the integration tests.

pub mod api;
pub mod app;
pub mod config;
pub mod database;
pub mod dates;
pub mod error;
pub mod pagination;
pub mod services;
