//! HTTP API
//!
//! Thin axum handlers over the services. All `/api` routes resolve the
//! caller from the `x-user-id` header; `/health` is open.

pub mod areas;
pub mod caller;
pub mod checklist;
pub mod error;
pub mod extract;
pub mod hospitals;
pub mod staff_records;
pub mod tasks;
pub mod users;

pub use caller::{CurrentCaller, USER_ID_HEADER};
pub use error::{ApiError, ApiResult};
pub use extract::{ApiJson, ApiQuery};

use crate::app::AppState;
use crate::pagination::PageRequest;
use axum::{
    routing::{get, post, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tower_http::trace::TraceLayer;

/// Query parameters shared by catalog listings
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub search: Option<String>,
    pub hospital_id: Option<String>,
    pub area_id: Option<String>,
    pub include_inactive: Option<bool>,
}

impl ListQuery {
    pub fn page_request(&self, default_limit: i64) -> PageRequest {
        PageRequest::new(self.page, self.limit, default_limit)
    }
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// GET /health
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    let checklist_routes: Router<AppState> = Router::new()
        .route("/api/checklist", get(checklist::get_checklist))
        .route("/api/checklist/entries/:task_id", put(checklist::upsert_entry))
        .route("/api/checklist/save", post(checklist::save_checklist))
        .route("/api/checklist/statistics", get(checklist::get_statistics))
        .route("/api/checklist/export", get(checklist::export_checklist))
        .route("/api/reports", get(checklist::get_report));

    let hospitals_routes: Router<AppState> = Router::new()
        .route(
            "/api/hospitals",
            get(hospitals::list_hospitals).post(hospitals::create_hospital),
        )
        .route("/api/hospitals/active", get(hospitals::list_active_hospitals))
        .route("/api/hospitals/branding", get(hospitals::get_branding))
        .route("/api/hospitals/code/:code", get(hospitals::get_hospital_by_code))
        .route(
            "/api/hospitals/:id",
            get(hospitals::get_hospital)
                .put(hospitals::update_hospital)
                .delete(hospitals::delete_hospital),
        )
        .route("/api/hospitals/:id/logo", put(hospitals::update_logo))
        .route("/api/hospitals/:id/toggle", post(hospitals::toggle_hospital))
        .route("/api/hospitals/:id/default", post(hospitals::set_default_hospital));

    let areas_routes: Router<AppState> = Router::new()
        .route("/api/areas", get(areas::list_areas).post(areas::create_area))
        .route("/api/areas/active", get(areas::list_active_areas))
        .route(
            "/api/areas/:id",
            get(areas::get_area)
                .put(areas::update_area)
                .delete(areas::delete_area),
        )
        .route("/api/areas/:id/tasks", get(areas::list_area_tasks))
        .route("/api/areas/:id/toggle", post(areas::toggle_area));

    let tasks_routes: Router<AppState> = Router::new()
        .route("/api/tasks", get(tasks::list_tasks).post(tasks::create_task))
        .route(
            "/api/tasks/:id",
            get(tasks::get_task)
                .put(tasks::update_task)
                .delete(tasks::delete_task),
        )
        .route("/api/tasks/:id/toggle", post(tasks::toggle_task));

    let users_routes: Router<AppState> = Router::new()
        .route("/api/users", get(users::list_users).post(users::create_user))
        .route(
            "/api/users/me",
            get(users::get_profile).put(users::update_profile),
        )
        .route(
            "/api/users/:id",
            get(users::get_user)
                .put(users::update_user)
                .delete(users::delete_user),
        )
        .route("/api/users/:id/toggle", post(users::toggle_user));

    let staff_records_routes: Router<AppState> = Router::new()
        .route(
            "/api/staff-records",
            get(staff_records::list_records).post(staff_records::create_record),
        )
        .route("/api/staff-records/stats", get(staff_records::get_stats))
        .route(
            "/api/staff-records/:id",
            get(staff_records::get_record)
                .put(staff_records::update_record)
                .delete(staff_records::delete_record),
        );

    Router::new()
        .route("/health", get(health_check))
        .merge(checklist_routes)
        .merge(hospitals_routes)
        .merge(areas_routes)
        .merge(tasks_routes)
        .merge(users_routes)
        .merge(staff_records_routes)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
