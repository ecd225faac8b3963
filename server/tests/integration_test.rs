//! Integration tests for the hospital checklist service
//!
//! These tests run against a file-backed database and verify:
//! - Daily checklist reconciliation and entry upserts
//! - Hospital scoping for reads and writes
//! - Reports and exports
//! - The HTTP surface

use axum::body::{to_bytes, Body};
use axum::http::{header, HeaderMap, Request, StatusCode};
use hospital_checklist::api::{build_router, USER_ID_HEADER};
use hospital_checklist::app::AppState;
use hospital_checklist::config::ServerConfig;
use hospital_checklist::database::{
    create_pool, Area, CreateAreaRequest, CreateHospitalRequest, CreateTaskRequest,
    CreateUserRequest, Hospital, Role, Task,
};
use hospital_checklist::error::AppError;
use hospital_checklist::pagination::PageRequest;
use hospital_checklist::services::{BulkEntryInput, Caller, EntryInput, ExportFormat};
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

struct World {
    state: AppState,
    admin: Caller,
    staff_a: Caller,
    a: Hospital,
    b: Hospital,
    icu: Area,
    tasks: Vec<Task>,
    _temp: TempDir,
}

/// Hospital A with an ICU of three tasks, an empty hospital B, an
/// unassigned admin and a staff member of A
async fn setup() -> World {
    let temp = TempDir::new().unwrap();
    let pool = create_pool(&temp.path().join("checklist.db")).await.unwrap();
    let state = AppState::from_pool(pool, &ServerConfig::default());

    let admin: Caller = state
        .users_service
        .ensure_admin("admin@example.org")
        .await
        .unwrap()
        .into();

    let a = state
        .hospitals_service
        .create_hospital(hospital("Hospital A", "HA"))
        .await
        .unwrap();
    let b = state
        .hospitals_service
        .create_hospital(hospital("Hospital B", "HB"))
        .await
        .unwrap();

    let icu = state
        .areas_service
        .create_area(
            &admin,
            CreateAreaRequest {
                name: "Intensive Care".into(),
                code: "ICU".into(),
                description: None,
                hospital_id: Some(a.id.clone()),
            },
        )
        .await
        .unwrap();

    let mut tasks = Vec::new();
    for (i, name) in ["Check oxygen", "Restock gloves", "Test defibrillator"]
        .iter()
        .enumerate()
    {
        let task = state
            .tasks_service
            .create_task(
                &admin,
                CreateTaskRequest {
                    task_code: None,
                    name: name.to_string(),
                    description: format!("{} daily", name),
                    area_id: icu.id.clone(),
                    order: Some(i as i64),
                },
            )
            .await
            .unwrap();
        tasks.push(task);
    }

    let staff_a: Caller = state
        .users_service
        .create_user(
            &admin,
            CreateUserRequest {
                name: "Ann".into(),
                email: "ann@example.org".into(),
                role: Role::Staff,
                hospital_id: Some(a.id.clone()),
            },
        )
        .await
        .unwrap()
        .into();

    World {
        state,
        admin,
        staff_a,
        a,
        b,
        icu,
        tasks,
        _temp: temp,
    }
}

fn hospital(name: &str, code: &str) -> CreateHospitalRequest {
    CreateHospitalRequest {
        name: name.into(),
        code: code.into(),
        ..Default::default()
    }
}

fn done(date: &str, staff: &str) -> EntryInput {
    EntryInput {
        date: date.into(),
        status: true,
        staff_name: Some(staff.into()),
        notes: None,
    }
}

fn undone(date: &str) -> EntryInput {
    EntryInput {
        date: date.into(),
        status: false,
        staff_name: None,
        notes: None,
    }
}

#[tokio::test]
async fn test_reconciliation_lists_every_task_and_counts_completion() {
    let w = setup().await;
    let checklist = &w.state.checklist_service;

    let rows = checklist
        .get_checklist(&w.staff_a, "2024-06-01", Some(&w.icu.id), Some(&w.a.id))
        .await
        .unwrap();
    assert_eq!(rows.len(), 3);
    assert!(rows.iter().all(|r| r.entry.is_none()));

    checklist
        .upsert_entry(&w.staff_a, &w.tasks[0].id, done("2024-06-01", "Ann"), None)
        .await
        .unwrap();

    let rows = checklist
        .get_checklist(&w.staff_a, "2024-06-01", Some(&w.icu.id), None)
        .await
        .unwrap();
    assert_eq!(rows.len(), 3);
    assert_eq!(rows.iter().filter(|r| r.is_completed()).count(), 1);
    assert_eq!(rows.iter().filter(|r| r.entry.is_some()).count(), 1);

    let stats = checklist
        .statistics(&w.staff_a, "2024-06-01", None)
        .await
        .unwrap();
    assert_eq!(
        (stats.total, stats.completed, stats.pending, stats.completion_rate),
        (3, 1, 2, 33)
    );
}

#[tokio::test]
async fn test_inactive_tasks_drop_out_of_the_checklist() {
    let w = setup().await;
    w.state
        .tasks_service
        .toggle_active(&w.admin, &w.tasks[2].id)
        .await
        .unwrap();

    let rows = w
        .state
        .checklist_service
        .get_checklist(&w.staff_a, "2024-06-01", None, None)
        .await
        .unwrap();
    assert_eq!(rows.len(), 2);
}

#[tokio::test]
async fn test_repeated_upserts_keep_one_entry_with_last_values() {
    let w = setup().await;
    let checklist = &w.state.checklist_service;
    let task = &w.tasks[1].id;

    let first = checklist
        .upsert_entry(&w.staff_a, task, done("2024-06-01", "Ann"), None)
        .await
        .unwrap();
    let second = checklist
        .upsert_entry(&w.staff_a, task, done("2024-06-01", "Bob"), None)
        .await
        .unwrap();

    assert_eq!(first.id, second.id);
    assert_eq!(second.staff_name, "Bob");

    let rows = checklist
        .get_checklist(&w.staff_a, "2024-06-01", None, None)
        .await
        .unwrap();
    let entries: Vec<_> = rows.iter().filter_map(|r| r.entry.as_ref()).collect();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].staff_name, "Bob");
}

#[tokio::test]
async fn test_completed_at_follows_status() {
    let w = setup().await;
    let checklist = &w.state.checklist_service;
    let task = &w.tasks[0].id;

    let pending = checklist
        .upsert_entry(&w.staff_a, task, undone("2024-06-01"), None)
        .await
        .unwrap();
    assert!(pending.completed_at.is_none());

    let completed = checklist
        .upsert_entry(&w.staff_a, task, done("2024-06-01", "Ann"), None)
        .await
        .unwrap();
    assert!(completed.completed_at.is_some());
    assert_eq!(completed.date, pending.date);

    let reopened = checklist
        .upsert_entry(&w.staff_a, task, undone("2024-06-01"), None)
        .await
        .unwrap();
    assert!(reopened.completed_at.is_none());
    assert_eq!(reopened.date, pending.date);
    assert_eq!(reopened.staff_name, "Ann");
}

#[tokio::test]
async fn test_times_of_day_collapse_to_one_entry() {
    let w = setup().await;
    let checklist = &w.state.checklist_service;
    let task = &w.tasks[0].id;

    let morning = checklist
        .upsert_entry(&w.staff_a, task, done("2024-01-01T03:00:00", "Ann"), None)
        .await
        .unwrap();
    let evening = checklist
        .upsert_entry(&w.staff_a, task, done("2024-01-01T22:00:00", "Ann"), None)
        .await
        .unwrap();
    let next_day = checklist
        .upsert_entry(&w.staff_a, task, done("2024-01-02T00:00:00", "Ann"), None)
        .await
        .unwrap();

    assert_eq!(morning.id, evening.id);
    assert_ne!(morning.id, next_day.id);
    assert_eq!(next_day.date.to_string(), "2024-01-02");
}

#[tokio::test]
async fn test_staff_cannot_reach_another_hospital() {
    let w = setup().await;
    let checklist = &w.state.checklist_service;

    let read = checklist
        .get_checklist(&w.staff_a, "2024-06-01", None, Some(&w.b.id))
        .await;
    assert!(matches!(read, Err(AppError::AccessDenied(_))));

    let write = checklist
        .upsert_entry(
            &w.staff_a,
            &w.tasks[0].id,
            done("2024-06-01", "Ann"),
            Some(&w.b.id),
        )
        .await;
    assert!(matches!(write, Err(AppError::AccessDenied(_))));

    let report = w
        .state
        .reports_service
        .get_report(&w.staff_a, "2024-06-01", "2024-06-30", None, Some(&w.b.id))
        .await;
    assert!(matches!(report, Err(AppError::AccessDenied(_))));
}

#[tokio::test]
async fn test_area_from_another_hospital_yields_empty_checklist() {
    let w = setup().await;

    let rows = w
        .state
        .checklist_service
        .get_checklist(&w.admin, "2024-06-01", Some(&w.icu.id), Some(&w.b.id))
        .await
        .unwrap();
    assert!(rows.is_empty());

    let all = w
        .state
        .checklist_service
        .get_checklist(&w.admin, "2024-06-01", None, None)
        .await
        .unwrap();
    assert_eq!(all.len(), 3);
}

#[tokio::test]
async fn test_exactly_one_default_hospital() {
    let w = setup().await;
    let hospitals = &w.state.hospitals_service;

    let c = hospitals
        .create_hospital(CreateHospitalRequest {
            is_default: true,
            ..hospital("Hospital C", "HC")
        })
        .await
        .unwrap();
    assert!(c.is_default);
    hospitals.set_default(&w.b.id).await.unwrap();
    hospitals.set_default(&w.a.id).await.unwrap();

    let page = hospitals
        .list_hospitals(None, true, PageRequest::new(None, None, 50))
        .await
        .unwrap();
    let defaults: Vec<_> = page.items.iter().filter(|h| h.is_default).collect();
    assert_eq!(defaults.len(), 1);
    assert_eq!(defaults[0].id, w.a.id);
    assert_eq!(hospitals.default_hospital().await.unwrap().id, w.a.id);
}

#[tokio::test]
async fn test_bulk_save_reports_each_item() {
    let w = setup().await;
    let items = vec![
        BulkEntryInput {
            task_id: w.tasks[0].id.clone(),
            status: true,
            staff_name: Some("Ann".into()),
            notes: None,
        },
        BulkEntryInput {
            task_id: "no-such-task".into(),
            status: true,
            staff_name: None,
            notes: None,
        },
        BulkEntryInput {
            task_id: w.tasks[1].id.clone(),
            status: false,
            staff_name: None,
            notes: Some("later".into()),
        },
    ];

    let result = w
        .state
        .checklist_service
        .save_checklist(&w.staff_a, "2024-06-01", items, None)
        .await
        .unwrap();
    assert_eq!(result.saved, 2);
    assert_eq!(result.failed, 1);
    assert_eq!(result.results.len(), 3);
}

#[tokio::test]
async fn test_report_filters_on_recording_time() {
    let w = setup().await;
    w.state
        .checklist_service
        .upsert_entry(&w.staff_a, &w.tasks[0].id, done("2020-01-01", "Ann"), None)
        .await
        .unwrap();

    let today = chrono::Utc::now().date_naive().to_string();
    let report = w
        .state
        .reports_service
        .get_report(&w.staff_a, &today, &today, None, None)
        .await
        .unwrap();
    assert_eq!(report.entries.len(), 1);
    assert_eq!(report.entries[0].date.to_string(), "2020-01-01");

    let old = w
        .state
        .reports_service
        .get_report(&w.staff_a, "2020-01-01", "2020-01-01", None, None)
        .await
        .unwrap();
    assert!(old.entries.is_empty());
}

#[tokio::test]
async fn test_daily_export_document() {
    let w = setup().await;
    let doc = w
        .state
        .exports_service
        .daily_export(&w.staff_a, "2024-06-01", None, None, ExportFormat::Csv)
        .await
        .unwrap();
    assert_eq!(doc.filename, "checklist_HA_2024-06-01.csv");
    assert_eq!(doc.rows.len(), 3);
    assert!(doc.rows.iter().all(|r| r[0] == "Hospital A"));
}

// ===== HTTP =====

async fn send(
    w: &World,
    method: &str,
    uri: &str,
    user: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Vec<u8>, HeaderMap) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(user) = user {
        builder = builder.header(USER_ID_HEADER, user);
    }
    let request = match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = build_router(w.state.clone()).oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, bytes.to_vec(), headers)
}

fn json(bytes: &[u8]) -> Value {
    serde_json::from_slice(bytes).unwrap()
}

#[tokio::test]
async fn test_health_is_open() {
    let w = setup().await;
    let (status, body, _) = send(&w, "GET", "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json(&body)["status"], "ok");
}

#[tokio::test]
async fn test_api_requires_caller() {
    let w = setup().await;
    let (status, body, _) = send(&w, "GET", "/api/checklist?date=2024-06-01", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(json(&body)["error"]["code"], "UNAUTHORIZED");

    let (status, _, _) = send(&w, "GET", "/api/checklist?date=2024-06-01", Some("ghost"), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_api_checklist_round_trip() {
    let w = setup().await;
    let uri = format!("/api/checklist/entries/{}", w.tasks[0].id);
    let (status, body, _) = send(
        &w,
        "PUT",
        &uri,
        Some(&w.staff_a.user_id),
        Some(serde_json::json!({"date": "2024-06-01", "status": true, "staffName": "Ann"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json(&body)["entry"]["staffName"], "Ann");

    let (status, body, _) = send(
        &w,
        "GET",
        "/api/checklist?date=2024-06-01",
        Some(&w.staff_a.user_id),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let rows = json(&body)["checklist"].as_array().unwrap().clone();
    assert_eq!(rows.len(), 3);
    assert_eq!(rows[0]["task"]["taskId"], "ICU1");
    assert_eq!(rows[0]["entry"]["status"], true);
    assert!(rows[1]["entry"].is_null());

    let (status, body, _) = send(
        &w,
        "GET",
        "/api/checklist/statistics?date=2024-06-01",
        Some(&w.staff_a.user_id),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json(&body)["completionRate"], 33);
}

#[tokio::test]
async fn test_api_cross_hospital_is_forbidden() {
    let w = setup().await;
    let uri = format!("/api/checklist?date=2024-06-01&hospitalId={}", w.b.id);
    let (status, body, _) = send(&w, "GET", &uri, Some(&w.staff_a.user_id), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(json(&body)["error"]["code"], "ACCESS_DENIED");
}

#[tokio::test]
async fn test_api_catalog_writes_need_admin() {
    let w = setup().await;
    let payload = serde_json::json!({"name": "Ward", "code": "WRD"});

    let (status, _, _) = send(&w, "POST", "/api/areas", Some(&w.staff_a.user_id), Some(payload.clone())).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body, _) = send(&w, "POST", "/api/areas", Some(&w.admin.user_id), Some(payload)).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(json(&body)["code"], "WRD");
}

#[tokio::test]
async fn test_api_csv_export() {
    let w = setup().await;
    let (status, body, headers) = send(
        &w,
        "GET",
        "/api/checklist/export?date=2024-06-01&format=csv",
        Some(&w.staff_a.user_id),
        None,
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(headers[header::CONTENT_TYPE], "text/csv");
    assert_eq!(
        headers[header::CONTENT_DISPOSITION],
        "attachment; filename=\"checklist_HA_2024-06-01.csv\""
    );
    let csv = String::from_utf8(body).unwrap();
    assert!(csv.starts_with("Hospital,Task ID,Area,"));
    assert_eq!(csv.lines().count(), 4);
}

#[tokio::test]
async fn test_api_export_edge_cases() {
    let w = setup().await;
    let user = Some(w.staff_a.user_id.as_str());

    let (status, _, _) = send(&w, "GET", "/api/checklist/export?date=2024-06-01&format=pdf", user, None).await;
    assert_eq!(status, StatusCode::NOT_IMPLEMENTED);

    let (status, body, _) = send(
        &w,
        "GET",
        "/api/checklist/export?startDate=2020-01-01&endDate=2020-01-31",
        user,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json(&body)["error"]["code"], "NO_DATA");

    let (status, _, _) = send(&w, "GET", "/api/checklist/export?format=csv", user, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_api_default_hospital_cannot_be_deleted() {
    let w = setup().await;
    let uri = format!("/api/hospitals/{}", w.a.id);
    let (status, body, _) = send(&w, "DELETE", &uri, Some(&w.admin.user_id), None).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(json(&body)["error"]["code"], "INVARIANT_VIOLATION");
}

#[tokio::test]
async fn test_api_bulk_save_keeps_good_items_when_one_is_malformed() {
    let w = setup().await;
    let payload = serde_json::json!({
        "date": "2024-06-01",
        "entries": [
            {"taskId": w.tasks[0].id, "status": true, "staffName": "Ann"},
            {"taskId": w.tasks[1].id, "status": "yes"},
        ],
    });

    let (status, body, _) = send(
        &w,
        "POST",
        "/api/checklist/save",
        Some(&w.staff_a.user_id),
        Some(payload),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let result = json(&body);
    assert_eq!(result["saved"], 1);
    assert_eq!(result["failed"], 1);
    assert_eq!(result["results"][0]["outcome"], "saved");
    assert_eq!(result["results"][1]["outcome"], "failed");
    assert_eq!(result["results"][1]["taskId"], w.tasks[1].id.as_str());

    let rows = w
        .state
        .checklist_service
        .get_checklist(&w.staff_a, "2024-06-01", None, None)
        .await
        .unwrap();
    assert!(rows[0].is_completed());
    assert!(rows[1].entry.is_none());
}

#[tokio::test]
async fn test_api_malformed_input_uses_error_envelope() {
    let w = setup().await;
    let request = Request::builder()
        .method("POST")
        .uri("/api/checklist/save")
        .header(USER_ID_HEADER, w.staff_a.user_id.as_str())
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{\"date\": \"2024-06-01\", \"entries\": ["))
        .unwrap();
    let response = build_router(w.state.clone()).oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert_eq!(json(&bytes)["error"]["code"], "INVALID_INPUT");

    let (status, body, _) = send(
        &w,
        "GET",
        "/api/reports?startDate=2024-06-01",
        Some(&w.staff_a.user_id),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json(&body)["error"]["code"], "INVALID_INPUT");
}

#[tokio::test]
async fn test_api_staff_record_lifecycle() {
    let w = setup().await;
    let ann = Some(w.staff_a.user_id.as_str());
    let admin = Some(w.admin.user_id.as_str());

    let (status, body, _) = send(
        &w,
        "POST",
        "/api/staff-records",
        ann,
        Some(serde_json::json!({
            "title": "Oxygen cylinder low",
            "category": "supply_request",
            "description": "Bay 3 cylinder below a quarter",
            "priority": "urgent",
            "areaId": w.icu.id,
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let created = json(&body);
    assert_eq!(created["status"], "open");
    assert_eq!(created["hospitalId"], w.a.id.as_str());
    assert_eq!(created["areaCode"], "ICU");
    assert_eq!(created["createdByName"], "Ann");
    let uri = format!("/api/staff-records/{}", created["id"].as_str().unwrap());

    let (status, body, _) = send(
        &w,
        "PUT",
        &uri,
        admin,
        Some(serde_json::json!({"status": "resolved"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let resolved = json(&body);
    assert_eq!(resolved["resolvedBy"], w.admin.user_id.as_str());
    assert!(resolved["resolvedAt"].is_string());

    let (status, body, _) = send(
        &w,
        "GET",
        "/api/staff-records?status=open,in_progress",
        ann,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json(&body)["pagination"]["total"], 0);

    let (status, body, _) = send(&w, "GET", "/api/staff-records/stats", ann, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json(&body)["byStatus"]["resolved"], 1);
    assert_eq!(json(&body)["byCategory"]["supply_request"], 1);

    let (status, body, _) = send(&w, "PUT", &uri, ann, Some(serde_json::json!({"status": "done"}))).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(json(&body)["error"]["code"], "INVALID_INPUT");

    let (status, _, _) = send(&w, "DELETE", &uri, ann, None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, body, _) = send(&w, "GET", &uri, ann, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json(&body)["error"]["code"], "NOT_FOUND");
}
