#![allow(dead_code)]

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use airas::api::ApiClient;
use airas::config::ApiConfig;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Form, Json, Router};
use serde_json::{json, Value};

pub const PM_TOKEN: &str = "jwt-pm";
pub const EMPLOYEE_TOKEN: &str = "jwt-employee";

/// Backend state the stub mutates so tests can observe requests.
#[derive(Debug)]
pub struct StubState {
    pub matches: Value,
    pub match_calls: usize,
    pub allocation_batches: Vec<Value>,
    pub removed: Vec<i64>,
    pub recommendations: Value,
    /// Makes match-employees answer 503 once a batch has been accepted.
    pub matches_fail_after_allocate: bool,
    pub matches_down: bool,
}

impl Default for StubState {
    fn default() -> Self {
        Self {
            matches: json!({
                "Python": [
                    { "id": 1, "name": "Ana", "email": "ana@example.com", "availability": 100, "current_project": null, "allocated": false },
                    { "id": 2, "name": "Ben", "email": "ben@example.com", "availability": 60, "current_project": "Billing", "allocated": false }
                ],
                "Skill #2": []
            }),
            match_calls: 0,
            allocation_batches: Vec::new(),
            removed: Vec::new(),
            recommendations: json!([]),
            matches_fail_after_allocate: false,
            matches_down: false,
        }
    }
}

pub type Shared = Arc<Mutex<StubState>>;

pub struct Stub {
    pub addr: SocketAddr,
    pub state: Shared,
}

impl Stub {
    pub fn client(&self, token: Option<&str>) -> ApiClient {
        ApiClient::new(&ApiConfig {
            base_url: format!("http://{}", self.addr),
            ..ApiConfig::default()
        })
        .expect("client builds")
        .with_token(token.map(str::to_string))
    }
}

pub async fn spawn_stub(state: StubState) -> Stub {
    let state = Arc::new(Mutex::new(state));
    let app = Router::new()
        .route("/api/auth/login", post(login))
        .route("/api/auth/users/me", get(me))
        .route("/api/auth/users", get(users))
        .route("/api/projects", post(create_project))
        .route("/api/projects/:id", get(project))
        .route("/api/projects/:id/match-employees", get(match_employees))
        .route("/api/projects/:id/allocate-employees", post(allocate))
        .route("/api/projects/:id/remove-allocation", post(remove_allocation))
        .route("/api/ml/recommend-resources", post(recommend))
        .route("/api/skills", get(broken_skills))
        .route("/api/skills/:id", get(skill))
        .with_state(state.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind stub");
    let addr = listener.local_addr().expect("stub address");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("stub server");
    });
    Stub { addr, state }
}

fn detail(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "detail": message }))).into_response()
}

fn bearer(headers: &HeaderMap) -> Option<&str> {
    headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
}

async fn login(Form(form): Form<HashMap<String, String>>) -> Response {
    let username = form.get("username").cloned().unwrap_or_default();
    if form.get("password").map(String::as_str) != Some("secret") {
        return detail(StatusCode::UNAUTHORIZED, "Incorrect username or password");
    }
    let (token, role, id) = if username.starts_with("pm") {
        (PM_TOKEN, "project_manager", 1)
    } else {
        (EMPLOYEE_TOKEN, "employee", 4)
    };
    Json(json!({
        "access_token": token,
        "token_type": "bearer",
        "id": id,
        "email": username,
        "role": role,
        "username": username,
        "full_name": "Test User"
    }))
    .into_response()
}

async fn me(headers: HeaderMap) -> Response {
    match bearer(&headers) {
        Some(EMPLOYEE_TOKEN) => Json(json!({
            "id": 4,
            "email": "ana@example.com",
            "full_name": "Ana",
            "role": "employee",
            "skills": ["Python"],
            "availability_percentage": 40,
            "projects": [{ "id": 7, "name": "Billing revamp", "status": "active", "employee_allocation": 60 }]
        }))
        .into_response(),
        _ => detail(StatusCode::UNAUTHORIZED, "Not authenticated"),
    }
}

async fn users() -> Json<Value> {
    Json(json!([
        { "id": 1, "email": "ana@example.com", "full_name": "Ana", "role": "employee" },
        { "id": 2, "email": "ben@example.com", "full_name": "Ben", "role": "employee" }
    ]))
}

async fn create_project(Json(body): Json<Value>) -> Response {
    if body["name"].as_str().unwrap_or_default().is_empty() {
        return (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(json!({
                "detail": [
                    { "loc": ["body", "name"], "msg": "String should have at least 1 character", "type": "string_too_short" }
                ]
            })),
        )
            .into_response();
    }
    let mut created = body.clone();
    created["id"] = json!(21);
    Json(created).into_response()
}

async fn project(Path(id): Path<i64>) -> Response {
    if id != 7 {
        return detail(StatusCode::NOT_FOUND, "Project not found");
    }
    Json(json!({
        "id": 7,
        "name": "Billing revamp",
        "description": "Rebuild invoicing",
        "status": "active",
        "start_date": "2024-01-01",
        "end_date": "2024-06-30",
        "priority": 2,
        "manager_id": 1,
        "skill_requirements": [
            { "skill_id": 1, "employees_requested": 2 },
            { "skill_id": 2, "employees_requested": 1 }
        ],
        "resource_allocations": []
    }))
    .into_response()
}

async fn match_employees(State(state): State<Shared>, Path(_id): Path<i64>) -> Response {
    let mut state = state.lock().unwrap();
    state.match_calls += 1;
    if state.matches_down {
        return detail(StatusCode::SERVICE_UNAVAILABLE, "Matching service unavailable");
    }
    Json(state.matches.clone()).into_response()
}

async fn allocate(
    State(state): State<Shared>,
    Path(_id): Path<i64>,
    Json(body): Json<Value>,
) -> Response {
    let mut state = state.lock().unwrap();
    state.allocation_batches.push(body.clone());
    let allocations = body["allocations"].as_array().cloned().unwrap_or_default();
    if allocations
        .iter()
        .any(|a| a["allocation_percentage"].as_f64().unwrap_or_default() > 90.0)
    {
        return detail(
            StatusCode::BAD_REQUEST,
            "Employee Ana does not have sufficient availability",
        );
    }
    for a in &allocations {
        let skill = a["skill_name"].as_str().unwrap_or_default();
        let employee_id = a["employee_id"].as_i64().unwrap_or_default();
        if let Some(rows) = state.matches[skill].as_array_mut() {
            for row in rows.iter_mut().filter(|r| r["id"] == json!(employee_id)) {
                row["allocated"] = json!(true);
            }
        }
    }
    if state.matches_fail_after_allocate {
        state.matches_down = true;
    }
    detail(StatusCode::OK, "Employees allocated successfully")
}

async fn remove_allocation(
    State(state): State<Shared>,
    Path(_id): Path<i64>,
    Json(body): Json<Value>,
) -> Response {
    let employee_id = body["employee_id"].as_i64().unwrap_or_default();
    let mut state = state.lock().unwrap();
    state.removed.push(employee_id);
    if let Some(skills) = state.matches.as_object_mut() {
        for rows in skills.values_mut().filter_map(Value::as_array_mut) {
            for row in rows.iter_mut().filter(|r| r["id"] == json!(employee_id)) {
                row["allocated"] = json!(false);
            }
        }
    }
    detail(StatusCode::OK, "Allocation removed successfully")
}

async fn recommend(State(state): State<Shared>, Json(_body): Json<Value>) -> Json<Value> {
    let state = state.lock().unwrap();
    Json(json!({
        "status": "success",
        "message": "Recommendations generated",
        "recommendations": state.recommendations.clone()
    }))
}

async fn broken_skills() -> Response {
    (StatusCode::INTERNAL_SERVER_ERROR, "boom").into_response()
}

async fn skill(Path(id): Path<i64>) -> Response {
    match id {
        1 => Json(json!({ "id": 1, "name": "Python" })).into_response(),
        _ => detail(StatusCode::NOT_FOUND, "Skill not found"),
    }
}
