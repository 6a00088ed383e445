mod common;

use airas::error::{ApiError, ErrorDetail, FieldError, CONNECT_FAILURE_MESSAGE};
use airas::models::{NewProject, ProjectStatus};
use airas::routes::{self, Access};
use airas::session::store::LocalStore;
use airas::session::Session;
use chrono::NaiveDate;
use reqwest::StatusCode;

use common::{spawn_stub, StubState, EMPLOYEE_TOKEN, PM_TOKEN};

#[tokio::test]
async fn login_persists_session_and_picks_landing_route() {
    let stub = spawn_stub(StubState::default()).await;
    let dir = tempfile::tempdir().unwrap();
    let db = dir.path().join("session.db");

    let mut session = Session::hydrate(LocalStore::open(&db).unwrap()).unwrap();
    let landing = session
        .login(&stub.client(None), "pm@example.com", "secret")
        .await
        .unwrap();
    assert_eq!(landing, "/dashboard");
    assert_eq!(session.token(), Some(PM_TOKEN));
    drop(session);

    let restored = Session::hydrate(LocalStore::open(&db).unwrap()).unwrap();
    assert!(restored.is_authenticated());
    assert_eq!(
        routes::authorize("/dashboard", restored.user()).unwrap(),
        Access::Allow
    );

    let mut employee = Session::hydrate(LocalStore::open_in_memory().unwrap()).unwrap();
    let landing = employee
        .login(&stub.client(None), "ana@example.com", "secret")
        .await
        .unwrap();
    assert_eq!(landing, "/employee-dashboard");
    assert_eq!(
        routes::authorize("/dashboard", employee.user()).unwrap(),
        Access::Redirect(routes::UNAUTHORIZED)
    );
}

#[tokio::test]
async fn rejected_login_leaves_session_signed_out() {
    let stub = spawn_stub(StubState::default()).await;
    let mut session = Session::hydrate(LocalStore::open_in_memory().unwrap()).unwrap();
    let err = session
        .login(&stub.client(None), "pm@example.com", "wrong")
        .await
        .unwrap_err();
    let api = err.downcast_ref::<ApiError>().expect("api error");
    assert_eq!(api.status(), Some(StatusCode::UNAUTHORIZED));
    assert_eq!(api.to_string(), "Incorrect username or password");
    assert!(!session.is_authenticated());
    assert!(session.store().get("token").unwrap().is_none());
}

#[tokio::test]
async fn validation_errors_are_normalized_per_field() {
    let stub = spawn_stub(StubState::default()).await;
    let err = stub
        .client(Some(PM_TOKEN))
        .create_project(&NewProject {
            name: String::new(),
            description: String::new(),
            start_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2024, 2, 1).unwrap(),
            status: ProjectStatus::Planning,
            priority: 3,
            manager_id: 1,
            skill_requirements: Vec::new(),
        })
        .await
        .unwrap_err();
    assert_eq!(err.status(), Some(StatusCode::UNPROCESSABLE_ENTITY));
    assert_eq!(
        err.detail(),
        Some(&ErrorDetail::ValidationErrors(vec![FieldError {
            field: "name".to_string(),
            message: "String should have at least 1 character".to_string(),
        }]))
    );
}

#[tokio::test]
async fn body_without_detail_falls_back_to_status() {
    let stub = spawn_stub(StubState::default()).await;
    let err = stub.client(Some(PM_TOKEN)).list_skills().await.unwrap_err();
    assert!(err.detail().is_none());
    assert_eq!(err.to_string(), "Request failed with status 500");
}

#[tokio::test]
async fn bearer_token_is_sent_on_protected_calls() {
    let stub = spawn_stub(StubState::default()).await;
    let user = stub
        .client(Some(EMPLOYEE_TOKEN))
        .current_user()
        .await
        .unwrap();
    assert_eq!(user.full_name, "Ana");
    assert_eq!(user.projects[0].status, ProjectStatus::Active);

    let err = stub.client(Some("forged")).current_user().await.unwrap_err();
    assert_eq!(err.status(), Some(StatusCode::UNAUTHORIZED));
}

#[tokio::test]
async fn unreachable_backend_reports_connect_failure() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let client = airas::api::ApiClient::new(&airas::config::ApiConfig {
        base_url: format!("http://{addr}"),
        timeout_secs: 2,
        connect_timeout_secs: 1,
    })
    .unwrap();
    let err = client.login("pm@example.com", "secret").await.unwrap_err();
    assert!(matches!(err, ApiError::Connect(_)));
    assert_eq!(err.user_message("ignored"), CONNECT_FAILURE_MESSAGE);
}
