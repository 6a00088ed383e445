use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::json;
use tracing::debug;

use crate::allocation::ProposedAllocation;
use crate::api::AllocationBackend;
use crate::config::ApiConfig;
use crate::error::{ApiError, ErrorDetail};
use crate::models::{
    Acknowledgement, LoginResponse, NewProject, Project, ProjectUpdate, RecommendationResponse,
    Registration, Skill, SkillMatches, User, UserUpdate,
};

const USER_AGENT: &str = concat!("airas/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Clone)]
pub struct ApiClient {
    http: Client,
    base_url: String,
    token: Option<String>,
}

impl ApiClient {
    pub fn new(config: &ApiConfig) -> Result<Self, ApiError> {
        let http = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(config.timeout_secs.max(1)))
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs.max(1)))
            .build()
            .map_err(|e| ApiError::InvalidRequest(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            token: None,
        })
    }

    pub fn with_token(mut self, token: Option<String>) -> Self {
        self.token = token;
        self
    }

    pub fn set_token(&mut self, token: Option<String>) {
        self.token = token;
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub async fn login(&self, username: &str, password: &str) -> Result<LoginResponse, ApiError> {
        let url = self.url("/api/auth/login");
        let request = self
            .http
            .post(&url)
            .form(&[("username", username), ("password", password)]);
        self.send_json(request, &url).await
    }

    pub async fn register(&self, registration: &Registration) -> Result<Acknowledgement, ApiError> {
        let url = self.url("/api/auth/register");
        let mut request = self.http.post(&url).json(registration);
        // Managers registering employees send their token; self sign-up does not.
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }
        self.send_json(request, &url).await
    }

    pub async fn current_user(&self) -> Result<User, ApiError> {
        self.get("/api/auth/users/me").await
    }

    pub async fn update_current_user(&self, update: &UserUpdate) -> Result<User, ApiError> {
        self.send_with_body(Method::PUT, "/api/auth/users/me", update).await
    }

    pub async fn list_users(&self) -> Result<Vec<User>, ApiError> {
        self.get("/api/auth/users").await
    }

    pub async fn get_user(&self, id: i64) -> Result<User, ApiError> {
        self.get(&format!("/api/auth/users/{id}")).await
    }

    pub async fn update_user(&self, id: i64, update: &UserUpdate) -> Result<User, ApiError> {
        self.send_with_body(Method::PUT, &format!("/api/auth/users/{id}"), update).await
    }

    pub async fn delete_user(&self, id: i64) -> Result<(), ApiError> {
        self.delete(&format!("/api/auth/users/{id}")).await
    }

    pub async fn list_projects(&self) -> Result<Vec<Project>, ApiError> {
        self.get("/api/projects").await
    }

    pub async fn get_project(&self, id: i64) -> Result<Project, ApiError> {
        self.get(&format!("/api/projects/{id}")).await
    }

    pub async fn create_project(&self, project: &NewProject) -> Result<Project, ApiError> {
        self.send_with_body(Method::POST, "/api/projects", project).await
    }

    pub async fn update_project(
        &self,
        id: i64,
        update: &ProjectUpdate,
    ) -> Result<Project, ApiError> {
        self.send_with_body(Method::PUT, &format!("/api/projects/{id}"), update).await
    }

    pub async fn delete_project(&self, id: i64) -> Result<(), ApiError> {
        self.delete(&format!("/api/projects/{id}")).await
    }

    pub async fn match_employees(&self, project_id: i64) -> Result<SkillMatches, ApiError> {
        self.get(&format!("/api/projects/{project_id}/match-employees")).await
    }

    pub async fn allocate_employees(
        &self,
        project_id: i64,
        allocations: &[ProposedAllocation],
    ) -> Result<Acknowledgement, ApiError> {
        self.send_with_body(
            Method::POST,
            &format!("/api/projects/{project_id}/allocate-employees"),
            &json!({ "allocations": allocations }),
        ).await
    }

    pub async fn remove_allocation(
        &self,
        project_id: i64,
        employee_id: i64,
    ) -> Result<Acknowledgement, ApiError> {
        self.send_with_body(
            Method::POST,
            &format!("/api/projects/{project_id}/remove-allocation"),
            &json!({ "employee_id": employee_id }),
        ).await
    }

    pub async fn recommend_resources(
        &self,
        project_id: i64,
    ) -> Result<RecommendationResponse, ApiError> {
        self.send_with_body(
            Method::POST,
            "/api/ml/recommend-resources",
            &json!({ "project_id": project_id }),
        ).await
    }

    pub async fn list_skills(&self) -> Result<Vec<Skill>, ApiError> {
        self.get("/api/skills").await
    }

    pub async fn get_skill(&self, id: i64) -> Result<Skill, ApiError> {
        self.get(&format!("/api/skills/{id}")).await
    }

    pub async fn create_skill(&self, name: &str) -> Result<Skill, ApiError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ApiError::InvalidRequest(
                "skill name cannot be empty".to_string(),
            ));
        }
        self.send_with_body(Method::POST, "/api/skills", &json!({ "name": name })).await
    }

    pub async fn delete_skill(&self, id: i64) -> Result<(), ApiError> {
        self.delete(&format!("/api/skills/{id}")).await
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn authorized(&self, method: Method, url: &str) -> Result<RequestBuilder, ApiError> {
        let token = self.token.as_deref().ok_or(ApiError::MissingToken)?;
        Ok(self.http.request(method, url).bearer_auth(token))
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let url = self.url(path);
        let request = self.authorized(Method::GET, &url)?;
        self.send_json(request, &url).await
    }

    async fn send_with_body<B, T>(
        &self,
        method: Method,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = self.url(path);
        let request = self.authorized(method, &url)?.json(body);
        self.send_json(request, &url).await
    }

    async fn delete(&self, path: &str) -> Result<(), ApiError> {
        let url = self.url(path);
        let request = self.authorized(Method::DELETE, &url)?;
        self.execute(request, &url).await.map(|_| ())
    }

    async fn send_json<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        url: &str,
    ) -> Result<T, ApiError> {
        let body = self.execute(request, url).await?;
        serde_json::from_str(&body).map_err(|e| ApiError::Decode {
            url: url.to_string(),
            message: e.to_string(),
        })
    }

    async fn execute(&self, request: RequestBuilder, url: &str) -> Result<String, ApiError> {
        let response = request.send().await.map_err(ApiError::Connect)?;
        let status = response.status();
        let body = response.text().await.map_err(|e| ApiError::Decode {
            url: url.to_string(),
            message: format!("failed reading response body: {e}"),
        })?;
        if !status.is_success() {
            let preview: String = body.chars().take(180).collect();
            debug!("{url} returned {status}: {preview}");
            return Err(ApiError::Status {
                status,
                detail: ErrorDetail::from_body(&body),
            });
        }
        Ok(body)
    }
}

#[async_trait]
impl AllocationBackend for ApiClient {
    async fn project(&self, project_id: i64) -> Result<Project, ApiError> {
        self.get_project(project_id).await
    }

    async fn skill(&self, skill_id: i64) -> Result<Skill, ApiError> {
        self.get_skill(skill_id).await
    }

    async fn skill_matches(&self, project_id: i64) -> Result<SkillMatches, ApiError> {
        self.match_employees(project_id).await
    }

    async fn recommendations(&self, project_id: i64) -> Result<RecommendationResponse, ApiError> {
        self.recommend_resources(project_id).await
    }

    async fn allocate(
        &self,
        project_id: i64,
        allocations: &[ProposedAllocation],
    ) -> Result<(), ApiError> {
        self.allocate_employees(project_id, allocations).await
            .map(|_| ())
    }

    async fn deallocate(&self, project_id: i64, employee_id: i64) -> Result<(), ApiError> {
        self.remove_allocation(project_id, employee_id).await
            .map(|_| ())
    }
}
