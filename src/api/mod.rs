pub mod client;

use async_trait::async_trait;

use crate::allocation::ProposedAllocation;
use crate::error::ApiError;
use crate::models::{Project, RecommendationResponse, Skill, SkillMatches};

pub use client::ApiClient;

/// Backend calls the employee matching workflow depends on.
#[async_trait]
pub trait AllocationBackend: Send + Sync {
    async fn project(&self, project_id: i64) -> Result<Project, ApiError>;
    async fn skill(&self, skill_id: i64) -> Result<Skill, ApiError>;
    async fn skill_matches(&self, project_id: i64) -> Result<SkillMatches, ApiError>;
    async fn recommendations(&self, project_id: i64) -> Result<RecommendationResponse, ApiError>;
    async fn allocate(
        &self,
        project_id: i64,
        allocations: &[ProposedAllocation],
    ) -> Result<(), ApiError>;
    async fn deallocate(&self, project_id: i64, employee_id: i64) -> Result<(), ApiError>;
}
