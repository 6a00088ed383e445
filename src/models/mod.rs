pub mod project;
pub mod user;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

pub use project::{
    NewProject, Project, ProjectStatus, ProjectUpdate, ResourceAllocation, SkillRequirement,
};
pub use user::{LoginResponse, Registration, Role, User, UserProject, UserSkill, UserUpdate};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Skill {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MatchedEmployee {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub availability: f64,
    #[serde(default)]
    pub current_project: Option<String>,
    #[serde(default)]
    pub allocated: bool,
}

/// Skill name to matching employees, as returned by
/// `GET /api/projects/{id}/match-employees`.
pub type SkillMatches = BTreeMap<String, Vec<MatchedEmployee>>;

pub fn allocated_count(matches: &SkillMatches, skill_name: &str) -> usize {
    matches
        .get(skill_name)
        .map(|employees| employees.iter().filter(|e| e.allocated).count())
        .unwrap_or(0)
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NamedRequirement {
    pub skill_id: i64,
    pub skill_name: String,
    pub employees_requested: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Recommendation {
    pub employee_id: i64,
    pub employee_name: String,
    pub match_score: f64,
    #[serde(default)]
    pub available_hours: Option<f64>,
    #[serde(default)]
    pub explanation: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RecommendationResponse {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub recommendations: Vec<Recommendation>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Acknowledgement {
    #[serde(default)]
    pub detail: Option<String>,
}
