use std::fmt::{Display, Formatter};
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum ProjectStatus {
    #[serde(alias = "planned")]
    Planning,
    Active,
    Completed,
    #[serde(rename = "on-hold", alias = "on_hold")]
    OnHold,
}

impl ProjectStatus {
    pub const ALL: [ProjectStatus; 4] = [
        ProjectStatus::Planning,
        ProjectStatus::Active,
        ProjectStatus::Completed,
        ProjectStatus::OnHold,
    ];

    pub fn as_slug(&self) -> &'static str {
        match self {
            Self::Planning => "planning",
            Self::Active => "active",
            Self::Completed => "completed",
            Self::OnHold => "on-hold",
        }
    }
}

impl Display for ProjectStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_slug())
    }
}

#[derive(Debug, Error)]
#[error("unknown project status: {0}")]
pub struct ProjectStatusParseError(pub String);

impl FromStr for ProjectStatus {
    type Err = ProjectStatusParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('_', "-");
        match normalized.as_str() {
            "planning" | "planned" => Ok(Self::Planning),
            "active" => Ok(Self::Active),
            "completed" | "done" => Ok(Self::Completed),
            "on-hold" | "onhold" | "hold" => Ok(Self::OnHold),
            _ => Err(ProjectStatusParseError(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SkillRequirement {
    pub skill_id: i64,
    pub employees_requested: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ResourceAllocation {
    #[serde(default)]
    pub id: Option<i64>,
    pub employee_id: i64,
    #[serde(default)]
    pub project_id: Option<i64>,
    pub allocation_percentage: f64,
    pub status: String,
}

impl ResourceAllocation {
    pub fn is_open(&self) -> bool {
        self.status != "completed"
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Project {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub status: ProjectStatus,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    #[serde(default = "default_priority")]
    pub priority: u8,
    #[serde(default)]
    pub department: Option<String>,
    #[serde(default)]
    pub manager_id: Option<i64>,
    #[serde(default)]
    pub skill_requirements: Vec<SkillRequirement>,
    #[serde(default)]
    pub resource_allocations: Vec<ResourceAllocation>,
}

impl Project {
    pub fn open_allocations(&self) -> impl Iterator<Item = &ResourceAllocation> {
        self.resource_allocations.iter().filter(|a| a.is_open())
    }

    pub fn requested_headcount(&self) -> u32 {
        self.skill_requirements
            .iter()
            .map(|r| r.employees_requested)
            .sum()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewProject {
    pub name: String,
    pub description: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub status: ProjectStatus,
    pub priority: u8,
    pub manager_id: i64,
    pub skill_requirements: Vec<SkillRequirement>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ProjectUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<ProjectStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub manager_id: Option<i64>,
}

impl ProjectUpdate {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.description.is_none()
            && self.start_date.is_none()
            && self.end_date.is_none()
            && self.priority.is_none()
            && self.status.is_none()
            && self.manager_id.is_none()
    }
}

fn default_priority() -> u8 {
    3
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{Project, ProjectStatus, ProjectUpdate};

    #[test]
    fn parses_backend_project_payload() {
        let payload = json!({
            "id": 7,
            "name": "Billing revamp",
            "description": "Move invoices to the new ledger",
            "start_date": "2024-03-01",
            "end_date": "2024-09-30",
            "priority": 2,
            "status": "on-hold",
            "manager_id": 3,
            "skill_requirements": [{ "skill_id": 1, "employees_requested": 2 }],
            "resource_allocations": [
                { "id": 11, "employee_id": 4, "project_id": 7, "allocation_percentage": 50.0, "status": "confirmed" },
                { "id": 12, "employee_id": 5, "project_id": 7, "allocation_percentage": 20.0, "status": "completed" }
            ]
        });
        let project: Project = serde_json::from_value(payload).expect("project should parse");
        assert_eq!(project.status, ProjectStatus::OnHold);
        assert_eq!(project.requested_headcount(), 2);
        assert_eq!(project.open_allocations().count(), 1);
    }

    #[test]
    fn parses_status_aliases() {
        assert_eq!("On_Hold".parse::<ProjectStatus>().unwrap(), ProjectStatus::OnHold);
        assert_eq!("planned".parse::<ProjectStatus>().unwrap(), ProjectStatus::Planning);
        assert!("archived".parse::<ProjectStatus>().is_err());
    }

    #[test]
    fn update_skips_absent_fields() {
        let update = ProjectUpdate {
            status: Some(ProjectStatus::Active),
            ..ProjectUpdate::default()
        };
        let body = serde_json::to_value(&update).unwrap();
        assert_eq!(body, json!({ "status": "active" }));
        assert!(!update.is_empty());
        assert!(ProjectUpdate::default().is_empty());
    }
}
