use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::project::ProjectStatus;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Employee,
    ProjectManager,
    Admin,
}

impl Role {
    pub fn as_slug(&self) -> &'static str {
        match self {
            Self::Employee => "employee",
            Self::ProjectManager => "project_manager",
            Self::Admin => "admin",
        }
    }
}

impl Display for Role {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_slug())
    }
}

#[derive(Debug, Error)]
#[error("unknown role: {0}")]
pub struct RoleParseError(pub String);

impl FromStr for Role {
    type Err = RoleParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('-', "_");
        match normalized.as_str() {
            "employee" => Ok(Self::Employee),
            "project_manager" | "manager" | "pm" => Ok(Self::ProjectManager),
            "admin" => Ok(Self::Admin),
            _ => Err(RoleParseError(s.to_string())),
        }
    }
}

/// Skills come back either as bare names or as `{id, name}` entries
/// depending on the endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum UserSkill {
    Entry { id: i64, name: String },
    Name(String),
}

impl UserSkill {
    pub fn name(&self) -> &str {
        match self {
            Self::Entry { name, .. } => name,
            Self::Name(name) => name,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserProject {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub start_date: Option<String>,
    #[serde(default)]
    pub end_date: Option<String>,
    pub status: ProjectStatus,
    #[serde(default)]
    pub employee_allocation: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct User {
    pub id: i64,
    pub email: String,
    pub full_name: String,
    pub role: Role,
    #[serde(default)]
    pub department: Option<String>,
    #[serde(default)]
    pub position: Option<String>,
    #[serde(default)]
    pub skills: Vec<UserSkill>,
    #[serde(default)]
    pub availability_percentage: Option<f64>,
    #[serde(default)]
    pub average_performance: Option<f64>,
    #[serde(default)]
    pub projects: Vec<UserProject>,
}

impl User {
    pub fn skill_names(&self) -> Vec<&str> {
        self.skills.iter().map(UserSkill::name).collect()
    }

    pub fn availability(&self) -> f64 {
        self.availability_percentage.unwrap_or(100.0)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Registration {
    pub email: String,
    pub full_name: String,
    pub password: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct UserUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub department: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub average_performance: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub availability_percentage: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skills: Option<Vec<String>>,
}

impl UserUpdate {
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LoginResponse {
    pub access_token: String,
    #[serde(default)]
    pub token_type: Option<String>,
    pub id: i64,
    pub email: String,
    pub role: Role,
    #[serde(default)]
    pub username: Option<String>,
    pub full_name: String,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{Role, User, UserSkill, UserUpdate};

    #[test]
    fn parses_mixed_skill_shapes() {
        let payload = json!({
            "id": 4,
            "email": "ana@example.com",
            "full_name": "Ana Ruiz",
            "role": "employee",
            "skills": [{ "id": 1, "name": "Python" }, "SQL"],
            "availability_percentage": 60.0,
            "average_performance": 4.2
        });
        let user: User = serde_json::from_value(payload).expect("user should parse");
        assert_eq!(user.skill_names(), vec!["Python", "SQL"]);
        assert_eq!(
            user.skills[0],
            UserSkill::Entry {
                id: 1,
                name: "Python".to_string()
            }
        );
        assert!(user.projects.is_empty());
    }

    #[test]
    fn role_round_trips_through_slug() {
        for role in [Role::Employee, Role::ProjectManager, Role::Admin] {
            assert_eq!(role.as_slug().parse::<Role>().unwrap(), role);
        }
        assert!("intern".parse::<Role>().is_err());
    }

    #[test]
    fn empty_update_detection() {
        assert!(UserUpdate::default().is_empty());
        let update = UserUpdate {
            position: Some("Staff Engineer".to_string()),
            ..UserUpdate::default()
        };
        assert!(!update.is_empty());
    }
}
