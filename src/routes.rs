use std::collections::BTreeMap;

use serde::Serialize;
use thiserror::Error;

use crate::models::Role;
use crate::session::SessionUser;

pub const LOGIN: &str = "/login";
pub const UNAUTHORIZED: &str = "/unauthorized";
pub const MANAGER_HOME: &str = "/dashboard";
pub const EMPLOYEE_HOME: &str = "/employee-dashboard";

const PUBLIC: &[Role] = &[];
const MANAGERS: &[Role] = &[Role::ProjectManager];
const EMPLOYEES: &[Role] = &[Role::Employee];

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct RouteSpec {
    pub pattern: &'static str,
    pub roles: &'static [Role],
}

impl RouteSpec {
    pub fn is_public(&self) -> bool {
        self.roles.is_empty()
    }
}

pub const ROUTES: &[RouteSpec] = &[
    RouteSpec { pattern: "/login", roles: PUBLIC },
    RouteSpec { pattern: "/register", roles: PUBLIC },
    RouteSpec { pattern: "/unauthorized", roles: PUBLIC },
    RouteSpec { pattern: "/dashboard", roles: MANAGERS },
    RouteSpec { pattern: "/create-project", roles: MANAGERS },
    RouteSpec { pattern: "/update-project/:id", roles: MANAGERS },
    RouteSpec { pattern: "/view-projects", roles: MANAGERS },
    RouteSpec { pattern: "/resource-optimization", roles: MANAGERS },
    RouteSpec { pattern: "/employee-matching", roles: MANAGERS },
    RouteSpec { pattern: "/employee-matching/:projectId", roles: MANAGERS },
    RouteSpec { pattern: "/register-employee", roles: MANAGERS },
    RouteSpec { pattern: "/employees", roles: MANAGERS },
    RouteSpec { pattern: "/employees/:id", roles: MANAGERS },
    RouteSpec { pattern: "/update-employee/:id", roles: MANAGERS },
    RouteSpec { pattern: "/employee-dashboard", roles: EMPLOYEES },
    RouteSpec { pattern: "/employee-projects", roles: EMPLOYEES },
    RouteSpec { pattern: "/employee-projects/:projectId", roles: EMPLOYEES },
    RouteSpec { pattern: "/employee-profile", roles: EMPLOYEES },
    RouteSpec { pattern: "/employee-performance", roles: EMPLOYEES },
];

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case", tag = "decision", content = "target")]
pub enum Access {
    Allow,
    Redirect(&'static str),
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("no route matches {0}")]
pub struct RouteNotFound(pub String);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteMatch {
    pub spec: RouteSpec,
    pub params: BTreeMap<String, String>,
}

/// `guard(required_roles, current_user) -> allow | redirect(target)`.
pub fn guard(required: &[Role], user: Option<&SessionUser>) -> Access {
    let Some(user) = user else {
        return Access::Redirect(LOGIN);
    };
    if !required.is_empty() && !required.contains(&user.role) {
        return Access::Redirect(UNAUTHORIZED);
    }
    Access::Allow
}

pub fn landing_route(role: Role) -> &'static str {
    match role {
        Role::Employee => EMPLOYEE_HOME,
        Role::ProjectManager | Role::Admin => MANAGER_HOME,
    }
}

pub fn resolve(path: &str) -> Option<RouteMatch> {
    let path = normalize(path);
    ROUTES.iter().find_map(|spec| {
        match_pattern(spec.pattern, &path).map(|params| RouteMatch {
            spec: *spec,
            params,
        })
    })
}

pub fn authorize(path: &str, user: Option<&SessionUser>) -> Result<Access, RouteNotFound> {
    if normalize(path) == "/" {
        return Ok(Access::Redirect(LOGIN));
    }
    let matched = resolve(path).ok_or_else(|| RouteNotFound(path.to_string()))?;
    if matched.spec.is_public() {
        return Ok(Access::Allow);
    }
    Ok(guard(matched.spec.roles, user))
}

fn normalize(path: &str) -> String {
    let trimmed = path.trim().split(['?', '#']).next().unwrap_or_default();
    let without_slash = trimmed.trim_end_matches('/');
    if without_slash.is_empty() {
        "/".to_string()
    } else if without_slash.starts_with('/') {
        without_slash.to_string()
    } else {
        format!("/{without_slash}")
    }
}

fn match_pattern(pattern: &str, path: &str) -> Option<BTreeMap<String, String>> {
    let pattern_segments = pattern.split('/').collect::<Vec<_>>();
    let path_segments = path.split('/').collect::<Vec<_>>();
    if pattern_segments.len() != path_segments.len() {
        return None;
    }
    let mut params = BTreeMap::new();
    for (expected, actual) in pattern_segments.iter().zip(&path_segments) {
        if let Some(name) = expected.strip_prefix(':') {
            if actual.is_empty() {
                return None;
            }
            params.insert(name.to_string(), (*actual).to_string());
        } else if expected != actual {
            return None;
        }
    }
    Some(params)
}

#[cfg(test)]
mod tests {
    use super::{
        authorize, guard, landing_route, resolve, Access, RouteNotFound, LOGIN, UNAUTHORIZED,
    };
    use crate::models::Role;
    use crate::session::SessionUser;

    fn user(role: Role) -> SessionUser {
        SessionUser {
            id: 1,
            username: "u@example.com".to_string(),
            role,
            email: "u@example.com".to_string(),
            full_name: "U".to_string(),
        }
    }

    #[test]
    fn unauthenticated_dashboard_redirects_to_login() {
        assert_eq!(authorize("/dashboard", None), Ok(Access::Redirect(LOGIN)));
    }

    #[test]
    fn employee_dashboard_visit_is_unauthorized() {
        let employee = user(Role::Employee);
        assert_eq!(
            authorize("/dashboard", Some(&employee)),
            Ok(Access::Redirect(UNAUTHORIZED))
        );
        assert_eq!(
            authorize("/employee-dashboard", Some(&employee)),
            Ok(Access::Allow)
        );
    }

    #[test]
    fn manager_reaches_parameterised_routes() {
        let manager = user(Role::ProjectManager);
        assert_eq!(
            authorize("/employee-matching/12/", Some(&manager)),
            Ok(Access::Allow)
        );
        let matched = resolve("/employee-matching/12").expect("route exists");
        assert_eq!(matched.params.get("projectId").map(String::as_str), Some("12"));
    }

    #[test]
    fn public_routes_and_root() {
        assert_eq!(authorize("/login", None), Ok(Access::Allow));
        assert_eq!(authorize("/register?next=1", None), Ok(Access::Allow));
        assert_eq!(authorize("/", None), Ok(Access::Redirect(LOGIN)));
    }

    #[test]
    fn unknown_route_is_reported() {
        assert_eq!(
            authorize("/reports", None),
            Err(RouteNotFound("/reports".to_string()))
        );
        assert!(resolve("/employees/").is_some());
        assert!(resolve("/employees/4/edit").is_none());
    }

    #[test]
    fn guard_without_role_list_allows_any_signed_in_user() {
        assert_eq!(guard(&[], Some(&user(Role::Admin))), Access::Allow);
        assert_eq!(guard(&[], None), Access::Redirect(LOGIN));
    }

    #[test]
    fn landing_route_depends_on_role() {
        assert_eq!(landing_route(Role::Employee), "/employee-dashboard");
        assert_eq!(landing_route(Role::ProjectManager), "/dashboard");
    }
}
