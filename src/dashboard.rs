use std::collections::{BTreeSet, HashMap};

use chrono::NaiveDate;
use serde::Serialize;

use crate::models::{Project, ProjectStatus, User, UserProject};

const RECENT_PROJECTS: usize = 5;

#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct ProjectCounts {
    pub total: usize,
    pub active: usize,
    pub completed: usize,
    pub planning: usize,
    pub on_hold: usize,
}

impl ProjectCounts {
    fn record(&mut self, status: ProjectStatus) {
        self.total += 1;
        match status {
            ProjectStatus::Active => self.active += 1,
            ProjectStatus::Completed => self.completed += 1,
            ProjectStatus::Planning => self.planning += 1,
            ProjectStatus::OnHold => self.on_hold += 1,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct EmployeeCounts {
    pub total: usize,
    pub allocated: usize,
    pub available: usize,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ManagerDashboard {
    pub projects: ProjectCounts,
    pub recent_projects: Vec<Project>,
    pub employees: EmployeeCounts,
}

pub fn manager_dashboard(projects: &[Project], employees: &[User]) -> ManagerDashboard {
    let mut counts = ProjectCounts::default();
    for project in projects {
        counts.record(project.status);
    }

    let mut recent = projects.to_vec();
    recent.sort_by(|a, b| b.start_date.cmp(&a.start_date));
    recent.truncate(RECENT_PROJECTS);

    let allocated = projects
        .iter()
        .flat_map(|p| p.open_allocations())
        .map(|a| a.employee_id)
        .collect::<BTreeSet<_>>()
        .len();

    ManagerDashboard {
        projects: counts,
        recent_projects: recent,
        employees: EmployeeCounts {
            total: employees.len(),
            allocated,
            available: employees.len().saturating_sub(allocated),
        },
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct EmployeeDashboard {
    pub full_name: String,
    pub department: Option<String>,
    pub position: Option<String>,
    pub availability_percentage: f64,
    pub average_performance: f64,
    pub skills: Vec<String>,
    pub projects: ProjectCounts,
    pub recent_projects: Vec<UserProject>,
}

pub fn employee_dashboard(user: &User) -> EmployeeDashboard {
    let mut counts = ProjectCounts::default();
    for project in &user.projects {
        counts.record(project.status);
    }
    EmployeeDashboard {
        full_name: user.full_name.clone(),
        department: user.department.clone(),
        position: user.position.clone(),
        availability_percentage: user.availability(),
        average_performance: user.average_performance.unwrap_or(0.0),
        skills: user.skill_names().into_iter().map(str::to_string).collect(),
        projects: counts,
        recent_projects: user.projects.iter().take(RECENT_PROJECTS).cloned().collect(),
    }
}

fn status_rank(status: ProjectStatus) -> u8 {
    match status {
        ProjectStatus::Active => 0,
        ProjectStatus::Planning => 1,
        ProjectStatus::OnHold => 2,
        ProjectStatus::Completed => 3,
    }
}

pub fn employee_projects(user: &User) -> Vec<UserProject> {
    let mut projects = user.projects.clone();
    projects.sort_by_key(|p| (status_rank(p.status), p.id));
    projects
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct AssignmentDetail {
    pub project: Project,
    pub my_allocation: Option<f64>,
    pub days_remaining: i64,
    pub progress_percent: u8,
}

pub fn assignment_detail(project: Project, employee_id: i64, today: NaiveDate) -> AssignmentDetail {
    let my_allocation = project
        .resource_allocations
        .iter()
        .find(|a| a.employee_id == employee_id)
        .map(|a| a.allocation_percentage);
    let days_remaining = (project.end_date - today).num_days();
    let total = (project.end_date - project.start_date).num_days();
    let elapsed = (today - project.start_date).num_days();
    let progress_percent = if total > 0 {
        (elapsed * 100).div_euclid(total).clamp(0, 100) as u8
    } else if elapsed >= 0 {
        100
    } else {
        0
    };
    AssignmentDetail {
        project,
        my_allocation,
        days_remaining,
        progress_percent,
    }
}

pub const BASELINE_PERFORMANCE: f64 = 2.5;

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PerformanceBand {
    Exceptional,
    Excellent,
    Good,
    NeedsImprovement,
    Poor,
}

impl PerformanceBand {
    pub fn for_score(score: f64) -> Self {
        if score >= 4.5 {
            Self::Exceptional
        } else if score >= 3.5 {
            Self::Excellent
        } else if score >= 2.5 {
            Self::Good
        } else if score >= 1.5 {
            Self::NeedsImprovement
        } else {
            Self::Poor
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Exceptional => "Exceptional",
            Self::Excellent => "Excellent",
            Self::Good => "Good",
            Self::NeedsImprovement => "Needs Improvement",
            Self::Poor => "Poor",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Comparison {
    Above,
    At,
    Below,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct PerformanceReport {
    pub full_name: String,
    pub score: f64,
    pub band: PerformanceBand,
    pub baseline: f64,
    pub comparison: Comparison,
}

pub fn performance_report(user: &User) -> PerformanceReport {
    let score = user.average_performance.unwrap_or(0.0);
    let comparison = if score > BASELINE_PERFORMANCE {
        Comparison::Above
    } else if score < BASELINE_PERFORMANCE {
        Comparison::Below
    } else {
        Comparison::At
    };
    PerformanceReport {
        full_name: user.full_name.clone(),
        score,
        band: PerformanceBand::for_score(score),
        baseline: BASELINE_PERFORMANCE,
        comparison,
    }
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum ResourceBucket {
    Staffed,
    Unstaffed,
    Completed,
}

impl ResourceBucket {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Staffed => "staffed",
            Self::Unstaffed => "unstaffed",
            Self::Completed => "completed",
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct AllocationRow {
    pub employee_id: i64,
    pub employee_name: String,
    pub allocation_percentage: f64,
    pub status: String,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ProjectResources {
    pub project_id: i64,
    pub project_name: String,
    pub status: ProjectStatus,
    pub bucket: ResourceBucket,
    pub requested_headcount: u32,
    pub allocations: Vec<AllocationRow>,
}

pub fn resource_overview(projects: &[Project], employees: &[User]) -> Vec<ProjectResources> {
    let names = employees
        .iter()
        .map(|u| (u.id, u.full_name.as_str()))
        .collect::<HashMap<_, _>>();

    let mut rows = projects
        .iter()
        .map(|project| {
            let bucket = if project.status == ProjectStatus::Completed {
                ResourceBucket::Completed
            } else if project.resource_allocations.is_empty() {
                ResourceBucket::Unstaffed
            } else {
                ResourceBucket::Staffed
            };
            let allocations = project
                .resource_allocations
                .iter()
                .map(|a| AllocationRow {
                    employee_id: a.employee_id,
                    employee_name: names
                        .get(&a.employee_id)
                        .map(|n| n.to_string())
                        .unwrap_or_else(|| format!("Employee #{}", a.employee_id)),
                    allocation_percentage: a.allocation_percentage,
                    status: a.status.clone(),
                })
                .collect();
            ProjectResources {
                project_id: project.id,
                project_name: project.name.clone(),
                status: project.status,
                bucket,
                requested_headcount: project.requested_headcount(),
                allocations,
            }
        })
        .collect::<Vec<_>>();
    rows.sort_by_key(|r| (r.bucket, r.project_id));
    rows
}
