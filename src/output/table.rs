use comfy_table::presets::UTF8_FULL;
use comfy_table::{Cell, Color, ContentArrangement, Row, Table};

use crate::allocation::{AdaptedRecommendation, ProposedAllocation, SkillStatus};
use crate::dashboard::{
    AssignmentDetail, EmployeeDashboard, ManagerDashboard, PerformanceReport, ProjectResources,
};
use crate::models::{Project, ProjectStatus, Skill, SkillMatches, User, UserProject};

fn new_table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table
}

fn status_cell(status: ProjectStatus) -> Cell {
    let cell = Cell::new(status.as_slug());
    match status {
        ProjectStatus::Active => cell.fg(Color::Green),
        ProjectStatus::Completed => cell.fg(Color::Blue),
        ProjectStatus::Planning => cell.fg(Color::Yellow),
        ProjectStatus::OnHold => cell.fg(Color::Red),
    }
}

fn or_dash(value: Option<&str>) -> String {
    value
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| "-".to_string())
}

pub fn render_projects_table(projects: &[Project]) -> String {
    let mut table = new_table();
    table.set_header(vec![
        "ID",
        "Name",
        "Status",
        "Start",
        "End",
        "Priority",
        "Requested",
        "Allocated",
    ]);
    for p in projects {
        table.add_row(Row::from(vec![
            Cell::new(p.id),
            Cell::new(&p.name),
            status_cell(p.status),
            Cell::new(p.start_date),
            Cell::new(p.end_date),
            Cell::new(p.priority),
            Cell::new(p.requested_headcount()),
            Cell::new(p.open_allocations().count()),
        ]));
    }
    table.to_string()
}

pub fn render_project_detail(project: &Project) -> String {
    let mut table = new_table();
    table.set_header(vec!["Field", "Value"]);
    table.add_row(vec!["ID".to_string(), project.id.to_string()]);
    table.add_row(vec!["Name".to_string(), project.name.clone()]);
    table.add_row(vec![
        "Description".to_string(),
        or_dash(project.description.as_deref()),
    ]);
    table.add_row(vec!["Status".to_string(), project.status.to_string()]);
    table.add_row(vec![
        "Dates".to_string(),
        format!("{} to {}", project.start_date, project.end_date),
    ]);
    table.add_row(vec!["Priority".to_string(), project.priority.to_string()]);
    let requirements = project
        .skill_requirements
        .iter()
        .map(|r| format!("skill {} x{}", r.skill_id, r.employees_requested))
        .collect::<Vec<_>>()
        .join(", ");
    table.add_row(vec!["Requirements".to_string(), requirements]);
    let allocations = project
        .resource_allocations
        .iter()
        .map(|a| {
            format!(
                "employee {} at {}% ({})",
                a.employee_id, a.allocation_percentage, a.status
            )
        })
        .collect::<Vec<_>>()
        .join("\n");
    table.add_row(vec!["Allocations".to_string(), allocations]);
    table.to_string()
}

pub fn render_users_table(users: &[User]) -> String {
    let mut table = new_table();
    table.set_header(vec![
        "ID",
        "Name",
        "Email",
        "Role",
        "Department",
        "Position",
        "Availability",
        "Skills",
    ]);
    for u in users {
        table.add_row(vec![
            u.id.to_string(),
            u.full_name.clone(),
            u.email.clone(),
            u.role.to_string(),
            or_dash(u.department.as_deref()),
            or_dash(u.position.as_deref()),
            format!("{:.0}%", u.availability()),
            u.skill_names().join(", "),
        ]);
    }
    table.to_string()
}

pub fn render_skills_table(skills: &[Skill]) -> String {
    let mut table = new_table();
    table.set_header(vec!["ID", "Name"]);
    for s in skills {
        table.add_row(vec![s.id.to_string(), s.name.clone()]);
    }
    table.to_string()
}

pub fn render_matches_table(matches: &SkillMatches) -> String {
    let mut table = new_table();
    table.set_header(vec![
        "Skill",
        "Employee ID",
        "Name",
        "Availability",
        "Current Project",
        "Allocated",
    ]);
    for (skill, employees) in matches {
        for e in employees {
            let allocated = if e.allocated {
                Cell::new("YES").fg(Color::Green)
            } else {
                Cell::new("no")
            };
            table.add_row(Row::from(vec![
                Cell::new(skill),
                Cell::new(e.id),
                Cell::new(&e.name),
                Cell::new(format!("{:.0}%", e.availability)),
                Cell::new(or_dash(e.current_project.as_deref())),
                allocated,
            ]));
        }
    }
    table.to_string()
}

pub fn render_skill_status_table(statuses: &[SkillStatus]) -> String {
    let mut table = new_table();
    table.set_header(vec![
        "Skill", "Allocated", "Pending", "Required", "Remaining", "Full",
    ]);
    for s in statuses {
        let full = if s.is_full {
            Cell::new("FULL").fg(Color::Green)
        } else {
            Cell::new("open").fg(Color::Yellow)
        };
        table.add_row(Row::from(vec![
            Cell::new(&s.skill_name),
            Cell::new(s.allocated),
            Cell::new(s.pending),
            Cell::new(s.required),
            Cell::new(s.remaining),
            full,
        ]));
    }
    table.to_string()
}

pub fn render_recommendations_table(items: &[AdaptedRecommendation]) -> String {
    let mut table = new_table();
    table.set_header(vec![
        "#",
        "Employee",
        "Match",
        "Available Hours",
        "Skill",
        "Allocation",
        "Explanation",
    ]);
    for (idx, item) in items.iter().enumerate() {
        table.add_row(vec![
            idx.to_string(),
            item.candidate.employee_name.clone(),
            format!("{}%", item.match_percent()),
            item.candidate
                .available_hours
                .map(|h| format!("{h:.1}"))
                .unwrap_or_else(|| "-".to_string()),
            item.skill_name.clone(),
            format!("{}%", item.allocation_percentage),
            item.candidate.explanation.clone(),
        ]);
    }
    table.to_string()
}

pub fn render_proposals_table(proposals: &[ProposedAllocation]) -> String {
    let mut table = new_table();
    table.set_header(vec!["#", "Employee ID", "Employee", "Skill", "Allocation"]);
    for (idx, p) in proposals.iter().enumerate() {
        table.add_row(vec![
            idx.to_string(),
            p.employee_id.to_string(),
            p.employee_name.clone(),
            p.skill_name.clone(),
            format!("{}%", p.allocation_percentage),
        ]);
    }
    table.to_string()
}

pub fn render_manager_dashboard(dashboard: &ManagerDashboard) -> String {
    let mut summary = new_table();
    summary.set_header(vec!["Metric", "Count"]);
    let p = &dashboard.projects;
    let e = &dashboard.employees;
    for (label, value) in [
        ("Projects", p.total),
        ("Active", p.active),
        ("Planning", p.planning),
        ("On hold", p.on_hold),
        ("Completed", p.completed),
        ("Employees", e.total),
        ("Allocated", e.allocated),
        ("Available", e.available),
    ] {
        summary.add_row(vec![label.to_string(), value.to_string()]);
    }

    let mut out = summary.to_string();
    out.push_str("\nRecent projects\n");
    out.push_str(&render_projects_table(&dashboard.recent_projects));
    out
}

pub fn render_employee_dashboard(dashboard: &EmployeeDashboard) -> String {
    let mut profile = new_table();
    profile.set_header(vec!["Field", "Value"]);
    profile.add_row(vec!["Name".to_string(), dashboard.full_name.clone()]);
    profile.add_row(vec![
        "Department".to_string(),
        or_dash(dashboard.department.as_deref()),
    ]);
    profile.add_row(vec![
        "Position".to_string(),
        or_dash(dashboard.position.as_deref()),
    ]);
    profile.add_row(vec![
        "Availability".to_string(),
        format!("{:.0}%", dashboard.availability_percentage),
    ]);
    profile.add_row(vec![
        "Performance".to_string(),
        format!("{:.1} / 5", dashboard.average_performance),
    ]);
    profile.add_row(vec!["Skills".to_string(), dashboard.skills.join(", ")]);
    let p = &dashboard.projects;
    profile.add_row(vec![
        "Projects".to_string(),
        format!(
            "{} total ({} active, {} planning, {} completed)",
            p.total, p.active, p.planning, p.completed
        ),
    ]);

    let projects = render_user_projects_table(&dashboard.recent_projects);
    format!("{profile}\n{projects}")
}

pub fn render_user_projects_table(projects: &[UserProject]) -> String {
    let mut table = new_table();
    table.set_header(vec!["ID", "Name", "Status", "Allocation"]);
    for project in projects {
        table.add_row(Row::from(vec![
            Cell::new(project.id),
            Cell::new(&project.name),
            status_cell(project.status),
            Cell::new(
                project
                    .employee_allocation
                    .map(|a| format!("{a:.0}%"))
                    .unwrap_or_else(|| "-".to_string()),
            ),
        ]));
    }
    table.to_string()
}

pub fn render_assignment_detail(detail: &AssignmentDetail) -> String {
    let mut out = render_project_detail(&detail.project);
    let mut mine = new_table();
    mine.set_header(vec!["Field", "Value"]);
    mine.add_row(vec![
        "My allocation".to_string(),
        detail
            .my_allocation
            .map(|a| format!("{a:.0}%"))
            .unwrap_or_else(|| "-".to_string()),
    ]);
    mine.add_row(vec![
        "Days remaining".to_string(),
        detail.days_remaining.max(0).to_string(),
    ]);
    mine.add_row(vec![
        "Progress".to_string(),
        format!("{}%", detail.progress_percent),
    ]);
    out.push('\n');
    out.push_str(&mine.to_string());
    out
}

pub fn render_performance_report(report: &PerformanceReport) -> String {
    let mut table = new_table();
    table.set_header(vec!["Field", "Value"]);
    table.add_row(vec!["Name".to_string(), report.full_name.clone()]);
    table.add_row(vec!["Score".to_string(), format!("{:.1} / 5", report.score)]);
    table.add_row(vec!["Rating".to_string(), report.band.label().to_string()]);
    table.add_row(vec![
        "Compared to average".to_string(),
        format!("{:?} {:.1}", report.comparison, report.baseline).to_lowercase(),
    ]);
    table.to_string()
}

pub fn render_resource_overview(rows: &[ProjectResources]) -> String {
    let mut table = new_table();
    table.set_header(vec![
        "Bucket",
        "Project",
        "Status",
        "Requested",
        "Allocations",
    ]);
    for r in rows {
        let allocations = r
            .allocations
            .iter()
            .map(|a| format!("{} {}% ({})", a.employee_name, a.allocation_percentage, a.status))
            .collect::<Vec<_>>()
            .join("\n");
        table.add_row(Row::from(vec![
            Cell::new(r.bucket.label()),
            Cell::new(format!("#{} {}", r.project_id, r.project_name)),
            status_cell(r.status),
            Cell::new(r.requested_headcount),
            Cell::new(allocations),
        ]));
    }
    table.to_string()
}
