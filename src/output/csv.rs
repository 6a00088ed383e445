use anyhow::Result;

use crate::allocation::{AdaptedRecommendation, SkillStatus};
use crate::models::{Project, SkillMatches, User};

fn finish(writer: csv::Writer<Vec<u8>>) -> Result<String> {
    let data = writer.into_inner()?;
    Ok(String::from_utf8_lossy(&data).to_string())
}

pub fn projects_to_csv(projects: &[Project]) -> Result<String> {
    let mut writer = csv::Writer::from_writer(vec![]);
    writer.write_record([
        "id",
        "name",
        "status",
        "start_date",
        "end_date",
        "priority",
        "requested",
        "allocated",
    ])?;
    for p in projects {
        writer.write_record([
            p.id.to_string(),
            p.name.clone(),
            p.status.to_string(),
            p.start_date.to_string(),
            p.end_date.to_string(),
            p.priority.to_string(),
            p.requested_headcount().to_string(),
            p.open_allocations().count().to_string(),
        ])?;
    }
    finish(writer)
}

pub fn users_to_csv(users: &[User]) -> Result<String> {
    let mut writer = csv::Writer::from_writer(vec![]);
    writer.write_record([
        "id",
        "full_name",
        "email",
        "role",
        "department",
        "position",
        "availability_percentage",
        "skills",
    ])?;
    for u in users {
        writer.write_record([
            u.id.to_string(),
            u.full_name.clone(),
            u.email.clone(),
            u.role.to_string(),
            u.department.clone().unwrap_or_default(),
            u.position.clone().unwrap_or_default(),
            format!("{:.0}", u.availability()),
            u.skill_names().join(";"),
        ])?;
    }
    finish(writer)
}

pub fn matches_to_csv(matches: &SkillMatches) -> Result<String> {
    let mut writer = csv::Writer::from_writer(vec![]);
    writer.write_record([
        "skill",
        "employee_id",
        "name",
        "availability",
        "current_project",
        "allocated",
    ])?;
    for (skill, employees) in matches {
        for e in employees {
            writer.write_record([
                skill.clone(),
                e.id.to_string(),
                e.name.clone(),
                format!("{:.0}", e.availability),
                e.current_project.clone().unwrap_or_default(),
                e.allocated.to_string(),
            ])?;
        }
    }
    finish(writer)
}

pub fn skill_status_to_csv(statuses: &[SkillStatus]) -> Result<String> {
    let mut writer = csv::Writer::from_writer(vec![]);
    writer.write_record(["skill", "allocated", "pending", "required", "remaining", "is_full"])?;
    for s in statuses {
        writer.write_record([
            s.skill_name.clone(),
            s.allocated.to_string(),
            s.pending.to_string(),
            s.required.to_string(),
            s.remaining.to_string(),
            s.is_full.to_string(),
        ])?;
    }
    finish(writer)
}

pub fn recommendations_to_csv(items: &[AdaptedRecommendation]) -> Result<String> {
    let mut writer = csv::Writer::from_writer(vec![]);
    writer.write_record([
        "index",
        "employee_id",
        "employee_name",
        "match_score",
        "available_hours",
        "skill",
        "allocation_percentage",
    ])?;
    for (idx, item) in items.iter().enumerate() {
        writer.write_record([
            idx.to_string(),
            item.candidate.employee_id.to_string(),
            item.candidate.employee_name.clone(),
            format!("{:.4}", item.candidate.match_score),
            item.candidate
                .available_hours
                .map(|h| format!("{h:.1}"))
                .unwrap_or_default(),
            item.skill_name.clone(),
            item.allocation_percentage.to_string(),
        ])?;
    }
    finish(writer)
}

#[cfg(test)]
mod tests {
    use super::skill_status_to_csv;
    use crate::allocation::SkillStatus;

    #[test]
    fn writes_header_and_rows() {
        let csv = skill_status_to_csv(&[SkillStatus {
            skill_name: "Machine Learning, Applied".to_string(),
            allocated: 1,
            pending: 0,
            total: 1,
            required: 2,
            remaining: 1,
            is_full: false,
        }])
        .unwrap();
        let mut lines = csv.lines();
        assert_eq!(
            lines.next(),
            Some("skill,allocated,pending,required,remaining,is_full")
        );
        assert_eq!(
            lines.next(),
            Some("\"Machine Learning, Applied\",1,0,2,1,false")
        );
    }
}
