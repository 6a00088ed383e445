use serde::Serialize;

use crate::allocation::ProposedAllocation;
use crate::models::{allocated_count, NamedRequirement, SkillMatches};

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct SkillStatus {
    pub skill_name: String,
    pub allocated: usize,
    pub pending: usize,
    pub total: usize,
    pub required: usize,
    pub remaining: usize,
    pub is_full: bool,
}

pub fn skill_status(
    requirements: &[NamedRequirement],
    matches: &SkillMatches,
    proposals: &[ProposedAllocation],
) -> Vec<SkillStatus> {
    requirements
        .iter()
        .map(|req| {
            let allocated = allocated_count(matches, &req.skill_name);
            let pending = proposals
                .iter()
                .filter(|p| p.skill_name == req.skill_name)
                .count();
            let required = req.employees_requested as usize;
            let total = allocated + pending;
            SkillStatus {
                skill_name: req.skill_name.clone(),
                allocated,
                pending,
                total,
                required,
                remaining: required.saturating_sub(allocated),
                is_full: total >= required,
            }
        })
        .collect()
}
