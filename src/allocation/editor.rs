use serde::Serialize;
use tracing::{debug, warn};

use crate::allocation::{AllocationError, ProposedAllocation, SKILL_CAPACITY_PERCENT};
use crate::api::AllocationBackend;
use crate::config::AllocationPolicy;
use crate::models::{allocated_count, NamedRequirement, SkillMatches};

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Adjustment {
    Range,
    Headroom,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ProposalOutcome {
    pub allocation: ProposedAllocation,
    pub requested_percentage: f64,
    pub adjustment: Option<Adjustment>,
    pub replaced_existing: bool,
}

impl ProposalOutcome {
    pub fn notice(&self) -> String {
        let a = &self.allocation;
        match self.adjustment {
            Some(Adjustment::Headroom) => format!(
                "Allocation adjusted to {}% to fit remaining requirement.",
                a.allocation_percentage
            ),
            Some(Adjustment::Range) => format!(
                "{} allocated to {} at {}% (requested {}%, outside the allowed range).",
                a.employee_name, a.skill_name, a.allocation_percentage, self.requested_percentage
            ),
            None => format!(
                "{} allocated to {} at {}% successfully!",
                a.employee_name, a.skill_name, a.allocation_percentage
            ),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AllocationEditor {
    policy: AllocationPolicy,
    proposals: Vec<ProposedAllocation>,
}

impl AllocationEditor {
    pub fn new(policy: AllocationPolicy) -> Self {
        Self {
            policy,
            proposals: Vec::new(),
        }
    }

    pub fn policy(&self) -> &AllocationPolicy {
        &self.policy
    }

    pub fn proposals(&self) -> &[ProposedAllocation] {
        &self.proposals
    }

    pub fn is_empty(&self) -> bool {
        self.proposals.is_empty()
    }

    pub fn len(&self) -> usize {
        self.proposals.len()
    }

    pub fn clear(&mut self) {
        self.proposals.clear();
    }

    pub fn pending_total(&self, skill_name: &str) -> f64 {
        self.proposals
            .iter()
            .filter(|p| p.skill_name == skill_name)
            .map(|p| p.allocation_percentage)
            .sum()
    }

    pub fn propose(
        &mut self,
        employee_id: i64,
        employee_name: &str,
        skill_name: &str,
        percentage: f64,
        requirements: &[NamedRequirement],
        matches: &SkillMatches,
    ) -> Result<ProposalOutcome, AllocationError> {
        let requirement = requirements
            .iter()
            .find(|r| r.skill_name == skill_name)
            .ok_or_else(|| AllocationError::SkillNotRequired(skill_name.to_string()))?;

        let allocated = allocated_count(matches, skill_name);
        if allocated >= requirement.employees_requested as usize {
            return Err(AllocationError::SkillFullyAllocated(skill_name.to_string()));
        }

        if !percentage.is_finite() || percentage <= 0.0 {
            return Err(AllocationError::InvalidPercentage(percentage));
        }

        let others_total: f64 = self
            .proposals
            .iter()
            .filter(|p| p.skill_name == skill_name && p.employee_id != employee_id)
            .map(|p| p.allocation_percentage)
            .sum();
        let headroom = SKILL_CAPACITY_PERCENT - others_total;
        if headroom <= 0.0 {
            return Err(AllocationError::NoHeadroom(skill_name.to_string()));
        }

        let mut value = self.policy.clamp(percentage);
        let mut adjustment = (value != percentage).then_some(Adjustment::Range);
        if value > headroom {
            value = headroom;
            adjustment = Some(Adjustment::Headroom);
        }

        let before = self.proposals.len();
        self.proposals
            .retain(|p| !(p.employee_id == employee_id && p.skill_name == skill_name));
        let replaced_existing = self.proposals.len() != before;

        let allocation = ProposedAllocation {
            employee_id,
            employee_name: employee_name.to_string(),
            skill_name: skill_name.to_string(),
            allocation_percentage: value,
        };
        self.proposals.push(allocation.clone());
        debug!(
            "proposed {} for {} at {}% (requested {}%)",
            employee_name, skill_name, value, percentage
        );

        Ok(ProposalOutcome {
            allocation,
            requested_percentage: percentage,
            adjustment,
            replaced_existing,
        })
    }

    pub fn remove(&mut self, index: usize) -> Result<ProposedAllocation, AllocationError> {
        if index >= self.proposals.len() {
            return Err(AllocationError::UnknownProposal(index));
        }
        Ok(self.proposals.remove(index))
    }

    pub async fn submit(
        &mut self,
        backend: &dyn AllocationBackend,
        project_id: i64,
    ) -> Result<usize, AllocationError> {
        if self.proposals.is_empty() {
            return Err(AllocationError::EmptySubmission);
        }
        if let Err(err) = backend.allocate(project_id, &self.proposals).await {
            warn!("allocation batch for project {project_id} rejected: {err}");
            return Err(AllocationError::Backend(
                err.user_message("Failed to allocate employees"),
            ));
        }
        let submitted = self.proposals.len();
        self.proposals.clear();
        Ok(submitted)
    }
}
