pub mod editor;
pub mod recommend;
pub mod session;
pub mod tracker;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use editor::{Adjustment, AllocationEditor, ProposalOutcome};
pub use recommend::{adapt_recommendations, AdaptedRecommendation, GENERAL_SKILL};
pub use session::{Banner, MatchingSession};
pub use tracker::{skill_status, SkillStatus};

pub const SKILL_CAPACITY_PERCENT: f64 = 100.0;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProposedAllocation {
    pub employee_id: i64,
    pub employee_name: String,
    pub skill_name: String,
    pub allocation_percentage: f64,
}

#[derive(Debug, Clone, Error, PartialEq)]
pub enum AllocationError {
    #[error("Skill \"{0}\" is not required for this project.")]
    SkillNotRequired(String),
    #[error("Requirements for {0} are already fully allocated to other employees.")]
    SkillFullyAllocated(String),
    #[error("Allocation percentage must be a positive number, got {0}.")]
    InvalidPercentage(f64),
    #[error("All requested employees for {0} are already selected.")]
    SkillSelectionFull(String),
    #[error("Skill \"{0}\" is not offered for this recommendation.")]
    SkillNotOffered(String),
    #[error("Pending allocations for {0} already add up to 100%.")]
    NoHeadroom(String),
    #[error("No pending allocation at position {0}.")]
    UnknownProposal(usize),
    #[error("No recommendation at position {0}.")]
    UnknownRecommendation(usize),
    #[error("No allocations specified. Please specify allocation percentages first.")]
    EmptySubmission,
    #[error("Please select a project first")]
    NoProjectSelected,
    #[error("{0}")]
    Backend(String),
}
