use serde::Serialize;

use crate::allocation::tracker::SkillStatus;
use crate::models::{NamedRequirement, Recommendation};

pub const GENERAL_SKILL: &str = "General";

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct AdaptedRecommendation {
    pub candidate: Recommendation,
    pub skill_name: String,
    pub available_skills: Vec<String>,
    pub allocation_percentage: f64,
}

impl AdaptedRecommendation {
    pub fn match_percent(&self) -> u32 {
        (self.candidate.match_score.clamp(0.0, 1.0) * 100.0).round() as u32
    }
}

pub fn adapt_recommendations(
    mut candidates: Vec<Recommendation>,
    requirements: &[NamedRequirement],
    statuses: &[SkillStatus],
    default_percentage: f64,
) -> Vec<AdaptedRecommendation> {
    candidates.sort_by(|a, b| b.match_score.total_cmp(&a.match_score));

    let open_skills = requirements
        .iter()
        .filter(|req| {
            statuses
                .iter()
                .find(|s| s.skill_name == req.skill_name)
                .map(|s| s.remaining > 0)
                .unwrap_or(true)
        })
        .map(|req| req.skill_name.clone())
        .collect::<Vec<_>>();
    let available_skills = if open_skills.is_empty() {
        requirements
            .iter()
            .map(|req| req.skill_name.clone())
            .collect::<Vec<_>>()
    } else {
        open_skills
    };
    let target = available_skills
        .first()
        .cloned()
        .unwrap_or_else(|| GENERAL_SKILL.to_string());

    candidates
        .into_iter()
        .map(|candidate| AdaptedRecommendation {
            candidate,
            skill_name: target.clone(),
            available_skills: available_skills.clone(),
            allocation_percentage: default_percentage,
        })
        .collect()
}
