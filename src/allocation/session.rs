use serde::Serialize;
use tracing::{debug, info, warn};

use crate::allocation::recommend::{adapt_recommendations, AdaptedRecommendation};
use crate::allocation::tracker::{skill_status, SkillStatus};
use crate::allocation::{AllocationEditor, AllocationError, ProposalOutcome, ProposedAllocation};
use crate::api::AllocationBackend;
use crate::config::AllocationPolicy;
use crate::error::{ApiError, CONNECT_FAILURE_MESSAGE};
use crate::models::{NamedRequirement, Project, SkillMatches};

#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct Banner {
    pub error: Option<String>,
    pub success: Option<String>,
}

impl Banner {
    pub fn is_empty(&self) -> bool {
        self.error.is_none() && self.success.is_none()
    }

    fn fail(&mut self, message: impl Into<String>) {
        self.error = Some(message.into());
        self.success = None;
    }

    fn succeed(&mut self, message: impl Into<String>) {
        self.success = Some(message.into());
        self.error = None;
    }

    fn succeed_with(
        &mut self,
        message: impl Into<String>,
        refresh: Result<(), AllocationError>,
    ) {
        self.succeed(message);
        if let Err(err) = refresh {
            self.error = Some(err.to_string());
        }
    }
}

/// Issued by `begin_refresh`. A match table is applied only if its ticket
/// is still the latest one issued.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Ticket(u64);

#[derive(Debug, Default)]
struct Generation {
    latest: u64,
}

impl Generation {
    fn issue(&mut self) -> Ticket {
        self.latest += 1;
        Ticket(self.latest)
    }

    fn is_current(&self, ticket: Ticket) -> bool {
        ticket.0 == self.latest
    }
}

pub struct MatchingSession<B> {
    backend: B,
    policy: AllocationPolicy,
    project: Option<Project>,
    requirements: Vec<NamedRequirement>,
    matches: SkillMatches,
    editor: AllocationEditor,
    recommendations: Vec<AdaptedRecommendation>,
    loading: bool,
    matches_stale: bool,
    banner: Banner,
    match_generation: Generation,
}

impl<B: AllocationBackend> MatchingSession<B> {
    pub fn new(backend: B, policy: AllocationPolicy) -> Self {
        Self {
            backend,
            policy,
            project: None,
            requirements: Vec::new(),
            matches: SkillMatches::new(),
            editor: AllocationEditor::new(policy),
            recommendations: Vec::new(),
            loading: false,
            matches_stale: false,
            banner: Banner::default(),
            match_generation: Generation::default(),
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn project(&self) -> Option<&Project> {
        self.project.as_ref()
    }

    pub fn requirements(&self) -> &[NamedRequirement] {
        &self.requirements
    }

    pub fn matches(&self) -> &SkillMatches {
        &self.matches
    }

    pub fn proposals(&self) -> &[ProposedAllocation] {
        self.editor.proposals()
    }

    pub fn recommendations(&self) -> &[AdaptedRecommendation] {
        &self.recommendations
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn matches_stale(&self) -> bool {
        self.matches_stale
    }

    pub fn banner(&self) -> &Banner {
        &self.banner
    }

    pub fn dismiss_banner(&mut self) {
        self.banner = Banner::default();
    }

    pub fn skill_status(&self) -> Vec<SkillStatus> {
        skill_status(&self.requirements, &self.matches, self.editor.proposals())
    }

    pub async fn select_project(&mut self, project_id: i64) -> Result<(), AllocationError> {
        self.editor.clear();
        self.recommendations.clear();
        self.dismiss_banner();

        let project = self.backend.project(project_id).await;
        match project {
            Ok(project) => {
                let requirements = self.resolve_requirements(&project).await;
                info!(
                    "selected project {} ({} requirements)",
                    project.id,
                    requirements.len()
                );
                self.requirements = requirements;
                self.project = Some(project);
            }
            Err(err) => {
                warn!("failed to load project {project_id}: {err}");
                self.project = None;
                self.requirements.clear();
                self.matches.clear();
                let message = err.user_message("Failed to fetch project details");
                self.banner.fail(message.clone());
                return Err(AllocationError::Backend(message));
            }
        }

        self.refresh_matches().await
    }

    async fn resolve_requirements(&self, project: &Project) -> Vec<NamedRequirement> {
        let mut named = Vec::with_capacity(project.skill_requirements.len());
        for req in &project.skill_requirements {
            let skill_name = match self.backend.skill(req.skill_id).await {
                Ok(skill) => skill.name,
                Err(err) => {
                    debug!("skill {} lookup failed: {err}", req.skill_id);
                    format!("Skill #{}", req.skill_id)
                }
            };
            named.push(NamedRequirement {
                skill_id: req.skill_id,
                skill_name,
                employees_requested: req.employees_requested,
            });
        }
        named
    }

    pub async fn refresh_matches(&mut self) -> Result<(), AllocationError> {
        let project_id = self.selected_id()?;
        let ticket = self.begin_refresh();
        let result = self.backend.skill_matches(project_id).await;
        self.complete_refresh(ticket, result)
    }

    /// Split form of `refresh_matches` for callers that run the fetch
    /// themselves. Only the match table is ticketed.
    pub fn begin_refresh(&mut self) -> Ticket {
        self.loading = true;
        self.banner.error = None;
        self.match_generation.issue()
    }

    pub fn complete_refresh(
        &mut self,
        ticket: Ticket,
        result: Result<SkillMatches, ApiError>,
    ) -> Result<(), AllocationError> {
        if !self.match_generation.is_current(ticket) {
            debug!("discarding stale match table {ticket:?}");
            return Ok(());
        }
        self.loading = false;
        match result {
            Ok(matches) => {
                self.matches = matches;
                self.matches_stale = false;
                Ok(())
            }
            Err(err) => {
                warn!("failed to fetch skill matches: {err}");
                self.matches_stale = true;
                let message = match &err {
                    ApiError::Status { status, .. } => {
                        format!("Failed to fetch skill matches: {}", status.as_u16())
                    }
                    ApiError::Connect(_) => CONNECT_FAILURE_MESSAGE.to_string(),
                    _ => err.user_message("Failed to fetch skill matches"),
                };
                self.banner.fail(message.clone());
                Err(AllocationError::Backend(message))
            }
        }
    }

    pub async fn fetch_recommendations(&mut self) -> Result<usize, AllocationError> {
        let project_id = match self.selected_id() {
            Ok(id) => id,
            Err(err) => {
                self.banner.fail(err.to_string());
                return Err(err);
            }
        };
        self.loading = true;
        self.banner.error = None;

        let result = self.backend.recommendations(project_id).await;
        self.loading = false;
        let response = match result {
            Ok(response) => response,
            Err(err) => {
                warn!("recommendation request failed: {err}");
                let message = err.user_message("Failed to get recommendations");
                self.banner.fail(message.clone());
                return Err(AllocationError::Backend(message));
            }
        };
        if response.recommendations.is_empty() {
            let message = "No recommendations available for this project.";
            self.banner.fail(message);
            return Err(AllocationError::Backend(message.to_string()));
        }

        let statuses = self.skill_status();
        self.recommendations = adapt_recommendations(
            response.recommendations,
            &self.requirements,
            &statuses,
            self.policy.default_percentage,
        );
        self.banner.succeed("AI recommendations generated successfully!");
        Ok(self.recommendations.len())
    }

    pub fn propose(
        &mut self,
        employee_id: i64,
        employee_name: &str,
        skill_name: &str,
        percentage: f64,
    ) -> Result<ProposalOutcome, AllocationError> {
        if let Err(err) = self.check_selectable(employee_id, skill_name) {
            self.banner.fail(err.to_string());
            return Err(err);
        }
        let outcome = self.editor.propose(
            employee_id,
            employee_name,
            skill_name,
            percentage,
            &self.requirements,
            &self.matches,
        );
        match &outcome {
            Ok(outcome) => self.banner.succeed(outcome.notice()),
            Err(err) => self.banner.fail(err.to_string()),
        }
        outcome
    }

    fn check_selectable(&self, employee_id: i64, skill_name: &str) -> Result<(), AllocationError> {
        let pending_pair = self
            .editor
            .proposals()
            .iter()
            .any(|p| p.employee_id == employee_id && p.skill_name == skill_name);
        if pending_pair {
            return Ok(());
        }
        // Skills filled by the backend alone are rejected by the editor.
        let full = self
            .skill_status()
            .iter()
            .any(|s| s.skill_name == skill_name && s.is_full && s.allocated < s.required);
        if full {
            return Err(AllocationError::SkillSelectionFull(skill_name.to_string()));
        }
        Ok(())
    }

    pub fn set_recommendation_skill(
        &mut self,
        index: usize,
        skill_name: &str,
    ) -> Result<(), AllocationError> {
        let rec = self
            .recommendations
            .get(index)
            .ok_or(AllocationError::UnknownRecommendation(index))?;
        if rec.skill_name != skill_name && !rec.available_skills.iter().any(|s| s == skill_name) {
            return Err(AllocationError::SkillNotOffered(skill_name.to_string()));
        }
        let employee_id = rec.candidate.employee_id;
        self.check_selectable(employee_id, skill_name)?;
        if let Some(rec) = self.recommendations.get_mut(index) {
            rec.skill_name = skill_name.to_string();
        }
        Ok(())
    }

    pub fn set_recommendation_percentage(
        &mut self,
        index: usize,
        percentage: f64,
    ) -> Result<(), AllocationError> {
        let rec = self
            .recommendations
            .get_mut(index)
            .ok_or(AllocationError::UnknownRecommendation(index))?;
        rec.allocation_percentage = percentage;
        Ok(())
    }

    pub fn promote_recommendation(
        &mut self,
        index: usize,
    ) -> Result<ProposalOutcome, AllocationError> {
        let Some(rec) = self.recommendations.get(index).cloned() else {
            let err = AllocationError::UnknownRecommendation(index);
            self.banner.fail(err.to_string());
            return Err(err);
        };
        self.propose(
            rec.candidate.employee_id,
            &rec.candidate.employee_name,
            &rec.skill_name,
            rec.allocation_percentage,
        )
    }

    pub fn remove_proposal(&mut self, index: usize) -> Result<ProposedAllocation, AllocationError> {
        self.editor.remove(index)
    }

    pub async fn submit(&mut self) -> Result<usize, AllocationError> {
        let project_id = match self.selected_id() {
            Ok(id) => id,
            Err(err) => {
                self.banner.fail(err.to_string());
                return Err(err);
            }
        };
        self.loading = true;
        let submitted = match self.editor.submit(&self.backend, project_id).await {
            Ok(submitted) => submitted,
            Err(err) => {
                self.loading = false;
                self.banner.fail(err.to_string());
                return Err(err);
            }
        };
        info!("allocated {submitted} employees to project {project_id}");
        self.recommendations.clear();
        let refresh = self.refresh_matches().await;
        if let Err(err) = &refresh {
            warn!("allocation saved but match refresh failed: {err}");
        }
        self.banner.succeed_with("Employees successfully allocated to the project!", refresh);
        Ok(submitted)
    }

    pub async fn remove_allocation(&mut self, employee_id: i64) -> Result<(), AllocationError> {
        let project_id = self.selected_id()?;
        self.loading = true;
        self.banner.error = None;
        if let Err(err) = self.backend.deallocate(project_id, employee_id).await {
            self.loading = false;
            warn!("failed to remove employee {employee_id} from project {project_id}: {err}");
            let message = err.user_message("Failed to remove allocation");
            self.banner.fail(message.clone());
            return Err(AllocationError::Backend(message));
        }
        self.recommendations.clear();
        let refresh = self.refresh_matches().await;
        if let Err(err) = &refresh {
            warn!("allocation removed but match refresh failed: {err}");
        }
        self.banner.succeed_with("Employee allocation successfully removed!", refresh);
        Ok(())
    }

    fn selected_id(&self) -> Result<i64, AllocationError> {
        self.project
            .as_ref()
            .map(|p| p.id)
            .ok_or(AllocationError::NoProjectSelected)
    }
}
