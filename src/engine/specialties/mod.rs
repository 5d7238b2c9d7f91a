mod internal_medicine;
mod weight_loss;

pub use internal_medicine::InternalMedicineValidator;
pub use weight_loss::WeightLossValidator;
#[cfg(test)]
pub(crate) use weight_loss::{count_comorbidities, extract_bmi};

use tracing::debug;

use super::config::SpecialtyWorkflowConfig;
use super::criteria::evaluate_criterion;
use super::domain::{PriorAuthRequest, RecommendedAction, Urgency, ValidationResult};

pub const INTERNAL_MEDICINE: &str = "INTERNAL_MEDICINE";
pub const WEIGHT_LOSS: &str = "WEIGHT_LOSS";

/// A specialty policy: four operations over a request and its resolved config.
/// Implementations are stateless; adding a specialty requires no change to the
/// fusion stage.
pub trait SpecialtyValidator: Send + Sync {
    /// Canonical specialty code, also the config-store key.
    fn specialty(&self) -> &'static str;

    /// Built-in base configuration used when the store has no record.
    fn default_config(&self) -> SpecialtyWorkflowConfig;

    fn validate_medical_necessity(
        &self,
        request: &PriorAuthRequest,
        config: &SpecialtyWorkflowConfig,
    ) -> ValidationResult;

    fn validate_specialty_criteria(
        &self,
        request: &PriorAuthRequest,
        config: &SpecialtyWorkflowConfig,
    ) -> ValidationResult;

    /// Approval probability in a clamped safety band, never exactly 0 or 1.
    fn approval_probability(
        &self,
        request: &PriorAuthRequest,
        config: &SpecialtyWorkflowConfig,
    ) -> f64;

    fn required_documents(
        &self,
        request: &PriorAuthRequest,
        config: &SpecialtyWorkflowConfig,
    ) -> Vec<String>;
}

static INTERNAL_MEDICINE_VALIDATOR: InternalMedicineValidator = InternalMedicineValidator;
static WEIGHT_LOSS_VALIDATOR: WeightLossValidator = WeightLossValidator;

/// Select the validator for a specialty code. Unknown specialties fall back to
/// the most general policy so every request still receives a decision.
pub fn validator_for(specialty: &str) -> &'static dyn SpecialtyValidator {
    match specialty {
        WEIGHT_LOSS => &WEIGHT_LOSS_VALIDATOR,
        INTERNAL_MEDICINE => &INTERNAL_MEDICINE_VALIDATOR,
        other => {
            debug!(specialty = other, "unknown specialty, using internal medicine policy");
            &INTERNAL_MEDICINE_VALIDATOR
        }
    }
}

/// Specialty stage output consumed by the fusion stage.
#[derive(Debug, Clone, PartialEq)]
pub struct SpecialtyAssessment {
    pub result: ValidationResult,
    pub approval_probability: f64,
    pub required_documents: Vec<String>,
}

/// Run the four operations and combine them into one specialty-level result.
///
/// The combined score is the arithmetic mean of the necessity score, the
/// specialty-criteria score, and the approval probability. A request with zero
/// attached documents while the specialty requires some picks up a single
/// documentation missing-requirement.
pub fn run_validator(
    validator: &dyn SpecialtyValidator,
    request: &PriorAuthRequest,
    config: &SpecialtyWorkflowConfig,
) -> SpecialtyAssessment {
    let necessity = validator.validate_medical_necessity(request, config);
    let criteria = validator.validate_specialty_criteria(request, config);
    let probability = validator.approval_probability(request, config);
    let required_documents = validator.required_documents(request, config);

    let combined = (necessity.score + criteria.score + probability) / 3.0;

    let mut reasons = necessity.reasons;
    reasons.extend(criteria.reasons);

    let mut missing_requirements = necessity.missing_requirements;
    missing_requirements.extend(criteria.missing_requirements);
    if request.supporting_documents.is_empty() && !required_documents.is_empty() {
        missing_requirements.push("Supporting clinical documentation".to_string());
    }

    let auto_approval = combined >= config.score_threshold()
        && missing_requirements.is_empty()
        && !config.requires_manual_review;

    let recommended_action = if auto_approval {
        RecommendedAction::Approve
    } else if combined < 0.3 {
        RecommendedAction::Deny
    } else if !missing_requirements.is_empty() {
        RecommendedAction::RequestAdditionalInfo
    } else {
        RecommendedAction::ManualReview
    };

    SpecialtyAssessment {
        result: ValidationResult {
            is_valid: necessity.is_valid && criteria.is_valid,
            score: combined,
            reasons,
            missing_requirements,
            auto_approval,
            recommended_action,
        },
        approval_probability: probability,
        required_documents,
    }
}

/// Base score shared across specialties: 0.5 plus urgency bonus, documentation
/// completeness (capped at 0.2), and a rationale-length heuristic.
pub(crate) fn base_score(request: &PriorAuthRequest, required_documents: &[String]) -> f64 {
    let mut score = 0.5;

    score += match request.urgency {
        Urgency::Emergent => 0.3,
        Urgency::Urgent => 0.2,
        Urgency::Routine => 0.1,
    };

    if !required_documents.is_empty() {
        let completeness =
            request.supporting_documents.len() as f64 / required_documents.len() as f64;
        score += (completeness * 0.2).min(0.2);
    }

    if request.clinical_rationale.len() > 100 {
        score += 0.1;
    }

    score.clamp(0.0, 1.0)
}

/// Evaluate one named criterion group, collecting an annotation per failed
/// criterion.
pub(crate) fn validate_criteria_group(
    group_name: &str,
    criteria: &[String],
    request: &PriorAuthRequest,
) -> (bool, Vec<String>) {
    let mut passed = true;
    let mut reasons = Vec::new();

    for criterion in criteria {
        let outcome = evaluate_criterion(criterion, request);
        if !outcome.passed {
            passed = false;
            reasons.push(format!(
                "Failed {group_name}: {criterion} - {}",
                outcome.rationale
            ));
        }
    }

    (passed, reasons)
}

/// Clamp a probability into a safety band so downstream consumers never see a
/// spuriously absolute value.
pub(crate) fn clamp_probability(probability: f64, floor: f64, ceiling: f64) -> f64 {
    probability.clamp(floor, ceiling)
}

/// Simple pass/fail outcome used by the specialty sub-checks.
pub(crate) struct SubCheck {
    pub passed: bool,
    pub reason: String,
}
