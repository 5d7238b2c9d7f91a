//! Score fusion and the final decision policy.
//!
//! The 70/30 split between the specialty score and the checklist score, and
//! the structural impossibility of auto-approval for manual-review
//! specialties, are fixed policy constants; both were calibrated against the
//! heuristic matchers and must not be tuned independently of them.

use super::checklist::ChecklistEvaluation;
use super::domain::{Decision, RecommendedAction};
use super::specialties::SpecialtyAssessment;

const SPECIALTY_WEIGHT: f64 = 0.7;
const CHECKLIST_WEIGHT: f64 = 0.3;
const DENY_FLOOR: u8 = 30;
const NECESSITY_FLOOR: u8 = 70;

/// Combine the specialty assessment with the checklist evaluation into the
/// terminal decision.
pub fn fuse(
    specialty: &str,
    assessment: SpecialtyAssessment,
    checklist: ChecklistEvaluation,
) -> Decision {
    let combined = (assessment.result.score * 100.0 * SPECIALTY_WEIGHT
        + f64::from(checklist.score) * CHECKLIST_WEIGHT)
        .round()
        .clamp(0.0, 100.0) as u8;

    // Policy order is load-bearing: auto-approval wins outright, then the
    // deny floor, then any missing requirement, then manual review.
    let recommended_action = if assessment.result.auto_approval {
        RecommendedAction::Approve
    } else if combined < DENY_FLOOR {
        RecommendedAction::Deny
    } else if !assessment.result.missing_requirements.is_empty() {
        RecommendedAction::RequestAdditionalInfo
    } else {
        RecommendedAction::ManualReview
    };

    // Independent gates: a high combined score cannot paper over a structural
    // specialty failure, and vice versa.
    let meets_medical_necessity = assessment.result.is_valid && combined >= NECESSITY_FLOOR;

    let recommendations = build_recommendations(
        specialty,
        &assessment,
        &checklist,
        combined,
        recommended_action,
    );

    Decision {
        combined_score: combined,
        meets_medical_necessity,
        necessity_checks: checklist.checks,
        treatment_guidelines: checklist.guidelines,
        risk_factors: checklist.risk_factors,
        alternative_treatments: checklist.alternative_treatments,
        documentation: checklist.documentation,
        recommendations,
        approval_probability: assessment.approval_probability,
        required_documents: assessment.required_documents,
        auto_approval_eligible: assessment.result.auto_approval,
        recommended_action,
        specialty_validation: assessment.result,
    }
}

fn build_recommendations(
    specialty: &str,
    assessment: &SpecialtyAssessment,
    checklist: &ChecklistEvaluation,
    combined: u8,
    action: RecommendedAction,
) -> Vec<String> {
    let mut recommendations = Vec::new();

    if combined >= NECESSITY_FLOOR {
        recommendations.push("Medical necessity is well-supported by documentation".to_string());
    } else {
        recommendations.push("Medical necessity documentation needs strengthening".to_string());
    }

    let failed: Vec<&str> = checklist
        .checks
        .iter()
        .filter(|c| !c.meets_criterion)
        .map(|c| c.criterion.as_str())
        .collect();
    if !failed.is_empty() {
        recommendations.push(format!("Address the following criteria: {}", failed.join(", ")));
    }

    if checklist.documentation.clinical_notes_quality < 60 {
        recommendations.push(
            "Enhance clinical documentation with more detailed notes and evidence".to_string(),
        );
    }

    if checklist.alternative_treatments.tried_and_failed.is_empty() {
        recommendations
            .push("Document any prior treatments attempted and their outcomes".to_string());
    }

    if checklist.documentation.physician_justification.is_none() {
        recommendations
            .push("Include explicit physician statement regarding medical necessity".to_string());
    }

    recommendations.extend(assessment.result.reasons.iter().cloned());
    recommendations.push(format!("Specialty: {specialty}"));
    recommendations.push(format!("Recommended action: {}", action.label()));

    if !assessment.result.missing_requirements.is_empty() {
        recommendations.push(format!(
            "Missing requirements: {}",
            assessment.result.missing_requirements.join(", ")
        ));
    }

    recommendations
}
