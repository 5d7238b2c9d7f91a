use std::collections::BTreeMap;

use super::common::*;
use crate::engine::checklist::evaluate_checklist;
use crate::engine::config::SpecialtyWorkflowConfig;
use crate::engine::domain::ProcedureCategory;
use crate::engine::extraction::{EntityExtractor, KeywordEntityExtractor};

fn config_with_criteria(criteria: Vec<&str>) -> SpecialtyWorkflowConfig {
    SpecialtyWorkflowConfig {
        necessity_criteria: BTreeMap::from([(
            "GENERIC".to_string(),
            criteria.into_iter().map(String::from).collect(),
        )]),
        ..SpecialtyWorkflowConfig::conservative_default()
    }
}

fn extracted(request: &crate::engine::domain::PriorAuthRequest) -> Vec<crate::engine::MedicalEntity> {
    KeywordEntityExtractor
        .extract(&request.clinical_rationale)
        .expect("lexicon extraction is infallible")
}

#[test]
fn category_table_is_used_when_config_defines_no_criteria() {
    let mut request = blank_request();
    request.procedure_codes = vec!["70553".to_string()];
    request.clinical_rationale = "MRI requested for chronic back pain".to_string();
    let entities = extracted(&request);

    let evaluation = evaluate_checklist(
        &request,
        &SpecialtyWorkflowConfig::conservative_default(),
        &entities,
    );

    assert_eq!(evaluation.category, ProcedureCategory::DiagnosticImaging);
    assert_eq!(evaluation.checks.len(), 4);
    assert_eq!(
        evaluation.checks[0].criterion,
        "Clinical signs and symptoms support need for imaging"
    );
}

#[test]
fn configured_criteria_replace_the_category_table() {
    let mut request = blank_request();
    request.procedure_codes = vec!["70553".to_string()];
    let config = config_with_criteria(vec!["Payer form attached"]);

    let evaluation = evaluate_checklist(&request, &config, &[]);

    assert_eq!(evaluation.checks.len(), 1);
    assert_eq!(evaluation.checks[0].criterion, "Payer form attached");
}

#[test]
fn symptom_entities_satisfy_the_clinical_signs_criterion() {
    let mut request = blank_request();
    request.clinical_rationale = "Chronic pain with documented hypertension".to_string();
    let entities = extracted(&request);
    let config = config_with_criteria(vec![
        "Clinical signs and symptoms support need for imaging",
    ]);

    let evaluation = evaluate_checklist(&request, &config, &entities);

    let check = &evaluation.checks[0];
    assert!(check.meets_criterion);
    // Two symptom/condition entities at 25 points each.
    assert_eq!(check.confidence, 50);
    assert!(check.evidence.contains(&"hypertension".to_string()));
    assert!(check.evidence.contains(&"pain".to_string()));
}

#[test]
fn treatment_history_criterion_needs_two_keywords() {
    let config = config_with_criteria(vec![
        "Conservative treatment attempted without resolution",
    ]);

    let mut sparse = blank_request();
    sparse.clinical_rationale = "Symptoms persist despite care".to_string();
    let unmet = evaluate_checklist(&sparse, &config, &[]);
    assert!(!unmet.checks[0].meets_criterion);
    assert_eq!(unmet.checks[0].confidence, 0);

    let mut documented = blank_request();
    documented.clinical_rationale =
        "Previous medication courses failed to control symptoms".to_string();
    let met = evaluate_checklist(&documented, &config, &[]);
    assert!(met.checks[0].meets_criterion);
    // previous, failed, medication.
    assert_eq!(met.checks[0].confidence, 60);
}

#[test]
fn documented_diagnosis_supports_evidence_based_criterion() {
    let mut request = blank_request();
    request.diagnosis_codes = vec!["M54.5".to_string()];
    let config = config_with_criteria(vec![
        "Procedure is evidence-based for the documented condition",
    ]);

    let evaluation = evaluate_checklist(&request, &config, &[]);

    let check = &evaluation.checks[0];
    assert!(check.meets_criterion);
    assert_eq!(check.confidence, 80);
    assert!(check.evidence[0].contains("M54.5"));
}

#[test]
fn functional_limitation_criterion_counts_keywords() {
    let mut request = blank_request();
    request.clinical_rationale =
        "Pain causes difficulty walking and impaired mobility".to_string();
    let config = config_with_criteria(vec!["Functional limitations documented and measurable"]);

    let evaluation = evaluate_checklist(&request, &config, &[]);

    let check = &evaluation.checks[0];
    assert!(check.meets_criterion);
    // pain, difficulty, impaired, mobility.
    assert_eq!(check.confidence, 60);
}

#[test]
fn failed_treatments_are_detected_in_either_phrase_order() {
    let config = SpecialtyWorkflowConfig::conservative_default();

    let mut leading = blank_request();
    leading.clinical_rationale = "Patient failed metformin over six months".to_string();
    let entities = extracted(&leading);
    let evaluation = evaluate_checklist(&leading, &config, &entities);
    assert_eq!(
        evaluation.alternative_treatments.tried_and_failed,
        vec!["metformin".to_string()]
    );

    let mut trailing = blank_request();
    trailing.clinical_rationale = "Metformin failed to control glucose".to_string();
    let entities = extracted(&trailing);
    let evaluation = evaluate_checklist(&trailing, &config, &entities);
    assert_eq!(
        evaluation.alternative_treatments.tried_and_failed,
        vec!["metformin".to_string()]
    );
}

#[test]
fn physician_statement_raises_documentation_quality() {
    let config = SpecialtyWorkflowConfig::conservative_default();

    let mut with_statement = blank_request();
    with_statement.clinical_rationale = "The requested study is medically necessary".to_string();
    let graded = evaluate_checklist(&with_statement, &config, &[]);
    assert!(graded.documentation.physician_justification.is_some());

    let mut without_statement = blank_request();
    without_statement.clinical_rationale = "The requested study would be helpful".to_string();
    let ungraded = evaluate_checklist(&without_statement, &config, &[]);
    assert!(ungraded.documentation.physician_justification.is_none());
    assert!(
        graded.documentation.clinical_notes_quality
            > ungraded.documentation.clinical_notes_quality
    );
}

#[test]
fn severity_and_urgency_keywords_populate_risk_factors() {
    let mut request = blank_request();
    request.clinical_rationale =
        "Severe and progressive deterioration requiring urgent attention".to_string();
    let config = SpecialtyWorkflowConfig::conservative_default();

    let evaluation = evaluate_checklist(&request, &config, &[]);

    assert!(evaluation
        .risk_factors
        .severity_indicators
        .contains(&"severe".to_string()));
    assert!(evaluation
        .risk_factors
        .severity_indicators
        .contains(&"progressive".to_string()));
    assert!(evaluation
        .risk_factors
        .urgency_indicators
        .contains(&"urgent".to_string()));
}

#[test]
fn imaging_requests_pick_up_radiology_guidelines() {
    let mut request = blank_request();
    request.diagnosis_codes = vec!["M54.5".to_string()];
    request.procedure_codes = vec!["72148".to_string()];
    let config = SpecialtyWorkflowConfig::conservative_default();

    let evaluation = evaluate_checklist(&request, &config, &[]);

    assert_eq!(evaluation.guidelines.len(), 2);
    assert!(evaluation
        .guidelines
        .iter()
        .any(|g| g.source == "American College of Radiology"));
    assert!(evaluation.guidelines.iter().all(|g| g.supports_necessity));
}

#[test]
fn rich_submission_outscores_a_bare_one() {
    let config = SpecialtyWorkflowConfig::conservative_default();

    let rich = bariatric_request();
    let rich_entities = extracted(&rich);
    let rich_score = evaluate_checklist(&rich, &config, &rich_entities).score;

    let bare = cosmetic_request();
    let bare_score = evaluate_checklist(&bare, &config, &[]).score;

    assert!(rich_score > bare_score);
    assert!(rich_score <= 100);
}
