use super::common::*;
use crate::engine::domain::{RecommendedAction, Urgency};
use crate::engine::specialties::{
    count_comorbidities, extract_bmi, run_validator, validator_for, SpecialtyValidator,
    WeightLossValidator,
};
use crate::engine::{INTERNAL_MEDICINE, WEIGHT_LOSS};

#[test]
fn unknown_specialty_uses_internal_medicine_policy() {
    assert_eq!(validator_for("DERMATOLOGY").specialty(), INTERNAL_MEDICINE);
    assert_eq!(validator_for(WEIGHT_LOSS).specialty(), WEIGHT_LOSS);
}

#[test]
fn internal_medicine_necessity_scores_full_marks_for_urgent_documented_case() {
    let validator = validator_for(INTERNAL_MEDICINE);
    let request = urgent_imaging_request();

    let result = validator.validate_medical_necessity(&request, &validator.default_config());

    assert!(result.is_valid);
    assert!((result.score - 1.0).abs() < 1e-9);
    assert!(result.missing_requirements.is_empty());
}

#[test]
fn internal_medicine_flags_missing_diagnosis_and_conservative_care() {
    let validator = validator_for(INTERNAL_MEDICINE);
    let request = cosmetic_request();

    let result = validator.validate_medical_necessity(&request, &validator.default_config());

    assert!(!result.is_valid);
    assert!(result
        .missing_requirements
        .contains(&"Clear clinical indication".to_string()));
    assert!(result
        .missing_requirements
        .contains(&"Conservative treatment documentation".to_string()));
}

#[test]
fn emergent_request_waives_conservative_treatment() {
    let validator = validator_for(INTERNAL_MEDICINE);
    let mut request = cosmetic_request();
    request.diagnosis_codes = vec!["S06.0".to_string()];
    request.urgency = Urgency::Emergent;

    let result = validator.validate_medical_necessity(&request, &validator.default_config());

    assert!(!result
        .missing_requirements
        .contains(&"Conservative treatment documentation".to_string()));
    // 0.5 indication + 0.3 waived conservative care + 0.2 urgency.
    assert!((result.score - 1.0).abs() < 1e-9);
}

#[test]
fn internal_medicine_criteria_report_thin_rationale() {
    let validator = validator_for(INTERNAL_MEDICINE);
    let request = cosmetic_request();

    let result = validator.validate_specialty_criteria(&request, &validator.default_config());

    assert!(!result.is_valid);
    assert!(result
        .missing_requirements
        .contains(&"Diagnosis codes".to_string()));
    assert!(result
        .missing_requirements
        .contains(&"Detailed clinical rationale".to_string()));
}

#[test]
fn internal_medicine_adds_age_and_endocrine_documents() {
    let validator = validator_for(INTERNAL_MEDICINE);
    let mut request = diabetes_request();
    request.patient_age = 70;

    let documents = validator.required_documents(&request, &validator.default_config());

    assert!(documents.contains(&"geriatric_assessment".to_string()));
    assert!(documents.contains(&"endocrine_evaluation".to_string()));
}

#[test]
fn internal_medicine_probability_stays_in_band() {
    let validator = validator_for(INTERNAL_MEDICINE);
    let config = validator.default_config();

    let strong = validator.approval_probability(&urgent_imaging_request(), &config);
    let weak = validator.approval_probability(&cosmetic_request(), &config);

    assert!((0.1..=0.9).contains(&strong));
    assert!((0.1..=0.9).contains(&weak));
    assert!(strong > weak);
}

#[test]
fn weight_loss_never_auto_approves() {
    let validator = validator_for(WEIGHT_LOSS);
    let request = bariatric_request();
    let config = validator.default_config();

    let assessment = run_validator(validator, &request, &config);

    assert!(assessment.result.is_valid);
    assert!(assessment.result.missing_requirements.is_empty());
    assert!(assessment.result.score > 0.9);
    assert!(!assessment.result.auto_approval);
    assert_eq!(
        assessment.result.recommended_action,
        RecommendedAction::ManualReview
    );
}

#[test]
fn weight_loss_necessity_requires_bmi_evidence() {
    let validator = validator_for(WEIGHT_LOSS);
    let mut request = bariatric_request();
    request.clinical_rationale =
        "Sleeve gastrectomy requested for weight management.".to_string();
    request.diagnosis_codes.clear();
    request.extensions.bmi = None;

    let result = validator.validate_medical_necessity(&request, &validator.default_config());

    assert!(!result.is_valid);
    assert!(result
        .missing_requirements
        .contains(&"BMI documentation or criteria not met".to_string()));
}

#[test]
fn weight_loss_reads_bmi_from_narrative_or_extension() {
    let mut request = blank_request();
    request.clinical_rationale = "Body mass index: 38.5 documented at intake".to_string();
    assert_eq!(extract_bmi(&request), Some(38.5));

    let mut typed = blank_request();
    typed.extensions.bmi = Some(41.0);
    assert_eq!(extract_bmi(&typed), Some(41.0));

    assert_eq!(extract_bmi(&blank_request()), None);
}

#[test]
fn weight_loss_counts_comorbidities_from_text_and_codes() {
    let mut request = blank_request();
    request.clinical_rationale = "History of diabetes and hypertension".to_string();
    request.diagnosis_codes = vec!["E11.9".to_string(), "I10".to_string()];

    assert_eq!(count_comorbidities(&request), 4);
}

#[test]
fn weight_loss_flags_contraindications() {
    let validator = WeightLossValidator;
    let mut request = bariatric_request();
    request.clinical_rationale.push_str(" Patient is pregnant.");

    let result = validator.validate_specialty_criteria(&request, &validator.default_config());

    assert!(result
        .missing_requirements
        .contains(&"Contraindication assessment".to_string()));
    assert!(result
        .reasons
        .iter()
        .any(|reason| reason.contains("pregnancy")));
}

#[test]
fn weight_loss_requires_bariatric_procedure_code() {
    let validator = WeightLossValidator;
    let mut request = bariatric_request();
    request.procedure_codes = vec!["99213".to_string()];

    let result = validator.validate_specialty_criteria(&request, &validator.default_config());

    assert!(result
        .missing_requirements
        .contains(&"Specific bariatric procedure code".to_string()));
}

#[test]
fn weight_loss_adds_surgical_documents_for_sleeve_and_bypass() {
    let validator = WeightLossValidator;
    let request = bariatric_request();

    let documents = validator.required_documents(&request, &validator.default_config());

    assert!(documents.contains(&"surgical_consultation".to_string()));
    assert!(documents.contains(&"anesthesia_clearance".to_string()));
}

#[test]
fn missing_documents_add_a_single_documentation_requirement() {
    let validator = validator_for(INTERNAL_MEDICINE);
    let request = diabetes_request();
    let config = validator.default_config();

    let assessment = run_validator(validator, &request, &config);

    assert_eq!(
        assessment
            .result
            .missing_requirements
            .iter()
            .filter(|m| m.as_str() == "Supporting clinical documentation")
            .count(),
        1
    );
    assert_eq!(
        assessment.result.recommended_action,
        RecommendedAction::RequestAdditionalInfo
    );
}

#[test]
fn attached_documents_satisfy_the_documentation_gate() {
    let validator = validator_for(WEIGHT_LOSS);
    let request = bariatric_request();
    let config = validator.default_config();

    let assessment = run_validator(validator, &request, &config);

    assert!(!assessment
        .result
        .missing_requirements
        .contains(&"Supporting clinical documentation".to_string()));
}
