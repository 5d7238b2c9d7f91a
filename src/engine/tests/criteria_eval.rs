use super::common::*;
use crate::engine::criteria::{evaluate_criterion, first_integer};

#[test]
fn numeric_age_criterion_passes_when_patient_is_old_enough() {
    let mut request = blank_request();
    request.patient_age = 44;

    let outcome = evaluate_criterion("Age 18 or older required", &request);

    assert!(outcome.passed);
    assert_eq!(outcome.rationale, "Patient age 44 vs required 18");
}

#[test]
fn numeric_age_criterion_fails_for_minor() {
    let mut request = blank_request();
    request.patient_age = 16;

    let outcome = evaluate_criterion("Patient age at least 18", &request);

    assert!(!outcome.passed);
    assert_eq!(outcome.rationale, "Patient age 16 vs required 18");
}

#[test]
fn token_fallback_matches_narrative_mention() {
    let mut request = blank_request();
    request.clinical_rationale =
        "Completed a supervised diet over six months without weight loss".to_string();

    let outcome = evaluate_criterion("6 months supervised diet program", &request);

    assert!(outcome.passed);
    assert!(outcome.rationale.contains("mentioned in clinical rationale"));
}

#[test]
fn token_fallback_ignores_short_words() {
    let mut request = blank_request();
    // "mri" and "ct" are below the token length cutoff.
    request.clinical_rationale = "mri ct".to_string();

    let outcome = evaluate_criterion("MRI or CT", &request);

    assert!(!outcome.passed);
    assert_eq!(outcome.rationale, "Criterion not documented");
}

#[test]
fn undocumented_criterion_fails_closed() {
    let request = blank_request();

    let outcome = evaluate_criterion("Cardiac clearance obtained", &request);

    assert!(!outcome.passed);
    assert_eq!(outcome.rationale, "Criterion not documented");
}

#[test]
fn first_integer_reads_leading_digit_run() {
    assert_eq!(first_integer("BMI >= 40"), Some(40));
    assert_eq!(first_integer("Age 18 or older"), Some(18));
    assert_eq!(first_integer("no digits here"), None);
}
