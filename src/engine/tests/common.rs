use std::sync::{Arc, Mutex};

use crate::engine::config::{
    ConfigPatch, ConfigStore, ConfigStoreError, SpecialtyWorkflowConfig, StaticConfigStore,
};
use crate::engine::domain::{PriorAuthRequest, RequestExtensions, Urgency};
use crate::engine::extraction::{EntityExtractor, ExtractionError, MedicalEntity};
use crate::engine::service::DecisionEngine;
use crate::engine::KeywordEntityExtractor;

pub(super) fn blank_request() -> PriorAuthRequest {
    PriorAuthRequest {
        diagnosis_codes: Vec::new(),
        procedure_codes: Vec::new(),
        clinical_rationale: String::new(),
        patient_age: 0,
        patient_gender: String::new(),
        urgency: Urgency::Routine,
        prior_treatments: Vec::new(),
        supporting_documents: Vec::new(),
        organization_id: "org-100".to_string(),
        payer_id: None,
        extensions: RequestExtensions::default(),
    }
}

/// Routine diabetes follow-up with a solid narrative but no attached
/// documents. Lands in the request-more-information band.
pub(super) fn diabetes_request() -> PriorAuthRequest {
    PriorAuthRequest {
        diagnosis_codes: vec!["E11.9".to_string()],
        clinical_rationale: "Type 2 diabetes with worsening glycemic control. Metformin failed \
                             despite dose titration and adherence to the medication plan."
            .to_string(),
        patient_age: 58,
        patient_gender: "F".to_string(),
        ..blank_request()
    }
}

/// Urgent imaging request with complete documentation. Clears the
/// auto-approval threshold under the internal-medicine policy.
pub(super) fn urgent_imaging_request() -> PriorAuthRequest {
    PriorAuthRequest {
        diagnosis_codes: vec!["I10".to_string()],
        procedure_codes: vec!["70553".to_string()],
        clinical_rationale: "Urgent imaging needed for severe chronic headaches with fatigue and \
                             uncontrolled hypertension. Conservative therapy with lisinopril \
                             failed and medication adjustments were exhausted. MRI is medically \
                             necessary and clinically indicated."
            .to_string(),
        patient_age: 47,
        patient_gender: "M".to_string(),
        urgency: Urgency::Urgent,
        prior_treatments: vec!["lisinopril".to_string()],
        supporting_documents: vec![
            "medical_record".to_string(),
            "diagnosis_documentation".to_string(),
            "treatment_history".to_string(),
        ],
        ..blank_request()
    }
}

/// Fully worked-up sleeve gastrectomy candidate. Strong on every axis but the
/// weight-loss policy still routes it to manual review.
pub(super) fn bariatric_request() -> PriorAuthRequest {
    PriorAuthRequest {
        diagnosis_codes: vec![
            "E66.01".to_string(),
            "E11.9".to_string(),
            "I10".to_string(),
        ],
        procedure_codes: vec!["43775".to_string()],
        clinical_rationale: "Patient with BMI 42 and class III obesity. Comorbidities include \
                             type 2 diabetes, hypertension, and obstructive sleep apnea. \
                             Completed a 12 month supervised diet program and a structured \
                             exercise program without lasting benefit. Previous attempts with \
                             weight watchers and phentermine failed. Psychological evaluation \
                             completed with clearance. Cardiac clearance and endocrine \
                             evaluation obtained. Sleeve gastrectomy is medically necessary."
            .to_string(),
        patient_age: 44,
        patient_gender: "F".to_string(),
        prior_treatments: vec!["phentermine".to_string(), "weight watchers".to_string()],
        supporting_documents: vec![
            "medical_history".to_string(),
            "bmi_documentation".to_string(),
            "diet_history".to_string(),
            "psychological_evaluation".to_string(),
            "cardiac_clearance".to_string(),
        ],
        organization_id: "org-200".to_string(),
        payer_id: Some("acme-ppo".to_string()),
        ..blank_request()
    }
}

/// No diagnosis, no documents, a one-line narrative. Scores below the deny
/// floor.
pub(super) fn cosmetic_request() -> PriorAuthRequest {
    PriorAuthRequest {
        clinical_rationale: "Request cosmetic enhancement".to_string(),
        patient_age: 30,
        patient_gender: "F".to_string(),
        ..blank_request()
    }
}

pub(super) fn engine() -> DecisionEngine<StaticConfigStore, KeywordEntityExtractor> {
    DecisionEngine::new(
        Arc::new(StaticConfigStore::new()),
        Arc::new(KeywordEntityExtractor),
    )
}

pub(super) fn engine_with_store(
    store: Arc<StaticConfigStore>,
) -> DecisionEngine<StaticConfigStore, KeywordEntityExtractor> {
    DecisionEngine::new(store, Arc::new(KeywordEntityExtractor))
}

/// Extractor stub simulating an NLP-service outage.
pub(super) struct FailingExtractor;

impl EntityExtractor for FailingExtractor {
    fn extract(&self, _text: &str) -> Result<Vec<MedicalEntity>, ExtractionError> {
        Err(ExtractionError::Unavailable("nlp service offline".to_string()))
    }
}

/// Config store that is permanently down.
pub(super) struct UnavailableStore;

impl ConfigStore for UnavailableStore {
    fn base_config(
        &self,
        _specialty: &str,
    ) -> Result<Option<SpecialtyWorkflowConfig>, ConfigStoreError> {
        Err(ConfigStoreError::Unavailable("maintenance window".to_string()))
    }

    fn override_patch(
        &self,
        _organization_id: &str,
        _specialty: &str,
        _payer_id: Option<&str>,
    ) -> Result<Option<ConfigPatch>, ConfigStoreError> {
        Err(ConfigStoreError::Unavailable("maintenance window".to_string()))
    }
}

/// Config store that fails a fixed number of lookups before recovering.
pub(super) struct FlakyStore {
    pub(super) inner: StaticConfigStore,
    failures_remaining: Mutex<u32>,
}

impl FlakyStore {
    pub(super) fn failing_once(inner: StaticConfigStore) -> Self {
        FlakyStore {
            inner,
            failures_remaining: Mutex::new(1),
        }
    }

    fn trip(&self) -> Result<(), ConfigStoreError> {
        let mut remaining = self.failures_remaining.lock().expect("flaky store mutex");
        if *remaining > 0 {
            *remaining -= 1;
            Err(ConfigStoreError::Unavailable("transient outage".to_string()))
        } else {
            Ok(())
        }
    }
}

impl ConfigStore for FlakyStore {
    fn base_config(
        &self,
        specialty: &str,
    ) -> Result<Option<SpecialtyWorkflowConfig>, ConfigStoreError> {
        self.trip()?;
        self.inner.base_config(specialty)
    }

    fn override_patch(
        &self,
        organization_id: &str,
        specialty: &str,
        payer_id: Option<&str>,
    ) -> Result<Option<ConfigPatch>, ConfigStoreError> {
        self.inner.override_patch(organization_id, specialty, payer_id)
    }
}
