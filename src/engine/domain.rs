use serde::{Deserialize, Serialize};

/// Clinical urgency attached to an authorization request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Urgency {
    Routine,
    Urgent,
    Emergent,
}

impl Default for Urgency {
    fn default() -> Self {
        Urgency::Routine
    }
}

/// Graded recommendation emitted by validators and by the final decision policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RecommendedAction {
    Approve,
    Deny,
    ManualReview,
    RequestAdditionalInfo,
}

impl RecommendedAction {
    pub fn label(&self) -> &'static str {
        match self {
            RecommendedAction::Approve => "APPROVE",
            RecommendedAction::Deny => "DENY",
            RecommendedAction::ManualReview => "MANUAL_REVIEW",
            RecommendedAction::RequestAdditionalInfo => "REQUEST_ADDITIONAL_INFO",
        }
    }
}

/// Closed side-table for specialty-specific request attributes.
///
/// Structured stand-in for free-form extension maps so every field consumed by
/// a validator is visible in the schema.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct RequestExtensions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bmi: Option<f32>,
}

/// One prior-authorization request as handed to the engine. Immutable for the
/// duration of an evaluation pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriorAuthRequest {
    #[serde(default)]
    pub diagnosis_codes: Vec<String>,
    #[serde(default)]
    pub procedure_codes: Vec<String>,
    #[serde(default)]
    pub clinical_rationale: String,
    #[serde(default)]
    pub patient_age: u8,
    #[serde(default)]
    pub patient_gender: String,
    #[serde(default)]
    pub urgency: Urgency,
    #[serde(default)]
    pub prior_treatments: Vec<String>,
    #[serde(default)]
    pub supporting_documents: Vec<String>,
    #[serde(default)]
    pub organization_id: String,
    #[serde(default)]
    pub payer_id: Option<String>,
    #[serde(default)]
    pub extensions: RequestExtensions,
}

/// Outcome of one validator stage. Produced once, never edited; later stages
/// build new values by combination.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationResult {
    pub is_valid: bool,
    pub score: f64,
    pub reasons: Vec<String>,
    pub missing_requirements: Vec<String>,
    pub auto_approval: bool,
    pub recommended_action: RecommendedAction,
}

/// One evaluated generic necessity criterion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NecessityCheck {
    pub criterion: String,
    pub meets_criterion: bool,
    pub confidence: u8,
    pub evidence: Vec<String>,
    pub reasoning: String,
}

/// External guideline reference supporting (or not) the requested care.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreatmentGuideline {
    pub source: String,
    pub text: String,
    pub relevance_score: u8,
    pub supports_necessity: bool,
}

/// Keyword-derived risk signals from the clinical narrative.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RiskFactorSummary {
    pub severity_indicators: Vec<String>,
    pub urgency_indicators: Vec<String>,
    pub contraindications: Vec<String>,
}

/// Alternative-treatment analysis derived from entity labels and the
/// surrounding outcome language.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AlternativeTreatments {
    pub tried_and_failed: Vec<String>,
    pub contraindicated: Vec<String>,
    pub insufficient: Vec<String>,
}

/// Documentation-quality assessment of the submitted narrative.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DocumentationQuality {
    pub clinical_notes_quality: u8,
    pub diagnostic_evidence: Vec<String>,
    pub treatment_history: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub physician_justification: Option<String>,
}

/// Terminal artifact returned to the caller. Stable schema for downstream
/// consumers; no further lifecycle after construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Decision {
    pub combined_score: u8,
    pub meets_medical_necessity: bool,
    pub necessity_checks: Vec<NecessityCheck>,
    pub treatment_guidelines: Vec<TreatmentGuideline>,
    pub risk_factors: RiskFactorSummary,
    pub alternative_treatments: AlternativeTreatments,
    pub documentation: DocumentationQuality,
    pub recommendations: Vec<String>,
    pub specialty_validation: ValidationResult,
    pub approval_probability: f64,
    pub required_documents: Vec<String>,
    pub auto_approval_eligible: bool,
    pub recommended_action: RecommendedAction,
}

impl Decision {
    /// Minimal zero-score decision for requests whose narrative is too thin to
    /// evaluate. Deliberate garbage-in, honest-out contract rather than an error.
    pub fn insufficient_input(reason: impl Into<String>) -> Self {
        Decision {
            combined_score: 0,
            meets_medical_necessity: false,
            necessity_checks: Vec::new(),
            treatment_guidelines: Vec::new(),
            risk_factors: RiskFactorSummary::default(),
            alternative_treatments: AlternativeTreatments::default(),
            documentation: DocumentationQuality::default(),
            recommendations: vec![reason.into()],
            specialty_validation: ValidationResult {
                is_valid: false,
                score: 0.0,
                reasons: Vec::new(),
                missing_requirements: Vec::new(),
                auto_approval: false,
                recommended_action: RecommendedAction::RequestAdditionalInfo,
            },
            approval_probability: 0.0,
            required_documents: Vec::new(),
            auto_approval_eligible: false,
            recommended_action: RecommendedAction::RequestAdditionalInfo,
        }
    }
}

/// Procedure category used to pick the generic checklist criteria table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProcedureCategory {
    DiagnosticImaging,
    SurgicalProcedure,
    SpecialistConsultation,
    MedicationTherapy,
    PhysicalTherapy,
}

impl ProcedureCategory {
    /// Categorize from the first procedure code's CPT range, falling back to
    /// narrative keywords when no code is supplied.
    pub fn for_request(request: &PriorAuthRequest) -> Self {
        if let Some(code) = request.procedure_codes.first() {
            if let Ok(cpt) = code.trim().parse::<u32>() {
                return match cpt {
                    70000..=79999 => ProcedureCategory::DiagnosticImaging,
                    10000..=69999 => ProcedureCategory::SurgicalProcedure,
                    99200..=99499 => ProcedureCategory::SpecialistConsultation,
                    97000..=97799 => ProcedureCategory::PhysicalTherapy,
                    _ => ProcedureCategory::SurgicalProcedure,
                };
            }
        }

        let text = request.clinical_rationale.to_lowercase();
        if ["imaging", "mri", "ct", "x-ray"].iter().any(|k| text.contains(k)) {
            ProcedureCategory::DiagnosticImaging
        } else if ["surgery", "surgical", "operation"].iter().any(|k| text.contains(k)) {
            ProcedureCategory::SurgicalProcedure
        } else if ["consultation", "specialist", "referral"]
            .iter()
            .any(|k| text.contains(k))
        {
            ProcedureCategory::SpecialistConsultation
        } else if ["therapy", "rehabilitation"].iter().any(|k| text.contains(k)) {
            ProcedureCategory::PhysicalTherapy
        } else {
            ProcedureCategory::SurgicalProcedure
        }
    }
}
