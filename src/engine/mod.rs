//! Prior-authorization medical-necessity decision engine.
//!
//! One inbound call: [`DecisionEngine::evaluate`] takes a structured request
//! and a specialty tag and returns a terminal [`Decision`]. Configuration
//! resolution, specialty validation, the independent necessity checklist, and
//! score fusion run as one single-threaded pipeline per request; every
//! intermediate result is an immutable value passed forward.

pub mod checklist;
pub mod config;
pub mod criteria;
pub mod domain;
pub mod extraction;
pub mod fusion;
pub mod router;
pub mod service;
pub mod specialties;

#[cfg(test)]
mod tests;

pub use checklist::{evaluate_checklist, ChecklistEvaluation};
pub use config::{
    merge, ConfigPatch, ConfigResolver, ConfigStore, ConfigStoreError, SpecialtyWorkflowConfig,
    StaticConfigStore,
};
pub use criteria::{evaluate_criterion, CriterionOutcome};
pub use domain::{
    AlternativeTreatments, Decision, DocumentationQuality, NecessityCheck, PriorAuthRequest,
    ProcedureCategory, RecommendedAction, RequestExtensions, RiskFactorSummary,
    TreatmentGuideline, Urgency, ValidationResult,
};
pub use extraction::{
    EntityCategory, EntityExtractor, EntityTrait, EntityType, ExtractionError,
    KeywordEntityExtractor, MedicalEntity,
};
pub use fusion::fuse;
pub use router::{engine_router, EvaluationBody};
pub use service::{DecisionEngine, EvaluationError};
pub use specialties::{
    run_validator, validator_for, InternalMedicineValidator, SpecialtyAssessment,
    SpecialtyValidator, WeightLossValidator, INTERNAL_MEDICINE, WEIGHT_LOSS,
};
