use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Entity category as reported by the medical NLP service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EntityCategory {
    MedicalCondition,
    Medication,
    Treatment,
    TestTreatmentProcedure,
    Anatomy,
    Other,
}

/// Fine-grained entity type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EntityType {
    DxName,
    TestName,
    ProcedureName,
    MedicationName,
    TreatmentName,
    Other,
}

/// Trait flags attached to an entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EntityTrait {
    Symptom,
    Sign,
    Diagnosis,
    Negation,
}

/// One extracted entity with its span in the source text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MedicalEntity {
    pub text: String,
    pub category: EntityCategory,
    pub entity_type: EntityType,
    pub traits: Vec<EntityTrait>,
    pub begin_offset: usize,
    pub end_offset: usize,
}

impl MedicalEntity {
    pub fn is_symptom_or_condition(&self) -> bool {
        self.category == EntityCategory::MedicalCondition
            && (self.entity_type == EntityType::DxName
                || self.traits.contains(&EntityTrait::Symptom))
    }
}

/// Entity-extraction failure. Not recovered locally: the checklist signals are
/// load-bearing for 30% of the final score, so a half-built decision must not
/// be returned as if authoritative. Callers should retry.
#[derive(Debug, thiserror::Error)]
pub enum ExtractionError {
    #[error("entity extraction service unavailable: {0}")]
    Unavailable(String),
    #[error("entity extraction timed out after {0:?}")]
    Timeout(Duration),
    #[error("entity extraction rejected the request: {0}")]
    Rejected(String),
}

/// Blocking request/response seam to the external medical-entity service.
/// No internal retry; failures propagate as pipeline failures.
pub trait EntityExtractor: Send + Sync {
    fn extract(&self, text: &str) -> Result<Vec<MedicalEntity>, ExtractionError>;
}

struct LexiconEntry {
    term: &'static str,
    category: EntityCategory,
    entity_type: EntityType,
    traits: &'static [EntityTrait],
}

const LEXICON: &[LexiconEntry] = &[
    entry("diabetes", EntityCategory::MedicalCondition, EntityType::DxName, &[EntityTrait::Diagnosis]),
    entry("hypertension", EntityCategory::MedicalCondition, EntityType::DxName, &[EntityTrait::Diagnosis]),
    entry("sleep apnea", EntityCategory::MedicalCondition, EntityType::DxName, &[EntityTrait::Diagnosis]),
    entry("obesity", EntityCategory::MedicalCondition, EntityType::DxName, &[EntityTrait::Diagnosis]),
    entry("gerd", EntityCategory::MedicalCondition, EntityType::DxName, &[EntityTrait::Diagnosis]),
    entry("arthritis", EntityCategory::MedicalCondition, EntityType::DxName, &[EntityTrait::Diagnosis]),
    entry("depression", EntityCategory::MedicalCondition, EntityType::DxName, &[EntityTrait::Diagnosis]),
    entry("pain", EntityCategory::MedicalCondition, EntityType::Other, &[EntityTrait::Symptom]),
    entry("fatigue", EntityCategory::MedicalCondition, EntityType::Other, &[EntityTrait::Symptom]),
    entry("shortness of breath", EntityCategory::MedicalCondition, EntityType::Other, &[EntityTrait::Symptom]),
    entry("metformin", EntityCategory::Medication, EntityType::MedicationName, &[]),
    entry("insulin", EntityCategory::Medication, EntityType::MedicationName, &[]),
    entry("lisinopril", EntityCategory::Medication, EntityType::MedicationName, &[]),
    entry("phentermine", EntityCategory::Medication, EntityType::MedicationName, &[]),
    entry("ibuprofen", EntityCategory::Medication, EntityType::MedicationName, &[]),
    entry("physical therapy", EntityCategory::Treatment, EntityType::TreatmentName, &[]),
    entry("diet program", EntityCategory::Treatment, EntityType::TreatmentName, &[]),
    entry("exercise program", EntityCategory::Treatment, EntityType::TreatmentName, &[]),
    entry("a1c", EntityCategory::TestTreatmentProcedure, EntityType::TestName, &[]),
    entry("mri", EntityCategory::TestTreatmentProcedure, EntityType::TestName, &[]),
    entry("x-ray", EntityCategory::TestTreatmentProcedure, EntityType::TestName, &[]),
    entry("psychological evaluation", EntityCategory::TestTreatmentProcedure, EntityType::TestName, &[]),
    entry("cardiac clearance", EntityCategory::TestTreatmentProcedure, EntityType::TestName, &[]),
    entry("gastric bypass", EntityCategory::TestTreatmentProcedure, EntityType::ProcedureName, &[]),
    entry("sleeve gastrectomy", EntityCategory::TestTreatmentProcedure, EntityType::ProcedureName, &[]),
];

const fn entry(
    term: &'static str,
    category: EntityCategory,
    entity_type: EntityType,
    traits: &'static [EntityTrait],
) -> LexiconEntry {
    LexiconEntry {
        term,
        category,
        entity_type,
        traits,
    }
}

/// Deterministic lexicon-driven extractor standing in for the external NLP
/// service in the binary and in tests. First occurrence per term, fixed
/// lexicon order, so identical text always yields identical entities.
#[derive(Debug, Default, Clone, Copy)]
pub struct KeywordEntityExtractor;

impl EntityExtractor for KeywordEntityExtractor {
    fn extract(&self, text: &str) -> Result<Vec<MedicalEntity>, ExtractionError> {
        let lowered = text.to_lowercase();
        let mut entities = Vec::new();

        for entry in LEXICON {
            if let Some(begin) = lowered.find(entry.term) {
                entities.push(MedicalEntity {
                    text: entry.term.to_string(),
                    category: entry.category,
                    entity_type: entry.entity_type,
                    traits: entry.traits.to_vec(),
                    begin_offset: begin,
                    end_offset: begin + entry.term.len(),
                });
            }
        }

        Ok(entities)
    }
}
