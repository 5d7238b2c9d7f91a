use std::sync::Arc;
use std::time::Duration;

use tracing::info;

use super::checklist::evaluate_checklist;
use super::config::{ConfigResolver, ConfigStore};
use super::domain::{Decision, PriorAuthRequest};
use super::extraction::{EntityExtractor, ExtractionError};
use super::fusion::fuse;
use super::specialties::{run_validator, validator_for};

/// Rationales shorter than this (trimmed) cannot be evaluated meaningfully.
const MIN_RATIONALE_LEN: usize = 20;

const INSUFFICIENT_INPUT_REASON: &str =
    "Insufficient documentation for medical necessity evaluation";

/// Pipeline failure surfaced to the caller. Configuration-store outages are
/// recovered internally and never appear here; extraction failures do, and are
/// retryable.
#[derive(Debug, thiserror::Error)]
pub enum EvaluationError {
    #[error(transparent)]
    Extraction(#[from] ExtractionError),
}

/// The decision engine: config resolution, specialty validation, checklist
/// evaluation, and fusion, composed behind one `evaluate` call. Stateless
/// across requests apart from the bounded config cache.
pub struct DecisionEngine<S, E> {
    resolver: ConfigResolver<S>,
    extractor: Arc<E>,
}

impl<S, E> DecisionEngine<S, E>
where
    S: ConfigStore,
    E: EntityExtractor,
{
    pub fn new(store: Arc<S>, extractor: Arc<E>) -> Self {
        DecisionEngine {
            resolver: ConfigResolver::new(store),
            extractor,
        }
    }

    pub fn with_config_ttl(store: Arc<S>, extractor: Arc<E>, ttl: Duration) -> Self {
        DecisionEngine {
            resolver: ConfigResolver::with_ttl(store, ttl),
            extractor,
        }
    }

    /// Evaluate one request under the given specialty. Unknown specialties use
    /// the most general policy; a too-short rationale short-circuits into the
    /// minimal zero-score decision.
    pub fn evaluate(
        &self,
        request: &PriorAuthRequest,
        specialty: &str,
    ) -> Result<Decision, EvaluationError> {
        if request.clinical_rationale.trim().len() < MIN_RATIONALE_LEN {
            return Ok(Decision::insufficient_input(INSUFFICIENT_INPUT_REASON));
        }

        let validator = validator_for(specialty);
        let config = self.resolver.resolve(
            validator.specialty(),
            &validator.default_config(),
            &request.organization_id,
            request.payer_id.as_deref(),
        );

        let assessment = run_validator(validator, request, &config);

        let entities = self.extractor.extract(&request.clinical_rationale)?;
        let checklist = evaluate_checklist(request, &config, &entities);

        let decision = fuse(validator.specialty(), assessment, checklist);

        info!(
            specialty = validator.specialty(),
            organization_id = %request.organization_id,
            combined_score = decision.combined_score,
            specialty_score = decision.specialty_validation.score,
            action = decision.recommended_action.label(),
            auto_approval = decision.auto_approval_eligible,
            timeout_budget_minutes = config.timeout_minutes,
            "prior-auth evaluation complete"
        );

        Ok(decision)
    }

    /// Eagerly drop a cached config after a configuration write.
    pub fn invalidate_config(
        &self,
        specialty: &str,
        organization_id: &str,
        payer_id: Option<&str>,
    ) {
        self.resolver.invalidate(specialty, organization_id, payer_id);
    }
}
