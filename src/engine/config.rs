use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Effective workflow configuration for one (specialty, organization, payer)
/// triple. Resolved once per evaluation; never mutated afterwards because the
/// resolver may hand the same value to concurrent evaluations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpecialtyWorkflowConfig {
    /// Named criterion groups, each an ordered list of criterion statements.
    pub necessity_criteria: BTreeMap<String, Vec<String>>,
    pub required_documents: Vec<String>,
    /// `"score"` holds the auto-approval threshold; specialty-specific keys
    /// (e.g. `"bmi"`, `"comorbidity_count"`) ride along untyped.
    pub approval_thresholds: BTreeMap<String, f64>,
    pub specialized_validations: Vec<String>,
    /// Advisory SLA in minutes. Surfaced in logs, never enforced.
    pub timeout_minutes: u32,
    pub requires_manual_review: bool,
}

impl SpecialtyWorkflowConfig {
    /// The hard-coded fallback used when the configuration store cannot be
    /// reached: minimal criteria, one generic document, conservative threshold,
    /// manual review required.
    pub fn conservative_default() -> Self {
        SpecialtyWorkflowConfig {
            necessity_criteria: BTreeMap::new(),
            required_documents: vec!["medical_record".to_string()],
            approval_thresholds: BTreeMap::from([("score".to_string(), 0.8)]),
            specialized_validations: Vec::new(),
            timeout_minutes: 30,
            requires_manual_review: true,
        }
    }

    pub fn score_threshold(&self) -> f64 {
        self.approval_thresholds.get("score").copied().unwrap_or(0.8)
    }
}

/// Organization/payer-scoped delta applied over a base configuration.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ConfigPatch {
    #[serde(default)]
    pub necessity_criteria: BTreeMap<String, Vec<String>>,
    #[serde(default)]
    pub required_documents: Option<Vec<String>>,
    #[serde(default)]
    pub approval_thresholds: BTreeMap<String, f64>,
    #[serde(default)]
    pub specialized_validations: Option<Vec<String>>,
    #[serde(default)]
    pub timeout_minutes: Option<u32>,
    #[serde(default)]
    pub requires_manual_review: Option<bool>,
}

/// Pure merge: maps shallow-merged key-by-key with the override winning on
/// collision, lists replaced wholesale when the override defines them, scalars
/// taken from the override when present. Returns a new value.
pub fn merge(base: &SpecialtyWorkflowConfig, patch: &ConfigPatch) -> SpecialtyWorkflowConfig {
    let mut necessity_criteria = base.necessity_criteria.clone();
    for (group, criteria) in &patch.necessity_criteria {
        necessity_criteria.insert(group.clone(), criteria.clone());
    }

    let mut approval_thresholds = base.approval_thresholds.clone();
    for (key, value) in &patch.approval_thresholds {
        approval_thresholds.insert(key.clone(), *value);
    }

    SpecialtyWorkflowConfig {
        necessity_criteria,
        required_documents: patch
            .required_documents
            .clone()
            .unwrap_or_else(|| base.required_documents.clone()),
        approval_thresholds,
        specialized_validations: patch
            .specialized_validations
            .clone()
            .unwrap_or_else(|| base.specialized_validations.clone()),
        timeout_minutes: patch.timeout_minutes.unwrap_or(base.timeout_minutes),
        requires_manual_review: patch
            .requires_manual_review
            .unwrap_or(base.requires_manual_review),
    }
}

/// Configuration store error. A transient outage must never fail an
/// evaluation closed; the resolver recovers with the conservative default.
#[derive(Debug, thiserror::Error)]
pub enum ConfigStoreError {
    #[error("configuration store unavailable: {0}")]
    Unavailable(String),
}

/// Lookup abstraction over the specialty configuration records.
pub trait ConfigStore: Send + Sync {
    fn base_config(
        &self,
        specialty: &str,
    ) -> Result<Option<SpecialtyWorkflowConfig>, ConfigStoreError>;

    fn override_patch(
        &self,
        organization_id: &str,
        specialty: &str,
        payer_id: Option<&str>,
    ) -> Result<Option<ConfigPatch>, ConfigStoreError>;
}

/// Stored override row with audit metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverrideRecord {
    pub organization_id: String,
    pub specialty: String,
    pub payer_id: Option<String>,
    pub patch: ConfigPatch,
    pub updated_at: DateTime<Utc>,
}

/// In-memory configuration store backing the binary and tests. Payer-specific
/// rows take precedence over org-wide rows when a payer id is supplied; without
/// one, only the org-wide row is considered.
#[derive(Default)]
pub struct StaticConfigStore {
    bases: Mutex<HashMap<String, SpecialtyWorkflowConfig>>,
    overrides: Mutex<Vec<OverrideRecord>>,
}

impl StaticConfigStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_base(&self, specialty: impl Into<String>, config: SpecialtyWorkflowConfig) {
        self.bases
            .lock()
            .expect("config store mutex poisoned")
            .insert(specialty.into(), config);
    }

    pub fn insert_override(
        &self,
        organization_id: impl Into<String>,
        specialty: impl Into<String>,
        payer_id: Option<String>,
        patch: ConfigPatch,
    ) {
        self.overrides
            .lock()
            .expect("config store mutex poisoned")
            .push(OverrideRecord {
                organization_id: organization_id.into(),
                specialty: specialty.into(),
                payer_id,
                patch,
                updated_at: Utc::now(),
            });
    }
}

impl ConfigStore for StaticConfigStore {
    fn base_config(
        &self,
        specialty: &str,
    ) -> Result<Option<SpecialtyWorkflowConfig>, ConfigStoreError> {
        Ok(self
            .bases
            .lock()
            .expect("config store mutex poisoned")
            .get(specialty)
            .cloned())
    }

    fn override_patch(
        &self,
        organization_id: &str,
        specialty: &str,
        payer_id: Option<&str>,
    ) -> Result<Option<ConfigPatch>, ConfigStoreError> {
        let overrides = self.overrides.lock().expect("config store mutex poisoned");
        let scoped = |record: &&OverrideRecord| {
            record.organization_id == organization_id && record.specialty == specialty
        };

        if let Some(payer) = payer_id {
            if let Some(record) = overrides
                .iter()
                .filter(scoped)
                .find(|record| record.payer_id.as_deref() == Some(payer))
            {
                return Ok(Some(record.patch.clone()));
            }
        }

        Ok(overrides
            .iter()
            .filter(scoped)
            .find(|record| record.payer_id.is_none())
            .map(|record| record.patch.clone()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CacheKey {
    specialty: String,
    organization_id: String,
    payer_id: Option<String>,
}

struct CacheEntry {
    resolved_at: Instant,
    config: SpecialtyWorkflowConfig,
}

pub const DEFAULT_CONFIG_TTL: Duration = Duration::from_secs(60);

/// Resolves effective configurations with a bounded-TTL cache.
///
/// Cache entries must be invalidated eagerly on any configuration write so that
/// staleness can never widen an auto-approval window; the TTL only bounds
/// exposure when a writer forgets.
pub struct ConfigResolver<S> {
    store: Arc<S>,
    cache: Mutex<HashMap<CacheKey, CacheEntry>>,
    ttl: Duration,
}

impl<S: ConfigStore> ConfigResolver<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self::with_ttl(store, DEFAULT_CONFIG_TTL)
    }

    pub fn with_ttl(store: Arc<S>, ttl: Duration) -> Self {
        ConfigResolver {
            store,
            cache: Mutex::new(HashMap::new()),
            ttl,
        }
    }

    /// Resolve the effective config for one evaluation. `builtin` is the
    /// validator's built-in base, used when the store has no record for the
    /// specialty. A store failure falls back to the conservative default and
    /// is never cached.
    pub fn resolve(
        &self,
        specialty: &str,
        builtin: &SpecialtyWorkflowConfig,
        organization_id: &str,
        payer_id: Option<&str>,
    ) -> SpecialtyWorkflowConfig {
        let key = CacheKey {
            specialty: specialty.to_string(),
            organization_id: organization_id.to_string(),
            payer_id: payer_id.map(|p| p.to_string()),
        };

        {
            let cache = self.cache.lock().expect("config cache mutex poisoned");
            if let Some(entry) = cache.get(&key) {
                if entry.resolved_at.elapsed() < self.ttl {
                    return entry.config.clone();
                }
            }
        }

        match self.lookup(specialty, builtin, organization_id, payer_id) {
            Ok(config) => {
                let mut cache = self.cache.lock().expect("config cache mutex poisoned");
                cache.insert(
                    key,
                    CacheEntry {
                        resolved_at: Instant::now(),
                        config: config.clone(),
                    },
                );
                config
            }
            Err(err) => {
                warn!(
                    specialty,
                    organization_id,
                    error = %err,
                    "config store unavailable, using conservative default"
                );
                SpecialtyWorkflowConfig::conservative_default()
            }
        }
    }

    fn lookup(
        &self,
        specialty: &str,
        builtin: &SpecialtyWorkflowConfig,
        organization_id: &str,
        payer_id: Option<&str>,
    ) -> Result<SpecialtyWorkflowConfig, ConfigStoreError> {
        let base = self
            .store
            .base_config(specialty)?
            .unwrap_or_else(|| builtin.clone());

        match self
            .store
            .override_patch(organization_id, specialty, payer_id)?
        {
            Some(patch) => Ok(merge(&base, &patch)),
            None => Ok(base),
        }
    }

    /// Drop the cached entry for one triple. Call on every config write.
    pub fn invalidate(&self, specialty: &str, organization_id: &str, payer_id: Option<&str>) {
        let key = CacheKey {
            specialty: specialty.to_string(),
            organization_id: organization_id.to_string(),
            payer_id: payer_id.map(|p| p.to_string()),
        };
        self.cache
            .lock()
            .expect("config cache mutex poisoned")
            .remove(&key);
    }

    pub fn invalidate_all(&self) {
        self.cache
            .lock()
            .expect("config cache mutex poisoned")
            .clear();
    }
}
