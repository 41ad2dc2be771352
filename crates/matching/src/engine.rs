//! Pairwise matching engine: generates candidate pairs, scores them with
//! the record comparator, and persists candidates above threshold.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::Utc;
use rayon::prelude::*;
use tracing::info;
use uuid::Uuid;

use coalesce_core::error::{MdmError, MdmResult};
use coalesce_core::fields::StandardField;
use coalesce_core::types::{CustomerRecord, MatchCandidate, MatchStatus};
use coalesce_store::{pair_key, MemoryStore};

use crate::comparator::{compare_records, default_field_weights};

pub const DEFAULT_THRESHOLD: f64 = 0.75;

/// Provenance tag stamped on every candidate this engine emits.
pub const MATCH_METHOD: &str = "rule_based_v1";

/// Per-invocation matching parameters. Weights and threshold are never
/// shared mutable state.
#[derive(Debug, Clone)]
pub struct MatchRunConfig {
    /// Scope to one source: pairs that source's records against records
    /// from every *other* source (cross-source dedup only).
    pub source_id: Option<Uuid>,
    pub threshold: f64,
    pub field_weights: Option<BTreeMap<StandardField, f64>>,
}

impl Default for MatchRunConfig {
    fn default() -> Self {
        Self {
            source_id: None,
            threshold: DEFAULT_THRESHOLD,
            field_weights: None,
        }
    }
}

pub struct MatchingEngine {
    store: Arc<MemoryStore>,
}

impl MatchingEngine {
    pub fn new(store: Arc<MemoryStore>) -> Self {
        Self { store }
    }

    /// Run a matching pass and persist the emitted candidates atomically.
    pub fn run(&self, config: &MatchRunConfig) -> MdmResult<Vec<MatchCandidate>> {
        self.run_with_cancel(config, &AtomicBool::new(false))
    }

    /// Like `run`, but checks the cancel flag at pair boundaries. A
    /// cancelled run commits nothing.
    pub fn run_with_cancel(
        &self,
        config: &MatchRunConfig,
        cancel: &AtomicBool,
    ) -> MdmResult<Vec<MatchCandidate>> {
        validate_config(config)?;
        let weights = config
            .field_weights
            .clone()
            .unwrap_or_else(default_field_weights);

        // Snapshot the records and the candidate history in one read.
        let (pairs, mut seen_pairs) = self.store.read(|state| -> MdmResult<_> {
            let pairs = match config.source_id {
                Some(source_id) => {
                    if state.source(source_id).is_none() {
                        return Err(MdmError::NotFound(format!(
                            "Data source {source_id} not found"
                        )));
                    }
                    let scoped = state.records_for_source(source_id);
                    let others: Vec<CustomerRecord> = state
                        .all_records()
                        .into_iter()
                        .filter(|r| r.source_id != source_id)
                        .collect();
                    let mut pairs = Vec::with_capacity(scoped.len() * others.len());
                    for a in &scoped {
                        for b in &others {
                            pairs.push((a.clone(), b.clone()));
                        }
                    }
                    pairs
                }
                None => {
                    let mut records = state.all_records();
                    records.sort_by_key(|r| r.id);
                    let mut pairs = Vec::new();
                    for i in 0..records.len() {
                        for j in (i + 1)..records.len() {
                            pairs.push((records[i].clone(), records[j].clone()));
                        }
                    }
                    pairs
                }
            };
            Ok((pairs, state.candidate_pairs()))
        })?;

        // Skip pairs already evaluated by prior runs (either ordering).
        let fresh: Vec<&(CustomerRecord, CustomerRecord)> = pairs
            .iter()
            .filter(|(a, b)| !seen_pairs.contains(&pair_key(a.id, b.id)))
            .collect();
        let scanned = fresh.len();

        // Score pairs in parallel; each comparison is pure and independent.
        let scored: Vec<Option<(f64, BTreeMap<StandardField, f64>)>> = fresh
            .par_iter()
            .map(|(a, b)| {
                if cancel.load(Ordering::Relaxed) {
                    return None;
                }
                Some(compare_records(a, b, &weights))
            })
            .collect();

        if cancel.load(Ordering::Relaxed) {
            return Err(MdmError::Cancelled);
        }

        // Serialized filter-and-persist stage.
        let mut emitted = Vec::new();
        for ((a, b), result) in fresh.into_iter().zip(scored) {
            let (overall_score, field_scores) = result.ok_or(MdmError::Cancelled)?;
            let key = pair_key(a.id, b.id);
            if seen_pairs.contains(&key) {
                continue;
            }
            if overall_score >= config.threshold {
                seen_pairs.insert(key);
                emitted.push(MatchCandidate {
                    id: Uuid::new_v4(),
                    record_a_id: a.id,
                    record_b_id: b.id,
                    overall_score,
                    field_scores,
                    match_method: MATCH_METHOD.to_string(),
                    status: MatchStatus::Pending,
                    reviewed_at: None,
                    notes: None,
                    created_at: Utc::now(),
                });
            }
        }

        self.store.transaction(|state| {
            for candidate in &emitted {
                state.insert_candidate(candidate.clone())?;
            }
            Ok(())
        })?;

        info!(
            pairs_scanned = scanned,
            match_count = emitted.len(),
            threshold = config.threshold,
            source_id = ?config.source_id,
            "Matching run complete"
        );
        Ok(emitted)
    }
}

fn validate_config(config: &MatchRunConfig) -> MdmResult<()> {
    if !(0.0..=1.0).contains(&config.threshold) {
        return Err(MdmError::InvalidInput(format!(
            "Threshold must be in [0, 1], got {}",
            config.threshold
        )));
    }
    if let Some(weights) = &config.field_weights {
        let sum: f64 = weights.values().sum();
        if weights.is_empty() || !sum.is_finite() || sum <= 0.0 {
            return Err(MdmError::InvalidInput(
                "Field weights must sum to a positive value".to_string(),
            ));
        }
        if weights.values().any(|w| !w.is_finite() || *w < 0.0) {
            return Err(MdmError::InvalidInput(
                "Field weights must be non-negative".to_string(),
            ));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use coalesce_core::types::{DataSource, FileType};

    fn seed_source(store: &MemoryStore, name: &str) -> Uuid {
        let source = DataSource::new(name.into(), format!("{name}.csv"), FileType::Csv);
        let id = source.id;
        store
            .transaction(|state| {
                state.insert_source(source);
                Ok(())
            })
            .unwrap();
        id
    }

    fn seed_record(store: &MemoryStore, source_id: Uuid, email: &str, company: &str) -> Uuid {
        let mut record = CustomerRecord::new(source_id, None);
        record.email = Some(email.to_string());
        record.company_name = Some(company.to_string());
        let id = record.id;
        store
            .transaction(|state| {
                state.insert_record(record);
                Ok(())
            })
            .unwrap();
        id
    }

    #[test]
    fn test_emits_candidates_above_threshold() {
        let store = Arc::new(MemoryStore::new());
        let source = seed_source(&store, "crm");
        seed_record(&store, source, "a@x.com", "Acme Corporation");
        seed_record(&store, source, "A@X.com", "ACME CORPORATION");
        seed_record(&store, source, "unrelated@other.org", "Globex Industries");

        let engine = MatchingEngine::new(store.clone());
        let emitted = engine.run(&MatchRunConfig::default()).unwrap();

        assert_eq!(emitted.len(), 1);
        assert_eq!(emitted[0].overall_score, 1.0);
        assert_eq!(emitted[0].status, MatchStatus::Pending);
        assert_eq!(emitted[0].match_method, MATCH_METHOD);
    }

    #[test]
    fn test_second_run_emits_nothing_new() {
        let store = Arc::new(MemoryStore::new());
        let source = seed_source(&store, "crm");
        seed_record(&store, source, "a@x.com", "Acme Corporation");
        seed_record(&store, source, "a@x.com", "Acme Corp");

        let engine = MatchingEngine::new(store.clone());
        assert_eq!(engine.run(&MatchRunConfig::default()).unwrap().len(), 1);
        assert_eq!(engine.run(&MatchRunConfig::default()).unwrap().len(), 0);
        assert_eq!(store.read(|state| state.candidate_count()), 1);
    }

    #[test]
    fn test_scoped_run_is_cross_source_only() {
        let store = Arc::new(MemoryStore::new());
        let crm = seed_source(&store, "crm");
        let erp = seed_source(&store, "erp");
        // Two in-source duplicates plus one cross-source duplicate.
        let new_a = seed_record(&store, erp, "dup@x.com", "Acme Corporation");
        seed_record(&store, erp, "dup@x.com", "Acme Corporation");
        let old = seed_record(&store, crm, "dup@x.com", "Acme Corp");

        let engine = MatchingEngine::new(store.clone());
        let emitted = engine
            .run(&MatchRunConfig {
                source_id: Some(erp),
                ..Default::default()
            })
            .unwrap();

        // The in-source pair is not generated; both erp records pair with
        // the crm record, scoped records on the `a` side.
        assert_eq!(emitted.len(), 2);
        for candidate in &emitted {
            assert_ne!(candidate.record_a_id, old);
            assert_eq!(candidate.record_b_id, old);
        }
        assert!(emitted.iter().any(|c| c.record_a_id == new_a));
    }

    #[test]
    fn test_unknown_source_is_not_found() {
        let store = Arc::new(MemoryStore::new());
        let engine = MatchingEngine::new(store);
        let result = engine.run(&MatchRunConfig {
            source_id: Some(Uuid::new_v4()),
            ..Default::default()
        });
        assert!(matches!(result, Err(MdmError::NotFound(_))));
    }

    #[test]
    fn test_invalid_threshold_rejected() {
        let store = Arc::new(MemoryStore::new());
        let engine = MatchingEngine::new(store);
        let result = engine.run(&MatchRunConfig {
            threshold: 1.5,
            ..Default::default()
        });
        assert!(matches!(result, Err(MdmError::InvalidInput(_))));
    }

    #[test]
    fn test_cancelled_run_commits_nothing() {
        let store = Arc::new(MemoryStore::new());
        let source = seed_source(&store, "crm");
        seed_record(&store, source, "a@x.com", "Acme Corporation");
        seed_record(&store, source, "a@x.com", "Acme Corporation");

        let engine = MatchingEngine::new(store.clone());
        let cancel = AtomicBool::new(true);
        let result = engine.run_with_cancel(&MatchRunConfig::default(), &cancel);

        assert!(matches!(result, Err(MdmError::Cancelled)));
        assert_eq!(store.read(|state| state.candidate_count()), 0);
    }

    #[test]
    fn test_custom_weights_change_the_verdict() {
        let store = Arc::new(MemoryStore::new());
        let source = seed_source(&store, "crm");
        let mut a = CustomerRecord::new(source, None);
        a.email = Some("a@x.com".into());
        a.company_name = Some("Acme Corporation".into());
        let mut b = CustomerRecord::new(source, None);
        b.email = Some("different@y.org".into());
        b.company_name = Some("Acme Corporation".into());
        store
            .transaction(|state| {
                state.insert_record(a);
                state.insert_record(b);
                Ok(())
            })
            .unwrap();

        let engine = MatchingEngine::new(store.clone());
        // Email-only weighting: the pair scores 0.0 and is not emitted.
        let emitted = engine
            .run(&MatchRunConfig {
                field_weights: Some(BTreeMap::from([(StandardField::Email, 1.0)])),
                ..Default::default()
            })
            .unwrap();
        assert!(emitted.is_empty());

        // Company-only weighting: the pair scores 1.0 and is emitted.
        let emitted = engine
            .run(&MatchRunConfig {
                field_weights: Some(BTreeMap::from([(StandardField::CompanyName, 1.0)])),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(emitted.len(), 1);
    }
}
