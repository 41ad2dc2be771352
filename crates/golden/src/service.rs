//! Candidate lifecycle and golden-record operations. Every mutation runs
//! in a single store transaction; failure leaves no partial state.

use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::info;
use utoipa::ToSchema;
use uuid::Uuid;

use coalesce_core::error::{MdmError, MdmResult};
use coalesce_core::fields::StandardField;
use coalesce_core::types::{CustomerRecord, GoldenRecord, MatchCandidate, MatchStatus};
use coalesce_store::MemoryStore;

use crate::planner::{resolve_surviving_values, SurvivingValues};

/// Reviewer verdict on a pending candidate. Approval is advisory; the
/// merge operation is always explicit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ReviewDecision {
    Approved,
    Rejected,
}

/// Candidate enriched with both referenced records for operator review.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct MatchCandidateDetail {
    #[serde(flatten)]
    pub candidate: MatchCandidate,
    pub record_a: Option<CustomerRecord>,
    pub record_b: Option<CustomerRecord>,
}

/// Golden record enriched with its linked source records.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct GoldenRecordDetail {
    #[serde(flatten)]
    pub golden: GoldenRecord,
    pub source_records: Vec<CustomerRecord>,
}

#[derive(Debug, Clone, Copy, Serialize, ToSchema)]
pub struct CandidateStats {
    pub total: u64,
    pub pending: u64,
    pub approved: u64,
    pub rejected: u64,
    pub merged: u64,
}

pub struct GoldenRecordService {
    store: Arc<MemoryStore>,
}

impl GoldenRecordService {
    pub fn new(store: Arc<MemoryStore>) -> Self {
        Self { store }
    }

    // ─── Merge ──────────────────────────────────────────────────────────

    /// Merge the two records of a candidate into one golden record and
    /// close the candidate out as `Merged`.
    pub fn merge(
        &self,
        match_id: Uuid,
        surviving_values: Option<&SurvivingValues>,
    ) -> MdmResult<GoldenRecord> {
        let golden = self.store.transaction(|state| {
            let candidate = state
                .candidate(match_id)
                .ok_or_else(|| MdmError::NotFound(format!("Match candidate {match_id} not found")))?
                .clone();
            if candidate.status.is_terminal() {
                return Err(MdmError::InvalidStateTransition(format!(
                    "Candidate {match_id} is already {:?}",
                    candidate.status
                )));
            }

            let record_a = state
                .record(candidate.record_a_id)
                .ok_or_else(|| {
                    MdmError::NotFound(format!("Record {} not found", candidate.record_a_id))
                })?
                .clone();
            let record_b = state
                .record(candidate.record_b_id)
                .ok_or_else(|| {
                    MdmError::NotFound(format!("Record {} not found", candidate.record_b_id))
                })?
                .clone();

            let values = resolve_surviving_values(&record_a, &record_b, surviving_values);

            let golden_id = match (record_a.golden_record_id, record_b.golden_record_id) {
                (Some(a_golden), Some(b_golden)) if a_golden != b_golden => {
                    return Err(MdmError::ConflictingGoldens(format!(
                        "Records already belong to golden records {a_golden} and {b_golden}"
                    )));
                }
                (Some(existing), _) | (None, Some(existing)) => {
                    let golden = state.golden_mut(existing).ok_or_else(|| {
                        MdmError::Storage(format!("Golden record {existing} missing"))
                    })?;
                    for field in StandardField::ALL {
                        if let Some(Some(value)) = values.get(&field) {
                            if !value.is_empty() {
                                golden.set_field(field, Some(value.clone()));
                            }
                        }
                    }
                    golden.updated_at = Utc::now();
                    existing
                }
                (None, None) => {
                    let mut golden = GoldenRecord::new();
                    for field in StandardField::ALL {
                        golden.set_field(field, values.get(&field).cloned().flatten());
                    }
                    let id = golden.id;
                    state.insert_golden(golden);
                    id
                }
            };

            for record_id in [candidate.record_a_id, candidate.record_b_id] {
                let record = state.record_mut(record_id).ok_or_else(|| {
                    MdmError::Storage(format!("Record {record_id} missing"))
                })?;
                record.golden_record_id = Some(golden_id);
            }

            // Keep source_count equal to the number of linked records,
            // even when one side was already attached to this golden.
            let linked = state.linked_record_count(golden_id);
            let now = Utc::now();
            let golden = state
                .golden_mut(golden_id)
                .ok_or_else(|| MdmError::Storage(format!("Golden record {golden_id} missing")))?;
            golden.source_count = linked;

            let candidate = state
                .candidate_mut(match_id)
                .ok_or_else(|| MdmError::Storage(format!("Candidate {match_id} missing")))?;
            candidate.status = MatchStatus::Merged;
            candidate.reviewed_at = Some(now);

            state
                .golden(golden_id)
                .cloned()
                .ok_or_else(|| MdmError::Storage(format!("Golden record {golden_id} missing")))
        })?;

        info!(
            match_id = %match_id,
            golden_record_id = %golden.id,
            source_count = golden.source_count,
            "Candidate merged into golden record"
        );
        Ok(golden)
    }

    // ─── Review ─────────────────────────────────────────────────────────

    /// Approve or reject a pending candidate. Does not merge.
    pub fn review(
        &self,
        match_id: Uuid,
        decision: ReviewDecision,
        notes: Option<String>,
    ) -> MdmResult<MatchCandidate> {
        let candidate = self.store.transaction(|state| {
            let candidate = state
                .candidate_mut(match_id)
                .ok_or_else(|| MdmError::NotFound(format!("Match candidate {match_id} not found")))?;
            if candidate.status != MatchStatus::Pending {
                return Err(MdmError::InvalidStateTransition(format!(
                    "Candidate {match_id} is {:?}, only pending candidates can be reviewed",
                    candidate.status
                )));
            }
            candidate.status = match decision {
                ReviewDecision::Approved => MatchStatus::Approved,
                ReviewDecision::Rejected => MatchStatus::Rejected,
            };
            candidate.reviewed_at = Some(Utc::now());
            candidate.notes = notes;
            Ok(candidate.clone())
        })?;

        info!(match_id = %match_id, status = ?candidate.status, "Candidate reviewed");
        Ok(candidate)
    }

    // ─── Promotion ──────────────────────────────────────────────────────

    /// Give every unmatched record with no pending candidate its own solo
    /// golden record. Returns the number created; idempotent.
    pub fn promote_unmatched(&self) -> MdmResult<u32> {
        let count = self.store.transaction(|state| {
            let unmatched: Vec<CustomerRecord> = state
                .all_records()
                .into_iter()
                .filter(|r| r.golden_record_id.is_none() && !state.has_pending_candidate(r.id))
                .collect();

            let count = unmatched.len() as u32;
            for record in unmatched {
                let golden = GoldenRecord::from_customer(&record);
                let golden_id = golden.id;
                state.insert_golden(golden);
                let record = state.record_mut(record.id).ok_or_else(|| {
                    MdmError::Storage(format!("Record {} missing", record.id))
                })?;
                record.golden_record_id = Some(golden_id);
            }
            Ok(count)
        })?;

        info!(count, "Promoted unmatched records to golden records");
        Ok(count)
    }

    // ─── Queries ────────────────────────────────────────────────────────

    /// Candidates, highest score first, enriched with both records.
    pub fn list_candidates(
        &self,
        status: Option<MatchStatus>,
        skip: usize,
        limit: usize,
    ) -> Vec<MatchCandidateDetail> {
        self.store.read(|state| {
            let mut candidates = state.candidates_with_status(status);
            candidates.sort_by(|a, b| {
                b.overall_score
                    .partial_cmp(&a.overall_score)
                    .unwrap_or(std::cmp::Ordering::Equal)
            });
            candidates
                .into_iter()
                .skip(skip)
                .take(limit)
                .map(|candidate| MatchCandidateDetail {
                    record_a: state.record(candidate.record_a_id).cloned(),
                    record_b: state.record(candidate.record_b_id).cloned(),
                    candidate,
                })
                .collect()
        })
    }

    pub fn get_candidate(&self, match_id: Uuid) -> MdmResult<MatchCandidateDetail> {
        self.store.read(|state| {
            let candidate = state
                .candidate(match_id)
                .ok_or_else(|| MdmError::NotFound(format!("Match candidate {match_id} not found")))?
                .clone();
            Ok(MatchCandidateDetail {
                record_a: state.record(candidate.record_a_id).cloned(),
                record_b: state.record(candidate.record_b_id).cloned(),
                candidate,
            })
        })
    }

    pub fn candidate_stats(&self) -> CandidateStats {
        self.store.read(|state| {
            let candidates = state.candidates_with_status(None);
            let count =
                |status: MatchStatus| candidates.iter().filter(|c| c.status == status).count() as u64;
            CandidateStats {
                total: candidates.len() as u64,
                pending: count(MatchStatus::Pending),
                approved: count(MatchStatus::Approved),
                rejected: count(MatchStatus::Rejected),
                merged: count(MatchStatus::Merged),
            }
        })
    }

    /// Golden records, most recently updated first, optionally filtered by
    /// a case-insensitive search over name and email fields.
    pub fn list_goldens(
        &self,
        skip: usize,
        limit: usize,
        search: Option<&str>,
    ) -> Vec<GoldenRecordDetail> {
        self.store.read(|state| {
            let needle = search.map(str::to_lowercase);
            let mut goldens: Vec<GoldenRecord> = state
                .all_goldens()
                .into_iter()
                .filter(|g| match &needle {
                    Some(needle) => [
                        g.company_name.as_deref(),
                        g.email.as_deref(),
                        g.first_name.as_deref(),
                        g.last_name.as_deref(),
                    ]
                    .iter()
                    .flatten()
                    .any(|v| v.to_lowercase().contains(needle)),
                    None => true,
                })
                .collect();
            goldens.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
            goldens
                .into_iter()
                .skip(skip)
                .take(limit)
                .map(|golden| GoldenRecordDetail {
                    source_records: state.records_for_golden(golden.id),
                    golden,
                })
                .collect()
        })
    }

    pub fn golden_count(&self) -> u64 {
        self.store.read(|state| state.golden_count() as u64)
    }

    pub fn get_golden(&self, golden_id: Uuid) -> MdmResult<GoldenRecordDetail> {
        self.store.read(|state| {
            let golden = state
                .golden(golden_id)
                .ok_or_else(|| MdmError::NotFound(format!("Golden record {golden_id} not found")))?
                .clone();
            Ok(GoldenRecordDetail {
                source_records: state.records_for_golden(golden.id),
                golden,
            })
        })
    }

    /// All golden records as RFC 4180 CSV, most recently updated first.
    pub fn export_csv(&self) -> MdmResult<String> {
        let mut goldens = self.store.read(|state| state.all_goldens());
        goldens.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        crate::export::goldens_to_csv(&goldens)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use coalesce_core::types::{DataSource, FileType};
    use std::collections::BTreeMap;

    struct Fixture {
        store: Arc<MemoryStore>,
        service: GoldenRecordService,
        source_id: Uuid,
    }

    impl Fixture {
        fn new() -> Self {
            let store = Arc::new(MemoryStore::new());
            let source = DataSource::new("CRM".into(), "crm.csv".into(), FileType::Csv);
            let source_id = source.id;
            store
                .transaction(|state| {
                    state.insert_source(source);
                    Ok(())
                })
                .unwrap();
            Self {
                service: GoldenRecordService::new(store.clone()),
                store,
                source_id,
            }
        }

        fn record(&self, company: &str, email: &str) -> Uuid {
            let mut record = CustomerRecord::new(self.source_id, None);
            record.company_name = Some(company.to_string());
            record.email = Some(email.to_string());
            let id = record.id;
            self.store
                .transaction(|state| {
                    state.insert_record(record);
                    Ok(())
                })
                .unwrap();
            id
        }

        fn candidate(&self, a: Uuid, b: Uuid) -> Uuid {
            let candidate = MatchCandidate {
                id: Uuid::new_v4(),
                record_a_id: a,
                record_b_id: b,
                overall_score: 0.92,
                field_scores: BTreeMap::new(),
                match_method: "rule_based_v1".to_string(),
                status: MatchStatus::Pending,
                reviewed_at: None,
                notes: None,
                created_at: Utc::now(),
            };
            let id = candidate.id;
            self.store
                .transaction(|state| state.insert_candidate(candidate))
                .unwrap();
            id
        }
    }

    #[test]
    fn test_merge_creates_golden_and_links_both_records() {
        let fx = Fixture::new();
        let a = fx.record("Acme", "a@acme.com");
        let b = fx.record("Acme Corporation", "a@acme.com");
        let match_id = fx.candidate(a, b);

        let golden = fx.service.merge(match_id, None).unwrap();

        assert_eq!(golden.source_count, 2);
        assert_eq!(golden.company_name.as_deref(), Some("Acme Corporation"));
        fx.store.read(|state| {
            assert_eq!(state.record(a).unwrap().golden_record_id, Some(golden.id));
            assert_eq!(state.record(b).unwrap().golden_record_id, Some(golden.id));
            let candidate = state.candidate(match_id).unwrap();
            assert_eq!(candidate.status, MatchStatus::Merged);
            assert!(candidate.reviewed_at.is_some());
        });
    }

    #[test]
    fn test_merge_folds_third_record_into_existing_golden() {
        let fx = Fixture::new();
        let a = fx.record("Acme", "a@acme.com");
        let b = fx.record("Acme Corporation", "a@acme.com");
        let c = fx.record("Acme Corp", "a@acme.com");

        let first = fx.candidate(a, b);
        let golden = fx.service.merge(first, None).unwrap();

        let second = fx.candidate(b, c);
        let updated = fx.service.merge(second, None).unwrap();

        assert_eq!(updated.id, golden.id);
        assert_eq!(updated.source_count, 3);
        fx.store.read(|state| {
            assert_eq!(state.golden_count(), 1);
            assert_eq!(state.record(c).unwrap().golden_record_id, Some(golden.id));
        });
    }

    #[test]
    fn test_merge_with_conflicting_goldens_fails_without_mutation() {
        let fx = Fixture::new();
        let a = fx.record("Acme", "a@acme.com");
        let b = fx.record("Acme Corp", "a@acme.com");
        let c = fx.record("Globex", "g@globex.com");
        let d = fx.record("Globex Inc", "g@globex.com");

        fx.service.merge(fx.candidate(a, b), None).unwrap();
        fx.service.merge(fx.candidate(c, d), None).unwrap();

        let cross = fx.candidate(b, c);
        let result = fx.service.merge(cross, None);

        assert!(matches!(result, Err(MdmError::ConflictingGoldens(_))));
        fx.store.read(|state| {
            assert_eq!(state.golden_count(), 2);
            assert_eq!(state.candidate(cross).unwrap().status, MatchStatus::Pending);
        });
    }

    #[test]
    fn test_merge_accepts_operator_surviving_values() {
        let fx = Fixture::new();
        let a = fx.record("Acme", "a@acme.com");
        let b = fx.record("Acme Corporation", "a@acme.com");
        let match_id = fx.candidate(a, b);

        let overrides = SurvivingValues::from([
            (StandardField::CompanyName, Some("Acme".to_string())),
        ]);
        let golden = fx.service.merge(match_id, Some(&overrides)).unwrap();
        assert_eq!(golden.company_name.as_deref(), Some("Acme"));
    }

    #[test]
    fn test_merge_from_approved_candidate_is_allowed() {
        let fx = Fixture::new();
        let a = fx.record("Acme", "a@acme.com");
        let b = fx.record("Acme Corp", "a@acme.com");
        let match_id = fx.candidate(a, b);

        fx.service
            .review(match_id, ReviewDecision::Approved, None)
            .unwrap();
        let golden = fx.service.merge(match_id, None).unwrap();
        assert_eq!(golden.source_count, 2);
    }

    #[test]
    fn test_terminal_candidates_reject_review_and_merge() {
        let fx = Fixture::new();
        let a = fx.record("Acme", "a@acme.com");
        let b = fx.record("Acme Corp", "a@acme.com");

        let rejected = fx.candidate(a, b);
        fx.service
            .review(rejected, ReviewDecision::Rejected, Some("different".into()))
            .unwrap();

        assert!(matches!(
            fx.service.review(rejected, ReviewDecision::Approved, None),
            Err(MdmError::InvalidStateTransition(_))
        ));
        assert!(matches!(
            fx.service.merge(rejected, None),
            Err(MdmError::InvalidStateTransition(_))
        ));
    }

    #[test]
    fn test_review_unknown_candidate_is_not_found() {
        let fx = Fixture::new();
        assert!(matches!(
            fx.service.review(Uuid::new_v4(), ReviewDecision::Approved, None),
            Err(MdmError::NotFound(_))
        ));
    }

    #[test]
    fn test_promote_unmatched_skips_records_with_pending_candidates() {
        let fx = Fixture::new();
        let a = fx.record("Acme", "a@acme.com");
        let b = fx.record("Acme Corp", "a@acme.com");
        let _lone = fx.record("Globex", "g@globex.com");
        fx.candidate(a, b);

        let promoted = fx.service.promote_unmatched().unwrap();
        assert_eq!(promoted, 1);

        fx.store.read(|state| {
            assert!(state.record(a).unwrap().golden_record_id.is_none());
            assert!(state.record(b).unwrap().golden_record_id.is_none());
        });
    }

    #[test]
    fn test_promote_unmatched_is_idempotent() {
        let fx = Fixture::new();
        fx.record("Acme", "a@acme.com");
        fx.record("Globex", "g@globex.com");

        assert_eq!(fx.service.promote_unmatched().unwrap(), 2);
        assert_eq!(fx.service.promote_unmatched().unwrap(), 0);
        assert_eq!(fx.service.golden_count(), 2);
        for detail in fx.service.list_goldens(0, 50, None) {
            assert_eq!(detail.golden.source_count, 1);
            assert_eq!(detail.source_records.len(), 1);
        }
    }

    #[test]
    fn test_list_candidates_sorted_by_score_desc() {
        let fx = Fixture::new();
        let a = fx.record("Acme", "a@acme.com");
        let b = fx.record("Acme Corp", "a@acme.com");
        let c = fx.record("Acme Inc", "a@acme.com");

        let low = fx.candidate(a, b);
        let high = fx.candidate(a, c);
        fx.store
            .transaction(|state| {
                state.candidate_mut(low).expect("candidate").overall_score = 0.8;
                state.candidate_mut(high).expect("candidate").overall_score = 0.99;
                Ok(())
            })
            .unwrap();

        let listed = fx.service.list_candidates(Some(MatchStatus::Pending), 0, 50);
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].candidate.id, high);
        assert!(listed[0].record_a.is_some() && listed[0].record_b.is_some());
    }

    #[test]
    fn test_golden_search_is_case_insensitive() {
        let fx = Fixture::new();
        fx.record("Acme Corporation", "a@acme.com");
        fx.record("Globex", "g@globex.com");
        fx.service.promote_unmatched().unwrap();

        let hits = fx.service.list_goldens(0, 50, Some("ACME"));
        assert_eq!(hits.len(), 1);
        assert_eq!(
            hits[0].golden.company_name.as_deref(),
            Some("Acme Corporation")
        );
        assert!(fx.service.list_goldens(0, 50, Some("initech")).is_empty());
    }
}
