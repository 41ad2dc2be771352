//! Entity maps and the symmetric candidate-pair index. All mutation goes
//! through `MemoryStore::transaction`, which owns atomicity and rollback.

use std::collections::{HashMap, HashSet};

use coalesce_core::error::{MdmError, MdmResult};
use coalesce_core::types::{
    CustomerRecord, DataSource, GoldenRecord, MatchCandidate, MatchStatus,
};
use uuid::Uuid;

/// Normalized key for an unordered record pair. Both orderings of the same
/// pair map to the same key.
pub fn pair_key(a: Uuid, b: Uuid) -> (Uuid, Uuid) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

#[derive(Debug, Clone, Default)]
pub struct StoreState {
    sources: HashMap<Uuid, DataSource>,
    records: HashMap<Uuid, CustomerRecord>,
    candidates: HashMap<Uuid, MatchCandidate>,
    goldens: HashMap<Uuid, GoldenRecord>,
    candidate_pairs: HashSet<(Uuid, Uuid)>,
}

impl StoreState {
    // ─── Data sources ───────────────────────────────────────────────────

    pub fn insert_source(&mut self, source: DataSource) {
        self.sources.insert(source.id, source);
    }

    pub fn source(&self, id: Uuid) -> Option<&DataSource> {
        self.sources.get(&id)
    }

    pub fn source_mut(&mut self, id: Uuid) -> Option<&mut DataSource> {
        self.sources.get_mut(&id)
    }

    /// All sources, newest upload first.
    pub fn list_sources(&self) -> Vec<DataSource> {
        let mut sources: Vec<DataSource> = self.sources.values().cloned().collect();
        sources.sort_by(|a, b| b.uploaded_at.cmp(&a.uploaded_at));
        sources
    }

    pub fn source_count(&self) -> usize {
        self.sources.len()
    }

    /// Remove a source and every record imported from it.
    pub fn delete_source(&mut self, id: Uuid) -> MdmResult<DataSource> {
        let source = self
            .sources
            .remove(&id)
            .ok_or_else(|| MdmError::NotFound(format!("Data source {id} not found")))?;
        self.records.retain(|_, r| r.source_id != id);
        Ok(source)
    }

    // ─── Customer records ───────────────────────────────────────────────

    pub fn insert_record(&mut self, record: CustomerRecord) {
        self.records.insert(record.id, record);
    }

    pub fn record(&self, id: Uuid) -> Option<&CustomerRecord> {
        self.records.get(&id)
    }

    pub fn record_mut(&mut self, id: Uuid) -> Option<&mut CustomerRecord> {
        self.records.get_mut(&id)
    }

    pub fn all_records(&self) -> Vec<CustomerRecord> {
        self.records.values().cloned().collect()
    }

    pub fn record_count(&self) -> usize {
        self.records.len()
    }

    /// Records from one source, in import order.
    pub fn records_for_source(&self, source_id: Uuid) -> Vec<CustomerRecord> {
        let mut records: Vec<CustomerRecord> = self
            .records
            .values()
            .filter(|r| r.source_id == source_id)
            .cloned()
            .collect();
        records.sort_by_key(|r| r.source_row_number);
        records
    }

    /// Records linked to one golden record.
    pub fn records_for_golden(&self, golden_id: Uuid) -> Vec<CustomerRecord> {
        self.records
            .values()
            .filter(|r| r.golden_record_id == Some(golden_id))
            .cloned()
            .collect()
    }

    pub fn linked_record_count(&self, golden_id: Uuid) -> u32 {
        self.records
            .values()
            .filter(|r| r.golden_record_id == Some(golden_id))
            .count() as u32
    }

    // ─── Match candidates ───────────────────────────────────────────────

    /// Insert a candidate, enforcing distinct records and the symmetric
    /// pair-uniqueness invariant.
    pub fn insert_candidate(&mut self, candidate: MatchCandidate) -> MdmResult<()> {
        if candidate.record_a_id == candidate.record_b_id {
            return Err(MdmError::InvalidInput(
                "Match candidate must reference two distinct records".to_string(),
            ));
        }
        let key = pair_key(candidate.record_a_id, candidate.record_b_id);
        if !self.candidate_pairs.insert(key) {
            return Err(MdmError::Storage(format!(
                "Candidate pair {}/{} already exists",
                candidate.record_a_id, candidate.record_b_id
            )));
        }
        self.candidates.insert(candidate.id, candidate);
        Ok(())
    }

    pub fn candidate(&self, id: Uuid) -> Option<&MatchCandidate> {
        self.candidates.get(&id)
    }

    pub fn candidate_mut(&mut self, id: Uuid) -> Option<&mut MatchCandidate> {
        self.candidates.get_mut(&id)
    }

    pub fn pair_exists(&self, a: Uuid, b: Uuid) -> bool {
        self.candidate_pairs.contains(&pair_key(a, b))
    }

    /// Every persisted unordered pair, as normalized keys.
    pub fn candidate_pairs(&self) -> HashSet<(Uuid, Uuid)> {
        self.candidate_pairs.clone()
    }

    pub fn candidates_with_status(&self, status: Option<MatchStatus>) -> Vec<MatchCandidate> {
        self.candidates
            .values()
            .filter(|c| status.is_none_or(|s| c.status == s))
            .cloned()
            .collect()
    }

    pub fn candidate_count(&self) -> usize {
        self.candidates.len()
    }

    /// True when the record appears on either side of a pending candidate.
    pub fn has_pending_candidate(&self, record_id: Uuid) -> bool {
        self.candidates.values().any(|c| {
            c.status == MatchStatus::Pending
                && (c.record_a_id == record_id || c.record_b_id == record_id)
        })
    }

    // ─── Golden records ─────────────────────────────────────────────────

    pub fn insert_golden(&mut self, golden: GoldenRecord) {
        self.goldens.insert(golden.id, golden);
    }

    pub fn golden(&self, id: Uuid) -> Option<&GoldenRecord> {
        self.goldens.get(&id)
    }

    pub fn golden_mut(&mut self, id: Uuid) -> Option<&mut GoldenRecord> {
        self.goldens.get_mut(&id)
    }

    pub fn all_goldens(&self) -> Vec<GoldenRecord> {
        self.goldens.values().cloned().collect()
    }

    pub fn golden_count(&self) -> usize {
        self.goldens.len()
    }
}
