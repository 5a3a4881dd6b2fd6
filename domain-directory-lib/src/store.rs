//! The in-memory domain record store.
//!
//! Records are keyed by normalized name and kept in insertion order so that
//! listings are deterministic. The merge rules here are the core invariant
//! of the whole tool: a later, less-informative import can never destroy
//! manually-curated fields or a prior successful enrichment.

use std::collections::HashMap;

use crate::types::{DomainRecord, MergeResult, WhoisFields};

/// Separator used when merging two non-empty `notes` values.
const NOTES_SEPARATOR: &str = "; ";

/// Keyed collection of domain records, identity = normalized name.
///
/// The store owns all records; callers query by name and receive references
/// or clones. Mutation goes through [`upsert`](DomainStore::upsert),
/// [`apply_enrichment`](DomainStore::apply_enrichment) and
/// [`remove`](DomainStore::remove) so the uniqueness invariant cannot be
/// broken from outside.
#[derive(Debug, Default)]
pub struct DomainStore {
    records: Vec<DomainRecord>,
    index: HashMap<String, usize>,
}

impl DomainStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store from a loaded record sequence.
    ///
    /// Duplicate names in the input (a hand-edited store file, for example)
    /// are merged with the same rules as a re-import instead of clobbering
    /// each other.
    pub fn from_records(records: Vec<DomainRecord>) -> Self {
        let mut store = Self::new();
        for record in records {
            store.upsert(record);
        }
        store
    }

    /// Insert a new record or merge into the existing one.
    ///
    /// `record.name` must already be normalized; the importer guarantees
    /// this for every candidate it constructs.
    ///
    /// Merge rules (per enrichment field): an incoming non-empty value
    /// overwrites the existing value only if the existing value is empty;
    /// an incoming empty value never clears anything. `notes` concatenates
    /// when both sides are non-empty. `enriched` never regresses to false.
    pub fn upsert(&mut self, record: DomainRecord) -> MergeResult {
        match self.index.get(&record.name) {
            Some(&idx) => {
                let changed_fields = merge_record(&mut self.records[idx], &record);
                MergeResult::Merged { changed_fields }
            }
            None => {
                self.index.insert(record.name.clone(), self.records.len());
                self.records.push(record);
                MergeResult::Inserted
            }
        }
    }

    /// Look up a record by normalized name. `None` is a normal outcome.
    pub fn get(&self, name: &str) -> Option<&DomainRecord> {
        self.index.get(name).map(|&idx| &self.records[idx])
    }

    /// All records in insertion order.
    ///
    /// Callers needing alphabetical order sort explicitly.
    pub fn list(&self) -> &[DomainRecord] {
        &self.records
    }

    /// Remove a record by name, returning it if it existed.
    pub fn remove(&mut self, name: &str) -> Option<DomainRecord> {
        let idx = self.index.remove(name)?;
        let record = self.records.remove(idx);
        // Positions after the removed record shift down by one
        for position in self.index.values_mut() {
            if *position > idx {
                *position -= 1;
            }
        }
        Some(record)
    }

    /// Apply enrichment fields to the named record with fill-if-empty
    /// semantics and mark it enriched.
    ///
    /// Manually-entered values are never overwritten and `notes` is never
    /// touched. Returns the changed field names, or `None` when the record
    /// does not exist.
    pub fn apply_enrichment(&mut self, name: &str, fields: &WhoisFields) -> Option<Vec<&'static str>> {
        let &idx = self.index.get(name)?;
        let record = &mut self.records[idx];

        let mut changed = Vec::new();
        fill_if_empty(&mut record.registrar, &fields.registrar, "registrar", &mut changed);
        fill_if_empty(&mut record.created_at, &fields.created_at, "created_at", &mut changed);
        fill_if_empty(&mut record.expires_at, &fields.expires_at, "expires_at", &mut changed);
        fill_if_empty(&mut record.registrant, &fields.registrant, "registrant", &mut changed);

        if !record.enriched {
            record.enriched = true;
            changed.push("enriched");
        }

        Some(changed)
    }

    /// Number of records in the store.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// True when the store holds no records.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Merge an incoming candidate into an existing record, returning the
/// names of the fields that actually changed.
fn merge_record(existing: &mut DomainRecord, incoming: &DomainRecord) -> Vec<&'static str> {
    let mut changed = Vec::new();

    fill_if_empty(&mut existing.registrar, &incoming.registrar, "registrar", &mut changed);
    fill_if_empty(&mut existing.created_at, &incoming.created_at, "created_at", &mut changed);
    fill_if_empty(&mut existing.expires_at, &incoming.expires_at, "expires_at", &mut changed);
    fill_if_empty(&mut existing.registrant, &incoming.registrant, "registrant", &mut changed);

    if let Some(merged_notes) = merge_notes(existing.notes.as_deref(), incoming.notes.as_deref()) {
        existing.notes = Some(merged_notes);
        changed.push("notes");
    }

    // Never regress a successful enrichment on re-import
    if incoming.enriched && !existing.enriched {
        existing.enriched = true;
        changed.push("enriched");
    }

    changed
}

/// Set `existing` from `incoming` only when `existing` is empty and
/// `incoming` is not, recording the change.
fn fill_if_empty(
    existing: &mut Option<String>,
    incoming: &Option<String>,
    field: &'static str,
    changed: &mut Vec<&'static str>,
) {
    if !is_empty_field(existing) {
        return;
    }
    if let Some(value) = incoming.as_deref() {
        let value = value.trim();
        if !value.is_empty() {
            *existing = Some(value.to_string());
            changed.push(field);
        }
    }
}

fn is_empty_field(value: &Option<String>) -> bool {
    value.as_deref().map_or(true, |v| v.trim().is_empty())
}

/// Compute the merged notes value, or `None` when nothing changes.
///
/// Both sides non-empty concatenates with `"; "`, unless the existing
/// notes already contain the incoming text as a segment, which keeps
/// re-imports of the same file idempotent.
fn merge_notes(existing: Option<&str>, incoming: Option<&str>) -> Option<String> {
    let incoming = incoming.map(str::trim).filter(|v| !v.is_empty())?;
    match existing.map(str::trim).filter(|v| !v.is_empty()) {
        Some(current) => {
            if current.split(NOTES_SEPARATOR).any(|segment| segment == incoming) {
                None
            } else {
                Some(format!("{}{}{}", current, NOTES_SEPARATOR, incoming))
            }
        }
        None => Some(incoming.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::RecordSource;

    fn record(name: &str) -> DomainRecord {
        DomainRecord::new(name, RecordSource::Manual)
    }

    #[test]
    fn test_upsert_inserts_then_merges() {
        let mut store = DomainStore::new();
        assert!(store.upsert(record("example.com")).is_insert());
        let result = store.upsert(record("example.com"));
        assert!(!result.is_insert());
        assert_eq!(result.changed_count(), 0);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_merge_fills_empty_fields_only() {
        let mut store = DomainStore::new();
        let mut first = record("example.com");
        first.registrar = Some("ACME".to_string());
        store.upsert(first);

        let mut second = record("example.com");
        second.registrar = Some("Other Registrar".to_string());
        second.created_at = Some("2020-01-01".to_string());
        let result = store.upsert(second);

        assert_eq!(
            result,
            MergeResult::Merged {
                changed_fields: vec!["created_at"]
            }
        );
        let merged = store.get("example.com").unwrap();
        assert_eq!(merged.registrar.as_deref(), Some("ACME"));
        assert_eq!(merged.created_at.as_deref(), Some("2020-01-01"));
    }

    #[test]
    fn test_merge_never_clears_with_empty_incoming() {
        let mut store = DomainStore::new();
        let mut first = record("example.com");
        first.registrar = Some("ACME".to_string());
        store.upsert(first);

        let mut second = record("example.com");
        second.registrar = Some("".to_string());
        let result = store.upsert(second);

        assert_eq!(result.changed_count(), 0);
        assert_eq!(
            store.get("example.com").unwrap().registrar.as_deref(),
            Some("ACME")
        );
    }

    #[test]
    fn test_notes_concatenate_and_stay_idempotent() {
        let mut store = DomainStore::new();
        let mut first = record("example.com");
        first.notes = Some("vip".to_string());
        store.upsert(first);

        let mut second = record("example.com");
        second.notes = Some("renewed".to_string());
        store.upsert(second.clone());
        assert_eq!(
            store.get("example.com").unwrap().notes.as_deref(),
            Some("vip; renewed")
        );

        // Re-importing the identical row must not duplicate the note
        let result = store.upsert(second);
        assert_eq!(result.changed_count(), 0);
        assert_eq!(
            store.get("example.com").unwrap().notes.as_deref(),
            Some("vip; renewed")
        );
    }

    #[test]
    fn test_enriched_never_regresses() {
        let mut store = DomainStore::new();
        let mut first = record("example.com");
        first.enriched = true;
        store.upsert(first);

        let stale = record("example.com");
        assert!(!stale.enriched);
        store.upsert(stale);
        assert!(store.get("example.com").unwrap().enriched);
    }

    #[test]
    fn test_list_preserves_insertion_order() {
        let mut store = DomainStore::new();
        store.upsert(record("zzz.com"));
        store.upsert(record("aaa.com"));
        store.upsert(record("mmm.com"));

        let names: Vec<&str> = store.list().iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["zzz.com", "aaa.com", "mmm.com"]);
    }

    #[test]
    fn test_remove_reindexes() {
        let mut store = DomainStore::new();
        store.upsert(record("a.com"));
        store.upsert(record("b.com"));
        store.upsert(record("c.com"));

        assert!(store.remove("b.com").is_some());
        assert!(store.remove("b.com").is_none());
        assert_eq!(store.len(), 2);
        assert_eq!(store.get("c.com").unwrap().name, "c.com");

        // Upsert after remove must still hit the right slots
        let mut updated = record("c.com");
        updated.registrar = Some("ACME".to_string());
        store.upsert(updated);
        assert_eq!(store.get("c.com").unwrap().registrar.as_deref(), Some("ACME"));
    }

    #[test]
    fn test_apply_enrichment_fill_if_empty() {
        let mut store = DomainStore::new();
        let mut existing = record("example.com");
        existing.registrar = Some("Manual Registrar".to_string());
        existing.notes = Some("vip".to_string());
        store.upsert(existing);

        let fields = WhoisFields {
            registrar: Some("WHOIS Registrar".to_string()),
            created_at: Some("1995-08-14".to_string()),
            ..Default::default()
        };
        let changed = store.apply_enrichment("example.com", &fields).unwrap();
        assert_eq!(changed, vec!["created_at", "enriched"]);

        let updated = store.get("example.com").unwrap();
        assert_eq!(updated.registrar.as_deref(), Some("Manual Registrar"));
        assert_eq!(updated.created_at.as_deref(), Some("1995-08-14"));
        assert_eq!(updated.notes.as_deref(), Some("vip"));
        assert!(updated.enriched);
    }

    #[test]
    fn test_apply_enrichment_unknown_name() {
        let mut store = DomainStore::new();
        assert!(store.apply_enrichment("missing.com", &WhoisFields::default()).is_none());
    }

    #[test]
    fn test_from_records_merges_duplicates() {
        let mut a = record("example.com");
        a.registrar = Some("ACME".to_string());
        let mut b = record("example.com");
        b.created_at = Some("2020-01-01".to_string());

        let store = DomainStore::from_records(vec![a, b, record("other.com")]);
        assert_eq!(store.len(), 2);
        let merged = store.get("example.com").unwrap();
        assert_eq!(merged.registrar.as_deref(), Some("ACME"));
        assert_eq!(merged.created_at.as_deref(), Some("2020-01-01"));
    }
}
