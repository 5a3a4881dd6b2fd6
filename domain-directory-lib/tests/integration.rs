// domain-directory-lib/tests/integration.rs

//! Integration tests for the full import/enrichment pipeline: readers into
//! the importer into the store, enrichment with a stubbed lookup, and the
//! persistence round-trip.

use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use domain_directory_lib::{
    import_rows, DomainStore, EnrichOutcome, LookupError, RecordReader, RecordSource, StoreFile,
    TextReader, WhoisEnricher, WhoisLookup,
};

/// Scripted lookup collaborator: replays canned responses in order.
struct ScriptedLookup {
    responses: Mutex<Vec<Result<String, LookupError>>>,
}

impl ScriptedLookup {
    fn new(responses: Vec<Result<String, LookupError>>) -> Self {
        Self {
            responses: Mutex::new(responses),
        }
    }
}

#[async_trait]
impl WhoisLookup for ScriptedLookup {
    async fn query(&self, _domain: &str, _timeout: Duration) -> Result<String, LookupError> {
        let mut responses = self.responses.lock().unwrap();
        if responses.is_empty() {
            Err(LookupError::Transport("script exhausted".to_string()))
        } else {
            responses.remove(0)
        }
    }
}

fn import_text(store: &mut DomainStore, input: &str) -> domain_directory_lib::ImportReport {
    let reader = TextReader::new();
    let rows = reader.read_rows(input.as_bytes()).unwrap();
    import_rows(store, rows, reader.source())
}

#[test]
fn test_text_import_scenario_counts() {
    // The canonical scenario: two good names, one invalid
    let mut store = DomainStore::new();
    let report = import_text(&mut store, "example.com\nbad_domain!!\nexample.org\n");

    assert_eq!(report.inserted, 2, "two valid names insert");
    assert_eq!(report.merged, 0);
    assert_eq!(report.rejected.len(), 1, "the invalid name is rejected");
    assert_eq!(report.rejected[0].input, "bad_domain!!");
    assert!(report.rejected[0].reason.contains("bad_domain!!"));
}

#[test]
fn test_uniqueness_across_import_sequences() {
    let mut store = DomainStore::new();
    import_text(&mut store, "example.com\nexample.org\n");
    import_text(&mut store, "example.com\nEXAMPLE.COM\nexample.com.\n");

    // All spellings normalize to the same key, so the store holds one record
    assert_eq!(store.len(), 2);
    let matching = store
        .list()
        .iter()
        .filter(|r| r.name == "example.com")
        .count();
    assert_eq!(matching, 1, "at most one record per normalized name");
}

#[test]
fn test_idempotent_reimport_leaves_store_identical() {
    let mut store = DomainStore::new();
    let input = "example.com\nexample.org # renew\n";

    import_text(&mut store, input);
    let snapshot: Vec<_> = store.list().to_vec();

    let second = import_text(&mut store, input);
    assert_eq!(second.inserted, 0);
    assert_eq!(second.merged, 2);
    assert_eq!(
        store.list(),
        snapshot.as_slice(),
        "second import of the same file must not change the store"
    );
}

#[tokio::test]
async fn test_unavailable_lookup_leaves_record_untouched() {
    let mut store = DomainStore::new();
    import_text(&mut store, "example.com\n");
    let before = store.get("example.com").unwrap().clone();

    // Transport error twice: the initial attempt and the single retry
    let lookup = ScriptedLookup::new(vec![
        Err(LookupError::Transport("connection reset".to_string())),
        Err(LookupError::Transport("connection reset".to_string())),
    ]);
    let enricher = WhoisEnricher::new(lookup);

    let outcome = enricher.enrich("example.com").await;
    assert_eq!(outcome, EnrichOutcome::Unavailable);

    // The caller applies nothing on Unavailable; the record is unchanged
    assert!(outcome.fields().is_none());
    let after = store.get("example.com").unwrap();
    assert_eq!(*after, before, "record must be byte-for-byte unchanged");
    assert!(!after.enriched);
}

#[tokio::test]
async fn test_successful_enrichment_fills_and_marks() {
    let mut store = DomainStore::new();
    import_text(&mut store, "example.com\n");

    let response = "Registrar: Example Registrar Inc.\n\
        Creation Date: 1995-08-14T04:00:00Z\n\
        Registry Expiry Date: 2026-08-13T04:00:00Z\n\
        Registrant Name: Example Holdings\n";
    let enricher = WhoisEnricher::new(ScriptedLookup::new(vec![Ok(response.to_string())]));

    let outcome = enricher.enrich("example.com").await;
    let fields = outcome.fields().expect("success carries fields");
    store.apply_enrichment("example.com", fields).unwrap();

    let record = store.get("example.com").unwrap();
    assert!(record.enriched);
    assert_eq!(record.registrar.as_deref(), Some("Example Registrar Inc."));
    assert_eq!(record.created_at.as_deref(), Some("1995-08-14T04:00:00Z"));
    assert_eq!(record.expires_at.as_deref(), Some("2026-08-13T04:00:00Z"));
    assert_eq!(record.registrant.as_deref(), Some("Example Holdings"));
}

#[tokio::test]
async fn test_enrichment_never_overwrites_manual_values() {
    let mut store = DomainStore::new();
    import_text(&mut store, "example.com\n");

    // Operator fills the registrar by hand first
    let manual = domain_directory_lib::RawRecord::from_name("example.com")
        .with_field("registrar", "Hand-Picked Registrar")
        .with_field("notes", "vip");
    domain_directory_lib::import_manual(&mut store, vec![manual]);

    let response = "Registrar: Robot Registrar\nCreation Date: 2001-01-01\n";
    let enricher = WhoisEnricher::new(ScriptedLookup::new(vec![Ok(response.to_string())]));
    let outcome = enricher.enrich("example.com").await;
    store
        .apply_enrichment("example.com", outcome.fields().unwrap())
        .unwrap();

    let record = store.get("example.com").unwrap();
    assert_eq!(record.registrar.as_deref(), Some("Hand-Picked Registrar"));
    assert_eq!(record.created_at.as_deref(), Some("2001-01-01"));
    assert_eq!(record.notes.as_deref(), Some("vip"));
    assert!(record.enriched);
}

#[tokio::test]
async fn test_not_found_lookup_changes_nothing() {
    let mut store = DomainStore::new();
    import_text(&mut store, "unregistered.example\n");
    let before = store.get("unregistered.example").unwrap().clone();

    let enricher = WhoisEnricher::new(ScriptedLookup::new(vec![Err(LookupError::NotFound)]));
    let outcome = enricher.enrich("unregistered.example").await;
    assert_eq!(outcome, EnrichOutcome::NotFound);
    assert_eq!(*store.get("unregistered.example").unwrap(), before);
}

#[test]
fn test_store_file_round_trip() {
    let dir = tempfile::TempDir::new().unwrap();
    let store_file = StoreFile::new(dir.path().join("domains.json"));

    let mut store = DomainStore::new();
    import_text(&mut store, "zzz.com\naaa.com\nmmm.com\n");
    store
        .apply_enrichment(
            "aaa.com",
            &domain_directory_lib::WhoisFields {
                registrar: Some("ACME".to_string()),
                ..Default::default()
            },
        )
        .unwrap();

    store_file.save(store.list()).unwrap();
    let reloaded = DomainStore::from_records(store_file.load().unwrap());

    assert_eq!(reloaded.list(), store.list(), "order and fields preserved");
    assert!(reloaded.get("aaa.com").unwrap().enriched);
    assert_eq!(
        reloaded.get("zzz.com").unwrap().source,
        RecordSource::ImportedText
    );
}

#[tokio::test]
async fn test_bulk_enrichment_applies_per_record() {
    let mut store = DomainStore::new();
    import_text(&mut store, "a.com\nb.com\nc.com\n");

    let lookup = ScriptedLookup::new(vec![
        Ok("Registrar: One\n".to_string()),
        Err(LookupError::Transport("reset".to_string())),
        Err(LookupError::Transport("reset".to_string())),
        Ok("Registrar: Three\n".to_string()),
    ]);
    let enricher = WhoisEnricher::new(lookup);

    // Sequential pool (concurrency 1) keeps the script deterministic
    let names: Vec<String> = store.list().iter().map(|r| r.name.clone()).collect();
    let outcomes = enricher.enrich_all(names, 1).await;

    for (name, outcome) in &outcomes {
        if let Some(fields) = outcome.fields() {
            store.apply_enrichment(name, fields).unwrap();
        }
    }

    assert!(store.get("a.com").unwrap().enriched);
    assert!(!store.get("b.com").unwrap().enriched, "unavailable lookup leaves b.com alone");
    assert!(store.get("c.com").unwrap().enriched);
}
