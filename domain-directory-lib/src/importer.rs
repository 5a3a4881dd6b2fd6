//! The import pipeline: raw field mappings → domain records → store.
//!
//! One bad row never aborts a batch. Rows whose name fails normalization
//! are collected as rejects with a reason; everything else flows through
//! the store's merge rules and is counted as inserted or merged.

use tracing::{debug, warn};

use crate::readers::{RawRecord, RowSet, NAME_KEY};
use crate::store::DomainStore;
use crate::types::{DomainRecord, ImportReport, RecordSource};
use crate::utils::normalize_domain;

/// Accepted header spellings for the domain name column.
const NAME_ALIASES: &[&str] = &[NAME_KEY, "domain name", "name", "host"];

/// Header spellings for each known record field. Headers are matched after
/// lowercasing and mapping `_`/`-` to spaces; anything unmatched is dropped.
const FIELD_ALIASES: &[(&'static str, &[&str])] = &[
    ("registrar", &["registrar", "sponsoring registrar"]),
    (
        "created_at",
        &[
            "created",
            "created at",
            "created on",
            "creation date",
            "registered on",
            "registration date",
        ],
    ),
    (
        "expires_at",
        &[
            "expires",
            "expires at",
            "expires on",
            "expiry date",
            "expiration date",
            "paid till",
        ],
    ),
    (
        "registrant",
        &[
            "registrant",
            "registrant name",
            "registrant organization",
            "owner",
            "holder",
        ],
    ),
    ("notes", &["notes", "note", "comment", "comments", "remarks"]),
];

/// Import a set of parsed rows into the store.
///
/// Parser warnings in the row set are carried into the report. Returns the
/// aggregated [`ImportReport`]; the store is updated in place.
pub fn import_rows(store: &mut DomainStore, rows: RowSet, source: RecordSource) -> ImportReport {
    let mut report = ImportReport {
        warnings: rows.warnings,
        ..Default::default()
    };

    for row in rows.rows {
        import_one(store, &row, source, &mut report);
    }

    debug!(
        inserted = report.inserted,
        merged = report.merged,
        rejected = report.rejected.len(),
        %source,
        "import finished"
    );
    report
}

/// Merge manually-entered domain names into the store.
///
/// Each entry takes the same path as an imported row, so the merge
/// precedence rules apply identically.
pub fn import_manual(store: &mut DomainStore, rows: Vec<RawRecord>) -> ImportReport {
    import_rows(
        store,
        RowSet {
            rows,
            warnings: Vec::new(),
        },
        RecordSource::Manual,
    )
}

fn import_one(
    store: &mut DomainStore,
    row: &RawRecord,
    source: RecordSource,
    report: &mut ImportReport,
) {
    let raw_name = match lookup(row, NAME_ALIASES) {
        Some(value) => value,
        None => {
            warn!("import row has no domain name column");
            report.reject("<missing>", "row has no domain name");
            return;
        }
    };

    let name = match normalize_domain(raw_name) {
        Ok(name) => name,
        Err(err) => {
            warn!(domain = raw_name, %err, "rejecting import row");
            report.reject(raw_name, err.to_string());
            return;
        }
    };

    let mut candidate = DomainRecord::new(name, source);
    candidate.registrar = field_value(row, "registrar");
    candidate.created_at = field_value(row, "created_at");
    candidate.expires_at = field_value(row, "expires_at");
    candidate.registrant = field_value(row, "registrant");
    candidate.notes = field_value(row, "notes");

    let result = store.upsert(candidate);
    if result.is_insert() {
        report.inserted += 1;
    } else {
        report.merged += 1;
    }
}

/// Find a known field's value in a raw row via its accepted aliases.
fn field_value(row: &RawRecord, field: &str) -> Option<String> {
    let aliases = FIELD_ALIASES
        .iter()
        .find(|(name, _)| *name == field)
        .map(|(_, aliases)| *aliases)?;
    lookup(row, aliases).map(|value| value.to_string())
}

/// Case- and separator-insensitive key lookup, skipping empty values.
fn lookup<'a>(row: &'a RawRecord, aliases: &[&str]) -> Option<&'a str> {
    for (key, value) in &row.fields {
        let canonical = key.trim().to_lowercase().replace(['_', '-'], " ");
        if aliases.contains(&canonical.as_str()) {
            let value = value.trim();
            if !value.is_empty() {
                return Some(value);
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(pairs: &[(&str, &str)]) -> RawRecord {
        let mut record = RawRecord::default();
        for (key, value) in pairs {
            record.fields.insert(key.to_string(), value.to_string());
        }
        record
    }

    #[test]
    fn test_import_counts_inserted_and_rejected() {
        let mut store = DomainStore::new();
        let rows = RowSet {
            rows: vec![
                RawRecord::from_name("example.com"),
                RawRecord::from_name("bad_domain!!"),
                RawRecord::from_name("example.org"),
            ],
            warnings: Vec::new(),
        };

        let report = import_rows(&mut store, rows, RecordSource::ImportedText);
        assert_eq!(report.inserted, 2);
        assert_eq!(report.merged, 0);
        assert_eq!(report.rejected.len(), 1);
        assert_eq!(report.rejected[0].input, "bad_domain!!");
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_import_maps_known_headers() {
        let mut store = DomainStore::new();
        let rows = RowSet {
            rows: vec![row(&[
                ("domain", "example.com"),
                ("Registrar", "ACME"),
                ("Expiration Date", "2026-01-01"),
                ("registrant_name", "Jane Doe"),
                ("appraisal_value", "1200"),
            ])],
            warnings: Vec::new(),
        };

        import_rows(&mut store, rows, RecordSource::ImportedCsv);
        let record = store.get("example.com").unwrap();
        assert_eq!(record.registrar.as_deref(), Some("ACME"));
        assert_eq!(record.expires_at.as_deref(), Some("2026-01-01"));
        assert_eq!(record.registrant.as_deref(), Some("Jane Doe"));
        // Unknown headers are dropped, not stored anywhere
        assert!(record.notes.is_none());
    }

    #[test]
    fn test_import_sets_source_and_unenriched() {
        let mut store = DomainStore::new();
        import_rows(
            &mut store,
            RowSet {
                rows: vec![RawRecord::from_name("example.com")],
                warnings: Vec::new(),
            },
            RecordSource::ImportedSheet,
        );
        let record = store.get("example.com").unwrap();
        assert_eq!(record.source, RecordSource::ImportedSheet);
        assert!(!record.enriched);
        assert!(record.enrichment_is_empty());
    }

    #[test]
    fn test_reimport_is_idempotent() {
        let mut store = DomainStore::new();
        let make_rows = || RowSet {
            rows: vec![
                row(&[("domain", "example.com"), ("registrar", "ACME")]),
                row(&[("domain", "example.org"), ("notes", "parked")]),
            ],
            warnings: Vec::new(),
        };

        let first = import_rows(&mut store, make_rows(), RecordSource::ImportedCsv);
        assert_eq!(first.inserted, 2);

        let snapshot: Vec<_> = store.list().to_vec();
        let second = import_rows(&mut store, make_rows(), RecordSource::ImportedCsv);
        assert_eq!(second.inserted, 0);
        assert_eq!(second.merged, 2);
        assert_eq!(store.list(), snapshot.as_slice());
    }

    #[test]
    fn test_merge_scenario_preserves_good_data() {
        let mut store = DomainStore::new();
        import_rows(
            &mut store,
            RowSet {
                rows: vec![row(&[
                    ("domain", "example.com"),
                    ("registrar", "ACME"),
                    ("notes", "vip"),
                ])],
                warnings: Vec::new(),
            },
            RecordSource::Manual,
        );

        // Incoming row with an empty registrar and a new note
        let report = import_rows(
            &mut store,
            RowSet {
                rows: vec![row(&[
                    ("domain", "example.com"),
                    ("registrar", ""),
                    ("notes", "renewed"),
                ])],
                warnings: Vec::new(),
            },
            RecordSource::ImportedCsv,
        );

        assert_eq!(report.merged, 1);
        let record = store.get("example.com").unwrap();
        assert_eq!(record.registrar.as_deref(), Some("ACME"));
        assert_eq!(record.notes.as_deref(), Some("vip; renewed"));
    }

    #[test]
    fn test_row_without_name_is_rejected() {
        let mut store = DomainStore::new();
        let report = import_rows(
            &mut store,
            RowSet {
                rows: vec![row(&[("registrar", "ACME")])],
                warnings: Vec::new(),
            },
            RecordSource::ImportedCsv,
        );
        assert_eq!(report.rejected.len(), 1);
        assert!(store.is_empty());
    }

    #[test]
    fn test_parser_warnings_carried_into_report() {
        let mut store = DomainStore::new();
        let report = import_rows(
            &mut store,
            RowSet {
                rows: Vec::new(),
                warnings: vec!["skipped malformed CSV row".to_string()],
            },
            RecordSource::ImportedCsv,
        );
        assert_eq!(report.warnings.len(), 1);
        assert!(report.has_issues());
    }
}
