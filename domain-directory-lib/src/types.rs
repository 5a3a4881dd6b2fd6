//! Core data types for the domain directory.
//!
//! This module defines all the main data structures used throughout the library,
//! including the domain record, merge/import results, and enrichment outcomes.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// How a record entered the directory.
///
/// Provenance only. It never affects merge precedence, but it is kept on
/// the record for auditing and debugging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RecordSource {
    /// Entered directly on the command line
    #[serde(rename = "manual")]
    Manual,

    /// Imported from a plain text list
    #[serde(rename = "imported-text")]
    ImportedText,

    /// Imported from a CSV file
    #[serde(rename = "imported-csv")]
    ImportedCsv,

    /// Imported from an XLSX spreadsheet
    #[serde(rename = "imported-sheet")]
    ImportedSheet,
}

impl std::fmt::Display for RecordSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RecordSource::Manual => write!(f, "manual"),
            RecordSource::ImportedText => write!(f, "text"),
            RecordSource::ImportedCsv => write!(f, "csv"),
            RecordSource::ImportedSheet => write!(f, "sheet"),
        }
    }
}

/// One domain and its metadata: the unit of storage.
///
/// `name` is the unique key: lowercase, IDNA/punycode normalized, no
/// trailing dot. Dates are kept as the registry-reported text since WHOIS
/// date formats vary wildly between registries; storing them losslessly
/// beats a lossy parse.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DomainRecord {
    /// Normalized domain name (e.g., "example.com")
    pub name: String,

    /// The registrar that manages this domain
    #[serde(skip_serializing_if = "Option::is_none")]
    pub registrar: Option<String>,

    /// When the domain was first registered
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,

    /// When the domain registration expires
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<String>,

    /// Registrant name/organization, free-form
    #[serde(skip_serializing_if = "Option::is_none")]
    pub registrant: Option<String>,

    /// Manually authored notes. Enrichment never touches this field.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,

    /// True once a WHOIS lookup has successfully populated metadata
    #[serde(default)]
    pub enriched: bool,

    /// How the record entered the directory
    pub source: RecordSource,
}

impl DomainRecord {
    /// Create a bare record with only the name and provenance set.
    ///
    /// `name` must already be normalized (see [`crate::normalize_domain`]).
    pub fn new<N: Into<String>>(name: N, source: RecordSource) -> Self {
        Self {
            name: name.into(),
            registrar: None,
            created_at: None,
            expires_at: None,
            registrant: None,
            notes: None,
            enriched: false,
            source,
        }
    }

    /// True when none of the enrichment fields carry a value.
    pub fn enrichment_is_empty(&self) -> bool {
        self.registrar.is_none()
            && self.created_at.is_none()
            && self.expires_at.is_none()
            && self.registrant.is_none()
    }
}

/// Result of a store upsert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MergeResult {
    /// No record existed for this name; the candidate was inserted as-is.
    Inserted,

    /// A record existed; the candidate was merged into it.
    /// `changed_fields` lists the fields the merge actually modified
    /// (empty for a no-op re-import).
    Merged { changed_fields: Vec<&'static str> },
}

impl MergeResult {
    /// True for the `Inserted` variant.
    pub fn is_insert(&self) -> bool {
        matches!(self, MergeResult::Inserted)
    }

    /// Number of fields the merge changed (0 for inserts and no-op merges).
    pub fn changed_count(&self) -> usize {
        match self {
            MergeResult::Inserted => 0,
            MergeResult::Merged { changed_fields } => changed_fields.len(),
        }
    }
}

/// One rejected import row: the offending input and why it was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RejectedRow {
    pub input: String,
    pub reason: String,
}

/// Aggregated outcome of a batch import.
///
/// Per-row problems land here instead of aborting the batch: rejected rows
/// carry a reason, parser-level issues become warnings.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ImportReport {
    /// Records newly inserted into the store
    pub inserted: usize,

    /// Rows that merged into an existing record (including no-op merges)
    pub merged: usize,

    /// Rows rejected during normalization, with reasons
    pub rejected: Vec<RejectedRow>,

    /// Non-fatal parser warnings (malformed rows, skipped cells, ...)
    pub warnings: Vec<String>,
}

impl ImportReport {
    /// Total rows the import attempted to process.
    pub fn total(&self) -> usize {
        self.inserted + self.merged + self.rejected.len()
    }

    /// True if anything went less than perfectly.
    pub fn has_issues(&self) -> bool {
        !self.rejected.is_empty() || !self.warnings.is_empty()
    }

    pub(crate) fn reject<I: Into<String>, R: Into<String>>(&mut self, input: I, reason: R) {
        self.rejected.push(RejectedRow {
            input: input.into(),
            reason: reason.into(),
        });
    }
}

/// Metadata fields extracted from a WHOIS response.
///
/// Fields the response did not contain stay `None`. That is normal, not
/// an error.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WhoisFields {
    pub registrar: Option<String>,
    pub created_at: Option<String>,
    pub expires_at: Option<String>,
    pub registrant: Option<String>,
}

impl WhoisFields {
    /// Names of the fields this extraction did not find.
    pub fn missing(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.registrar.is_none() {
            missing.push("registrar");
        }
        if self.created_at.is_none() {
            missing.push("created_at");
        }
        if self.expires_at.is_none() {
            missing.push("expires_at");
        }
        if self.registrant.is_none() {
            missing.push("registrant");
        }
        missing
    }

    /// True when the extraction found nothing at all.
    pub fn is_empty(&self) -> bool {
        self.missing().len() == 4
    }
}

/// Outcome of one enrichment attempt.
///
/// Callers must inspect the variant: `Unavailable` and `NotFound` mean the
/// record stays exactly as it was; enrichment failure degrades to
/// "unfilled", never to a corrupted record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnrichOutcome {
    /// The lookup succeeded and every enrichment field was parsed.
    Success(WhoisFields),

    /// The lookup succeeded but the response lacked some fields.
    PartialFailure {
        fields: WhoisFields,
        missing: Vec<&'static str>,
    },

    /// Transport failure or timeout, after the retry budget was spent.
    Unavailable,

    /// The registry definitively does not know this domain.
    NotFound,
}

impl EnrichOutcome {
    /// The extracted fields, when the lookup produced any.
    pub fn fields(&self) -> Option<&WhoisFields> {
        match self {
            EnrichOutcome::Success(fields) => Some(fields),
            EnrichOutcome::PartialFailure { fields, .. } => Some(fields),
            EnrichOutcome::Unavailable | EnrichOutcome::NotFound => None,
        }
    }
}

/// Runtime configuration for directory operations.
///
/// This struct allows fine-tuning of the enrichment behavior and the
/// store location.
#[derive(Debug, Clone)]
pub struct DirectoryConfig {
    /// Maximum number of concurrent WHOIS lookups during bulk enrichment
    /// Default: 8, Range: 1-100
    pub concurrency: usize,

    /// Timeout for each individual WHOIS lookup
    /// Default: 5 seconds
    pub whois_timeout: Duration,

    /// Retries after a transient transport failure (not after NotFound)
    /// Default: 1, Range: 0-5
    pub whois_retries: u32,

    /// Whether `add` attempts enrichment immediately
    /// Default: true
    pub enrich_on_add: bool,

    /// Path to the JSON store file; None means the built-in default
    pub store_path: Option<PathBuf>,
}

impl Default for DirectoryConfig {
    fn default() -> Self {
        Self {
            concurrency: 8,
            whois_timeout: Duration::from_secs(5),
            whois_retries: 1,
            enrich_on_add: true,
            store_path: None,
        }
    }
}

impl DirectoryConfig {
    /// Set bulk-enrichment concurrency, capped at 100.
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.clamp(1, 100);
        self
    }

    /// Set the per-lookup timeout.
    pub fn with_whois_timeout(mut self, timeout: Duration) -> Self {
        self.whois_timeout = timeout;
        self
    }

    /// Set the transient-failure retry budget, capped at 5.
    pub fn with_whois_retries(mut self, retries: u32) -> Self {
        self.whois_retries = retries.min(5);
        self
    }

    /// Enable or disable enrichment during `add`.
    pub fn with_enrich_on_add(mut self, enabled: bool) -> Self {
        self.enrich_on_add = enabled;
        self
    }

    /// Set the store file path.
    pub fn with_store_path<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.store_path = Some(path.into());
        self
    }
}
